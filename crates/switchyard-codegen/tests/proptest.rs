//! Property-based tests for escaping, naming and pipeline ordering.

use proptest::prelude::*;
use switchyard_codegen::escape::{escape_literal, escape_text, unescape};
use switchyard_codegen::{
    BehaviorDefinition, GeneratorConfig, Model, PipelineComposer, RouteDefinition, SourceWriter,
};

// ============================================================================
// Test helpers
// ============================================================================

fn compose(behaviors: &[BehaviorDefinition]) -> String {
    let config = GeneratorConfig::default();
    let route = RouteDefinition::new("run").with_handler("app::Run");
    let refs: Vec<&BehaviorDefinition> = behaviors.iter().collect();
    let mut out = SourceWriter::new();
    PipelineComposer::new(&config).compose(&mut out, &route, 0, &refs, |out| {
        out.line("app::Run::handle(args).await?;");
    });
    out.finish()
}

/// Identifiers of the hook calls for `method`, in emitted order.
fn hook_targets(text: &str, method: &str) -> Vec<String> {
    let prefix = format!("::switchyard_dispatch::Behavior::{}(behaviors::", method);
    text.lines()
        .filter_map(|line| line.trim().strip_prefix(prefix.as_str()))
        .filter_map(|rest| rest.split("()").next())
        .map(str::to_string)
        .collect()
}

fn type_name_strategy() -> impl Strategy<Value = String> {
    ("[a-c]{1,2}", "[A-C][a-c]{0,2}").prop_map(|(module, name)| format!("{}::{}", module, name))
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Text escaping is lossless.
    #[test]
    fn escape_text_round_trips(s in any::<String>()) {
        prop_assert_eq!(unescape(&escape_text(&s)), s);
    }

    /// Literal escaping is lossless.
    #[test]
    fn escape_literal_round_trips(s in any::<String>()) {
        prop_assert_eq!(unescape(&escape_literal(&s)), s);
    }

    /// Every quote in an escaped literal is preceded by an odd run of backslashes.
    #[test]
    fn escaped_literal_has_no_bare_quote(s in "[a-z\"\\\\ ]{0,40}") {
        let escaped = escape_literal(&s);
        let bytes = escaped.as_bytes();
        for (i, b) in bytes.iter().enumerate() {
            if *b == b'"' {
                let run = bytes[..i].iter().rev().take_while(|c| **c == b'\\').count();
                prop_assert!(run % 2 == 1, "bare quote at {} in {:?}", i, escaped);
            }
        }
    }

    /// Text escaping never leaves a raw line break.
    #[test]
    fn escaped_text_is_single_line(s in any::<String>()) {
        let escaped = escape_text(&s);
        prop_assert!(!escaped.contains('\n'));
        prop_assert!(!escaped.contains('\r'));
    }

    /// Before-hooks follow declared order; after- and error-hooks reverse it.
    #[test]
    fn hooks_follow_declared_and_reverse_order(count in 0usize..12) {
        let behaviors: Vec<BehaviorDefinition> = (0..count)
            .map(|i| BehaviorDefinition::new(format!("app::Step{}", i)))
            .collect();
        let text = compose(&behaviors);

        let declared: Vec<String> = behaviors.iter().map(|b| b.identifier().to_string()).collect();
        let mut reversed = declared.clone();
        reversed.reverse();

        prop_assert_eq!(hook_targets(&text, "before"), declared);
        prop_assert_eq!(hook_targets(&text, "after"), reversed.clone());
        prop_assert_eq!(hook_targets(&text, "on_error"), reversed);
        prop_assert_eq!(text.matches("app::Run::handle(args).await?;").count(), 1);
        if count == 0 {
            prop_assert_eq!(text, "app::Run::handle(args).await?;\n".to_string());
        }
    }

    /// Distinct behavior types always get distinct identifiers.
    #[test]
    fn identifiers_are_unique(types in prop::collection::vec(type_name_strategy(), 0..12)) {
        let behaviors = types.iter().map(BehaviorDefinition::new).collect();
        let model = Model::new(GeneratorConfig::default(), behaviors, Vec::new(), Vec::new());

        let mut identifiers: Vec<&str> = model.behaviors().iter().map(|b| b.identifier()).collect();
        let total = identifiers.len();
        identifiers.sort_unstable();
        identifiers.dedup();
        prop_assert_eq!(identifiers.len(), total);
    }

    /// Identifiers depend only on the model, never on the run.
    #[test]
    fn identifiers_are_reproducible(types in prop::collection::vec(type_name_strategy(), 0..12)) {
        let build = || {
            let behaviors = types.iter().map(BehaviorDefinition::new).collect();
            Model::new(GeneratorConfig::default(), behaviors, Vec::new(), Vec::new())
        };
        let first: Vec<String> = build().behaviors().iter().map(|b| b.identifier().to_string()).collect();
        let second: Vec<String> = build().behaviors().iter().map(|b| b.identifier().to_string()).collect();
        prop_assert_eq!(first, second);
    }
}
