//! The application side of the fixture model: behaviors, services and
//! handlers named by `fixtures/deploy.yaml`.
//!
//! Every hook and handler appends to a per-thread journal so tests can read
//! back the exact order in which the generated pipeline ran them.

use std::cell::RefCell;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use switchyard_dispatch::{
    async_trait, Behavior, BehaviorContext, BehaviorState, Fault, GeneratedState, NullLogger,
    Result, Terminal,
};

thread_local! {
    static JOURNAL: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

fn record(entry: impl Into<String>) {
    JOURNAL.with(|journal| journal.borrow_mut().push(entry.into()));
}

/// Drains the journal of the current thread.
pub fn take_journal() -> Vec<String> {
    JOURNAL.with(|journal| journal.borrow_mut().drain(..).collect())
}

#[derive(Debug, thiserror::Error)]
#[error("deploy target unreachable: {0}")]
pub struct Unreachable(pub String);

// =============================================================================
// Services
// =============================================================================

pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u128;
}

pub trait TimeSource: Send + Sync {
    fn started(&self) -> Instant;
}

/// One implementation registered under both `Clock` and `TimeSource`.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
    }
}

impl TimeSource for SystemClock {
    fn started(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Debug)]
pub struct Configuration {
    pub environment: &'static str,
}

// =============================================================================
// Behaviors
// =============================================================================

pub struct Logging {
    logger: NullLogger<Logging>,
    clock: &'static dyn Clock,
}

impl Logging {
    pub fn new(logger: NullLogger<Logging>, clock: &'static dyn Clock) -> Self {
        Self { logger, clock }
    }
}

#[async_trait]
impl Behavior for Logging {
    type State = GeneratedState<Logging>;

    async fn before(&self, state: &mut Self::State) -> Result<()> {
        self.logger
            .debug(format_args!("{} at {}", state.command_name(), self.clock.now_millis()));
        record(format!("before(Logging) {}", state.command_name()));
        Ok(())
    }

    async fn after(&self, _state: &mut Self::State) -> Result<()> {
        record("after(Logging)");
        Ok(())
    }

    async fn on_error(&self, _state: &mut Self::State, fault: &Fault) -> Result<()> {
        record(format!("error(Logging, {})", fault));
        Ok(())
    }
}

pub struct TimingState {
    context: BehaviorContext,
    started: Option<Instant>,
}

impl BehaviorState for TimingState {
    fn from_context(context: BehaviorContext) -> Self {
        Self {
            context,
            started: None,
        }
    }

    fn context(&self) -> &BehaviorContext {
        &self.context
    }
}

pub struct Timing {
    configuration: &'static Configuration,
    time: &'static dyn TimeSource,
}

impl Timing {
    pub fn new(configuration: &'static Configuration, time: &'static dyn TimeSource) -> Self {
        Self {
            configuration,
            time,
        }
    }
}

#[async_trait]
impl Behavior for Timing {
    type State = TimingState;

    async fn before(&self, state: &mut Self::State) -> Result<()> {
        state.started = Some(self.time.started());
        record(format!("before(Timing) {}", self.configuration.environment));
        Ok(())
    }

    async fn after(&self, state: &mut Self::State) -> Result<()> {
        let timed = state.started.is_some();
        record(format!("after(Timing) timed={}", timed));
        Ok(())
    }

    async fn on_error(&self, _state: &mut Self::State, fault: &Fault) -> Result<()> {
        record(format!("error(Timing, {})", fault));
        Ok(())
    }
}

pub struct Audit {
    terminal: &'static dyn Terminal,
}

impl Audit {
    pub fn new(terminal: &'static dyn Terminal) -> Self {
        Self { terminal }
    }
}

#[async_trait]
impl Behavior for Audit {
    type State = GeneratedState<Audit>;

    async fn before(&self, state: &mut Self::State) -> Result<()> {
        record(format!("before(Audit) {}", state.handler_name()));
        Ok(())
    }

    async fn after(&self, _state: &mut Self::State) -> Result<()> {
        record("after(Audit)");
        Ok(())
    }

    async fn on_error(&self, state: &mut Self::State, fault: &Fault) -> Result<()> {
        self.terminal
            .write_error_line(&format!("{} failed: {}", state.command_name(), fault))?;
        record(format!("error(Audit, {})", fault));
        Ok(())
    }
}

// =============================================================================
// Handlers
// =============================================================================

pub struct DeployHandler;

impl DeployHandler {
    pub async fn handle(args: &[String]) -> Result<()> {
        let target = args.first().map(String::as_str).unwrap_or("staging");
        record(format!("handler(deploy {})", target));
        if target == "moon" {
            return Err(Unreachable(target.to_string()).into());
        }
        Ok(())
    }
}

pub struct StatusHandler;

impl StatusHandler {
    pub async fn handle(_args: &[String]) -> Result<()> {
        record("handler(status)");
        Ok(())
    }
}
