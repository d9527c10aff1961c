//! Indentation-aware buffer for emitted source text.
//!
//! Every planner writes through a [`SourceWriter`], so nested blocks come out
//! consistently indented no matter which component opened them.

const INDENT_UNIT: &str = "    ";

/// A line-oriented source text buffer.
#[derive(Debug, Clone, Default)]
pub struct SourceWriter {
    buf: String,
    depth: usize,
}

impl SourceWriter {
    /// Creates an empty writer at depth zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty writer whose lines start at `depth`.
    ///
    /// Used for sections that the file template places inside a module.
    pub fn with_depth(depth: usize) -> Self {
        Self {
            buf: String::new(),
            depth,
        }
    }

    /// Current indentation depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Writes one line at the current depth.
    ///
    /// Embedded newlines are split so every physical line gets indented.
    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        for part in text.as_ref().split('\n') {
            if part.is_empty() {
                self.buf.push('\n');
                continue;
            }
            for _ in 0..self.depth {
                self.buf.push_str(INDENT_UNIT);
            }
            self.buf.push_str(part);
            self.buf.push('\n');
        }
        self
    }

    /// Writes an empty line.
    pub fn blank(&mut self) -> &mut Self {
        self.buf.push('\n');
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.depth += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self
    }

    /// Writes `open`, the body one level deeper, then `close`.
    pub fn block<F>(&mut self, open: impl AsRef<str>, close: impl AsRef<str>, body: F) -> &mut Self
    where
        F: FnOnce(&mut SourceWriter),
    {
        self.line(open);
        self.indent();
        body(self);
        self.dedent();
        self.line(close)
    }

    /// True if nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The text written so far.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Consumes the writer, returning the text.
    pub fn finish(self) -> String {
        self.buf
    }
}
