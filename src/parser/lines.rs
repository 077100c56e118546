//! Fragment-to-line reassembly for streamed text.
//!
//! Providers deliver output in fragments cut without regard for line
//! boundaries. [`LineAssembler`] buffers fragments and hands back each line
//! the moment its terminating newline arrives.

/// Buffers stream fragments and yields complete `'\n'`-terminated lines.
///
/// Text after the last newline stays buffered until a later fragment
/// completes it or [`flush`](Self::flush) is called at end of stream.
#[derive(Debug, Default)]
pub struct LineAssembler {
    buffer: String,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment and returns every line it completes, in arrival
    /// order, newlines excluded. An empty fragment completes nothing.
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        if fragment.is_empty() {
            return Vec::new();
        }
        self.buffer.push_str(fragment);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let mut line: String = self.buffer.drain(..=pos).collect();
            line.pop();
            lines.push(line);
        }
        lines
    }

    /// Takes the buffered remainder as one final, unterminated line.
    /// Returns `None` when nothing is buffered.
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }

    /// Text received after the last newline, still awaiting completion.
    pub fn pending(&self) -> &str {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_line_at_newline() {
        let mut asm = LineAssembler::new();
        assert_eq!(asm.push("hello\n"), vec!["hello"]);
        assert_eq!(asm.pending(), "");
    }

    #[test]
    fn holds_partial_line_until_completed() {
        let mut asm = LineAssembler::new();
        assert!(asm.push("hel").is_empty());
        assert!(asm.push("lo wor").is_empty());
        assert_eq!(asm.push("ld\n"), vec!["hello world"]);
    }

    #[test]
    fn splits_multiple_lines_in_one_fragment() {
        let mut asm = LineAssembler::new();
        assert_eq!(asm.push("a\nb\nc\n"), vec!["a", "b", "c"]);
    }

    #[test]
    fn preserves_empty_lines() {
        let mut asm = LineAssembler::new();
        assert_eq!(asm.push("a\n\nb\n"), vec!["a", "", "b"]);
    }

    #[test]
    fn empty_fragment_is_noop() {
        let mut asm = LineAssembler::new();
        assert!(asm.push("").is_empty());
        assert!(asm.push("partial").is_empty());
        assert!(asm.push("").is_empty());
        assert_eq!(asm.pending(), "partial");
    }

    #[test]
    fn fragment_boundary_inside_line_does_not_split() {
        let mut asm = LineAssembler::new();
        assert_eq!(asm.push("first\nsec"), vec!["first"]);
        assert_eq!(asm.push("ond\n"), vec!["second"]);
    }

    #[test]
    fn flush_returns_remainder_once() {
        let mut asm = LineAssembler::new();
        asm.push("tail without newline");
        assert_eq!(asm.flush().as_deref(), Some("tail without newline"));
        assert_eq!(asm.flush(), None);
    }

    #[test]
    fn flush_after_terminated_line_is_none() {
        let mut asm = LineAssembler::new();
        asm.push("done\n");
        assert_eq!(asm.flush(), None);
    }

    #[test]
    fn newline_only_fragment_completes_pending_text() {
        let mut asm = LineAssembler::new();
        asm.push("end marker");
        assert_eq!(asm.push("\n"), vec!["end marker"]);
    }
}
