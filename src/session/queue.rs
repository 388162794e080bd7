//! Instruction history and the reserved (deferred) queue.

use std::collections::VecDeque;
use serde::{Serialize, Deserialize};

/// Executed-line history plus lines waiting behind a breakpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionQueue {
    /// Every line handed to the engine, successful or not. Append-only.
    history: Vec<String>,
    /// Lines deferred past a breakpoint marker, oldest first.
    reserved: VecDeque<String>,
}

impl SessionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attempted line to the history.
    pub fn record(&mut self, line: impl Into<String>) {
        self.history.push(line.into());
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Add a line to the back of the reserved queue.
    pub fn enqueue(&mut self, line: impl Into<String>) {
        self.reserved.push_back(line.into());
    }

    /// Take the oldest reserved line.
    pub fn pop_next_reserved(&mut self) -> Option<String> {
        self.reserved.pop_front()
    }

    /// Peek at the line the next step would run.
    pub fn peek_reserved(&self) -> Option<&str> {
        self.reserved.front().map(String::as_str)
    }

    /// Reserved lines, oldest first.
    pub fn reserved(&self) -> impl Iterator<Item = &str> {
        self.reserved.iter().map(String::as_str)
    }

    pub fn reserved_len(&self) -> usize {
        self.reserved.len()
    }
}

/// Split script lines at the first breakpoint marker.
///
/// Returns the lines before the marker and the lines after it. Later marker
/// lines inside the deferred part are dropped.
pub fn split_at_marker<I, S>(lines: I, marker: &str) -> (Vec<String>, Vec<String>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut immediate = Vec::new();
    let mut deferred = Vec::new();
    let mut past_marker = false;

    for line in lines {
        let line = line.as_ref();
        if is_marker(line, marker) {
            past_marker = true;
            continue;
        }
        if past_marker {
            deferred.push(line.to_string());
        } else {
            immediate.push(line.to_string());
        }
    }

    (immediate, deferred)
}

/// Marker match ignores surrounding and repeated whitespace.
pub fn is_marker(line: &str, marker: &str) -> bool {
    !marker.trim().is_empty() && line.split_whitespace().eq(marker.split_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reserved_fifo() {
        let mut q = SessionQueue::new();
        for line in ["A", "B", "C"] {
            q.enqueue(line);
        }
        assert_eq!(q.peek_reserved(), Some("A"));
        assert_eq!(q.pop_next_reserved().as_deref(), Some("A"));
        assert_eq!(q.pop_next_reserved().as_deref(), Some("B"));
        assert_eq!(q.pop_next_reserved().as_deref(), Some("C"));
        assert_eq!(q.pop_next_reserved(), None);
    }

    #[test]
    fn test_split_at_marker() {
        let lines = ["MOV r0, #1", "@@ break", "MOV r1, #2", "  @@   break ", "MOV r2, #3"];
        let (now, later) = split_at_marker(lines, "@@ break");
        assert_eq!(now, vec!["MOV r0, #1"]);
        assert_eq!(later, vec!["MOV r1, #2", "MOV r2, #3"]);
    }

    #[test]
    fn test_split_without_marker() {
        let (now, later) = split_at_marker(["MOV r0, #1"], "@@ break");
        assert_eq!(now.len(), 1);
        assert!(later.is_empty());
    }

    #[test]
    fn test_empty_marker_never_matches() {
        assert!(!is_marker("", ""));
        assert!(!is_marker("MOV r0, #1", "  "));
    }

    proptest! {
        #[test]
        fn prop_reserved_is_fifo(lines in prop::collection::vec("[A-Z]{1,6}", 0..20)) {
            let mut q = SessionQueue::new();
            for line in &lines {
                q.enqueue(line.clone());
            }
            let mut out = Vec::new();
            while let Some(line) = q.pop_next_reserved() {
                out.push(line);
            }
            prop_assert_eq!(out, lines);
            prop_assert!(q.pop_next_reserved().is_none());
        }

        #[test]
        fn prop_history_only_grows(lines in prop::collection::vec(".{0,12}", 0..20)) {
            let mut q = SessionQueue::new();
            for (i, line) in lines.iter().enumerate() {
                q.record(line.clone());
                prop_assert_eq!(q.history().len(), i + 1);
            }
            prop_assert_eq!(q.history(), lines.as_slice());
        }
    }
}
