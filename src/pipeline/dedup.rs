//! Overlap removal between consecutive transcript fragments.
//!
//! Because chunks share trailing audio, each new fragment is expected to
//! repeat the tail of the previous chunk's transcript as its head. This
//! module strips that repetition with a greedy longest suffix/prefix match
//! against a rolling window of already-emitted text.
//!
//! The match assumes a single contiguous overlap run per boundary. A backend
//! that re-words the overlapped audio ("OK" vs "Okay") defeats it; duplicate
//! text slipping through or a legitimately repeated word being swallowed are
//! accepted tradeoffs of real-time operation.

use crate::defaults;

/// Rolling tail of emitted text plus the overlap-removal logic.
pub struct OverlapDeduplicator {
    /// Last ≤ `retain_chars` characters emitted. Comparison window only,
    /// never a transcript archive.
    tail: String,
    retain_chars: usize,
}

impl OverlapDeduplicator {
    /// Creates a deduplicator with the default retention window.
    pub fn new() -> Self {
        Self::with_retention(defaults::PRINTED_TAIL_CHARS)
    }

    /// Creates a deduplicator retaining up to `retain_chars` characters.
    pub fn with_retention(retain_chars: usize) -> Self {
        Self {
            tail: String::new(),
            retain_chars,
        }
    }

    /// Current comparison window.
    pub fn tail(&self) -> &str {
        &self.tail
    }

    /// Removes the overlap from `fragment` and returns the new text to emit.
    ///
    /// Returns `None` when the fragment is empty or fully duplicates the
    /// tail; callers must then skip printing and risk scanning entirely.
    /// On `Some`, the delta has already been appended to the tail.
    pub fn apply(&mut self, fragment: &str) -> Option<String> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return None;
        }

        let k = longest_suffix_prefix(&self.tail, fragment);
        let delta = fragment[k..].trim();
        if delta.is_empty() {
            return None;
        }

        if !self.tail.is_empty() {
            self.tail.push(' ');
        }
        self.tail.push_str(delta);
        self.truncate_tail();

        Some(delta.to_string())
    }

    /// Drops leading characters so at most `retain_chars` remain.
    fn truncate_tail(&mut self) {
        let excess = self.tail.chars().count().saturating_sub(self.retain_chars);
        if excess > 0 {
            let cut = self
                .tail
                .char_indices()
                .nth(excess)
                .map(|(i, _)| i)
                .unwrap_or(self.tail.len());
            self.tail.drain(..cut);
        }
    }
}

impl Default for OverlapDeduplicator {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest `k` such that the last `k` bytes of `tail` equal the first `k`
/// bytes of `fragment`, scanning from the maximum bound downward.
///
/// Greedy longest-match: taking the first (largest) hit avoids cutting on a
/// small accidental repeat inside a genuine longer overlap. Only positions
/// that are char boundaries in both strings are considered, so the split is
/// always valid UTF-8.
fn longest_suffix_prefix(tail: &str, fragment: &str) -> usize {
    let max = tail.len().min(fragment.len());
    for k in (1..=max).rev() {
        if !fragment.is_char_boundary(k) {
            continue;
        }
        let split = tail.len() - k;
        if !tail.is_char_boundary(split) {
            continue;
        }
        if tail.as_bytes()[split..] == fragment.as_bytes()[..k] {
            return k;
        }
    }
    0
}
