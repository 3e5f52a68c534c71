use serde::{Deserialize, Serialize};

/// A maximal contiguous span of units flagged as needing correction,
/// possibly widened by run-merging to absorb short trusted gaps.
///
/// Positions index into the pre-merged unit sequence, half-open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// First unit position in the run
    pub start: usize,
    /// One past the last unit position
    pub end: usize,
}

impl Run {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of units covered by this run
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// One oracle request's worth of units, bounded by the character budget.
///
/// Carries the stable utterance indices so reconciliation is id-keyed and
/// independent of response order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable `Utterance::index` values of the member units, in order
    pub ids: Vec<usize>,
    /// Sum of member text character counts
    pub char_count: usize,
}

impl Chunk {
    /// Number of units in this chunk
    pub fn unit_count(&self) -> usize {
        self.ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_len() {
        let run = Run::new(3, 9);
        assert_eq!(run.len(), 6);
        assert!(!run.is_empty());
        assert!(Run::new(4, 4).is_empty());
    }
}
