//! Budget-aware output accumulator
//!
//! Collects selected records in stream order and keeps their total size in
//! check: a mid-stream purge drops the middle of the record list once the soft
//! limit is crossed, and a final raw cut enforces the hard character budget.

use tracing::{debug, info, warn};

/// Marker record inserted where a purge dropped records
pub const TRUNCATED_MIDDLE: &str = "\n... [TRUNCATED-MIDDLE] ...\n";

/// Marker appended after the final character cut
pub const TRUNCATED_END: &str = "\n... [TRUNCATED-END] ...";

/// Tag prepended to randomly sampled ordinary lines
pub const SAMPLE_TAG: &str = "[SAMPLE] ";

/// One unit of reduced output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionRecord {
    /// Lines preceding the alert at `alert_seq`, header included
    ContextBlock { alert_seq: usize, text: String },
    /// A suspicious or connection line, verbatim
    AlertLine { seq: usize, text: String },
    /// A sampled ordinary line, tag included
    SampleLine { seq: usize, text: String },
    /// Stands in for records dropped by a purge
    TruncatedMiddle,
}

impl SelectionRecord {
    pub fn context(alert_seq: usize, text: String) -> Self {
        Self::ContextBlock { alert_seq, text }
    }

    pub fn alert(seq: usize, text: impl Into<String>) -> Self {
        Self::AlertLine { seq, text: text.into() }
    }

    pub fn sample(seq: usize, line: &str) -> Self {
        Self::SampleLine {
            seq,
            text: format!("{}{}", SAMPLE_TAG, line),
        }
    }

    /// Serialized form of this record
    pub fn as_str(&self) -> &str {
        match self {
            Self::ContextBlock { text, .. } | Self::AlertLine { text, .. } | Self::SampleLine { text, .. } => text,
            Self::TruncatedMiddle => TRUNCATED_MIDDLE,
        }
    }

    /// Stream position this record is anchored to
    #[cfg(test)]
    fn seq(&self) -> Option<usize> {
        match self {
            Self::ContextBlock { alert_seq, .. } => Some(*alert_seq),
            Self::AlertLine { seq, .. } | Self::SampleLine { seq, .. } => Some(*seq),
            Self::TruncatedMiddle => None,
        }
    }
}

/// Size limits applied while accumulating
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetPolicy {
    /// Hard budget for the final text, in characters
    pub max_chars: usize,
    /// Purge once the running length exceeds `max_chars * soft_limit_ratio`
    pub soft_limit_ratio: f64,
    /// ...and more than this many records are held
    pub purge_min_records: usize,
    /// Records kept from the start on purge
    pub purge_head: usize,
    /// Records kept from the end on purge
    pub purge_tail: usize,
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        Self {
            max_chars: crate::DEFAULT_MAX_CHARS,
            soft_limit_ratio: 1.2,
            purge_min_records: 2000,
            purge_head: 1000,
            purge_tail: 1000,
        }
    }
}

impl BudgetPolicy {
    fn soft_limit(&self) -> f64 {
        self.max_chars as f64 * self.soft_limit_ratio
    }
}

#[derive(Debug)]
struct Entry {
    record: SelectionRecord,
    chars: usize,
}

impl Entry {
    fn new(record: SelectionRecord) -> Self {
        let chars = record.as_str().chars().count();
        Self { record, chars }
    }
}

/// Final text produced by [`Accumulator::finish`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finished {
    pub text: String,
    /// Whether the hard budget cut was applied
    pub truncated: bool,
}

/// Ordered record list with an exact running character count
#[derive(Debug)]
pub struct Accumulator {
    policy: BudgetPolicy,
    entries: Vec<Entry>,
    total_chars: usize,
    purges: usize,
}

impl Accumulator {
    pub fn new(policy: BudgetPolicy) -> Self {
        debug!(?policy, "Accumulator::new: called");
        Self {
            policy,
            entries: Vec::new(),
            total_chars: 0,
            purges: 0,
        }
    }

    pub fn push(&mut self, record: SelectionRecord) {
        let entry = Entry::new(record);
        self.total_chars += entry.chars;
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialized length of all held records, in characters
    pub fn total_chars(&self) -> usize {
        self.total_chars
    }

    /// Number of purges performed so far
    pub fn purges(&self) -> usize {
        self.purges
    }

    #[cfg(test)]
    fn records(&self) -> impl Iterator<Item = &SelectionRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    /// Purge the middle of the record list if both soft limits are exceeded
    ///
    /// Returns true when a purge happened.
    pub fn check_budget(&mut self) -> bool {
        if (self.total_chars as f64) <= self.policy.soft_limit() {
            return false;
        }
        if self.entries.len() <= self.policy.purge_min_records {
            return false;
        }
        self.purge()
    }

    /// Keep the head and tail windows with one marker in between
    fn purge(&mut self) -> bool {
        let len = self.entries.len();
        let head = self.policy.purge_head;
        let tail = self.policy.purge_tail;
        if head.saturating_add(tail) >= len {
            debug!(%len, %head, %tail, "Accumulator::purge: windows cover everything, skipping");
            return false;
        }

        let dropped = self.entries.drain(head..len - tail).count();
        self.entries.insert(head, Entry::new(SelectionRecord::TruncatedMiddle));
        self.total_chars = self.entries.iter().map(|e| e.chars).sum();
        self.purges += 1;

        warn!(
            %dropped,
            remaining_chars = self.total_chars,
            "Size limit approached, dropped the middle of the selection"
        );
        true
    }

    /// Concatenate all records and apply the hard character budget
    ///
    /// The cut is a raw character-position cut: it may split a line or a
    /// grapheme cluster, but never a UTF-8 sequence.
    pub fn finish(self) -> Finished {
        debug!(records = self.entries.len(), total_chars = self.total_chars, "Accumulator::finish: called");
        let max_chars = self.policy.max_chars;
        let byte_len: usize = self.entries.iter().map(|e| e.record.as_str().len()).sum();
        let mut text = String::with_capacity(byte_len + TRUNCATED_END.len());
        for entry in &self.entries {
            text.push_str(entry.record.as_str());
        }

        if self.total_chars <= max_chars {
            return Finished { text, truncated: false };
        }

        info!("Final truncation to {} characters", max_chars);
        if let Some((cut, _)) = text.char_indices().nth(max_chars) {
            text.truncate(cut);
        }
        text.push_str(TRUNCATED_END);
        Finished { text, truncated: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_policy(max_chars: usize) -> BudgetPolicy {
        BudgetPolicy {
            max_chars,
            ..Default::default()
        }
    }

    #[test]
    fn test_records_serialize_in_order() {
        let mut acc = Accumulator::new(small_policy(1000));
        acc.push(SelectionRecord::context(1, "--- CONTEXT ---\na\n".to_string()));
        acc.push(SelectionRecord::alert(1, "FAIL\n"));
        acc.push(SelectionRecord::sample(5, "ordinary\n"));

        assert_eq!(acc.total_chars(), "--- CONTEXT ---\na\nFAIL\n[SAMPLE] ordinary\n".chars().count());

        let finished = acc.finish();
        assert!(!finished.truncated);
        assert_eq!(finished.text, "--- CONTEXT ---\na\nFAIL\n[SAMPLE] ordinary\n");
    }

    #[test]
    fn test_final_cut_is_exact() {
        let mut acc = Accumulator::new(small_policy(100));
        for i in 0..20 {
            acc.push(SelectionRecord::alert(i, format!("530 Login incorrect #{:02}\n", i)));
        }
        assert!(acc.total_chars() > 100);

        let finished = acc.finish();
        assert!(finished.truncated);
        assert!(finished.text.ends_with(TRUNCATED_END));
        let body = finished.text.strip_suffix(TRUNCATED_END).unwrap();
        assert_eq!(body.chars().count(), 100);
        assert_eq!(finished.text.chars().count(), 100 + TRUNCATED_END.chars().count());
    }

    #[test]
    fn test_exactly_at_budget_is_not_cut() {
        let mut acc = Accumulator::new(small_policy(10));
        acc.push(SelectionRecord::alert(0, "0123456789"));

        let finished = acc.finish();
        assert!(!finished.truncated);
        assert_eq!(finished.text, "0123456789");
    }

    #[test]
    fn test_final_cut_counts_characters_not_bytes() {
        let mut acc = Accumulator::new(small_policy(3));
        acc.push(SelectionRecord::alert(0, "ééééé"));

        let finished = acc.finish();
        assert_eq!(finished.text, format!("ééé{}", TRUNCATED_END));
    }

    #[test]
    fn test_no_purge_below_record_threshold() {
        let mut acc = Accumulator::new(small_policy(10));
        for i in 0..2000 {
            acc.push(SelectionRecord::alert(i, "530 denied\n"));
            assert!(!acc.check_budget());
        }
        assert_eq!(acc.len(), 2000);
        assert_eq!(acc.purges(), 0);
    }

    #[test]
    fn test_no_purge_below_soft_limit() {
        let mut acc = Accumulator::new(small_policy(1_000_000));
        for i in 0..3000 {
            acc.push(SelectionRecord::alert(i, "x\n"));
            assert!(!acc.check_budget());
        }
        assert_eq!(acc.len(), 3000);
    }

    #[test]
    fn test_purge_keeps_head_and_tail() {
        let mut acc = Accumulator::new(small_policy(100));
        for i in 0..2001 {
            acc.push(SelectionRecord::alert(i, format!("{}\n", i)));
        }

        assert!(acc.check_budget());
        assert_eq!(acc.purges(), 1);
        assert_eq!(acc.len(), 2001);

        let records: Vec<_> = acc.records().cloned().collect();
        assert_eq!(records[0].seq(), Some(0));
        assert_eq!(records[999].seq(), Some(999));
        assert_eq!(records[1000], SelectionRecord::TruncatedMiddle);
        assert_eq!(records[1001].seq(), Some(1001));
        assert_eq!(records[2000].seq(), Some(2000));
        assert_eq!(
            records.iter().filter(|r| **r == SelectionRecord::TruncatedMiddle).count(),
            1
        );

        let expected: usize = records.iter().map(|r| r.as_str().chars().count()).sum();
        assert_eq!(acc.total_chars(), expected);
    }

    #[test]
    fn test_oversized_purge_windows_skip_purge() {
        let mut acc = Accumulator::new(BudgetPolicy {
            max_chars: 10,
            soft_limit_ratio: 1.0,
            purge_min_records: 2,
            purge_head: usize::MAX,
            purge_tail: 1,
        });
        for i in 0..5 {
            acc.push(SelectionRecord::alert(i, "530 denied\n"));
            assert!(!acc.check_budget());
        }
        assert_eq!(acc.len(), 5);
        assert_eq!(acc.purges(), 0);
    }

    #[test]
    fn test_repeated_purges_keep_single_marker() {
        let mut acc = Accumulator::new(small_policy(100));
        for i in 0..5000 {
            acc.push(SelectionRecord::alert(i, format!("{}\n", i)));
            acc.check_budget();
        }

        assert!(acc.purges() > 1);
        let records: Vec<_> = acc.records().cloned().collect();
        assert_eq!(records.len(), 2001);
        assert_eq!(records[0].seq(), Some(0));
        assert_eq!(records[1000], SelectionRecord::TruncatedMiddle);
        assert_eq!(records[2000].seq(), Some(4999));
        assert_eq!(
            records.iter().filter(|r| **r == SelectionRecord::TruncatedMiddle).count(),
            1
        );
    }
}
