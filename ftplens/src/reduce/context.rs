//! Sliding context window
//!
//! Keeps the last few lines seen so that a suspicious line can be emitted
//! together with what led up to it.

use std::collections::VecDeque;

use tracing::debug;

use super::LogLine;

/// Header that starts every flushed context block
pub const CONTEXT_HEADER: &str = "--- CONTEXT ---\n";

#[derive(Debug)]
struct Slot {
    line: LogLine,
    /// Already in the output as an alert; skipped when a block is built
    emitted: bool,
}

/// Bounded FIFO of the most recent lines, current line included
#[derive(Debug)]
pub struct ContextBuffer {
    slots: VecDeque<Slot>,
    capacity: usize,
}

impl ContextBuffer {
    /// Create a buffer holding `context_lines` preceding lines plus the current one
    pub fn new(context_lines: usize) -> Self {
        debug!(%context_lines, "ContextBuffer::new: called");
        let capacity = context_lines.saturating_add(1);
        Self {
            slots: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Maximum number of lines held at once
    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Append a line, evicting the oldest one when over capacity
    pub fn push(&mut self, line: LogLine) {
        self.slots.push_back(Slot { line, emitted: false });
        if self.slots.len() > self.capacity {
            self.slots.pop_front();
        }
    }

    /// Emit everything before the most recent line as one tagged block
    ///
    /// The buffer is then reset to just the current line. That line is
    /// already in the output as an alert, so it keeps its slot in the window
    /// but is left out of the next block: a block only ever holds lines
    /// strictly between the previous flush and the new alert. Returns `None`
    /// when there is nothing before the current line to emit.
    pub fn flush_context(&mut self) -> Option<String> {
        let mut current = self.slots.pop_back()?;
        current.emitted = true;

        let mut block = String::from(CONTEXT_HEADER);
        let mut emitted = 0usize;
        for slot in self.slots.drain(..).filter(|s| !s.emitted) {
            block.push_str(&slot.line.text);
            emitted += 1;
        }
        self.slots.push_back(current);

        if emitted == 0 {
            debug!("ContextBuffer::flush_context: nothing new before current line");
            return None;
        }

        debug!(%emitted, block_len = block.len(), "ContextBuffer::flush_context: flushed");
        Some(block)
    }

    /// Sequence numbers currently held, oldest first
    #[cfg(test)]
    fn seqs(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().map(|s| s.line.seq)
    }
}
