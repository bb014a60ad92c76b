//! Append-only conversation transcript with a bounded window.
//!
//! The transcript is owned exclusively by the session state machine; every
//! dispatched turn appends exactly one `system` or `error` entry summarising
//! its outcome, plus the `user` entry for the utterance itself.

use chrono::{DateTime, Local};
use std::collections::VecDeque;
use uuid::Uuid;

/// Maximum number of entries retained; oldest entries are evicted first.
pub const TRANSCRIPT_CAP: usize = 100;

/// Classification of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Verbatim user utterance.
    User,
    /// Assistant action summary or answer.
    System,
    /// User-visible failure.
    Error,
}

/// One line of the conversation log.
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    /// Unique entry id.
    pub id: Uuid,
    pub kind: EntryKind,
    pub text: String,
    /// Wall-clock time the entry was appended.
    pub timestamp: DateTime<Local>,
}

/// Bounded FIFO transcript buffer.
#[derive(Debug, Default)]
pub struct Transcript {
    entries: VecDeque<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(TRANSCRIPT_CAP),
        }
    }

    /// Append an entry, evicting the oldest when the cap is exceeded.
    ///
    /// Returns a clone of the appended entry for event broadcasting.
    pub fn push(&mut self, kind: EntryKind, text: impl Into<String>) -> TranscriptEntry {
        let entry = TranscriptEntry {
            id: Uuid::new_v4(),
            kind,
            text: text.into(),
            timestamp: Local::now(),
        };
        self.entries.push_back(entry.clone());
        while self.entries.len() > TRANSCRIPT_CAP {
            let _ = self.entries.pop_front();
        }
        entry
    }

    /// Entries in chronological order.
    pub fn entries(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry, if any.
    pub fn last(&self) -> Option<&TranscriptEntry> {
        self.entries.back()
    }
}
