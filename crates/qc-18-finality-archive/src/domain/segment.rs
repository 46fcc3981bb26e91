//! # Segment Lifecycle
//!
//! A segment is an immutable blob of finalized ledger history identified by a
//! strictly increasing id. Every archive call drives one segment through:
//!
//! ```text
//! Pending ──→ Compressing ──→ Writing ──→ Durable
//!    │             │             │
//!    └─────────────┴─────────────┴──────→ Failed
//! ```
//!
//! `Durable` and `Failed` are terminal. There is no half-written durable state.

use std::fmt;

/// Logical identifier of an archived segment (finality height or sequence number).
pub type SegmentId = u64;

/// Write-path state of a single segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentState {
    /// Id reserved, nothing computed yet.
    Pending,
    /// Checksum and transform running.
    Compressing,
    /// Envelope submitted to the key-value store.
    Writing,
    /// Envelope persisted and index entry recorded.
    Durable,
    /// Any step errored; nothing was indexed.
    Failed,
}

impl SegmentState {
    /// Whether no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SegmentState::Durable | SegmentState::Failed)
    }

    /// Check whether `self → next` is a legal transition.
    pub fn can_transition_to(&self, next: SegmentState) -> bool {
        use SegmentState::*;
        matches!(
            (self, next),
            (Pending, Compressing)
                | (Compressing, Writing)
                | (Writing, Durable)
                | (Pending, Failed)
                | (Compressing, Failed)
                | (Writing, Failed)
        )
    }

    /// Move to `next`, returning `false` (and staying put) on an illegal transition.
    pub fn advance(&mut self, next: SegmentState) -> bool {
        if self.can_transition_to(next) {
            *self = next;
            true
        } else {
            false
        }
    }
}

impl fmt::Display for SegmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SegmentState::Pending => "pending",
            SegmentState::Compressing => "compressing",
            SegmentState::Writing => "writing",
            SegmentState::Durable => "durable",
            SegmentState::Failed => "failed",
        };
        f.write_str(name)
    }
}
