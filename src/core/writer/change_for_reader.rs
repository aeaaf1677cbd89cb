// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-change delivery state for one matched reader (RTPS Sec.8.4.7, `ChangeForReader`).
//!
//! A [`ReliableWriterProxy`](super::ReliableWriterProxy) tracks one
//! `ChangeForReader` entry per history-cache sequence number it still has
//! an opinion about. The entry moves through the state machine described
//! in DDSI-RTPS Sec.8.4.7.2:
//!
//! ```text
//!            next_unsent_change()                 nack bitmap contains seq
//!  UNSENT ─────────────────────────► UNDERWAY ─────────────────────────► REQUESTED
//!    ▲                                    │
//!    │                                    │ nack-suppression timer fires
//!    │                                    ▼
//!    │                               UNACKNOWLEDGED
//!    │                                    │
//!    └──────── (repair resend) ◄──────────┘
//!                                         │ ack >= seq
//!                                         ▼
//!                                   ACKNOWLEDGED (may be freed from history)
//! ```

use std::collections::BTreeMap;

/// Delivery status of one cache change with respect to one matched reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeForReaderStatus {
    /// Not yet sent to this reader.
    Unsent,
    /// Sent once; not yet eligible for repair (nack-suppression still running).
    Underway,
    /// Nack-suppression elapsed with no ack; eligible for repair on NACK.
    Unacknowledged,
    /// Named in a NACK bitmap; a repair resend is due.
    Requested,
    /// Acknowledged by the reader (or presumed acknowledged); may be freed
    /// from history once every relevant reader agrees.
    Acknowledged,
}

/// One entry in a [`ChangeForReaderSet`].
#[derive(Debug, Clone, Copy)]
pub struct ChangeForReader {
    pub seq: u64,
    pub status: ChangeForReaderStatus,
    /// False when a registered content filter excludes this reader from the
    /// change; a GAP is sent for irrelevant changes instead of DATA.
    pub is_relevant: bool,
}

/// Per-reader table of `ChangeForReader` entries, ordered by sequence number.
///
/// Owned exclusively by the reader proxy it belongs to; never shared across
/// proxies or mutated from outside the stateful writer's lock.
#[derive(Debug, Default)]
pub struct ChangeForReaderSet {
    table: BTreeMap<u64, ChangeForReader>,
}

impl ChangeForReaderSet {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: BTreeMap::new(),
        }
    }

    /// Add a newly-cached change as UNSENT for this reader.
    pub fn add_unsent(&mut self, seq: u64, is_relevant: bool) {
        self.table.insert(
            seq,
            ChangeForReader {
                seq,
                status: ChangeForReaderStatus::Unsent,
                is_relevant,
            },
        );
    }

    /// Smallest UNSENT sequence number, if any (ascending send order).
    #[must_use]
    pub fn next_unsent(&self) -> Option<u64> {
        self.table
            .values()
            .find(|c| c.status == ChangeForReaderStatus::Unsent)
            .map(|c| c.seq)
    }

    /// All UNSENT sequence numbers in ascending order.
    pub fn unsent_changes(&self) -> Vec<u64> {
        self.table
            .values()
            .filter(|c| c.status == ChangeForReaderStatus::Unsent)
            .map(|c| c.seq)
            .collect()
    }

    /// Transition a change to UNDERWAY after it has been put on the wire.
    /// It is not eligible for repair until [`Self::mark_unacknowledged`] runs.
    pub fn mark_underway(&mut self, seq: u64) {
        if let Some(c) = self.table.get_mut(&seq) {
            c.status = ChangeForReaderStatus::Underway;
        }
    }

    /// Nack-suppression duration elapsed for `seq`: it may now be repaired.
    pub fn mark_unacknowledged(&mut self, seq: u64) {
        if let Some(c) = self.table.get_mut(&seq) {
            if c.status == ChangeForReaderStatus::Underway {
                c.status = ChangeForReaderStatus::Unacknowledged;
            }
        }
    }

    /// Mark every sequence named in a NACK bitmap as REQUESTED. Sequences no
    /// longer tracked (already freed from history) are skipped by the
    /// caller, which should emit a GAP for them instead.
    pub fn mark_requested(&mut self, seqs: &[u64]) {
        for &seq in seqs {
            if let Some(c) = self.table.get_mut(&seq) {
                c.status = ChangeForReaderStatus::Requested;
            }
        }
    }

    /// All REQUESTED sequence numbers in ascending order, for repair resend.
    pub fn requested_changes(&self) -> Vec<u64> {
        self.table
            .values()
            .filter(|c| c.status == ChangeForReaderStatus::Requested)
            .map(|c| c.seq)
            .collect()
    }

    /// Acknowledge every change up to and including `ack_seq`.
    pub fn acknowledge_up_to(&mut self, ack_seq: u64) {
        for c in self.table.values_mut() {
            if c.seq <= ack_seq {
                c.status = ChangeForReaderStatus::Acknowledged;
            }
        }
    }

    /// True if every tracked change is ACKNOWLEDGED or irrelevant.
    #[must_use]
    pub fn all_acknowledged(&self) -> bool {
        self.table
            .values()
            .all(|c| c.status == ChangeForReaderStatus::Acknowledged || !c.is_relevant)
    }

    /// True if this reader has any non-ACKNOWLEDGED relevant change --
    /// used to decide whether a HEARTBEAT's Final flag may be set.
    #[must_use]
    pub fn has_unacknowledged(&self) -> bool {
        self.table
            .values()
            .any(|c| c.is_relevant && c.status != ChangeForReaderStatus::Acknowledged)
    }

    /// Drop the entry for `seq` (history eviction / removal).
    pub fn remove(&mut self, seq: u64) -> Option<ChangeForReader> {
        self.table.remove(&seq)
    }

    /// Current status of one sequence number, if tracked.
    #[must_use]
    pub fn status(&self, seq: u64) -> Option<ChangeForReaderStatus> {
        self.table.get(&seq).map(|c| c.status)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
