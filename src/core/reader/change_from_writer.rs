// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-change reception state for one matched writer (RTPS Sec.8.4.9, `ChangeFromWriter`).
//!
//! A [`ReliableReaderProxy`](super::ReliableReaderProxy) tracks one
//! `ChangeFromWriter` entry per sequence number it has an opinion about,
//! moving through the state machine of DDSI-RTPS Sec.8.4.9.2:
//!
//! ```text
//!                received_change_set(s)
//!  UNKNOWN ─────────────────────────────► RECEIVED
//!     │                                      ▲
//!     │ missing_changes_update(>=s)           │ received_change_set(s)
//!     ▼                                      │
//!  MISSING ──────────────────────────────────┘
//!     │ lost_changes_update(<s)
//!     ▼
//!  LOST
//! ```

use std::collections::BTreeMap;

/// Reception status of one sequence number from one matched writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeFromWriterStatus {
    /// Not yet known to exist (no HEARTBEAT or DATA has named it).
    Unknown,
    /// Named by a HEARTBEAT/GAP but not yet received.
    Missing,
    /// DATA for this sequence has been received and delivered/cached.
    Received,
    /// Declared permanently unavailable (GAP, or superseded by `lost_changes_update`).
    Lost,
}

/// Per-writer table of `ChangeFromWriter` entries.
#[derive(Debug, Default, Clone)]
pub struct ChangeFromWriterSet {
    table: BTreeMap<u64, ChangeFromWriterStatus>,
    /// Highest sequence number this proxy has ever been told about, via
    /// HEARTBEAT, DATA or GAP. Used to materialize UNKNOWN entries lazily
    /// instead of eagerly allocating one per sequence number.
    known_max: u64,
}

impl ChangeFromWriterSet {
    #[must_use]
    pub fn new() -> Self {
        Self {
            table: BTreeMap::new(),
            known_max: 0,
        }
    }

    fn materialize_up_to(&mut self, seq_max: u64) {
        while self.known_max < seq_max {
            self.known_max += 1;
            self.table
                .entry(self.known_max)
                .or_insert(ChangeFromWriterStatus::Unknown);
        }
    }

    /// DATA for `seq` has been received: mark RECEIVED regardless of any
    /// prior state. Sequences below `seq` that are still UNKNOWN are left
    /// alone -- they become MISSING only via an explicit HEARTBEAT.
    pub fn received_change_set(&mut self, seq: u64) {
        if seq > self.known_max {
            self.known_max = seq;
        }
        self.table.insert(seq, ChangeFromWriterStatus::Received);
    }

    /// A HEARTBEAT announced availability up to `seq_max`: every UNKNOWN
    /// entry at or below it becomes MISSING (materializing new UNKNOWN
    /// entries first for sequences never seen before).
    pub fn missing_changes_update(&mut self, seq_max: u64) {
        self.materialize_up_to(seq_max);
        for (&seq, status) in self.table.iter_mut() {
            if seq <= seq_max && *status == ChangeFromWriterStatus::Unknown {
                *status = ChangeFromWriterStatus::Missing;
            }
        }
    }

    /// A HEARTBEAT/GAP declared everything below `seq_min` gone: every
    /// UNKNOWN or MISSING entry strictly below it becomes LOST.
    pub fn lost_changes_update(&mut self, seq_min: u64) {
        for (&seq, status) in self.table.iter_mut() {
            if seq < seq_min
                && matches!(
                    status,
                    ChangeFromWriterStatus::Unknown | ChangeFromWriterStatus::Missing
                )
            {
                *status = ChangeFromWriterStatus::Lost;
            }
        }
    }

    /// GAP message: the enumerated sequences will never be sent. Recorded as
    /// RECEIVED-but-irrelevant so they advance the watermark without being
    /// delivered.
    pub fn gap(&mut self, seqs: &[u64]) {
        for &seq in seqs {
            if seq > self.known_max {
                self.known_max = seq;
            }
            self.table.insert(seq, ChangeFromWriterStatus::Lost);
        }
    }

    /// Largest seq such that every sequence number <= it is RECEIVED or
    /// LOST -- the advancement watermark delivered to the user per spec
    /// Sec.8.4.9.2.9 ("available_changes_max").
    #[must_use]
    pub fn available_changes_max(&self) -> u64 {
        let mut watermark = 0u64;
        for (&seq, status) in &self.table {
            if seq != watermark + 1 {
                break;
            }
            match status {
                ChangeFromWriterStatus::Received | ChangeFromWriterStatus::Lost => {
                    watermark = seq;
                }
                _ => break,
            }
        }
        watermark
    }

    /// Every MISSING sequence number, ascending, for ACKNACK bitmap construction.
    pub fn missing_changes(&self) -> Vec<u64> {
        self.table
            .iter()
            .filter(|(_, s)| **s == ChangeFromWriterStatus::Missing)
            .map(|(&seq, _)| seq)
            .collect()
    }

    #[must_use]
    pub fn status(&self, seq: u64) -> ChangeFromWriterStatus {
        self.table
            .get(&seq)
            .copied()
            .unwrap_or(ChangeFromWriterStatus::Unknown)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
