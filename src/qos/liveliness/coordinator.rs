// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Liveliness coordinator (C9) -- the built-in participant-message writer
//! and reader that let AUTOMATIC and MANUAL_BY_PARTICIPANT liveliness
//! survive on the wire.
//!
//! Per RTPS Sec.8.4.13 ("Writer Liveliness Protocol"): a participant runs
//! one built-in writer that periodically publishes a sample on the
//! well-known participant-message topic, keyed by (participant guid
//! prefix, liveliness kind); a built-in reader on every remote participant
//! asserts liveliness for every remote writer proxy of the matching kind
//! when such a sample arrives. MANUAL_BY_TOPIC liveliness rides on ordinary
//! DATA traffic instead and is not this module's concern.

use std::convert::TryInto;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::Mutex;

use super::{LivelinessKind, LivelinessMonitor};

/// Minimum assertions per lease period so a single dropped datagram never
/// causes a spurious liveliness-lost event (Sec.4.6: "N >= 2").
const ASSERTIONS_PER_LEASE: u32 = 4;

fn kind_to_wire(kind: LivelinessKind) -> u32 {
    match kind {
        LivelinessKind::Automatic => 0,
        LivelinessKind::ManualByParticipant => 1,
        LivelinessKind::ManualByTopic => 2,
    }
}

fn kind_from_wire(value: u32) -> Option<LivelinessKind> {
    match value {
        0 => Some(LivelinessKind::Automatic),
        1 => Some(LivelinessKind::ManualByParticipant),
        2 => Some(LivelinessKind::ManualByTopic),
        _ => None,
    }
}

/// Decoded participant-message sample: which remote participant asserted,
/// and for which liveliness kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticipantMessage {
    pub guid_prefix: [u8; 12],
    pub kind: LivelinessKind,
}

impl ParticipantMessage {
    /// Encode as the built-in topic's key: 12-byte guid prefix + 4-byte
    /// kind discriminant, little-endian.
    #[must_use]
    pub fn encode(&self) -> [u8; 16] {
        let mut buf = [0u8; 16];
        buf[0..12].copy_from_slice(&self.guid_prefix);
        buf[12..16].copy_from_slice(&kind_to_wire(self.kind).to_le_bytes());
        buf
    }

    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < 16 {
            return None;
        }
        let mut guid_prefix = [0u8; 12];
        guid_prefix.copy_from_slice(&buf[0..12]);
        let kind = kind_from_wire(u32::from_le_bytes(buf[12..16].try_into().ok()?))?;
        Some(Self { guid_prefix, kind })
    }
}

/// Tracks one local writer's contribution to the periodic-writer schedule.
#[derive(Debug, Clone, Copy)]
struct LocalWriter {
    kind: LivelinessKind,
    lease_duration: Duration,
}

/// Per-participant liveliness coordinator: owns the periodic-writer
/// schedule driven by local writers, and the watchdog table for remote
/// writer proxies driven by incoming participant-message samples.
#[derive(Debug)]
pub struct LivelinessCoordinator {
    local_guid_prefix: [u8; 12],
    local_writers: DashMap<[u8; 4], LocalWriter>,
    /// Set by `assert_participant()`, cleared every tick; drives whether a
    /// MANUAL_BY_PARTICIPANT periodic sample actually goes out this period.
    manual_participant_asserted: AtomicBool,
    remote_writers: DashMap<[u8; 16], Mutex<LivelinessMonitor>>,
}

impl LivelinessCoordinator {
    #[must_use]
    pub fn new(local_guid_prefix: [u8; 12]) -> Self {
        Self {
            local_guid_prefix,
            local_writers: DashMap::new(),
            manual_participant_asserted: AtomicBool::new(false),
            remote_writers: DashMap::new(),
        }
    }

    /// Register a local writer so its lease duration counts toward the
    /// periodic-writer period for its kind.
    pub fn register_local_writer(
        &self,
        entity_id: [u8; 4],
        kind: LivelinessKind,
        lease_duration: Duration,
    ) {
        self.local_writers
            .insert(entity_id, LocalWriter { kind, lease_duration });
    }

    pub fn unregister_local_writer(&self, entity_id: &[u8; 4]) {
        self.local_writers.remove(entity_id);
    }

    /// Period for the periodic writer for one liveliness kind: the
    /// shortest lease among local writers of that kind, divided by
    /// [`ASSERTIONS_PER_LEASE`]. `None` if no local writer of that kind
    /// exists yet (nothing to assert).
    #[must_use]
    pub fn period_for(&self, kind: LivelinessKind) -> Option<Duration> {
        let min_lease = self
            .local_writers
            .iter()
            .filter(|w| w.kind == kind)
            .map(|w| w.lease_duration)
            .min()?;
        Some(min_lease / ASSERTIONS_PER_LEASE)
    }

    /// User-facing manual assertion (`assert_liveliness` on the
    /// participant): latches until the next tick for that kind consumes it.
    pub fn assert_participant(&self) {
        self.manual_participant_asserted.store(true, Ordering::SeqCst);
    }

    /// Called once per periodic-writer tick for `kind`. Returns the sample
    /// payload to publish, or `None` if nothing should be sent this tick
    /// (MANUAL_BY_PARTICIPANT with no assertion since the last tick, or no
    /// local writer of this kind).
    pub fn tick(&self, kind: LivelinessKind) -> Option<[u8; 16]> {
        if self.local_writers.iter().all(|w| w.kind != kind) {
            return None;
        }

        match kind {
            LivelinessKind::Automatic => {}
            LivelinessKind::ManualByParticipant => {
                if !self.manual_participant_asserted.swap(false, Ordering::SeqCst) {
                    return None;
                }
            }
            LivelinessKind::ManualByTopic => return None,
        }

        Some(
            ParticipantMessage {
                guid_prefix: self.local_guid_prefix,
                kind,
            }
            .encode(),
        )
    }

    /// Register a remote writer proxy's liveliness watchdog (created when
    /// the writer is matched via discovery).
    pub fn register_remote_writer(
        &self,
        writer_guid: [u8; 16],
        kind: LivelinessKind,
        lease_duration: Duration,
    ) {
        self.remote_writers.insert(
            writer_guid,
            Mutex::new(LivelinessMonitor::new(kind, lease_duration)),
        );
    }

    pub fn unregister_remote_writer(&self, writer_guid: &[u8; 16]) {
        self.remote_writers.remove(writer_guid);
    }

    /// Apply an incoming participant-message sample: assert every remote
    /// writer proxy from that participant whose kind matches.
    pub fn on_participant_message(&self, payload: &[u8]) {
        let Some(msg) = ParticipantMessage::decode(payload) else {
            log::trace!("[liveliness] malformed participant-message sample, dropping");
            return;
        };

        for entry in self.remote_writers.iter() {
            let writer_guid = *entry.key();
            if writer_guid[0..12] != msg.guid_prefix {
                continue;
            }
            let mut monitor = entry.value().lock();
            if monitor.kind() == msg.kind {
                monitor.assert();
            }
        }
    }

    /// Directly assert one remote writer (MANUAL_BY_TOPIC: a DATA sample
    /// from that writer counts as an assertion too).
    pub fn assert_remote_writer(&self, writer_guid: &[u8; 16]) {
        if let Some(monitor) = self.remote_writers.get(writer_guid) {
            monitor.lock().assert();
        }
    }

    /// Sweep every remote writer proxy and return the ones that expired
    /// since the last sweep, for the caller to deliver
    /// `on_liveliness_changed` to the user listener.
    pub fn check_expired(&self) -> Vec<[u8; 16]> {
        let mut expired = Vec::new();
        for entry in self.remote_writers.iter() {
            if !entry.value().lock().check() {
                expired.push(*entry.key());
            }
        }
        expired
    }

    #[must_use]
    pub fn is_remote_alive(&self, writer_guid: &[u8; 16]) -> bool {
        self.remote_writers
            .get(writer_guid)
            .is_some_and(|m| m.lock().is_alive())
    }
}
