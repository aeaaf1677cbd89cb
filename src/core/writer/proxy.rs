// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ReliableWriterProxy - Per-reader state for Reliable Writer
//!
//! Implements RTPS Sec.8.4.7 StatefulWriter behavior:
//! - Tracks highest sequence number acknowledged by each reader
//! - Detects which readers need retransmission (NACK repair)
//! - Manages HEARTBEAT timing per reader
//! - Manages proxy lifecycle (expiry based on lease_duration)
//!
//! # RTPS Compliance
//!
//! Per RTPS v2.5 Sec.8.4.7, a StatefulWriter maintains per-reader state:
//! - `highest_sent_seq_num_`: last sequence sent to this reader
//! - `highest_acked_seq_num_`: highest contiguous seq acknowledged
//! - ACKNACK response handling for gap detection

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::change_for_reader::{ChangeForReaderSet, ChangeForReaderStatus};

/// RTPS Writer state per matched remote reader (RTPS Sec.8.4.7 ReaderProxy)
///
/// Tracks acknowledgment state from a remote Reader to determine:
/// - Which samples need retransmission (NACK repair)
/// - When to send HEARTBEATs
/// - Whether the reader is synchronized
pub struct ReliableWriterProxy {
    /// Remote reader GUID (16 bytes = guid_prefix + entity_id)
    reader_guid: [u8; 16],

    /// Unicast address for sending DATA/HEARTBEAT to this reader
    unicast_addr: SocketAddr,

    /// Highest sequence number acknowledged by this reader
    /// Updated from ACKNACK bitmapBase
    last_acked_seq: AtomicI64,

    /// Last time we sent a HEARTBEAT to this reader
    last_heartbeat_time: Instant,

    /// Whether this reader is synchronized (has all data)
    /// Set when ACKNACK has Final=1 and empty bitmap
    is_synchronized: AtomicBool,

    /// Lease duration from SPDP/SEDP (for expiry)
    lease_duration: Duration,

    /// Last activity time (for expiry check)
    last_seen: Instant,

    /// Per-change `ChangeForReader` table (RTPS Sec.8.4.7.2), driving the
    /// UNSENT/UNDERWAY/UNACKNOWLEDGED/REQUESTED/ACKNOWLEDGED state machine
    /// that `last_acked_seq`/`is_synchronized` summarize for the fast path.
    changes: Mutex<ChangeForReaderSet>,

    /// Highest ACKNACK `count` accepted from this reader so far. A later
    /// ACKNACK with a `count` at or below this is a stale retransmission
    /// (reordered/duplicated datagram) and must be ignored.
    last_acknack_count: AtomicI64,
}

impl ReliableWriterProxy {
    /// Create a new proxy for a matched remote reader
    pub fn new(reader_guid: [u8; 16], unicast_addr: SocketAddr, lease_duration: Duration) -> Self {
        let now = Instant::now();
        Self {
            reader_guid,
            unicast_addr,
            last_acked_seq: AtomicI64::new(0),
            last_heartbeat_time: now,
            is_synchronized: AtomicBool::new(false),
            lease_duration,
            last_seen: now,
            changes: Mutex::new(ChangeForReaderSet::new()),
            last_acknack_count: AtomicI64::new(-1),
        }
    }

    /// Gate an incoming ACKNACK by its `count`: only a strictly-increasing
    /// count is accepted, so a reordered or duplicated ACKNACK datagram is
    /// ignored rather than re-applied.
    pub fn accept_acknack_count(&self, count: u32) -> bool {
        let count = i64::from(count);
        self.last_acknack_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| {
                (count > prev).then_some(count)
            })
            .is_ok()
    }

    /// Current status of one tracked change for this reader, if any.
    pub fn status(&self, seq: u64) -> Option<ChangeForReaderStatus> {
        self.changes.lock().status(seq)
    }

    /// Register a newly-cached change as UNSENT for this reader.
    pub fn add_change(&self, seq: u64, is_relevant: bool) {
        self.changes.lock().add_unsent(seq, is_relevant);
    }

    /// Pop the next UNSENT sequence number, if any, transitioning it to
    /// UNDERWAY. The caller sends DATA for it and arms the nack-suppression
    /// timer before the change becomes eligible for repair.
    pub fn next_unsent_change(&self) -> Option<u64> {
        let mut changes = self.changes.lock();
        let seq = changes.next_unsent()?;
        changes.mark_underway(seq);
        Some(seq)
    }

    /// Nack-suppression duration elapsed: `seq` may now be repaired on NACK.
    pub fn nack_suppression_elapsed(&self, seq: u64) {
        self.changes.lock().mark_unacknowledged(seq);
    }

    /// Sequence numbers currently REQUESTED (named by a live NACK), for repair resend.
    pub fn requested_changes(&self) -> Vec<u64> {
        self.changes.lock().requested_changes()
    }

    /// True if this reader still has a non-ACKNOWLEDGED relevant change --
    /// used to decide whether a HEARTBEAT's Final flag may be set.
    pub fn has_unacknowledged_changes(&self) -> bool {
        self.changes.lock().has_unacknowledged()
    }

    /// Drop the `ChangeForReader` entry for `seq` (history eviction).
    pub fn forget_change(&self, seq: u64) {
        self.changes.lock().remove(seq);
    }

    /// Process an incoming ACKNACK from this reader
    ///
    /// # Arguments
    /// - `acked_seq`: bitmapBase from ACKNACK (next seq reader wants)
    /// - `has_gaps`: true if bitmap has bits set (reader missing samples)
    ///
    /// # Returns
    /// List of sequence numbers that need retransmission (if any)
    pub fn on_acknack(&self, acked_seq: i64, has_gaps: bool) -> Vec<i64> {
        let prev_acked = self
            .last_acked_seq
            .fetch_max(acked_seq - 1, Ordering::SeqCst);

        if !has_gaps && acked_seq > prev_acked {
            self.is_synchronized.store(true, Ordering::SeqCst);
        } else if has_gaps {
            self.is_synchronized.store(false, Ordering::SeqCst);
        }

        if acked_seq > 0 {
            self.changes.lock().acknowledge_up_to((acked_seq - 1) as u64);
        }

        Vec::new()
    }

    /// Process an incoming ACKNACK, naming the exact missing sequence
    /// numbers decoded from its bitmap. Everything below `bitmap_base` is
    /// acknowledged; everything named in `missing` moves to REQUESTED in
    /// the `ChangeForReader` table.
    ///
    /// # Returns
    /// The sequence numbers that need a repair resend (as `i64`, matching
    /// this proxy's legacy signed-sequence convention).
    pub fn on_acknack_with_missing(&self, bitmap_base: i64, missing: &[u64]) -> Vec<i64> {
        let _ = self.on_acknack(bitmap_base, !missing.is_empty());
        self.changes.lock().mark_requested(missing);
        missing.iter().map(|&s| s as i64).collect()
    }

    /// Check if we should send a HEARTBEAT to this reader
    ///
    /// # Arguments
    /// - `min_interval`: Minimum time between HEARTBEATs
    pub fn needs_heartbeat(&self, min_interval: Duration) -> bool {
        self.last_heartbeat_time.elapsed() >= min_interval
    }

    /// Mark that we sent a HEARTBEAT to this reader
    pub fn heartbeat_sent(&mut self) {
        self.last_heartbeat_time = Instant::now();
        self.last_seen = Instant::now();
    }

    /// Check if proxy expired (peer gone)
    pub fn is_expired(&self) -> bool {
        self.last_seen.elapsed() > self.lease_duration.mul_f32(1.5)
    }

    /// Check if reader is synchronized (has all data we sent)
    pub fn is_synchronized(&self) -> bool {
        self.is_synchronized.load(Ordering::SeqCst)
    }

    /// Get the reader GUID
    pub fn reader_guid(&self) -> &[u8; 16] {
        &self.reader_guid
    }

    /// Get unicast address for this reader
    pub fn unicast_addr(&self) -> SocketAddr {
        self.unicast_addr
    }

    /// Get last acknowledged sequence number
    pub fn last_acked_seq(&self) -> i64 {
        self.last_acked_seq.load(Ordering::SeqCst)
    }

    /// Get lease duration
    pub fn lease_duration(&self) -> Duration {
        self.lease_duration
    }

    /// Update unicast address (e.g., from SEDP update)
    pub fn set_unicast_addr(&mut self, addr: SocketAddr) {
        self.unicast_addr = addr;
    }

    /// Update lease duration (e.g., from SEDP update)
    pub fn set_lease_duration(&mut self, duration: Duration) {
        self.lease_duration = duration;
    }

    /// Touch the proxy (update last_seen without other changes)
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn make_guid(id: u8) -> [u8; 16] {
        let mut guid = [0u8; 16];
        guid[0] = id;
        guid
    }

    fn make_addr(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 100)), port)
    }

    #[test]
    fn test_new_proxy() {
        let proxy =
            ReliableWriterProxy::new(make_guid(1), make_addr(7400), Duration::from_secs(10));

        assert_eq!(proxy.last_acked_seq(), 0);
        assert!(!proxy.is_synchronized());
        assert!(!proxy.is_expired());
    }

    #[test]
    fn test_on_acknack_updates_state() {
        let proxy =
            ReliableWriterProxy::new(make_guid(1), make_addr(7400), Duration::from_secs(10));

        // ACKNACK with bitmapBase=5 means reader wants seq 5, has 1-4
        let _ = proxy.on_acknack(5, false);

        assert_eq!(proxy.last_acked_seq(), 4);
        assert!(proxy.is_synchronized());
    }

    #[test]
    fn test_on_acknack_with_gaps() {
        let proxy =
            ReliableWriterProxy::new(make_guid(1), make_addr(7400), Duration::from_secs(10));

        // First: synchronized
        let _ = proxy.on_acknack(5, false);
        assert!(proxy.is_synchronized());

        // Then: has gaps
        let _ = proxy.on_acknack(5, true);
        assert!(!proxy.is_synchronized());
    }

    #[test]
    fn test_needs_heartbeat() {
        let mut proxy =
            ReliableWriterProxy::new(make_guid(1), make_addr(7400), Duration::from_secs(10));

        // Just created - needs heartbeat after interval
        assert!(!proxy.needs_heartbeat(Duration::from_secs(1)));

        // After sending heartbeat
        proxy.heartbeat_sent();
        assert!(!proxy.needs_heartbeat(Duration::from_millis(10)));
    }

    #[test]
    fn test_expiry() {
        let proxy =
            ReliableWriterProxy::new(make_guid(1), make_addr(7400), Duration::from_millis(1));

        assert!(!proxy.is_expired());

        // Sleep past expiry (1ms * 1.5 = 1.5ms)
        std::thread::sleep(Duration::from_millis(3));

        assert!(proxy.is_expired());
    }

    #[test]
    fn stale_acknack_count_is_rejected() {
        let proxy =
            ReliableWriterProxy::new(make_guid(1), make_addr(7400), Duration::from_secs(10));

        assert!(proxy.accept_acknack_count(1));
        assert!(proxy.accept_acknack_count(2));
        // Reordered/duplicated datagram carrying an old or equal count.
        assert!(!proxy.accept_acknack_count(2));
        assert!(!proxy.accept_acknack_count(1));
        assert!(proxy.accept_acknack_count(3));
    }

    #[test]
    fn status_reports_tracked_change() {
        let proxy =
            ReliableWriterProxy::new(make_guid(1), make_addr(7400), Duration::from_secs(10));

        assert_eq!(proxy.status(1), None);
        proxy.add_change(1, true);
        assert_eq!(proxy.status(1), Some(ChangeForReaderStatus::Unsent));
    }
}
