// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! StatefulWriter -- the integrating RTPS Sec.8.4.7 writer endpoint.
//!
//! Everything needed to run a reliable writer already exists as separate
//! pieces: [`HistoryCache`] stores changes, [`MatchedReadersRegistry`] tracks
//! one [`ReliableWriterProxy`](crate::core::writer::ReliableWriterProxy) per
//! matched reader, and [`Durability`] knows whether a late joiner gets seeded.
//! `StatefulWriter` owns all three and is the `Endpoint` the message receiver
//! actually dispatches ACKNACK/HEARTBEAT traffic to.
//!
//! Send is pull-based: nothing in this crate owns a socket at this layer, so
//! [`StatefulWriter::add_change`] and [`StatefulWriter::process_acknack`]
//! return [`WriterSend`] descriptors (reader + sequence number) and the
//! caller looks the payload up in the writer's own history cache to put on
//! the wire.

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::congestion::{CongestionConfig, Priority, SendAction, WriterPacer};
use crate::core::net::RtpsContext;
use crate::core::registry::{Endpoint, EndpointEvent, EndpointKind};
use crate::core::rt::slabpool::SlabPool;
use crate::core::writer::MatchedReadersRegistry;
use crate::qos::{Durability, ResourceLimits};
use crate::reliability::HistoryCache;

/// One change this writer should put on the wire for one matched reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterSend {
    pub reader_guid: [u8; 16],
    pub seq: u64,
}

/// How a writer decides when queued changes actually go out.
pub enum PublishMode {
    /// Every `add_change` is flushed to every matched reader immediately.
    Sync,
    /// Changes pass through a [`WriterPacer`] first; `add_change` only
    /// flushes once the pacer's token bucket and priority queues say it is
    /// time. The pacer has no per-reader concept, so this gates *when* a
    /// flush happens, not *which* reader/change it covers -- every matched
    /// reader's UNSENT queue is drained together on each permitted flush.
    Async { pacer: Mutex<WriterPacer> },
}

impl PublishMode {
    #[must_use]
    pub fn sync() -> Self {
        Self::Sync
    }

    #[must_use]
    pub fn async_with_config(config: CongestionConfig) -> Self {
        Self::Async {
            pacer: Mutex::new(WriterPacer::new(config)),
        }
    }
}

/// The RTPS Sec.8.4.7 StatefulWriter: a history cache plus one
/// `ReliableWriterProxy` per matched reader, composed into a single
/// `Endpoint` the receiver can dispatch ACKNACK/HEARTBEAT traffic to.
pub struct StatefulWriter {
    writer_guid: [u8; 16],
    history: HistoryCache,
    matched_readers: MatchedReadersRegistry,
    durability: Durability,
    next_seq: AtomicU64,
    publish_mode: PublishMode,
}

impl fmt::Debug for StatefulWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatefulWriter")
            .field("writer_guid", &self.writer_guid)
            .field("matched_readers", &self.matched_readers.len())
            .finish()
    }
}

impl StatefulWriter {
    /// Create a writer endpoint with default synchronous publishing.
    pub fn new(
        writer_guid: [u8; 16],
        slabs: Arc<SlabPool>,
        limits: &ResourceLimits,
        durability: Durability,
    ) -> Self {
        Self::with_publish_mode(writer_guid, slabs, limits, durability, PublishMode::Sync)
    }

    pub fn with_publish_mode(
        writer_guid: [u8; 16],
        slabs: Arc<SlabPool>,
        limits: &ResourceLimits,
        durability: Durability,
        publish_mode: PublishMode,
    ) -> Self {
        Self {
            writer_guid,
            history: HistoryCache::new(slabs, limits),
            matched_readers: MatchedReadersRegistry::new(),
            durability,
            next_seq: AtomicU64::new(1),
            publish_mode,
        }
    }

    #[must_use]
    pub fn writer_guid(&self) -> &[u8; 16] {
        &self.writer_guid
    }

    #[must_use]
    pub fn history(&self) -> &HistoryCache {
        &self.history
    }

    #[must_use]
    pub fn matched_readers(&self) -> &MatchedReadersRegistry {
        &self.matched_readers
    }

    /// Reserve the next sequence number for a new change, RTPS Sec.8.4.7.3.
    #[must_use]
    pub fn new_change(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Cache a new change and register it as UNSENT for every matched
    /// reader, then flush per the configured publish mode.
    ///
    /// Returns the changes that should be put on the wire right away (empty
    /// under `PublishMode::Async` until the pacer admits a flush).
    pub fn add_change(&self, seq: u64, payload: &[u8]) -> Result<Vec<WriterSend>, crate::Error> {
        self.history.insert(seq, payload)?;
        self.matched_readers.add_change_for_all(seq, true);
        Ok(self.unsent_change_added_to_history())
    }

    /// RTPS Sec.8.4.7.4: a change was just added to history. Decide whether
    /// to push it to matched readers now (sync mode) or let the pacer gate
    /// it (async mode).
    pub fn unsent_change_added_to_history(&self) -> Vec<WriterSend> {
        match &self.publish_mode {
            PublishMode::Sync => self.flush_unsent(),
            PublishMode::Async { pacer } => {
                let action = {
                    let mut pacer = pacer.lock();
                    let _ = pacer.enqueue(Vec::new(), Priority::P1);
                    pacer.try_send()
                };
                match action {
                    SendAction::Send(_) => self.flush_unsent(),
                    SendAction::Empty | SendAction::RateLimited { .. } => Vec::new(),
                }
            }
        }
    }

    fn flush_unsent(&self) -> Vec<WriterSend> {
        self.matched_readers
            .drain_unsent_for_all()
            .into_iter()
            .map(|(reader_guid, seq)| WriterSend { reader_guid, seq })
            .collect()
    }

    /// RTPS Sec.8.4.7.5: drop a change once every matched reader has
    /// acknowledged it (or there are no matched readers left to withhold
    /// acknowledgement).
    pub fn remove_change(&self, seq: u64) -> bool {
        if !self.matched_readers.all_acknowledged(seq) {
            return false;
        }
        self.matched_readers.forget_change_for_all(seq);
        self.history.remove_acknowledged(seq);
        true
    }

    /// RTPS Sec.8.4.7.6: a reader matched via discovery. TRANSIENT_LOCAL (or
    /// stronger) durability seeds the late joiner from everything still in
    /// history; VOLATILE readers only see changes written after they match.
    pub fn matched_reader_add(
        &self,
        reader_guid: [u8; 16],
        unicast_addr: SocketAddr,
        lease_duration: Duration,
    ) {
        self.matched_readers
            .add_reader(reader_guid, unicast_addr, lease_duration);

        if self.durability.seeds_late_joiners() {
            if let Some(proxy) = self.matched_readers.get_proxy(&reader_guid) {
                for (seq, _payload) in self.history.snapshot_payloads() {
                    proxy.add_change(seq, true);
                }
            }
        }
    }

    /// RTPS Sec.8.4.7.7: reader dropped (lease expiry or explicit unmatch).
    pub fn matched_reader_remove(&self, reader_guid: &[u8; 16]) -> bool {
        self.matched_readers.remove(reader_guid)
    }

    /// RTPS Sec.8.4.7.8: apply an incoming ACKNACK. Stale (reordered or
    /// duplicated) ACKNACKs are dropped by `count` before anything else
    /// runs. Returns sequences this reader needs repaired.
    pub fn process_acknack(
        &self,
        reader_guid: [u8; 16],
        bitmap_base: i64,
        missing: &[u64],
        count: u32,
    ) -> Vec<u64> {
        let Some(proxy) = self.matched_readers.get_proxy(&reader_guid) else {
            return Vec::new();
        };
        if !proxy.accept_acknack_count(count) {
            return Vec::new();
        }
        proxy
            .on_acknack_with_missing(bitmap_base, missing)
            .into_iter()
            .filter_map(|seq| u64::try_from(seq).ok())
            .collect()
    }

    /// Readers whose HEARTBEAT retransmit interval has elapsed.
    pub fn readers_needing_heartbeat(&self, min_interval: Duration) -> Vec<([u8; 16], SocketAddr)> {
        self.matched_readers.get_needing_heartbeat(min_interval)
    }
}

fn combine_guid(prefix: [u8; 12], entity_id: [u8; 4]) -> [u8; 16] {
    let mut guid = [0u8; 16];
    guid[..12].copy_from_slice(&prefix);
    guid[12..].copy_from_slice(&entity_id);
    guid
}

impl Endpoint for StatefulWriter {
    fn entity_id(&self) -> [u8; 4] {
        let mut id = [0u8; 4];
        id.copy_from_slice(&self.writer_guid[12..]);
        id
    }

    fn kind(&self) -> EndpointKind {
        EndpointKind::Writer
    }

    fn dispatch(&self, _ctx: &RtpsContext, event: EndpointEvent<'_>) {
        if let EndpointEvent::AckNack {
            reader_guid_prefix,
            reader_entity_id,
            bitmap_base,
            missing,
            count,
        } = event
        {
            let reader_guid = combine_guid(reader_guid_prefix, reader_entity_id);
            let _ = self.process_acknack(reader_guid, bitmap_base, &missing, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qos::DurabilityKind;
    use std::net::{IpAddr, Ipv4Addr};

    fn make_addr(port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), port)
    }

    fn make_writer(durability: Durability) -> StatefulWriter {
        StatefulWriter::new(
            [1u8; 16],
            Arc::new(SlabPool::new()),
            &ResourceLimits::unlimited(),
            durability,
        )
    }

    #[test]
    fn add_change_flushes_to_matched_readers_in_sync_mode() {
        let writer = make_writer(Durability::volatile());
        let reader_guid = [2u8; 16];
        writer.matched_reader_add(reader_guid, make_addr(7400), Duration::from_secs(30));

        let sends = writer.add_change(1, b"hello").expect("insert succeeds");
        assert_eq!(
            sends,
            vec![WriterSend {
                reader_guid,
                seq: 1
            }]
        );
    }

    #[test]
    fn volatile_reader_does_not_get_seeded_history() {
        let writer = make_writer(Durability::volatile());
        writer.add_change(1, b"before").unwrap();

        let reader_guid = [2u8; 16];
        writer.matched_reader_add(reader_guid, make_addr(7400), Duration::from_secs(30));

        let proxy = writer.matched_readers().get_proxy(&reader_guid).unwrap();
        assert_eq!(proxy.status(1), None);
    }

    #[test]
    fn transient_local_reader_is_seeded_from_history() {
        let writer = make_writer(Durability::new(DurabilityKind::TransientLocal));
        writer.add_change(1, b"before").unwrap();

        let reader_guid = [2u8; 16];
        writer.matched_reader_add(reader_guid, make_addr(7400), Duration::from_secs(30));

        let proxy = writer.matched_readers().get_proxy(&reader_guid).unwrap();
        assert!(proxy.status(1).is_some());
    }

    #[test]
    fn acknack_acknowledges_and_allows_removal() {
        let writer = make_writer(Durability::volatile());
        let reader_guid = [2u8; 16];
        writer.matched_reader_add(reader_guid, make_addr(7400), Duration::from_secs(30));
        writer.add_change(1, b"x").unwrap();

        assert!(!writer.remove_change(1));
        let _ = writer.process_acknack(reader_guid, 2, &[], 1);
        assert!(writer.remove_change(1));
    }

    #[test]
    fn stale_acknack_count_does_not_reacknowledge() {
        let writer = make_writer(Durability::volatile());
        let reader_guid = [2u8; 16];
        writer.matched_reader_add(reader_guid, make_addr(7400), Duration::from_secs(30));
        writer.add_change(1, b"x").unwrap();

        let _ = writer.process_acknack(reader_guid, 2, &[], 5);
        assert!(writer.remove_change(1));

        writer.add_change(2, b"y").unwrap();
        // Replayed/duplicated ACKNACK carrying an old count must be ignored.
        let _ = writer.process_acknack(reader_guid, 3, &[], 5);
        assert!(!writer.remove_change(2));
    }

    #[test]
    fn dispatch_routes_acknack_by_entity() {
        let writer = make_writer(Durability::volatile());
        let reader_guid = [2u8; 16];
        writer.matched_reader_add(reader_guid, make_addr(7400), Duration::from_secs(30));
        writer.add_change(1, b"x").unwrap();

        writer.dispatch(
            &RtpsContext::default(),
            EndpointEvent::AckNack {
                reader_guid_prefix: [2u8; 12],
                reader_entity_id: [2, 2, 2, 2],
                bitmap_base: 2,
                missing: vec![],
                count: 1,
            },
        );

        assert!(writer.remove_change(1));
    }
}
