// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! StatefulReader -- the integrating RTPS Sec.8.4.9 reader endpoint.
//!
//! Mirrors [`StatefulWriter`](super::stateful_writer::StatefulWriter): a
//! [`HistoryCache`] to hold received samples plus a
//! [`ReaderProxyRegistry`] tracking one
//! [`ReliableReaderProxy`](crate::core::reader::ReliableReaderProxy) per
//! matched writer, composed into a single `Endpoint`. DATA/HEARTBEAT/GAP
//! submessages dispatched by the message receiver all land here instead of
//! on the bare proxy-state types.
//!
//! A shared `HistoryCache` only keys entries by a single `u64`, but one
//! reader can be matched with several writers, each numbering sequences
//! from 1 independently. Storage keys are therefore the hash of
//! `(writer_guid, seq)` rather than the bare sequence number -- see
//! [`composite_key`].

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::core::net::RtpsContext;
use crate::core::reader::{AcknackDecision, ReaderProxyRegistry};
use crate::core::registry::{Endpoint, EndpointEvent, EndpointKind};
use crate::core::rt::slabpool::SlabPool;
use crate::qos::ResourceLimits;
use crate::reliability::HistoryCache;

use parking_lot::Mutex;

/// Combine a writer GUID and one of its sequence numbers into a single
/// history-cache key, so one cache can hold changes from several matched
/// writers without their independently-numbered sequences colliding.
fn composite_key(writer_guid: &[u8; 16], seq: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    writer_guid.hash(&mut hasher);
    seq.hash(&mut hasher);
    hasher.finish()
}

/// Notified when a new sample becomes available, RTPS Sec.8.4.9's
/// "Collaborator interface (outbound from core)" `on_data_available`.
pub trait DataListener: Send + Sync {
    fn on_data_available(&self, writer_guid: [u8; 16], seq: u64);
}

/// An ACKNACK this reader owes one matched writer, queued by
/// [`StatefulReader::process_heartbeat`] for the caller to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingAckNack {
    pub writer_guid: [u8; 16],
    pub bitmap_base: i64,
}

/// The RTPS Sec.8.4.9 StatefulReader: a history cache plus one
/// `ReliableReaderProxy` per matched writer, composed into a single
/// `Endpoint` the receiver can dispatch DATA/HEARTBEAT/GAP traffic to.
pub struct StatefulReader {
    reader_guid: [u8; 16],
    history: HistoryCache,
    matched_writers: ReaderProxyRegistry,
    listener: Option<Arc<dyn DataListener>>,
    pending_acknacks: Mutex<Vec<PendingAckNack>>,
}

impl fmt::Debug for StatefulReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatefulReader")
            .field("reader_guid", &self.reader_guid)
            .field("matched_writers", &self.matched_writers.len())
            .finish()
    }
}

impl StatefulReader {
    pub fn new(reader_guid: [u8; 16], slabs: Arc<SlabPool>, limits: &ResourceLimits) -> Self {
        Self::with_listener(reader_guid, slabs, limits, None)
    }

    pub fn with_listener(
        reader_guid: [u8; 16],
        slabs: Arc<SlabPool>,
        limits: &ResourceLimits,
        listener: Option<Arc<dyn DataListener>>,
    ) -> Self {
        Self {
            reader_guid,
            history: HistoryCache::new(slabs, limits),
            matched_writers: ReaderProxyRegistry::new(),
            listener,
            pending_acknacks: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn reader_guid(&self) -> &[u8; 16] {
        &self.reader_guid
    }

    #[must_use]
    pub fn history(&self) -> &HistoryCache {
        &self.history
    }

    #[must_use]
    pub fn matched_writers(&self) -> &ReaderProxyRegistry {
        &self.matched_writers
    }

    /// RTPS Sec.8.4.9.1: a writer matched via discovery, with nothing
    /// received from it yet.
    pub fn matched_writer_add(&self, writer_guid: [u8; 16]) {
        self.matched_writers.matched_writer_add(writer_guid);
    }

    pub fn matched_writer_remove(&self, writer_guid: &[u8; 16]) -> bool {
        self.matched_writers.remove(writer_guid).is_some()
    }

    /// RTPS Sec.8.4.9.2: DATA received from a matched writer. Relevant
    /// samples (`payload.is_some()`) are cached under a composite key and
    /// the listener, if any, is notified; irrelevant changes (filtered out)
    /// only advance the writer proxy's sequence tracking.
    pub fn process_data(&self, writer_guid: [u8; 16], seq: u64, payload: Option<&[u8]>) {
        self.matched_writers.on_data(writer_guid, seq as i64);

        if let Some(payload) = payload {
            let key = composite_key(&writer_guid, seq);
            if let Err(err) = self.history.insert(key, payload) {
                log::debug!(
                    "[StatefulReader] dropping sample from writer {:02x?} seq={seq}: {err}",
                    writer_guid
                );
                return;
            }
        }

        if let Some(listener) = &self.listener {
            listener.on_data_available(writer_guid, seq);
        }
    }

    /// Look up a previously cached sample by the writer that sent it.
    #[must_use]
    pub fn get_sample(&self, writer_guid: &[u8; 16], seq: u64) -> Option<Vec<u8>> {
        self.history.get(composite_key(writer_guid, seq))
    }

    /// RTPS Sec.8.4.9.3: HEARTBEAT received from a matched writer. Queues a
    /// pending ACKNACK when data is missing; the caller drains
    /// [`Self::take_pending_acknacks`] to actually send it.
    pub fn process_heartbeat(
        &self,
        writer_guid: [u8; 16],
        first_sn: u64,
        last_sn: u64,
        count: u32,
        final_flag: bool,
    ) -> AcknackDecision {
        let decision = self.matched_writers.on_heartbeat(
            writer_guid,
            first_sn as i64,
            last_sn as i64,
            count,
            final_flag,
        );

        if let AcknackDecision::NeedData { bitmap_base } = decision {
            self.pending_acknacks.lock().push(PendingAckNack {
                writer_guid,
                bitmap_base,
            });
        }

        decision
    }

    /// RTPS Sec.8.4.9.4: GAP received from a matched writer -- `gap_start`
    /// plus every sequence named in `irrelevant` will never arrive and are
    /// recorded as LOST so the delivery watermark advances past them.
    pub fn process_gap(&self, writer_guid: [u8; 16], gap_start: u64, irrelevant: &[u64]) {
        let mut seqs = Vec::with_capacity(irrelevant.len() + 1);
        seqs.push(gap_start);
        seqs.extend_from_slice(irrelevant);
        self.matched_writers.on_gap(writer_guid, &seqs);
    }

    /// Drain ACKNACKs queued by `process_heartbeat` since the last call.
    pub fn take_pending_acknacks(&self) -> Vec<PendingAckNack> {
        std::mem::take(&mut self.pending_acknacks.lock())
    }
}

fn combine_guid(prefix: [u8; 12], entity_id: [u8; 4]) -> [u8; 16] {
    let mut guid = [0u8; 16];
    guid[..12].copy_from_slice(&prefix);
    guid[12..].copy_from_slice(&entity_id);
    guid
}

impl Endpoint for StatefulReader {
    fn entity_id(&self) -> [u8; 4] {
        let mut id = [0u8; 4];
        id.copy_from_slice(&self.reader_guid[12..]);
        id
    }

    fn kind(&self) -> EndpointKind {
        EndpointKind::Reader
    }

    fn dispatch(&self, _ctx: &RtpsContext, event: EndpointEvent<'_>) {
        match event {
            EndpointEvent::Data {
                writer_guid_prefix,
                writer_entity_id,
                sequence_number,
                payload,
            } => {
                let writer_guid = combine_guid(writer_guid_prefix, writer_entity_id);
                self.process_data(writer_guid, sequence_number, payload);
            }
            EndpointEvent::Heartbeat {
                writer_guid_prefix,
                writer_entity_id,
                first_sn,
                last_sn,
                count,
                final_flag,
            } => {
                let writer_guid = combine_guid(writer_guid_prefix, writer_entity_id);
                let _ = self.process_heartbeat(writer_guid, first_sn, last_sn, count, final_flag);
            }
            EndpointEvent::Gap {
                writer_guid_prefix,
                writer_entity_id,
                gap_start,
                irrelevant,
            } => {
                let writer_guid = combine_guid(writer_guid_prefix, writer_entity_id);
                self.process_gap(writer_guid, gap_start, &irrelevant);
            }
            EndpointEvent::AckNack { .. } => {
                // A reader never receives ACKNACK; it sends them.
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn make_reader() -> StatefulReader {
        StatefulReader::new(
            [9u8; 16],
            Arc::new(SlabPool::new()),
            &ResourceLimits::unlimited(),
        )
    }

    #[derive(Default)]
    struct CountingListener {
        hits: AtomicUsize,
    }

    impl DataListener for CountingListener {
        fn on_data_available(&self, _writer_guid: [u8; 16], _seq: u64) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn process_data_caches_sample_and_notifies_listener() {
        let listener = Arc::new(CountingListener::default());
        let reader = StatefulReader::with_listener(
            [9u8; 16],
            Arc::new(SlabPool::new()),
            &ResourceLimits::unlimited(),
            Some(listener.clone()),
        );
        let writer_guid = [1u8; 16];

        reader.process_data(writer_guid, 1, Some(b"hello"));

        assert_eq!(reader.get_sample(&writer_guid, 1), Some(b"hello".to_vec()));
        assert_eq!(listener.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn two_writers_numbering_from_one_do_not_collide() {
        let reader = make_reader();
        let writer_a = [1u8; 16];
        let writer_b = [2u8; 16];

        reader.process_data(writer_a, 1, Some(b"from-a"));
        reader.process_data(writer_b, 1, Some(b"from-b"));

        assert_eq!(reader.get_sample(&writer_a, 1), Some(b"from-a".to_vec()));
        assert_eq!(reader.get_sample(&writer_b, 1), Some(b"from-b".to_vec()));
    }

    #[test]
    fn heartbeat_with_missing_data_queues_acknack() {
        let reader = make_reader();
        let writer_guid = [1u8; 16];
        reader.matched_writer_add(writer_guid);

        let decision = reader.process_heartbeat(writer_guid, 1, 3, 1, false);
        assert!(matches!(decision, AcknackDecision::NeedData { .. }));

        let pending = reader.take_pending_acknacks();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].writer_guid, writer_guid);
        assert!(reader.take_pending_acknacks().is_empty());
    }

    #[test]
    fn gap_advances_past_lost_samples() {
        let reader = make_reader();
        let writer_guid = [1u8; 16];
        reader.matched_writer_add(writer_guid);

        reader.process_data(writer_guid, 1, Some(b"one"));
        reader.process_gap(writer_guid, 2, &[3]);

        let proxy = reader.matched_writers().get_proxy(&writer_guid).unwrap();
        assert_eq!(proxy.available_changes_max(), 3);
    }

    #[test]
    fn dispatch_routes_data_by_entity() {
        let reader = make_reader();
        reader.dispatch(
            &RtpsContext::default(),
            EndpointEvent::Data {
                writer_guid_prefix: [1u8; 12],
                writer_entity_id: [1, 1, 1, 1],
                sequence_number: 1,
                payload: Some(b"hi"),
            },
        );

        assert_eq!(reader.get_sample(&[1u8; 16], 1), Some(b"hi".to_vec()));
    }
}
