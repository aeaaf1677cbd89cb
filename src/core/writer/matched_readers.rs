// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! MatchedReadersRegistry - Thread-safe registry of matched readers for a Writer
//!
//!
//! Provides concurrent access to ReliableWriterProxy instances, allowing:
//! - Control thread: ACKNACK handling, HEARTBEAT scheduling
//! - Data thread: Unicast address lookup for DATA delivery
//!
//! Uses DashMap for lock-free concurrent access.

use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use super::proxy::ReliableWriterProxy;

/// Thread-safe registry of ReliableWriterProxy instances for a Writer endpoint
///
/// Shared between control thread (ACKNACK handling) and data thread (DATA sending).
pub struct MatchedReadersRegistry {
    /// Map from reader GUID to proxy state
    proxies: Arc<DashMap<[u8; 16], ReliableWriterProxy>>,
}

impl Default for MatchedReadersRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchedReadersRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            proxies: Arc::new(DashMap::new()),
        }
    }

    /// Add or update a matched reader
    ///
    /// Called when SEDP discovers a new reader or updates an existing one.
    pub fn add_reader(
        &self,
        reader_guid: [u8; 16],
        unicast_addr: SocketAddr,
        lease_duration: Duration,
    ) {
        self.proxies
            .entry(reader_guid)
            .and_modify(|proxy| {
                proxy.set_unicast_addr(unicast_addr);
                proxy.set_lease_duration(lease_duration);
                proxy.touch();
            })
            .or_insert_with(|| ReliableWriterProxy::new(reader_guid, unicast_addr, lease_duration));
    }

    /// Process an ACKNACK from a reader
    ///
    /// # Arguments
    /// - `reader_guid`: 16-byte GUID of the reader
    /// - `acked_seq`: bitmapBase from ACKNACK
    /// - `has_gaps`: true if bitmap has bits set
    ///
    /// # Returns
    /// Sequences needing retransmission (if any)
    pub fn on_acknack(&self, reader_guid: &[u8; 16], acked_seq: i64, has_gaps: bool) -> Vec<i64> {
        if let Some(proxy) = self.proxies.get(reader_guid) {
            proxy.on_acknack(acked_seq, has_gaps)
        } else {
            Vec::new()
        }
    }

    /// Get all unicast addresses for matched readers
    ///
    /// Used for sending DATA to all readers (multicast fallback or unicast fan-out).
    pub fn get_all_addrs(&self) -> Vec<SocketAddr> {
        self.proxies.iter().map(|p| p.unicast_addr()).collect()
    }

    /// Get readers that need a HEARTBEAT
    ///
    /// # Arguments
    /// - `min_interval`: Minimum time between HEARTBEATs
    ///
    /// # Returns
    /// List of (reader_guid, unicast_addr) pairs needing HEARTBEAT
    pub fn get_needing_heartbeat(&self, min_interval: Duration) -> Vec<([u8; 16], SocketAddr)> {
        self.proxies
            .iter()
            .filter(|p| p.needs_heartbeat(min_interval))
            .map(|p| (*p.reader_guid(), p.unicast_addr()))
            .collect()
    }

    /// Get the slowest reader (lowest last_acked_seq)
    ///
    /// Used to determine which samples can be discarded from history.
    ///
    /// # Returns
    /// (reader_guid, last_acked_seq) of the slowest reader, or None if empty
    pub fn slowest_reader(&self) -> Option<([u8; 16], i64)> {
        self.proxies
            .iter()
            .min_by_key(|p| p.last_acked_seq())
            .map(|p| (*p.reader_guid(), p.last_acked_seq()))
    }

    /// Check if all readers are synchronized
    ///
    /// Returns true if all matched readers have acknowledged all sent data.
    pub fn all_synchronized(&self) -> bool {
        !self.proxies.is_empty() && self.proxies.iter().all(|p| p.is_synchronized())
    }

    /// Remove a reader (e.g., when SEDP reports it gone)
    pub fn remove(&self, reader_guid: &[u8; 16]) -> bool {
        self.proxies.remove(reader_guid).is_some()
    }

    /// Cleanup expired proxies
    ///
    /// # Returns
    /// Number of proxies removed
    pub fn cleanup_expired(&self) -> usize {
        let before = self.proxies.len();
        self.proxies.retain(|_, proxy| !proxy.is_expired());
        before - self.proxies.len()
    }

    /// Number of matched readers
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Clear all proxies
    pub fn clear(&self) {
        self.proxies.clear();
    }

    /// Get proxy for a reader (for inspection/debugging)
    pub fn get_proxy(
        &self,
        reader_guid: &[u8; 16],
    ) -> Option<dashmap::mapref::one::Ref<'_, [u8; 16], ReliableWriterProxy>> {
        self.proxies.get(reader_guid)
    }

    /// Register a newly-cached change as UNSENT for every matched reader.
    pub fn add_change_for_all(&self, seq: u64, is_relevant: bool) {
        for proxy in self.proxies.iter() {
            proxy.add_change(seq, is_relevant);
        }
    }

    /// Pop the next UNSENT change for every matched reader, transitioning
    /// each to UNDERWAY. Returns one `(reader_guid, seq)` pair per reader
    /// that had something to send.
    pub fn drain_unsent_for_all(&self) -> Vec<([u8; 16], u64)> {
        self.proxies
            .iter()
            .filter_map(|proxy| proxy.next_unsent_change().map(|seq| (*proxy.reader_guid(), seq)))
            .collect()
    }

    /// True if every matched reader has acknowledged `seq` (or was never
    /// told about it as relevant). Empty registries report `true` -- there
    /// is no reader left to withhold acknowledgement.
    pub fn all_acknowledged(&self, seq: u64) -> bool {
        self.proxies.iter().all(|proxy| {
            !matches!(
                proxy.status(seq),
                Some(super::change_for_reader::ChangeForReaderStatus::Unsent)
                    | Some(super::change_for_reader::ChangeForReaderStatus::Underway)
                    | Some(super::change_for_reader::ChangeForReaderStatus::Unacknowledged)
                    | Some(super::change_for_reader::ChangeForReaderStatus::Requested)
            )
        })
    }

    /// Drop the `ChangeForReader` entry for `seq` on every matched reader
    /// (history eviction / explicit removal).
    pub fn forget_change_for_all(&self, seq: u64) {
        for proxy in self.proxies.iter() {
            proxy.forget_change(seq);
        }
    }
}
