// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Endpoint registry -- maps entity ids to endpoints within one participant.
//!
//! Per RTPS Sec.8.2.4.3 every participant carries a fixed set of reserved
//! entity ids (SPDP, SEDP, the participant-message topic) plus whatever
//! user readers/writers get created at runtime. The registry is the single
//! place that knows the mapping; the message receiver (`core::receiver`)
//! looks entities up here by entity id and nowhere else.
//!
//! Creation is the only path that registers an endpoint; destruction tears
//! down timers before the entry is dropped, so a racing receive thread can
//! never observe a half-torn-down endpoint (it either finds the entry, or
//! doesn't).

use std::sync::Arc;

use dashmap::DashMap;

use crate::core::net::RtpsContext;

/// Kind of endpoint an entity id resolves to, mirroring RTPS Sec.9.3.1.2
/// `EntityKind_t` at the granularity the receiver cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Writer,
    Reader,
}

/// A single decoded DATA/HEARTBEAT/ACKNACK/GAP submessage, already stripped
/// of its RTPS header and submessage header, handed to the target endpoint
/// by the message receiver (C8).
#[derive(Debug, Clone)]
pub enum EndpointEvent<'a> {
    /// A sample, or an irrelevant placeholder if `payload` is `None`.
    Data {
        writer_guid_prefix: [u8; 12],
        writer_entity_id: [u8; 4],
        sequence_number: u64,
        payload: Option<&'a [u8]>,
    },
    Heartbeat {
        writer_guid_prefix: [u8; 12],
        writer_entity_id: [u8; 4],
        first_sn: u64,
        last_sn: u64,
        count: u32,
        final_flag: bool,
    },
    AckNack {
        reader_guid_prefix: [u8; 12],
        reader_entity_id: [u8; 4],
        bitmap_base: i64,
        missing: Vec<u64>,
        count: u32,
    },
    Gap {
        writer_guid_prefix: [u8; 12],
        writer_entity_id: [u8; 4],
        gap_start: u64,
        irrelevant: Vec<u64>,
    },
}

/// A registered endpoint: either side of a stateful writer/reader.
///
/// Implemented by the participant's concrete writer/reader wrapper types;
/// the registry itself only needs entity id and dispatch.
pub trait Endpoint: Send + Sync + std::fmt::Debug {
    fn entity_id(&self) -> [u8; 4];
    fn kind(&self) -> EndpointKind;
    /// Handle one decoded submessage addressed to this entity, with the
    /// receiver's accumulated INFO_TS/INFO_DST context for the datagram.
    fn dispatch(&self, ctx: &RtpsContext, event: EndpointEvent<'_>);
}

/// Thread-safe entity-id -> endpoint map for one participant.
///
/// A participant-wide mutex is never held on the data path; `DashMap`
/// shards internally so registration/lookup never blocks dispatch of an
/// unrelated entity.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: Arc<DashMap<[u8; 4], Arc<dyn Endpoint>>>,
}

impl EndpointRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            endpoints: Arc::new(DashMap::new()),
        }
    }

    /// Register a newly-created endpoint. Returns the previous occupant of
    /// this entity id, if any (a caller error: entity ids are never reused
    /// while still registered).
    pub fn register(&self, endpoint: Arc<dyn Endpoint>) -> Option<Arc<dyn Endpoint>> {
        self.endpoints.insert(endpoint.entity_id(), endpoint)
    }

    /// Unregister and return the endpoint so the caller can cancel its
    /// timers and join in-flight callbacks before dropping it.
    pub fn unregister(&self, entity_id: &[u8; 4]) -> Option<Arc<dyn Endpoint>> {
        self.endpoints.remove(entity_id).map(|(_, e)| e)
    }

    #[must_use]
    pub fn lookup(&self, entity_id: &[u8; 4]) -> Option<Arc<dyn Endpoint>> {
        self.endpoints.get(entity_id).map(|e| Arc::clone(&e))
    }

    /// Dispatch to the endpoint registered for `entity_id`. Submessages
    /// addressed to unknown entities are silently dropped per Sec.4.5.
    pub fn dispatch(&self, entity_id: &[u8; 4], ctx: &RtpsContext, event: EndpointEvent<'_>) {
        if let Some(endpoint) = self.lookup(entity_id) {
            endpoint.dispatch(ctx, event);
        } else {
            log::trace!(
                "[registry] dropping submessage for unknown entity {:02x?}",
                entity_id
            );
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn clear(&self) {
        self.endpoints.clear();
    }
}
