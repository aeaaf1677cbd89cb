// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Packet metadata types for RTPS classification and routing.
//!
//!
//! Defines `PacketKind` for RTPS submessage types (RTPS v2.3 Table 8.13),
//! `RtpsContext` for stateful parsing (INFO_DST/INFO_TS), and `RxMeta`
//! for passing packet metadata through the listener-to-FSM pipeline.

use crate::core::net::GUID;
use std::convert::TryFrom;
use std::net::SocketAddr;
use std::time::Instant;

/// Packet classification for RTPS protocol
///
/// Maps RTPS submessage IDs to packet types per RTPS Sec.8.3.7 (Table 8.13).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// DATA submessage (0x15) - contains serialized data
    Data,
    /// HEARTBEAT submessage (0x07) - reliable QoS heartbeat
    Heartbeat,
    /// ACKNACK submessage (0x06) - acknowledgment/negative acknowledgment
    AckNack,
    /// GAP submessage (0x08) - indicates missing sequence numbers
    Gap,
    /// INFO_TS submessage (0x09) - timestamp information
    InfoTs,
    /// INFO_DST submessage (0x0e) - destination GUID prefix
    InfoDst,
    /// PAD submessage (0x01) - padding to alignment boundary
    Pad,
    /// Invalid packet (malformed RTPS header)
    Invalid,
    /// Unknown submessage ID (not handled)
    Unknown,
}

/// RTPS Context State for stateful parsing (v61 Blocker #1)
///
/// INFO_DST and INFO_TS submessages set context for subsequent submessages
/// in the same RTPS message (RTPS v2.5 Sec.8.3.7.5, Sec.8.3.7.7).
///
/// This context must be maintained while scanning submessages and applied
/// to DATA/HEARTBEAT/etc when they are processed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RtpsContext {
    /// Destination GUID prefix from INFO_DST (0x0e)
    ///
    /// When present, subsequent submessages are directed to this participant.
    /// None = broadcast/multicast (all participants).
    pub destination_guid_prefix: Option<[u8; 12]>,

    /// Source timestamp from INFO_TS (0x09)
    ///
    /// Timestamp applied to subsequent DATA submessages.
    /// Encoded as RTPS Time_t (seconds + fraction).
    pub source_timestamp: Option<(i32, u32)>, // (seconds, fraction)
}

/// Minimal metadata for a received packet.
///
/// Stored in the receive ring alongside its buffer id. Designed for lock-free
/// SPSC queue passing from the listener thread to the message receiver.
#[derive(Debug, Clone, Copy)]
pub struct RxMeta {
    /// Source socket address (IPv4 or IPv6)
    pub sock: SocketAddr,
    /// Payload length in bytes (capped at u16::MAX = 65535)
    pub len: u16,
    /// Timestamp when packet was received (for latency tracking)
    pub ts: Instant,
    /// Classified packet type
    pub kind: PacketKind,
    /// Offset to DATA submessage payload (for vendor-specific headers)
    /// None for standard packets, Some(offset) after recovery
    pub data_payload_offset: Option<u16>,
    /// RTPS context state (INFO_DST/INFO_TS)
    ///
    /// Accumulated from INFO_DST and INFO_TS submessages while scanning.
    /// Applied to DATA/HEARTBEAT submessages for correct routing and timestamps.
    pub rtps_context: RtpsContext,
}

impl RxMeta {
    /// Create new RxMeta from received packet
    ///
    /// # Arguments
    /// - `sock`: Source address from `recv_from()`
    /// - `len`: Payload length (will be capped to u16::MAX if larger)
    /// - `kind`: Classified packet type
    ///
    /// # Examples
    /// ```
    /// use hdds::core::net::{RxMeta, PacketKind};
    /// use std::net::SocketAddr;
    ///
    /// let addr: SocketAddr = "127.0.0.1:7400".parse()
    ///     .expect("Socket address parsing should succeed");
    /// let meta = RxMeta::new(addr, 512, PacketKind::Data);
    /// assert_eq!(meta.len, 512);
    /// assert_eq!(meta.kind, PacketKind::Data);
    /// ```
    pub fn new(sock: SocketAddr, len: usize, kind: PacketKind) -> Self {
        let len = u16::try_from(len).unwrap_or(u16::MAX);

        Self {
            sock,
            len,
            ts: Instant::now(),
            kind,
            data_payload_offset: None,
            rtps_context: RtpsContext::default(),
        }
    }

    /// Create new RxMeta with explicit DATA payload offset
    ///
    /// Used when the classifier finds the DATA submessage at a non-standard
    /// offset (e.g. packets carrying vendor-specific headers).
    pub fn new_with_offset(sock: SocketAddr, len: usize, kind: PacketKind, offset: usize) -> Self {
        let len = u16::try_from(len).unwrap_or(u16::MAX);
        let offset = u16::try_from(offset).ok();

        Self {
            sock,
            len,
            ts: Instant::now(),
            kind,
            data_payload_offset: offset,
            rtps_context: RtpsContext::default(),
        }
    }
}
