// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message receiver (C8) -- demultiplexes one received datagram into RTPS
//! submessages and routes each to its target endpoint by entity id.
//!
//! Per Sec.4.5: parse the 20-byte RTPS header, reject on bad magic or a
//! major version newer than ours. Walk submessages left to right, folding
//! INFO_TS/INFO_DST into a running [`RtpsContext`] that applies to whatever
//! DATA/HEARTBEAT/ACKNACK/GAP follows. A submessage addressed to an unknown
//! entity id is dropped silently (the registry already does this); a
//! malformed submessage aborts the rest of the datagram, since there is no
//! way to know where the next submessage header actually starts.

use std::convert::TryInto;

use crate::core::net::{PacketKind, RtpsContext};
use crate::core::registry::{EndpointEvent, EndpointRegistry};
use crate::protocol::constants::{
    RTPS_HEADER_SIZE, RTPS_MAGIC, RTPS_SUBMSG_ACKNACK, RTPS_SUBMSG_DATA, RTPS_SUBMSG_GAP,
    RTPS_SUBMSG_HEARTBEAT, RTPS_SUBMSG_INFO_DST, RTPS_SUBMSG_INFO_TS, RTPS_SUBMSG_PAD,
    RTPS_VERSION_MAJOR,
};
use crate::reliability::SequenceNumberSet;

/// Reasons a datagram was rejected outright (never reaches endpoint dispatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveError {
    TooShort,
    BadMagic,
    UnsupportedVersion,
}

/// Per-participant RTPS datagram demultiplexer.
///
/// Stateless across datagrams by design: the only thing carried between
/// `receive_datagram` calls is the shared [`EndpointRegistry`], which owns
/// all the state that actually needs to survive.
#[derive(Debug, Clone)]
pub struct MessageReceiver {
    registry: EndpointRegistry,
}

impl MessageReceiver {
    #[must_use]
    pub fn new(registry: EndpointRegistry) -> Self {
        Self { registry }
    }

    #[must_use]
    pub fn registry(&self) -> &EndpointRegistry {
        &self.registry
    }

    /// Parse and dispatch one received datagram. Returns the header-level
    /// rejection reason, if any; per-submessage errors are not surfaced
    /// here (the spec treats them as "abort the rest of the datagram", not
    /// a reason to fail the whole receive call).
    pub fn receive_datagram(&self, datagram: &[u8]) -> Result<(), ReceiveError> {
        if datagram.len() < RTPS_HEADER_SIZE {
            return Err(ReceiveError::TooShort);
        }
        if &datagram[0..4] != RTPS_MAGIC {
            return Err(ReceiveError::BadMagic);
        }
        if datagram[4] > RTPS_VERSION_MAJOR {
            return Err(ReceiveError::UnsupportedVersion);
        }

        let mut source_guid_prefix = [0u8; 12];
        source_guid_prefix.copy_from_slice(&datagram[8..20]);

        let mut ctx = RtpsContext::default();
        let mut offset = RTPS_HEADER_SIZE;

        while offset + 4 <= datagram.len() {
            let submsg_id = datagram[offset];
            let flags = datagram[offset + 1];
            let little_endian = flags & 0x01 != 0;

            let octets_to_next = read_u16(&datagram[offset + 2..offset + 4], little_endian);
            let body_start = offset + 4;

            // A zero octetsToNext on the last submessage means "rest of
            // the message"; elsewhere it is itself a malformed datagram.
            let body_end = if octets_to_next == 0 {
                datagram.len()
            } else {
                body_start + octets_to_next as usize
            };
            if body_end > datagram.len() {
                log::trace!(
                    "[receiver] submessage 0x{:02x} claims {} bytes past datagram end, dropping rest",
                    submsg_id,
                    body_end - datagram.len()
                );
                break;
            }
            let body = &datagram[body_start..body_end];

            let handled = match submsg_id {
                id if id == RTPS_SUBMSG_INFO_TS => apply_info_ts(&mut ctx, body, flags, little_endian),
                id if id == RTPS_SUBMSG_INFO_DST => apply_info_dst(&mut ctx, body),
                id if id == RTPS_SUBMSG_DATA => {
                    self.dispatch_data(&ctx, source_guid_prefix, body, flags, little_endian)
                }
                id if id == RTPS_SUBMSG_HEARTBEAT => {
                    self.dispatch_heartbeat(&ctx, source_guid_prefix, body, flags, little_endian)
                }
                id if id == RTPS_SUBMSG_ACKNACK => {
                    self.dispatch_acknack(&ctx, source_guid_prefix, body, little_endian)
                }
                id if id == RTPS_SUBMSG_GAP => {
                    self.dispatch_gap(&ctx, source_guid_prefix, body, little_endian)
                }
                id if id == RTPS_SUBMSG_PAD => true,
                _ => {
                    log::trace!("[receiver] unrecognized submessage id 0x{:02x}", submsg_id);
                    true
                }
            };

            if !handled {
                // Malformed submessage body: no reliable way to locate the
                // next submessage header, so the rest of the datagram is
                // abandoned per Sec.4.5.
                break;
            }

            if octets_to_next == 0 {
                break;
            }
            offset = body_end;
        }

        Ok(())
    }

    fn dispatch_data(
        &self,
        ctx: &RtpsContext,
        source_prefix: [u8; 12],
        body: &[u8],
        flags: u8,
        le: bool,
    ) -> bool {
        // extraFlags(2) + octetsToInlineQos(2) + readerId(4) + writerId(4) + writerSN(8)
        if body.len() < 20 {
            return false;
        }
        let octets_to_inline_qos = read_u16(&body[2..4], le) as usize;
        let reader_id: [u8; 4] = body[4..8].try_into().unwrap_or_default();
        let writer_id: [u8; 4] = body[8..12].try_into().unwrap_or_default();
        let seq_high = read_i32(&body[12..16], le);
        let seq_low = read_u32(&body[16..20], le);
        let sequence_number = (((seq_high as i64) << 32) | (seq_low as i64)) as u64;

        let inline_qos_start = 4 + octets_to_inline_qos;
        if inline_qos_start > body.len() {
            return false;
        }

        // Q flag: inline QoS parameter list precedes the payload and must be
        // skipped, not mistaken for sample bytes (mirrors
        // protocol::builder::extract::extract_inline_qos's own Q check).
        let payload_start = if flags & 0x02 != 0 {
            match skip_inline_qos(body, inline_qos_start, le) {
                Some(offset) => offset,
                None => return false,
            }
        } else {
            inline_qos_start
        };

        let payload = Some(&body[payload_start..]).filter(|p| !p.is_empty());

        self.registry.dispatch(
            &reader_id,
            ctx,
            EndpointEvent::Data {
                writer_guid_prefix: source_prefix,
                writer_entity_id: writer_id,
                sequence_number,
                payload,
            },
        );
        true
    }

    fn dispatch_heartbeat(
        &self,
        ctx: &RtpsContext,
        source_prefix: [u8; 12],
        body: &[u8],
        flags: u8,
        le: bool,
    ) -> bool {
        if body.len() < 28 {
            return false;
        }
        let reader_id: [u8; 4] = body[0..4].try_into().unwrap_or_default();
        let writer_id: [u8; 4] = body[4..8].try_into().unwrap_or_default();
        let first_sn = seq_from_parts(&body[8..16], le);
        let last_sn = seq_from_parts(&body[16..24], le);
        let count = read_u32(&body[24..28], le);
        let final_flag = flags & 0x02 != 0;

        self.registry.dispatch(
            &reader_id,
            ctx,
            EndpointEvent::Heartbeat {
                writer_guid_prefix: source_prefix,
                writer_entity_id: writer_id,
                first_sn,
                last_sn,
                count,
                final_flag,
            },
        );
        true
    }

    fn dispatch_acknack(
        &self,
        ctx: &RtpsContext,
        source_prefix: [u8; 12],
        body: &[u8],
        le: bool,
    ) -> bool {
        // readerId(4) + writerId(4) + SequenceNumberSet{base(8)+numBits(4)+bitmap} + count(4)
        if body.len() < 16 {
            return false;
        }
        let reader_id: [u8; 4] = body[0..4].try_into().unwrap_or_default();
        let writer_id: [u8; 4] = body[4..8].try_into().unwrap_or_default();
        let base = seq_from_parts(&body[8..16], le) as i64;
        let num_bits = read_u32(&body[16..20], le);
        let word_count = SequenceNumberSet::word_count_for_bits(num_bits.min(SequenceNumberSet::MAX_BITS));
        let words_end = 20 + word_count * 4;
        if words_end + 4 > body.len() {
            return false;
        }
        let mut words = Vec::with_capacity(word_count);
        for w in 0..word_count {
            let start = 20 + w * 4;
            words.push(read_u32(&body[start..start + 4], le));
        }
        let count = read_u32(&body[words_end..words_end + 4], le);

        let missing = SequenceNumberSet::from_raw(base, num_bits.min(SequenceNumberSet::MAX_BITS), &words)
            .map(|set| set.iter().collect())
            .unwrap_or_default();

        self.registry.dispatch(
            &writer_id,
            ctx,
            EndpointEvent::AckNack {
                reader_guid_prefix: source_prefix,
                reader_entity_id: reader_id,
                bitmap_base: base,
                missing,
                count,
            },
        );
        true
    }

    fn dispatch_gap(
        &self,
        ctx: &RtpsContext,
        source_prefix: [u8; 12],
        body: &[u8],
        le: bool,
    ) -> bool {
        // readerId(4) + writerId(4) + gapStart(8) + gapList:SequenceNumberSet
        if body.len() < 28 {
            return false;
        }
        let reader_id: [u8; 4] = body[0..4].try_into().unwrap_or_default();
        let writer_id: [u8; 4] = body[4..8].try_into().unwrap_or_default();
        let gap_start = seq_from_parts(&body[8..16], le);
        let base = seq_from_parts(&body[16..24], le) as i64;
        let num_bits = read_u32(&body[24..28], le);
        let word_count = SequenceNumberSet::word_count_for_bits(num_bits.min(SequenceNumberSet::MAX_BITS));
        let words_end = 28 + word_count * 4;
        if words_end > body.len() {
            return false;
        }
        let mut words = Vec::with_capacity(word_count);
        for w in 0..word_count {
            let start = 28 + w * 4;
            words.push(read_u32(&body[start..start + 4], le));
        }
        let irrelevant = SequenceNumberSet::from_raw(base, num_bits.min(SequenceNumberSet::MAX_BITS), &words)
            .map(|set| set.iter().collect())
            .unwrap_or_default();

        // GAP flows writer -> reader, so the destination endpoint is the
        // reader; writer_id identifies the originator, carried in the event.
        self.registry.dispatch(
            &reader_id,
            ctx,
            EndpointEvent::Gap {
                writer_guid_prefix: source_prefix,
                writer_entity_id: writer_id,
                gap_start,
                irrelevant,
            },
        );
        true
    }
}

/// Scan the inline-QoS parameter list starting at `start` and return the
/// offset of the first byte past `PID_SENTINEL`, where sample payload (if
/// any) begins. `None` on a truncated or unterminated list.
fn skip_inline_qos(body: &[u8], start: usize, le: bool) -> Option<usize> {
    let mut offset = start;
    loop {
        if offset + 4 > body.len() {
            return None;
        }
        let pid = read_u16(&body[offset..offset + 2], le);
        let len = read_u16(&body[offset + 2..offset + 4], le) as usize;
        offset += 4;
        if pid == 0x0001 {
            return Some(offset);
        }
        offset += len;
        offset = (offset + 3) & !3;
    }
}

fn apply_info_ts(ctx: &mut RtpsContext, body: &[u8], flags: u8, le: bool) -> bool {
    let invalidate = flags & 0x02 != 0;
    if invalidate {
        ctx.source_timestamp = None;
        return true;
    }
    if body.len() < 8 {
        return false;
    }
    let seconds = read_i32(&body[0..4], le);
    let fraction = read_u32(&body[4..8], le);
    ctx.source_timestamp = Some((seconds, fraction));
    true
}

fn apply_info_dst(ctx: &mut RtpsContext, body: &[u8]) -> bool {
    if body.len() < 12 {
        return false;
    }
    let mut prefix = [0u8; 12];
    prefix.copy_from_slice(&body[0..12]);
    ctx.destination_guid_prefix = if prefix == [0u8; 12] { None } else { Some(prefix) };
    true
}

fn seq_from_parts(bytes: &[u8], le: bool) -> u64 {
    let high = read_i32(&bytes[0..4], le);
    let low = read_u32(&bytes[4..8], le);
    (((high as i64) << 32) | (low as i64)) as u64
}

fn read_u16(bytes: &[u8], le: bool) -> u16 {
    let arr: [u8; 2] = bytes.try_into().unwrap_or([0, 0]);
    if le {
        u16::from_le_bytes(arr)
    } else {
        u16::from_be_bytes(arr)
    }
}

fn read_u32(bytes: &[u8], le: bool) -> u32 {
    let arr: [u8; 4] = bytes.try_into().unwrap_or([0, 0, 0, 0]);
    if le {
        u32::from_le_bytes(arr)
    } else {
        u32::from_be_bytes(arr)
    }
}

fn read_i32(bytes: &[u8], le: bool) -> i32 {
    let arr: [u8; 4] = bytes.try_into().unwrap_or([0, 0, 0, 0]);
    if le {
        i32::from_le_bytes(arr)
    } else {
        i32::from_be_bytes(arr)
    }
}

/// Classify a submessage id into a [`PacketKind`] for metrics/logging, per
/// RTPS v2.3 Table 8.13. Independent of the dispatch path above.
#[must_use]
pub fn classify_submessage(submsg_id: u8) -> PacketKind {
    match submsg_id {
        id if id == RTPS_SUBMSG_DATA => PacketKind::Data,
        id if id == RTPS_SUBMSG_HEARTBEAT => PacketKind::Heartbeat,
        id if id == RTPS_SUBMSG_ACKNACK => PacketKind::AckNack,
        id if id == RTPS_SUBMSG_GAP => PacketKind::Gap,
        id if id == RTPS_SUBMSG_INFO_TS => PacketKind::InfoTs,
        id if id == RTPS_SUBMSG_INFO_DST => PacketKind::InfoDst,
        id if id == RTPS_SUBMSG_PAD => PacketKind::Pad,
        _ => PacketKind::Unknown,
    }
}
