// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPS network primitives: GUID, packet classification, and the
//! zero-allocation receive buffer pool shared by the transport listener
//! and the message receiver (C8).

/// RTPS GUID (16-byte participant prefix + entity id).
pub mod guid;
/// Packet classification and stateful INFO_DST/INFO_TS context carried
/// across submessages of one received datagram.
pub mod meta;
/// Overlapping socket sets for zero-loss hot-reconfiguration of listeners.
pub mod overlapped_sockets;
/// Lock-free buffer pool for zero-allocation datagram receive.
pub mod pool;
/// Small-vector optimization (inline storage + heap fallback).
pub mod tiny_vec;

pub use guid::GUID;
pub use meta::{PacketKind, RtpsContext, RxMeta};
pub use overlapped_sockets::OverlappedSocketSet;
pub use pool::RxPool;
pub use tiny_vec::TinyVec;
