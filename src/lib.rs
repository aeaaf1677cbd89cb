// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # hdds-core - RTPS wire-protocol core
//!
//! A pure Rust implementation of the OMG DDSI-RTPS (Real-Time
//! Publish-Subscribe) wire protocol core: the reliable writer/reader state
//! machines, the history cache, the message receiver, and the endpoint
//! registry that a full DDS participant is built on top of.
//!
//! This crate stops at the RTPS layer. It does not provide a
//! `Participant`/`DataWriter`/`DataReader` façade, a QoS policy XML loader,
//! a topic type registry, SPDP/SEDP discovery, or DDS Security -- those are
//! the concern of a participant crate built on top of this one.
//!
//! ## Architecture
//!
//! ```text
//! +-----------------------------------------------------------------+
//! |                    Reliability Layer (C4-C7)                    |
//! |   StatefulWriter/ReaderProxy   |   StatefulReader/WriterProxy    |
//! +-----------------------------------------------------------------+
//! |                        Core Layer (C1-C3, C8-C10)                |
//! |  GUID/net | HistoryCache | MessageReceiver | EndpointRegistry    |
//! +-----------------------------------------------------------------+
//! |                         Transport Layer                          |
//! |            UDP unicast/multicast, port mapping, filters          |
//! +-----------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`core`] - GUID, wire codec, history cache, endpoint/proxy state machines
//! - [`reliability`] - RTPS reliability protocol (messages, history cache, metrics)
//! - [`qos`] - QoS policies consulted by the reliability layer (History, ResourceLimits, ...)
//! - [`protocol`] - RTPS constants, submessage builders, CDR helpers
//! - [`transport`] - UDP transport, port mapping, multicast, filters
//! - [`congestion`] - Rate limiting, pacing, and retransmission backpressure
//! - [`config`] - RTPS constants and runtime configuration store
//! - [`logging`] - Compile-time configurable logging
//!
//! ## See Also
//!
//! - [RTPS Specification](https://www.omg.org/spec/DDSI-RTPS/2.5/)
//! - [DDS Specification](https://www.omg.org/spec/DDS/1.4/)

// Clippy: No blanket suppressions. Fix issues properly or use inline #[allow] with justification.

/// Global configuration (RTPS constants, runtime config, QoS store).
pub mod config;
/// Congestion control (rate limiting, priority queues, AIMD adaptation).
pub mod congestion;
/// Core RTPS protocol implementation (GUID, wire codec, endpoint state machines).
pub mod core;
/// Crate-wide error type.
mod error;
/// Compile-time configurable logging system (zero-cost when disabled).
pub mod logging;
/// RTPS protocol implementation (constants, builders, CDR encoding).
pub mod protocol;
/// QoS (Quality of Service) policies consulted by the reliability layer.
pub mod qos;
/// Reliability QoS implementation (Reliable protocol, RTPS messages, history cache).
pub mod reliability;
/// Transport layer for RTPS communication (UDP, multicast, port mapping).
pub mod transport;

pub use error::{Error, Result};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
