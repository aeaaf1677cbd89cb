// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transport layer for RTPS communication.
//!
//! Manages UDP sockets, multicast groups and port mapping according to the
//! RTPS v2.5 specification (OMG DDS-RTPS Sec.9.6). This is the `send`/`receive`
//! collaborator the core endpoints talk to; it does not know about CacheChanges,
//! reliability state, or QoS -- only locators and bytes.
//!
//! # Modules
//!
//! - `udp` - UDP socket management and send/receive operations
//! - `multicast` - Multicast group joining and interface discovery
//! - `ports` - RTPS v2.5 port number calculation
//! - `dscp` / `ttl` - IP-level QoS knobs (DSCP marking, TTL/hop limit)
//! - `filter` - interface and source-address allow/deny lists
//!
//! # Example
//!
//! ```no_run
//! use hdds::transport::{PortMapping, UdpTransport};
//!
//! // Calculate RTPS ports for domain 0, participant 0
//! let mapping = PortMapping::calculate(0, 0).unwrap();
//! let transport = UdpTransport::new(0, 0, mapping).unwrap();
//!
//! // Send RTPS packet
//! transport.send(b"RTPS...").unwrap();
//! ```

/// DSCP (Differentiated Services Code Point) for network QoS.
pub mod dscp;
/// IP-based network filtering (whitelist/blacklist).
pub mod filter;
/// Multicast group management and interface discovery.
pub mod multicast;
/// RTPS v2.5 port number calculation and mapping.
pub mod ports;
/// TTL (Time To Live) configuration for IP packet hop limit.
pub mod ttl;
/// UDP socket management for RTPS communication.
pub mod udp;

// Re-export main types
pub use dscp::{DscpClass, DscpConfig};
pub use filter::{
    InterfaceFilter, InterfaceMatcher, Ipv4Network, NetworkFilter, NetworkFilterBuilder,
    NetworkParseError, SourceFilter,
};
pub use ports::{CustomPortMapping, PortMapping};
pub use ttl::{get_multicast_ttl, get_unicast_ttl, set_multicast_ttl, set_unicast_ttl, TtlConfig};
pub use udp::UdpTransport;
