// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DDS QoS policies (DDS v1.4 Sec.2.2.3).
//!
//! Each policy lives in its own module, mirroring how the DDS spec treats
//! them as independently negotiable. `History` and `ResourceLimits` are the
//! two policies the history cache (C3) enforces directly; `Reliability` and
//! `Durability` drive writer/reader proxy matching behavior (C4/C5); the rest
//! are carried for RxO compatibility checks and entity configuration even
//! though this crate does not implement a full QoS policy catalog or XML
//! loader (see crate-level non-goals).

pub mod deadline;
pub mod destination_order;
pub mod durability;
pub mod durability_service;
pub mod entity_factory;
pub mod history;
pub mod latency_budget;
pub mod lifespan;
pub mod liveliness;
pub mod metadata;
pub mod ownership;
pub mod partition;
pub mod presentation;
pub mod reader_data_lifecycle;
pub mod reliability;
pub mod resource_limits;
pub mod time_based_filter;
pub mod transport_priority;
pub mod writer_data_lifecycle;

pub use deadline::{Deadline, DeadlineTracker, ReaderDeadlineTracker};
pub use destination_order::{DestinationOrder, DestinationOrderKind};
pub use durability::{Durability, DurabilityKind};
pub use durability_service::DurabilityService;
pub use entity_factory::EntityFactory;
pub use history::History;
pub use latency_budget::LatencyBudget;
pub use lifespan::{Lifespan, LifespanChecker};
pub use liveliness::{Liveliness, LivelinessCoordinator, LivelinessKind, LivelinessMonitor, ParticipantMessage};
pub use metadata::{GroupData, TopicData, UserData};
pub use ownership::{Ownership, OwnershipArbiter, OwnershipKind, OwnershipStrength};
pub use partition::Partition;
pub use presentation::{Presentation, PresentationAccessScope};
pub use reader_data_lifecycle::ReaderDataLifecycle;
pub use resource_limits::{ResourceLimits, LENGTH_UNLIMITED};
pub use time_based_filter::{TimeBasedFilter, TimeBasedFilterChecker};
pub use reliability::{Reliability, ReliabilityKind};
pub use transport_priority::TransportPriority;
pub use writer_data_lifecycle::WriterDataLifecycle;
