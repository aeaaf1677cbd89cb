// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Crate-wide error type.
//!
//! The RTPS core is a library, not a DDS participant façade, so this
//! `Error` only covers the failure modes its own operations can produce:
//! port-mapping range checks (transport), history cache backpressure and
//! resource-limit rejection (reliability), and CDR2 serialization
//! failures (core::ser). Callers that need participant/topic/QoS-catalog
//! level errors compose their own error type around this one.

use std::fmt;

use crate::core::ser::SerError;

/// Crate-wide error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A non-blocking operation (e.g. `HistoryCache::insert`) could not
    /// proceed immediately and must be retried by the caller.
    WouldBlock,
    /// A history cache insert was rejected by `ResourceLimits`.
    ResourceLimitExceeded,
    /// CDR2 encode/decode failed.
    SerializationError,
    /// Domain id outside the representable RTPS port-mapping range.
    InvalidDomainId(u32),
    /// Participant id outside the representable RTPS port-mapping range.
    InvalidParticipantId(u8),
    /// No unused participant id remained when auto-assigning one.
    NoAvailableParticipantId,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::WouldBlock => write!(f, "operation would block"),
            Error::ResourceLimitExceeded => write!(f, "resource limit exceeded"),
            Error::SerializationError => write!(f, "serialization error"),
            Error::InvalidDomainId(id) => write!(f, "invalid domain id: {}", id),
            Error::InvalidParticipantId(id) => write!(f, "invalid participant id: {}", id),
            Error::NoAvailableParticipantId => write!(f, "no available participant id"),
        }
    }
}

impl std::error::Error for Error {}

impl From<SerError> for Error {
    fn from(_: SerError) -> Self {
        Error::SerializationError
    }
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ser_error_converts_to_serialization_error() {
        let ser_err = SerError::InvalidData {
            reason: "bad payload".into(),
        };
        let err: Error = ser_err.into();
        assert_eq!(err, Error::SerializationError);
    }

    #[test]
    fn display_messages_are_non_empty() {
        for err in [
            Error::WouldBlock,
            Error::ResourceLimitExceeded,
            Error::SerializationError,
            Error::InvalidDomainId(99),
            Error::InvalidParticipantId(255),
            Error::NoAvailableParticipantId,
        ] {
            assert!(!err.to_string().is_empty());
        }
    }
}
