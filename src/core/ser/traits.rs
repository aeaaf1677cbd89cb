// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CDR2 encode/decode traits implemented by generated and hand-written
//! wire types, plus the primitive/`String`/`Vec` impls every such type is
//! built out of.
//!
//! This is plain (non-parameter-list) CDR2: no DHEADER, no member ids --
//! see `pl_cdr2` for the PL_CDR2 struct layout used by mutable/extensible
//! types.

use std::fmt;

/// Low-level CDR2 encode/decode failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdrError {
    /// Destination buffer too small to hold the encoded payload.
    BufferTooSmall,
    /// Source buffer ended before a field could be fully read.
    UnexpectedEof,
    /// Encoded value violates a CDR2 invariant (e.g. non-UTF8 string bytes,
    /// or a length that doesn't fit `u32`).
    InvalidEncoding,
}

impl fmt::Display for CdrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CdrError::BufferTooSmall => write!(f, "buffer too small"),
            CdrError::UnexpectedEof => write!(f, "unexpected end of buffer"),
            CdrError::InvalidEncoding => write!(f, "invalid CDR2 encoding"),
        }
    }
}

impl std::error::Error for CdrError {}

/// Implemented by types that can encode themselves as a plain CDR2 payload.
pub trait Cdr2Encode {
    /// Encode little-endian into `dst`, returning the number of bytes written.
    fn encode_cdr2_le(&self, dst: &mut [u8]) -> Result<usize, CdrError>;

    /// Upper bound on the encoded size, used to size a destination buffer
    /// before calling `encode_cdr2_le`.
    fn max_cdr2_size(&self) -> usize;
}

/// Implemented by types that can decode themselves from a plain CDR2 payload.
pub trait Cdr2Decode: Sized {
    /// Decode little-endian from `src`, returning the value and the number
    /// of bytes consumed.
    fn decode_cdr2_le(src: &[u8]) -> Result<(Self, usize), CdrError>;
}

macro_rules! impl_cdr2_fixed_width {
    ($ty:ty, $size:expr) => {
        impl Cdr2Encode for $ty {
            fn encode_cdr2_le(&self, dst: &mut [u8]) -> Result<usize, CdrError> {
                if dst.len() < $size {
                    return Err(CdrError::BufferTooSmall);
                }
                dst[..$size].copy_from_slice(&self.to_le_bytes());
                Ok($size)
            }

            fn max_cdr2_size(&self) -> usize {
                $size
            }
        }

        impl Cdr2Decode for $ty {
            fn decode_cdr2_le(src: &[u8]) -> Result<(Self, usize), CdrError> {
                if src.len() < $size {
                    return Err(CdrError::UnexpectedEof);
                }
                let mut buf = [0u8; $size];
                buf.copy_from_slice(&src[..$size]);
                Ok((<$ty>::from_le_bytes(buf), $size))
            }
        }
    };
}

impl_cdr2_fixed_width!(u8, 1);
impl_cdr2_fixed_width!(i8, 1);
impl_cdr2_fixed_width!(u16, 2);
impl_cdr2_fixed_width!(i16, 2);
impl_cdr2_fixed_width!(u32, 4);
impl_cdr2_fixed_width!(i32, 4);
impl_cdr2_fixed_width!(u64, 8);
impl_cdr2_fixed_width!(i64, 8);
impl_cdr2_fixed_width!(f32, 4);
impl_cdr2_fixed_width!(f64, 8);

impl Cdr2Encode for String {
    fn encode_cdr2_le(&self, dst: &mut [u8]) -> Result<usize, CdrError> {
        let bytes = self.as_bytes();
        let len = u32::try_from(bytes.len()).map_err(|_| CdrError::InvalidEncoding)?;
        if dst.len() < 4 + bytes.len() {
            return Err(CdrError::BufferTooSmall);
        }
        dst[..4].copy_from_slice(&len.to_le_bytes());
        dst[4..4 + bytes.len()].copy_from_slice(bytes);
        Ok(4 + bytes.len())
    }

    fn max_cdr2_size(&self) -> usize {
        4 + self.len()
    }
}

impl Cdr2Decode for String {
    fn decode_cdr2_le(src: &[u8]) -> Result<(Self, usize), CdrError> {
        let (len, _) = u32::decode_cdr2_le(src)?;
        let len = len as usize;
        if src.len() < 4 + len {
            return Err(CdrError::UnexpectedEof);
        }
        let s = std::str::from_utf8(&src[4..4 + len]).map_err(|_| CdrError::InvalidEncoding)?;
        Ok((s.to_string(), 4 + len))
    }
}

impl<T: Cdr2Encode> Cdr2Encode for Vec<T> {
    fn encode_cdr2_le(&self, dst: &mut [u8]) -> Result<usize, CdrError> {
        let len = u32::try_from(self.len()).map_err(|_| CdrError::InvalidEncoding)?;
        if dst.len() < 4 {
            return Err(CdrError::BufferTooSmall);
        }
        dst[..4].copy_from_slice(&len.to_le_bytes());
        let mut offset = 4;
        for item in self {
            let used = item.encode_cdr2_le(&mut dst[offset..])?;
            offset += used;
        }
        Ok(offset)
    }

    fn max_cdr2_size(&self) -> usize {
        4 + self.iter().map(Cdr2Encode::max_cdr2_size).sum::<usize>()
    }
}

impl<T: Cdr2Decode> Cdr2Decode for Vec<T> {
    fn decode_cdr2_le(src: &[u8]) -> Result<(Self, usize), CdrError> {
        let (count, _) = u32::decode_cdr2_le(src)?;
        let mut offset = 4;
        let mut items = Vec::with_capacity(count as usize);
        for _ in 0..count {
            if offset > src.len() {
                return Err(CdrError::UnexpectedEof);
            }
            let (item, used) = T::decode_cdr2_le(&src[offset..])?;
            offset += used;
            items.push(item);
        }
        Ok((items, offset))
    }
}
