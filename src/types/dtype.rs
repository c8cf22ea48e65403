//! NumPy data types supported in array files.

use crate::npy::NpyError;
use crate::types::ByteOrder;

use std::str::FromStr;
use strum_macros::Display;

/// Supported element data types
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum DType {
    /// [bool]
    Bool,
    /// [i8]
    Int8,
    /// [i16]
    Int16,
    /// [i32]
    Int32,
    /// [i64]
    Int64,
    /// [u8]
    Uint8,
    /// [u16]
    Uint16,
    /// [u32]
    Uint32,
    /// [u64]
    Uint64,
    /// [f32]
    Float32,
    /// [f64]
    Float64,
    /// Fixed width UTF-32 string of the given number of characters
    Unicode(usize),
    /// Fixed width byte string of the given number of bytes
    Bytes(usize),
}

impl DType {
    /// Returns the size of a single element in bytes.
    pub fn size_of(self) -> usize {
        match self {
            Self::Bool => 1,
            Self::Int8 => std::mem::size_of::<i8>(),
            Self::Int16 => std::mem::size_of::<i16>(),
            Self::Int32 => std::mem::size_of::<i32>(),
            Self::Int64 => std::mem::size_of::<i64>(),
            Self::Uint8 => std::mem::size_of::<u8>(),
            Self::Uint16 => std::mem::size_of::<u16>(),
            Self::Uint32 => std::mem::size_of::<u32>(),
            Self::Uint64 => std::mem::size_of::<u64>(),
            Self::Float32 => std::mem::size_of::<f32>(),
            Self::Float64 => std::mem::size_of::<f64>(),
            Self::Unicode(chars) => chars * 4,
            Self::Bytes(bytes) => bytes,
        }
    }
}

/// An array type description, as found in the `descr` field of an NPY header.
///
/// The string form is a byte order character followed by a kind character and an item size, e.g.
/// `<f8` or `|b1`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Descr {
    /// Byte order of multi-byte elements
    pub byte_order: ByteOrder,
    /// Element data type
    pub dtype: DType,
}

impl FromStr for Descr {
    type Err = NpyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsupported = || NpyError::UnsupportedDType(s.to_string());
        let mut chars = s.chars();
        let byte_order = chars
            .next()
            .and_then(ByteOrder::from_npy)
            .ok_or_else(unsupported)?;
        let kind = chars.next().ok_or_else(unsupported)?;
        let size: usize = chars.as_str().parse().map_err(|_| unsupported())?;
        let dtype = match (kind, size) {
            ('b', 1) => DType::Bool,
            ('i', 1) => DType::Int8,
            ('i', 2) => DType::Int16,
            ('i', 4) => DType::Int32,
            ('i', 8) => DType::Int64,
            ('u', 1) => DType::Uint8,
            ('u', 2) => DType::Uint16,
            ('u', 4) => DType::Uint32,
            ('u', 8) => DType::Uint64,
            ('f', 4) => DType::Float32,
            ('f', 8) => DType::Float64,
            ('U', chars) if chars.checked_mul(4).is_some() => DType::Unicode(chars),
            ('S', bytes) => DType::Bytes(bytes),
            _ => return Err(unsupported()),
        };
        Ok(Descr { byte_order, dtype })
    }
}
