//! Decoding of the NumPy `.npy` array file format.
//!
//! An NPY file consists of a magic string, a format version, a little endian header length, a
//! header and the raw element data. The header is a Python dictionary literal describing the
//! element type (`descr`), the memory layout (`fortran_order`) and the array `shape`.
//!
//! See the [format description](https://numpy.org/doc/stable/reference/generated/numpy.lib.format.html).

use crate::types::{ByteOrder, DType, Descr};

use ndarray::ShapeError;
use thiserror::Error;

/// Magic string at the start of every NPY file.
pub const MAGIC: &[u8] = b"\x93NUMPY";

/// Errors decoding an NPY file.
#[derive(Debug, Error)]
pub enum NpyError {
    /// File does not start with the NPY magic string
    #[error("missing NPY magic string")]
    BadMagic,

    /// Unknown format version
    #[error("unsupported NPY format version {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    /// File ends before the end of the header
    #[error("NPY header is truncated")]
    TruncatedHeader,

    /// Header dictionary could not be parsed
    #[error("NPY header is not valid: {0}")]
    InvalidHeader(String),

    /// Element type is not supported
    #[error("unsupported NPY dtype {0}")]
    UnsupportedDType(String),

    /// Shape implies more elements or rows than the file could describe
    #[error("NPY shape {shape:?} is too large for a {limit} byte file")]
    ShapeTooLarge { shape: Vec<usize>, limit: usize },

    /// Data length does not match the header
    #[error("NPY data size mismatch ({actual} bytes != {expected} bytes)")]
    DataSize { expected: usize, actual: usize },

    /// String element is not valid UTF-32
    #[error("invalid character in string element")]
    InvalidString,

    /// Array has the wrong number of dimensions
    #[error("expected a {expected}-dimensional array, found {actual} dimensions")]
    Dimensionality { expected: usize, actual: usize },

    /// Element type cannot be used for coordinates
    #[error("expected numeric data, found {0}")]
    NonNumeric(DType),

    /// Error creating ndarray Array from Shape
    #[error("failed to create array from shape")]
    ShapeInvalid(#[from] ShapeError),
}

/// Parsed NPY header.
#[derive(Clone, Debug, PartialEq)]
pub struct Header {
    /// Element type description
    pub descr: Descr,
    /// Whether the data is stored in column-major (Fortran) order
    pub fortran_order: bool,
    /// Shape of the array. Empty for a scalar.
    pub shape: Vec<usize>,
}

impl Header {
    /// Number of elements in the array, or `None` if it overflows.
    pub fn element_count(&self) -> Option<usize> {
        self.shape
            .iter()
            .try_fold(1_usize, |count, len| count.checked_mul(*len))
    }
}

/// Decoded element data, widened to a small set of representations.
#[derive(Clone, Debug, PartialEq)]
pub enum NpyData {
    Bool(Vec<bool>),
    Int(Vec<i64>),
    Uint(Vec<u64>),
    Float(Vec<f64>),
    Str(Vec<String>),
}

/// A decoded NPY array. Elements are in storage order.
#[derive(Clone, Debug, PartialEq)]
pub struct NpyArray {
    pub header: Header,
    pub data: NpyData,
}

/// Decode an NPY file.
///
/// # Arguments
///
/// * `bytes`: Complete contents of the file
pub fn decode(bytes: &[u8]) -> Result<NpyArray, NpyError> {
    let (header, data) = read_header(bytes)?;
    let count = header.element_count();
    // Empty arrays and zero width elements carry no data, so the data size check does not bound
    // the shape. Bound every axis, and the number of zero width elements, by the file length.
    let limit = bytes.len();
    let zero_width = header.descr.dtype.size_of() == 0;
    if header.shape.iter().any(|len| *len > limit)
        || (zero_width && count.map_or(true, |count| count > limit))
    {
        return Err(NpyError::ShapeTooLarge {
            shape: header.shape,
            limit,
        });
    }
    let expected = count
        .and_then(|count| count.checked_mul(header.descr.dtype.size_of()))
        .ok_or_else(|| NpyError::InvalidHeader("array is too large".to_string()))?;
    if data.len() != expected {
        return Err(NpyError::DataSize {
            expected,
            actual: data.len(),
        });
    }
    let data = decode_elements(header.descr, count.unwrap_or_default(), data)?;
    Ok(NpyArray { header, data })
}

/// Split an NPY file into its parsed header and the raw element data.
pub fn read_header(bytes: &[u8]) -> Result<(Header, &[u8]), NpyError> {
    if !bytes.starts_with(MAGIC) {
        return Err(NpyError::BadMagic);
    }
    let rest = &bytes[MAGIC.len()..];
    let (major, minor) = match rest {
        [major, minor, ..] => (*major, *minor),
        _ => return Err(NpyError::TruncatedHeader),
    };
    let rest = &rest[2..];
    let (header_len, rest) = match major {
        1 => match rest {
            [a, b, rest @ ..] => (u16::from_le_bytes([*a, *b]) as usize, rest),
            _ => return Err(NpyError::TruncatedHeader),
        },
        2 | 3 => match rest {
            [a, b, c, d, rest @ ..] => (u32::from_le_bytes([*a, *b, *c, *d]) as usize, rest),
            _ => return Err(NpyError::TruncatedHeader),
        },
        _ => return Err(NpyError::UnsupportedVersion { major, minor }),
    };
    if rest.len() < header_len {
        return Err(NpyError::TruncatedHeader);
    }
    let (header, data) = rest.split_at(header_len);
    // Versions 1 and 2 use latin1, version 3 uses UTF-8. Header keys and values are ASCII.
    let header = std::str::from_utf8(header)
        .map_err(|_| NpyError::InvalidHeader("header is not ASCII".to_string()))?;
    Ok((parse_header(header)?, data))
}

/// A value in the header dictionary.
#[derive(Debug, PartialEq)]
enum HeaderValue {
    Str(String),
    Bool(bool),
    Tuple(Vec<usize>),
}

/// Parse the Python dictionary literal in an NPY header.
fn parse_header(header: &str) -> Result<Header, NpyError> {
    let mut parser = HeaderParser::new(header);
    let mut descr = None;
    let mut fortran_order = None;
    let mut shape = None;
    for (key, value) in parser.parse_dict()? {
        match (key.as_str(), value) {
            ("descr", HeaderValue::Str(s)) => descr = Some(s.parse::<Descr>()?),
            ("fortran_order", HeaderValue::Bool(b)) => fortran_order = Some(b),
            ("shape", HeaderValue::Tuple(t)) => shape = Some(t),
            (key, value) => {
                return Err(NpyError::InvalidHeader(format!(
                    "unexpected entry {key}: {value:?}"
                )))
            }
        }
    }
    match (descr, fortran_order, shape) {
        (Some(descr), Some(fortran_order), Some(shape)) => Ok(Header {
            descr,
            fortran_order,
            shape,
        }),
        _ => Err(NpyError::InvalidHeader(
            "header must contain descr, fortran_order and shape".to_string(),
        )),
    }
}

/// Recursive descent parser for the subset of Python literals used in NPY headers.
struct HeaderParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> HeaderParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn error(&self, expected: &str) -> NpyError {
        NpyError::InvalidHeader(format!("expected {expected} at offset {}", self.pos))
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.rest().chars().next()
    }

    fn expect(&mut self, c: char) -> Result<(), NpyError> {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("'{c}'")))
        }
    }

    /// Consume a separating comma if present. Returns whether one was found.
    fn comma(&mut self) -> bool {
        self.expect(',').is_ok()
    }

    fn parse_dict(&mut self) -> Result<Vec<(String, HeaderValue)>, NpyError> {
        self.expect('{')?;
        let mut entries = Vec::new();
        loop {
            if self.peek() == Some('}') {
                break;
            }
            let key = self.parse_str()?;
            self.expect(':')?;
            let value = self.parse_value()?;
            entries.push((key, value));
            if !self.comma() {
                break;
            }
        }
        self.expect('}')?;
        Ok(entries)
    }

    fn parse_value(&mut self) -> Result<HeaderValue, NpyError> {
        match self.peek() {
            Some('\'') | Some('"') => Ok(HeaderValue::Str(self.parse_str()?)),
            Some('(') => Ok(HeaderValue::Tuple(self.parse_tuple()?)),
            Some('[') => Err(NpyError::UnsupportedDType("structured dtype".to_string())),
            _ => self.parse_bool().map(HeaderValue::Bool),
        }
    }

    fn parse_str(&mut self) -> Result<String, NpyError> {
        let quote = match self.peek() {
            Some(q @ '\'') | Some(q @ '"') => q,
            _ => return Err(self.error("string")),
        };
        self.pos += 1;
        let rest = self.rest();
        let end = rest.find(quote).ok_or_else(|| self.error("closing quote"))?;
        let s = rest[..end].to_string();
        self.pos += end + 1;
        Ok(s)
    }

    fn parse_bool(&mut self) -> Result<bool, NpyError> {
        self.skip_whitespace();
        for (literal, value) in [("True", true), ("False", false)] {
            if self.rest().starts_with(literal) {
                self.pos += literal.len();
                return Ok(value);
            }
        }
        Err(self.error("True or False"))
    }

    fn parse_tuple(&mut self) -> Result<Vec<usize>, NpyError> {
        self.expect('(')?;
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(')') {
                break;
            }
            items.push(self.parse_int()?);
            if !self.comma() {
                break;
            }
        }
        self.expect(')')?;
        Ok(items)
    }

    fn parse_int(&mut self) -> Result<usize, NpyError> {
        self.skip_whitespace();
        let rest = self.rest();
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let value = rest[..digits]
            .parse()
            .map_err(|_| self.error("integer"))?;
        self.pos += digits;
        // Python 2 long suffix
        if self.rest().starts_with('L') {
            self.pos += 1;
        }
        Ok(value)
    }
}

/// A fixed size numeric element that can be read from bytes in either byte order.
trait Element: Sized {
    const SIZE: usize;

    fn read(chunk: &[u8], byte_order: ByteOrder) -> Self;
}

macro_rules! impl_element {
    ($($t:ty),*) => {
        $(
            impl Element for $t {
                const SIZE: usize = std::mem::size_of::<$t>();

                fn read(chunk: &[u8], byte_order: ByteOrder) -> Self {
                    let mut buf = [0_u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(chunk);
                    match byte_order {
                        ByteOrder::Big => <$t>::from_be_bytes(buf),
                        ByteOrder::Little => <$t>::from_le_bytes(buf),
                    }
                }
            }
        )*
    };
}

impl_element!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

/// Read every element of type `T` from `data`.
fn read_all<T: Element>(data: &[u8], byte_order: ByteOrder) -> impl Iterator<Item = T> + '_ {
    data.chunks_exact(T::SIZE)
        .map(move |chunk| T::read(chunk, byte_order))
}

/// Decode a UTF-32 string element, dropping NUL padding.
fn read_unicode(chunk: &[u8], byte_order: ByteOrder) -> Result<String, NpyError> {
    read_all::<u32>(chunk, byte_order)
        .take_while(|code| *code != 0)
        .map(|code| char::from_u32(code).ok_or(NpyError::InvalidString))
        .collect()
}

/// Decode a byte string element as latin1, dropping NUL padding.
fn read_bytes(chunk: &[u8]) -> String {
    chunk
        .iter()
        .take_while(|b| **b != 0)
        .map(|b| char::from(*b))
        .collect()
}

/// Decode raw element data according to its type description.
///
/// # Arguments
///
/// * `descr`: Element type description
/// * `count`: Number of elements
/// * `data`: Raw element data, exactly `count` elements long
fn decode_elements(descr: Descr, count: usize, data: &[u8]) -> Result<NpyData, NpyError> {
    let order = descr.byte_order;
    let data = match descr.dtype {
        DType::Bool => NpyData::Bool(data.iter().map(|b| *b != 0).collect()),
        DType::Int8 => NpyData::Int(read_all::<i8>(data, order).map(i64::from).collect()),
        DType::Int16 => NpyData::Int(read_all::<i16>(data, order).map(i64::from).collect()),
        DType::Int32 => NpyData::Int(read_all::<i32>(data, order).map(i64::from).collect()),
        DType::Int64 => NpyData::Int(read_all::<i64>(data, order).collect()),
        DType::Uint8 => NpyData::Uint(read_all::<u8>(data, order).map(u64::from).collect()),
        DType::Uint16 => NpyData::Uint(read_all::<u16>(data, order).map(u64::from).collect()),
        DType::Uint32 => NpyData::Uint(read_all::<u32>(data, order).map(u64::from).collect()),
        DType::Uint64 => NpyData::Uint(read_all::<u64>(data, order).collect()),
        DType::Float32 => NpyData::Float(read_all::<f32>(data, order).map(f64::from).collect()),
        DType::Float64 => NpyData::Float(read_all::<f64>(data, order).collect()),
        // Zero width strings have no bytes to chunk.
        DType::Unicode(0) | DType::Bytes(0) => NpyData::Str(vec![String::new(); count]),
        DType::Unicode(chars) => NpyData::Str(
            data.chunks_exact(chars * 4)
                .map(|chunk| read_unicode(chunk, order))
                .collect::<Result<_, _>>()?,
        ),
        DType::Bytes(bytes) => NpyData::Str(data.chunks_exact(bytes).map(read_bytes).collect()),
    };
    Ok(data)
}
