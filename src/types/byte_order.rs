#[cfg(target_endian = "big")]
pub const NATIVE_BYTE_ORDER: ByteOrder = ByteOrder::Big;

#[cfg(target_endian = "little")]
pub const NATIVE_BYTE_ORDER: ByteOrder = ByteOrder::Little;

/// Byte order / endianness.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ByteOrder {
    /// Big Endian
    Big,
    /// Little Endian
    Little,
}

impl ByteOrder {
    /// Returns the byte order for a NumPy type string prefix character.
    ///
    /// `=` (native) and `|` (not applicable, single byte types) both map to the native byte order.
    pub fn from_npy(c: char) -> Option<Self> {
        match c {
            '<' => Some(Self::Little),
            '>' => Some(Self::Big),
            '=' | '|' => Some(NATIVE_BYTE_ORDER),
            _ => None,
        }
    }
}
