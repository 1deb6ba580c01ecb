//! Low-level byte stream parser for CIL method bodies.
//!
//! This module provides the [`Parser`] type, a cursor-based binary reader used by the
//! instruction decoder. It offers bounds-checked little-endian access to a byte slice;
//! every read either succeeds completely or fails with [`crate::Error::OutOfBounds`]
//! without advancing past the end of the buffer.
//!
//! # Usage Example
//!
//! ```rust
//! use exprscope::Parser;
//!
//! let data = [0x01, 0x02, 0x03, 0x04];
//! let mut parser = Parser::new(&data);
//!
//! let value = parser.read_le::<u16>()?;
//! assert_eq!(value, 0x0201);
//! # Ok::<(), exprscope::Error>(())
//! ```

use crate::{Error::OutOfBounds, Result};

mod sealed {
    pub trait Sealed {}
}

/// Primitive types the parser can read in little-endian byte order.
///
/// Implemented for the fixed-width integers and floats that appear as CIL
/// instruction operands. The trait is sealed; the set of operand widths is
/// closed by the ECMA-335 instruction encoding.
pub trait ReadLe: sealed::Sealed + Sized {
    /// Number of bytes one value occupies in the stream.
    const SIZE: usize;

    /// Interpret `SIZE` bytes starting at `data[0]` as a value.
    fn from_le(data: &[u8]) -> Self;
}

macro_rules! impl_read_le {
    ($($ty:ty),*) => {
        $(
            impl sealed::Sealed for $ty {}
            impl ReadLe for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                fn from_le(data: &[u8]) -> Self {
                    let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                    bytes.copy_from_slice(&data[..std::mem::size_of::<$ty>()]);
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_read_le!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// A cursor-based binary reader over a CIL method body.
///
/// `Parser` maintains a position within a byte slice and provides strongly typed,
/// bounds-checked reads. It is the only way the instruction decoder touches raw
/// bytes, which keeps malformed or truncated bodies from causing buffer overruns.
///
/// # Examples
///
/// ```rust
/// use exprscope::Parser;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// let mut parser = Parser::new(&data);
///
/// let first = parser.read_le::<u32>()?;
/// assert_eq!(first, 0x04030201);
///
/// parser.seek(6)?;
/// let last_bytes = parser.read_le::<u16>()?;
/// assert_eq!(last_bytes, 0x0807);
/// # Ok::<(), exprscope::Error>(())
/// ```
pub struct Parser<'a> {
    /// The binary data being parsed
    data: &'a [u8],
    /// Current position within the data buffer
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new [`Parser`] from a byte slice.
    ///
    /// # Arguments
    /// * `data` - The byte slice to read from
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Returns the length of the underlying data buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the parser has no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` if there is more data available to parse.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the current position to the specified index.
    ///
    /// # Arguments
    /// * `pos` - The position to move the cursor to
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if `pos` is beyond the data length.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos >= self.data.len() {
            return Err(OutOfBounds);
        }

        self.position = pos;
        Ok(())
    }

    /// Move the position forward by the specified number of bytes.
    ///
    /// # Arguments
    /// * `step` - Amount of bytes to advance
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if advancing by `step` would exceed the data length.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        if self.position + step > self.data.len() {
            return Err(OutOfBounds);
        }

        self.position += step;
        Ok(())
    }

    /// Get the current position of the parser within the data buffer.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Get access to the underlying data buffer.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.data
    }

    /// Peek at the next byte without advancing the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the position is at or beyond the data length.
    pub fn peek_byte(&self) -> Result<u8> {
        if self.position >= self.data.len() {
            return Err(OutOfBounds);
        }
        Ok(self.data[self.position])
    }

    /// Read a value of type `T` in little-endian format and advance the position.
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if reading `T` would exceed the data length.
    pub fn read_le<T: ReadLe>(&mut self) -> Result<T> {
        if self.position + T::SIZE > self.data.len() {
            return Err(OutOfBounds);
        }

        let value = T::from_le(&self.data[self.position..]);
        self.position += T::SIZE;
        Ok(value)
    }
}
