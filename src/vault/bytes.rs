//! Big-endian integer and length-prefixed framing primitives.
//!
//! Every variable-length field in the vault payload is written as
//! `len (N bytes, big-endian) || bytes`, with `N` chosen per field.
//! Widths are 1..=8 bytes; values that do not fit are rejected rather
//! than truncated.

use thiserror::Error;

/// Widest integer the codec handles (a `u64`).
pub const MAX_WIDTH: usize = 8;

/// A value or length did not fit the requested byte width, or a read
/// ran past the end of its buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("value {value} does not fit in {width} byte(s)")]
    Overflow { value: u64, width: usize },

    #[error("unsupported integer width {0}")]
    BadWidth(usize),

    #[error("needed {wanted} byte(s), only {remaining} left")]
    Truncated { wanted: usize, remaining: usize },
}

/// Largest value representable in `width` bytes.
pub fn max_value(width: usize) -> u64 {
    if width >= MAX_WIDTH {
        u64::MAX
    } else {
        (1u64 << (8 * width)) - 1
    }
}

/// Big-endian representation of `n` in exactly `width` bytes.
pub fn num_to_bytes(n: u64, width: usize) -> Result<Vec<u8>, CodecError> {
    if width == 0 || width > MAX_WIDTH {
        return Err(CodecError::BadWidth(width));
    }
    if n > max_value(width) {
        return Err(CodecError::Overflow { value: n, width });
    }
    Ok(n.to_be_bytes()[MAX_WIDTH - width..].to_vec())
}

/// Interpret `bytes` as a big-endian unsigned integer.
///
/// An empty slice is zero. More than eight bytes cannot be represented.
pub fn bytes_to_num(bytes: &[u8]) -> Result<u64, CodecError> {
    if bytes.len() > MAX_WIDTH {
        return Err(CodecError::BadWidth(bytes.len()));
    }
    Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
}

/// `num_to_bytes(len(bytes), width) || bytes`.
pub fn length_prefixed(bytes: &[u8], width: usize) -> Result<Vec<u8>, CodecError> {
    let mut out = num_to_bytes(bytes.len() as u64, width)?;
    out.extend_from_slice(bytes);
    Ok(out)
}

/// Append a length-prefixed field to `buf`.
pub fn put_prefixed(buf: &mut Vec<u8>, bytes: &[u8], width: usize) -> Result<(), CodecError> {
    buf.extend_from_slice(&num_to_bytes(bytes.len() as u64, width)?);
    buf.extend_from_slice(bytes);
    Ok(())
}

/// Append a fixed-width big-endian integer to `buf`.
pub fn put_num(buf: &mut Vec<u8>, n: u64, width: usize) -> Result<(), CodecError> {
    buf.extend_from_slice(&num_to_bytes(n, width)?);
    Ok(())
}

/// Bounds-checked cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Take exactly `n` bytes.
    pub fn read_exact(&mut self, n: usize) -> Result<&'a [u8], CodecError> {
        if n > self.remaining() {
            return Err(CodecError::Truncated {
                wanted: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a `width`-byte big-endian integer.
    pub fn read_num(&mut self, width: usize) -> Result<u64, CodecError> {
        if width == 0 || width > MAX_WIDTH {
            return Err(CodecError::BadWidth(width));
        }
        bytes_to_num(self.read_exact(width)?)
    }

    /// Read a `width`-byte length followed by that many bytes.
    pub fn read_prefixed(&mut self, width: usize) -> Result<&'a [u8], CodecError> {
        let len = self.read_num(width)?;
        let len = usize::try_from(len).map_err(|_| CodecError::Truncated {
            wanted: usize::MAX,
            remaining: self.remaining(),
        })?;
        self.read_exact(len)
    }

    /// Consume everything that is left.
    pub fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }
}
