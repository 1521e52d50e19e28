//! Bounds-checked views into WASM linear memory.
//!
//! All functions validate offset and length arguments against the guest's
//! linear memory size before accessing. A range that is not fully inside
//! memory is rejected with a guest-argument error; it is never truncated.
//!
//! A missing memory export is detected by the caller that obtains the
//! memory (see `linker`), since that is a host misconfiguration.

use std::marker::PhantomData;
use std::ops::Range;

use wasi_llm_hostapi::HostError;

/// Validate `[offset, offset+len)` against a memory of `mem_size` bytes.
fn checked_range(mem_size: usize, offset: u32, len: u32) -> Result<Range<usize>, HostError> {
    let out_of_bounds = || HostError::OutOfBounds {
        offset,
        len,
        memory_size: mem_size,
    };
    let start = offset as usize;
    let end = start.checked_add(len as usize).ok_or_else(out_of_bounds)?;
    if end > mem_size {
        return Err(out_of_bounds());
    }
    Ok(start..end)
}

/// A validated view of guest bytes, valid for one host call.
///
/// Its length always equals the requested length.
#[derive(Debug, Clone, Copy)]
pub struct GuestSpan<'a> {
    offset: u32,
    bytes: &'a [u8],
}

impl<'a> GuestSpan<'a> {
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Decode the span as a path string.
    ///
    /// A single trailing NUL is accepted and dropped for C-string guests.
    /// Empty strings, interior NULs, and invalid UTF-8 are rejected.
    pub fn to_str(&self) -> Result<&'a str, HostError> {
        let bytes = self.bytes.strip_suffix(&[0]).unwrap_or(self.bytes);
        if bytes.is_empty() {
            return Err(HostError::invalid_argument("path", "empty"));
        }
        if bytes.contains(&0) {
            return Err(HostError::invalid_argument("path", "interior NUL byte"));
        }
        std::str::from_utf8(bytes).map_err(|_| HostError::invalid_argument("path", "not UTF-8"))
    }
}

/// Resolve `len` guest bytes at `offset`.
pub fn resolve_bytes(mem: &[u8], offset: u32, len: u32) -> Result<GuestSpan<'_>, HostError> {
    let range = checked_range(mem.len(), offset, len)?;
    Ok(GuestSpan {
        offset,
        bytes: &mem[range],
    })
}

/// Fixed-size little-endian scalars that can live in a [`GuestSlot`].
pub trait GuestScalar: Copy {
    const SIZE: u32;

    fn read_le(bytes: &[u8]) -> Self;

    fn write_le(self, out: &mut [u8]);
}

macro_rules! impl_guest_scalar {
    ($($t:ty),*) => {
        $(
            impl GuestScalar for $t {
                const SIZE: u32 = std::mem::size_of::<$t>() as u32;

                fn read_le(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    <$t>::from_le_bytes(buf)
                }

                fn write_le(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_guest_scalar!(u32, i32, u64);

/// A validated location of one `T` in guest memory.
///
/// Used for out-parameters and for handles the guest passes by reference.
#[derive(Debug, Clone, Copy)]
pub struct GuestSlot<T> {
    offset: u32,
    _ty: PhantomData<T>,
}

impl<T: GuestScalar> GuestSlot<T> {
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Read the current value.
    pub fn read(&self, mem: &[u8]) -> Result<T, HostError> {
        let range = checked_range(mem.len(), self.offset, T::SIZE)?;
        Ok(T::read_le(&mem[range]))
    }

    /// Overwrite the slot with `value`.
    pub fn write(&self, mem: &mut [u8], value: T) -> Result<(), HostError> {
        let range = checked_range(mem.len(), self.offset, T::SIZE)?;
        value.write_le(&mut mem[range]);
        Ok(())
    }
}

/// Resolve a slot for one `T` at `offset`. Offset `0` is the null pointer.
pub fn resolve_slot<T: GuestScalar>(mem: &[u8], offset: u32) -> Result<GuestSlot<T>, HostError> {
    if offset == 0 {
        return Err(HostError::NullPointer);
    }
    checked_range(mem.len(), offset, T::SIZE)?;
    Ok(GuestSlot {
        offset,
        _ty: PhantomData,
    })
}
