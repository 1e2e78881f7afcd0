//! Bounded views over guest linear memory.

use wasmtime::Caller;

use crate::error::{MemoryError, MemoryResult};

/// Name of the memory export every guest module must provide.
pub const MEMORY_EXPORT: &str = "memory";

/// Decode a byte slice as single-byte text, one char per byte.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encode host text back into the single-byte wire form.
///
/// Characters above U+00FF are truncated to their low byte, matching what
/// the wire does to text that was never single-byte to begin with. Guests
/// that round-trip their own strings never hit this case.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars().map(|c| c as u32 as u8).collect()
}

/// A read/write window over the guest's memory region, valid for one call.
///
/// Constructed via [`split`] at the top of a host function and dropped when
/// the function returns. Holding one across calls is impossible by
/// construction: the borrow is tied to the `Caller`.
pub struct MemoryView<'a> {
    data: &'a mut [u8],
}

impl<'a> MemoryView<'a> {
    /// Wrap a raw slice of guest memory.
    pub fn new(data: &'a mut [u8]) -> Self {
        Self { data }
    }

    /// Current size of the memory region in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the region is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Read a NUL-terminated string starting at `ptr`.
    ///
    /// The scan is bounded by the current region size; running off the end
    /// is an [`MemoryError::Unterminated`] error, never a wild read.
    pub fn read_cstring(&self, ptr: usize) -> MemoryResult<String> {
        if ptr >= self.data.len() {
            return Err(MemoryError::OutOfBounds {
                ptr,
                len: 1,
                memory_size: self.data.len(),
            });
        }

        let tail = &self.data[ptr..];
        match tail.iter().position(|&b| b == 0) {
            Some(nul) => Ok(decode_latin1(&tail[..nul])),
            None => Err(MemoryError::Unterminated {
                ptr,
                memory_size: self.data.len(),
            }),
        }
    }

    /// Borrow exactly `len` bytes starting at `ptr`.
    pub fn read_bytes(&self, ptr: usize, len: usize) -> MemoryResult<&[u8]> {
        let end = ptr
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(MemoryError::OutOfBounds {
                ptr,
                len,
                memory_size: self.data.len(),
            })?;
        Ok(&self.data[ptr..end])
    }

    /// Read `len` bytes at `ptr` as little-endian 32-bit floats.
    pub fn read_f32s(&self, ptr: usize, len: usize) -> MemoryResult<Vec<f32>> {
        let bytes = self.read_elements(ptr, len, 4)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    /// Read `len` bytes at `ptr` as little-endian 32-bit unsigned integers.
    pub fn read_u32s(&self, ptr: usize, len: usize) -> MemoryResult<Vec<u32>> {
        let bytes = self.read_elements(ptr, len, 4)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    fn read_elements(&self, ptr: usize, len: usize, element: usize) -> MemoryResult<&[u8]> {
        if len % element != 0 {
            return Err(MemoryError::Misaligned { len, element });
        }
        self.read_bytes(ptr, len)
    }

    /// Copy `src` into guest memory at `ptr`, requiring `src.len() == len`.
    ///
    /// This is the strict-length transfer contract: the guest always knows
    /// the exact size it asked for, so any mismatch is a protocol desync.
    /// On failure guest memory is left untouched.
    pub fn write_exact(&mut self, ptr: usize, len: usize, src: &[u8]) -> MemoryResult<()> {
        if src.len() != len {
            return Err(MemoryError::LengthMismatch {
                expected: len,
                actual: src.len(),
            });
        }
        let end = ptr
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(MemoryError::OutOfBounds {
                ptr,
                len,
                memory_size: self.data.len(),
            })?;
        self.data[ptr..end].copy_from_slice(src);
        Ok(())
    }

    /// Write a contiguous little-endian u32 array at `ptr`.
    ///
    /// Used for batch handle output: the order of elements is the order the
    /// caller created them in.
    pub fn write_u32s(&mut self, ptr: usize, values: &[u32]) -> MemoryResult<()> {
        let len = values.len() * 4;
        let end = ptr
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or(MemoryError::OutOfBounds {
                ptr,
                len,
                memory_size: self.data.len(),
            })?;
        for (chunk, value) in self.data[ptr..end].chunks_exact_mut(4).zip(values) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        Ok(())
    }
}

impl std::fmt::Debug for MemoryView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryView")
            .field("len", &self.data.len())
            .finish()
    }
}

/// Derive a fresh [`MemoryView`] and the store state from a caller.
///
/// Looks up the guest's [`MEMORY_EXPORT`] and splits it into disjoint
/// borrows of the memory bytes and the store data, so a host function can
/// marshal arguments and mutate bridge state in the same scope. Must be
/// called anew on every entry — the region may have grown (and moved) since
/// the previous call.
pub fn split<'a, T: 'static>(
    caller: &'a mut Caller<'_, T>,
) -> MemoryResult<(MemoryView<'a>, &'a mut T)> {
    let memory = caller
        .get_export(MEMORY_EXPORT)
        .and_then(|e| e.into_memory())
        .ok_or(MemoryError::MissingMemory(MEMORY_EXPORT))?;
    let (data, state) = memory.data_and_store_mut(caller);
    Ok((MemoryView::new(data), state))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_of(data: &mut [u8]) -> MemoryView<'_> {
        MemoryView::new(data)
    }

    #[test]
    fn test_cstring_round_trip() {
        let mut data = vec![0u8; 64];
        let text = "hello #fff";
        data[8..8 + text.len()].copy_from_slice(text.as_bytes());
        data[8 + text.len()] = 0;

        let view = view_of(&mut data);
        assert_eq!(view.read_cstring(8).unwrap(), text);
    }

    #[test]
    fn test_cstring_is_single_byte_decoded() {
        let mut data = vec![0u8; 8];
        data[0] = 0xe9; // é in Latin-1, invalid as UTF-8 lead byte
        data[1] = 0;

        let view = view_of(&mut data);
        assert_eq!(view.read_cstring(0).unwrap(), "\u{e9}");
    }

    #[test]
    fn test_cstring_unterminated() {
        let mut data = vec![b'x'; 16];
        let view = view_of(&mut data);
        assert!(matches!(
            view.read_cstring(4),
            Err(MemoryError::Unterminated { ptr: 4, .. })
        ));
    }

    #[test]
    fn test_cstring_out_of_bounds_ptr() {
        let mut data = vec![0u8; 16];
        let view = view_of(&mut data);
        assert!(matches!(
            view.read_cstring(16),
            Err(MemoryError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_read_f32s() {
        let mut data = vec![0u8; 32];
        for (i, v) in [1.0f32, 2.0, 3.0].iter().enumerate() {
            data[4 + i * 4..8 + i * 4].copy_from_slice(&v.to_le_bytes());
        }

        let view = view_of(&mut data);
        assert_eq!(view.read_f32s(4, 12).unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_read_u32s_rejects_misaligned_length() {
        let mut data = vec![0u8; 32];
        let view = view_of(&mut data);
        assert!(matches!(
            view.read_u32s(0, 7),
            Err(MemoryError::Misaligned { len: 7, element: 4 })
        ));
    }

    #[test]
    fn test_write_exact_strict_length() {
        let mut data = vec![0xaau8; 16];
        let mut view = view_of(&mut data);

        // Mismatched source length fails and leaves memory untouched.
        assert!(matches!(
            view.write_exact(2, 4, b"abc"),
            Err(MemoryError::LengthMismatch {
                expected: 4,
                actual: 3
            })
        ));
        assert_eq!(view.read_bytes(2, 4).unwrap(), &[0xaa; 4]);

        view.write_exact(2, 3, b"abc").unwrap();
        assert_eq!(view.read_bytes(2, 3).unwrap(), b"abc");
    }

    #[test]
    fn test_write_exact_out_of_bounds() {
        let mut data = vec![0u8; 8];
        let mut view = view_of(&mut data);
        assert!(matches!(
            view.write_exact(6, 4, b"abcd"),
            Err(MemoryError::OutOfBounds { ptr: 6, len: 4, .. })
        ));
    }

    #[test]
    fn test_write_u32s_order_and_layout() {
        let mut data = vec![0u8; 32];
        let mut view = view_of(&mut data);
        view.write_u32s(8, &[0, 1, 2]).unwrap();

        assert_eq!(view.read_u32s(8, 12).unwrap(), vec![0, 1, 2]);
        // Little-endian layout of the second element.
        assert_eq!(view.read_bytes(12, 4).unwrap(), &[1, 0, 0, 0]);
    }

    #[test]
    fn test_latin1_codec_round_trip() {
        let bytes: Vec<u8> = (1..=255).collect();
        let text = decode_latin1(&bytes);
        assert_eq!(text.chars().count(), 255);
        assert_eq!(encode_latin1(&text), bytes);
    }
}
