//! Big-endian cursor over ROOT's streamer serialization.

use crate::error::{Result, RootError};

/// `kByteCountMask`: set on the leading u32 when a byte count precedes the version.
const BYTE_COUNT_MASK: u32 = 0x4000_0000;
/// `kIsReferenced` bit of `TObject::fBits`; a 2-byte process id follows.
const IS_REFERENCED: u32 = 0x0800_0000;

/// Version header of a streamed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Versioned {
    /// Class version.
    pub version: u16,
    /// Absolute buffer position where the object ends, when a byte count was written.
    pub end: Option<usize>,
}

/// A cursor-based reader over a byte slice.
pub struct RBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RBuffer<'a> {
    /// Create a new reader over the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Create a reader positioned at `pos`.
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    /// Current read position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Skip `n` bytes forward.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Move forward to `end` (no-op when already past it).
    pub fn seek_forward(&mut self, end: usize) -> Result<()> {
        if end > self.pos {
            self.skip(end - self.pos)?;
        }
        Ok(())
    }

    /// Read a sub-slice of `n` bytes, advancing the cursor.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    /// Read a big-endian u16.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.read_array().map(u16::from_be_bytes)
    }

    /// Read a big-endian i16.
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read_array().map(i16::from_be_bytes)
    }

    /// Read a big-endian u32.
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// Read a big-endian i32.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read_array().map(i32::from_be_bytes)
    }

    /// Read a big-endian u64.
    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_array().map(u64::from_be_bytes)
    }

    /// Read a big-endian f32.
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_array().map(f32::from_be_bytes)
    }

    /// Read a big-endian f64.
    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_array().map(f64::from_be_bytes)
    }

    /// Read a seek pointer: u64 for large files, u32 otherwise.
    pub fn read_seek(&mut self, large: bool) -> Result<u64> {
        if large { self.read_u64() } else { self.read_u32().map(u64::from) }
    }

    /// Read a ROOT-encoded string.
    ///
    /// Format: length byte (if < 255), or 255 + u32 length, then UTF-8 bytes.
    pub fn read_string(&mut self) -> Result<String> {
        let len = match self.read_u8()? {
            255 => self.read_u32()? as usize,
            n => n as usize,
        };
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a streamer version header.
    ///
    /// With the byte-count mask set, the count spans from right after the u32 to
    /// the end of the object (it includes the version u16). Without it, the first
    /// two bytes are the version and nothing else is consumed.
    pub fn read_version(&mut self) -> Result<Versioned> {
        let start = self.pos;
        let raw = self.read_u32()?;
        if raw & BYTE_COUNT_MASK != 0 {
            let byte_count = (raw & !BYTE_COUNT_MASK) as usize;
            let version = self.read_u16()?;
            Ok(Versioned { version, end: Some(start + 4 + byte_count) })
        } else {
            self.pos = start + 2;
            Ok(Versioned { version: (raw >> 16) as u16, end: None })
        }
    }

    /// Skip a whole versioned object using its byte count.
    ///
    /// Objects written without a byte count are assumed to be version-only.
    pub fn skip_versioned(&mut self) -> Result<()> {
        if let Some(end) = self.read_version()?.end {
            self.seek_forward(end)?;
        }
        Ok(())
    }

    /// Read a `TObject` header: version (u16), fUniqueID, fBits.
    pub fn read_tobject(&mut self) -> Result<(u32, u32)> {
        let _version = self.read_u16()?;
        let unique_id = self.read_u32()?;
        let bits = self.read_u32()?;
        if bits & IS_REFERENCED != 0 {
            self.skip(2)?;
        }
        Ok((unique_id, bits))
    }

    /// Read a `TNamed`: TObject + fName + fTitle.
    pub fn read_tnamed(&mut self) -> Result<(String, String)> {
        let header = self.read_version()?;
        self.read_tobject()?;
        let name = self.read_string()?;
        let title = self.read_string()?;
        if let Some(end) = header.end {
            self.seek_forward(end)?;
        }
        Ok((name, title))
    }

    /// Read `n` big-endian f64 values.
    pub fn read_f64s(&mut self, n: usize) -> Result<Vec<f64>> {
        let bytes = self.read_bytes(n.checked_mul(8).ok_or_else(|| overflow(n))?)?;
        Ok(bytes.chunks_exact(8).map(|c| f64::from_be_bytes(c.try_into().unwrap_or([0; 8]))).collect())
    }

    /// Read `n` big-endian f32 values, widened to f64.
    pub fn read_f32s(&mut self, n: usize) -> Result<Vec<f64>> {
        let bytes = self.read_bytes(n.checked_mul(4).ok_or_else(|| overflow(n))?)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| f32::from_be_bytes(c.try_into().unwrap_or([0; 4])) as f64)
            .collect())
    }

    /// Read a `TArrayD`: u32 length followed by f64 values.
    pub fn read_tarray_d(&mut self) -> Result<Vec<f64>> {
        let n = self.read_u32()? as usize;
        self.read_f64s(n)
    }

    /// Read a `TArrayF`: u32 length followed by f32 values.
    pub fn read_tarray_f(&mut self) -> Result<Vec<f64>> {
        let n = self.read_u32()? as usize;
        self.read_f32s(n)
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if self.pos.checked_add(n).is_none_or(|end| end > self.data.len()) {
            return Err(RootError::BufferUnderflow {
                offset: self.pos,
                need: n,
                have: self.remaining(),
            });
        }
        Ok(())
    }
}

fn overflow(n: usize) -> RootError {
    RootError::Deserialization(format!("array length {} overflows", n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_primitives() {
        let data = [0x01, 0x02, 0x03, 0x04, 0x40, 0x09, 0x21, 0xfb, 0x54, 0x44, 0x2d, 0x18];
        let mut r = RBuffer::new(&data);
        assert_eq!(r.read_u32().unwrap(), 0x0102_0304);
        assert!((r.read_f64().unwrap() - std::f64::consts::PI).abs() < 1e-15);
        assert_eq!(r.remaining(), 0);
        assert!(matches!(r.read_u8(), Err(RootError::BufferUnderflow { need: 1, have: 0, .. })));
    }

    #[test]
    fn read_strings() {
        let mut data = vec![3, b'a', b'b', b'c', 255];
        data.extend_from_slice(&2u32.to_be_bytes());
        data.extend_from_slice(b"xy");
        let mut r = RBuffer::new(&data);
        assert_eq!(r.read_string().unwrap(), "abc");
        assert_eq!(r.read_string().unwrap(), "xy");
    }

    #[test]
    fn version_with_byte_count() {
        let mut data = Vec::new();
        data.extend_from_slice(&(BYTE_COUNT_MASK | 16).to_be_bytes());
        data.extend_from_slice(&3u16.to_be_bytes());
        data.extend_from_slice(&[0u8; 20]);
        let mut r = RBuffer::new(&data);
        let v = r.read_version().unwrap();
        assert_eq!(v, Versioned { version: 3, end: Some(20) });

        let mut r = RBuffer::new(&data);
        r.skip_versioned().unwrap();
        assert_eq!(r.pos(), 20);
    }

    #[test]
    fn version_without_byte_count() {
        let data = [0x00, 0x05, 0x00, 0x00];
        let mut r = RBuffer::new(&data);
        let v = r.read_version().unwrap();
        assert_eq!(v, Versioned { version: 5, end: None });
        assert_eq!(r.pos(), 2);
    }

    #[test]
    fn tarray_d() {
        let mut data = Vec::new();
        data.extend_from_slice(&2u32.to_be_bytes());
        data.extend_from_slice(&1.5f64.to_be_bytes());
        data.extend_from_slice(&(-2.0f64).to_be_bytes());
        let mut r = RBuffer::new(&data);
        assert_eq!(r.read_tarray_d().unwrap(), vec![1.5, -2.0]);
    }
}
