//! ROOT compression blocks (ZL = zlib, L4 = LZ4, ZS = ZSTD, XZ = LZMA).
//!
//! A compressed object is a sequence of blocks, each with a 9-byte header:
//! ```text
//! bytes 0-1:  algorithm tag ("ZL", "XZ", "L4", "ZS")
//! byte  2:    method (ignored)
//! bytes 3-5:  compressed size   (3-byte little-endian)
//! bytes 6-8:  uncompressed size (3-byte little-endian)
//! ```

use std::io::Read;

use crate::error::{Result, RootError};

const BLOCK_HEADER_LEN: usize = 9;
/// ROOT's LZ4 blocks start with an xxhash64 checksum of the payload.
const LZ4_CHECKSUM_LEN: usize = 8;
/// Upper bound on the compression ratio assumed when reserving output.
const MAX_EXPANSION: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Codec {
    Zlib,
    Lz4,
    Zstd,
    Xz,
}

impl Codec {
    fn from_tag(tag: [u8; 2]) -> Result<Self> {
        match &tag {
            b"ZL" => Ok(Codec::Zlib),
            b"L4" => Ok(Codec::Lz4),
            b"ZS" => Ok(Codec::Zstd),
            b"XZ" => Ok(Codec::Xz),
            _ => Err(fail(format!("unsupported compression algorithm {:?}", String::from_utf8_lossy(&tag)))),
        }
    }

    fn decode(self, block: &[u8], expected: usize) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(expected.min(block.len().saturating_mul(MAX_EXPANSION)));
        match self {
            Codec::Zlib => {
                flate2::read::ZlibDecoder::new(block).read_to_end(&mut out).map_err(|e| fail(format!("zlib: {e}")))?;
            }
            Codec::Lz4 => {
                let payload = block.get(LZ4_CHECKSUM_LEN..).ok_or_else(|| fail("LZ4 block shorter than its checksum"))?;
                out = lz4_flex::decompress(payload, expected).map_err(|e| fail(format!("lz4: {e}")))?;
            }
            Codec::Zstd => {
                let mut decoder =
                    ruzstd::decoding::StreamingDecoder::new(block).map_err(|e| fail(format!("zstd: {e}")))?;
                decoder.read_to_end(&mut out).map_err(|e| fail(format!("zstd: {e}")))?;
            }
            Codec::Xz => {
                lzma_rs::xz_decompress(&mut std::io::BufReader::new(block), &mut out)
                    .map_err(|e| fail(format!("xz: {e}")))?;
            }
        }
        Ok(out)
    }
}

fn fail(message: impl Into<String>) -> RootError {
    RootError::Decompression(message.into())
}

/// Parsed 9-byte block header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BlockHeader {
    codec: Codec,
    compressed: usize,
    uncompressed: usize,
}

impl BlockHeader {
    fn parse(bytes: &[u8]) -> Result<Self> {
        let le24 = |b: &[u8]| usize::from(b[0]) | usize::from(b[1]) << 8 | usize::from(b[2]) << 16;
        Ok(Self {
            codec: Codec::from_tag([bytes[0], bytes[1]])?,
            compressed: le24(&bytes[3..6]),
            uncompressed: le24(&bytes[6..9]),
        })
    }
}

/// Decompress ROOT-compressed data into exactly `expected_len` bytes.
pub fn decompress(src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    // `expected_len` comes from the file; reserve no more than the input can plausibly yield.
    let mut out = Vec::with_capacity(expected_len.min(src.len().saturating_mul(MAX_EXPANSION)));
    let mut rest = src;

    while out.len() < expected_len && rest.len() >= BLOCK_HEADER_LEN {
        let header = BlockHeader::parse(&rest[..BLOCK_HEADER_LEN])?;
        rest = &rest[BLOCK_HEADER_LEN..];
        if rest.len() < header.compressed {
            return Err(fail(format!(
                "compressed block claims {} bytes but only {} remain",
                header.compressed,
                rest.len()
            )));
        }
        let (block, tail) = rest.split_at(header.compressed);
        let decoded = header.codec.decode(block, header.uncompressed)?;
        if decoded.len() != header.uncompressed {
            return Err(fail(format!(
                "{:?} block expanded to {} bytes, header says {}",
                header.codec,
                decoded.len(),
                header.uncompressed
            )));
        }
        out.extend_from_slice(&decoded);
        rest = tail;
    }

    if out.len() != expected_len {
        return Err(fail(format!("decompressed {} bytes, expected {expected_len}", out.len())));
    }
    Ok(out)
}
