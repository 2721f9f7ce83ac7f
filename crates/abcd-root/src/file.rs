//! TFile header parsing and the top-level ROOT file interface.

use std::fs;
use std::path::{Path, PathBuf};

use crate::datasource::DataSource;
use crate::decompress::decompress;
use crate::directory::{Directory, DirectoryHeader};
use crate::error::{Result, RootError};
use crate::histogram::RootHistogram;
use crate::key::{Key, KeyInfo};
use crate::objects;
use crate::rbuffer::RBuffer;

const ROOT_MAGIC: &[u8; 4] = b"root";
/// Smallest file that can hold the fixed header.
const MIN_FILE_LEN: usize = 64;
/// File format versions at or above this use 64-bit seek pointers.
const LARGE_FILE_VERSION: u32 = 1_000_000;

/// Parsed file-level header.
#[derive(Debug, Clone, Copy)]
struct FileHeader {
    /// Whether the file uses 64-bit seek pointers.
    is_large: bool,
    /// Top-level directory.
    top: DirectoryHeader,
}

/// A ROOT file opened for reading histograms.
pub struct RootFile {
    data: DataSource,
    header: FileHeader,
    path: PathBuf,
}

impl RootFile {
    /// Open and parse a ROOT file from disk using memory mapping.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = fs::File::open(&path)?;
        // SAFETY: the map is read-only; input files are not modified while an
        // analysis run holds them open.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Self::from_datasource(DataSource::Mmap(mmap), path)
    }

    /// Parse a ROOT file held in memory.
    pub fn from_bytes(data: Vec<u8>, path: PathBuf) -> Result<Self> {
        Self::from_datasource(DataSource::Owned(data), path)
    }

    fn from_datasource(data: DataSource, path: PathBuf) -> Result<Self> {
        if data.len() < MIN_FILE_LEN || &data[0..4] != ROOT_MAGIC {
            return Err(RootError::BadMagic);
        }
        let header = parse_header(&data)?;
        Ok(Self { data, header, path })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List all keys in the top-level directory.
    pub fn list_keys(&self) -> Result<Vec<KeyInfo>> {
        let dir = self.top_directory()?;
        Ok(dir.keys().iter().map(KeyInfo::from).collect())
    }

    /// Get a histogram by its path (e.g. `"subdir/hist_name"`).
    pub fn get_histogram(&self, path: &str) -> Result<RootHistogram> {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((&leaf, dirs)) = parts.split_last() else {
            return Err(RootError::KeyNotFound(path.to_string()));
        };

        let mut dir = self.top_directory()?;
        for &part in dirs {
            let key = dir
                .find_key(part)
                .ok_or_else(|| RootError::KeyNotFound(format!("{} (in path {})", part, path)))?;
            if !key.is_directory() {
                return Err(RootError::Deserialization(format!(
                    "'{}' is not a directory (class: {})",
                    part, key.class_name
                )));
            }
            let payload = self.read_key_payload(key)?;
            dir = Directory::from_payload(&payload, &self.data, self.header.is_large)?;
        }

        let key = dir.find_key(leaf).ok_or_else(|| RootError::KeyNotFound(path.to_string()))?;
        let payload = self.read_key_payload(key)?;
        objects::read_histogram(&payload, &key.class_name)
    }

    fn top_directory(&self) -> Result<Directory> {
        Directory::read(&self.data, self.header.top, self.header.is_large)
    }

    /// Read and, if needed, decompress the object bytes behind a TKey.
    fn read_key_payload(&self, key: &Key) -> Result<Vec<u8>> {
        let seek = usize::try_from(key.seek_key)
            .map_err(|_| RootError::Deserialization(format!("seek offset too large: {}", key.seek_key)))?;
        let record = seek
            .checked_add(key.n_bytes as usize)
            .and_then(|end| self.data.get(seek..end))
            .ok_or(RootError::BufferUnderflow {
                offset: seek,
                need: key.n_bytes as usize,
                have: self.data.len().saturating_sub(seek),
            })?;
        let stored = record.get(key.key_len as usize..).ok_or_else(|| {
            RootError::Deserialization(format!("key '{}' shorter than its header", key.name))
        })?;

        if key.is_compressed() {
            decompress(stored, key.obj_len as usize)
        } else {
            Ok(stored.to_vec())
        }
    }
}

/// Parse the fixed file header and the top-level directory streamer.
///
/// ROOT file header layout (small file, version < 1000000):
/// ```text
/// offset  size  field
///    0      4   magic "root"
///    4      4   fVersion
///    8      4   fBEGIN
///   12      4   fEND
///   16      4   fSeekFree
///   20      4   fNbytesFree
///   24      4   nfree
///   28      4   fNbytesName
///   32      1   fUnits
///   33      4   fCompress
///   37      4   fSeekInfo
///   41      4   fNbytesInfo
///   45     18   fUUID
/// ```
/// Large files widen fEND, fSeekFree and fSeekInfo to 8 bytes. The TDirectory
/// streamer sits at `fBEGIN + fNbytesName`.
fn parse_header(data: &[u8]) -> Result<FileHeader> {
    let mut r = RBuffer::at(data, ROOT_MAGIC.len());

    let version = r.read_u32()?;
    let is_large = version >= LARGE_FILE_VERSION;
    let begin = r.read_u32()? as usize;
    let _end = r.read_seek(is_large)?;
    let _seek_free = r.read_seek(is_large)?;
    let _nbytes_free = r.read_u32()?;
    let _nfree = r.read_u32()?;
    let nbytes_name = r.read_u32()? as usize;

    let dir_offset = begin + nbytes_name;
    if dir_offset >= data.len() {
        return Err(RootError::Deserialization("TDirectory offset past end of file".into()));
    }
    let top = DirectoryHeader::read(&mut RBuffer::at(data, dir_offset))?;
    Ok(FileHeader { is_large, top })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_non_root_file() {
        let result = RootFile::from_bytes(vec![0u8; 100], PathBuf::from("test.root"));
        assert!(matches!(result, Err(RootError::BadMagic)));
    }

    #[test]
    fn reject_too_small() {
        let result = RootFile::from_bytes(b"root".to_vec(), PathBuf::from("test.root"));
        assert!(matches!(result, Err(RootError::BadMagic)));
    }

    #[test]
    fn reject_directory_past_end() {
        let mut data = vec![0u8; 80];
        data[..4].copy_from_slice(ROOT_MAGIC);
        data[4..8].copy_from_slice(&62206u32.to_be_bytes());
        data[8..12].copy_from_slice(&100u32.to_be_bytes());
        let result = RootFile::from_bytes(data, PathBuf::from("test.root"));
        assert!(matches!(result, Err(RootError::Deserialization(_))));
    }
}
