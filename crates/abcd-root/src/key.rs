//! TKey records: the headers ROOT uses to locate stored objects.

use crate::error::Result;
use crate::rbuffer::RBuffer;

/// Key versions above this use 64-bit seek pointers.
const LARGE_KEY_VERSION: u16 = 1000;

/// A parsed TKey record.
#[derive(Debug, Clone)]
pub struct Key {
    /// Bytes on disk: key header plus (possibly compressed) object.
    pub n_bytes: u32,
    /// Uncompressed object length.
    pub obj_len: u32,
    /// Length of the key header itself.
    pub key_len: u16,
    /// Cycle number within the directory.
    pub cycle: u16,
    /// Absolute position of this key in the file.
    pub seek_key: u64,
    /// Class name of the stored object.
    pub class_name: String,
    /// Object name.
    pub name: String,
    /// Object title.
    pub title: String,
}

/// Public view of a key (for `list_keys()`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    /// Object name.
    pub name: String,
    /// Object class name (e.g. "TH1D", "TDirectoryFile").
    pub class_name: String,
    /// Cycle number.
    pub cycle: u16,
}

impl From<&Key> for KeyInfo {
    fn from(key: &Key) -> Self {
        Self { name: key.name.clone(), class_name: key.class_name.clone(), cycle: key.cycle }
    }
}

impl Key {
    /// Read a TKey at the buffer's current position.
    ///
    /// `large_file` forces 64-bit seek pointers regardless of the key version.
    pub fn read(r: &mut RBuffer, large_file: bool) -> Result<Self> {
        let n_bytes = r.read_u32()?;
        let version = r.read_u16()?;
        let obj_len = r.read_u32()?;
        let _datime = r.read_u32()?;
        let key_len = r.read_u16()?;
        let cycle = r.read_u16()?;

        let large = large_file || version > LARGE_KEY_VERSION;
        let seek_key = r.read_seek(large)?;
        let _seek_pdir = r.read_seek(large)?;

        let class_name = r.read_string()?;
        let name = r.read_string()?;
        let title = r.read_string()?;

        Ok(Key { n_bytes, obj_len, key_len, cycle, seek_key, class_name, name, title })
    }

    /// Whether the stored object bytes are compressed.
    pub fn is_compressed(&self) -> bool {
        self.obj_len as usize != self.stored_len()
    }

    /// Length of the object bytes as stored (after the key header).
    pub fn stored_len(&self) -> usize {
        (self.n_bytes as usize).saturating_sub(self.key_len as usize)
    }

    /// Whether this key holds a sub-directory.
    pub fn is_directory(&self) -> bool {
        matches!(self.class_name.as_str(), "TDirectoryFile" | "TDirectory")
    }
}
