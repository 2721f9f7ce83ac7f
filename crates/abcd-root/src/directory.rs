//! TDirectory streamer and key-list navigation.

use crate::error::Result;
use crate::key::Key;
use crate::rbuffer::RBuffer;

/// Directory versions above this use 64-bit seek pointers.
const LARGE_DIR_VERSION: u16 = 1000;

/// The fields of a TDirectory streamer needed to find its keys.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryHeader {
    /// Size of the key list record.
    pub nbytes_keys: u32,
    /// Absolute position of the key list (0 for an empty directory).
    pub seek_keys: u64,
}

impl DirectoryHeader {
    /// Read a TDirectory streamer at the buffer's current position.
    pub fn read(r: &mut RBuffer) -> Result<Self> {
        let version = r.read_u16()?;
        let _datime_c = r.read_u32()?;
        let _datime_m = r.read_u32()?;
        let nbytes_keys = r.read_u32()?;
        let _nbytes_name = r.read_u32()?;

        let large = version > LARGE_DIR_VERSION;
        let _seek_dir = r.read_seek(large)?;
        let _seek_parent = r.read_seek(large)?;
        let seek_keys = r.read_seek(large)?;

        Ok(Self { nbytes_keys, seek_keys })
    }
}

/// A directory: an ordered list of TKeys.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    keys: Vec<Key>,
}

impl Directory {
    /// Read the key list a directory header points to.
    ///
    /// The list is itself stored behind a TKey header, followed by a u32
    /// `nkeys` and `nkeys` TKey records.
    pub fn read(file_data: &[u8], header: DirectoryHeader, large_file: bool) -> Result<Self> {
        if header.seek_keys == 0 {
            return Ok(Self::default());
        }
        let mut r = RBuffer::at(file_data, header.seek_keys as usize);
        let _list_key = Key::read(&mut r, large_file)?;

        let nkeys = r.read_u32()? as usize;
        let mut keys = Vec::with_capacity(nkeys.min(r.remaining()));
        for _ in 0..nkeys {
            keys.push(Key::read(&mut r, large_file)?);
        }
        Ok(Self { keys })
    }

    /// Read a sub-directory from the decompressed payload of its TDirectoryFile key.
    pub fn from_payload(payload: &[u8], file_data: &[u8], large_file: bool) -> Result<Self> {
        let header = DirectoryHeader::read(&mut RBuffer::new(payload))?;
        Self::read(file_data, header, large_file)
    }

    /// All keys, in file order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Find a key by name, taking the highest cycle.
    pub fn find_key(&self, name: &str) -> Option<&Key> {
        self.keys.iter().filter(|k| k.name == name).max_by_key(|k| k.cycle)
    }
}
