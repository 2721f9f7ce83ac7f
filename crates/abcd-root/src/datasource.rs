//! Memory-mapped or owned bytes backing a [`RootFile`](crate::RootFile).

use std::ops::Deref;

/// Backing storage for a ROOT file.
///
/// Analysis files are opened through `Mmap`; `Owned` backs `from_bytes()` in tests.
pub enum DataSource {
    /// File bytes owned in a `Vec<u8>`.
    Owned(Vec<u8>),
    /// Memory-mapped file.
    Mmap(memmap2::Mmap),
}

impl Deref for DataSource {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        match self {
            DataSource::Owned(v) => v,
            DataSource::Mmap(m) => m,
        }
    }
}
