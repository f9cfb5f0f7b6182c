use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::{Mmap, MmapMut};

use crate::{Result, RleError};

/// A read-only memory-mapped view of an existing file.
///
/// Zero-length files are handled without a mapping (the OS refuses empty
/// maps) and expose an empty slice.
pub struct MappedSource {
    map: Option<Mmap>,
}

impl MappedSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Self { map: None });
        }
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self { map: Some(map) })
    }

    pub fn len(&self) -> u64 {
        self.map.as_ref().map_or(0, |m| m.len() as u64)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_none()
    }

    pub fn bytes(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }
}

/// A writable memory-mapped file of a fixed, caller-chosen length.
///
/// The file is created (or truncated) at `create` time; the mapping is
/// flushed explicitly and unmapped on drop.
pub struct MappedDest {
    map: MmapMut,
}

impl MappedDest {
    pub fn create<P: AsRef<Path>>(path: P, length: u64) -> Result<Self> {
        if length == 0 {
            return Err(RleError::EmptyCreate);
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(length)?;
        let map = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self { map })
    }

    pub fn len(&self) -> u64 {
        self.map.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.map
    }

    /// Persist all written bytes to the backing file.
    pub fn flush(&self) -> Result<()> {
        self.map.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("rle_mapped_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_create_zero_length_is_rejected() {
        let path = temp_path("empty_create");
        assert!(matches!(
            MappedDest::create(&path, 0),
            Err(RleError::EmptyCreate)
        ));
    }

    #[test]
    fn test_open_missing_file_is_io_error() {
        let path = temp_path("does_not_exist");
        assert!(matches!(MappedSource::open(&path), Err(RleError::Io(_))));
    }

    #[test]
    fn test_written_bytes_survive_reopen() {
        let path = temp_path("write_reopen");
        {
            let mut dest = MappedDest::create(&path, 4).unwrap();
            dest.bytes_mut().copy_from_slice(b"abcd");
            dest.flush().unwrap();
        }
        let source = MappedSource::open(&path).unwrap();
        assert_eq!(source.len(), 4);
        assert_eq!(source.bytes(), b"abcd");
        drop(source);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_empty_file_maps_to_empty_slice() {
        let path = temp_path("empty_source");
        fs::write(&path, b"").unwrap();
        let source = MappedSource::open(&path).unwrap();
        assert!(source.is_empty());
        assert_eq!(source.bytes(), b"");
        drop(source);
        fs::remove_file(&path).unwrap();
    }
}
