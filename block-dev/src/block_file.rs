use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::BlockDevice;

/// A disk image on the host filesystem.
///
/// Only the path is kept. Every access opens the file, seeks, does the I/O
/// and drops the handle again, so there is never a stale descriptor and each
/// write is on disk by the time the call returns.
#[derive(Debug, Clone)]
pub struct BlockFile {
    path: PathBuf,
}

impl BlockFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates (or truncates) the image and pre-sizes it with zeroes.
    pub fn create(path: impl Into<PathBuf>, size: u64) -> io::Result<Self> {
        let path = path.into();
        let fd = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        fd.set_len(size)?;
        log::info!("created image {path:?} of {size} bytes");

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self, write: bool) -> io::Result<File> {
        OpenOptions::new().read(true).write(write).open(&self.path)
    }
}

impl BlockDevice for BlockFile {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let mut file = self.open(false)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut read = 0;
        while read < buf.len() {
            match file.read(&mut buf[read..]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        log::trace!("read {read}/{} bytes at {offset:#x}", buf.len());

        Ok(read)
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> io::Result<()> {
        let mut file = self.open(true)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        file.flush()?;
        log::trace!("wrote {} bytes at {offset:#x}", buf.len());

        Ok(())
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.path.metadata()?.len())
    }
}
