use enumflags2::{BitFlags, bitflags};

use crate::DirEntryType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    pub ty: DirEntryType,
    /// 权限位只用于展示，不做任何检查
    pub perm: BitFlags<Perm>,
    pub links: u32,
    /// File size
    pub size: u64,
    /// Optimal I/O block size
    pub block_size: u64,
    /// Occupying blocks
    pub blocks: u64,
}

impl Stat {
    /// `drwxr-xr-x`，两个链接
    pub fn directory(block_size: u64) -> Self {
        Self {
            ty: DirEntryType::Directory,
            perm: BitFlags::from_bits_truncate(0o755),
            links: 2,
            size: 0,
            block_size,
            blocks: 0,
        }
    }

    /// `-rw-rw-rw-`，一个链接
    pub fn file(size: u64, block_size: u64) -> Self {
        Self {
            ty: DirEntryType::Regular,
            perm: BitFlags::from_bits_truncate(0o666),
            links: 1,
            size,
            block_size,
            blocks: size.div_ceil(block_size).max(1),
        }
    }

    /// `st_mode` as the host expects it: type bits plus permission bits.
    pub fn mode(&self) -> u32 {
        let ty = match self.ty {
            DirEntryType::Directory => 0o040000,
            DirEntryType::Regular => 0o100000,
        };
        ty | u32::from(self.perm.bits())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[bitflags]
#[repr(u16)]
pub enum Perm {
    OtherExec = 0o001,
    OtherWrite = 0o002,
    OtherRead = 0o004,
    GroupExec = 0o010,
    GroupWrite = 0o020,
    GroupRead = 0o040,
    OwnerExec = 0o100,
    OwnerWrite = 0o200,
    OwnerRead = 0o400,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes() {
        assert_eq!(Stat::directory(512).mode(), 0o040755);
        assert_eq!(Stat::file(0, 512).mode(), 0o100666);
        assert!(Stat::file(0, 512).perm.contains(Perm::OtherWrite));
        assert!(!Stat::file(0, 512).perm.contains(Perm::OwnerExec));
    }

    #[test]
    fn file_blocks() {
        assert_eq!(Stat::file(0, 512).blocks, 1);
        assert_eq!(Stat::file(512, 512).blocks, 1);
        assert_eq!(Stat::file(513, 512).blocks, 2);
    }
}
