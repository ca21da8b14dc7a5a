//! 根目录块：目录数 + 定长的子目录表

use std::borrow::Cow;

use binrw::{BinRead, BinWrite, binrw};
use vfs::{Error, Result};

use super::{load, name_eq, pack_name, save, unpack_name};
use crate::{BLOCK_SIZE, BlockId, MAX_FILENAME, Store};

/// 根目录最多能容纳的子目录数
pub const MAX_DIRS_IN_ROOT: usize = (BLOCK_SIZE - 4) / (MAX_FILENAME + 1 + 8);

#[binrw]
#[brw(little)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DirSlot {
    /// 以 NUL 结尾的目录名
    name: [u8; MAX_FILENAME + 1],
    /// 子目录块的字节偏移
    start: u64,
}

impl DirSlot {
    pub fn new(name: &str, start: BlockId) -> Self {
        Self {
            name: pack_name(name),
            start: start.offset(),
        }
    }

    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(unpack_name(&self.name))
    }

    pub fn start(&self) -> BlockId {
        BlockId::from_offset(self.start)
    }

    pub fn is_free(&self) -> bool {
        self.name[0] == 0
    }
}

#[binrw]
#[brw(little)]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RootDirectory {
    /// 已占用的前缀长度
    count: i32,
    slots: [DirSlot; MAX_DIRS_IN_ROOT],
}

impl RootDirectory {
    /// 读取第0块；镜像过短时得到空目录。
    pub fn load(store: &Store) -> Result<Self> {
        load(store, BlockId::ROOT, |cursor| Self::read(cursor))
    }

    /// 不论占用多少，都整块写回。
    pub fn save(&self, store: &Store) -> Result<()> {
        save(store, BlockId::ROOT, |cursor| self.write(cursor))
    }

    /// 遍历整张表（而不只是已占用的前缀）查找同名子目录。
    pub fn contains_subdirectory(store: &Store, name: &str) -> Result<bool> {
        Ok(Self::load(store)?.find(name).is_some())
    }

    pub fn count(&self) -> usize {
        (self.count.max(0) as usize).min(MAX_DIRS_IN_ROOT)
    }

    pub fn is_full(&self) -> bool {
        self.count() >= MAX_DIRS_IN_ROOT
    }

    /// 全表扫描，返回子目录块
    pub fn find(&self, name: &str) -> Option<BlockId> {
        self.slots
            .iter()
            .find(|slot| name_eq(&slot.name, name))
            .map(DirSlot::start)
    }

    /// 全表扫描，跳过空槽位
    pub fn occupied(&self) -> impl Iterator<Item = &DirSlot> {
        self.slots.iter().filter(|slot| !slot.is_free())
    }

    /// 追加到已占用前缀之后
    pub fn push(&mut self, name: &str, start: BlockId) -> Result<()> {
        if self.is_full() {
            return Err(Error::NoSpace);
        }

        let count = self.count();
        self.slots[count] = DirSlot::new(name, start);
        self.count = count as i32 + 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use block_dev::MemDisk;

    use super::*;

    fn store() -> (Arc<MemDisk>, Store) {
        let disk = Arc::new(MemDisk::new(8 * BLOCK_SIZE));
        let store = Store::new(disk.clone()).unwrap();
        (disk, store)
    }

    #[test]
    fn zeroed_block_is_empty() {
        let (_, store) = store();
        let root = RootDirectory::load(&store).unwrap();
        assert_eq!(root, RootDirectory::default());
        assert_eq!(root.count(), 0);
        assert_eq!(root.occupied().count(), 0);
    }

    #[test]
    fn packed_layout() {
        let (disk, store) = store();
        let mut root = RootDirectory::default();
        root.push("docs", BlockId::new(1)).unwrap();
        root.push("src", BlockId::new(2)).unwrap();
        root.save(&store).unwrap();

        let bytes = disk.to_bytes();
        assert_eq!(&bytes[0..4], &2i32.to_le_bytes());
        assert_eq!(&bytes[4..13], b"docs\0\0\0\0\0");
        assert_eq!(&bytes[13..21], &512u64.to_le_bytes());
        assert_eq!(&bytes[21..30], b"src\0\0\0\0\0\0");
        assert_eq!(&bytes[30..38], &1024u64.to_le_bytes());
        assert!(bytes[38..BLOCK_SIZE].iter().all(|&b| b == 0));

        assert_eq!(RootDirectory::load(&store).unwrap(), root);
    }

    #[test]
    fn lookup() {
        let (_, store) = store();
        let mut root = RootDirectory::default();
        root.push("docs", BlockId::new(3)).unwrap();
        root.save(&store).unwrap();

        assert!(RootDirectory::contains_subdirectory(&store, "docs").unwrap());
        assert!(!RootDirectory::contains_subdirectory(&store, "doc").unwrap());
        assert!(!RootDirectory::contains_subdirectory(&store, "").unwrap());
        assert_eq!(root.find("docs"), Some(BlockId::new(3)));
        assert_eq!(
            root.occupied().map(|slot| slot.name()).collect::<Vec<_>>(),
            ["docs"]
        );
    }

    #[test]
    fn full_catalog() {
        let mut root = RootDirectory::default();
        for i in 0..MAX_DIRS_IN_ROOT {
            root.push(&format!("d{i}"), BlockId::new(i as u64 + 1)).unwrap();
        }
        assert!(root.is_full());
        assert!(matches!(
            root.push("extra", BlockId::new(99)),
            Err(Error::NoSpace)
        ));
        assert_eq!(root.count(), MAX_DIRS_IN_ROOT);
    }
}
