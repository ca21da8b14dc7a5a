//! 子目录块：文件数 + 定长的文件表

use std::borrow::Cow;

use binrw::{BinRead, BinWrite, binrw};
use vfs::{Error, Result};

use super::{RootDirectory, load, name_eq, pack_name, save, unpack_name};
use crate::{BLOCK_SIZE, BlockId, MAX_EXTENSION, MAX_FILENAME, Store};

/// 一个子目录最多能容纳的文件数
pub const MAX_FILES_IN_DIR: usize =
    (BLOCK_SIZE - 4) / ((MAX_FILENAME + 1) + (MAX_EXTENSION + 1) + 8 + 8);

#[binrw]
#[brw(little)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileSlot {
    base: [u8; MAX_FILENAME + 1],
    ext: [u8; MAX_EXTENSION + 1],
    /// 文件字节数
    size: u64,
    /// 首个数据块的字节偏移
    start: u64,
}

impl FileSlot {
    pub fn new(base: &str, ext: &str, size: u64, start: BlockId) -> Self {
        Self {
            base: pack_name(base),
            ext: pack_name(ext),
            size,
            start: start.offset(),
        }
    }

    pub fn base(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(unpack_name(&self.base))
    }

    pub fn ext(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(unpack_name(&self.ext))
    }

    /// `base` 或 `base.ext`
    pub fn file_name(&self) -> String {
        let ext = self.ext();
        if ext.is_empty() {
            self.base().into_owned()
        } else {
            format!("{}.{ext}", self.base())
        }
    }

    pub const fn size(&self) -> u64 {
        self.size
    }

    pub fn resize(&mut self, size: u64) {
        self.size = size;
    }

    pub fn start(&self) -> BlockId {
        BlockId::from_offset(self.start)
    }

    pub fn relocate(&mut self, start: BlockId) {
        self.start = start.offset();
    }

    /// 空扩展名只比较基本名
    fn matches(&self, base: &str, ext: &str) -> bool {
        name_eq(&self.base, base) && (ext.is_empty() || name_eq(&self.ext, ext))
    }
}

#[binrw]
#[brw(little)]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DirectoryBlock {
    /// 已占用的前缀长度
    count: i32,
    slots: [FileSlot; MAX_FILES_IN_DIR],
}

impl DirectoryBlock {
    pub fn load(store: &Store, block: BlockId) -> Result<Self> {
        load(store, block, |cursor| Self::read(cursor))
    }

    pub fn save(&self, store: &Store, block: BlockId) -> Result<()> {
        save(store, block, |cursor| self.write(cursor))
    }

    /// 先在根目录中找到子目录，再全表扫描其文件表。
    ///
    /// 扩展名为空时，只要基本名相同即视为存在。
    pub fn contains_file(store: &Store, subdir: &str, base: &str, ext: &str) -> Result<bool> {
        let Some(block) = RootDirectory::load(store)?.find(subdir) else {
            return Ok(false);
        };
        Ok(Self::load(store, block)?.contains(base, ext))
    }

    /// 文件的大小。
    ///
    /// 只查看已占用的前缀；第一个基本名匹配的条目若扩展名不符，
    /// 返回 [`Error::PermissionDenied`]。
    pub fn file_size(store: &Store, subdir: &str, base: &str, ext: &str) -> Result<u64> {
        let block = RootDirectory::load(store)?
            .find(subdir)
            .ok_or(Error::NotFound)?;
        let dir = Self::load(store, block)?;
        let index = dir.lookup(base, ext)?.ok_or(Error::NotFound)?;
        Ok(dir.slots[index].size)
    }

    /// 已占用前缀中基本名与扩展名都相同的条目的大小，没有则为 0。
    pub fn matched_size(&self, base: &str, ext: &str) -> u64 {
        self.files()
            .iter()
            .find(|slot| slot.matches(base, ext))
            .map_or(0, FileSlot::size)
    }

    pub fn count(&self) -> usize {
        (self.count.max(0) as usize).min(MAX_FILES_IN_DIR)
    }

    pub fn is_full(&self) -> bool {
        self.count() >= MAX_FILES_IN_DIR
    }

    /// 全表扫描
    pub fn contains(&self, base: &str, ext: &str) -> bool {
        self.slots.iter().any(|slot| slot.matches(base, ext))
    }

    /// 在已占用的前缀中找第一个基本名相同的条目，返回其下标。
    pub fn lookup(&self, base: &str, ext: &str) -> Result<Option<usize>> {
        let Some(index) = self
            .files()
            .iter()
            .position(|slot| name_eq(&slot.base, base))
        else {
            return Ok(None);
        };

        if !ext.is_empty() && !name_eq(&self.slots[index].ext, ext) {
            return Err(Error::PermissionDenied);
        }
        Ok(Some(index))
    }

    /// 已占用的前缀
    pub fn files(&self) -> &[FileSlot] {
        &self.slots[..self.count()]
    }

    pub fn file(&self, index: usize) -> &FileSlot {
        &self.files()[index]
    }

    pub fn file_mut(&mut self, index: usize) -> &mut FileSlot {
        let count = self.count();
        &mut self.slots[..count][index]
    }

    pub fn push(&mut self, slot: FileSlot) -> Result<()> {
        if self.is_full() {
            return Err(Error::NoSpace);
        }

        let count = self.count();
        self.slots[count] = slot;
        self.count = count as i32 + 1;
        Ok(())
    }
}
