//! 分配位图，位于镜像的最后一块
//!
//! 每一位对应一块，字节内高位在前：第`i`块对应第`i / 8`字节的
//! `0x80 >> (i % 8)`。第0位对应根目录，在存储初始化时置位。
//! 只分配不回收。

use std::fmt::Write;

use vfs::Result;

use super::RootDirectory;
use crate::{BLOCK_BITS, BLOCK_SIZE, BlockId, DataBlock, Store};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    bits: DataBlock,
}

impl Bitmap {
    pub fn load(store: &Store) -> Result<Self> {
        Ok(Self {
            bits: store.read_bitmap_block()?,
        })
    }

    pub fn save(&self, store: &Store) -> Result<()> {
        store.write_bitmap_block(&self.bits)
    }

    /// 根目录块未置位时初始化存储：写入空的根目录并标记第0块。
    ///
    /// 返回是否真的做了初始化。
    pub fn ensure_initialized(store: &Store) -> Result<bool> {
        let mut bitmap = Self::load(store)?;
        if bitmap.is_allocated(BlockId::ROOT.index()) {
            return Ok(false);
        }

        log::info!("initializing empty store");
        RootDirectory::default().save(store)?;
        bitmap.set(BlockId::ROOT.index());
        bitmap.save(store)?;
        Ok(true)
    }

    /// 按块号从小到大找第一个空闲块，不做标记。
    ///
    /// 用尽时返回空。
    pub fn allocate_block(store: &Store) -> Result<Option<BlockId>> {
        Self::allocate_run(store, 1)
    }

    /// 按块号从小到大找第一段连续`n`个空闲块，不做标记。
    pub fn allocate_run(store: &Store, n: u64) -> Result<Option<BlockId>> {
        Self::ensure_initialized(store)?;
        let limit = Self::limit(store)?;
        let found = Self::load(store)?.first_free_run(n as usize, limit);
        match found {
            Some(index) => log::trace!("first fit for {n} block(s): {index}"),
            None => log::warn!("no run of {n} free block(s) below {limit}"),
        }
        Ok(found.map(|index| BlockId::new(index as u64)))
    }

    /// 从`start`开始的`n`块是否都空闲且不越界
    pub fn is_free_run(store: &Store, start: BlockId, n: u64) -> Result<bool> {
        let limit = Self::limit(store)?;
        let bitmap = Self::load(store)?;
        Ok(bitmap.run_is_free(start.index(), n as usize, limit))
    }

    /// 置位`offset`所在的块
    pub fn mark_allocated(store: &Store, offset: u64) -> Result<()> {
        Self::mark_run(store, BlockId::from_offset(offset), 1)
    }

    /// 置位`start`开始的`n`块，只读写一次位图。
    pub fn mark_run(store: &Store, start: BlockId, n: u64) -> Result<()> {
        let mut bitmap = Self::load(store)?;
        for index in start.index()..start.index() + n as usize {
            bitmap.set(index);
        }
        bitmap.save(store)
    }

    #[inline]
    pub fn is_allocated(&self, index: usize) -> bool {
        index < BLOCK_BITS && self.bits[index / 8] & (0x80 >> (index % 8)) != 0
    }

    /// 越界的块号被忽略
    #[inline]
    pub fn set(&mut self, index: usize) {
        if index < BLOCK_BITS {
            self.bits[index / 8] |= 0x80 >> (index % 8);
        }
    }

    /// 已分配的块数
    pub fn allocated(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// 每行64位，以`0`/`1`显示
    pub fn dump(&self, limit: usize) -> String {
        let mut out = String::new();
        for row in (0..limit.min(BLOCK_BITS)).step_by(64) {
            let _ = write!(out, "{row:>5} ");
            for index in row..(row + 64).min(limit) {
                out.push(if self.is_allocated(index) { '1' } else { '0' });
            }
            out.push('\n');
        }
        out
    }

    /// 可分配的块号上界（不含）：位图能表示的范围，且不能是位图块自身。
    pub fn limit(store: &Store) -> Result<usize> {
        let blocks = store.block_count()?.saturating_sub(1) as usize;
        Ok(blocks.min(BLOCK_BITS))
    }

    fn run_is_free(&self, start: usize, n: usize, limit: usize) -> bool {
        start + n <= limit && (start..start + n).all(|index| !self.is_allocated(index))
    }

    fn first_free_run(&self, n: usize, limit: usize) -> Option<usize> {
        if n == 0 {
            return None;
        }

        let mut run = 0;
        for index in 0..limit {
            if self.is_allocated(index) {
                run = 0;
                continue;
            }
            run += 1;
            if run == n {
                return Some(index + 1 - n);
            }
        }
        None
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Self {
            bits: [0; BLOCK_SIZE],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use block_dev::{BlockDevice, MemDisk};

    use super::*;

    fn store(blocks: usize) -> (Arc<MemDisk>, Store) {
        let disk = Arc::new(MemDisk::new(blocks * BLOCK_SIZE));
        let store = Store::new(disk.clone()).unwrap();
        (disk, store)
    }

    #[test]
    fn msb_first() {
        let mut bitmap = Bitmap::default();
        bitmap.set(0);
        bitmap.set(9);
        assert_eq!(bitmap.bits[0], 0b1000_0000);
        assert_eq!(bitmap.bits[1], 0b0100_0000);
        assert!(bitmap.is_allocated(9));
        assert!(!bitmap.is_allocated(8));
        assert_eq!(bitmap.allocated(), 2);
    }

    #[test]
    fn lazy_initialization() {
        let (disk, store) = store(8);
        disk.write_at(0, &[0xAA; 16]).unwrap();

        let first = Bitmap::allocate_block(&store).unwrap();
        assert_eq!(first, Some(BlockId::new(1)));
        // the root block was rewritten as an empty catalog
        assert!(disk.to_bytes()[..BLOCK_SIZE].iter().all(|&b| b == 0));
        assert_eq!(disk.to_bytes()[7 * BLOCK_SIZE], 0x80);
        assert!(!Bitmap::ensure_initialized(&store).unwrap());
    }

    #[test]
    fn first_fit_is_deterministic() {
        let (_, store) = store(8);
        assert_eq!(Bitmap::allocate_block(&store).unwrap(), Some(BlockId::new(1)));
        // allocation alone does not mark
        assert_eq!(Bitmap::allocate_block(&store).unwrap(), Some(BlockId::new(1)));

        Bitmap::mark_allocated(&store, BlockId::new(1).offset()).unwrap();
        Bitmap::mark_allocated(&store, BlockId::new(3).offset() + 17).unwrap();
        assert_eq!(Bitmap::allocate_block(&store).unwrap(), Some(BlockId::new(2)));
        assert_eq!(Bitmap::allocate_run(&store, 2).unwrap(), Some(BlockId::new(4)));
    }

    #[test]
    fn bitmap_block_is_never_handed_out() {
        let (_, store) = store(4);
        Bitmap::mark_run(&store, BlockId::new(1), 2).unwrap();
        Bitmap::ensure_initialized(&store).unwrap();
        // block 3 is the bitmap itself
        assert_eq!(Bitmap::allocate_block(&store).unwrap(), None);
        assert!(!Bitmap::is_free_run(&store, BlockId::new(3), 1).unwrap());
    }

    #[test]
    fn runs() {
        let (_, store) = store(10);
        Bitmap::ensure_initialized(&store).unwrap();
        Bitmap::mark_allocated(&store, BlockId::new(3).offset()).unwrap();

        assert!(Bitmap::is_free_run(&store, BlockId::new(1), 2).unwrap());
        assert!(!Bitmap::is_free_run(&store, BlockId::new(2), 2).unwrap());
        assert_eq!(Bitmap::allocate_run(&store, 3).unwrap(), Some(BlockId::new(4)));
        assert_eq!(Bitmap::allocate_run(&store, 6).unwrap(), None);
    }

    #[test]
    fn dump_rows() {
        let mut bitmap = Bitmap::default();
        bitmap.set(0);
        bitmap.set(2);
        assert_eq!(bitmap.dump(4), "    0 1010\n");
        assert_eq!(bitmap.dump(70).lines().count(), 2);
    }
}
