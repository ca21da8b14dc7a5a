//! # flat-fs
//!
//! 只有两级的平面文件系统：根目录 → 子目录 → 文件（8.3 命名）。
//! 后备存储是一个按 512 字节分块的镜像：第 0 块为根目录，最后一块为分配位图，
//! 其余的块要么是子目录块，要么是数据块。

/* 整体架构，自上而下 */

// 操作层：驱动回调的实现，每次调用都从存储重新读取状态
mod fs;

// 路径解析：`/subdir` 或 `/subdir/base.ext`
mod path;

// 磁盘数据结构层：根目录、子目录块、分配位图
pub mod layout;

// 存储访问层：按字节偏移读写镜像
mod store;

use derive_more::{Add, From, Into};

pub use self::{fs::FlatFileSystem, path::FsPath, store::Store};

pub const BLOCK_SIZE: usize = 512;
pub const BLOCK_BITS: usize = BLOCK_SIZE * 8;

/// 子目录名与文件基本名的最大长度
pub const MAX_FILENAME: usize = 8;
/// 扩展名的最大长度
pub const MAX_EXTENSION: usize = 3;

pub type DataBlock = [u8; BLOCK_SIZE];

/// 块编号，乘以 [`BLOCK_SIZE`] 即为块在镜像中的字节偏移。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Add, From, Into)]
#[repr(transparent)]
pub struct BlockId(u64);

impl core::ops::Add<u64> for BlockId {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        self + Self(rhs)
    }
}

impl BlockId {
    /// 根目录所在的块
    pub const ROOT: Self = Self(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// 向下取整到所在块
    pub const fn from_offset(offset: u64) -> Self {
        Self(offset / BLOCK_SIZE as u64)
    }

    pub const fn offset(self) -> u64 {
        self.0 * BLOCK_SIZE as u64
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// 容纳`size`字节所需的块数，空文件也占一块。
pub const fn blocks_for(size: u64) -> u64 {
    let blocks = size.div_ceil(BLOCK_SIZE as u64);
    if blocks == 0 { 1 } else { blocks }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_offsets() {
        assert_eq!(BlockId::new(3).offset(), 1536);
        assert_eq!(BlockId::from_offset(1536), BlockId::new(3));
        assert_eq!(BlockId::from_offset(1537), BlockId::new(3));
        assert_eq!(BlockId::new(3) + 2, BlockId::new(5));
    }

    #[test]
    fn block_counts() {
        assert_eq!(blocks_for(0), 1);
        assert_eq!(blocks_for(1), 1);
        assert_eq!(blocks_for(512), 1);
        assert_eq!(blocks_for(513), 2);
        assert_eq!(blocks_for(1024), 2);
    }
}
