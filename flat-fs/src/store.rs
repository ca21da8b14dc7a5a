//! # 存储访问层
//!
//! 所有组件共享的存储上下文。它不缓存任何内容，
//! 每次读写都直接落到 [`BlockDevice`] 上。

use std::sync::Arc;

use block_dev::BlockDevice;
use vfs::{Error, Result};

use crate::{BLOCK_SIZE, DataBlock};

#[derive(Debug, Clone)]
pub struct Store {
    dev: Arc<dyn BlockDevice>,
}

impl Store {
    /// 存储至少要放得下根目录块与位图块。
    pub fn new(dev: Arc<dyn BlockDevice>) -> Result<Self> {
        let len = dev.len()?;
        if len < 2 * BLOCK_SIZE as u64 {
            return Err(Error::Corrupted(format!(
                "store of {len} bytes cannot hold a root and a bitmap block"
            )));
        }

        Ok(Self { dev })
    }

    /// 从`offset`读出`len`字节，读不到的部分为0。
    pub fn read_block(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0; len];
        self.read_into(offset, &mut buf)?;
        Ok(buf)
    }

    /// 读满`buf`，返回实际读到的字节数；读不到的部分清零。
    pub fn read_into(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        buf.fill(0);
        let read = self.dev.read_at(offset, buf)?;
        if read < buf.len() {
            log::trace!("short read at {offset:#x}: {read}/{}", buf.len());
        }
        Ok(read)
    }

    pub fn write_block(&self, bytes: &[u8], offset: u64) -> Result<()> {
        self.dev.write_at(offset, bytes)?;
        Ok(())
    }

    pub fn read_bitmap_block(&self) -> Result<DataBlock> {
        let mut block = [0; BLOCK_SIZE];
        self.read_into(self.bitmap_offset()?, &mut block)?;
        Ok(block)
    }

    pub fn write_bitmap_block(&self, block: &DataBlock) -> Result<()> {
        self.write_block(block, self.bitmap_offset()?)
    }

    /// 镜像的总块数，包括末尾的位图块。
    pub fn block_count(&self) -> Result<u64> {
        Ok(self.dev.len()? / BLOCK_SIZE as u64)
    }

    /// 位图总是镜像的最后一块
    fn bitmap_offset(&self) -> Result<u64> {
        let len = self.dev.len()?;
        len.checked_sub(BLOCK_SIZE as u64)
            .ok_or_else(|| Error::Corrupted(format!("store shrank to {len} bytes")))
    }
}
