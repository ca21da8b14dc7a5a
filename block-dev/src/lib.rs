//! 块设备抽象
//!
//! 文件系统只通过 [`BlockDevice`] 访问后备存储，
//! 不关心它是宿主机上的镜像文件还是内存里的一段字节。

mod block_file;
mod mem_disk;

use std::fmt::Debug;
use std::io;

pub use self::{block_file::BlockFile, mem_disk::MemDisk};

/// 按字节偏移寻址的后备存储。
///
/// 实现者不得在两次调用之间缓存写入：`write_at` 返回时数据已落盘。
pub trait BlockDevice: Debug + Send + Sync {
    /// 从`offset`开始读满`buf`，返回实际读到的字节数。
    ///
    /// 越过存储末尾的部分不会被改动，调用者应传入已清零的缓冲区。
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// 把`buf`整个写到`offset`处。
    fn write_at(&self, offset: u64, buf: &[u8]) -> io::Result<()>;

    /// Total size of the store in bytes.
    fn len(&self) -> io::Result<u64>;

    fn is_empty(&self) -> io::Result<bool> {
        self.len().map(|len| len == 0)
    }
}
