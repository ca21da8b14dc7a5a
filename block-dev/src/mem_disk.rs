use std::cell::RefCell;
use std::io;

use send_wrapper::SendWrapper;

use crate::BlockDevice;

/// 内存中的磁盘镜像，测试与试运行用。
///
/// 与 [`BlockFile`](crate::BlockFile) 一样，越过末尾的写入会让镜像变长。
/// 只能在创建它的线程上使用，跨线程访问会 panic。
#[derive(Debug)]
pub struct MemDisk {
    inner: SendWrapper<RefCell<Vec<u8>>>,
}

impl MemDisk {
    /// 全零的镜像
    pub fn new(size: usize) -> Self {
        Self::from_bytes(vec![0; size])
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            inner: SendWrapper::new(RefCell::new(bytes)),
        }
    }

    /// 当前镜像内容的拷贝
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.borrow().clone()
    }
}

impl BlockDevice for MemDisk {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.inner.borrow();
        let start = (offset as usize).min(data.len());
        let end = (start + buf.len()).min(data.len());
        let read = end - start;
        buf[..read].copy_from_slice(&data[start..end]);

        Ok(read)
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> io::Result<()> {
        let mut data = self.inner.borrow_mut();
        let start = offset as usize;
        let end = start + buf.len();
        if end > data.len() {
            data.resize(end, 0);
        }
        data[start..end].copy_from_slice(buf);

        Ok(())
    }

    fn len(&self) -> io::Result<u64> {
        Ok(self.inner.borrow().len() as u64)
    }
}
