//! # 操作层
//!
//! 驱动回调的实现。[`FlatFileSystem`] 只持有存储上下文，
//! 每次调用都从存储重新读取根目录、子目录块与位图，调用之间不保留任何状态。

use std::sync::Arc;

use block_dev::BlockDevice;
use vfs::{DirEntry, DirEntryType, Error, Result, Stat};

use crate::layout::{Bitmap, DirectoryBlock, FileSlot, RootDirectory};
use crate::{
    BLOCK_SIZE, BlockId, DataBlock, FsPath, MAX_EXTENSION, MAX_FILENAME, Store, blocks_for,
};

#[derive(Debug, Clone)]
pub struct FlatFileSystem {
    store: Store,
}

/// 读写定位到的文件
struct Located {
    dir_block: BlockId,
    dir: DirectoryBlock,
    index: usize,
}

impl FlatFileSystem {
    pub fn new(dev: Arc<dyn BlockDevice>) -> Result<Self> {
        Ok(Self {
            store: Store::new(dev)?,
        })
    }

    /// 立即执行通常在首次分配时才做的初始化。
    pub fn format(&self) -> Result<bool> {
        Bitmap::ensure_initialized(&self.store)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn contains_subdirectory(&self, name: &str) -> Result<bool> {
        RootDirectory::contains_subdirectory(&self.store, name)
    }

    pub fn contains_file(&self, subdir: &str, base: &str, ext: &str) -> Result<bool> {
        DirectoryBlock::contains_file(&self.store, subdir, base, ext)
    }

    pub fn file_size(&self, subdir: &str, base: &str, ext: &str) -> Result<u64> {
        DirectoryBlock::file_size(&self.store, subdir, base, ext)
    }

    pub fn bitmap(&self) -> Result<Bitmap> {
        Bitmap::load(&self.store)
    }

    pub fn getattr(&self, path: &str) -> Result<Stat> {
        log::debug!("getattr {path:?}");

        if path == "/" {
            return Ok(Stat::directory(BLOCK_SIZE as u64));
        }

        let p = FsPath::parse(path);
        if p.is_subdir() && self.contains_subdirectory(p.subdir)? {
            return Ok(Stat::directory(BLOCK_SIZE as u64));
        }
        if self.contains_file(p.subdir, p.base, p.ext)? {
            let size = match self.file_size(p.subdir, p.base, p.ext) {
                Ok(size) => size,
                // 同名不同扩展名的条目，或已占用前缀之外的条目
                Err(Error::NotFound | Error::PermissionDenied) => {
                    self.matched_size(p.subdir, p.base, p.ext)?
                }
                Err(e) => return Err(e),
            };
            return Ok(Stat::file(size, BLOCK_SIZE as u64));
        }

        Err(Error::NotFound)
    }

    /// 总是以`.`与`..`开头。子目录不存在时也只有这两项。
    pub fn readdir(&self, path: &str) -> Result<Vec<DirEntry>> {
        log::debug!("readdir {path:?}");

        let mut entries = vec![
            DirEntry::new(DirEntryType::Directory, "."),
            DirEntry::new(DirEntryType::Directory, ".."),
        ];
        let root = RootDirectory::load(&self.store)?;

        if path == "/" {
            entries.extend(
                root.occupied()
                    .map(|slot| DirEntry::new(DirEntryType::Directory, slot.name())),
            );
            return Ok(entries);
        }

        let p = FsPath::parse(path);
        if let Some(block) = root.find(p.subdir) {
            let dir = DirectoryBlock::load(&self.store, block)?;
            entries.extend(
                dir.files()
                    .iter()
                    .map(|slot| DirEntry::new(DirEntryType::Regular, slot.file_name())),
            );
        }

        Ok(entries)
    }

    pub fn mkdir(&self, path: &str) -> Result<()> {
        log::debug!("mkdir {path:?}");

        let p = FsPath::parse(path);
        if p.subdir.len() > MAX_FILENAME {
            return Err(Error::NameTooLong);
        }
        if self.contains_subdirectory(p.subdir)? {
            return Err(Error::AlreadyExists);
        }
        if p.subdir.is_empty() || !p.base.is_empty() {
            return Err(Error::PermissionDenied);
        }

        Bitmap::ensure_initialized(&self.store)?;
        let mut root = RootDirectory::load(&self.store)?;
        if root.is_full() {
            log::warn!("root catalog is full, cannot create {:?}", p.subdir);
            return Err(Error::NoSpace);
        }
        let block = Bitmap::allocate_block(&self.store)?.ok_or(Error::NoSpace)?;

        root.push(p.subdir, block)?;
        Bitmap::mark_allocated(&self.store, block.offset())?;
        root.save(&self.store)?;
        DirectoryBlock::default().save(&self.store, block)?;
        log::info!("created directory {:?} at block {}", p.subdir, block.index());

        Ok(())
    }

    /// 接受但不做任何修改
    pub fn rmdir(&self, path: &str) -> Result<()> {
        log::debug!("rmdir {path:?}: removal is not persisted");
        Ok(())
    }

    pub fn mknod(&self, path: &str) -> Result<()> {
        log::debug!("mknod {path:?}");

        let p = FsPath::parse(path);
        if p.base.len() > MAX_FILENAME || p.ext.len() > MAX_EXTENSION {
            return Err(Error::NameTooLong);
        }
        if self.contains_file(p.subdir, p.base, p.ext)? {
            return Err(Error::AlreadyExists);
        }
        if p.subdir.is_empty() || p.base.is_empty() {
            return Err(Error::PermissionDenied);
        }

        let dir_block = RootDirectory::load(&self.store)?
            .find(p.subdir)
            .ok_or(Error::PermissionDenied)?;
        let mut dir = DirectoryBlock::load(&self.store, dir_block)?;
        if dir.is_full() {
            log::warn!("directory {:?} is full", p.subdir);
            return Err(Error::NoSpace);
        }
        let block = Bitmap::allocate_block(&self.store)?.ok_or(Error::NoSpace)?;

        dir.push(FileSlot::new(p.base, p.ext, 0, block))?;
        Bitmap::mark_allocated(&self.store, block.offset())?;
        let empty: DataBlock = [0; BLOCK_SIZE];
        self.store.write_block(&empty, block.offset())?;
        dir.save(&self.store, dir_block)?;
        log::info!("created file {path:?} at block {}", block.index());

        Ok(())
    }

    /// 接受但不做任何修改
    pub fn unlink(&self, path: &str) -> Result<()> {
        log::debug!("unlink {path:?}: removal is not persisted");
        Ok(())
    }

    /// 从`offset`起读满`buf`，但不越过文件末尾。
    pub fn read(&self, path: &str, buf: &mut [u8], offset: u64) -> Result<usize> {
        log::debug!("read {path:?} len={} offset={offset}", buf.len());

        if buf.is_empty() {
            return Err(Error::NotFound);
        }
        let Located { dir, index, .. } = self.locate(path)?;
        let file = dir.file(index);
        if offset > file.size() {
            return Err(Error::NotFound);
        }

        let len = (buf.len() as u64).min(file.size() - offset) as usize;
        self.store
            .read_into(file.start().offset() + offset, &mut buf[..len])?;

        Ok(len)
    }

    /// 在`offset`处写入`buf`，需要时扩展文件。
    ///
    /// 文件的块总是连续的：后面的块空闲时原地扩展，
    /// 否则整体搬到第一段足够长的空闲区域。旧块不回收。
    pub fn write(&self, path: &str, buf: &[u8], offset: u64) -> Result<usize> {
        log::debug!("write {path:?} len={} offset={offset}", buf.len());

        if buf.is_empty() {
            return Err(Error::NotFound);
        }
        let Located {
            dir_block,
            mut dir,
            index,
        } = self.locate(path)?;
        let file = dir.file(index);
        let size = file.size();
        let mut start = file.start();
        if offset > size {
            return Err(Error::NotFound);
        }

        let end = offset + buf.len() as u64;
        let have = blocks_for(size);
        let need = blocks_for(end);
        if need > have {
            if Bitmap::is_free_run(&self.store, start + have, need - have)? {
                log::info!("growing {path:?} in place: {have} -> {need} blocks");
            } else {
                let target = Bitmap::allocate_run(&self.store, need)?.ok_or(Error::NoSpace)?;
                let content = self.store.read_block(start.offset(), size as usize)?;
                self.store.write_block(&content, target.offset())?;
                log::info!(
                    "moved {path:?} from block {} to {} ({need} blocks)",
                    start.index(),
                    target.index()
                );
                start = target;
            }
        }

        self.store.write_block(buf, start.offset() + offset)?;
        Bitmap::mark_run(&self.store, start, need.max(have))?;

        let file = dir.file_mut(index);
        file.relocate(start);
        file.resize(size.max(end));
        dir.save(&self.store, dir_block)?;

        Ok(buf.len())
    }

    /// 接受但不做任何修改
    pub fn truncate(&self, path: &str, size: u64) -> Result<()> {
        log::debug!("truncate {path:?} to {size}: not persisted");
        Ok(())
    }

    pub fn open(&self, path: &str) -> Result<()> {
        log::debug!("open {path:?}");
        Ok(())
    }

    pub fn release(&self, path: &str) -> Result<()> {
        log::debug!("release {path:?}");
        Ok(())
    }

    pub fn flush(&self, path: &str) -> Result<()> {
        log::debug!("flush {path:?}");
        Ok(())
    }
}

impl FlatFileSystem {
    fn matched_size(&self, subdir: &str, base: &str, ext: &str) -> Result<u64> {
        let Some(block) = RootDirectory::load(&self.store)?.find(subdir) else {
            return Ok(0);
        };
        Ok(DirectoryBlock::load(&self.store, block)?.matched_size(base, ext))
    }

    /// 读写共用的检查：路径结构、名字长度、子目录与文件是否存在。
    fn locate(&self, path: &str) -> Result<Located> {
        let p = FsPath::parse(path);
        if p.subdir.is_empty() || p.base.is_empty() {
            return Err(Error::PermissionDenied);
        }
        if p.base.len() > MAX_FILENAME || p.ext.len() > MAX_EXTENSION {
            return Err(Error::NameTooLong);
        }

        let dir_block = RootDirectory::load(&self.store)?
            .find(p.subdir)
            .ok_or(Error::PermissionDenied)?;
        let dir = DirectoryBlock::load(&self.store, dir_block)?;
        if !dir.contains(p.base, p.ext) {
            return Err(Error::NotFound);
        }
        let index = dir.lookup(p.base, p.ext)?.ok_or(Error::NotFound)?;

        Ok(Located {
            dir_block,
            dir,
            index,
        })
    }
}
