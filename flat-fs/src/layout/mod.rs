//! 镜像的布局
//!
//! 根目录(第0块) | 子目录块与数据块 | 分配位图(最后一块)
//!
//! 所有记录都是小端、紧凑排列的定宽结构，通过 `binrw` 编解码，
//! 与它们在内存中的布局无关。名字字段以 NUL 结尾，多余部分填 0。

mod bitmap;
mod directory;
mod root;

use std::io::Cursor;

use binrw::BinResult;
use vfs::{Error, Result};

pub use self::{
    bitmap::Bitmap,
    directory::{DirectoryBlock, FileSlot, MAX_FILES_IN_DIR},
    root::{DirSlot, MAX_DIRS_IN_ROOT, RootDirectory},
};
use crate::{BLOCK_SIZE, BlockId, Store};

/// 整块读出并交给`decode`解码
fn load<T>(
    store: &Store,
    block: BlockId,
    decode: impl FnOnce(&mut Cursor<&[u8]>) -> BinResult<T>,
) -> Result<T> {
    let bytes = store.read_block(block.offset(), BLOCK_SIZE)?;
    decode(&mut Cursor::new(&bytes[..])).map_err(from_binrw)
}

/// 编码后整块写回，未使用的槽位与填充一并写出
fn save(
    store: &Store,
    block: BlockId,
    encode: impl FnOnce(&mut Cursor<&mut [u8]>) -> BinResult<()>,
) -> Result<()> {
    let mut bytes = [0u8; BLOCK_SIZE];
    encode(&mut Cursor::new(&mut bytes[..])).map_err(from_binrw)?;
    store.write_block(&bytes, block.offset())
}

fn from_binrw(e: binrw::Error) -> Error {
    match e {
        binrw::Error::Io(e) => Error::Io(e),
        e => Error::Corrupted(e.to_string()),
    }
}

/// 把名字放进定长字段，至少留一个 NUL。调用者负责检查长度。
fn pack_name<const N: usize>(name: &str) -> [u8; N] {
    let mut field = [0; N];
    for (b, nb) in field[..N - 1].iter_mut().zip(name.as_bytes()) {
        *b = *nb;
    }
    field
}

/// 取第一个 NUL 之前的部分
fn unpack_name(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

/// 空名字不与任何槽位匹配，否则它会命中所有未使用的槽位。
fn name_eq(field: &[u8], name: &str) -> bool {
    !name.is_empty() && unpack_name(field) == name.as_bytes()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use binrw::BinWrite;

    use super::*;

    fn encoded_len(encode: impl FnOnce(&mut Cursor<Vec<u8>>) -> BinResult<()>) -> usize {
        let mut cursor = Cursor::new(Vec::new());
        encode(&mut cursor).unwrap();
        cursor.into_inner().len()
    }

    #[test]
    fn record_sizes() {
        let root = encoded_len(|c| RootDirectory::default().write(c));
        let dir = encoded_len(|c| DirectoryBlock::default().write(c));

        assert_eq!(17, encoded_len(|c| DirSlot::default().write(c)));
        assert_eq!(29, encoded_len(|c| FileSlot::default().write(c)));
        assert_eq!(29, MAX_DIRS_IN_ROOT);
        assert_eq!(17, MAX_FILES_IN_DIR);
        assert_eq!(4 + 29 * 17, root);
        assert_eq!(4 + 17 * 29, dir);
        assert!(root <= BLOCK_SIZE && dir <= BLOCK_SIZE);
    }

    #[test]
    fn names() {
        let field: [u8; 9] = pack_name("docs");
        assert_eq!(&field, b"docs\0\0\0\0\0");
        assert_eq!(unpack_name(&field), b"docs");
        assert!(name_eq(&field, "docs"));
        assert!(!name_eq(&field, "doc"));
        assert!(!name_eq(&[0; 9], ""));

        let full: [u8; 9] = pack_name("abcdefgh");
        assert_eq!(unpack_name(&full), b"abcdefgh");
    }
}
