
use std::fs;
use std::path::Path;

use flat_fs::{FlatFileSystem, MAX_EXTENSION, MAX_FILENAME};
use vfs::{DirEntryType, Error, Perm, Stat};

/// 把宿主机文件名拆成 8.3 的`(base, ext)`，放不下时返回空。
pub fn split_83(name: &str) -> Option<(&str, &str)> {
    let (base, ext) = name.rsplit_once('.').unwrap_or((name, ""));
    let fits = !base.is_empty()
        && base.len() <= MAX_FILENAME
        && ext.len() <= MAX_EXTENSION
        && !base.contains(['/', '.'])
        && !ext.contains(char::is_whitespace);
    fits.then_some((base, ext))
}

/// 把`source`下的普通文件复制到子目录`into`中，返回复制的文件名。
///
/// 子目录不存在时先创建；名字不符合 8.3 的文件被跳过。
pub fn pack(fs: &FlatFileSystem, source: &Path, into: &str) -> vfs::Result<Vec<String>> {
    match fs.mkdir(&format!("/{into}")) {
        Ok(()) | Err(Error::AlreadyExists) => {}
        Err(e) => return Err(e),
    }

    let mut entries = fs::read_dir(source)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut packed = Vec::new();
    for entry in entries {
        if !entry.file_type()?.is_file() {
            continue;
        }
        let host_name = entry.file_name();
        let Some((base, ext)) = host_name.to_str().and_then(split_83) else {
            log::warn!("skipping {host_name:?}: not an 8.3 name");
            continue;
        };

        let name = if ext.is_empty() {
            base.to_owned()
        } else {
            format!("{base}.{ext}")
        };
        let path = format!("/{into}/{name}");
        let data = fs::read(entry.path())?;
        log::info!("packing {host_name:?} as {path:?} ({} bytes)", data.len());

        fs.mknod(&path)?;
        if !data.is_empty() {
            fs.write(&path, &data, 0)?;
        }
        packed.push(name);
    }

    Ok(packed)
}

/// 读出整个文件
pub fn read_all(fs: &FlatFileSystem, path: &str) -> vfs::Result<Vec<u8>> {
    let size = fs.getattr(path)?.size as usize;
    let mut data = vec![0; size];
    if size > 0 {
        let read = fs.read(path, &mut data, 0)?;
        data.truncate(read);
    }
    Ok(data)
}

/// `ls -l` 风格的类型与权限
pub fn mode_string(stat: &Stat) -> String {
    const BITS: [(Perm, char); 9] = [
        (Perm::OwnerRead, 'r'),
        (Perm::OwnerWrite, 'w'),
        (Perm::OwnerExec, 'x'),
        (Perm::GroupRead, 'r'),
        (Perm::GroupWrite, 'w'),
        (Perm::GroupExec, 'x'),
        (Perm::OtherRead, 'r'),
        (Perm::OtherWrite, 'w'),
        (Perm::OtherExec, 'x'),
    ];

    let mut mode = String::with_capacity(10);
    mode.push(match stat.ty {
        DirEntryType::Directory => 'd',
        DirEntryType::Regular => '-',
    });
    for (perm, c) in BITS {
        mode.push(if stat.perm.contains(perm) { c } else { '-' });
    }
    mode
}
