use std::fmt;
use std::io;

pub type Result<T> = core::result::Result<T, Error>;

/// 文件系统操作的失败原因
///
/// 驱动层通过 [`Error::errno`] 把它翻译成负的错误码。
#[derive(Debug)]
pub enum Error {
    /// 路径或条目不存在，读写长度为0，偏移越过文件末尾
    NotFound,
    AlreadyExists,
    /// 目录名或基本名超过8字节，扩展名超过3字节
    NameTooLong,
    /// 路径结构不合法
    PermissionDenied,
    /// 目录表已满或没有空闲块
    NoSpace,
    /// 后备存储的内容无法解析
    Corrupted(String),
    Io(io::Error),
}

impl Error {
    pub const ENOENT: i32 = 2;
    pub const EEXIST: i32 = 17;
    pub const ENAMETOOLONG: i32 = 36;
    pub const EPERM: i32 = 1;
    pub const ENOSPC: i32 = 28;
    pub const EIO: i32 = 5;

    /// Negative errno handed back to the driver.
    pub fn errno(&self) -> i32 {
        let code = match self {
            Error::NotFound => Self::ENOENT,
            Error::AlreadyExists => Self::EEXIST,
            Error::NameTooLong => Self::ENAMETOOLONG,
            Error::PermissionDenied => Self::EPERM,
            Error::NoSpace => Self::ENOSPC,
            Error::Corrupted(_) => Self::EIO,
            Error::Io(e) => e.raw_os_error().unwrap_or(Self::EIO),
        };
        -code
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotFound => f.write_str("no such file or directory"),
            Error::AlreadyExists => f.write_str("file exists"),
            Error::NameTooLong => f.write_str("file name too long"),
            Error::PermissionDenied => f.write_str("operation not permitted"),
            Error::NoSpace => f.write_str("no space left on device"),
            Error::Corrupted(why) => write!(f, "corrupted store: {why}"),
            Error::Io(e) => write!(f, "i/o error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
