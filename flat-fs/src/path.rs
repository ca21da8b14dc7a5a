//! 路径解析
//!
//! 语法固定为 `/subdir` 或 `/subdir/base.ext`，等价于按
//! `"/%[^/]/%[^.].%s"` 扫描：每一段至少要有一个字符，否则扫描就此停止，
//! 剩下的字段保持为空。不合法的输入不会报错，由调用者检查长度与空值。

/// 解析后的三元组，均借用自原路径
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsPath<'a> {
    pub subdir: &'a str,
    pub base: &'a str,
    pub ext: &'a str,
}

impl<'a> FsPath<'a> {
    pub fn parse(path: &'a str) -> Self {
        let mut parsed = Self::default();

        let Some(rest) = path.strip_prefix('/') else {
            return parsed;
        };
        let (subdir, rest) = split_run(rest, |c| c != '/');
        if subdir.is_empty() {
            return parsed;
        }
        parsed.subdir = subdir;

        let Some(rest) = rest.strip_prefix('/') else {
            return parsed;
        };
        // 基本名可以含有`/`，更深的路径因此会在长度或查找上失败
        let (base, rest) = split_run(rest, |c| c != '.');
        if base.is_empty() {
            return parsed;
        }
        parsed.base = base;

        let Some(rest) = rest.strip_prefix('.') else {
            return parsed;
        };
        let rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
        parsed.ext = split_run(rest, |c| !c.is_ascii_whitespace()).0;

        parsed
    }

    /// 只有子目录部分
    pub fn is_subdir(&self) -> bool {
        !self.subdir.is_empty() && self.base.is_empty() && self.ext.is_empty()
    }
}

/// 切出满足`accept`的最长前缀
fn split_run(s: &str, accept: impl Fn(char) -> bool) -> (&str, &str) {
    let end = s.find(|c: char| !accept(c)).unwrap_or(s.len());
    s.split_at(end)
}
