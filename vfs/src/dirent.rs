#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub ty: DirEntryType,
    pub name: String,
}

impl DirEntry {
    pub fn new(ty: DirEntryType, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DirEntryType {
    Directory,
    #[default]
    Regular,
}
