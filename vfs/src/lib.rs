mod dirent;
mod error;
mod stat;

pub use self::{
    dirent::{DirEntry, DirEntryType},
    error::{Error, Result},
    stat::{Perm, Stat},
};
