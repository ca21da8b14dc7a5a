use std::env;
use std::fs;
use std::process;

use block_dev::{BlockDevice, BlockFile};

fn scratch(name: &str) -> std::path::PathBuf {
    env::temp_dir().join(format!("block-dev-{}-{name}.img", process::id()))
}

#[test]
fn create_presizes_image() {
    let path = scratch("presize");
    let dev = BlockFile::create(&path, 4 * 512).unwrap();
    assert_eq!(dev.len().unwrap(), 2048);
    assert!(!dev.is_empty().unwrap());
    fs::remove_file(path).unwrap();
}

#[test]
fn every_call_reopens() {
    let path = scratch("reopen");
    let dev = BlockFile::create(&path, 1024).unwrap();
    dev.write_at(510, b"hello").unwrap();

    // a second device on the same path sees the write immediately
    let other = BlockFile::new(&path);
    let mut buf = [0u8; 5];
    assert_eq!(other.read_at(510, &mut buf).unwrap(), 5);
    assert_eq!(&buf, b"hello");
    fs::remove_file(path).unwrap();
}

#[test]
fn read_past_end_is_short() {
    let path = scratch("short");
    let dev = BlockFile::create(&path, 16).unwrap();
    let mut buf = [0xffu8; 8];
    assert_eq!(dev.read_at(12, &mut buf).unwrap(), 4);
    assert_eq!(&buf[..4], &[0; 4]);
    assert_eq!(&buf[4..], &[0xff; 4]);
    fs::remove_file(path).unwrap();
}

#[test]
fn missing_image_is_an_error() {
    let dev = BlockFile::new(scratch("missing"));
    assert!(dev.len().is_err());
    assert!(dev.read_at(0, &mut [0; 4]).is_err());
}
