mod cli;

use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::sync::Arc;

use block_dev::BlockFile;
use clap::Parser;
use flat_fs::FlatFileSystem;
use flat_fs::layout::Bitmap;
use flat_fs_fuse::{mode_string, pack, read_all};

use self::cli::{Cli, Command};

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e} (errno {})", e.errno());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> vfs::Result<()> {
    let Cli { image, command } = cli;
    log::debug!("image={image:?}");

    let fs = match command {
        Command::Format { size } => {
            let file = BlockFile::create(&image, size)?;
            println!("image={:?}", file.path());
            let fs = FlatFileSystem::new(Arc::new(file))?;
            fs.format()?;
            fs
        }
        _ => FlatFileSystem::new(Arc::new(BlockFile::new(&image)))?,
    };

    match command {
        Command::Format { .. } => {
            println!("blocks={}", fs.store().block_count()?);
        }
        Command::Stat { path } => {
            let stat = fs.getattr(&path)?;
            println!(
                "{} {:o} links={} size={} blocks={}",
                mode_string(&stat),
                stat.mode(),
                stat.links,
                stat.size,
                stat.blocks
            );
        }
        Command::Ls { path } => {
            for entry in fs.readdir(&path)? {
                println!("{}", entry.name);
            }
        }
        Command::Mkdir { path } => fs.mkdir(&path)?,
        Command::Rmdir { path } => fs.rmdir(&path)?,
        Command::Touch { path } => fs.mknod(&path)?,
        Command::Rm { path } => fs.unlink(&path)?,
        Command::Cat { path } => {
            fs.open(&path)?;
            let data = read_all(&fs, &path)?;
            fs.release(&path)?;
            io::stdout().write_all(&data)?;
        }
        Command::Write { path, offset, file } => {
            let data = match file {
                Some(file) => std::fs::read(file)?,
                None => {
                    let mut data = Vec::new();
                    io::stdin().read_to_end(&mut data)?;
                    data
                }
            };
            fs.open(&path)?;
            let wrote = fs.write(&path, &data, offset)?;
            fs.flush(&path)?;
            fs.release(&path)?;
            println!("wrote {wrote} bytes");
        }
        Command::Pack { source, into } => {
            println!("source={source:?}\ninto={into:?}");
            for name in pack(&fs, &source, &into)? {
                println!("packed: {name}");
            }
        }
        Command::Bitmap => {
            let bitmap = fs.bitmap()?;
            let limit = Bitmap::limit(fs.store())?;
            print!("{}", bitmap.dump(limit));
            println!("allocated={}/{limit}", bitmap.allocated());
        }
    }

    Ok(())
}
