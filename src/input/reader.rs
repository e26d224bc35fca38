use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use memmap2::Mmap;

use crate::input::InputError;

/// Opens a text input, transparently decoding `.gz` files.
///
/// Plain files are memory-mapped; empty files fall back to a regular reader
/// because zero-length mappings are rejected on some platforms.
pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let gz = path.extension().is_some_and(|ext| ext == "gz");
    tracing::debug!(path = %path.display(), gz, "opening input");
    if gz {
        return Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))));
    }
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(Box::new(BufReader::new(file)));
    }
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(Box::new(Cursor::new(mmap)))
}

pub fn find_first_existing(dir: &Path, candidates: &[&str]) -> Option<std::path::PathBuf> {
    candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}
