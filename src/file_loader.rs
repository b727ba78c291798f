use std::fs::{self, File};
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use crate::error::Result;

pub fn load_file(file: impl AsRef<Path>) -> Result<String> {
    let file = file.as_ref();
    let raw_text = fs::read_to_string(file)?;

    tracing::debug!(
        path = %file.display(),
        chars = raw_text.chars().count(),
        "loaded file"
    );

    Ok(raw_text)
}

/// Opens a text file for line-by-line streaming.
pub fn read_lines(file: impl AsRef<Path>) -> Result<Lines<BufReader<File>>> {
    let file = file.as_ref();
    let handle = File::open(file)?;
    tracing::debug!(path = %file.display(), "streaming lines");
    Ok(BufReader::new(handle).lines())
}
