use std::{
    fs::{File, OpenOptions},
    io,
    path::Path,
};

/// Open `path` for appending, creating it if needed. Existing rows are
/// never touched.
pub fn open_log(path: &Path) -> io::Result<File> {
    OpenOptions::new().append(true).create(true).open(path)
}
