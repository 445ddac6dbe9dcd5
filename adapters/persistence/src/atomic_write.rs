use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use tempfile::NamedTempFile;

/// Writes `text` to an anonymous file beside `path`, then renames it over `path`.
///
/// The rename replaces the destination in one step, so readers observe either
/// the previous contents or the new ones.
pub(crate) fn replace_with_text(path: &Path, text: &str) -> io::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(directory)?;

    let mut staged = NamedTempFile::new_in(directory)?;
    staged.write_all(text.as_bytes())?;
    staged.as_file().sync_all()?;
    let _persisted = staged.persist(path).map_err(|error| error.error)?;
    Ok(())
}
