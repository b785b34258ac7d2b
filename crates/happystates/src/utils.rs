use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use flate2::read::GzDecoder;

use crate::error::{bail, HappyError, HappyResult};

/// Opens an input file for reading. Files ending in `.gz` are
/// decompressed on the fly.
///
/// The `what` argument names the kind of file in the error message
/// that is returned if the file doesn't exist.
pub(crate) fn open_input<P: AsRef<Path>>(
    path: P,
    what: &str,
) -> HappyResult<Box<dyn Read>> {
    let path = path.as_ref();
    if !path.is_file() {
        bail!("{what} file not found (path = {}).", path.display());
    }

    let file = File::open(path)?;
    Ok(match path.extension().and_then(OsStr::to_str) {
        Some("gz") => Box::new(BufReader::new(GzDecoder::new(file))),
        _ => Box::new(BufReader::new(file)),
    })
}

/// Reads the whole (possibly compressed) input file into memory.
pub(crate) fn read_input<P: AsRef<Path>>(
    path: P,
    what: &str,
) -> HappyResult<Vec<u8>> {
    let mut buf = Vec::new();
    let _ = open_input(path, what)?.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Returns the location of the user-wide config file, if the platform
/// defines a config directory.
pub(crate) fn user_config() -> Option<PathBuf> {
    ProjectDirs::from("", "", "happystates")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
