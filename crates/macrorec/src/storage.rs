//! Macro files on disk.
//!
//! A macro file is a JSON array of actions, pretty-printed with 4-space
//! indentation. [`load_log`] and [`save_log`] work on any path; a
//! [`MacroStore`] manages a directory of timestamped macros.

use std::fs::{self, File};
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;
use tracing::{debug, info};

use crate::action::ActionLog;
use crate::error::{Error, Result};

/// Extension of macro files.
pub const MACRO_EXTENSION: &str = "json";

const FILE_NAME_FORMAT: &str = "macro_%Y-%m-%d_%H-%M-%S.json";

/// Read an action log from `path`.
///
/// # Errors
///
/// Returns [`Error::MacroNotFound`] if the file does not exist and
/// [`Error::MacroParse`] if it is not a valid action log. Nothing is
/// returned for a partially valid file.
pub fn load_log(path: impl AsRef<Path>) -> Result<ActionLog> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => Error::MacroNotFound {
            path: path.to_path_buf(),
        },
        _ => Error::Io(e),
    })?;

    let log: ActionLog =
        serde_json::from_reader(BufReader::new(file)).map_err(|source| Error::MacroParse {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), actions = log.len(), "Loaded macro");
    Ok(log)
}

/// Write an action log to `path`, creating parent directories as needed.
///
/// The log is encoded before the file is touched, so an unwritable log
/// leaves any existing file at `path` unchanged.
///
/// # Errors
///
/// Returns [`Error::Json`] if the log holds a non-finite timestamp or a key
/// symbol that would not read back unchanged, and an I/O error if a
/// directory cannot be created or the file cannot be written.
pub fn save_log(path: impl AsRef<Path>, log: &ActionLog) -> Result<()> {
    let path = path.as_ref();

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    log.serialize(&mut serializer)?;
    buf.push(b'\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    fs::write(path, &buf)?;

    debug!(path = %path.display(), actions = log.len(), "Saved macro");
    Ok(())
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|source| Error::DirectoryCreate {
        path: dir.to_path_buf(),
        source,
    })
}

/// The file name a macro recorded at `at` is saved under.
#[must_use]
pub fn default_file_name<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(FILE_NAME_FORMAT).to_string()
}

/// A directory of saved macros.
#[derive(Debug, Clone)]
pub struct MacroStore {
    dir: PathBuf,
}

impl MacroStore {
    /// Open the store at `dir`, creating the directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DirectoryCreate`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    /// The store's directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where a macro recorded now would be saved.
    #[must_use]
    pub fn new_macro_path(&self) -> PathBuf {
        self.dir.join(default_file_name(&Local::now()))
    }

    /// Save `log` under a timestamped name and return its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, log: &ActionLog) -> Result<PathBuf> {
        let path = self.new_macro_path();
        save_log(&path, log)?;
        info!(path = %path.display(), actions = log.len(), "Macro saved");
        Ok(path)
    }

    /// Load a macro by path or by name within the store.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`load_log`].
    pub fn load(&self, name: impl AsRef<Path>) -> Result<ActionLog> {
        load_log(self.resolve(name))
    }

    /// Resolve a user-supplied macro reference.
    ///
    /// Paths that exist are used as given. Otherwise a bare name is looked up
    /// in the store, with the `.json` extension added if missing.
    #[must_use]
    pub fn resolve(&self, name: impl AsRef<Path>) -> PathBuf {
        let name = name.as_ref();
        if name.exists() || name.is_absolute() || name.components().count() > 1 {
            return name.to_path_buf();
        }
        let candidate = self.dir.join(name);
        if candidate.extension().is_none() {
            candidate.with_extension(MACRO_EXTENSION)
        } else {
            candidate
        }
    }

    /// All macro files in the store, sorted by name.
    ///
    /// Timestamped names sort oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        let mut macros = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_macro = path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(MACRO_EXTENSION));
            if is_macro {
                macros.push(path);
            }
        }
        macros.sort();
        Ok(macros)
    }
}
