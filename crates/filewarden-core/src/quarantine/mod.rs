/// Quarantine manager - relocates flagged files out of the watched folder.
///
/// Destination names are `<YYYYmmddHHMMSS>_<original name>` under a
/// dedicated root that is created on first use.  The destination is first
/// reserved with a `create_new` placeholder, so a name already taken (by an
/// earlier file or a concurrent runner) is a collision and is never
/// overwritten.  The move itself is all-or-nothing:
///
/// 1. Same volume: a single `rename` over the placeholder, which is atomic.
/// 2. Cross volume (`ErrorKind::CrossesDevices`): copy into the placeholder,
///    then delete the original.  A failed copy removes the partial
///    destination.  A failed delete is logged and reported via
///    [`QuarantineRecord::original_retained`], never escalated.
use crate::model::QuarantineRecord;
use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum QuarantineError {
    #[error("cannot create quarantine directory {path}: {source}")]
    CreateRoot {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0} has no file name")]
    NoFileName(PathBuf),
    #[error("destination {0} already exists")]
    Collision(PathBuf),
    #[error("cannot move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Moves files into the quarantine root.  Stateless apart from the root path,
/// so any number of workers may share one instance.
#[derive(Debug, Clone)]
pub struct QuarantineManager {
    root: PathBuf,
}

impl QuarantineManager {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination for `path` if it were quarantined at `stamp`.
    pub fn destination_for(&self, path: &Path, stamp: &str) -> Result<PathBuf, QuarantineError> {
        let name = path
            .file_name()
            .ok_or_else(|| QuarantineError::NoFileName(path.to_path_buf()))?;
        let mut unique = std::ffi::OsString::from(format!("{stamp}_"));
        unique.push(name);
        Ok(self.root.join(unique))
    }

    /// Relocate `path` into the quarantine root.
    ///
    /// On error the original file is left exactly where it was.
    pub fn quarantine(&self, path: &Path) -> Result<QuarantineRecord, QuarantineError> {
        fs::create_dir_all(&self.root).map_err(|source| QuarantineError::CreateRoot {
            path: self.root.clone(),
            source,
        })?;

        let now = Local::now();
        let dest = self.destination_for(path, &now.format("%Y%m%d%H%M%S").to_string())?;
        let original_retained = relocate(path, &dest, |from, to| fs::rename(from, to))?;

        info!("Quarantined {} -> {}", path.display(), dest.display());

        Ok(QuarantineRecord {
            original_path: path.to_path_buf(),
            quarantined_path: dest,
            timestamp: now,
            original_retained,
        })
    }
}

/// Claim `dest` with an empty placeholder; fails if the name is taken.
fn reserve(src: &Path, dest: &Path) -> Result<(), QuarantineError> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dest)
        .map(drop)
        .map_err(|err| {
            if err.kind() == io::ErrorKind::AlreadyExists {
                QuarantineError::Collision(dest.to_path_buf())
            } else {
                QuarantineError::Move {
                    from: src.to_path_buf(),
                    to: dest.to_path_buf(),
                    source: err,
                }
            }
        })
}

fn discard(dest: &Path) {
    if let Err(err) = fs::remove_file(dest) {
        warn!(
            "Quarantine: failed to remove placeholder {}: {}",
            dest.display(),
            err
        );
    }
}

/// Move `src` to the not-yet-existing `dest` using `rename`, falling back to
/// [`copy_then_remove`] when the two are on different volumes.
///
/// Returns `Ok(true)` when `src` had to be left in place after a copy.
fn relocate<R>(src: &Path, dest: &Path, rename: R) -> Result<bool, QuarantineError>
where
    R: FnOnce(&Path, &Path) -> io::Result<()>,
{
    reserve(src, dest)?;

    match rename(src, dest) {
        Ok(()) => Ok(false),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            debug!("Quarantine: {} is on another volume, copying", src.display());
            copy_then_remove(src, dest, |p| fs::remove_file(p))
        }
        Err(source) => {
            discard(dest);
            Err(QuarantineError::Move {
                from: src.to_path_buf(),
                to: dest.to_path_buf(),
                source,
            })
        }
    }
}

/// Cross-volume fallback: copy `src` into the reserved `dest`, then delete
/// `src` with `remove`.
///
/// Returns `Ok(true)` when the copy landed but `src` could not be removed.
fn copy_then_remove<D>(src: &Path, dest: &Path, remove: D) -> Result<bool, QuarantineError>
where
    D: FnOnce(&Path) -> io::Result<()>,
{
    let copied = fs::File::open(src).and_then(|mut reader| {
        let mut writer = fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(dest)?;
        io::copy(&mut reader, &mut writer)?;
        writer.sync_all()
    });
    if let Err(source) = copied {
        // Never leave half a file in quarantine.
        discard(dest);
        return Err(QuarantineError::Copy {
            from: src.to_path_buf(),
            to: dest.to_path_buf(),
            source,
        });
    }

    match remove(src) {
        Ok(()) => Ok(false),
        Err(err) => {
            warn!(
                "Quarantine: copied {} but could not delete original: {} (duplicate left in place)",
                src.display(),
                err
            );
            Ok(true)
        }
    }
}
