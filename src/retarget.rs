//! Atomic symlink retargeting.
//!
//! A link is never modified in place: a new link is created next to it under
//! a temporary name and renamed over the original, so the path always names
//! either the old link or the new one.

use crate::internal::link::{self, temp_sibling, LinkStatus};
use crate::Error;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::symlink;
use tracing::{debug, info, warn};

/// One pending retarget of `path` to `new_target`
#[derive(Debug, Clone)]
pub struct Retarget {
    path: Utf8PathBuf,
    new_target: String,
    temp_path: Utf8PathBuf,
}

impl Retarget {
    pub fn new(path: impl Into<Utf8PathBuf>, new_target: impl Into<String>) -> Self {
        let path = path.into();
        let temp_path = temp_sibling(&path);
        Self {
            path,
            new_target: new_target.into(),
            temp_path,
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn new_target(&self) -> &str {
        &self.new_target
    }

    /// Where the new link is staged before the rename
    pub fn temp_path(&self) -> &Utf8Path {
        &self.temp_path
    }

    /// Create the temporary link and rename it over `path`.
    ///
    /// `path` must already be a symlink; anything else is refused before the
    /// temporary link is created. A stale temporary link left by an earlier
    /// run is reported as `TempPathCollision` and left in place.
    pub fn execute(self) -> Result<(), Error> {
        match link::status(&self.path)? {
            LinkStatus::Symlink(_) => self.swap(),
            LinkStatus::Missing => Err(Error::NotFound(self.path)),
            LinkStatus::Other => Err(Error::NotASymlink(self.path)),
        }
    }

    fn swap(self) -> Result<(), Error> {
        debug!("Linking {} -> {}", self.temp_path, self.new_target);

        symlink(&self.new_target, &self.temp_path).map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                Error::TempPathCollision(self.temp_path.clone())
            } else {
                Error::io("symlink", &self.temp_path, e)
            }
        })?;

        let guard = TempLink::new(&self.temp_path);

        fs::rename(&self.temp_path, &self.path)
            .map_err(|e| Error::io("rename", &self.path, e))?;

        guard.disarm();

        info!("{} -> {}", self.path, self.new_target);

        Ok(())
    }
}

/// Removes the staged temporary link unless the rename consumed it
struct TempLink<'a> {
    path: &'a Utf8Path,
    armed: bool,
}

impl<'a> TempLink<'a> {
    fn new(path: &'a Utf8Path) -> Self {
        Self { path, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TempLink<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        debug!("Removing temporary link {}", self.path);
        if let Err(e) = fs::remove_file(self.path) {
            warn!("Failed to remove temporary link {}: {}", self.path, e);
        }
    }
}

/// Atomically replace the target of the symlink at `path`.
///
/// `new_target` is stored verbatim; it does not need to exist.
pub fn retarget(path: &Utf8Path, new_target: &str) -> Result<(), Error> {
    Retarget::new(path, new_target).execute()
}

/// What [`point`] did to the path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointAction {
    /// Nothing existed at the path, a new symlink was created
    Created,
    /// An existing symlink was retargeted atomically
    Retargeted,
}

/// Make `path` a symlink to `target`.
///
/// Creates the link when `path` does not exist and retargets it when it is
/// already a symlink. Any other file type is refused.
pub fn point(path: &Utf8Path, target: &str) -> Result<PointAction, Error> {
    match link::status(path)? {
        LinkStatus::Missing => {
            symlink(target, path).map_err(|e| Error::io("symlink", path, e))?;
            info!("Created {} -> {}", path, target);
            Ok(PointAction::Created)
        }
        LinkStatus::Symlink(_) => {
            retarget(path, target)?;
            Ok(PointAction::Retargeted)
        }
        LinkStatus::Other => Err(Error::NotASymlink(path.to_owned())),
    }
}
