use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

/// Intermediate files a composite operation creates and later removes.
///
/// A path that already exists when it is tracked belongs to the user and is never removed.
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    paths: Vec<PathBuf>,
}

impl Scratch {
    /// Records a path that is about to be written.
    pub fn track<P>(&mut self, path: P)
    where
        P: Into<PathBuf>,
    {
        let path = path.into();

        if path.exists() {
            debug!(path = ?path, "keeping existing file");
        } else {
            self.paths.push(path);
        }
    }

    /// Removes every tracked path in the order it was tracked.
    ///
    /// Failures are logged and otherwise ignored.
    pub fn clean(self) {
        for path in self.paths {
            if let Err(e) = remove(&path) {
                warn!(path = ?path, error = %e, "failed to remove intermediate file");
            }
        }
    }
}

fn remove(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = ?path, "removed intermediate file");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
