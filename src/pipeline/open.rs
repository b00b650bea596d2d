use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};

/// Ask the OS to open `path` with its default application.
/// Fire and forget: the child is not waited on.
pub fn open_path(path: &Path) -> Result<()> {
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = Command::new("explorer");
        c.arg(path);
        c
    };

    #[cfg(target_os = "macos")]
    let mut command = {
        let mut c = Command::new("open");
        c.arg(path);
        c
    };

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    let mut command = {
        let mut c = Command::new("xdg-open");
        c.arg(path);
        c
    };

    match command.spawn() {
        Ok(_) => {
            info!(path = %path.display(), "Opened with default application");
            Ok(())
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to open file");
            Err(PipelineError::io(path, e))
        }
    }
}
