use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::names::normalize;
use crate::error::{PipelineError, Result};
use crate::state::data::{relative_folder_string, Catalog, CatalogEntry};

/// Recognised video extensions. Matching is a substring test on the whole
/// filename, so "clip.mp4.part" also counts as a video.
pub const VIDEO_EXTENSIONS: [&str; 3] = [".mp4", ".avi", ".m4v"];

/// Check whether a filename looks like a video
pub fn is_video_name(file_name: &str) -> bool {
    VIDEO_EXTENSIONS.iter().any(|ext| file_name.contains(ext))
}

/// Walk `root` depth-first and build a catalog of every video file in it.
///
/// Entries come out sorted by name within each folder, so the same tree
/// always yields the same indices. Any walk error (unreadable folder,
/// symlink loop) aborts the whole discovery.
pub fn discover(root: &Path) -> Result<Catalog> {
    info!(root = %root.display(), "Scanning folder");

    let mut catalog = Catalog::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| PipelineError::from_walk(root, e))?;

        // Only files become entries, never folders
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().to_string();
        if !is_video_name(&file_name) {
            continue;
        }

        let folder = entry.path().parent().unwrap_or(root);
        let relative = folder.strip_prefix(root).unwrap_or(folder);

        let index = catalog.len();
        debug!(index, file = %file_name, "Found video");
        catalog.push(CatalogEntry {
            relative_folder: relative_folder_string(relative),
            display_name: normalize(&file_name),
            file_name,
            screenshots: Vec::new(),
            index,
        });
    }

    info!(root = %root.display(), videos = catalog.len(), "Scan complete");
    Ok(catalog)
}
