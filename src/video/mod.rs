/// Video handling module
///
/// This module handles:
/// - Finding video files under an import root (discovery.rs)
/// - Turning filenames into display labels (names.rs)
/// - Driving the external media tool (tool.rs)
/// - Per-video screenshot extraction tasks (extract.rs)

pub mod discovery;
pub mod extract;
pub mod names;
pub mod tool;

#[cfg(test)]
pub mod fakes;
