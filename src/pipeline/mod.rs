/// Import pipeline module
///
/// - Coordinating discovery, extraction and persistence (controller.rs)
/// - Counting finished videos (progress.rs)
/// - Handing files to the OS (open.rs)

pub mod controller;
pub mod open;
pub mod progress;

pub use controller::{PipelineController, PipelineEvent};
