/// State management module
///
/// This module handles everything that outlives a single import run:
/// - Catalog data structures (data.rs)
/// - The images.json record and the screenshot folder (store.rs)
/// - User settings (settings.rs)

pub mod data;
pub mod settings;
pub mod store;
