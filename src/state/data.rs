/// Shared data structures for the catalog
///
/// These structs represent the data model that flows between
/// the import pipeline, the catalog file and the UI layer.

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Represents a single discovered video in the catalog
///
/// On disk an entry is a positional array
/// `[relativeFolder, fileName, displayName, screenshots]`; the fourth
/// element is left out until the screenshot list is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Containing folder with the import root stripped off ("" for the root itself)
    pub relative_folder: String,
    /// Filename only (e.g., "movie_one.mp4")
    pub file_name: String,
    /// Human-friendly label derived from the filename
    pub display_name: String,
    /// Screenshot paths relative to the output folder, in tool order
    pub screenshots: Vec<String>,
    /// Position in the catalog; not stored, rebuilt from array order on load
    pub index: usize,
}

impl CatalogEntry {
    /// Absolute path of the source video under `root`
    pub fn source_path(&self, root: &Path) -> PathBuf {
        let relative = self.relative_folder.trim_start_matches(['/', MAIN_SEPARATOR]);
        if relative.is_empty() {
            root.join(&self.file_name)
        } else {
            root.join(relative).join(&self.file_name)
        }
    }
}

impl Serialize for CatalogEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.screenshots.is_empty() { 3 } else { 4 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.relative_folder)?;
        seq.serialize_element(&self.file_name)?;
        seq.serialize_element(&self.display_name)?;
        if !self.screenshots.is_empty() {
            seq.serialize_element(&self.screenshots)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for CatalogEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = CatalogEntry;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an array [relativeFolder, fileName, displayName, screenshots?]")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<CatalogEntry, A::Error> {
                let relative_folder = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let file_name = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                let display_name = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(2, &self))?;
                let screenshots: Option<Option<Vec<String>>> = seq.next_element()?;
                if seq.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(5, &self));
                }

                Ok(CatalogEntry {
                    relative_folder,
                    file_name,
                    display_name,
                    screenshots: screenshots.flatten().unwrap_or_default(),
                    index: 0,
                })
            }
        }

        deserializer.deserialize_seq(EntryVisitor)
    }
}

/// Ordered catalog of one import run
pub type Catalog = Vec<CatalogEntry>;

/// The durable form of a catalog plus where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedRecord {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    #[serde(deserialize_with = "deserialize_indexed")]
    pub images: Catalog,
}

/// Deserialize the images array and restore each entry's index from its position
fn deserialize_indexed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Catalog, D::Error> {
    let mut images = Catalog::deserialize(deserializer)?;
    for (index, entry) in images.iter_mut().enumerate() {
        entry.index = index;
    }
    Ok(images)
}

/// Render a stripped folder path the way catalog files store it:
/// empty for the root, otherwise with a leading separator ("/a/b").
pub fn relative_folder_string(relative: &Path) -> String {
    if relative.as_os_str().is_empty() {
        String::new()
    } else {
        format!("{}{}", MAIN_SEPARATOR, relative.display())
    }
}
