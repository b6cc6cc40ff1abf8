//! Image intake: keyed storage of uploaded radiographs
//!
//! Uploads are stored under the caller's file name and overwrite earlier
//! uploads with the same name. Names that identify a slot are stored in the
//! form `<slot>.<lowercase ext>`, so `Frontal.JPG` lands as `frontal.jpg`.
//! Report runs read images back by slot, looking for `<slot>.<ext>` for each
//! configured extension in order.

use crate::error::{OrthoscanError, Result};
use crate::types::{AnatomicalSlot, ReportConfig};
use image::DynamicImage;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Default upload folder name inside a workspace
pub const DEFAULT_UPLOAD_DIR: &str = "uploaded_images";

/// Stored images of one case, keyed by slot. Absent slots have no entry.
pub type CaseImages = BTreeMap<AnatomicalSlot, StoredImage>;

/// An uploaded radiograph
#[derive(Debug, Clone, PartialEq)]
pub struct StoredImage {
    pub slot: AnatomicalSlot,

    /// Storage key the image was found under, e.g. `frontal.jpg`
    pub key: String,

    /// Encoded image bytes as uploaded
    pub bytes: Vec<u8>,
}

impl StoredImage {
    /// Decodes the stored bytes
    ///
    /// # Errors
    ///
    /// Returns [`OrthoscanError::ImageDecode`] for unreadable or unsupported images.
    pub fn decode(&self) -> Result<DynamicImage> {
        image::load_from_memory(&self.bytes).map_err(|e| OrthoscanError::ImageDecode {
            key: self.key.clone(),
            message: e.to_string(),
        })
    }
}

/// Keyed image storage
pub trait ImageStore {
    /// Stores `bytes` under `key`, replacing any previous image with that key
    fn store(&mut self, key: &str, bytes: &[u8]) -> Result<()>;

    /// Reads the image for `slot`, or `None` if nothing was uploaded for it
    fn load(&self, slot: AnatomicalSlot) -> Result<Option<StoredImage>>;

    /// Reads every populated slot
    fn load_case(&self) -> Result<CaseImages> {
        let mut images = CaseImages::new();
        for slot in AnatomicalSlot::ALL {
            match self.load(slot)? {
                Some(image) => {
                    images.insert(slot, image);
                }
                None => debug!("No image uploaded for {}", slot),
            }
        }
        Ok(images)
    }
}

/// Validates an upload key
///
/// Keys must be bare, non-empty file names.
pub fn validate_key(key: &str) -> Result<&str> {
    let key = key.trim();
    if key.is_empty() {
        return Err(OrthoscanError::InvalidKey("no selected file".to_string()));
    }
    if key.contains(['/', '\\']) || key == "." || key == ".." || key.contains('\0') {
        return Err(OrthoscanError::InvalidKey(format!(
            "'{}' is not a plain file name",
            key
        )));
    }
    Ok(key)
}

/// Validates an upload key and maps slot names onto their stored form
///
/// `Frontal.JPG` and `right-lateral.png` become `frontal.jpg` and
/// `right_lateral.png`. Keys that name no slot are kept as given.
pub fn canonical_key(key: &str) -> Result<String> {
    let key = validate_key(key)?;
    let canonical = match (AnatomicalSlot::from_key(key), key.rsplit_once('.')) {
        (Some(slot), Some((_, ext))) if !ext.is_empty() => {
            format!("{}.{}", slot.as_str(), ext.to_lowercase())
        }
        _ => key.to_string(),
    };
    Ok(canonical)
}

fn candidate_keys(slot: AnatomicalSlot, extensions: &[String]) -> impl Iterator<Item = String> + '_ {
    extensions
        .iter()
        .map(move |ext| {
            format!(
                "{}.{}",
                slot.as_str(),
                ext.trim_start_matches('.').to_lowercase()
            )
        })
}

/// Image store backed by an upload directory
#[derive(Debug, Clone)]
pub struct DirectoryImageStore {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirectoryImageStore {
    /// Creates a store rooted at `root`; the directory is created on first upload
    pub fn new(root: impl Into<PathBuf>, config: &ReportConfig) -> Self {
        Self {
            root: root.into(),
            extensions: config.image_extensions.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ImageStore for DirectoryImageStore {
    fn store(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        let key = canonical_key(key)?;
        std::fs::create_dir_all(&self.root)?;
        let path = self.root.join(&key);
        std::fs::write(&path, bytes)?;
        debug!("Stored {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    fn load(&self, slot: AnatomicalSlot) -> Result<Option<StoredImage>> {
        for key in candidate_keys(slot, &self.extensions) {
            let path = self.root.join(&key);
            if path.is_file() {
                let bytes = std::fs::read(&path)?;
                return Ok(Some(StoredImage { slot, key, bytes }));
            }
        }
        Ok(None)
    }
}

/// In-memory image store
#[derive(Debug, Clone)]
pub struct MemoryImageStore {
    images: HashMap<String, Vec<u8>>,
    extensions: Vec<String>,
}

impl Default for MemoryImageStore {
    fn default() -> Self {
        Self::new(&ReportConfig::default())
    }
}

impl MemoryImageStore {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            images: HashMap::new(),
            extensions: config.image_extensions.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageStore for MemoryImageStore {
    fn store(&mut self, key: &str, bytes: &[u8]) -> Result<()> {
        let key = canonical_key(key)?;
        self.images.insert(key, bytes.to_vec());
        Ok(())
    }

    fn load(&self, slot: AnatomicalSlot) -> Result<Option<StoredImage>> {
        Ok(candidate_keys(slot, &self.extensions).find_map(|key| {
            self.images.get(&key).map(|bytes| StoredImage {
                slot,
                bytes: bytes.clone(),
                key,
            })
        }))
    }
}
