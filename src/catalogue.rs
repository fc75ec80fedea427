//! Folder scanning and the in-memory image catalogue.
//!
//! Each folder argument contributes its immediate regular files, in file-name
//! order, to one flat list of [`ImageHandle`]s. There is no extension filter:
//! a file that does not decode still gets a handle, just an empty one, so
//! positions in the catalogue always match what was on disk.
//!
//! ```text
//! shoot-a/            shoot-b/
//! ├── 01.jpg          ├── x.png
//! ├── 02.jpg          └── notes.txt   (empty handle)
//! └── raw/            (not descended)
//!
//! catalogue: [01.jpg, 02.jpg, x.png, notes.txt]
//! ```
//!
//! Folders that are missing or are not directories are skipped without error.

use crate::imaging::ImageBackend;
use image::RgbImage;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One catalogued file plus its edit and cull flags.
///
/// `pixels` is `None` when decoding failed. Such a handle is never edited
/// and never exported; [`ImageHandle::edit`] is a no-op on it.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    path: PathBuf,
    pixels: Option<RgbImage>,
    edited: bool,
    culled: bool,
}

impl ImageHandle {
    /// Decode `path` with `backend`, keeping an empty handle on failure.
    pub fn open(backend: &impl ImageBackend, path: &Path) -> Self {
        let pixels = match backend.decode(path) {
            Ok(pixels) => Some(pixels),
            Err(e) => {
                log::warn!("Failed to load {}: {e}", path.display());
                None
            }
        };
        Self::from_pixels(path, pixels)
    }

    pub fn from_pixels(path: impl Into<PathBuf>, pixels: Option<RgbImage>) -> Self {
        Self {
            path: path.into(),
            pixels,
            edited: false,
            culled: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pixels(&self) -> Option<&RgbImage> {
        self.pixels.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.pixels.is_some()
    }

    pub fn is_edited(&self) -> bool {
        self.edited
    }

    pub fn is_culled(&self) -> bool {
        self.culled
    }

    pub fn cull(&mut self) {
        self.culled = true;
    }

    /// Whether export should write this handle.
    pub fn is_exportable(&self) -> bool {
        self.is_loaded() && self.edited && !self.culled
    }

    /// Run `op` on the pixel buffer and mark the handle edited.
    ///
    /// Returns `Ok(false)` without calling `op` when the handle is empty. A
    /// failing `op` leaves the edited flag as it was.
    pub fn edit<E>(
        &mut self,
        op: impl FnOnce(&mut RgbImage) -> Result<(), E>,
    ) -> Result<bool, E> {
        let Some(pixels) = self.pixels.as_mut() else {
            return Ok(false);
        };
        op(pixels)?;
        self.edited = true;
        Ok(true)
    }

    /// Replace the buffer with a finished preview and mark the handle edited.
    ///
    /// Returns `false` (and drops `pixels`) when the handle is empty.
    pub fn commit(&mut self, pixels: RgbImage) -> bool {
        if self.pixels.is_none() {
            return false;
        }
        self.pixels = Some(pixels);
        self.edited = true;
        true
    }
}

/// Outcome of scanning one folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderReport {
    pub folder: PathBuf,
    /// Regular files found (each became a handle).
    pub files: usize,
    /// How many of those failed to decode.
    pub failed: usize,
}

/// Outcome of [`Catalogue::load`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub folders: Vec<FolderReport>,
    /// Arguments that were missing or not directories.
    pub skipped: Vec<PathBuf>,
}

impl LoadReport {
    pub fn total_files(&self) -> usize {
        self.folders.iter().map(|f| f.files).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.folders.iter().map(|f| f.failed).sum()
    }
}

/// Ordered collection of image handles.
#[derive(Debug, Default)]
pub struct Catalogue {
    images: Vec<ImageHandle>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalogue with the files found in `folders`.
    pub fn load<P: AsRef<Path>>(
        &mut self,
        backend: &impl ImageBackend,
        folders: &[P],
    ) -> LoadReport {
        self.images.clear();
        let mut report = LoadReport::default();

        for folder in folders {
            let folder = folder.as_ref();
            if !folder.is_dir() {
                log::debug!("Skipping {}: not a directory", folder.display());
                report.skipped.push(folder.to_path_buf());
                continue;
            }

            let files = list_files(folder);
            let mut failed = 0;
            for path in &files {
                let handle = ImageHandle::open(backend, path);
                if !handle.is_loaded() {
                    failed += 1;
                }
                self.images.push(handle);
            }

            report.folders.push(FolderReport {
                folder: folder.to_path_buf(),
                files: files.len(),
                failed,
            });
        }

        report
    }

    pub fn push(&mut self, handle: ImageHandle) {
        self.images.push(handle);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[ImageHandle] {
        &self.images
    }

    pub fn get(&self, index: usize) -> Option<&ImageHandle> {
        self.images.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ImageHandle> {
        self.images.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageHandle> {
        self.images.iter()
    }
}

/// Immediate regular files of `folder`, sorted by file name.
///
/// Symlinks are followed so a link to a file counts as a file. Entries that
/// cannot be read are skipped.
pub fn list_files(folder: &Path) -> Vec<PathBuf> {
    WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}
