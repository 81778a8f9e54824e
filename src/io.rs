//! Everything that touches the dataset directories on disk.

use glob::{glob, Pattern};
use log::warn;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::crop::{Crop, CROPS_DIR};
use crate::error::{PrepError, Result};
use crate::types::{is_image_extension, CropRecord};
use crate::utils::{create_output_directory, file_name_string, file_stem_string};

/// Name of the crop manifest inside the crop output directory.
pub const MANIFEST_FILE: &str = "crops.json";

/// Output directories of a label-conversion run.
#[derive(Debug, Clone)]
pub struct LabelOutputDirs {
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
}

/// Output locations of a crop-extraction run.
#[derive(Debug, Clone)]
pub struct CropOutputDirs {
    pub root: PathBuf,
    pub crops_dir: PathBuf,
}

impl CropOutputDirs {
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }
}

/// Create `images/` and `labels/` under `out_dir` if they are missing.
pub fn setup_label_output_directories(out_dir: &Path) -> Result<LabelOutputDirs> {
    let images_dir = out_dir.join("images");
    let labels_dir = out_dir.join("labels");
    Ok(LabelOutputDirs {
        images_dir: create_output_directory(&images_dir).map_err(|e| PrepError::io(&images_dir, e))?,
        labels_dir: create_output_directory(&labels_dir).map_err(|e| PrepError::io(&labels_dir, e))?,
    })
}

/// Create `out_dir` and `out_dir/crops` if they are missing.
pub fn setup_crop_output_directories(out_dir: &Path) -> Result<CropOutputDirs> {
    let crops_dir = out_dir.join(CROPS_DIR);
    create_output_directory(&crops_dir).map_err(|e| PrepError::io(&crops_dir, e))?;
    Ok(CropOutputDirs {
        root: out_dir.to_path_buf(),
        crops_dir,
    })
}

/// Fail with a configuration error unless `dir` is an existing directory.
pub fn require_dir(dir: &Path, what: &str) -> Result<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(PrepError::config(format!(
            "{} does not exist or is not a directory: {}",
            what,
            dir.display()
        )))
    }
}

/// Fail with a configuration error unless `program` can be spawned: an
/// existing file when given as a path, otherwise a file found on `PATH`.
pub fn require_program(program: &Path, what: &str) -> Result<()> {
    let is_bare_name = program.parent() == Some(Path::new(""));
    let found = if is_bare_name {
        std::env::var_os("PATH").is_some_and(|paths| {
            std::env::split_paths(&paths).any(|dir| {
                let candidate = dir.join(program);
                candidate.is_file()
                    || (!std::env::consts::EXE_EXTENSION.is_empty()
                        && candidate
                            .with_extension(std::env::consts::EXE_EXTENSION)
                            .is_file())
            })
        })
    } else {
        program.is_file()
    };

    if found {
        Ok(())
    } else {
        Err(PrepError::config(format!(
            "{} not found: {}",
            what,
            program.display()
        )))
    }
}

/// Image files directly inside `dir`, sorted by path.
///
/// `ext_filter` narrows the set to one extension; it may be given with or
/// without the leading dot and is compared case-insensitively.
pub fn list_images(dir: &Path, ext_filter: Option<&str>) -> Result<Vec<PathBuf>> {
    let filter = ext_filter
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty());

    let pattern = format!("{}/*", Pattern::escape(&dir.to_string_lossy()));
    let entries = glob(&pattern)
        .map_err(|e| PrepError::config(format!("bad image directory {}: {}", dir.display(), e)))?;

    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .filter(|path| {
            let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
                return false;
            };
            is_image_extension(ext)
                && filter
                    .as_deref()
                    .map_or(true, |wanted| ext.eq_ignore_ascii_case(wanted))
        })
        .collect();
    images.sort();
    Ok(images)
}

/// The LabelMe file belonging to an image: `<name>.<ext>.json`, or
/// failing that `<stem>.json`, next to the image.
pub fn find_annotation_file(image_path: &Path) -> Option<PathBuf> {
    let mut full = image_path.as_os_str().to_os_string();
    full.push(".json");
    let full = PathBuf::from(full);
    if full.is_file() {
        return Some(full);
    }

    let by_stem = image_path.with_extension("json");
    by_stem.is_file().then_some(by_stem)
}

/// Write `labels/<stem>.txt`, even when `contents` is empty.
pub fn write_label_file(labels_dir: &Path, image_path: &Path, contents: &str) -> Result<PathBuf> {
    let label_path = labels_dir.join(format!("{}.txt", file_stem_string(image_path)));
    fs::write(&label_path, contents).map_err(|e| PrepError::io(&label_path, e))?;
    Ok(label_path)
}

/// Copy the source image bytes unchanged into `images/`.
pub fn copy_image(images_dir: &Path, image_path: &Path) -> Result<PathBuf> {
    let target = images_dir.join(file_name_string(image_path));
    fs::copy(image_path, &target).map_err(|e| PrepError::io(&target, e))?;
    Ok(target)
}

/// Encode a crop as PNG into the crops directory.
pub fn write_crop(crops_dir: &Path, crop: &Crop) -> Result<PathBuf> {
    let path = crops_dir.join(&crop.file_name);
    crop.image
        .save_with_format(&path, image::ImageFormat::Png)
        .map_err(|source| PrepError::Image {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}

/// Write a value as pretty JSON, creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_output_directory(parent).map_err(|e| PrepError::io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| PrepError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| PrepError::io(path, e))
}

/// Write the whole manifest in one go, in accumulation order.
pub fn write_manifest(dirs: &CropOutputDirs, records: &[CropRecord]) -> Result<PathBuf> {
    let path = dirs.manifest_path();
    write_json(&path, records)?;
    Ok(path)
}

/// Decode just enough of an image to learn its size.
pub fn image_dimensions(image_path: &Path) -> Option<(u32, u32)> {
    match image::image_dimensions(image_path) {
        Ok(dims) => Some(dims),
        Err(e) => {
            warn!("Cannot decode image {}: {}", image_path.display(), e);
            None
        }
    }
}

/// Fully decode an image, logging and returning `None` on failure.
pub fn open_image(image_path: &Path) -> Option<image::DynamicImage> {
    match image::open(image_path) {
        Ok(img) => Some(img),
        Err(e) => {
            warn!("Cannot decode image {}: {}", image_path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_list_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "c.jpeg", "notes.txt", "a.json", "d.webp", "e.tiff"] {
            touch(&dir.path().join(name));
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let names: Vec<String> = list_images(dir.path(), None)
            .unwrap()
            .iter()
            .map(|p| file_name_string(p))
            .collect();
        assert_eq!(names, ["a.JPG", "b.png", "c.jpeg", "d.webp"]);

        let only_jpg: Vec<String> = list_images(dir.path(), Some(".jpg"))
            .unwrap()
            .iter()
            .map(|p| file_name_string(p))
            .collect();
        assert_eq!(only_jpg, ["a.JPG"]);
    }

    #[test]
    fn test_find_annotation_file_prefers_full_name() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("shop.jpg");
        touch(&image);
        assert_eq!(find_annotation_file(&image), None);

        touch(&dir.path().join("shop.json"));
        assert_eq!(find_annotation_file(&image), Some(dir.path().join("shop.json")));

        touch(&dir.path().join("shop.jpg.json"));
        assert_eq!(find_annotation_file(&image), Some(dir.path().join("shop.jpg.json")));
    }

    #[test]
    fn test_require_program() {
        let dir = tempfile::tempdir().unwrap();
        let program = dir.path().join("detect.sh");
        touch(&program);
        assert!(require_program(&program, "detector").is_ok());
        assert!(matches!(
            require_program(&dir.path().join("missing.sh"), "detector"),
            Err(PrepError::Config(_))
        ));
        assert!(matches!(
            require_program(Path::new("no-such-detector-on-path-4f2a"), "detector"),
            Err(PrepError::Config(_))
        ));
    }

    #[test]
    fn test_write_manifest_is_pretty_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = setup_crop_output_directories(&dir.path().join("out")).unwrap();
        assert!(dirs.crops_dir.is_dir());

        let path = write_manifest(&dirs, &[]).unwrap();
        assert_eq!(path, dir.path().join("out").join(MANIFEST_FILE));
        assert_eq!(fs::read_to_string(path).unwrap(), "[]");
    }
}
