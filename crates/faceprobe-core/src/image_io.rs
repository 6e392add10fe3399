//! Image loading and database file discovery.

use crate::error::EngineError;
use image::RgbImage;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Decode an image file into 8-bit RGB.
pub fn load_rgb(path: &Path) -> Result<RgbImage, EngineError> {
    let img = image::open(path).map_err(|source| EngineError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), width = img.width(), height = img.height(), "image loaded");
    Ok(img.to_rgb8())
}

/// Whether `path` carries a supported image extension.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Recursively collect image files under `dir`, sorted by path.
///
/// Symlinked directories are not descended into, so each file is listed once.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    if !dir.is_dir() {
        return Err(EngineError::DatabaseNotFound(dir.to_path_buf()));
    }

    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable database entry");
                None
            }
        })
        .filter(|entry| !entry.file_type().is_dir() && is_image_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    images.sort();
    Ok(images)
}

/// Convert an RGB image into a grayscale byte buffer (ITU-R BT.601 luma).
pub fn to_grayscale(img: &RgbImage) -> Vec<u8> {
    img.pixels()
        .map(|p| {
            let [r, g, b] = p.0;
            (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32).round() as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a/b/face.JPG")));
        assert!(is_image_file(Path::new("face.png")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("no_extension")));
    }

    #[test]
    fn test_collect_images_recurses_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("bob");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(dir.path().join("zoe.jpg"), b"").unwrap();
        std::fs::write(sub.join("bob1.png"), b"").unwrap();
        std::fs::write(dir.path().join("readme.md"), b"").unwrap();

        let images = collect_images(dir.path()).unwrap();
        assert_eq!(images, vec![sub.join("bob1.png"), dir.path().join("zoe.jpg")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_images_ignores_symlink_cycle() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("alice.jpg"), b"").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let images = collect_images(dir.path()).unwrap();
        assert_eq!(images, vec![dir.path().join("alice.jpg")]);
    }

    #[test]
    fn test_collect_images_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(collect_images(&missing), Err(EngineError::DatabaseNotFound(_))));
    }

    #[test]
    fn test_load_rgb_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(matches!(load_rgb(&path), Err(EngineError::Image { .. })));
    }

    #[test]
    fn test_to_grayscale_white() {
        let img = RgbImage::from_pixel(2, 2, image::Rgb([255, 255, 255]));
        assert_eq!(to_grayscale(&img), vec![255; 4]);
    }
}
