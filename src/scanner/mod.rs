//! 写真ファイルの収集
//!
//! フォルダ直下の画像をファイル名順に集め、写真記録（PhotoAttachment）に変換する。
//! 同じ内容の画像はSHA-256で判定して追加しない。

mod exif;

use crate::error::{ReportError, Result};
use inspection_report_common::PhotoAttachment;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub use exif::format_exif_date;

#[derive(Debug, Clone)]
pub struct ImageInfo {
    pub path: PathBuf,
    pub file_name: String,
    pub date: Option<String>,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "JPG", "JPEG", "PNG"];

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| IMAGE_EXTENSIONS.iter().any(|&e| e == ext.to_string_lossy()))
        .unwrap_or(false)
}

fn image_info(path: &Path) -> ImageInfo {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let date = exif::extract_date(path)
        .ok()
        .and_then(|raw| format_exif_date(&raw));
    ImageInfo {
        path: path.to_path_buf(),
        file_name,
        date,
    }
}

pub fn scan_folder(folder: &Path) -> Result<Vec<ImageInfo>> {
    if !folder.exists() {
        return Err(ReportError::FolderNotFound(folder.display().to_string()));
    }

    let mut images: Vec<ImageInfo> = WalkDir::new(folder)
        .max_depth(1) // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file() && is_image_path(e.path()))
        .map(|e| image_info(e.path()))
        .collect();

    // ファイル名でソート
    images.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    Ok(images)
}

/// ファイルとフォルダの混在指定から画像を集める
pub fn collect_images(paths: &[PathBuf]) -> Result<Vec<ImageInfo>> {
    let mut images = Vec::new();
    for path in paths {
        if path.is_dir() {
            images.extend(scan_folder(path)?);
        } else if path.is_file() {
            if !is_image_path(path) {
                log::warn!("skipping non-image file: {}", path.display());
                continue;
            }
            images.push(image_info(path));
        } else {
            return Err(ReportError::FileNotFound(path.display().to_string()));
        }
    }
    Ok(images)
}

/// 画像内容のSHA-256（16進）
pub fn fingerprint(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// 画像を読み込んで写真記録にする（既存と同じ内容はスキップ）
///
/// 戻り値は (追加分, スキップしたファイル名)。
pub fn load_attachments(
    images: &[ImageInfo],
    caption: Option<&str>,
    existing: &[PhotoAttachment],
) -> Result<(Vec<PhotoAttachment>, Vec<String>)> {
    let mut seen: HashSet<String> = existing
        .iter()
        .filter_map(|p| p.data.as_deref())
        .map(fingerprint)
        .collect();

    let mut added = Vec::new();
    let mut skipped = Vec::new();
    for image in images {
        let data = std::fs::read(&image.path)?;
        if !seen.insert(fingerprint(&data)) {
            log::info!("duplicate photo skipped: {}", image.file_name);
            skipped.push(image.file_name.clone());
            continue;
        }
        let caption = caption
            .map(String::from)
            .or_else(|| image.date.as_ref().map(|d| format!("Fecha: {}", d)))
            .unwrap_or_default();
        added.push(PhotoAttachment::new(image.file_name.clone(), caption, data));
    }
    Ok((added, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_is_image_path() {
        assert!(is_image_path(Path::new("a.jpg")));
        assert!(is_image_path(Path::new("a.JPEG")));
        assert!(is_image_path(Path::new("a.png")));
        assert!(!is_image_path(Path::new("a.txt")));
        assert!(!is_image_path(Path::new("a.gif")));
        assert!(!is_image_path(Path::new("noext")));
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"));
        assert!(matches!(result, Err(ReportError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["c.jpg", "a.png", "b.JPG", "notes.txt"] {
            File::create(dir.path().join(name)).unwrap().write_all(name.as_bytes()).unwrap();
        }
        fs::create_dir(dir.path().join("sub")).unwrap();
        File::create(dir.path().join("sub").join("d.jpg")).unwrap();

        let result = scan_folder(dir.path()).unwrap();
        let names: Vec<&str> = result.iter().map(|i| i.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.JPG", "c.jpg"]);
    }

    #[test]
    fn test_collect_images_missing_file() {
        let result = collect_images(&[PathBuf::from("/nonexistent/photo.jpg")]);
        assert!(matches!(result, Err(ReportError::FileNotFound(_))));
    }

    #[test]
    fn test_load_attachments_skips_duplicates() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.jpg"), b"same-bytes").unwrap();
        fs::write(dir.path().join("b.jpg"), b"same-bytes").unwrap();
        fs::write(dir.path().join("c.jpg"), b"other-bytes").unwrap();

        let images = scan_folder(dir.path()).unwrap();
        let existing = vec![PhotoAttachment::new("old.jpg", "", b"other-bytes".to_vec())];
        let (added, skipped) = load_attachments(&images, Some("Junta J-01"), &existing).unwrap();

        assert_eq!(added.len(), 1);
        assert_eq!(added[0].name, "a.jpg");
        assert_eq!(added[0].caption, "Junta J-01");
        assert_eq!(skipped, vec!["b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let digest = fingerprint(b"abc");
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
