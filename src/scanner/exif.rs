use chrono::NaiveDateTime;
use inspection_report_common::types::format_report_date;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn extract_date(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut bufreader = BufReader::new(file);
    let exif_reader = exif::Reader::new();
    let exif = exif_reader.read_from_container(&mut bufreader)?;

    // DateTimeOriginal を優先
    for tag in [exif::Tag::DateTimeOriginal, exif::Tag::DateTime] {
        if let Some(field) = exif.get_field(tag, exif::In::PRIMARY) {
            return Ok(field.display_value().to_string());
        }
    }

    Err("No date found in EXIF".into())
}

/// EXIF日時を報告書形式 "DD/MMM/YYYY HH:MM" に変換
pub fn format_exif_date(raw: &str) -> Option<String> {
    let raw = raw.trim();
    ["%Y-%m-%d %H:%M:%S", "%Y:%m:%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| format!("{} {}", format_report_date(dt.date()), dt.format("%H:%M")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_exif_date() {
        assert_eq!(
            format_exif_date("2024-06-05 10:22:31").as_deref(),
            Some("05/JUN/2024 10:22")
        );
        assert_eq!(
            format_exif_date("2023:01:17 08:05:00").as_deref(),
            Some("17/ENE/2023 08:05")
        );
        assert!(format_exif_date("unknown").is_none());
    }

    #[test]
    fn test_extract_date_from_non_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dummy.jpg");
        std::fs::write(&path, b"dummy").unwrap();
        assert!(extract_date(&path).is_err());
    }
}
