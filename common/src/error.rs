//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("No data for block: {0}")]
    MissingBlock(String),

    #[error("At least one inspection module must be selected")]
    NoModulesSelected,

    #[error("Element not found: {0}")]
    ElementNotFound(usize),

    #[error("Photo not found: {0}")]
    PhotoNotFound(usize),
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = Error::Io(io_error);
        let display = format!("{}", error);
        assert!(display.contains("IO error"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn test_error_display_missing_block() {
        let error = Error::MissingBlock("bloque_3_1".to_string());
        assert_eq!(format!("{}", error), "No data for block: bloque_3_1");
    }

    #[test]
    fn test_error_display_element_not_found() {
        let display = format!("{}", Error::ElementNotFound(7));
        assert_eq!(display, "Element not found: 7");
    }

    #[test]
    fn test_error_from_json() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
    }
}
