use crate::cli::PdfQuality;
use crate::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// セッションファイルの環境変数
pub const SESSION_ENV: &str = "INSPECTION_REPORT_SESSION";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 参照CSVのディレクトリ
    pub reference_dir: PathBuf,
    /// PDFの出力先
    pub output_dir: PathBuf,
    pub pdf_quality: PdfQuality,
    pub company_name: String,
    pub copyright: String,
    pub logo_path: Option<PathBuf>,
    pub session_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    fn config_dir() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ReportError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("inspection-report"))
    }

    fn default_config() -> Self {
        let base = Self::config_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            reference_dir: base.join("config"),
            output_dir: PathBuf::from("."),
            pdf_quality: PdfQuality::Medium,
            company_name: "Joint and Welding Ingenieros S.A.S.".into(),
            copyright: "© Joint and Welding Ingenieros S.A.S. 2024 - Versión 7.0".into(),
            logo_path: None,
            session_path: base.join("session.json"),
        }
    }

    /// セッションファイル（環境変数を優先）
    pub fn session_path(&self) -> PathBuf {
        match std::env::var(SESSION_ENV) {
            Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
            _ => self.session_path.clone(),
        }
    }
}
