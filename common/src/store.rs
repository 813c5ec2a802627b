//! セッションストア
//!
//! ブロック名をキーとするJSONマップ。ブロックは丸ごと上書きされ、
//! 部分的な状態は持たない。

use crate::error::{Error, Result};
use crate::types::{InspectionMethod, LegacyProjectData, PhotoAttachment, ProjectHeader};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

pub const PROJECT_BLOCK: &str = "bloque_1";
pub const LEGACY_PROJECT_BLOCK: &str = "datos_proyecto";
pub const SCHEME_BLOCK: &str = "esquema_elementos_global";
const LEGACY_VISUAL_BLOCK: &str = "datos_inspeccion_visual";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionStore {
    blocks: BTreeMap<String, Value>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// ファイルから読み込む（存在しなければ空）
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("session file not found, starting empty: {}", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let mut store: SessionStore = serde_json::from_str(&content)?;
        store.migrate_legacy_keys();
        Ok(store)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(&self.blocks)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// ブロックを丸ごと書き込む
    pub fn put_block<T: Serialize>(&mut self, key: &str, block: &T) -> Result<()> {
        let value = serde_json::to_value(block)?;
        self.blocks.insert(key.to_string(), value);
        Ok(())
    }

    pub fn block<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.blocks.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// 既存ブロックを取得（なければ既定値）
    pub fn block_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        Ok(self.block(key)?.unwrap_or_default())
    }

    pub fn raw_block(&self, key: &str) -> Option<&Value> {
        self.blocks.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.blocks.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.blocks.remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(|k| k.as_str())
    }

    /// プロジェクト情報（旧キーが優先、なければ既定値）
    pub fn project_header(&self) -> Result<ProjectHeader> {
        if let Some(legacy) = self.block::<LegacyProjectData>(LEGACY_PROJECT_BLOCK)? {
            return Ok(legacy.into());
        }
        Ok(self.block::<ProjectHeader>(PROJECT_BLOCK)?.unwrap_or_default())
    }

    /// プロジェクト情報を保存（モジュール未選択はエラー）
    ///
    /// 旧キーが残っているセッションでは旧キーも書き換える。
    /// 読み込みは旧キー優先なので、片方だけでは編集が消える。
    pub fn save_project_header(&mut self, header: &ProjectHeader) -> Result<()> {
        if header.selected_modules.is_empty() {
            return Err(Error::NoModulesSelected);
        }
        if self.contains(LEGACY_PROJECT_BLOCK) {
            self.put_block(LEGACY_PROJECT_BLOCK, &LegacyProjectData::from(header))?;
        }
        self.put_block(PROJECT_BLOCK, header)
    }

    /// 全検査方法で共有する要素配置図
    pub fn scheme(&self) -> Result<Vec<PhotoAttachment>> {
        self.block_or_default(SCHEME_BLOCK)
    }

    pub fn put_scheme(&mut self, images: &[PhotoAttachment]) -> Result<()> {
        self.put_block(SCHEME_BLOCK, &images)
    }

    /// データが存在する検査方法
    pub fn available_methods(&self) -> Vec<InspectionMethod> {
        InspectionMethod::ALL
            .into_iter()
            .filter(|m| self.contains(m.block_key()))
            .collect()
    }

    /// 旧形式の外観検査キーを bloque_2_1 に統合する
    fn migrate_legacy_keys(&mut self) {
        let visual_key = InspectionMethod::Visual.block_key();
        if let Some(legacy) = self.blocks.remove(LEGACY_VISUAL_BLOCK) {
            if self.blocks.contains_key(visual_key) {
                log::info!("dropping duplicated legacy key {}", LEGACY_VISUAL_BLOCK);
            } else {
                log::info!("migrating {} to {}", LEGACY_VISUAL_BLOCK, visual_key);
                self.blocks.insert(visual_key.to_string(), legacy);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VisualBlock;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = SessionStore::load(&dir.path().join("none.json")).unwrap();
        assert_eq!(store.keys().count(), 0);
    }

    #[test]
    fn test_put_block_overwrites_wholesale() {
        let mut store = SessionStore::new();
        store
            .put_block("bloque_3_1", &json!({"norma": "ASME V", "detalle_resultados": "ok"}))
            .unwrap();
        store.put_block("bloque_3_1", &json!({"norma": "AWS D1.5"})).unwrap();

        let value = store.raw_block("bloque_3_1").unwrap();
        assert_eq!(value["norma"], "AWS D1.5");
        assert!(value.get("detalle_resultados").is_none(), "古いフィールドが残っている");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut store = SessionStore::new();
        store.put_block("bloque_2_1", &VisualBlock::default()).unwrap();
        store.save(&path).unwrap();

        let loaded = SessionStore::load(&path).unwrap();
        assert!(loaded.contains("bloque_2_1"));
        let block: VisualBlock = loaded.block("bloque_2_1").unwrap().unwrap();
        assert_eq!(block.phases.len(), 17);
    }

    #[test]
    fn test_legacy_project_takes_precedence() {
        let mut store = SessionStore::new();
        store.put_block(PROJECT_BLOCK, &json!({"cliente": "Nuevo"})).unwrap();
        store
            .put_block(LEGACY_PROJECT_BLOCK, &json!({"cliente": "Antiguo"}))
            .unwrap();
        assert_eq!(store.project_header().unwrap().client, "Antiguo");

        store.remove(LEGACY_PROJECT_BLOCK);
        assert_eq!(store.project_header().unwrap().client, "Nuevo");
    }

    #[test]
    fn test_save_project_header_updates_legacy_block() {
        let mut store = SessionStore::new();
        store
            .put_block(LEGACY_PROJECT_BLOCK, &json!({"cliente": "Antiguo", "ubicacion": "Cali"}))
            .unwrap();

        let mut header = store.project_header().unwrap();
        header.client = "Nuevo".into();
        header.selected_modules = vec![InspectionMethod::Ultrasound];
        store.save_project_header(&header).unwrap();

        let loaded = store.project_header().unwrap();
        assert_eq!(loaded.client, "Nuevo");
        assert_eq!(loaded.place, "Cali");
        assert_eq!(loaded.selected_modules, vec![InspectionMethod::Ultrasound]);
        assert_eq!(store.raw_block(LEGACY_PROJECT_BLOCK).unwrap()["cliente"], "Nuevo");
    }

    #[test]
    fn test_save_project_header_without_legacy_block() {
        let mut store = SessionStore::new();
        store.save_project_header(&ProjectHeader::default()).unwrap();
        assert!(store.contains(PROJECT_BLOCK));
        assert!(!store.contains(LEGACY_PROJECT_BLOCK));
    }

    #[test]
    fn test_project_header_defaults() {
        let store = SessionStore::new();
        let header = store.project_header().unwrap();
        assert_eq!(header.client, "Cliente");
        assert_eq!(header.place, "Lugar");
    }

    #[test]
    fn test_save_project_header_requires_module() {
        let mut store = SessionStore::new();
        let header = ProjectHeader {
            selected_modules: vec![],
            ..Default::default()
        };
        assert!(matches!(
            store.save_project_header(&header),
            Err(Error::NoModulesSelected)
        ));
        assert!(!store.contains(PROJECT_BLOCK));
    }

    #[test]
    fn test_available_methods() {
        let mut store = SessionStore::new();
        store.put_block("bloque_5_1", &json!({})).unwrap();
        store.put_block("bloque_2_1", &json!({})).unwrap();
        assert_eq!(
            store.available_methods(),
            vec![InspectionMethod::Visual, InspectionMethod::Ultrasound]
        );
    }

    #[test]
    fn test_legacy_visual_key_migrated_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"datos_inspeccion_visual": {"norma": "AWS D1.1 2015"}}"#).unwrap();

        let store = SessionStore::load(&path).unwrap();
        assert!(!store.contains("datos_inspeccion_visual"));
        assert_eq!(store.raw_block("bloque_2_1").unwrap()["norma"], "AWS D1.1 2015");
    }
}
