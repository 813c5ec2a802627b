//! 報告書データ抽出
//!
//! ストアのブロックを読み、検査方法ごとに ReportData へ正規化する。

mod magnetic;
mod penetrant;
mod ultrasound;
mod visual;

pub use magnetic::MagneticExtractor;
pub use penetrant::PenetrantExtractor;
pub use ultrasound::UltrasoundExtractor;
pub use visual::VisualExtractor;

use crate::elements::{ElementList, InspectedElement};
use crate::error::{Error, Result};
use crate::report::{Column, Section};
use crate::store::SessionStore;
use crate::types::{
    BlockCommon, InspectionMethod, ProjectHeader, Qualification, DEFAULT_NORM, NOT_SPECIFIED,
};
use serde::de::DeserializeOwned;

pub const NO_ELEMENTS_MESSAGE: &str = "No hay elementos inspeccionados registrados.";
pub const NO_DETAILS_FALLBACK: &str = "Sin detalles específicos";
pub const NO_OBSERVATIONS_FALLBACK: &str = "Sin observaciones";
pub const SCHEME_TITLE: &str = "ESQUEMA DE ELEMENTOS INSPECCIONADOS";

pub use crate::report::ReportData;

/// 検査方法ごとの抽出器
pub trait ReportExtractor {
    fn method(&self) -> InspectionMethod;

    /// ブロックが保存済みか
    fn is_available(&self, store: &SessionStore) -> bool {
        store.contains(self.method().block_key())
    }

    fn extract(&self, store: &SessionStore) -> Result<ReportData>;
}

/// 検査方法に対応する抽出器
pub fn extractor_for(method: InspectionMethod) -> Box<dyn ReportExtractor> {
    match method {
        InspectionMethod::Visual => Box::new(VisualExtractor),
        InspectionMethod::Penetrant => Box::new(PenetrantExtractor),
        InspectionMethod::MagneticParticle => Box::new(MagneticExtractor),
        InspectionMethod::Ultrasound => Box::new(UltrasoundExtractor),
    }
}

/// ブロックを読み込む（未保存ならエラー）
pub(crate) fn load_block<T: DeserializeOwned>(
    store: &SessionStore,
    method: InspectionMethod,
) -> Result<T> {
    let key = method.block_key();
    store
        .block(key)?
        .ok_or_else(|| Error::MissingBlock(key.to_string()))
}

/// 既定値を適用した共通項目の表示文字列
#[derive(Debug, Clone)]
pub(crate) struct CommonText {
    pub procedure: String,
    pub norm: String,
    pub equipment: String,
    pub base_material: String,
    pub welding_processes: String,
    pub welding_types: String,
}

impl CommonText {
    pub fn new(common: &BlockCommon, method: InspectionMethod, header: &ProjectHeader) -> Self {
        let non_blank = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from);
        let norm = non_blank(&common.norm)
            .or_else(|| Some(header.global_norm.trim().to_string()).filter(|s| !s.is_empty()))
            .unwrap_or_else(|| DEFAULT_NORM.to_string());

        Self {
            procedure: non_blank(&common.procedure)
                .unwrap_or_else(|| method.default_procedure().to_string()),
            norm,
            equipment: common
                .equipment
                .describe()
                .unwrap_or_else(|| method.default_equipment().to_string()),
            base_material: common.base_materials.joined_or(NOT_SPECIFIED),
            welding_processes: common.welding_processes.joined_or(NOT_SPECIFIED),
            welding_types: common.welding_types.joined_or(NOT_SPECIFIED),
        }
    }
}

pub(crate) fn text_box(title: String, lines: Vec<String>) -> Section {
    Section::TextBox { title, lines }
}

/// 空文字なら代替文を使う本文
pub(crate) fn text_or(text: &str, fallback: &str) -> Vec<String> {
    if text.trim().is_empty() {
        vec![fallback.to_string()]
    } else {
        text.lines().map(String::from).collect()
    }
}

pub(crate) fn element_columns() -> Vec<Column> {
    vec![
        Column::new("No.", 12.0),
        Column::new("Descripción del Elemento", 55.0),
        Column::new("Indicación", 38.0),
        Column::new("Calificación", 34.0),
        Column::new("Observación", 46.9),
    ]
}

/// 検査要素の表（判定は方法の選択肢に正規化）
pub(crate) fn elements_table(
    title: String,
    elements: &ElementList<InspectedElement>,
    method: InspectionMethod,
) -> Section {
    let rows = elements
        .iter()
        .map(|e| {
            vec![
                e.number.to_string(),
                e.description.clone(),
                e.indication.clone(),
                Qualification::parse_for(method, &e.qualification).label().to_string(),
                e.observation.clone(),
            ]
        })
        .collect();
    Section::Table {
        title,
        columns: element_columns(),
        rows,
        empty_message: NO_ELEMENTS_MESSAGE.to_string(),
    }
}
