//! 検査データの型定義
//!
//! フォームが保存するブロックのスナップショット:
//! - ProjectHeader: プロジェクト情報（bloque_1）
//! - VisualBlock / PenetrantBlock / MagneticBlock / UltrasoundBlock: 検査方法ごとのブロック
//!
//! JSONのキーは入力フォームと同じスペイン語名を使う。

use crate::elements::{ElementList, InspectedElement, UltrasoundJoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const MONTHS_ES: [&str; 12] = [
    "ENE", "FEB", "MAR", "ABR", "MAY", "JUN", "JUL", "AGO", "SEP", "OCT", "NOV", "DIC",
];

/// 日付を "DD/MMM/YYYY"（スペイン語月略称）に変換
pub fn format_report_date(date: chrono::NaiveDate) -> String {
    use chrono::Datelike;
    format!(
        "{:02}/{}/{}",
        date.day(),
        MONTHS_ES[date.month0() as usize],
        date.year()
    )
}

/// 今日の日付（報告書形式）
pub fn today_report_date() -> String {
    format_report_date(chrono::Local::now().date_naive())
}

// ============================================
// 検査方法
// ============================================

/// 検査方法（モジュール）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InspectionMethod {
    #[serde(rename = "Inspección Visual")]
    Visual,
    #[serde(rename = "Líquidos Penetrantes")]
    Penetrant,
    #[serde(rename = "Partículas Magnéticas")]
    MagneticParticle,
    #[serde(rename = "Ultrasonido")]
    Ultrasound,
}

impl InspectionMethod {
    pub const ALL: [InspectionMethod; 4] = [
        InspectionMethod::Visual,
        InspectionMethod::Penetrant,
        InspectionMethod::MagneticParticle,
        InspectionMethod::Ultrasound,
    ];

    /// 手順コード対応の略号 (VT/PT/MT/UT)
    pub fn code(&self) -> &'static str {
        match self {
            InspectionMethod::Visual => "VT",
            InspectionMethod::Penetrant => "PT",
            InspectionMethod::MagneticParticle => "MT",
            InspectionMethod::Ultrasound => "UT",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code().eq_ignore_ascii_case(code))
    }

    /// ストア上のブロックキー
    pub fn block_key(&self) -> &'static str {
        match self {
            InspectionMethod::Visual => "bloque_2_1",
            InspectionMethod::Penetrant => "bloque_3_1",
            InspectionMethod::MagneticParticle => "bloque_4_1",
            InspectionMethod::Ultrasound => "bloque_5_1",
        }
    }

    /// 表示名
    pub fn display_name(&self) -> &'static str {
        match self {
            InspectionMethod::Visual => "Inspección Visual",
            InspectionMethod::Penetrant => "Líquidos Penetrantes",
            InspectionMethod::MagneticParticle => "Partículas Magnéticas",
            InspectionMethod::Ultrasound => "Ultrasonido",
        }
    }

    /// 出力ファイル名に使う識別子
    pub fn file_slug(&self) -> &'static str {
        match self {
            InspectionMethod::Visual => "VISUAL",
            InspectionMethod::Penetrant => "LIQUIDOS_PENETRANTES",
            InspectionMethod::MagneticParticle => "PARTICULAS_MAGNETICAS",
            InspectionMethod::Ultrasound => "ULTRASONIDO",
        }
    }

    /// 既定の手順
    pub fn default_procedure(&self) -> &'static str {
        match self {
            InspectionMethod::Visual => "TLPR0025 - Inspección Visual - Rev. 1",
            InspectionMethod::Penetrant => "TLPR0026 - Inspección de Líquidos Penetrantes - Rev. 1",
            InspectionMethod::MagneticParticle => {
                "TLPR0027 - Inspección de Partículas Magnéticas - Rev. 1"
            }
            InspectionMethod::Ultrasound => "TLPR0028 - Inspección de Ultrasonido - Rev. 1",
        }
    }

    /// 既定の使用機材
    pub fn default_equipment(&self) -> &'static str {
        match self {
            InspectionMethod::Visual => "No especificado",
            InspectionMethod::Penetrant => "Kit de Líquidos Penetrantes",
            InspectionMethod::MagneticParticle => "Kit de Partículas Magnéticas",
            InspectionMethod::Ultrasound => "Equipo de Ultrasonido",
        }
    }
}

impl fmt::Display for InspectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for InspectionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "visual" | "vt" => Ok(InspectionMethod::Visual),
            "penetrant" | "pt" | "liquidos_penetrantes" => Ok(InspectionMethod::Penetrant),
            "magnetic" | "mt" | "particulas_magneticas" => Ok(InspectionMethod::MagneticParticle),
            "ultrasound" | "ut" | "ultrasonido" => Ok(InspectionMethod::Ultrasound),
            _ => Err(format!(
                "Unknown method: {}. Use visual, penetrant, magnetic, or ultrasound",
                s
            )),
        }
    }
}

// ============================================
// 判定（Qualification）
// ============================================

/// 検査要素の判定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualification {
    Conforming,
    NonConforming,
    Reinspect,
    ConformingAfterRepair,
    Satisfactory,
    NotSatisfactory,
    OutOfScope,
}

const VISUAL_QUALIFICATIONS: &[Qualification] = &[
    Qualification::Conforming,
    Qualification::NonConforming,
    Qualification::Reinspect,
    Qualification::ConformingAfterRepair,
];

const NDT_QUALIFICATIONS: &[Qualification] = &[
    Qualification::Satisfactory,
    Qualification::NotSatisfactory,
    Qualification::OutOfScope,
];

impl Qualification {
    pub fn label(&self) -> &'static str {
        match self {
            Qualification::Conforming => "(C) Conforme",
            Qualification::NonConforming => "(NC) No conforme",
            Qualification::Reinspect => "(RI) Reinspeccionar",
            Qualification::ConformingAfterRepair => "(C(R)) Conforme después de reparación",
            Qualification::Satisfactory => "Satisfactorio",
            Qualification::NotSatisfactory => "No Satisfactorio",
            Qualification::OutOfScope => "Fuera de Alcance",
        }
    }

    /// 検査方法ごとの選択肢（先頭が既定値）
    pub fn options_for(method: InspectionMethod) -> &'static [Qualification] {
        match method {
            InspectionMethod::Visual => VISUAL_QUALIFICATIONS,
            _ => NDT_QUALIFICATIONS,
        }
    }

    pub fn default_for(method: InspectionMethod) -> Self {
        Self::options_for(method)[0]
    }

    /// ラベルから判定を取得（未知のラベルは既定値）
    pub fn parse_for(method: InspectionMethod, label: &str) -> Self {
        let label = label.trim();
        Self::options_for(method)
            .iter()
            .copied()
            .find(|q| q.label().eq_ignore_ascii_case(label))
            .unwrap_or_else(|| Self::default_for(method))
    }

    /// 厳密な解析（CLI入力の検証用）
    pub fn try_parse_for(method: InspectionMethod, label: &str) -> Option<Self> {
        let label = label.trim();
        Self::options_for(method)
            .iter()
            .copied()
            .find(|q| q.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Qualification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================
// プロジェクト情報
// ============================================

/// 署名欄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Signatures {
    #[serde(rename = "firma_1")]
    pub inspector: String,
    #[serde(rename = "firma_2")]
    pub reviewer: String,
    #[serde(rename = "firma_3")]
    pub client: String,
}

impl Default for Signatures {
    fn default() -> Self {
        Self {
            inspector: "Firma del inspector que realiza la inspección y el informe".into(),
            reviewer: "Revisa el informe".into(),
            client: "Cliente".into(),
        }
    }
}

/// プロジェクト情報（bloque_1）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectHeader {
    #[serde(rename = "cliente")]
    pub client: String,
    #[serde(rename = "proyecto")]
    pub project: String,
    #[serde(rename = "subproyecto")]
    pub sub_project: String,
    #[serde(rename = "contratista")]
    pub contractor: String,
    #[serde(rename = "reporte_no")]
    pub report_number: String,
    #[serde(rename = "elaboro")]
    pub prepared_by: String,
    #[serde(rename = "norma_global")]
    pub global_norm: String,
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "lugar")]
    pub place: String,
    #[serde(rename = "firmas")]
    pub signatures: Signatures,
    #[serde(rename = "modulos_seleccionados")]
    pub selected_modules: Vec<InspectionMethod>,
}

impl Default for ProjectHeader {
    fn default() -> Self {
        Self {
            client: "Cliente".into(),
            project: "Proyecto".into(),
            sub_project: "Subproyecto".into(),
            contractor: "Contratista".into(),
            report_number: "T1234I1005".into(),
            prepared_by: "Ing. Andrés López".into(),
            global_norm: DEFAULT_NORM.into(),
            date: today_report_date(),
            place: "Lugar".into(),
            signatures: Signatures::default(),
            selected_modules: vec![InspectionMethod::Visual, InspectionMethod::Penetrant],
        }
    }
}

/// 旧形式のプロジェクト情報（datos_proyecto）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyProjectData {
    pub numero_informe: Option<String>,
    pub fecha: Option<String>,
    pub cliente: Option<String>,
    pub proyecto: Option<String>,
    pub ubicacion: Option<String>,
    pub inspector: Option<String>,
    pub contratista: Option<String>,
    pub subproyecto: Option<String>,
    pub norma_global: Option<String>,
    pub firmas: Option<Signatures>,
    pub modulos_seleccionados: Option<Vec<InspectionMethod>>,
}

impl From<LegacyProjectData> for ProjectHeader {
    fn from(legacy: LegacyProjectData) -> Self {
        let defaults = ProjectHeader::default();
        Self {
            client: legacy.cliente.unwrap_or(defaults.client),
            project: legacy.proyecto.unwrap_or(defaults.project),
            sub_project: legacy.subproyecto.unwrap_or(defaults.sub_project),
            contractor: legacy.contratista.unwrap_or(defaults.contractor),
            report_number: legacy.numero_informe.unwrap_or(defaults.report_number),
            prepared_by: legacy.inspector.unwrap_or(defaults.prepared_by),
            global_norm: legacy.norma_global.unwrap_or(defaults.global_norm),
            date: legacy.fecha.unwrap_or(defaults.date),
            place: legacy.ubicacion.unwrap_or(defaults.place),
            signatures: legacy.firmas.unwrap_or(defaults.signatures),
            selected_modules: legacy.modulos_seleccionados.unwrap_or(defaults.selected_modules),
        }
    }
}

/// 保存時に旧キーにも同じ内容を書く
impl From<&ProjectHeader> for LegacyProjectData {
    fn from(header: &ProjectHeader) -> Self {
        Self {
            numero_informe: Some(header.report_number.clone()),
            fecha: Some(header.date.clone()),
            cliente: Some(header.client.clone()),
            proyecto: Some(header.project.clone()),
            ubicacion: Some(header.place.clone()),
            inspector: Some(header.prepared_by.clone()),
            contratista: Some(header.contractor.clone()),
            subproyecto: Some(header.sub_project.clone()),
            norma_global: Some(header.global_norm.clone()),
            firmas: Some(header.signatures.clone()),
            modulos_seleccionados: Some(header.selected_modules.clone()),
        }
    }
}

pub const DEFAULT_NORM: &str = "AWS D1.1 2020";
pub const NOT_SPECIFIED: &str = "No especificado";

// ============================================
// ブロック共通フィールド
// ============================================

/// 文字列またはリスト（フォームによって保存形式が異なる）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextOrList {
    List(Vec<String>),
    Text(String),
}

impl Default for TextOrList {
    fn default() -> Self {
        TextOrList::List(Vec::new())
    }
}

impl TextOrList {
    /// ", " 区切りで連結（空ならNone）
    pub fn joined(&self) -> Option<String> {
        let text = match self {
            TextOrList::List(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            TextOrList::Text(text) => text.trim().to_string(),
        };
        if text.is_empty() { None } else { Some(text) }
    }

    pub fn joined_or(&self, fallback: &str) -> String {
        self.joined().unwrap_or_else(|| fallback.to_string())
    }
}

impl From<Vec<String>> for TextOrList {
    fn from(items: Vec<String>) -> Self {
        TextOrList::List(items)
    }
}

/// 使用機材（キット選択または自由記述）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Equipment {
    Kit {
        kit_seleccionado: String,
        #[serde(default)]
        componentes: Vec<String>,
    },
    Text(String),
}

impl Default for Equipment {
    fn default() -> Self {
        Equipment::Text(String::new())
    }
}

impl Equipment {
    /// "キット名 - 構成品, 構成品"（空ならNone）
    pub fn describe(&self) -> Option<String> {
        match self {
            Equipment::Kit { kit_seleccionado, componentes } => {
                if kit_seleccionado.trim().is_empty() {
                    None
                } else if componentes.is_empty() {
                    Some(kit_seleccionado.clone())
                } else {
                    Some(format!("{} - {}", kit_seleccionado, componentes.join(", ")))
                }
            }
            Equipment::Text(text) if text.trim().is_empty() => None,
            Equipment::Text(text) => Some(text.clone()),
        }
    }
}

/// 写真添付（画像バイナリ + キャプション）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotoAttachment {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "comentario")]
    pub caption: String,
    #[serde(rename = "archivo", with = "base64_bytes", skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<u8>>,
}

impl PhotoAttachment {
    pub fn new(name: impl Into<String>, caption: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            caption: caption.into(),
            data: Some(data),
        }
    }
}

/// 全ブロック共通のフィールド
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockCommon {
    #[serde(rename = "norma")]
    pub norm: Option<String>,
    #[serde(rename = "procedimiento")]
    pub procedure: Option<String>,
    #[serde(rename = "equipos", alias = "equipos_utilizados", alias = "equipo")]
    pub equipment: Equipment,
    #[serde(rename = "materiales_base", alias = "material_base", alias = "especificacion")]
    pub base_materials: TextOrList,
    #[serde(rename = "procesos_soldadura", alias = "proceso_soldadura", alias = "proceso")]
    pub welding_processes: TextOrList,
    #[serde(rename = "tipos_soldadura")]
    pub welding_types: TextOrList,
    #[serde(rename = "detalle_resultados")]
    pub detail_results: String,
    #[serde(rename = "observaciones_generales")]
    pub general_observations: String,
    #[serde(rename = "registros_fotograficos")]
    pub photos: Vec<PhotoAttachment>,
}

// ============================================
// 外観検査（VT）
// ============================================

pub const PHASE_BEFORE_WELDING: &str = "ANTES DE INICIAR EL PROCESO DE SOLDADURA";
pub const PHASE_JOINT_START: &str = "Inicio de la soldadura";
pub const PHASE_AFTER_WELDING: &str = "DESPUÉS DE LA SOLDADURA";

pub const APPLIES: &str = "Aplica";
pub const APPLICABILITY_OPTIONS: [&str; 3] = ["Aplica", "No Aplica", "Fuera de Alcance"];
pub const RESULT_OPTIONS: [&str; 2] = ["Satisfactorio", "No satisfactorio"];

const DEFAULT_PHASES: &[(&str, &[&str])] = &[
    (
        PHASE_BEFORE_WELDING,
        &[
            "Chequear la calificación del personal",
            "Chequear el tipo del material base y el de aporte",
            "Chequear si hay algún tipo discontinuidad en el metal base",
            "Chequear el alineamiento de la junta de soldadura",
            "Chequear condiciones de precalentamiento",
        ],
    ),
    (
        PHASE_JOINT_START,
        &[
            "Ángulo de chaflán",
            "Hombro de raíz",
            "Alineamiento de la junta",
            "Respaldo con soldadura o platina",
            "Limpieza de la junta",
            "Puntos de soldadura (si se punteo)",
            "Precalentamiento",
        ],
    ),
    (
        PHASE_AFTER_WELDING,
        &[
            "Apariencia final de la soldadura",
            "Tamaño final de la soldadura",
            "Longitud de la soldadura",
            "Cantidad de distorsión (en la pieza)",
            "Tratamiento Térmico después de la soldadura",
        ],
    ),
];

/// 検査フェーズのチェック項目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseCheck {
    #[serde(rename = "fase")]
    pub phase: String,
    pub item: String,
    #[serde(rename = "aplica")]
    pub applies: String,
    #[serde(rename = "resultado")]
    pub result: String,
    #[serde(rename = "observacion")]
    pub observation: String,
}

impl Default for PhaseCheck {
    fn default() -> Self {
        Self {
            phase: String::new(),
            item: String::new(),
            applies: APPLIES.into(),
            result: RESULT_OPTIONS[0].into(),
            observation: String::new(),
        }
    }
}

impl PhaseCheck {
    /// 適用外なら結果は適用区分と同じ値になる
    pub fn effective_result(&self) -> &str {
        if self.applies == APPLIES {
            &self.result
        } else {
            &self.applies
        }
    }
}

/// 既定のフェーズ項目一覧
pub fn default_phase_checks() -> Vec<PhaseCheck> {
    DEFAULT_PHASES
        .iter()
        .flat_map(|(phase, items)| {
            items.iter().map(move |item| PhaseCheck {
                phase: (*phase).to_string(),
                item: (*item).to_string(),
                ..Default::default()
            })
        })
        .collect()
}

/// 外観検査ブロック（bloque_2_1）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(rename = "fases_inspeccion")]
    pub phases: Vec<PhaseCheck>,
    #[serde(rename = "elementos_inspeccionados")]
    pub elements: ElementList<InspectedElement>,
}

impl Default for VisualBlock {
    fn default() -> Self {
        Self {
            common: BlockCommon::default(),
            phases: default_phase_checks(),
            elements: ElementList::default(),
        }
    }
}

// ============================================
// 浸透探傷（PT）/ 磁粉探傷（MT）
// ============================================

/// 使用材料（製造者・商品名・ロット）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialUsed {
    #[serde(rename = "fabricante")]
    pub manufacturer: String,
    #[serde(rename = "referencia")]
    pub reference: String,
    #[serde(rename = "lote")]
    pub lot: String,
}

impl MaterialUsed {
    fn new(manufacturer: &str, reference: &str, lot: &str) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            reference: reference.into(),
            lot: lot.into(),
        }
    }
}

pub const PENETRANT_MATERIAL_ORDER: [&str; 4] =
    ["PENETRANTE", "EMULSIFICANTE", "LIMPIADOR", "REVELADOR"];
pub const MAGNETIC_MATERIAL_ORDER: [&str; 2] = ["PARTICULAS MAGNETICAS", "PINTURA DE CONTRASTE"];

/// 浸透探傷の既定材料
pub fn default_penetrant_materials() -> BTreeMap<String, MaterialUsed> {
    BTreeMap::from([
        ("PENETRANTE".to_string(), MaterialUsed::new("Met-L-Company", "Met-L-Chek VP-30", "")),
        ("EMULSIFICANTE".to_string(), MaterialUsed::new("N.A.", "N.A.", "N.A.")),
        ("LIMPIADOR".to_string(), MaterialUsed::new("Met-L-Company", "Met-L-Chek E-59A", "")),
        ("REVELADOR".to_string(), MaterialUsed::new("Met-L-Company", "Met-L-Chek D-70", "")),
    ])
}

/// 磁粉探傷の既定材料
pub fn default_magnetic_materials() -> BTreeMap<String, MaterialUsed> {
    BTreeMap::from([
        ("PARTICULAS MAGNETICAS".to_string(), MaterialUsed::new("Met-L-Check", "MPI-80", "")),
        ("PINTURA DE CONTRASTE".to_string(), MaterialUsed::new("Met-L-Check", "WCP-81", "")),
    ])
}

/// 材料を既定の順序で並べる（既定外のキーは末尾）
pub fn ordered_materials<'a>(
    materials: &'a BTreeMap<String, MaterialUsed>,
    order: &[&str],
) -> Vec<(&'a str, &'a MaterialUsed)> {
    let mut rows: Vec<(&str, &MaterialUsed)> = order
        .iter()
        .filter_map(|key| materials.get_key_value(*key))
        .map(|(k, v)| (k.as_str(), v))
        .collect();
    rows.extend(
        materials
            .iter()
            .filter(|(k, _)| !order.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v)),
    );
    rows
}

/// 浸透探傷の操作パラメータ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenetrantParameter {
    #[serde(rename = "actividad")]
    pub activity: String,
    #[serde(rename = "tiempo")]
    pub dwell_minutes: u32,
    #[serde(rename = "temperatura")]
    pub temperature: String,
    #[serde(rename = "aplicacion")]
    pub application: String,
    #[serde(rename = "iluminacion")]
    pub lighting: String,
}

fn default_penetrant_parameters() -> Vec<PenetrantParameter> {
    [("LIMPIEZA", 5), ("PENETRANTE", 12), ("LIMPIEZA", 3), ("REVELADOR", 10)]
        .into_iter()
        .map(|(activity, minutes)| PenetrantParameter {
            activity: activity.into(),
            dwell_minutes: minutes,
            temperature: "26° C".into(),
            application: "Spray".into(),
            lighting: "Luz Natural".into(),
        })
        .collect()
}

pub const PENETRANT_DEFAULT_TYPE: &str = "II - Líquidos Penetrantes Visibles";
pub const PENETRANT_DEFAULT_METHOD: &str = "C - Eliminables con Disolvente";

/// 浸透探傷ブロック（bloque_3_1）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenetrantBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(rename = "materiales")]
    pub materials: BTreeMap<String, MaterialUsed>,
    #[serde(rename = "tipo")]
    pub penetrant_type: Option<String>,
    #[serde(rename = "metodo")]
    pub method: Option<String>,
    #[serde(rename = "pasos_procedimiento")]
    pub procedure_steps: String,
    #[serde(rename = "parametros")]
    pub parameters: Vec<PenetrantParameter>,
    #[serde(rename = "elementos_inspeccionados")]
    pub elements: ElementList<InspectedElement>,
}

impl Default for PenetrantBlock {
    fn default() -> Self {
        Self {
            common: BlockCommon::default(),
            materials: default_penetrant_materials(),
            penetrant_type: None,
            method: None,
            procedure_steps: String::new(),
            parameters: default_penetrant_parameters(),
            elements: ElementList::default(),
        }
    }
}

/// 磁粉探傷の種類と方法
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeAndMethod {
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "metodo")]
    pub method: String,
}

impl Default for TypeAndMethod {
    fn default() -> Self {
        Self {
            kind: "Wet Magnetic Particles".into(),
            method: "No fluorescente".into(),
        }
    }
}

/// 磁粉探傷の操作パラメータ
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagneticParameter {
    #[serde(rename = "actividad")]
    pub activity: String,
    #[serde(rename = "distancia")]
    pub distance: String,
    #[serde(rename = "aplicacion")]
    pub application: String,
    #[serde(rename = "iluminacion")]
    pub lighting: String,
}

fn default_magnetic_parameters() -> Vec<MagneticParameter> {
    vec![
        MagneticParameter {
            activity: "Yugo".into(),
            distance: "150 mm".into(),
            application: "N.A.".into(),
            lighting: "N.A.".into(),
        },
        MagneticParameter {
            activity: "Partículas".into(),
            distance: "20 mm".into(),
            application: "Spray".into(),
            lighting: "No Fluorescente".into(),
        },
    ]
}

/// 磁化プロセスと電流
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessAndCurrent {
    #[serde(rename = "proceso")]
    pub process: String,
    #[serde(rename = "corriente")]
    pub current: String,
}

impl Default for ProcessAndCurrent {
    fn default() -> Self {
        Self {
            process: "Continua".into(),
            current: "AC".into(),
        }
    }
}

/// 磁粉探傷ブロック（bloque_4_1）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MagneticBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(rename = "materiales_utilizados")]
    pub materials: BTreeMap<String, MaterialUsed>,
    #[serde(rename = "tipo_y_metodo")]
    pub type_and_method: TypeAndMethod,
    #[serde(rename = "parametros_operacion")]
    pub parameters: Vec<MagneticParameter>,
    #[serde(rename = "proceso_y_corriente")]
    pub process_and_current: ProcessAndCurrent,
    #[serde(rename = "elementos_inspeccionados")]
    pub elements: ElementList<InspectedElement>,
}

impl Default for MagneticBlock {
    fn default() -> Self {
        Self {
            common: BlockCommon::default(),
            materials: default_magnetic_materials(),
            type_and_method: TypeAndMethod::default(),
            parameters: default_magnetic_parameters(),
            process_and_current: ProcessAndCurrent::default(),
            elements: ElementList::default(),
        }
    }
}

// ============================================
// 超音波探傷（UT）
// ============================================

/// 探触子の選択肢（MHz）
pub const TRANSDUCER_FREQUENCIES_MHZ: [f32; 12] =
    [1.0, 1.5, 2.0, 2.25, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 5.5, 6.0];

/// 探触子
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transducer {
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "angulo")]
    pub angle: String,
    #[serde(rename = "frecuencia")]
    pub frequency_mhz: f32,
    #[serde(rename = "dimension")]
    pub dimension: String,
}

impl Default for Transducer {
    fn default() -> Self {
        Self {
            kind: String::new(),
            angle: String::new(),
            frequency_mhz: 2.25,
            dimension: String::new(),
        }
    }
}

impl Transducer {
    /// 報告書用の複数行表記
    pub fn describe(&self) -> Vec<String> {
        vec![
            format!("Tipo: {}", self.kind),
            format!("Ángulo: {}°", self.angle),
            format!("Frecuencia: {} MHz", self.frequency_mhz),
            format!("Dimensión: {}", self.dimension),
        ]
    }
}

/// 超音波探傷ブロック（bloque_5_1）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UltrasoundBlock {
    #[serde(flatten)]
    pub common: BlockCommon,
    #[serde(rename = "palpador")]
    pub transducer: Option<Transducer>,
    #[serde(rename = "tipo_inspeccion")]
    pub inspection_type: Option<String>,
    #[serde(rename = "metodo")]
    pub method: Option<String>,
    #[serde(rename = "soldadura")]
    pub welding: String,
    #[serde(rename = "materiales")]
    pub materials: String,
    #[serde(rename = "parametros")]
    pub parameters: String,
    #[serde(rename = "juntas")]
    pub joints: u32,
    #[serde(rename = "elementos_inspeccionados")]
    pub elements: ElementList<UltrasoundJoint>,
}

/// 検査方法ブロック共通のアクセス
pub trait InspectionBlock {
    const METHOD: InspectionMethod;

    fn common(&self) -> &BlockCommon;
    fn common_mut(&mut self) -> &mut BlockCommon;
}

macro_rules! impl_inspection_block {
    ($block:ty, $method:expr) => {
        impl InspectionBlock for $block {
            const METHOD: InspectionMethod = $method;

            fn common(&self) -> &BlockCommon {
                &self.common
            }

            fn common_mut(&mut self) -> &mut BlockCommon {
                &mut self.common
            }
        }
    };
}

impl_inspection_block!(VisualBlock, InspectionMethod::Visual);
impl_inspection_block!(PenetrantBlock, InspectionMethod::Penetrant);
impl_inspection_block!(MagneticBlock, InspectionMethod::MagneticParticle);
impl_inspection_block!(UltrasoundBlock, InspectionMethod::Ultrasound);

// ============================================
// base64シリアライズ
// ============================================

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match data {
            Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(deserializer)?;
        match encoded {
            Some(text) if !text.is_empty() => STANDARD
                .decode(text.as_bytes())
                .map(Some)
                .map_err(serde::de::Error::custom),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_report_date() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 6, 5).unwrap();
        assert_eq!(format_report_date(date), "05/JUN/2024");
        let date = chrono::NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(format_report_date(date), "31/DIC/2025");
    }

    #[test]
    fn test_method_parse_and_codes() {
        assert_eq!("pt".parse::<InspectionMethod>().unwrap(), InspectionMethod::Penetrant);
        assert_eq!("Ultrasound".parse::<InspectionMethod>().unwrap(), InspectionMethod::Ultrasound);
        assert!("radiography".parse::<InspectionMethod>().is_err());
        assert_eq!(InspectionMethod::from_code("mt"), Some(InspectionMethod::MagneticParticle));
        assert_eq!(InspectionMethod::Visual.block_key(), "bloque_2_1");
    }

    #[test]
    fn test_qualification_fallback() {
        let q = Qualification::parse_for(InspectionMethod::Visual, "(NC) No conforme");
        assert_eq!(q, Qualification::NonConforming);

        // 方法に存在しない値は先頭の既定値
        let q = Qualification::parse_for(InspectionMethod::Visual, "Satisfactorio");
        assert_eq!(q, Qualification::Conforming);
        let q = Qualification::parse_for(InspectionMethod::Ultrasound, "???");
        assert_eq!(q, Qualification::Satisfactory);

        assert!(Qualification::try_parse_for(InspectionMethod::Penetrant, "fuera de alcance").is_some());
    }

    #[test]
    fn test_project_header_defaults_when_absent() {
        let header: ProjectHeader = serde_json::from_str(r#"{"cliente": "Nureon"}"#).unwrap();
        assert_eq!(header.client, "Nureon");
        assert_eq!(header.project, "Proyecto");
        assert_eq!(header.report_number, "T1234I1005");
        assert_eq!(header.global_norm, DEFAULT_NORM);
        assert_eq!(header.signatures.reviewer, "Revisa el informe");
    }

    #[test]
    fn test_legacy_project_conversion() {
        let legacy: LegacyProjectData = serde_json::from_str(
            r#"{"numero_informe": "REP-2025-0601", "ubicacion": "Bogotá", "inspector": "Ana"}"#,
        )
        .unwrap();
        let header = ProjectHeader::from(legacy);
        assert_eq!(header.report_number, "REP-2025-0601");
        assert_eq!(header.place, "Bogotá");
        assert_eq!(header.prepared_by, "Ana");
        assert_eq!(header.client, "Cliente");
        assert_eq!(
            header.selected_modules,
            vec![InspectionMethod::Visual, InspectionMethod::Penetrant]
        );
    }

    #[test]
    fn test_legacy_project_from_header_keeps_every_field() {
        let header = ProjectHeader {
            client: "Acme".into(),
            place: "Cali".into(),
            selected_modules: vec![InspectionMethod::Ultrasound],
            ..Default::default()
        };
        let legacy = LegacyProjectData::from(&header);
        assert_eq!(legacy.ubicacion.as_deref(), Some("Cali"));
        assert_eq!(ProjectHeader::from(legacy), header);
    }

    #[test]
    fn test_text_or_list_joined() {
        let list = TextOrList::List(vec!["SMAW".into(), " ".into(), "GMAW".into()]);
        assert_eq!(list.joined().as_deref(), Some("SMAW, GMAW"));
        assert_eq!(TextOrList::default().joined_or(NOT_SPECIFIED), NOT_SPECIFIED);
        let text: TextOrList = serde_json::from_str(r#""ASTM A36""#).unwrap();
        assert_eq!(text.joined().as_deref(), Some("ASTM A36"));
    }

    #[test]
    fn test_equipment_describe() {
        let kit: Equipment = serde_json::from_str(
            r#"{"kit_seleccionado": "Kit VT - Visual", "componentes": ["Flexómetro", "Linterna"]}"#,
        )
        .unwrap();
        assert_eq!(kit.describe().as_deref(), Some("Kit VT - Visual - Flexómetro, Linterna"));

        let text: Equipment = serde_json::from_str(r#""Yugo Parker B-300""#).unwrap();
        assert_eq!(text.describe().as_deref(), Some("Yugo Parker B-300"));
        assert_eq!(Equipment::default().describe(), None);
    }

    #[test]
    fn test_block_common_aliases() {
        let block: PenetrantBlock = serde_json::from_str(
            r#"{"especificacion": ["ASTM A36"], "proceso": "SMAW", "equipos": "Kit PT"}"#,
        )
        .unwrap();
        assert_eq!(block.common.base_materials.joined().as_deref(), Some("ASTM A36"));
        assert_eq!(block.common.welding_processes.joined().as_deref(), Some("SMAW"));
        // 省略された材料は既定値
        assert_eq!(block.materials.len(), 4);
    }

    #[test]
    fn test_phase_effective_result() {
        let mut check = PhaseCheck {
            item: "Precalentamiento".into(),
            ..Default::default()
        };
        assert_eq!(check.effective_result(), "Satisfactorio");
        check.applies = "No Aplica".into();
        assert_eq!(check.effective_result(), "No Aplica");
    }

    #[test]
    fn test_default_phase_checks() {
        let checks = default_phase_checks();
        assert_eq!(checks.len(), 17);
        assert_eq!(checks[0].phase, PHASE_BEFORE_WELDING);
        assert_eq!(checks[16].item, "Tratamiento Térmico después de la soldadura");
    }

    #[test]
    fn test_ordered_materials() {
        let materials = default_penetrant_materials();
        let ordered = ordered_materials(&materials, &PENETRANT_MATERIAL_ORDER);
        let keys: Vec<&str> = ordered.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, PENETRANT_MATERIAL_ORDER.to_vec());
    }

    #[test]
    fn test_photo_attachment_base64() {
        let photo = PhotoAttachment::new("a.jpg", "Junta 1", vec![1, 2, 3]);
        let json = serde_json::to_string(&photo).unwrap();
        assert!(json.contains("\"archivo\":\"AQID\""));

        let restored: PhotoAttachment = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.data, Some(vec![1, 2, 3]));

        // 画像なしの記録（名前とコメントのみ）
        let bare: PhotoAttachment = serde_json::from_str(r#"{"nombre": "b.jpg"}"#).unwrap();
        assert!(bare.data.is_none());
    }
}
