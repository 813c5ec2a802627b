//! 参照データ（読み取り専用のCSV）
//!
//! 参照ディレクトリのCSVから機材キット・手順・材料・検査員・規格を読み込む。
//! 読み込みは失敗しても止めない（警告を出して空リストまたは既定値）。

use crate::error::{Error, Result};
use crate::types::{InspectionMethod, Transducer, DEFAULT_NORM};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const KITS_FILE: &str = "kits_inspeccion.csv";
pub const PROCEDURES_FILE: &str = "procedimientos.csv";
pub const MATERIALS_FILE: &str = "materiales_base.csv";
pub const INSPECTORS_FILE: &str = "inspectores.csv";
pub const NORMS_FILE: &str = "normas.csv";

/// 写真撮影キット（全検査方法で利用可能）
pub const PHOTO_KIT_ID: &str = "kit_foto";

pub const FALLBACK_INSPECTOR: &str = "Ing. Inspector";

pub const BASE_MATERIAL_SPECS: &[&str] = &[
    "ASTM A36", "ASTM A283 Gr A", "ASTM A283 Gr B", "ASTM A283 Gr C", "ASTM A283 Gr D",
    "ASTM A285", "ASTM A306", "ASTM A529", "ASTM A573", "ASTM A572 Gr 42", "ASTM A572 Gr 50",
    "ASTM A572 Gr 55", "ASTM A572 Gr 60", "ASTM A572 Gr 65", "ASTM A656", "ASTM A709",
    "ASTM A852", "ASTM A992", "ASTM A913", "ASTM A1043", "ASTM A1085", "ASTM A242", "ASTM A588",
    "ASTM A690", "ASTM A606", "ASTM A514", "ASTM A517", "ASTM A633", "ASTM A737",
    "ASTM A500 Gr C", "ASTM A501", "ASTM A847", "ASTM A1065", "ASTM A618", "ASTM A131 Gr A",
    "ASTM A131 Gr B", "ASTM A131 Gr D", "ASTM A131 Gr E", "ASTM A131 AH36", "ASTM A131 DH36",
    "ASTM A131 EH36", "ASTM A934", "ASTM A307", "ASTM A325", "ASTM A490", "ASTM F3125",
    "ASTM A354", "ASTM A709 HPS 50W", "ASTM A709 HPS 70W", "ASTM A913 Gr 50", "ASTM A913 Gr 65",
    "ASTM A913 Gr 70", "ASTM A913 Gr 80", "ASTM A36M", "ASTM A572M", "ASTM A992M", "ASTM A588M",
    "ASTM A1085M", "ASTM A715", "ASTM A441", "ASTM A618M", "ASTM A852M", "ASTM A992 HSS",
];

pub const WELDING_PROCESSES: &[&str] = &["SMAW", "GMAW", "GTAW", "FCAW", "SAW", "TIG", "Otro"];

pub const WELDING_TYPES: &[&str] = &["Manual", "Semiautomático", "Automático", "Robotizado", "Otro"];

lazy_static! {
    /// "TLPR0026 - ..." の先頭コード
    static ref PROCEDURE_CODE: Regex = Regex::new(r"^\s*([A-Z]{2,}\d+)\s*(?:-|$)").unwrap();
}

/// 手順コードから検査方法を判定
pub fn method_for_procedure(procedure: &str) -> Option<InspectionMethod> {
    let code = PROCEDURE_CODE.captures(procedure)?.get(1)?.as_str();
    match code {
        "TLPR0025" => Some(InspectionMethod::Visual),
        "TLPR0026" => Some(InspectionMethod::Penetrant),
        "TLPR0027" => Some(InspectionMethod::MagneticParticle),
        "TLPR0028" => Some(InspectionMethod::Ultrasound),
        _ => None,
    }
}

/// 機材キット
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kit {
    pub id: String,
    pub name: String,
    pub description: String,
    pub components: Vec<String>,
    /// 対応する検査方法コード（VT/PT/MT/UT）
    pub inspection_types: Vec<String>,
    pub brand: String,
    pub model: String,
    pub scale: String,
    pub calibration: String,
    pub transducer: Option<Transducer>,
}

impl Kit {
    /// 選択肢ラベル "名称 - 説明"
    pub fn label(&self) -> String {
        format!("{} - {}", self.name, self.description)
    }

    pub fn supports(&self, method: InspectionMethod) -> bool {
        self.inspection_types.iter().any(|t| t == method.code())
    }
}

/// 検査手順
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub code: String,
    pub name: String,
    pub revision: String,
}

impl Procedure {
    pub fn label(&self) -> String {
        format!("{} - {} {}", self.code, self.name, self.revision)
            .trim_end()
            .to_string()
    }
}

/// 母材
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseMaterial {
    pub kind: String,
    pub name: String,
}

/// 参照データ一式
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    pub kits: Vec<Kit>,
    pub procedures: Vec<Procedure>,
    pub materials: Vec<BaseMaterial>,
    pub inspectors: Vec<String>,
    pub norms: Vec<String>,
}

impl ReferenceData {
    /// ディレクトリから読み込む（失敗したファイルは空または既定値）
    pub fn load_dir(dir: &Path) -> Self {
        let kits = load_or_warn(&dir.join(KITS_FILE), parse_kits).unwrap_or_default();
        let procedures = load_or_warn(&dir.join(PROCEDURES_FILE), parse_procedures).unwrap_or_default();
        let materials = load_or_warn(&dir.join(MATERIALS_FILE), parse_materials).unwrap_or_default();
        let inspectors = load_or_warn(&dir.join(INSPECTORS_FILE), |c| parse_column(c, "nombre"))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| vec![FALLBACK_INSPECTOR.to_string()]);
        let norms = load_or_warn(&dir.join(NORMS_FILE), |c| parse_column(c, "norma"))
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| vec![DEFAULT_NORM.to_string()]);

        log::debug!(
            "reference data: {} kits, {} procedures, {} materials",
            kits.len(),
            procedures.len(),
            materials.len()
        );

        Self {
            kits,
            procedures,
            materials,
            inspectors,
            norms,
        }
    }

    /// 検査方法で使えるキット（写真キットを含む）
    pub fn kits_for_method(&self, method: InspectionMethod) -> Vec<&Kit> {
        let mut kits: Vec<&Kit> = self.kits.iter().filter(|k| k.supports(method)).collect();
        kits.extend(
            self.kits
                .iter()
                .filter(|k| k.id == PHOTO_KIT_ID && !k.supports(method)),
        );
        kits
    }

    pub fn kit_by_label(&self, label: &str) -> Option<&Kit> {
        self.kits.iter().find(|k| k.label() == label)
    }

    /// ラベルからキット構成品を取得
    pub fn components_for_label(&self, label: &str) -> Vec<String> {
        self.kit_by_label(label)
            .map(|k| k.components.clone())
            .unwrap_or_default()
    }

    /// ラベルから探触子データを取得
    pub fn transducer_for_label(&self, label: &str) -> Option<Transducer> {
        self.kit_by_label(label).and_then(|k| k.transducer.clone())
    }

    /// 検査方法に対応する手順
    pub fn procedures_for_method(&self, method: InspectionMethod) -> Vec<&Procedure> {
        self.procedures
            .iter()
            .filter(|p| method_for_procedure(&p.code) == Some(method))
            .collect()
    }
}

fn load_or_warn<T, F>(path: &Path, parse: F) -> Option<T>
where
    F: FnOnce(&str) -> Result<T>,
{
    let result = std::fs::read_to_string(path)
        .map_err(Error::from)
        .and_then(|content| parse(&content));
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("failed to load {}: {}", path.display(), e);
            None
        }
    }
}

// ============================================
// CSV読み込み
// ============================================

/// ヘッダー名で列を参照できるCSV
struct CsvTable {
    columns: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    fn parse(content: &str) -> Result<Self> {
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| Error::Parse("empty CSV".to_string()))?;
        let columns = parse_csv_line(header.trim_start_matches('\u{feff}'))
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name.to_lowercase(), i))
            .collect();
        let rows = lines.map(parse_csv_line).collect();
        Ok(Self { columns, rows })
    }

    fn require(&self, name: &str) -> Result<()> {
        if self.columns.contains_key(name) {
            Ok(())
        } else {
            Err(Error::Parse(format!("missing column: {}", name)))
        }
    }

    fn get<'a>(&self, row: &'a [String], name: &str) -> &'a str {
        self.columns
            .get(name)
            .and_then(|&i| row.get(i))
            .map(|s| s.as_str())
            .unwrap_or("")
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split('|')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_kits(content: &str) -> Result<Vec<Kit>> {
    let table = CsvTable::parse(content)?;
    for column in ["id", "nombre", "descripcion", "componentes", "tipo_inspeccion"] {
        table.require(column)?;
    }

    let kits = table
        .rows
        .iter()
        .map(|row| {
            let transducer_kind = table.get(row, "palpador_tipo");
            let transducer = if transducer_kind.is_empty() {
                None
            } else {
                Some(Transducer {
                    kind: transducer_kind.to_string(),
                    angle: table.get(row, "palpador_angulo").to_string(),
                    frequency_mhz: table
                        .get(row, "palpador_frecuencia")
                        .trim_end_matches("MHz")
                        .trim()
                        .parse()
                        .unwrap_or(Transducer::default().frequency_mhz),
                    dimension: table.get(row, "palpador_dimension").to_string(),
                })
            };
            Kit {
                id: table.get(row, "id").to_string(),
                name: table.get(row, "nombre").to_string(),
                description: table.get(row, "descripcion").to_string(),
                components: split_list(table.get(row, "componentes")),
                inspection_types: split_list(table.get(row, "tipo_inspeccion")),
                brand: table.get(row, "marca").to_string(),
                model: table.get(row, "modelo").to_string(),
                scale: table.get(row, "escala").to_string(),
                calibration: table.get(row, "grado_calibracion").to_string(),
                transducer,
            }
        })
        .collect();
    Ok(kits)
}

fn parse_procedures(content: &str) -> Result<Vec<Procedure>> {
    let table = CsvTable::parse(content)?;
    table.require("codigo")?;
    Ok(table
        .rows
        .iter()
        .map(|row| Procedure {
            code: table.get(row, "codigo").to_string(),
            name: table.get(row, "nombre").to_string(),
            revision: table.get(row, "revision").to_string(),
        })
        .collect())
}

fn parse_materials(content: &str) -> Result<Vec<BaseMaterial>> {
    let table = CsvTable::parse(content)?;
    table.require("nombre")?;
    Ok(table
        .rows
        .iter()
        .map(|row| BaseMaterial {
            kind: table.get(row, "tipo").to_string(),
            name: table.get(row, "nombre").to_string(),
        })
        .collect())
}

fn parse_column(content: &str, column: &str) -> Result<Vec<String>> {
    let table = CsvTable::parse(content)?;
    table.require(column)?;
    Ok(table
        .rows
        .iter()
        .map(|row| table.get(row, column).to_string())
        .filter(|v| !v.is_empty())
        .collect())
}

/// CSV行をパース（ダブルクォート対応、"" はエスケープ）
fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(field.trim().to_string());
                field.clear();
            }
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const KITS_CSV: &str = "id,nombre,descripcion,componentes,tipo_inspeccion,marca,modelo,escala,grado_calibracion,palpador_tipo,palpador_angulo,palpador_frecuencia,palpador_dimension
kit_vt,Kit VT,Inspección visual,Flexómetro|Linterna|Galga,VT,,,,,,,,
kit_pt,Kit PT,\"Penetrantes, visibles\",Penetrante|Revelador,PT|VT,,,,,,,,
kit_ut,Kit UT,Ultrasonido,Equipo|Palpador,UT,Sonatest,Veo,0-200,A,Angular,70,2.25,8x9 mm
kit_foto,Kit Foto,Registro fotográfico,Cámara,FOTO,,,,,,,,
";

    fn reference_with_kits() -> ReferenceData {
        ReferenceData {
            kits: parse_kits(KITS_CSV).unwrap(),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_csv_line_quotes() {
        let fields = parse_csv_line(r#"a,"b, c","say ""hi""""#);
        assert_eq!(fields, vec!["a", "b, c", "say \"hi\""]);
    }

    #[test]
    fn test_parse_kits() {
        let kits = parse_kits(KITS_CSV).unwrap();
        assert_eq!(kits.len(), 4);
        assert_eq!(kits[0].components, vec!["Flexómetro", "Linterna", "Galga"]);
        assert_eq!(kits[1].description, "Penetrantes, visibles");
        assert_eq!(kits[1].inspection_types, vec!["PT", "VT"]);

        let transducer = kits[2].transducer.as_ref().unwrap();
        assert_eq!(transducer.angle, "70");
        assert!((transducer.frequency_mhz - 2.25).abs() < f32::EPSILON);
        assert!(kits[0].transducer.is_none());
    }

    #[test]
    fn test_kits_for_method_includes_photo_kit() {
        let reference = reference_with_kits();
        let ids: Vec<&str> = reference
            .kits_for_method(InspectionMethod::Visual)
            .iter()
            .map(|k| k.id.as_str())
            .collect();
        assert_eq!(ids, vec!["kit_vt", "kit_pt", "kit_foto"]);

        let ids: Vec<&str> = reference
            .kits_for_method(InspectionMethod::MagneticParticle)
            .iter()
            .map(|k| k.id.as_str())
            .collect();
        assert_eq!(ids, vec!["kit_foto"]);
    }

    #[test]
    fn test_components_by_label() {
        let reference = reference_with_kits();
        assert_eq!(
            reference.components_for_label("Kit VT - Inspección visual"),
            vec!["Flexómetro", "Linterna", "Galga"]
        );
        assert!(reference.components_for_label("Kit VT").is_empty());
        assert!(reference.transducer_for_label("Kit UT - Ultrasonido").is_some());
    }

    #[test]
    fn test_method_for_procedure() {
        assert_eq!(
            method_for_procedure("TLPR0026 - Inspección de Líquidos Penetrantes - Rev. 1"),
            Some(InspectionMethod::Penetrant)
        );
        assert_eq!(method_for_procedure("TLPR0028"), Some(InspectionMethod::Ultrasound));
        assert_eq!(method_for_procedure("TLPR0099 - Otro"), None);
        assert_eq!(method_for_procedure(""), None);
    }

    #[test]
    fn test_load_dir_fallbacks() {
        let dir = tempdir().unwrap();
        let reference = ReferenceData::load_dir(dir.path());
        assert!(reference.kits.is_empty());
        assert_eq!(reference.inspectors, vec![FALLBACK_INSPECTOR]);
        assert_eq!(reference.norms, vec![DEFAULT_NORM]);
    }

    #[test]
    fn test_load_dir_reads_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(INSPECTORS_FILE), "nombre\nAna Gómez\nLuis Pérez\n").unwrap();
        std::fs::write(
            dir.path().join(PROCEDURES_FILE),
            "codigo,nombre,revision\nTLPR0027,Partículas Magnéticas,Rev. 2\n",
        )
        .unwrap();

        let reference = ReferenceData::load_dir(dir.path());
        assert_eq!(reference.inspectors, vec!["Ana Gómez", "Luis Pérez"]);
        let procedures = reference.procedures_for_method(InspectionMethod::MagneticParticle);
        assert_eq!(procedures.len(), 1);
        assert_eq!(procedures[0].label(), "TLPR0027 - Partículas Magnéticas Rev. 2");
    }

    #[test]
    fn test_builtin_lists() {
        assert!(BASE_MATERIAL_SPECS.contains(&"ASTM A500 Gr C"));
        assert_eq!(WELDING_PROCESSES.len(), 7);
        assert_eq!(WELDING_TYPES[1], "Semiautomático");
    }
}
