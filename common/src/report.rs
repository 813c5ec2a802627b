//! 報告書データ
//!
//! ストアから抽出・正規化した、PDF描画に渡すための型。

use crate::types::{InspectionMethod, PhotoAttachment};

/// ヘッダーのメタデータ1行（ラベル + 値）
#[derive(Debug, Clone, PartialEq)]
pub struct MetaField {
    pub label: &'static str,
    pub value: String,
}

/// 報告書ヘッダー
#[derive(Debug, Clone, PartialEq)]
pub struct ReportHeader {
    pub title: String,
    pub norm: String,
    /// 左側の表（Cliente, Proyecto, ...）
    pub left: Vec<MetaField>,
    /// 右側の表（Rep N°, Fecha, ...）
    pub right: Vec<MetaField>,
}

/// 表の列定義
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub header: String,
    pub width_mm: f32,
}

impl Column {
    pub fn new(header: &str, width_mm: f32) -> Self {
        Self {
            header: header.to_string(),
            width_mm,
        }
    }
}

/// 報告書の1セクション
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    /// 枠付きの見出し + 本文行
    TextBox { title: String, lines: Vec<String> },
    /// 見出し + 段落（枠なし）
    Paragraph { title: String, body: String },
    /// チェック項目と所見の2列表
    Checklist {
        title: String,
        rows: Vec<(String, String)>,
    },
    /// データ表（空のときはメッセージを表示）
    Table {
        title: String,
        columns: Vec<Column>,
        rows: Vec<Vec<String>>,
        empty_message: String,
    },
}

impl Section {
    pub fn title(&self) -> &str {
        match self {
            Section::TextBox { title, .. }
            | Section::Paragraph { title, .. }
            | Section::Checklist { title, .. }
            | Section::Table { title, .. } => title,
        }
    }
}

/// 写真の並べ方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoLayout {
    /// 2列N行（外観検査）
    TwoColumn,
    /// 6枚以上は3×2グリッド、それ未満は1行
    Grouped,
}

impl PhotoLayout {
    /// 写真セルのタイトル（1始まり）
    pub fn cell_title(&self, index: usize) -> String {
        match self {
            PhotoLayout::TwoColumn => format!("Registro Fotográfico N° {}", index),
            PhotoLayout::Grouped => format!("Foto {}", index),
        }
    }

    /// 写真がないときの表示
    pub fn empty_message(&self) -> &'static str {
        match self {
            PhotoLayout::TwoColumn => "No se registraron fotografías en este informe.",
            PhotoLayout::Grouped => "No hay registros fotográficos.",
        }
    }
}

/// PDF描画に渡す報告書データ
#[derive(Debug, Clone, PartialEq)]
pub struct ReportData {
    pub method: InspectionMethod,
    pub header: ReportHeader,
    pub sections: Vec<Section>,
    pub photo_heading: String,
    pub photos: Vec<PhotoAttachment>,
    pub scheme: Vec<PhotoAttachment>,
    pub photo_layout: PhotoLayout,
}

/// セクション番号の採番（出力するセクションだけに連番を振る）
#[derive(Debug, Default)]
pub struct SectionNumbering {
    last: usize,
}

impl SectionNumbering {
    pub fn new() -> Self {
        Self::default()
    }

    /// "N. 見出し"
    pub fn title(&mut self, name: &str) -> String {
        self.last += 1;
        format!("{}. {}", self.last, name)
    }
}
