//! PDF export core utilities.
//!
//! ページ枠の計算（pt単位）とヘッダーのメタデータ構築。

use crate::layout::*;
use crate::report::MetaField;
use crate::types::ProjectHeader;

/// 本文を流し込む矩形（pt、原点は左下）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub x: f32,
    pub top: f32,
    pub bottom: f32,
    pub width: f32,
}

impl Frame {
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }
}

/// PDF描画で使用するレイアウト計算結果（pt単位）
#[derive(Debug, Clone)]
pub struct PdfLayoutCore {
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    pub margin_left_pt: f32,
    pub margin_top_pt: f32,
    pub margin_bottom_pt: f32,
    pub content_width_pt: f32,
    pub header_frame_top_pt: f32,
    pub header_mode: HeaderMode,
}

impl PdfLayoutCore {
    pub fn from_layout(layout: &PageLayout) -> Self {
        Self {
            page_width_pt: mm_to_pt(layout.page_width_mm),
            page_height_pt: mm_to_pt(layout.page_height_mm),
            margin_left_pt: mm_to_pt(layout.margin_left_mm),
            margin_top_pt: mm_to_pt(layout.margin_top_mm),
            margin_bottom_pt: mm_to_pt(layout.margin_bottom_mm),
            content_width_pt: mm_to_pt(layout.content_width_mm()),
            header_frame_top_pt: mm_to_pt(layout.header_frame_top_mm),
            header_mode: layout.header_mode,
        }
    }

    /// ページごとの本文枠（ヘッダーありは214mmから、なしは上余白から）
    pub fn frame_for_page(&self, page_index: usize) -> Frame {
        let top = if self.header_mode.has_header(page_index) {
            self.header_frame_top_pt
        } else {
            self.page_height_pt - self.margin_top_pt
        };
        Frame {
            x: self.margin_left_pt,
            top,
            bottom: self.margin_bottom_pt,
            width: self.content_width_pt,
        }
    }

    /// メタデータ枠のN行目のベースライン（pt）
    pub fn meta_row_y_pt(&self, row: usize) -> f32 {
        let box_top = mm_to_pt(META_BOX_Y_MM + META_BOX_HEIGHT_MM - META_INNER_PADDING_MM);
        box_top - (row as f32 + 1.0) * mm_to_pt(META_ROW_HEIGHT_MM) + mm_to_pt(2.0)
    }
}

/// ヘッダーの左右メタデータを構築（空の値は "-"）
pub fn build_header_fields(
    header: &ProjectHeader,
    welding_process: &str,
    kind: &str,
) -> (Vec<MetaField>, Vec<MetaField>) {
    let field = |label: &'static str, value: &str| MetaField {
        label,
        value: if value.trim().is_empty() { "-".to_string() } else { value.to_string() },
    };

    let left = vec![
        field("Cliente:", &header.client),
        field("Proyecto:", &header.project),
        field("Subproyecto:", &header.sub_project),
        field("Contratista:", &header.contractor),
        field("Elaboró:", &header.prepared_by),
    ];
    let right = vec![
        field("Rep N°:", &header.report_number),
        field("Fecha:", &header.date),
        field("Lugar:", &header.place),
        field("Proceso de soldadura:", welding_process),
        field("Tipo:", kind),
    ];
    (left, right)
}
