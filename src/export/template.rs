//! ページテンプレート（ヘッダー・フッター・著作権表示・ページ番号）

use super::flow::{aligned_text, Align, Draw, ImageRef, GRID_LINE_WIDTH};
use super::fonts::{text_width, wrap_text, Font};
use inspection_report_common::export::pdf_core::PdfLayoutCore;
use inspection_report_common::layout::*;
use inspection_report_common::report::{MetaField, ReportHeader};

pub const FOOTER_LEGEND: &str = "Abreviaciones:  A: Aplica   N.A: No aplica   S: Satisfactorio   N.S: No Satisfactorio   F.A: Fuera de Alcance";
pub const FOOTER_CLIENT: &str = "Cliente";

const TITLE_SIZE: f32 = 13.0;
const NORM_SIZE: f32 = 11.0;
const META_SIZE: f32 = 8.0;
const META_MIN_SIZE: f32 = 5.5;
const FOOTER_SIZE: f32 = 7.0;
const COPYRIGHT_SIZE: f32 = 7.0;
const PAGE_NUMBER_SIZE: f32 = 9.0;

/// 全ページ共通の装飾に必要な情報
#[derive(Debug, Clone)]
pub struct PageTemplate<'a> {
    pub header: &'a ReportHeader,
    pub layout: &'a PdfLayoutCore,
    pub company_name: &'a str,
    pub copyright: &'a str,
    pub logo: Option<ImageRef>,
}

/// "Página X de Y"
pub fn page_label(page_index: usize, total: usize) -> String {
    format!("Página {} de {}", page_index + 1, total)
}

/// 幅に収まるまでフォントを縮める
fn fitted_size(text: &str, font: Font, size: f32, max_width: f32) -> f32 {
    let width = text_width(text, font, size);
    if width <= max_width || width == 0.0 {
        size
    } else {
        (size * max_width / width).max(META_MIN_SIZE)
    }
}

impl PageTemplate<'_> {
    /// ページの装飾（総ページ数が確定してから呼ぶ）
    pub fn decorate(&self, page_index: usize, total: usize) -> Vec<Draw> {
        let mut draws = Vec::new();

        draws.push(aligned_text(
            &self.header.title,
            Font::Bold,
            TITLE_SIZE,
            mm_to_pt(TITLE_CENTER_X_MM),
            mm_to_pt(TITLE_Y_MM),
            Align::Center,
        ));
        draws.push(aligned_text(
            &self.header.norm,
            Font::Bold,
            NORM_SIZE,
            mm_to_pt(TITLE_CENTER_X_MM),
            mm_to_pt(NORM_Y_MM),
            Align::Center,
        ));

        if self.layout.header_mode.has_header(page_index) {
            if let Some(logo) = self.logo {
                draws.push(self.logo_draw(logo));
            }
            self.metadata_block(&mut draws);
        }

        self.copyright_draw(&mut draws);
        self.footer(&mut draws);

        draws.push(aligned_text(
            &page_label(page_index, total),
            Font::Regular,
            PAGE_NUMBER_SIZE,
            mm_to_pt(PAGE_NUMBER_X_MM),
            mm_to_pt(PAGE_NUMBER_Y_MM),
            Align::Right,
        ));
        draws
    }

    fn logo_draw(&self, logo: ImageRef) -> Draw {
        let box_w = mm_to_pt(LOGO_WIDTH_MM);
        let box_h = mm_to_pt(LOGO_HEIGHT_MM);
        let scale = (box_w / logo.width_px.max(1) as f32).min(box_h / logo.height_px.max(1) as f32);
        Draw::Image {
            index: logo.index,
            x: self.layout.margin_left_pt,
            y: mm_to_pt(LOGO_Y_MM),
            width: logo.width_px as f32 * scale,
            height: logo.height_px as f32 * scale,
        }
    }

    fn metadata_block(&self, draws: &mut Vec<Draw>) {
        draws.push(Draw::Rect {
            x: self.layout.margin_left_pt,
            y: mm_to_pt(META_BOX_Y_MM),
            width: self.layout.content_width_pt,
            height: mm_to_pt(META_BOX_HEIGHT_MM),
            fill: None,
            stroke: Some(GRID_LINE_WIDTH),
        });

        let left_x = self.layout.margin_left_pt + mm_to_pt(META_INNER_PADDING_MM);
        let right_x = self.layout.margin_left_pt + self.layout.content_width_pt / 2.0 + mm_to_pt(1.5);
        self.meta_table(draws, &self.header.left, left_x);
        self.meta_table(draws, &self.header.right, right_x);
    }

    fn meta_table(&self, draws: &mut Vec<Draw>, fields: &[MetaField], x: f32) {
        let label_w = mm_to_pt(META_LABEL_WIDTH_MM);
        let value_w = mm_to_pt(META_VALUE_WIDTH_MM);

        for (row, field) in fields.iter().take(META_ROWS).enumerate() {
            let y = self.layout.meta_row_y_pt(row);
            draws.push(Draw::Text {
                x,
                y,
                size: fitted_size(field.label, Font::Bold, META_SIZE, label_w - 2.0),
                font: Font::Bold,
                text: field.label.to_string(),
            });
            draws.push(Draw::Text {
                x: x + label_w,
                y,
                size: fitted_size(&field.value, Font::Regular, META_SIZE, value_w - 2.0),
                font: Font::Regular,
                text: field.value.clone(),
            });
            // 値の下線
            draws.push(Draw::Line {
                from: (x + label_w, y - 2.0),
                to: (x + label_w + value_w, y - 2.0),
                width: 0.5,
            });
        }
    }

    fn copyright_draw(&self, draws: &mut Vec<Draw>) {
        if self.copyright.is_empty() {
            return;
        }
        // 90度回転なので、文字列の中心を140mmに合わせる
        let width = text_width(self.copyright, Font::Regular, COPYRIGHT_SIZE);
        draws.push(Draw::RotatedText {
            x: mm_to_pt(COPYRIGHT_X_MM),
            y: mm_to_pt(COPYRIGHT_Y_MM) - width / 2.0,
            size: COPYRIGHT_SIZE,
            font: Font::Regular,
            text: self.copyright.to_string(),
            degrees: 90.0,
        });
    }

    fn footer(&self, draws: &mut Vec<Draw>) {
        let y = mm_to_pt(FOOTER_Y_MM);
        let height = mm_to_pt(FOOTER_ROW_HEIGHT_MM);
        let widths = [
            mm_to_pt(FOOTER_LEGEND_WIDTH_MM),
            mm_to_pt(FOOTER_COMPANY_WIDTH_MM),
            mm_to_pt(FOOTER_CLIENT_WIDTH_MM),
        ];

        let mut x = self.layout.margin_left_pt;
        for width in widths {
            draws.push(Draw::Rect {
                x,
                y,
                width,
                height,
                fill: None,
                stroke: Some(GRID_LINE_WIDTH),
            });
            x += width;
        }

        // 凡例は左寄せで折り返し、縦方向は中央
        let leading = FOOTER_SIZE * 1.2;
        let legend = wrap_text(FOOTER_LEGEND, Font::Regular, FOOTER_SIZE, widths[0] - 6.0);
        let block = legend.len() as f32 * leading;
        let mut baseline = y + height / 2.0 + block / 2.0 - FOOTER_SIZE;
        for line in legend {
            draws.push(Draw::Text {
                x: self.layout.margin_left_pt + 3.0,
                y: baseline,
                size: FOOTER_SIZE,
                font: Font::Regular,
                text: line,
            });
            baseline -= leading;
        }

        let middle = y + height / 2.0 - FOOTER_SIZE / 3.0;
        let company_x = self.layout.margin_left_pt + widths[0];
        let company_size = fitted_size(self.company_name, Font::Bold, 8.0, widths[1] - 6.0);
        draws.push(aligned_text(
            self.company_name,
            Font::Bold,
            company_size,
            company_x + widths[1] / 2.0,
            middle,
            Align::Center,
        ));
        draws.push(aligned_text(
            FOOTER_CLIENT,
            Font::Regular,
            8.0,
            company_x + widths[1] + widths[2] / 2.0,
            middle,
            Align::Center,
        ));
    }
}
