//! フロー型レイアウトエンジン
//!
//! 見出し・段落・表・写真グリッドを順にページ枠へ流し込み、
//! ページごとの描画命令（Draw）に変換する。座標はpt、原点は左下。
//! 入りきらない要素は次ページへ送り、表と段落は行単位で分割する。

use super::fonts::{text_width, wrap_text, Font};
use inspection_report_common::export::pdf_core::Frame;
use inspection_report_common::layout::{mm_to_pt, PHOTO_BOX_HEIGHT_MM, PHOTO_BOX_WIDTH_MM};

pub const BODY_SIZE: f32 = 9.0;
pub const BODY_LEADING: f32 = 12.0;
pub const HEADING_SIZE: f32 = 10.0;
pub const HEADING_SPACE_BEFORE: f32 = 6.0;
pub const HEADING_SPACE_AFTER: f32 = 4.0;
pub const CELL_PADDING: f32 = 3.0;
pub const GRID_LINE_WIDTH: f32 = 0.6;
pub const PHOTO_GRID_LINE_WIDTH: f32 = 0.8;
const PHOTO_CELL_PADDING: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(pub f32, pub f32, pub f32);

pub const WHITESMOKE: Color = Color(0.961, 0.961, 0.961);

/// 描画命令
#[derive(Debug, Clone, PartialEq)]
pub enum Draw {
    /// ベースライン左端から描くテキスト
    Text {
        x: f32,
        y: f32,
        size: f32,
        font: Font,
        text: String,
    },
    /// 回転テキスト（度、反時計回り）
    RotatedText {
        x: f32,
        y: f32,
        size: f32,
        font: Font,
        text: String,
        degrees: f32,
    },
    Line {
        from: (f32, f32),
        to: (f32, f32),
        width: f32,
    },
    /// 左下基準の矩形
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Color>,
        stroke: Option<f32>,
    },
    /// 埋め込み画像（画像テーブルの番号）
    Image {
        index: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// 揃え位置を指定したテキスト（anchor は左端・中央・右端）
pub fn aligned_text(text: &str, font: Font, size: f32, anchor_x: f32, y: f32, align: Align) -> Draw {
    let width = text_width(text, font, size);
    let x = match align {
        Align::Left => anchor_x,
        Align::Center => anchor_x - width / 2.0,
        Align::Right => anchor_x - width,
    };
    Draw::Text {
        x,
        y,
        size,
        font,
        text: text.to_string(),
    }
}

// ============================================
// フロー要素
// ============================================

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub font: Font,
    pub align: Align,
}

impl Cell {
    pub fn regular(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: Font::Regular,
            align: Align::Left,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: Font::Bold,
            align: Align::Left,
        }
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
    pub shaded: bool,
}

/// 列幅（pt）指定の表。ページをまたぐときはヘッダー行を繰り返す
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub widths: Vec<f32>,
    pub header: Option<Row>,
    pub rows: Vec<Row>,
    pub font_size: f32,
}

impl Table {
    fn leading(&self) -> f32 {
        self.font_size * 1.2
    }

    fn cell_lines(&self, row: &Row) -> Vec<Vec<String>> {
        row.cells
            .iter()
            .zip(&self.widths)
            .map(|(cell, width)| {
                wrap_text(&cell.text, cell.font, self.font_size, width - 2.0 * CELL_PADDING)
            })
            .collect()
    }

    fn row_height(&self, row: &Row) -> f32 {
        let lines = self
            .cell_lines(row)
            .iter()
            .map(|l| l.len().max(1))
            .max()
            .unwrap_or(1);
        lines as f32 * self.leading() + 2.0 * CELL_PADDING
    }
}

/// 画像の参照（画像テーブル番号 + ピクセル寸法）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageRef {
    pub index: usize,
    pub width_px: u32,
    pub height_px: u32,
}

/// 写真セル
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoSlot {
    /// None なら枠付きのプレースホルダー
    pub image: Option<ImageRef>,
    pub placeholder: String,
    pub title: String,
    pub caption: String,
}

/// 写真グリッド（None は空枠）
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoGrid {
    pub column_width: f32,
    pub rows: Vec<Vec<Option<PhotoSlot>>>,
}

impl PhotoGrid {
    fn box_size(&self) -> (f32, f32) {
        let width = mm_to_pt(PHOTO_BOX_WIDTH_MM).min(self.column_width - 2.0 * PHOTO_CELL_PADDING);
        (width, mm_to_pt(PHOTO_BOX_HEIGHT_MM))
    }

    fn text_width(&self) -> f32 {
        self.column_width - 2.0 * PHOTO_CELL_PADDING
    }

    fn row_height(&self, row: &[Option<PhotoSlot>]) -> f32 {
        let (_, box_h) = self.box_size();
        let text_lines = row
            .iter()
            .flatten()
            .map(|slot| {
                1 + wrap_text(&slot.caption, Font::Regular, BODY_SIZE, self.text_width())
                    .iter()
                    .filter(|l| !l.is_empty())
                    .count()
            })
            .max()
            .unwrap_or(0);
        2.0 * PHOTO_CELL_PADDING + box_h + mm_to_pt(2.0) + text_lines as f32 * BODY_LEADING
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Flowable {
    Spacer(f32),
    Heading(String),
    Paragraph(String),
    Table(Table),
    PhotoGrid(PhotoGrid),
    PageBreak,
}

// ============================================
// ページ割り付け
// ============================================

struct Paginator<F: Fn(usize) -> Frame> {
    frame_for: F,
    pages: Vec<Vec<Draw>>,
    frame: Frame,
    y: f32,
    /// このページにまだ何も置いていない
    fresh: bool,
}

impl<F: Fn(usize) -> Frame> Paginator<F> {
    fn new(frame_for: F) -> Self {
        let frame = frame_for(0);
        Self {
            frame_for,
            pages: vec![Vec::new()],
            frame,
            y: frame.top,
            fresh: true,
        }
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.frame = (self.frame_for)(self.pages.len() - 1);
        self.y = self.frame.top;
        self.fresh = true;
    }

    fn fits(&self, height: f32) -> bool {
        self.y - height >= self.frame.bottom - 0.01
    }

    /// 入らなければ改ページ（空ページでは改ページしない）
    fn ensure(&mut self, height: f32) {
        if !self.fits(height) && !self.fresh {
            self.new_page();
        }
        if !self.fits(height) {
            log::warn!("content taller than the frame ({:.1}pt), clipped", height);
        }
    }

    fn push(&mut self, draw: Draw) {
        if let Some(page) = self.pages.last_mut() {
            page.push(draw);
        }
        self.fresh = false;
    }

    fn place(&mut self, flowable: &Flowable, next: Option<&Flowable>) {
        match flowable {
            Flowable::Spacer(height) => {
                if self.fresh {
                    return;
                }
                if self.fits(*height) {
                    self.y -= height;
                } else {
                    self.new_page();
                }
            }
            Flowable::Heading(text) => self.place_heading(text, next),
            Flowable::Paragraph(text) => self.place_paragraph(text),
            Flowable::Table(table) => self.place_table(table),
            Flowable::PhotoGrid(grid) => self.place_photo_grid(grid),
            Flowable::PageBreak => {
                if !self.fresh {
                    self.new_page();
                }
            }
        }
    }

    fn place_heading(&mut self, text: &str, next: Option<&Flowable>) {
        let lines = wrap_text(text, Font::Bold, HEADING_SIZE, self.frame.width);
        let leading = HEADING_SIZE * 1.2;
        let height = HEADING_SPACE_BEFORE + lines.len() as f32 * leading + HEADING_SPACE_AFTER;
        // 見出しだけがページ末尾に残らないよう、続く要素の最初の一行分を確保する
        let keep = match next {
            Some(Flowable::Paragraph(_)) => BODY_LEADING,
            Some(Flowable::Table(t)) => {
                t.header.as_ref().map(|h| t.row_height(h)).unwrap_or(0.0)
                    + t.rows.first().map(|r| t.row_height(r)).unwrap_or(0.0)
            }
            Some(Flowable::PhotoGrid(g)) => g.rows.first().map(|r| g.row_height(r)).unwrap_or(0.0),
            _ => 0.0,
        };
        if !self.fits(height + keep) && !self.fresh {
            self.new_page();
        }
        if !self.fresh {
            self.y -= HEADING_SPACE_BEFORE;
        }
        for line in lines {
            let baseline = self.y - HEADING_SIZE;
            self.push(Draw::Text {
                x: self.frame.x,
                y: baseline,
                size: HEADING_SIZE,
                font: Font::Bold,
                text: line,
            });
            self.y -= leading;
        }
        self.y -= HEADING_SPACE_AFTER;
    }

    fn place_paragraph(&mut self, text: &str) {
        for line in wrap_text(text, Font::Regular, BODY_SIZE, self.frame.width) {
            self.ensure(BODY_LEADING);
            let baseline = self.y - BODY_SIZE;
            self.push(Draw::Text {
                x: self.frame.x,
                y: baseline,
                size: BODY_SIZE,
                font: Font::Regular,
                text: line,
            });
            self.y -= BODY_LEADING;
        }
    }

    fn draw_row(&mut self, table: &Table, row: &Row) {
        let height = table.row_height(row);
        let top = self.y;
        let mut x = self.frame.x;
        let leading = table.leading();

        for ((cell, lines), width) in row.cells.iter().zip(table.cell_lines(row)).zip(&table.widths) {
            self.push(Draw::Rect {
                x,
                y: top - height,
                width: *width,
                height,
                fill: if row.shaded { Some(WHITESMOKE) } else { None },
                stroke: Some(GRID_LINE_WIDTH),
            });
            for (i, line) in lines.iter().enumerate() {
                if line.is_empty() {
                    continue;
                }
                let baseline = top - CELL_PADDING - table.font_size - i as f32 * leading;
                let anchor = match cell.align {
                    Align::Left => x + CELL_PADDING,
                    Align::Center => x + width / 2.0,
                    Align::Right => x + width - CELL_PADDING,
                };
                self.push(aligned_text(line, cell.font, table.font_size, anchor, baseline, cell.align));
            }
            x += width;
        }
        self.y -= height;
    }

    fn place_table(&mut self, table: &Table) {
        let header_height = table.header.as_ref().map(|h| table.row_height(h)).unwrap_or(0.0);
        let mut header_pending = table.header.is_some();

        if table.rows.is_empty() {
            if let Some(header) = &table.header {
                self.ensure(header_height);
                self.draw_row(table, header);
            }
            return;
        }

        for row in &table.rows {
            let height = table.row_height(row);
            let needed = height + if header_pending { header_height } else { 0.0 };
            if !self.fits(needed) && !self.fresh {
                self.new_page();
                header_pending = table.header.is_some();
            }
            if header_pending {
                if let Some(header) = &table.header {
                    self.draw_row(table, header);
                }
                header_pending = false;
            }
            if !self.fits(height) {
                log::warn!("table row taller than the frame ({:.1}pt), clipped", height);
            }
            self.draw_row(table, row);
        }
    }

    fn place_photo_grid(&mut self, grid: &PhotoGrid) {
        let (box_w, box_h) = grid.box_size();
        for row in &grid.rows {
            let height = grid.row_height(row);
            self.ensure(height);
            let top = self.y;

            for (col, slot) in row.iter().enumerate() {
                let cell_x = self.frame.x + col as f32 * grid.column_width;
                self.push(Draw::Rect {
                    x: cell_x,
                    y: top - height,
                    width: grid.column_width,
                    height,
                    fill: None,
                    stroke: Some(PHOTO_GRID_LINE_WIDTH),
                });

                let box_x = cell_x + (grid.column_width - box_w) / 2.0;
                let box_top = top - PHOTO_CELL_PADDING;
                let Some(slot) = slot else {
                    // 空き枠
                    self.push(Draw::Rect {
                        x: box_x,
                        y: box_top - box_h,
                        width: box_w,
                        height: box_h,
                        fill: None,
                        stroke: Some(GRID_LINE_WIDTH),
                    });
                    continue;
                };

                match slot.image {
                    Some(image) if image.width_px > 0 && image.height_px > 0 => {
                        let scale = (box_w / image.width_px as f32).min(box_h / image.height_px as f32);
                        let w = image.width_px as f32 * scale;
                        let h = image.height_px as f32 * scale;
                        self.push(Draw::Image {
                            index: image.index,
                            x: box_x + (box_w - w) / 2.0,
                            y: box_top - h,
                            width: w,
                            height: h,
                        });
                    }
                    _ => {
                        self.push(Draw::Rect {
                            x: box_x,
                            y: box_top - box_h,
                            width: box_w,
                            height: box_h,
                            fill: None,
                            stroke: Some(1.0),
                        });
                        self.push(aligned_text(
                            &slot.placeholder,
                            Font::Bold,
                            HEADING_SIZE,
                            box_x + box_w / 2.0,
                            box_top - box_h / 2.0 - HEADING_SIZE / 3.0,
                            Align::Center,
                        ));
                    }
                }

                let text_x = cell_x + PHOTO_CELL_PADDING;
                let mut baseline = box_top - box_h - mm_to_pt(2.0) - BODY_SIZE;
                self.push(Draw::Text {
                    x: text_x,
                    y: baseline,
                    size: BODY_SIZE,
                    font: Font::Bold,
                    text: slot.title.clone(),
                });
                for line in wrap_text(&slot.caption, Font::Regular, BODY_SIZE, grid.text_width()) {
                    if line.is_empty() {
                        continue;
                    }
                    baseline -= BODY_LEADING;
                    self.push(Draw::Text {
                        x: text_x,
                        y: baseline,
                        size: BODY_SIZE,
                        font: Font::Regular,
                        text: line,
                    });
                }
            }
            self.y -= height;
        }
    }
}

/// ストーリーをページに割り付ける（少なくとも1ページ）
pub fn paginate<F: Fn(usize) -> Frame>(story: &[Flowable], frame_for: F) -> Vec<Vec<Draw>> {
    let mut paginator = Paginator::new(frame_for);
    for (i, flowable) in story.iter().enumerate() {
        paginator.place(flowable, story.get(i + 1));
    }
    paginator.pages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(_: usize) -> Frame {
        Frame {
            x: 40.0,
            top: 500.0,
            bottom: 100.0,
            width: 500.0,
        }
    }

    fn texts(page: &[Draw]) -> Vec<&str> {
        page.iter()
            .filter_map(|d| match d {
                Draw::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn table_with_rows(n: usize) -> Table {
        Table {
            widths: vec![100.0, 400.0],
            header: Some(Row {
                cells: vec![Cell::bold("No."), Cell::bold("Descripción")],
                shaded: true,
            }),
            rows: (1..=n)
                .map(|i| Row {
                    cells: vec![Cell::regular(i.to_string()), Cell::regular(format!("Elemento {}", i))],
                    shaded: false,
                })
                .collect(),
            font_size: 8.0,
        }
    }

    #[test]
    fn test_empty_story_has_one_page() {
        let pages = paginate(&[], frame);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
    }

    #[test]
    fn test_long_table_splits_and_repeats_header() {
        // 行高 = 9.6 + 6 = 15.6pt、枠 400pt → 1ページに25行前後
        let story = vec![Flowable::Table(table_with_rows(60))];
        let pages = paginate(&story, frame);
        assert!(pages.len() >= 3, "ページ数: {}", pages.len());

        for page in &pages {
            let t = texts(page);
            assert_eq!(t[0], "No.", "各ページの先頭はヘッダー行");
            assert_eq!(t.iter().filter(|s| **s == "Descripción").count(), 1);
        }
        let all: Vec<&str> = pages.iter().flat_map(|p| texts(p)).collect();
        assert!(all.contains(&"Elemento 1"));
        assert!(all.contains(&"Elemento 60"));
    }

    #[test]
    fn test_table_rows_stay_inside_frame() {
        let pages = paginate(&[Flowable::Table(table_with_rows(40))], frame);
        for page in &pages {
            for draw in page {
                if let Draw::Rect { y, .. } = draw {
                    assert!(*y >= 100.0 - 0.01, "枠の下端を超えている: {}", y);
                }
            }
        }
    }

    #[test]
    fn test_paragraph_splits_across_pages() {
        let text = (0..60).map(|i| format!("Línea {}", i)).collect::<Vec<_>>().join("\n");
        let pages = paginate(&[Flowable::Paragraph(text)], frame);
        // 400pt / 12pt = 33行
        assert_eq!(pages.len(), 2);
        assert_eq!(texts(&pages[0]).len(), 33);
        assert_eq!(texts(&pages[1])[0], "Línea 33");
    }

    #[test]
    fn test_heading_not_orphaned_at_page_end() {
        let filler = (0..32).map(|_| "x").collect::<Vec<_>>().join("\n");
        let story = vec![
            Flowable::Paragraph(filler),
            Flowable::Heading("5. OBSERVACIONES GENERALES:".into()),
            Flowable::Paragraph("Sin observaciones".into()),
        ];
        let pages = paginate(&story, frame);
        assert_eq!(pages.len(), 2);
        assert_eq!(texts(&pages[1])[0], "5. OBSERVACIONES GENERALES:");
    }

    #[test]
    fn test_page_break_and_spacer() {
        let story = vec![
            Flowable::Spacer(20.0),
            Flowable::Paragraph("uno".into()),
            Flowable::PageBreak,
            Flowable::PageBreak,
            Flowable::Paragraph("dos".into()),
        ];
        let pages = paginate(&story, frame);
        assert_eq!(pages.len(), 2);
        // 先頭のスペーサーは無視される
        match &pages[0][0] {
            Draw::Text { y, .. } => assert!((*y - (500.0 - BODY_SIZE)).abs() < 0.01),
            other => panic!("unexpected draw: {:?}", other),
        }
    }

    #[test]
    fn test_photo_grid_placeholder_and_fit() {
        let grid = PhotoGrid {
            column_width: 250.0,
            rows: vec![vec![
                Some(PhotoSlot {
                    image: Some(ImageRef { index: 0, width_px: 1000, height_px: 1000 }),
                    placeholder: "FOTO 1".into(),
                    title: "Foto 1".into(),
                    caption: "Junta J-01".into(),
                }),
                Some(PhotoSlot {
                    image: None,
                    placeholder: "FOTO 2".into(),
                    title: "Foto 2".into(),
                    caption: String::new(),
                }),
            ]],
        };
        let pages = paginate(&[Flowable::PhotoGrid(grid)], frame);
        let page = &pages[0];

        let image = page
            .iter()
            .find_map(|d| match d {
                Draw::Image { width, height, .. } => Some((*width, *height)),
                _ => None,
            })
            .unwrap();
        // 正方形の画像は高さ45mmに合わせて縮小
        assert!((image.1 - mm_to_pt(45.0)).abs() < 0.01);
        assert!((image.0 - image.1).abs() < 0.01);

        let t = texts(page);
        assert!(t.contains(&"FOTO 2"));
        assert!(t.contains(&"Junta J-01"));
    }

    #[test]
    fn test_aligned_text() {
        let right = aligned_text("Página 1 de 3", Font::Regular, 9.0, 500.0, 10.0, Align::Right);
        match right {
            Draw::Text { x, .. } => {
                let width = text_width("Página 1 de 3", Font::Regular, 9.0);
                assert!((x + width - 500.0).abs() < 0.001);
            }
            other => panic!("unexpected draw: {:?}", other),
        }
    }
}
