//! 報告書データからフロー要素の並び（ストーリー）を組み立てる

use super::flow::{Cell, Flowable, ImageRef, PhotoGrid, PhotoSlot, Row, Table};
use inspection_report_common::extract::SCHEME_TITLE;
use inspection_report_common::layout::{mm_to_pt, CONTENT_WIDTH_MM};
use inspection_report_common::report::{PhotoLayout, ReportData, Section};
use inspection_report_common::PhotoAttachment;

pub const CHECKLIST_OBSERVATION_HEADER: &str = "OBSERVACIONES";
const CHECKLIST_ITEM_WIDTH_MM: f32 = 130.9;
const CHECKLIST_OBSERVATION_WIDTH_MM: f32 = 55.0;
const DATA_TABLE_FONT: f32 = 8.0;
const BOX_FONT: f32 = 9.0;
const SECTION_GAP: f32 = 6.0;

/// 写真グリッドの1グリッドあたりの枚数（3行×2列）
pub const GROUP_SIZE: usize = 6;
const GROUP_COLUMNS: usize = 2;

/// 埋め込み済み画像の参照（写真・配置図と同じ並び、読めなかった画像は None）
#[derive(Debug, Clone, Default)]
pub struct EmbeddedImages {
    pub photos: Vec<Option<ImageRef>>,
    pub scheme: Vec<Option<ImageRef>>,
}

fn header_row(cells: Vec<Cell>) -> Row {
    Row { cells, shaded: true }
}

fn section_flowables(section: &Section) -> Vec<Flowable> {
    let content_width = mm_to_pt(CONTENT_WIDTH_MM);
    match section {
        Section::TextBox { title, lines } => {
            let rows = if lines.is_empty() {
                Vec::new()
            } else {
                vec![Row {
                    cells: vec![Cell::regular(lines.join("\n"))],
                    shaded: false,
                }]
            };
            vec![Flowable::Table(Table {
                widths: vec![content_width],
                header: Some(header_row(vec![Cell::bold(title.clone())])),
                rows,
                font_size: BOX_FONT,
            })]
        }
        Section::Paragraph { title, body } => vec![
            Flowable::Heading(title.clone()),
            Flowable::Paragraph(body.clone()),
        ],
        Section::Checklist { title, rows } => vec![Flowable::Table(Table {
            widths: vec![mm_to_pt(CHECKLIST_ITEM_WIDTH_MM), mm_to_pt(CHECKLIST_OBSERVATION_WIDTH_MM)],
            header: Some(header_row(vec![
                Cell::bold(title.clone()),
                Cell::bold(CHECKLIST_OBSERVATION_HEADER).centered(),
            ])),
            rows: rows
                .iter()
                .map(|(item, observation)| Row {
                    cells: vec![Cell::regular(item.clone()), Cell::regular(observation.clone())],
                    shaded: false,
                })
                .collect(),
            font_size: DATA_TABLE_FONT,
        })],
        Section::Table {
            title,
            columns,
            rows,
            empty_message,
        } => {
            let mut out = vec![Flowable::Heading(title.clone())];
            if rows.is_empty() {
                out.push(Flowable::Paragraph(empty_message.clone()));
            } else {
                out.push(Flowable::Table(Table {
                    widths: columns.iter().map(|c| mm_to_pt(c.width_mm)).collect(),
                    header: Some(header_row(
                        columns.iter().map(|c| Cell::bold(c.header.clone()).centered()).collect(),
                    )),
                    rows: rows
                        .iter()
                        .map(|row| Row {
                            cells: row.iter().map(|v| Cell::regular(v.clone())).collect(),
                            shaded: false,
                        })
                        .collect(),
                    font_size: DATA_TABLE_FONT,
                }));
            }
            out
        }
    }
}

fn slot(
    photo: &PhotoAttachment,
    image: Option<ImageRef>,
    number: usize,
    title: String,
) -> PhotoSlot {
    PhotoSlot {
        image,
        placeholder: format!("FOTO {}", number),
        title,
        caption: photo.caption.clone(),
    }
}

/// スロットを列数ごとの行に分ける（最終行は空枠で埋める）
fn into_rows(slots: Vec<PhotoSlot>, columns: usize, min_rows: usize) -> Vec<Vec<Option<PhotoSlot>>> {
    let mut cells: Vec<Option<PhotoSlot>> = slots.into_iter().map(Some).collect();
    let rows = cells.len().div_ceil(columns).max(min_rows);
    cells.resize(rows * columns, None);

    let mut out = Vec::with_capacity(rows);
    let mut iter = cells.into_iter();
    for _ in 0..rows {
        out.push(iter.by_ref().take(columns).collect());
    }
    out
}

/// 写真の並べ方に従ってグリッドを作る
pub fn photo_grids(
    layout: PhotoLayout,
    photos: &[PhotoAttachment],
    images: &[Option<ImageRef>],
) -> Vec<PhotoGrid> {
    let content_width = mm_to_pt(CONTENT_WIDTH_MM);
    let slots: Vec<PhotoSlot> = photos
        .iter()
        .enumerate()
        .map(|(i, photo)| {
            let number = i + 1;
            slot(photo, images.get(i).copied().flatten(), number, layout.cell_title(number))
        })
        .collect();

    if slots.is_empty() {
        return Vec::new();
    }

    match layout {
        PhotoLayout::TwoColumn => vec![PhotoGrid {
            column_width: content_width / 2.0,
            rows: into_rows(slots, 2, 1),
        }],
        PhotoLayout::Grouped if slots.len() >= GROUP_SIZE => {
            let mut grids = Vec::new();
            let mut remaining = slots.into_iter().peekable();
            while remaining.peek().is_some() {
                let chunk: Vec<PhotoSlot> = remaining.by_ref().take(GROUP_SIZE).collect();
                grids.push(PhotoGrid {
                    column_width: content_width / GROUP_COLUMNS as f32,
                    rows: into_rows(chunk, GROUP_COLUMNS, GROUP_SIZE / GROUP_COLUMNS),
                });
            }
            grids
        }
        PhotoLayout::Grouped => {
            let columns = slots.len().max(2);
            vec![PhotoGrid {
                column_width: content_width / columns as f32,
                rows: into_rows(slots, columns, 1),
            }]
        }
    }
}

fn scheme_grid(scheme: &[PhotoAttachment], images: &[Option<ImageRef>]) -> PhotoGrid {
    let slots = scheme
        .iter()
        .enumerate()
        .map(|(i, image)| {
            let number = i + 1;
            slot(image, images.get(i).copied().flatten(), number, format!("Esquema N° {}", number))
        })
        .collect();
    PhotoGrid {
        column_width: mm_to_pt(CONTENT_WIDTH_MM) / 2.0,
        rows: into_rows(slots, 2, 1),
    }
}

/// 報告書全体のストーリー
pub fn build_story(data: &ReportData, images: &EmbeddedImages) -> Vec<Flowable> {
    let mut story = Vec::new();

    for section in &data.sections {
        story.extend(section_flowables(section));
        story.push(Flowable::Spacer(SECTION_GAP));
    }

    if !data.scheme.is_empty() {
        story.push(Flowable::Heading(SCHEME_TITLE.to_string()));
        story.push(Flowable::PhotoGrid(scheme_grid(&data.scheme, &images.scheme)));
        story.push(Flowable::Spacer(SECTION_GAP));
    }

    story.push(Flowable::Heading(data.photo_heading.clone()));
    if data.photos.is_empty() {
        story.push(Flowable::Paragraph(data.photo_layout.empty_message().to_string()));
    } else {
        for (i, grid) in photo_grids(data.photo_layout, &data.photos, &images.photos)
            .into_iter()
            .enumerate()
        {
            if i > 0 {
                story.push(Flowable::Spacer(SECTION_GAP));
            }
            story.push(Flowable::PhotoGrid(grid));
        }
    }

    story
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspection_report_common::report::{Column, ReportHeader};
    use inspection_report_common::InspectionMethod;

    fn photos(n: usize) -> Vec<PhotoAttachment> {
        (1..=n)
            .map(|i| PhotoAttachment::new(format!("{}.jpg", i), format!("Junta {}", i), vec![1, 2, 3]))
            .collect()
    }

    fn filled(grid: &PhotoGrid) -> usize {
        grid.rows.iter().flatten().filter(|c| c.is_some()).count()
    }

    #[test]
    fn test_grouped_six_or_more_uses_three_by_two_grids() {
        let grids = photo_grids(PhotoLayout::Grouped, &photos(8), &[]);
        assert_eq!(grids.len(), 2);
        for grid in &grids {
            assert_eq!(grid.rows.len(), 3);
            assert!(grid.rows.iter().all(|r| r.len() == 2));
        }
        assert_eq!(filled(&grids[0]), 6);
        // 最後のグリッドは空枠で埋める
        assert_eq!(filled(&grids[1]), 2);
        assert_eq!(grids[1].rows[2][1], None);
        let last = grids[1].rows[0][1].as_ref().unwrap();
        assert_eq!(last.title, "Foto 8");
    }

    #[test]
    fn test_grouped_fewer_than_six_is_single_row() {
        let grids = photo_grids(PhotoLayout::Grouped, &photos(4), &[]);
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].rows.len(), 1);
        assert_eq!(grids[0].rows[0].len(), 4);

        let single = photo_grids(PhotoLayout::Grouped, &photos(1), &[]);
        assert_eq!(single[0].rows[0].len(), 2);
        assert_eq!(single[0].rows[0][1], None);
    }

    #[test]
    fn test_two_column_layout() {
        let grids = photo_grids(PhotoLayout::TwoColumn, &photos(5), &[]);
        assert_eq!(grids.len(), 1);
        assert_eq!(grids[0].rows.len(), 3);
        let first = grids[0].rows[0][0].as_ref().unwrap();
        assert_eq!(first.title, "Registro Fotográfico N° 1");
        assert_eq!(first.placeholder, "FOTO 1");
        assert!(first.image.is_none());
    }

    #[test]
    fn test_images_attach_by_position() {
        let image = ImageRef { index: 7, width_px: 10, height_px: 5 };
        let grids = photo_grids(PhotoLayout::TwoColumn, &photos(2), &[None, Some(image)]);
        assert_eq!(grids[0].rows[0][0].as_ref().unwrap().image, None);
        assert_eq!(grids[0].rows[0][1].as_ref().unwrap().image, Some(image));
    }

    fn report(photos: Vec<PhotoAttachment>, sections: Vec<Section>) -> ReportData {
        ReportData {
            method: InspectionMethod::Penetrant,
            header: ReportHeader {
                title: "T".into(),
                norm: "N".into(),
                left: vec![],
                right: vec![],
            },
            sections,
            photo_heading: "11. REGISTROS FOTOGRÁFICOS".into(),
            photos,
            scheme: vec![],
            photo_layout: PhotoLayout::Grouped,
        }
    }

    #[test]
    fn test_story_without_photos_has_placeholder() {
        let story = build_story(&report(vec![], vec![]), &EmbeddedImages::default());
        assert_eq!(
            story,
            vec![
                Flowable::Heading("11. REGISTROS FOTOGRÁFICOS".into()),
                Flowable::Paragraph("No hay registros fotográficos.".into()),
            ]
        );
    }

    #[test]
    fn test_empty_table_renders_message() {
        let section = Section::Table {
            title: "8. ELEMENTOS INSPECCIONADOS:".into(),
            columns: vec![Column::new("No.", 12.0)],
            rows: vec![],
            empty_message: "No hay elementos inspeccionados registrados.".into(),
        };
        let flowables = section_flowables(&section);
        assert_eq!(
            flowables[1],
            Flowable::Paragraph("No hay elementos inspeccionados registrados.".into())
        );
    }

    #[test]
    fn test_checklist_table_columns() {
        let section = Section::Checklist {
            title: "4. ANTES DE INICIAR EL PROCESO DE SOLDADURA".into(),
            rows: vec![("Verificar WPS".into(), "Satisfactorio".into())],
        };
        match &section_flowables(&section)[0] {
            Flowable::Table(table) => {
                assert_eq!(table.widths.len(), 2);
                let header = table.header.as_ref().unwrap();
                assert_eq!(header.cells[1].text, CHECKLIST_OBSERVATION_HEADER);
                assert_eq!(table.rows.len(), 1);
            }
            other => panic!("unexpected flowable: {:?}", other),
        }
    }

    #[test]
    fn test_scheme_comes_before_photos() {
        let mut data = report(photos(1), vec![]);
        data.scheme = photos(1);
        let story = build_story(&data, &EmbeddedImages::default());
        let scheme_at = story
            .iter()
            .position(|f| *f == Flowable::Heading(SCHEME_TITLE.into()))
            .unwrap();
        let photos_at = story
            .iter()
            .position(|f| *f == Flowable::Heading("11. REGISTROS FOTOGRÁFICOS".into()))
            .unwrap();
        assert!(scheme_at < photos_at);
    }
}
