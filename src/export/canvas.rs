//! 描画命令を printpdf のオペレーションに変換する

use super::flow::{Color as DrawColor, Draw};
use super::fonts::Font;
use printpdf::{
    BuiltinFont, Color, Line, LinePoint, Op, PaintMode, Point, Polygon, PolygonRing, Pt, Rgb,
    TextItem, TextMatrix, WindingOrder, XObjectId, XObjectTransform,
};

fn builtin(font: Font) -> BuiltinFont {
    match font {
        Font::Regular => BuiltinFont::Helvetica,
        Font::Bold => BuiltinFont::HelveticaBold,
    }
}

fn rgb(color: DrawColor) -> Color {
    Color::Rgb(Rgb::new(color.0, color.1, color.2, None))
}

const BLACK: DrawColor = DrawColor(0.0, 0.0, 0.0);

fn point(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

fn rect_ring(x: f32, y: f32, width: f32, height: f32) -> PolygonRing {
    PolygonRing {
        points: vec![
            point(x, y),
            point(x + width, y),
            point(x + width, y + height),
            point(x, y + height),
        ],
    }
}

fn text_ops(ops: &mut Vec<Op>, font: Font, size: f32, text: &str) {
    let font = builtin(font);
    ops.push(Op::SetFontSizeBuiltinFont { size: Pt(size), font });
    ops.push(Op::WriteTextBuiltinFont {
        items: vec![TextItem::Text(text.to_string())],
        font,
    });
}

/// 文書に登録済みの画像
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub id: XObjectId,
    pub width_px: u32,
    pub height_px: u32,
}

/// 1ページ分の描画命令をオペレーション列にする
///
/// `images` は画像テーブル（Draw::Image の番号で引く）。
pub fn page_ops(draws: &[Draw], images: &[EmbeddedImage]) -> Vec<Op> {
    let mut ops = Vec::with_capacity(draws.len() * 4);
    ops.push(Op::SetOutlineColor { col: rgb(BLACK) });
    ops.push(Op::SetFillColor { col: rgb(BLACK) });

    for draw in draws {
        match draw {
            Draw::Text { x, y, size, font, text } => {
                if text.is_empty() {
                    continue;
                }
                ops.push(Op::StartTextSection);
                ops.push(Op::SetTextCursor {
                    pos: Point { x: Pt(*x), y: Pt(*y) },
                });
                text_ops(&mut ops, *font, *size, text);
                ops.push(Op::EndTextSection);
            }
            Draw::RotatedText { x, y, size, font, text, degrees } => {
                ops.push(Op::SaveGraphicsState);
                ops.push(Op::StartTextSection);
                ops.push(Op::SetTextMatrix {
                    matrix: TextMatrix::TranslateRotate(Pt(*x), Pt(*y), *degrees),
                });
                text_ops(&mut ops, *font, *size, text);
                ops.push(Op::EndTextSection);
                ops.push(Op::RestoreGraphicsState);
            }
            Draw::Line { from, to, width } => {
                ops.push(Op::SetOutlineThickness { pt: Pt(*width) });
                ops.push(Op::DrawLine {
                    line: Line {
                        points: vec![point(from.0, from.1), point(to.0, to.1)],
                        is_closed: false,
                    },
                });
            }
            Draw::Rect { x, y, width, height, fill, stroke } => {
                if let Some(color) = fill {
                    ops.push(Op::SetFillColor { col: rgb(*color) });
                    ops.push(Op::DrawPolygon {
                        polygon: Polygon {
                            rings: vec![rect_ring(*x, *y, *width, *height)],
                            mode: PaintMode::Fill,
                            winding_order: WindingOrder::NonZero,
                        },
                    });
                    // 後続のテキストは黒
                    ops.push(Op::SetFillColor { col: rgb(BLACK) });
                }
                if let Some(line_width) = stroke {
                    ops.push(Op::SetOutlineThickness { pt: Pt(*line_width) });
                    ops.push(Op::DrawPolygon {
                        polygon: Polygon {
                            rings: vec![rect_ring(*x, *y, *width, *height)],
                            mode: PaintMode::Stroke,
                            winding_order: WindingOrder::NonZero,
                        },
                    });
                }
            }
            Draw::Image { index, x, y, width, height } => {
                let Some(image) = images.get(*index) else {
                    log::warn!("image #{} is not embedded, skipped", index);
                    continue;
                };
                ops.push(Op::UseXobject {
                    id: image.id.clone(),
                    transform: XObjectTransform {
                        translate_x: Some(Pt(*x)),
                        translate_y: Some(Pt(*y)),
                        rotate: None,
                        // dpi 72 なので 1px = 1pt
                        scale_x: Some(width / image.width_px.max(1) as f32),
                        scale_y: Some(height / image.height_px.max(1) as f32),
                        dpi: Some(72.0),
                    },
                });
            }
        }
    }
    ops
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_wrapped_in_text_section() {
        let ops = page_ops(
            &[Draw::Text {
                x: 10.0,
                y: 20.0,
                size: 9.0,
                font: Font::Bold,
                text: "Cliente".into(),
            }],
            &[],
        );
        let start = ops.iter().position(|op| matches!(op, Op::StartTextSection)).unwrap();
        let end = ops.iter().position(|op| matches!(op, Op::EndTextSection)).unwrap();
        assert!(start < end);
        assert!(ops[start..end]
            .iter()
            .any(|op| matches!(op, Op::WriteTextBuiltinFont { font: BuiltinFont::HelveticaBold, .. })));
    }

    #[test]
    fn test_missing_image_and_empty_text_are_skipped() {
        let draws = vec![
            Draw::Image {
                index: 0,
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
            },
            Draw::Text {
                x: 0.0,
                y: 0.0,
                size: 9.0,
                font: Font::Regular,
                text: String::new(),
            },
        ];
        let ops = page_ops(&draws, &[]);
        assert!(!ops.iter().any(|op| matches!(op, Op::UseXobject { .. })));
        assert!(!ops.iter().any(|op| matches!(op, Op::StartTextSection)));
    }

    #[test]
    fn test_shaded_rect_restores_black_fill() {
        let ops = page_ops(
            &[Draw::Rect {
                x: 0.0,
                y: 0.0,
                width: 10.0,
                height: 10.0,
                fill: Some(DrawColor(0.9, 0.9, 0.9)),
                stroke: Some(0.6),
            }],
            &[],
        );
        let polygons = ops.iter().filter(|op| matches!(op, Op::DrawPolygon { .. })).count();
        assert_eq!(polygons, 2);
        let fills = ops.iter().filter(|op| matches!(op, Op::SetFillColor { .. })).count();
        assert_eq!(fills, 3);
    }
}
