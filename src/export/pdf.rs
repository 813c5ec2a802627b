//! PDF文書の組み立て
//!
//! 画像を品質設定に合わせて縮小・再圧縮して埋め込み、ストーリーを割り付けて
//! ページテンプレートと合成する。ページ番号は割り付け後の総ページ数で描く。

use super::canvas::{page_ops, EmbeddedImage};
use super::flow::{paginate, Draw, ImageRef};
use super::story::{build_story, EmbeddedImages};
use super::template::PageTemplate;
use crate::cli::PdfQuality;
use crate::config::Config;
use crate::error::{ReportError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use inspection_report_common::export::pdf_core::PdfLayoutCore;
use inspection_report_common::layout::{HeaderMode, PageLayout};
use inspection_report_common::{PhotoAttachment, ReportData};
use printpdf::{Mm, PdfDocument, PdfPage, PdfSaveOptions, RawImage};
use std::path::{Path, PathBuf};

/// 描画オプション
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub quality: PdfQuality,
    pub company_name: String,
    pub copyright: String,
    pub logo_path: Option<PathBuf>,
}

impl RenderOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            quality: config.pdf_quality,
            company_name: config.company_name.clone(),
            copyright: config.copyright.clone(),
            logo_path: config.logo_path.clone(),
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 縮小してJPEGに再圧縮（戻り値: JPEGバイト列, 幅, 高さ）
pub fn prepare_image(data: &[u8], quality: PdfQuality) -> Result<(Vec<u8>, u32, u32)> {
    let img = image::load_from_memory(data).map_err(|e| ReportError::ImageLoad(e.to_string()))?;

    let img = if img.width() > quality.max_width() {
        img.resize(quality.max_width(), u32::MAX, FilterType::Triangle)
    } else {
        img
    };

    let rgb = img.to_rgb8();
    let mut jpeg = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, quality.jpeg_quality()))
        .map_err(|e| ReportError::ImageLoad(e.to_string()))?;

    Ok((jpeg, rgb.width(), rgb.height()))
}

/// 画像テーブル付きの文書
struct DocumentBuilder {
    doc: PdfDocument,
    images: Vec<EmbeddedImage>,
    quality: PdfQuality,
}

impl DocumentBuilder {
    fn new(title: &str, quality: PdfQuality) -> Self {
        Self {
            doc: PdfDocument::new(title),
            images: Vec::new(),
            quality,
        }
    }

    fn embed(&mut self, data: &[u8]) -> Result<ImageRef> {
        let (jpeg, width_px, height_px) = prepare_image(data, self.quality)?;
        let mut warnings = Vec::new();
        let raw = RawImage::decode_from_bytes(&jpeg, &mut warnings)
            .map_err(|e| ReportError::ImageLoad(e.to_string()))?;
        let id = self.doc.add_image(&raw);

        let index = self.images.len();
        self.images.push(EmbeddedImage {
            id,
            width_px,
            height_px,
        });
        Ok(ImageRef {
            index,
            width_px,
            height_px,
        })
    }

    /// 写真を埋め込む（データなし・読めない画像は None でプレースホルダーになる）
    fn embed_photos(&mut self, photos: &[PhotoAttachment]) -> Vec<Option<ImageRef>> {
        photos
            .iter()
            .map(|photo| {
                let data = photo.data.as_deref()?;
                match self.embed(data) {
                    Ok(image) => Some(image),
                    Err(e) => {
                        log::warn!("photo '{}' could not be embedded: {}", photo.name, e);
                        None
                    }
                }
            })
            .collect()
    }

    fn embed_logo(&mut self, path: Option<&Path>) -> Option<ImageRef> {
        let path = path?;
        let loaded = std::fs::read(path)
            .map_err(ReportError::from)
            .and_then(|data| self.embed(&data));
        match loaded {
            Ok(image) => Some(image),
            Err(e) => {
                log::debug!("logo ignored ({}): {}", path.display(), e);
                None
            }
        }
    }
}

/// 割り付けとページ装飾を済ませた報告書
///
/// `pages` の1要素が最終PDFの1ページになる。
pub struct ComposedReport {
    builder: DocumentBuilder,
    page_layout: PageLayout,
    pub pages: Vec<Vec<Draw>>,
}

impl ComposedReport {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn into_pdf(self) -> Result<Vec<u8>> {
        let Self {
            mut builder,
            page_layout,
            pages,
        } = self;
        let pdf_pages: Vec<PdfPage> = pages
            .iter()
            .map(|draws| {
                PdfPage::new(
                    Mm(page_layout.page_width_mm),
                    Mm(page_layout.page_height_mm),
                    page_ops(draws, &builder.images),
                )
            })
            .collect();

        let mut warnings = Vec::new();
        let bytes = builder
            .doc
            .with_pages(pdf_pages)
            .save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            log::debug!("pdf warnings: {}", warnings.len());
        }
        if bytes.is_empty() {
            return Err(ReportError::PdfGeneration("空のPDFが生成されました".into()));
        }
        Ok(bytes)
    }
}

/// 画像を埋め込み、本文を割り付けてから総ページ数入りのテンプレートを重ねる
pub fn compose(data: &ReportData, header_mode: HeaderMode, options: &RenderOptions) -> ComposedReport {
    let mut builder = DocumentBuilder::new(&data.header.title, options.quality);

    let embedded = EmbeddedImages {
        photos: builder.embed_photos(&data.photos),
        scheme: builder.embed_photos(&data.scheme),
    };
    let logo = builder.embed_logo(options.logo_path.as_deref());

    let page_layout = PageLayout::letter(header_mode);
    let core = PdfLayoutCore::from_layout(&page_layout);
    let story = build_story(data, &embedded);
    let bodies = paginate(&story, |i| core.frame_for_page(i));
    let total = bodies.len();
    log::debug!("{}: {} flowables on {} pages", data.method.code(), story.len(), total);

    let template = PageTemplate {
        header: &data.header,
        layout: &core,
        company_name: &options.company_name,
        copyright: &options.copyright,
        logo,
    };
    let pages = bodies
        .into_iter()
        .enumerate()
        .map(|(i, body)| {
            let mut draws = template.decorate(i, total);
            draws.extend(body);
            draws
        })
        .collect();

    ComposedReport {
        builder,
        page_layout,
        pages,
    }
}

/// 報告書データをPDFバイト列にする
pub fn render_pdf(data: &ReportData, header_mode: HeaderMode, options: &RenderOptions) -> Result<Vec<u8>> {
    compose(data, header_mode, options).into_pdf()
}

/// PDFを書き出す（出力先ディレクトリは作成する）
pub fn write_pdf(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([200, 120, 40]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn test_prepare_image_resizes_to_quality() {
        let (jpeg, width, height) = prepare_image(&png(1200, 600), PdfQuality::Low).unwrap();
        assert_eq!(width, 500);
        assert_eq!(height, 250);
        // JPEG SOI マーカー
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_prepare_image_keeps_small_images() {
        let (_, width, height) = prepare_image(&png(300, 200), PdfQuality::High).unwrap();
        assert_eq!((width, height), (300, 200));
    }

    #[test]
    fn test_prepare_image_rejects_garbage() {
        let result = prepare_image(b"not an image", PdfQuality::Medium);
        assert!(matches!(result, Err(ReportError::ImageLoad(_))));
    }

    #[test]
    fn test_broken_photo_becomes_placeholder() {
        let mut builder = DocumentBuilder::new("t", PdfQuality::Low);
        let photos = vec![
            PhotoAttachment::new("ok.png", "", png(40, 20)),
            PhotoAttachment::new("broken.jpg", "", b"xx".to_vec()),
            PhotoAttachment {
                name: "nodata.jpg".into(),
                caption: String::new(),
                data: None,
            },
        ];
        let refs = builder.embed_photos(&photos);
        assert!(refs[0].is_some());
        assert!(refs[1].is_none());
        assert!(refs[2].is_none());
        assert_eq!(builder.images.len(), 1);
    }

    #[test]
    fn test_missing_logo_is_ignored() {
        let mut builder = DocumentBuilder::new("t", PdfQuality::Low);
        assert!(builder.embed_logo(Some(Path::new("/nonexistent/logo.png"))).is_none());
        assert!(builder.embed_logo(None).is_none());
    }
}
