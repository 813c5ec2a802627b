//! レイアウト設定モジュール
//!
//! mm基準のページ定義（US Letter）。描画側はpt換算した値を使う。

// ============================================
// mm基準レイアウト
// ============================================

/// US Letterサイズ（mm）
pub const LETTER_WIDTH_MM: f32 = 215.9;
pub const LETTER_HEIGHT_MM: f32 = 279.4;

/// 余白設定（mm）
pub const MARGIN_LEFT_MM: f32 = 15.0;
pub const MARGIN_RIGHT_MM: f32 = 15.0;
pub const MARGIN_TOP_MM: f32 = 18.0;
pub const MARGIN_BOTTOM_MM: f32 = 45.0;

/// 本文幅（mm）
pub const CONTENT_WIDTH_MM: f32 = LETTER_WIDTH_MM - MARGIN_LEFT_MM - MARGIN_RIGHT_MM; // 185.9mm

/// ヘッダー（mm、ページ下端からの位置）
pub const TITLE_Y_MM: f32 = 272.0;
pub const TITLE_CENTER_X_MM: f32 = 105.0;
pub const NORM_Y_MM: f32 = 265.0;
pub const LOGO_Y_MM: f32 = 262.0;
pub const LOGO_WIDTH_MM: f32 = 32.0;
pub const LOGO_HEIGHT_MM: f32 = 16.0;

/// メタデータ枠（mm）
pub const META_BOX_Y_MM: f32 = 220.0;
pub const META_BOX_HEIGHT_MM: f32 = 38.0;
pub const META_ROW_HEIGHT_MM: f32 = 7.0;
pub const META_LABEL_WIDTH_MM: f32 = 38.0;
pub const META_VALUE_WIDTH_MM: f32 = 46.0;
pub const META_INNER_PADDING_MM: f32 = 3.0;
pub const META_ROWS: usize = 5;

/// ヘッダーのあるページで本文枠の上端（mm）
pub const HEADER_FRAME_PADDING_MM: f32 = 6.0;
pub const HEADER_FRAME_TOP_MM: f32 = META_BOX_Y_MM - HEADER_FRAME_PADDING_MM; // 214mm

/// フッター（mm）
pub const FOOTER_Y_MM: f32 = 15.0;
pub const FOOTER_LEGEND_WIDTH_MM: f32 = CONTENT_WIDTH_MM - FOOTER_COMPANY_WIDTH_MM - FOOTER_CLIENT_WIDTH_MM;
pub const FOOTER_COMPANY_WIDTH_MM: f32 = 55.0;
pub const FOOTER_CLIENT_WIDTH_MM: f32 = 25.0;
pub const FOOTER_ROW_HEIGHT_MM: f32 = 12.0;

/// 縦書きの著作権表示（mm）
pub const COPYRIGHT_X_MM: f32 = 10.0;
pub const COPYRIGHT_Y_MM: f32 = 140.0;

/// ページ番号（mm、右揃え）
pub const PAGE_NUMBER_X_MM: f32 = 200.0;
pub const PAGE_NUMBER_Y_MM: f32 = 10.0;

/// 写真セル（mm）
pub const PHOTO_BOX_WIDTH_MM: f32 = 75.0;
pub const PHOTO_BOX_HEIGHT_MM: f32 = 45.0;

// ============================================
// 変換係数
// ============================================

/// mm → pt変換 (1mm = 72/25.4 pt ≈ 2.835pt)
pub const MM_TO_PT: f32 = 72.0 / 25.4;

pub fn mm_to_pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

pub fn pt_to_mm(pt: f32) -> f32 {
    pt / MM_TO_PT
}

// ============================================
// ヘッダー表示モード
// ============================================

/// ヘッダー（タイトル・メタデータ枠）を描くページ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// 全ページ（外観検査）
    EveryPage,
    /// 1ページ目のみ（PT/MT/UT）
    FirstPageOnly,
}

impl HeaderMode {
    /// 0始まりのページ番号でヘッダーを描くか
    pub fn has_header(&self, page_index: usize) -> bool {
        match self {
            HeaderMode::EveryPage => true,
            HeaderMode::FirstPageOnly => page_index == 0,
        }
    }
}

// ============================================
// レイアウト設定構造体
// ============================================

/// PDFページ設定（mm）
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_left_mm: f32,
    pub margin_right_mm: f32,
    pub margin_top_mm: f32,
    pub margin_bottom_mm: f32,
    /// ヘッダーありページの本文上端
    pub header_frame_top_mm: f32,
    pub header_mode: HeaderMode,
}

impl PageLayout {
    pub fn letter(header_mode: HeaderMode) -> Self {
        Self {
            page_width_mm: LETTER_WIDTH_MM,
            page_height_mm: LETTER_HEIGHT_MM,
            margin_left_mm: MARGIN_LEFT_MM,
            margin_right_mm: MARGIN_RIGHT_MM,
            margin_top_mm: MARGIN_TOP_MM,
            margin_bottom_mm: MARGIN_BOTTOM_MM,
            header_frame_top_mm: HEADER_FRAME_TOP_MM,
            header_mode,
        }
    }

    pub fn content_width_mm(&self) -> f32 {
        self.page_width_mm - self.margin_left_mm - self.margin_right_mm
    }
}
