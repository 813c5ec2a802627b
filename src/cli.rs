use clap::{Args, Parser, Subcommand};
use inspection_report_common::InspectionMethod;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "inspection-report")]
#[command(about = "溶接検査データ入力・PDF報告書生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// セッションファイル（省略時は設定または環境変数）
    #[arg(long, global = true)]
    pub session: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// プロジェクト情報（ヘッダー）
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// 検査ブロックをJSONで登録/表示
    Block {
        #[command(subcommand)]
        action: BlockAction,
    },

    /// 検査要素の追加/削除/一覧
    Element {
        #[command(subcommand)]
        action: ElementAction,
    },

    /// 写真記録の追加/削除/一覧
    Photo {
        #[command(subcommand)]
        action: PhotoAction,
    },

    /// 要素配置図（全検査方法で共有）
    Scheme {
        #[command(subcommand)]
        action: SchemeAction,
    },

    /// 参照データを表示
    Reference {
        /// 種類 (kits/procedures/materials/inspectors/norms/processes/types/specs)
        #[arg(required = true)]
        kind: ReferenceKind,

        /// 検査方法で絞り込み (visual/penetrant/magnetic/ultrasound)
        #[arg(short, long)]
        method: Option<InspectionMethod>,
    },

    /// データのある検査方法を表示
    Available,

    /// PDF報告書を生成
    Report {
        /// 検査方法（省略時はデータのある全方法）
        method: Option<InspectionMethod>,

        /// 出力ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// PDF画像品質 (high/medium/low)
        #[arg(long)]
        pdf_quality: Option<PdfQuality>,
    },

    /// 設定を表示/編集
    Config {
        /// 参照CSVディレクトリを設定
        #[arg(long)]
        set_reference_dir: Option<PathBuf>,

        /// 出力ディレクトリを設定
        #[arg(long)]
        set_output_dir: Option<PathBuf>,

        /// ロゴ画像を設定
        #[arg(long)]
        set_logo: Option<PathBuf>,

        /// PDF画像品質を設定
        #[arg(long)]
        set_pdf_quality: Option<PdfQuality>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// ヘッダー項目を設定（指定しない項目は現在値のまま）
    Set(ProjectFields),
    /// 現在のヘッダーを表示
    Show,
}

#[derive(Args, Debug, Default)]
pub struct ProjectFields {
    #[arg(long)]
    pub client: Option<String>,
    #[arg(long)]
    pub project: Option<String>,
    #[arg(long)]
    pub sub_project: Option<String>,
    #[arg(long)]
    pub contractor: Option<String>,
    #[arg(long)]
    pub report_number: Option<String>,
    #[arg(long)]
    pub prepared_by: Option<String>,
    #[arg(long)]
    pub norm: Option<String>,
    /// 日付 (DD/MMM/YYYY)
    #[arg(long)]
    pub date: Option<String>,
    #[arg(long)]
    pub place: Option<String>,
    /// 検査モジュール（カンマ区切り）
    #[arg(long, value_delimiter = ',')]
    pub modules: Option<Vec<InspectionMethod>>,
}

#[derive(Subcommand)]
pub enum BlockAction {
    /// JSONファイルでブロックを丸ごと置き換え
    Put {
        method: InspectionMethod,
        #[arg(required = true)]
        file: PathBuf,
    },
    /// ブロックをJSONで表示
    Show { method: InspectionMethod },
    /// ブロックを削除
    Remove { method: InspectionMethod },
}

#[derive(Subcommand)]
pub enum ElementAction {
    /// 行を追加（番号は自動）
    Add {
        method: InspectionMethod,
        #[command(flatten)]
        fields: ElementFields,
        /// 対話式で入力
        #[arg(short, long)]
        interactive: bool,
    },
    /// 行を削除（後続の番号を振り直す）
    Remove {
        method: InspectionMethod,
        number: usize,
    },
    /// 行を一覧表示
    List { method: InspectionMethod },
}

/// 検査要素の入力項目（UTはジョイント行として解釈）
#[derive(Args, Debug, Default, Clone)]
pub struct ElementFields {
    /// 要素（UT: ジョイント）の説明
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(long)]
    pub indication: Option<String>,
    /// 判定（UT: 評価）
    #[arg(short, long)]
    pub qualification: Option<String>,
    #[arg(long)]
    pub observation: Option<String>,
    /// UT: ジョイント番号
    #[arg(long)]
    pub joint_number: Option<String>,
    /// UT: ジョイント位置
    #[arg(long)]
    pub location: Option<String>,
    /// UT: 刻印
    #[arg(long)]
    pub stamp: Option<String>,
    /// UT: デシベル A,B,C,D
    #[arg(long, value_delimiter = ',')]
    pub decibels: Vec<String>,
    /// UT: 角度距離,深さ,X,Y
    #[arg(long, value_delimiter = ',')]
    pub discontinuity: Vec<String>,
}

#[derive(Subcommand)]
pub enum PhotoAction {
    /// 写真（ファイルまたはフォルダ）を追加
    Add {
        method: InspectionMethod,
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// コメント（省略時はEXIF日時）
        #[arg(short, long)]
        caption: Option<String>,
    },
    /// 写真を削除（1始まり）
    Remove {
        method: InspectionMethod,
        number: usize,
    },
    /// 写真を一覧表示
    List { method: InspectionMethod },
}

#[derive(Subcommand)]
pub enum SchemeAction {
    /// 配置図を追加
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(short, long)]
        caption: Option<String>,
    },
    /// 配置図を削除（1始まり）
    Remove { number: usize },
    /// 配置図を一覧表示
    List,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceKind {
    Kits,
    Procedures,
    Materials,
    Inspectors,
    Norms,
    Processes,
    Types,
    Specs,
}

impl std::str::FromStr for ReferenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kits" | "kit" => Ok(ReferenceKind::Kits),
            "procedures" | "procedimientos" => Ok(ReferenceKind::Procedures),
            "materials" | "materiales" => Ok(ReferenceKind::Materials),
            "inspectors" | "inspectores" => Ok(ReferenceKind::Inspectors),
            "norms" | "normas" => Ok(ReferenceKind::Norms),
            "processes" | "procesos" => Ok(ReferenceKind::Processes),
            "types" | "tipos" => Ok(ReferenceKind::Types),
            "specs" | "especificaciones" => Ok(ReferenceKind::Specs),
            _ => Err(format!(
                "Unknown reference: {}. Use kits, procedures, materials, inspectors, norms, processes, types, or specs",
                s
            )),
        }
    }
}

/// PDF画像品質設定
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfQuality {
    /// 高品質: 1400px, 85%
    High,
    /// 中品質: 800px, 75%（デフォルト）
    #[default]
    Medium,
    /// 低品質: 500px, 60%
    Low,
}

impl PdfQuality {
    /// 最大ピクセル幅
    pub fn max_width(&self) -> u32 {
        match self {
            PdfQuality::High => 1400,
            PdfQuality::Medium => 800,
            PdfQuality::Low => 500,
        }
    }

    /// JPEG品質 (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            PdfQuality::High => 85,
            PdfQuality::Medium => 75,
            PdfQuality::Low => 60,
        }
    }
}

impl std::str::FromStr for PdfQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" | "h" => Ok(PdfQuality::High),
            "medium" | "med" | "m" => Ok(PdfQuality::Medium),
            "low" | "l" => Ok(PdfQuality::Low),
            _ => Err(format!("Unknown quality: {}. Use high, medium, or low", s)),
        }
    }
}

impl std::fmt::Display for PdfQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdfQuality::High => write!(f, "high"),
            PdfQuality::Medium => write!(f, "medium"),
            PdfQuality::Low => write!(f, "low"),
        }
    }
}
