pub mod canvas;
pub mod flow;
pub mod fonts;
pub mod generators;
pub mod pdf;
pub mod story;
pub mod template;

use crate::error::{ReportError, Result};
use chrono::{DateTime, Local};
use generators::generator_for;
use indicatif::{ProgressBar, ProgressStyle};
use inspection_report_common::{InspectionMethod, SessionStore};
use std::path::{Path, PathBuf};

pub use pdf::RenderOptions;

/// 出力ファイル名 INFORME_{TIPO}_{YYYYmmdd_HHMMSS}.pdf
pub fn report_file_name(method: InspectionMethod, at: DateTime<Local>) -> String {
    format!("INFORME_{}_{}.pdf", method.file_slug(), at.format("%Y%m%d_%H%M%S"))
}

fn render_to_file(
    store: &SessionStore,
    method: InspectionMethod,
    output_dir: &Path,
    options: &RenderOptions,
) -> Result<PathBuf> {
    let bytes = generator_for(method).render(store, options)?;
    let path = output_dir.join(report_file_name(method, Local::now()));
    pdf::write_pdf(&path, &bytes)?;
    log::info!("{} report written ({} bytes)", method.code(), bytes.len());
    Ok(path)
}

/// 1つの検査方法の報告書を生成して、出力パスを返す
pub fn generate_report(
    store: &SessionStore,
    method: InspectionMethod,
    output_dir: &Path,
    options: &RenderOptions,
) -> Result<PathBuf> {
    println!("- PDFを生成中... ({}, 品質: {})", method.display_name(), options.quality);
    let path = render_to_file(store, method, output_dir, options)?;
    println!("✔ PDF出力: {}", path.display());
    Ok(path)
}

/// データのある全検査方法の報告書を生成する
pub fn generate_available(
    store: &SessionStore,
    output_dir: &Path,
    options: &RenderOptions,
) -> Result<Vec<PathBuf>> {
    let methods = store.available_methods();
    if methods.is_empty() {
        return Err(ReportError::NothingToExport);
    }

    let bar = ProgressBar::new(methods.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut paths = Vec::with_capacity(methods.len());
    for method in methods {
        bar.set_message(method.display_name());
        match render_to_file(store, method, output_dir, options) {
            Ok(path) => {
                bar.println(format!("✔ PDF出力: {}", path.display()));
                paths.push(path);
            }
            Err(e) => {
                bar.abandon_with_message(format!("{} の生成に失敗", method.display_name()));
                return Err(e);
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();
    Ok(paths)
}
