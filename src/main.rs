use anyhow::Context;
use clap::Parser;
use inspection_report::{cli, config, editor, export};
use cli::{BlockAction, Cli, Commands, ElementAction, PhotoAction, ProjectAction, SchemeAction};
use config::Config;
use inspection_report_common::{ReferenceData, SessionStore};
use std::path::Path;

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        format!("inspection_report={level},inspection_report_common={level}"),
    ))
    .format_timestamp(None)
    .init();
}

fn print_lines(lines: &[String], empty: &str) {
    if lines.is_empty() {
        println!("{}", empty);
    }
    for line in lines {
        println!("{}", line);
    }
}

fn save_store(store: &SessionStore, path: &Path) -> anyhow::Result<()> {
    store
        .save(path)
        .with_context(|| format!("セッションを保存できません: {}", path.display()))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    let session_path = cli.session.clone().unwrap_or_else(|| config.session_path());
    let mut store = SessionStore::load(&session_path)
        .with_context(|| format!("セッションを読み込めません: {}", session_path.display()))?;
    log::debug!("session: {}", session_path.display());

    match cli.command {
        Commands::Project { action } => match action {
            ProjectAction::Set(fields) => {
                let header = editor::set_project(&mut store, fields)?;
                save_store(&store, &session_path)?;
                println!("✔ プロジェクト情報を保存しました");
                print_lines(&editor::describe_project(&header), "");
            }
            ProjectAction::Show => {
                print_lines(&editor::describe_project(&store.project_header()?), "");
            }
        },

        Commands::Block { action } => match action {
            BlockAction::Put { method, file } => {
                editor::put_block(&mut store, method, &file)?;
                save_store(&store, &session_path)?;
                println!("✔ {} ブロックを登録: {}", method.code(), file.display());
            }
            BlockAction::Show { method } => println!("{}", editor::block_json(&store, method)?),
            BlockAction::Remove { method } => {
                editor::remove_block(&mut store, method)?;
                save_store(&store, &session_path)?;
                println!("✔ {} ブロックを削除しました", method.code());
            }
        },

        Commands::Element { action } => match action {
            ElementAction::Add { method, fields, interactive } => {
                let fields = if interactive {
                    editor::prompt_element_fields(method, fields)?
                } else {
                    fields
                };
                let number = editor::add_element(&mut store, method, fields)?;
                save_store(&store, &session_path)?;
                println!("✔ {} 要素 #{} を追加しました", method.code(), number);
            }
            ElementAction::Remove { method, number } => {
                editor::remove_element(&mut store, method, number)?;
                save_store(&store, &session_path)?;
                println!("✔ {} 要素 #{} を削除しました（以降の番号を振り直し）", method.code(), number);
            }
            ElementAction::List { method } => {
                print_lines(&editor::list_elements(&store, method)?, "(要素なし)");
            }
        },

        Commands::Photo { action } => match action {
            PhotoAction::Add { method, paths, caption } => {
                println!("- 写真をスキャン中...");
                let (added, skipped) = editor::add_photos(&mut store, method, &paths, caption.as_deref())?;
                save_store(&store, &session_path)?;
                println!("✔ {}枚の写真を追加", added);
                if !skipped.is_empty() {
                    println!("  重複のためスキップ: {}", skipped.join(", "));
                }
            }
            PhotoAction::Remove { method, number } => {
                let removed = editor::remove_photo(&mut store, method, number)?;
                save_store(&store, &session_path)?;
                println!("✔ 写真を削除しました: {}", removed.name);
            }
            PhotoAction::List { method } => {
                print_lines(&editor::list_photos(&store, method)?, "(写真なし)");
            }
        },

        Commands::Scheme { action } => match action {
            SchemeAction::Add { paths, caption } => {
                let (added, skipped) = editor::add_scheme(&mut store, &paths, caption.as_deref())?;
                save_store(&store, &session_path)?;
                println!("✔ {}枚の配置図を追加", added);
                if !skipped.is_empty() {
                    println!("  重複のためスキップ: {}", skipped.join(", "));
                }
            }
            SchemeAction::Remove { number } => {
                let removed = editor::remove_scheme(&mut store, number)?;
                save_store(&store, &session_path)?;
                println!("✔ 配置図を削除しました: {}", removed.name);
            }
            SchemeAction::List => print_lines(&editor::list_scheme(&store)?, "(配置図なし)"),
        },

        Commands::Reference { kind, method } => {
            let reference = ReferenceData::load_dir(&config.reference_dir);
            print_lines(&editor::reference_lines(&reference, kind, method), "(データなし)");
        }

        Commands::Available => {
            let methods = store.available_methods();
            if methods.is_empty() {
                println!("データのある検査ブロックはありません");
            }
            for method in methods {
                println!("  {} - {}", method.code(), method.display_name());
            }
        }

        Commands::Report { method, output, pdf_quality } => {
            println!("📄 inspection-report - 報告書生成\n");
            let mut options = export::RenderOptions::from_config(&config);
            if let Some(quality) = pdf_quality {
                options.quality = quality;
            }
            let output_dir = output.unwrap_or_else(|| config.output_dir.clone());

            match method {
                Some(method) => {
                    export::generate_report(&store, method, &output_dir, &options)?;
                }
                None => {
                    let paths = export::generate_available(&store, &output_dir, &options)?;
                    println!("✔ {}件のPDFを出力", paths.len());
                }
            }
            println!("\n✅ 完了");
        }

        Commands::Config {
            set_reference_dir,
            set_output_dir,
            set_logo,
            set_pdf_quality,
            show,
        } => {
            let mut changed = false;
            if let Some(dir) = set_reference_dir {
                config.reference_dir = dir;
                changed = true;
            }
            if let Some(dir) = set_output_dir {
                config.output_dir = dir;
                changed = true;
            }
            if let Some(logo) = set_logo {
                config.logo_path = Some(logo);
                changed = true;
            }
            if let Some(quality) = set_pdf_quality {
                config.pdf_quality = quality;
                changed = true;
            }
            if changed {
                config.save()?;
                println!("✔ 設定を保存しました");
            }

            if show || !changed {
                println!("設定:");
                println!("  参照データ: {}", config.reference_dir.display());
                println!("  出力先: {}", config.output_dir.display());
                println!("  PDF品質: {}", config.pdf_quality);
                println!("  会社名: {}", config.company_name);
                println!(
                    "  ロゴ: {}",
                    config
                        .logo_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "未設定".into())
                );
                println!("  セッション: {}", session_path.display());
            }
        }
    }

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        log::debug!("{:?}", e);
        eprintln!("✖ 処理に失敗しました: {:#}", e);
        std::process::exit(1);
    }
}
