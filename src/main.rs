// ==========================================
// CRM 联系人导入 - 命令行入口
// ==========================================
// 用法: crm-contact-import <db_path|-> <csv_path> <category_id>... [--overwrite-all]
// 说明: 默认跳过全部疑似重复；--overwrite-all 覆盖全部匹配到的已有联系人
// 输出: stdout 为 JSON 统计，日志走 stderr
// ==========================================

use anyhow::{bail, Context};
use crm_contact_import::app::{get_default_db_path, AppState};
use crm_contact_import::domain::types::WorkflowStep;
use crm_contact_import::{logging, WorkflowError};
use std::path::{Path, PathBuf};

const USAGE: &str =
    "Usage: crm-contact-import <db_path|-> <csv_path> <category_id>... [--overwrite-all]";

#[derive(Debug)]
struct CliArgs {
    db_path: String,
    csv_path: PathBuf,
    category_ids: Vec<String>,
    overwrite_all: bool,
}

impl CliArgs {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut overwrite_all = false;
        let mut positional = Vec::new();
        for arg in args {
            match arg.as_str() {
                "--overwrite-all" => overwrite_all = true,
                "-h" | "--help" => bail!(USAGE),
                _ => positional.push(arg),
            }
        }

        if positional.len() < 3 {
            bail!(USAGE);
        }
        let mut positional = positional.into_iter();
        let db_path = match positional.next() {
            Some(p) if p != "-" => p,
            _ => get_default_db_path(),
        };
        let csv_path = PathBuf::from(positional.next().unwrap_or_default());

        Ok(Self {
            db_path,
            csv_path,
            category_ids: positional.collect(),
            overwrite_all,
        })
    }
}

/// 错误报告路径: 与 CSV 同目录，<stem>.errors.txt
fn error_report_path(csv_path: &Path) -> PathBuf {
    let stem = csv_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "contacts".to_string());
    csv_path.with_file_name(format!("{}.errors.txt", stem))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args = CliArgs::parse(std::env::args().skip(1))?;
    tracing::info!(
        version = crm_contact_import::VERSION,
        db_path = %args.db_path,
        csv = %args.csv_path.display(),
        "{}",
        crm_contact_import::APP_NAME
    );

    let state = AppState::new(args.db_path.clone()).context("无法初始化数据库")?;
    let controller = state.new_import_controller();

    // UPLOAD
    let session = controller
        .upload_file(&args.csv_path)
        .await
        .with_context(|| format!("无法导入文件 {}", args.csv_path.display()))?;

    let has_errors = session
        .parse_result
        .as_ref()
        .map(|r| !r.errors.is_empty())
        .unwrap_or(false);
    if has_errors {
        let report_path = error_report_path(&args.csv_path);
        controller.export_error_report(&report_path).await?;
        eprintln!(
            "{}",
            crm_contact_import::i18n::t_with_args(
                "import.error_report_written",
                &[("path", &report_path.display().to_string())]
            )
        );
    }
    if !session.can_advance() {
        return Err(WorkflowError::NoValidContacts.into());
    }

    // PREVIEW
    controller.next().await?;
    controller.select_categories(&args.category_ids)?;

    // DUPLICATE_CHECK（无匹配时自动进入 CONFIRM）
    let session = controller.next().await?;
    if session.step == WorkflowStep::DuplicateCheck {
        let overwrite: Vec<String> = if args.overwrite_all {
            session
                .matched_existing_ids()
                .into_iter()
                .map(str::to_string)
                .collect()
        } else {
            Vec::new()
        };
        controller.resolve_duplicates(overwrite)?;
    }

    // CONFIRM
    let summary = controller.summary()?;
    tracing::info!(
        contacts = summary.contact_count,
        expected_creates = summary.expected_creates,
        expected_updates = summary.expected_updates,
        expected_skips = summary.expected_skips,
        "提交导入"
    );

    let stats = controller.commit().await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
