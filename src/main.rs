// ==========================================
// 商品批量导入 - 命令行入口
// ==========================================
// 用法:
//   catalog-import template [输出路径]
//   catalog-import import <文件路径> [操作人]
//   catalog-import category list
//   catalog-import category add <代码> <名称>
//   catalog-import batches [条数]
// 数据库: CATALOG_IMPORT_DB_PATH 或用户数据目录
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use catalog_import::app::{get_default_db_path, AppState};
use catalog_import::domain::{Category, ImportOutcome};
use catalog_import::importer::DataCleaner;
use catalog_import::logging;
use catalog_import::repository::{ProductImportRepository, ProductImportRepositoryImpl};

const USAGE: &str = "usage: catalog-import <template [out] | import <file> [by] | category list | category add <code> <name> | batches [limit]>";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let db_path = get_default_db_path();
    tracing::info!("{} v{}", catalog_import::APP_NAME, catalog_import::VERSION);

    let state = AppState::new(db_path).map_err(|e| anyhow!("无法初始化应用状态: {}", e))?;

    match args.first().map(String::as_str) {
        Some("template") => {
            let out = args
                .get(1)
                .cloned()
                .unwrap_or_else(|| catalog_import::api::TEMPLATE_FILE_NAME.to_string());
            let download = state.template_api.download_template().await?;
            std::fs::write(&out, &download.bytes)
                .with_context(|| format!("写入模板失败: {}", out))?;
            println!("{} ({} bytes)", out, download.bytes.len());
        }
        Some("import") => {
            let path = args.get(1).ok_or_else(|| anyhow!(USAGE))?;
            let bytes = std::fs::read(path).with_context(|| format!("读取文件失败: {}", path))?;
            let file_name = std::path::Path::new(path)
                .file_name()
                .and_then(|n| n.to_str());

            let report = state
                .import_api
                .import_products(&bytes, file_name, args.get(2).map(String::as_str))
                .await?;

            for row in &report.outcomes {
                match &row.outcome {
                    ImportOutcome::Created { product_id } => {
                        println!("row {:>4}  CREATED  {}", row.sheet_row, product_id)
                    }
                    ImportOutcome::Updated { product_id } => {
                        println!("row {:>4}  UPDATED  {}", row.sheet_row, product_id)
                    }
                    ImportOutcome::Skipped(reason) => {
                        println!("row {:>4}  SKIPPED  {}", row.sheet_row, reason)
                    }
                    ImportOutcome::Failed { errors } => {
                        for e in errors {
                            println!("row {:>4}  FAILED   [{}] {}: {}", row.sheet_row, e.code, e.field, e.message);
                        }
                    }
                }
            }
            println!(
                "{}: total={} created={} updated={} skipped={} failed={} ({} ms)",
                report.status.as_str(),
                report.total_rows,
                report.created,
                report.updated,
                report.skipped,
                report.failed,
                report.elapsed_ms
            );
        }
        Some("category") => {
            let repo = ProductImportRepositoryImpl::new(&state.db_path)?;
            match args.get(1).map(String::as_str) {
                Some("list") => {
                    for c in repo.list_categories().await? {
                        println!("{}\t{}", c.code, c.name);
                    }
                }
                Some("add") => {
                    let (code, name) = match (args.get(2), args.get(3)) {
                        (Some(code), Some(name)) => (code, name),
                        _ => bail!(USAGE),
                    };
                    let category = Category {
                        code: DataCleaner.clean_text(code, true),
                        name: name.trim().to_string(),
                    };
                    repo.upsert_category(&category).await?;
                    println!("{}\t{}", category.code, category.name);
                }
                _ => bail!(USAGE),
            }
        }
        Some("batches") => {
            let limit = match args.get(1) {
                Some(raw) => raw.parse::<usize>().with_context(|| format!("无效的条数: {}", raw))?,
                None => 20,
            };
            for b in state.import_api.list_recent_batches(limit).await? {
                println!(
                    "{}  {}  {:<15}  total={} created={} updated={} skipped={} failed={}  {}",
                    b.imported_at.format("%Y-%m-%d %H:%M:%S"),
                    b.batch_id,
                    b.status.as_str(),
                    b.total_rows,
                    b.created,
                    b.updated,
                    b.skipped,
                    b.failed,
                    b.file_name.unwrap_or_default()
                );
            }
        }
        _ => bail!(USAGE),
    }

    Ok(())
}
