// ==========================================
// 缺货损失报表 - 命令行入口
// ==========================================
// 用法:
//   stockout-report --start 2024-01-01 --end 2024-01-31 \
//       [--category a,b] [--db path] [--format csv|json] [--out path]
//
// 报表写到 --out 指定文件或 stdout，日志写到 stderr。
// Ctrl-C 在下一个组件边界中止运行，不产生部分输出。
// ==========================================

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::{Arc, Mutex};
use stockout_report::config::{ConfigManager, ReportSettings};
use stockout_report::db::{get_default_db_path, open_sqlite_connection, warn_on_schema_mismatch};
use stockout_report::domain::{CategoryFilter, ReportRequest, ReportWindow};
use stockout_report::engine::{CancellationToken, LostSalesPipeline};
use stockout_report::export::{write_outcome, ExportFormat};
use stockout_report::{logging, perf};

const USAGE: &str = "用法: stockout-report --start YYYY-MM-DD --end YYYY-MM-DD \
[--category a,b] [--db path] [--format csv|json] [--out path]";

#[derive(Debug, Default)]
struct CliArgs {
    start: Option<String>,
    end: Option<String>,
    category: Option<String>,
    db_path: Option<String>,
    format: Option<String>,
    out: Option<String>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Option<CliArgs>> {
    let mut parsed = CliArgs::default();
    while let Some(flag) = args.next() {
        if flag == "-h" || flag == "--help" {
            return Ok(None);
        }
        let slot = match flag.as_str() {
            "--start" => &mut parsed.start,
            "--end" => &mut parsed.end,
            "--category" => &mut parsed.category,
            "--db" => &mut parsed.db_path,
            "--format" => &mut parsed.format,
            "--out" => &mut parsed.out,
            other => bail!("未知参数: {}\n{}", other, USAGE),
        };
        let value = args
            .next()
            .ok_or_else(|| anyhow!("参数 {} 缺少取值\n{}", flag, USAGE))?;
        *slot = Some(value);
    }

    Ok(Some(parsed))
}

fn parse_date(raw: Option<&str>, name: &str) -> anyhow::Result<NaiveDate> {
    let raw = raw.ok_or_else(|| anyhow!("缺少 --{}\n{}", name, USAGE))?;
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("--{} 日期格式错误（期望 YYYY-MM-DD）: {}", name, raw))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(args) = parse_args(std::env::args().skip(1))? else {
        println!("{}", USAGE);
        return Ok(());
    };

    logging::init();

    let window = ReportWindow::new(
        parse_date(args.start.as_deref(), "start")?,
        parse_date(args.end.as_deref(), "end")?,
    )?;
    let category_filter = args
        .category
        .as_deref()
        .map(CategoryFilter::parse_list)
        .unwrap_or_default();
    let request = ReportRequest::new(window, category_filter);
    let format: ExportFormat = args.format.as_deref().unwrap_or("csv").parse()?;

    let db_path = args.db_path.unwrap_or_else(get_default_db_path);
    tracing::info!(
        version = stockout_report::VERSION,
        db_path = %db_path,
        window = %request.window,
        "{}",
        stockout_report::APP_NAME
    );

    let mut conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    perf::install_sqlite_tracing(&mut conn);
    warn_on_schema_mismatch(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let config = ConfigManager::from_connection(conn.clone())
        .map_err(|e| anyhow!("初始化配置管理器失败: {}", e))?;
    let settings = ReportSettings::load(&config)
        .await
        .map_err(|e| anyhow!("加载报表配置失败: {}", e))?;
    let config_snapshot = config
        .get_config_snapshot()
        .map_err(|e| anyhow!("读取配置快照失败: {}", e))?;
    tracing::info!(config = %config_snapshot, "报表配置已加载");

    let cancel = CancellationToken::new();
    let pipeline = LostSalesPipeline::new(settings).with_cancellation(cancel.clone());
    let mut task = tokio::task::spawn_blocking(move || pipeline.run_from_db(conn, &request));

    let joined = tokio::select! {
        joined = &mut task => joined,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("收到中断信号，等待当前组件结束");
            cancel.cancel();
            task.await
        }
    };
    let outcome = joined.context("报表任务异常退出")??;

    match args.out {
        Some(path) => {
            let file = File::create(&path).with_context(|| format!("无法创建输出文件: {}", path))?;
            let mut writer = BufWriter::new(file);
            write_outcome(&mut writer, &outcome, format)?;
            writer.flush()?;
            tracing::info!(out = %path, rows = outcome.rows.len(), "报表已写出");
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            write_outcome(&mut writer, &outcome, format)?;
            writer.flush()?;
        }
    }

    Ok(())
}
