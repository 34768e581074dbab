// ==========================================
// 缺货损失报表 - 导出
// ==========================================
// 格式: CSV（仅报表行）/ JSON（请求 + 报表行 + 汇总 + 诊断）
// 红线: 导出内容不含 run_id，同一输入重复导出逐字节一致
// ==========================================

use crate::domain::report::LostSalesReportRow;
use crate::engine::orchestrator::PipelineOutcome;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("不支持的导出格式: {0}（可选 csv/json）")]
    UnsupportedFormat(String),

    #[error("CSV 写出失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON 写出失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("写出失败: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => write!(f, "csv"),
            ExportFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// 报表行写出为 CSV（含表头；无行时仅写表头）
pub fn write_report_csv<W: Write>(writer: W, rows: &[LostSalesReportRow]) -> ExportResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(REPORT_COLUMNS)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// 完整运行结果写出为 JSON
pub fn write_report_json<W: Write>(mut writer: W, outcome: &PipelineOutcome) -> ExportResult<()> {
    serde_json::to_writer_pretty(&mut writer, outcome)?;
    writeln!(writer)?;
    Ok(())
}

pub fn write_outcome<W: Write>(
    writer: W,
    outcome: &PipelineOutcome,
    format: ExportFormat,
) -> ExportResult<()> {
    match format {
        ExportFormat::Csv => write_report_csv(writer, &outcome.rows),
        ExportFormat::Json => write_report_json(writer, outcome),
    }
}

/// CSV 表头（与 LostSalesReportRow 字段顺序一致）
pub const REPORT_COLUMNS: [&str; 14] = [
    "warehouse_id",
    "warehouse_name",
    "country",
    "sku_id",
    "sku_name",
    "use_case_category",
    "supplier_name",
    "bundle_size",
    "internal_quantity",
    "num_units_delivered",
    "avg_daily_consumption",
    "days_out_of_stock",
    "days_in_stock",
    "missed_opportunities",
];
