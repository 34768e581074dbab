// ==========================================
// 缺货损失报表 - 输出关系
// ==========================================
// 职责: 报表行、按仓库汇总、数据质量诊断
// ==========================================

use serde::{Deserialize, Serialize};

/// 缺货损失报表行
///
/// 每个可报告的 (sku, warehouse, supplier) 一行，
/// 按 (sku_id, warehouse_id, supplier_name) 排序输出。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostSalesReportRow {
    pub warehouse_id: String,
    pub warehouse_name: String,
    pub country: String,
    pub sku_id: String,
    pub sku_name: Option<String>,
    pub use_case_category: Option<String>,
    pub supplier_name: String,
    pub bundle_size: f64,
    pub internal_quantity: Option<f64>,
    pub num_units_delivered: i64,
    pub avg_daily_consumption: f64,
    pub days_out_of_stock: i64,
    pub days_in_stock: i64,
    pub missed_opportunities: i64,
}

/// 单仓库汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseSummary {
    pub warehouse_id: String,
    pub warehouse_name: String,
    pub row_count: usize,
    pub num_units_delivered: i64,
    pub days_out_of_stock: i64,
    pub missed_opportunities: i64,
}

/// 报表汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_rows: usize,
    pub total_units_delivered: i64,
    pub total_missed_opportunities: i64,
    /// 至少有一天缺货的行数
    pub rows_with_stockout: usize,
    pub by_warehouse: Vec<WarehouseSummary>,
}

/// 数据质量诊断
///
/// 记录各阶段静默丢弃或修正的行数，输出关系本身不携带这些信息。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// 找不到产品参考数据的单品数
    pub units_missing_product: usize,
    /// 被品类过滤排除的分组数
    pub groups_filtered_by_category: usize,
    /// 窗口内无任何快照的三元组数
    pub triples_without_snapshots: usize,
    /// 首次入库晚于窗口结束、负缺货天数被截断为 0 的三元组数
    pub late_first_stock_clamped: usize,
    /// 首次入库晚于窗口结束、负缺货天数被原样保留的三元组数
    pub late_first_stock_kept: usize,
    /// 无 SKU（产品缺失）而无法关联在库天数的需求行数
    pub rows_missing_sku: usize,
    /// 缺货天数为空而被剔除的需求行数
    pub rows_missing_stock_days: usize,
    /// 仓库不存在或未启用而被剔除的行数
    pub rows_inactive_warehouse: usize,
}

impl PipelineDiagnostics {
    /// 是否存在需要关注的数据质量问题
    ///
    /// 品类过滤是请求本身的要求，不计入。
    pub fn has_findings(&self) -> bool {
        PipelineDiagnostics {
            groups_filtered_by_category: 0,
            ..self.clone()
        } != PipelineDiagnostics::default()
    }
}
