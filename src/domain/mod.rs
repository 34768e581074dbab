// ==========================================
// 缺货损失报表 - 领域模型层
// ==========================================
// 职责: 定义输入关系、报表参数、输出关系
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod ledger;
pub mod report;
pub mod types;

// 重导出核心类型
pub use ledger::{Delivery, LedgerInputs, Product, StockSnapshot, Unit, UnitOrder, Warehouse};
pub use report::{LostSalesReportRow, PipelineDiagnostics, ReportSummary, WarehouseSummary};
pub use types::{
    CategoryFilter, InvalidWindow, NegativeStockoutPolicy, ReportRequest, ReportWindow, TripleKey,
    ZeroCoveragePolicy,
};
