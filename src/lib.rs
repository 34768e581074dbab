// ==========================================
// 缺货损失报表 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 批处理报表（只读输入关系，输出缺货损失估算）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 输入/输出关系与报表参数
pub mod domain;

// 数据仓储层 - 输入关系读取
pub mod repository;

// 引擎层 - 计算管道
pub mod engine;

// 导入层 - 外部文件
pub mod importer;

// 配置层 - 报表参数
pub mod config;

// 导出 - CSV / JSON
pub mod export;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 性能埋点
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    CategoryFilter, LedgerInputs, LostSalesReportRow, PipelineDiagnostics, ReportRequest,
    ReportSummary, ReportWindow,
};

pub use engine::{CancellationToken, LostSalesPipeline, PipelineError, PipelineOutcome};

pub use config::{ConfigManager, ReportSettings};

pub use export::ExportFormat;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "缺货损失报表";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
