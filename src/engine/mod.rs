// ==========================================
// 缺货损失报表 - 引擎层
// ==========================================
// 职责: 五个管道组件 + 编排器，均为纯函数
// 红线: Engine 不拼 SQL；阶段之间不共享可变状态
// ==========================================

pub mod demand;
pub mod error;
pub mod lost_opportunity;
pub mod orchestrator;
pub mod report_assembler;
pub mod stock_days;
pub mod summary;
pub mod unit_ledger;

// 重导出核心组件
pub use demand::{DemandAggregator, DemandRecord};
pub use error::{PipelineError, PipelineResult};
pub use lost_opportunity::{
    average_daily_consumption, missed_opportunities, Estimation, LostOpportunityEstimator,
    LostOpportunityRecord,
};
pub use orchestrator::{CancellationToken, LostSalesPipeline, PipelineOutcome};
pub use report_assembler::{Assembly, ReportAssembler};
pub use stock_days::{ReconciledStockDays, Reconciliation, StockDayReconciler, StockWindow};
pub use summary::summarize;
pub use unit_ledger::{LedgerGroupKey, LedgerReadout, UnitLedgerReader, UnitLedgerRow};
