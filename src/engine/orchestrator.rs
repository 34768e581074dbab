// ==========================================
// 缺货损失报表 - 管道编排器
// ==========================================
// 用途: 协调五个组件的执行顺序
//   1. 单品台账读取  ─┐
//   2. 在库天数对账  ─┤ (同一窗口，相互独立)
//   3. 需求汇总      ←┘
//   4. 缺货损失估算 (关联 2 与 3)
//   5. 报表组装
// 红线: 组件间可安全中止；任何阶段都不写外部状态
// ==========================================

use crate::config::ReportSettings;
use crate::domain::ledger::LedgerInputs;
use crate::domain::report::{LostSalesReportRow, PipelineDiagnostics, ReportSummary};
use crate::domain::types::ReportRequest;
use crate::engine::demand::DemandAggregator;
use crate::engine::error::{PipelineError, PipelineResult};
use crate::engine::lost_opportunity::LostOpportunityEstimator;
use crate::engine::report_assembler::ReportAssembler;
use crate::engine::stock_days::StockDayReconciler;
use crate::engine::summary::summarize;
use crate::engine::unit_ledger::UnitLedgerReader;
use crate::perf::PerfGuard;
use crate::repository::InputRepositories;
use rusqlite::Connection;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, info_span, warn};
use uuid::Uuid;

// ==========================================
// CancellationToken - 取消信号
// ==========================================

/// 跨线程共享的取消信号，在组件边界检查
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// ==========================================
// PipelineOutcome - 运行结果
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineOutcome {
    /// 仅用于日志关联，不进入导出内容
    #[serde(skip)]
    pub run_id: Uuid,
    pub request: ReportRequest,
    pub rows: Vec<LostSalesReportRow>,
    pub summary: ReportSummary,
    pub diagnostics: PipelineDiagnostics,
}

// ==========================================
// LostSalesPipeline - 管道编排器
// ==========================================

pub struct LostSalesPipeline {
    settings: ReportSettings,
    cancel: CancellationToken,
}

impl LostSalesPipeline {
    pub fn new(settings: ReportSettings) -> Self {
        Self {
            settings,
            cancel: CancellationToken::new(),
        }
    }

    /// 绑定外部取消信号
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    fn check_cancelled(&self, stage: &'static str) -> PipelineResult<()> {
        if self.cancel.is_cancelled() {
            warn!(stage, "报表运行已取消");
            return Err(PipelineError::Cancelled { stage });
        }
        Ok(())
    }

    /// 从数据库读取输入关系并运行
    pub fn run_from_db(
        &self,
        conn: Arc<Mutex<Connection>>,
        request: &ReportRequest,
    ) -> PipelineResult<PipelineOutcome> {
        self.check_cancelled("load_inputs")?;

        let inputs = {
            let mut perf = PerfGuard::new("load_inputs");
            let inputs = InputRepositories::new(conn).load_inputs(&request.window)?;
            perf.set_rows(inputs.units.len() + inputs.snapshots.len());
            inputs
        };

        self.run(&inputs, request)
    }

    /// 对内存输入关系运行完整管道（纯计算）
    pub fn run(
        &self,
        inputs: &LedgerInputs,
        request: &ReportRequest,
    ) -> PipelineResult<PipelineOutcome> {
        let run_id = Uuid::new_v4();
        let span = info_span!("lost_sales_pipeline", %run_id, window = %request.window);
        let _enter = span.enter();

        info!(
            category_filter = ?request.category_filter,
            negative_stockout_policy = %self.settings.negative_stockout_policy,
            zero_coverage_policy = %self.settings.zero_coverage_policy,
            "开始运行缺货损失报表"
        );

        let mut diagnostics = PipelineDiagnostics::default();

        // 1. 单品台账读取
        self.check_cancelled("unit_ledger")?;
        let ledger = {
            let mut perf = PerfGuard::new("unit_ledger");
            let readout = UnitLedgerReader::new(&self.settings).read(inputs, request);
            perf.set_rows(readout.rows.len());
            readout
        };
        diagnostics.units_missing_product = ledger.units_missing_product;
        diagnostics.groups_filtered_by_category = ledger.groups_filtered_by_category;

        // 2. 在库天数对账
        self.check_cancelled("stock_days")?;
        let reconciliation = {
            let mut perf = PerfGuard::new("stock_days");
            let recon = StockDayReconciler::new(&self.settings).reconcile(inputs, &request.window);
            perf.set_rows(recon.rows.len());
            recon
        };
        diagnostics.triples_without_snapshots = reconciliation.triples_without_snapshots;
        diagnostics.late_first_stock_clamped = reconciliation.late_first_stock_clamped;
        diagnostics.late_first_stock_kept = reconciliation.late_first_stock_kept;

        // 3. 需求汇总
        self.check_cancelled("demand")?;
        let demand = DemandAggregator::aggregate(ledger.rows)?;

        // 4. 缺货损失估算
        self.check_cancelled("lost_opportunity")?;
        let estimation = {
            let mut perf = PerfGuard::new("lost_opportunity");
            let estimation = LostOpportunityEstimator::estimate(demand, &reconciliation);
            perf.set_rows(estimation.records.len());
            estimation
        };
        diagnostics.rows_missing_sku = estimation.missing_sku;
        diagnostics.rows_missing_stock_days = estimation.omitted;

        // 5. 报表组装
        self.check_cancelled("report_assembler")?;
        let assembly = ReportAssembler::assemble(estimation.records, &inputs.warehouses);
        diagnostics.rows_inactive_warehouse = assembly.dropped_inactive;

        let summary = summarize(&assembly.rows);

        if diagnostics.has_findings() {
            warn!(?diagnostics, "报表运行存在被剔除或修正的数据");
        }
        info!(
            rows = summary.total_rows,
            missed_opportunities = summary.total_missed_opportunities,
            "缺货损失报表运行完成"
        );

        Ok(PipelineOutcome {
            run_id,
            request: request.clone(),
            rows: assembly.rows,
            summary,
            diagnostics,
        })
    }
}
