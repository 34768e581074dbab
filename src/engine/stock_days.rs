// ==========================================
// 缺货损失报表 - 在库天数对账器
// ==========================================
// 职责: 将日库存快照转换为每个三元组的在库/缺货天数
// 输入: unit + product (全量历史) + stock_snapshot (窗口内)
// 输出: ReconciledStockDays
// ==========================================
// 口径:
// 1. first/last_stock_date 取自全量单品入库历史，不按窗口裁剪
// 2. total_trackable_days = end_date - max(start_date, first_stock_date)
// 3. days_in_stock = [max(start_date, first_stock_date), end_date) 内
//    total_units > 0 的快照天数，end_date 当天与首次入库前的快照不计入
// 4. days_out_of_stock = total_trackable_days - days_in_stock
// 5. 仅当 first_stock_date 晚于 end_date（跨度为负）时缺货天数为负，
//    按 negative_stockout_policy 截断或保留
// ==========================================

use crate::config::ReportSettings;
use crate::domain::ledger::{LedgerInputs, Product, Unit};
use crate::domain::types::{NegativeStockoutPolicy, ReportWindow, TripleKey, ZeroCoveragePolicy};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, instrument, warn};

/// 库存存在区间（首次/末次入库日期）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockWindow {
    pub first_stock_date: NaiveDate,
    pub last_stock_date: NaiveDate,
}

impl StockWindow {
    fn observe(&mut self, date: NaiveDate) {
        self.first_stock_date = self.first_stock_date.min(date);
        self.last_stock_date = self.last_stock_date.max(date);
    }
}

/// 三元组对账结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledStockDays {
    pub key: TripleKey,
    pub days_in_stock: i64,
    /// 为空表示数据不足（零覆盖且策略为 EXCLUDE）
    pub days_out_of_stock: Option<i64>,
    pub first_stock_date: NaiveDate,
    pub last_stock_date: NaiveDate,
    /// 可追踪天数
    pub trackable_days: i64,
    /// 窗口内观察到快照的天数（含 end_date 当天）
    pub snapshot_days: i64,
    /// 首次入库晚于窗口结束，缺货天数由负值截断为 0
    pub clamped: bool,
}

/// 对账汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub rows: Vec<ReconciledStockDays>,
    pub triples_without_snapshots: usize,
    /// 首次入库晚于窗口结束的三元组
    pub late_first_stock_clamped: usize,
    pub late_first_stock_kept: usize,
}

impl Reconciliation {
    /// 按三元组索引
    pub fn by_key(&self) -> HashMap<&TripleKey, &ReconciledStockDays> {
        self.rows.iter().map(|r| (&r.key, r)).collect()
    }
}

#[derive(Default)]
struct SnapshotCoverage {
    observed: BTreeSet<NaiveDate>,
    in_stock: BTreeSet<NaiveDate>,
}

// ==========================================
// StockDayReconciler - 在库天数对账器
// ==========================================
pub struct StockDayReconciler<'s> {
    settings: &'s ReportSettings,
}

impl<'s> StockDayReconciler<'s> {
    pub fn new(settings: &'s ReportSettings) -> Self {
        Self { settings }
    }

    /// 计算每个三元组的库存存在区间
    ///
    /// 找不到产品的单品无法映射到 SKU，被忽略。
    pub fn stock_windows(units: &[Unit], products: &[Product]) -> BTreeMap<TripleKey, StockWindow> {
        let sku_by_product: HashMap<&str, &str> = products
            .iter()
            .map(|p| (p.product_key.as_str(), p.product_id.as_str()))
            .collect();

        let mut windows: BTreeMap<TripleKey, StockWindow> = BTreeMap::new();
        for unit in units {
            let Some(sku_id) = sku_by_product.get(unit.product_key.as_str()) else {
                continue;
            };
            let date = unit.received_date();
            windows
                .entry(TripleKey::new(*sku_id, &unit.warehouse_id, &unit.supplier_name))
                .and_modify(|w| w.observe(date))
                .or_insert(StockWindow {
                    first_stock_date: date,
                    last_stock_date: date,
                });
        }
        windows
    }

    /// 对账
    #[instrument(skip(self, inputs, window), fields(window = %window, snapshots = inputs.snapshots.len()))]
    pub fn reconcile(&self, inputs: &LedgerInputs, window: &ReportWindow) -> Reconciliation {
        let windows = Self::stock_windows(&inputs.units, &inputs.products);

        // 同一天重复的快照行只计一次
        let mut coverage: HashMap<TripleKey, SnapshotCoverage> = HashMap::new();
        for snapshot in inputs
            .snapshots
            .iter()
            .filter(|s| window.contains_date(s.stock_date))
        {
            let entry = coverage
                .entry(TripleKey::new(
                    &snapshot.product_id,
                    &snapshot.warehouse_id,
                    &snapshot.supplier_name,
                ))
                .or_default();
            entry.observed.insert(snapshot.stock_date);
            if snapshot.is_in_stock() {
                entry.in_stock.insert(snapshot.stock_date);
            }
        }

        let mut result = Reconciliation::default();

        for (key, stock_window) in windows {
            let first = stock_window.first_stock_date;
            let (snapshot_days, days_in_stock) = coverage
                .get(&key)
                .map(|c| {
                    let counted = c
                        .in_stock
                        .iter()
                        .filter(|d| window.counts_toward_span(**d, first))
                        .count();
                    (c.observed.len() as i64, counted as i64)
                })
                .unwrap_or((0, 0));

            let trackable_days = window.trackable_days(first);
            let mut days_out_of_stock = Some(trackable_days - days_in_stock);
            let mut clamped = false;

            if snapshot_days == 0 {
                result.triples_without_snapshots += 1;
                if self.settings.zero_coverage_policy == ZeroCoveragePolicy::Exclude {
                    debug!(triple = %key, "窗口内无快照，按数据不足处理");
                    days_out_of_stock = None;
                }
            }

            if let Some(out) = days_out_of_stock.filter(|v| *v < 0) {
                match self.settings.negative_stockout_policy {
                    NegativeStockoutPolicy::Clamp => {
                        warn!(
                            triple = %key,
                            days_out_of_stock = out,
                            first_stock_date = %first,
                            "首次入库晚于窗口结束，缺货天数截断为 0"
                        );
                        days_out_of_stock = Some(0);
                        clamped = true;
                        result.late_first_stock_clamped += 1;
                    }
                    NegativeStockoutPolicy::Keep => {
                        warn!(
                            triple = %key,
                            days_out_of_stock = out,
                            first_stock_date = %first,
                            "首次入库晚于窗口结束，缺货天数按负值保留"
                        );
                        result.late_first_stock_kept += 1;
                    }
                }
            }

            result.rows.push(ReconciledStockDays {
                key,
                days_in_stock,
                days_out_of_stock,
                first_stock_date: first,
                last_stock_date: stock_window.last_stock_date,
                trackable_days,
                snapshot_days,
                clamped,
            });
        }

        result
    }
}
