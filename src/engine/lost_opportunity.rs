// ==========================================
// 缺货损失报表 - 缺货损失估算器
// ==========================================
// 职责: 关联需求记录与在库天数，估算日均消耗与缺货损失量
// 公式:
//   avg_daily_consumption = num_units_delivered / days_in_stock  (days_in_stock > 0)
//                         = 0                                    (否则)
//   missed_opportunities  = round(avg_daily_consumption × days_out_of_stock)
// 红线: 缺货天数为空的行直接剔除（数据不足 ≠ 无损失）
// ==========================================

use crate::engine::demand::DemandRecord;
use crate::engine::stock_days::Reconciliation;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// 缺货损失记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LostOpportunityRecord {
    pub demand: DemandRecord,
    pub days_in_stock: i64,
    pub days_out_of_stock: i64,
    pub avg_daily_consumption: f64,
    pub missed_opportunities: i64,
}

/// 估算结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Estimation {
    pub records: Vec<LostOpportunityRecord>,
    /// 因缺货天数为空而剔除的需求行数
    pub omitted: usize,
    /// 无 SKU、无法关联在库天数而剔除的需求行数
    pub missing_sku: usize,
}

/// 日均消耗（在库天数为 0 时取 0，不产生 NaN/无穷）
pub fn average_daily_consumption(num_units_delivered: i64, days_in_stock: i64) -> f64 {
    if days_in_stock > 0 {
        num_units_delivered as f64 / days_in_stock as f64
    } else {
        0.0
    }
}

/// 缺货损失量（四舍五入，.5 远离 0）
pub fn missed_opportunities(avg_daily_consumption: f64, days_out_of_stock: i64) -> i64 {
    (avg_daily_consumption * days_out_of_stock as f64).round() as i64
}

pub struct LostOpportunityEstimator;

impl LostOpportunityEstimator {
    /// 以需求为左表外连接对账结果并估算
    #[instrument(skip_all, fields(demand = demand.len(), reconciled = reconciliation.rows.len()))]
    pub fn estimate(demand: Vec<DemandRecord>, reconciliation: &Reconciliation) -> Estimation {
        let by_key = reconciliation.by_key();
        let mut estimation = Estimation::default();

        for record in demand {
            let Some(key) = record.triple_key() else {
                debug!(
                    warehouse_id = %record.warehouse_id,
                    supplier_name = %record.supplier_name,
                    "需求行无 SKU，剔除"
                );
                estimation.missing_sku += 1;
                continue;
            };
            let stock_days = by_key.get(&key).copied();

            let (days_in_stock, days_out_of_stock) = match stock_days {
                Some(r) => (Some(r.days_in_stock), r.days_out_of_stock),
                None => (None, None),
            };

            let Some(days_out_of_stock) = days_out_of_stock else {
                debug!(
                    sku_id = ?record.sku_id,
                    warehouse_id = %record.warehouse_id,
                    supplier_name = %record.supplier_name,
                    "缺货天数为空，剔除"
                );
                estimation.omitted += 1;
                continue;
            };
            let days_in_stock = days_in_stock.unwrap_or(0);

            let avg = average_daily_consumption(record.num_units_delivered, days_in_stock);
            estimation.records.push(LostOpportunityRecord {
                missed_opportunities: missed_opportunities(avg, days_out_of_stock),
                avg_daily_consumption: avg,
                days_in_stock,
                days_out_of_stock,
                demand: record,
            });
        }

        estimation
    }
}
