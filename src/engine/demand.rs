// ==========================================
// 缺货损失报表 - 需求汇总器
// ==========================================
// 职责: 将台账分组行转换为需求记录，保证 (sku, warehouse, supplier, category) 唯一
// ==========================================

use crate::domain::types::TripleKey;
use crate::engine::error::{PipelineError, PipelineResult};
use crate::engine::unit_ledger::{LedgerGroupKey, UnitLedgerRow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// 需求记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandRecord {
    pub sku_id: Option<String>,
    pub warehouse_id: String,
    pub supplier_name: String,
    pub category: Option<String>,
    pub sku_name: Option<String>,
    pub bundle_size: f64,
    pub internal_quantity: Option<f64>,
    pub num_units_delivered: i64,
    pub num_orders: i64,
}

impl DemandRecord {
    /// 用于关联对账结果的三元组；SKU 为空时无法关联
    pub fn triple_key(&self) -> Option<TripleKey> {
        self.sku_id
            .as_ref()
            .map(|sku| TripleKey::new(sku, &self.warehouse_id, &self.supplier_name))
    }
}

impl From<UnitLedgerRow> for DemandRecord {
    fn from(row: UnitLedgerRow) -> Self {
        let LedgerGroupKey {
            sku_id,
            supplier_name,
            warehouse_id,
            category,
        } = row.key;

        Self {
            sku_id,
            warehouse_id,
            supplier_name,
            category,
            sku_name: row.sku_name,
            bundle_size: row.bundle_size,
            internal_quantity: row.internal_quantity,
            num_units_delivered: row.num_units_delivered,
            num_orders: row.num_orders,
        }
    }
}

pub struct DemandAggregator;

impl DemandAggregator {
    /// 汇总需求记录
    ///
    /// 分组主键重复说明上游分组逻辑有缺陷，直接报错而不是静默合并。
    pub fn aggregate(rows: Vec<UnitLedgerRow>) -> PipelineResult<Vec<DemandRecord>> {
        let mut seen: BTreeSet<LedgerGroupKey> = BTreeSet::new();

        rows.into_iter()
            .map(|row| {
                if !seen.insert(row.key.clone()) {
                    return Err(PipelineError::DuplicateDemandKey(format!(
                        "sku={:?} warehouse={} supplier={} category={:?}",
                        row.key.sku_id, row.key.warehouse_id, row.key.supplier_name, row.key.category
                    )));
                }
                Ok(DemandRecord::from(row))
            })
            .collect()
    }
}
