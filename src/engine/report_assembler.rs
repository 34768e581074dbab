// ==========================================
// 缺货损失报表 - 报表组装器
// ==========================================
// 职责: 内连接启用仓库，生成输出关系并确定性排序
// 红线: 未启用/未知仓库静默剔除；排序是可复现报表的正确性要求
// ==========================================

use crate::domain::ledger::Warehouse;
use crate::domain::report::LostSalesReportRow;
use crate::engine::lost_opportunity::LostOpportunityRecord;
use std::collections::HashMap;
use tracing::instrument;

/// 组装结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    pub rows: Vec<LostSalesReportRow>,
    /// 仓库未启用或不存在而剔除的行数
    pub dropped_inactive: usize,
}

pub struct ReportAssembler;

impl ReportAssembler {
    #[instrument(skip_all, fields(records = records.len(), warehouses = warehouses.len()))]
    pub fn assemble(records: Vec<LostOpportunityRecord>, warehouses: &[Warehouse]) -> Assembly {
        let active: HashMap<&str, &Warehouse> = warehouses
            .iter()
            .filter(|w| w.is_active)
            .map(|w| (w.warehouse_id.as_str(), w))
            .collect();

        let mut assembly = Assembly::default();

        for record in records {
            let Some(warehouse) = active.get(record.demand.warehouse_id.as_str()) else {
                assembly.dropped_inactive += 1;
                continue;
            };
            // 估算阶段已剔除无 SKU 的行
            let Some(sku_id) = record.demand.sku_id else {
                continue;
            };

            assembly.rows.push(LostSalesReportRow {
                warehouse_id: warehouse.warehouse_id.clone(),
                warehouse_name: warehouse.warehouse_name.clone(),
                country: warehouse.country.clone(),
                sku_id,
                sku_name: record.demand.sku_name,
                use_case_category: record.demand.category,
                supplier_name: record.demand.supplier_name,
                bundle_size: record.demand.bundle_size,
                internal_quantity: record.demand.internal_quantity,
                num_units_delivered: record.demand.num_units_delivered,
                avg_daily_consumption: record.avg_daily_consumption,
                days_out_of_stock: record.days_out_of_stock,
                days_in_stock: record.days_in_stock,
                missed_opportunities: record.missed_opportunities,
            });
        }

        // 品类作为最后的决胜键，保证同一三元组多品类时顺序稳定
        assembly.rows.sort_by(|a, b| {
            (&a.sku_id, &a.warehouse_id, &a.supplier_name, &a.use_case_category).cmp(&(
                &b.sku_id,
                &b.warehouse_id,
                &b.supplier_name,
                &b.use_case_category,
            ))
        });

        assembly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::demand::DemandRecord;

    fn record(sku: &str, warehouse: &str, supplier: &str) -> LostOpportunityRecord {
        LostOpportunityRecord {
            demand: DemandRecord {
                sku_id: Some(sku.to_string()),
                warehouse_id: warehouse.to_string(),
                supplier_name: supplier.to_string(),
                category: Some("TB".to_string()),
                sku_name: Some("Kit".to_string()),
                bundle_size: 1.0,
                internal_quantity: None,
                num_units_delivered: 8,
                num_orders: 9,
            },
            days_in_stock: 4,
            days_out_of_stock: 1,
            avg_daily_consumption: 2.0,
            missed_opportunities: 2,
        }
    }

    fn warehouse(id: &str, active: bool) -> Warehouse {
        Warehouse {
            warehouse_id: id.to_string(),
            warehouse_name: format!("Depot {}", id),
            country: "UG".to_string(),
            is_active: active,
        }
    }

    #[test]
    fn test_inactive_and_unknown_warehouses_dropped() {
        let assembly = ReportAssembler::assemble(
            vec![record("S1", "W1", "A"), record("S1", "W2", "A"), record("S1", "W9", "A")],
            &[warehouse("W1", true), warehouse("W2", false)],
        );
        assert_eq!(assembly.rows.len(), 1);
        assert_eq!(assembly.dropped_inactive, 2);
        assert_eq!(assembly.rows[0].warehouse_name, "Depot W1");
        assert_eq!(assembly.rows[0].country, "UG");
    }

    #[test]
    fn test_rows_sorted_by_sku_warehouse_supplier() {
        let assembly = ReportAssembler::assemble(
            vec![
                record("S2", "W1", "A"),
                record("S1", "W2", "A"),
                record("S1", "W1", "B"),
                record("S1", "W1", "A"),
            ],
            &[warehouse("W1", true), warehouse("W2", true)],
        );
        let order: Vec<_> = assembly
            .rows
            .iter()
            .map(|r| format!("{}/{}/{}", r.sku_id, r.warehouse_id, r.supplier_name))
            .collect();
        assert_eq!(order, vec!["S1/W1/A", "S1/W1/B", "S1/W2/A", "S2/W1/A"]);
    }
}
