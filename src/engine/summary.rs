// ==========================================
// 缺货损失报表 - 报表汇总
// ==========================================
// 职责: 按仓库汇总交付量、缺货天数、缺货损失量
// ==========================================

use crate::domain::report::{LostSalesReportRow, ReportSummary, WarehouseSummary};
use std::collections::BTreeMap;

pub fn summarize(rows: &[LostSalesReportRow]) -> ReportSummary {
    let mut by_warehouse: BTreeMap<&str, WarehouseSummary> = BTreeMap::new();

    for row in rows {
        let entry = by_warehouse
            .entry(row.warehouse_id.as_str())
            .or_insert_with(|| WarehouseSummary {
                warehouse_id: row.warehouse_id.clone(),
                warehouse_name: row.warehouse_name.clone(),
                row_count: 0,
                num_units_delivered: 0,
                days_out_of_stock: 0,
                missed_opportunities: 0,
            });
        entry.row_count += 1;
        entry.num_units_delivered += row.num_units_delivered;
        entry.days_out_of_stock += row.days_out_of_stock;
        entry.missed_opportunities += row.missed_opportunities;
    }

    ReportSummary {
        total_rows: rows.len(),
        total_units_delivered: rows.iter().map(|r| r.num_units_delivered).sum(),
        total_missed_opportunities: rows.iter().map(|r| r.missed_opportunities).sum(),
        rows_with_stockout: rows.iter().filter(|r| r.days_out_of_stock > 0).count(),
        by_warehouse: by_warehouse.into_values().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(warehouse: &str, delivered: i64, out: i64, missed: i64) -> LostSalesReportRow {
        LostSalesReportRow {
            warehouse_id: warehouse.to_string(),
            warehouse_name: warehouse.to_lowercase(),
            country: "ZM".to_string(),
            sku_id: "S".to_string(),
            sku_name: None,
            use_case_category: None,
            supplier_name: "A".to_string(),
            bundle_size: 1.0,
            internal_quantity: None,
            num_units_delivered: delivered,
            avg_daily_consumption: 0.0,
            days_out_of_stock: out,
            days_in_stock: 0,
            missed_opportunities: missed,
        }
    }

    #[test]
    fn test_summary_totals() {
        let summary = summarize(&[row("W2", 10, 0, 0), row("W1", 5, 3, 7), row("W1", 1, 2, 1)]);
        assert_eq!(summary.total_rows, 3);
        assert_eq!(summary.total_units_delivered, 16);
        assert_eq!(summary.total_missed_opportunities, 8);
        assert_eq!(summary.rows_with_stockout, 2);
        assert_eq!(summary.by_warehouse[0].warehouse_id, "W1");
        assert_eq!(summary.by_warehouse[0].days_out_of_stock, 5);
        assert_eq!(summary.by_warehouse[1].row_count, 1);
    }

    #[test]
    fn test_empty_report() {
        assert_eq!(summarize(&[]), ReportSummary::default());
    }
}
