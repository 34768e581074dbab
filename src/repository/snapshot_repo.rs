// ==========================================
// 缺货损失报表 - 日库存快照仓储
// ==========================================
// 职责: 读取窗口 [start_date, end_date] 内的 stock_snapshot
// ==========================================

use crate::domain::ledger::StockSnapshot;
use crate::domain::types::ReportWindow;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

/// 日库存快照仓储
pub struct SnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SnapshotRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 查询窗口内快照，按 (product_id, warehouse_id, supplier_name, stock_date) 排序
    pub fn list_snapshots_for_window(
        &self,
        window: &ReportWindow,
    ) -> RepositoryResult<Vec<StockSnapshot>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT warehouse_id, product_id, supplier_name, stock_date, total_units
            FROM stock_snapshot
            WHERE date(stock_date) >= date(?1)
              AND date(stock_date) <= date(?2)
            ORDER BY product_id, warehouse_id, supplier_name, stock_date
        "#,
        )?;

        let snapshots = stmt
            .query_map(params![window.start_date(), window.end_date()], |row| {
                Ok(StockSnapshot {
                    warehouse_id: row.get(0)?,
                    product_id: row.get(1)?,
                    supplier_name: row.get(2)?,
                    stock_date: row.get(3)?,
                    total_units: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_snapshots_clipped_to_window() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO stock_snapshot VALUES ('W1', 'SKU1', 'ACME', '2023-12-31', 4);
            INSERT INTO stock_snapshot VALUES ('W1', 'SKU1', 'ACME', '2024-01-01', 0);
            INSERT INTO stock_snapshot VALUES ('W1', 'SKU1', 'ACME', '2024-01-31', 7);
            INSERT INTO stock_snapshot VALUES ('W1', 'SKU1', 'ACME', '2024-02-01', 7);
        "#,
        )
        .unwrap();

        let repo = SnapshotRepository::new(Arc::new(Mutex::new(conn)));
        let window = ReportWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap();

        let rows = repo.list_snapshots_for_window(&window).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].total_units, 0);
        assert!(rows[1].is_in_stock());
    }
}
