// ==========================================
// 缺货损失报表 - 单品台账仓储
// ==========================================
// 职责: 读取 unit / unit_order / delivery 三张台账表
// 红线: 只读；窗口预过滤只为减少读取量，精确口径由引擎层判定
// ==========================================

use crate::domain::ledger::{Delivery, Unit, UnitOrder};
use crate::domain::types::ReportWindow;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 单品台账仓储
pub struct LedgerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LedgerRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 全量单品（不按窗口裁剪：首次入库日期需要完整历史）
    pub fn list_units(&self) -> RepositoryResult<Vec<Unit>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT
                unit_key,
                product_key,
                supplier_name,
                warehouse_id,
                stock_status,
                bundle_size,
                internal_quantity,
                received_at
            FROM unit
            ORDER BY unit_key
        "#,
        )?;

        let units = stmt
            .query_map([], |row| {
                Ok(Unit {
                    unit_key: row.get(0)?,
                    product_key: row.get(1)?,
                    supplier_name: row.get(2)?,
                    warehouse_id: row.get(3)?,
                    stock_status: row.get(4)?,
                    bundle_size: row.get(5)?,
                    internal_quantity: row.get(6)?,
                    received_at: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(units)
    }

    /// 与窗口相关的订单
    ///
    /// 打包时间落在窗口内，或其包裹的交付时间落在交付窗口内。
    pub fn list_orders_for_window(&self, window: &ReportWindow) -> RepositoryResult<Vec<UnitOrder>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT o.order_key, o.unit_key, o.package_key, o.packaged_at
            FROM unit_order o
            WHERE (datetime(o.packaged_at) >= datetime(?1) AND datetime(o.packaged_at) <= datetime(?2))
               OR o.package_key IN (
                    SELECT d.package_key
                    FROM delivery d
                    WHERE datetime(d.delivered_at) >= datetime(?1)
                      AND datetime(d.delivered_at) < datetime(?3)
               )
            ORDER BY o.order_key
        "#,
        )?;

        let orders = stmt
            .query_map(
                params![
                    window.start_ts().format(TS_FORMAT).to_string(),
                    window.packaged_upper_ts().format(TS_FORMAT).to_string(),
                    window.delivered_upper_ts().format(TS_FORMAT).to_string(),
                ],
                |row| {
                    Ok(UnitOrder {
                        order_key: row.get(0)?,
                        unit_key: row.get(1)?,
                        package_key: row.get(2)?,
                        packaged_at: row.get(3)?,
                    })
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(orders)
    }

    /// 交付窗口 [start, end + 1 天) 内的交付
    pub fn list_deliveries_for_window(
        &self,
        window: &ReportWindow,
    ) -> RepositoryResult<Vec<Delivery>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT package_key, delivered_at
            FROM delivery
            WHERE datetime(delivered_at) >= datetime(?1)
              AND datetime(delivered_at) < datetime(?2)
            ORDER BY package_key
        "#,
        )?;

        let deliveries = stmt
            .query_map(
                params![
                    window.start_ts().format(TS_FORMAT).to_string(),
                    window.delivered_upper_ts().format(TS_FORMAT).to_string(),
                ],
                |row| {
                    Ok(Delivery {
                        package_key: row.get(0)?,
                        delivered_at: row.get(1)?,
                    })
                },
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(deliveries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn setup_repo() -> LedgerRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();

        conn.execute_batch(
            r#"
            INSERT INTO unit VALUES ('U1', 'PK1', 'ACME', 'W1', 'stocked', 10, 100, '2023-12-01 08:00:00');
            INSERT INTO unit VALUES ('U2', 'PK1', 'ACME', 'W1', 'shipped', NULL, NULL, '2024-01-03T09:30:00');

            INSERT INTO unit_order VALUES ('O1', 'U1', 'PKG1', '2023-12-30 10:00:00');
            INSERT INTO unit_order VALUES ('O2', 'U2', NULL, '2024-01-10 10:00:00');
            INSERT INTO unit_order VALUES ('O3', 'U2', 'PKG3', '2024-03-01 10:00:00');

            INSERT INTO delivery VALUES ('PKG1', '2024-01-31 18:00:00');
            INSERT INTO delivery VALUES ('PKG3', '2024-03-02 10:00:00');
        "#,
        )
        .unwrap();

        LedgerRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn window() -> ReportWindow {
        ReportWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_list_units_reads_full_history() {
        let repo = setup_repo();
        let units = repo.list_units().unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0].bundle_size, Some(10.0));
        assert_eq!(units[1].bundle_size, None);
        assert_eq!(
            units[1].received_date(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
        );
    }

    #[test]
    fn test_orders_include_packaged_or_delivered_in_window() {
        let repo = setup_repo();
        let orders = repo.list_orders_for_window(&window()).unwrap();
        let keys: Vec<_> = orders.iter().map(|o| o.order_key.as_str()).collect();
        // O1 打包在窗口前但交付在窗口内；O3 两者都不在
        assert_eq!(keys, vec!["O1", "O2"]);
    }

    #[test]
    fn test_deliveries_include_end_day() {
        let repo = setup_repo();
        let deliveries = repo.list_deliveries_for_window(&window()).unwrap();
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].package_key, "PKG1");
    }
}
