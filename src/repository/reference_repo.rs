// ==========================================
// 缺货损失报表 - 参考数据仓储
// ==========================================
// 职责: 读取 product / warehouse 静态参考数据
// ==========================================

use crate::domain::ledger::{Product, Warehouse};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// 参考数据仓储
pub struct ReferenceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReferenceRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 全部产品
    pub fn list_products(&self) -> RepositoryResult<Vec<Product>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            "SELECT product_key, product_id, product_name, category FROM product ORDER BY product_key",
        )?;

        let products = stmt
            .query_map([], |row| {
                Ok(Product {
                    product_key: row.get(0)?,
                    product_id: row.get(1)?,
                    product_name: row.get(2)?,
                    category: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(products)
    }

    /// 全部仓库（含未启用仓库，由报表组装阶段过滤）
    pub fn list_warehouses(&self) -> RepositoryResult<Vec<Warehouse>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt = conn.prepare(
            r#"
            SELECT warehouse_id, warehouse_name, country, is_active
            FROM warehouse
            ORDER BY warehouse_id
        "#,
        )?;

        let warehouses = stmt
            .query_map([], |row| {
                let is_active: i32 = row.get(3)?;
                Ok(Warehouse {
                    warehouse_id: row.get(0)?,
                    warehouse_name: row.get(1)?,
                    country: row.get(2)?,
                    is_active: is_active != 0,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(warehouses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_rows() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO product VALUES ('PK1', 'SKU1', 'Test Kit', NULL);
            INSERT INTO warehouse VALUES ('W2', 'Depot B', 'KE', 0);
            INSERT INTO warehouse VALUES ('W1', 'Depot A', 'KE', 1);
        "#,
        )
        .unwrap();

        let repo = ReferenceRepository::new(Arc::new(Mutex::new(conn)));
        let products = repo.list_products().unwrap();
        assert_eq!(products[0].category, None);

        let warehouses = repo.list_warehouses().unwrap();
        assert_eq!(warehouses[0].warehouse_id, "W1");
        assert!(warehouses[0].is_active);
        assert!(!warehouses[1].is_active);
    }
}
