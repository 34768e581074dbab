// ==========================================
// 缺货损失报表 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供输入关系的只读访问,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod ledger_repo;
pub mod reference_repo;
pub mod snapshot_repo;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use ledger_repo::LedgerRepository;
pub use reference_repo::ReferenceRepository;
pub use snapshot_repo::SnapshotRepository;

use crate::domain::ledger::LedgerInputs;
use crate::domain::types::ReportWindow;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// 输入关系仓储集合
pub struct InputRepositories {
    pub ledger: LedgerRepository,
    pub snapshots: SnapshotRepository,
    pub reference: ReferenceRepository,
}

impl InputRepositories {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            ledger: LedgerRepository::new(conn.clone()),
            snapshots: SnapshotRepository::new(conn.clone()),
            reference: ReferenceRepository::new(conn),
        }
    }

    /// 读取一次运行所需的全部输入关系
    pub fn load_inputs(&self, window: &ReportWindow) -> RepositoryResult<LedgerInputs> {
        let inputs = LedgerInputs {
            units: self.ledger.list_units()?,
            orders: self.ledger.list_orders_for_window(window)?,
            deliveries: self.ledger.list_deliveries_for_window(window)?,
            snapshots: self.snapshots.list_snapshots_for_window(window)?,
            products: self.reference.list_products()?,
            warehouses: self.reference.list_warehouses()?,
        };

        tracing::info!(
            window = %window,
            units = inputs.units.len(),
            orders = inputs.orders.len(),
            deliveries = inputs.deliveries.len(),
            snapshots = inputs.snapshots.len(),
            products = inputs.products.len(),
            warehouses = inputs.warehouses.len(),
            "输入关系读取完成"
        );

        Ok(inputs)
    }
}
