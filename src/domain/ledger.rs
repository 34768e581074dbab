// ==========================================
// 缺货损失报表 - 输入关系实体
// ==========================================
// 职责: 单品/订单/交付/日库存快照/产品/仓库 六张输入关系
// 红线: 输入关系只读，一次运行期间不被修改
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 单品 (Unit) - 一个实物库存单元
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub unit_key: String,
    pub product_key: String,
    pub supplier_name: String,
    pub warehouse_id: String,
    /// 库存状态 (例如 "stocked")
    pub stock_status: String,
    pub bundle_size: Option<f64>,
    pub internal_quantity: Option<f64>,
    pub received_at: NaiveDateTime,
}

impl Unit {
    /// 入库日期
    pub fn received_date(&self) -> NaiveDate {
        self.received_at.date()
    }
}

/// 订单 (Order) - 需求事件，多对一关联单品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitOrder {
    pub order_key: String,
    pub unit_key: String,
    /// 包裹号 (未发货时为空)
    pub package_key: Option<String>,
    pub packaged_at: NaiveDateTime,
}

/// 交付 (Delivery) - 每个订单至多一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub package_key: String,
    pub delivered_at: NaiveDateTime,
}

/// 日库存快照 - 每个三元组每天一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub warehouse_id: String,
    pub product_id: String,
    pub supplier_name: String,
    pub stock_date: NaiveDate,
    pub total_units: i64,
}

impl StockSnapshot {
    pub fn is_in_stock(&self) -> bool {
        self.total_units > 0
    }
}

/// 产品参考数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_key: String,
    /// SKU 标识
    pub product_id: String,
    pub product_name: Option<String>,
    pub category: Option<String>,
}

/// 仓库参考数据
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub warehouse_id: String,
    pub warehouse_name: String,
    pub country: String,
    pub is_active: bool,
}

/// 一次运行的全部输入关系（内存表）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerInputs {
    pub units: Vec<Unit>,
    pub orders: Vec<UnitOrder>,
    pub deliveries: Vec<Delivery>,
    pub snapshots: Vec<StockSnapshot>,
    pub products: Vec<Product>,
    pub warehouses: Vec<Warehouse>,
}
