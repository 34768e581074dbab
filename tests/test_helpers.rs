// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、输入关系造数等功能
// ==========================================

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};
use stockout_report::config::ReportSettings;
use stockout_report::db::{init_schema, open_sqlite_connection};
use stockout_report::domain::{CategoryFilter, ReportRequest, ReportWindow};
use stockout_report::engine::{LostSalesPipeline, PipelineOutcome};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = Connection::open(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(open_sqlite_connection(db_path)?)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// 构造报表请求（可选品类过滤，逗号分隔）
pub fn request(start: NaiveDate, end: NaiveDate, categories: Option<&str>) -> ReportRequest {
    let filter = categories
        .map(CategoryFilter::parse_list)
        .unwrap_or_default();
    ReportRequest::new(ReportWindow::new(start, end).unwrap(), filter)
}

/// 以给定配置对数据库运行完整管道
pub fn run_report_with(
    db_path: &str,
    request: &ReportRequest,
    settings: ReportSettings,
) -> PipelineOutcome {
    stockout_report::logging::init_test();
    let conn = Arc::new(Mutex::new(open_test_connection(db_path).unwrap()));
    LostSalesPipeline::new(settings)
        .run_from_db(conn, request)
        .expect("pipeline run failed")
}

/// 以默认配置运行
pub fn run_report(db_path: &str, request: &ReportRequest) -> PipelineOutcome {
    run_report_with(db_path, request, ReportSettings::default())
}

// ==========================================
// 输入关系造数
// ==========================================

pub fn insert_warehouse(
    conn: &Connection,
    warehouse_id: &str,
    name: &str,
    is_active: bool,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT INTO warehouse (warehouse_id, warehouse_name, country, is_active) VALUES (?1, ?2, 'KE', ?3)",
        params![warehouse_id, name, is_active as i32],
    )?;
    Ok(())
}

pub fn insert_product(
    conn: &Connection,
    product_key: &str,
    product_id: &str,
    name: Option<&str>,
    category: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT INTO product (product_key, product_id, product_name, category) VALUES (?1, ?2, ?3, ?4)",
        params![product_key, product_id, name, category],
    )?;
    Ok(())
}

/// 单品批次描述
pub struct UnitBatch<'a> {
    pub prefix: &'a str,
    pub product_key: &'a str,
    pub warehouse_id: &'a str,
    pub supplier_name: &'a str,
    pub bundle_size: Option<f64>,
    /// 入库时间（"YYYY-MM-DD HH:MM:SS"）
    pub received_at: &'a str,
}

/// 插入 count 个在库单品，每个单品一个订单、一个包裹，包裹在 delivered_at 交付
pub fn insert_delivered_units(
    conn: &Connection,
    batch: &UnitBatch,
    count: usize,
    packaged_at: &str,
    delivered_at: &str,
) -> Result<(), Box<dyn Error>> {
    for i in 0..count {
        let unit_key = format!("{}-U{}", batch.prefix, i);
        let package_key = format!("{}-K{}", batch.prefix, i);
        conn.execute(
            r#"
            INSERT INTO unit (unit_key, product_key, supplier_name, warehouse_id,
                              stock_status, bundle_size, internal_quantity, received_at)
            VALUES (?1, ?2, ?3, ?4, 'stocked', ?5, NULL, ?6)
            "#,
            params![
                unit_key,
                batch.product_key,
                batch.supplier_name,
                batch.warehouse_id,
                batch.bundle_size,
                batch.received_at
            ],
        )?;
        conn.execute(
            "INSERT INTO unit_order (order_key, unit_key, package_key, packaged_at) VALUES (?1, ?2, ?3, ?4)",
            params![format!("{}-O{}", batch.prefix, i), unit_key, package_key, packaged_at],
        )?;
        conn.execute(
            "INSERT INTO delivery (package_key, delivered_at) VALUES (?1, ?2)",
            params![package_key, delivered_at],
        )?;
    }
    Ok(())
}

/// 从 first 起连续 days 天写入快照，前 zero_days 天 total_units = 0，其余为 5
pub fn insert_snapshot_run(
    conn: &Connection,
    warehouse_id: &str,
    product_id: &str,
    supplier_name: &str,
    first: NaiveDate,
    days: i64,
    zero_days: i64,
) -> Result<(), Box<dyn Error>> {
    for offset in 0..days {
        let stock_date = first + Duration::days(offset);
        let total_units = if offset < zero_days { 0 } else { 5 };
        conn.execute(
            r#"
            INSERT INTO stock_snapshot (warehouse_id, product_id, supplier_name, stock_date, total_units)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                warehouse_id,
                product_id,
                supplier_name,
                stock_date.format("%Y-%m-%d").to_string(),
                total_units
            ],
        )?;
    }
    Ok(())
}

/// 标准场景: 仓库 W1（启用），产品 P1 / SKU-P（irrigation），供应商 Acme
pub fn seed_reference(conn: &Connection) -> Result<(), Box<dyn Error>> {
    insert_warehouse(conn, "W1", "Nairobi Depot", true)?;
    insert_product(conn, "P1", "SKU-P", Some("Drip Kit"), Some("irrigation"))?;
    Ok(())
}

pub fn standard_batch<'a>(received_at: &'a str) -> UnitBatch<'a> {
    UnitBatch {
        prefix: "A",
        product_key: "P1",
        warehouse_id: "W1",
        supplier_name: "Acme",
        bundle_size: Some(2.0),
        received_at,
    }
}
