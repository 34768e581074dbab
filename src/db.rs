// ==========================================
// 缺货损失报表 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少与上游写入并发时的偶发 busy 错误
// - 提供输入关系表 schema（幂等建表）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 版本号只用于提示/告警（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 输入关系与配置表 schema
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_scope (
    scope_id TEXT PRIMARY KEY,
    scope_type TEXT NOT NULL,
    scope_key TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(scope_type, scope_key)
);

INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
VALUES ('global', 'GLOBAL', 'global');

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

-- 参考数据
CREATE TABLE IF NOT EXISTS product (
    product_key TEXT PRIMARY KEY,
    product_id TEXT NOT NULL,
    product_name TEXT,
    category TEXT
);

CREATE TABLE IF NOT EXISTS warehouse (
    warehouse_id TEXT PRIMARY KEY,
    warehouse_name TEXT NOT NULL,
    country TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1
);

-- 单品台账（不建外键：缺失的参考数据通过外连接以空值传递）
CREATE TABLE IF NOT EXISTS unit (
    unit_key TEXT PRIMARY KEY,
    product_key TEXT NOT NULL,
    supplier_name TEXT NOT NULL,
    warehouse_id TEXT NOT NULL,
    stock_status TEXT NOT NULL,
    bundle_size REAL,
    internal_quantity REAL,
    received_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS unit_order (
    order_key TEXT PRIMARY KEY,
    unit_key TEXT NOT NULL,
    package_key TEXT,
    packaged_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS delivery (
    package_key TEXT PRIMARY KEY,
    delivered_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS stock_snapshot (
    warehouse_id TEXT NOT NULL,
    product_id TEXT NOT NULL,
    supplier_name TEXT NOT NULL,
    stock_date TEXT NOT NULL,
    total_units INTEGER NOT NULL,
    PRIMARY KEY (warehouse_id, product_id, supplier_name, stock_date)
);

CREATE INDEX IF NOT EXISTS idx_unit_order_packaged_at ON unit_order(packaged_at);
CREATE INDEX IF NOT EXISTS idx_delivery_delivered_at ON delivery(delivered_at);
CREATE INDEX IF NOT EXISTS idx_stock_snapshot_date ON stock_snapshot(stock_date);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）并登记 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    configure_sqlite_connection(conn)?;
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 检查 schema_version，不一致时仅告警
pub fn warn_on_schema_mismatch(conn: &Connection) -> rusqlite::Result<()> {
    match read_schema_version(conn)? {
        Some(v) if v == CURRENT_SCHEMA_VERSION => {}
        Some(v) => tracing::warn!(
            expected = CURRENT_SCHEMA_VERSION,
            actual = v,
            "数据库 schema_version 与代码期望不一致"
        ),
        None => tracing::warn!("数据库缺少 schema_version 表，可能未初始化"),
    }
    Ok(())
}

/// 默认数据库路径
///
/// 优先级: 环境变量 STOCKOUT_REPORT_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("STOCKOUT_REPORT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./stockout_report.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("stockout-report");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("stockout_report.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_schema_version_missing_table() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);
    }
}
