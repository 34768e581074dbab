// ==========================================
// 缺货损失报表 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::report_config_trait::ReportConfigReader;
use crate::config::report_settings::{DEFAULT_BUNDLE_SIZE, DEFAULT_STOCKED_STATUS};
use crate::db::open_sqlite_connection;
use crate::domain::types::{NegativeStockoutPolicy, ZeroCoveragePolicy};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式，按 key 排序）
    ///
    /// 用于在导出报表时记录本次运行所用配置。
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let config_map = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<BTreeMap<String, String>>>()?;

        Ok(serde_json::to_string(&config_map)?)
    }
}

// ==========================================
// ReportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ReportConfigReader for ConfigManager {
    async fn get_stocked_status_label(&self) -> ConfigResult<String> {
        let value =
            self.get_config_or_default(config_keys::STOCKED_STATUS_LABEL, DEFAULT_STOCKED_STATUS)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            tracing::warn!(
                config_key = config_keys::STOCKED_STATUS_LABEL,
                "在库状态标签为空，使用默认值"
            );
            return Ok(DEFAULT_STOCKED_STATUS.to_string());
        }
        Ok(trimmed.to_string())
    }

    async fn get_default_bundle_size(&self) -> ConfigResult<f64> {
        let value = self.get_config_or_default(config_keys::DEFAULT_BUNDLE_SIZE, "1")?;
        match value.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
            _ => {
                tracing::warn!(
                    config_key = config_keys::DEFAULT_BUNDLE_SIZE,
                    raw_value = %value,
                    "默认包装规格配置格式错误，使用默认值"
                );
                Ok(DEFAULT_BUNDLE_SIZE)
            }
        }
    }

    async fn get_negative_stockout_policy(&self) -> ConfigResult<NegativeStockoutPolicy> {
        let value = self.get_config_or_default(config_keys::NEGATIVE_STOCKOUT_POLICY, "CLAMP")?;
        Ok(value.parse().unwrap_or_else(|e: String| {
            tracing::warn!(
                config_key = config_keys::NEGATIVE_STOCKOUT_POLICY,
                raw_value = %value,
                error = %e,
                "负缺货天数策略配置错误，使用 CLAMP"
            );
            NegativeStockoutPolicy::default()
        }))
    }

    async fn get_zero_coverage_policy(&self) -> ConfigResult<ZeroCoveragePolicy> {
        let value =
            self.get_config_or_default(config_keys::ZERO_COVERAGE_POLICY, "ASSUME_OUT_OF_STOCK")?;
        Ok(value.parse().unwrap_or_else(|e: String| {
            tracing::warn!(
                config_key = config_keys::ZERO_COVERAGE_POLICY,
                raw_value = %value,
                error = %e,
                "零覆盖策略配置错误，使用 ASSUME_OUT_OF_STOCK"
            );
            ZeroCoveragePolicy::default()
        }))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 单品在库口径
    pub const STOCKED_STATUS_LABEL: &str = "stocked_status_label";
    pub const DEFAULT_BUNDLE_SIZE: &str = "default_bundle_size";

    // 缺货天数边界处理
    pub const NEGATIVE_STOCKOUT_POLICY: &str = "negative_stockout_policy";
    pub const ZERO_COVERAGE_POLICY: &str = "zero_coverage_policy";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportSettings;

    fn setup_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_table_empty() {
        let manager = setup_manager();
        let settings = ReportSettings::load(&manager).await.unwrap();
        assert_eq!(settings, ReportSettings::default());
    }

    #[tokio::test]
    async fn test_overrides_are_applied() {
        let manager = setup_manager();
        manager
            .set_global_config_value(config_keys::STOCKED_STATUS_LABEL, "IN_STOCK")
            .unwrap();
        manager
            .set_global_config_value(config_keys::ZERO_COVERAGE_POLICY, "exclude")
            .unwrap();

        let settings = ReportSettings::load(&manager).await.unwrap();
        assert_eq!(settings.stocked_status_label, "IN_STOCK");
        assert_eq!(settings.zero_coverage_policy, ZeroCoveragePolicy::Exclude);
        assert_eq!(settings.negative_stockout_policy, NegativeStockoutPolicy::Clamp);
    }

    #[tokio::test]
    async fn test_malformed_values_fall_back() {
        let manager = setup_manager();
        manager
            .set_global_config_value(config_keys::DEFAULT_BUNDLE_SIZE, "-3")
            .unwrap();
        manager
            .set_global_config_value(config_keys::NEGATIVE_STOCKOUT_POLICY, "IGNORE")
            .unwrap();

        assert_eq!(manager.get_default_bundle_size().await.unwrap(), 1.0);
        assert_eq!(
            manager.get_negative_stockout_policy().await.unwrap(),
            NegativeStockoutPolicy::Clamp
        );
    }

    #[test]
    fn test_config_snapshot_is_sorted_json() {
        let manager = setup_manager();
        manager.set_global_config_value("b_key", "2").unwrap();
        manager.set_global_config_value("a_key", "1").unwrap();

        let snapshot = manager.get_config_snapshot().unwrap();
        assert_eq!(snapshot, r#"{"a_key":"1","b_key":"2"}"#);
    }
}
