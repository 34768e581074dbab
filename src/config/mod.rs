// ==========================================
// 缺货损失报表 - 配置层
// ==========================================
// 职责: 报表参数读取，缺省值兜底
// 存储: config_kv 表 (scope_id = 'global')
// ==========================================

pub mod config_manager;
pub mod report_config_trait;
pub mod report_settings;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use report_config_trait::ReportConfigReader;
pub use report_settings::ReportSettings;
