// ==========================================
// 缺货损失报表 - 报表配置读取 Trait
// ==========================================
// 职责: 定义报表运行所需配置项的读取接口（不包含实现）
// 实现者: ConfigManager
// ==========================================

use crate::domain::types::{NegativeStockoutPolicy, ZeroCoveragePolicy};
use async_trait::async_trait;
use std::error::Error;

#[async_trait]
pub trait ReportConfigReader: Send + Sync {
    /// 视为"在库"的单品状态标签（默认 "stocked"）
    async fn get_stocked_status_label(&self) -> Result<String, Box<dyn Error + Send + Sync>>;

    /// 无在库单品时的默认包装规格（默认 1）
    async fn get_default_bundle_size(&self) -> Result<f64, Box<dyn Error + Send + Sync>>;

    /// 负缺货天数处理策略（默认 CLAMP）
    async fn get_negative_stockout_policy(
        &self,
    ) -> Result<NegativeStockoutPolicy, Box<dyn Error + Send + Sync>>;

    /// 零快照覆盖处理策略（默认 ASSUME_OUT_OF_STOCK）
    async fn get_zero_coverage_policy(
        &self,
    ) -> Result<ZeroCoveragePolicy, Box<dyn Error + Send + Sync>>;
}
