// ==========================================
// 缺货损失报表 - 报表运行参数
// ==========================================
// 职责: 将配置项解析为引擎可直接使用的不可变参数
// ==========================================

use crate::config::report_config_trait::ReportConfigReader;
use crate::domain::types::{NegativeStockoutPolicy, ZeroCoveragePolicy};
use serde::{Deserialize, Serialize};
use std::error::Error;

pub const DEFAULT_STOCKED_STATUS: &str = "stocked";
pub const DEFAULT_BUNDLE_SIZE: f64 = 1.0;

/// 报表运行参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    pub stocked_status_label: String,
    pub default_bundle_size: f64,
    pub negative_stockout_policy: NegativeStockoutPolicy,
    pub zero_coverage_policy: ZeroCoveragePolicy,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            stocked_status_label: DEFAULT_STOCKED_STATUS.to_string(),
            default_bundle_size: DEFAULT_BUNDLE_SIZE,
            negative_stockout_policy: NegativeStockoutPolicy::default(),
            zero_coverage_policy: ZeroCoveragePolicy::default(),
        }
    }
}

impl ReportSettings {
    /// 从配置读取器加载全部参数
    pub async fn load<R: ReportConfigReader + ?Sized>(
        reader: &R,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(Self {
            stocked_status_label: reader.get_stocked_status_label().await?,
            default_bundle_size: reader.get_default_bundle_size().await?,
            negative_stockout_policy: reader.get_negative_stockout_policy().await?,
            zero_coverage_policy: reader.get_zero_coverage_policy().await?,
        })
    }

    /// 状态是否为"在库"（忽略大小写与首尾空白）
    pub fn is_stocked(&self, stock_status: &str) -> bool {
        stock_status
            .trim()
            .eq_ignore_ascii_case(self.stocked_status_label.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_stocked_ignores_case() {
        let settings = ReportSettings::default();
        assert!(settings.is_stocked("Stocked "));
        assert!(!settings.is_stocked("shipped"));
    }
}
