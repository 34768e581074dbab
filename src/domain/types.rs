// ==========================================
// 缺货损失报表 - 领域类型定义
// ==========================================
// 职责: 报表窗口、品类过滤、三元组主键、估算策略枚举
// 红线: 窗口为闭区间 [start_date, end_date]，start_date 不得晚于 end_date
// ==========================================

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ==========================================
// 报表窗口 (Report Window)
// ==========================================

/// 报表窗口非法 (start_date > end_date)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("报表窗口非法: start_date={start} 晚于 end_date={end}")]
pub struct InvalidWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// 报表窗口（闭区间日期）
///
/// 反序列化同样经过 [`ReportWindow::new`] 校验。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawReportWindow")]
pub struct ReportWindow {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Deserialize)]
struct RawReportWindow {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl TryFrom<RawReportWindow> for ReportWindow {
    type Error = InvalidWindow;

    fn try_from(raw: RawReportWindow) -> Result<Self, Self::Error> {
        Self::new(raw.start_date, raw.end_date)
    }
}

impl ReportWindow {
    /// 创建报表窗口
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, InvalidWindow> {
        if start_date > end_date {
            return Err(InvalidWindow {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// 窗口起点时间戳 (start_date 00:00:00)
    pub fn start_ts(&self) -> NaiveDateTime {
        self.start_date.and_time(NaiveTime::MIN)
    }

    /// 打包时间上界 (end_date 00:00:00，闭区间)
    ///
    /// 日期字面量与时间戳直接比较，end_date 当天 00:00 之后的打包不计入。
    pub fn packaged_upper_ts(&self) -> NaiveDateTime {
        self.end_date.and_time(NaiveTime::MIN)
    }

    /// 交付时间上界 ((end_date + 1 天) 00:00:00，开区间)
    ///
    /// 放宽一天以覆盖 end_date 当天的日内交付时间戳。
    pub fn delivered_upper_ts(&self) -> NaiveDateTime {
        (self.end_date + Duration::days(1)).and_time(NaiveTime::MIN)
    }

    /// 交付时间是否落在 [start, end + 1 天)
    pub fn contains_delivery(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start_ts() && ts < self.delivered_upper_ts()
    }

    /// 打包时间是否落在 [start, end]
    pub fn contains_packaging(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start_ts() && ts <= self.packaged_upper_ts()
    }

    /// 快照日期是否落在 [start_date, end_date]
    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// 可追踪区间起点: max(start_date, first_stock_date)
    pub fn trackable_start(&self, first_stock_date: NaiveDate) -> NaiveDate {
        self.start_date.max(first_stock_date)
    }

    /// 可追踪天数: end_date - max(start_date, first_stock_date)
    ///
    /// first_stock_date 晚于 end_date 时结果为负。
    pub fn trackable_days(&self, first_stock_date: NaiveDate) -> i64 {
        (self.end_date - self.trackable_start(first_stock_date)).num_days()
    }

    /// 快照日期是否落在可追踪区间 [max(start_date, first_stock_date), end_date)
    ///
    /// end_date 当天的快照不计入在库天数，保证在库 + 缺货 = 可追踪天数。
    /// 可追踪天数为负时区间为空。
    pub fn counts_toward_span(&self, date: NaiveDate, first_stock_date: NaiveDate) -> bool {
        date >= self.trackable_start(first_stock_date) && date < self.end_date
    }
}

impl fmt::Display for ReportWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start_date, self.end_date)
    }
}

// ==========================================
// 品类过滤 (Category Filter)
// ==========================================

/// 品类过滤条件
///
/// - `All`: 不过滤，品类为空的记录同样保留
/// - `Only`: 仅保留品类在集合内的记录，品类为空的记录被排除
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryFilter {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl CategoryFilter {
    /// 从逗号分隔的字符串构造（空串视为不过滤）
    pub fn parse_list(raw: &str) -> Self {
        let set: BTreeSet<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if set.is_empty() {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(set)
        }
    }

    pub fn matches(&self, category: Option<&str>) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(set) => category.map(|c| set.contains(c)).unwrap_or(false),
        }
    }
}

// ==========================================
// 报表请求 (Report Request)
// ==========================================

/// 一次报表运行的调用参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub window: ReportWindow,
    pub category_filter: CategoryFilter,
}

impl ReportRequest {
    pub fn new(window: ReportWindow, category_filter: CategoryFilter) -> Self {
        Self {
            window,
            category_filter,
        }
    }
}

// ==========================================
// 三元组主键 (sku, warehouse, supplier)
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TripleKey {
    pub sku_id: String,
    pub warehouse_id: String,
    pub supplier_name: String,
}

impl TripleKey {
    pub fn new(
        sku_id: impl Into<String>,
        warehouse_id: impl Into<String>,
        supplier_name: impl Into<String>,
    ) -> Self {
        Self {
            sku_id: sku_id.into(),
            warehouse_id: warehouse_id.into(),
            supplier_name: supplier_name.into(),
        }
    }
}

impl fmt::Display for TripleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.sku_id, self.warehouse_id, self.supplier_name)
    }
}

// ==========================================
// 负缺货天数处理策略
// ==========================================
// first_stock_date 晚于 end_date 时，缺货天数会为负
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NegativeStockoutPolicy {
    #[default]
    Clamp, // 截断为 0 并计入诊断
    Keep,  // 原样保留负值
}

impl fmt::Display for NegativeStockoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NegativeStockoutPolicy::Clamp => write!(f, "CLAMP"),
            NegativeStockoutPolicy::Keep => write!(f, "KEEP"),
        }
    }
}

impl FromStr for NegativeStockoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CLAMP" => Ok(NegativeStockoutPolicy::Clamp),
            "KEEP" => Ok(NegativeStockoutPolicy::Keep),
            other => Err(format!("未知的负缺货天数策略: {}", other)),
        }
    }
}

// ==========================================
// 零快照覆盖处理策略
// ==========================================
// 窗口内没有任何快照记录的三元组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZeroCoveragePolicy {
    #[default]
    AssumeOutOfStock, // 视为整段缺货
    Exclude,          // 视为数据不足，缺货天数为空
}

impl fmt::Display for ZeroCoveragePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZeroCoveragePolicy::AssumeOutOfStock => write!(f, "ASSUME_OUT_OF_STOCK"),
            ZeroCoveragePolicy::Exclude => write!(f, "EXCLUDE"),
        }
    }
}

impl FromStr for ZeroCoveragePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ASSUME_OUT_OF_STOCK" => Ok(ZeroCoveragePolicy::AssumeOutOfStock),
            "EXCLUDE" => Ok(ZeroCoveragePolicy::Exclude),
            other => Err(format!("未知的零覆盖策略: {}", other)),
        }
    }
}
