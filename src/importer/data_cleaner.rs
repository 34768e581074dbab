// ==========================================
// 缺货损失报表 - 数据清洗器
// ==========================================
// 职责: TRIM / NULL 标准化 / 日期与时间戳解析 / 数值范围校验
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// 入库存储格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const TIMESTAMP_INPUT_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

pub struct DataCleaner;

impl DataCleaner {
    /// 标准化 NULL 值（空字符串/空白/"NULL" → None）
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 必填文本
    pub fn require_text(&self, value: Option<&str>, field: &str, row: usize) -> ImportResult<String> {
        self.normalize_null(value)
            .ok_or_else(|| ImportError::PrimaryKeyMissing {
                row,
                field: field.to_string(),
            })
    }

    /// 解析日期（YYYY-MM-DD / YYYYMMDD / YYYY/MM/DD，带时间部分时取日期）
    pub fn parse_date(&self, value: &str, field: &str, row: usize) -> ImportResult<NaiveDate> {
        let v = value.trim();
        NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(v, "%Y%m%d"))
            .or_else(|_| NaiveDate::parse_from_str(v, "%Y/%m/%d"))
            .or_else(|_| self.parse_timestamp(v, field, row).map(|ts| ts.date()).map_err(|_| ()))
            .map_err(|_| ImportError::DateFormatError {
                row,
                field: field.to_string(),
                value: value.to_string(),
            })
    }

    /// 解析时间戳；只有日期时补 00:00:00
    pub fn parse_timestamp(&self, value: &str, field: &str, row: usize) -> ImportResult<NaiveDateTime> {
        let v = value.trim();
        TIMESTAMP_INPUT_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(v, fmt).ok())
            .or_else(|| {
                NaiveDate::parse_from_str(v, "%Y-%m-%d")
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN))
            })
            .ok_or_else(|| ImportError::TimestampFormatError {
                row,
                field: field.to_string(),
                value: value.to_string(),
            })
    }

    /// 解析可空数值并校验下限
    pub fn parse_optional_f64(
        &self,
        value: Option<&str>,
        field: &str,
        row: usize,
        min: f64,
    ) -> ImportResult<Option<f64>> {
        let Some(raw) = self.normalize_null(value) else {
            return Ok(None);
        };
        let parsed = raw
            .parse::<f64>()
            .map_err(|e| ImportError::TypeConversionError {
                row,
                field: field.to_string(),
                message: e.to_string(),
            })?;
        self.validate_decimal(parsed, min, f64::MAX, field, row).map(Some)
    }

    /// 解析整数（Excel 单元格可能带 ".0"）
    pub fn parse_i64(&self, value: &str, field: &str, row: usize) -> ImportResult<i64> {
        let v = value.trim();
        v.parse::<i64>()
            .or_else(|_| {
                v.parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
                    .ok_or(())
            })
            .map_err(|_| ImportError::TypeConversionError {
                row,
                field: field.to_string(),
                message: format!("不是整数: {}", value),
            })
    }

    /// 解析布尔标志（1/0, true/false, Y/N, yes/no, 是/否）
    pub fn parse_flag(&self, value: &str, field: &str, row: usize) -> ImportResult<bool> {
        match value.trim().to_uppercase().as_str() {
            "1" | "1.0" | "Y" | "YES" | "TRUE" | "是" => Ok(true),
            "0" | "0.0" | "N" | "NO" | "FALSE" | "否" => Ok(false),
            other => Err(ImportError::TypeConversionError {
                row,
                field: field.to_string(),
                message: format!("无法识别的标志值: {}", other),
            }),
        }
    }

    /// 校验数值范围
    pub fn validate_decimal(
        &self,
        value: f64,
        min: f64,
        max: f64,
        field: &str,
        row: usize,
    ) -> ImportResult<f64> {
        if !value.is_finite() || value < min || value > max {
            Err(ImportError::ValueRangeError {
                row,
                field: field.to_string(),
                value,
                min,
                max,
            })
        } else {
            Ok(value)
        }
    }
}
