// ==========================================
// 缺货损失报表 - 管道错误类型
// ==========================================
// 说明: 数值边界（除零、无快照）不属于错误，由各组件降级为确定的默认值
// ==========================================

use crate::domain::types::InvalidWindow;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 管道错误类型
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidWindow(#[from] InvalidWindow),

    #[error("输入关系读取失败: {0}")]
    Repository(#[from] RepositoryError),

    #[error("需求分组主键重复: {0}")]
    DuplicateDemandKey(String),

    #[error("报表运行已取消 (stage={stage})")]
    Cancelled { stage: &'static str },
}

/// Result 类型别名
pub type PipelineResult<T> = Result<T, PipelineError>;
