// ==========================================
// 缺货损失报表 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("输入表缺失: {0}（请先初始化 schema 并导入输入关系）")]
    MissingTable(String),

    // ===== 数据质量错误 =====
    #[error("字段值错误 (table={table}, field={field}): {message}")]
    FieldValueError {
        table: String,
        field: String,
        message: String,
    },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                if let Some(table) = msg.strip_prefix("no such table: ") {
                    RepositoryError::MissingTable(table.to_string())
                } else {
                    RepositoryError::DatabaseQueryError(msg)
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            rusqlite::Error::FromSqlConversionFailure(idx, _, cause) => {
                RepositoryError::FieldValueError {
                    table: "Unknown".to_string(),
                    field: format!("column#{}", idx),
                    message: cause.to_string(),
                }
            }
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_missing_table_is_classified() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn
            .prepare("SELECT * FROM stock_snapshot")
            .map(|_| ())
            .unwrap_err();
        match RepositoryError::from(err) {
            RepositoryError::MissingTable(t) => assert_eq!(t, "stock_snapshot"),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
