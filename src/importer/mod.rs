// ==========================================
// 缺货损失报表 - 导入层
// ==========================================
// 职责: 外部文件（CSV / XLSX）→ 输入关系表
// ==========================================

pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod relation_importer;

pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRecord, UniversalFileParser};
pub use relation_importer::{ImportSummary, RelationImporter, RelationKind};
