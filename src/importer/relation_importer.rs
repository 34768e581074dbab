// ==========================================
// 缺货损失报表 - 输入关系导入器
// ==========================================
// 流程: 文件解析 → 列映射 → 清洗/校验 → 单事务 UPSERT
// 红线: 坏行跳过并记录，不中断整批；缺列直接拒绝整个文件
// ==========================================

use crate::importer::data_cleaner::{DataCleaner, DATE_FORMAT, TIMESTAMP_FORMAT};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRecord, UniversalFileParser};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};
use uuid::Uuid;

// ==========================================
// RelationKind - 可导入的输入关系
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Unit,
    Order,
    Delivery,
    StockSnapshot,
    Product,
    Warehouse,
}

/// 列值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Text,
    OptionalText,
    Timestamp,
    Date,
    /// 可空非负小数
    OptionalReal,
    /// 非负整数
    Count,
    Flag,
}

/// 目标列定义（首个名称即表列名，其余为源文件别名）
struct ColumnDef {
    names: &'static [&'static str],
    kind: ColumnKind,
}

impl ColumnDef {
    const fn new(names: &'static [&'static str], kind: ColumnKind) -> Self {
        Self { names, kind }
    }

    fn table_column(&self) -> &'static str {
        self.names[0]
    }

    fn is_required(&self) -> bool {
        !matches!(
            self.kind,
            ColumnKind::OptionalText | ColumnKind::OptionalReal | ColumnKind::Flag
        )
    }
}

const UNIT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new(&["unit_key", "item_key"], ColumnKind::Text),
    ColumnDef::new(&["product_key"], ColumnKind::Text),
    ColumnDef::new(&["supplier_name", "supplier"], ColumnKind::Text),
    ColumnDef::new(&["warehouse_id", "warehouse"], ColumnKind::Text),
    ColumnDef::new(&["stock_status", "status"], ColumnKind::Text),
    ColumnDef::new(&["bundle_size"], ColumnKind::OptionalReal),
    ColumnDef::new(&["internal_quantity"], ColumnKind::OptionalReal),
    ColumnDef::new(&["received_at", "received_timestamp"], ColumnKind::Timestamp),
];

const ORDER_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new(&["order_key", "order_item_key"], ColumnKind::Text),
    ColumnDef::new(&["unit_key", "item_key"], ColumnKind::Text),
    ColumnDef::new(&["package_key"], ColumnKind::OptionalText),
    ColumnDef::new(&["packaged_at", "packaged_timestamp"], ColumnKind::Timestamp),
];

const DELIVERY_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new(&["package_key"], ColumnKind::Text),
    ColumnDef::new(&["delivered_at", "delivered_timestamp"], ColumnKind::Timestamp),
];

const SNAPSHOT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new(&["warehouse_id", "warehouse"], ColumnKind::Text),
    ColumnDef::new(&["product_id", "sku_id"], ColumnKind::Text),
    ColumnDef::new(&["supplier_name", "supplier"], ColumnKind::Text),
    ColumnDef::new(&["stock_date", "date"], ColumnKind::Date),
    ColumnDef::new(&["total_units"], ColumnKind::Count),
];

const PRODUCT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new(&["product_key"], ColumnKind::Text),
    ColumnDef::new(&["product_id", "sku_id"], ColumnKind::Text),
    ColumnDef::new(&["product_name", "sku_name"], ColumnKind::OptionalText),
    ColumnDef::new(&["category", "use_case_category"], ColumnKind::OptionalText),
];

const WAREHOUSE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new(&["warehouse_id", "warehouse"], ColumnKind::Text),
    ColumnDef::new(&["warehouse_name"], ColumnKind::Text),
    ColumnDef::new(&["country"], ColumnKind::Text),
    ColumnDef::new(&["is_active", "active"], ColumnKind::Flag),
];

impl RelationKind {
    pub const ALL: [RelationKind; 6] = [
        RelationKind::Unit,
        RelationKind::Order,
        RelationKind::Delivery,
        RelationKind::StockSnapshot,
        RelationKind::Product,
        RelationKind::Warehouse,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            RelationKind::Unit => "unit",
            RelationKind::Order => "unit_order",
            RelationKind::Delivery => "delivery",
            RelationKind::StockSnapshot => "stock_snapshot",
            RelationKind::Product => "product",
            RelationKind::Warehouse => "warehouse",
        }
    }

    fn columns(&self) -> &'static [ColumnDef] {
        match self {
            RelationKind::Unit => UNIT_COLUMNS,
            RelationKind::Order => ORDER_COLUMNS,
            RelationKind::Delivery => DELIVERY_COLUMNS,
            RelationKind::StockSnapshot => SNAPSHOT_COLUMNS,
            RelationKind::Product => PRODUCT_COLUMNS,
            RelationKind::Warehouse => WAREHOUSE_COLUMNS,
        }
    }

    fn upsert_sql(&self) -> String {
        let columns = self.columns();
        let names: Vec<&str> = columns.iter().map(|c| c.table_column()).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            self.table_name(),
            names.join(", "),
            placeholders.join(", ")
        )
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationKind::Unit => "unit",
            RelationKind::Order => "order",
            RelationKind::Delivery => "delivery",
            RelationKind::StockSnapshot => "stock_snapshot",
            RelationKind::Product => "product",
            RelationKind::Warehouse => "warehouse",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for RelationKind {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "unit" | "units" => Ok(RelationKind::Unit),
            "order" | "orders" | "unit_order" => Ok(RelationKind::Order),
            "delivery" | "deliveries" => Ok(RelationKind::Delivery),
            "stock_snapshot" | "snapshot" | "snapshots" => Ok(RelationKind::StockSnapshot),
            "product" | "products" => Ok(RelationKind::Product),
            "warehouse" | "warehouses" => Ok(RelationKind::Warehouse),
            _ => Err(ImportError::UnknownRelation(s.to_string())),
        }
    }
}

// ==========================================
// ImportSummary - 单次导入结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub batch_id: String,
    pub relation: RelationKind,
    pub rows_read: usize,
    pub rows_imported: usize,
    /// (行号, 原因)
    pub rejected: Vec<(usize, String)>,
}

// ==========================================
// RelationImporter
// ==========================================
pub struct RelationImporter {
    conn: Arc<Mutex<Connection>>,
    cleaner: DataCleaner,
}

impl RelationImporter {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            cleaner: DataCleaner,
        }
    }

    /// 导入单个文件（CSV / XLSX）
    #[instrument(skip(self, file_path), fields(relation = %kind))]
    pub fn import_file<P: AsRef<Path>>(
        &self,
        kind: RelationKind,
        file_path: P,
    ) -> ImportResult<ImportSummary> {
        let path = file_path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        info!(file_path = %path.display(), "开始导入输入关系");

        let records = UniversalFileParser.parse(path)?;
        info!(total_rows = records.len(), "文件解析完成");

        self.import_records(kind, &records)
    }

    /// 导入已解析记录
    pub fn import_records(
        &self,
        kind: RelationKind,
        records: &[RawRecord],
    ) -> ImportResult<ImportSummary> {
        let batch_id = Uuid::new_v4().to_string();
        self.check_columns(kind, records)?;

        let mut rows = Vec::with_capacity(records.len());
        let mut rejected = Vec::new();
        for record in records {
            match self.convert_record(kind, record) {
                Ok(values) => rows.push(values),
                Err(e) => {
                    warn!(row_number = record.row_number, error = %e, "行校验失败，已跳过");
                    rejected.push((record.row_number, e.to_string()));
                }
            }
        }

        let rows_imported = self.write_rows(kind, &rows)?;

        info!(
            batch_id = %batch_id,
            relation = %kind,
            rows_read = records.len(),
            rows_imported,
            rows_rejected = rejected.len(),
            "输入关系导入完成"
        );

        Ok(ImportSummary {
            batch_id,
            relation: kind,
            rows_read: records.len(),
            rows_imported,
            rejected,
        })
    }

    /// 表头必须覆盖全部必填列（按首行判断）
    fn check_columns(&self, kind: RelationKind, records: &[RawRecord]) -> ImportResult<()> {
        let Some(first) = records.first() else {
            return Ok(());
        };
        for column in kind.columns().iter().filter(|c| c.is_required()) {
            if !column.names.iter().any(|name| first.values.contains_key(*name)) {
                return Err(ImportError::MissingColumn {
                    relation: kind.to_string(),
                    column: column.table_column().to_string(),
                });
            }
        }
        Ok(())
    }

    fn convert_record(&self, kind: RelationKind, record: &RawRecord) -> ImportResult<Vec<Value>> {
        let row = record.row_number;
        kind.columns()
            .iter()
            .map(|column| -> ImportResult<Value> {
                let raw = record.get(column.names);
                let field = column.table_column();
                let value = match column.kind {
                    ColumnKind::Text => Value::Text(self.cleaner.require_text(raw, field, row)?),
                    ColumnKind::OptionalText => match self.cleaner.normalize_null(raw) {
                        Some(v) => Value::Text(v),
                        None => Value::Null,
                    },
                    ColumnKind::Timestamp => {
                        let text = self.cleaner.require_text(raw, field, row)?;
                        let ts = self.cleaner.parse_timestamp(&text, field, row)?;
                        Value::Text(ts.format(TIMESTAMP_FORMAT).to_string())
                    }
                    ColumnKind::Date => {
                        let text = self.cleaner.require_text(raw, field, row)?;
                        let date = self.cleaner.parse_date(&text, field, row)?;
                        Value::Text(date.format(DATE_FORMAT).to_string())
                    }
                    ColumnKind::OptionalReal => {
                        match self.cleaner.parse_optional_f64(raw, field, row, 0.0)? {
                            Some(v) => Value::Real(v),
                            None => Value::Null,
                        }
                    }
                    ColumnKind::Count => {
                        let text = self.cleaner.require_text(raw, field, row)?;
                        let count = self.cleaner.parse_i64(&text, field, row)?;
                        if count < 0 {
                            return Err(ImportError::ValueRangeError {
                                row,
                                field: field.to_string(),
                                value: count as f64,
                                min: 0.0,
                                max: f64::MAX,
                            });
                        }
                        Value::Integer(count)
                    }
                    // 缺省视为启用
                    ColumnKind::Flag => match self.cleaner.normalize_null(raw) {
                        Some(v) => Value::Integer(i64::from(self.cleaner.parse_flag(&v, field, row)?)),
                        None => Value::Integer(1),
                    },
                };
                Ok(value)
            })
            .collect()
    }

    fn write_rows(&self, kind: RelationKind, rows: &[Vec<Value>]) -> ImportResult<usize> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::LockError(e.to_string()))?;

        let tx = conn
            .transaction()
            .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;
        let mut written = 0usize;
        {
            let mut stmt = tx.prepare(&kind.upsert_sql())?;
            for values in rows {
                written += stmt.execute(params_from_iter(values.iter()))?;
            }
        }
        tx.commit()
            .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use std::collections::HashMap;

    fn setup() -> (Arc<Mutex<Connection>>, RelationImporter) {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let importer = RelationImporter::new(conn.clone());
        (conn, importer)
    }

    fn record(row_number: usize, pairs: &[(&str, &str)]) -> RawRecord {
        RawRecord {
            row_number,
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_relation_kind_parsing() {
        assert_eq!("orders".parse::<RelationKind>().unwrap(), RelationKind::Order);
        assert_eq!(
            "stock-snapshot".parse::<RelationKind>().unwrap(),
            RelationKind::StockSnapshot
        );
        assert!(matches!(
            "inventory".parse::<RelationKind>(),
            Err(ImportError::UnknownRelation(_))
        ));
        assert_eq!(RelationKind::ALL.len(), 6);
    }

    #[test]
    fn test_import_units_with_aliases() {
        let (conn, importer) = setup();
        let records = vec![
            record(
                2,
                &[
                    ("item_key", "U1"),
                    ("product_key", "P1"),
                    ("supplier_name", "Acme"),
                    ("warehouse_id", "W1"),
                    ("stock_status", "stocked"),
                    ("bundle_size", "2"),
                    ("internal_quantity", ""),
                    ("received_timestamp", "2024-01-01T08:30:00"),
                ],
            ),
            record(
                3,
                &[
                    ("item_key", "U2"),
                    ("product_key", "P1"),
                    ("supplier_name", "Acme"),
                    ("warehouse_id", "W1"),
                    ("stock_status", "stocked"),
                    ("bundle_size", "-3"),
                    ("internal_quantity", ""),
                    ("received_timestamp", "2024-01-01"),
                ],
            ),
        ];

        let summary = importer.import_records(RelationKind::Unit, &records).unwrap();
        assert_eq!(summary.rows_read, 2);
        assert_eq!(summary.rows_imported, 1);
        assert_eq!(summary.rejected.len(), 1);
        assert_eq!(summary.rejected[0].0, 3);

        let conn = conn.lock().unwrap();
        let (received_at, internal): (String, Option<f64>) = conn
            .query_row(
                "SELECT received_at, internal_quantity FROM unit WHERE unit_key = 'U1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(received_at, "2024-01-01 08:30:00");
        assert_eq!(internal, None);
    }

    #[test]
    fn test_missing_required_column_rejects_file() {
        let (_conn, importer) = setup();
        let records = vec![record(2, &[("package_key", "K1")])];
        let err = importer
            .import_records(RelationKind::Delivery, &records)
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::MissingColumn { ref column, .. } if column == "delivered_at"
        ));
    }

    #[test]
    fn test_reimport_replaces_rows() {
        let (conn, importer) = setup();
        let first = vec![record(
            2,
            &[
                ("warehouse_id", "W1"),
                ("warehouse_name", "Depot"),
                ("country", "KE"),
                ("is_active", "yes"),
            ],
        )];
        let second = vec![record(
            2,
            &[
                ("warehouse_id", "W1"),
                ("warehouse_name", "Depot North"),
                ("country", "KE"),
                ("is_active", "0"),
            ],
        )];
        importer.import_records(RelationKind::Warehouse, &first).unwrap();
        importer.import_records(RelationKind::Warehouse, &second).unwrap();

        let conn = conn.lock().unwrap();
        let (count, name, active): (i64, String, i64) = conn
            .query_row(
                "SELECT COUNT(*), MAX(warehouse_name), MAX(is_active) FROM warehouse",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(name, "Depot North");
        assert_eq!(active, 0);
    }

    #[test]
    fn test_snapshot_dates_normalized() {
        let (conn, importer) = setup();
        let records = vec![record(
            2,
            &[
                ("warehouse_id", "W1"),
                ("sku_id", "SKU-1"),
                ("supplier_name", "Acme"),
                ("date", "20240105"),
                ("total_units", "4.0"),
            ],
        )];
        let summary = importer
            .import_records(RelationKind::StockSnapshot, &records)
            .unwrap();
        assert_eq!(summary.rows_imported, 1);

        let conn = conn.lock().unwrap();
        let stock_date: String = conn
            .query_row("SELECT stock_date FROM stock_snapshot", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stock_date, "2024-01-05");
    }
}
