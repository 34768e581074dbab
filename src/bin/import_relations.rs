// Small ops utility: load input relations from CSV / XLSX into the report database.
//
// Usage:
//   cargo run --bin import_relations -- <db_path> <relation> <file> [<file> ...]
//
// relation: unit | order | delivery | stock_snapshot | product | warehouse
// The schema is created if missing; rows are upserted by primary key.

use anyhow::{anyhow, Context};
use std::sync::{Arc, Mutex};
use stockout_report::db::{init_schema, open_sqlite_connection};
use stockout_report::importer::{RelationImporter, RelationKind};
use stockout_report::logging;

fn main() -> anyhow::Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let usage = "usage: import_relations <db_path> <relation> <file> [<file> ...]";
    let db_path = args.next().ok_or_else(|| anyhow!(usage))?;
    let kind: RelationKind = args.next().ok_or_else(|| anyhow!(usage))?.parse()?;
    let files: Vec<String> = args.collect();
    if files.is_empty() {
        return Err(anyhow!(usage));
    }

    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("failed to open database: {}", db_path))?;
    init_schema(&conn)?;

    let importer = RelationImporter::new(Arc::new(Mutex::new(conn)));
    let mut rejected_total = 0usize;
    for file in &files {
        let summary = importer
            .import_file(kind, file)
            .with_context(|| format!("import failed: {}", file))?;
        for (row, reason) in &summary.rejected {
            eprintln!("{}:{}: {}", file, row, reason);
        }
        rejected_total += summary.rejected.len();
        println!(
            "batch_id={} relation={} file={} read={} imported={} rejected={}",
            summary.batch_id,
            summary.relation,
            file,
            summary.rows_read,
            summary.rows_imported,
            summary.rejected.len()
        );
    }

    if rejected_total > 0 {
        return Err(anyhow!("{} row(s) rejected", rejected_total));
    }
    Ok(())
}
