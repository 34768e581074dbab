// ==========================================
// ConfigManager 集成测试
// ==========================================
// 测试目标: 验证 config_kv 覆写能驱动报表参数与管道口径
// ==========================================

mod test_helpers;

use stockout_report::config::{config_keys, ConfigManager, ReportConfigReader, ReportSettings};
use stockout_report::domain::{NegativeStockoutPolicy, ZeroCoveragePolicy};
use test_helpers::*;

#[tokio::test]
async fn test_config_manager_creation() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");

    let config_manager = ConfigManager::new(&db_path);
    assert!(
        config_manager.is_ok(),
        "ConfigManager should be created successfully"
    );
}

#[tokio::test]
async fn test_overrides_are_read_back() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let config_manager = ConfigManager::new(&db_path).expect("Failed to create ConfigManager");

    config_manager
        .set_global_config_value(config_keys::STOCKED_STATUS_LABEL, "AVAILABLE")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::DEFAULT_BUNDLE_SIZE, "6")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::NEGATIVE_STOCKOUT_POLICY, "KEEP")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::ZERO_COVERAGE_POLICY, "EXCLUDE")
        .unwrap();

    assert_eq!(
        config_manager
            .get_global_config_value(config_keys::NEGATIVE_STOCKOUT_POLICY)
            .unwrap()
            .as_deref(),
        Some("KEEP")
    );
    assert_eq!(
        config_manager.get_stocked_status_label().await.unwrap(),
        "AVAILABLE"
    );
    assert_eq!(config_manager.get_default_bundle_size().await.unwrap(), 6.0);
    assert_eq!(
        config_manager.get_negative_stockout_policy().await.unwrap(),
        NegativeStockoutPolicy::Keep
    );
    assert_eq!(
        config_manager.get_zero_coverage_policy().await.unwrap(),
        ZeroCoveragePolicy::Exclude
    );
}

#[tokio::test]
async fn test_stocked_label_override_changes_bundle_size() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    seed_reference(&conn).unwrap();
    // 入库状态为 stocked，但配置把在库口径改为 AVAILABLE → 无在库单品，取默认规格
    insert_delivered_units(
        &conn,
        &standard_batch("2023-12-01 09:00:00"),
        2,
        "2024-01-14 09:00:00",
        "2024-01-15 12:00:00",
    )
    .unwrap();
    insert_snapshot_run(&conn, "W1", "SKU-P", "Acme", date(2024, 1, 1), 30, 0).unwrap();

    let config_manager = ConfigManager::new(&db_path).unwrap();
    config_manager
        .set_global_config_value(config_keys::STOCKED_STATUS_LABEL, "AVAILABLE")
        .unwrap();
    config_manager
        .set_global_config_value(config_keys::DEFAULT_BUNDLE_SIZE, "12")
        .unwrap();
    let settings = ReportSettings::load(&config_manager).await.unwrap();

    let outcome = run_report_with(
        &db_path,
        &request(date(2024, 1, 1), date(2024, 1, 31), None),
        settings,
    );
    assert_eq!(outcome.rows.len(), 1);
    assert!((outcome.rows[0].bundle_size - 12.0).abs() < 1e-9);
}
