// ==========================================
// ImportApi / TemplateApi 集成测试
// ==========================================
// 测试目标: 上传入口的输入检查、错误分类、模板下载元数据、批次历史
// ==========================================

mod test_helpers;

use catalog_import::api::{ApiError, ImportApi, TemplateApi, TEMPLATE_FILE_NAME, XLSX_CONTENT_TYPE};
use catalog_import::app::AppState;
use catalog_import::config::{config_keys, ConfigManager};
use catalog_import::domain::BatchStatus;
use catalog_import::logging;
use test_helpers::{build_xlsx, create_test_db, product_row, required_headers, seed_categories};

#[tokio::test]
async fn test_empty_upload_is_invalid_input() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(db_path);

    let err = api.import_products(&[], Some("empty.xlsx"), None).await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_oversized_upload_rejected_before_parsing() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().unwrap();
    ConfigManager::new(&db_path)
        .unwrap()
        .set_global_config_value(config_keys::MAX_UPLOAD_BYTES, "16")
        .unwrap();
    let api = ImportApi::new(db_path);

    let err = api
        .import_products(&[b'a'; 64], Some("big.csv"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));
}

#[tokio::test]
async fn test_unreadable_file_is_rejected() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().unwrap();
    let api = ImportApi::new(db_path);

    let err = api
        .import_products(&[0xFF, 0xFE, 0x00, 0x01, 0x9F], Some("photo.jpg"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ImportRejected(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_import_and_list_batches() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().unwrap();
    seed_categories(&db_path).await.unwrap();
    let state = AppState::new(db_path).unwrap();

    let file = build_xlsx(
        &required_headers(),
        &[product_row("TS-001", "قميص", "CLOTHING", "10", "1")],
    );
    let first = state
        .import_api
        .import_products(&file, Some("a.xlsx"), Some("admin"))
        .await
        .unwrap();
    assert_eq!(first.status, BatchStatus::Success);

    let second = state
        .import_api
        .import_products(&file, Some("b.xlsx"), Some("admin"))
        .await
        .unwrap();
    assert_eq!(second.updated, 1);

    let batches = state.import_api.list_recent_batches(10).await.unwrap();
    assert_eq!(batches.len(), 2);
    let ids: Vec<_> = batches.iter().map(|b| b.batch_id.clone()).collect();
    assert!(ids.contains(&first.batch_id));
    assert!(ids.contains(&second.batch_id));

    // limit 下限为 1
    assert_eq!(state.import_api.list_recent_batches(0).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_download_template_metadata() {
    logging::init_test();
    let (_temp_file, db_path) = create_test_db().unwrap();
    seed_categories(&db_path).await.unwrap();
    let api = TemplateApi::new(db_path.clone());

    let download = api.download_template().await.unwrap();
    assert_eq!(download.file_name, TEMPLATE_FILE_NAME);
    assert_eq!(download.content_type, XLSX_CONTENT_TYPE);
    assert_eq!(download.cache_control, "public, max-age=3600");
    assert!(download.bytes.starts_with(b"PK"));

    ConfigManager::new(&db_path)
        .unwrap()
        .set_global_config_value(config_keys::TEMPLATE_CACHE_SECONDS, "60")
        .unwrap();
    let download = api.download_template().await.unwrap();
    assert_eq!(download.cache_control, "public, max-age=60");
}
