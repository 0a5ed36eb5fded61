// ==========================================
// 设备导入集成测试
// ==========================================
// 测试目标: CSV 导入 → 设备落库 → 工单可引用导入设备
// ==========================================


use maintenance_hub::domain::{RequestDraft, RequestStage};
use maintenance_hub::importer::{EquipmentImporter, ImportError};
use std::io::Write;
use tempfile::Builder;
use test_helpers::create_test_state;

fn write_csv(content: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn test_import_then_scrap_imported_equipment() {
    let (_tmp, state) = create_test_state();
    let csv = write_csv(
        "name,serial_number,department,location,health,description\n\
         数控车床,CNC-001,机加工,A区,95,\n\
         空压机,AC-002,动力,B区,70,备用机\n",
    );

    let report = state.equipment_importer.import_from_csv(csv.path()).await.unwrap();
    assert_eq!(report.imported, 2);
    assert!(report.is_clean());

    let found = state.equipment_api.search_equipment("ac-002").unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].description, "备用机");

    let mut draft = RequestDraft::for_equipment("储气罐锈穿", &found[0].equipment_id);
    draft.stage = RequestStage::Scrap;
    state.request_api.create_request(draft, "alice").unwrap();

    let summary = state.dashboard_api.get_summary().unwrap();
    assert_eq!(summary.total_equipment, 2);
    assert_eq!(summary.scrapped_equipment, 1);
}

#[tokio::test]
async fn test_reimport_reports_duplicates() {
    let (_tmp, state) = create_test_state();
    let csv = write_csv("name,serial_number\n车床,SN-1\n铣床,SN-2\n");

    let first = state.equipment_importer.import_from_csv(csv.path()).await.unwrap();
    assert_eq!(first.imported, 2);

    let second = state.equipment_importer.import_from_csv(csv.path()).await.unwrap();
    assert_eq!(second.imported, 0);
    assert_eq!(second.rejected.len(), 2);
    assert!(second.rejected.iter().all(|r| r.reason.contains(&r.serial_number)));

    assert_eq!(state.equipment_api.list_equipment().unwrap().len(), 2);
}

#[tokio::test]
async fn test_batch_import() {
    let (_tmp, state) = create_test_state();
    let a = write_csv("name,serial_number\n车床,SN-A\n");
    let b = write_csv("name,department\n缺列,机加工\n");

    let results = state
        .equipment_importer
        .batch_import(vec![a.path().to_path_buf(), b.path().to_path_buf()])
        .await;
    assert!(results[0].is_ok());
    assert!(results[1].as_ref().unwrap_err().contains("serial_number"));

    assert!(matches!(
        state.equipment_importer.import_from_csv(b.path()).await,
        Err(ImportError::MissingColumn(_))
    ));
}
