use super::MaintenanceRequestRepository;
use crate::db::open_in_memory;
use crate::domain::equipment::{Equipment, WorkCenter};
use crate::domain::request::{MaintenanceRequest, RequestDraft};
use crate::domain::types::{MaintenanceTarget, Priority, RequestStage, RequestType};
use crate::repository::equipment_repo::EquipmentRepository;
use crate::repository::error::RepositoryError;
use crate::repository::work_center_repo::WorkCenterRepository;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn ts(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn setup() -> (Arc<Mutex<Connection>>, String, String) {
    let conn = Arc::new(Mutex::new(open_in_memory().unwrap()));

    let eq = Equipment::new("SN-001", "CNC 车床", "机加工", "A 区");
    EquipmentRepository::new(conn.clone()).insert(&eq).unwrap();

    let wc = WorkCenter::new("WC-01", "装配线");
    WorkCenterRepository::new(conn.clone()).insert(&wc).unwrap();

    (conn, eq.equipment_id, wc.work_center_id)
}

fn make_request(subject: &str, target: MaintenanceTarget) -> MaintenanceRequest {
    let mut draft = RequestDraft::default();
    draft.subject = subject.to_string();
    draft.into_request(target, "alice", ts(2, 8))
}

#[test]
fn test_insert_and_find_by_id() {
    let (conn, eq_id, _) = setup();
    let repo = MaintenanceRequestRepository::new(conn);

    let mut req = make_request("主轴异响", MaintenanceTarget::Equipment(eq_id.clone()));
    req.scheduled_date = Some(ts(5, 9));
    req.priority = Priority::High;
    repo.insert(&req).unwrap();

    let found = repo.find_by_id(&req.request_id).unwrap().unwrap();
    assert_eq!(found.subject, "主轴异响");
    assert_eq!(found.target, MaintenanceTarget::Equipment(eq_id));
    assert_eq!(found.stage, RequestStage::New);
    assert_eq!(found.priority, Priority::High);
    assert_eq!(found.scheduled_date, Some(ts(5, 9)));
    assert_eq!(found.created_at, ts(2, 8));

    assert!(repo.find_by_id("missing").unwrap().is_none());
}

#[test]
fn test_update_stage_and_missing() {
    let (conn, _, wc_id) = setup();
    let repo = MaintenanceRequestRepository::new(conn);

    let mut req = make_request("线体停机", MaintenanceTarget::WorkCenter(wc_id));
    repo.insert(&req).unwrap();

    req.stage = RequestStage::InProgress;
    req.updated_at = ts(3, 10);
    repo.update(&req).unwrap();

    let found = repo.find_by_id(&req.request_id).unwrap().unwrap();
    assert_eq!(found.stage, RequestStage::InProgress);
    assert_eq!(found.updated_at, ts(3, 10));
    assert_eq!(found.created_at, ts(2, 8));

    let ghost = make_request("ghost", MaintenanceTarget::WorkCenter("x".to_string()));
    assert!(matches!(
        repo.update(&ghost).unwrap_err(),
        RepositoryError::NotFound { .. }
    ));
}

#[test]
fn test_unknown_equipment_violates_foreign_key() {
    let (conn, _, _) = setup();
    let repo = MaintenanceRequestRepository::new(conn);

    let req = make_request("未知设备", MaintenanceTarget::Equipment("nope".to_string()));
    assert!(matches!(
        repo.insert(&req).unwrap_err(),
        RepositoryError::ForeignKeyViolation(_)
    ));
}

#[test]
fn test_list_by_stage_orders_by_priority() {
    let (conn, eq_id, _) = setup();
    let repo = MaintenanceRequestRepository::new(conn);

    let mut low = make_request("低", MaintenanceTarget::Equipment(eq_id.clone()));
    low.priority = Priority::Low;
    let mut critical = make_request("紧急", MaintenanceTarget::Equipment(eq_id.clone()));
    critical.priority = Priority::Critical;
    let mut done = make_request("已修", MaintenanceTarget::Equipment(eq_id));
    done.stage = RequestStage::Repaired;

    repo.insert(&low).unwrap();
    repo.insert(&critical).unwrap();
    repo.insert(&done).unwrap();

    let column = repo.list_by_stage(RequestStage::New).unwrap();
    assert_eq!(column.len(), 2);
    assert_eq!(column[0].subject, "紧急");
    assert_eq!(column[1].subject, "低");

    assert_eq!(repo.count_open().unwrap(), 2);
}

#[test]
fn test_list_scheduled_preventive_with_target_name() {
    let (conn, eq_id, wc_id) = setup();
    let repo = MaintenanceRequestRepository::new(conn);

    let mut pm_eq = make_request("季度保养", MaintenanceTarget::Equipment(eq_id.clone()));
    pm_eq.request_type = RequestType::Preventive;
    pm_eq.scheduled_date = Some(ts(20, 8));

    let mut pm_wc = make_request("线体点检", MaintenanceTarget::WorkCenter(wc_id));
    pm_wc.request_type = RequestType::Preventive;
    pm_wc.scheduled_date = Some(ts(10, 8));

    let corrective = make_request("故障", MaintenanceTarget::Equipment(eq_id));

    repo.insert(&pm_eq).unwrap();
    repo.insert(&pm_wc).unwrap();
    repo.insert(&corrective).unwrap();

    let rows = repo.list_scheduled_preventive().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].1, "装配线");
    assert_eq!(rows[1].1, "CNC 车床");

    assert_eq!(repo.list_by_type(RequestType::Corrective).unwrap().len(), 1);
}
