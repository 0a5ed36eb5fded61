// ==========================================
// 配置管理集成测试
// ==========================================
// 测试目标: 配置写入文件库后，新建连接 / AppState 能读取到
// ==========================================


use maintenance_hub::app::AppState;
use maintenance_hub::config::{config_keys, CalendarColors, ConfigManager};
use maintenance_hub::domain::Priority;
use maintenance_hub::engine::StageTransitionMode;
use test_helpers::{create_test_db, seed_equipment};

#[test]
fn test_config_persists_across_connections() {
    let (_tmp, db_path) = create_test_db().unwrap();

    {
        let config = ConfigManager::new(&db_path).unwrap();
        config
            .set_config_value(config_keys::STAGE_TRANSITION_MODE, "STRICT")
            .unwrap();
        config
            .set_config_value(config_keys::CALENDAR_COLOR_PENDING, "#3b82f6")
            .unwrap();
    }

    let config = ConfigManager::new(&db_path).unwrap();
    assert_eq!(
        config.get_stage_transition_mode().unwrap(),
        StageTransitionMode::Strict
    );
    assert_eq!(
        config.get_calendar_colors().unwrap(),
        CalendarColors {
            repaired: CalendarColors::DEFAULT_REPAIRED.to_string(),
            pending: "#3b82f6".to_string(),
        }
    );

    let snapshot: serde_json::Value =
        serde_json::from_str(&config.get_config_snapshot().unwrap()).unwrap();
    assert_eq!(snapshot[config_keys::STAGE_TRANSITION_MODE], "STRICT");
}

#[test]
fn test_default_priority_prefills_draft() {
    let (_tmp, db_path) = create_test_db().unwrap();
    ConfigManager::new(&db_path)
        .unwrap()
        .set_config_value(config_keys::DEFAULT_PRIORITY, "CRITICAL")
        .unwrap();

    let state = AppState::new(db_path).unwrap();
    let eq = seed_equipment(&state, "SN-1", "锅炉");

    let draft = state.request_api.new_request_draft(&eq.equipment_id).unwrap();
    assert_eq!(draft.priority, Priority::Critical);
    assert_eq!(draft.targets.equipment_id.as_deref(), Some(eq.equipment_id.as_str()));
}
