// ==========================================
// 设备维护管理系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{DashboardApi, EquipmentApi, RequestApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::importer::EquipmentCsvImporter;
use crate::repository::{
    EquipmentCategoryRepository, EquipmentRepository, MaintenanceLogRepository,
    MaintenanceRequestRepository, MaintenanceTeamRepository, WorkCenterRepository,
};

/// 应用状态
///
/// 包含所有API实例和共享资源，所有仓储共用同一连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 资产API
    pub equipment_api: Arc<EquipmentApi>,

    /// 维修工单API
    pub request_api: Arc<RequestApi>,

    /// 驾驶舱API
    pub dashboard_api: Arc<DashboardApi>,

    /// 设备导入器
    pub equipment_importer: Arc<EquipmentCsvImporter>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例（打开数据库并初始化表结构）
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let equipment_repo = Arc::new(EquipmentRepository::new(conn.clone()));
        let work_center_repo = Arc::new(WorkCenterRepository::new(conn.clone()));
        let team_repo = Arc::new(MaintenanceTeamRepository::new(conn.clone()));
        let category_repo = Arc::new(EquipmentCategoryRepository::new(conn.clone()));
        let request_repo = Arc::new(MaintenanceRequestRepository::new(conn.clone()));
        let log_repo = Arc::new(MaintenanceLogRepository::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // 应用已保存的界面语言
        match config_manager.get_locale() {
            Ok(locale) => {
                crate::i18n::set_locale(&locale);
            }
            Err(e) => tracing::warn!("读取界面语言失败，使用默认语言: {}", e),
        }

        // ==========================================
        // 初始化API层
        // ==========================================
        let equipment_api = Arc::new(EquipmentApi::new(
            equipment_repo.clone(),
            work_center_repo,
            team_repo,
            category_repo,
        ));
        let request_api = Arc::new(RequestApi::new(
            conn,
            request_repo.clone(),
            log_repo,
            equipment_repo.clone(),
            config_manager.clone(),
        ));
        let dashboard_api = Arc::new(DashboardApi::new(equipment_repo.clone(), request_repo));
        let equipment_importer = Arc::new(EquipmentCsvImporter::new(equipment_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            equipment_api,
            request_api,
            dashboard_api,
            equipment_importer,
            config_manager,
        })
    }

    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// 优先级: 环境变量 MAINTENANCE_HUB_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("MAINTENANCE_HUB_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./maintenance_hub.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("maintenance-hub-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("maintenance-hub");

        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("maintenance_hub.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_new() {
        // AppState::new 会切换全局语言
        let _guard = crate::i18n::tests::LOCALE_TEST_LOCK
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.get_db_path(), db_path);
        assert_eq!(state.dashboard_api.get_summary().unwrap().total_equipment, 0);
    }
}
