// ==========================================
// 设备维护管理系统 - 命令行入口
// ==========================================
// 用法: maintenance-hub [设备台账.csv]
// 数据库路径: MAINTENANCE_HUB_DB_PATH 或用户数据目录
// 日志格式: MAINTENANCE_HUB_LOG_FORMAT=json 输出 JSON 行
// ==========================================

use maintenance_hub::app::{get_default_db_path, AppState};
use maintenance_hub::i18n;
use maintenance_hub::importer::{EquipmentImporter, ImportError};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    if std::env::var("MAINTENANCE_HUB_LOG_FORMAT").as_deref() == Ok("json") {
        maintenance_hub::logging::init_json();
    } else {
        maintenance_hub::logging::init();
    }

    tracing::info!("==================================================");
    tracing::info!("{}", maintenance_hub::APP_NAME);
    tracing::info!("系统版本: {}", maintenance_hub::VERSION);
    tracing::info!("==================================================");

    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let app_state = match AppState::new(db_path) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("无法初始化AppState: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(csv_path) = std::env::args().nth(1) {
        match app_state.equipment_importer.import_from_csv(&csv_path).await {
            Ok(report) => {
                tracing::info!(
                    imported = report.imported,
                    rejected = report.rejected.len(),
                    "{}",
                    i18n::t("common.success")
                );
                for row in &report.rejected {
                    tracing::warn!(row = row.row, serial = %row.serial_number, "{}", row.reason);
                }
            }
            Err(ImportError::FileNotFound(path)) => {
                tracing::error!("{}", i18n::t_with_args("import.file_not_found", &[("path", &path)]));
                return ExitCode::FAILURE;
            }
            Err(e) => {
                tracing::error!(error = %e, "{}", i18n::t("common.failed"));
                return ExitCode::FAILURE;
            }
        }
    }

    match app_state.dashboard_api.get_summary() {
        Ok(summary) => {
            tracing::info!(
                total_equipment = summary.total_equipment,
                open_requests = summary.open_requests,
                scrapped_equipment = summary.scrapped_equipment,
                "驾驶舱统计"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("读取驾驶舱统计失败: {}", e);
            ExitCode::FAILURE
        }
    }
}
