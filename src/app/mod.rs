// ==========================================
// 设备维护管理系统 - 应用层
// ==========================================
// 职责: 组装仓储 / 配置 / API，供界面层与命令行使用
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
