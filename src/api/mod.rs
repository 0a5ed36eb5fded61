// ==========================================
// 设备维护管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供界面层 / 命令行调用
// ==========================================

pub mod error;
pub mod dashboard_api;
pub mod equipment_api;
pub mod request_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use dashboard_api::{DashboardApi, DashboardSummary};
pub use equipment_api::{EquipmentApi, EquipmentAutofill, EquipmentDetail};
pub use request_api::{CalendarEvent, KanbanBoard, KanbanColumn, RequestApi};
