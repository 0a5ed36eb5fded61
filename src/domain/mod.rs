// ==========================================
// 设备维护管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod equipment;
pub mod request;
pub mod types;

// 重导出核心类型
pub use equipment::{Equipment, EquipmentCategory, MaintenanceTeam, WorkCenter, HEALTH_MAX};
pub use request::{MaintenanceLog, MaintenanceRequest, RequestDraft};
pub use types::{MaintenanceTarget, Priority, RequestStage, RequestType, TargetRefs};
