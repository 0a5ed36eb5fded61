// ==========================================
// 设备维护管理系统 - 导入层
// ==========================================
// 职责: 外部设备台账导入
// 支持: CSV
// ==========================================

pub mod equipment_csv;
pub mod error;

// 重导出核心类型
pub use equipment_csv::{EquipmentCsvImporter, EquipmentImporter, ImportReport, RejectedRow};
pub use error::{ImportError, ImportResult};
