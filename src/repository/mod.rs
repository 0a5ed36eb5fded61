// ==========================================
// 设备维护管理系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod equipment_repo;
pub mod error;
pub mod maintenance_log_repo;
pub mod request_repo;
pub(crate) mod sql_utils;
pub mod team_repo;
pub mod unit_of_work;
pub mod work_center_repo;

// 重导出核心仓储
pub use equipment_repo::EquipmentRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use maintenance_log_repo::MaintenanceLogRepository;
pub use request_repo::MaintenanceRequestRepository;
pub use team_repo::{EquipmentCategoryRepository, MaintenanceTeamRepository};
pub use unit_of_work::UnitOfWork;
pub use work_center_repo::WorkCenterRepository;
