// ==========================================
// 设备维护管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 核心规则: 工单表单校验 + 报废工单传播设备报废
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{MaintenanceTarget, Priority, RequestStage, RequestType, TargetRefs};

// 领域实体
pub use domain::{
    Equipment, EquipmentCategory, MaintenanceLog, MaintenanceRequest, MaintenanceTeam,
    RequestDraft, WorkCenter,
};

// 引擎
pub use engine::{
    validate_request, FieldError, PropagationOutcome, RequestValidator, ScrapPropagationRule,
    StageTransitionMode, StageTransitionPolicy, ValidationErrorKind,
};

// API
pub use api::{ApiError, ApiResult, DashboardApi, EquipmentApi, RequestApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "设备维护管理系统";

// 数据库版本
pub const DB_VERSION: &str = "v1";
