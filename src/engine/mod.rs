// ==========================================
// 设备维护管理系统 - 引擎层
// ==========================================
// 职责: 工单生命周期规则（校验 / 阶段流转 / 报废传播）
// 红线: 引擎不直接持有连接，持久化通过端口传入
// ==========================================

pub mod events;
pub mod request_validator;
pub mod scrap_propagation;
pub mod stage_policy;

// 重导出核心引擎
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, RequestEventPublisher, RequestSavedEvent,
};
pub use request_validator::{
    validate_request, FieldError, RequestValidator, ValidationErrorKind,
};
pub use scrap_propagation::{
    EquipmentScrapPort, PropagationOutcome, ScrapPropagationRule, SqliteEquipmentScrapPort,
};
pub use stage_policy::{InvalidTransition, StageTransitionMode, StageTransitionPolicy};
