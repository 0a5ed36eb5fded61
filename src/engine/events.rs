// ==========================================
// 设备维护管理系统 - 工单事件发布
// ==========================================
// 职责: 工单提交成功后通知下游（看板刷新、消息推送等）
// 说明: Engine 层定义 trait，外部集成层实现
// 注意: 报废传播不走事件，而是在保存事务内显式调用
// ==========================================

use crate::domain::types::RequestStage;
use crate::engine::scrap_propagation::PropagationOutcome;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 工单事件
// ==========================================

/// 工单保存事件（事务提交后发布）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSavedEvent {
    /// 工单ID
    pub request_id: String,
    /// 是否新建
    pub created: bool,
    /// 保存前阶段（新建为 None）
    pub previous_stage: Option<RequestStage>,
    /// 保存后阶段
    pub stage: RequestStage,
    /// 关联设备
    pub equipment_id: Option<String>,
    /// 报废传播结果
    pub propagation: PropagationOutcome,
    /// 操作人
    pub actor: String,
}

impl RequestSavedEvent {
    /// 阶段是否发生变化
    pub fn stage_changed(&self) -> bool {
        self.previous_stage != Some(self.stage)
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 工单事件发布者 Trait
pub trait RequestEventPublisher: Send + Sync {
    /// 发布工单保存事件
    fn publish(&self, event: &RequestSavedEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl RequestEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: &RequestSavedEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - request_id={}, stage={}",
            event.request_id,
            event.stage
        );
        Ok(())
    }
}

/// 可选的事件发布者包装
///
/// 发布失败只记录告警：事件发布发生在提交之后，不回滚已保存的数据
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn RequestEventPublisher>>,
}

impl OptionalEventPublisher {
    pub fn with_publisher(publisher: Arc<dyn RequestEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: &RequestSavedEvent) {
        match &self.inner {
            Some(publisher) => {
                if let Err(e) = publisher.publish(event) {
                    tracing::warn!(
                        request_id = %event.request_id,
                        error = %e,
                        "工单事件发布失败（数据已提交）"
                    );
                }
            }
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - request_id={}",
                    event.request_id
                );
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}
