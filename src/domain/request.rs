// ==========================================
// 设备维护管理系统 - 维修工单领域模型
// ==========================================
// 职责: 维修工单 / 工单表单草稿 / 维修日志
// 红线: 工单不删除；维修日志只追加，不修改
// ==========================================

use crate::domain::types::{MaintenanceTarget, Priority, RequestStage, RequestType, TargetRefs};
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

// ==========================================
// MaintenanceRequest - 维修工单
// ==========================================
// 对齐: maintenance_request 表
// 约束: 预防性工单必须带排期（由校验器保证）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    pub request_id: String,
    pub subject: String,
    pub target: MaintenanceTarget, // 设备或工作中心，二选一

    // ===== 工作流 =====
    pub request_type: RequestType,
    pub stage: RequestStage,
    pub priority: Priority,
    pub scheduled_date: Option<NaiveDateTime>, // 计划执行时间
    pub duration_hours: f64,                   // 实际耗时（小时）

    // ===== 分派 =====
    pub assigned_to: Option<String>,
    pub team_id: Option<String>,
    pub created_by: String,
    pub instructions: String,

    // ===== 审计 =====
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl MaintenanceRequest {
    /// 关联设备ID（工作中心工单返回 None）
    pub fn equipment_id(&self) -> Option<&str> {
        self.target.equipment_id()
    }

    pub fn work_center_id(&self) -> Option<&str> {
        self.target.work_center_id()
    }
}

// ==========================================
// RequestDraft - 工单表单草稿
// ==========================================
// 用途: 新建 / 编辑表单的原始输入，校验通过后才落库
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestDraft {
    pub subject: String,
    pub targets: TargetRefs,
    pub request_type: RequestType,
    pub stage: RequestStage,
    pub priority: Priority,
    pub scheduled_date: Option<NaiveDateTime>,
    pub duration_hours: f64,
    pub assigned_to: Option<String>,
    pub team_id: Option<String>,
    pub instructions: String,
}

impl RequestDraft {
    /// 针对设备的故障维修草稿
    pub fn for_equipment(subject: &str, equipment_id: &str) -> Self {
        Self {
            subject: subject.to_string(),
            targets: TargetRefs::equipment(equipment_id),
            ..Default::default()
        }
    }

    /// 针对工作中心的故障维修草稿
    pub fn for_work_center(subject: &str, work_center_id: &str) -> Self {
        Self {
            subject: subject.to_string(),
            targets: TargetRefs::work_center(work_center_id),
            ..Default::default()
        }
    }

    /// 从已有工单回填表单（编辑页 / 看板拖拽）
    pub fn from_request(request: &MaintenanceRequest) -> Self {
        Self {
            subject: request.subject.clone(),
            targets: request.target.to_refs(),
            request_type: request.request_type,
            stage: request.stage,
            priority: request.priority,
            scheduled_date: request.scheduled_date,
            duration_hours: request.duration_hours,
            assigned_to: request.assigned_to.clone(),
            team_id: request.team_id.clone(),
            instructions: request.instructions.clone(),
        }
    }

    /// 生成新工单
    ///
    /// # 参数
    /// - target: 已校验的维护对象
    /// - created_by: 创建人
    /// - now: 审计时间戳
    pub fn into_request(
        self,
        target: MaintenanceTarget,
        created_by: &str,
        now: NaiveDateTime,
    ) -> MaintenanceRequest {
        MaintenanceRequest {
            request_id: uuid::Uuid::new_v4().to_string(),
            subject: self.subject.trim().to_string(),
            target,
            request_type: self.request_type,
            stage: self.stage,
            priority: self.priority,
            scheduled_date: self.scheduled_date,
            duration_hours: self.duration_hours,
            assigned_to: self.assigned_to,
            team_id: self.team_id,
            created_by: created_by.to_string(),
            instructions: self.instructions,
            created_at: now,
            updated_at: now,
        }
    }

    /// 将表单内容写回已有工单（保留 request_id / created_* 审计字段）
    pub fn apply_to(
        self,
        request: &mut MaintenanceRequest,
        target: MaintenanceTarget,
        now: NaiveDateTime,
    ) {
        request.subject = self.subject.trim().to_string();
        request.target = target;
        request.request_type = self.request_type;
        request.stage = self.stage;
        request.priority = self.priority;
        request.scheduled_date = self.scheduled_date;
        request.duration_hours = self.duration_hours;
        request.assigned_to = self.assigned_to;
        request.team_id = self.team_id;
        request.instructions = self.instructions;
        request.updated_at = now;
    }
}

// ==========================================
// MaintenanceLog - 维修日志
// ==========================================
// 红线: 只追加，不修改，不删除
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceLog {
    pub log_id: String,
    pub request_id: String,
    pub comment: String,
    pub created_by: String,
    pub created_at: NaiveDateTime,
}

impl MaintenanceLog {
    pub fn new(request_id: &str, comment: &str, created_by: &str) -> Self {
        // 秒级，与库内存储精度一致
        let now = chrono::Local::now().naive_local();
        Self {
            log_id: uuid::Uuid::new_v4().to_string(),
            request_id: request_id.to_string(),
            comment: comment.trim().to_string(),
            created_by: created_by.to_string(),
            created_at: now.with_nanosecond(0).unwrap_or(now),
        }
    }
}
