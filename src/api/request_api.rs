// ==========================================
// 设备维护管理系统 - 维修工单 API
// ==========================================
// 职责: 工单新建 / 编辑 / 看板拖拽 / 维修日志 / 看板与日历视图
// 红线: 工单保存与报废传播在同一事务内提交，任一失败整体回滚
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::{NaiveDateTime, Timelike};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::request::{MaintenanceLog, MaintenanceRequest, RequestDraft};
use crate::domain::types::{RequestStage, TargetRefs};
use crate::engine::events::{OptionalEventPublisher, RequestEventPublisher, RequestSavedEvent};
use crate::engine::request_validator::RequestValidator;
use crate::engine::scrap_propagation::{
    PropagationOutcome, ScrapPropagationRule, SqliteEquipmentScrapPort,
};
use crate::engine::stage_policy::StageTransitionPolicy;
use crate::repository::equipment_repo::EquipmentRepository;
use crate::repository::maintenance_log_repo::MaintenanceLogRepository;
use crate::repository::request_repo::MaintenanceRequestRepository;
use crate::repository::unit_of_work::UnitOfWork;

/// 日历事件时间格式（ISO-8601，无时区）
const CALENDAR_START_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ==========================================
// 视图模型
// ==========================================

/// 看板列
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KanbanColumn {
    pub stage: RequestStage,
    pub requests: Vec<MaintenanceRequest>,
}

/// 看板（固定四列，顺序与阶段一致）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KanbanBoard {
    pub columns: Vec<KanbanColumn>,
}

impl KanbanBoard {
    pub fn column(&self, stage: RequestStage) -> Option<&KanbanColumn> {
        self.columns.iter().find(|c| c.stage == stage)
    }
}

/// 日历事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub title: String,
    pub start: String,
    pub url: String,
    pub color: String,
}

// ==========================================
// RequestApi - 维修工单 API
// ==========================================
pub struct RequestApi {
    conn: Arc<Mutex<Connection>>,
    request_repo: Arc<MaintenanceRequestRepository>,
    log_repo: Arc<MaintenanceLogRepository>,
    equipment_repo: Arc<EquipmentRepository>,
    config_manager: Arc<ConfigManager>,
    validator: RequestValidator,
    scrap_rule: ScrapPropagationRule,
    event_publisher: OptionalEventPublisher,
}

impl RequestApi {
    /// 创建新的RequestApi实例
    ///
    /// # 参数
    /// - conn: 共享连接（事务单元使用）
    /// - request_repo: 工单仓储
    /// - log_repo: 维修日志仓储
    /// - equipment_repo: 设备仓储
    /// - config_manager: 配置管理器
    pub fn new(
        conn: Arc<Mutex<Connection>>,
        request_repo: Arc<MaintenanceRequestRepository>,
        log_repo: Arc<MaintenanceLogRepository>,
        equipment_repo: Arc<EquipmentRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            conn,
            request_repo,
            log_repo,
            equipment_repo,
            config_manager,
            validator: RequestValidator::new(),
            scrap_rule: ScrapPropagationRule::new(),
            event_publisher: OptionalEventPublisher::none(),
        }
    }

    /// 挂接事件发布者（提交后通知）
    pub fn with_event_publisher(mut self, publisher: Arc<dyn RequestEventPublisher>) -> Self {
        self.event_publisher = OptionalEventPublisher::with_publisher(publisher);
        self
    }

    // ==========================================
    // 写入接口
    // ==========================================

    /// 新建工单
    ///
    /// # 返回
    /// - Ok(MaintenanceRequest): 已提交的工单
    /// - Err(ApiError::ValidationFailed): 表单校验未通过（未写入任何数据）
    /// - Err(ApiError::InvalidStateTransition): 严格模式下初始阶段不合法
    pub fn create_request(&self, draft: RequestDraft, actor: &str) -> ApiResult<MaintenanceRequest> {
        let target = self.validator.validate_draft(&draft)?;
        self.stage_policy()?.check_initial(draft.stage)?;

        let request = draft.into_request(target, actor, now());
        let outcome = UnitOfWork::new(self.conn.clone()).run(|tx| {
            MaintenanceRequestRepository::insert_on(tx, &request)?;
            let port = SqliteEquipmentScrapPort::new(tx);
            self.scrap_rule.on_request_saved(
                &port,
                &request.request_id,
                request.stage,
                request.equipment_id(),
            )
        })?;

        info!(
            request_id = %request.request_id,
            stage = %request.stage,
            actor,
            "工单已创建"
        );
        self.publish(&request, None, outcome, actor);
        Ok(request)
    }

    /// 编辑工单（表单整体提交）
    pub fn update_request(
        &self,
        request_id: &str,
        draft: RequestDraft,
        actor: &str,
    ) -> ApiResult<MaintenanceRequest> {
        let existing = self.load(request_id)?;
        self.save_existing(existing, draft, actor)
    }

    /// 看板拖拽：仅修改阶段，其余字段保持不变
    ///
    /// 仍走完整校验，历史脏数据无法借拖拽绕过规则
    pub fn update_stage(
        &self,
        request_id: &str,
        stage: RequestStage,
        actor: &str,
    ) -> ApiResult<MaintenanceRequest> {
        let existing = self.load(request_id)?;
        let mut draft = RequestDraft::from_request(&existing);
        draft.stage = stage;
        self.save_existing(existing, draft, actor)
    }

    fn save_existing(
        &self,
        mut request: MaintenanceRequest,
        draft: RequestDraft,
        actor: &str,
    ) -> ApiResult<MaintenanceRequest> {
        let target = self.validator.validate_draft(&draft)?;
        let previous_stage = request.stage;
        self.stage_policy()?.check(previous_stage, draft.stage)?;

        draft.apply_to(&mut request, target, now());
        let outcome = UnitOfWork::new(self.conn.clone()).run(|tx| {
            MaintenanceRequestRepository::update_on(tx, &request)?;
            let port = SqliteEquipmentScrapPort::new(tx);
            self.scrap_rule.on_request_saved(
                &port,
                &request.request_id,
                request.stage,
                request.equipment_id(),
            )
        })?;

        info!(
            request_id = %request.request_id,
            from = %previous_stage,
            to = %request.stage,
            actor,
            "工单已保存"
        );
        self.publish(&request, Some(previous_stage), outcome, actor);
        Ok(request)
    }

    /// 追加维修日志
    pub fn add_log(&self, request_id: &str, comment: &str, author: &str) -> ApiResult<MaintenanceLog> {
        if comment.trim().is_empty() {
            return Err(ApiError::InvalidInput("日志内容不能为空".to_string()));
        }
        self.load(request_id)?;

        let log = MaintenanceLog::new(request_id, comment, author);
        self.log_repo.append(&log)?;
        debug!(request_id, log_id = %log.log_id, "维修日志已追加");
        Ok(log)
    }

    // ==========================================
    // 查询接口
    // ==========================================

    pub fn get_request(&self, request_id: &str) -> ApiResult<MaintenanceRequest> {
        self.load(request_id)
    }

    /// 查询工单的维修日志（按时间升序）
    pub fn list_logs(&self, request_id: &str) -> ApiResult<Vec<MaintenanceLog>> {
        Ok(self.log_repo.list_by_request(request_id)?)
    }

    /// 设备的全部工单
    pub fn list_for_equipment(&self, equipment_id: &str) -> ApiResult<Vec<MaintenanceRequest>> {
        Ok(self.request_repo.list_by_equipment(equipment_id)?)
    }

    /// 看板视图
    pub fn kanban_board(&self) -> ApiResult<KanbanBoard> {
        let mut columns = Vec::with_capacity(RequestStage::ALL.len());
        for stage in RequestStage::ALL {
            columns.push(KanbanColumn {
                stage,
                requests: self.request_repo.list_by_stage(stage)?,
            });
        }
        Ok(KanbanBoard { columns })
    }

    /// 日历视图：有排期的预防性工单
    pub fn calendar_events(&self) -> ApiResult<Vec<CalendarEvent>> {
        let colors = self
            .config_manager
            .get_calendar_colors()
            .map_err(|e| ApiError::InternalError(format!("读取日历配置失败: {}", e)))?;

        let events = self
            .request_repo
            .list_scheduled_preventive()?
            .into_iter()
            .filter_map(|(request, target_name)| {
                let start = request.scheduled_date?;
                let color = if request.stage == RequestStage::Repaired {
                    colors.repaired.clone()
                } else {
                    colors.pending.clone()
                };
                Some(CalendarEvent {
                    title: format!("{} - {}", target_name, request.subject),
                    start: start.format(CALENDAR_START_FORMAT).to_string(),
                    url: format!("/requests/{}/edit/", request.request_id),
                    color,
                })
            })
            .collect();
        Ok(events)
    }

    /// 从设备页发起工单：预填设备、维修班组与默认优先级
    pub fn new_request_draft(&self, equipment_id: &str) -> ApiResult<RequestDraft> {
        let equipment = self
            .equipment_repo
            .find_by_id(equipment_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Equipment(id={})不存在", equipment_id)))?;

        if equipment.is_scrapped {
            warn!(equipment_id, "为已报废设备发起工单");
        }

        let priority = self
            .config_manager
            .get_default_priority()
            .map_err(|e| ApiError::InternalError(format!("读取默认优先级失败: {}", e)))?;

        Ok(RequestDraft {
            targets: TargetRefs::equipment(&equipment.equipment_id),
            priority,
            team_id: equipment.maintenance_team_id,
            ..Default::default()
        })
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn load(&self, request_id: &str) -> ApiResult<MaintenanceRequest> {
        self.request_repo
            .find_by_id(request_id)?
            .ok_or_else(|| {
                ApiError::NotFound(format!("MaintenanceRequest(id={})不存在", request_id))
            })
    }

    fn stage_policy(&self) -> ApiResult<StageTransitionPolicy> {
        let mode = self
            .config_manager
            .get_stage_transition_mode()
            .map_err(|e| ApiError::InternalError(format!("读取阶段流转配置失败: {}", e)))?;
        Ok(StageTransitionPolicy::new(mode))
    }

    fn publish(
        &self,
        request: &MaintenanceRequest,
        previous_stage: Option<RequestStage>,
        propagation: PropagationOutcome,
        actor: &str,
    ) {
        self.event_publisher.publish(&RequestSavedEvent {
            request_id: request.request_id.clone(),
            created: previous_stage.is_none(),
            previous_stage,
            stage: request.stage,
            equipment_id: request.equipment_id().map(str::to_string),
            propagation,
            actor: actor.to_string(),
        });
    }
}

/// 当前时间（秒级，与库内存储精度一致）
fn now() -> NaiveDateTime {
    let now = chrono::Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
