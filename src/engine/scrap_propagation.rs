// ==========================================
// 设备维护管理系统 - 报废传播规则
// ==========================================
// 职责: 工单保存后，若阶段为 "报废" 且维护对象为设备，则将设备置为已报废
// 红线:
// - 幂等: 已报废设备不再写入
// - 单向: 工单移出报废阶段不会取消设备报废
// - 工作中心工单 / 设备不存在: 空操作，不影响工单保存
// 调用: 由工单保存路径在同一事务内显式调用（不使用全局事件总线）
// ==========================================

use crate::domain::types::RequestStage;
use crate::repository::equipment_repo::EquipmentRepository;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

// ==========================================
// EquipmentScrapPort - 设备报废持久化端口
// ==========================================
/// 报废传播所需的最小持久化接口
///
/// Engine 层定义，SQLite 实现见 `SqliteEquipmentScrapPort`；
/// 单元测试可使用内存实现
pub trait EquipmentScrapPort {
    /// 读取设备报废标记（设备不存在返回 None）
    fn scrapped_flag(&self, equipment_id: &str) -> RepositoryResult<Option<bool>>;

    /// 将设备置为已报废
    fn mark_scrapped(&self, equipment_id: &str, scrap_date: NaiveDate) -> RepositoryResult<()>;
}

/// 基于 SQLite 连接（或事务）的端口实现
pub struct SqliteEquipmentScrapPort<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteEquipmentScrapPort<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl EquipmentScrapPort for SqliteEquipmentScrapPort<'_> {
    fn scrapped_flag(&self, equipment_id: &str) -> RepositoryResult<Option<bool>> {
        EquipmentRepository::find_scrapped_flag_on(self.conn, equipment_id)
            .map_err(|e| propagation_failure(equipment_id, e))
    }

    fn mark_scrapped(&self, equipment_id: &str, scrap_date: NaiveDate) -> RepositoryResult<()> {
        EquipmentRepository::mark_scrapped_on(self.conn, equipment_id, scrap_date)
            .map_err(|e| propagation_failure(equipment_id, e))?;
        Ok(())
    }
}

/// 传播失败统一按事务失败上抛（与表单 / 业务规则错误区分）
fn propagation_failure(equipment_id: &str, err: RepositoryError) -> RepositoryError {
    RepositoryError::DatabaseTransactionError(format!(
        "设备报废传播失败 (equipment_id={}): {}",
        equipment_id, err
    ))
}

// ==========================================
// PropagationOutcome - 传播结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropagationOutcome {
    /// 本次将设备置为已报废
    Scrapped,
    /// 设备此前已报废，未写入
    AlreadyScrapped,
    /// 阶段非报废或工单不指向设备
    NotApplicable,
    /// 引用的设备不存在
    EquipmentMissing,
}

impl PropagationOutcome {
    pub fn wrote_equipment(&self) -> bool {
        matches!(self, PropagationOutcome::Scrapped)
    }
}

// ==========================================
// ScrapPropagationRule - 报废传播规则
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrapPropagationRule;

impl ScrapPropagationRule {
    pub fn new() -> Self {
        Self
    }

    /// 工单保存后调用（报废日期取当天）
    pub fn on_request_saved(
        &self,
        port: &dyn EquipmentScrapPort,
        request_id: &str,
        stage: RequestStage,
        equipment_ref: Option<&str>,
    ) -> RepositoryResult<PropagationOutcome> {
        let today = chrono::Local::now().date_naive();
        self.on_request_saved_at(port, request_id, stage, equipment_ref, today)
    }

    /// 工单保存后调用
    ///
    /// # 参数
    /// - port: 设备持久化端口（通常绑定到工单保存所在事务）
    /// - request_id: 工单ID（仅用于日志）
    /// - stage: 保存后的阶段
    /// - equipment_ref: 工单关联设备
    /// - scrap_date: 写入的报废日期
    ///
    /// # 返回
    /// - Ok(outcome): 传播结果
    /// - Err: 持久化失败（调用方必须回滚工单保存并上抛）
    pub fn on_request_saved_at(
        &self,
        port: &dyn EquipmentScrapPort,
        request_id: &str,
        stage: RequestStage,
        equipment_ref: Option<&str>,
        scrap_date: NaiveDate,
    ) -> RepositoryResult<PropagationOutcome> {
        if stage != RequestStage::Scrap {
            return Ok(PropagationOutcome::NotApplicable);
        }

        // TODO: 工作中心是否可报废待产品确认，目前工作中心工单不传播
        let equipment_id = match equipment_ref {
            Some(id) => id,
            None => {
                tracing::debug!(request_id, "报废工单未关联设备，跳过传播");
                return Ok(PropagationOutcome::NotApplicable);
            }
        };

        match port.scrapped_flag(equipment_id)? {
            None => {
                tracing::warn!(request_id, equipment_id, "报废工单引用的设备不存在，跳过传播");
                Ok(PropagationOutcome::EquipmentMissing)
            }
            Some(true) => {
                tracing::debug!(request_id, equipment_id, "设备已报废，无需重复写入");
                Ok(PropagationOutcome::AlreadyScrapped)
            }
            Some(false) => {
                port.mark_scrapped(equipment_id, scrap_date)?;
                tracing::info!(request_id, equipment_id, %scrap_date, "工单进入报废阶段，设备已标记报废");
                Ok(PropagationOutcome::Scrapped)
            }
        }
    }
}
