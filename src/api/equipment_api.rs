// ==========================================
// 设备维护管理系统 - 资产 API
// ==========================================
// 职责: 设备 / 工作中心 / 维修班组 / 设备类别 的维护与查询
// 红线: 报废设备不可恢复（数据库触发器兜底）
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::equipment::{Equipment, EquipmentCategory, MaintenanceTeam, WorkCenter};
use crate::engine::request_validator::RequestValidator;
use crate::repository::equipment_repo::EquipmentRepository;
use crate::repository::team_repo::{EquipmentCategoryRepository, MaintenanceTeamRepository};
use crate::repository::work_center_repo::WorkCenterRepository;

// ==========================================
// 视图模型
// ==========================================

/// 设备详情（含工单数，对应设备页 "维修" 按钮角标）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentDetail {
    pub equipment: Equipment,
    pub request_count: i64,
}

/// 工单表单自动回填信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentAutofill {
    pub equipment_id: String,
    pub category_name: Option<String>,
    pub department: String,
    pub maintenance_team_id: Option<String>,
    pub maintenance_team_name: Option<String>,
}

// ==========================================
// EquipmentApi - 资产 API
// ==========================================
pub struct EquipmentApi {
    equipment_repo: Arc<EquipmentRepository>,
    work_center_repo: Arc<WorkCenterRepository>,
    team_repo: Arc<MaintenanceTeamRepository>,
    category_repo: Arc<EquipmentCategoryRepository>,
    validator: RequestValidator,
}

impl EquipmentApi {
    pub fn new(
        equipment_repo: Arc<EquipmentRepository>,
        work_center_repo: Arc<WorkCenterRepository>,
        team_repo: Arc<MaintenanceTeamRepository>,
        category_repo: Arc<EquipmentCategoryRepository>,
    ) -> Self {
        Self {
            equipment_repo,
            work_center_repo,
            team_repo,
            category_repo,
            validator: RequestValidator::new(),
        }
    }

    // ==========================================
    // 设备
    // ==========================================

    /// 新建设备
    ///
    /// # 返回
    /// - Err(ApiError::ValidationFailed): 序列号 / 名称为空，或健康度越界
    /// - Err(ApiError::BusinessRuleViolation): 序列号重复
    pub fn create_equipment(&self, equipment: Equipment) -> ApiResult<Equipment> {
        self.validator.validate_equipment(&equipment)?;

        if self
            .equipment_repo
            .find_by_serial(&equipment.serial_number)?
            .is_some()
        {
            return Err(ApiError::BusinessRuleViolation(format!(
                "序列号已存在: {}",
                equipment.serial_number
            )));
        }

        self.equipment_repo.insert(&equipment)?;
        info!(
            equipment_id = %equipment.equipment_id,
            serial_number = %equipment.serial_number,
            "设备已创建"
        );
        Ok(equipment)
    }

    /// 更新设备主数据
    ///
    /// 取消报废会被数据库拒绝，返回 BusinessRuleViolation
    pub fn update_equipment(&self, equipment: Equipment) -> ApiResult<Equipment> {
        self.validator.validate_equipment(&equipment)?;
        self.equipment_repo.update(&equipment)?;
        debug!(equipment_id = %equipment.equipment_id, "设备已更新");
        Ok(equipment)
    }

    pub fn list_equipment(&self) -> ApiResult<Vec<Equipment>> {
        Ok(self.equipment_repo.list_all()?)
    }

    /// 按名称 / 序列号 / 部门模糊搜索（空关键字返回全部）
    pub fn search_equipment(&self, query: &str) -> ApiResult<Vec<Equipment>> {
        let query = query.trim();
        if query.is_empty() {
            return self.list_equipment();
        }
        Ok(self.equipment_repo.search(query)?)
    }

    /// 设备详情
    pub fn get_equipment_detail(&self, equipment_id: &str) -> ApiResult<EquipmentDetail> {
        let equipment = self.load(equipment_id)?;
        let request_count = self.equipment_repo.count_requests(equipment_id)?;
        Ok(EquipmentDetail {
            equipment,
            request_count,
        })
    }

    /// 工单表单选择设备后的自动回填
    pub fn equipment_details(&self, equipment_id: &str) -> ApiResult<EquipmentAutofill> {
        let equipment = self.load(equipment_id)?;

        let category_name = match &equipment.category_id {
            Some(id) => self.category_repo.find_by_id(id)?.map(|c| c.name),
            None => None,
        };
        let maintenance_team_name = match &equipment.maintenance_team_id {
            Some(id) => self.team_repo.find_by_id(id)?.map(|t| t.name),
            None => None,
        };

        Ok(EquipmentAutofill {
            equipment_id: equipment.equipment_id,
            category_name,
            department: equipment.department,
            maintenance_team_id: equipment.maintenance_team_id,
            maintenance_team_name,
        })
    }

    // ==========================================
    // 工作中心
    // ==========================================

    pub fn create_work_center(&self, work_center: WorkCenter) -> ApiResult<WorkCenter> {
        if work_center.code.trim().is_empty() {
            return Err(ApiError::InvalidInput("工作中心编码不能为空".to_string()));
        }
        if work_center.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("工作中心名称不能为空".to_string()));
        }
        if self.work_center_repo.find_by_code(&work_center.code)?.is_some() {
            return Err(ApiError::BusinessRuleViolation(format!(
                "工作中心编码已存在: {}",
                work_center.code
            )));
        }

        self.work_center_repo.insert(&work_center)?;
        info!(code = %work_center.code, "工作中心已创建");
        Ok(work_center)
    }

    pub fn list_work_centers(&self) -> ApiResult<Vec<WorkCenter>> {
        Ok(self.work_center_repo.list_all()?)
    }

    // ==========================================
    // 维修班组 / 设备类别
    // ==========================================

    pub fn create_team(&self, team: MaintenanceTeam) -> ApiResult<MaintenanceTeam> {
        if team.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("班组名称不能为空".to_string()));
        }
        self.team_repo.insert(&team)?;
        Ok(team)
    }

    pub fn add_team_member(&self, team_id: &str, user_name: &str) -> ApiResult<()> {
        if user_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("成员不能为空".to_string()));
        }
        if self.team_repo.find_by_id(team_id)?.is_none() {
            return Err(ApiError::NotFound(format!("MaintenanceTeam(id={})不存在", team_id)));
        }
        self.team_repo.add_member(team_id, user_name.trim())?;
        Ok(())
    }

    pub fn list_teams(&self) -> ApiResult<Vec<MaintenanceTeam>> {
        Ok(self.team_repo.list_all()?)
    }

    pub fn create_category(&self, category: EquipmentCategory) -> ApiResult<EquipmentCategory> {
        if category.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("类别名称不能为空".to_string()));
        }
        self.category_repo.insert(&category)?;
        Ok(category)
    }

    pub fn list_categories(&self) -> ApiResult<Vec<EquipmentCategory>> {
        Ok(self.category_repo.list_all()?)
    }

    fn load(&self, equipment_id: &str) -> ApiResult<Equipment> {
        self.equipment_repo
            .find_by_id(equipment_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Equipment(id={})不存在", equipment_id)))
    }
}
