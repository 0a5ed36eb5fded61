// ==========================================
// 设备维护管理系统 - 资产领域模型
// ==========================================
// 职责: 设备 / 设备类别 / 工作中心 / 维修班组
// 红线: 设备报废为单向状态，不存在 "取消报废"
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 设备健康度上限
pub const HEALTH_MAX: i32 = 100;

// ==========================================
// Equipment - 设备
// ==========================================
// 对齐: equipment 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Equipment {
    // ===== 主键 =====
    pub equipment_id: String,  // 设备ID
    pub serial_number: String, // 序列号（唯一）

    // ===== 基本信息 =====
    pub name: String,
    pub category_id: Option<String>,       // 设备类别
    pub work_center_id: Option<String>,    // 所属工作中心
    pub department: String,                // 使用部门
    pub owner: Option<String>,             // 责任人
    pub location: String,
    pub description: String,
    pub maintenance_team_id: Option<String>, // 维修班组

    // ===== 日期 =====
    pub purchase_date: Option<NaiveDate>,
    pub warranty_expiry: Option<NaiveDate>,
    pub assigned_date: Option<NaiveDate>,
    pub scrap_date: Option<NaiveDate>,

    // ===== 状态 =====
    pub health: i32,        // 健康度 0-100
    pub is_scrapped: bool,  // 报废标记（单向）

    pub created_at: NaiveDateTime,
}

impl Equipment {
    /// 创建新设备（健康度 100，未报废）
    pub fn new(serial_number: &str, name: &str, department: &str, location: &str) -> Self {
        Self {
            equipment_id: uuid::Uuid::new_v4().to_string(),
            serial_number: serial_number.trim().to_string(),
            name: name.trim().to_string(),
            category_id: None,
            work_center_id: None,
            department: department.trim().to_string(),
            owner: None,
            location: location.trim().to_string(),
            description: String::new(),
            maintenance_team_id: None,
            purchase_date: None,
            warranty_expiry: None,
            assigned_date: None,
            scrap_date: None,
            health: HEALTH_MAX,
            is_scrapped: false,
            created_at: chrono::Local::now().naive_local(),
        }
    }

    /// 健康度是否在合法区间
    pub fn health_in_range(&self) -> bool {
        (0..=HEALTH_MAX).contains(&self.health)
    }

    /// 名称 + 序列号，用于列表与日历标题
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.serial_number)
    }
}

// ==========================================
// EquipmentCategory - 设备类别
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentCategory {
    pub category_id: String,
    pub name: String,
    pub responsible_user: Option<String>, // 类别负责人
}

impl EquipmentCategory {
    pub fn new(name: &str) -> Self {
        Self {
            category_id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            responsible_user: None,
        }
    }
}

// ==========================================
// WorkCenter - 工作中心
// ==========================================
// 对齐: work_center 表（code 唯一）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkCenter {
    pub work_center_id: String,
    pub name: String,
    pub code: String,
    pub cost_per_hour: f64,
    pub efficiency_pct: f64, // 效率（%）
    pub oee_target_pct: f64, // OEE 目标（%）
}

impl WorkCenter {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            work_center_id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            code: code.trim().to_string(),
            cost_per_hour: 0.0,
            efficiency_pct: 100.0,
            oee_target_pct: 85.0,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.code)
    }
}

// ==========================================
// MaintenanceTeam - 维修班组
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceTeam {
    pub team_id: String,
    pub name: String,
    pub description: String,
    pub members: Vec<String>, // 成员用户名
}

impl MaintenanceTeam {
    pub fn new(name: &str) -> Self {
        Self {
            team_id: uuid::Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            description: String::new(),
            members: Vec::new(),
        }
    }
}
