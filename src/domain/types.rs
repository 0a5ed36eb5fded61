// ==========================================
// 设备维护管理系统 - 领域类型定义
// ==========================================
// 职责: 工单类型 / 工单阶段 / 优先级 / 维护对象
// 存储: 数据库统一使用 SCREAMING_SNAKE_CASE 字符串
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工单类型 (Request Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestType {
    Corrective, // 故障维修
    Preventive, // 预防性保养（必须排期）
}

impl Default for RequestType {
    fn default() -> Self {
        RequestType::Corrective
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl RequestType {
    /// 从字符串解析工单类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CORRECTIVE" => Some(RequestType::Corrective),
            "PREVENTIVE" => Some(RequestType::Preventive),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RequestType::Corrective => "CORRECTIVE",
            RequestType::Preventive => "PREVENTIVE",
        }
    }
}

// ==========================================
// 工单阶段 (Request Stage)
// ==========================================
// 顺序: New < InProgress < Repaired / Scrap
// Repaired / Scrap 为事实上的终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStage {
    New,        // 新建
    InProgress, // 处理中
    Repaired,   // 已修复
    Scrap,      // 报废
}

impl Default for RequestStage {
    fn default() -> Self {
        RequestStage::New
    }
}

impl fmt::Display for RequestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl RequestStage {
    /// 看板列顺序
    pub const ALL: [RequestStage; 4] = [
        RequestStage::New,
        RequestStage::InProgress,
        RequestStage::Repaired,
        RequestStage::Scrap,
    ];

    /// 从字符串解析阶段（兼容 "In Progress" 这类界面写法）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace(' ', "_").as_str() {
            "NEW" => Some(RequestStage::New),
            "IN_PROGRESS" | "INPROGRESS" => Some(RequestStage::InProgress),
            "REPAIRED" => Some(RequestStage::Repaired),
            "SCRAP" => Some(RequestStage::Scrap),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RequestStage::New => "NEW",
            RequestStage::InProgress => "IN_PROGRESS",
            RequestStage::Repaired => "REPAIRED",
            RequestStage::Scrap => "SCRAP",
        }
    }

    /// 是否处于未关闭状态（驾驶舱 "进行中工单" 口径）
    pub fn is_open(&self) -> bool {
        !matches!(self, RequestStage::Repaired | RequestStage::Scrap)
    }
}

// ==========================================
// 优先级 (Priority)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl Priority {
    /// 从字符串解析优先级
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Some(Priority::Low),
            "MEDIUM" => Some(Priority::Medium),
            "HIGH" => Some(Priority::High),
            "CRITICAL" => Some(Priority::Critical),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }
}

// ==========================================
// 维护对象引用 (Target Refs)
// ==========================================
// 表单原始输入：两个可选引用，由校验器保证恰好一个
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRefs {
    pub equipment_id: Option<String>,   // 设备ID
    pub work_center_id: Option<String>, // 工作中心ID
}

impl TargetRefs {
    pub fn equipment(equipment_id: &str) -> Self {
        Self {
            equipment_id: Some(equipment_id.to_string()),
            work_center_id: None,
        }
    }

    pub fn work_center(work_center_id: &str) -> Self {
        Self {
            equipment_id: None,
            work_center_id: Some(work_center_id.to_string()),
        }
    }

    /// 收敛为维护对象；空串视为未填写
    ///
    /// # 返回
    /// - Some(target): 恰好一个引用
    /// - None: 两者皆无或两者皆有
    pub fn resolve(&self) -> Option<MaintenanceTarget> {
        match (non_blank(&self.equipment_id), non_blank(&self.work_center_id)) {
            (Some(eq), None) => Some(MaintenanceTarget::Equipment(eq.to_string())),
            (None, Some(wc)) => Some(MaintenanceTarget::WorkCenter(wc.to_string())),
            _ => None,
        }
    }

    pub fn has_equipment(&self) -> bool {
        non_blank(&self.equipment_id).is_some()
    }

    pub fn has_work_center(&self) -> bool {
        non_blank(&self.work_center_id).is_some()
    }
}

fn non_blank(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// ==========================================
// 维护对象 (Maintenance Target)
// ==========================================
// 已持久化工单的维护对象：设备或工作中心，二选一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaintenanceTarget {
    Equipment(String),
    WorkCenter(String),
}

impl MaintenanceTarget {
    pub fn equipment_id(&self) -> Option<&str> {
        match self {
            MaintenanceTarget::Equipment(id) => Some(id),
            MaintenanceTarget::WorkCenter(_) => None,
        }
    }

    pub fn work_center_id(&self) -> Option<&str> {
        match self {
            MaintenanceTarget::Equipment(_) => None,
            MaintenanceTarget::WorkCenter(id) => Some(id),
        }
    }

    /// 展开为 (equipment_id, work_center_id) 两列
    pub fn to_refs(&self) -> TargetRefs {
        TargetRefs {
            equipment_id: self.equipment_id().map(str::to_string),
            work_center_id: self.work_center_id().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_parse_accepts_ui_spelling() {
        assert_eq!(RequestStage::from_str("In Progress"), Some(RequestStage::InProgress));
        assert_eq!(RequestStage::from_str("scrap"), Some(RequestStage::Scrap));
        assert_eq!(RequestStage::from_str("Done"), None);
    }

    #[test]
    fn test_stage_is_open() {
        assert!(RequestStage::New.is_open());
        assert!(RequestStage::InProgress.is_open());
        assert!(!RequestStage::Repaired.is_open());
        assert!(!RequestStage::Scrap.is_open());
    }

    #[test]
    fn test_target_refs_resolve() {
        assert_eq!(
            TargetRefs::equipment("EQ1").resolve(),
            Some(MaintenanceTarget::Equipment("EQ1".to_string()))
        );
        assert_eq!(
            TargetRefs::work_center("WC1").resolve(),
            Some(MaintenanceTarget::WorkCenter("WC1".to_string()))
        );
        assert_eq!(TargetRefs::default().resolve(), None);

        let both = TargetRefs {
            equipment_id: Some("EQ1".to_string()),
            work_center_id: Some("WC1".to_string()),
        };
        assert_eq!(both.resolve(), None);

        // 空白字符串视为未填
        let blank = TargetRefs {
            equipment_id: Some("  ".to_string()),
            work_center_id: Some("WC1".to_string()),
        };
        assert_eq!(
            blank.resolve(),
            Some(MaintenanceTarget::WorkCenter("WC1".to_string()))
        );
    }

    #[test]
    fn test_db_str_stable() {
        assert_eq!(RequestType::Preventive.to_db_str(), "PREVENTIVE");
        assert_eq!(Priority::Critical.to_db_str(), "CRITICAL");
        assert_eq!(RequestStage::InProgress.to_string(), "IN_PROGRESS");
    }
}
