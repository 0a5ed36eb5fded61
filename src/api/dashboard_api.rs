// ==========================================
// 设备维护管理系统 - 驾驶舱 API
// ==========================================
// 职责: 首页统计卡片（设备总数 / 未关闭工单 / 已报废设备）
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::repository::equipment_repo::EquipmentRepository;
use crate::repository::request_repo::MaintenanceRequestRepository;

/// 驾驶舱统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_equipment: i64,
    /// 阶段不在 已修复 / 报废 的工单
    pub open_requests: i64,
    pub scrapped_equipment: i64,
}

/// 驾驶舱API
pub struct DashboardApi {
    equipment_repo: Arc<EquipmentRepository>,
    request_repo: Arc<MaintenanceRequestRepository>,
}

impl DashboardApi {
    pub fn new(
        equipment_repo: Arc<EquipmentRepository>,
        request_repo: Arc<MaintenanceRequestRepository>,
    ) -> Self {
        Self {
            equipment_repo,
            request_repo,
        }
    }

    /// 获取驾驶舱统计
    pub fn get_summary(&self) -> ApiResult<DashboardSummary> {
        Ok(DashboardSummary {
            total_equipment: self.equipment_repo.count_all()?,
            open_requests: self.request_repo.count_open()?,
            scrapped_equipment: self.equipment_repo.count_scrapped()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::domain::equipment::Equipment;
    use crate::domain::request::RequestDraft;
    use crate::domain::types::{MaintenanceTarget, RequestStage};
    use std::sync::Mutex;

    #[test]
    fn test_summary_counts() {
        let conn = Arc::new(Mutex::new(open_in_memory().unwrap()));
        let equipment_repo = Arc::new(EquipmentRepository::new(conn.clone()));
        let request_repo = Arc::new(MaintenanceRequestRepository::new(conn));
        let api = DashboardApi::new(equipment_repo.clone(), request_repo.clone());

        let a = Equipment::new("SN-1", "车床", "机加工", "A区");
        let mut b = Equipment::new("SN-2", "铣床", "机加工", "A区");
        b.is_scrapped = true;
        equipment_repo.insert(&a).unwrap();
        equipment_repo.insert(&b).unwrap();

        let now = chrono::Local::now().naive_local();
        let open = RequestDraft::for_equipment("异响", &a.equipment_id).into_request(
            MaintenanceTarget::Equipment(a.equipment_id.clone()),
            "alice",
            now,
        );
        let mut closed = RequestDraft::for_equipment("报废", &b.equipment_id);
        closed.stage = RequestStage::Scrap;
        let closed =
            closed.into_request(MaintenanceTarget::Equipment(b.equipment_id.clone()), "alice", now);
        request_repo.insert(&open).unwrap();
        request_repo.insert(&closed).unwrap();

        assert_eq!(
            api.get_summary().unwrap(),
            DashboardSummary {
                total_equipment: 2,
                open_requests: 1,
                scrapped_equipment: 1,
            }
        );
    }
}
