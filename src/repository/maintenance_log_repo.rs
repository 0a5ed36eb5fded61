// ==========================================
// 设备维护管理系统 - 维修日志数据仓储
// ==========================================
// 红线: 只追加。本仓储不提供 update / delete，
//       数据库层另有触发器禁止 UPDATE
// ==========================================

use crate::domain::request::MaintenanceLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{fmt_datetime, get_datetime};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct MaintenanceLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaintenanceLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 追加日志
    ///
    /// # 返回
    /// - Ok(log_id)
    /// - Err(ForeignKeyViolation): 工单不存在
    pub fn append(&self, log: &MaintenanceLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO maintenance_log (log_id, request_id, comment, created_by, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                log.log_id,
                log.request_id,
                log.comment,
                log.created_by,
                fmt_datetime(&log.created_at),
            ],
        )?;
        Ok(log.log_id.clone())
    }

    /// 查询工单的全部日志（按时间升序）
    pub fn list_by_request(&self, request_id: &str) -> RepositoryResult<Vec<MaintenanceLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT log_id, request_id, comment, created_by, created_at
            FROM maintenance_log
            WHERE request_id = ?1
            ORDER BY created_at ASC, rowid ASC
            "#,
        )?;
        let logs = stmt
            .query_map(params![request_id], |row| {
                Ok(MaintenanceLog {
                    log_id: row.get(0)?,
                    request_id: row.get(1)?,
                    comment: row.get(2)?,
                    created_by: row.get(3)?,
                    created_at: get_datetime(row, 4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::domain::equipment::Equipment;
    use crate::domain::request::RequestDraft;
    use crate::domain::types::MaintenanceTarget;
    use crate::repository::equipment_repo::EquipmentRepository;
    use crate::repository::request_repo::MaintenanceRequestRepository;

    fn setup() -> (Arc<Mutex<Connection>>, String) {
        let conn = Arc::new(Mutex::new(open_in_memory().unwrap()));
        let eq = Equipment::new("SN-001", "A", "D", "L");
        EquipmentRepository::new(conn.clone()).insert(&eq).unwrap();

        let req = RequestDraft::for_equipment("主轴异响", &eq.equipment_id).into_request(
            MaintenanceTarget::Equipment(eq.equipment_id.clone()),
            "alice",
            chrono::Local::now().naive_local(),
        );
        MaintenanceRequestRepository::new(conn.clone()).insert(&req).unwrap();
        (conn, req.request_id)
    }

    #[test]
    fn test_append_and_list() {
        let (conn, request_id) = setup();
        let repo = MaintenanceLogRepository::new(conn);

        repo.append(&MaintenanceLog::new(&request_id, "拆检", "bob")).unwrap();
        repo.append(&MaintenanceLog::new(&request_id, "更换轴承", "bob")).unwrap();

        let logs = repo.list_by_request(&request_id).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].comment, "拆检");
        assert_eq!(logs[1].comment, "更换轴承");
    }

    #[test]
    fn test_logs_cannot_be_updated() {
        let (conn, request_id) = setup();
        let repo = MaintenanceLogRepository::new(conn.clone());
        let log = MaintenanceLog::new(&request_id, "拆检", "bob");
        repo.append(&log).unwrap();

        let err: RepositoryError = conn
            .lock()
            .unwrap()
            .execute(
                "UPDATE maintenance_log SET comment = 'x' WHERE log_id = ?1",
                params![log.log_id],
            )
            .unwrap_err()
            .into();
        assert!(matches!(err, RepositoryError::BusinessRuleViolation(_)));
    }

    #[test]
    fn test_append_to_unknown_request_fails() {
        let (conn, _) = setup();
        let repo = MaintenanceLogRepository::new(conn);
        let err = repo
            .append(&MaintenanceLog::new("missing", "x", "bob"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKeyViolation(_)));
    }
}
