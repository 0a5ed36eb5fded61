// ==========================================
// 设备维护管理系统 - 工作中心数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::equipment::WorkCenter;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

/// 工作中心仓储
/// 职责: 管理 work_center 表
pub struct WorkCenterRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkCenterRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增工作中心（code 唯一）
    pub fn insert(&self, wc: &WorkCenter) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO work_center (
                work_center_id, name, code, cost_per_hour, efficiency_pct, oee_target_pct
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                wc.work_center_id,
                wc.name,
                wc.code,
                wc.cost_per_hour,
                wc.efficiency_pct,
                wc.oee_target_pct,
            ],
        )?;
        Ok(wc.work_center_id.clone())
    }

    pub fn find_by_id(&self, work_center_id: &str) -> RepositoryResult<Option<WorkCenter>> {
        let conn = self.get_conn()?;
        let wc = conn
            .query_row(
                r#"
                SELECT work_center_id, name, code, cost_per_hour, efficiency_pct, oee_target_pct
                FROM work_center WHERE work_center_id = ?1
                "#,
                params![work_center_id],
                map_work_center_row,
            )
            .optional()?;
        Ok(wc)
    }

    pub fn find_by_code(&self, code: &str) -> RepositoryResult<Option<WorkCenter>> {
        let conn = self.get_conn()?;
        let wc = conn
            .query_row(
                r#"
                SELECT work_center_id, name, code, cost_per_hour, efficiency_pct, oee_target_pct
                FROM work_center WHERE code = ?1
                "#,
                params![code.trim()],
                map_work_center_row,
            )
            .optional()?;
        Ok(wc)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<WorkCenter>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT work_center_id, name, code, cost_per_hour, efficiency_pct, oee_target_pct
            FROM work_center ORDER BY code ASC
            "#,
        )?;
        let list = stmt
            .query_map([], map_work_center_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }
}

fn map_work_center_row(row: &Row) -> SqliteResult<WorkCenter> {
    Ok(WorkCenter {
        work_center_id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        cost_per_hour: row.get(3)?,
        efficiency_pct: row.get(4)?,
        oee_target_pct: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn test_insert_find_and_unique_code() {
        let repo = WorkCenterRepository::new(Arc::new(Mutex::new(open_in_memory().unwrap())));
        let wc = WorkCenter::new("WC-01", "装配线");
        repo.insert(&wc).unwrap();

        let found = repo.find_by_code("WC-01").unwrap().unwrap();
        assert_eq!(found.work_center_id, wc.work_center_id);
        assert!(repo.find_by_id(&wc.work_center_id).unwrap().is_some());

        let dup = WorkCenter::new("WC-01", "另一条线");
        assert!(matches!(
            repo.insert(&dup).unwrap_err(),
            RepositoryError::UniqueConstraintViolation(_)
        ));
        assert_eq!(repo.list_all().unwrap().len(), 1);
    }
}
