// ==========================================
// 设备维护管理系统 - 维修工单数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（校验 / 报废传播在 engine 层）
// 说明: *_on 系列函数接收 &Connection，可在外部事务内组合调用
// ==========================================

use crate::domain::request::MaintenanceRequest;
use crate::domain::types::{MaintenanceTarget, Priority, RequestStage, RequestType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{fmt_datetime, get_datetime, get_enum, get_opt_datetime};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const REQUEST_COLUMNS: &str = r#"
    r.request_id, r.subject, r.equipment_id, r.work_center_id,
    r.request_type, r.stage, r.priority, r.scheduled_date, r.duration_hours,
    r.assigned_to, r.team_id, r.created_by, r.instructions,
    r.created_at, r.updated_at
"#;

// ==========================================
// MaintenanceRequestRepository - 维修工单仓储
// ==========================================
pub struct MaintenanceRequestRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaintenanceRequestRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 事务内操作
    // ==========================================

    /// 插入工单
    pub fn insert_on(conn: &Connection, request: &MaintenanceRequest) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO maintenance_request (
                request_id, subject, equipment_id, work_center_id,
                request_type, stage, priority, scheduled_date, duration_hours,
                assigned_to, team_id, created_by, instructions,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                request.request_id,
                request.subject,
                request.target.equipment_id(),
                request.target.work_center_id(),
                request.request_type.to_db_str(),
                request.stage.to_db_str(),
                request.priority.to_db_str(),
                request.scheduled_date.as_ref().map(fmt_datetime),
                request.duration_hours,
                request.assigned_to,
                request.team_id,
                request.created_by,
                request.instructions,
                fmt_datetime(&request.created_at),
                fmt_datetime(&request.updated_at),
            ],
        )?;
        Ok(())
    }

    /// 更新工单（created_by / created_at 不变）
    pub fn update_on(conn: &Connection, request: &MaintenanceRequest) -> RepositoryResult<()> {
        let rows = conn.execute(
            r#"
            UPDATE maintenance_request SET
                subject = ?2, equipment_id = ?3, work_center_id = ?4,
                request_type = ?5, stage = ?6, priority = ?7,
                scheduled_date = ?8, duration_hours = ?9,
                assigned_to = ?10, team_id = ?11, instructions = ?12,
                updated_at = ?13
            WHERE request_id = ?1
            "#,
            params![
                request.request_id,
                request.subject,
                request.target.equipment_id(),
                request.target.work_center_id(),
                request.request_type.to_db_str(),
                request.stage.to_db_str(),
                request.priority.to_db_str(),
                request.scheduled_date.as_ref().map(fmt_datetime),
                request.duration_hours,
                request.assigned_to,
                request.team_id,
                request.instructions,
                fmt_datetime(&request.updated_at),
            ],
        )?;

        if rows == 0 {
            return Err(RepositoryError::not_found("MaintenanceRequest", &request.request_id));
        }
        Ok(())
    }

    /// 按主键查询
    pub fn find_by_id_on(
        conn: &Connection,
        request_id: &str,
    ) -> RepositoryResult<Option<MaintenanceRequest>> {
        let sql = format!(
            "SELECT {} FROM maintenance_request r WHERE r.request_id = ?1",
            REQUEST_COLUMNS
        );
        let request = conn
            .query_row(&sql, params![request_id], map_request_row)
            .optional()?;
        Ok(request)
    }

    // ==========================================
    // 独立操作（自行获取连接）
    // ==========================================

    pub fn insert(&self, request: &MaintenanceRequest) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::insert_on(&conn, request)
    }

    pub fn update(&self, request: &MaintenanceRequest) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::update_on(&conn, request)
    }

    pub fn find_by_id(&self, request_id: &str) -> RepositoryResult<Option<MaintenanceRequest>> {
        let conn = self.get_conn()?;
        Self::find_by_id_on(&conn, request_id)
    }

    /// 按阶段查询（看板列），按优先级降序、创建时间升序
    pub fn list_by_stage(&self, stage: RequestStage) -> RepositoryResult<Vec<MaintenanceRequest>> {
        self.query_list(
            r#"
            WHERE r.stage = ?1
            ORDER BY CASE r.priority
                WHEN 'CRITICAL' THEN 0 WHEN 'HIGH' THEN 1
                WHEN 'MEDIUM' THEN 2 ELSE 3 END,
                r.created_at ASC
            "#,
            params![stage.to_db_str()],
        )
    }

    /// 按工单类型查询
    pub fn list_by_type(&self, request_type: RequestType) -> RepositoryResult<Vec<MaintenanceRequest>> {
        self.query_list(
            "WHERE r.request_type = ?1 ORDER BY r.scheduled_date ASC, r.created_at ASC",
            params![request_type.to_db_str()],
        )
    }

    /// 查询设备的全部工单
    pub fn list_by_equipment(&self, equipment_id: &str) -> RepositoryResult<Vec<MaintenanceRequest>> {
        self.query_list(
            "WHERE r.equipment_id = ?1 ORDER BY r.created_at DESC",
            params![equipment_id],
        )
    }

    /// 未关闭工单数（阶段不在 已修复 / 报废）
    pub fn count_open(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM maintenance_request WHERE stage NOT IN (?1, ?2)",
            params![RequestStage::Repaired.to_db_str(), RequestStage::Scrap.to_db_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 日历数据：有排期的预防性工单 + 维护对象名称
    pub fn list_scheduled_preventive(&self) -> RepositoryResult<Vec<(MaintenanceRequest, String)>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {}, COALESCE(e.name, w.name, '') AS target_name
            FROM maintenance_request r
            LEFT JOIN equipment e ON e.equipment_id = r.equipment_id
            LEFT JOIN work_center w ON w.work_center_id = r.work_center_id
            WHERE r.request_type = ?1 AND r.scheduled_date IS NOT NULL
            ORDER BY r.scheduled_date ASC
            "#,
            REQUEST_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![RequestType::Preventive.to_db_str()], |row| {
                Ok((map_request_row(row)?, row.get::<_, String>(15)?))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn query_list<P: rusqlite::Params>(
        &self,
        clause: &str,
        params: P,
    ) -> RepositoryResult<Vec<MaintenanceRequest>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM maintenance_request r {}",
            REQUEST_COLUMNS, clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let list = stmt
            .query_map(params, map_request_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }
}

fn map_request_row(row: &Row) -> SqliteResult<MaintenanceRequest> {
    let equipment_id: Option<String> = row.get(2)?;
    let work_center_id: Option<String> = row.get(3)?;
    let target = match (equipment_id, work_center_id) {
        (Some(eq), None) => MaintenanceTarget::Equipment(eq),
        (None, Some(wc)) => MaintenanceTarget::WorkCenter(wc),
        _ => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                2,
                Type::Text,
                "维护对象必须为设备或工作中心之一".into(),
            ))
        }
    };

    Ok(MaintenanceRequest {
        request_id: row.get(0)?,
        subject: row.get(1)?,
        target,
        request_type: get_enum(row, 4, RequestType::from_str)?,
        stage: get_enum(row, 5, RequestStage::from_str)?,
        priority: get_enum(row, 6, Priority::from_str)?,
        scheduled_date: get_opt_datetime(row, 7)?,
        duration_hours: row.get(8)?,
        assigned_to: row.get(9)?,
        team_id: row.get(10)?,
        created_by: row.get(11)?,
        instructions: row.get(12)?,
        created_at: get_datetime(row, 13)?,
        updated_at: get_datetime(row, 14)?,
    })
}

#[cfg(test)]
mod tests;
