// ==========================================
// 设备维护管理系统 - 设备数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化
// ==========================================

use crate::domain::equipment::Equipment;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::sql_utils::{fmt_date, fmt_datetime, get_datetime, get_opt_date};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const EQUIPMENT_COLUMNS: &str = r#"
    equipment_id, serial_number, name, category_id, work_center_id,
    department, owner, location, description, maintenance_team_id,
    purchase_date, warranty_expiry, assigned_date, scrap_date,
    health, is_scrapped, created_at
"#;

// ==========================================
// EquipmentRepository - 设备仓储
// ==========================================
/// 设备仓储
/// 职责: 管理 equipment 表的 CRUD 操作
pub struct EquipmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EquipmentRepository {
    /// 从共享连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 新增设备
    ///
    /// # 返回
    /// - Ok(equipment_id)
    /// - Err(UniqueConstraintViolation): 序列号重复
    pub fn insert(&self, equipment: &Equipment) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO equipment (
                equipment_id, serial_number, name, category_id, work_center_id,
                department, owner, location, description, maintenance_team_id,
                purchase_date, warranty_expiry, assigned_date, scrap_date,
                health, is_scrapped, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
            "#,
            params![
                equipment.equipment_id,
                equipment.serial_number,
                equipment.name,
                equipment.category_id,
                equipment.work_center_id,
                equipment.department,
                equipment.owner,
                equipment.location,
                equipment.description,
                equipment.maintenance_team_id,
                equipment.purchase_date.as_ref().map(fmt_date),
                equipment.warranty_expiry.as_ref().map(fmt_date),
                equipment.assigned_date.as_ref().map(fmt_date),
                equipment.scrap_date.as_ref().map(fmt_date),
                equipment.health,
                equipment.is_scrapped,
                fmt_datetime(&equipment.created_at),
            ],
        )?;
        Ok(equipment.equipment_id.clone())
    }

    /// 更新设备（全字段覆盖）
    ///
    /// 说明: 已报废设备不允许改回未报废，由数据库触发器拦截
    pub fn update(&self, equipment: &Equipment) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            r#"
            UPDATE equipment SET
                serial_number = ?2, name = ?3, category_id = ?4, work_center_id = ?5,
                department = ?6, owner = ?7, location = ?8, description = ?9,
                maintenance_team_id = ?10, purchase_date = ?11, warranty_expiry = ?12,
                assigned_date = ?13, scrap_date = ?14, health = ?15, is_scrapped = ?16
            WHERE equipment_id = ?1
            "#,
            params![
                equipment.equipment_id,
                equipment.serial_number,
                equipment.name,
                equipment.category_id,
                equipment.work_center_id,
                equipment.department,
                equipment.owner,
                equipment.location,
                equipment.description,
                equipment.maintenance_team_id,
                equipment.purchase_date.as_ref().map(fmt_date),
                equipment.warranty_expiry.as_ref().map(fmt_date),
                equipment.assigned_date.as_ref().map(fmt_date),
                equipment.scrap_date.as_ref().map(fmt_date),
                equipment.health,
                equipment.is_scrapped,
            ],
        )?;

        if rows == 0 {
            return Err(RepositoryError::not_found("Equipment", &equipment.equipment_id));
        }
        Ok(())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按主键查询
    pub fn find_by_id(&self, equipment_id: &str) -> RepositoryResult<Option<Equipment>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM equipment WHERE equipment_id = ?1", EQUIPMENT_COLUMNS);
        let equipment = conn
            .query_row(&sql, params![equipment_id], map_equipment_row)
            .optional()?;
        Ok(equipment)
    }

    /// 按序列号查询
    pub fn find_by_serial(&self, serial_number: &str) -> RepositoryResult<Option<Equipment>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM equipment WHERE serial_number = ?1", EQUIPMENT_COLUMNS);
        let equipment = conn
            .query_row(&sql, params![serial_number.trim()], map_equipment_row)
            .optional()?;
        Ok(equipment)
    }

    /// 查询全部设备（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Equipment>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM equipment ORDER BY name ASC, serial_number ASC", EQUIPMENT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let list = stmt
            .query_map([], map_equipment_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }

    /// 模糊搜索（名称 / 序列号 / 使用部门，忽略大小写）
    pub fn search(&self, query: &str) -> RepositoryResult<Vec<Equipment>> {
        let conn = self.get_conn()?;
        let pattern = format!("%{}%", query.trim().to_lowercase());
        let sql = format!(
            r#"
            SELECT {} FROM equipment
            WHERE LOWER(name) LIKE ?1
               OR LOWER(serial_number) LIKE ?1
               OR LOWER(department) LIKE ?1
            ORDER BY name ASC, serial_number ASC
            "#,
            EQUIPMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let list = stmt
            .query_map(params![pattern], map_equipment_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }

    /// 设备总数
    pub fn count_all(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM equipment", [], |row| row.get(0))?;
        Ok(count)
    }

    /// 已报废设备数
    pub fn count_scrapped(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM equipment WHERE is_scrapped = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 设备关联的工单数（详情页快捷按钮）
    pub fn count_requests(&self, equipment_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM maintenance_request WHERE equipment_id = ?1",
            params![equipment_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ==========================================
    // 事务内操作（供报废传播端口使用）
    // ==========================================

    /// 读取报废标记
    ///
    /// # 返回
    /// - Ok(Some(flag)): 设备存在
    /// - Ok(None): 设备不存在
    pub fn find_scrapped_flag_on(
        conn: &Connection,
        equipment_id: &str,
    ) -> RepositoryResult<Option<bool>> {
        let flag = conn
            .query_row(
                "SELECT is_scrapped FROM equipment WHERE equipment_id = ?1",
                params![equipment_id],
                |row| row.get::<_, bool>(0),
            )
            .optional()?;
        Ok(flag)
    }

    /// 条件写入报废标记（仅当当前未报废）
    ///
    /// # 返回
    /// - Ok(rows): 实际更新行数（0 表示已报废或不存在）
    pub fn mark_scrapped_on(
        conn: &Connection,
        equipment_id: &str,
        scrap_date: NaiveDate,
    ) -> RepositoryResult<usize> {
        let rows = conn.execute(
            r#"
            UPDATE equipment
            SET is_scrapped = 1, scrap_date = COALESCE(scrap_date, ?2)
            WHERE equipment_id = ?1 AND is_scrapped = 0
            "#,
            params![equipment_id, fmt_date(&scrap_date)],
        )?;
        Ok(rows)
    }
}

fn map_equipment_row(row: &Row) -> SqliteResult<Equipment> {
    Ok(Equipment {
        equipment_id: row.get(0)?,
        serial_number: row.get(1)?,
        name: row.get(2)?,
        category_id: row.get(3)?,
        work_center_id: row.get(4)?,
        department: row.get(5)?,
        owner: row.get(6)?,
        location: row.get(7)?,
        description: row.get(8)?,
        maintenance_team_id: row.get(9)?,
        purchase_date: get_opt_date(row, 10)?,
        warranty_expiry: get_opt_date(row, 11)?,
        assigned_date: get_opt_date(row, 12)?,
        scrap_date: get_opt_date(row, 13)?,
        health: row.get(14)?,
        is_scrapped: row.get(15)?,
        created_at: get_datetime(row, 16)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn setup() -> EquipmentRepository {
        EquipmentRepository::new(Arc::new(Mutex::new(open_in_memory().unwrap())))
    }

    #[test]
    fn test_insert_and_find() {
        let repo = setup();
        let eq = Equipment::new("SN-001", "CNC 车床", "机加工", "A 区");
        repo.insert(&eq).unwrap();

        let found = repo.find_by_id(&eq.equipment_id).unwrap().unwrap();
        assert_eq!(found.serial_number, "SN-001");
        assert_eq!(found.health, 100);
        assert!(!found.is_scrapped);

        let by_serial = repo.find_by_serial("SN-001").unwrap();
        assert!(by_serial.is_some());
        assert!(repo.find_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_serial_rejected() {
        let repo = setup();
        repo.insert(&Equipment::new("SN-001", "A", "D", "L")).unwrap();
        let err = repo
            .insert(&Equipment::new("SN-001", "B", "D", "L"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let repo = setup();
        repo.insert(&Equipment::new("SN-001", "Lathe", "Machining", "L")).unwrap();
        repo.insert(&Equipment::new("SN-002", "Compressor", "Utilities", "L")).unwrap();

        assert_eq!(repo.search("lathe").unwrap().len(), 1);
        assert_eq!(repo.search("sn-00").unwrap().len(), 2);
        assert_eq!(repo.search("UTIL").unwrap().len(), 1);
        assert_eq!(repo.search("forklift").unwrap().len(), 0);
    }

    #[test]
    fn test_scrap_is_terminal_at_db_level() {
        let repo = setup();
        let mut eq = Equipment::new("SN-001", "A", "D", "L");
        repo.insert(&eq).unwrap();

        {
            let conn = repo.get_conn().unwrap();
            let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
            assert_eq!(EquipmentRepository::mark_scrapped_on(&conn, &eq.equipment_id, date).unwrap(), 1);
            // 条件写：已报废时不再写入
            assert_eq!(EquipmentRepository::mark_scrapped_on(&conn, &eq.equipment_id, date).unwrap(), 0);
        }
        assert_eq!(repo.count_scrapped().unwrap(), 1);

        // 试图取消报废 -> 触发器拦截
        eq.is_scrapped = false;
        let err = repo.update(&eq).unwrap_err();
        assert!(matches!(err, RepositoryError::BusinessRuleViolation(_)));
    }

    #[test]
    fn test_update_missing_returns_not_found() {
        let repo = setup();
        let eq = Equipment::new("SN-404", "A", "D", "L");
        assert!(matches!(
            repo.update(&eq).unwrap_err(),
            RepositoryError::NotFound { .. }
        ));
    }
}
