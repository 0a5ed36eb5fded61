// ==========================================
// 设备维护管理系统 - 维修班组 / 设备类别 数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::equipment::{EquipmentCategory, MaintenanceTeam};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// MaintenanceTeamRepository - 维修班组仓储
// ==========================================
pub struct MaintenanceTeamRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaintenanceTeamRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增班组（含成员，事务化）
    pub fn insert(&self, team: &MaintenanceTeam) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO maintenance_team (team_id, name, description) VALUES (?1, ?2, ?3)",
            params![team.team_id, team.name, team.description],
        )?;
        for member in &team.members {
            tx.execute(
                "INSERT OR IGNORE INTO maintenance_team_member (team_id, user_name) VALUES (?1, ?2)",
                params![team.team_id, member],
            )?;
        }
        tx.commit()?;
        Ok(team.team_id.clone())
    }

    /// 添加成员（重复添加无副作用）
    pub fn add_member(&self, team_id: &str, user_name: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO maintenance_team_member (team_id, user_name) VALUES (?1, ?2)",
            params![team_id, user_name],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, team_id: &str) -> RepositoryResult<Option<MaintenanceTeam>> {
        let conn = self.get_conn()?;
        let team = conn
            .query_row(
                "SELECT team_id, name, description FROM maintenance_team WHERE team_id = ?1",
                params![team_id],
                |row| {
                    Ok(MaintenanceTeam {
                        team_id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                        members: Vec::new(),
                    })
                },
            )
            .optional()?;

        match team {
            Some(mut team) => {
                team.members = Self::members_on(&conn, &team.team_id)?;
                Ok(Some(team))
            }
            None => Ok(None),
        }
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<MaintenanceTeam>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT team_id, name, description FROM maintenance_team ORDER BY name")?;
        let mut teams = stmt
            .query_map([], |row| {
                Ok(MaintenanceTeam {
                    team_id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    members: Vec::new(),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        for team in teams.iter_mut() {
            team.members = Self::members_on(&conn, &team.team_id)?;
        }
        Ok(teams)
    }

    pub fn list_members(&self, team_id: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        Self::members_on(&conn, team_id)
    }

    fn members_on(conn: &Connection, team_id: &str) -> RepositoryResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT user_name FROM maintenance_team_member WHERE team_id = ?1 ORDER BY user_name",
        )?;
        let members = stmt
            .query_map(params![team_id], |row| row.get::<_, String>(0))?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(members)
    }
}

// ==========================================
// EquipmentCategoryRepository - 设备类别仓储
// ==========================================
pub struct EquipmentCategoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EquipmentCategoryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, category: &EquipmentCategory) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO equipment_category (category_id, name, responsible_user) VALUES (?1, ?2, ?3)",
            params![category.category_id, category.name, category.responsible_user],
        )?;
        Ok(category.category_id.clone())
    }

    pub fn find_by_id(&self, category_id: &str) -> RepositoryResult<Option<EquipmentCategory>> {
        let conn = self.get_conn()?;
        let category = conn
            .query_row(
                "SELECT category_id, name, responsible_user FROM equipment_category WHERE category_id = ?1",
                params![category_id],
                |row| {
                    Ok(EquipmentCategory {
                        category_id: row.get(0)?,
                        name: row.get(1)?,
                        responsible_user: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(category)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<EquipmentCategory>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT category_id, name, responsible_user FROM equipment_category ORDER BY name",
        )?;
        let list = stmt
            .query_map([], |row| {
                Ok(EquipmentCategory {
                    category_id: row.get(0)?,
                    name: row.get(1)?,
                    responsible_user: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn test_team_members_roundtrip() {
        let conn = Arc::new(Mutex::new(open_in_memory().unwrap()));
        let repo = MaintenanceTeamRepository::new(conn);

        let mut team = MaintenanceTeam::new("机修一组");
        team.members = vec!["bob".to_string(), "alice".to_string()];
        repo.insert(&team).unwrap();

        repo.add_member(&team.team_id, "carol").unwrap();
        repo.add_member(&team.team_id, "alice").unwrap();

        let found = repo.find_by_id(&team.team_id).unwrap().unwrap();
        assert_eq!(found.members, vec!["alice", "bob", "carol"]);
        assert_eq!(repo.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_category_insert_and_list() {
        let conn = Arc::new(Mutex::new(open_in_memory().unwrap()));
        let repo = EquipmentCategoryRepository::new(conn);

        let cat = EquipmentCategory::new("数控机床");
        repo.insert(&cat).unwrap();
        assert_eq!(
            repo.find_by_id(&cat.category_id).unwrap().unwrap().name,
            "数控机床"
        );
        assert_eq!(repo.list_all().unwrap().len(), 1);
    }
}
