// ==========================================
// 设备维护管理系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::types::Priority;
use crate::engine::stage_policy::StageTransitionMode;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(config_key = key, value, "配置已更新");
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 此方法会覆盖现有的 global 配置
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.unchecked_transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    // ===== 工作流配置 =====

    /// 获取阶段流转模式（默认 FREE，非法值按默认处理）
    pub fn get_stage_transition_mode(&self) -> Result<StageTransitionMode, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::STAGE_TRANSITION_MODE, "FREE")?;
        Ok(StageTransitionMode::from_str(&value).unwrap_or_else(|| {
            tracing::warn!(
                config_key = config_keys::STAGE_TRANSITION_MODE,
                raw_value = %value,
                "阶段流转模式配置非法，使用 FREE"
            );
            StageTransitionMode::Free
        }))
    }

    /// 获取新建工单默认优先级（默认 MEDIUM）
    pub fn get_default_priority(&self) -> Result<Priority, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::DEFAULT_PRIORITY, "MEDIUM")?;
        Ok(Priority::from_str(&value).unwrap_or_else(|| {
            tracing::warn!(
                config_key = config_keys::DEFAULT_PRIORITY,
                raw_value = %value,
                "默认优先级配置非法，使用 MEDIUM"
            );
            Priority::Medium
        }))
    }

    // ===== 界面配置 =====

    /// 获取日历颜色
    pub fn get_calendar_colors(&self) -> Result<CalendarColors, Box<dyn Error>> {
        Ok(CalendarColors {
            repaired: self.get_config_or_default(
                config_keys::CALENDAR_COLOR_REPAIRED,
                CalendarColors::DEFAULT_REPAIRED,
            )?,
            pending: self.get_config_or_default(
                config_keys::CALENDAR_COLOR_PENDING,
                CalendarColors::DEFAULT_PENDING,
            )?,
        })
    }

    /// 获取界面语言（默认 zh-CN）
    pub fn get_locale(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::UI_LOCALE, "zh-CN")
    }
}

// ==========================================
// CalendarColors - 日历事件颜色
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarColors {
    pub repaired: String, // 已修复
    pub pending: String,  // 其他阶段
}

impl CalendarColors {
    pub const DEFAULT_REPAIRED: &'static str = "#10b981";
    pub const DEFAULT_PENDING: &'static str = "#f59e0b";
}

impl Default for CalendarColors {
    fn default() -> Self {
        Self {
            repaired: Self::DEFAULT_REPAIRED.to_string(),
            pending: Self::DEFAULT_PENDING.to_string(),
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 工作流
    pub const STAGE_TRANSITION_MODE: &str = "workflow.stage_transition_mode";
    pub const DEFAULT_PRIORITY: &str = "request.default_priority";

    // 日历
    pub const CALENDAR_COLOR_REPAIRED: &str = "calendar.color_repaired";
    pub const CALENDAR_COLOR_PENDING: &str = "calendar.color_pending";

    // 界面
    pub const UI_LOCALE: &str = "ui.locale";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    fn setup() -> ConfigManager {
        ConfigManager::from_connection(Arc::new(Mutex::new(open_in_memory().unwrap()))).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = setup();
        assert_eq!(config.get_stage_transition_mode().unwrap(), StageTransitionMode::Free);
        assert_eq!(config.get_default_priority().unwrap(), Priority::Medium);
        assert_eq!(config.get_calendar_colors().unwrap(), CalendarColors::default());
        assert_eq!(config.get_locale().unwrap(), "zh-CN");
    }

    #[test]
    fn test_set_and_read_typed() {
        let config = setup();
        config.set_config_value(config_keys::STAGE_TRANSITION_MODE, "strict").unwrap();
        config.set_config_value(config_keys::DEFAULT_PRIORITY, "HIGH").unwrap();

        assert_eq!(config.get_stage_transition_mode().unwrap(), StageTransitionMode::Strict);
        assert_eq!(config.get_default_priority().unwrap(), Priority::High);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = setup();
        config.set_config_value(config_keys::STAGE_TRANSITION_MODE, "whatever").unwrap();
        config.set_config_value(config_keys::DEFAULT_PRIORITY, "urgent!!").unwrap();

        assert_eq!(config.get_stage_transition_mode().unwrap(), StageTransitionMode::Free);
        assert_eq!(config.get_default_priority().unwrap(), Priority::Medium);
    }

    #[test]
    fn test_snapshot_restore() {
        let config = setup();
        config.set_config_value(config_keys::CALENDAR_COLOR_REPAIRED, "#00ff00").unwrap();
        let snapshot = config.get_config_snapshot().unwrap();

        config.set_config_value(config_keys::CALENDAR_COLOR_REPAIRED, "#000000").unwrap();
        assert_eq!(config.restore_config_from_snapshot(&snapshot).unwrap(), 1);
        assert_eq!(config.get_calendar_colors().unwrap().repaired, "#00ff00");
    }
}
