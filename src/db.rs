// ==========================================
// 设备维护管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 统一建库脚本，保证测试库与正式库结构一致
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 时间戳存储格式
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 日期存储格式
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 打开内存库并建表（单元测试 / 演示用）
pub fn open_in_memory() -> rusqlite::Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库结构（幂等）
///
/// 说明：
/// - maintenance_request 通过 CHECK 约束保证设备 / 工作中心二选一
/// - maintenance_log 通过触发器禁止 UPDATE（只追加）
/// - equipment.is_scrapped 通过触发器禁止 1 -> 0（报废单向）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL DEFAULT 'global',
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS maintenance_team (
    team_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS maintenance_team_member (
    team_id TEXT NOT NULL REFERENCES maintenance_team(team_id) ON DELETE CASCADE,
    user_name TEXT NOT NULL,
    PRIMARY KEY (team_id, user_name)
);

CREATE TABLE IF NOT EXISTS equipment_category (
    category_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    responsible_user TEXT
);

CREATE TABLE IF NOT EXISTS work_center (
    work_center_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    code TEXT NOT NULL UNIQUE,
    cost_per_hour REAL NOT NULL DEFAULT 0,
    efficiency_pct REAL NOT NULL DEFAULT 100,
    oee_target_pct REAL NOT NULL DEFAULT 85
);

CREATE TABLE IF NOT EXISTS equipment (
    equipment_id TEXT PRIMARY KEY,
    serial_number TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    category_id TEXT REFERENCES equipment_category(category_id) ON DELETE SET NULL,
    work_center_id TEXT REFERENCES work_center(work_center_id) ON DELETE SET NULL,
    department TEXT NOT NULL DEFAULT '',
    owner TEXT,
    location TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    maintenance_team_id TEXT REFERENCES maintenance_team(team_id) ON DELETE SET NULL,
    purchase_date TEXT,
    warranty_expiry TEXT,
    assigned_date TEXT,
    scrap_date TEXT,
    health INTEGER NOT NULL DEFAULT 100 CHECK (health BETWEEN 0 AND 100),
    is_scrapped INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS equipment_scrap_is_terminal
BEFORE UPDATE OF is_scrapped ON equipment
WHEN OLD.is_scrapped = 1 AND NEW.is_scrapped = 0
BEGIN
    SELECT RAISE(ABORT, 'equipment scrap is terminal');
END;

CREATE TABLE IF NOT EXISTS maintenance_request (
    request_id TEXT PRIMARY KEY,
    subject TEXT NOT NULL,
    equipment_id TEXT REFERENCES equipment(equipment_id) ON DELETE CASCADE,
    work_center_id TEXT REFERENCES work_center(work_center_id) ON DELETE CASCADE,
    request_type TEXT NOT NULL,
    stage TEXT NOT NULL,
    priority TEXT NOT NULL,
    scheduled_date TEXT,
    duration_hours REAL NOT NULL DEFAULT 0,
    assigned_to TEXT,
    team_id TEXT REFERENCES maintenance_team(team_id) ON DELETE SET NULL,
    created_by TEXT NOT NULL,
    instructions TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    CHECK ((equipment_id IS NULL) <> (work_center_id IS NULL))
);

CREATE INDEX IF NOT EXISTS idx_request_stage ON maintenance_request(stage);
CREATE INDEX IF NOT EXISTS idx_request_equipment ON maintenance_request(equipment_id);

CREATE TABLE IF NOT EXISTS maintenance_log (
    log_id TEXT PRIMARY KEY,
    request_id TEXT NOT NULL REFERENCES maintenance_request(request_id) ON DELETE CASCADE,
    comment TEXT NOT NULL,
    created_by TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_log_request ON maintenance_log(request_id, created_at);

CREATE TRIGGER IF NOT EXISTS maintenance_log_append_only
BEFORE UPDATE ON maintenance_log
BEGIN
    SELECT RAISE(ABORT, 'maintenance_log is append-only');
END;

CREATE TRIGGER IF NOT EXISTS maintenance_log_no_delete
BEFORE DELETE ON maintenance_log
BEGIN
    SELECT RAISE(ABORT, 'maintenance_log is append-only');
END;
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_request_target_check_constraint() {
        let conn = open_in_memory().unwrap();
        // 两个对象都为空 -> CHECK 失败
        let result = conn.execute(
            r#"
            INSERT INTO maintenance_request (
                request_id, subject, equipment_id, work_center_id,
                request_type, stage, priority, created_by, created_at, updated_at
            ) VALUES ('R1', 's', NULL, NULL, 'CORRECTIVE', 'NEW', 'MEDIUM', 'u',
                      '2026-01-01 00:00:00', '2026-01-01 00:00:00')
            "#,
            [],
        );
        assert!(result.is_err());
    }
}
