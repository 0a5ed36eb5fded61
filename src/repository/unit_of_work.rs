// ==========================================
// 设备维护管理系统 - 事务单元
// ==========================================
// 职责: 在共享连接上开启单个事务，闭包返回 Err 时整体回滚
// 用途: 工单保存 + 报废传播 同事务提交
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{Connection, Transaction};
use std::sync::{Arc, Mutex};

pub struct UnitOfWork {
    conn: Arc<Mutex<Connection>>,
}

impl UnitOfWork {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 在事务中执行闭包
    ///
    /// # 返回
    /// - Ok(T): 闭包成功且事务已提交
    /// - Err: 闭包失败（事务随 drop 回滚）或提交失败
    pub fn run<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        F: FnOnce(&Transaction) -> RepositoryResult<T>,
    {
        let mut conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let out = f(&tx)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k TEXT PRIMARY KEY);").unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn count(conn: &Arc<Mutex<Connection>>) -> i64 {
        conn.lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_commit_on_ok() {
        let conn = setup();
        let uow = UnitOfWork::new(conn.clone());
        uow.run(|tx| {
            tx.execute("INSERT INTO t VALUES ('a')", [])?;
            Ok(())
        })
        .unwrap();
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn test_rollback_on_err() {
        let conn = setup();
        let uow = UnitOfWork::new(conn.clone());
        let result: RepositoryResult<()> = uow.run(|tx| {
            tx.execute("INSERT INTO t VALUES ('a')", [])?;
            Err(RepositoryError::InternalError("boom".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(count(&conn), 0);
    }
}
