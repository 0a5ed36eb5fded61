// ==========================================
// 设备维护管理系统 - 工单阶段流转策略
// ==========================================
// 模式:
// - FREE:   任意阶段可直接改为任意阶段（默认，与看板自由拖拽一致）
// - STRICT: New -> InProgress -> {Repaired, Scrap}，Repaired / Scrap 为终态
// 两种模式下，同阶段重复保存都允许
// ==========================================

use crate::domain::types::RequestStage;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ==========================================
// StageTransitionMode - 流转模式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageTransitionMode {
    Free,
    Strict,
}

impl Default for StageTransitionMode {
    fn default() -> Self {
        StageTransitionMode::Free
    }
}

impl fmt::Display for StageTransitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

impl StageTransitionMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "FREE" => Some(StageTransitionMode::Free),
            "STRICT" => Some(StageTransitionMode::Strict),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            StageTransitionMode::Free => "FREE",
            StageTransitionMode::Strict => "STRICT",
        }
    }
}

/// 不允许的阶段变更
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("不允许的阶段变更: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: RequestStage,
    pub to: RequestStage,
}

// ==========================================
// StageTransitionPolicy - 流转策略
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTransitionPolicy {
    mode: StageTransitionMode,
}

impl StageTransitionPolicy {
    pub fn new(mode: StageTransitionMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> StageTransitionMode {
        self.mode
    }

    /// 是否允许 from -> to
    pub fn is_allowed(&self, from: RequestStage, to: RequestStage) -> bool {
        if from == to {
            return true;
        }
        match self.mode {
            StageTransitionMode::Free => true,
            StageTransitionMode::Strict => matches!(
                (from, to),
                (RequestStage::New, RequestStage::InProgress)
                    | (RequestStage::InProgress, RequestStage::Repaired)
                    | (RequestStage::InProgress, RequestStage::Scrap)
            ),
        }
    }

    /// 校验阶段变更
    pub fn check(&self, from: RequestStage, to: RequestStage) -> Result<(), InvalidTransition> {
        if self.is_allowed(from, to) {
            Ok(())
        } else {
            Err(InvalidTransition { from, to })
        }
    }

    /// 校验新建工单的初始阶段（视为从 New 流转）
    pub fn check_initial(&self, stage: RequestStage) -> Result<(), InvalidTransition> {
        self.check(RequestStage::New, stage)
    }

    /// 当前阶段可流转到的阶段（不含自身）
    pub fn next_stages(&self, from: RequestStage) -> Vec<RequestStage> {
        RequestStage::ALL
            .iter()
            .copied()
            .filter(|to| *to != from && self.is_allowed(from, *to))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use RequestStage::*;

    #[test]
    fn test_free_allows_everything() {
        let policy = StageTransitionPolicy::default();
        for from in RequestStage::ALL {
            for to in RequestStage::ALL {
                assert!(policy.is_allowed(from, to));
            }
        }
        assert_eq!(policy.mode(), StageTransitionMode::Free);
    }

    #[test]
    fn test_strict_edges() {
        let policy = StageTransitionPolicy::new(StageTransitionMode::Strict);
        assert!(policy.is_allowed(New, InProgress));
        assert!(policy.is_allowed(InProgress, Repaired));
        assert!(policy.is_allowed(InProgress, Scrap));

        assert!(!policy.is_allowed(New, Scrap));
        assert!(!policy.is_allowed(Repaired, New));
        assert!(!policy.is_allowed(Scrap, InProgress));
        assert!(!policy.is_allowed(Repaired, Scrap));

        // 同阶段重复保存
        assert!(policy.is_allowed(Scrap, Scrap));
    }

    #[test]
    fn test_strict_sinks_have_no_next() {
        let policy = StageTransitionPolicy::new(StageTransitionMode::Strict);
        assert_eq!(policy.next_stages(New), vec![InProgress]);
        assert_eq!(policy.next_stages(InProgress), vec![Repaired, Scrap]);
        assert!(policy.next_stages(Repaired).is_empty());
        assert!(policy.next_stages(Scrap).is_empty());
    }

    #[test]
    fn test_check_reports_edge() {
        let policy = StageTransitionPolicy::new(StageTransitionMode::Strict);
        let err = policy.check(Repaired, New).unwrap_err();
        assert_eq!(err, InvalidTransition { from: Repaired, to: New });
        assert!(policy.check_initial(New).is_ok());
        assert!(policy.check_initial(InProgress).is_ok());
        assert!(policy.check_initial(Scrap).is_err());
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(StageTransitionMode::from_str("strict"), Some(StageTransitionMode::Strict));
        assert_eq!(StageTransitionMode::from_str(" FREE "), Some(StageTransitionMode::Free));
        assert_eq!(StageTransitionMode::from_str("loose"), None);
    }
}
