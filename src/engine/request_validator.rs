// ==========================================
// 设备维护管理系统 - 工单生命周期校验器
// ==========================================
// 职责: 工单落库前的纯校验（无副作用）
// 规则:
// - 规则1: 必须选择设备或工作中心（表单级错误）
// - 规则2: 设备与工作中心不能同时选择（表单级错误）
// - 规则3: 预防性保养必须填写计划日期（字段 scheduled_date）
// 输出: 收集全部违规，而不是遇到第一条就返回
// ==========================================

use crate::domain::equipment::{Equipment, HEALTH_MAX};
use crate::domain::request::RequestDraft;
use crate::domain::types::{MaintenanceTarget, RequestType, TargetRefs};
use crate::i18n;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 字段名（与表单控件名一致，便于界面就近展示错误）
pub mod fields {
    pub const SCHEDULED_DATE: &str = "scheduled_date";
    pub const SUBJECT: &str = "subject";
    pub const SERIAL_NUMBER: &str = "serial_number";
    pub const NAME: &str = "name";
    pub const HEALTH: &str = "health";
}

// ==========================================
// ValidationErrorKind - 校验错误类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorKind {
    MissingTarget,
    AmbiguousTarget,
    MissingSchedule,
    EmptySubject,
    EmptySerial,
    EmptyName,
    HealthOutOfRange,
}

impl ValidationErrorKind {
    /// 对应的 i18n 消息键
    pub fn message_key(&self) -> &'static str {
        match self {
            ValidationErrorKind::MissingTarget => "validation.missing_target",
            ValidationErrorKind::AmbiguousTarget => "validation.ambiguous_target",
            ValidationErrorKind::MissingSchedule => "validation.missing_schedule",
            ValidationErrorKind::EmptySubject => "validation.empty_subject",
            ValidationErrorKind::EmptySerial => "validation.empty_serial",
            ValidationErrorKind::EmptyName => "validation.empty_name",
            ValidationErrorKind::HealthOutOfRange => "validation.health_out_of_range",
        }
    }
}

// ==========================================
// FieldError - 字段级错误
// ==========================================
/// 字段级校验错误
///
/// `field == None` 表示表单级错误（不属于任何单一输入框）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: Option<String>,
    pub kind: ValidationErrorKind,
    pub message: String,
}

impl FieldError {
    /// 表单级错误
    pub fn form(kind: ValidationErrorKind) -> Self {
        Self {
            field: None,
            kind,
            message: i18n::t(kind.message_key()),
        }
    }

    /// 字段级错误
    pub fn field(field: &str, kind: ValidationErrorKind) -> Self {
        Self {
            field: Some(field.to_string()),
            kind,
            message: i18n::t(kind.message_key()),
        }
    }

    /// 字段级错误（带消息参数）
    pub fn field_with_args(field: &str, kind: ValidationErrorKind, args: &[(&str, &str)]) -> Self {
        Self {
            field: Some(field.to_string()),
            kind,
            message: i18n::t_with_args(kind.message_key(), args),
        }
    }

    pub fn is_form_level(&self) -> bool {
        self.field.is_none()
    }
}

// ==========================================
// 核心校验
// ==========================================

/// 校验工单的维护对象与排期
///
/// # 参数
/// - targets: 设备 / 工作中心引用（表单原始输入）
/// - request_type: 工单类型
/// - schedule: 计划执行时间
///
/// # 返回
/// - Ok(()): 校验通过
/// - Err(Vec<FieldError>): 每条违规规则一条错误
pub fn validate_request(
    targets: &TargetRefs,
    request_type: RequestType,
    schedule: Option<NaiveDateTime>,
) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    // 规则1 / 规则2: 维护对象二选一
    match (targets.has_equipment(), targets.has_work_center()) {
        (false, false) => errors.push(FieldError::form(ValidationErrorKind::MissingTarget)),
        (true, true) => errors.push(FieldError::form(ValidationErrorKind::AmbiguousTarget)),
        _ => {}
    }

    // 规则3: 预防性保养必须排期
    if request_type == RequestType::Preventive && schedule.is_none() {
        errors.push(FieldError::field(
            fields::SCHEDULED_DATE,
            ValidationErrorKind::MissingSchedule,
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

// ==========================================
// RequestValidator - 工单表单校验器
// ==========================================

/// 工单表单校验器
///
/// 在核心规则之外补充表单字段检查（主题非空），
/// 校验通过时返回收敛后的维护对象
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidator;

impl RequestValidator {
    pub fn new() -> Self {
        Self
    }

    /// 校验工单草稿
    ///
    /// # 返回
    /// - Ok(MaintenanceTarget): 校验通过
    /// - Err(Vec<FieldError>): 全部违规
    pub fn validate_draft(&self, draft: &RequestDraft) -> Result<MaintenanceTarget, Vec<FieldError>> {
        let mut errors = Vec::new();

        if draft.subject.trim().is_empty() {
            errors.push(FieldError::field(fields::SUBJECT, ValidationErrorKind::EmptySubject));
        }

        if let Err(mut core) =
            validate_request(&draft.targets, draft.request_type, draft.scheduled_date)
        {
            errors.append(&mut core);
        }

        if !errors.is_empty() {
            tracing::debug!(
                violations = errors.len(),
                subject = %draft.subject,
                "工单草稿校验未通过"
            );
            return Err(errors);
        }

        // 规则1/2 通过后 resolve 必然成功
        draft
            .targets
            .resolve()
            .ok_or_else(|| vec![FieldError::form(ValidationErrorKind::MissingTarget)])
    }

    /// 校验设备主数据
    pub fn validate_equipment(&self, equipment: &Equipment) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if equipment.serial_number.trim().is_empty() {
            errors.push(FieldError::field(fields::SERIAL_NUMBER, ValidationErrorKind::EmptySerial));
        }
        if equipment.name.trim().is_empty() {
            errors.push(FieldError::field(fields::NAME, ValidationErrorKind::EmptyName));
        }
        if !equipment.health_in_range() {
            errors.push(FieldError::field_with_args(
                fields::HEALTH,
                ValidationErrorKind::HealthOutOfRange,
                &[("value", &equipment.health.to_string())],
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// 健康度是否合法（导入器复用）
pub fn health_in_range(health: i32) -> bool {
    (0..=HEALTH_MAX).contains(&health)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn schedule() -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2026, 4, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
    }

    fn kinds(errors: &[FieldError]) -> Vec<ValidationErrorKind> {
        errors.iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_missing_target() {
        let errors = validate_request(&TargetRefs::default(), RequestType::Corrective, None)
            .unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::MissingTarget]);
        assert!(errors[0].is_form_level());
    }

    #[test]
    fn test_ambiguous_target() {
        let both = TargetRefs {
            equipment_id: Some("EQ1".to_string()),
            work_center_id: Some("WC1".to_string()),
        };
        let errors = validate_request(&both, RequestType::Corrective, None).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::AmbiguousTarget]);
        assert!(errors[0].is_form_level());
    }

    #[test]
    fn test_preventive_requires_schedule() {
        let errors =
            validate_request(&TargetRefs::equipment("E2"), RequestType::Preventive, None)
                .unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::MissingSchedule]);
        assert_eq!(errors[0].field.as_deref(), Some(fields::SCHEDULED_DATE));

        assert!(
            validate_request(&TargetRefs::equipment("E2"), RequestType::Preventive, schedule())
                .is_ok()
        );
    }

    #[test]
    fn test_corrective_without_schedule_is_accepted() {
        assert!(validate_request(&TargetRefs::work_center("WC1"), RequestType::Corrective, None).is_ok());
    }

    #[test]
    fn test_all_violations_are_reported() {
        let both = TargetRefs {
            equipment_id: Some("EQ1".to_string()),
            work_center_id: Some("WC1".to_string()),
        };
        let errors = validate_request(&both, RequestType::Preventive, None).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                ValidationErrorKind::AmbiguousTarget,
                ValidationErrorKind::MissingSchedule
            ]
        );

        let errors =
            validate_request(&TargetRefs::default(), RequestType::Preventive, None).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_draft_subject_and_target() {
        let validator = RequestValidator::new();

        let mut draft = RequestDraft::for_equipment("  ", "EQ1");
        let errors = validator.validate_draft(&draft).unwrap_err();
        assert_eq!(kinds(&errors), vec![ValidationErrorKind::EmptySubject]);
        assert_eq!(errors[0].field.as_deref(), Some(fields::SUBJECT));

        draft.subject = "主轴异响".to_string();
        assert_eq!(
            validator.validate_draft(&draft).unwrap(),
            MaintenanceTarget::Equipment("EQ1".to_string())
        );
    }

    #[test]
    fn test_validate_equipment() {
        let validator = RequestValidator::new();
        let mut eq = Equipment::new("", "", "D", "L");
        eq.health = 150;

        let errors = validator.validate_equipment(&eq).unwrap_err();
        assert_eq!(
            kinds(&errors),
            vec![
                ValidationErrorKind::EmptySerial,
                ValidationErrorKind::EmptyName,
                ValidationErrorKind::HealthOutOfRange
            ]
        );
        assert_eq!(errors[2].field.as_deref(), Some(fields::HEALTH));
        assert!(errors[2].message.contains("150"));
    }
}
