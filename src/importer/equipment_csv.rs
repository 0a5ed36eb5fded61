// ==========================================
// 设备维护管理系统 - 设备 CSV 导入
// ==========================================
// 列: name, serial_number, department, location, health, description
// 规则: 字段去首尾空白；非法行跳过并记入报告，不中断整批导入
// ==========================================

use crate::domain::equipment::{Equipment, HEALTH_MAX};
use crate::engine::request_validator::RequestValidator;
use crate::i18n;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::equipment_repo::EquipmentRepository;
use async_trait::async_trait;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

const REQUIRED_COLUMNS: [&str; 2] = ["name", "serial_number"];

// ==========================================
// 导入报告
// ==========================================

/// 被跳过的行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// 文件行号（表头为第 1 行）
    pub row: usize,
    pub serial_number: String,
    pub reason: String,
}

/// 单个文件的导入结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportReport {
    pub file: String,
    pub total_rows: usize,
    pub imported: usize,
    pub rejected: Vec<RejectedRow>,
}

impl ImportReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

// ==========================================
// EquipmentImporter Trait
// ==========================================
#[async_trait]
pub trait EquipmentImporter: Send + Sync {
    /// 从 CSV 文件导入设备
    ///
    /// # 返回
    /// - Ok(ImportReport): 导入报告（含跳过行明细）
    /// - Err: 文件不存在 / 格式错误 / 缺少必需列
    async fn import_from_csv<P: AsRef<Path> + Send>(&self, file_path: P) -> ImportResult<ImportReport>;

    /// 批量导入多个文件（并发执行，单个文件失败不影响其他文件）
    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<Result<ImportReport, String>>;
}

// ==========================================
// EquipmentCsvImporter
// ==========================================
pub struct EquipmentCsvImporter {
    equipment_repo: Arc<EquipmentRepository>,
    validator: RequestValidator,
}

impl EquipmentCsvImporter {
    pub fn new(equipment_repo: Arc<EquipmentRepository>) -> Self {
        Self {
            equipment_repo,
            validator: RequestValidator::new(),
        }
    }

    /// 逐行转换并落库
    fn import_records(&self, file: &str, records: Vec<(usize, RawRow)>) -> ImportResult<ImportReport> {
        let mut report = ImportReport {
            file: file.to_string(),
            total_rows: records.len(),
            ..Default::default()
        };
        let mut seen: HashSet<String> = HashSet::new();

        for (row_no, raw) in records {
            let serial = raw.serial_number.clone();
            let reject = |reason: String| RejectedRow {
                row: row_no,
                serial_number: serial.clone(),
                reason,
            };

            let equipment = match raw.into_equipment() {
                Ok(eq) => eq,
                Err(reason) => {
                    report.rejected.push(reject(reason));
                    continue;
                }
            };

            if let Err(errors) = self.validator.validate_equipment(&equipment) {
                let reason = errors
                    .iter()
                    .map(|e| e.message.clone())
                    .collect::<Vec<_>>()
                    .join("; ");
                report.rejected.push(reject(reason));
                continue;
            }

            let duplicate = !seen.insert(equipment.serial_number.clone())
                || self
                    .equipment_repo
                    .find_by_serial(&equipment.serial_number)?
                    .is_some();
            if duplicate {
                report.rejected.push(reject(i18n::t_with_args(
                    "import.duplicate_serial",
                    &[("serial", &equipment.serial_number)],
                )));
                continue;
            }

            self.equipment_repo.insert(&equipment)?;
            report.imported += 1;
        }

        Ok(report)
    }
}

#[async_trait]
impl EquipmentImporter for EquipmentCsvImporter {
    async fn import_from_csv<P: AsRef<Path> + Send>(&self, file_path: P) -> ImportResult<ImportReport> {
        let path = file_path.as_ref();
        let file = path.display().to_string();

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ImportError::FileNotFound(file));
            }
            Err(e) => return Err(e.into()),
        };

        let records = parse_csv(&bytes)?;
        info!(file = %file, rows = records.len(), "开始导入设备");

        let report = self.import_records(&file, records)?;
        if report.is_clean() {
            info!(file = %file, imported = report.imported, "设备导入完成");
        } else {
            warn!(
                file = %file,
                imported = report.imported,
                rejected = report.rejected.len(),
                "设备导入完成，部分行被跳过"
            );
        }
        Ok(report)
    }

    async fn batch_import<P: AsRef<Path> + Send + Sync>(
        &self,
        file_paths: Vec<P>,
    ) -> Vec<Result<ImportReport, String>> {
        use futures::future::join_all;

        info!(count = file_paths.len(), "开始批量导入文件");

        let tasks = file_paths.into_iter().map(|path| {
            let path_str = path.as_ref().display().to_string();
            async move {
                match self.import_from_csv(path).await {
                    Ok(report) => Ok(report),
                    Err(e) => {
                        error!(file = %path_str, error = %e, "文件导入失败");
                        Err(format!("文件 {} 导入失败: {}", path_str, e))
                    }
                }
            }
        });

        join_all(tasks).await
    }
}

// ==========================================
// CSV 解析
// ==========================================

/// CSV 原始行（已去空白）
#[derive(Debug, Clone, Default)]
struct RawRow {
    name: String,
    serial_number: String,
    department: String,
    location: String,
    health: String,
    description: String,
}

impl RawRow {
    fn into_equipment(self) -> Result<Equipment, String> {
        let health = if self.health.is_empty() {
            HEALTH_MAX
        } else {
            self.health.parse::<i32>().map_err(|_| {
                i18n::t_with_args("validation.health_out_of_range", &[("value", &self.health)])
            })?
        };

        let mut equipment =
            Equipment::new(&self.serial_number, &self.name, &self.department, &self.location);
        equipment.health = health;
        equipment.description = self.description;
        Ok(equipment)
    }
}

/// 解析 CSV 内容，返回 (文件行号, 原始行)
fn parse_csv(bytes: &[u8]) -> ImportResult<Vec<(usize, RawRow)>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ImportError::MissingColumn(column.to_string()));
        }
    }

    let index = |name: &str| headers.iter().position(|h| h == name);
    let columns = [
        index("name"),
        index("serial_number"),
        index("department"),
        index("location"),
        index("health"),
        index("description"),
    ];

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let cell = |col: Option<usize>| field(&record, col);
        rows.push((
            i + 2,
            RawRow {
                name: cell(columns[0]),
                serial_number: cell(columns[1]),
                department: cell(columns[2]),
                location: cell(columns[3]),
                health: cell(columns[4]),
                description: cell(columns[5]),
            },
        ));
    }
    Ok(rows)
}

fn field(record: &StringRecord, col: Option<usize>) -> String {
    col.and_then(|i| record.get(i))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}
