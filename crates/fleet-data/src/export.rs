//! CSV / JSON / xlsx export of evaluated records, and re-import of those files.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use fleet_core::error::{FleetError, Result};
use fleet_core::models::{
    CombinedRecord, Decision, DistanceSummary, EvaluatedRecord, FinanceSummary,
    MaintenanceSummary, OwnershipClass, RuleOutcome, UnitKey,
};
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::reader::read_xlsx_grid;

// ── ExportFormat ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
    Xlsx,
}

impl ExportFormat {
    /// Guess the format from a file extension, defaulting to CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            Some(ext) if ext.eq_ignore_ascii_case("xlsx") => ExportFormat::Xlsx,
            _ => ExportFormat::Csv,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Xlsx => "xlsx",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "xlsx" => Ok(ExportFormat::Xlsx),
            other => Err(FleetError::Config(format!("unknown export format: {other}"))),
        }
    }
}

// ── ExportRow ─────────────────────────────────────────────────────────────────

/// One evaluated record flattened into a single row.
///
/// A source table that did not contribute leaves all of its columns empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
    pub unit_key: Option<String>,
    pub decision: Decision,
    pub rule: RuleOutcome,

    pub maintenance_unit_id: Option<String>,
    pub total_repairs: Option<u32>,
    pub total_company_cost: Option<f64>,
    pub avg_cost_per_repair: Option<f64>,

    pub finance_unit_id: Option<String>,
    pub ownership_type: Option<String>,
    pub ownership_class: Option<OwnershipClass>,
    pub monthly_payment: Option<f64>,
    pub balloon_payment: Option<f64>,
    pub status: Option<String>,
    pub purchase_amount: Option<f64>,
    pub est_remaining_payments: Option<f64>,
    pub total_estimated_liability: Option<f64>,

    pub distance_unit_id: Option<String>,
    pub total_distance_km: Option<f64>,
    pub avg_daily_distance_km: Option<f64>,
    pub data_points: Option<u32>,
}

/// A single exported cell, typed for spreadsheet output.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportCell {
    Text(String),
    Number(f64),
    Empty,
}

impl From<Option<String>> for ExportCell {
    fn from(value: Option<String>) -> Self {
        value.map_or(ExportCell::Empty, ExportCell::Text)
    }
}

impl From<Option<f64>> for ExportCell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(ExportCell::Empty, ExportCell::Number)
    }
}

impl From<Option<u32>> for ExportCell {
    fn from(value: Option<u32>) -> Self {
        value.map_or(ExportCell::Empty, |v| ExportCell::Number(f64::from(v)))
    }
}

impl From<&EvaluatedRecord> for ExportRow {
    fn from(evaluated: &EvaluatedRecord) -> Self {
        let r = &evaluated.record;
        let m = r.maintenance.as_ref();
        let f = r.finance.as_ref();
        let d = r.distance.as_ref();
        Self {
            unit_key: r.key.as_known().map(str::to_string),
            decision: evaluated.decision,
            rule: evaluated.rule,

            maintenance_unit_id: m.map(|m| m.unit_id.clone()),
            total_repairs: m.map(|m| m.total_repairs),
            total_company_cost: m.map(|m| m.total_company_cost),
            avg_cost_per_repair: m.and_then(|m| m.avg_cost_per_repair),

            finance_unit_id: f.and_then(|f| f.unit_id.clone()),
            ownership_type: f.and_then(|f| f.ownership_type.clone()),
            ownership_class: f.map(|f| f.ownership_class),
            monthly_payment: f.and_then(|f| f.monthly_payment),
            balloon_payment: f.and_then(|f| f.balloon_payment),
            status: f.and_then(|f| f.status.clone()),
            purchase_amount: f.and_then(|f| f.purchase_amount),
            est_remaining_payments: f.map(|f| f.est_remaining_payments),
            total_estimated_liability: f.map(|f| f.total_estimated_liability),

            distance_unit_id: d.map(|d| d.unit_id.clone()),
            total_distance_km: d.map(|d| d.total_distance_km),
            avg_daily_distance_km: d.map(|d| d.avg_daily_distance_km),
            data_points: d.map(|d| d.data_points),
        }
    }
}

impl ExportRow {
    /// Column names, in the order written by every export format.
    pub const HEADERS: [&'static str; 20] = [
        "unit_key",
        "decision",
        "rule",
        "maintenance_unit_id",
        "total_repairs",
        "total_company_cost",
        "avg_cost_per_repair",
        "finance_unit_id",
        "ownership_type",
        "ownership_class",
        "monthly_payment",
        "balloon_payment",
        "status",
        "purchase_amount",
        "est_remaining_payments",
        "total_estimated_liability",
        "distance_unit_id",
        "total_distance_km",
        "avg_daily_distance_km",
        "data_points",
    ];

    /// The row's cells in [`ExportRow::HEADERS`] order.
    pub fn cells(&self) -> [ExportCell; 20] {
        [
            self.unit_key.clone().into(),
            ExportCell::Text(self.decision.as_str().to_string()),
            ExportCell::Text(self.rule.as_str().to_string()),
            self.maintenance_unit_id.clone().into(),
            self.total_repairs.into(),
            self.total_company_cost.into(),
            self.avg_cost_per_repair.into(),
            self.finance_unit_id.clone().into(),
            self.ownership_type.clone().into(),
            self.ownership_class.map(|c| c.as_str().to_string()).into(),
            self.monthly_payment.into(),
            self.balloon_payment.into(),
            self.status.clone().into(),
            self.purchase_amount.into(),
            self.est_remaining_payments.into(),
            self.total_estimated_liability.into(),
            self.distance_unit_id.clone().into(),
            self.total_distance_km.into(),
            self.avg_daily_distance_km.into(),
            self.data_points.into(),
        ]
    }

    /// Rebuild the evaluated record.
    ///
    /// A source is considered present when its always-set columns are
    /// filled: repairs and cost for maintenance, ownership class for
    /// finance, total distance for distance.
    pub fn into_record(self) -> EvaluatedRecord {
        let key = UnitKey::from(self.unit_key);

        let maintenance = match (self.total_repairs, self.total_company_cost) {
            (Some(total_repairs), Some(total_company_cost)) => Some(MaintenanceSummary {
                key: key.clone(),
                unit_id: self.maintenance_unit_id.unwrap_or_default(),
                total_repairs,
                total_company_cost,
                avg_cost_per_repair: self.avg_cost_per_repair,
            }),
            _ => None,
        };

        let finance = self.ownership_class.map(|ownership_class| FinanceSummary {
            key: key.clone(),
            unit_id: self.finance_unit_id,
            ownership_type: self.ownership_type,
            ownership_class,
            monthly_payment: self.monthly_payment,
            balloon_payment: self.balloon_payment,
            status: self.status,
            purchase_amount: self.purchase_amount,
            est_remaining_payments: self.est_remaining_payments.unwrap_or(0.0),
            total_estimated_liability: self.total_estimated_liability.unwrap_or(0.0),
        });

        let distance = self.total_distance_km.map(|total_distance_km| DistanceSummary {
            key: key.clone(),
            unit_id: self.distance_unit_id.unwrap_or_default(),
            total_distance_km,
            avg_daily_distance_km: self.avg_daily_distance_km.unwrap_or(0.0),
            data_points: self.data_points.unwrap_or(0),
        });

        EvaluatedRecord {
            record: CombinedRecord {
                key,
                maintenance,
                finance,
                distance,
            },
            decision: self.decision,
            rule: self.rule,
        }
    }
}

// ── Export / import ───────────────────────────────────────────────────────────

/// Write `records` as CSV with a header row.
pub fn export_csv<'a, I>(records: I, path: &Path) -> Result<usize>
where
    I: IntoIterator<Item = &'a EvaluatedRecord>,
{
    let mut writer = csv::Writer::from_path(path)?;
    let mut written = 0usize;
    for record in records {
        writer.serialize(ExportRow::from(record))?;
        written += 1;
    }
    writer.flush()?;
    info!("Exported {} records to {}", written, path.display());
    Ok(written)
}

/// Write `records` as a pretty-printed JSON array.
pub fn export_json<'a, I>(records: I, path: &Path) -> Result<usize>
where
    I: IntoIterator<Item = &'a EvaluatedRecord>,
{
    let rows: Vec<ExportRow> = records.into_iter().map(ExportRow::from).collect();
    let json = serde_json::to_string_pretty(&rows)?;
    std::fs::write(path, json)?;
    info!("Exported {} records to {}", rows.len(), path.display());
    Ok(rows.len())
}

/// Write `records` to the first worksheet of a new xlsx workbook, with a
/// bold header row. Empty values are left as blank cells.
pub fn export_xlsx<'a, I>(records: I, path: &Path) -> Result<usize>
where
    I: IntoIterator<Item = &'a EvaluatedRecord>,
{
    let workbook_error = |e: rust_xlsxwriter::XlsxError| FleetError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("fleet").map_err(workbook_error)?;
    for (col, name) in ExportRow::HEADERS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *name, &bold)
            .map_err(workbook_error)?;
    }

    let mut written = 0usize;
    for record in records {
        let row = written as u32 + 1;
        for (col, cell) in ExportRow::from(record).cells().into_iter().enumerate() {
            let col = col as u16;
            match cell {
                ExportCell::Text(text) => {
                    sheet.write_string(row, col, text).map_err(workbook_error)?;
                }
                ExportCell::Number(value) => {
                    sheet.write_number(row, col, value).map_err(workbook_error)?;
                }
                ExportCell::Empty => {}
            }
        }
        written += 1;
    }

    workbook.save(path).map_err(workbook_error)?;
    info!("Exported {} records to {}", written, path.display());
    Ok(written)
}

/// Export in the requested format. Returns the number of records written.
pub fn export_records<'a, I>(records: I, path: &Path, format: ExportFormat) -> Result<usize>
where
    I: IntoIterator<Item = &'a EvaluatedRecord>,
{
    match format {
        ExportFormat::Csv => export_csv(records, path),
        ExportFormat::Json => export_json(records, path),
        ExportFormat::Xlsx => export_xlsx(records, path),
    }
}

/// Read records back from a file written by [`export_records`]. The format
/// is taken from the file extension.
pub fn import_records(path: &Path) -> Result<Vec<EvaluatedRecord>> {
    let rows: Vec<ExportRow> = match ExportFormat::from_path(path) {
        ExportFormat::Csv => {
            let mut reader = csv::Reader::from_path(path)?;
            reader
                .deserialize()
                .collect::<std::result::Result<Vec<ExportRow>, _>>()?
        }
        ExportFormat::Json => {
            let content =
                std::fs::read_to_string(path).map_err(|source| FleetError::FileRead {
                    path: path.to_path_buf(),
                    source,
                })?;
            serde_json::from_str(&content)?
        }
        ExportFormat::Xlsx => {
            let (headers, rows, _) = read_xlsx_grid(path)?;
            let headers = csv::StringRecord::from(headers);
            rows.into_iter()
                .map(|row| {
                    csv::StringRecord::from(row)
                        .deserialize::<ExportRow>(Some(&headers))
                        .map_err(FleetError::from)
                })
                .collect::<Result<Vec<ExportRow>>>()?
        }
    };
    Ok(rows.into_iter().map(ExportRow::into_record).collect())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
