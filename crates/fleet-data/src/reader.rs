//! Discovery and loading of the fleet exports.
//!
//! Locates the exports under an input directory by their canonical file
//! names, either as CSV or as xlsx workbooks, checks the required header
//! columns and converts each row into the raw record types of
//! [`fleet_core::models`].

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, Xlsx};
use fleet_core::error::{FleetError, Result};
use fleet_core::models::{RawDistanceSample, RawFinanceRecord, RawMaintenanceEvent};
use tracing::{debug, warn};

// ── InputTable ────────────────────────────────────────────────────────────────

/// The spreadsheet exports the evaluator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InputTable {
    Maintenance,
    Finance,
    Distance,
    Odometer,
    Stub,
    TruckPaper,
}

impl InputTable {
    /// Tables the pipeline cannot run without.
    pub const REQUIRED: [InputTable; 3] = [
        InputTable::Maintenance,
        InputTable::Finance,
        InputTable::Distance,
    ];

    /// Tables that are picked up when present but do not feed the decision.
    pub const AUXILIARY: [InputTable; 3] = [
        InputTable::Odometer,
        InputTable::Stub,
        InputTable::TruckPaper,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            InputTable::Maintenance => "maintenance",
            InputTable::Finance => "finance",
            InputTable::Distance => "distance",
            InputTable::Odometer => "odometer",
            InputTable::Stub => "stub",
            InputTable::TruckPaper => "truck_paper",
        }
    }

    /// Canonical export file name without its extension.
    pub fn stem(&self) -> &'static str {
        match self {
            InputTable::Maintenance => "maintenancepo-truck",
            InputTable::Finance => "truck-finance",
            InputTable::Distance => "vehicle-distance-traveled",
            InputTable::Odometer => "truck-odometer-data-week-",
            InputTable::Stub => "stub-data",
            InputTable::TruckPaper => "truck-paper",
        }
    }

    /// Accepted file names, e.g. `truck-finance.{xlsx,csv}`.
    pub fn file_pattern(&self) -> String {
        format!("{}.{{xlsx,csv}}", self.stem())
    }

    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            InputTable::Maintenance => &["unit_id", "amount", "company_covered"],
            InputTable::Finance => &[
                "unit_id",
                "ownership_type",
                "monthly_payment",
                "balloon_payment",
                "status",
                "purchase_amount",
            ],
            InputTable::Distance => &["unit_id", "distance"],
            InputTable::Odometer | InputTable::Stub | InputTable::TruckPaper => &[],
        }
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }

    /// Match a file name against the canonical stems, ignoring case.
    fn from_file_name(name: &str) -> Option<Self> {
        let path = Path::new(name);
        SourceFormat::from_path(path)?;
        let stem = path.file_stem()?.to_str()?.to_lowercase();
        Self::REQUIRED
            .into_iter()
            .chain(Self::AUXILIARY)
            .find(|t| t.stem() == stem)
    }
}

impl fmt::Display for InputTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── SourceFormat ──────────────────────────────────────────────────────────────

/// On-disk format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    /// Format implied by the file extension, `None` for anything else.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("csv") {
            Some(SourceFormat::Csv)
        } else if ext.eq_ignore_ascii_case("xlsx") {
            Some(SourceFormat::Xlsx)
        } else {
            None
        }
    }
}

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Find the known exports anywhere under `dir`.
///
/// Paths are visited in sorted order, so when a table occurs more than once
/// (in another directory or as both `.csv` and `.xlsx`) the lexicographically
/// first path wins. Only presence is checked here; see [`check_required`] for
/// the missing-table error.
pub fn find_input_files(dir: &Path) -> Result<BTreeMap<InputTable, PathBuf>> {
    if !dir.is_dir() {
        return Err(FleetError::InputDirNotFound(dir.to_path_buf()));
    }

    let mut found: BTreeMap<InputTable, PathBuf> = BTreeMap::new();
    let walker = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file());

    for entry in walker {
        let Some(table) = entry.file_name().to_str().and_then(InputTable::from_file_name) else {
            continue;
        };
        if let Some(existing) = found.get(&table) {
            warn!(
                "Ignoring duplicate {} export {} (using {})",
                table,
                entry.path().display(),
                existing.display()
            );
            continue;
        }
        found.insert(table, entry.into_path());
    }

    debug!("Found {} export files under {}", found.len(), dir.display());
    Ok(found)
}

/// Fail with [`FleetError::MissingTable`] for the first required table absent
/// from `found`.
pub fn check_required(found: &BTreeMap<InputTable, PathBuf>, dir: &Path) -> Result<()> {
    for table in InputTable::REQUIRED {
        if !found.contains_key(&table) {
            return Err(FleetError::MissingTable {
                table: table.name().to_string(),
                file_name: table.file_pattern(),
                dir: dir.to_path_buf(),
            });
        }
    }
    Ok(())
}

// ── SheetTable ────────────────────────────────────────────────────────────────

/// A fully loaded export with its header index.
///
/// CSV files and xlsx worksheets load into the same cell grid, so column
/// lookup and number parsing do not depend on the source format.
#[derive(Debug)]
pub struct SheetTable {
    pub table: InputTable,
    pub path: PathBuf,
    columns: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
    /// 1-based line of the header row in the source.
    header_line: usize,
}

impl SheetTable {
    /// Read `path` and verify the table's required columns.
    ///
    /// The format comes from the extension; anything that is not `.xlsx` is
    /// read as CSV. Header names are compared after trimming and
    /// lower-casing; extra columns are ignored.
    pub fn read(table: InputTable, path: &Path) -> Result<Self> {
        let (headers, rows, header_line) = match SourceFormat::from_path(path) {
            Some(SourceFormat::Xlsx) => read_xlsx_grid(path)?,
            _ => read_csv_grid(path)?,
        };

        let columns: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (normalize_header(name), idx))
            .collect();

        for column in table.required_columns() {
            if !columns.contains_key(*column) {
                return Err(FleetError::MissingColumn {
                    table: table.name().to_string(),
                    column: (*column).to_string(),
                    path: path.to_path_buf(),
                });
            }
        }

        debug!("Read {} rows from {} ({})", rows.len(), table, path.display());

        Ok(Self {
            table,
            path: path.to_path_buf(),
            columns,
            rows,
            header_line,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Text of `column` in data row `row`, `None` when the cell is empty or
    /// the row is short.
    pub fn text(&self, row: usize, column: &str) -> Option<String> {
        let idx = *self.columns.get(column)?;
        self.rows
            .get(row)?
            .get(idx)
            .map(|cell| cell.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Numeric value of `column` in data row `row`.
    ///
    /// Empty cells are `Ok(None)`; anything that is not a number (after
    /// removing a leading `$` and thousands separators) is
    /// [`FleetError::MalformedValue`].
    pub fn number(&self, row: usize, column: &str) -> Result<Option<f64>> {
        let Some(raw) = self.text(row, column) else {
            return Ok(None);
        };
        parse_number(&raw).map(Some).ok_or_else(|| FleetError::MalformedValue {
            table: self.table.name().to_string(),
            row: self.header_line + row + 1,
            column: column.to_string(),
            value: raw,
        })
    }
}

pub(crate) type Grid = (Vec<String>, Vec<Vec<String>>, usize);

fn read_csv_grid(path: &Path) -> Result<Grid> {
    let file = std::fs::File::open(path).map_err(|source| FleetError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(std::io::BufReader::new(file));

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok((headers, rows, 1))
}

/// Load the first worksheet of an xlsx workbook. The first non-empty row of
/// the used range is the header.
pub(crate) fn read_xlsx_grid(path: &Path) -> Result<Grid> {
    let file = std::fs::File::open(path).map_err(|source| FleetError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let workbook_error = |message: String| FleetError::Workbook {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook: Xlsx<_> =
        Xlsx::new(std::io::BufReader::new(file)).map_err(|e| workbook_error(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| workbook_error("workbook has no worksheets".to_string()))?
        .map_err(|e| workbook_error(e.to_string()))?;

    let header_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    let mut grid = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
    let headers = grid.next().unwrap_or_default();
    let rows = grid.collect();
    Ok((headers, rows, header_line))
}

/// Render a worksheet cell the way it would appear in a CSV export.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::Error(e) => format!("{e:?}"),
    }
}

fn normalize_header(name: &str) -> String {
    name.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Parse a spreadsheet number such as `"1,250.50"`, `"$980"` or `"-12"`.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let (negative, body) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, trimmed),
    };
    let body = body.strip_prefix('$').unwrap_or(body);
    let cleaned: String = body.chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(if negative { -value } else { value })
}

// ── Typed loaders ─────────────────────────────────────────────────────────────

pub fn load_maintenance(path: &Path) -> Result<Vec<RawMaintenanceEvent>> {
    let table = SheetTable::read(InputTable::Maintenance, path)?;
    (0..table.len())
        .map(|row| {
            Ok(RawMaintenanceEvent {
                unit_id: table.text(row, "unit_id"),
                amount: table.number(row, "amount")?,
                company_covered: table.number(row, "company_covered")?,
            })
        })
        .collect()
}

pub fn load_finance(path: &Path) -> Result<Vec<RawFinanceRecord>> {
    let table = SheetTable::read(InputTable::Finance, path)?;
    (0..table.len())
        .map(|row| {
            Ok(RawFinanceRecord {
                unit_id: table.text(row, "unit_id"),
                ownership_type: table.text(row, "ownership_type"),
                monthly_payment: table.number(row, "monthly_payment")?,
                balloon_payment: table.number(row, "balloon_payment")?,
                status: table.text(row, "status"),
                purchase_amount: table.number(row, "purchase_amount")?,
            })
        })
        .collect()
}

pub fn load_distance(path: &Path) -> Result<Vec<RawDistanceSample>> {
    let table = SheetTable::read(InputTable::Distance, path)?;
    (0..table.len())
        .map(|row| {
            Ok(RawDistanceSample {
                unit_id: table.text(row, "unit_id"),
                distance: table.number(row, "distance")?,
            })
        })
        .collect()
}

// ── FleetInputs ───────────────────────────────────────────────────────────────

/// Everything read from one input directory.
#[derive(Debug, Clone, Default)]
pub struct FleetInputs {
    pub input_dir: PathBuf,
    pub maintenance: Vec<RawMaintenanceEvent>,
    pub finance: Vec<RawFinanceRecord>,
    pub distance: Vec<RawDistanceSample>,
    /// Row counts of the auxiliary exports that were present.
    pub auxiliary_rows: BTreeMap<InputTable, usize>,
    /// Path each table was read from.
    pub paths: BTreeMap<InputTable, PathBuf>,
}

/// Discover and load all exports under `dir`.
///
/// Missing required tables, missing required columns and malformed numbers
/// abort the load. Auxiliary exports that fail to parse are skipped with a
/// warning.
pub fn load_inputs(dir: &Path) -> Result<FleetInputs> {
    let paths = find_input_files(dir)?;
    check_required(&paths, dir)?;

    let mut inputs = FleetInputs {
        input_dir: dir.to_path_buf(),
        ..Default::default()
    };

    for (table, path) in &paths {
        match table {
            InputTable::Maintenance => inputs.maintenance = load_maintenance(path)?,
            InputTable::Finance => inputs.finance = load_finance(path)?,
            InputTable::Distance => inputs.distance = load_distance(path)?,
            aux => match SheetTable::read(*aux, path) {
                Ok(t) => {
                    inputs.auxiliary_rows.insert(*aux, t.len());
                }
                Err(e) => warn!("Skipping {} export {}: {}", aux, path.display(), e),
            },
        }
    }

    inputs.paths = paths;
    Ok(inputs)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
