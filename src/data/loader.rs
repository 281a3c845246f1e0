use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, BooleanArray, Float64Array, Int64Array};
use arrow::compute::cast;
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, TimeUnit, TimestampMicrosecondType,
    TimestampMillisecondType, TimestampNanosecondType, TimestampSecondType,
};
use arrow::error::ArrowError;
use arrow::temporal_conversions::{
    date32_to_datetime, date64_to_datetime, timestamp_ms_to_datetime, timestamp_ns_to_datetime,
    timestamp_s_to_datetime, timestamp_us_to_datetime,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::filter::{apply_filters, DayFilter, MonthFilter};
use super::model::{CellValue, Trip, TripTable, START_TIME};
use super::registry::{City, CityRegistry};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("JSON error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("parquet error in {}: {source}", .path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },
    #[error("arrow error in {}: {source}", .path.display())]
    Arrow {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("{} has no '{column}' column", .path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("{} does not hold a JSON array of records", .path.display())]
    NotAnArray { path: PathBuf },
    #[error("{}: row {row} is not a JSON object", .path.display())]
    NotAnObject { path: PathBuf, row: usize },
    #[error("{}: row {row} has an invalid 'Start Time' value '{value}'", .path.display())]
    InvalidTimestamp {
        path: PathBuf,
        row: usize,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, DataError>;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the trip table for `city` and keep only trips matching the month and
/// day filters. The file is read fresh on every call.
pub fn load_city_data(
    registry: &CityRegistry,
    city: City,
    month: MonthFilter,
    day: DayFilter,
) -> Result<TripTable> {
    let path = registry.path_for(city);
    let table = load_file(&path)?;
    let loaded = table.len();
    let table = apply_filters(table, month, day);
    log::info!(
        "{city}: kept {} of {loaded} trips (month={month}, day={day})",
        table.len()
    );
    Ok(table)
}

/// Load an unfiltered trip table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one trip per line (the city files)
/// * `.json`    – `[{ "Start Time": "...", ...columns }, ...]`
/// * `.parquet` – `Start Time` as a string, timestamp or date column
pub fn load_file(path: &Path) -> Result<TripTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => Err(DataError::UnsupportedExtension(other.to_string())),
    }?;
    log::info!("loaded {} trips from {}", table.len(), path.display());
    Ok(table)
}

// ---------------------------------------------------------------------------
// Timestamp parsing
// ---------------------------------------------------------------------------

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a `Start Time` cell. Date-only values land at midnight. Values with
/// a UTC offset keep their wall-clock time as written.
pub fn parse_start_time(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%z"))
                .ok()
                .map(|dt| dt.naive_local())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn start_time_at(path: &Path, row: usize, raw: Option<&str>) -> Result<NaiveDateTime> {
    let raw = raw.unwrap_or("");
    parse_start_time(raw).ok_or_else(|| DataError::InvalidTimestamp {
        path: path.to_path_buf(),
        row,
        value: raw.to_string(),
    })
}

fn missing_start_time(path: &Path) -> DataError {
    DataError::MissingColumn {
        path: path.to_path_buf(),
        column: START_TIME.to_string(),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, `Start Time` required.
/// Every other column is kept as a typed cell.
fn load_csv(path: &Path) -> Result<TripTable> {
    let csv_err = |source| DataError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let file = std::fs::File::open(path).map_err(|source| DataError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = csv::Reader::from_reader(file);
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let ts_idx = headers
        .iter()
        .position(|h| h == START_TIME)
        .ok_or_else(|| missing_start_time(path))?;

    let mut trips = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(csv_err)?;
        let start_time = start_time_at(path, row_no, record.get(ts_idx))?;

        let mut fields = BTreeMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            if col_idx == ts_idx {
                continue;
            }
            if let Some(col_name) = headers.get(col_idx) {
                fields.insert(col_name.clone(), CellValue::guess(value));
            }
        }

        trips.push(Trip::new(start_time, fields));
    }

    Ok(TripTable::new(headers, trips))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Start Time": "2017-01-02 09:07:57", "Trip Duration": 1039, "User Type": "Subscriber" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<TripTable> {
    let text = std::fs::read_to_string(path).map_err(|source| DataError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let root: JsonValue = serde_json::from_str(&text).map_err(|source| DataError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let records = root.as_array().ok_or_else(|| DataError::NotAnArray {
        path: path.to_path_buf(),
    })?;

    let mut headers: Vec<String> = Vec::new();
    let mut trips = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec.as_object().ok_or_else(|| DataError::NotAnObject {
            path: path.to_path_buf(),
            row: i,
        })?;

        let raw_ts = obj.get(START_TIME).ok_or_else(|| missing_start_time(path))?;
        let start_time = start_time_at(path, i, raw_ts.as_str())?;

        let mut fields = BTreeMap::new();
        for (key, val) in obj {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
            if key == START_TIME {
                continue;
            }
            fields.insert(key.clone(), json_to_cell(val));
        }

        trips.push(Trip::new(start_time, fields));
    }

    if !headers.iter().any(|h| h == START_TIME) {
        headers.insert(0, START_TIME.to_string());
    }
    Ok(TripTable::new(headers, trips))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of trips.
///
/// `Start Time` may be text or an Arrow timestamp/date column. Timestamps
/// with a time zone are read in UTC. Other columns are reduced to the cell
/// types: integer and float widths widen to 64 bits, dictionaries decode to
/// their values, temporal cells become `YYYY-MM-DD HH:MM:SS` text and
/// anything else is cast to text.
fn load_parquet(path: &Path) -> Result<TripTable> {
    let parquet_err = |source| DataError::Parquet {
        path: path.to_path_buf(),
        source,
    };
    let arrow_err = |source| DataError::Arrow {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(|source| DataError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(parquet_err)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().map_err(parquet_err)?;

    let mut trips = Vec::new();
    let mut row_offset = 0;

    for batch_result in reader {
        let batch = batch_result.map_err(arrow_err)?;
        let schema = batch.schema();
        let n_rows = batch.num_rows();

        let ts_idx = schema
            .index_of(START_TIME)
            .map_err(|_| missing_start_time(path))?;
        let ts_col = batch.column(ts_idx);
        let ts_utf8 = if is_temporal(ts_col.data_type()) {
            None
        } else {
            Some(cast(ts_col, &DataType::Utf8).map_err(arrow_err)?)
        };
        let ts_text = ts_utf8.as_ref().map(|a| a.as_string::<i32>());

        let mut other_cols: Vec<(String, ArrayRef)> = Vec::new();
        for (i, field) in schema.fields().iter().enumerate() {
            if i != ts_idx {
                let col = normalize_column(batch.column(i)).map_err(arrow_err)?;
                other_cols.push((field.name().clone(), col));
            }
        }

        for row in 0..n_rows {
            let row_no = row_offset + row;
            let start_time = match ts_text {
                Some(text) => {
                    let raw = (!text.is_null(row)).then(|| text.value(row));
                    start_time_at(path, row_no, raw)?
                }
                None => match datetime_at(ts_col, row) {
                    Some(dt) => dt,
                    None => start_time_at(path, row_no, None)?,
                },
            };

            let mut fields = BTreeMap::new();
            for (col_name, col) in &other_cols {
                fields.insert(col_name.clone(), extract_cell_value(col, row));
            }

            trips.push(Trip::new(start_time, fields));
        }
        row_offset += n_rows;
    }

    Ok(TripTable::new(headers, trips))
}

// -- Parquet / Arrow helpers --

fn is_temporal(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64
    )
}

/// Wall-clock value of a timestamp or date column; `None` for nulls and
/// non-temporal columns.
fn datetime_at(col: &ArrayRef, row: usize) -> Option<NaiveDateTime> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Timestamp(TimeUnit::Second, _) => {
            timestamp_s_to_datetime(col.as_primitive::<TimestampSecondType>().value(row))
        }
        DataType::Timestamp(TimeUnit::Millisecond, _) => {
            timestamp_ms_to_datetime(col.as_primitive::<TimestampMillisecondType>().value(row))
        }
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            timestamp_us_to_datetime(col.as_primitive::<TimestampMicrosecondType>().value(row))
        }
        DataType::Timestamp(TimeUnit::Nanosecond, _) => {
            timestamp_ns_to_datetime(col.as_primitive::<TimestampNanosecondType>().value(row))
        }
        DataType::Date32 => date32_to_datetime(col.as_primitive::<Date32Type>().value(row)),
        DataType::Date64 => date64_to_datetime(col.as_primitive::<Date64Type>().value(row)),
        _ => None,
    }
}

/// Cast a column to one of the types `extract_cell_value` reads.
fn normalize_column(col: &ArrayRef) -> std::result::Result<ArrayRef, ArrowError> {
    match col.data_type() {
        DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Int64
        | DataType::Float64
        | DataType::Boolean => Ok(Arc::clone(col)),
        dt if is_temporal(dt) => Ok(Arc::clone(col)),
        DataType::Dictionary(_, values) => normalize_column(&cast(col, values)?),
        dt if dt.is_integer() => cast(col, &DataType::Int64),
        dt if dt.is_floating() => cast(col, &DataType::Float64),
        _ => cast(col, &DataType::Utf8),
    }
}

/// Extract a single cell from a normalized Arrow column at a given row.
fn extract_cell_value(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map_or(CellValue::Null, |a| CellValue::Integer(a.value(row))),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map_or(CellValue::Null, |a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map_or(CellValue::Null, |a| CellValue::Bool(a.value(row))),
        _ => datetime_at(col, row).map_or(CellValue::Null, |dt| {
            CellValue::String(dt.format("%Y-%m-%d %H:%M:%S").to_string())
        }),
    }
}
