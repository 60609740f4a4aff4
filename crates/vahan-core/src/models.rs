use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

// ── MonthCode ──────────────────────────────────────────────────────────────────

/// One of the twelve canonical aggregation buckets, `JAN..DEC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MonthCode {
    Jan,
    Feb,
    Mar,
    Apr,
    May,
    Jun,
    Jul,
    Aug,
    Sep,
    Oct,
    Nov,
    Dec,
}

impl MonthCode {
    /// Calendar order.
    pub const ALL: [MonthCode; 12] = [
        MonthCode::Jan,
        MonthCode::Feb,
        MonthCode::Mar,
        MonthCode::Apr,
        MonthCode::May,
        MonthCode::Jun,
        MonthCode::Jul,
        MonthCode::Aug,
        MonthCode::Sep,
        MonthCode::Oct,
        MonthCode::Nov,
        MonthCode::Dec,
    ];

    /// Zero-based position in the calendar year.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Three-letter uppercase code, e.g. `"JAN"`.
    pub fn code(self) -> &'static str {
        match self {
            MonthCode::Jan => "JAN",
            MonthCode::Feb => "FEB",
            MonthCode::Mar => "MAR",
            MonthCode::Apr => "APR",
            MonthCode::May => "MAY",
            MonthCode::Jun => "JUN",
            MonthCode::Jul => "JUL",
            MonthCode::Aug => "AUG",
            MonthCode::Sep => "SEP",
            MonthCode::Oct => "OCT",
            MonthCode::Nov => "NOV",
            MonthCode::Dec => "DEC",
        }
    }

    /// Chart label, e.g. `"Jan"`.
    pub fn short_label(self) -> &'static str {
        match self {
            MonthCode::Jan => "Jan",
            MonthCode::Feb => "Feb",
            MonthCode::Mar => "Mar",
            MonthCode::Apr => "Apr",
            MonthCode::May => "May",
            MonthCode::Jun => "Jun",
            MonthCode::Jul => "Jul",
            MonthCode::Aug => "Aug",
            MonthCode::Sep => "Sep",
            MonthCode::Oct => "Oct",
            MonthCode::Nov => "Nov",
            MonthCode::Dec => "Dec",
        }
    }

    /// Full English month name, e.g. `"January"`.
    pub fn full_label(self) -> &'static str {
        match self {
            MonthCode::Jan => "January",
            MonthCode::Feb => "February",
            MonthCode::Mar => "March",
            MonthCode::Apr => "April",
            MonthCode::May => "May",
            MonthCode::Jun => "June",
            MonthCode::Jul => "July",
            MonthCode::Aug => "August",
            MonthCode::Sep => "September",
            MonthCode::Oct => "October",
            MonthCode::Nov => "November",
            MonthCode::Dec => "December",
        }
    }

    /// Exact, case-sensitive lookup of a three-letter code.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }
}

/// How a stored `monthly_data` key is matched against the canonical codes.
///
/// Per-maker series match the key as stored; cross-record monthly totals
/// uppercase it first, so `"Jan"` only counts towards the latter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonthKeyMatch {
    /// `"JAN"` matches, `"Jan"` does not.
    Exact,
    /// `"Jan"`, `"jan"` and `"JAN"` all match.
    Uppercased,
}

impl MonthKeyMatch {
    /// Map a stored key to its bucket, or `None` when it is not a month code.
    pub fn resolve(self, key: &str) -> Option<MonthCode> {
        match self {
            MonthKeyMatch::Exact => MonthCode::from_code(key),
            MonthKeyMatch::Uppercased => MonthCode::from_code(&key.to_uppercase()),
        }
    }
}

// ── SalesValue ─────────────────────────────────────────────────────────────────

/// A single monthly sales cell as stored in a document.
///
/// Sheets deliver numbers, comma-grouped numeric text, stray text or nothing;
/// all four survive ingestion and are coerced only at aggregation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SalesValue {
    Number(f64),
    Text(String),
    Null,
}

impl From<f64> for SalesValue {
    fn from(value: f64) -> Self {
        SalesValue::Number(value)
    }
}

impl From<&str> for SalesValue {
    fn from(value: &str) -> Self {
        SalesValue::Text(value.to_string())
    }
}

// ── VehicleClass ───────────────────────────────────────────────────────────────

/// The two disjoint record partitions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    /// Electric vehicles. Its collection doubles as the unified collection.
    Ev,
    /// Internal-combustion vehicles.
    Ice,
}

impl VehicleClass {
    pub const ALL: [VehicleClass; 2] = [VehicleClass::Ev, VehicleClass::Ice];

    /// Name of the backing document collection.
    pub fn collection_name(self) -> &'static str {
        match self {
            VehicleClass::Ev => "vehicle_data",
            VehicleClass::Ice => "ICE_data",
        }
    }

    /// Resolve the `type` query parameter: `"ice"` selects ICE, anything else
    /// (including absence) selects the EV collection.
    pub fn from_type_param(param: Option<&str>) -> Self {
        match param {
            Some("ice") => VehicleClass::Ice,
            _ => VehicleClass::Ev,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            VehicleClass::Ev => "EV",
            VehicleClass::Ice => "ICE",
        }
    }
}

impl std::fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── SalesRecord ────────────────────────────────────────────────────────────────

/// One maker's twelve-month sales for a single state and year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    /// Year label; stored documents may carry it as a number.
    #[serde(deserialize_with = "deserialize_year")]
    pub year: String,
    /// State name derived from the source file name.
    pub state: String,
    /// Trimmed manufacturer name.
    pub maker_name: String,
    /// Optional model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Optional fuel description, only read by [`is_electric_record`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_type: Option<String>,
    /// Month label → sales cell.
    #[serde(default)]
    pub monthly_data: BTreeMap<String, SalesValue>,
}

impl SalesRecord {
    pub fn new(
        year: impl Into<String>,
        state: impl Into<String>,
        maker_name: impl Into<String>,
    ) -> Self {
        Self {
            year: year.into(),
            state: state.into(),
            maker_name: maker_name.into(),
            model: None,
            fuel_type: None,
            monthly_data: BTreeMap::new(),
        }
    }

    /// Builder-style insert of one monthly cell.
    pub fn with_month(mut self, key: impl Into<String>, value: impl Into<SalesValue>) -> Self {
        self.monthly_data.insert(key.into(), value.into());
        self
    }

    /// The model name, `"Unknown"` when absent.
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or("Unknown")
    }

    /// Value of a distinct-able field.
    pub fn field(&self, field: RecordField) -> &str {
        match field {
            RecordField::Year => &self.year,
            RecordField::State => &self.state,
            RecordField::MakerName => &self.maker_name,
        }
    }
}

fn deserialize_year<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "year must be a string or number, got {other}"
        ))),
    }
}

/// Record fields that support distinct-value queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Year,
    State,
    MakerName,
}

impl RecordField {
    /// Stored document key.
    pub fn as_str(self) -> &'static str {
        match self {
            RecordField::Year => "year",
            RecordField::State => "state",
            RecordField::MakerName => "maker_name",
        }
    }
}

// ── RecordFilter ───────────────────────────────────────────────────────────────

/// Equality / membership filter over sales records.
///
/// `None` fields match everything. A single maker is an equality test, a
/// list is a membership test.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub year: Option<String>,
    pub state: Option<String>,
    pub makers: Option<Vec<String>>,
    /// Keep only records accepted by [`is_electric_record`].
    pub electric_only: bool,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year(mut self, year: Option<String>) -> Self {
        self.year = year;
        self
    }

    pub fn with_state(mut self, state: Option<String>) -> Self {
        self.state = state;
        self
    }

    pub fn with_maker(mut self, maker: impl Into<String>) -> Self {
        self.makers = Some(vec![maker.into()]);
        self
    }

    pub fn with_makers(mut self, makers: Vec<String>) -> Self {
        self.makers = Some(makers);
        self
    }

    pub fn electric_only(mut self) -> Self {
        self.electric_only = true;
        self
    }

    /// Whether `record` passes every populated criterion.
    pub fn matches(&self, record: &SalesRecord) -> bool {
        if let Some(year) = &self.year {
            if &record.year != year {
                return false;
            }
        }
        if let Some(state) = &self.state {
            if &record.state != state {
                return false;
            }
        }
        if let Some(makers) = &self.makers {
            if !makers.iter().any(|m| m == &record.maker_name) {
                return false;
            }
        }
        if self.electric_only && !is_electric_record(record) {
            return false;
        }
        true
    }
}

// ── EV classification ──────────────────────────────────────────────────────────

/// Manufacturers treated as electric regardless of fuel data.
pub const KNOWN_EV_MAKERS: &[&str] = &[
    "ATHER",
    "OLA",
    "BAJAJ ELECTRIC",
    "HERO ELECTRIC",
    "TVS ELECTRIC",
    "AMPERE",
    "REVOLT",
    "TATA MOTORS",
    "TESLA",
    "MAHINDRA ELECTRIC",
    "BYD",
    "MG MOTOR",
    "HYUNDAI ELECTRIC",
    "KIA ELECTRIC",
    "JAGUAR",
    "AUDI E-TRON",
    "MERCEDES-BENZ EQ",
    "BMW I",
    "PORSCHE TAYCAN",
];

fn electric_maker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)electr|ev|e-|battery|hybrid|plug-in").expect("regex is valid")
    })
}

fn electric_fuel_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)electr|battery|ev").expect("regex is valid"))
}

/// Business rule classifying a record of the unified collection as electric.
///
/// A record qualifies when its maker is on [`KNOWN_EV_MAKERS`] (exact match),
/// when the maker name hints at an electric or hybrid drivetrain, or when the
/// fuel type mentions electric, battery or EV.
pub fn is_electric_record(record: &SalesRecord) -> bool {
    if KNOWN_EV_MAKERS.contains(&record.maker_name.as_str()) {
        return true;
    }
    if electric_maker_pattern().is_match(&record.maker_name) {
        return true;
    }
    record
        .fuel_type
        .as_deref()
        .is_some_and(|fuel| electric_fuel_pattern().is_match(fuel))
}

// ── PinnedChart ────────────────────────────────────────────────────────────────

/// Chart renderers a dashboard snapshot may come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Pie,
    Doughnut,
    Radar,
    PolarArea,
    Bubble,
    Scatter,
}

/// A dashboard snapshot of a rendered chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedChart {
    pub chart_id: String,
    pub title: String,
    #[serde(default)]
    pub chart_type: ChartKind,
    /// Reference to the stored PNG.
    pub image_url: String,
    /// Serialized chart configuration, if the client sent one.
    #[serde(default)]
    pub chart_data: Option<serde_json::Value>,
    /// Endpoint the chart's live data is fetched from.
    #[serde(default)]
    pub data_endpoint: Option<String>,
    pub created_at: DateTime<Utc>,
}
