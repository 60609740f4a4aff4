use serde::{Deserialize, Deserializer};
use vahan_core::models::{RecordFilter, VehicleClass};
use vahan_core::{Result, VahanError};
use vahan_runtime::engine::DEFAULT_RECORD_LIMIT;

/// Query parameters shared by the API routes. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SalesQuery {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub maker: Option<String>,
    /// Comma-separated maker names.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub makers: Option<String>,
    #[serde(default, rename = "type", deserialize_with = "empty_as_none")]
    pub vehicle_type: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()))
}

impl SalesQuery {
    /// Filter on `year` only.
    pub fn year_filter(&self) -> RecordFilter {
        RecordFilter::new().with_year(self.year.clone())
    }

    /// Filter on `year` and `state`.
    pub fn year_state_filter(&self) -> RecordFilter {
        self.year_filter().with_state(self.state.clone())
    }

    /// Collection selected by `type`; anything but `ice` reads EV.
    pub fn class(&self) -> VehicleClass {
        VehicleClass::from_type_param(self.vehicle_type.as_deref())
    }

    /// `type=ev` narrows the unified collection to electric records.
    pub fn wants_electric_only(&self) -> bool {
        self.vehicle_type.as_deref() == Some("ev")
    }

    pub fn required_maker(&self) -> Result<&str> {
        self.maker
            .as_deref()
            .ok_or_else(|| VahanError::MissingParameter("Maker".into()))
    }

    /// Maker names split on `,`, kept verbatim.
    pub fn maker_list(&self) -> Option<Vec<String>> {
        self.makers
            .as_deref()
            .map(|makers| makers.split(',').map(str::to_string).collect())
    }

    pub fn required_makers(&self) -> Result<Vec<String>> {
        self.maker_list()
            .ok_or_else(|| VahanError::MissingParameter("Makers".into()))
    }

    /// Record limit for `/api/data`: 0 means unlimited, garbage falls back to
    /// the default.
    pub fn record_limit(&self) -> usize {
        self.limit
            .as_deref()
            .and_then(|limit| limit.trim().parse().ok())
            .unwrap_or(DEFAULT_RECORD_LIMIT)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
