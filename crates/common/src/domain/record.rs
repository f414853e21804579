use serde::{Deserialize, Serialize};
use tracing::warn;

/// One sensor reading as accepted at the ingress edge.
///
/// The `object_key` is absent on arrival and injected exactly once by the
/// ingest service when the batch's storage location is derived. It is
/// carried through the query results so every delivered row can be traced
/// back to the object it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorRecord {
    pub sensor_id: String,
    pub raw_temperature: f64,
    pub raw_humidity: f64,
    /// ISO-8601 timestamp, kept as text end to end
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
}

/// Number of columns in the fixed result projection
pub const RESULT_COLUMNS: usize = 5;

/// One row of the query's fixed 5-column projection.
///
/// All cells are opaque text at this layer; no numeric parsing happens
/// here. Missing cells stay `None` rather than failing the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRow {
    pub sensor_id: Option<String>,
    pub temperature_celsius: Option<String>,
    pub raw_humidity: Option<String>,
    pub timestamp: Option<String>,
    pub object_key: Option<String>,
}

impl ResultRow {
    /// Map a fetched row into the projection strictly by position.
    ///
    /// Rows shorter than the projection are tolerated: the missing trailing
    /// columns stay `None` and a warning is emitted so schema drift is
    /// visible without dropping data.
    pub fn from_cells(mut cells: Vec<Option<String>>) -> Self {
        if cells.len() < RESULT_COLUMNS {
            warn!(
                columns = cells.len(),
                expected = RESULT_COLUMNS,
                "result row is short, missing columns default to null"
            );
        }
        cells.resize(RESULT_COLUMNS, None);
        let mut cells = cells.into_iter();
        Self {
            sensor_id: cells.next().flatten(),
            temperature_celsius: cells.next().flatten(),
            raw_humidity: cells.next().flatten(),
            timestamp: cells.next().flatten(),
            object_key: cells.next().flatten(),
        }
    }
}
