use chrono::{DateTime, Datelike, Utc};
use common::SensorRecord;
use uuid::Uuid;

/// Date bucket a batch is stored under.
///
/// Rendered into the object key as `year=YYYY/month=MM/day=DD` so the query
/// engine can prune scanned objects by calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionKey {
    pub year: String,
    pub month: String,
    pub day: String,
}

impl PartitionKey {
    pub fn from_date(date: DateTime<Utc>) -> Self {
        Self {
            year: format!("{:04}", date.year()),
            month: format!("{:02}", date.month()),
            day: format!("{:02}", date.day()),
        }
    }

    /// Parse an ISO-8601 timestamp into its UTC calendar date
    pub fn from_timestamp(timestamp: &str) -> Option<Self> {
        DateTime::parse_from_rfc3339(timestamp)
            .ok()
            .map(|dt| Self::from_date(dt.with_timezone(&Utc)))
    }

    pub fn for_today() -> Self {
        Self::from_date(Utc::now())
    }
}

/// Storage location of one ingested batch: a date partition plus a
/// batch-unique identifier.
#[derive(Debug, Clone)]
pub struct BatchLocation {
    pub partition: PartitionKey,
    pub batch_id: String,
}

impl BatchLocation {
    /// Derive the location for a batch of records.
    ///
    /// The partition date comes from the FIRST record's timestamp only.
    /// Records 2..N never influence the bucket, even when their timestamps
    /// fall on another date; downstream partition pruning relies on one
    /// partition per stored object. An empty batch or an unparsable first
    /// timestamp falls back to the current UTC date.
    pub fn derive(records: &[SensorRecord]) -> Self {
        let partition = records
            .first()
            .and_then(|record| PartitionKey::from_timestamp(&record.timestamp))
            .unwrap_or_else(PartitionKey::for_today);

        Self {
            partition,
            batch_id: Uuid::new_v4().to_string(),
        }
    }

    /// Render the full object key for this batch
    pub fn object_key(&self) -> String {
        format!(
            "raw/year={}/month={}/day={}/{}.json",
            self.partition.year, self.partition.month, self.partition.day, self.batch_id
        )
    }
}
