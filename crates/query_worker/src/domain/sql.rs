use chrono::{Datelike, Utc};

/// Date-partition predicate for one query run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionFilter {
    pub year: String,
    pub month: String,
    pub day: String,
}

impl PartitionFilter {
    /// Current UTC calendar date, zero-padded like the storage layout
    pub fn for_today() -> Self {
        let now = Utc::now();
        Self {
            year: format!("{:04}", now.year()),
            month: format!("{:02}", now.month()),
            day: format!("{:02}", now.day()),
        }
    }
}

/// Build the partition-scoped projection query.
///
/// The Fahrenheit→Celsius conversion happens in the query text; the
/// orchestrator never parses numeric values. Column order matches the
/// positional mapping of `ResultRow`.
pub fn build_partition_query(table: &str, filter: &PartitionFilter) -> String {
    format!(
        "SELECT sensorid, (rawtemperature - 32) * 5 / 9 AS temperaturecelsius, \
         rawhumidity, timestamp, objectkey \
         FROM {} \
         WHERE year = '{}' AND month = '{}' AND day = '{}'",
        table, filter.year, filter.month, filter.day
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_partition_query_scopes_to_partition() {
        let filter = PartitionFilter {
            year: "2025".to_string(),
            month: "02".to_string(),
            day: "10".to_string(),
        };

        let sql = build_partition_query("readings", &filter);

        assert!(sql.contains("FROM readings"));
        assert!(sql.contains("year = '2025'"));
        assert!(sql.contains("month = '02'"));
        assert!(sql.contains("day = '10'"));
    }

    #[test]
    fn test_build_partition_query_projects_five_columns_in_order() {
        let filter = PartitionFilter {
            year: "2025".to_string(),
            month: "02".to_string(),
            day: "10".to_string(),
        };

        let sql = build_partition_query("readings", &filter);

        let sensorid = sql.find("sensorid").unwrap();
        let celsius = sql.find("temperaturecelsius").unwrap();
        let humidity = sql.find("rawhumidity").unwrap();
        let timestamp = sql.find("timestamp").unwrap();
        let objectkey = sql.find("objectkey").unwrap();

        assert!(sensorid < celsius);
        assert!(celsius < humidity);
        assert!(humidity < timestamp);
        assert!(timestamp < objectkey);
    }

    #[test]
    fn test_for_today_is_zero_padded() {
        let filter = PartitionFilter::for_today();

        assert_eq!(filter.year.len(), 4);
        assert_eq!(filter.month.len(), 2);
        assert_eq!(filter.day.len(), 2);
    }
}
