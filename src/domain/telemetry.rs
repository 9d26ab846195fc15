// Telemetry data domain models
use chrono::{DateTime, Duration, FixedOffset};

/// Timestamp layout expected by the export endpoint.
pub const QUERY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One reading as returned by the export endpoint. The reading's own
/// timestamp is only used by the remote side for windowing and is not kept.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub device_id: u32,
    pub longitude: f64,
    pub latitude: f64,
    pub value: f64,
}

impl Record {
    pub fn new(device_id: u32, longitude: f64, latitude: f64, value: f64) -> Self {
        Self {
            device_id,
            longitude,
            latitude,
            value,
        }
    }
}

/// One aggregated point per device per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub device_id: u32,
    pub longitude: f64,
    pub latitude: f64,
    pub value: f64,
}

/// Query window `[after, before)` expressed in the regional offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub after: DateTime<FixedOffset>,
    pub before: DateTime<FixedOffset>,
}

impl TimeWindow {
    /// Window of `length` ending at `now`.
    pub fn ending_at(now: DateTime<FixedOffset>, length: Duration) -> Self {
        Self {
            after: now - length,
            before: now,
        }
    }

    pub fn after_param(&self) -> String {
        self.after.format(QUERY_TIME_FORMAT).to_string()
    }

    pub fn before_param(&self) -> String {
        self.before.format(QUERY_TIME_FORMAT).to_string()
    }
}

/// Collapse a device's window of records into its mean position and value.
///
/// Returns `None` when the window is empty so the device is left off the map.
pub fn aggregate(records: &[Record]) -> Option<Sample> {
    let first = records.first()?;
    let count = records.len() as f64;

    let (lon_sum, lat_sum, value_sum) = records.iter().fold((0.0, 0.0, 0.0), |acc, r| {
        (acc.0 + r.longitude, acc.1 + r.latitude, acc.2 + r.value)
    });

    Some(Sample {
        device_id: first.device_id,
        longitude: lon_sum / count,
        latitude: lat_sum / count,
        value: value_sum / count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_aggregate_empty_is_none() {
        assert_eq!(aggregate(&[]), None);
    }

    #[test]
    fn test_aggregate_single_record_is_identity() {
        let sample = aggregate(&[Record::new(7, 139.7, 35.68, 42.0)]).unwrap();
        assert_eq!(sample.device_id, 7);
        assert!(close(sample.longitude, 139.7));
        assert!(close(sample.latitude, 35.68));
        assert!(close(sample.value, 42.0));
    }

    #[test]
    fn test_aggregate_takes_arithmetic_mean() {
        let records = vec![
            Record::new(3, 139.60, 35.60, 10.0),
            Record::new(3, 139.70, 35.70, 20.0),
            Record::new(3, 139.80, 35.80, 90.0),
        ];
        let sample = aggregate(&records).unwrap();
        assert_eq!(sample.device_id, 3);
        assert!(close(sample.longitude, 139.70));
        assert!(close(sample.latitude, 35.70));
        // Mean, not median: the outlier pulls the value up.
        assert!(close(sample.value, 40.0));
    }

    #[test]
    fn test_window_params() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let now = tokyo.with_ymd_and_hms(2024, 5, 1, 12, 5, 30).unwrap();
        let window = TimeWindow::ending_at(now, Duration::minutes(10));

        assert_eq!(window.after_param(), "2024-05-01 11:55:30");
        assert_eq!(window.before_param(), "2024-05-01 12:05:30");
    }
}
