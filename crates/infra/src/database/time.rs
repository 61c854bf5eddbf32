//! Epoch-millisecond conversion for stored timestamps

use chrono::DateTime;
use jobscout_domain::{JobScoutError, Result, Timestamp};

pub(crate) fn to_millis(ts: Timestamp) -> i64 {
    ts.timestamp_millis()
}

pub(crate) fn to_millis_opt(ts: Option<Timestamp>) -> Option<i64> {
    ts.map(to_millis)
}

pub(crate) fn from_millis(millis: i64) -> Result<Timestamp> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| JobScoutError::Database(format!("timestamp {millis}ms out of range")))
}

pub(crate) fn from_millis_opt(millis: Option<i64>) -> Result<Option<Timestamp>> {
    millis.map(from_millis).transpose()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn millisecond_precision_survives() {
        let ts = Utc.timestamp_millis_opt(1_748_781_000_123).unwrap();
        assert_eq!(from_millis(to_millis(ts)).unwrap(), ts);
    }

    #[test]
    fn out_of_range_is_a_database_error() {
        assert!(matches!(from_millis(i64::MAX), Err(JobScoutError::Database(_))));
    }
}
