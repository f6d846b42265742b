use chrono::{DateTime, Utc};
use glance_activity::Activity;
use glance_weather::Weather;
use serde::{Deserialize, Serialize};

/// Merged result of one refresh. Both readings are always present, either
/// real or the documented sample values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// When aggregation started
    pub timestamp: DateTime<Utc>,
    pub weather: Weather,
    pub activity: Activity,
}

impl Snapshot {
    /// Fallback readings for both sides
    pub fn sample(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            weather: Weather::sample(),
            activity: Activity::SAMPLE,
        }
    }

    /// True when the readings match, whatever the timestamps
    pub fn same_readings(&self, other: &Snapshot) -> bool {
        self.weather == other.weather && self.activity == other.activity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    #[test]
    fn test_same_readings_ignores_timestamp() {
        let now = Utc::now();
        let a = Snapshot::sample(now);
        let b = Snapshot::sample(now + TimeDelta::seconds(60));
        assert!(a.same_readings(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_sample_uses_both_fallbacks() {
        let snapshot = Snapshot::sample(Utc::now());
        assert!(snapshot.weather.is_sample());
        assert!(snapshot.activity.is_unavailable());
    }
}
