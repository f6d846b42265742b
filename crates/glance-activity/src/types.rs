use chrono::{DateTime, Local, LocalResult, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Today's totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub steps: i64,
    pub calories: i64,
}

impl Activity {
    /// Shown when activity can't be read. Distinct from a real zero reading.
    pub const SAMPLE: Activity = Activity {
        steps: -1,
        calories: -1,
    };

    pub fn is_unavailable(&self) -> bool {
        *self == Self::SAMPLE
    }
}

/// Health metrics queried for the totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    StepCount,
    ActiveEnergyBurned,
}

impl Metric {
    pub const ALL: [Metric; 2] = [Metric::StepCount, Metric::ActiveEnergyBurned];

    pub fn name(&self) -> &'static str {
        match self {
            Self::StepCount => "step_count",
            Self::ActiveEnergyBurned => "active_energy_burned",
        }
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Count,
    /// Large calorie (kcal)
    Kilocalorie,
    /// Small calorie
    Calorie,
    Kilojoule,
}

const KILOJOULES_PER_KILOCALORIE: f64 = 4.184;

/// A measured amount in the unit the store reported it in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Value as a plain count, if this is a count quantity
    pub fn to_count(&self) -> Option<f64> {
        match self.unit {
            Unit::Count => Some(self.value),
            _ => None,
        }
    }

    /// Value in large calories, if this is an energy quantity
    pub fn to_kilocalories(&self) -> Option<f64> {
        match self.unit {
            Unit::Count => None,
            Unit::Kilocalorie => Some(self.value),
            Unit::Calorie => Some(self.value / 1000.0),
            Unit::Kilojoule => Some(self.value / KILOJOULES_PER_KILOCALORIE),
        }
    }
}

/// The local calendar day, from midnight to 23:59:59, as UTC instants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DayWindow {
    /// Window for the current local day
    pub fn today() -> Self {
        Self::containing(&Local::now())
    }

    /// Window for the calendar day `now` falls on, in `now`'s time zone
    pub fn containing<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let midnight = now.date_naive().and_time(NaiveTime::MIN);
        let last_second = midnight + TimeDelta::seconds(24 * 60 * 60 - 1);

        Self {
            start: resolve_local(&tz, midnight),
            end: resolve_local(&tz, last_second),
        }
    }

    /// Inclusive at both ends
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(t) => t.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => first_after_gap(tz, naive),
    }
}

/// First local instant after a DST gap that swallowed `naive`.
fn first_after_gap<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    let mut candidate = naive;
    for _ in 0..MAX_GAP_MINUTES {
        candidate += TimeDelta::minutes(1);
        if let Some(t) = tz.from_local_datetime(&candidate).earliest() {
            return t.with_timezone(&Utc);
        }
    }
    // No real zone skips this much; read the wall clock as UTC.
    naive.and_utc()
}

const MAX_GAP_MINUTES: u32 = 24 * 60;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_window_in_positive_offset() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 3, 10, 15, 30, 0).unwrap();

        let window = DayWindow::containing(&now);

        assert_eq!(window.start, utc("2024-03-09T22:00:00Z"));
        assert_eq!(window.end, utc("2024-03-10T21:59:59Z"));
    }

    #[test]
    fn test_window_just_after_midnight() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 7, 1, 0, 0, 1).unwrap();

        let window = DayWindow::containing(&now);

        assert_eq!(window.start, utc("2024-07-01T05:00:00Z"));
        assert_eq!(window.end, utc("2024-07-02T04:59:59Z"));
        assert!(window.contains(now.with_timezone(&Utc)));
    }

    #[test]
    fn test_window_on_day_without_midnight() {
        // Chile moves clocks from 00:00 to 01:00 on 2024-09-08.
        let tz = chrono_tz::America::Santiago;
        let now = tz.with_ymd_and_hms(2024, 9, 8, 12, 0, 0).unwrap();

        let window = DayWindow::containing(&now);

        assert_eq!(window.start, utc("2024-09-08T04:00:00Z"));
        assert_eq!(window.start.with_timezone(&tz).date_naive(), now.date_naive());
        assert_eq!(window.end, utc("2024-09-09T02:59:59Z"));
        assert!(!window.contains(utc("2024-09-08T03:59:59Z")));
    }

    #[test]
    fn test_window_on_day_with_repeated_hour() {
        // Chile repeats the hour before midnight on 2024-04-06.
        let tz = chrono_tz::America::Santiago;
        let now = tz.with_ymd_and_hms(2024, 4, 6, 12, 0, 0).unwrap();

        let window = DayWindow::containing(&now);

        assert_eq!(window.start, utc("2024-04-06T03:00:00Z"));
        assert_eq!(window.start.with_timezone(&tz).date_naive(), now.date_naive());
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let window = DayWindow::containing(&now);

        assert!(window.contains(utc("2024-01-01T00:00:00Z")));
        assert!(window.contains(utc("2024-01-01T23:59:59Z")));
        assert!(!window.contains(utc("2024-01-02T00:00:00Z")));
        assert!(!window.contains(utc("2023-12-31T23:59:59Z")));
    }

    #[test]
    fn test_energy_conversion() {
        assert_eq!(Quantity::new(250.0, Unit::Kilocalorie).to_kilocalories(), Some(250.0));
        let from_kj = Quantity::new(4184.0, Unit::Kilojoule).to_kilocalories().unwrap();
        assert!((from_kj - 1000.0).abs() < 1e-9);
        assert_eq!(Quantity::new(12_000.0, Unit::Calorie).to_kilocalories(), Some(12.0));
        assert_eq!(Quantity::new(10.0, Unit::Count).to_kilocalories(), None);
    }

    #[test]
    fn test_count_conversion() {
        assert_eq!(Quantity::new(8000.0, Unit::Count).to_count(), Some(8000.0));
        assert_eq!(Quantity::new(8000.0, Unit::Kilojoule).to_count(), None);
    }

    #[test]
    fn test_sample_is_unavailable() {
        assert!(Activity::SAMPLE.is_unavailable());
        assert!(!Activity { steps: 0, calories: 0 }.is_unavailable());
    }

    #[test]
    fn test_metric_names() {
        assert_eq!(Metric::StepCount.to_string(), "step_count");
        assert_eq!(
            serde_json::to_string(&Metric::ActiveEnergyBurned).unwrap(),
            "\"active_energy_burned\""
        );
    }
}
