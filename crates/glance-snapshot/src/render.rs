//! Text formatting for the widget line and the interactive view.

use chrono::Local;
use glance_activity::Activity;
use glance_core::DisplayConfig;

use crate::aggregator::SnapshotReport;
use crate::scheduler::SnapshotSink;
use crate::types::Snapshot;

/// Shown in place of a count when activity data is unavailable
pub const UNAVAILABLE: &str = "--";

#[derive(Debug, Clone)]
pub struct Formatter {
    separator: String,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::from_config(&DisplayConfig::default())
    }
}

impl Formatter {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }

    pub fn from_config(config: &DisplayConfig) -> Self {
        Self::new(config.grouping_separator.clone())
    }

    /// Insert the separator between each group of three digits.
    pub fn group(&self, value: i64) -> String {
        let digits = value.unsigned_abs().to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);

        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push_str(&self.separator);
            }
            out.push(ch);
        }

        if value < 0 {
            out.insert(0, '-');
        }
        out
    }

    /// Steps and calories as displayed, in that order.
    ///
    /// Large values drop grouping so the line stays narrow: five-digit steps
    /// are never grouped, and calories lose grouping only alongside them.
    pub fn activity_strings(&self, activity: &Activity) -> (String, String) {
        if activity.is_unavailable() {
            return (UNAVAILABLE.to_string(), UNAVAILABLE.to_string());
        }

        let Activity { steps, calories } = *activity;
        if steps > 9999 && calories > 999 {
            (steps.to_string(), calories.to_string())
        } else if steps > 9999 {
            (steps.to_string(), self.group(calories))
        } else {
            (self.group(steps), self.group(calories))
        }
    }

    /// Whole degrees, truncated toward zero.
    pub fn temperature(&self, celsius: f64) -> String {
        format!("{}°", celsius.trunc() as i64)
    }

    pub fn widget_line(&self, snapshot: &Snapshot) -> String {
        let (steps, calories) = self.activity_strings(&snapshot.activity);
        format!(
            "✦ {} ·🏃{} · {} {}",
            calories,
            steps,
            self.temperature(snapshot.weather.temperature_celsius),
            snapshot.weather.display_icon.glyph()
        )
    }

    /// Multi-line view with the raw provider code and any branch errors.
    pub fn detail_lines(&self, report: &SnapshotReport) -> Vec<String> {
        let mut lines = Vec::with_capacity(4);

        match &report.weather {
            Ok(weather) => lines.push(format!(
                "Weather: {} ({}) {}",
                weather.display_icon.glyph(),
                weather.provider_icon,
                self.temperature(weather.temperature_celsius)
            )),
            Err(e) => lines.push(format!("Weather: {} ({})", e.user_message(), e)),
        }

        match &report.activity {
            Ok(activity) => {
                let (steps, calories) = self.activity_strings(activity);
                lines.push(format!("Steps: {}", steps));
                lines.push(format!("Calories: {} kcal", calories));
            }
            Err(e) => lines.push(format!("Activity: {} ({})", e.user_message(), e)),
        }

        lines.push(format!(
            "Last update: {}",
            report
                .timestamp
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
        ));
        lines
    }
}

/// Prints each refresh to stdout.
///
/// The widget form prints one line; the detailed form prints the interactive
/// block, including branch errors.
pub struct TerminalSink {
    formatter: Formatter,
    detailed: bool,
}

impl TerminalSink {
    pub fn widget(formatter: Formatter) -> Self {
        Self {
            formatter,
            detailed: false,
        }
    }

    pub fn detailed(formatter: Formatter) -> Self {
        Self {
            formatter,
            detailed: true,
        }
    }
}

impl SnapshotSink for TerminalSink {
    fn publish(&self, snapshot: Snapshot) {
        let line = self.formatter.widget_line(&snapshot);
        tracing::debug!(timestamp = %snapshot.timestamp, "Publishing snapshot");
        println!("{}", line);
    }

    fn publish_report(&self, report: SnapshotReport) {
        if !self.detailed {
            self.publish(report.into_snapshot());
            return;
        }

        let lines = self.formatter.detail_lines(&report);
        // Logs a warning for each failed branch.
        let snapshot = report.into_snapshot();
        tracing::debug!(timestamp = %snapshot.timestamp, "Publishing report");

        for line in lines {
            println!("{}", line);
        }
        println!();
    }
}
