use serde::Serialize;

/// Delays shorter than this many seconds (either way) count as on time.
pub const ON_TIME_TOLERANCE_SECS: i32 = 30;

/// A trip is significantly delayed when it runs more than this many minutes late.
pub const SIGNIFICANT_DELAY_MINUTES: i32 = 5;

pub const ON_TIME: &str = "On time";

/// Coarse, human-readable view of a delay.
///
/// All three fields come from the same rounded minute count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayClass {
    pub minutes: i32,
    pub description: String,
    pub is_significant: bool,
}

/// Rounds a delay to whole minutes, half-up, with a dead zone of
/// [`ON_TIME_TOLERANCE_SECS`] around zero.
pub fn delay_minutes(delay_seconds: i32) -> i32 {
    if delay_seconds.unsigned_abs() < ON_TIME_TOLERANCE_SECS.unsigned_abs() {
        return 0;
    }
    (f64::from(delay_seconds) / 60.0 + 0.5).floor() as i32
}

pub fn describe_minutes(minutes: i32) -> String {
    match minutes {
        0 => ON_TIME.to_string(),
        m if m > 0 => format!("{m} min delayed"),
        m => format!("{} min early", m.abs()),
    }
}

pub fn classify(delay_seconds: i32) -> DelayClass {
    let minutes = delay_minutes(delay_seconds);
    DelayClass {
        minutes,
        description: describe_minutes(minutes),
        is_significant: minutes > SIGNIFICANT_DELAY_MINUTES,
    }
}
