//! Activity vocabulary, calorie estimates and duration formatting.
//!
//! The stores accept any activity type; this catalog is what forms offer and
//! what calorie estimates are keyed on.

use crate::model::Intensity;

/// Activity types with their base calorie burn per minute.
pub const ACTIVITY_TYPES: &[(&str, u32)] = &[
    ("Running", 12),
    ("Walking", 4),
    ("Cycling", 8),
    ("Swimming", 11),
    ("Hiking", 6),
    ("Weightlifting", 6),
    ("Skiing", 10),
    ("Back-country Skiing", 12),
    ("Yoga", 3),
    ("Rock Climbing", 8),
    ("Boxing", 10),
    ("Basketball", 8),
    ("Soccer", 9),
    ("Tennis", 7),
    ("CrossFit", 9),
    ("Pilates", 4),
    ("Dancing", 5),
    ("Martial Arts", 8),
    ("Rowing", 9),
    ("Bodyweight", 4),
    ("Other", 5),
];

const DEFAULT_CALORIES_PER_MINUTE: u32 = 5;

pub fn activity_type_names() -> impl Iterator<Item = &'static str> {
    ACTIVITY_TYPES.iter().map(|(name, _)| *name)
}

pub fn calories_per_minute(activity_type: &str) -> u32 {
    ACTIVITY_TYPES
        .iter()
        .find(|(name, _)| *name == activity_type)
        .map(|(_, kcal)| *kcal)
        .unwrap_or(DEFAULT_CALORIES_PER_MINUTE)
}

/// Rough calorie estimate: base rate x minutes x intensity multiplier, truncated.
pub fn estimate_calories(activity_type: &str, duration: i64, intensity: Intensity) -> i64 {
    let base = calories_per_minute(activity_type) as f64;
    (base * duration as f64 * intensity.calorie_multiplier()) as i64
}

/// `45` -> `45m`, `120` -> `2h`, `90` -> `1h 30m`.
pub fn format_duration(minutes: i64) -> String {
    if minutes < 60 {
        return format!("{}m", minutes);
    }
    let hours = minutes / 60;
    let mins = minutes % 60;
    if mins == 0 {
        format!("{}h", hours)
    } else {
        format!("{}h {}m", hours, mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_types() {
        assert_eq!(calories_per_minute("Running"), 12);
        assert_eq!(calories_per_minute("Underwater Hockey"), 5);
        assert_eq!(activity_type_names().count(), 21);
    }

    #[test]
    fn calorie_estimate_applies_multiplier() {
        assert_eq!(estimate_calories("Running", 30, Intensity::Medium), 360);
        assert_eq!(estimate_calories("Running", 30, Intensity::High), 468);
        assert_eq!(estimate_calories("Yoga", 60, Intensity::Low), 144);
    }

    #[test]
    fn durations_format() {
        assert_eq!(format_duration(45), "45m");
        assert_eq!(format_duration(120), "2h");
        assert_eq!(format_duration(90), "1h 30m");
    }
}
