//! # Domain Model
//!
//! The entities shared by both storage backends: [`Activity`], [`WeightEntry`],
//! [`Settings`] and, for the relational backend, [`User`].
//!
//! ## Identity
//!
//! Entities are generic over their identifier. The JSON file store uses random
//! [`Uuid`]s; the relational store uses integer row ids. Ids are assigned when an
//! entity is added and never change afterwards.
//!
//! ## Dates
//!
//! Activity and weight dates are naive local timestamps ([`NaiveDateTime`]),
//! matching what a user types into a form. On disk they are ISO-8601 strings.
//! Reading is lenient so that older data files keep loading:
//!
//! - `2024-05-01T07:30:00` (canonical, written by this crate)
//! - `2024-05-01 07:30:00` and `2024-05-01 07:30:00.123456`
//! - `2024-05-01` (midnight)
//!
//! ## Inputs vs. Records
//!
//! [`NewActivity`] and [`NewWeightEntry`] carry the mutable fields a caller
//! supplies on add/update. The stores validate them (see [`crate::validation`])
//! and attach the id.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::validation::{self, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    pub const ALL: [Intensity; 3] = [Intensity::Low, Intensity::Medium, Intensity::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "Low",
            Intensity::Medium => "Medium",
            Intensity::High => "High",
        }
    }

    /// Numeric score used when averaging intensity: Low=1, Medium=2, High=3.
    pub fn score(&self) -> u8 {
        match self {
            Intensity::Low => 1,
            Intensity::Medium => 2,
            Intensity::High => 3,
        }
    }

    pub fn calorie_multiplier(&self) -> f64 {
        match self {
            Intensity::Low => 0.8,
            Intensity::Medium => 1.0,
            Intensity::High => 1.3,
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intensity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Intensity::Low),
            "medium" => Ok(Intensity::Medium),
            "high" => Ok(Intensity::High),
            _ => Err(ValidationError::InvalidIntensity(s.to_string())),
        }
    }
}

/// A logged workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity<Id = Uuid> {
    pub id: Id,
    #[serde(rename = "type")]
    pub activity_type: String,
    /// Minutes, `1..=1440`.
    pub duration: i64,
    pub intensity: Intensity,
    #[serde(with = "date_format")]
    pub date: NaiveDateTime,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub description: Option<String>,
    /// Primary physiological goal (e.g. "Endurance"). Descriptive only.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub adaptation: Option<String>,
}

impl<Id> Activity<Id> {
    /// Replaces every mutable field, keeping the id.
    pub fn apply(&mut self, update: &NewActivity) {
        self.activity_type = update.activity_type.clone();
        self.duration = update.duration;
        self.intensity = update.intensity;
        self.date = update.date;
        self.description = update.description.clone();
        self.adaptation = update.adaptation.clone();
    }
}

/// Caller-supplied fields for adding or updating an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewActivity {
    #[serde(rename = "type")]
    pub activity_type: String,
    pub duration: i64,
    pub intensity: Intensity,
    #[serde(with = "date_format")]
    pub date: NaiveDateTime,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub adaptation: Option<String>,
}

impl NewActivity {
    pub fn new(
        activity_type: impl Into<String>,
        duration: i64,
        intensity: Intensity,
        date: NaiveDateTime,
    ) -> Self {
        Self {
            activity_type: activity_type.into(),
            duration,
            intensity,
            date,
            description: None,
            adaptation: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_adaptation(mut self, adaptation: impl Into<String>) -> Self {
        self.adaptation = Some(adaptation.into());
        self
    }

    /// Empty description or adaptation stored as absent, which is how every
    /// backend reads them back.
    pub fn normalized(&self) -> NewActivity {
        let mut activity = self.clone();
        activity.description = activity.description.filter(|s| !s.is_empty());
        activity.adaptation = activity.adaptation.filter(|s| !s.is_empty());
        activity
    }

    pub fn into_activity<Id>(self, id: Id) -> Activity<Id> {
        Activity {
            id,
            activity_type: self.activity_type,
            duration: self.duration,
            intensity: self.intensity,
            date: self.date,
            description: self.description,
            adaptation: self.adaptation,
        }
    }
}

/// A body-weight measurement in kilograms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry<Id = Uuid> {
    pub id: Id,
    pub weight: f64,
    #[serde(with = "date_format")]
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NewWeightEntry {
    pub weight: f64,
    #[serde(with = "date_format")]
    pub date: NaiveDateTime,
}

impl NewWeightEntry {
    pub fn new(weight: f64, date: NaiveDateTime) -> Self {
        Self { weight, date }
    }
}

/// The settings document of the file store.
///
/// Keys other than `weight_goal` are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub weight_goal: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An account in the relational store. Credentials never leave the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub weight_goal: Option<f64>,
    pub preferred_language: String,
    pub dark_mode: bool,
    pub created_at: DateTime<Utc>,
}

/// A single whitelisted preference change.
#[derive(Debug, Clone, PartialEq)]
pub enum PreferenceUpdate {
    Language(String),
    DarkMode(bool),
    WeightGoal(Option<f64>),
}

impl PreferenceUpdate {
    /// Parses a `key = value` pair coming from a form or the command line.
    ///
    /// Only `preferred_language`, `dark_mode` and `weight_goal` are accepted.
    /// An empty value (or `none`) clears the weight goal.
    pub fn parse(key: &str, value: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidPreferenceValue {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            "preferred_language" | "language" => {
                validation::validate_language(value)?;
                Ok(PreferenceUpdate::Language(value.to_string()))
            }
            "dark_mode" | "theme" => match value.to_ascii_lowercase().as_str() {
                "true" | "dark" | "on" | "1" => Ok(PreferenceUpdate::DarkMode(true)),
                "false" | "light" | "off" | "0" => Ok(PreferenceUpdate::DarkMode(false)),
                _ => Err(invalid()),
            },
            "weight_goal" => {
                let trimmed = value.trim();
                if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
                    return Ok(PreferenceUpdate::WeightGoal(None));
                }
                let goal: f64 = trimmed.parse().map_err(|_| invalid())?;
                validation::validate_weight(goal)?;
                Ok(PreferenceUpdate::WeightGoal(Some(goal)))
            }
            other => Err(ValidationError::UnknownPreference(other.to_string())),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            PreferenceUpdate::Language(lang) => validation::validate_language(lang),
            PreferenceUpdate::DarkMode(_) => Ok(()),
            PreferenceUpdate::WeightGoal(goal) => validation::validate_weight_goal(*goal),
        }
    }
}

/// An activity in a friend's feed, tagged with its owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FriendActivity {
    pub username: String,
    pub activity: Activity<i64>,
}

/// Count, total and mean duration over a set of activities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ActivityStats {
    pub total_activities: u64,
    pub total_duration: i64,
    /// Mean duration in minutes, rounded to one decimal.
    pub avg_duration: f64,
}

impl ActivityStats {
    pub fn from_activities<Id>(activities: &[Activity<Id>]) -> Self {
        if activities.is_empty() {
            return Self::default();
        }
        let total_duration: i64 = activities.iter().map(|a| a.duration).sum();
        let count = activities.len() as u64;
        Self {
            total_activities: count,
            total_duration,
            avg_duration: round_one_decimal(total_duration as f64 / count as f64),
        }
    }
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Parses the date formats accepted by the stores (see module docs).
pub fn parse_datetime(input: &str) -> Result<NaiveDateTime, ValidationError> {
    let s = input.trim();
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    // Timestamps carrying an offset are reduced to their local wall time.
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ValidationError::InvalidDate(input.to_string()))
}

pub mod date_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn serialize<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_datetime(&raw).map_err(serde::de::Error::custom)
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn intensity_parses_case_insensitively() {
        assert_eq!("high".parse::<Intensity>().unwrap(), Intensity::High);
        assert_eq!(" Medium ".parse::<Intensity>().unwrap(), Intensity::Medium);
        assert!("extreme".parse::<Intensity>().is_err());
        assert_eq!(Intensity::Low.score(), 1);
        assert_eq!(Intensity::High.to_string(), "High");
    }

    #[test]
    fn normalized_drops_empty_text_only() {
        let date = at(2024, 5, 1, 7, 30);
        let blank = NewActivity::new("Running", 30, Intensity::Low, date)
            .with_description("")
            .with_adaptation("");
        let normalized = blank.normalized();
        assert_eq!(normalized.description, None);
        assert_eq!(normalized.adaptation, None);

        let kept = NewActivity::new("Running", 30, Intensity::Low, date).with_description(" ");
        assert_eq!(kept.normalized(), kept);
    }

    #[test]
    fn parse_datetime_accepts_legacy_formats() {
        let expected = at(2024, 5, 1, 7, 30);
        assert_eq!(parse_datetime("2024-05-01T07:30:00").unwrap(), expected);
        assert_eq!(parse_datetime("2024-05-01 07:30:00").unwrap(), expected);
        assert_eq!(parse_datetime("2024-05-01 07:30").unwrap(), expected);
        assert_eq!(
            parse_datetime("2024-05-01").unwrap(),
            at(2024, 5, 1, 0, 0)
        );
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn parse_datetime_keeps_fractional_seconds() {
        use chrono::Timelike;
        let dt = parse_datetime("2024-05-01 07:30:00.250000").unwrap();
        assert_eq!(dt.nanosecond(), 250_000_000);
    }

    #[test]
    fn activity_json_uses_type_key_and_iso_date() {
        let activity = NewActivity::new("Running", 30, Intensity::Medium, at(2024, 5, 1, 7, 30))
            .into_activity(Uuid::nil());
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "Running");
        assert_eq!(json["date"], "2024-05-01T07:30:00");
        assert_eq!(json["intensity"], "Medium");
    }

    #[test]
    fn legacy_activity_without_adaptation_loads() {
        let raw = r#"{"id":"00000000-0000-0000-0000-000000000000","type":"Yoga",
            "duration":45,"intensity":"Low","date":"2024-05-01 18:00:00","description":""}"#;
        let activity: Activity = serde_json::from_str(raw).unwrap();
        assert_eq!(activity.adaptation, None);
        assert_eq!(activity.description, None);
        assert_eq!(activity.date, at(2024, 5, 1, 18, 0));
    }

    #[test]
    fn apply_replaces_fields_but_keeps_id() {
        let mut activity = NewActivity::new("Running", 30, Intensity::Low, at(2024, 5, 1, 7, 0))
            .into_activity(7_i64);
        let update = NewActivity::new("Cycling", 90, Intensity::High, at(2024, 5, 2, 8, 0))
            .with_description("hills");
        activity.apply(&update);
        assert_eq!(activity.id, 7);
        assert_eq!(activity.activity_type, "Cycling");
        assert_eq!(activity.duration, 90);
        assert_eq!(activity.description.as_deref(), Some("hills"));
    }

    #[test]
    fn settings_keep_unknown_keys() {
        let raw = r#"{"weight_goal": 70.5, "units": "kg"}"#;
        let settings: Settings = serde_json::from_str(raw).unwrap();
        assert_eq!(settings.weight_goal, Some(70.5));
        let back = serde_json::to_value(&settings).unwrap();
        assert_eq!(back["units"], "kg");
    }

    #[test]
    fn preference_parse_whitelists_keys() {
        assert_eq!(
            PreferenceUpdate::parse("dark_mode", "true").unwrap(),
            PreferenceUpdate::DarkMode(true)
        );
        assert_eq!(
            PreferenceUpdate::parse("weight_goal", "none").unwrap(),
            PreferenceUpdate::WeightGoal(None)
        );
        assert_eq!(
            PreferenceUpdate::parse("password_hash", "x"),
            Err(ValidationError::UnknownPreference("password_hash".into()))
        );
        assert!(PreferenceUpdate::parse("preferred_language", "de").is_err());
        assert!(PreferenceUpdate::parse("weight_goal", "heavy").is_err());
    }

    #[test]
    fn stats_from_activities() {
        let date = at(2024, 5, 1, 7, 0);
        let activities: Vec<Activity<i64>> = [30, 45, 50]
            .iter()
            .enumerate()
            .map(|(i, d)| {
                NewActivity::new("Running", *d, Intensity::Low, date).into_activity(i as i64)
            })
            .collect();
        let stats = ActivityStats::from_activities(&activities);
        assert_eq!(stats.total_activities, 3);
        assert_eq!(stats.total_duration, 125);
        assert_eq!(stats.avg_duration, 41.7);
        assert_eq!(
            ActivityStats::from_activities::<i64>(&[]),
            ActivityStats::default()
        );
    }
}
