//! # Input Validation
//!
//! Every bound the stores enforce lives here, and both the JSON file store and
//! the relational store call into this module before touching persisted state.
//! A rejected input never produces a partial write.
//!
//! | Rule | Bound |
//! |------|-------|
//! | Activity duration | `1..=1440` minutes |
//! | Body weight (and weight goal) | `20.0..=500.0` kg |
//! | Activity description | at most 500 characters |
//! | Username | `3..=50` characters |
//! | Password | at least 6 characters |
//! | Preferred language | `en` or `fr` |

use crate::model::{NewActivity, NewWeightEntry};
use std::ops::RangeInclusive;
use thiserror::Error;

pub const DURATION_MINUTES: RangeInclusive<i64> = 1..=1440;
pub const WEIGHT_KG: RangeInclusive<f64> = 20.0..=500.0;
pub const MAX_DESCRIPTION_LEN: usize = 500;
pub const USERNAME_LEN: RangeInclusive<usize> = 3..=50;
pub const MIN_PASSWORD_LEN: usize = 6;
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "fr"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("duration must be between 1 and 1440 minutes, got {0}")]
    DurationOutOfRange(i64),

    #[error("weight must be between 20 and 500 kg, got {0}")]
    WeightOutOfRange(f64),

    #[error("description must be at most 500 characters, got {0}")]
    DescriptionTooLong(usize),

    #[error("invalid intensity '{0}' (expected Low, Medium or High)")]
    InvalidIntensity(String),

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("username must be between 3 and 50 characters, got {0}")]
    UsernameLength(usize),

    #[error("password must be at least 6 characters")]
    PasswordTooShort,

    #[error("unknown preference '{0}'")]
    UnknownPreference(String),

    #[error("invalid value '{value}' for preference '{key}'")]
    InvalidPreferenceValue { key: String, value: String },

    #[error("unsupported language '{0}'")]
    UnsupportedLanguage(String),

    #[error("cannot add yourself as a friend")]
    SelfFriendship,
}

pub fn validate_duration(minutes: i64) -> Result<(), ValidationError> {
    if DURATION_MINUTES.contains(&minutes) {
        Ok(())
    } else {
        Err(ValidationError::DurationOutOfRange(minutes))
    }
}

pub fn validate_weight(kg: f64) -> Result<(), ValidationError> {
    // NaN fails `contains`, so it is rejected along with out-of-range values.
    if WEIGHT_KG.contains(&kg) {
        Ok(())
    } else {
        Err(ValidationError::WeightOutOfRange(kg))
    }
}

pub fn validate_description(description: Option<&str>) -> Result<(), ValidationError> {
    let len = description.map(|d| d.chars().count()).unwrap_or(0);
    if len > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::DescriptionTooLong(len));
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let len = username.chars().count();
    if USERNAME_LEN.contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::UsernameLength(len))
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

pub fn validate_language(language: &str) -> Result<(), ValidationError> {
    if SUPPORTED_LANGUAGES.contains(&language) {
        Ok(())
    } else {
        Err(ValidationError::UnsupportedLanguage(language.to_string()))
    }
}

/// Checks an activity before it is persisted.
///
/// The activity type is free-form but must be present (non-blank).
pub fn validate_activity(activity: &NewActivity) -> Result<(), ValidationError> {
    if activity.activity_type.trim().is_empty() {
        return Err(ValidationError::MissingField("type"));
    }
    validate_duration(activity.duration)?;
    validate_description(activity.description.as_deref())
}

pub fn validate_weight_entry(entry: &NewWeightEntry) -> Result<(), ValidationError> {
    validate_weight(entry.weight)
}

/// A weight goal may be cleared (`None`); a set goal obeys the weight bound.
pub fn validate_weight_goal(goal: Option<f64>) -> Result<(), ValidationError> {
    match goal {
        Some(kg) => validate_weight(kg),
        None => Ok(()),
    }
}
