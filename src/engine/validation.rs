use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::error::AppError;

/// Earliest accepted pickup, in minutes after the request.
pub const MIN_PICKUP_LEAD_MINUTES: i64 = 15;

const PHONE_MIN_DIGITS: usize = 2;
const PHONE_MAX_DIGITS: usize = 15;

pub fn require_non_empty(value: &str, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// International format: `+` then 2 to 15 digits, nothing else.
pub fn validate_phone(phone: &str) -> Result<String, AppError> {
    let phone = phone.trim();
    let valid = phone.strip_prefix('+').is_some_and(|digits| {
        (PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&digits.len())
            && digits.chars().all(|c| c.is_ascii_digit())
    });

    if !valid {
        return Err(AppError::Validation(format!(
            "phone {phone:?} must be in international format, e.g. +966501234567"
        )));
    }
    Ok(phone.to_string())
}

/// Accepts RFC 3339, or a zone-less `YYYY-MM-DDTHH:MM[:SS]` read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::Validation(format!("pickup time {raw:?} is not a valid timestamp")))
}

pub fn validate_pickup_time(raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
    let pickup = parse_timestamp(raw)?;
    if pickup < now + Duration::minutes(MIN_PICKUP_LEAD_MINUTES) {
        return Err(AppError::Validation(format!(
            "pickup time must be at least {MIN_PICKUP_LEAD_MINUTES} minutes from now"
        )));
    }
    Ok(pickup)
}

pub fn validate_price(price: f64) -> Result<f64, AppError> {
    if !price.is_finite() || price <= 0.0 {
        return Err(AppError::Validation(format!(
            "price must be greater than 0, got {price}"
        )));
    }
    Ok(price)
}

pub fn validate_commission(commission: f64) -> Result<f64, AppError> {
    if !commission.is_finite() || commission < 0.0 {
        return Err(AppError::Validation(format!(
            "agent commission cannot be negative, got {commission}"
        )));
    }
    Ok(commission)
}

/// Trims free text; blank becomes `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
