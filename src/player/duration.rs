use thiserror::Error;

/// 59:59, the widest value an `MM:SS` field holds.
pub const DEFAULT_MAX_SECONDS: u64 = 59 * 60 + 59;

#[derive(Debug, Error, PartialEq)]
pub enum DurationError {
    #[error("duration cannot be negative: {0}")]
    Negative(f64),
    #[error("duration is not a finite number")]
    NotFinite,
}

/// `MM:SS`, clamped at 59:59.
pub fn format_duration(seconds: f64) -> Result<String, DurationError> {
    format_duration_with(seconds, Some(DEFAULT_MAX_SECONDS))
}

/// `HH:MM:SS` with no ceiling, for whole-queue lengths.
pub fn format_duration_unbounded(seconds: f64) -> Result<String, DurationError> {
    format_duration_with(seconds, None)
}

/// `max` of `None` switches to the unbounded `HH:MM:SS` form.
pub fn format_duration_with(seconds: f64, max: Option<u64>) -> Result<String, DurationError> {
    if !seconds.is_finite() {
        return Err(DurationError::NotFinite);
    }
    if seconds < 0.0 {
        return Err(DurationError::Negative(seconds));
    }
    // Saturating float cast, absurd inputs land on u64::MAX and get clamped
    let whole = seconds.floor() as u64;

    Ok(match max {
        Some(max) => {
            let clamped = whole.min(max);
            format!("{:02}:{:02}", clamped / 60, clamped % 60)
        }
        None => format!(
            "{:02}:{:02}:{:02}",
            whole / 3600,
            (whole % 3600) / 60,
            whole % 60
        ),
    })
}
