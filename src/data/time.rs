use thiserror::Error;

/// Why a lap-time string could not be converted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LapTimeError {
    #[error("empty lap time")]
    Empty,
    #[error("field {0:?} is not a non-negative integer")]
    InvalidField(String),
    #[error("{0:?} is not an ISO-8601 duration")]
    InvalidDuration(String),
    #[error("lap time overflows u32 seconds")]
    Overflow,
}

/// Convert `"H:MM:SS"`, `"MM:SS"` or a bare `"SS"` into total seconds.
///
/// Fields are folded most-significant first as `acc * 60 + field`, so
/// `"1:02:03"` is 3723 and `"0:00"` is 0.
pub fn hhmmss_to_seconds(text: &str) -> Result<u32, LapTimeError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(LapTimeError::Empty);
    }

    text.split(':').try_fold(0u32, |acc, field| {
        let field = field.trim();
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(LapTimeError::InvalidField(field.to_string()));
        }
        let value: u32 = field.parse().map_err(|_| LapTimeError::Overflow)?;
        acc.checked_mul(60)
            .and_then(|a| a.checked_add(value))
            .ok_or(LapTimeError::Overflow)
    })
}

/// Convert an ISO-8601 duration such as `"PT01H02M03S"` (the form ODS
/// spreadsheets store time cells in) into total seconds.
///
/// Day, hour, minute and second components are accepted; fractional
/// seconds are rounded to the nearest second.
pub fn iso_duration_to_seconds(text: &str) -> Result<u32, LapTimeError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(LapTimeError::Empty);
    }
    let invalid = || LapTimeError::InvalidDuration(text.to_string());

    let body = text.strip_prefix('P').ok_or_else(invalid)?;
    let (days, time) = match body.split_once('T') {
        Some((days, time)) if !time.is_empty() => (days, time),
        Some(_) => return Err(invalid()),
        None => (body, ""),
    };

    let mut total = 0.0f64;
    let mut components = 0;
    for (mut rest, units) in [
        (days, &[('D', 86_400.0)][..]),
        (time, &[('H', 3_600.0), ('M', 60.0), ('S', 1.0)][..]),
    ] {
        for &(unit, scale) in units {
            let Some((number, tail)) = rest.split_once(unit) else {
                continue;
            };
            if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
                return Err(invalid());
            }
            let value: f64 = number.parse().map_err(|_| invalid())?;
            total += value * scale;
            components += 1;
            rest = tail;
        }
        if !rest.is_empty() {
            return Err(invalid());
        }
    }
    if components == 0 {
        return Err(invalid());
    }

    let seconds = total.round();
    if seconds > u32::MAX as f64 {
        return Err(LapTimeError::Overflow);
    }
    Ok(seconds as u32)
}
