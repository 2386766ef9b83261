use crate::error::AppError;

/// Parses a duration with an optional unit (s, m, h) into seconds
pub fn parse_time(time_str: &str) -> Result<f64, AppError> {
    let time_str = time_str.trim();
    if time_str.is_empty() {
        return Err(AppError::ParseError("Invalid format: empty string".to_string()));
    }

    if let Ok(seconds) = time_str.parse::<f64>() {
        return Ok(seconds);
    }

    let split_index = time_str
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .map(|(i, _)| i)
        .unwrap_or(time_str.len());

    let value = time_str[..split_index]
        .parse::<f64>()
        .map_err(|_| AppError::ParseError(format!("Invalid number in '{time_str}'")))?;

    match time_str[split_index..].trim().to_lowercase().as_str() {
        "s" => Ok(value),
        "m" => Ok(value * 60.0),
        "h" => Ok(value * 3600.0),
        unit => Err(AppError::ParseError(format!("Invalid unit '{unit}'"))),
    }
}

/// Convert seconds to a human-readable format
pub fn format_duration(seconds: f64) -> String {
    if seconds >= 3600.0 {
        format!("{:.2}h", seconds / 3600.0)
    } else if seconds >= 60.0 {
        format!("{:.2}m", seconds / 60.0)
    } else {
        format!("{seconds:.2}s")
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("0").unwrap(), 0.0);
        assert_eq!(parse_time("90").unwrap(), 90.0);
        assert_eq!(parse_time("90s").unwrap(), 90.0);
        assert_eq!(parse_time("30m").unwrap(), 1800.0);
        assert_eq!(parse_time("1.5h").unwrap(), 5400.0);
        assert_eq!(parse_time(" 2 M ").unwrap(), 120.0);
        assert!(parse_time("").is_err());
        assert!(parse_time("10d").is_err());
        assert!(parse_time("m").is_err());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(12.5), "12.50s");
        assert_eq!(format_duration(90.0), "1.50m");
        assert_eq!(format_duration(5400.0), "1.50h");
    }
}
