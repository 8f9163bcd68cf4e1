use chrono::prelude::*;

/// If longer than five years, keep only the year;
/// if not, but longer than one year, add the month.
/// Otherwise, shorter than one year, keep also the day.
pub fn suitable_xfmt(d: chrono::Duration) -> &'static str {
    let xfmt = if d > chrono::Duration::days(5 * 365) {
        "%Y"
    } else if d > chrono::Duration::days(365) {
        "%Y-%m"
    } else {
        "%Y-%m-%d"
    };
    return xfmt;
}

/// Parse a calendar date, dropping the time of day when present.
/// Accept plain dates, naive datetimes with optional fractional seconds,
/// and RFC 3339 - ISO 8601.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// Convert an "H:MM" or "HH:MM" duration to decimal hours.
/// Exactly two colon-delimited non-negative integers are required,
/// digits only, no sign.
pub fn parse_duration_hours(s: &str) -> Option<f64> {
    let digits = |p: &str| -> Option<u64> {
        let p = p.trim();
        if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        p.parse::<u64>().ok()
    };
    let mut parts = s.split(':');
    let hours = digits(parts.next()?)?;
    let minutes = digits(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours as f64 + minutes as f64 / 60.)
}

/// Running total, cumulative[i] = cumulative[i - 1] + v[i].
pub fn cumulative_sum(v: &[f64]) -> Vec<f64> {
    v.iter()
        .scan(0f64, |acc, x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}

/// Minimum and maximum of a non-empty iterator, None when empty.
pub fn min_and_max<'a, I, T>(mut s: I) -> Option<(T, T)>
where
    I: Iterator<Item = &'a T>,
    T: 'a + std::cmp::PartialOrd + Clone,
{
    let (mut min, mut max) = match s.next() {
        Some(v) => (v, v),
        None => return None,
    };
    for es in s {
        if es > max {
            max = es
        } else if es < min {
            min = es
        }
    }
    Some((min.clone(), max.clone()))
}
