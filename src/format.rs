use chrono::NaiveDateTime;

/// Raw scores are stored multiplied by this.
pub const SCORE_MULTIPLIER: f64 = 10000.0;
pub const SCORE_MAX_K: f64 = 10000.0;
pub const SCORE_MAX_M: f64 = 10000000.0;
pub const SCORE_MAX_B: f64 = 10000000000.0;

/// Human readable score. `12340000` → `"1234"`, larger values roll over into
/// K, M and B units, anything past that is infinity.
pub fn format_score(raw: i64) -> String {
    let base = raw as f64 / SCORE_MULTIPLIER;
    let sign = if base < 0.0 { "-" } else { "" };
    let abs = base.abs();
    // log10(0) is -inf, which lands in the first branch.
    let decades = abs.log10().ceil();

    let (value, units) = if decades < 5.0 {
        let value = abs.ceil() as i64;
        if value == 0 {
            return "0".to_owned();
        }
        return format!("{}{}", sign, value);
    } else if decades < 8.0 {
        (abs / SCORE_MAX_K, "K")
    } else if decades < 11.0 {
        (abs / SCORE_MAX_M, "M")
    } else if decades < 13.0 {
        (abs / SCORE_MAX_B, "B")
    } else {
        return format!("{}∞", sign);
    };

    format!("{}{:.1}{}", sign, value, units)
}

/// `"3 hours ago"`, `"1 day in the future"`, or `"now"` within thirty seconds.
pub fn relative_date(at: NaiveDateTime, now: NaiveDateTime) -> String {
    let elapsed = now - at;
    let when = if elapsed.num_milliseconds() < 0 {
        "in the future"
    } else {
        "ago"
    };

    let seconds = (elapsed.num_milliseconds() as f64 / 1000.0).abs();
    if seconds < 30.0 {
        return "now".to_owned();
    }
    let minutes = seconds / 60.0;
    let hours = minutes / 60.0;

    let (value, unit) = if hours < 1.0 {
        if minutes < 1.0 {
            (seconds % 60.0, "second")
        } else {
            (minutes % 60.0, "minute")
        }
    } else if hours < 24.0 {
        (hours, "hour")
    } else if hours < 168.0 {
        (hours / 24.0, "day")
    } else if hours < 672.0 {
        (hours / 168.0, "week")
    } else if hours < 8760.0 {
        (hours / 672.0, "month")
    } else {
        (hours / 8760.0, "year")
    };

    let value = value.round();
    let plural = if value == 1.0 { "" } else { "s" };
    format!("{:.0} {}{} {}", value, unit, plural, when)
}

/// ISO 8601 with milliseconds, used in `<time datetime="">`.
pub fn format_date(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3f+00:00").to_string()
}
