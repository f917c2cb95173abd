//! Common display utilities and helpers

use std::time::Duration;

/// Dollar amount with a K/M suffix: `$6.8M`, `$450K`, `$900`.
pub fn format_money(amount: f64) -> String {
    let sign = if amount < 0.0 { "-" } else { "" };
    let abs = amount.abs();
    if abs >= 1_000_000.0 {
        format!("{}${:.1}M", sign, abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{}${:.0}K", sign, abs / 1_000.0)
    } else {
        format!("{}${:.0}", sign, abs)
    }
}

pub fn format_pct(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Signed percentage-point difference, e.g. `-3.6 pts`.
pub fn format_points(value: f64) -> String {
    format!("{:+.1} pts", value)
}

/// Truncate to `max_len` characters with an ellipsis.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Coarse age such as `45s`, `12m` or `2h 5m`.
pub fn format_age(age: Duration) -> String {
    let secs = age.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(6_800_000.0), "$6.8M");
        assert_eq!(format_money(450_000.0), "$450K");
        assert_eq!(format_money(900.0), "$900");
        assert_eq!(format_money(-750_000.0), "-$750K");
        assert_eq!(format_money(0.0), "$0");
    }

    #[test]
    fn test_format_pct_and_points() {
        assert_eq!(format_pct(61.2941), "61.3%");
        assert_eq!(format_points(-3.6), "-3.6 pts");
        assert_eq!(format_points(2.0), "+2.0 pts");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");
        assert_eq!(truncate_string("a much longer title", 10), "a much ...");
        assert_eq!(truncate_string("DM% ≥ 95 für alle", 8), "DM% ≥...");
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(Duration::from_secs(45)), "45s");
        assert_eq!(format_age(Duration::from_secs(720)), "12m");
        assert_eq!(format_age(Duration::from_secs(7500)), "2h 5m");
    }
}
