use chrono::{DateTime, Utc};

/// Trait for formatting different types of data
pub trait Formatter<T> {
    fn format(&self, input: T) -> String;
}

/// Time formatter for converting seconds to human-readable format
pub struct UptimeFormatter;

impl Formatter<u64> for UptimeFormatter {
    fn format(&self, seconds: u64) -> String {
        let days = seconds / 86400;
        let hours = (seconds % 86400) / 3600;
        let mins = (seconds % 3600) / 60;

        if days > 0 {
            format!("{}d {}h {}m", days, hours, mins)
        } else if hours > 0 {
            format!("{}h {}m", hours, mins)
        } else {
            format!("{}m", mins)
        }
    }
}

/// Cost formatter for calculating cost spent
pub struct CostFormatter;

impl CostFormatter {
    /// Calculate cost spent based on uptime and hourly rate
    pub fn calculate_cost_spent(&self, uptime_seconds: u64, price_per_hour: f64) -> f64 {
        let hours = uptime_seconds as f64 / 3600.0;
        hours * price_per_hour
    }
}

impl Formatter<(u64, f64)> for CostFormatter {
    fn format(&self, input: (u64, f64)) -> String {
        let (uptime_seconds, price_per_hour) = input;
        let cost = self.calculate_cost_spent(uptime_seconds, price_per_hour);
        format!("${:.2}", cost)
    }
}

/// Volume sizes, given in GB
pub struct SizeFormatter;

impl Formatter<f64> for SizeFormatter {
    fn format(&self, size_gb: f64) -> String {
        if size_gb == 0.0 {
            "0".to_string()
        } else if size_gb < 0.01 {
            format!("{:.1} MB", size_gb * 1024.0)
        } else if size_gb < 1.0 {
            format!("{:.2} GB", size_gb)
        } else {
            format!("{:.1} GB", size_gb)
        }
    }
}

pub fn format_uptime(seconds: u64) -> String {
    UptimeFormatter.format(seconds)
}

pub fn calculate_cost_spent(uptime_seconds: u64, price_per_hour: f64) -> f64 {
    CostFormatter.calculate_cost_spent(uptime_seconds, price_per_hour)
}

pub fn format_cost(uptime_seconds: u64, price_per_hour: f64) -> String {
    CostFormatter.format((uptime_seconds, price_per_hour))
}

pub fn format_size_gb(size_gb: f64) -> String {
    SizeFormatter.format(size_gb)
}

pub fn format_file_count(count: u64) -> String {
    match count {
        0 => "0".to_string(),
        1..=999 => count.to_string(),
        1_000..=999_999 => format!("{:.1}K", count as f64 / 1_000.0),
        _ => format!("{:.1}M", count as f64 / 1_000_000.0),
    }
}

/// Shorten `s` to `width` characters by replacing its middle with '…'.
pub fn mid_ellipsize(s: &str, width: usize) -> String {
    if s.is_empty() {
        return "—".to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= width || width < 2 {
        return s.to_string();
    }
    let keep = width - 1;
    let left = keep / 2;
    let right = keep - left;
    let head: String = chars[..left].iter().collect();
    let tail: String = chars[chars.len() - right..].iter().collect();
    format!("{}…{}", head, tail)
}

pub fn format_frequency(hours: u32) -> String {
    match hours {
        24 => "daily".to_string(),
        1 => "hourly".to_string(),
        h => format!("{}h", h),
    }
}

pub fn format_retention(days: u32) -> String {
    match days {
        1 => "1 day".to_string(),
        7 => "1 week".to_string(),
        30 => "1 month".to_string(),
        d => format!("{} days", d),
    }
}

/// "12m ago", "3.5h ago", "2.0d ago"
pub fn format_relative(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - ts).num_seconds().max(0) as f64;
    let hours = seconds / 3600.0;
    if hours < 1.0 {
        format!("{:.0}m ago", seconds / 60.0)
    } else if hours < 24.0 {
        format!("{:.1}h ago", hours)
    } else {
        format!("{:.1}d ago", hours / 24.0)
    }
}

/// "4m12s" or "37s"
pub fn format_duration_between(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let total = (end - start).num_seconds().max(0);
    if total >= 60 {
        format!("{}m{}s", total / 60, total % 60)
    } else {
        format!("{}s", total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_uptime_formatting() {
        let formatter = UptimeFormatter;

        assert_eq!(formatter.format(3600), "1h 0m");
        assert_eq!(formatter.format(3661), "1h 1m");
        assert_eq!(formatter.format(86400), "1d 0h 0m");
        assert_eq!(formatter.format(90061), "1d 1h 1m");
        assert_eq!(formatter.format(30), "0m");
    }

    #[test]
    fn test_cost_formatting() {
        assert_eq!(calculate_cost_spent(1800, 2.0), 1.0);
        assert_eq!(format_cost(3600, 1.5), "$1.50");
        assert_eq!(format_cost(7200, 0.75), "$1.50");
    }

    #[test]
    fn test_size_and_count_formatting() {
        assert_eq!(format_size_gb(0.0), "0");
        assert_eq!(format_size_gb(0.005), "5.1 MB");
        assert_eq!(format_size_gb(0.5), "0.50 GB");
        assert_eq!(format_size_gb(12.34), "12.3 GB");

        assert_eq!(format_file_count(0), "0");
        assert_eq!(format_file_count(999), "999");
        assert_eq!(format_file_count(1500), "1.5K");
        assert_eq!(format_file_count(2_500_000), "2.5M");
    }

    #[test]
    fn test_mid_ellipsize() {
        assert_eq!(mid_ellipsize("", 10), "—");
        assert_eq!(mid_ellipsize("short", 10), "short");
        assert_eq!(mid_ellipsize("abcdefghijkl", 7), "abc…jkl");
    }

    #[test]
    fn test_backup_labels() {
        assert_eq!(format_frequency(24), "daily");
        assert_eq!(format_frequency(1), "hourly");
        assert_eq!(format_frequency(6), "6h");
        assert_eq!(format_retention(7), "1 week");
        assert_eq!(format_retention(30), "1 month");
        assert_eq!(format_retention(14), "14 days");
    }

    #[test]
    fn test_relative_times() {
        let now = Utc::now();
        assert_eq!(format_relative(now - Duration::minutes(12), now), "12m ago");
        assert_eq!(format_relative(now - Duration::minutes(210), now), "3.5h ago");
        assert_eq!(format_relative(now - Duration::hours(48), now), "2.0d ago");

        assert_eq!(
            format_duration_between(now, now + Duration::seconds(252)),
            "4m12s"
        );
        assert_eq!(format_duration_between(now, now + Duration::seconds(37)), "37s");
    }
}
