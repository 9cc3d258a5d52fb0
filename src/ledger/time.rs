const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

/// Coarse age label for a record, e.g. "just now", "3 mins ago", "1 day ago".
///
/// A missing timestamp or one in the future reads as "just now".
pub fn relative_time(created_at_ms: Option<i64>, now_ms: i64) -> String {
    let elapsed = match created_at_ms {
        Some(created) => now_ms.saturating_sub(created),
        None => return "just now".into(),
    };

    if elapsed < MINUTE_MS {
        return "just now".into();
    }
    if elapsed < HOUR_MS {
        return plural(elapsed / MINUTE_MS, "min");
    }
    if elapsed < DAY_MS {
        return plural(elapsed / HOUR_MS, "hour");
    }
    plural(elapsed / DAY_MS, "day")
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn buckets_elapsed_time() {
        assert_eq!(relative_time(Some(NOW - 30_000), NOW), "just now");
        assert_eq!(relative_time(Some(NOW - 90_000), NOW), "1 min ago");
        assert_eq!(relative_time(Some(NOW - 5 * MINUTE_MS), NOW), "5 mins ago");
        assert_eq!(relative_time(Some(NOW - 7_200_000), NOW), "2 hours ago");
        assert_eq!(relative_time(Some(NOW - HOUR_MS), NOW), "1 hour ago");
        assert_eq!(relative_time(Some(NOW - 3 * DAY_MS), NOW), "3 days ago");
    }

    #[test]
    fn unit_boundaries_round_down() {
        assert_eq!(relative_time(Some(NOW - (MINUTE_MS - 1)), NOW), "just now");
        assert_eq!(relative_time(Some(NOW - MINUTE_MS), NOW), "1 min ago");
        assert_eq!(relative_time(Some(NOW - 59 * MINUTE_MS), NOW), "59 mins ago");
        assert_eq!(relative_time(Some(NOW - (HOUR_MS - 1)), NOW), "59 mins ago");
        assert_eq!(relative_time(Some(NOW - 23 * HOUR_MS), NOW), "23 hours ago");
        assert_eq!(relative_time(Some(NOW - (DAY_MS - 1)), NOW), "23 hours ago");
        assert_eq!(relative_time(Some(NOW - DAY_MS), NOW), "1 day ago");
        assert_eq!(relative_time(Some(NOW - (2 * DAY_MS - 1)), NOW), "1 day ago");
        assert_eq!(relative_time(Some(NOW - 2 * DAY_MS), NOW), "2 days ago");
    }

    #[test]
    fn missing_or_future_timestamps_read_as_just_now() {
        assert_eq!(relative_time(None, NOW), "just now");
        assert_eq!(relative_time(Some(NOW + 10_000), NOW), "just now");
    }
}
