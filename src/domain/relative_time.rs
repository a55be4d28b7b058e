// Human readable "time ago" strings for leaderboard dates.

const SECOND: u64 = 1_000;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

fn rounded(value: u64, unit: u64) -> u64 {
    ((value + unit / 2) / unit).max(1)
}

/// Formats the distance between `then_ms` and `now_ms` (epoch millis) as a past phrase.
pub fn humanize_since(then_ms: u64, now_ms: u64) -> String {
    let elapsed = now_ms.saturating_sub(then_ms);
    let days = elapsed / DAY;

    if elapsed < 45 * SECOND {
        "a few seconds ago".to_string()
    } else if elapsed < 90 * SECOND {
        "a minute ago".to_string()
    } else if elapsed < 45 * MINUTE {
        format!("{} minutes ago", rounded(elapsed, MINUTE))
    } else if elapsed < 90 * MINUTE {
        "an hour ago".to_string()
    } else if elapsed < 22 * HOUR {
        format!("{} hours ago", rounded(elapsed, HOUR))
    } else if elapsed < 36 * HOUR {
        "a day ago".to_string()
    } else if days < 26 {
        format!("{} days ago", rounded(elapsed, DAY))
    } else if days < 45 {
        "a month ago".to_string()
    } else if days < 320 {
        format!("{} months ago", rounded(elapsed, 30 * DAY))
    } else if days < 548 {
        "a year ago".to_string()
    } else {
        format!("{} years ago", rounded(elapsed, 365 * DAY))
    }
}
