use std::time::SystemTime;
use time::OffsetDateTime;
use time::macros::format_description;

/// Renders a note's "Last edited" line. A timestamp the store has not
/// materialized yet shows as "Just now" instead of blocking or erroring.
pub fn format_last_edited(updated_at: Option<SystemTime>) -> String {
    match updated_at {
        Some(at) => format!("Last edited: {}", format_timestamp(at)),
        None => "Last edited: Just now".to_string(),
    }
}

pub fn format_timestamp(at: SystemTime) -> String {
    let datetime = OffsetDateTime::from(at);
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
    datetime
        .format(format)
        .unwrap_or_else(|_| "Just now".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn missing_timestamp_shows_just_now() {
        assert_eq!(format_last_edited(None), "Last edited: Just now");
    }

    #[test]
    fn materialized_timestamp_shows_date_and_time() {
        // 2024-05-01 12:30:00 UTC
        let at = UNIX_EPOCH + Duration::from_secs(1_714_566_600);
        assert_eq!(format_last_edited(Some(at)), "Last edited: 2024-05-01 12:30");
    }
}
