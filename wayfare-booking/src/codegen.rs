use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

/// Allocates human-readable booking codes, `BK-YYYYMMDD-NNN`.
///
/// A dedicated per-day monotonic sequence rather than a count of today's
/// rows: the sequence hands out each number exactly once, so concurrent
/// creations can never collide on a code.
pub struct BookingCodeGenerator {
    state: Mutex<DayState>,
}

struct DayState {
    day: NaiveDate,
    next_seq: u32,
}

impl BookingCodeGenerator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DayState {
                day: NaiveDate::MIN,
                next_seq: 1,
            }),
        }
    }

    /// Next code for the calendar day of `now`, starting at 001 and rolling
    /// over at midnight.
    pub async fn next(&self, now: DateTime<Utc>) -> String {
        let today = now.date_naive();
        let mut state = self.state.lock().await;

        if state.day != today {
            state.day = today;
            state.next_seq = 1;
        }

        let seq = state.next_seq;
        state.next_seq += 1;

        format!("BK-{}-{:03}", today.format("%Y%m%d"), seq)
    }
}

impl Default for BookingCodeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_code_format_and_sequence() {
        let generator = BookingCodeGenerator::new();
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 9, 0, 0).unwrap();

        assert_eq!(generator.next(now).await, "BK-20260830-001");
        assert_eq!(generator.next(now).await, "BK-20260830-002");
        assert_eq!(generator.next(now).await, "BK-20260830-003");
    }

    #[tokio::test]
    async fn test_sequence_rolls_over_at_midnight() {
        let generator = BookingCodeGenerator::new();
        let today = Utc.with_ymd_and_hms(2026, 8, 30, 23, 59, 0).unwrap();
        let tomorrow = Utc.with_ymd_and_hms(2026, 8, 31, 0, 1, 0).unwrap();

        assert_eq!(generator.next(today).await, "BK-20260830-001");
        assert_eq!(generator.next(today).await, "BK-20260830-002");
        assert_eq!(generator.next(tomorrow).await, "BK-20260831-001");
    }

    #[tokio::test]
    async fn test_concurrent_allocations_are_distinct() {
        let generator = Arc::new(BookingCodeGenerator::new());
        let now = Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap();

        let mut handles = Vec::new();
        for _ in 0..25 {
            let generator = Arc::clone(&generator);
            handles.push(tokio::spawn(async move { generator.next(now).await }));
        }

        let mut codes = HashSet::new();
        for handle in handles {
            codes.insert(handle.await.unwrap());
        }
        assert_eq!(codes.len(), 25);
    }
}
