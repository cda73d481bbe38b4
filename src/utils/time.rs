use chrono::{NaiveDate, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Wall-clock milliseconds that never repeat or go backwards within the process.
pub fn monotonic_millis() -> i64 {
    let now = Utc::now().timestamp_millis();
    let mut prev = LAST_MILLIS.load(Ordering::Relaxed);
    loop {
        let next = if now > prev { now } else { prev + 1 };
        match LAST_MILLIS.compare_exchange_weak(prev, next, Ordering::SeqCst, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(actual) => prev = actual,
        }
    }
}

/// Accepts `2026-12-31` as well as `2026/12/31`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y/%m/%d"))
        .ok()
}
