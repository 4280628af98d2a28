use embassy_time::Duration;

/// Upper bound on a single-shot operator query before it is failed.
pub fn legacy_query_timeout() -> Duration {
    Duration::from_secs(300)
}

/// Hard deadline for an incremental network scan. A scan cut short by this
/// deadline still completes with whatever it has accumulated.
pub fn scan_timeout() -> Duration {
    Duration::from_secs(60)
}

/// Delay between strength-query attempts while a caller query is pending.
pub fn strength_retry_period() -> Duration {
    Duration::from_secs(2)
}

/// Scan interval requested from the modem, in seconds.
pub const SCAN_INTERVAL_SECS: u8 = 10;

/// Scan periodicity requested from the modem.
pub const SCAN_PERIODICITY: u8 = 3;

/// Total attempts for a registration-mode request (initial + retries).
pub const REGISTRATION_ATTEMPTS: u8 = 3;
