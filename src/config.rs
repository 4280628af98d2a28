use crate::radio::types::RatMode;

pub trait NetRegConfig {
    /// Whether the incremental network-scan protocol may be used at all. When
    /// disabled the operator list is only ever obtained through the legacy
    /// single-shot query.
    const NETWORK_SCAN: bool = true;

    /// Radio-access modes included in the scan specifier, in preference
    /// order.
    const RAT_MODES: &'static [RatMode] = &[RatMode::Gsm, RatMode::Umts, RatMode::Lte];

    /// Signal level reported as 1%.
    const WEAK_SIGNAL_DBM: i32 = -100;

    /// Signal level reported as 100%.
    const STRONG_SIGNAL_DBM: i32 = -60;
}

/// All-defaults configuration.
pub struct DefaultConfig;

impl NetRegConfig for DefaultConfig {}
