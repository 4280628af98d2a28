//! Unsolicited records delivered by the radio channel.

use serde::{Deserialize, Serialize};

use super::types::{NetworkScanResult, NetworkTime, ServingSystem, SignalReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indication {
    /// Voice/data registration state changed.
    ServingSystem(ServingSystem),
    /// Fresh strength measurements.
    SignalStrength(SignalReport),
    /// Partial or final result of a running network scan.
    NetworkScan(NetworkScanResult),
    /// Network time (NITZ).
    NetworkTime(NetworkTime),
    /// The modem restarted; everything in flight is gone.
    ModemReset,
}
