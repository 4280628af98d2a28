//! Structured records crossing the radio channel.
//!
//! The channel carries already-parsed records; their wire encoding belongs to
//! the transport. Everything here is plain data.

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::operator::MAX_OPERATOR_NAME;
use crate::registration::RegStatus;

/// Cells reported per scan indication.
pub const MAX_SCAN_CELLS: usize = 8;

/// Modes carried in one scan specifier.
pub const MAX_SCAN_MODES: usize = 4;

/// Protocol revision negotiated by the transport when the channel was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProtocolVersion(pub u16);

impl ProtocolVersion {
    /// First revision carrying the incremental network-scan requests.
    pub const NETWORK_SCAN: Self = Self(16);
    /// First revision accepting an access-network hint on manual
    /// registration.
    pub const MANUAL_RAT_HINT: Self = Self(18);
    /// First revision expecting a scan-type tag per specifier mode.
    pub const SCAN_TYPE_TAGS: Self = Self(25);

    pub fn supports(&self, feature: Self) -> bool {
        self.0 >= feature.0
    }
}

/// What the negotiated revision allows, resolved once per operation instead
/// of scattering version checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capabilities {
    pub network_scan: bool,
    pub scan_type_tags: bool,
    pub manual_rat_hint: bool,
}

impl Capabilities {
    pub fn of(version: ProtocolVersion) -> Self {
        Self {
            network_scan: version.supports(ProtocolVersion::NETWORK_SCAN),
            scan_type_tags: version.supports(ProtocolVersion::SCAN_TYPE_TAGS),
            manual_rat_hint: version.supports(ProtocolVersion::MANUAL_RAT_HINT),
        }
    }
}

/// Radio generation a cell or registration belongs to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessTechnology {
    #[default]
    Unknown,
    Gsm,
    Utran,
    Eutran,
    Nr,
}

/// Access-network tag used by the newer scan specifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RadioAccessNetwork {
    Geran = 1,
    Utran = 2,
    Eutran = 3,
    Ngran = 4,
}

/// Network-type code understood by the scan requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum NetworkType {
    Gsm = 0x04,
    Umts = 0x05,
    Lte = 0x08,
    Nr = 0x0c,
}

/// Radio-access mode enabled in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RatMode {
    Gsm,
    Umts,
    Lte,
    Nr,
}

impl RatMode {
    pub fn network_type(&self) -> NetworkType {
        match self {
            Self::Gsm => NetworkType::Gsm,
            Self::Umts => NetworkType::Umts,
            Self::Lte => NetworkType::Lte,
            Self::Nr => NetworkType::Nr,
        }
    }

    pub fn access_network(&self) -> RadioAccessNetwork {
        match self {
            Self::Gsm => RadioAccessNetwork::Geran,
            Self::Umts => RadioAccessNetwork::Utran,
            Self::Lte => RadioAccessNetwork::Eutran,
            Self::Nr => RadioAccessNetwork::Ngran,
        }
    }
}

/// One mode entry of a scan specifier. The access-network tag is only present
/// on revisions that expect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanMode {
    pub network_type: NetworkType,
    pub access_network: Option<RadioAccessNetwork>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanSpec {
    pub modes: Vec<ScanMode, MAX_SCAN_MODES>,
    /// Seconds between the modem's scan shots.
    pub interval_secs: u8,
    /// Deliver partial results as they are found.
    pub incremental: bool,
    pub periodicity: u8,
}

/// Combined voice/data registration state as reported by the modem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServingSystem {
    pub voice_status: RegStatus,
    pub data_status: RegStatus,
    pub act: AccessTechnology,
    pub lac: Option<u16>,
    pub ci: Option<u32>,
    pub mcc: String<3>,
    pub mnc: String<3>,
    pub operator_name: Option<String<MAX_OPERATOR_NAME>>,
}

/// Per-technology strength measurements, at most one report per radio.
///
/// Which fields are populated depends on the modem generation: older parts
/// only fill the base RSSI, newer ones add the per-radio records. All raw
/// levels are offset-encoded (see [`crate::signal`]); out-of-window values
/// mean "not measured on this radio".
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalReport {
    /// GSM/WCDMA base RSSI index.
    pub rssi: Option<i32>,
    pub wcdma: Option<WcdmaSignal>,
    pub lte: Option<LteSignal>,
    pub tdscdma: Option<TdScdmaSignal>,
    pub nr: Option<NrSignal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WcdmaSignal {
    pub rscp: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LteSignal {
    pub rssi: i32,
    pub rsrp: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TdScdmaSignal {
    pub rssi: i32,
    pub rscp: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NrSignal {
    pub rsrp: i32,
}

/// One incremental scan indication: zero or more cells, plus the final
/// completion marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetworkScanResult {
    pub complete: bool,
    pub cells: Vec<ReportedCell, MAX_SCAN_CELLS>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportedCell {
    /// Whether the modem is registered on this cell.
    pub registered: bool,
    pub identity: CellIdentity,
}

/// Cell identity in whichever shape the reporting radio uses. Identities the
/// engine does not know how to read decode to [`CellIdentity::Other`] and are
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CellIdentity {
    Gsm(GsmCell),
    Wcdma(WcdmaCell),
    Lte(LteCell),
    Nr(NrCell),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GsmCell {
    pub mcc: String<3>,
    pub mnc: String<3>,
    pub lac: u16,
    pub operator_name: Option<String<MAX_OPERATOR_NAME>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WcdmaCell {
    pub mcc: String<3>,
    pub mnc: String<3>,
    pub lac: u16,
    pub psc: u16,
    pub operator_name: Option<String<MAX_OPERATOR_NAME>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LteCell {
    pub mcc: String<3>,
    pub mnc: String<3>,
    pub tac: u16,
    pub operator_name: Option<String<MAX_OPERATOR_NAME>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NrCell {
    pub mcc: String<3>,
    pub mnc: String<3>,
    pub tac: u32,
    pub operator_name: Option<String<MAX_OPERATOR_NAME>>,
}

/// Network time as delivered by a NITZ indication.
///
/// The timezone is in quarter-hours east of GMT; daylight-saving adjustment
/// is carried only when the network includes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NetworkTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub timezone: i8,
    pub dst: Option<u8>,
}
