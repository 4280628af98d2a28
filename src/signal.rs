//! Signal-strength decoding.
//!
//! Modems report strength in whatever unit the serving radio exposes: a
//! GSM-style RSSI index, a WCDMA/TD-SCDMA RSCP level, or an LTE/NR RSRP
//! level. Everything is folded into a single dBm figure first and only then
//! mapped to the percentage the host sees.
//!
//! Raw levels are offset-encoded: RSSI 0..=31 maps to -113..-51 dBm in 2 dBm
//! steps, RSCP 0..=96 maps to -120..-24 dBm, RSRP 44..=140 is the positive
//! magnitude of -44..-140 dBm. Anything outside those windows counts as "not
//! measured".

use crate::radio::types::SignalReport;

/// Sentinel for "no usable measurement".
pub const UNKNOWN_DBM: i32 = -140;

pub fn dbm_from_rssi(rssi: i32) -> i32 {
    if (0..=31).contains(&rssi) {
        -113 + 2 * rssi
    } else {
        UNKNOWN_DBM
    }
}

pub fn dbm_from_rscp(rscp: i32) -> i32 {
    if (0..=96).contains(&rscp) {
        -120 + rscp
    } else {
        UNKNOWN_DBM
    }
}

pub fn dbm_from_rsrp(rsrp: i32) -> i32 {
    if (44..=140).contains(&rsrp) {
        -rsrp
    } else {
        UNKNOWN_DBM
    }
}

/// Map a dBm level onto 1..=100.
///
/// Exactly 1 at `weak` and below, exactly 100 at `strong` and above, linear
/// (truncated toward zero) in between.
pub fn percent_from_dbm(dbm: i32, weak: i32, strong: i32) -> u8 {
    if dbm <= weak {
        return 1;
    }
    if dbm >= strong {
        return 100;
    }

    let scaled = 100 * (dbm - weak) / (strong - weak);
    scaled.clamp(1, 100) as u8
}

/// The strongest measurement of each kind found in one report.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalSample {
    pub rssi: Option<i32>,
    pub rscp: Option<i32>,
    pub rsrp: Option<i32>,
}

impl SignalSample {
    pub fn from_report(report: &SignalReport) -> Self {
        let mut sample = Self::default();

        if let Some(rssi) = report.rssi {
            sample.merge_rssi(rssi);
        }
        if let Some(lte) = &report.lte {
            sample.merge_rssi(lte.rssi);
        }
        if let Some(td) = &report.tdscdma {
            sample.merge_rssi(td.rssi);
            sample.merge_rscp(td.rscp);
        }
        if let Some(wcdma) = &report.wcdma {
            sample.merge_rscp(wcdma.rscp);
        }

        // LTE is authoritative for RSRP, NR only fills the gap.
        if let Some(lte) = &report.lte {
            sample.merge_rsrp(lte.rsrp);
        }
        if sample.rsrp.is_none() {
            if let Some(nr) = &report.nr {
                sample.merge_rsrp(nr.rsrp);
            }
        }

        sample
    }

    fn merge_rssi(&mut self, value: i32) {
        if (0..=31).contains(&value) {
            self.rssi = Some(self.rssi.map_or(value, |cur| cur.max(value)));
        }
    }

    fn merge_rscp(&mut self, value: i32) {
        if (0..=96).contains(&value) {
            self.rscp = Some(self.rscp.map_or(value, |cur| cur.max(value)));
        }
    }

    fn merge_rsrp(&mut self, value: i32) {
        if (44..=140).contains(&value) {
            self.rsrp = Some(value);
        }
    }

    /// Resolve the sample to dBm: RSSI wins, then RSCP, then RSRP.
    pub fn dbm(&self) -> i32 {
        if let Some(rssi) = self.rssi {
            return dbm_from_rssi(rssi);
        }
        if let Some(rscp) = self.rscp {
            return dbm_from_rscp(rscp);
        }
        if let Some(rsrp) = self.rsrp {
            return dbm_from_rsrp(rsrp);
        }
        UNKNOWN_DBM
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radio::types::{LteSignal, NrSignal, TdScdmaSignal, WcdmaSignal};

    const WEAK: i32 = -100;
    const STRONG: i32 = -60;

    #[test]
    fn rssi_formula_over_full_range() {
        for rssi in 0..=31 {
            assert_eq!(dbm_from_rssi(rssi), -113 + 2 * rssi);
        }
        assert_eq!(dbm_from_rssi(-1), UNKNOWN_DBM);
        assert_eq!(dbm_from_rssi(32), UNKNOWN_DBM);
        assert_eq!(dbm_from_rssi(99), UNKNOWN_DBM);
    }

    #[test]
    fn rscp_formula_over_full_range() {
        for rscp in 0..=96 {
            assert_eq!(dbm_from_rscp(rscp), -120 + rscp);
        }
        assert_eq!(dbm_from_rscp(-1), UNKNOWN_DBM);
        assert_eq!(dbm_from_rscp(97), UNKNOWN_DBM);
        assert_eq!(dbm_from_rscp(255), UNKNOWN_DBM);
    }

    #[test]
    fn rsrp_formula_over_full_range() {
        for rsrp in 44..=140 {
            assert_eq!(dbm_from_rsrp(rsrp), -rsrp);
        }
        assert_eq!(dbm_from_rsrp(43), UNKNOWN_DBM);
        assert_eq!(dbm_from_rsrp(141), UNKNOWN_DBM);
        assert_eq!(dbm_from_rsrp(0), UNKNOWN_DBM);
    }

    #[test]
    fn percent_is_monotonic_and_bounded() {
        let mut last = percent_from_dbm(-160, WEAK, STRONG);
        for dbm in -159..=0 {
            let percent = percent_from_dbm(dbm, WEAK, STRONG);
            assert!(percent >= last);
            assert!((1..=100).contains(&percent));
            last = percent;
        }
    }

    #[test]
    fn percent_is_exact_at_the_thresholds() {
        assert_eq!(percent_from_dbm(WEAK, WEAK, STRONG), 1);
        assert_eq!(percent_from_dbm(WEAK - 20, WEAK, STRONG), 1);
        assert_eq!(percent_from_dbm(STRONG, WEAK, STRONG), 100);
        assert_eq!(percent_from_dbm(STRONG + 20, WEAK, STRONG), 100);
        assert_eq!(percent_from_dbm(-80, WEAK, STRONG), 50);
    }

    #[test]
    fn rssi_takes_priority_over_everything() {
        let report = SignalReport {
            rssi: Some(20),
            wcdma: Some(WcdmaSignal { rscp: 50 }),
            lte: None,
            tdscdma: None,
            nr: Some(NrSignal { rsrp: 90 }),
        };

        assert_eq!(SignalSample::from_report(&report).dbm(), -113 + 2 * 20);
    }

    #[test]
    fn strongest_rssi_wins() {
        let report = SignalReport {
            rssi: Some(10),
            wcdma: None,
            lte: Some(LteSignal { rssi: 25, rsrp: 90 }),
            tdscdma: Some(TdScdmaSignal { rssi: 17, rscp: 40 }),
            nr: None,
        };

        let sample = SignalSample::from_report(&report);
        assert_eq!(sample.rssi, Some(25));
        assert_eq!(sample.dbm(), -113 + 2 * 25);
    }

    #[test]
    fn rscp_prefers_the_larger_candidate() {
        let report = SignalReport {
            rssi: None,
            wcdma: Some(WcdmaSignal { rscp: 30 }),
            lte: None,
            tdscdma: Some(TdScdmaSignal { rssi: -1, rscp: 45 }),
            nr: None,
        };

        let sample = SignalSample::from_report(&report);
        assert_eq!(sample.rscp, Some(45));
        assert_eq!(sample.dbm(), -120 + 45);
    }

    #[test]
    fn rsrp_prefers_lte_over_nr() {
        let report = SignalReport {
            rssi: None,
            wcdma: None,
            lte: Some(LteSignal { rssi: -1, rsrp: 80 }),
            tdscdma: None,
            nr: Some(NrSignal { rsrp: 120 }),
        };

        assert_eq!(SignalSample::from_report(&report).dbm(), -80);
    }

    #[test]
    fn out_of_range_lte_rsrp_falls_back_to_nr() {
        let report = SignalReport {
            rssi: None,
            wcdma: None,
            lte: Some(LteSignal { rssi: -1, rsrp: 255 }),
            tdscdma: None,
            nr: Some(NrSignal { rsrp: 120 }),
        };

        assert_eq!(SignalSample::from_report(&report).dbm(), -120);
    }

    #[test]
    fn empty_report_resolves_to_the_sentinel() {
        let report = SignalReport::default();
        assert_eq!(SignalSample::from_report(&report).dbm(), UNKNOWN_DBM);
    }

    #[test]
    fn out_of_range_values_count_as_absent() {
        let report = SignalReport {
            rssi: Some(99),
            wcdma: Some(WcdmaSignal { rscp: 255 }),
            lte: None,
            tdscdma: None,
            nr: None,
        };

        assert_eq!(SignalSample::from_report(&report).dbm(), UNKNOWN_DBM);
    }
}
