//! The operator-discovery protocol.
//!
//! Every session opens with the legacy single-shot query. Modems that reject
//! it as unsupported get the incremental scan instead, provided the
//! negotiated revision carries it: partial results accumulate from
//! indications until the modem reports completion or the hard deadline cuts
//! the scan short, in which case whatever was found still counts as a
//! result. Once the scan request has been accepted the modem expects an
//! explicit stop, so the session remembers that a stop is owed.
//!
//! The session itself is a plain state machine; the driving loop owns the
//! timers and the channel and acts on the steps returned from here.

use core::mem;

use heapless::Vec;

use crate::error::Error;
use crate::operator::{numeric_name, OperatorList, OperatorRecord, OperatorStatus};
use crate::radio::types::{
    AccessTechnology, Capabilities, CellIdentity, NetworkScanResult, RatMode, ReportedCell,
    ScanMode, ScanSpec, MAX_SCAN_MODES,
};
use crate::radio::{Request, Response, ResponseError};
use crate::timing::{SCAN_INTERVAL_SECS, SCAN_PERIODICITY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    LegacyQuery,
    Scanning,
}

/// What the driving loop must do next.
#[derive(Debug, PartialEq)]
pub(crate) enum ScanStep {
    /// Keep waiting.
    Pending,
    /// Submit the incremental scan request and re-arm the scan deadline.
    StartScan(ScanSpec),
    /// The session is over.
    Finish(ScanFinish),
}

#[derive(Debug, PartialEq)]
pub(crate) enum ScanFinish {
    Complete(OperatorList),
    Failed(Error),
    /// Nothing was found before the modem went away; the caller gets the
    /// abort path, not an empty success.
    Discarded,
}

pub(crate) struct ScanSession {
    op: u32,
    phase: Phase,
    records: OperatorList,
    must_send_stop: bool,
    fallback: bool,
    scan_type_tags: bool,
    modes: &'static [RatMode],
}

impl ScanSession {
    pub fn new(op: u32, caps: Capabilities, allow_scan: bool, modes: &'static [RatMode]) -> Self {
        Self {
            op,
            phase: Phase::LegacyQuery,
            records: OperatorList::new(),
            must_send_stop: false,
            fallback: allow_scan && caps.network_scan,
            scan_type_tags: caps.scan_type_tags,
            modes,
        }
    }

    pub fn op(&self) -> u32 {
        self.op
    }

    pub fn must_send_stop(&self) -> bool {
        self.must_send_stop
    }

    /// Every session opens with the legacy query.
    pub fn start_request(&self) -> Request {
        Request::ScanOperators
    }

    pub fn on_response(&mut self, result: Result<Response, ResponseError>) -> ScanStep {
        match self.phase {
            Phase::LegacyQuery => match result {
                Ok(Response::OperatorList(list)) => {
                    ScanStep::Finish(ScanFinish::Complete(list))
                }
                Err(ResponseError::NotSupported) if self.fallback => {
                    debug!("operator query unsupported, falling back to network scan");
                    self.phase = Phase::Scanning;
                    ScanStep::StartScan(self.build_spec())
                }
                Err(e) => ScanStep::Finish(ScanFinish::Failed(e.into())),
                Ok(_) => ScanStep::Finish(ScanFinish::Failed(Error::InvalidResponse)),
            },
            Phase::Scanning => match result {
                Ok(Response::ScanStarted) => {
                    self.must_send_stop = true;
                    ScanStep::Pending
                }
                Err(e) => ScanStep::Finish(ScanFinish::Failed(e.into())),
                Ok(_) => ScanStep::Finish(ScanFinish::Failed(Error::InvalidResponse)),
            },
        }
    }

    /// Fold an incremental result indication into the session.
    pub fn on_scan_result(&mut self, result: &NetworkScanResult) -> ScanStep {
        if self.phase != Phase::Scanning {
            return ScanStep::Pending;
        }

        for cell in &result.cells {
            if let Some(record) = decode_cell(cell) {
                if self.records.push(record).is_err() {
                    warn!("operator list full, dropping cell");
                }
            }
        }

        if result.complete {
            ScanStep::Finish(ScanFinish::Complete(mem::take(&mut self.records)))
        } else {
            ScanStep::Pending
        }
    }

    /// The deadline fired. A cut-short scan is still a result; a legacy query
    /// that never answered is not.
    pub fn on_timeout(&mut self) -> ScanFinish {
        match self.phase {
            Phase::LegacyQuery => ScanFinish::Failed(Error::Timeout),
            Phase::Scanning => ScanFinish::Complete(mem::take(&mut self.records)),
        }
    }

    pub fn on_modem_reset(&mut self) -> ScanFinish {
        if self.records.is_empty() {
            ScanFinish::Discarded
        } else {
            ScanFinish::Complete(mem::take(&mut self.records))
        }
    }

    fn build_spec(&self) -> ScanSpec {
        let mut modes: Vec<ScanMode, MAX_SCAN_MODES> = Vec::new();
        for mode in self.modes {
            let _ = modes.push(ScanMode {
                network_type: mode.network_type(),
                access_network: self.scan_type_tags.then(|| mode.access_network()),
            });
        }

        ScanSpec {
            modes,
            interval_secs: SCAN_INTERVAL_SECS,
            incremental: true,
            periodicity: SCAN_PERIODICITY,
        }
    }
}

/// Technologies the session does not know how to read are skipped silently.
fn decode_cell(cell: &ReportedCell) -> Option<OperatorRecord> {
    let (mcc, mnc, act, name) = match &cell.identity {
        CellIdentity::Gsm(c) => (&c.mcc, &c.mnc, AccessTechnology::Gsm, &c.operator_name),
        CellIdentity::Wcdma(c) => (&c.mcc, &c.mnc, AccessTechnology::Utran, &c.operator_name),
        CellIdentity::Lte(c) => (&c.mcc, &c.mnc, AccessTechnology::Eutran, &c.operator_name),
        CellIdentity::Nr(c) => (&c.mcc, &c.mnc, AccessTechnology::Nr, &c.operator_name),
        CellIdentity::Other => return None,
    };

    let name = match name {
        Some(name) => name.clone(),
        None => numeric_name(mcc, mnc).unwrap_or_default(),
    };

    Some(OperatorRecord {
        name,
        mcc: mcc.clone(),
        mnc: mnc.clone(),
        status: if cell.registered {
            OperatorStatus::Current
        } else {
            OperatorStatus::Available
        },
        act,
    })
}
