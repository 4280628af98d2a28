//! Operator records and the spurious-name repair pass.
//!
//! Scan results occasionally carry useless operator names: either the bare
//! PLMN digits, or the SIM's own service-provider name copied onto a foreign
//! network. Records like that get their name replaced from the provisioning
//! database before the list is handed to the host.

use heapless::String;
use serde::{Deserialize, Serialize};

use crate::radio::types::AccessTechnology;
use crate::traits::{HomeNetworkInfo, ProvisioningLookup};

pub const MAX_OPERATOR_NAME: usize = 63;
pub const MAX_OPERATORS: usize = 16;

pub type OperatorList = heapless::Vec<OperatorRecord, MAX_OPERATORS>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatorStatus {
    #[default]
    Unknown,
    Available,
    Current,
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OperatorRecord {
    pub name: String<MAX_OPERATOR_NAME>,
    pub mcc: String<3>,
    pub mnc: String<3>,
    pub status: OperatorStatus,
    pub act: AccessTechnology,
}

impl OperatorRecord {
    /// `true` when the advertised name is just the PLMN digits glued
    /// together, or impersonates the SIM's service-provider name on a foreign
    /// PLMN.
    fn has_spurious_name(&self, home: &impl HomeNetworkInfo) -> bool {
        let spn = home.service_provider_name();
        if !spn.is_empty()
            && self.name.as_str() == spn
            && (self.mcc.as_str() != home.home_mcc() || self.mnc.as_str() != home.home_mnc())
        {
            return true;
        }

        numeric_name(&self.mcc, &self.mnc)
            .map(|numeric| self.name == numeric)
            .unwrap_or(false)
    }
}

pub(crate) fn numeric_name(mcc: &str, mnc: &str) -> Option<String<MAX_OPERATOR_NAME>> {
    let mut name = String::new();
    name.push_str(mcc).ok()?;
    name.push_str(mnc).ok()?;
    Some(name)
}

/// Replace spurious operator names from the provisioning database.
///
/// Cosmetic only: never drops a record, never touches status or PLMN, and a
/// failed lookup leaves the record as delivered. The current operator is
/// trusted as-is.
pub async fn normalize<P, H>(list: &mut OperatorList, lookup: &P, home: &H)
where
    P: ProvisioningLookup,
    H: HomeNetworkInfo,
{
    for record in list.iter_mut() {
        if record.status == OperatorStatus::Current {
            continue;
        }

        if !record.has_spurious_name(home) {
            continue;
        }

        match lookup.lookup(record.mcc.as_str(), record.mnc.as_str()).await {
            Ok(candidates) => {
                if let Some(name) = candidates.iter().find(|n| !n.is_empty()) {
                    record.name = name.clone();
                }
            }
            Err(_) => {
                debug!("no provisioned name for {}{}", record.mcc, record.mnc);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use embassy_futures::block_on;
    use heapless::Vec;

    use super::*;
    use crate::traits::{LookupError, OperatorName, MAX_LOOKUP_CANDIDATES};

    struct Home;

    impl HomeNetworkInfo for Home {
        fn home_mcc(&self) -> &str {
            "234"
        }

        fn home_mnc(&self) -> &str {
            "15"
        }

        fn service_provider_name(&self) -> &str {
            "HomeTel"
        }

        fn is_home_plmn(&self, mcc: &str, mnc: &str) -> bool {
            mcc == "234" && mnc == "15"
        }
    }

    struct Lookup(Result<&'static [&'static str], LookupError>);

    impl ProvisioningLookup for Lookup {
        async fn lookup(
            &self,
            _mcc: &str,
            _mnc: &str,
        ) -> Result<Vec<OperatorName, MAX_LOOKUP_CANDIDATES>, LookupError> {
            let names = self.0?;
            let mut out = Vec::new();
            for name in names {
                out.push(OperatorName::try_from(*name).unwrap()).unwrap();
            }
            Ok(out)
        }
    }

    fn record(name: &str, mcc: &str, mnc: &str, status: OperatorStatus) -> OperatorRecord {
        OperatorRecord {
            name: String::try_from(name).unwrap(),
            mcc: String::try_from(mcc).unwrap(),
            mnc: String::try_from(mnc).unwrap(),
            status,
            act: AccessTechnology::Gsm,
        }
    }

    #[test]
    fn numeric_name_is_replaced() {
        let mut list = OperatorList::new();
        list.push(record("310410", "310", "410", OperatorStatus::Available))
            .unwrap();

        block_on(normalize(&mut list, &Lookup(Ok(&["AT&T"])), &Home));

        assert_eq!(list[0].name.as_str(), "AT&T");
        assert_eq!(list[0].mcc.as_str(), "310");
        assert_eq!(list[0].mnc.as_str(), "410");
        assert_eq!(list[0].status, OperatorStatus::Available);
    }

    #[test]
    fn impersonated_spn_is_replaced() {
        let mut list = OperatorList::new();
        list.push(record("HomeTel", "310", "410", OperatorStatus::Available))
            .unwrap();

        block_on(normalize(&mut list, &Lookup(Ok(&["AT&T"])), &Home));

        assert_eq!(list[0].name.as_str(), "AT&T");
    }

    #[test]
    fn spn_on_home_plmn_is_kept() {
        let mut list = OperatorList::new();
        list.push(record("HomeTel", "234", "15", OperatorStatus::Available))
            .unwrap();

        block_on(normalize(&mut list, &Lookup(Ok(&["Wrong"])), &Home));

        assert_eq!(list[0].name.as_str(), "HomeTel");
    }

    #[test]
    fn current_operator_is_never_touched() {
        let mut list = OperatorList::new();
        list.push(record("310410", "310", "410", OperatorStatus::Current))
            .unwrap();

        block_on(normalize(&mut list, &Lookup(Ok(&["AT&T"])), &Home));

        assert_eq!(list[0].name.as_str(), "310410");
    }

    #[test]
    fn regular_names_pass_through() {
        let mut list = OperatorList::new();
        list.push(record("Telenor", "238", "02", OperatorStatus::Available))
            .unwrap();
        list.push(record("TDC", "238", "01", OperatorStatus::Available))
            .unwrap();

        block_on(normalize(&mut list, &Lookup(Ok(&["Wrong"])), &Home));

        assert_eq!(list[0].name.as_str(), "Telenor");
        assert_eq!(list[1].name.as_str(), "TDC");
    }

    #[test]
    fn failed_lookup_keeps_the_record() {
        let mut list = OperatorList::new();
        list.push(record("310410", "310", "410", OperatorStatus::Available))
            .unwrap();

        block_on(normalize(&mut list, &Lookup(Err(LookupError)), &Home));

        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name.as_str(), "310410");
    }

    #[test]
    fn empty_candidates_keep_the_record() {
        let mut list = OperatorList::new();
        list.push(record("310410", "310", "410", OperatorStatus::Available))
            .unwrap();

        block_on(normalize(&mut list, &Lookup(Ok(&["", ""])), &Home));

        assert_eq!(list[0].name.as_str(), "310410");
    }
}
