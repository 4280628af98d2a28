//! Contracts towards the SIM / provisioning side of the host stack.
//!
//! The registration engine never owns subscriber data. Everything it needs to
//! know about the home network or about operator branding is queried through
//! these traits.

use heapless::{String, Vec};

use crate::operator::MAX_OPERATOR_NAME;

/// Provider name as returned by the provisioning database.
pub type OperatorName = String<MAX_OPERATOR_NAME>;

/// Maximum provisioning candidates considered per lookup.
pub const MAX_LOOKUP_CANDIDATES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LookupError;

/// Home-network information, backed by the SIM (IMSI, SPN and SPDI files).
pub trait HomeNetworkInfo {
    fn home_mcc(&self) -> &str;
    fn home_mnc(&self) -> &str;

    /// Service-provider name programmed on the SIM, or an empty string when
    /// none is provisioned.
    fn service_provider_name(&self) -> &str;

    /// Whether the given PLMN is listed as equivalent to the home network.
    fn is_home_plmn(&self, mcc: &str, mnc: &str) -> bool;
}

/// Operator-name lookup in an external provisioning database.
#[allow(async_fn_in_trait)]
pub trait ProvisioningLookup {
    async fn lookup(
        &self,
        mcc: &str,
        mnc: &str,
    ) -> Result<Vec<OperatorName, MAX_LOOKUP_CANDIDATES>, LookupError>;
}
