use heapless::String;
use serde::{Deserialize, Serialize};

use crate::operator::MAX_OPERATOR_NAME;
use crate::radio::types::{AccessTechnology, ServingSystem};
use crate::traits::HomeNetworkInfo;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegStatus {
    NotRegistered,
    Registered,
    Searching,
    Denied,
    #[default]
    Unknown,
    Roaming,
}

impl RegStatus {
    pub fn registered(&self) -> bool {
        matches!(self, Self::Registered | Self::Roaming)
    }
}

/// The registration state last reported to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegistrationSnapshot {
    pub status: RegStatus,
    pub lac: Option<u16>,
    pub ci: Option<u32>,
    pub act: AccessTechnology,
    pub mcc: String<3>,
    pub mnc: String<3>,
    pub operator_name: String<MAX_OPERATOR_NAME>,
}

impl RegistrationSnapshot {
    pub const fn new() -> Self {
        Self {
            status: RegStatus::Unknown,
            lac: None,
            ci: None,
            act: AccessTechnology::Unknown,
            mcc: String::new(),
            mnc: String::new(),
            operator_name: String::new(),
        }
    }

    /// Host-visible change detection. The operator name is cosmetic and does
    /// not count.
    fn differs_from(&self, other: &Self) -> bool {
        self.status != other.status
            || self.act != other.act
            || self.lac != other.lac
            || self.ci != other.ci
    }
}

impl Default for RegistrationSnapshot {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OperatorSnapshot {
    pub name: String<MAX_OPERATOR_NAME>,
    pub mcc: String<3>,
    pub mnc: String<3>,
    pub act: AccessTechnology,
    pub status: RegStatus,
}

/// Combines voice- and data-domain registration into the single state the
/// host sees.
///
/// Change events only mark a notification as due; the effective state is
/// computed when the notification is taken, so a burst of events collapses
/// into one report. The snapshot is mutated from that path alone.
#[derive(Debug)]
pub struct Tracker {
    voice: RegStatus,
    data: RegStatus,

    act: AccessTechnology,
    lac: Option<u16>,
    ci: Option<u32>,
    mcc: String<3>,
    mnc: String<3>,
    operator_name: String<MAX_OPERATOR_NAME>,

    current: RegistrationSnapshot,
    scheduled: bool,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker {
    pub const fn new() -> Self {
        Self {
            voice: RegStatus::Unknown,
            data: RegStatus::Unknown,
            act: AccessTechnology::Unknown,
            lac: None,
            ci: None,
            mcc: String::new(),
            mnc: String::new(),
            operator_name: String::new(),
            current: RegistrationSnapshot::new(),
            scheduled: false,
        }
    }

    /// Ingest a serving-system change event.
    ///
    /// Returns `true` when the caller must arm the deferred notification;
    /// `false` when one is already due.
    pub fn update(&mut self, info: &ServingSystem) -> bool {
        self.voice = info.voice_status;
        self.data = info.data_status;
        self.act = info.act;
        self.lac = info.lac;
        self.ci = info.ci;
        self.mcc = info.mcc.clone();
        self.mnc = info.mnc.clone();
        if let Some(name) = &info.operator_name {
            self.operator_name = name.clone();
        }

        if self.scheduled {
            false
        } else {
            self.scheduled = true;
            true
        }
    }

    /// Run the deferred notification: compute the effective state and return
    /// it if it differs from what was last reported.
    pub fn take_notification(
        &mut self,
        home: &impl HomeNetworkInfo,
    ) -> Option<RegistrationSnapshot> {
        if !self.scheduled {
            return None;
        }
        self.scheduled = false;

        let mut effective = self.effective();

        // Networks listed as equivalent to the home PLMN are not roaming,
        // whatever the modem says.
        if effective.status == RegStatus::Roaming
            && home.is_home_plmn(self.mcc.as_str(), self.mnc.as_str())
        {
            effective.status = RegStatus::Registered;
        }

        if effective.differs_from(&self.current) {
            self.current = effective.clone();
            Some(effective)
        } else {
            self.current = effective;
            None
        }
    }

    /// The data domain wins while it is registered, otherwise the voice
    /// domain is authoritative.
    fn effective(&self) -> RegistrationSnapshot {
        let status = if self.data.registered() {
            self.data
        } else {
            self.voice
        };

        RegistrationSnapshot {
            status,
            lac: self.lac,
            ci: self.ci,
            act: self.act,
            mcc: self.mcc.clone(),
            mnc: self.mnc.clone(),
            operator_name: self.operator_name.clone(),
        }
    }

    pub fn current(&self) -> &RegistrationSnapshot {
        &self.current
    }

    pub fn current_operator(&self) -> OperatorSnapshot {
        OperatorSnapshot {
            name: self.current.operator_name.clone(),
            mcc: self.current.mcc.clone(),
            mnc: self.current.mnc.clone(),
            act: self.current.act,
            status: self.current.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Home {
        equivalent: bool,
    }

    impl HomeNetworkInfo for Home {
        fn home_mcc(&self) -> &str {
            "234"
        }

        fn home_mnc(&self) -> &str {
            "15"
        }

        fn service_provider_name(&self) -> &str {
            ""
        }

        fn is_home_plmn(&self, _mcc: &str, _mnc: &str) -> bool {
            self.equivalent
        }
    }

    fn serving(voice: RegStatus, data: RegStatus) -> ServingSystem {
        ServingSystem {
            voice_status: voice,
            data_status: data,
            act: AccessTechnology::Utran,
            lac: Some(0x1234),
            ci: Some(0x00aa_bb01),
            mcc: String::try_from("234").unwrap(),
            mnc: String::try_from("15").unwrap(),
            operator_name: None,
        }
    }

    #[test]
    fn a_burst_of_events_schedules_once() {
        let mut tracker = Tracker::new();

        assert!(tracker.update(&serving(RegStatus::Searching, RegStatus::Unknown)));
        assert!(!tracker.update(&serving(RegStatus::Registered, RegStatus::Unknown)));
        assert!(!tracker.update(&serving(RegStatus::Registered, RegStatus::Registered)));

        let home = Home { equivalent: false };
        assert!(tracker.take_notification(&home).is_some());
        assert!(tracker.take_notification(&home).is_none());

        // The next event schedules again.
        assert!(tracker.update(&serving(RegStatus::Registered, RegStatus::Searching)));
    }

    #[test]
    fn data_domain_wins_while_registered() {
        let mut tracker = Tracker::new();
        let home = Home { equivalent: false };

        tracker.update(&serving(RegStatus::Denied, RegStatus::Registered));
        let snap = tracker.take_notification(&home).unwrap();
        assert_eq!(snap.status, RegStatus::Registered);

        tracker.update(&serving(RegStatus::Denied, RegStatus::Roaming));
        let snap = tracker.take_notification(&home).unwrap();
        assert_eq!(snap.status, RegStatus::Roaming);
    }

    #[test]
    fn voice_domain_is_authoritative_otherwise() {
        let mut tracker = Tracker::new();
        let home = Home { equivalent: false };

        tracker.update(&serving(RegStatus::Registered, RegStatus::Searching));
        let snap = tracker.take_notification(&home).unwrap();
        assert_eq!(snap.status, RegStatus::Registered);
    }

    #[test]
    fn unchanged_state_is_not_reported_twice() {
        let mut tracker = Tracker::new();
        let home = Home { equivalent: false };

        tracker.update(&serving(RegStatus::Registered, RegStatus::Registered));
        assert!(tracker.take_notification(&home).is_some());

        tracker.update(&serving(RegStatus::Registered, RegStatus::Registered));
        assert!(tracker.take_notification(&home).is_none());
    }

    #[test]
    fn cell_change_is_reported() {
        let mut tracker = Tracker::new();
        let home = Home { equivalent: false };

        tracker.update(&serving(RegStatus::Registered, RegStatus::Registered));
        tracker.take_notification(&home).unwrap();

        let mut moved = serving(RegStatus::Registered, RegStatus::Registered);
        moved.ci = Some(0x00aa_bb02);
        tracker.update(&moved);
        let snap = tracker.take_notification(&home).unwrap();
        assert_eq!(snap.ci, Some(0x00aa_bb02));
    }

    #[test]
    fn roaming_on_an_equivalent_plmn_reads_as_registered() {
        let mut tracker = Tracker::new();

        tracker.update(&serving(RegStatus::Roaming, RegStatus::Unknown));
        let snap = tracker
            .take_notification(&Home { equivalent: true })
            .unwrap();
        assert_eq!(snap.status, RegStatus::Registered);
        assert_eq!(tracker.current().status, RegStatus::Registered);
    }

    #[test]
    fn roaming_elsewhere_stays_roaming() {
        let mut tracker = Tracker::new();

        tracker.update(&serving(RegStatus::Roaming, RegStatus::Unknown));
        let snap = tracker
            .take_notification(&Home { equivalent: false })
            .unwrap();
        assert_eq!(snap.status, RegStatus::Roaming);
    }

    #[test]
    fn current_operator_reflects_the_snapshot() {
        let mut tracker = Tracker::new();
        let home = Home { equivalent: false };

        let mut info = serving(RegStatus::Registered, RegStatus::Registered);
        info.operator_name = Some(String::try_from("HomeTel").unwrap());
        tracker.update(&info);
        tracker.take_notification(&home).unwrap();

        let operator = tracker.current_operator();
        assert_eq!(operator.name.as_str(), "HomeTel");
        assert_eq!(operator.mcc.as_str(), "234");
        assert_eq!(operator.status, RegStatus::Registered);
    }
}
