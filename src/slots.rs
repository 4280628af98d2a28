//! One outstanding request per logical operation.
//!
//! Submitting a new request for a slot drops the previous one without ever
//! completing it; the dropped token is handed back so the channel can be
//! asked to abandon the delivery. Completions for tokens no slot holds are
//! stale and must be ignored.

use crate::radio::RequestToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Slot {
    Register,
    Strength,
    Scan,
}

#[derive(Debug, Default)]
pub(crate) struct RequestSlots {
    register: Option<RequestToken>,
    strength: Option<RequestToken>,
    scan: Option<RequestToken>,
}

impl RequestSlots {
    pub const fn new() -> Self {
        Self {
            register: None,
            strength: None,
            scan: None,
        }
    }

    fn cell(&mut self, slot: Slot) -> &mut Option<RequestToken> {
        match slot {
            Slot::Register => &mut self.register,
            Slot::Strength => &mut self.strength,
            Slot::Scan => &mut self.scan,
        }
    }

    /// Claim `slot` for `token`. Returns the token that was dropped, if any.
    pub fn begin(&mut self, slot: Slot, token: RequestToken) -> Option<RequestToken> {
        self.cell(slot).replace(token)
    }

    /// Release the slot holding `token`. `None` means the completion is
    /// stale.
    pub fn complete(&mut self, token: RequestToken) -> Option<Slot> {
        for slot in [Slot::Register, Slot::Strength, Slot::Scan] {
            let cell = self.cell(slot);
            if *cell == Some(token) {
                *cell = None;
                return Some(slot);
            }
        }
        None
    }

    /// Drop a claim without completing it.
    pub fn clear(&mut self, slot: Slot) -> Option<RequestToken> {
        self.cell(slot).take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_drops_the_previous_holder() {
        let mut slots = RequestSlots::new();

        assert_eq!(slots.begin(Slot::Register, RequestToken(1)), None);
        assert_eq!(
            slots.begin(Slot::Register, RequestToken(2)),
            Some(RequestToken(1))
        );

        // The dropped request's completion is stale now.
        assert_eq!(slots.complete(RequestToken(1)), None);
        assert_eq!(slots.complete(RequestToken(2)), Some(Slot::Register));
    }

    #[test]
    fn slots_are_independent() {
        let mut slots = RequestSlots::new();

        slots.begin(Slot::Register, RequestToken(1));
        slots.begin(Slot::Strength, RequestToken(2));
        slots.begin(Slot::Scan, RequestToken(3));

        assert_eq!(slots.complete(RequestToken(2)), Some(Slot::Strength));
        assert_eq!(slots.complete(RequestToken(2)), None);
        assert_eq!(slots.complete(RequestToken(1)), Some(Slot::Register));
        assert_eq!(slots.complete(RequestToken(3)), Some(Slot::Scan));
    }

    #[test]
    fn clear_releases_without_completion() {
        let mut slots = RequestSlots::new();

        slots.begin(Slot::Scan, RequestToken(7));
        assert_eq!(slots.clear(Slot::Scan), Some(RequestToken(7)));
        assert_eq!(slots.clear(Slot::Scan), None);
        assert_eq!(slots.complete(RequestToken(7)), None);
    }
}
