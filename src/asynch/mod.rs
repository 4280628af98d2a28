pub mod control;
pub mod runner;
pub mod state;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};

use crate::config::NetRegConfig;
use crate::radio::types::NetworkTime;
use crate::radio::{RadioChannel, RadioEventChannel, RegistrationTarget};
use crate::registration::RegistrationSnapshot;
use crate::traits::{HomeNetworkInfo, ProvisioningLookup};

use control::Control;
use runner::{Runner, COMMAND_DEPTH};

pub const NOTIFICATION_CAPACITY: usize = 4;
pub const NOTIFICATION_SUBSCRIBERS: usize = 2;

/// Unsolicited events towards the host.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NetRegEvent {
    RegistrationChanged(RegistrationSnapshot),
    /// Strength in percent, 1..=100.
    SignalStrength(u8),
    NetworkTime(NetworkTime),
}

pub(crate) enum Command {
    ListOperators { op: u32 },
    CurrentOperator { op: u32 },
    Register { op: u32, target: RegistrationTarget },
    Strength { op: u32 },
}

pub type NetRegSubscription<'a> = Subscriber<
    'a,
    NoopRawMutex,
    NetRegEvent,
    NOTIFICATION_CAPACITY,
    NOTIFICATION_SUBSCRIBERS,
    1,
>;

pub(crate) type NetRegPublisher<'a> = Publisher<
    'a,
    NoopRawMutex,
    NetRegEvent,
    NOTIFICATION_CAPACITY,
    NOTIFICATION_SUBSCRIBERS,
    1,
>;

/// Statically-allocatable resources of one engine instance.
pub struct Resources {
    ch: state::State,
    commands: Channel<NoopRawMutex, Command, COMMAND_DEPTH>,
    notifications:
        PubSubChannel<NoopRawMutex, NetRegEvent, NOTIFICATION_CAPACITY, NOTIFICATION_SUBSCRIBERS, 1>,
}

impl Resources {
    pub const fn new() -> Self {
        Self {
            ch: state::State::new(),
            commands: Channel::new(),
            notifications: PubSubChannel::new(),
        }
    }
}

impl Default for Resources {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire up one engine instance.
///
/// The transport publishes completions and indications into `events`; the
/// returned [`Runner`] must be polled in a background task, while the
/// [`Control`] is handed to the host stack.
pub fn new<'a, R, P, H, C, const EVENT_CAP: usize>(
    resources: &'a mut Resources,
    radio: R,
    lookup: P,
    home: H,
    _config: C,
    events: &'a RadioEventChannel<EVENT_CAP>,
) -> (Control<'a>, Runner<'a, R, P, H, C, EVENT_CAP>)
where
    R: RadioChannel,
    P: ProvisioningLookup,
    H: HomeNetworkInfo,
    C: NetRegConfig,
{
    let Resources {
        ch,
        commands,
        notifications,
    } = resources;

    let state_ch = state::Runner::new(ch);

    let runner = Runner::new(
        state_ch.clone(),
        radio,
        lookup,
        home,
        events.subscribe().unwrap(),
        commands.receiver(),
        notifications.publisher().unwrap(),
    );

    let control = Control::new(state_ch, commands.sender(), notifications);

    (control, runner)
}
