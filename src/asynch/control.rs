use core::future::poll_fn;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Sender;
use embassy_sync::pubsub::PubSubChannel;
use heapless::String;

use crate::error::Error;
use crate::operator::OperatorList;
use crate::radio::types::RadioAccessNetwork;
use crate::radio::RegistrationTarget;
use crate::registration::{OperatorSnapshot, RegistrationSnapshot};

use super::runner::COMMAND_DEPTH;
use super::state;
use super::{
    Command, NetRegEvent, NetRegSubscription, NOTIFICATION_CAPACITY, NOTIFICATION_SUBSCRIBERS,
};

/// Host-facing handle of the registration engine.
///
/// Every asynchronous operation is single-pending: issuing it again while a
/// previous call is still waiting resolves the previous caller with
/// [`Error::Canceled`] first.
pub struct Control<'a> {
    ch: state::Runner<'a>,
    commands: Sender<'a, NoopRawMutex, Command, COMMAND_DEPTH>,
    notifications: &'a PubSubChannel<
        NoopRawMutex,
        NetRegEvent,
        NOTIFICATION_CAPACITY,
        NOTIFICATION_SUBSCRIBERS,
        1,
    >,
}

impl<'a> Control<'a> {
    pub(crate) fn new(
        ch: state::Runner<'a>,
        commands: Sender<'a, NoopRawMutex, Command, COMMAND_DEPTH>,
        notifications: &'a PubSubChannel<
            NoopRawMutex,
            NetRegEvent,
            NOTIFICATION_CAPACITY,
            NOTIFICATION_SUBSCRIBERS,
            1,
        >,
    ) -> Self {
        Self {
            ch,
            commands,
            notifications,
        }
    }

    /// Registration state last computed by the engine. Synchronous.
    pub fn registration_status(&self) -> RegistrationSnapshot {
        self.ch.registration_status()
    }

    /// Subscribe to unsolicited events (registration changes, strength
    /// changes, network time).
    pub fn subscribe(&self) -> Result<NetRegSubscription<'a>, Error> {
        self.notifications
            .subscriber()
            .map_err(Error::SubscriberOverflow)
    }

    /// Operator currently registered on, as of the last computed snapshot.
    pub async fn current_operator(&self) -> Result<OperatorSnapshot, Error> {
        let op = self.ch.begin_operator();
        self.commands.send(Command::CurrentOperator { op }).await;
        poll_fn(|cx| self.ch.poll_operator(op, cx)).await
    }

    /// Discover the operators around us. Ordered; may legitimately be empty.
    pub async fn list_operators(&self) -> Result<OperatorList, Error> {
        let op = self.ch.begin_scan();
        self.commands.send(Command::ListOperators { op }).await;
        poll_fn(|cx| self.ch.poll_scan(op, cx)).await
    }

    /// Let the modem pick a network.
    pub async fn register_auto(&self) -> Result<(), Error> {
        self.register(RegistrationTarget::Automatic).await
    }

    /// Register on a specific network. The preferred access network is a
    /// hint; it is dropped when the negotiated revision cannot carry it.
    pub async fn register_manual(
        &self,
        mcc: String<3>,
        mnc: String<3>,
        preferred: Option<RadioAccessNetwork>,
    ) -> Result<(), Error> {
        self.register(RegistrationTarget::Manual {
            mcc,
            mnc,
            preferred,
        })
        .await
    }

    async fn register(&self, target: RegistrationTarget) -> Result<(), Error> {
        let op = self.ch.begin_register();
        self.commands.send(Command::Register { op, target }).await;
        poll_fn(|cx| self.ch.poll_register(op, cx)).await
    }

    /// Query signal strength, in percent (1..=100).
    pub async fn signal_strength(&self) -> Result<u8, Error> {
        let op = self.ch.begin_strength();
        self.commands.send(Command::Strength { op }).await;
        poll_fn(|cx| self.ch.poll_strength(op, cx)).await
    }
}
