//! The asynchronous RPC channel towards the modem.
//!
//! The engine never touches the wire. It hands [`Request`]s to a transport
//! implementing [`RadioChannel`] and consumes [`RadioEvent`]s — request
//! completions and unsolicited indications — from a [`RadioEventChannel`]
//! the transport publishes into. Completions are matched by token; stale
//! tokens are dropped by the consumer.

pub mod types;
pub mod urc;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::pubsub::{PubSubChannel, Publisher, Subscriber};
use heapless::String;
use serde::{Deserialize, Serialize};

use crate::operator::OperatorList;
use types::{ProtocolVersion, RadioAccessNetwork, ScanSpec, SignalReport};
use urc::Indication;

pub const EVENT_SUBSCRIBERS: usize = 1;
pub const EVENT_PUBLISHERS: usize = 1;

/// Correlates a submitted request with its completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RequestToken(pub(crate) u32);

/// The transport refused to carry a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelError {
    /// Submission queue full or request refused outright.
    Rejected,
    /// The channel to the modem is gone.
    Closed,
}

/// Failure reported in a completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseError {
    /// The modem does not implement the request.
    NotSupported,
    /// The response could not be decoded.
    Malformed,
    /// The modem executed the request and reported failure.
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistrationTarget {
    Automatic,
    Manual {
        mcc: String<3>,
        mnc: String<3>,
        /// Only carried on revisions that accept it.
        preferred: Option<RadioAccessNetwork>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    SetRegistrationMode(RegistrationTarget),
    GetSignalStrength,
    /// Legacy single-shot operator query.
    ScanOperators,
    /// Start an incremental network scan.
    StartNetworkScan(ScanSpec),
    StopNetworkScan,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Response {
    RegistrationModeSet,
    SignalStrength(SignalReport),
    OperatorList(OperatorList),
    ScanStarted,
    ScanStopped,
}

/// What the transport publishes into the event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioEvent {
    Completion {
        token: RequestToken,
        result: Result<Response, ResponseError>,
    },
    Indication(Indication),
}

/// Submission side of the modem RPC channel.
#[allow(async_fn_in_trait)]
pub trait RadioChannel {
    /// Revision negotiated when the channel was opened.
    fn protocol_version(&self) -> ProtocolVersion;

    /// Hand a request to the transport. Exactly one completion event is
    /// delivered per accepted request, unless the request is abandoned
    /// first.
    async fn submit(&mut self, token: RequestToken, request: Request)
        -> Result<(), ChannelError>;

    /// Ask the transport to drop the completion of an accepted request.
    /// Best effort, fire and forget.
    async fn abandon(&mut self, token: RequestToken);
}

/// Event channel the transport publishes completions and indications into.
pub struct RadioEventChannel<const CAP: usize = 8>(
    PubSubChannel<NoopRawMutex, RadioEvent, CAP, EVENT_SUBSCRIBERS, EVENT_PUBLISHERS>,
);

impl<const CAP: usize> RadioEventChannel<CAP> {
    pub const fn new() -> Self {
        Self(PubSubChannel::new())
    }

    pub fn publisher(
        &self,
    ) -> Result<RadioEventPublisher<'_, CAP>, embassy_sync::pubsub::Error> {
        self.0.publisher()
    }

    pub fn subscribe(
        &self,
    ) -> Result<RadioEventSubscription<'_, CAP>, embassy_sync::pubsub::Error> {
        self.0.subscriber()
    }
}

impl<const CAP: usize> Default for RadioEventChannel<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

pub type RadioEventPublisher<'a, const CAP: usize> =
    Publisher<'a, NoopRawMutex, RadioEvent, CAP, EVENT_SUBSCRIBERS, EVENT_PUBLISHERS>;

pub type RadioEventSubscription<'a, const CAP: usize> =
    Subscriber<'a, NoopRawMutex, RadioEvent, CAP, EVENT_SUBSCRIBERS, EVENT_PUBLISHERS>;
