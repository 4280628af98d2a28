use crate::radio::ChannelError;

#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The operation was superseded by a newer request or torn down before it
    /// could complete.
    Canceled,
    /// The operation did not complete within its bounded time.
    Timeout,
    /// The modem reported that the requested feature is not supported.
    NotSupported,
    /// The modem answered with a response that does not match the request, or
    /// with a response that could not be decoded. Treated like a transport
    /// failure by the retry logic.
    InvalidResponse,
    /// The modem rejected the operation.
    Network,
    /// The radio channel refused to carry the request.
    Channel(ChannelError),

    SubscriberOverflow(embassy_sync::pubsub::Error),
}

impl From<ChannelError> for Error {
    fn from(e: ChannelError) -> Self {
        Self::Channel(e)
    }
}

impl From<crate::radio::ResponseError> for Error {
    fn from(e: crate::radio::ResponseError) -> Self {
        match e {
            crate::radio::ResponseError::NotSupported => Self::NotSupported,
            crate::radio::ResponseError::Malformed => Self::InvalidResponse,
            crate::radio::ResponseError::Failure => Self::Network,
        }
    }
}
