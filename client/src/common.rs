use protocol::request::CodecError;
use std::time::Duration;
use thiserror::Error;

/// Default broker endpoint.
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9092;

/// Maximum size of a fetch response payload.
pub const DEFAULT_MAX_FETCH_SIZE: i32 = 1024 * 1024;

/// How long [crate::consumer::Consumer::poll] sleeps between two fetches.
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_secs(2);

/// Maximum byte size of a single produce request's message payload.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

#[derive(Error, Debug)]
pub enum Error {
    /// A blocking read could not complete within the socket's read timeout. The connection has been torn down and
    /// will transparently be re-established by the next write.
    #[error("timed out reading from the broker socket")]
    Timeout,

    /// The broker closed or reset the stream, detected opportunistically after a send. The broker never sends
    /// unsolicited bytes on a healthy connection, so anything readable right after a send means the peer is gone.
    #[error("connection reset by the broker")]
    ConnectionReset,

    /// Fewer bytes were transmitted than the frame required.
    #[error("short write: sent {sent} of {expected} bytes")]
    ShortWrite { sent: usize, expected: usize },

    /// The broker's response does not fit the wire format (corrupt length prefix, inconsistent offset count, ...).
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The topic name cannot be represented on the wire.
    #[error("invalid topic: {0}")]
    InvalidTopic(String),

    /// Any other socket-level fault. These are fatal to the call and surface as-is; the library never retries.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<CodecError> for Error {
    fn from(value: CodecError) -> Self {
        match value {
            CodecError::MalformedResponse(message) => Error::MalformedResponse(message),
            CodecError::InvalidTopic(message) => Error::InvalidTopic(message),
        }
    }
}

/// Constructor-level configuration of a [crate::consumer::Consumer]. Plain fields on purpose: this is an embeddable
/// library, there is no file format or CLI behind it.
#[derive(Clone, Debug)]
pub struct ConsumerConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub partition: i32,
    /// Initial byte-offset cursor into the partition.
    pub offset: u64,
    pub max_fetch_size: i32,
    pub polling_interval: Duration,
    /// Socket-level read timeout. `None` blocks forever, which is fine against a healthy broker but turns a dead
    /// one into a hung consumer.
    pub read_timeout: Option<Duration>,
}

impl ConsumerConfig {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            topic: topic.into(),
            partition: 0,
            offset: 0,
            max_fetch_size: DEFAULT_MAX_FETCH_SIZE,
            polling_interval: DEFAULT_POLLING_INTERVAL,
            read_timeout: None,
        }
    }
}

/// Constructor-level configuration of a [crate::producer::Producer].
#[derive(Clone, Debug)]
pub struct ProducerConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub partition: i32,
    /// Produce requests accumulate framed messages until adding the next one would cross this size, at which point
    /// the accumulated payload is flushed as one request frame.
    pub max_message_size: usize,
}

impl ProducerConfig {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            topic: topic.into(),
            partition: 0,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

/// Constructor-level configuration of a [crate::producer::BatchProducer].
#[derive(Clone, Debug)]
pub struct BatchProducerConfig {
    pub producer: ProducerConfig,
    /// How long the background worker waits between two periodic flushes.
    pub batch_interval: Duration,
}

impl BatchProducerConfig {
    pub fn new(topic: impl Into<String>, batch_interval: Duration) -> Self {
        Self { producer: ProducerConfig::new(topic), batch_interval }
    }
}
