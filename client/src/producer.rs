use crate::common::{Error, ProducerConfig, Result};
use crate::connection::{Connection, Transport};
use crate::observer::{NoopObserver, Observer};
use protocol::message::Message;
use protocol::request::{self, Topic};
use std::sync::Arc;

mod batch_producer;

pub use batch_producer::{BatchProducer, MAX_RESPAWNS};

#[cfg(test)]
#[path = "producer_test.rs"]
mod producer_test;

/// Publishes messages to one topic partition over one broker connection. Messages are packed into size-bounded
/// produce requests: framed messages accumulate until adding the next one would cross `max_message_size`, at which
/// point the accumulated payload goes out as one request frame. Everything is synchronous; a multi-frame send that
/// fails on frame N has already sent frames 1..N-1 and never attempts the rest.
pub struct Producer {
    transport: Box<dyn Transport>,
    topic: Topic,
    partition: i32,
    max_message_size: usize,
}

impl Producer {
    /// Connects to the broker eagerly and fails fast if it is unreachable.
    pub fn new(config: ProducerConfig) -> Result<Self> {
        Self::with_observer(config, Arc::new(NoopObserver))
    }

    pub fn with_observer(config: ProducerConfig, observer: Arc<dyn Observer>) -> Result<Self> {
        let mut connection = Connection::new(config.host.clone(), config.port, None, observer);
        connection.connect()?;
        Self::new_with_transport(Box::new(connection), config)
    }

    fn new_with_transport(transport: Box<dyn Transport>, config: ProducerConfig) -> Result<Self> {
        Ok(Self {
            transport,
            topic: Topic::new(config.topic)?,
            partition: config.partition,
            max_message_size: config.max_message_size,
        })
    }

    /// Lazily encodes `messages` into one or more complete produce request frames, each no larger than
    /// `max_message_size` worth of framed messages. A single message that alone crosses the limit is still emitted,
    /// alone, as best-effort delivery; the accumulator is only ever flushed non-empty, so no empty frames come out.
    pub fn encode_requests<'a>(&'a self, messages: &'a [Message]) -> EncodedRequests<'a> {
        EncodedRequests {
            topic: &self.topic,
            partition: self.partition,
            max_message_size: self.max_message_size,
            messages: messages.iter(),
            carried: None,
        }
    }

    /// Sends a batch of messages, as one or more produce frames. Fails with [Error::ShortWrite] if the transport
    /// reports fewer bytes transmitted than a frame required.
    pub fn send(&mut self, messages: &[Message]) -> Result<()> {
        let Self { transport, topic, partition, max_message_size } = self;
        let requests = EncodedRequests {
            topic,
            partition: *partition,
            max_message_size: *max_message_size,
            messages: messages.iter(),
            carried: None,
        };

        for frame in requests {
            let sent = transport.write(&frame)?;
            if sent != frame.len() {
                return Err(Error::ShortWrite { sent, expected: frame.len() });
            }
        }

        Ok(())
    }

    pub fn send_one(&mut self, message: Message) -> Result<()> {
        self.send(std::slice::from_ref(&message))
    }

    /// Hands the caller a fresh accumulator to fill and sends its contents when the closure returns. The moral
    /// equivalent of a scoped batch: populate, then an implicit send on scope exit.
    pub fn batch<F>(&mut self, fill: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<Message>),
    {
        let mut messages = Vec::new();
        fill(&mut messages);
        self.send(&messages)
    }

    pub(crate) fn reconnect(&mut self) -> Result<()> {
        self.transport.reconnect()
    }
}

/// Iterator over complete, size-prefixed produce request frames. Greedy: each frame takes as many messages as fit,
/// in order, carrying the first message that did not fit over into the next frame.
pub struct EncodedRequests<'a> {
    topic: &'a Topic,
    partition: i32,
    max_message_size: usize,
    messages: std::slice::Iter<'a, Message>,
    carried: Option<&'a Message>,
}

impl Iterator for EncodedRequests<'_> {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut payload = Vec::new();
        let mut accumulated = 0;
        let mut count = 0;

        loop {
            let message = match self.carried.take().or_else(|| self.messages.next()) {
                Some(message) => message,
                None => break,
            };

            if count > 0 && accumulated + message.framed_len() > self.max_message_size {
                self.carried = Some(message);
                break;
            }

            message.frame_into(&mut payload);
            accumulated += message.framed_len();
            count += 1;
        }

        if count == 0 {
            return None;
        }

        Some(request::encode_produce(self.topic, self.partition, &payload))
    }
}
