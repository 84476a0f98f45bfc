use crate::common::{ConsumerConfig, Error, Result};
use crate::connection::{Connection, Transport};
use crate::observer::{NoopObserver, Observer};
use protocol::message::{parse_message_set, Message};
use protocol::request::{self, Topic, EARLIEST_TIME, LATEST_TIME};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[cfg(test)]
#[path = "consumer_test.rs"]
mod consumer_test;

/// Fetch and produce response bodies start with a fixed 2-byte field that precedes the message-set payload.
const RESPONSE_HEADER_LEN: usize = 2;

/// Consumes one topic partition from one broker through an explicit byte-offset cursor. Each [Consumer::consume]
/// fetches at the cursor and advances it by exactly the bytes of the fully decoded messages, so a trailing partial
/// message in a response is fetched again in full next time. The cursor is exclusively owned by this instance: it
/// never decreases, and nothing here is safe to share across threads.
pub struct Consumer {
    transport: Box<dyn Transport>,
    topic: Topic,
    partition: i32,
    offset: u64,
    max_fetch_size: i32,
    polling_interval: Duration,
}

impl Consumer {
    /// Connects to the broker eagerly and fails fast if it is unreachable.
    pub fn new(config: ConsumerConfig) -> Result<Self> {
        Self::with_observer(config, Arc::new(NoopObserver))
    }

    pub fn with_observer(config: ConsumerConfig, observer: Arc<dyn Observer>) -> Result<Self> {
        let mut connection = Connection::new(config.host.clone(), config.port, config.read_timeout, observer);
        connection.connect()?;
        Self::new_with_transport(Box::new(connection), config)
    }

    fn new_with_transport(transport: Box<dyn Transport>, config: ConsumerConfig) -> Result<Self> {
        Ok(Self {
            transport,
            topic: Topic::new(config.topic)?,
            partition: config.partition,
            offset: config.offset,
            max_fetch_size: config.max_fetch_size,
            polling_interval: config.polling_interval,
        })
    }

    /// The current byte-offset cursor.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Fetches at the current cursor and returns the decoded messages, possibly none. The cursor advances by the
    /// bytes of the complete messages in the response and by nothing else.
    pub fn consume(&mut self) -> Result<Vec<Message>> {
        let request = request::encode_fetch(&self.topic, self.partition, self.offset, self.max_fetch_size);
        self.transport.write(&request)?;

        let body = self.read_response(RESPONSE_HEADER_LEN + self.max_fetch_size as usize)?;
        if body.len() < RESPONSE_HEADER_LEN {
            return Err(Error::MalformedResponse(format!("fetch response body of {} bytes is too short for its header", body.len())));
        }

        let (messages, consumed) = parse_message_set(&body[RESPONSE_HEADER_LEN..]);
        self.offset += consumed as u64;
        Ok(messages)
    }

    /// Asks the broker for the partition's latest offset. Does not move the cursor.
    pub fn latest_offset(&mut self) -> Result<u64> {
        self.query_offset(LATEST_TIME)
    }

    /// Asks the broker for the partition's earliest available offset. Does not move the cursor.
    pub fn earliest_offset(&mut self) -> Result<u64> {
        self.query_offset(EARLIEST_TIME)
    }

    fn query_offset(&mut self, time: i64) -> Result<u64> {
        let request = request::encode_offsets(&self.topic, self.partition, time, 1);
        self.transport.write(&request)?;

        let body = self.read_response(4 + 8)?;
        let offsets = request::parse_offsets(&body)?;
        offsets.first().copied()
            .ok_or_else(|| Error::MalformedResponse(String::from("offsets response contained no offsets")))
    }

    /// An unbounded blocking iterator over the partition: fetches at the cursor, yields each decoded message, then
    /// sleeps the polling interval before the next fetch whether or not the previous one returned anything. Errors
    /// are yielded as items and do not end the iteration. There is no internal cancellation: the caller stops by
    /// dropping the iterator, and calling [Consumer::poll] again later resumes at the cursor.
    pub fn poll(&mut self) -> PollIter<'_> {
        PollIter { consumer: self, buffer: Vec::new().into_iter(), fetched_once: false }
    }

    fn read_response(&mut self, limit: usize) -> Result<Vec<u8>> {
        let prefix = self.transport.read(4)?;
        let length = request::decode_response_len(&prefix, limit)?;
        self.transport.read(length)
    }
}

pub struct PollIter<'a> {
    consumer: &'a mut Consumer,
    buffer: std::vec::IntoIter<Message>,
    fetched_once: bool,
}

impl Iterator for PollIter<'_> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(message) = self.buffer.next() {
                return Some(Ok(message));
            }

            if self.fetched_once {
                thread::sleep(self.consumer.polling_interval);
            }
            self.fetched_once = true;

            match self.consumer.consume() {
                Ok(messages) => self.buffer = messages.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
