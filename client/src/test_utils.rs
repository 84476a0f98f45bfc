use crate::observer::{Event, Observer};
use protocol::message::{parse_message_set, Message};
use std::sync::Mutex;

/// Observer that records every event it sees, for tests that assert on diagnostics emitted across threads.
pub(crate) struct RecordingObserver {
    events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
    pub(crate) fn new() -> Self {
        Self { events: Mutex::new(Vec::new()) }
    }

    pub(crate) fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events.lock().unwrap().iter().filter(|event| matches(event)).count()
    }
}

impl Observer for RecordingObserver {
    fn handle(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

/// Concatenation of individually framed messages, i.e. a produce request payload / fetch response message set.
pub(crate) fn framed(messages: &[Message]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for message in messages {
        message.frame_into(&mut bytes);
    }
    bytes
}

/// Decodes the messages out of one complete produce request frame (as produced by the producer), checking the
/// frame's fixed fields along the way.
pub(crate) fn parse_produce_frame(frame: &[u8], topic: &str, partition: i32) -> Vec<Message> {
    let request_len = i32::from_be_bytes(frame[0..4].try_into().unwrap()) as usize;
    assert_eq!(request_len, frame.len() - 4, "request-size prefix does not cover the frame");

    let kind = i16::from_be_bytes(frame[4..6].try_into().unwrap());
    assert_eq!(kind, protocol::request::PRODUCE);

    let topic_len = i16::from_be_bytes(frame[6..8].try_into().unwrap()) as usize;
    assert_eq!(&frame[8..8 + topic_len], topic.as_bytes());

    let rest = &frame[8 + topic_len..];
    assert_eq!(i32::from_be_bytes(rest[0..4].try_into().unwrap()), partition);

    let payload_len = i32::from_be_bytes(rest[4..8].try_into().unwrap()) as usize;
    let payload = &rest[8..];
    assert_eq!(payload.len(), payload_len, "payload-size field does not cover the payload");

    let (messages, consumed) = parse_message_set(payload);
    assert_eq!(consumed, payload.len(), "produce payload contained a partial message");
    messages
}
