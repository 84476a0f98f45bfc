use std::fmt::Display;
use thiserror::Error;

#[cfg(test)]
#[path = "request_test.rs"]
mod request_test;

/// Request kind identifiers as the broker expects them on the wire.
pub const PRODUCE: i16 = 0;
pub const FETCH: i16 = 1;
pub const OFFSETS: i16 = 4;

/// Sentinel times for an offsets query: the broker interprets -1 as "the latest offset" and -2 as "the earliest
/// offset available".
pub const LATEST_TIME: i64 = -1;
pub const EARLIEST_TIME: i64 = -2;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("invalid topic: {0}")]
    InvalidTopic(String),
}

/// A validated topic name. The wire format stores the name's length in an `i16` and the broker only understands
/// ASCII, so we coerce and check once at construction and the encoding functions below can stay infallible.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Topic {
    name: String,
}

impl Topic {
    /// Coerces anything printable into a topic name, dropping non-ASCII characters the way the original clients of
    /// this protocol did rather than rejecting them.
    pub fn new(name: impl Display) -> Result<Self, CodecError> {
        let name: String = name.to_string().chars().filter(char::is_ascii).collect();

        if name.is_empty() {
            return Err(CodecError::InvalidTopic(String::from("topic name is empty after ASCII coercion")));
        }
        if name.len() > i16::MAX as usize {
            return Err(CodecError::InvalidTopic(format!("topic name length {} does not fit the wire format's i16 field", name.len())));
        }

        Ok(Self { name })
    }

    pub fn as_str(&self) -> &str {
        &self.name
    }

    fn len(&self) -> usize {
        self.name.len()
    }
}

/// Encodes a fetch request, including the leading 4-byte request-size prefix:
/// `i32 requestLen | i16 FETCH | i16 topicLen | topic | i32 partition | u64 offset | i32 maxSize`.
pub fn encode_fetch(topic: &Topic, partition: i32, offset: u64, max_size: i32) -> Vec<u8> {
    let mut frame = frame_header(FETCH, topic, partition);
    frame.extend(offset.to_be_bytes());
    frame.extend(max_size.to_be_bytes());
    prefix_with_len(frame)
}

/// Encodes an offsets query, including the leading 4-byte request-size prefix:
/// `i32 requestLen | i16 OFFSETS | i16 topicLen | topic | i32 partition | i64 time | i32 maxOffsets`.
/// The time is usually one of [LATEST_TIME] and [EARLIEST_TIME].
pub fn encode_offsets(topic: &Topic, partition: i32, time: i64, max_offsets: i32) -> Vec<u8> {
    let mut frame = frame_header(OFFSETS, topic, partition);
    frame.extend(time.to_be_bytes());
    frame.extend(max_offsets.to_be_bytes());
    prefix_with_len(frame)
}

/// Encodes a produce request, including the leading 4-byte request-size prefix:
/// `i32 requestLen | i16 PRODUCE | i16 topicLen | topic | i32 partition | i32 payloadLen | payload`.
/// The payload is expected to be a concatenation of individually framed messages (see [crate::message]).
pub fn encode_produce(topic: &Topic, partition: i32, payload: &[u8]) -> Vec<u8> {
    let mut frame = frame_header(PRODUCE, topic, partition);
    frame.extend(i32::try_from(payload.len()).expect("Produce payload too large for an i32 size field").to_be_bytes());
    frame.extend(payload);
    prefix_with_len(frame)
}

fn frame_header(kind: i16, topic: &Topic, partition: i32) -> Vec<u8> {
    let mut frame = Vec::with_capacity(2 + 2 + topic.len() + 4 + 8 + 4);
    frame.extend(kind.to_be_bytes());
    // the cast is safe, Topic::new refuses names longer than i16::MAX
    frame.extend((topic.len() as i16).to_be_bytes());
    frame.extend(topic.as_str().as_bytes());
    frame.extend(partition.to_be_bytes());
    frame
}

fn prefix_with_len(frame: Vec<u8>) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(4 + frame.len());
    bytes.extend(i32::try_from(frame.len()).expect("Request frame too large for an i32 size prefix").to_be_bytes());
    bytes.extend(frame);
    bytes
}

/// Decodes the 4-byte length prefix every response starts with. The prefix comes straight off the network, so a
/// corrupt or hostile value could otherwise make the caller try to allocate and read gigabytes; anything negative
/// or beyond what the caller's request can legitimately produce is rejected instead.
pub fn decode_response_len(prefix: &[u8], limit: usize) -> Result<usize, CodecError> {
    let prefix: [u8; 4] = prefix.try_into()
        .map_err(|_| CodecError::MalformedResponse(format!("expected a 4-byte response length prefix, got {} bytes", prefix.len())))?;

    let length = i32::from_be_bytes(prefix);
    if length < 0 {
        return Err(CodecError::MalformedResponse(format!("negative response length {length}")));
    }
    if length as usize > limit {
        return Err(CodecError::MalformedResponse(format!("response length {length} exceeds the expected maximum of {limit} bytes")));
    }

    Ok(length as usize)
}

/// Parses the body of an offsets response: `i32 count | count x u64 offset`. The declared count has to match the
/// body length exactly.
pub fn parse_offsets(body: &[u8]) -> Result<Vec<u64>, CodecError> {
    if body.len() < 4 {
        return Err(CodecError::MalformedResponse(format!("offsets response body of {} bytes is too short for a count field", body.len())));
    }

    let count = i32::from_be_bytes(body[0..4].try_into().unwrap());
    if count < 0 {
        return Err(CodecError::MalformedResponse(format!("negative offset count {count}")));
    }

    let expected_len = 4 + count as usize * 8;
    if body.len() != expected_len {
        return Err(CodecError::MalformedResponse(format!(
            "offsets response declares {count} offsets ({expected_len} bytes) but the body has {} bytes", body.len())));
    }

    let offsets = body[4..].chunks_exact(8)
        .map(|chunk| u64::from_be_bytes(chunk.try_into().unwrap()))
        .collect();

    Ok(offsets)
}
