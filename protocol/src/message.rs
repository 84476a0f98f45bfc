#[cfg(test)]
#[path = "message_test.rs"]
mod message_test;

/// A single record as the application sees it: an opaque byte payload. The library never interprets or mutates the
/// payload, it only wraps it in the broker's framing (a 4-byte big-endian length prefix) on the way out and strips
/// that framing on the way in.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Message {
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(payload: Vec<u8>) -> Self {
        Self { payload }
    }

    /// Total size of this message once framed, i.e. the length prefix plus the payload. This is the amount the
    /// consumer's offset advances by when the message is decoded from a fetch response.
    pub fn framed_len(&self) -> usize {
        4 + self.payload.len()
    }

    /// Appends `i32 size | payload` to `bytes`.
    pub fn frame_into(&self, bytes: &mut Vec<u8>) {
        // a payload larger than i32::MAX cannot be represented on the wire at all, so there is nothing sensible to
        // do besides refusing to encode it
        bytes.extend(i32::try_from(self.payload.len()).expect("Message payload too large for an i32 size prefix").to_be_bytes());
        bytes.extend(&self.payload);
    }
}

impl From<&str> for Message {
    fn from(value: &str) -> Self {
        Self::new(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Message {
    fn from(payload: Vec<u8>) -> Self {
        Self::new(payload)
    }
}

/// Walks a fetch response payload and decodes every complete size-prefixed message in it, returning the messages
/// along with the number of bytes they span. A trailing partial message (either a cut-off size prefix or a body
/// shorter than its prefix announces) is left unconsumed and excluded from the byte count, so the consumer fetches
/// it again in full at its next position. A negative size prefix also stops the scan: nothing past it can be framed
/// meaningfully, and stopping keeps the cursor on the last well-formed boundary.
pub fn parse_message_set(data: &[u8]) -> (Vec<Message>, usize) {
    let mut messages = Vec::new();
    let mut processed = 0;

    while processed + 4 <= data.len() {
        let size = i32::from_be_bytes(data[processed..processed + 4].try_into().unwrap());
        if size < 0 {
            break;
        }

        let size = size as usize;
        if processed + 4 + size > data.len() {
            break;
        }

        messages.push(Message::new(data[processed + 4..processed + 4 + size].to_vec()));
        processed += 4 + size;
    }

    (messages, processed)
}
