use assertor::{assert_that, EqualityAssertion};
use crate::message::{parse_message_set, Message};

#[test]
fn test_framed_len_counts_the_size_prefix() {
    assert_that!(Message::from("hello").framed_len()).is_equal_to(9);
    assert_that!(Message::new(Vec::new()).framed_len()).is_equal_to(4);
}

#[test]
fn test_frame_into_prefixes_the_payload_with_its_big_endian_size() {
    let mut bytes = Vec::new();
    Message::from("hello").frame_into(&mut bytes);

    assert_that!(bytes).is_equal_to(vec![0, 0, 0, 5, b'h', b'e', b'l', b'l', b'o']);
}

#[test]
fn test_parse_message_set_decodes_complete_messages_in_order() {
    let messages = vec![Message::from("hello"), Message::from("world!"), Message::from("")];
    let data = frame_all(&messages);

    let (parsed, consumed) = parse_message_set(&data);

    assert_that!(parsed).is_equal_to(messages);
    assert_that!(consumed).is_equal_to(data.len());
}

#[test]
fn test_parse_message_set_empty_input() {
    let (parsed, consumed) = parse_message_set(&[]);

    assert_that!(parsed).is_equal_to(Vec::new());
    assert_that!(consumed).is_equal_to(0);
}

#[test]
fn test_parse_message_set_stops_on_truncated_size_prefix() {
    let complete = vec![Message::from("hello"), Message::from("world")];
    let mut data = frame_all(&complete);
    let complete_len = data.len();
    // 3 bytes of a third message's size prefix
    data.extend([0, 0, 0]);

    let (parsed, consumed) = parse_message_set(&data);

    assert_that!(parsed).is_equal_to(complete);
    assert_that!(consumed).is_equal_to(complete_len);
}

#[test]
fn test_parse_message_set_stops_on_truncated_body() {
    let complete = vec![Message::from("hello")];
    let mut data = frame_all(&complete);
    let complete_len = data.len();
    // a full prefix announcing 10 bytes, followed by only 2 of them
    data.extend([0, 0, 0, 10, b'w', b'o']);

    let (parsed, consumed) = parse_message_set(&data);

    assert_that!(parsed).is_equal_to(complete);
    assert_that!(consumed).is_equal_to(complete_len);
}

#[test]
fn test_parse_message_set_stops_on_negative_size_prefix() {
    let complete = vec![Message::from("hello")];
    let mut data = frame_all(&complete);
    let complete_len = data.len();
    data.extend((-1i32).to_be_bytes());
    data.extend([1, 2, 3, 4]);

    let (parsed, consumed) = parse_message_set(&data);

    assert_that!(parsed).is_equal_to(complete);
    assert_that!(consumed).is_equal_to(complete_len);
}

fn frame_all(messages: &[Message]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for message in messages {
        message.frame_into(&mut bytes);
    }
    bytes
}
