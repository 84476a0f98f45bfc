use assertor::{assert_that, BooleanAssertion, EqualityAssertion, ResultAssertion};
use crate::message::Message;
use crate::request::*;

#[test]
fn test_encode_fetch_layout() {
    let topic = Topic::new("events").unwrap();
    let bytes = encode_fetch(&topic, 3, 1234, 1024);

    let mut expected = Vec::new();
    expected.extend(26i32.to_be_bytes()); // 2 + 2 + 6 + 4 + 8 + 4
    expected.extend(FETCH.to_be_bytes());
    expected.extend(6i16.to_be_bytes());
    expected.extend(b"events");
    expected.extend(3i32.to_be_bytes());
    expected.extend(1234u64.to_be_bytes());
    expected.extend(1024i32.to_be_bytes());

    assert_that!(bytes).is_equal_to(expected);
}

#[test]
fn test_encode_offsets_layout_with_latest_sentinel() {
    let topic = Topic::new("events").unwrap();
    let bytes = encode_offsets(&topic, 0, LATEST_TIME, 1);

    let mut expected = Vec::new();
    expected.extend(26i32.to_be_bytes());
    expected.extend(OFFSETS.to_be_bytes());
    expected.extend(6i16.to_be_bytes());
    expected.extend(b"events");
    expected.extend(0i32.to_be_bytes());
    expected.extend((-1i64).to_be_bytes());
    expected.extend(1i32.to_be_bytes());

    assert_that!(bytes).is_equal_to(expected);
}

#[test]
fn test_encode_produce_layout() {
    let topic = Topic::new("events").unwrap();
    let mut payload = Vec::new();
    Message::from("hello").frame_into(&mut payload);

    let bytes = encode_produce(&topic, 7, &payload);

    let mut expected = Vec::new();
    expected.extend(27i32.to_be_bytes()); // 2 + 2 + 6 + 4 + 4 + 9
    expected.extend(PRODUCE.to_be_bytes());
    expected.extend(6i16.to_be_bytes());
    expected.extend(b"events");
    expected.extend(7i32.to_be_bytes());
    expected.extend(9i32.to_be_bytes());
    expected.extend(payload);

    assert_that!(bytes).is_equal_to(expected);
}

#[test]
fn test_topic_coercion_drops_non_ascii() {
    let topic = Topic::new("évents").unwrap();
    assert_that!(topic.as_str().to_owned()).is_equal_to(String::from("vents"));
}

#[test]
fn test_topic_coercion_accepts_anything_printable() {
    let topic = Topic::new(42).unwrap();
    assert_that!(topic.as_str().to_owned()).is_equal_to(String::from("42"));
}

#[test]
fn test_topic_rejects_empty_names() {
    assert_that!(Topic::new("é")).is_err();
}

#[test]
fn test_topic_rejects_names_longer_than_i16() {
    assert_that!(Topic::new("t".repeat(i16::MAX as usize + 1))).is_err();
}

#[test]
fn test_decode_response_len() {
    assert_that!(decode_response_len(&100i32.to_be_bytes(), 1024).unwrap()).is_equal_to(100);
}

#[test]
fn test_decode_response_len_rejects_negative_prefixes() {
    assert_that!(decode_response_len(&(-5i32).to_be_bytes(), 1024)).is_err();
}

#[test]
fn test_decode_response_len_rejects_prefixes_beyond_the_limit() {
    assert_that!(decode_response_len(&1025i32.to_be_bytes(), 1024)).is_err();
}

#[test]
fn test_decode_response_len_rejects_short_prefixes() {
    assert_that!(decode_response_len(&[0, 0, 1], 1024)).is_err();
}

#[test]
fn test_parse_offsets() {
    let mut body = Vec::new();
    body.extend(2i32.to_be_bytes());
    body.extend(100u64.to_be_bytes());
    body.extend(250u64.to_be_bytes());

    assert_that!(parse_offsets(&body).unwrap()).is_equal_to(vec![100, 250]);
}

#[test]
fn test_parse_offsets_empty_list() {
    assert_that!(parse_offsets(&0i32.to_be_bytes()).unwrap()).is_equal_to(Vec::new());
}

#[test]
fn test_parse_offsets_rejects_count_and_body_length_mismatch() {
    let mut body = Vec::new();
    body.extend(2i32.to_be_bytes());
    body.extend(100u64.to_be_bytes());

    let outcome = parse_offsets(&body);

    assert_that!(matches!(outcome, Err(CodecError::MalformedResponse(_)))).is_true();
}

#[test]
fn test_parse_offsets_rejects_negative_counts() {
    assert_that!(parse_offsets(&(-1i32).to_be_bytes())).is_err();
}

#[test]
fn test_parse_offsets_rejects_bodies_too_short_for_a_count() {
    assert_that!(parse_offsets(&[0, 0])).is_err();
}
