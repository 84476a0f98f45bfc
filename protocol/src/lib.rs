//! The broker speaks a single binary wire format that producers and consumers understand without any conversion:
//! big-endian fixed-width fields, explicit length prefixes, no delimiters and no checksums. This crate implements
//! that format as pure encode/decode functions with no I/O of their own, so the clients only have to move bytes.

pub mod message;
pub mod request;
