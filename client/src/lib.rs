//! This crate contains the producer and consumer clients that talk to a single broker over its binary TCP protocol.
//! Everything is synchronous and blocking: the consumer tracks an explicit byte-offset cursor into one topic
//! partition, and the producer packs messages into size-bounded produce requests, optionally batched in the
//! background by [producer::BatchProducer].

pub mod common;
pub mod connection;
pub mod consumer;
pub mod observer;
pub mod producer;

#[cfg(test)]
mod test_utils;
