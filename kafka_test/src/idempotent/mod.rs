//! Idempotent producer scenario
//!
//! Exercises InitProducerId and sequenced produce through the gateway.

mod basic;

pub use basic::test_idempotent_producer;
