//! Producer scenarios
//!
//! - Basic produce/consume round trip with string keys and values
//! - Serializer compatibility (string key, raw byte value)

mod basic;
mod serializers;

pub use basic::test_basic_produce_consume;
pub use serializers::test_serializers;
