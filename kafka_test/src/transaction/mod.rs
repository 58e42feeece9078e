//! Transaction scenarios
//!
//! - Exactly-once semantics: commit and abort on one transactional id, then
//!   a read_committed consumer that must only see the committed batch

mod eos;

pub use eos::test_exactly_once;
