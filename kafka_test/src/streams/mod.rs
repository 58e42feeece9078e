//! Streams-style processing scenario
//!
//! - `topology`: filter / map_values chain between a source and a sink topic
//! - `app`: background consume-transform-produce loop with lifecycle states
//! - `pipeline`: the scenario that drives both against the endpoint

mod app;
mod pipeline;
mod topology;

pub use app::{AppState, StateHandle, StreamsApp};
pub use pipeline::test_streams;
pub use topology::{uppercase_topology, Topology};
