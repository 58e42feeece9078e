//! Stateless processing topology
//!
//! A linear chain of value operations between one source topic and one sink
//! topic. Null and non-UTF-8 values never reach the chain.

use std::fmt;
use std::sync::Arc;

type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;
type Mapper = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Clone)]
enum Step {
    Filter(Predicate),
    MapValues(Mapper),
}

impl Step {
    fn label(&self, index: usize) -> String {
        match self {
            Step::Filter(_) => format!("FILTER-{:04}", index),
            Step::MapValues(_) => format!("MAPVALUES-{:04}", index),
        }
    }
}

#[derive(Clone)]
pub struct Topology {
    source: String,
    sink: String,
    steps: Vec<Step>,
}

impl Topology {
    pub fn builder(source: impl Into<String>) -> TopologyBuilder {
        TopologyBuilder {
            source: source.into(),
            steps: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn sink(&self) -> &str {
        &self.sink
    }

    /// Run one value through the chain; `None` means it was filtered out
    pub fn process(&self, value: Option<&[u8]>) -> Option<String> {
        let mut current = std::str::from_utf8(value?).ok()?.to_string();
        for step in &self.steps {
            match step {
                Step::Filter(keep) => {
                    if !keep(&current) {
                        return None;
                    }
                }
                Step::MapValues(map) => current = map(&current),
            }
        }
        Some(current)
    }

    /// Human-readable node listing, logged when the app starts
    pub fn describe(&self) -> String {
        let mut out = String::from("Sub-topology: 0\n");
        out.push_str(&format!("  Source: SOURCE (topics: [{}])\n", self.source));
        for (i, step) in self.steps.iter().enumerate() {
            out.push_str(&format!("  Processor: {}\n", step.label(i + 1)));
        }
        out.push_str(&format!("  Sink: SINK (topic: {})", self.sink));
        out
    }
}

impl fmt::Debug for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topology")
            .field("source", &self.source)
            .field("sink", &self.sink)
            .field("steps", &self.steps.len())
            .finish()
    }
}

pub struct TopologyBuilder {
    source: String,
    steps: Vec<Step>,
}

impl TopologyBuilder {
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.steps.push(Step::Filter(Arc::new(predicate)));
        self
    }

    pub fn map_values<F>(mut self, mapper: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.steps.push(Step::MapValues(Arc::new(mapper)));
        self
    }

    pub fn to(self, sink: impl Into<String>) -> Topology {
        Topology {
            source: self.source,
            sink: sink.into(),
            steps: self.steps,
        }
    }
}

/// Drop empty values, then `"PROCESSED: " + upper(value)`
pub fn uppercase_topology(input: &str, output: &str) -> Topology {
    Topology::builder(input)
        .filter(|value| !value.is_empty())
        .map_values(|value| format!("PROCESSED: {}", value.to_uppercase()))
        .to(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uppercase_topology() {
        let topology = uppercase_topology("in", "out");
        assert_eq!(
            topology.process(Some(b"stream-test-message".as_slice())),
            Some("PROCESSED: STREAM-TEST-MESSAGE".to_string())
        );
        assert_eq!(topology.source(), "in");
        assert_eq!(topology.sink(), "out");
    }

    #[test]
    fn test_null_and_empty_values_are_filtered() {
        let topology = uppercase_topology("in", "out");
        assert_eq!(topology.process(None), None);
        assert_eq!(topology.process(Some(b"".as_slice())), None);
        assert_eq!(topology.process(Some([0xffu8, 0xfe].as_slice())), None);
    }

    #[test]
    fn test_steps_run_in_order() {
        // Filter after map sees the mapped value
        let topology = Topology::builder("in")
            .map_values(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .to("out");
        assert_eq!(topology.process(Some(b"   ".as_slice())), None);
        assert_eq!(topology.process(Some(b" x ".as_slice())), Some("x".to_string()));
    }

    #[test]
    fn test_describe_lists_nodes() {
        let description = uppercase_topology("streams-input", "streams-output").describe();
        assert!(description.contains("topics: [streams-input]"));
        assert!(description.contains("FILTER-0001"));
        assert!(description.contains("MAPVALUES-0002"));
        assert!(description.ends_with("Sink: SINK (topic: streams-output)"));
    }
}
