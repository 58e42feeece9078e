//! Consume-transform-produce application
//!
//! A minimal streams runtime: one consumer group named after the application
//! id, one producer for the sink, and a lifecycle state driven by the
//! consumer's rebalance callbacks.

use std::fmt;
use std::time::Duration;

use rdkafka::client::ClientContext;
use rdkafka::consumer::{BaseConsumer, CommitMode, Consumer, ConsumerContext, Rebalance, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::topology::Topology;
use crate::common::{create_producer, TestResult, TEST_TIMEOUT};
use crate::config::SuiteConfig;

/// Lifecycle of a streams application
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppState {
    Created,
    Rebalancing,
    Running,
    PendingShutdown,
    NotRunning,
    Error,
}

impl AppState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppState::Created => "CREATED",
            AppState::Rebalancing => "REBALANCING",
            AppState::Running => "RUNNING",
            AppState::PendingShutdown => "PENDING_SHUTDOWN",
            AppState::NotRunning => "NOT_RUNNING",
            AppState::Error => "ERROR",
        }
    }

    pub fn can_transition_to(&self, next: AppState) -> bool {
        use AppState::*;
        matches!(
            (self, next),
            (Created, Rebalancing | PendingShutdown | Error)
                | (Rebalancing, Running | PendingShutdown | Error)
                | (Running, Rebalancing | PendingShutdown | Error)
                | (Error, PendingShutdown)
                | (PendingShutdown, NotRunning)
        )
    }
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner of the state; invalid transitions are ignored
pub struct StateHandle {
    tx: watch::Sender<AppState>,
}

impl StateHandle {
    pub fn new() -> (Self, watch::Receiver<AppState>) {
        let (tx, rx) = watch::channel(AppState::Created);
        (Self { tx }, rx)
    }

    pub fn get(&self) -> AppState {
        *self.tx.borrow()
    }

    /// Move to `next` if allowed, returning whether the state changed
    pub fn transition(&self, next: AppState) -> bool {
        self.tx.send_if_modified(|current| {
            if current.can_transition_to(next) {
                info!("Streams state changed from {} to {}", current, next);
                *current = next;
                true
            } else {
                debug!("Ignoring streams transition {} -> {}", current, next);
                false
            }
        })
    }
}

/// Consumer context translating rebalance callbacks into app states
pub struct StreamsContext {
    state: StateHandle,
}

impl ClientContext for StreamsContext {}

impl ConsumerContext for StreamsContext {
    fn pre_rebalance(&self, _base_consumer: &BaseConsumer<Self>, rebalance: &Rebalance<'_>) {
        if let Rebalance::Error(e) = rebalance {
            warn!("Rebalance error: {}", e);
            self.state.transition(AppState::Error);
        } else {
            self.state.transition(AppState::Rebalancing);
        }
    }

    fn post_rebalance(&self, _base_consumer: &BaseConsumer<Self>, rebalance: &Rebalance<'_>) {
        match rebalance {
            Rebalance::Assign(tpl) => {
                debug!(partitions = tpl.count(), "Partitions assigned");
                self.state.transition(AppState::Running);
            }
            Rebalance::Revoke(_) => {
                self.state.transition(AppState::Rebalancing);
            }
            Rebalance::Error(e) => {
                warn!("Rebalance error: {}", e);
                self.state.transition(AppState::Error);
            }
        }
    }
}

type AppConsumer = StreamConsumer<StreamsContext>;

pub struct StreamsApp {
    application_id: String,
    state: watch::Receiver<AppState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<TestResult<u64>>,
}

impl StreamsApp {
    /// Subscribe to the topology's source and start processing in the background
    pub fn start(
        config: &SuiteConfig,
        application_id: &str,
        topology: Topology,
        commit_interval: Duration,
    ) -> TestResult<Self> {
        let (state, rx) = StateHandle::new();

        let consumer: AppConsumer = config
            .client_config("streams-app")
            .set("group.id", application_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "false")
            .set("session.timeout.ms", "10000")
            .create_with_context(StreamsContext { state })?;
        consumer.subscribe(&[topology.source()])?;

        let producer = create_producer(config)?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        info!(application_id, "Starting streams application");
        let task = tokio::spawn(run(consumer, producer, topology, commit_interval, shutdown_rx));

        Ok(Self {
            application_id: application_id.to_string(),
            state: rx,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn state(&self) -> AppState {
        *self.state.borrow()
    }

    /// Wait for RUNNING; entering ERROR fails immediately
    pub async fn wait_until_running(&mut self, timeout: Duration) -> TestResult {
        let waited = tokio::time::timeout(
            timeout,
            self.state
                .wait_for(|s| matches!(s, AppState::Running | AppState::Error)),
        )
        .await
        .map(|res| res.map(|state| *state));

        match waited {
            Ok(Ok(AppState::Running)) => Ok(()),
            Ok(Ok(state)) => Err(format!("Streams entered {} state", state).into()),
            Ok(Err(_)) => Err(format!(
                "Streams task stopped before RUNNING, last state {}",
                self.state()
            )
            .into()),
            Err(_) => Err(format!(
                "Streams did not reach RUNNING within {:?}, last state {}",
                timeout,
                self.state()
            )
            .into()),
        }
    }

    /// Stop processing and return how many records reached the sink
    pub async fn close(mut self, timeout: Duration) -> TestResult<u64> {
        if let Some(shutdown) = self.shutdown.take() {
            // The task may already have exited on error
            let _ = shutdown.send(());
        }

        match tokio::time::timeout(timeout, &mut self.task).await {
            Ok(joined) => joined?,
            Err(_) => {
                self.task.abort();
                Err(format!("Streams did not shut down within {:?}", timeout).into())
            }
        }
    }
}

async fn run(
    consumer: AppConsumer,
    producer: FutureProducer,
    topology: Topology,
    commit_interval: Duration,
    mut shutdown: oneshot::Receiver<()>,
) -> TestResult<u64> {
    let state = &consumer.context().state;
    let mut commit_timer = tokio::time::interval(commit_interval);
    let mut processed = 0u64;
    let mut uncommitted = false;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = commit_timer.tick() => {
                if uncommitted {
                    if let Err(e) = consumer.commit_consumer_state(CommitMode::Async) {
                        warn!(error = %e, "Periodic commit failed");
                    }
                    uncommitted = false;
                }
            }
            received = consumer.recv() => {
                let msg = match received {
                    Ok(msg) => msg.detach(),
                    Err(KafkaError::MessageConsumptionFatal(code)) => {
                        state.transition(AppState::Error);
                        return Err(KafkaError::MessageConsumptionFatal(code).into());
                    }
                    Err(e) => {
                        warn!(error = %e, "Consume error");
                        continue;
                    }
                };
                uncommitted = true;

                let Some(output) = topology.process(msg.payload()) else {
                    continue;
                };
                let mut record = FutureRecord::to(topology.sink()).payload(&output);
                if let Some(key) = msg.key() {
                    record = record.key(key);
                }
                if let Err((e, _msg)) = producer.send(record, TEST_TIMEOUT).await {
                    state.transition(AppState::Error);
                    return Err(e.into());
                }
                processed += 1;
            }
        }
    }

    state.transition(AppState::PendingShutdown);
    if uncommitted {
        if let Err(e) = consumer.commit_consumer_state(CommitMode::Sync) {
            warn!(error = %e, "Final commit failed");
        }
    }
    consumer.unsubscribe();
    state.transition(AppState::NotRunning);
    info!(processed, "Streams application stopped");
    Ok(processed)
}
