use mockall::automock;

/// Diagnostic events the library reports out-of-band: conditions worth surfacing that are not (or not only) errors
/// returned to the caller.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Event {
    /// The reset probe found readable bytes right after a send, meaning the broker closed the stream.
    ResetDetected { host: String, port: u16 },
    /// The reset probe itself failed with something other than would-block.
    PeekFailed { message: String },
    /// A background flush failed; the flush worker exits after reporting this and gets respawned on the next
    /// enqueue while the respawn budget lasts.
    FlushFailed { message: String },
    /// The flush worker was started again after dying. `attempt` counts respawns, not the initial start.
    WorkerRespawned { attempt: u32 },
    /// The respawn budget is spent: messages still enqueue but are only delivered by explicit `flush`/`close` calls.
    RespawnBudgetExhausted { max: u32 },
}

/// Receives [Event]s from the connection and the batch producer. Injected at construction rather than relying on
/// ambient global logging, so embedders decide where diagnostics go (and tests can assert on them).
#[automock]
pub trait Observer: Send + Sync {
    fn handle(&self, event: Event);
}

/// Discards every event. The default when no observer is injected.
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn handle(&self, _event: Event) {}
}

/// Forwards events to `tracing`.
pub struct LogObserver;

impl Observer for LogObserver {
    fn handle(&self, event: Event) {
        match event {
            Event::ResetDetected { host, port } => tracing::warn!(host = %host, port, "broker closed the connection"),
            Event::PeekFailed { message } => tracing::error!(message = %message, "connection reset probe failed"),
            Event::FlushFailed { message } => tracing::error!(message = %message, "background flush failed, worker exiting"),
            Event::WorkerRespawned { attempt } => tracing::info!(attempt, "flush worker respawned"),
            Event::RespawnBudgetExhausted { max } => {
                tracing::warn!(max, "flush worker respawn budget exhausted, messages will only flush explicitly")
            }
        }
    }
}
