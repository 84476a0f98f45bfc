use crate::common::{BatchProducerConfig, Result};
use crate::observer::{Event, NoopObserver, Observer};
use crate::producer::Producer;
use protocol::message::Message;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[cfg(test)]
#[path = "batch_producer_test.rs"]
mod batch_producer_test;

/// How many times the flush worker may be started again after dying, over the whole lifetime of a [BatchProducer].
pub const MAX_RESPAWNS: u32 = 5;

enum Control {
    Shutdown,
}

/// Wraps a [Producer] with a pending-message queue and a background worker that flushes it every `batch_interval`.
/// [BatchProducer::enqueue] appends under a lock and returns immediately; the worker owns the only timer and drains
/// the queue periodically, or immediately when prodded through its control channel. The worker is started lazily on
/// the first enqueue and respawned if it dies, at most [MAX_RESPAWNS] times; once that budget is spent, messages
/// still enqueue but are only delivered by explicit [BatchProducer::flush] or [BatchProducer::close] calls (reported
/// once through the observer, since silently disabling auto-flush is otherwise invisible).
///
/// [BatchProducer::close] is a blocking, ordered shutdown: signal, final flush, join. If the worker is blocked
/// inside a network send there is no cancellation; close waits it out. Intended to run at process shutdown.
pub struct BatchProducer {
    shared: Arc<Mutex<Shared>>,
    batch_interval: Duration,
    observer: Arc<dyn Observer>,
    control: Option<Sender<Control>>,
    worker: Option<JoinHandle<()>>,
    spawns: u32,
    budget_reported: bool,
}

/// The producer lives under the same lock as the queue: a drain holds the lock across its send, which incidentally
/// serializes all network access between the worker and explicit flush calls.
struct Shared {
    producer: Producer,
    queue: Vec<Message>,
}

impl BatchProducer {
    pub fn new(config: BatchProducerConfig) -> Result<Self> {
        Self::with_observer(config, Arc::new(NoopObserver))
    }

    pub fn with_observer(config: BatchProducerConfig, observer: Arc<dyn Observer>) -> Result<Self> {
        let producer = Producer::with_observer(config.producer, Arc::clone(&observer))?;
        Ok(Self::new_with_producer(producer, config.batch_interval, observer))
    }

    fn new_with_producer(producer: Producer, batch_interval: Duration, observer: Arc<dyn Observer>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared { producer, queue: Vec::new() })),
            batch_interval,
            observer,
            control: None,
            worker: None,
            spawns: 0,
            budget_reported: false,
        }
    }

    /// Queues a message for the next periodic flush, then makes sure the flush worker is alive (starting or
    /// respawning it if the budget allows). The message is queued first, so it is kept even when reviving the worker
    /// fails; an error here reports the failed revival, not a lost message.
    pub fn enqueue(&mut self, message: Message) -> Result<()> {
        self.shared.lock().unwrap().queue.push(message);
        self.ensure_worker()
    }

    /// Sends every queued message now, as one call, and clears the queue. An empty queue is a no-op with zero
    /// network activity. On failure the queue is left intact.
    pub fn flush(&self) -> Result<()> {
        flush(&self.shared)
    }

    /// Signals the worker to stop, performs one final flush, and blocks until the worker has exited.
    pub fn close(mut self) -> Result<()> {
        if let Some(control) = self.control.take() {
            // the worker may already be gone, in which case the queue is drained just below anyway
            let _ = control.send(Control::Shutdown);
        }

        let outcome = flush(&self.shared);

        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }

        outcome
    }

    fn ensure_worker(&mut self) -> Result<()> {
        if self.worker.as_ref().is_some_and(|worker| !worker.is_finished()) {
            return Ok(());
        }

        if self.spawns > MAX_RESPAWNS {
            if !self.budget_reported {
                self.budget_reported = true;
                self.observer.handle(Event::RespawnBudgetExhausted { max: MAX_RESPAWNS });
            }
            return Ok(());
        }

        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }

        // the previous worker may have died on a connection-level failure, so start the new one on a fresh socket
        self.shared.lock().unwrap().producer.reconnect()?;

        self.spawns += 1;
        if self.spawns > 1 {
            self.observer.handle(Event::WorkerRespawned { attempt: self.spawns - 1 });
        }

        let (tx, rx) = mpsc::channel();
        let worker = FlushWorker {
            shared: Arc::clone(&self.shared),
            interval: self.batch_interval,
            observer: Arc::clone(&self.observer),
            control: rx,
        };

        self.control = Some(tx);
        self.worker = Some(thread::spawn(move || worker.run()));
        Ok(())
    }
}

struct FlushWorker {
    shared: Arc<Mutex<Shared>>,
    interval: Duration,
    observer: Arc<dyn Observer>,
    control: Receiver<Control>,
}

impl FlushWorker {
    /// Flush, then wait up to the batch interval or until a control signal, whichever comes first. A failed flush
    /// ends the task after reporting it, leaving the queue intact for the respawned worker (or an explicit flush).
    fn run(self) {
        loop {
            if let Err(e) = flush(&self.shared) {
                self.observer.handle(Event::FlushFailed { message: e.to_string() });
                return;
            }

            match self.control.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(Control::Shutdown) | Err(RecvTimeoutError::Disconnected) => return,
            }
        }
    }
}

fn flush(shared: &Mutex<Shared>) -> Result<()> {
    let mut guard = shared.lock().unwrap();
    let Shared { producer, queue } = &mut *guard;

    if queue.is_empty() {
        return Ok(());
    }

    producer.send(queue)?;
    queue.clear();
    Ok(())
}
