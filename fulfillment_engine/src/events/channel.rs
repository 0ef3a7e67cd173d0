//! Fan-out of fulfillment events to subscribers.
//!
//! Each kind of event (an order was confirmed, a message changed status) has one [`EventHandler`] with a bounded queue.
//! The pipeline publishes through cheap, cloneable [`EventProducer`]s and never waits on a subscriber: every event is
//! handled on its own task. The handler stops once every producer has been dropped and the events already taken off
//! the queue have been handled.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

/// A subscriber callback. It gets its own copy of each event.
pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    queue: mpsc::Receiver<E>,
    publisher: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(queue_size: usize, handler: Handler<E>) -> Self {
        let (publisher, queue) = mpsc::channel(queue_size);
        Self { queue, publisher, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.publisher.clone())
    }

    /// Handles events until the last producer is gone, then waits for the handlers still running.
    pub async fn start_handler(self) {
        let Self { mut queue, publisher, handler } = self;
        // Only the producers handed out by `subscribe` may keep the queue open
        drop(publisher);
        debug!("📬️ Event handler started");
        let mut in_flight = JoinSet::new();
        loop {
            tokio::select! {
                event = queue.recv() => match event {
                    Some(event) => {
                        trace!("📬️ Handing event to subscriber");
                        in_flight.spawn((handler)(event));
                    },
                    None => break,
                },
                Some(done) = in_flight.join_next(), if !in_flight.is_empty() => report(done),
            }
        }
        if !in_flight.is_empty() {
            debug!("📬️ All producers are gone. Waiting for {} event(s) to finish.", in_flight.len());
        }
        while let Some(done) = in_flight.join_next().await {
            report(done);
        }
        debug!("📬️ Event handler has shut down");
    }
}

fn report(done: Result<(), tokio::task::JoinError>) {
    match done {
        Ok(()) => trace!("📬️ Event handled"),
        Err(e) => warn!("📬️ An event subscriber did not finish: {e}"),
    }
}

#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    publisher: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(publisher: mpsc::Sender<E>) -> Self {
        Self { publisher }
    }

    /// Queues the event. Waits only if the queue is full, and logs rather than fails if the handler has shut down.
    pub async fn publish_event(&self, event: E) {
        if self.publisher.send(event).await.is_err() {
            error!("📬️ The event handler has shut down. Event dropped.");
        }
    }
}
