//! Drives a [`TimerStateMachine`] with a real one-second tick.
//!
//! The service owns the machine behind an async mutex and keeps a [`Ticker`]
//! alive exactly while the machine is Running. Events produced by ticks and
//! by store responses are forwarded on the channel returned from
//! [`TimerService::new`]; command events are returned to the caller. Store
//! responses are drained after every command whether or not the ticker runs,
//! so a failure surfaces as a notification right away.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

use super::machine::TimerStateMachine;
use super::ticker::{TickFlow, Ticker};
use crate::entry::SessionStatus;
use crate::error::TimerError;
use crate::events::Event;

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub struct TimerService {
    machine: Arc<Mutex<TimerStateMachine>>,
    ticker: Ticker,
    period: Duration,
    events_tx: mpsc::UnboundedSender<Event>,
}

impl TimerService {
    pub fn new(machine: TimerStateMachine) -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let service = Self {
            machine: Arc::new(Mutex::new(machine)),
            ticker: Ticker::new(),
            period: TICK_PERIOD,
            events_tx,
        };
        (service, events_rx)
    }

    /// Override the wall-clock tick period. Each tick still counts as one second.
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub async fn hydrate(&mut self) -> Result<Event, TimerError> {
        let snapshot = self.machine.lock().await.hydrate().await?;
        self.sync_ticker().await;
        Ok(snapshot)
    }

    pub async fn start(
        &mut self,
        subject_id: &str,
        activity_id: Option<&str>,
        label: Option<&str>,
    ) -> Event {
        let event = self
            .machine
            .lock()
            .await
            .start(subject_id, activity_id, label);
        self.after_command().await;
        event
    }

    pub async fn pause(&mut self) -> Result<Event, TimerError> {
        let event = self.machine.lock().await.pause();
        self.after_command().await;
        event
    }

    pub async fn resume(&mut self) -> Result<Event, TimerError> {
        let event = self.machine.lock().await.resume();
        self.after_command().await;
        event
    }

    pub async fn stop(&mut self) -> Result<Event, TimerError> {
        let event = self.machine.lock().await.stop();
        self.after_command().await;
        event
    }

    /// Wait for outstanding store calls and return what they produced.
    pub async fn settle(&self) -> Vec<Event> {
        self.machine.lock().await.settle().await
    }

    pub async fn snapshot(&self) -> Event {
        self.machine.lock().await.snapshot()
    }

    pub async fn status(&self) -> SessionStatus {
        self.machine.lock().await.status()
    }

    pub async fn elapsed(&self) -> u64 {
        self.machine.lock().await.elapsed()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_active()
    }

    /// Stop ticking and flush outstanding store calls.
    pub async fn shutdown(&mut self) -> Vec<Event> {
        self.ticker.cancel();
        self.settle().await
    }

    async fn after_command(&mut self) {
        self.sync_ticker().await;
        self.drain_responses();
    }

    /// Apply the store responses to commands issued so far and forward the
    /// resulting events.
    fn drain_responses(&self) {
        let machine = Arc::clone(&self.machine);
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            let produced = machine.lock().await.settle().await;
            for event in produced {
                let _ = events.send(event);
            }
        });
    }

    /// (Re)start the ticker on entering Running; cancel it otherwise.
    async fn sync_ticker(&mut self) {
        let running = self.machine.lock().await.is_running();
        if !running {
            self.ticker.cancel();
            return;
        }

        let machine = Arc::clone(&self.machine);
        let events = self.events_tx.clone();
        self.ticker.start(self.period, move || {
            let machine = Arc::clone(&machine);
            let events = events.clone();
            async move {
                let mut machine = machine.lock().await;
                let mut produced = machine.poll_responses();
                produced.extend(machine.tick());
                let flow = if machine.is_running() {
                    TickFlow::Continue
                } else {
                    // A policy pause or stop was just dispatched; nothing
                    // polls once the schedule ends.
                    produced.extend(machine.settle().await);
                    TickFlow::Stop
                };
                for event in produced {
                    let _ = events.send(event);
                }
                flow
            }
        });
    }
}
