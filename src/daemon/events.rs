use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use super::ipc::{Request, Response};

#[derive(Debug)]
pub enum Event {
    Tick,
    /// A client request plus the channel its answer goes back on.
    Request(Request, mpsc::Sender<Response>),
}

/// Single queue feeding the evaluation loop. Ticks and client requests are
/// handled one at a time, in arrival order.
pub struct EventHandler {
    tx: mpsc::Sender<Event>,
    rx: mpsc::Receiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let ticker = tx.clone();

        thread::spawn(move || loop {
            thread::sleep(tick_rate);
            if ticker.send(Event::Tick).is_err() {
                break;
            }
        });

        Self { tx, rx }
    }

    pub fn sender(&self) -> mpsc::Sender<Event> {
        self.tx.clone()
    }

    pub fn next(&self) -> Result<Event, mpsc::RecvError> {
        self.rx.recv()
    }
}
