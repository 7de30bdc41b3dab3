//! Long-running process: periodic evaluation, alarm dispatch and the IPC endpoint.

pub mod events;
pub mod ipc;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone, Utc};
use rusqlite::Connection;
use std::net::TcpListener;

use crate::config::AppConfig;
use crate::db::SqliteSettingsStore;
use crate::engine::{Engine, Facilities};
use crate::notify::{AlarmTable, BadgeFile, DesktopNotifier};
use crate::prayer_times::JsonFileTimetable;
use events::{Event, EventHandler};
use ipc::{Request, Response};

pub const APP_NAME: &str = "next-prayer";

/// Drives an [`Engine`] from the event queue. Owns the refresh cadence.
pub struct Daemon<Tz: TimeZone> {
    engine: Engine<Tz>,
    refresh_every: chrono::Duration,
    last_refresh: Option<DateTime<Utc>>,
}

impl<Tz: TimeZone> Daemon<Tz> {
    pub fn new(engine: Engine<Tz>, refresh_every: std::time::Duration) -> Self {
        let refresh_every =
            chrono::Duration::from_std(refresh_every).unwrap_or_else(|_| chrono::Duration::seconds(60));
        Self {
            engine,
            refresh_every,
            last_refresh: None,
        }
    }

    pub fn engine(&self) -> &Engine<Tz> {
        &self.engine
    }

    pub fn handle(&mut self, event: Event, now: DateTime<Utc>) {
        match event {
            Event::Tick => self.on_tick(now),
            Event::Request(request, reply) => {
                let response = self.on_request(request, now);
                if reply.send(response).is_err() {
                    log::debug!("IPC client went away before {:?} was answered", request);
                }
            }
        }
    }

    fn on_tick(&mut self, now: DateTime<Utc>) {
        if self.engine.poll_alarms(now) > 0 {
            self.last_refresh = Some(now);
        }
        let due = match self.last_refresh {
            None => true,
            // A clock that jumped backwards also forces a cycle.
            Some(last) => now - last >= self.refresh_every || now < last,
        };
        if due {
            self.refresh(now);
        }
    }

    fn on_request(&mut self, request: Request, now: DateTime<Utc>) -> Response {
        match request {
            Request::GetState => Response::State(self.engine.state().clone()),
            Request::ForceRefresh => {
                log::info!("Forced refresh requested");
                self.refresh(now);
                Response::Ack { ok: true }
            }
        }
    }

    fn refresh(&mut self, now: DateTime<Utc>) {
        self.engine.refresh(now);
        self.last_refresh = Some(now);
        log::debug!("Cycle done, reminders target {:?}", self.engine.last_scheduled());
    }

    /// Consume events until every sender is gone.
    pub fn run(mut self, events: &EventHandler) {
        while let Ok(event) = events.next() {
            self.handle(event, Utc::now());
        }
    }
}

/// Build the production engine and serve until killed.
pub fn run(conn: Connection, config: &AppConfig) -> Result<()> {
    let timetable_path = config.timetable_path()?;
    let badge_path = config.badge_path()?;
    log::info!(
        "Starting daemon (timetable {:?}, badge {:?}, port {})",
        timetable_path,
        badge_path,
        config.daemon.ipc_port
    );

    let engine = Engine::new(
        Local,
        Facilities {
            settings: Box::new(SqliteSettingsStore::new(conn)),
            timetable: Box::new(JsonFileTimetable::new(timetable_path)),
            timers: Box::new(AlarmTable::new()),
            notifier: Box::new(DesktopNotifier::new(APP_NAME)),
            badge: Box::new(BadgeFile::new(badge_path)),
        },
    );

    let addr = ipc::loopback(config.daemon.ipc_port);
    let listener =
        TcpListener::bind(addr).with_context(|| format!("Binding IPC endpoint {}", addr))?;

    let events = EventHandler::new(config.daemon.poll_interval());
    ipc::spawn_server(listener, events.sender());

    let mut daemon = Daemon::new(engine, config.daemon.refresh_interval());
    // Evaluate at startup rather than waiting for the first tick.
    daemon.refresh(Utc::now());
    daemon.run(&events);
    Ok(())
}
