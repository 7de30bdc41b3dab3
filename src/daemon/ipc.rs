//! Loopback request/response protocol between the daemon and the CLI.
//!
//! One JSON object per line in each direction, one exchange per connection:
//! `{"type":"GET_STATE"}` answers with the last snapshot, `{"type":"FORCE_REFRESH"}`
//! runs a cycle and answers `{"ok":true}`. Anything else gets `{"ok":false}`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use super::events::Event;
use crate::models::StateSnapshot;

const IO_TIMEOUT: Duration = Duration::from_secs(5);
/// A forced refresh may wait behind a cycle already in flight.
const REPLY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    GetState,
    ForceRefresh,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    State(StateSnapshot),
    Ack { ok: bool },
}

pub fn loopback(port: u16) -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, port))
}

/// Accept connections on a background thread, forwarding each request into the event loop.
pub fn spawn_server(listener: TcpListener, events: mpsc::Sender<Event>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("IPC accept failed: {}", e);
                    continue;
                }
            };
            if let Err(e) = serve_connection(stream, &events) {
                log::warn!("IPC connection failed: {:#}", e);
            }
        }
    })
}

fn serve_connection(stream: TcpStream, events: &mpsc::Sender<Event>) -> Result<()> {
    stream.set_read_timeout(Some(IO_TIMEOUT))?;
    stream.set_write_timeout(Some(IO_TIMEOUT))?;
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();
    reader.read_line(&mut line).context("Reading request")?;

    let response = dispatch(&line, events);
    let mut stream = stream;
    let mut body = serde_json::to_string(&response)?;
    body.push('\n');
    stream.write_all(body.as_bytes()).context("Writing response")?;
    Ok(())
}

fn dispatch(line: &str, events: &mpsc::Sender<Event>) -> Response {
    let request: Request = match serde_json::from_str(line.trim()) {
        Ok(r) => r,
        Err(e) => {
            log::debug!("Unrecognised IPC message {:?}: {}", line.trim(), e);
            return Response::Ack { ok: false };
        }
    };
    let (reply_tx, reply_rx) = mpsc::channel();
    if events.send(Event::Request(request, reply_tx)).is_err() {
        return Response::Ack { ok: false };
    }
    reply_rx
        .recv_timeout(REPLY_TIMEOUT)
        .unwrap_or(Response::Ack { ok: false })
}

/// Send one request to a running daemon.
pub fn send_request(port: u16, request: Request) -> Result<Response> {
    let addr = loopback(port);
    let mut stream = TcpStream::connect_timeout(&addr, IO_TIMEOUT)
        .with_context(|| format!("Connecting to daemon at {}", addr))?;
    stream.set_read_timeout(Some(REPLY_TIMEOUT))?;

    let mut body = serde_json::to_string(&request)?;
    body.push('\n');
    stream.write_all(body.as_bytes())?;

    let mut line = String::new();
    BufReader::new(stream)
        .read_line(&mut line)
        .context("Reading daemon response")?;
    serde_json::from_str(line.trim()).context("Parsing daemon response")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::models::{ErrorState, Settings};

    /// Answers requests the way the daemon loop does, from a fixed snapshot.
    fn fake_loop(rx: mpsc::Receiver<Event>, snapshot: StateSnapshot) {
        thread::spawn(move || {
            while let Ok(event) = rx.recv() {
                if let Event::Request(req, reply) = event {
                    let response = match req {
                        Request::GetState => Response::State(snapshot.clone()),
                        Request::ForceRefresh => Response::Ack { ok: true },
                    };
                    let _ = reply.send(response);
                }
            }
        });
    }

    fn error_snapshot() -> StateSnapshot {
        StateSnapshot::Error(ErrorState {
            error: "No timings for 2027-01-01".to_string(),
            settings: Settings::default(),
            evaluated_at: chrono::Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap(),
        })
    }

    fn start() -> u16 {
        let listener = TcpListener::bind(loopback(0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        let (tx, rx) = mpsc::channel();
        fake_loop(rx, error_snapshot());
        spawn_server(listener, tx);
        port
    }

    #[test]
    fn wire_names_match_protocol() {
        assert_eq!(serde_json::to_string(&Request::GetState).unwrap(), r#"{"type":"GET_STATE"}"#);
        assert_eq!(
            serde_json::to_string(&Request::ForceRefresh).unwrap(),
            r#"{"type":"FORCE_REFRESH"}"#
        );
        let ack: Response = serde_json::from_str(r#"{"ok":true}"#).unwrap();
        assert_eq!(ack, Response::Ack { ok: true });
    }

    #[test]
    fn get_state_and_force_refresh_over_loopback() {
        let port = start();
        assert_eq!(send_request(port, Request::GetState).unwrap(), Response::State(error_snapshot()));
        assert_eq!(send_request(port, Request::ForceRefresh).unwrap(), Response::Ack { ok: true });
    }

    #[test]
    fn unknown_message_gets_negative_ack() {
        let port = start();
        let mut stream = TcpStream::connect(loopback(port)).unwrap();
        stream.write_all(b"{\"type\":\"PING\"}\n").unwrap();
        let mut line = String::new();
        BufReader::new(stream).read_line(&mut line).unwrap();
        let response: Response = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(response, Response::Ack { ok: false });
    }

    #[test]
    fn no_daemon_is_a_connection_error() {
        let listener = TcpListener::bind(loopback(0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        assert!(send_request(port, Request::GetState).is_err());
    }
}
