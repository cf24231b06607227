//! Single-slot WebSocket server.
//!
//! Only the most recent browser connection is kept; a new connection
//! replaces (and closes) the previous one. Reloading closes the slot.

use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::message::ReloadMessage;
use super::script_tag;
use crate::dispatch::{ReloadSignal, SyncOutcome};
use crate::{debug, log};

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// A browser that stops reading is dropped after this long.
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

type Slot = Arc<Mutex<Option<WebSocket<TcpStream>>>>;

/// Live reload server handle.
#[derive(Clone)]
pub struct LiveReload {
    slot: Slot,
    port: u16,
}

impl LiveReload {
    /// Bind on `127.0.0.1:<base_port>` (or the next free port) and accept
    /// clients on a background thread.
    pub fn start(base_port: u16) -> Result<Self> {
        let (listener, port) = try_bind_port(base_port, MAX_PORT_RETRIES)?;
        if port != base_port && base_port != 0 {
            log!("reload"; "port {} in use, using {} instead", base_port, port);
        }

        let slot: Slot = Arc::new(Mutex::new(None));
        let accept_slot = Arc::clone(&slot);
        std::thread::spawn(move || accept_loop(listener, accept_slot));

        Ok(Self { slot, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `<script>` tag injected into proxied pages.
    pub fn script_tag(&self) -> String {
        script_tag(self.port)
    }

    #[cfg(test)]
    pub fn has_client(&self) -> bool {
        self.slot.lock().is_some()
    }
}

impl ReloadSignal for LiveReload {
    fn reload(&self, outcome: &SyncOutcome) {
        let Some(mut ws) = self.slot.lock().take() else {
            debug!("reload"; "no client connected");
            return;
        };

        let message = ReloadMessage::reload(outcome).to_json();
        if let Err(e) = ws.send(Message::Text(message.into())) {
            debug!("reload"; "failed to send outcome: {}", e);
        }
        close(&mut ws);
        debug!("reload"; "client closed after {} {}", outcome.log_kind, outcome.key);
    }
}

fn accept_loop(listener: TcpListener, slot: Slot) {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                log!("reload"; "accept error: {}", e);
                std::thread::sleep(Duration::from_millis(100));
                continue;
            }
        };

        let peer = stream.peer_addr().ok();
        if let Err(e) = stream.set_write_timeout(Some(WRITE_TIMEOUT)) {
            log!("reload"; "failed to set write timeout: {}", e);
            continue;
        }
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                if let Err(e) = ws.send(Message::Text(ReloadMessage::connected().to_json().into())) {
                    log!("reload"; "failed to send greeting: {}", e);
                    continue;
                }
                debug!("reload"; "client connected: {:?}", peer);
                if let Some(mut previous) = slot.lock().replace(ws) {
                    close(&mut previous);
                }
            }
            Err(e) => log!("reload"; "handshake failed: {}", e),
        }
    }
}

fn close(ws: &mut WebSocket<TcpStream>) {
    if let Err(e) = ws.close(None).and_then(|()| ws.flush()) {
        debug!("reload"; "close: {}", e);
    }
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(("127.0.0.1", port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::task::LogKind;

    fn connect(port: u16) -> WebSocket<tungstenite::stream::MaybeTlsStream<TcpStream>> {
        let (ws, _) = tungstenite::connect(format!("ws://127.0.0.1:{port}")).unwrap();
        ws
    }

    fn wait_for_client(server: &LiveReload) {
        let start = Instant::now();
        while !server.has_client() {
            assert!(start.elapsed() < Duration::from_secs(5), "client never registered");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    fn outcome() -> SyncOutcome {
        SyncOutcome {
            log_kind: LogKind::Uploaded,
            key: "assets/checkout.min.js".into(),
        }
    }

    #[test]
    fn test_greeting_then_reload_closes_connection() {
        let server = LiveReload::start(0).unwrap();
        let mut client = connect(server.port());

        let greeting = client.read().unwrap();
        assert!(greeting.to_text().unwrap().contains("connected"));
        wait_for_client(&server);

        server.reload(&outcome());
        assert!(!server.has_client());

        let reload = client.read().unwrap();
        assert!(reload.to_text().unwrap().contains("assets/checkout.min.js"));
        assert!(matches!(client.read().unwrap(), Message::Close(_)));
    }

    #[test]
    fn test_reload_without_client_is_noop() {
        let server = LiveReload::start(0).unwrap();
        server.reload(&outcome());
        assert!(!server.has_client());
    }

    #[test]
    fn test_new_client_replaces_previous() {
        let server = LiveReload::start(0).unwrap();
        let mut first = connect(server.port());
        first.read().unwrap();
        wait_for_client(&server);

        let mut second = connect(server.port());
        second.read().unwrap();

        // The first connection is closed once the second registers.
        assert!(matches!(first.read().unwrap(), Message::Close(_)));
        wait_for_client(&server);
    }

    #[test]
    fn test_stalled_client_does_not_block_reload() {
        let server = LiveReload::start(0).unwrap();
        let mut client = connect(server.port());
        client.read().unwrap();
        wait_for_client(&server);

        // Far more than the loopback socket buffers hold; the client never reads it.
        let outcome = SyncOutcome {
            log_kind: LogKind::Uploaded,
            key: "x".repeat(64 * 1024 * 1024),
        };
        let start = Instant::now();
        server.reload(&outcome);
        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(!server.has_client());
    }

    #[test]
    fn test_port_retry_skips_busy_port() {
        let busy = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = busy.local_addr().unwrap().port();
        let (_listener, actual) = try_bind_port(port, 3).unwrap();
        assert_ne!(actual, port);
    }
}
