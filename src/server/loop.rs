// Server loop module
// Accepts connections until shutdown is requested, then waits for them to drain

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// Poll interval while waiting for connections to finish
const DRAIN_POLL: Duration = Duration::from_millis(100);

/// Accept loop; returns once shutdown is requested, dropping the listener
pub async fn start_server_loop(listener: TcpListener, state: Arc<AppState>) {
    // registered before the first check so a notification cannot slip between them
    let shutdown = state.shutdown.notified();
    tokio::pin!(shutdown);

    if state.is_shutting_down() {
        return;
    }

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = &mut shutdown => break,
        }
    }

    logger::log_shutdown_started(state.active_connections.load(Ordering::SeqCst));
}

/// Wait until no connection is active or `grace` has elapsed.
///
/// Returns the number of connections still open.
pub async fn wait_for_drain(state: &AppState, grace: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + grace;
    loop {
        let active = state.active_connections.load(Ordering::SeqCst);
        if active == 0 || tokio::time::Instant::now() >= deadline {
            return active;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn test_state() -> Arc<AppState> {
        let mut config = Config::load_from("definitely-not-a-geoapi-config", None).unwrap();
        config.logging.access_log = false;
        Arc::new(AppState::new(&config))
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let state = test_state();
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(start_server_loop(listener, Arc::clone(&state)));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /api/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
        assert!(response.contains("Geospatial API is running"));

        state.request_shutdown();
        server.await.unwrap();
        assert_eq!(wait_for_drain(&state, Duration::from_secs(2)).await, 0);
    }

    #[tokio::test]
    async fn test_shutdown_before_start() {
        let state = test_state();
        state.request_shutdown();
        let listener = create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        start_server_loop(listener, state).await;
    }

    #[tokio::test]
    async fn test_drain_times_out() {
        let state = test_state();
        state.active_connections.store(2, Ordering::SeqCst);
        let remaining = wait_for_drain(&state, Duration::from_millis(150)).await;
        assert_eq!(remaining, 2);
    }
}
