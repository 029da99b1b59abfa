//! Liveness probe: a minimal HTTP endpoint independent of the bot.
//!
//! Platform schedulers (Railway and friends) poll `GET /health`. The probe
//! shares no state with the conversation engine; it only says the process
//! is alive.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Build the raw HTTP response for a request path.
///
/// `/health` answers 200 with a small JSON body; everything else is 404.
pub fn response_for(path: &str) -> String {
    if path == "/health" {
        let body = serde_json::json!({
            "status": "healthy",
            "service": "anonsbot",
            "version": env!("CARGO_PKG_VERSION"),
        })
        .to_string();
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    } else {
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_owned()
    }
}

/// Serve the probe on `0.0.0.0:{port}` until the task is dropped.
///
/// # Errors
///
/// Returns an error if the port cannot be bound.
pub async fn serve(port: u16) -> anyhow::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "health server listening");

    loop {
        let (mut stream, _) = listener.accept().await?;
        tokio::spawn(async move {
            let mut buf = [0u8; 1024];
            let n = match stream.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    debug!(error = %e, "health request read failed");
                    return;
                }
            };
            let request = String::from_utf8_lossy(&buf[..n]);
            // "GET /health HTTP/1.1" — the path is the second token.
            let path = request.split_whitespace().nth(1).unwrap_or("/");
            let response = response_for(path);
            if let Err(e) = stream.write_all(response.as_bytes()).await {
                debug!(error = %e, "health response write failed");
            }
        });
    }
}
