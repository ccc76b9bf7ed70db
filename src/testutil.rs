//! Shared test helpers: canned single-shot HTTP servers on a local socket
//! and model factories.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::models::{Account, Status, StatusId};

/// Minimal status with the given id.
pub(crate) fn status(id: &str) -> Status {
    Status {
        id: StatusId::from(id),
        created_at: chrono::Utc::now(),
        content: String::new(),
        account: Account {
            id: "7".into(),
            username: "schwa".into(),
            acct: String::new(),
            display_name: String::new(),
            avatar: None,
        },
        url: None,
        reblog: None,
        favourites_count: 0,
        reblogs_count: 0,
        replies_count: 0,
    }
}

/// Bind a listener on an ephemeral local port. Split from [`serve_http`] so
/// a test can embed the base URL inside its canned responses.
pub(crate) async fn bind_http() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    (listener, base)
}

/// Serve each response to one connection in order, then stop. `delay` is
/// applied before each response is written.
pub(crate) fn serve_http(listener: TcpListener, responses: Vec<String>, delay: Duration) {
    tokio::spawn(async move {
        for response in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let mut buf = [0u8; 8192];
            let _ = stream.read(&mut buf).await;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let _ = stream.write_all(response.as_bytes()).await;
        }
    });
}

/// Bind and serve in one step; returns the base URL to aim requests at.
pub(crate) async fn spawn_http(responses: Vec<String>, delay: Duration) -> String {
    let (listener, base) = bind_http().await;
    serve_http(listener, responses, delay);
    base
}

/// A base URL no server listens on.
pub(crate) async fn unreachable_base() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Format a canned HTTP/1.1 response carrying a JSON body.
pub(crate) fn json_response(status: &str, body: &str, extra_headers: &[(&str, &str)]) -> String {
    let mut headers = String::new();
    for (name, value) in extra_headers {
        headers.push_str(&format!("{name}: {value}\r\n"));
    }
    format!(
        "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\n{headers}connection: close\r\n\r\n{body}",
        body.len(),
    )
}

/// Install a test subscriber so `tracing` output shows up with `--nocapture`.
pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
