//! Hand-off over real sockets: a gateway listener in front of a scripted
//! upstream that plays the holding proxy.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::time::timeout;

use gripwire_gateway::app_state::AppState;
use gripwire_gateway::config;
use gripwire_gateway::router::build_router;

const WAIT: Duration = Duration::from_secs(5);

const SWITCHING: &[u8] =
    b"HTTP/1.1 101 Switching Protocols\r\nConnection: Upgrade\r\nUpgrade: websocket\r\n\r\n";

async fn read_head(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "peer closed before end of head");
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8(buf).unwrap()
}

/// Accept one connection, report its request head, answer with `reply`.
/// With `echo`, keep echoing bytes after the reply until the peer closes.
async fn scripted_upstream(reply: &'static [u8], echo: bool) -> (SocketAddr, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let head = read_head(&mut stream).await;
        let _ = tx.send(head);
        stream.write_all(reply).await.unwrap();

        if echo {
            let mut chunk = [0u8; 1024];
            loop {
                match stream.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        if stream.write_all(&chunk[..n]).await.is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });

    (addr, rx)
}

async fn spawn_gateway(upstream: SocketAddr) -> SocketAddr {
    let yaml = format!(
        "version: 1\nhandoff:\n  self_upstream: \"{upstream}\"\n  origin_upstream: \"{upstream}\"\n"
    );
    let cfg = config::load_from_str(&yaml).unwrap();
    let app = build_router(AppState::from_config(cfg).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .unwrap();
    });
    addr
}

#[tokio::test]
async fn origin_handoff_drops_hop_by_hop_headers() {
    let reply: &[u8] =
        b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nKeep-Alive: timeout=5\r\nX-Upstream: 1\r\n\r\nok";
    let (upstream, head_rx) = scripted_upstream(reply, false).await;
    let gateway = spawn_gateway(upstream).await;

    let mut client = TcpStream::connect(gateway).await.unwrap();
    client
        .write_all(
            b"GET /other?q=1 HTTP/1.1\r\nHost: example.com\r\nTE: trailers\r\n\
              Connection: close, x-session\r\nX-Session: abc\r\nX-App: 1\r\n\r\n",
        )
        .await
        .unwrap();

    let head = timeout(WAIT, head_rx).await.unwrap().unwrap().to_ascii_lowercase();
    assert!(head.starts_with("get /other?q=1 http/1.1\r\n"), "{head}");
    assert!(head.contains("x-app: 1\r\n"), "{head}");
    assert!(head.contains("x-forwarded-for: 127.0.0.1\r\n"), "{head}");
    assert!(!head.contains("\r\nte:"), "{head}");
    assert!(!head.contains("x-session:"), "{head}");
    assert!(!head.contains("connection: close"), "{head}");

    let mut resp = Vec::new();
    timeout(WAIT, client.read_to_end(&mut resp)).await.unwrap().unwrap();
    let resp = String::from_utf8(resp).unwrap().to_ascii_lowercase();
    assert!(resp.starts_with("http/1.1 200"), "{resp}");
    assert!(resp.contains("x-upstream: 1\r\n"), "{resp}");
    assert!(!resp.contains("keep-alive: timeout"), "{resp}");
    assert!(resp.ends_with("\r\n\r\nok"), "{resp}");
}

#[tokio::test]
async fn websocket_upgrade_is_bridged_to_self() {
    let (upstream, head_rx) = scripted_upstream(SWITCHING, true).await;
    let gateway = spawn_gateway(upstream).await;

    let mut client = TcpStream::connect(gateway).await.unwrap();
    client
        .write_all(
            b"GET /test/websocket HTTP/1.1\r\nHost: foo.edgecompute.app\r\n\
              Connection: Upgrade\r\nUpgrade: websocket\r\n\r\n",
        )
        .await
        .unwrap();

    let head = timeout(WAIT, head_rx).await.unwrap().unwrap().to_ascii_lowercase();
    assert!(head.starts_with("get /test/websocket http/1.1\r\n"), "{head}");
    assert!(head.contains("connection: upgrade\r\n"), "{head}");
    assert!(head.contains("upgrade: websocket\r\n"), "{head}");

    let resp = timeout(WAIT, read_head(&mut client)).await.unwrap();
    assert!(resp.starts_with("HTTP/1.1 101"), "{resp}");
    assert!(resp.to_ascii_lowercase().contains("upgrade: websocket\r\n"), "{resp}");

    client.write_all(b"ping").await.unwrap();
    let mut echoed = [0u8; 4];
    timeout(WAIT, client.read_exact(&mut echoed)).await.unwrap().unwrap();
    assert_eq!(&echoed, b"ping");
}

#[tokio::test]
async fn unrequested_protocol_switch_is_bad_gateway() {
    let (upstream, _head_rx) = scripted_upstream(SWITCHING, false).await;
    let gateway = spawn_gateway(upstream).await;

    let mut client = TcpStream::connect(gateway).await.unwrap();
    client
        .write_all(b"GET /test/websocket HTTP/1.1\r\nHost: foo.edgecompute.app\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let resp = timeout(WAIT, read_head(&mut client)).await.unwrap();
    assert!(resp.starts_with("HTTP/1.1 502"), "{resp}");
}
