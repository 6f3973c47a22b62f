#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

use blitz_core::BlitzError;
use blitz_server::{app_state::AppState, config::BlitzConfig, router, server};

async fn raw_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let req = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(req.as_bytes()).await.unwrap();

    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn serves_until_signal_then_returns() {
    let listener = server::bind("127.0.0.1:0".parse().unwrap()).await.expect("bind");
    let addr = listener.local_addr().unwrap();
    let app = router::build_router(AppState::new(BlitzConfig::default()).expect("state"));

    let (tx, rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server::serve(
        listener,
        app,
        Duration::from_secs(5),
        async move {
            let _ = rx.await;
        },
    ));

    let res = raw_get(addr, "/healthz").await;
    assert!(res.starts_with("HTTP/1.1 200 OK"), "{res}");
    assert!(res.ends_with("Ok"), "{res}");

    tx.send(()).unwrap();
    let done = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("serve returns after signal")
        .expect("task");
    assert!(done.is_ok());

    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn bind_conflict_is_a_bind_error() {
    let first = server::bind("127.0.0.1:0".parse().unwrap()).await.expect("bind");
    let addr = first.local_addr().unwrap();

    let err = server::bind(addr).await.expect_err("port in use");
    assert!(matches!(err, BlitzError::Bind { addr: a, .. } if a == addr));
    assert_eq!(err.kind(), "BIND");
}
