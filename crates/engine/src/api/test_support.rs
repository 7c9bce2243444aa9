use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{Framed, LinesCodec};
use tokio_util::sync::CancellationToken;
use widgetry_protocol::ServerReply;

use crate::app::App;
use crate::infrastructure::config::EngineConfig;

pub(crate) type TestConn = Framed<TcpStream, LinesCodec>;

pub(crate) const REPLY_TIMEOUT: Duration = Duration::from_secs(2);

pub(crate) fn test_config() -> EngineConfig {
    EngineConfig {
        port: 0,
        bridge_timeout: Duration::from_millis(500),
        max_line_bytes: 4096,
        ..EngineConfig::default()
    }
}

pub(crate) struct TestServer {
    pub(crate) addr: SocketAddr,
    pub(crate) app: Arc<App>,
    pub(crate) cancel: CancellationToken,
    pub(crate) handle: tokio::task::JoinHandle<()>,
}

pub(crate) async fn spawn_server(app: App) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Arc::new(app);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(super::server::serve(
        listener,
        Arc::clone(&app),
        cancel.clone(),
    ));

    TestServer {
        addr,
        app,
        cancel,
        handle,
    }
}

pub(crate) async fn spawn_detached_server() -> TestServer {
    spawn_server(App::detached(test_config())).await
}

pub(crate) async fn connect(addr: SocketAddr) -> TestConn {
    let stream = TcpStream::connect(addr).await.unwrap();
    Framed::new(stream, LinesCodec::new())
}

pub(crate) async fn send_line(conn: &mut TestConn, line: &str) {
    conn.send(line.to_string()).await.unwrap();
}

pub(crate) async fn send_json(conn: &mut TestConn, value: Value) {
    send_line(conn, &value.to_string()).await;
}

pub(crate) async fn recv_reply(conn: &mut TestConn) -> ServerReply {
    let line = tokio::time::timeout(REPLY_TIMEOUT, conn.next())
        .await
        .expect("timed out waiting for reply")
        .expect("connection closed")
        .unwrap();
    serde_json::from_str(&line).unwrap()
}

/// Send a request and wait for the reply carrying the same id.
pub(crate) async fn request(conn: &mut TestConn, value: Value) -> ServerReply {
    let id = value["id"].as_str().map(str::to_string);
    send_json(conn, value).await;
    expect_reply(conn, REPLY_TIMEOUT, |reply| reply.request_id() == id.as_deref()).await
}

pub(crate) async fn expect_reply<F>(
    conn: &mut TestConn,
    timeout: Duration,
    mut predicate: F,
) -> ServerReply
where
    F: FnMut(&ServerReply) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            let reply = recv_reply(conn).await;
            if predicate(&reply) {
                return reply;
            }
        }
    })
    .await
    .unwrap()
}
