//! In-process WebSocket server that speaks the session handshake.
//!
//! Sessions can be dropped and new connections refused on demand, so the
//! reconnect path runs against a real socket.

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use futures_util::{SinkExt, StreamExt};
use studyhall_shared::dto::{ClientEvent, ServerEvent};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::{broadcast, mpsc},
    task::{JoinHandle, JoinSet},
};
use tokio_tungstenite::{accept_async, tungstenite::protocol::Message};

pub(crate) struct TestWsServer {
    addr: SocketAddr,
    accepting: Arc<AtomicBool>,
    kick: broadcast::Sender<()>,
    received: mpsc::UnboundedReceiver<ClientEvent>,
    task: JoinHandle<()>,
}

impl TestWsServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepting = Arc::new(AtomicBool::new(true));
        let (kick, _) = broadcast::channel(8);
        let (received_tx, received) = mpsc::unbounded_channel();

        let task = tokio::spawn({
            let accepting = Arc::clone(&accepting);
            let kick = kick.clone();
            async move {
                let mut sessions = JoinSet::new();
                let mut opened = 0;
                while let Ok((socket, _)) = listener.accept().await {
                    // Refused connections are closed before the upgrade.
                    if !accepting.load(Ordering::SeqCst) {
                        drop(socket);
                        continue;
                    }
                    opened += 1;
                    sessions.spawn(serve_session(
                        socket,
                        format!("s{}", opened),
                        received_tx.clone(),
                        kick.subscribe(),
                    ));
                }
            }
        });

        Self {
            addr,
            accepting,
            kick,
            received,
            task,
        }
    }

    /// HTTP base URL, as a client configuration expects it
    pub fn http_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    /// Refuse (`false`) or accept (`true`) new connections
    pub fn set_accepting(&self, accepting: bool) {
        self.accepting.store(accepting, Ordering::SeqCst);
    }

    /// Close every open session without a close frame
    pub fn drop_sessions(&self) {
        let _ = self.kick.send(());
    }

    /// Next event a client sent to any session
    pub async fn next_received(&mut self) -> ClientEvent {
        tokio::time::timeout(Duration::from_secs(5), self.received.recv())
            .await
            .expect("timed out waiting for a client frame")
            .expect("server stopped")
    }

    /// Events received so far, without waiting
    pub fn drain_received(&mut self) -> Vec<ClientEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.received.try_recv() {
            events.push(event);
        }
        events
    }
}

impl Drop for TestWsServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_session(
    socket: TcpStream,
    session_id: String,
    received: mpsc::UnboundedSender<ClientEvent>,
    mut kick: broadcast::Receiver<()>,
) {
    let Ok(mut ws) = accept_async(socket).await else {
        return;
    };
    let connected = serde_json::to_string(&ServerEvent::Connected { session_id }).unwrap();
    if ws.send(Message::Text(connected.into())).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            _ = kick.recv() => return,
            frame = ws.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if let Ok(event) = serde_json::from_str::<ClientEvent>(&text) {
                        let _ = received.send(event);
                    }
                }
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                Some(Ok(_)) => {}
            },
        }
    }
}
