//! JSON-RPC connection plumbing.
//!
//! A [`JsonRpcConnection`] owns a pair of background tasks: a writer
//! draining a channel of encoded frames, and a reader that decodes frames,
//! resolves pending requests by id, and forwards notifications. Closure
//! (EOF or I/O error on either side) is signalled through a watch channel
//! so the client can observe it without polling.
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::timeout;

use crate::codec::{encode_notification, encode_request, FrameReader, FrameWriter, RpcFailure, RpcIncoming};
use crate::error::ClientError;

/// Default timeout for request round-trips.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

type PendingMap = HashMap<i64, oneshot::Sender<Result<Value, RpcFailure>>>;
type NotificationHandler = Box<dyn Fn(String, Value) + Send>;

struct ConnectionShared {
    writer_tx: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
    pending: Mutex<PendingMap>,
    notification_handler: Mutex<Option<NotificationHandler>>,
    next_id: AtomicI64,
    closed_tx: watch::Sender<bool>,
}

impl ConnectionShared {
    /// Mark the connection closed and fail every pending request.
    fn mark_closed(&self) {
        self.writer_tx.lock().unwrap().take();
        // Dropping the senders wakes waiters with a RecvError.
        self.pending.lock().unwrap().clear();
        self.closed_tx.send_replace(true);
    }
}

/// A live JSON-RPC connection. Cheap to clone; clones share the channel.
#[derive(Clone)]
pub struct JsonRpcConnection {
    shared: Arc<ConnectionShared>,
    closed_rx: watch::Receiver<bool>,
    request_timeout: Duration,
}

impl JsonRpcConnection {
    /// Spawn the reader and writer tasks over a byte channel.
    pub fn spawn(
        reader: impl AsyncRead + Unpin + Send + 'static,
        writer: impl AsyncWrite + Unpin + Send + 'static,
    ) -> Self {
        Self::spawn_with_timeout(reader, writer, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Like [`JsonRpcConnection::spawn`] with an explicit request timeout.
    pub fn spawn_with_timeout(
        reader: impl AsyncRead + Unpin + Send + 'static,
        writer: impl AsyncWrite + Unpin + Send + 'static,
        request_timeout: Duration,
    ) -> Self {
        let (writer_tx, mut writer_rx) = mpsc::channel::<Vec<u8>>(64);
        let (closed_tx, closed_rx) = watch::channel(false);
        let shared = Arc::new(ConnectionShared {
            writer_tx: Mutex::new(Some(writer_tx)),
            pending: Mutex::new(HashMap::new()),
            notification_handler: Mutex::new(None),
            next_id: AtomicI64::new(1),
            closed_tx,
        });

        // Writer task: drains encoded frames onto the wire.
        let writer_shared = shared.clone();
        tokio::spawn(async move {
            let mut framed = FrameWriter::new(writer);
            while let Some(frame) = writer_rx.recv().await {
                if let Err(err) = framed.write_frame(&frame).await {
                    tracing::warn!("connection write failed: {}", err);
                    break;
                }
            }
            writer_shared.mark_closed();
        });

        // Reader task: decodes frames and routes them.
        let reader_shared = shared.clone();
        tokio::spawn(async move {
            let mut framed = FrameReader::new(reader);
            loop {
                match framed.read_message().await {
                    Ok(Some(incoming)) => reader_shared.route(incoming),
                    Ok(None) => break,
                    Err(err) => {
                        tracing::warn!("connection read failed: {}", err);
                        break;
                    }
                }
            }
            reader_shared.mark_closed();
        });

        Self {
            shared,
            closed_rx,
            request_timeout,
        }
    }

    /// Install the handler invoked for every incoming notification.
    pub fn set_notification_handler(&self, handler: impl Fn(String, Value) + Send + 'static) {
        *self.shared.notification_handler.lock().unwrap() = Some(Box::new(handler));
    }

    /// Send a request and await its response.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let rx = {
            let (tx, rx) = oneshot::channel();
            self.shared.pending.lock().unwrap().insert(id, tx);
            rx
        };
        let frame = encode_request(id, method, &params);
        if let Err(err) = self.send_frame(frame).await {
            self.shared.pending.lock().unwrap().remove(&id);
            return Err(err);
        }

        let outcome = match timeout(self.request_timeout, rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => return Err(ClientError::ConnectionClosed),
            Err(_) => {
                self.shared.pending.lock().unwrap().remove(&id);
                return Err(ClientError::RequestTimeout(self.request_timeout));
            }
        };
        outcome.map_err(|failure| ClientError::Rpc {
            code: failure.code,
            message: failure.message,
        })
    }

    /// Send a notification (no response expected).
    pub async fn notify(&self, method: &str, params: Value) -> Result<(), ClientError> {
        self.send_frame(encode_notification(method, &params)).await
    }

    async fn send_frame(&self, frame: Vec<u8>) -> Result<(), ClientError> {
        let sender = self
            .shared
            .writer_tx
            .lock()
            .unwrap()
            .clone()
            .ok_or(ClientError::ConnectionClosed)?;
        sender
            .send(frame)
            .await
            .map_err(|_| ClientError::ConnectionClosed)
    }

    /// A watch receiver that flips to `true` when the connection closes.
    pub fn closed(&self) -> watch::Receiver<bool> {
        self.closed_rx.clone()
    }

    /// Whether the connection has closed.
    pub fn is_closed(&self) -> bool {
        *self.closed_rx.borrow()
    }

    /// Release the writer and fail all pending requests. The reader task
    /// winds down when its end of the channel closes.
    pub fn close(&self) {
        self.shared.mark_closed();
    }
}

impl ConnectionShared {
    fn route(&self, incoming: RpcIncoming) {
        match incoming {
            RpcIncoming::Response { id, result } => {
                let sender = self.pending.lock().unwrap().remove(&id);
                match sender {
                    // A dropped receiver means the caller gave up (timeout).
                    Some(sender) => {
                        let _ = sender.send(result);
                    }
                    None => tracing::warn!("response for unknown request id {}", id),
                }
            }
            RpcIncoming::Notification { method, params } => {
                let handler = self.notification_handler.lock().unwrap();
                match handler.as_ref() {
                    Some(handler) => handler(method, params),
                    None => tracing::debug!("unhandled notification: {}", method),
                }
            }
            RpcIncoming::Request { method, id, .. } => {
                tracing::debug!("ignoring server request {} (id {})", method, id);
            }
        }
    }
}

impl std::fmt::Debug for JsonRpcConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcConnection")
            .field("closed", &self.is_closed())
            .field("pending", &self.shared.pending.lock().unwrap().len())
            .finish()
    }
}

type ConnectionFuture = Pin<Box<dyn Future<Output = Result<JsonRpcConnection, ClientError>> + Send>>;

/// Where a client gets its connection from: either one that already
/// exists, or a factory invoked (at most once) during `start`.
pub enum ConnectionProvider {
    /// A connection that is already established.
    Connected(JsonRpcConnection),
    /// A deferred connection; resolved on first start.
    Provider(Box<dyn FnOnce() -> ConnectionFuture + Send>),
}

impl ConnectionProvider {
    /// Provide an already-established connection.
    pub fn ready(connection: JsonRpcConnection) -> Self {
        Self::Connected(connection)
    }

    /// Provide a factory producing the connection asynchronously.
    pub fn factory<F, Fut>(factory: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<JsonRpcConnection, ClientError>> + Send + 'static,
    {
        Self::Provider(Box::new(move || Box::pin(factory())))
    }

    /// Resolve to a live connection.
    pub(crate) async fn resolve(self) -> Result<JsonRpcConnection, ClientError> {
        match self {
            Self::Connected(connection) => Ok(connection),
            Self::Provider(factory) => factory().await,
        }
    }
}

impl std::fmt::Debug for ConnectionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connected(_) => f.write_str("ConnectionProvider::Connected"),
            Self::Provider(_) => f.write_str("ConnectionProvider::Provider"),
        }
    }
}
