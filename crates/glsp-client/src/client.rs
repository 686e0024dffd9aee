//! The GLSP client lifecycle state machine.
//!
//! A [`GlspClient`] represents one logical client connected to one server
//! instance. It owns connection resolution, the `initialize` handshake
//! (single-flight, cached), per-session setup/teardown, and routing of
//! incoming action messages to registered handlers.
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{watch, OnceCell};
use tokio::time::timeout;

use glsp_core::disposable::Disposable;
use glsp_core::event::{Emitter, Subscription};
use glsp_protocol::message::ActionMessage;
use glsp_protocol::session::{
    DisposeClientSessionParameters, InitializeClientSessionParameters, InitializeParameters,
    InitializeResult,
};

use crate::connection::{ConnectionProvider, JsonRpcConnection};
use crate::error::ClientError;

/// How long `start` waits for the connection to resolve by default.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_millis(1500);

/// JSON-RPC method names of the client–server protocol.
pub mod methods {
    /// `initialize` request.
    pub const INITIALIZE: &str = "initialize";
    /// `initializeClientSession` request.
    pub const INITIALIZE_CLIENT_SESSION: &str = "initializeClientSession";
    /// `disposeClientSession` request.
    pub const DISPOSE_CLIENT_SESSION: &str = "disposeClientSession";
    /// `process` notification, both directions.
    pub const PROCESS: &str = "process";
    /// `shutdown` notification.
    pub const SHUTDOWN: &str = "shutdown";
}

/// Lifecycle state of a [`GlspClient`].
///
/// Transitions are one-directional; a stopped client cannot be restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// Client created, `start` not yet called.
    Initial,
    /// Connection resolution in progress.
    Starting,
    /// The start attempt failed; `start` may be called again.
    StartFailed,
    /// Connected and ready for requests.
    Running,
    /// `stop` in progress.
    Stopping,
    /// Stopped for good.
    Stopped,
    /// The connection failed while running.
    ServerError,
}

/// Static configuration of a client instance.
///
/// The application id is explicit per-client configuration; there is no
/// process-wide default.
#[derive(Debug, Clone)]
pub struct GlspClientOptions {
    /// Id of this logical client.
    pub client_id: String,
    /// Id of the client application, sent with `initialize`.
    pub application_id: String,
    /// Upper bound on connection resolution during `start`.
    pub startup_timeout: Duration,
}

impl GlspClientOptions {
    /// Options with the default startup timeout.
    pub fn new(client_id: impl Into<String>, application_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            application_id: application_id.into(),
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        }
    }

    /// Override the startup timeout.
    pub fn with_startup_timeout(mut self, startup_timeout: Duration) -> Self {
        self.startup_timeout = startup_timeout;
        self
    }
}

enum ConnectionSlot {
    Unconfigured,
    Pending(ConnectionProvider),
    Resolved(JsonRpcConnection),
}

type ActionMessageHandler = Arc<dyn Fn(&ActionMessage) + Send + Sync>;

#[derive(Default)]
struct HandlerRegistry {
    next_id: u64,
    global: Vec<(u64, ActionMessageHandler)>,
    scoped: HashMap<String, Vec<(u64, ActionMessageHandler)>>,
}

struct ClientInner {
    options: GlspClientOptions,
    state_tx: watch::Sender<ClientState>,
    state_rx: watch::Receiver<ClientState>,
    state_event: Emitter<ClientState>,
    server_initialized: Emitter<InitializeResult>,
    connection: Mutex<ConnectionSlot>,
    initialize_cell: OnceCell<InitializeResult>,
    handlers: Mutex<HandlerRegistry>,
}

impl ClientInner {
    fn current_state(&self) -> ClientState {
        *self.state_rx.borrow()
    }

    fn notify_state(&self, state: ClientState) {
        tracing::debug!(client = %self.options.client_id, state = ?state, "client state changed");
        self.state_event.emit(&state);
    }

    /// Finish a start attempt: move from `Starting` to `next` only if no
    /// concurrent stop moved the state on in the meantime. Returns whether
    /// the claim won.
    fn claim_from_starting(&self, next: ClientState) -> bool {
        let claimed = self.state_tx.send_if_modified(|state| {
            if *state == ClientState::Starting {
                *state = next;
                true
            } else {
                false
            }
        });
        if claimed {
            self.notify_state(next);
        }
        claimed
    }

    /// Move to `next` unless already there. Fires the change event exactly
    /// once per real transition.
    fn transition(&self, next: ClientState) {
        let changed = self.state_tx.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
        if changed {
            self.notify_state(next);
        }
    }

    /// Route an incoming message: the handlers scoped to its client id if
    /// any exist, otherwise the global handlers, otherwise drop it.
    fn dispatch_action_message(&self, message: &ActionMessage) {
        let handlers: Vec<ActionMessageHandler> = {
            let registry = self.handlers.lock().unwrap();
            match registry.scoped.get(&message.client_id) {
                Some(scoped) if !scoped.is_empty() => {
                    scoped.iter().map(|(_, handler)| handler.clone()).collect()
                }
                _ if !registry.global.is_empty() => registry
                    .global
                    .iter()
                    .map(|(_, handler)| handler.clone())
                    .collect(),
                _ => {
                    tracing::warn!(
                        client_id = %message.client_id,
                        kind = %message.action.kind(),
                        "no handler registered for action message; dropping"
                    );
                    return;
                }
            }
        };
        // Invoked outside the lock so handlers may (un)register handlers.
        for handler in handlers {
            handler(message);
        }
    }
}

/// Handle to one logical GLSP client. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct GlspClient {
    inner: Arc<ClientInner>,
}

impl GlspClient {
    /// Create a client with no connection configured yet.
    pub fn new(options: GlspClientOptions) -> Self {
        let (state_tx, state_rx) = watch::channel(ClientState::Initial);
        Self {
            inner: Arc::new(ClientInner {
                options,
                state_tx,
                state_rx,
                state_event: Emitter::new(),
                server_initialized: Emitter::new(),
                connection: Mutex::new(ConnectionSlot::Unconfigured),
                initialize_cell: OnceCell::new(),
                handlers: Mutex::new(HandlerRegistry::default()),
            }),
        }
    }

    /// Create a client that will resolve its connection from `provider`.
    pub fn with_provider(options: GlspClientOptions, provider: ConnectionProvider) -> Self {
        let client = Self::new(options);
        client.set_connection_provider(provider);
        client
    }

    /// Configure where the connection comes from. Replaces any previously
    /// configured, still-unresolved provider; once a connection has
    /// resolved the call is ignored with a warning.
    pub fn set_connection_provider(&self, provider: ConnectionProvider) {
        let mut slot = self.inner.connection.lock().unwrap();
        match &*slot {
            ConnectionSlot::Resolved(_) => {
                tracing::warn!(
                    client = %self.id(),
                    "connection already resolved; ignoring new provider"
                );
            }
            _ => *slot = ConnectionSlot::Pending(provider),
        }
    }

    /// The id of this client.
    pub fn id(&self) -> &str {
        &self.inner.options.client_id
    }

    /// The client options.
    pub fn options(&self) -> &GlspClientOptions {
        &self.inner.options
    }

    /// The current lifecycle state.
    pub fn current_state(&self) -> ClientState {
        self.inner.current_state()
    }

    /// Subscribe to state changes. Fired exactly once per transition.
    pub fn on_current_state_changed(
        &self,
        listener: impl Fn(&ClientState) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.state_event.listen(listener)
    }

    /// Subscribe to the one-time "server initialized" event.
    pub fn on_server_initialized(
        &self,
        listener: impl Fn(&InitializeResult) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.server_initialized.listen(listener)
    }

    /// The cached `initialize` result, if the handshake has succeeded.
    pub fn initialize_result(&self) -> Option<InitializeResult> {
        self.inner.initialize_cell.get().cloned()
    }

    /// Start the client: resolve the connection, racing the configured
    /// startup timeout.
    ///
    /// Idempotent while `Running`; while `Starting`, awaits the in-flight
    /// attempt's outcome. A failed attempt ends in `StartFailed` and may be
    /// retried by calling `start` again; there is no automatic retry.
    /// A `stop` issued during startup wins: the attempt releases any
    /// connection it resolved and returns an error, leaving the client
    /// `Stopped`.
    pub async fn start(&self) -> Result<(), ClientError> {
        enum Plan {
            AlreadyRunning,
            WaitForOutcome,
            Refuse,
            Attempt,
        }
        let mut plan = Plan::Attempt;
        let claimed = self.inner.state_tx.send_if_modified(|state| match *state {
            ClientState::Running => {
                plan = Plan::AlreadyRunning;
                false
            }
            ClientState::Starting => {
                plan = Plan::WaitForOutcome;
                false
            }
            ClientState::Stopping | ClientState::Stopped => {
                plan = Plan::Refuse;
                false
            }
            _ => {
                *state = ClientState::Starting;
                plan = Plan::Attempt;
                true
            }
        });
        if claimed {
            self.inner.notify_state(ClientState::Starting);
        }

        match plan {
            Plan::AlreadyRunning => Ok(()),
            Plan::Refuse => Err(ClientError::Stopped),
            Plan::WaitForOutcome => self.await_start_outcome().await,
            Plan::Attempt => match self.resolve_connection().await {
                Ok(connection) => {
                    self.install_connection(&connection);
                    if self.inner.claim_from_starting(ClientState::Running) {
                        Ok(())
                    } else {
                        // A concurrent stop won while the connection was
                        // resolving; the client stays stopped.
                        connection.close();
                        *self.inner.connection.lock().unwrap() = ConnectionSlot::Unconfigured;
                        Err(ClientError::Stopped)
                    }
                }
                Err(err) => {
                    tracing::warn!(client = %self.id(), error = %err, "client start failed");
                    self.inner.claim_from_starting(ClientState::StartFailed);
                    Err(err)
                }
            },
        }
    }

    async fn await_start_outcome(&self) -> Result<(), ClientError> {
        let mut state_rx = self.inner.state_rx.clone();
        let outcome = *state_rx
            .wait_for(|state| *state != ClientState::Starting)
            .await
            .map_err(|_| ClientError::StartFailed(ClientState::Stopped))?;
        if outcome == ClientState::Running {
            Ok(())
        } else {
            Err(ClientError::StartFailed(outcome))
        }
    }

    async fn resolve_connection(&self) -> Result<JsonRpcConnection, ClientError> {
        let slot = std::mem::replace(
            &mut *self.inner.connection.lock().unwrap(),
            ConnectionSlot::Unconfigured,
        );
        match slot {
            ConnectionSlot::Resolved(connection) => {
                *self.inner.connection.lock().unwrap() =
                    ConnectionSlot::Resolved(connection.clone());
                Ok(connection)
            }
            ConnectionSlot::Pending(provider) => {
                let startup_timeout = self.inner.options.startup_timeout;
                match timeout(startup_timeout, provider.resolve()).await {
                    Ok(Ok(connection)) => {
                        *self.inner.connection.lock().unwrap() =
                            ConnectionSlot::Resolved(connection.clone());
                        Ok(connection)
                    }
                    Ok(Err(err)) => Err(err),
                    Err(_) => Err(ClientError::StartTimeout(startup_timeout)),
                }
            }
            ConnectionSlot::Unconfigured => Err(ClientError::NoConnection),
        }
    }

    /// Wire the resolved connection into the client: route incoming
    /// `process` notifications and watch for unexpected closure.
    fn install_connection(&self, connection: &JsonRpcConnection) {
        let weak = Arc::downgrade(&self.inner);
        connection.set_notification_handler(move |method, params| {
            let Some(inner) = weak.upgrade() else { return };
            if method == methods::PROCESS {
                match serde_json::from_value::<ActionMessage>(params) {
                    Ok(message) => inner.dispatch_action_message(&message),
                    Err(err) => {
                        tracing::warn!(error = %err, "dropping malformed action message");
                    }
                }
            } else {
                tracing::debug!(method = %method, "unhandled server notification");
            }
        });

        let weak = Arc::downgrade(&self.inner);
        let mut closed = connection.closed();
        tokio::spawn(async move {
            if closed.wait_for(|closed| *closed).await.is_err() {
                return;
            }
            let Some(inner) = weak.upgrade() else { return };
            let state = inner.current_state();
            if state == ClientState::Stopping || state == ClientState::Stopped {
                // Expected during shutdown.
                return;
            }
            tracing::warn!(client = %inner.options.client_id, "server connection closed unexpectedly");
            *inner.connection.lock().unwrap() = ConnectionSlot::Unconfigured;
            inner.transition(ClientState::ServerError);
        });
    }

    fn running_connection(&self) -> Result<JsonRpcConnection, ClientError> {
        let state = self.current_state();
        if state != ClientState::Running {
            return Err(ClientError::NotRunning(state));
        }
        match &*self.inner.connection.lock().unwrap() {
            ConnectionSlot::Resolved(connection) => Ok(connection.clone()),
            _ => Err(ClientError::NoConnection),
        }
    }

    /// Perform the `initialize` handshake.
    ///
    /// Single-flight: concurrent callers share one wire request. The first
    /// successful result is cached for the lifetime of the client and
    /// fires the one-time server-initialized event; an error is not cached
    /// and the next call retries.
    pub async fn initialize_server(
        &self,
        params: InitializeParameters,
    ) -> Result<InitializeResult, ClientError> {
        let connection = self.running_connection()?;
        let performed = AtomicBool::new(false);
        let result = self
            .inner
            .initialize_cell
            .get_or_try_init(|| {
                performed.store(true, Ordering::SeqCst);
                async move {
                    let params = serde_json::to_value(&params)?;
                    let value = connection.request(methods::INITIALIZE, params).await?;
                    let result: InitializeResult = serde_json::from_value(value)?;
                    Ok::<_, ClientError>(result)
                }
            })
            .await?;
        if performed.load(Ordering::SeqCst) {
            self.inner.server_initialized.emit(result);
        }
        Ok(result.clone())
    }

    /// Create a logical diagram session on the server.
    pub async fn initialize_client_session(
        &self,
        params: InitializeClientSessionParameters,
    ) -> Result<(), ClientError> {
        let connection = self.running_connection()?;
        connection
            .request(
                methods::INITIALIZE_CLIENT_SESSION,
                serde_json::to_value(&params)?,
            )
            .await?;
        Ok(())
    }

    /// Dispose a logical diagram session on the server.
    pub async fn dispose_client_session(
        &self,
        params: DisposeClientSessionParameters,
    ) -> Result<(), ClientError> {
        let connection = self.running_connection()?;
        connection
            .request(
                methods::DISPOSE_CLIENT_SESSION,
                serde_json::to_value(&params)?,
            )
            .await?;
        Ok(())
    }

    /// Ask the server to shut down (fire and forget).
    pub async fn shutdown_server(&self) -> Result<(), ClientError> {
        let connection = self.running_connection()?;
        connection.notify(methods::SHUTDOWN, Value::Null).await
    }

    /// Forward an action message to the server.
    pub async fn send_action_message(&self, message: ActionMessage) -> Result<(), ClientError> {
        let connection = self.running_connection()?;
        connection
            .notify(methods::PROCESS, serde_json::to_value(&message)?)
            .await
    }

    /// Register a handler for incoming action messages.
    ///
    /// With `client_id` the handler only receives messages for that
    /// session; without, it receives every message for which no scoped
    /// handler exists. The returned [`Disposable`] unregisters exactly
    /// this handler.
    pub fn on_action_message(
        &self,
        handler: impl Fn(&ActionMessage) + Send + Sync + 'static,
        client_id: Option<&str>,
    ) -> Disposable {
        let handler: ActionMessageHandler = Arc::new(handler);
        let scope = client_id.map(str::to_string);
        let id = {
            let mut registry = self.inner.handlers.lock().unwrap();
            registry.next_id += 1;
            let id = registry.next_id;
            match &scope {
                Some(scope_id) => registry
                    .scoped
                    .entry(scope_id.clone())
                    .or_default()
                    .push((id, handler)),
                None => registry.global.push((id, handler)),
            }
            id
        };

        let weak = Arc::downgrade(&self.inner);
        Disposable::new(move || {
            let Some(inner) = weak.upgrade() else { return };
            let mut registry = inner.handlers.lock().unwrap();
            match &scope {
                Some(scope_id) => {
                    if let Some(list) = registry.scoped.get_mut(scope_id) {
                        list.retain(|(entry, _)| *entry != id);
                        if list.is_empty() {
                            registry.scoped.remove(scope_id);
                        }
                    }
                }
                None => registry.global.retain(|(entry, _)| *entry != id),
            }
        })
    }

    /// Stop the client.
    ///
    /// Idempotent: the first call sends a best-effort `shutdown`
    /// notification and releases the connection; the client always ends in
    /// `Stopped`, even if the notification fails. Later calls await that
    /// completion.
    pub async fn stop(&self) -> Result<(), ClientError> {
        enum Plan {
            Done,
            WaitForStopped,
            Shutdown,
        }
        let mut plan = Plan::Shutdown;
        let claimed = self.inner.state_tx.send_if_modified(|state| match *state {
            ClientState::Stopped => {
                plan = Plan::Done;
                false
            }
            ClientState::Stopping => {
                plan = Plan::WaitForStopped;
                false
            }
            _ => {
                *state = ClientState::Stopping;
                plan = Plan::Shutdown;
                true
            }
        });
        if claimed {
            self.inner.notify_state(ClientState::Stopping);
        }

        match plan {
            Plan::Done => Ok(()),
            Plan::WaitForStopped => {
                let mut state_rx = self.inner.state_rx.clone();
                let _ = state_rx
                    .wait_for(|state| *state == ClientState::Stopped)
                    .await;
                Ok(())
            }
            Plan::Shutdown => {
                let connection = {
                    let slot = std::mem::replace(
                        &mut *self.inner.connection.lock().unwrap(),
                        ConnectionSlot::Unconfigured,
                    );
                    match slot {
                        ConnectionSlot::Resolved(connection) => Some(connection),
                        _ => None,
                    }
                };
                if let Some(connection) = connection {
                    if let Err(err) = connection.notify(methods::SHUTDOWN, Value::Null).await {
                        tracing::debug!(error = %err, "shutdown notification failed");
                    }
                    connection.close();
                }
                // Stop always completes, whatever happened above.
                self.inner.transition(ClientState::Stopped);
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for GlspClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlspClient")
            .field("id", &self.inner.options.client_id)
            .field("state", &self.current_state())
            .finish()
    }
}
