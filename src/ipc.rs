//! Newline-delimited JSON client for the backend's command socket.
//!
//! Requests carry an id and are answered out of band by a reader thread that
//! also forwards pushed events. The connection is opened on first use and
//! reopened by the next call after it drops.

use std::{
    collections::HashMap,
    io::{BufRead, BufReader, Write},
    net::{Shutdown, TcpStream, ToSocketAddrs},
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
    thread,
    time::Duration,
};

use futures::{
    channel::{mpsc, oneshot},
    lock::Mutex as AsyncMutex,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use crate::{
    backend::{Backend, BackendResult, PushEvent},
    profile::ServerProfile,
};

type Reply = oneshot::Sender<BackendResult<Value>>;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Serialize)]
struct Request<'a> {
    id: u64,
    command: &'a str,
    args: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Incoming {
    Response {
        id: u64,
        ok: Option<Value>,
        error: Option<String>,
    },
    Event {
        event: String,
        #[serde(default)]
        payload: Value,
    },
}

struct Connection {
    generation: u64,
    stream: TcpStream,
}

#[derive(Default)]
struct Shared {
    connection: Mutex<Option<Connection>>,
    pending: Mutex<HashMap<u64, Reply>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    /// Fails every call still waiting on connection `generation` and forgets it.
    fn disconnect(&self, generation: u64) {
        let mut connection = lock(&self.connection);
        if connection
            .as_ref()
            .is_some_and(|current| current.generation != generation)
        {
            return;
        }
        *connection = None;

        let pending: Vec<Reply> = lock(&self.pending).drain().map(|(_, reply)| reply).collect();
        if !pending.is_empty() {
            log::warn!("[ipc] connection closed with {} calls pending", pending.len());
        }
        for reply in pending {
            let _ = reply.send(Err("connection to backend closed".into()));
        }
    }

    fn route(&self, line: &str, events: &mpsc::UnboundedSender<PushEvent>) {
        match serde_json::from_str::<Incoming>(line) {
            Ok(Incoming::Response { id, ok, error }) => {
                let Some(reply) = lock(&self.pending).remove(&id) else {
                    log::warn!("[ipc] response for unknown request {id}");
                    return;
                };
                let result = match error {
                    Some(message) => Err(message),
                    None => Ok(ok.unwrap_or(Value::Null)),
                };
                let _ = reply.send(result);
            }
            Ok(Incoming::Event { event, payload }) => {
                match PushEvent::from_wire(&event, &payload) {
                    Some(event) => {
                        if events.unbounded_send(event).is_err() {
                            log::debug!("[ipc] no listener for pushed events");
                        }
                    }
                    None => log::warn!("[ipc] ignoring unknown event {event}"),
                }
            }
            Err(error) => log::warn!("[ipc] malformed line from backend: {error}"),
        }
    }
}

/// Opens the socket with bounded connect and write times. Runs off the UI thread.
fn open_stream(address: &str, timeout: Duration) -> BackendResult<TcpStream> {
    let failure = |reason: String| format!("failed to connect to backend at {address}: {reason}");
    let targets = address
        .to_socket_addrs()
        .map_err(|error| failure(error.to_string()))?;

    let mut last_error = None;
    for target in targets {
        match TcpStream::connect_timeout(&target, timeout) {
            Ok(stream) => {
                stream
                    .set_write_timeout(Some(timeout))
                    .map_err(|error| failure(error.to_string()))?;
                if let Err(error) = stream.set_nodelay(true) {
                    log::debug!("[ipc] set_nodelay failed: {error}");
                }
                return Ok(stream);
            }
            Err(error) => last_error = Some(error),
        }
    }
    Err(failure(match last_error {
        Some(error) => error.to_string(),
        None => "address resolved to nothing".into(),
    }))
}

pub struct IpcBackend {
    address: String,
    timeout: Duration,
    connecting: AsyncMutex<()>,
    shared: Arc<Shared>,
    next_id: AtomicU64,
    next_generation: AtomicU64,
    events: mpsc::UnboundedSender<PushEvent>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<PushEvent>>>,
}

impl IpcBackend {
    pub fn new(address: impl Into<String>) -> Self {
        let (events, receiver) = mpsc::unbounded();
        Self {
            address: address.into(),
            timeout: DEFAULT_TIMEOUT,
            connecting: AsyncMutex::new(()),
            shared: Arc::new(Shared::default()),
            next_id: AtomicU64::new(1),
            next_generation: AtomicU64::new(1),
            events,
            receiver: Mutex::new(Some(receiver)),
        }
    }

    /// Bounds connecting to the backend and writing one request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Hands out the pushed-event stream. Only the first caller gets it.
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<PushEvent>> {
        lock(&self.receiver).take()
    }

    /// Opens the connection unless one is live. Concurrent callers share one attempt.
    async fn connect(&self) -> BackendResult<()> {
        let _connecting = self.connecting.lock().await;
        if lock(&self.shared.connection).is_some() {
            return Ok(());
        }

        let (opened, stream) = oneshot::channel();
        let address = self.address.clone();
        let timeout = self.timeout;
        thread::Builder::new()
            .name("ipc-connect".into())
            .spawn(move || {
                let _ = opened.send(open_stream(&address, timeout));
            })
            .map_err(|error| format!("failed to spawn backend connector: {error}"))?;
        let stream = stream
            .await
            .map_err(|_| "backend connector exited without an answer".to_string())??;
        let reader = stream
            .try_clone()
            .map_err(|error| format!("failed to clone backend socket: {error}"))?;

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        *lock(&self.shared.connection) = Some(Connection { generation, stream });

        let shared = self.shared.clone();
        let events = self.events.clone();
        let spawned = thread::Builder::new()
            .name("ipc-reader".into())
            .spawn(move || {
                for line in BufReader::new(reader).lines() {
                    match line {
                        Ok(line) if line.trim().is_empty() => {}
                        Ok(line) => shared.route(&line, &events),
                        Err(error) => {
                            log::warn!("[ipc] read failed: {error}");
                            break;
                        }
                    }
                }
                log::info!("[ipc] backend connection {generation} closed");
                shared.disconnect(generation);
            });
        if let Err(error) = spawned {
            if let Some(connection) = lock(&self.shared.connection).take() {
                let _ = connection.stream.shutdown(Shutdown::Both);
            }
            return Err(format!("failed to spawn backend reader: {error}"));
        }

        log::info!("[ipc] connected to {}", self.address);
        Ok(())
    }

    fn send(&self, id: u64, command: &str, args: Value, reply: Reply) -> BackendResult<()> {
        let mut line = serde_json::to_string(&Request { id, command, args })
            .map_err(|error| format!("failed to encode {command}: {error}"))?;
        line.push('\n');

        let mut connection = lock(&self.shared.connection);
        let Some(current) = connection.as_mut() else {
            return Err("connection to backend closed".into());
        };

        lock(&self.shared.pending).insert(id, reply);
        if let Err(error) = current.stream.write_all(line.as_bytes()) {
            lock(&self.shared.pending).remove(&id);
            let _ = current.stream.shutdown(Shutdown::Both);
            *connection = None;
            return Err(format!("failed to send {command}: {error}"));
        }
        Ok(())
    }

    async fn call(&self, command: &str, args: Value) -> BackendResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, response) = oneshot::channel();
        log::debug!("[ipc] -> {command} #{id}");
        self.connect().await?;
        self.send(id, command, args, reply)?;
        response
            .await
            .map_err(|_| format!("backend dropped {command}"))?
    }

    async fn request<T: DeserializeOwned>(&self, command: &str, args: Value) -> BackendResult<T> {
        let value = self.call(command, args).await?;
        serde_json::from_value(value)
            .map_err(|error| format!("unexpected response to {command}: {error}"))
    }

    async fn command(&self, command: &str, args: Value) -> BackendResult<()> {
        self.call(command, args).await.map(|_| ())
    }
}

impl Drop for IpcBackend {
    fn drop(&mut self) {
        if let Some(connection) = lock(&self.shared.connection).take() {
            let _ = connection.stream.shutdown(Shutdown::Both);
        }
    }
}

impl Backend for IpcBackend {
    async fn list_profiles(&self) -> BackendResult<Vec<ServerProfile>> {
        self.request("get_servers", json!({})).await
    }

    async fn current_profile_id(&self) -> BackendResult<Option<String>> {
        self.request("get_current_server_id", json!({})).await
    }

    async fn current_profile(&self) -> BackendResult<Option<ServerProfile>> {
        self.request("get_current_server", json!({})).await
    }

    async fn set_current_profile(&self, id: &str) -> BackendResult<()> {
        self.command("set_current_server", json!({ "id": id })).await
    }

    async fn add_profile(&self, name: &str) -> BackendResult<ServerProfile> {
        self.request("add_server", json!({ "name": name })).await
    }

    async fn rename_profile(&self, id: &str, new_name: &str) -> BackendResult<()> {
        self.command("rename_server", json!({ "id": id, "new_name": new_name }))
            .await
    }

    async fn delete_profile(&self, id: &str) -> BackendResult<()> {
        self.command("delete_server", json!({ "id": id })).await
    }

    async fn update_profile(&self, profile: &ServerProfile) -> BackendResult<()> {
        self.command("update_server", json!({ "server": profile }))
            .await
    }

    async fn start_process(&self) -> BackendResult<String> {
        self.request("start_process", json!({})).await
    }

    async fn stop_process(&self) -> BackendResult<String> {
        self.request("stop_process", json!({})).await
    }

    async fn is_process_running(&self) -> BackendResult<bool> {
        self.request("is_process_running", json!({})).await
    }

    async fn set_system_proxy(&self, enabled: bool) -> BackendResult<String> {
        self.request("set_system_proxy", json!({ "enabled": enabled }))
            .await
    }

    async fn proxy_enabled(&self) -> BackendResult<bool> {
        self.request("get_proxy_status", json!({})).await
    }

    async fn app_version(&self) -> BackendResult<String> {
        self.request("get_app_version", json!({})).await
    }
}
