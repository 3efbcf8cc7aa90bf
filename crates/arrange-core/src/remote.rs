/// Backend client over TCP with separated reader/writer tasks.
///
/// ```text
///   RemoteBackend::connect()
///         │  (waits for Hello, checks protocol version)
///         ├── writer_task  ← PendingRequest via mpsc, frame → socket
///         └── reader_task  ← frames from socket
///                               ├── Response → matched oneshot::Sender
///                               ├── Event    → route registered for its ChannelId
///                               └── Push     → orchestrator queue
/// ```
///
/// Each channelled command registers a route before its request is written,
/// so no event can arrive for an unknown channel.  A route is dropped after
/// its `finished` message, after a message it cannot decode, or once the
/// command's response arrives.  Events precede the response on the socket,
/// so nothing routable is lost.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use arrange_proto::error::{CommandError, CommandErrorKind};
use arrange_proto::events::{
    BufferEvent, ChannelMessage, CombineEvent, ExportEvent, OperationEvent, SortEvent,
};
use arrange_proto::model::{CombineAudioResult, FileMetadata, SectionSend, SortUpdate, SourceId};
use arrange_proto::protocol::{ChannelId, Command, Message, PROTOCOL_VERSION};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::backend::{Backend, Channel, CommandResult};
use crate::core::CoreHandle;

const HELLO_TIMEOUT: Duration = Duration::from_secs(5);

// ── internal types ────────────────────────────────────────────────────────────

type Reply = oneshot::Sender<CommandResult<Value>>;
type Pending = Arc<Mutex<HashMap<u64, Reply>>>;

/// Decodes one raw channel payload and forwards it.  Returns whether the
/// message was the channel's last.
type Route = Box<dyn Fn(Value) -> CommandResult<bool> + Send>;
type Routes = Arc<Mutex<HashMap<ChannelId, Route>>>;

struct PendingRequest {
    id: u64,
    frame: Vec<u8>,
    reply: Reply,
}

// ── RemoteBackend ─────────────────────────────────────────────────────────────

pub struct RemoteBackend {
    tx: mpsc::Sender<PendingRequest>,
    routes: Routes,
    next_request: AtomicU64,
    next_channel: AtomicU64,
}

impl RemoteBackend {
    /// Connect to `address` and forward pushed events into `core`.
    pub async fn connect(address: &str, core: CoreHandle) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address)
            .await
            .with_context(|| format!("connecting to backend at {}", address))?;
        info!("remote: connected to {}", address);
        let (mut read_half, write_half) = stream.into_split();

        let mut buf = Vec::new();
        let hello = tokio::time::timeout(HELLO_TIMEOUT, read_frame(&mut read_half, &mut buf))
            .await
            .context("backend did not send hello")??;
        match hello {
            Some(Message::Hello { protocol_version }) if protocol_version == PROTOCOL_VERSION => {
                debug!("remote: protocol {}", protocol_version);
            }
            Some(Message::Hello { protocol_version }) => anyhow::bail!(
                "backend speaks protocol {}, expected {}",
                protocol_version,
                PROTOCOL_VERSION
            ),
            Some(other) => anyhow::bail!("expected hello from backend, got {:?}", other),
            None => anyhow::bail!("backend closed the connection before hello"),
        }

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let routes: Routes = Arc::new(Mutex::new(HashMap::new()));
        let (tx, rx) = mpsc::channel::<PendingRequest>(64);

        tokio::spawn(writer_task(write_half, rx, pending.clone()));
        tokio::spawn(reader_task(read_half, buf, pending, routes.clone(), core));

        Ok(Self {
            tx,
            routes,
            next_request: AtomicU64::new(1),
            next_channel: AtomicU64::new(1),
        })
    }

    async fn request(&self, command: Command) -> CommandResult<Value> {
        let id = self.next_request.fetch_add(1, Ordering::Relaxed);
        let operation = command.operation();
        let frame = Message::Request { id, command }
            .encode()
            .map_err(|e| CommandError::new(CommandErrorKind::Decode, e.to_string()))?;

        let (reply, rx) = oneshot::channel();
        self.tx
            .send(PendingRequest { id, frame, reply })
            .await
            .map_err(|_| CommandError::disconnected("backend writer stopped"))?;
        debug!("remote: sent {} req={}", operation, id);

        rx.await
            .map_err(|_| CommandError::disconnected("backend connection closed"))?
    }

    async fn open_channel<E: OperationEvent>(&self, channel: Channel<E>) -> ChannelId {
        let id = ChannelId(self.next_channel.fetch_add(1, Ordering::Relaxed));
        let route: Route = Box::new(move |payload: Value| -> CommandResult<bool> {
            let message: ChannelMessage = serde_json::from_value::<E>(payload)?.into();
            let finished = message.is_finished();
            channel
                .send_message(message)
                .map_err(|e| CommandError::disconnected(e.to_string()))?;
            Ok(finished)
        });
        self.routes.lock().await.insert(id, route);
        id
    }

    /// Issue a channelled command.  The route does not outlive the reply.
    async fn channel_request<T: DeserializeOwned>(
        &self,
        channel: ChannelId,
        command: Command,
    ) -> CommandResult<T> {
        let result = self.request(command).await;
        if self.routes.lock().await.remove(&channel).is_some() {
            debug!("remote: closed channel {:?} on reply", channel);
        }
        decode(result?)
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> CommandResult<T> {
    Ok(serde_json::from_value(value)?)
}

impl Backend for RemoteBackend {
    async fn get_file_paths_in_folder(
        &self,
        folder_paths: Vec<String>,
    ) -> CommandResult<HashMap<String, Vec<String>>> {
        decode(self.request(Command::GetFilePathsInFolder { folder_paths }).await?)
    }

    async fn get_metadata(&self, titles: Vec<String>) -> CommandResult<Vec<FileMetadata>> {
        decode(self.request(Command::GetMetadata { titles }).await?)
    }

    async fn update_inputs(
        &self,
        sections: Vec<SectionSend>,
        on_event: Channel<BufferEvent>,
    ) -> CommandResult<String> {
        let on_event = self.open_channel(on_event).await;
        self.channel_request(on_event, Command::UpdateInputs { sections, on_event })
            .await
    }

    async fn combine_all_cached_samples_with_custom_order(
        &self,
        on_event: Channel<CombineEvent>,
    ) -> CommandResult<CombineAudioResult> {
        let on_event = self.open_channel(on_event).await;
        self.channel_request(
            on_event,
            Command::CombineAllCachedSamplesWithCustomOrder { on_event },
        )
        .await
    }

    async fn combine_audio_files(
        &self,
        input_files: Vec<String>,
        output_path: String,
    ) -> CommandResult<CombineAudioResult> {
        decode(
            self.request(Command::CombineAudioFiles {
                input_files,
                output_path,
            })
            .await?,
        )
    }

    async fn export_audio(
        &self,
        sample_rate: u32,
        format: String,
        output_file: String,
        on_event: Channel<ExportEvent>,
    ) -> CommandResult<String> {
        let on_event = self.open_channel(on_event).await;
        self.channel_request(
            on_event,
            Command::ExportAudio {
                sample_rate,
                format,
                output_file,
                on_event,
            },
        )
        .await
    }

    async fn update_sorting(
        &self,
        updates: Vec<SortUpdate>,
        on_event: Channel<SortEvent>,
    ) -> CommandResult<Vec<(SourceId, usize)>> {
        let on_event = self.open_channel(on_event).await;
        self.channel_request(on_event, Command::UpdateSorting { updates, on_event })
            .await
    }

    async fn cancel_combine(&self) -> CommandResult<()> {
        decode(self.request(Command::CancelCombine).await?)
    }

    async fn clear_audio_files(&self) -> CommandResult<()> {
        decode(self.request(Command::ClearAudioFiles).await?)
    }

    async fn open_in_explorer(&self, file_to_open: String) -> CommandResult<()> {
        decode(self.request(Command::OpenInExplorer { file_to_open }).await?)
    }

    async fn play_song(&self, title: String) -> CommandResult<()> {
        decode(self.request(Command::PlaySong { title }).await?)
    }

    async fn pause_song(&self) -> CommandResult<()> {
        decode(self.request(Command::PauseSong).await?)
    }

    async fn get_app_state(&self) -> CommandResult<Value> {
        self.request(Command::GetAppState).await
    }
}

// ── framing ───────────────────────────────────────────────────────────────────

/// Read until one whole frame is buffered.  `Ok(None)` on clean EOF.
async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> anyhow::Result<Option<Message>>
where
    R: AsyncRead + Unpin,
{
    let mut tmp = [0u8; 8192];
    loop {
        if let Some((msg, consumed)) = Message::decode(buf)? {
            buf.drain(..consumed);
            return Ok(Some(msg));
        }
        let n = reader.read(&mut tmp).await?;
        if n == 0 {
            return Ok(None);
        }
        buf.extend_from_slice(&tmp[..n]);
    }
}

// ── reader task ───────────────────────────────────────────────────────────────

async fn reader_task<R>(
    mut reader: R,
    mut buf: Vec<u8>,
    pending: Pending,
    routes: Routes,
    core: CoreHandle,
) where
    R: AsyncRead + Unpin,
{
    let reason = loop {
        let msg = match read_frame(&mut reader, &mut buf).await {
            Ok(Some(msg)) => msg,
            Ok(None) => break "backend connection closed".to_string(),
            Err(e) => break format!("backend read error: {}", e),
        };

        match msg {
            Message::Response { id, result } => match pending.lock().await.remove(&id) {
                Some(reply) => {
                    let _ = reply.send(result.into_result());
                }
                None => debug!("remote reader: response for unknown req={}", id),
            },
            Message::Event { channel, payload } => {
                let mut routes = routes.lock().await;
                let Some(route) = routes.get(&channel) else {
                    debug!("remote reader: event for closed channel {:?}", channel);
                    continue;
                };
                match route(payload) {
                    Ok(true) => {
                        routes.remove(&channel);
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("remote reader: dropping channel {:?}: {}", channel, e);
                        routes.remove(&channel);
                    }
                }
            }
            Message::Push { event } => {
                debug!("remote reader: push {}", event.name());
                if !core.push(event) {
                    break "orchestrator stopped".to_string();
                }
            }
            Message::Hello { .. } | Message::Request { .. } => {
                debug!("remote reader: unexpected frame from backend");
            }
        }
    };

    warn!("remote reader: {}", reason);
    for (_, reply) in pending.lock().await.drain() {
        let _ = reply.send(Err(CommandError::disconnected(reason.clone())));
    }
    routes.lock().await.clear();
}

// ── writer task ───────────────────────────────────────────────────────────────

async fn writer_task<W>(mut writer: W, mut rx: mpsc::Receiver<PendingRequest>, pending: Pending)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    while let Some(req) = rx.recv().await {
        // Register before writing so the reader can always match the reply.
        pending.lock().await.insert(req.id, req.reply);
        if let Err(e) = writer.write_all(&req.frame).await {
            warn!("remote writer: write error: {}", e);
            if let Some(reply) = pending.lock().await.remove(&req.id) {
                let _ = reply.send(Err(CommandError::disconnected(e.to_string())));
            }
            break;
        }
    }
    debug!("remote writer: task exiting");
}
