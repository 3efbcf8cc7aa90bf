/// Orchestrator: single-owner event loop for all front-end state.
///
/// Every input arrives as a `CoreEvent` on one unbounded queue: user
/// intents, three-phase channel messages, backend pushes, debounce timers
/// and the continuations of commands spawned earlier.  The orchestrator
/// folds them in strictly in arrival order, so no lock guards `AppState`.
///
/// After each event that changed state, the snapshot in the `StateStore`
/// is replaced and `Notification::StateUpdated` is broadcast.
///
/// Backend calls never run on the loop itself.  They are spawned, timed by
/// the `Invoker`, and report back as `CoreEvent::CommandCompleted`.
///
/// Runs are tracked per operation kind.  A channel message whose run is not
/// the current run of its kind is stale and dropped.
use std::ops::ControlFlow;
use std::sync::Arc;

use arrange_proto::config::Config;
use arrange_proto::error::{CommandError, Error};
use arrange_proto::events::{ChannelMessage, OperationEvent, PushedEvent};
use arrange_proto::model::{
    AudioFileItem, CombineAudioResult, FileMetadata, Section, SectionError, SectionKey,
};
use arrange_proto::protocol::Operation;
use futures_util::future::join_all;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};

use crate::backend::{Backend, Channel, CommandResult, RunId};
use crate::debounce::Debouncer;
use crate::fingerprint::InputFingerprint;
use crate::intent::Intent;
use crate::invoke::Invoker;
use crate::reducers::{Effect, Handlers, Model};
use crate::state::{AppState, Notification, PipelinePhase, StateStore};
use crate::view;

// ── CoreEvent ─────────────────────────────────────────────────────────────────

/// All inputs into the orchestrator loop.
#[derive(Debug)]
pub enum CoreEvent {
    Intent(Intent),
    /// A message on an operation channel opened by run `run`.
    Channel { run: RunId, message: ChannelMessage },
    /// Backend event outside any channel.
    Pushed(PushedEvent),
    DebounceElapsed { token: u64 },
    FolderScanned {
        section: SectionKey,
        folder_path: String,
        result: CommandResult<Vec<String>>,
    },
    MetadataFetched {
        section: SectionKey,
        fetched: Vec<FileMetadata>,
        failures: Vec<(String, CommandError)>,
    },
    CommandCompleted {
        operation: Operation,
        run: Option<RunId>,
        result: CommandResult<Outcome>,
    },
    Shutdown,
}

/// Successful result of a spawned command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Done,
    Message(String),
    Combined(CombineAudioResult),
    Sorted(usize),
    Playing(String),
    BackendState(serde_json::Value),
}

/// Cloneable sender into the orchestrator loop.
#[derive(Debug, Clone)]
pub struct CoreHandle {
    tx: mpsc::UnboundedSender<CoreEvent>,
}

impl CoreHandle {
    pub fn send(&self, event: CoreEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn intent(&self, intent: Intent) -> bool {
        self.send(CoreEvent::Intent(intent))
    }

    pub fn push(&self, event: PushedEvent) -> bool {
        self.send(CoreEvent::Pushed(event))
    }

    pub fn shutdown(&self) {
        let _ = self.tx.send(CoreEvent::Shutdown);
    }

    pub(crate) fn channel<E: OperationEvent>(&self, run: RunId) -> Channel<E> {
        Channel::new(run, self.tx.clone())
    }
}

/// Create the orchestrator's queue.  The handle can be given to a backend
/// before the orchestrator exists so it can forward pushed events.
pub fn event_channel() -> (CoreHandle, mpsc::UnboundedReceiver<CoreEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CoreHandle { tx }, rx)
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

pub struct Orchestrator<B: Backend> {
    backend: Arc<B>,
    invoker: Invoker,
    handle: CoreHandle,
    store: StateStore,
    broadcast_tx: broadcast::Sender<Notification>,
    handlers: Handlers,
    model: Model,
    debouncer: Debouncer,
    /// Last fingerprint seen; compared against on every input change.
    observed: InputFingerprint,
    next_run: u64,
    next_section: u64,
    pipeline_run: Option<RunId>,
    sort_run: Option<RunId>,
    export_run: Option<RunId>,
    dirty: bool,
}

impl<B: Backend> Orchestrator<B> {
    pub fn new(
        config: Config,
        backend: Arc<B>,
        handle: CoreHandle,
        broadcast_tx: broadcast::Sender<Notification>,
    ) -> Self {
        let state = AppState::new(config.export.clone());
        Self {
            backend,
            invoker: Invoker::new(config.metrics.window),
            handle,
            store: StateStore::new(state.clone()),
            broadcast_tx,
            handlers: Handlers::default(),
            model: Model::new(state, &config.waveform),
            debouncer: Debouncer::new(config.pipeline.debounce()),
            observed: InputFingerprint::default(),
            next_run: 0,
            next_section: 0,
            pipeline_run: None,
            sort_run: None,
            export_run: None,
            dirty: false,
        }
    }

    pub fn store(&self) -> StateStore {
        self.store.clone()
    }

    pub fn invoker(&self) -> Invoker {
        self.invoker.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.model.state
    }

    /// Run the loop until `Shutdown` or until every sender is gone.
    pub async fn run(mut self, mut event_rx: mpsc::UnboundedReceiver<CoreEvent>) -> anyhow::Result<()> {
        info!("Orchestrator: starting event loop");
        while let Some(evt) = event_rx.recv().await {
            if self.handle(evt).await.is_break() {
                info!("Orchestrator: shutdown requested");
                break;
            }
        }
        self.debouncer.cancel();
        Ok(())
    }

    /// Fold one event into state.
    pub async fn handle(&mut self, evt: CoreEvent) -> ControlFlow<()> {
        match evt {
            CoreEvent::Shutdown => return ControlFlow::Break(()),
            CoreEvent::Intent(intent) => self.handle_intent(intent).await,
            CoreEvent::Channel { run, message } => self.handle_channel(run, message),
            CoreEvent::Pushed(event) => self.handle_pushed(event),
            CoreEvent::DebounceElapsed { token } => {
                if self.debouncer.take_if_current(token) {
                    debug!("Orchestrator: inputs settled (token {})", token);
                    self.start_pipeline();
                } else {
                    debug!("Orchestrator: superseded debounce token {}", token);
                }
            }
            CoreEvent::FolderScanned {
                section,
                folder_path,
                result,
            } => self.handle_scan(section, folder_path, result),
            CoreEvent::MetadataFetched {
                section,
                fetched,
                failures,
            } => self.handle_metadata(section, fetched, failures),
            CoreEvent::CommandCompleted {
                operation,
                run,
                result,
            } => self.handle_completion(operation, run, result),
        }

        if self.dirty {
            self.dirty = false;
            self.publish().await;
        }
        ControlFlow::Continue(())
    }

    async fn publish(&mut self) {
        self.model.state.rev += 1;
        let rev = self.model.state.rev;
        self.store.replace(self.model.state.clone()).await;
        let _ = self.broadcast_tx.send(Notification::StateUpdated { rev });
    }

    fn notify(&self, notification: Notification) {
        let _ = self.broadcast_tx.send(notification);
    }

    fn alloc_run(&mut self) -> RunId {
        self.next_run += 1;
        RunId(self.next_run)
    }

    // ── intents ───────────────────────────────────────────────────────────────

    async fn handle_intent(&mut self, intent: Intent) {
        info!("Orchestrator: intent {:?}", intent);
        match intent {
            Intent::AddSection { folder_path, color } => {
                let key = SectionKey(self.next_section);
                self.next_section += 1;
                self.model
                    .state
                    .sections
                    .insert(0, Section::new(key, folder_path.clone(), color));
                self.spawn_scan(key, folder_path);
                self.inputs_changed();
            }

            Intent::DeleteSection { index } => {
                if index >= self.model.state.sections.len() {
                    warn!("Orchestrator: no section at index {}", index);
                    return;
                }
                let removed = self.model.state.sections.remove(index);
                debug!("Orchestrator: removed section {}", removed.folder_path);
                self.inputs_changed();
            }

            Intent::UpdatePath { index, folder_path } => {
                let Some(section) = self.model.state.sections.get_mut(index) else {
                    warn!("Orchestrator: no section at index {}", index);
                    return;
                };
                if section.folder_path == folder_path {
                    return;
                }
                section.folder_path = folder_path.clone();
                section.files.clear();
                section.errors.clear();
                let key = section.key;
                self.spawn_scan(key, folder_path);
                self.inputs_changed();
            }

            Intent::SetSort { sort } => self.set_sort(sort),

            Intent::Export {
                output_path,
                settings,
            } => {
                let settings = settings.unwrap_or_else(|| self.model.state.export_settings.clone());
                self.start_export(settings.sample_rate, settings.format, output_path);
            }

            Intent::CombineFiles {
                input_files,
                output_path,
            } => {
                let backend = Arc::clone(&self.backend);
                self.spawn_command(Operation::CombineAudioFiles, None, async move {
                    backend
                        .combine_audio_files(input_files, output_path)
                        .await
                        .map(Outcome::Combined)
                });
            }

            Intent::PlaySong { path } => {
                let backend = Arc::clone(&self.backend);
                self.spawn_command(Operation::PlaySong, None, async move {
                    backend.play_song(path.clone()).await.map(|_| Outcome::Playing(path))
                });
            }

            Intent::PauseSong => {
                let backend = Arc::clone(&self.backend);
                self.spawn_command(Operation::PauseSong, None, async move {
                    backend.pause_song().await.map(|_| Outcome::Done)
                });
            }

            Intent::ResetPerformance => {
                self.invoker.metrics().write().await.reset();
                info!("Orchestrator: performance metrics reset");
            }

            Intent::DumpBackendState => {
                let backend = Arc::clone(&self.backend);
                self.spawn_command(Operation::GetAppState, None, async move {
                    backend.get_app_state().await.map(Outcome::BackendState)
                });
            }
        }
    }

    // ── inputs → pipeline ─────────────────────────────────────────────────────

    /// Compare the current inputs against the last observed ones and react.
    fn inputs_changed(&mut self) {
        self.model.state.reindex();
        self.dirty = true;

        let current = InputFingerprint::of(&self.model.state.sections);
        if current == self.observed {
            return;
        }
        let previous = std::mem::replace(&mut self.observed, current);

        if self.observed.is_empty() {
            if !previous.is_empty() || self.pipeline_run.is_some() || self.debouncer.is_pending() {
                self.cancel_pipeline();
            }
            return;
        }

        let token = self
            .debouncer
            .schedule(&self.handle.tx, |token| CoreEvent::DebounceElapsed { token });
        debug!(
            "Orchestrator: inputs changed ({} files), debounce token {}",
            self.observed.file_count(),
            token
        );
        self.model.state.phase = PipelinePhase::Debouncing;
    }

    /// Inputs went empty: drop whatever was rendered and tell the backend.
    fn cancel_pipeline(&mut self) {
        self.debouncer.cancel();
        if let Some(run) = self.pipeline_run.take() {
            info!("Orchestrator: cancelling pipeline run {}", run);
        }
        self.model.state.reset_visual();
        self.model.state.phase = PipelinePhase::Cancelling;
        self.dirty = true;

        let backend = Arc::clone(&self.backend);
        let invoker = self.invoker.clone();
        let tx = self.handle.tx.clone();
        tokio::spawn(async move {
            let cancelled = invoker
                .invoke(Operation::CancelCombine, backend.cancel_combine())
                .await;
            let _ = tx.send(CoreEvent::CommandCompleted {
                operation: Operation::CancelCombine,
                run: None,
                result: cancelled.map(|_| Outcome::Done),
            });
            let cleared = invoker
                .invoke(Operation::ClearAudioFiles, backend.clear_audio_files())
                .await;
            let _ = tx.send(CoreEvent::CommandCompleted {
                operation: Operation::ClearAudioFiles,
                run: None,
                result: cleared.map(|_| Outcome::Done),
            });
        });
    }

    /// Start buffer → combine for the observed inputs.  Supersedes any run
    /// already in flight.
    fn start_pipeline(&mut self) {
        if self.observed.is_empty() {
            debug!("Orchestrator: nothing to render");
            return;
        }
        let run = self.alloc_run();
        if let Some(old) = self.pipeline_run.replace(run) {
            info!("Orchestrator: run {} supersedes {}", run, old);
        }
        self.model.begin_run(self.observed.file_count());
        self.model.state.phase = PipelinePhase::Running;
        self.dirty = true;

        info!(
            "Orchestrator: starting pipeline run {} ({} files)",
            run,
            self.observed.file_count()
        );
        let sections = self.observed.to_send();
        let channel = self.handle.channel(run);
        let backend = Arc::clone(&self.backend);
        self.spawn_command(Operation::UpdateInputs, Some(run), async move {
            backend
                .update_inputs(sections, channel)
                .await
                .map(Outcome::Message)
        });
    }

    fn start_combine(&mut self, run: RunId) {
        info!("Orchestrator: combining run {}", run);
        let channel = self.handle.channel(run);
        let backend = Arc::clone(&self.backend);
        self.spawn_command(
            Operation::CombineAllCachedSamplesWithCustomOrder,
            Some(run),
            async move {
                backend
                    .combine_all_cached_samples_with_custom_order(channel)
                    .await
                    .map(Outcome::Combined)
            },
        );
    }

    fn restart_pipeline(&mut self) {
        if self.debouncer.is_pending() {
            debug!("Orchestrator: restart deferred to pending debounce");
            return;
        }
        self.start_pipeline();
    }

    // ── sort / export ─────────────────────────────────────────────────────────

    fn set_sort(&mut self, sort: Option<view::SortSpec>) {
        if self.model.state.sort.spec == sort {
            return;
        }
        self.model.state.sort.spec = sort;
        self.model.state.reindex();
        self.dirty = true;

        if sort.is_none() {
            return;
        }
        let (updates, skipped) = view::sort_updates(&self.model.state.sorted_view());
        if skipped > 0 {
            debug!("Orchestrator: {} files without backend id left out of sort", skipped);
        }
        if updates.is_empty() {
            info!("Orchestrator: no combined files yet, sort applies to view only");
            return;
        }

        let run = self.alloc_run();
        self.sort_run = Some(run);
        self.model.state.sort.in_progress = true;
        self.model.state.sort.progress = 0.0;
        let channel = self.handle.channel(run);
        let backend = Arc::clone(&self.backend);
        self.spawn_command(Operation::UpdateSorting, Some(run), async move {
            backend
                .update_sorting(updates, channel)
                .await
                .map(|order| Outcome::Sorted(order.len()))
        });
    }

    fn start_export(&mut self, sample_rate: u32, format: String, output_file: String) {
        let run = self.alloc_run();
        if let Some(old) = self.export_run.replace(run) {
            info!("Orchestrator: export {} supersedes {}", run, old);
        }
        let export = &mut self.model.state.export;
        export.in_progress = true;
        export.progress = 0.0;
        export.message = None;
        export.error = None;
        self.dirty = true;

        let channel = self.handle.channel(run);
        let backend = Arc::clone(&self.backend);
        self.spawn_command(Operation::ExportAudio, Some(run), async move {
            backend
                .export_audio(sample_rate, format, output_file, channel)
                .await
                .map(Outcome::Message)
        });
    }

    // ── channel messages ──────────────────────────────────────────────────────

    fn current_run(&self, message: &ChannelMessage) -> Option<RunId> {
        match message {
            ChannelMessage::Buffer(_) | ChannelMessage::Combine(_) => self.pipeline_run,
            ChannelMessage::Sort(_) => self.sort_run,
            ChannelMessage::Export(_) => self.export_run,
        }
    }

    fn handle_channel(&mut self, run: RunId, message: ChannelMessage) {
        let current = self.current_run(&message);
        if current != Some(run) {
            let stale = Error::StaleEvent {
                operation: message.operation(),
                run: run.0,
                current: current.map(|r| r.0),
            };
            debug!("Orchestrator: dropping {}", stale);
            return;
        }

        let effects = match message {
            ChannelMessage::Buffer(ev) => self.handlers.buffer.dispatch(&mut self.model, ev),
            ChannelMessage::Combine(ev) => {
                if ev.is_finished() {
                    self.pipeline_run = None;
                }
                self.handlers.combine.dispatch(&mut self.model, ev)
            }
            ChannelMessage::Export(ev) => {
                if ev.is_finished() {
                    self.export_run = None;
                }
                self.handlers.export.dispatch(&mut self.model, ev)
            }
            ChannelMessage::Sort(ev) => {
                if ev.is_finished() {
                    self.sort_run = None;
                }
                self.handlers.sort.dispatch(&mut self.model, ev)
            }
        };
        self.dirty = true;

        for effect in effects.unwrap_or_default() {
            self.apply_effect(run, effect);
        }
    }

    fn apply_effect(&mut self, run: RunId, effect: Effect) {
        match effect {
            Effect::StartCombine => self.start_combine(run),
            Effect::RunFinished => {
                info!("Orchestrator: run {} finished", run);
                if self.model.state.phase == PipelinePhase::Running {
                    self.model.state.phase = PipelinePhase::Idle;
                }
                self.notify(Notification::PipelineFinished);
            }
            Effect::RestartPipeline => self.restart_pipeline(),
            Effect::ExportDone { output_path } => {
                info!("Orchestrator: exported {}", output_path);
                self.notify(Notification::ExportFinished {
                    output_path: output_path.clone(),
                });
                let backend = Arc::clone(&self.backend);
                self.spawn_command(Operation::OpenInExplorer, None, async move {
                    backend.open_in_explorer(output_path).await.map(|_| Outcome::Done)
                });
            }
        }
    }

    // ── pushed events ─────────────────────────────────────────────────────────

    fn handle_pushed(&mut self, event: PushedEvent) {
        let state = &mut self.model.state;
        match event {
            PushedEvent::SongProgress(p) => state.play_progress = Some(p),
            other if self.pipeline_run.is_none() => {
                debug!("Orchestrator: {} outside of a run dropped", other.name());
                return;
            }
            PushedEvent::CombinedCached(result) => {
                state.combined.svg_path.push_str(&result.svg_path);
                state.combined.duration_seconds = result.duration;
            }
            PushedEvent::ProcessedSegment(fragment) => {
                state.combined.svg_path.push_str(&fragment);
            }
            PushedEvent::TotalLength(seconds) => state.combined.duration_seconds = seconds,
            PushedEvent::CombineAudioProgress(p) => state.combine_progress = p.clamp(0.0, 1.0),
        }
        self.dirty = true;
    }

    // ── scans and metadata ────────────────────────────────────────────────────

    fn spawn_scan(&self, section: SectionKey, folder_path: String) {
        let backend = Arc::clone(&self.backend);
        let invoker = self.invoker.clone();
        let tx = self.handle.tx.clone();
        tokio::spawn(async move {
            let result = invoker
                .invoke(
                    Operation::GetFilePathsInFolder,
                    backend.get_file_paths_in_folder(vec![folder_path.clone()]),
                )
                .await
                .map(|mut by_folder| by_folder.remove(&folder_path).unwrap_or_default());
            let _ = tx.send(CoreEvent::FolderScanned {
                section,
                folder_path,
                result,
            });
        });
    }

    fn handle_scan(
        &mut self,
        key: SectionKey,
        folder_path: String,
        result: CommandResult<Vec<String>>,
    ) {
        let Some(section) = self.model.state.section_mut(key) else {
            debug!("Orchestrator: scan result for removed section {}", folder_path);
            return;
        };
        if section.folder_path != folder_path {
            debug!("Orchestrator: scan result for old path {}", folder_path);
            return;
        }

        match result {
            Ok(paths) => {
                info!("Orchestrator: {} has {} files", folder_path, paths.len());
                let previous = std::mem::take(&mut section.files);
                section.files = paths
                    .iter()
                    .map(|path| {
                        previous
                            .iter()
                            .find(|f| &f.path == path)
                            .cloned()
                            .unwrap_or_else(|| AudioFileItem::new(path.clone(), section.color.clone()))
                    })
                    .collect();
                section.errors.clear();
                self.spawn_metadata(key, paths);
            }
            Err(e) => {
                warn!("Orchestrator: scanning {} failed: {}", folder_path, e);
                section.errors.push(SectionError {
                    kind: e.kind,
                    message: e.message,
                });
            }
        }
        self.inputs_changed();
    }

    /// One `get_metadata` per file, all in flight together.  Failures are
    /// collected per file; the rest still apply.
    fn spawn_metadata(&self, section: SectionKey, paths: Vec<String>) {
        if paths.is_empty() {
            return;
        }
        let backend = Arc::clone(&self.backend);
        let invoker = self.invoker.clone();
        let tx = self.handle.tx.clone();
        tokio::spawn(async move {
            let calls = paths.into_iter().map(|path| {
                let backend = Arc::clone(&backend);
                let invoker = invoker.clone();
                async move {
                    let result = invoker
                        .invoke(Operation::GetMetadata, backend.get_metadata(vec![path.clone()]))
                        .await;
                    (path, result)
                }
            });

            let mut fetched = Vec::new();
            let mut failures = Vec::new();
            for (path, result) in join_all(calls).await {
                match result {
                    Ok(metadata) => fetched.extend(metadata),
                    Err(e) => failures.push((path, e)),
                }
            }
            let _ = tx.send(CoreEvent::MetadataFetched {
                section,
                fetched,
                failures,
            });
        });
    }

    fn handle_metadata(
        &mut self,
        key: SectionKey,
        fetched: Vec<FileMetadata>,
        failures: Vec<(String, CommandError)>,
    ) {
        for meta in &fetched {
            for file in self.model.state.files_mut().filter(|f| f.path == meta.path) {
                file.apply_metadata(meta);
            }
        }
        if !failures.is_empty() {
            match self.model.state.section_mut(key) {
                Some(section) => {
                    for (path, e) in failures {
                        warn!("Orchestrator: metadata for {} failed: {}", path, e);
                        section.errors.push(SectionError {
                            kind: e.kind,
                            message: format!("{}: {}", path, e.message),
                        });
                    }
                }
                None => debug!("Orchestrator: metadata failures for removed section"),
            }
        }
        self.model.state.reindex();
        self.dirty = true;
    }

    // ── command continuations ─────────────────────────────────────────────────

    fn spawn_command<F>(&self, operation: Operation, run: Option<RunId>, call: F)
    where
        F: std::future::Future<Output = CommandResult<Outcome>> + Send + 'static,
    {
        let invoker = self.invoker.clone();
        let tx = self.handle.tx.clone();
        tokio::spawn(async move {
            let result = invoker.invoke(operation, call).await;
            let _ = tx.send(CoreEvent::CommandCompleted {
                operation,
                run,
                result,
            });
        });
    }

    fn handle_completion(
        &mut self,
        operation: Operation,
        run: Option<RunId>,
        result: CommandResult<Outcome>,
    ) {
        match result {
            Ok(outcome) => self.command_succeeded(operation, run, outcome),
            Err(e) => self.command_failed(operation, run, e),
        }
    }

    fn command_succeeded(&mut self, operation: Operation, run: Option<RunId>, outcome: Outcome) {
        match outcome {
            Outcome::Combined(result) if operation == Operation::CombineAudioFiles => {
                info!("Orchestrator: combined into {}", result.output);
                self.model.state.combined.svg_path = result.svg_path;
                self.dirty = true;
            }
            Outcome::Playing(path) => {
                self.model.state.playing_song = Some(path);
                self.dirty = true;
            }
            Outcome::Sorted(n) => debug!("Orchestrator: backend applied order of {} files", n),
            Outcome::BackendState(value) => info!("Orchestrator: backend state {}", value),
            Outcome::Message(msg) => debug!("Orchestrator: {} {:?}: {}", operation, run, msg),
            Outcome::Combined(_) | Outcome::Done => {
                debug!("Orchestrator: {} {:?} returned", operation, run)
            }
        }

        if operation == Operation::ClearAudioFiles
            && self.model.state.phase == PipelinePhase::Cancelling
        {
            self.model.state.phase = PipelinePhase::Idle;
            self.dirty = true;
        }
    }

    fn command_failed(&mut self, operation: Operation, run: Option<RunId>, e: CommandError) {
        warn!("Orchestrator: {} failed: {}", operation, e);
        let state = &mut self.model.state;
        state.last_error = Some(format!("{}: {}", operation, e));
        self.dirty = true;

        match operation {
            Operation::UpdateInputs | Operation::CombineAllCachedSamplesWithCustomOrder => {
                if run.is_some() && run == self.pipeline_run {
                    self.pipeline_run = None;
                    state.is_combining = false;
                    if state.phase == PipelinePhase::Running {
                        state.phase = PipelinePhase::Idle;
                    }
                }
            }
            Operation::UpdateSorting => {
                if run.is_some() && run == self.sort_run {
                    self.sort_run = None;
                    state.sort.in_progress = false;
                }
            }
            Operation::ExportAudio => {
                if run.is_some() && run == self.export_run {
                    self.export_run = None;
                }
                state.export.in_progress = false;
                state.export.error = Some(e.message.clone());
            }
            Operation::ClearAudioFiles => {
                if state.phase == PipelinePhase::Cancelling {
                    state.phase = PipelinePhase::Idle;
                }
            }
            _ => {}
        }

        self.notify(Notification::CommandFailed {
            operation: operation.name().to_string(),
            message: e.to_string(),
        });
    }
}
