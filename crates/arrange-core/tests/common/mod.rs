#![allow(dead_code)]

pub mod scripted;

use std::sync::Arc;
use std::time::Duration;

use arrange_core::core::{event_channel, CoreEvent, CoreHandle, Orchestrator};
use arrange_core::intent::Intent;
use arrange_core::state::{AppState, Notification};
use arrange_proto::channel::Phase;
use arrange_proto::config::Config;
use arrange_proto::events::{CombineEvent, CombineProgress, PushedEvent};
use arrange_proto::model::{Color, SourceId};
use tokio::sync::{broadcast, mpsc};

use scripted::ScriptedBackend;

pub const DEBOUNCE: Duration = Duration::from_millis(1000);

/// Drives an orchestrator by hand: every queued event is folded in by the
/// test task itself, so assertions see state right after `settle`.
pub struct Harness {
    pub core: Orchestrator<ScriptedBackend>,
    pub backend: Arc<ScriptedBackend>,
    pub handle: CoreHandle,
    pub notifications: broadcast::Receiver<Notification>,
    events: mpsc::UnboundedReceiver<CoreEvent>,
}

impl Harness {
    pub fn new(backend: ScriptedBackend) -> Self {
        Self::with_config(backend, Config::default())
    }

    pub fn with_config(backend: ScriptedBackend, config: Config) -> Self {
        let backend = Arc::new(backend);
        let (handle, events) = event_channel();
        let (broadcast_tx, notifications) = broadcast::channel(1024);
        let core = Orchestrator::new(config, Arc::clone(&backend), handle.clone(), broadcast_tx);
        Self {
            core,
            backend,
            handle,
            notifications,
            events,
        }
    }

    pub fn state(&self) -> &AppState {
        self.core.state()
    }

    /// Let spawned commands run and fold in everything they queued.
    pub async fn settle(&mut self) {
        for _ in 0..16 {
            tokio::task::yield_now().await;
            while let Ok(evt) = self.events.try_recv() {
                let _ = self.core.handle(evt).await;
            }
        }
    }

    pub async fn intent(&mut self, intent: Intent) {
        let _ = self.core.handle(CoreEvent::Intent(intent)).await;
        self.settle().await;
    }

    pub async fn add_section(&mut self, folder: &str) {
        self.intent(Intent::AddSection {
            folder_path: folder.to_string(),
            color: Color::default(),
        })
        .await;
    }

    pub async fn push(&mut self, event: PushedEvent) {
        let _ = self.core.handle(CoreEvent::Pushed(event)).await;
        self.settle().await;
    }

    /// Advance the paused clock.
    pub async fn advance(&mut self, by: Duration) {
        tokio::time::sleep(by).await;
        self.settle().await;
    }

    pub async fn wait_debounce(&mut self) {
        self.advance(DEBOUNCE + Duration::from_millis(10)).await;
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.notifications.try_recv() {
            out.push(n);
        }
        out
    }
}

pub fn progress(id: &str, path: &str, start_offset: f64, svg: &str) -> CombineProgress {
    CombineProgress {
        id: SourceId::new(id),
        svg_path: svg.to_string(),
        start_offset,
        file_name: path.to_string(),
        size: 4096,
    }
}

pub fn combine_progress(id: &str, path: &str, start_offset: f64, svg: &str) -> CombineEvent {
    Phase::Progress(progress(id, path, start_offset, svg))
}
