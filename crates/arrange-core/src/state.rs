//! Application state owned by the orchestrator and its published snapshot.

use std::sync::Arc;

use arrange_proto::model::{
    AudioFileItem, CombinedVisual, ExportSettings, Section, SectionKey, TimelineItem,
};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::view::{self, SortSpec};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum PipelinePhase {
    #[default]
    Idle,
    /// Inputs changed; waiting for them to settle.
    Debouncing,
    /// A buffer → combine run is in flight.
    Running,
    /// Cancel and clear were issued after the inputs went empty.
    Cancelling,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    pub spec: Option<SortSpec>,
    pub in_progress: bool,
    pub progress: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportState {
    pub in_progress: bool,
    pub progress: f64,
    pub message: Option<String>,
    pub error: Option<String>,
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    /// Bumped on every published change.
    pub rev: u64,
    pub sections: Vec<Section>,
    pub timeline_items: Vec<TimelineItem>,
    pub combined: CombinedVisual,
    pub is_combining: bool,
    /// Fraction of the current run's files that have a timeline item.
    pub combine_progress: f64,
    pub phase: PipelinePhase,
    pub sort: SortState,
    pub export: ExportState,
    pub export_settings: ExportSettings,
    pub playing_song: Option<String>,
    pub play_progress: Option<f64>,
    pub last_error: Option<String>,
}

impl AppState {
    pub fn new(export_settings: ExportSettings) -> Self {
        Self {
            export_settings,
            ..Self::default()
        }
    }

    /// Total duration of the combined arrangement, seconds.
    pub fn combined_file_length(&self) -> f64 {
        self.combined.duration_seconds
    }

    pub fn files(&self) -> impl Iterator<Item = &AudioFileItem> {
        self.sections.iter().flat_map(|s| s.files.iter())
    }

    pub fn files_mut(&mut self) -> impl Iterator<Item = &mut AudioFileItem> {
        self.sections.iter_mut().flat_map(|s| s.files.iter_mut())
    }

    pub fn file_count(&self) -> usize {
        self.sections.iter().map(|s| s.files.len()).sum()
    }

    pub fn section_mut(&mut self, key: SectionKey) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.key == key)
    }

    pub fn sorted_view(&self) -> Vec<AudioFileItem> {
        view::sorted_files(&self.sections, self.sort.spec.as_ref())
    }

    pub fn reindex(&mut self) {
        view::apply_indices(&mut self.sections, self.sort.spec.as_ref());
    }

    /// Drop everything the last run rendered.
    pub fn reset_visual(&mut self) {
        self.combined = CombinedVisual::default();
        self.timeline_items.clear();
        self.is_combining = false;
        self.combine_progress = 0.0;
    }

    pub fn summary_line(&self) -> String {
        format!(
            "rev={} phase={:?} sections={} files={} timeline={} path={}B length={:.2}s combining={} {:.0}%",
            self.rev,
            self.phase,
            self.sections.len(),
            self.file_count(),
            self.timeline_items.len(),
            self.combined.svg_path.len(),
            self.combined.duration_seconds,
            self.is_combining,
            self.combine_progress * 100.0
        )
    }
}

/// Read side of the state.  The orchestrator replaces the snapshot after
/// each event that changed something; readers only ever clone it.
#[derive(Clone, Default)]
pub struct StateStore {
    state: Arc<RwLock<AppState>>,
}

impl StateStore {
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn get_state(&self) -> AppState {
        self.state.read().await.clone()
    }

    pub async fn replace(&self, state: AppState) {
        *self.state.write().await = state;
    }
}

/// Broadcast to listeners after the orchestrator acts.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    StateUpdated { rev: u64 },
    PipelineFinished,
    ExportFinished { output_path: String },
    CommandFailed { operation: String, message: String },
}
