//! Channel-message reducers.
//!
//! Each handler is a plain function over the orchestrator's [`Model`] and
//! one typed payload.  Side effects are never performed here; a reducer
//! returns the [`Effect`]s it wants and the orchestrator carries them out.

use arrange_proto::channel::PhaseHandlers;
use arrange_proto::config::WaveformConfig;
use arrange_proto::events::{
    BufferFinished, BufferProgress, BufferStarted, CombineFinished, CombineProgress,
    CombineStarted, ExportFinished, ExportProgress, ExportStarted, SortFinished, SortProgress,
    SortStarted,
};
use arrange_proto::model::{CombinedVisual, TimelineItem};
use tracing::{debug, warn};

use crate::state::AppState;
use crate::svg;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Buffering is done; issue the combine for the same run.
    StartCombine,
    /// The combine for the current run completed.
    RunFinished,
    /// Re-run buffer → combine with the current inputs.
    RestartPipeline,
    ExportDone { output_path: String },
}

pub type Effects = Vec<Effect>;

/// State plus the per-run bookkeeping reducers need.
#[derive(Debug, Clone)]
pub struct Model {
    pub state: AppState,
    /// Amount each fragment is shifted by per unit of `startOffset`.
    /// `None` appends fragments as sent.
    pub shift_width: Option<f64>,
    /// Files taking part in the run being rendered.
    pub run_files: usize,
    /// The run's combine has been issued; later buffer finishes are ignored.
    pub combine_requested: bool,
}

impl Model {
    pub fn new(state: AppState, waveform: &WaveformConfig) -> Self {
        Self {
            state,
            shift_width: waveform.shift_fragments.then_some(waveform.width),
            run_files: 0,
            combine_requested: false,
        }
    }

    pub fn begin_run(&mut self, files: usize) {
        self.run_files = files;
        self.combine_requested = false;
        self.state.last_error = None;
    }
}

type Table<S, P, F> = PhaseHandlers<Model, S, P, F, Effects>;

/// Dispatch tables for every channelled operation.
pub struct Handlers {
    pub buffer: Table<BufferStarted, BufferProgress, BufferFinished>,
    pub combine: Table<CombineStarted, CombineProgress, CombineFinished>,
    pub export: Table<ExportStarted, ExportProgress, ExportFinished>,
    pub sort: Table<SortStarted, SortProgress, SortFinished>,
}

impl Default for Handlers {
    fn default() -> Self {
        Self {
            buffer: PhaseHandlers::new().on_finished(buffer_finished),
            combine: PhaseHandlers::new()
                .on_started(combine_started)
                .on_progress(combine_progress)
                .on_finished(combine_finished),
            export: PhaseHandlers::new()
                .on_started(export_started)
                .on_progress(export_progress)
                .on_finished(export_finished),
            sort: PhaseHandlers::new()
                .on_started(sort_started)
                .on_progress(sort_progress)
                .on_finished(sort_finished),
        }
    }
}

// ── buffer ────────────────────────────────────────────────────────────────────

pub fn buffer_finished(m: &mut Model, ev: BufferFinished) -> Effects {
    if m.combine_requested {
        debug!("buffer: extra finished (download {}) ignored", ev.download_id);
        return Vec::new();
    }
    m.combine_requested = true;
    vec![Effect::StartCombine]
}

// ── combine ───────────────────────────────────────────────────────────────────

pub fn combine_started(m: &mut Model, ev: CombineStarted) -> Effects {
    m.state.combined = CombinedVisual {
        svg_path: String::new(),
        duration_seconds: ev.duration,
    };
    m.state.timeline_items.clear();
    m.state.is_combining = true;
    m.state.combine_progress = 0.0;
    Vec::new()
}

pub fn combine_progress(m: &mut Model, ev: CombineProgress) -> Effects {
    let fragment = match m.shift_width {
        Some(width) if ev.start_offset != 0.0 => {
            svg::offset_fragment(&ev.svg_path, ev.start_offset * width)
        }
        _ => ev.svg_path.clone(),
    };
    m.state.combined.svg_path.push_str(&fragment);

    let item = TimelineItem::AudioFile {
        id: ev.id.clone(),
        start_offset: ev.start_offset,
        svg_path: ev.svg_path,
        file_name: ev.file_name.clone(),
        size: ev.size,
    };
    match m
        .state
        .timeline_items
        .iter_mut()
        .find(|existing| existing.id() == &ev.id)
    {
        Some(existing) => *existing = item,
        None => m.state.timeline_items.push(item),
    }

    let mut matched = false;
    for file in m.state.files_mut().filter(|f| f.path == ev.file_name) {
        file.id = Some(ev.id.clone());
        matched = true;
    }
    if !matched {
        debug!("combine: no input matches {} for id {}", ev.file_name, ev.id);
    }

    if m.run_files > 0 {
        let rendered = m
            .state
            .timeline_items
            .iter()
            .filter(|t| t.is_audio_file())
            .count();
        m.state.combine_progress = (rendered as f64 / m.run_files as f64).min(1.0);
    }
    Vec::new()
}

pub fn combine_finished(m: &mut Model, ev: CombineFinished) -> Effects {
    m.state.combined.svg_path = ev.svg_path;
    m.state.is_combining = false;
    m.state.combine_progress = 1.0;
    vec![Effect::RunFinished]
}

// ── export ────────────────────────────────────────────────────────────────────

pub fn export_started(m: &mut Model, _ev: ExportStarted) -> Effects {
    let export = &mut m.state.export;
    export.in_progress = true;
    export.progress = 0.0;
    export.message = None;
    export.error = None;
    Vec::new()
}

pub fn export_progress(m: &mut Model, ev: ExportProgress) -> Effects {
    m.state.export.progress = ev.progress.clamp(0.0, 1.0);
    m.state.export.message = Some(ev.message);
    Vec::new()
}

pub fn export_finished(m: &mut Model, ev: ExportFinished) -> Effects {
    let export = &mut m.state.export;
    export.in_progress = false;
    export.progress = 1.0;
    export.output_path = Some(ev.output_path.clone());
    vec![Effect::ExportDone {
        output_path: ev.output_path,
    }]
}

// ── sort ──────────────────────────────────────────────────────────────────────

pub fn sort_started(m: &mut Model, _ev: SortStarted) -> Effects {
    m.state.sort.in_progress = true;
    m.state.sort.progress = 0.0;
    Vec::new()
}

pub fn sort_progress(m: &mut Model, ev: SortProgress) -> Effects {
    m.state.sort.progress = ev.progress;
    match m
        .state
        .timeline_items
        .iter_mut()
        .find(|item| item.id() == &ev.id)
    {
        Some(item) => item.set_start_offset(ev.start_offset),
        None => {
            warn!("sort: no timeline item with id {}", ev.id);
            return Vec::new();
        }
    }
    m.state
        .timeline_items
        .sort_by(|a, b| a.start_offset().total_cmp(&b.start_offset()));
    Vec::new()
}

pub fn sort_finished(m: &mut Model, _ev: SortFinished) -> Effects {
    m.state.sort.in_progress = false;
    m.state.sort.progress = 1.0;
    vec![Effect::RestartPipeline]
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrange_proto::channel::Phase;
    use arrange_proto::model::{AudioFileItem, Color, Section, SectionKey, SourceId};

    fn model_with_files(paths: &[&str]) -> Model {
        let mut state = AppState::default();
        let mut section = Section::new(SectionKey(1), "/s", Color::default());
        section.files = paths
            .iter()
            .map(|p| AudioFileItem::new(*p, Color::default()))
            .collect();
        state.sections.push(section);
        let mut m = Model::new(state, &WaveformConfig::default());
        m.begin_run(paths.len());
        m
    }

    fn progress(id: &str, path: &str, offset: f64, svg: &str) -> CombineProgress {
        CombineProgress {
            id: SourceId::new(id),
            svg_path: svg.into(),
            start_offset: offset,
            file_name: path.into(),
            size: 100,
        }
    }

    fn ids(m: &Model) -> Vec<&str> {
        m.state
            .timeline_items
            .iter()
            .map(|t| t.id().as_str())
            .collect()
    }

    #[test]
    fn test_combine_accumulates_path_and_length() {
        let handlers = Handlers::default();
        let mut m = model_with_files(&["/s/a.wav", "/s/b.wav"]);

        handlers.combine.dispatch(
            &mut m,
            Phase::Started(CombineStarted {
                content_length: 2,
                duration: 12.5,
            }),
        );
        handlers.combine.dispatch(
            &mut m,
            Phase::Progress(progress("a", "/s/a.wav", 0.0, "M0,0")),
        );
        assert_eq!(m.state.combine_progress, 0.5);
        handlers.combine.dispatch(
            &mut m,
            Phase::Progress(progress("b", "/s/b.wav", 0.5, "L10,10")),
        );

        assert_eq!(m.state.combined.svg_path, "M0,0L10,10");
        assert_eq!(m.state.combined_file_length(), 12.5);
        assert!(m.state.is_combining);
        assert_eq!(m.state.combine_progress, 1.0);
        assert_eq!(
            m.state.sections[0].files[1].id,
            Some(SourceId::new("b"))
        );

        let effects = handlers
            .combine
            .dispatch(
                &mut m,
                Phase::Finished(CombineFinished {
                    svg_path: "M0,0 L10,10 Z".into(),
                }),
            )
            .unwrap();
        assert_eq!(effects, vec![Effect::RunFinished]);
        assert_eq!(m.state.combined.svg_path, "M0,0 L10,10 Z");
        assert!(!m.state.is_combining);
    }

    #[test]
    fn test_repeated_progress_upserts() {
        let mut m = model_with_files(&["/s/a.wav"]);
        for i in 0..5 {
            combine_progress(&mut m, progress("a", "/s/a.wav", i as f64, "M0,0"));
        }
        assert_eq!(m.state.timeline_items.len(), 1);
        assert_eq!(m.state.timeline_items[0].start_offset(), 4.0);
    }

    #[test]
    fn test_shifted_fragments() {
        let mut m = model_with_files(&["/s/a.wav"]);
        m.shift_width = Some(100.0);
        combine_progress(&mut m, progress("a", "/s/a.wav", 0.5, "M0,0 L1,2"));
        assert_eq!(m.state.combined.svg_path, "M50,0 L51,2");
    }

    #[test]
    fn test_only_first_buffer_finished_starts_combine() {
        let mut m = model_with_files(&["/s/a.wav"]);
        assert_eq!(
            buffer_finished(&mut m, BufferFinished { download_id: 1 }),
            vec![Effect::StartCombine]
        );
        assert!(buffer_finished(&mut m, BufferFinished { download_id: 2 }).is_empty());
    }

    #[test]
    fn test_sort_progress_reorders_by_offset() {
        let mut m = model_with_files(&["/s/a.wav", "/s/b.wav"]);
        combine_progress(&mut m, progress("a", "/s/a.wav", 0.0, ""));
        combine_progress(&mut m, progress("b", "/s/b.wav", 1.0, ""));
        assert_eq!(ids(&m), vec!["a", "b"]);

        sort_progress(
            &mut m,
            SortProgress {
                id: SourceId::new("a"),
                progress: 0.5,
                start_offset: 5.0,
            },
        );
        sort_progress(
            &mut m,
            SortProgress {
                id: SourceId::new("b"),
                progress: 1.0,
                start_offset: 2.0,
            },
        );
        assert_eq!(ids(&m), vec!["b", "a"]);
        assert_eq!(
            sort_finished(&mut m, SortFinished {}),
            vec![Effect::RestartPipeline]
        );
    }

    #[test]
    fn test_export_progress_overwrites() {
        let mut m = model_with_files(&[]);
        export_started(&mut m, ExportStarted {});
        export_progress(
            &mut m,
            ExportProgress {
                progress: 0.3,
                message: "encoding".into(),
            },
        );
        export_progress(
            &mut m,
            ExportProgress {
                progress: 0.7,
                message: "writing".into(),
            },
        );
        assert_eq!(m.state.export.progress, 0.7);
        assert_eq!(m.state.export.message.as_deref(), Some("writing"));
        assert!(m.state.export.in_progress);
    }
}
