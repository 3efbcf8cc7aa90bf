use serde::{Deserialize, Serialize};

use crate::error::CommandErrorKind;

/// Correlation id the backend assigns to a source once it takes part in a
/// combine or sort run.  Paths can collide across reorders; ids do not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(pub String);

impl SourceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display color attached to a section and its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub name: String,
    pub rgb: [u8; 3],
}

impl Default for Color {
    fn default() -> Self {
        Self {
            name: "Gray".to_string(),
            rgb: [153, 153, 153],
        }
    }
}

/// Error shown inline next to the section that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionError {
    pub kind: CommandErrorKind,
    pub message: String,
}

/// Stable identity of a section.  Indices shift when sections are added in
/// front or removed; asynchronous scan results are matched on this instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionKey(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFileItem {
    pub path: String,
    /// Only present after the file took part in a combine run.
    pub id: Option<SourceId>,
    /// Position in the derived view; recomputed, never authoritative.
    pub index: usize,
    pub color: Color,
    pub size: Option<u64>,
    pub bit_rate: Option<u32>,
    pub channels: Option<u8>,
    pub bit_depth: Option<u8>,
    pub duration_ms: Option<u64>,
}

impl AudioFileItem {
    pub fn new(path: impl Into<String>, color: Color) -> Self {
        Self {
            path: path.into(),
            id: None,
            index: 0,
            color,
            size: None,
            bit_rate: None,
            channels: None,
            bit_depth: None,
            duration_ms: None,
        }
    }

    /// Last path component, accepting both separators.
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit(|c| c == '/' || c == '\\')
            .next()
            .unwrap_or(&self.path)
    }

    pub fn apply_metadata(&mut self, meta: &FileMetadata) {
        self.size = meta.size;
        self.bit_rate = meta.bit_rate;
        self.channels = meta.channels;
        self.bit_depth = meta.bit_depth;
        self.duration_ms = Some(meta.duration);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub key: SectionKey,
    pub folder_path: String,
    pub files: Vec<AudioFileItem>,
    pub errors: Vec<SectionError>,
    pub color: Color,
}

impl Section {
    pub fn new(key: SectionKey, folder_path: impl Into<String>, color: Color) -> Self {
        Self {
            key,
            folder_path: folder_path.into(),
            files: Vec::new(),
            errors: Vec::new(),
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSend {
    pub folder_path: String,
    pub paths: Vec<AudioSend>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSend {
    pub path: String,
}

/// Metadata the backend extracts for one file.  `duration` is in
/// milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub path: String,
    pub size: Option<u64>,
    pub bit_rate: Option<u32>,
    pub channels: Option<u8>,
    pub bit_depth: Option<u8>,
    #[serde(default)]
    pub duration: u64,
}

/// A positioned segment of the reconstructed arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum TimelineItem {
    AudioFile {
        id: SourceId,
        start_offset: f64,
        svg_path: String,
        file_name: String,
        size: u64,
    },
    Spacer {
        id: SourceId,
        start_offset: f64,
        length: f64,
    },
}

impl TimelineItem {
    pub fn id(&self) -> &SourceId {
        match self {
            TimelineItem::AudioFile { id, .. } | TimelineItem::Spacer { id, .. } => id,
        }
    }

    pub fn start_offset(&self) -> f64 {
        match self {
            TimelineItem::AudioFile { start_offset, .. }
            | TimelineItem::Spacer { start_offset, .. } => *start_offset,
        }
    }

    pub fn set_start_offset(&mut self, value: f64) {
        match self {
            TimelineItem::AudioFile { start_offset, .. }
            | TimelineItem::Spacer { start_offset, .. } => *start_offset = value,
        }
    }

    pub fn is_audio_file(&self) -> bool {
        matches!(self, TimelineItem::AudioFile { .. })
    }
}

/// The concatenated waveform path of the current arrangement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedVisual {
    pub svg_path: String,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombineAudioResult {
    pub output: String,
    pub svg_path: String,
}

/// One entry of the order handed to `update_sorting`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortUpdate {
    pub id: SourceId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_bit_depth")]
    pub bit_depth: u16,
    #[serde(default = "default_channels")]
    pub channels: u16,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_filename")]
    pub filename: String,
    #[serde(default)]
    pub bitrate: Option<u32>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            bit_depth: default_bit_depth(),
            channels: default_channels(),
            format: default_format(),
            filename: default_filename(),
            bitrate: None,
        }
    }
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_bit_depth() -> u16 {
    16
}

fn default_channels() -> u16 {
    2
}

fn default_format() -> String {
    "wav".to_string()
}

fn default_filename() -> String {
    "exported_audio".to_string()
}
