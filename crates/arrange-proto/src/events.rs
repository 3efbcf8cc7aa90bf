//! Per-operation payloads for the three-phase channels, plus the events the
//! backend pushes outside of any channel.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::channel::Phase;
use crate::error::CommandError;
use crate::model::SourceId;
use crate::protocol::Operation;

// ── buffer (update_inputs) ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferStarted {
    pub content_length: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferProgress {
    pub chunk_length: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferFinished {
    pub download_id: u64,
}

pub type BufferEvent = Phase<BufferStarted, BufferProgress, BufferFinished>;

// ── combine (combine_all_cached_samples_with_custom_order) ────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombineStarted {
    pub content_length: u64,
    /// Total duration of the combined arrangement in seconds.
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombineProgress {
    pub id: SourceId,
    pub svg_path: String,
    pub start_offset: f64,
    /// Path of the source file this fragment was rendered from.
    pub file_name: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombineFinished {
    /// The complete final path; replaces whatever was accumulated.
    pub svg_path: String,
}

pub type CombineEvent = Phase<CombineStarted, CombineProgress, CombineFinished>;

// ── export (export_audio) ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportStarted {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProgress {
    /// Fraction in `0.0..=1.0`.
    pub progress: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportFinished {
    pub output_path: String,
}

pub type ExportEvent = Phase<ExportStarted, ExportProgress, ExportFinished>;

// ── sort (update_sorting) ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortStarted {
    pub content_length: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortProgress {
    pub id: SourceId,
    pub progress: f64,
    pub start_offset: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortFinished {}

pub type SortEvent = Phase<SortStarted, SortProgress, SortFinished>;

// ── routing ───────────────────────────────────────────────────────────────────

/// A channel message from any operation.  Closed set; the orchestrator
/// matches on it exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelMessage {
    Buffer(BufferEvent),
    Combine(CombineEvent),
    Export(ExportEvent),
    Sort(SortEvent),
}

impl ChannelMessage {
    /// The command whose channel carries this message.
    pub fn operation(&self) -> Operation {
        match self {
            ChannelMessage::Buffer(_) => Operation::UpdateInputs,
            ChannelMessage::Combine(_) => Operation::CombineAllCachedSamplesWithCustomOrder,
            ChannelMessage::Export(_) => Operation::ExportAudio,
            ChannelMessage::Sort(_) => Operation::UpdateSorting,
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            ChannelMessage::Buffer(e) => e.is_finished(),
            ChannelMessage::Combine(e) => e.is_finished(),
            ChannelMessage::Export(e) => e.is_finished(),
            ChannelMessage::Sort(e) => e.is_finished(),
        }
    }

    /// Decode a raw channel payload for a channel opened by `operation`.
    pub fn decode(operation: Operation, payload: serde_json::Value) -> Result<Self, CommandError> {
        let msg = match operation {
            Operation::UpdateInputs => Self::Buffer(serde_json::from_value(payload)?),
            Operation::CombineAllCachedSamplesWithCustomOrder => {
                Self::Combine(serde_json::from_value(payload)?)
            }
            Operation::ExportAudio => Self::Export(serde_json::from_value(payload)?),
            Operation::UpdateSorting => Self::Sort(serde_json::from_value(payload)?),
            other => {
                return Err(CommandError::new(
                    crate::error::CommandErrorKind::Decode,
                    format!("{} has no event channel", other),
                ))
            }
        };
        Ok(msg)
    }
}

/// Implemented by every per-operation event union.
pub trait OperationEvent:
    Into<ChannelMessage> + Serialize + DeserializeOwned + Send + 'static
{
    const OPERATION: Operation;
}

macro_rules! operation_event {
    ($event:ty, $variant:ident, $op:expr) => {
        impl From<$event> for ChannelMessage {
            fn from(e: $event) -> Self {
                ChannelMessage::$variant(e)
            }
        }

        impl OperationEvent for $event {
            const OPERATION: Operation = $op;
        }
    };
}

operation_event!(BufferEvent, Buffer, Operation::UpdateInputs);
operation_event!(
    CombineEvent,
    Combine,
    Operation::CombineAllCachedSamplesWithCustomOrder
);
operation_event!(ExportEvent, Export, Operation::ExportAudio);
operation_event!(SortEvent, Sort, Operation::UpdateSorting);

// ── pushed events ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedCombineResult {
    pub svg_path: String,
    pub duration: f64,
}

/// Fire-and-forget events the backend emits outside any channel.  They
/// carry no run id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum PushedEvent {
    SongProgress(f64),
    CombinedCached(CachedCombineResult),
    ProcessedSegment(String),
    TotalLength(f64),
    CombineAudioProgress(f64),
}

impl PushedEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PushedEvent::SongProgress(_) => "song-progress",
            PushedEvent::CombinedCached(_) => "combined-cached",
            PushedEvent::ProcessedSegment(_) => "processed-segment",
            PushedEvent::TotalLength(_) => "total-length",
            PushedEvent::CombineAudioProgress(_) => "combine-audio-progress",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_progress_decodes_from_backend_json() {
        let raw = serde_json::json!({
            "event": "progress",
            "data": {
                "id": "5f0c",
                "svgPath": "M0.0,35.0 L0.0,35.0 ",
                "startOffset": 0.5,
                "fileName": "/samples/kick.wav",
                "size": 4410
            }
        });
        let msg = ChannelMessage::decode(Operation::CombineAllCachedSamplesWithCustomOrder, raw)
            .unwrap();
        match msg {
            ChannelMessage::Combine(Phase::Progress(p)) => {
                assert_eq!(p.id, SourceId::new("5f0c"));
                assert_eq!(p.start_offset, 0.5);
                assert_eq!(p.file_name, "/samples/kick.wav");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_channelless_operation() {
        let err = ChannelMessage::decode(Operation::CancelCombine, serde_json::json!({}))
            .unwrap_err();
        assert_eq!(err.kind, crate::error::CommandErrorKind::Decode);
    }

    #[test]
    fn test_pushed_event_names_match_wire_tags() {
        let ev = PushedEvent::TotalLength(12.5);
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["event"], ev.name());
        assert_eq!(json["payload"], 12.5);
    }
}
