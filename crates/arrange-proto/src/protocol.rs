use serde::{Deserialize, Serialize};

use crate::error::CommandError;
use crate::events::PushedEvent;
use crate::model::{SectionSend, SortUpdate};

/// Current protocol version.  Bump this when the wire format changes in a
/// breaking way.  The front-end checks this in the backend's `Hello` and
/// refuses to talk to an incompatible backend.
pub const PROTOCOL_VERSION: u32 = 1;

/// Largest frame either side accepts.  Waveform paths get long but not this
/// long.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Backend operation names.  Also the key of the per-operation latency
/// window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    GetFilePathsInFolder,
    GetMetadata,
    UpdateInputs,
    CombineAllCachedSamplesWithCustomOrder,
    CombineAudioFiles,
    ExportAudio,
    UpdateSorting,
    CancelCombine,
    ClearAudioFiles,
    OpenInExplorer,
    PlaySong,
    PauseSong,
    GetAppState,
}

impl Operation {
    pub const ALL: [Operation; 13] = [
        Operation::GetFilePathsInFolder,
        Operation::GetMetadata,
        Operation::UpdateInputs,
        Operation::CombineAllCachedSamplesWithCustomOrder,
        Operation::CombineAudioFiles,
        Operation::ExportAudio,
        Operation::UpdateSorting,
        Operation::CancelCombine,
        Operation::ClearAudioFiles,
        Operation::OpenInExplorer,
        Operation::PlaySong,
        Operation::PauseSong,
        Operation::GetAppState,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::GetFilePathsInFolder => "get_file_paths_in_folder",
            Operation::GetMetadata => "get_metadata",
            Operation::UpdateInputs => "update_inputs",
            Operation::CombineAllCachedSamplesWithCustomOrder => {
                "combine_all_cached_samples_with_custom_order"
            }
            Operation::CombineAudioFiles => "combine_audio_files",
            Operation::ExportAudio => "export_audio",
            Operation::UpdateSorting => "update_sorting",
            Operation::CancelCombine => "cancel_combine",
            Operation::ClearAudioFiles => "clear_audio_files",
            Operation::OpenInExplorer => "open_in_explorer",
            Operation::PlaySong => "play_song",
            Operation::PauseSong => "pause_song",
            Operation::GetAppState => "get_app_state",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Identifies an open event channel on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(pub u64);

/// Commands sent from front-end to backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Command {
    GetFilePathsInFolder {
        folder_paths: Vec<String>,
    },
    GetMetadata {
        titles: Vec<String>,
    },
    UpdateInputs {
        sections: Vec<SectionSend>,
        on_event: ChannelId,
    },
    CombineAllCachedSamplesWithCustomOrder {
        on_event: ChannelId,
    },
    CombineAudioFiles {
        input_files: Vec<String>,
        output_path: String,
    },
    ExportAudio {
        sample_rate: u32,
        format: String,
        output_file: String,
        on_event: ChannelId,
    },
    UpdateSorting {
        updates: Vec<SortUpdate>,
        on_event: ChannelId,
    },
    CancelCombine,
    ClearAudioFiles,
    OpenInExplorer {
        file_to_open: String,
    },
    PlaySong {
        title: String,
    },
    PauseSong,
    GetAppState,
}

impl Command {
    pub fn operation(&self) -> Operation {
        match self {
            Command::GetFilePathsInFolder { .. } => Operation::GetFilePathsInFolder,
            Command::GetMetadata { .. } => Operation::GetMetadata,
            Command::UpdateInputs { .. } => Operation::UpdateInputs,
            Command::CombineAllCachedSamplesWithCustomOrder { .. } => {
                Operation::CombineAllCachedSamplesWithCustomOrder
            }
            Command::CombineAudioFiles { .. } => Operation::CombineAudioFiles,
            Command::ExportAudio { .. } => Operation::ExportAudio,
            Command::UpdateSorting { .. } => Operation::UpdateSorting,
            Command::CancelCombine => Operation::CancelCombine,
            Command::ClearAudioFiles => Operation::ClearAudioFiles,
            Command::OpenInExplorer { .. } => Operation::OpenInExplorer,
            Command::PlaySong { .. } => Operation::PlaySong,
            Command::PauseSong => Operation::PauseSong,
            Command::GetAppState => Operation::GetAppState,
        }
    }

    /// The event channel this command streams to, if any.
    pub fn channel(&self) -> Option<ChannelId> {
        match self {
            Command::UpdateInputs { on_event, .. }
            | Command::CombineAllCachedSamplesWithCustomOrder { on_event }
            | Command::ExportAudio { on_event, .. }
            | Command::UpdateSorting { on_event, .. } => Some(*on_event),
            _ => None,
        }
    }
}

/// Outcome of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reply {
    Ok(serde_json::Value),
    Err(CommandError),
}

impl Reply {
    pub fn into_result(self) -> Result<serde_json::Value, CommandError> {
        match self {
            Reply::Ok(v) => Ok(v),
            Reply::Err(e) => Err(e),
        }
    }
}

/// One frame on the backend socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "msg", rename_all = "snake_case")]
pub enum Message {
    /// Sent by the backend immediately on connect.
    Hello { protocol_version: u32 },
    Request { id: u64, command: Command },
    Response { id: u64, result: Reply },
    /// A three-phase message for an open channel.  The payload is decoded
    /// by the receiver, which knows the channel's operation.
    Event {
        channel: ChannelId,
        payload: serde_json::Value,
    },
    Push { event: PushedEvent },
}

impl Message {
    pub fn encode(&self) -> anyhow::Result<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        if json.len() > MAX_FRAME_LEN {
            anyhow::bail!("Frame too large: {} bytes", json.len());
        }
        let len = json.len() as u32;
        let mut result = Vec::with_capacity(4 + json.len());
        result.extend_from_slice(&len.to_be_bytes());
        result.extend_from_slice(&json);
        Ok(result)
    }

    /// Decode one frame from the front of `data`.  `Ok(None)` means more
    /// bytes are needed; `Err` means the stream is corrupt.
    pub fn decode(data: &[u8]) -> anyhow::Result<Option<(Self, usize)>> {
        if data.len() < 4 {
            return Ok(None);
        }
        let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if len > MAX_FRAME_LEN {
            anyhow::bail!("Frame length {} exceeds limit", len);
        }
        if data.len() < 4 + len {
            return Ok(None);
        }
        let msg: Self = serde_json::from_slice(&data[4..4 + len])?;
        Ok(Some((msg, 4 + len)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_encode_decode() {
        let msg = Message::Request {
            id: 7,
            command: Command::OpenInExplorer {
                file_to_open: "/tmp/out.wav".into(),
            },
        };
        let encoded = msg.encode().unwrap();
        let (decoded, len) = Message::decode(&encoded).unwrap().unwrap();
        assert_eq!(len, encoded.len());
        match decoded {
            Message::Request {
                id,
                command: Command::OpenInExplorer { file_to_open },
            } => {
                assert_eq!(id, 7);
                assert_eq!(file_to_open, "/tmp/out.wav");
            }
            _ => panic!("Wrong message type"),
        }
    }

    #[test]
    fn test_partial_frame_needs_more_bytes() {
        let encoded = Message::Hello {
            protocol_version: PROTOCOL_VERSION,
        }
        .encode()
        .unwrap();
        assert!(Message::decode(&encoded[..2]).unwrap().is_none());
        assert!(Message::decode(&encoded[..encoded.len() - 1])
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_command_uses_backend_argument_names() {
        let cmd = Command::ExportAudio {
            sample_rate: 48000,
            format: "mp3".into(),
            output_file: "/tmp/mix.mp3".into(),
            on_event: ChannelId(3),
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["cmd"], "export_audio");
        assert_eq!(json["sampleRate"], 48000);
        assert_eq!(json["outputFile"], "/tmp/mix.mp3");
        assert_eq!(json["onEvent"], 3);
        assert_eq!(cmd.operation().name(), "export_audio");
        assert_eq!(cmd.channel(), Some(ChannelId(3)));
    }

    #[test]
    fn test_reply_round_trips_error() {
        let reply = Reply::Err(CommandError::new(
            crate::error::CommandErrorKind::InvalidPath,
            "",
        ));
        let json = serde_json::to_string(&reply).unwrap();
        let back: Reply = serde_json::from_str(&json).unwrap();
        assert!(back.into_result().is_err());
    }
}
