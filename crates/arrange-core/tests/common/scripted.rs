//! In-process backend that records every command and hands the event
//! channels back to the test so it can play the backend's side by hand.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use arrange_core::backend::{Backend, Channel, CommandResult};
use arrange_proto::error::{CommandError, CommandErrorKind};
use arrange_proto::events::{BufferEvent, CombineEvent, ExportEvent, SortEvent};
use arrange_proto::model::{CombineAudioResult, FileMetadata, SectionSend, SortUpdate, SourceId};
use arrange_proto::protocol::Operation;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Scan(Vec<String>),
    Metadata(Vec<String>),
    UpdateInputs(Vec<SectionSend>),
    Combine,
    CombineFiles {
        input_files: Vec<String>,
        output_path: String,
    },
    Export {
        sample_rate: u32,
        format: String,
        output_file: String,
    },
    UpdateSorting(Vec<SortUpdate>),
    CancelCombine,
    ClearAudioFiles,
    OpenInExplorer(String),
    PlaySong(String),
    PauseSong,
    GetAppState,
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Call::Scan(_) => Operation::GetFilePathsInFolder,
            Call::Metadata(_) => Operation::GetMetadata,
            Call::UpdateInputs(_) => Operation::UpdateInputs,
            Call::Combine => Operation::CombineAllCachedSamplesWithCustomOrder,
            Call::CombineFiles { .. } => Operation::CombineAudioFiles,
            Call::Export { .. } => Operation::ExportAudio,
            Call::UpdateSorting(_) => Operation::UpdateSorting,
            Call::CancelCombine => Operation::CancelCombine,
            Call::ClearAudioFiles => Operation::ClearAudioFiles,
            Call::OpenInExplorer(_) => Operation::OpenInExplorer,
            Call::PlaySong(_) => Operation::PlaySong,
            Call::PauseSong => Operation::PauseSong,
            Call::GetAppState => Operation::GetAppState,
        }
    }
}

#[derive(Default)]
pub struct ScriptedBackend {
    calls: Mutex<Vec<Call>>,
    folders: Mutex<HashMap<String, CommandResult<Vec<String>>>>,
    metadata_failures: Mutex<HashSet<String>>,
    export_failure: Mutex<Option<CommandError>>,
    buffer: Mutex<Vec<Channel<BufferEvent>>>,
    combine: Mutex<Vec<Channel<CombineEvent>>>,
    export: Mutex<Vec<Channel<ExportEvent>>>,
    sort: Mutex<Vec<Channel<SortEvent>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folder(self, folder: &str, files: &[&str]) -> Self {
        self.folders.lock().unwrap().insert(
            folder.to_string(),
            Ok(files.iter().map(|f| f.to_string()).collect()),
        );
        self
    }

    pub fn with_failing_folder(self, folder: &str, error: CommandError) -> Self {
        self.folders
            .lock()
            .unwrap()
            .insert(folder.to_string(), Err(error));
        self
    }

    pub fn with_failing_metadata(self, path: &str) -> Self {
        self.metadata_failures
            .lock()
            .unwrap()
            .insert(path.to_string());
        self
    }

    pub fn with_failing_export(self, error: CommandError) -> Self {
        *self.export_failure.lock().unwrap() = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.calls().iter().map(Call::operation).collect()
    }

    pub fn count(&self, operation: Operation) -> usize {
        self.operations().iter().filter(|&&op| op == operation).count()
    }

    pub fn buffer_channel(&self, i: usize) -> Channel<BufferEvent> {
        self.buffer.lock().unwrap()[i].clone()
    }

    pub fn combine_channel(&self, i: usize) -> Channel<CombineEvent> {
        self.combine.lock().unwrap()[i].clone()
    }

    pub fn export_channel(&self, i: usize) -> Channel<ExportEvent> {
        self.export.lock().unwrap()[i].clone()
    }

    pub fn sort_channel(&self, i: usize) -> Channel<SortEvent> {
        self.sort.lock().unwrap()[i].clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Backend for ScriptedBackend {
    async fn get_file_paths_in_folder(
        &self,
        folder_paths: Vec<String>,
    ) -> CommandResult<HashMap<String, Vec<String>>> {
        self.record(Call::Scan(folder_paths.clone()));
        let folders = self.folders.lock().unwrap();
        let mut found = HashMap::new();
        for folder in folder_paths {
            match folders.get(&folder) {
                Some(Ok(files)) => {
                    found.insert(folder, files.clone());
                }
                Some(Err(e)) => return Err(e.clone()),
                None => {
                    return Err(CommandError::new(
                        CommandErrorKind::InvalidPath,
                        format!("{} does not exist", folder),
                    ))
                }
            }
        }
        Ok(found)
    }

    async fn get_metadata(&self, titles: Vec<String>) -> CommandResult<Vec<FileMetadata>> {
        self.record(Call::Metadata(titles.clone()));
        let failures = self.metadata_failures.lock().unwrap();
        titles
            .into_iter()
            .map(|path| {
                if failures.contains(&path) {
                    Err(CommandError::new(
                        CommandErrorKind::NoDefaultTrackFound,
                        "no default track",
                    ))
                } else {
                    Ok(FileMetadata {
                        path,
                        size: Some(4096),
                        bit_rate: Some(1411),
                        channels: Some(2),
                        bit_depth: Some(16),
                        duration: 1500,
                    })
                }
            })
            .collect()
    }

    async fn update_inputs(
        &self,
        sections: Vec<SectionSend>,
        on_event: Channel<BufferEvent>,
    ) -> CommandResult<String> {
        self.record(Call::UpdateInputs(sections));
        self.buffer.lock().unwrap().push(on_event);
        Ok("cached".to_string())
    }

    async fn combine_all_cached_samples_with_custom_order(
        &self,
        on_event: Channel<CombineEvent>,
    ) -> CommandResult<CombineAudioResult> {
        self.record(Call::Combine);
        self.combine.lock().unwrap().push(on_event);
        Ok(CombineAudioResult {
            output: "/cache/combined.wav".to_string(),
            svg_path: String::new(),
        })
    }

    async fn combine_audio_files(
        &self,
        input_files: Vec<String>,
        output_path: String,
    ) -> CommandResult<CombineAudioResult> {
        self.record(Call::CombineFiles {
            input_files,
            output_path: output_path.clone(),
        });
        Ok(CombineAudioResult {
            output: output_path,
            svg_path: "M0,0 L5,5".to_string(),
        })
    }

    async fn export_audio(
        &self,
        sample_rate: u32,
        format: String,
        output_file: String,
        on_event: Channel<ExportEvent>,
    ) -> CommandResult<String> {
        self.record(Call::Export {
            sample_rate,
            format,
            output_file: output_file.clone(),
        });
        self.export.lock().unwrap().push(on_event);
        match self.export_failure.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(output_file),
        }
    }

    async fn update_sorting(
        &self,
        updates: Vec<SortUpdate>,
        on_event: Channel<SortEvent>,
    ) -> CommandResult<Vec<(SourceId, usize)>> {
        self.record(Call::UpdateSorting(updates.clone()));
        self.sort.lock().unwrap().push(on_event);
        Ok(updates.into_iter().map(|u| (u.id, u.index)).collect())
    }

    async fn cancel_combine(&self) -> CommandResult<()> {
        self.record(Call::CancelCombine);
        Ok(())
    }

    async fn clear_audio_files(&self) -> CommandResult<()> {
        self.record(Call::ClearAudioFiles);
        Ok(())
    }

    async fn open_in_explorer(&self, file_to_open: String) -> CommandResult<()> {
        self.record(Call::OpenInExplorer(file_to_open));
        Ok(())
    }

    async fn play_song(&self, title: String) -> CommandResult<()> {
        self.record(Call::PlaySong(title));
        Ok(())
    }

    async fn pause_song(&self) -> CommandResult<()> {
        self.record(Call::PauseSong);
        Ok(())
    }

    async fn get_app_state(&self) -> CommandResult<serde_json::Value> {
        self.record(Call::GetAppState);
        Ok(serde_json::json!({ "cached": 0 }))
    }
}
