//! The seam between the orchestrator and whatever performs the audio work.
//!
//! [`Backend`] exposes one typed method per remote command.  Long-running
//! commands take a [`Channel`] and stream three-phase messages into it while
//! the call is in flight; the orchestrator reads them back off its own
//! event queue tagged with the run that opened the channel.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use arrange_proto::error::{CommandError, Error};
use arrange_proto::events::{
    BufferEvent, ChannelMessage, CombineEvent, ExportEvent, OperationEvent, SortEvent,
};
use arrange_proto::model::{CombineAudioResult, FileMetadata, SectionSend, SortUpdate, SourceId};
use arrange_proto::protocol::Operation;
use tokio::sync::mpsc;

use crate::core::CoreEvent;

pub type CommandResult<T> = Result<T, CommandError>;

/// Identifies one run of a channelled operation.  Monotonic per
/// orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Sending half of an operation's event channel.
///
/// Sending never blocks; messages land on the orchestrator's queue in the
/// order they were sent.
pub struct Channel<E> {
    run: RunId,
    tx: mpsc::UnboundedSender<CoreEvent>,
    _event: PhantomData<fn(E)>,
}

impl<E> Clone for Channel<E> {
    fn clone(&self) -> Self {
        Self {
            run: self.run,
            tx: self.tx.clone(),
            _event: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Channel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel").field("run", &self.run).finish()
    }
}

impl<E: OperationEvent> Channel<E> {
    pub(crate) fn new(run: RunId, tx: mpsc::UnboundedSender<CoreEvent>) -> Self {
        Self {
            run,
            tx,
            _event: PhantomData,
        }
    }

    pub fn run(&self) -> RunId {
        self.run
    }

    pub fn operation(&self) -> Operation {
        E::OPERATION
    }

    pub fn send(&self, event: E) -> Result<(), Error> {
        self.send_message(event.into())
    }

    pub(crate) fn send_message(&self, message: ChannelMessage) -> Result<(), Error> {
        self.tx
            .send(CoreEvent::Channel {
                run: self.run,
                message,
            })
            .map_err(|_| Error::ChannelClosed)
    }
}

/// Remote command surface.
pub trait Backend: Send + Sync + 'static {
    /// Recursively list audio files under each folder, keyed by folder.
    fn get_file_paths_in_folder(
        &self,
        folder_paths: Vec<String>,
    ) -> impl Future<Output = CommandResult<HashMap<String, Vec<String>>>> + Send;

    fn get_metadata(
        &self,
        titles: Vec<String>,
    ) -> impl Future<Output = CommandResult<Vec<FileMetadata>>> + Send;

    /// Decode and cache the given inputs.
    fn update_inputs(
        &self,
        sections: Vec<SectionSend>,
        on_event: Channel<BufferEvent>,
    ) -> impl Future<Output = CommandResult<String>> + Send;

    fn combine_all_cached_samples_with_custom_order(
        &self,
        on_event: Channel<CombineEvent>,
    ) -> impl Future<Output = CommandResult<CombineAudioResult>> + Send;

    /// One-shot combine of explicit files, outside the cached pipeline.
    fn combine_audio_files(
        &self,
        input_files: Vec<String>,
        output_path: String,
    ) -> impl Future<Output = CommandResult<CombineAudioResult>> + Send;

    fn export_audio(
        &self,
        sample_rate: u32,
        format: String,
        output_file: String,
        on_event: Channel<ExportEvent>,
    ) -> impl Future<Output = CommandResult<String>> + Send;

    /// Returns the applied `(id, index)` order.
    fn update_sorting(
        &self,
        updates: Vec<SortUpdate>,
        on_event: Channel<SortEvent>,
    ) -> impl Future<Output = CommandResult<Vec<(SourceId, usize)>>> + Send;

    fn cancel_combine(&self) -> impl Future<Output = CommandResult<()>> + Send;

    fn clear_audio_files(&self) -> impl Future<Output = CommandResult<()>> + Send;

    fn open_in_explorer(
        &self,
        file_to_open: String,
    ) -> impl Future<Output = CommandResult<()>> + Send;

    fn play_song(&self, title: String) -> impl Future<Output = CommandResult<()>> + Send;

    fn pause_song(&self) -> impl Future<Output = CommandResult<()>> + Send;

    /// Backend's own debug snapshot.
    fn get_app_state(&self) -> impl Future<Output = CommandResult<serde_json::Value>> + Send;
}
