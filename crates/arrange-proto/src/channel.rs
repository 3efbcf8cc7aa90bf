//! Three-phase streaming envelope and its dispatch table.
//!
//! Every long-running backend operation streams `started`, any number of
//! `progress`, then `finished` messages.  The envelope is generic over the
//! three payload types, so a new operation only needs its payload structs;
//! the dispatch below never changes.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One message on an operation channel.
///
/// Wire shape: `{"event": "started" | "progress" | "finished", "data": {...}}`.
/// Phases without a payload may omit `data` entirely (`{"event": "finished"}`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum Phase<S, P, F> {
    Started(S),
    Progress(P),
    Finished(F),
}

/// Discriminant of a [`Phase`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PhaseTag {
    Started,
    Progress,
    Finished,
}

impl PhaseTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseTag::Started => "started",
            PhaseTag::Progress => "progress",
            PhaseTag::Finished => "finished",
        }
    }
}

impl<S, P, F> Phase<S, P, F> {
    pub fn tag(&self) -> PhaseTag {
        match self {
            Phase::Started(_) => PhaseTag::Started,
            Phase::Progress(_) => PhaseTag::Progress,
            Phase::Finished(_) => PhaseTag::Finished,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Phase::Finished(_))
    }
}

#[derive(Deserialize)]
struct RawPhase {
    event: PhaseTag,
    #[serde(default)]
    data: Value,
}

/// Decode a phase payload.  A missing or `null` payload is read as `{}` so
/// empty payload structs accept the backend's unit variants.
fn payload<T: DeserializeOwned, E: de::Error>(data: Value) -> Result<T, E> {
    if data.is_null() {
        if let Ok(empty) = T::deserialize(Value::Object(Default::default())) {
            return Ok(empty);
        }
    }
    T::deserialize(data).map_err(E::custom)
}

impl<'de, S, P, F> Deserialize<'de> for Phase<S, P, F>
where
    S: DeserializeOwned,
    P: DeserializeOwned,
    F: DeserializeOwned,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawPhase::deserialize(deserializer)?;
        Ok(match raw.event {
            PhaseTag::Started => Phase::Started(payload(raw.data)?),
            PhaseTag::Progress => Phase::Progress(payload(raw.data)?),
            PhaseTag::Finished => Phase::Finished(payload(raw.data)?),
        })
    }
}

/// Handler table for one operation.
///
/// Each phase may have a handler taking the shared context and the typed
/// payload.  Phases without a handler are ignored by [`dispatch`].
///
/// [`dispatch`]: PhaseHandlers::dispatch
pub struct PhaseHandlers<C, S, P, F, R = ()> {
    started: Option<fn(&mut C, S) -> R>,
    progress: Option<fn(&mut C, P) -> R>,
    finished: Option<fn(&mut C, F) -> R>,
}

impl<C, S, P, F, R> Default for PhaseHandlers<C, S, P, F, R> {
    fn default() -> Self {
        Self {
            started: None,
            progress: None,
            finished: None,
        }
    }
}

impl<C, S, P, F, R> PhaseHandlers<C, S, P, F, R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_started(mut self, handler: fn(&mut C, S) -> R) -> Self {
        self.started = Some(handler);
        self
    }

    pub fn on_progress(mut self, handler: fn(&mut C, P) -> R) -> Self {
        self.progress = Some(handler);
        self
    }

    pub fn on_finished(mut self, handler: fn(&mut C, F) -> R) -> Self {
        self.finished = Some(handler);
        self
    }

    pub fn handles(&self, tag: PhaseTag) -> bool {
        match tag {
            PhaseTag::Started => self.started.is_some(),
            PhaseTag::Progress => self.progress.is_some(),
            PhaseTag::Finished => self.finished.is_some(),
        }
    }

    /// Route `event` to its handler.  Returns `None` when the phase has no
    /// registered handler.
    pub fn dispatch(&self, ctx: &mut C, event: Phase<S, P, F>) -> Option<R> {
        match event {
            Phase::Started(data) => self.started.map(|handler| handler(ctx, data)),
            Phase::Progress(data) => self.progress.map(|handler| handler(ctx, data)),
            Phase::Finished(data) => self.finished.map(|handler| handler(ctx, data)),
        }
    }
}
