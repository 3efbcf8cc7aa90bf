//! User intents.  Everything a front-end can ask the orchestrator to do.

use arrange_proto::model::{Color, ExportSettings};
use serde::Deserialize;

use crate::view::SortSpec;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum Intent {
    // ── sections ──────────────────────────────────────────────────────────────
    /// New sections go to the front.
    AddSection {
        folder_path: String,
        #[serde(default)]
        color: Color,
    },
    DeleteSection {
        index: usize,
    },
    /// Point a section at another folder and rescan it.
    UpdatePath {
        index: usize,
        folder_path: String,
    },

    // ── view ──────────────────────────────────────────────────────────────────
    /// `None` restores natural order.
    SetSort {
        sort: Option<SortSpec>,
    },

    // ── output ────────────────────────────────────────────────────────────────
    Export {
        output_path: String,
        /// Falls back to the configured export defaults.
        #[serde(default)]
        settings: Option<ExportSettings>,
    },
    CombineFiles {
        input_files: Vec<String>,
        output_path: String,
    },

    // ── playback ──────────────────────────────────────────────────────────────
    PlaySong {
        path: String,
    },
    PauseSong,

    // ── diagnostics ───────────────────────────────────────────────────────────
    ResetPerformance,
    /// Ask the backend for its own state and log it.
    DumpBackendState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{SortDirection, SortKey};

    #[test]
    fn test_parse_json_line_intents() {
        let add: Intent =
            serde_json::from_str(r#"{"intent":"add_section","folder_path":"/samples"}"#).unwrap();
        assert_eq!(
            add,
            Intent::AddSection {
                folder_path: "/samples".into(),
                color: Color::default(),
            }
        );

        let sort: Intent = serde_json::from_str(
            r#"{"intent":"set_sort","sort":{"key":"duration","direction":"descending"}}"#,
        )
        .unwrap();
        match sort {
            Intent::SetSort { sort: Some(spec) } => {
                assert_eq!(spec.key, SortKey::Duration);
                assert_eq!(spec.direction, SortDirection::Descending);
            }
            other => panic!("unexpected intent: {:?}", other),
        }

        let pause: Intent = serde_json::from_str(r#"{"intent":"pause_song"}"#).unwrap();
        assert_eq!(pause, Intent::PauseSong);
    }
}
