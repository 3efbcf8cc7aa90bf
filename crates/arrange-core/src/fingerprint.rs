use arrange_proto::model::{AudioSend, Section, SectionSend};

/// The part of the input set that changes the rendered arrangement: each
/// section's folder and its ordered file paths.  Metadata and colors are
/// deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InputFingerprint(Vec<(String, Vec<String>)>);

impl InputFingerprint {
    pub fn of(sections: &[Section]) -> Self {
        Self(
            sections
                .iter()
                .map(|s| {
                    (
                        s.folder_path.clone(),
                        s.files.iter().map(|f| f.path.clone()).collect(),
                    )
                })
                .collect(),
        )
    }

    pub fn file_count(&self) -> usize {
        self.0.iter().map(|(_, paths)| paths.len()).sum()
    }

    /// True when nothing would be rendered.
    pub fn is_empty(&self) -> bool {
        self.file_count() == 0
    }

    pub fn to_send(&self) -> Vec<SectionSend> {
        self.0
            .iter()
            .map(|(folder, paths)| SectionSend {
                folder_path: folder.clone(),
                paths: paths
                    .iter()
                    .map(|p| AudioSend { path: p.clone() })
                    .collect(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrange_proto::model::{AudioFileItem, Color, FileMetadata, SectionKey};

    fn section(folder: &str, files: &[&str]) -> Section {
        let mut s = Section::new(SectionKey(0), folder, Color::default());
        s.files = files
            .iter()
            .map(|p| AudioFileItem::new(*p, Color::default()))
            .collect();
        s
    }

    #[test]
    fn test_metadata_does_not_change_fingerprint() {
        let mut sections = vec![section("/a", &["/a/1.wav", "/a/2.wav"])];
        let before = InputFingerprint::of(&sections);

        sections[0].files[0].apply_metadata(&FileMetadata {
            path: "/a/1.wav".into(),
            size: Some(1),
            bit_rate: None,
            channels: Some(2),
            bit_depth: None,
            duration: 10,
        });
        sections[0].color = Color {
            name: "Red".into(),
            rgb: [255, 0, 0],
        };
        assert_eq!(before, InputFingerprint::of(&sections));
    }

    #[test]
    fn test_order_and_folder_change_fingerprint() {
        let a = InputFingerprint::of(&[section("/a", &["/a/1.wav", "/a/2.wav"])]);
        let swapped = InputFingerprint::of(&[section("/a", &["/a/2.wav", "/a/1.wav"])]);
        let moved = InputFingerprint::of(&[section("/b", &["/a/1.wav", "/a/2.wav"])]);
        assert_ne!(a, swapped);
        assert_ne!(a, moved);
    }

    #[test]
    fn test_empty_sections_count_as_empty() {
        let fp = InputFingerprint::of(&[section("/a", &[]), section("/b", &[])]);
        assert!(fp.is_empty());
        assert_eq!(fp.to_send().len(), 2);
        assert_ne!(fp, InputFingerprint::default());
    }
}
