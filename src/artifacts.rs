//! Index of Playwright artifacts (screenshots, traces, videos) on disk.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactIndex {
    pub screenshots: Vec<String>,
    pub traces: Vec<String>,
    pub videos: Vec<String>,
}

impl ArtifactIndex {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.screenshots.is_empty() && self.traces.is_empty() && self.videos.is_empty()
    }

    /// Sort paths into buckets by name. A path can land in more than one.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut index = Self::default();
        for path in paths {
            let display = path.as_ref().to_string_lossy().into_owned();
            let lower = display.to_ascii_lowercase();
            if has_extension(&lower, &["png", "jpg", "jpeg", "webp"]) {
                index.screenshots.push(display.clone());
            }
            if lower.contains("trace") && has_extension(&lower, &["zip", "json"]) {
                index.traces.push(display.clone());
            }
            if has_extension(&lower, &["webm", "mp4"]) {
                index.videos.push(display);
            }
        }
        index.screenshots.sort();
        index.traces.sort();
        index.videos.sort();
        index
    }
}

fn has_extension(lower_path: &str, extensions: &[&str]) -> bool {
    lower_path
        .rsplit_once('.')
        .is_some_and(|(_, ext)| extensions.contains(&ext))
}

/// Walk `artifacts_dir` recursively. A missing or absent directory yields an
/// empty index.
#[must_use]
pub fn index_artifacts(artifacts_dir: Option<&Path>) -> ArtifactIndex {
    let Some(dir) = artifacts_dir else {
        return ArtifactIndex::default();
    };
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "Artifacts directory missing; skipping");
        return ArtifactIndex::default();
    }

    let files: Vec<PathBuf> = WalkBuilder::new(dir)
        .standard_filters(false)
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!("Skipping unreadable artifact entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
        .map(ignore::DirEntry::into_path)
        .collect();

    let index = ArtifactIndex::from_paths(&files);
    tracing::debug!(
        screenshots = index.screenshots.len(),
        traces = index.traces.len(),
        videos = index.videos.len(),
        "Indexed artifacts"
    );
    index
}
