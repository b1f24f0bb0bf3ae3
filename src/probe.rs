//! Locating and parsing subtitle files the tool left in the scratch directory
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::captions::CaptionFormat;
use crate::identifier::VideoId;
use crate::transcript::CaptionSegment;

/// Output file names the tool has been seen to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenamePattern {
    /// `{id}.{lang}.{ext}`
    IdLangExt,
    /// `{id}.NA.{lang}.{ext}`, written when the tool cannot resolve the language field
    NaInfix,
    /// `{id}.{ext}`
    IdOnly,
    /// `{id}.{fixed}.{ext}`, regardless of the requested language
    FixedLang(&'static str),
}

impl FilenamePattern {
    pub fn file_name(&self, video: &VideoId, lang: &str, ext: &str) -> String {
        match self {
            Self::IdLangExt => format!("{}.{}.{}", video, lang, ext),
            Self::NaInfix => format!("{}.NA.{}.{}", video, lang, ext),
            Self::IdOnly => format!("{}.{}", video, ext),
            Self::FixedLang(fixed) => format!("{}.{}.{}", video, fixed, ext),
        }
    }
}

/// Try each pattern in order and return the first file that parses to at least one segment.
///
/// Every path checked is appended to `probed`; paths already present are skipped.
pub async fn probe(
    dir: &Path,
    video: &VideoId,
    lang: &str,
    format: CaptionFormat,
    patterns: &[FilenamePattern],
    probed: &mut Vec<PathBuf>,
) -> Option<(PathBuf, Vec<CaptionSegment>)> {
    for pattern in patterns {
        let path = dir.join(pattern.file_name(video, lang, format.extension()));
        if probed.contains(&path) {
            continue;
        }
        probed.push(path.clone());

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            continue;
        }

        match format.parse_file(&path).await {
            Ok(segments) if !segments.is_empty() => {
                debug!("Parsed {} segments from {}", segments.len(), path.display());
                return Some((path, segments));
            }
            Ok(_) => debug!("No segments in {}", path.display()),
            Err(e) => warn!("⚠️  Could not read {}: {}", path.display(), e),
        }
    }

    None
}

/// Names of every file currently in the scratch directory, for diagnostics
pub fn list_produced_files(dir: &Path) -> Vec<String> {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            entry
                .path()
                .strip_prefix(dir)
                .ok()
                .map(|relative| relative.display().to_string())
        })
        .collect()
}
