//! Directory-level article upload.
//!
//! Files are discovered by glob pattern and processed in lexicographic
//! path order, so repeated runs touch the backend in the same sequence.
//! Each file is independent; whether a failure stops the run is the
//! caller's policy, not this module's.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{error, info, instrument, warn};

use presspipe_client::PayloadClient;
use presspipe_shared::{Document, PressPipeError, Result};

use crate::articles::{ArticleUploadOptions, upload_article_from_file};

static GLOB_META_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.+^$(){}|\[\]\\]").expect("valid regex"));

/// What to do when one file in a batch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abort the batch on the first per-file error.
    #[default]
    FailFast,
    /// Record the error and keep processing siblings.
    ContinueOnError,
}

/// Discovery and policy settings for a directory upload.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Glob pattern matched against file names, e.g. `*.html`.
    pub pattern: String,
    /// Whether to descend into subdirectories.
    pub recursive: bool,
    /// Per-file failure handling.
    pub policy: FailurePolicy,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            pattern: "*.html".into(),
            recursive: true,
            policy: FailurePolicy::FailFast,
        }
    }
}

/// The result of a directory upload.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Successfully upserted article documents, in processing order.
    pub documents: Vec<Document>,
    /// Files that failed, with their errors. Empty under
    /// [`FailurePolicy::FailFast`] (the first error propagates instead).
    pub failures: Vec<(PathBuf, PressPipeError)>,
}

impl BatchOutcome {
    /// Whether every file upserted cleanly.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Compile a file-name glob (`*`, `?` wildcards) into an anchored regex.
fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let escaped = GLOB_META_RE.replace_all(pattern, r"\$0");
    let translated = escaped.replace('*', ".*").replace('?', ".");
    Regex::new(&format!("^{translated}$"))
        .map_err(|e| PressPipeError::config(format!("invalid file pattern '{pattern}': {e}")))
}

fn collect_files(
    dir: &Path,
    matcher: &Regex,
    recursive: bool,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    let entries = std::fs::read_dir(dir).map_err(|e| PressPipeError::io(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| PressPipeError::io(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            if recursive {
                collect_files(&path, matcher, recursive, out)?;
            }
        } else if let Some(name) = path.file_name().map(|n| n.to_string_lossy()) {
            if matcher.is_match(&name) {
                out.push(path);
            }
        }
    }
    Ok(())
}

fn slug_prefix_for(root: &Path, file: &Path) -> Option<String> {
    let parent = file.strip_prefix(root).ok()?.parent()?;
    if parent.as_os_str().is_empty() {
        None
    } else {
        // Hyphen-joining happens in the slug deriver; the prefix keeps
        // its path separators here.
        Some(parent.to_string_lossy().replace('\\', "/"))
    }
}

/// Upload every matching article file under `root`.
///
/// Subdirectory paths become slug prefixes, so `italy/bologna/guide.html`
/// yields the slug `italy-bologna-guide` unless the file pins its own.
#[instrument(skip_all, fields(root = %root.display(), pattern = %batch.pattern))]
pub async fn upload_articles_from_directory(
    client: &PayloadClient,
    options: &ArticleUploadOptions,
    root: &Path,
    batch: &BatchOptions,
) -> Result<BatchOutcome> {
    if !root.is_dir() {
        return Err(PressPipeError::config(format!(
            "'{}' does not exist or is not a directory",
            root.display()
        )));
    }

    let matcher = glob_to_regex(&batch.pattern)?;
    let mut files = Vec::new();
    collect_files(root, &matcher, batch.recursive, &mut files)?;
    files.sort();
    info!(files = files.len(), "articles discovered");

    let mut outcome = BatchOutcome::default();
    for file in files {
        let per_file = ArticleUploadOptions {
            slug_prefix: slug_prefix_for(root, &file),
            ..options.clone()
        };
        match upload_article_from_file(client, &per_file, &file).await {
            Ok(doc) => outcome.documents.push(doc),
            Err(err) => match batch.policy {
                FailurePolicy::FailFast => {
                    error!(file = %file.display(), %err, "upload failed, aborting batch");
                    return Err(err);
                }
                FailurePolicy::ContinueOnError => {
                    warn!(file = %file.display(), %err, "upload failed, continuing");
                    outcome.failures.push((file, err));
                }
            },
        }
    }
    Ok(outcome)
}
