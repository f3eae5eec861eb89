//! The import pipeline.
//!
//! For each input: pick a provider by scheme, work out the destination
//! path, skip the fetch entirely when the destination is already up to
//! date, ask before overwriting (unless forced), fetch, rewrite C# sources
//! when a rewrite was requested, and write. Inputs are processed
//! sequentially; the first hard error aborts the run.

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::migrate::{MigrateError, MigrateOptions, migrate};
use crate::provider::{ProviderError, ProviderRegistry, SourceRef};

/// Errors from the import pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("output file {0:?} cannot receive multiple inputs; pass a directory instead")]
    SingleOutputManyInputs(PathBuf),

    #[error("no file provider registered for scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("cannot derive an output file name from {0}")]
    NoFileName(String),

    #[error(
        "cannot ask for confirmation (stdin is not a terminal); \
         pass --force-overwrite to overwrite {0:?}"
    )]
    NeedsForce(PathBuf),

    #[error("{path:?} is not valid UTF-8: {source}")]
    NotUtf8 {
        path: PathBuf,
        source: std::str::Utf8Error,
    },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Migrate(#[from] MigrateError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Per-run options, resolved from CLI flags.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Output directory, or output file path for a single input.
    pub output_path: PathBuf,

    /// File-name prefix applied when the output path is a directory.
    pub output_prefix: Option<String>,

    /// Overwrite without the up-to-date check or confirmation.
    pub force_overwrite: bool,

    /// Namespace rewrite target (trailing `.` = prefix mode).
    pub namespace: Option<String>,

    /// Demote top-level public types to internal.
    pub make_types_internal: bool,
}

/// What happened to one destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Written,
    Overwritten,
    UpToDate,
    Skipped,
}

impl std::fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Written => "written",
            Self::Overwritten => "overwritten",
            Self::UpToDate => "up to date",
            Self::Skipped => "skipped",
        })
    }
}

/// Per-file outcomes of one run.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub files: Vec<(PathBuf, FileOutcome)>,
}

impl ImportSummary {
    pub fn total(&self) -> usize {
        self.files.len()
    }

    pub fn count(&self, outcome: FileOutcome) -> usize {
        self.files.iter().filter(|(_, o)| *o == outcome).count()
    }
}

/// Asks the user whether an existing destination may be overwritten.
pub trait OverwritePrompt: Send + Sync {
    /// Whether a question can be put to the user at all.
    fn can_prompt(&self) -> bool;

    /// Ask about `path`; `true` means overwrite.
    fn confirm(&self, path: &Path) -> std::io::Result<bool>;
}

/// Interactive prompt on the controlling terminal. Declines to prompt when
/// stdin is not a terminal, which makes the pipeline fail with
/// [`PipelineError::NeedsForce`] instead of hanging in scripts.
pub struct StdinPrompt;

impl OverwritePrompt for StdinPrompt {
    fn can_prompt(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    fn confirm(&self, path: &Path) -> std::io::Result<bool> {
        eprint!("File exists ({}), overwrite? [N/y]: ", path.display());
        std::io::stderr().flush()?;

        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(line.trim().eq_ignore_ascii_case("y"))
    }
}

/// Run one import over all inputs.
pub async fn run_import(
    inputs: &[String],
    options: &ImportOptions,
    registry: &ProviderRegistry,
    prompt: &dyn OverwritePrompt,
) -> Result<ImportSummary, PipelineError> {
    let output_is_dir = options.output_path.is_dir();
    if !output_is_dir && inputs.len() > 1 {
        return Err(PipelineError::SingleOutputManyInputs(
            options.output_path.clone(),
        ));
    }

    let mut summary = ImportSummary::default();
    for input in inputs {
        let source = SourceRef::parse(input)?;
        let provider = registry
            .get(source.scheme())
            .ok_or_else(|| PipelineError::UnsupportedScheme(source.scheme().to_string()))?;

        let dest = resolve_output_path(&source, options, output_is_dir)?;
        let dest_mtime = destination_mtime(&dest).await?;

        if let Some(dest_mtime) = dest_mtime {
            if !options.force_overwrite {
                match provider.last_modified(&source).await {
                    Ok(Some(remote)) if remote <= dest_mtime => {
                        info!(path = %dest.display(), "up to date");
                        summary.files.push((dest, FileOutcome::UpToDate));
                        continue;
                    }
                    Ok(_) => {}
                    // An unreadable timestamp only disables the skip; the
                    // fetch below will surface a real retrieval problem.
                    Err(error) => {
                        warn!(%source, %error, "could not determine source timestamp");
                    }
                }

                if !prompt.can_prompt() {
                    return Err(PipelineError::NeedsForce(dest));
                }
                if !prompt.confirm(&dest)? {
                    info!(path = %dest.display(), "skipped");
                    summary.files.push((dest, FileOutcome::Skipped));
                    continue;
                }
            }
        }

        let bytes = provider.fetch(&source).await?;

        let wants_rewrite = options.namespace.is_some() || options.make_types_internal;
        if wants_rewrite && is_csharp_file(&dest) {
            let text = decode_utf8(&bytes, &dest)?;
            let outcome = migrate(
                text,
                &MigrateOptions {
                    namespace: options.namespace.clone(),
                    make_types_internal: options.make_types_internal,
                },
            )?;
            debug!(changes = outcome.changes.len(), path = %dest.display(), "rewrite done");
            tokio::fs::write(&dest, outcome.text).await?;
            info!(path = %dest.display(), "file written");
        } else {
            tokio::fs::write(&dest, &bytes).await?;
            info!(path = %dest.display(), "file copied");
        }

        let outcome = if dest_mtime.is_some() {
            FileOutcome::Overwritten
        } else {
            FileOutcome::Written
        };
        summary.files.push((dest, outcome));
    }

    Ok(summary)
}

fn resolve_output_path(
    source: &SourceRef,
    options: &ImportOptions,
    output_is_dir: bool,
) -> Result<PathBuf, PipelineError> {
    if !output_is_dir {
        return Ok(options.output_path.clone());
    }
    let name = source
        .file_name()
        .ok_or_else(|| PipelineError::NoFileName(source.to_string()))?;
    let file_name = match &options.output_prefix {
        Some(prefix) => format!("{prefix}{name}"),
        None => name.to_string(),
    };
    Ok(options.output_path.join(file_name))
}

async fn destination_mtime(dest: &Path) -> Result<Option<DateTime<Utc>>, PipelineError> {
    match tokio::fs::metadata(dest).await {
        Ok(meta) => Ok(Some(DateTime::<Utc>::from(meta.modified()?))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn is_csharp_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("cs"))
}

/// Decode source bytes as UTF-8, tolerating (and dropping) a leading BOM.
/// Output is always written without one.
fn decode_utf8<'a>(bytes: &'a [u8], path: &Path) -> Result<&'a str, PipelineError> {
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    std::str::from_utf8(bytes).map_err(|source| PipelineError::NotUtf8 {
        path: path.to_path_buf(),
        source,
    })
}
