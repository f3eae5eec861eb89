//! Local-disk file provider.

use chrono::{DateTime, Utc};

use crate::BoxFuture;

use super::{FileProvider, ProviderError, SourceRef};

/// Serves `file`-scheme sources from the local filesystem.
pub struct LocalFileProvider;

impl LocalFileProvider {
    fn path<'a>(source: &'a SourceRef) -> Result<&'a std::path::Path, ProviderError> {
        match source {
            SourceRef::Local(path) => Ok(path),
            other => Err(ProviderError::InvalidSource {
                input: other.to_string(),
                message: "not a local path".to_string(),
            }),
        }
    }
}

impl FileProvider for LocalFileProvider {
    fn scheme(&self) -> &'static str {
        "file"
    }

    fn last_modified<'a>(
        &'a self,
        source: &'a SourceRef,
    ) -> BoxFuture<'a, Result<Option<DateTime<Utc>>, ProviderError>> {
        Box::pin(async move {
            let path = Self::path(source)?;
            match tokio::fs::metadata(path).await {
                Ok(meta) => Ok(Some(DateTime::<Utc>::from(meta.modified()?))),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(ProviderError::NotFound(path.display().to_string()))
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    fn fetch<'a>(
        &'a self,
        source: &'a SourceRef,
    ) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>> {
        Box::pin(async move {
            let path = Self::path(source)?;
            match tokio::fs::read(path).await {
                Ok(bytes) => Ok(bytes),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err(ProviderError::NotFound(path.display().to_string()))
                }
                Err(e) => Err(e.into()),
            }
        })
    }
}
