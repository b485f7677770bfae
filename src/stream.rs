//! Async extraction.
//!
//! Extraction is CPU-bound and blocking. The functions here run it on
//! `tokio::task::spawn_blocking` and hand back an [`ExtractionFuture`], so an
//! async caller can await the result (or race it against a timeout) without
//! stalling the runtime.
//!
//! Dropping the future does not stop the blocking task; its result is simply
//! discarded.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use framepick::{ExtractionConfig, FramepickError, extract_keyframes_async};
//!
//! # async fn example() -> Result<(), FramepickError> {
//! let future = extract_keyframes_async("input.mp4", ExtractionConfig::new());
//! match tokio::time::timeout(Duration::from_secs(30), future).await {
//!     Ok(result) => println!("{} keyframes", result?.keyframes.len()),
//!     Err(_) => println!("gave up"),
//! }
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::config::ExtractionConfig;
use crate::error::FramepickError;
use crate::extractor::{extract_keyframes, extract_keyframes_from_location, extract_keyframes_from_path};
use crate::locator::VideoLocator;
use crate::result::ExtractionResult;
use crate::source::FrameSource;

/// A pending extraction running on a blocking thread.
///
/// Resolves to the same `Result` the synchronous call would have returned.
pub struct ExtractionFuture {
    handle: JoinHandle<Result<ExtractionResult, FramepickError>>,
}

impl Future for ExtractionFuture {
    type Output = Result<ExtractionResult, FramepickError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|result| {
            result.unwrap_or_else(|error| Err(FramepickError::WorkerFailed(error.to_string())))
        })
    }
}

/// Extract keyframes from the video at `path` without blocking the runtime.
///
/// Must be called from within a Tokio runtime.
pub fn extract_keyframes_async<P: Into<PathBuf>>(
    path: P,
    config: ExtractionConfig,
) -> ExtractionFuture {
    let path = path.into();
    let handle = tokio::task::spawn_blocking(move || extract_keyframes_from_path(path, &config));
    ExtractionFuture { handle }
}

/// Extract keyframes from an arbitrary [`FrameSource`] without blocking the
/// runtime.
pub fn extract_source_async<S>(source: S, config: ExtractionConfig) -> ExtractionFuture
where
    S: FrameSource + Send + 'static,
{
    let handle = tokio::task::spawn_blocking(move || extract_keyframes(source, &config));
    ExtractionFuture { handle }
}

/// Resolve `location` through a shared locator, then extract, without
/// blocking the runtime.
pub fn extract_location_async<L>(
    locator: Arc<L>,
    location: String,
    config: ExtractionConfig,
) -> ExtractionFuture
where
    L: VideoLocator + ?Sized + 'static,
{
    let handle = tokio::task::spawn_blocking(move || {
        extract_keyframes_from_location(locator.as_ref(), &location, &config)
    });
    ExtractionFuture { handle }
}
