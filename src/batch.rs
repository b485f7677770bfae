//! Batch extraction across many videos.
//!
//! Runs are independent: each worker opens its own [`VideoFileSource`] and
//! shares nothing mutable with the others, so videos are spread across the
//! rayon thread pool as-is. A failing video does not affect the rest.
//!
//! [`VideoFileSource`]: crate::VideoFileSource

use std::path::{Path, PathBuf};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::config::ExtractionConfig;
use crate::error::FramepickError;
use crate::extractor::{extract_keyframes_from_location, extract_keyframes_from_path};
use crate::locator::VideoLocator;
use crate::result::ExtractionResult;

/// The outcome of one video in a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    /// The input this outcome belongs to.
    pub input: PathBuf,
    /// The extraction result, or why it failed.
    pub result: Result<ExtractionResult, FramepickError>,
}

impl BatchOutcome {
    /// Returns `true` if extraction succeeded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Extract keyframes from every path in parallel.
///
/// Outcomes are returned in input order.
///
/// # Example
///
/// ```no_run
/// use framepick::{ExtractionConfig, extract_batch};
///
/// let outcomes = extract_batch(&["a.mp4", "b.mp4"], &ExtractionConfig::new());
/// for outcome in outcomes {
///     match outcome.result {
///         Ok(result) => println!("{}: {}", outcome.input.display(), result.keyframes.len()),
///         Err(error) => eprintln!("{}: {error}", outcome.input.display()),
///     }
/// }
/// ```
pub fn extract_batch<P>(paths: &[P], config: &ExtractionConfig) -> Vec<BatchOutcome>
where
    P: AsRef<Path> + Sync,
{
    log::debug!("Extracting keyframes from {} videos", paths.len());
    paths
        .par_iter()
        .map(|path| {
            let input = path.as_ref().to_path_buf();
            let result = extract_keyframes_from_path(&input, config);
            if let Err(error) = &result {
                log::warn!("Extraction failed for {}: {error}", input.display());
            }
            BatchOutcome { input, result }
        })
        .collect()
}

/// Resolve every location through `locator` and extract in parallel.
///
/// Outcomes are returned in input order.
pub fn extract_batch_locations<L, S>(
    locator: &L,
    locations: &[S],
    config: &ExtractionConfig,
) -> Vec<BatchOutcome>
where
    L: VideoLocator + ?Sized,
    S: AsRef<str> + Sync,
{
    locations
        .par_iter()
        .map(|location| {
            let location = location.as_ref();
            let result = extract_keyframes_from_location(locator, location, config);
            if let Err(error) = &result {
                log::warn!("Extraction failed for {location}: {error}");
            }
            BatchOutcome {
                input: PathBuf::from(location),
                result,
            }
        })
        .collect()
}
