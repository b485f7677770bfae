//! Inter-frame change scoring.
//!
//! [`ChangeScorer`] compares each sampled frame with the previously sampled
//! one. Every metric works on a 64×64 grayscale reduction of the frame, so the
//! cost of scoring does not depend on the source resolution.
//!
//! [`CandidatePool`] collects the scored candidates of one run. Scores and
//! timestamps are kept for every candidate; decoded rasters are kept only for
//! the candidates that can still end up selected.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::time::Duration;

use image::{DynamicImage, GrayImage, imageops::FilterType};

use crate::error::FramepickError;
use crate::frame::Frame;

/// Side of the grayscale thumbnail every metric is computed on.
const SIGNATURE_SIZE: u32 = 64;

/// Side of the grid behind [`ChangeMetric::PerceptualHash`].
const HASH_SIZE: u32 = 8;

/// Number of luma buckets behind [`ChangeMetric::Histogram`].
const HISTOGRAM_BINS: usize = 64;

/// How the difference between two sampled frames is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeMetric {
    /// Mean absolute luma difference, 0–255.
    #[default]
    PixelDelta,
    /// One minus the intersection of 64-bin luma histograms, scaled to 0–100.
    ///
    /// Insensitive to motion that does not change the overall tone, so it
    /// mostly reacts to cuts and lighting changes.
    Histogram,
    /// Hamming distance between 64-bit average hashes, 0–64.
    PerceptualHash,
}

impl FromStr for ChangeMetric {
    type Err = FramepickError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pixel" | "pixel-delta" | "delta" => Ok(ChangeMetric::PixelDelta),
            "histogram" | "hist" => Ok(ChangeMetric::Histogram),
            "phash" | "hash" | "perceptual-hash" => Ok(ChangeMetric::PerceptualHash),
            other => Err(FramepickError::InvalidOption(format!("metric {other:?}"))),
        }
    }
}

impl Display for ChangeMetric {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            ChangeMetric::PixelDelta => "pixel-delta",
            ChangeMetric::Histogram => "histogram",
            ChangeMetric::PerceptualHash => "phash",
        };
        f.write_str(name)
    }
}

/// Whatever a metric needs to remember about the previous frame.
#[derive(Debug, Clone)]
enum Signature {
    Luma(GrayImage),
    Histogram([u32; HISTOGRAM_BINS]),
    Hash(u64),
}

impl Signature {
    fn of(metric: ChangeMetric, image: &DynamicImage) -> Self {
        let luma = image::imageops::resize(
            &image.to_luma8(),
            SIGNATURE_SIZE,
            SIGNATURE_SIZE,
            FilterType::Triangle,
        );
        match metric {
            ChangeMetric::PixelDelta => Signature::Luma(luma),
            ChangeMetric::Histogram => Signature::Histogram(luma_histogram(&luma)),
            ChangeMetric::PerceptualHash => Signature::Hash(average_hash(&luma)),
        }
    }

    fn distance(&self, other: &Signature) -> f64 {
        match (self, other) {
            (Signature::Luma(current), Signature::Luma(previous)) => {
                mean_absolute_difference(current, previous)
            }
            (Signature::Histogram(current), Signature::Histogram(previous)) => {
                (1.0 - histogram_intersection(current, previous)) * 100.0
            }
            (Signature::Hash(current), Signature::Hash(previous)) => {
                f64::from((current ^ previous).count_ones())
            }
            // The metric is fixed for the scorer's lifetime.
            _ => 0.0,
        }
    }
}

fn mean_absolute_difference(current: &GrayImage, previous: &GrayImage) -> f64 {
    let pixels = current.as_raw().len();
    if pixels == 0 {
        return 0.0;
    }
    let total: u64 = current
        .as_raw()
        .iter()
        .zip(previous.as_raw())
        .map(|(&a, &b)| u64::from(a.abs_diff(b)))
        .sum();
    total as f64 / pixels as f64
}

fn luma_histogram(luma: &GrayImage) -> [u32; HISTOGRAM_BINS] {
    let mut histogram = [0u32; HISTOGRAM_BINS];
    for &value in luma.as_raw() {
        histogram[usize::from(value >> 2)] += 1;
    }
    histogram
}

/// Normalized intersection in `0.0..=1.0`; `1.0` for identical histograms.
fn histogram_intersection(a: &[u32; HISTOGRAM_BINS], b: &[u32; HISTOGRAM_BINS]) -> f64 {
    let total_a: u32 = a.iter().sum();
    let total_b: u32 = b.iter().sum();
    if total_a == 0 || total_b == 0 {
        return 0.0;
    }
    let common: u32 = a.iter().zip(b).map(|(x, y)| (*x).min(*y)).sum();
    f64::from(common) / f64::from(total_a.max(total_b))
}

/// One bit per cell of an 8×8 reduction: set when the cell is brighter than
/// the mean.
fn average_hash(luma: &GrayImage) -> u64 {
    let grid = image::imageops::resize(luma, HASH_SIZE, HASH_SIZE, FilterType::Triangle);
    let cells = grid.as_raw();
    if cells.is_empty() {
        return 0;
    }
    let mean = cells.iter().map(|&v| u32::from(v)).sum::<u32>() as f64 / cells.len() as f64;
    cells
        .iter()
        .enumerate()
        .filter(|&(_, &value)| f64::from(value) > mean)
        .fold(0u64, |hash, (bit, _)| hash | (1 << bit))
}

/// Scores each sampled frame against the one sampled before it.
///
/// The scorer holds exactly one previous signature, so frames must be fed in
/// stream order.
#[derive(Debug, Clone)]
pub struct ChangeScorer {
    metric: ChangeMetric,
    previous: Option<Signature>,
}

impl ChangeScorer {
    /// Create a scorer with no previous frame.
    pub fn new(metric: ChangeMetric) -> Self {
        Self {
            metric,
            previous: None,
        }
    }

    /// The metric in use.
    pub fn metric(&self) -> ChangeMetric {
        self.metric
    }

    /// Score `frame` and make it the new previous frame.
    ///
    /// Returns `None` for the first frame, which has nothing to be compared
    /// with.
    pub fn score(&mut self, frame: &Frame) -> Option<f64> {
        let signature = Signature::of(self.metric, frame.image());
        let score = self
            .previous
            .as_ref()
            .map(|previous| signature.distance(previous));
        self.previous = Some(signature);
        score
    }

    /// Forget the previous frame.
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

/// A sampled frame together with its change score.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    /// Presentation time of the frame.
    pub timestamp: Duration,
    /// Position of the frame in the decoded stream.
    pub index: u64,
    /// Distance from the previously sampled frame. Never negative.
    pub change_score: f64,
    raster: Option<DynamicImage>,
}

impl ScoredCandidate {
    /// A candidate without a retained raster.
    pub fn new(timestamp: Duration, index: u64, change_score: f64) -> Self {
        Self {
            timestamp,
            index,
            change_score,
            raster: None,
        }
    }

    /// Attach the decoded raster.
    #[must_use]
    pub fn with_raster(mut self, raster: DynamicImage) -> Self {
        self.raster = Some(raster);
        self
    }

    /// The decoded raster, if it was retained.
    pub fn raster(&self) -> Option<&DynamicImage> {
        self.raster.as_ref()
    }

    /// Take the raster out of the candidate.
    pub fn take_raster(&mut self) -> Option<DynamicImage> {
        self.raster.take()
    }

    /// Selection order: higher score first, then earlier timestamp, then
    /// lower stream index.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .change_score
            .total_cmp(&self.change_score)
            .then_with(|| self.timestamp.cmp(&other.timestamp))
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Heap entry for a retained raster. The greatest entry is the worst-ranked,
/// so the heap top is the first one to give up its raster.
#[derive(Debug)]
struct Retained {
    score: f64,
    timestamp: Duration,
    index: u64,
    slot: usize,
}

impl Ord for Retained {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .reverse()
            .then_with(|| self.timestamp.cmp(&other.timestamp))
            .then_with(|| self.index.cmp(&other.index))
    }
}

impl PartialOrd for Retained {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Retained {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Retained {}

/// Append-only collection of the candidates of one run.
///
/// The baseline (first) candidate has no score while the run is in progress;
/// [`finish`](Self::finish) gives it the highest score observed, so it is
/// always ranked first. Of the remaining candidates only the best
/// `capacity - 1` keep their rasters.
#[derive(Debug)]
pub struct CandidatePool {
    capacity: usize,
    candidates: Vec<ScoredCandidate>,
    retained: BinaryHeap<Retained>,
    baseline: Option<usize>,
    max_score: f64,
}

impl CandidatePool {
    /// Create a pool that keeps rasters for at most `capacity` candidates.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            candidates: Vec::new(),
            retained: BinaryHeap::new(),
            baseline: None,
            max_score: 0.0,
        }
    }

    /// Add a sampled frame. `score` is `None` for the baseline frame.
    pub fn push(&mut self, frame: Frame, score: Option<f64>) {
        let slot = self.candidates.len();
        let timestamp = frame.timestamp();
        let index = frame.index();
        let raster = frame.into_image();

        let Some(score) = score else {
            if self.baseline.is_none() {
                self.baseline = Some(slot);
                self.candidates
                    .push(ScoredCandidate::new(timestamp, index, 0.0).with_raster(raster));
            } else {
                // A second baseline cannot outrank anything; keep it scoreless.
                self.candidates.push(ScoredCandidate::new(timestamp, index, 0.0));
            }
            return;
        };

        let score = score.max(0.0);
        self.max_score = self.max_score.max(score);
        let mut candidate = ScoredCandidate::new(timestamp, index, score);

        let entry = Retained {
            score,
            timestamp,
            index,
            slot,
        };
        let slots = self.capacity - 1;
        if self.retained.len() < slots {
            candidate.raster = Some(raster);
            self.retained.push(entry);
        } else if let Some(mut worst) = self.retained.peek_mut() {
            if entry < *worst {
                self.candidates[worst.slot].raster = None;
                *worst = entry;
                candidate.raster = Some(raster);
            }
        }
        self.candidates.push(candidate);
    }

    /// Number of candidates pushed so far.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns `true` if nothing has been pushed.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of candidates currently holding a raster.
    pub fn retained_count(&self) -> usize {
        self.candidates
            .iter()
            .filter(|candidate| candidate.raster.is_some())
            .count()
    }

    /// Close the run and return every candidate in stream order.
    pub fn finish(mut self) -> Vec<ScoredCandidate> {
        if let Some(slot) = self.baseline {
            self.candidates[slot].change_score = self.max_score;
        }
        self.candidates
    }
}
