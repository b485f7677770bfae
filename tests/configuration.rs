//! Configuration parsing and validation tests.

use framepick::{
    ChangeMetric, CountMode, ExtractionConfig, FrameCount, FramepickError, PayloadEncoding,
    Resolution,
};

// ── Defaults ───────────────────────────────────────────────────────

#[test]
fn defaults_are_valid() {
    let config = ExtractionConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.frame_count(), FrameCount::Fixed(5));
    assert_eq!(config.mode(), CountMode::Fixed);
    assert_eq!(config.frame_bounds(), (3, 15));
    assert_eq!(config.interval_seconds(), 10.0);
    assert_eq!(config.frame_skip(), 1);
    assert_eq!(config.resolution(), Resolution::Original);
    assert_eq!(config.encoding(), PayloadEncoding::Raw);
    assert_eq!(config.persist_dir(), None);
    assert_eq!(config.jpeg_quality(), 85);
    assert_eq!(config.metric(), ChangeMetric::PixelDelta);
}

#[test]
fn builders_set_fields() {
    let config = ExtractionConfig::new()
        .with_frame_count(FrameCount::Auto)
        .with_mode(CountMode::Interval)
        .with_interval(2.5)
        .with_frame_bounds(2, 9)
        .with_frame_skip(4)
        .with_resolution(Resolution::P480)
        .with_encoding(PayloadEncoding::Base64)
        .with_persist_dir("out")
        .with_jpeg_quality(60)
        .with_metric(ChangeMetric::Histogram);

    assert!(config.validate().is_ok());
    assert_eq!(config.interval_seconds(), 2.5);
    assert_eq!(config.frame_bounds(), (2, 9));
    assert_eq!(config.frame_skip(), 4);
    assert_eq!(config.persist_dir(), Some(std::path::Path::new("out")));
    assert_eq!(config.metric(), ChangeMetric::Histogram);
}

#[test]
fn debug_output_omits_callback() {
    let rendered = format!("{:?}", ExtractionConfig::new());
    assert!(rendered.contains("frame_skip"));
    assert!(rendered.ends_with(".. }"));
}

// ── Validation ─────────────────────────────────────────────────────

#[test]
fn zero_frame_skip_is_rejected() {
    let result = ExtractionConfig::new().with_frame_skip(0).validate();
    assert!(matches!(result, Err(FramepickError::InvalidFrameSkip)));
}

#[test]
fn inverted_or_zero_bounds_are_rejected() {
    for (min, max) in [(0, 5), (6, 5)] {
        let result = ExtractionConfig::new().with_frame_bounds(min, max).validate();
        assert!(
            matches!(result, Err(FramepickError::InvalidFrameBounds { .. })),
            "({min}, {max}) should be rejected"
        );
    }
    assert!(ExtractionConfig::new().with_frame_bounds(4, 4).validate().is_ok());
}

#[test]
fn non_positive_interval_is_rejected_in_interval_mode() {
    for interval in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let result = ExtractionConfig::new()
            .with_mode(CountMode::Interval)
            .with_interval(interval)
            .validate();
        assert!(matches!(result, Err(FramepickError::InvalidInterval(_))));
    }
    // Other modes never read the interval.
    assert!(ExtractionConfig::new().with_interval(0.0).validate().is_ok());
}

#[test]
fn fixed_mode_needs_a_positive_count() {
    let zero = ExtractionConfig::new().with_frame_count(FrameCount::Fixed(0)).validate();
    assert!(matches!(zero, Err(FramepickError::InvalidFrameCount(_))));

    let auto = ExtractionConfig::new().with_frame_count(FrameCount::Auto).validate();
    assert!(matches!(auto, Err(FramepickError::InvalidFrameCount(_))));

    let adaptive = ExtractionConfig::new()
        .with_frame_count(FrameCount::Auto)
        .with_mode(CountMode::Adaptive)
        .validate();
    assert!(adaptive.is_ok());
}

#[test]
fn zero_exact_resolution_is_rejected() {
    let result = ExtractionConfig::new()
        .with_resolution(Resolution::Exact(0, 720))
        .validate();
    assert!(matches!(result, Err(FramepickError::InvalidResolution(_))));
}

#[test]
fn jpeg_quality_must_be_in_range() {
    assert!(ExtractionConfig::new().with_jpeg_quality(0).validate().is_err());
    assert!(ExtractionConfig::new().with_jpeg_quality(101).validate().is_err());
    assert!(ExtractionConfig::new().with_jpeg_quality(1).validate().is_ok());
    assert!(ExtractionConfig::new().with_jpeg_quality(100).validate().is_ok());
}

// ── Parsing ────────────────────────────────────────────────────────

#[test]
fn frame_count_parses() {
    assert_eq!("auto".parse::<FrameCount>().unwrap(), FrameCount::Auto);
    assert_eq!(" AUTO ".parse::<FrameCount>().unwrap(), FrameCount::Auto);
    assert_eq!("12".parse::<FrameCount>().unwrap(), FrameCount::Fixed(12));
    assert!("-1".parse::<FrameCount>().is_err());
    assert!("many".parse::<FrameCount>().is_err());
}

#[test]
fn count_mode_parses() {
    assert_eq!("fixed".parse::<CountMode>().unwrap(), CountMode::Fixed);
    assert_eq!("Adaptive".parse::<CountMode>().unwrap(), CountMode::Adaptive);
    assert_eq!("interval".parse::<CountMode>().unwrap(), CountMode::Interval);
    assert!("smart".parse::<CountMode>().is_err());
    assert_eq!(CountMode::Interval.to_string(), "interval");
}

#[test]
fn resolution_parses_tags_and_sizes() {
    assert_eq!("original".parse::<Resolution>().unwrap(), Resolution::Original);
    assert_eq!("360p".parse::<Resolution>().unwrap(), Resolution::P360);
    assert_eq!("720P".parse::<Resolution>().unwrap(), Resolution::P720);
    assert_eq!("1080p".parse::<Resolution>().unwrap(), Resolution::P1080);
    assert_eq!("640x360".parse::<Resolution>().unwrap(), Resolution::Exact(640, 360));
    assert!(matches!(
        "4k".parse::<Resolution>(),
        Err(FramepickError::InvalidResolution(_))
    ));
    assert!("640x".parse::<Resolution>().is_err());
}

#[test]
fn resolution_display_round_trips() {
    for resolution in [
        Resolution::Original,
        Resolution::P360,
        Resolution::P480,
        Resolution::P720,
        Resolution::P1080,
        Resolution::Exact(320, 240),
    ] {
        assert_eq!(resolution.to_string().parse::<Resolution>().unwrap(), resolution);
    }
}

#[test]
fn encoding_parses() {
    assert_eq!("raw".parse::<PayloadEncoding>().unwrap(), PayloadEncoding::Raw);
    assert_eq!("base64".parse::<PayloadEncoding>().unwrap(), PayloadEncoding::Base64);
    assert_eq!("b64".parse::<PayloadEncoding>().unwrap(), PayloadEncoding::Base64);
    assert!("png".parse::<PayloadEncoding>().is_err());
}
