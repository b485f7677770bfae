//! Error handling integration tests.
//!
//! These tests verify that meaningful errors are returned for various
//! failure conditions, and that each error lands in the right category.

use std::path::PathBuf;

use framepick::{
    ErrorCategory, ExtractionConfig, FramepickError, LocalLocator, VideoFileSource,
    extract_keyframes_from_location, extract_keyframes_from_path,
};

#[test]
fn open_nonexistent_file() {
    let result = VideoFileSource::open("this_file_does_not_exist.mp4");
    let error = result.err().expect("Expected an open error");

    assert!(
        error.to_string().contains("Failed to open video"),
        "Error message should mention file open failure: {error}",
    );
    assert_eq!(error.category(), ErrorCategory::Input);
    assert!(error.is_fatal());
}

#[test]
fn open_invalid_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let invalid_file_path = temporary_directory.path().join("invalid.mp4");
    std::fs::write(&invalid_file_path, b"this is not a video file")
        .expect("Failed to write invalid file");

    let result = extract_keyframes_from_path(&invalid_file_path, &ExtractionConfig::new());
    let error = result.expect_err("Expected error for invalid video file");
    assert!(error.is_fatal());
}

#[test]
fn config_errors_win_over_missing_files() {
    let config = ExtractionConfig::new().with_frame_skip(0);
    let result = extract_keyframes_from_path("this_file_does_not_exist.mp4", &config);
    assert!(matches!(result, Err(FramepickError::InvalidFrameSkip)));
}

#[test]
fn remote_location_without_cache_is_unsupported() {
    let result = extract_keyframes_from_location(
        &LocalLocator,
        "https://example.com/clip.mp4",
        &ExtractionConfig::new(),
    );
    let error = result.expect_err("Remote location must not resolve locally");
    assert!(matches!(error, FramepickError::UnsupportedLocation(_)));
    assert!(error.to_string().contains("https://example.com/clip.mp4"));
}

// ── Categories ─────────────────────────────────────────────────────

#[test]
fn categories_partition_errors() {
    let cases = [
        (
            FramepickError::FileOpen {
                path: PathBuf::from("a.mp4"),
                reason: "missing".to_string(),
            },
            ErrorCategory::Input,
        ),
        (FramepickError::NoVideoStream, ErrorCategory::Input),
        (
            FramepickError::FetchFailed {
                location: "s3://b/a.mp4".to_string(),
                reason: "denied".to_string(),
            },
            ErrorCategory::Input,
        ),
        (FramepickError::InvalidFrameSkip, ErrorCategory::Config),
        (FramepickError::InvalidInterval(-1.0), ErrorCategory::Config),
        (
            FramepickError::InvalidFrameBounds { min: 5, max: 1 },
            ErrorCategory::Config,
        ),
        (
            FramepickError::FrameDecodeError("corrupt".to_string()),
            ErrorCategory::Scoring,
        ),
        (
            FramepickError::FrameNotRetained { index: 3 },
            ErrorCategory::Normalization,
        ),
        (
            FramepickError::WorkerFailed("task panicked".to_string()),
            ErrorCategory::Internal,
        ),
    ];

    for (error, category) in cases {
        assert_eq!(error.category(), category, "{error}");
        assert_eq!(
            error.is_fatal(),
            matches!(
                category,
                ErrorCategory::Input | ErrorCategory::Config | ErrorCategory::Internal
            ),
            "{error}"
        );
    }
}

#[test]
fn error_messages_carry_context() {
    let bounds = FramepickError::InvalidFrameBounds { min: 9, max: 4 };
    let message = bounds.to_string();
    assert!(message.contains('9') && message.contains('4'), "{message}");

    let interval = FramepickError::InvalidInterval(-2.5).to_string();
    assert!(interval.contains("-2.5"), "{interval}");

    let io: FramepickError = std::io::Error::other("disk full").into();
    assert!(matches!(io, FramepickError::IoError(_)));
    assert!(io.to_string().contains("disk full"));
}

#[test]
fn json_failures_are_internal_not_config() {
    let source = serde_json::from_str::<serde_json::Value>("{\"keyframes\":")
        .expect_err("Truncated JSON should not parse");
    let error: FramepickError = source.into();

    assert!(matches!(error, FramepickError::Serialization(_)));
    assert_eq!(error.category(), ErrorCategory::Internal);
    assert!(error.is_fatal());
    assert!(error.to_string().starts_with("Serialization error"), "{error}");
}
