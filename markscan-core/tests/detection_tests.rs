// markscan-core/tests/detection_tests.rs

mod common;

use common::{frame_with_marker, noise_frame, synthetic_video};
use markscan_core::calibration::{CalibrationStore, FixedScale, InteractivePrompt, Resolution};
use markscan_core::config::{DetectionConfig, IntervalPolicy};
use markscan_core::error::CoreError;
use markscan_core::external::FrameSource;
use markscan_core::external::frame_source::IterFrameSource;
use markscan_core::processing::{Interval, detect_video, plan_clips};
use markscan_core::terminal_output::FrameProgress;
use tempfile::tempdir;

fn detection_config(output_dir: &std::path::Path) -> DetectionConfig {
    DetectionConfig {
        threshold: 0.6,
        ..DetectionConfig::new(output_dir.to_path_buf())
    }
}

#[test]
fn test_detect_video_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let out = dir.path().join("matched_frames");
    let mut store = CalibrationStore::open(dir.path().join("scale_factors.json"))?;
    let mut source = synthetic_video(48, 36, 1000, 300..=310, 0.5);

    let detection = detect_video(
        &mut source,
        "synthetic",
        &common::marker_template(),
        &mut store,
        &mut FixedScale::new(Some(0.5)),
        &detection_config(&out),
        &IntervalPolicy::default(),
        &FrameProgress::hidden(),
    )?;

    assert_eq!(detection.resolution, Resolution::new(48, 36));
    assert_eq!(detection.scale, 0.5);
    assert_eq!(detection.report.frames_decoded, 1000);
    assert_eq!(
        detection.report.detection_indices(),
        (300..=310).collect::<Vec<u64>>()
    );
    assert_eq!(detection.intervals, vec![Interval::new(100, 410)]);

    // Provided scale was persisted for the resolution.
    assert_eq!(store.get(Resolution::new(48, 36)), Some(0.5));

    assert_eq!(detection.output_dir, out.join("synthetic_scale0.50000"));
    assert_eq!(detection.report.annotated.len(), 11);
    for i in 300..=310 {
        assert!(detection.output_dir.join(format!("frame_{i}.jpg")).is_file());
    }

    let clips = plan_clips(&detection.intervals, Some(25.0), &detection.output_dir);
    assert_eq!(clips.len(), 1);
    assert_eq!(clips[0].start_arg(), "4.00");
    assert_eq!(clips[0].duration_arg(), "12.40");
    assert_eq!(clips[0].output, detection.output_dir.join("clip_001.mp4"));
    Ok(())
}

#[test]
fn test_detect_video_two_appearances_stay_separate() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut store = CalibrationStore::open(dir.path().join("scale_factors.json"))?;
    store.put(Resolution::new(48, 36), 0.5)?;

    // Two visible runs; without padding they cannot merge.
    let plain = noise_frame(48, 36, 3);
    let marked = frame_with_marker(48, 36, 3, 0.5, 20, 12);
    let frames = (0..40u64).map(move |i| {
        if (5..=7).contains(&i) || (20..=21).contains(&i) {
            marked.clone()
        } else {
            plain.clone()
        }
    });
    let mut source = IterFrameSource::new(Resolution::new(48, 36), frames);

    let detection = detect_video(
        &mut source,
        "twice",
        &common::marker_template(),
        &mut store,
        &mut FixedScale::new(None),
        &DetectionConfig {
            threshold: 0.6,
            ..DetectionConfig::new(dir.path().join("out"))
        },
        &IntervalPolicy::unpadded(1),
        &FrameProgress::hidden(),
    )?;

    assert_eq!(
        detection.intervals,
        vec![Interval::new(5, 7), Interval::new(20, 21)]
    );
    Ok(())
}

#[test]
fn test_detect_video_without_calibration_reads_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let store_path = dir.path().join("scale_factors.json");
    let mut store = CalibrationStore::open(&store_path)?;
    let mut source = synthetic_video(48, 36, 10, 3..=3, 0.5);

    let mut prompt = InteractivePrompt::new(&b"0\n"[..], Vec::new());
    let result = detect_video(
        &mut source,
        "synthetic",
        &common::marker_template(),
        &mut store,
        &mut prompt,
        &detection_config(dir.path()),
        &IntervalPolicy::default(),
        &FrameProgress::hidden(),
    );

    match result {
        Err(CoreError::CalibrationUnavailable(key)) => assert_eq!(key, "48x36"),
        other => panic!("Unexpected result: {other:?}"),
    }
    assert!(!store_path.exists());

    // The source was not consumed.
    assert!(source.next_frame()?.is_some());
    Ok(())
}

#[test]
fn test_detect_video_template_too_large() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut store = CalibrationStore::open(dir.path().join("scale_factors.json"))?;
    let mut source = synthetic_video(48, 36, 3, 0..=0, 0.5);

    let result = detect_video(
        &mut source,
        "synthetic",
        &common::marker_template(),
        &mut store,
        &mut FixedScale::new(Some(1.0)),
        &detection_config(dir.path()),
        &IntervalPolicy::default(),
        &FrameProgress::hidden(),
    );
    assert!(matches!(result, Err(CoreError::Config(_))));
    Ok(())
}
