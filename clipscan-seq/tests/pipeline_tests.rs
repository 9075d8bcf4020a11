//! End-to-end pipeline tests
//!
//! Parser → tracker → validator → overlap resolver → emitter, driven from
//! neighbor-log text the way the ANN search writes it.

use clipscan_seq::services::{parse_str, render, write_report, OutputFormat, ParseError};
use clipscan_seq::services::{CandidateTracker, TrackerConfig};
use clipscan_seq::validators::ValidatorPreset;
use clipscan_seq::{run_detection, run_file, DetectError, DetectionParams};
use std::fs;
use tempfile::TempDir;

fn params(max_misses: u32, min_duration: f64) -> DetectionParams {
    DetectionParams {
        tolerance: 0,
        max_consecutive_misses: max_misses,
        min_duration,
        preset: ValidatorPreset::Standard,
        accuracy_factor: None,
        miss_allowance: None,
    }
}

/// ep1 frames 10,11,12 at query 0,1,2 then two ticks of unrelated noise
const CLOSURE_LOG: &str = "\
0 $ ep1 # 10 # 10
1 $ ep1 # 11 # 11
2 $ ep1 # 12 # 12
3 $ ep9 # 50 # 500
4 $ ep8 # 70 # 700
";

#[test]
fn test_growth_scenario_stays_open() {
    let ticks = parse_str("0 $ ep1 # 0 # 10\n1 $ ep1 # 1 # 11\n2 $ ep1 # 2 # 12\n").unwrap();
    let mut tracker = CandidateTracker::new(TrackerConfig {
        tolerance: 0,
        max_consecutive_misses: 2,
    })
    .unwrap();

    for tick in &ticks {
        assert!(tracker.step(tick).is_empty());
    }

    let open = tracker.open_candidates();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].start_query_time, 0.0);
    assert_eq!((open[0].hits, open[0].misses), (2, 0));

    // Nothing is ever emitted for a candidate still open at end of stream
    let report = run_detection("amv", &ticks, &params(2, 0.0)).unwrap();
    assert!(report.clips.is_empty());
    assert_eq!(report.stats.open_discarded, 1);
}

#[test]
fn test_closure_scenario_emits_clip() {
    let ticks = parse_str(CLOSURE_LOG).unwrap();
    let report = run_detection("amv", &ticks, &params(2, 0.0)).unwrap();

    assert_eq!(report.clips.len(), 1);
    let clip = &report.clips[0];
    assert_eq!(clip.source_id, "ep1");
    assert_eq!(clip.start_query_time, 0.0);
    assert_eq!(clip.duration, 2.0);
    assert_eq!(clip.start_source_time, 10.0);
    assert_eq!((clip.hits, clip.misses), (2, 2));

    assert_eq!(render(&report, OutputFormat::Text).unwrap(), "0.00 2.00 ep1 10.00\n");
}

#[test]
fn test_closure_scenario_respects_min_duration() {
    let ticks = parse_str(CLOSURE_LOG).unwrap();
    let report = run_detection("amv", &ticks, &params(2, 2.0)).unwrap();
    assert!(report.clips.is_empty());
    assert_eq!(report.stats.rejected_too_short, 1);
}

#[test]
fn test_overlapping_clips_keep_longest() {
    // Two runs on ep1 that overlap in query time: frames 100.. for 6 ticks,
    // frames 300.. starting at tick 2 for 3 ticks.
    let mut log = String::new();
    for t in 0..6u64 {
        let mut neighbors = vec![format!("ep1 # {} # {}", 100 + t, 100 + t)];
        if (2..5).contains(&t) {
            neighbors.push(format!("ep1 # {} # {}", 300 + t, 300 + t));
        }
        log.push_str(&format!("{} $ {}\n", t, neighbors.join(" | ")));
    }
    log.push_str("6 $ ep9 # 1 # 1\n7 $ ep9 # 9 # 9\n8 $ ep9 # 20 # 20\n");

    let ticks = parse_str(&log).unwrap();
    let report = run_detection("amv", &ticks, &params(2, 0.0)).unwrap();

    assert_eq!(report.stats.clips_accepted, 2);
    assert_eq!(report.stats.removed_overlapping, 1);
    assert_eq!(report.clips.len(), 1);
    assert_eq!(report.clips[0].start_source_time, 100.0);
    assert_eq!(report.clips[0].duration, 5.0);
}

#[test]
fn test_malformed_input_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("amv.txt");
    let output = temp_dir.path().join("out").join("amv.txt");
    fs::write(&input, "0 $ ep1 # 10 # 10\n1 ep1 # 11 # 11\n").unwrap();

    let result = run_file(&input, None, &params(2, 0.0));
    match result {
        Err(DetectError::Format(ParseError::MissingTickSeparator { line })) => assert_eq!(line, 2),
        other => panic!("expected format error, got {:?}", other),
    }
    assert!(!output.exists());
    assert!(!output.parent().unwrap().exists());
}

#[test]
fn test_missing_input_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = run_file(&temp_dir.path().join("absent.txt"), None, &params(2, 0.0));
    assert!(matches!(result, Err(DetectError::Io { .. })));
}

#[test]
fn test_bad_params_rejected_before_reading() {
    let temp_dir = TempDir::new().unwrap();
    // The input does not exist: a config error must win over the io error
    let result = run_file(&temp_dir.path().join("absent.txt"), None, &params(0, 0.0));
    assert!(matches!(result, Err(DetectError::Config(_))));
}

#[test]
fn test_file_round_trip_and_video_id() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("cantHoldUs.txt");
    let output = temp_dir.path().join("results").join("cantHoldUs.txt");
    fs::write(&input, CLOSURE_LOG).unwrap();

    let report = run_file(&input, None, &params(2, 0.0)).unwrap();
    assert_eq!(report.video_id, "cantHoldUs");

    write_report(&output, &report, OutputFormat::Text).unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), "0.00 2.00 ep1 10.00\n");
    assert!(!temp_dir.path().join("results").join("cantHoldUs.txt.tmp").exists());
}

#[test]
fn test_json_report() {
    let ticks = parse_str(CLOSURE_LOG).unwrap();
    let report = run_detection("amv", &ticks, &params(2, 0.0)).unwrap();
    let json = render(&report, OutputFormat::Json).unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["video_id"], "amv");
    assert_eq!(value["clips"][0]["source_id"], "ep1");
    assert_eq!(value["clips"][0]["duration"], 2.0);
    assert_eq!(value["stats"]["clips_emitted"], 1);
    assert!(value["generated_at"].is_string());
}

#[test]
fn test_labeled_query_times_accepted() {
    let log = "\
amv # 0 # 1 $ ep1 # 10 # 10
amv # 1 # 2 $ ep1 # 11 # 11
amv # 2 # 3 $ ep1 # 12 # 12
amv # 3 # 4 $ ep9 # 50 # 500
amv # 4 # 5 $ ep8 # 70 # 700
";
    let ticks = parse_str(log).unwrap();
    let report = run_detection("amv", &ticks, &params(2, 0.0)).unwrap();
    assert_eq!(render(&report, OutputFormat::Text).unwrap(), "0.00 2.00 ep1 10.00\n");
}

#[test]
fn test_full_run_is_deterministic() {
    // Noisy log: several sources, duplicated neighbors, lagging matches
    let mut log = String::new();
    let mut seed: u64 = 0x9E37_79B9_7F4A_7C15;
    for t in 0..300u64 {
        let mut neighbors = Vec::new();
        for k in 0..6u64 {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            let source = format!("ep{}", (seed >> 8) % 3);
            let frame = if k < 2 { t + 40 * k } else { (seed >> 16) % 400 };
            neighbors.push(format!("{} # {:.2} # {}", source, frame as f64 / 6.0, frame));
        }
        log.push_str(&format!("{:.2} $ {}\n", t as f64 / 6.0, neighbors.join(" | ")));
    }

    let run = || {
        let ticks = parse_str(&log).unwrap();
        let report = run_detection("noisy", &ticks, &params(3, 0.5)).unwrap();
        render(&report, OutputFormat::Text).unwrap()
    };

    let first = run();
    assert_eq!(first, run());
}

#[test]
fn test_frame_index_at_integer_limit_is_handled() {
    let ticks = parse_str("0 $ ep1 # 0 # 18446744073709551615\n1 $ ep2 # 1 # 1\n").unwrap();
    let report = run_detection("amv", &ticks, &params(2, 0.0)).unwrap();

    assert!(report.clips.is_empty());
    assert_eq!(report.stats.candidates_closed, 1);
    assert_eq!(report.stats.rejected_too_short, 1);
    assert_eq!(report.stats.open_discarded, 1);
}
