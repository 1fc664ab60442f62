use std::collections::HashMap;

use image::Rgb;

use gaze_replay::detector::detect_regions;
use gaze_replay::pipeline::{RenderOptions, Renderer};
use gaze_replay::saccade::segment_saccades;
use gaze_replay::session::{FixationRecord, GazeRecord, Session, SessionFile};
use gaze_replay::types::{Frame, TextRegion};

fn gaze(event_time: i64, system_time: i64, x: Option<f64>, y: Option<f64>) -> GazeRecord {
    GazeRecord {
        event_time,
        system_time,
        x,
        y,
        left_x: None,
        left_y: None,
        left_pupil_diameter: None,
        left_validation: None,
        right_x: None,
        right_y: None,
        right_pupil_diameter: None,
        right_validation: None,
    }
}

/// Ticks on the tracker clock for a playback-clock millisecond timestamp.
fn ticks(unix_ms: i64) -> i64 {
    (unix_ms + 11_644_473_600_000) * 10_000
}

#[test]
fn full_replay_produces_stretched_overlaid_frames() {
    // One second of session: gaze wandering across the frame, one fixation
    // at (16, 16) from t=200 for 300 ms, membership claiming the samples
    // near it.
    let gazes: Vec<GazeRecord> = (0..10)
        .map(|i| {
            let t = i * 100;
            gaze(1000 + t, t, Some(3.0 + i as f64 * 2.0), Some(16.0))
        })
        .collect();
    let fixations = vec![FixationRecord {
        fixation_id: 1,
        run_id: 1,
        start_event_time: ticks(200),
        x: Some(16.0),
        y: Some(16.0),
        duration_ms: 300,
    }];
    let fixation_gazes = HashMap::from([("1".to_string(), vec![1200, 1300, 1400])]);

    let session = Session::from_records(SessionFile {
        session_start_time: 0.0,
        gazes,
        fixations,
        fixation_gazes,
    })
    .expect("valid session");

    let saccades = segment_saccades(&session.gazes, &session.fixation_member_times);
    // Membership at t=200/300/400 splits the stream in two saccades.
    assert_eq!(saccades.len(), 2);

    let mut options = RenderOptions::default();
    options.stretch = 2;
    let mut renderer = Renderer::new(
        &session.gazes,
        &session.fixations,
        &saccades,
        session.start_time_ms,
        10.0,
        options,
    );

    let base = Frame::from_pixel(32, 32, Rgb([0, 0, 0]));
    let mut outputs = Vec::new();
    for frame_index in 0..10u64 {
        outputs.extend(renderer.render_frame(&base, frame_index));
    }
    assert_eq!(outputs.len(), 20, "one output per sub-frame tick");

    // During the fixation (t=300 -> frame 3) the fixation dot must be on the
    // frame in the default fixation color.
    let during_fixation = &outputs[6];
    assert_eq!(during_fixation.get_pixel(16, 16), &Rgb([255, 0, 0]));

    // Something was overlaid on the first tick too (the current gaze dot).
    assert_ne!(outputs[0].as_raw(), base.as_raw());
}

#[test]
fn saccade_scenario_drops_invalid_sample() {
    // Gaze stream [(0,1,1), (10,NaN), (20,2,2)], no fixation membership:
    // one saccade holding the samples at t=0 and t=20.
    let session = Session::from_records(SessionFile {
        session_start_time: 0.0,
        gazes: vec![
            gaze(1, 0, Some(1.0), Some(1.0)),
            gaze(2, 10, None, None),
            gaze(3, 20, Some(2.0), Some(2.0)),
        ],
        fixations: Vec::new(),
        fixation_gazes: HashMap::new(),
    })
    .unwrap();

    let saccades = segment_saccades(&session.gazes, &session.fixation_member_times);
    assert_eq!(saccades.len(), 1);
    let times: Vec<i64> = saccades[0].samples().iter().map(|g| g.system_time).collect();
    assert_eq!(times, vec![0, 20]);
}

#[test]
fn detector_reuses_regions_below_change_threshold() {
    // 20x20 frame, 12 of 400 pixels changed: 3% of the buffer differs, under
    // the 5% trigger, so the previous list comes back untouched.
    let prev = Frame::from_pixel(20, 20, Rgb([200, 200, 200]));
    let mut cur = prev.clone();
    for i in 0..12u32 {
        cur.put_pixel(i, 0, Rgb([0, 0, 0]));
    }
    let regions = vec![TextRegion { min_x: 1, min_y: 2, max_x: 9, max_y: 5 }];
    let out = detect_regions(&cur, Some(&prev), regions.clone());
    assert_eq!(out, regions);
}
