use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::types::{EyeRaw, Fixation, GazeSample};

/// One gaze row as exported, before typing. `x`/`y` are `null` when the
/// tracker reported no position; they become NaN on the typed sample.
#[derive(Debug, Deserialize)]
pub struct GazeRecord {
    pub event_time: i64,
    pub system_time: i64,
    pub x: Option<f64>,
    pub y: Option<f64>,
    #[serde(default)]
    pub left_x: Option<f64>,
    #[serde(default)]
    pub left_y: Option<f64>,
    #[serde(default)]
    pub left_pupil_diameter: Option<f64>,
    #[serde(default)]
    pub left_validation: Option<i64>,
    #[serde(default)]
    pub right_x: Option<f64>,
    #[serde(default)]
    pub right_y: Option<f64>,
    #[serde(default)]
    pub right_pupil_diameter: Option<f64>,
    #[serde(default)]
    pub right_validation: Option<i64>,
}

/// One fixation row of the selected run, pre-sorted by start event time.
#[derive(Debug, Deserialize)]
pub struct FixationRecord {
    pub fixation_id: i64,
    pub run_id: i64,
    pub start_event_time: i64,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub duration_ms: i64,
}

/// A session export as written by the collaborating toolkit: the full gaze
/// stream, the fixations of one run, and the fixation membership mapping
/// keyed by fixation id, listing member gaze *event* times.
#[derive(Debug, Deserialize)]
pub struct SessionFile {
    pub session_start_time: f64,
    pub gazes: Vec<GazeRecord>,
    #[serde(default)]
    pub fixations: Vec<FixationRecord>,
    #[serde(default)]
    pub fixation_gazes: HashMap<String, Vec<i64>>,
}

/// Fully typed, validated session data. This is the only place raw records
/// are handled; everything downstream works on these streams.
#[derive(Debug)]
pub struct Session {
    /// Playback-clock timestamp of the first video frame (ms).
    pub start_time_ms: f64,
    pub gazes: Vec<GazeSample>,
    pub fixations: Vec<Fixation>,
    /// `system_time` of every gaze sample claimed by some fixation; consumed
    /// by the saccade segmenter.
    pub fixation_member_times: HashSet<i64>,
}

impl Session {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read session file {}", path.display()))?;
        let file: SessionFile = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse session file {}", path.display()))?;
        Self::from_records(file)
    }

    pub fn from_records(file: SessionFile) -> Result<Self> {
        let gazes: Vec<GazeSample> = file
            .gazes
            .into_iter()
            .map(|r| GazeSample {
                event_time: r.event_time,
                system_time: r.system_time,
                x: r.x.unwrap_or(f64::NAN),
                y: r.y.unwrap_or(f64::NAN),
                raw: EyeRaw {
                    left_x: r.left_x,
                    left_y: r.left_y,
                    left_pupil_diameter: r.left_pupil_diameter,
                    left_validation: r.left_validation,
                    right_x: r.right_x,
                    right_y: r.right_y,
                    right_pupil_diameter: r.right_pupil_diameter,
                    right_validation: r.right_validation,
                },
            })
            .collect();

        // An unordered stream would break the cursor sweep; reject it before
        // playback ever starts.
        for pair in gazes.windows(2) {
            if pair[1].system_time < pair[0].system_time {
                bail!(
                    "gaze stream is not ordered by system_time ({} after {})",
                    pair[1].system_time,
                    pair[0].system_time
                );
            }
        }

        let fixations: Vec<Fixation> = file
            .fixations
            .into_iter()
            .map(|r| {
                Fixation::new(
                    r.fixation_id,
                    r.run_id,
                    r.start_event_time,
                    r.x.unwrap_or(f64::NAN),
                    r.y.unwrap_or(f64::NAN),
                    r.duration_ms,
                )
            })
            .collect();

        for pair in fixations.windows(2) {
            if pair[1].start_event_time < pair[0].start_event_time {
                bail!(
                    "fixation run is not ordered by start_event_time (fixation {} after {})",
                    pair[1].fixation_id,
                    pair[0].fixation_id
                );
            }
        }

        // The membership mapping speaks event times; the segmenter works on
        // system times. Resolve through the gaze stream.
        let by_event_time: HashMap<i64, i64> = gazes
            .iter()
            .map(|g| (g.event_time, g.system_time))
            .collect();
        let mut fixation_member_times = HashSet::new();
        for (fixation_id, event_times) in &file.fixation_gazes {
            for et in event_times {
                match by_event_time.get(et) {
                    Some(&st) => {
                        fixation_member_times.insert(st);
                    }
                    None => bail!(
                        "fixation {} references event time {} with no matching gaze",
                        fixation_id,
                        et
                    ),
                }
            }
        }

        Ok(Self {
            start_time_ms: file.session_start_time,
            gazes,
            fixations,
            fixation_member_times,
        })
    }

    /// Length of the session in seconds, by gaze system-time span.
    pub fn time_length_secs(&self) -> f64 {
        match (self.gazes.first(), self.gazes.last()) {
            (Some(first), Some(last)) => (last.system_time - first.system_time) as f64 / 1000.0,
            _ => 0.0,
        }
    }
}
