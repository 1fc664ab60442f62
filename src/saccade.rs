use std::collections::HashSet;

use crate::types::{GazeSample, Saccade};

/// Partitions a time-ordered gaze sequence into saccades, using fixation
/// membership as the boundaries.
///
/// `member_times` holds the `system_time` of every gaze sample that belongs
/// to some fixation. Walking the sequence in order: a member time closes the
/// open saccade (if any), a valid non-member sample extends it, and invalid
/// non-member samples are dropped. A non-empty accumulator at the end of the
/// session is flushed as a final trailing saccade.
///
/// Output ordering follows input ordering; the input is already time-ordered
/// so no sort is needed.
pub fn segment_saccades(gazes: &[GazeSample], member_times: &HashSet<i64>) -> Vec<Saccade> {
    let mut saccades = Vec::new();
    let mut open: Vec<GazeSample> = Vec::new();

    for gaze in gazes {
        if member_times.contains(&gaze.system_time) {
            // Inside a fixation. An open accumulator ends exactly here.
            if !open.is_empty() {
                saccades.push(Saccade::new(std::mem::take(&mut open)));
            }
        } else if gaze.point().is_some() {
            open.push(gaze.clone());
        }
        // Invalid samples outside any fixation neither extend nor close.
    }

    if !open.is_empty() {
        saccades.push(Saccade::new(open));
    }

    saccades
}
