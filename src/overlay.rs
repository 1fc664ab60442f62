use image::Rgb;

use crate::types::{Fixation, Frame, GazeSample, Saccade, TextRegion};

/// Blends a filled circle into the frame. `transparency` is the linear
/// interpolation weight toward `color` in percent: 0 leaves the frame
/// untouched, 100 writes the color exactly. Pixels outside the frame are
/// clipped individually; an out-of-bounds center still draws its visible arc.
pub fn draw_point(frame: &mut Frame, cx: f32, cy: f32, radius: i32, color: Rgb<u8>, transparency: f32) {
    let alpha = (transparency.clamp(0.0, 100.0)) / 100.0;
    if alpha == 0.0 {
        return;
    }
    let (width, height) = frame.dimensions();
    let cx = cx.round() as i64;
    let cy = cy.round() as i64;
    let r = radius.max(0) as i64;

    for dy in -r..=r {
        for dx in -r..=r {
            if dx * dx + dy * dy > r * r {
                continue;
            }
            let px = cx + dx;
            let py = cy + dy;
            if px < 0 || py < 0 || px >= width as i64 || py >= height as i64 {
                continue;
            }
            let pixel = frame.get_pixel_mut(px as u32, py as u32);
            for c in 0..3 {
                let old = pixel[c] as f32;
                pixel[c] = (old + (color[c] as f32 - old) * alpha).round() as u8;
            }
        }
    }
}

/// Draws a straight segment by parametric stepping, one blended dot per step.
pub fn draw_line(frame: &mut Frame, a: (f32, f32), b: (f32, f32), color: Rgb<u8>, transparency: f32) {
    let dx = b.0 - a.0;
    let dy = b.1 - a.1;
    let steps = dx.abs().max(dy.abs()).ceil() as u32;
    for i in 0..=steps {
        let t = i as f32 / steps.max(1) as f32;
        draw_point(frame, a.0 + dx * t, a.1 + dy * t, 1, color, transparency);
    }
}

/// Blends every pixel of the region toward `color` at a fixed 50% weight.
pub fn highlight_region(frame: &mut Frame, region: &TextRegion, color: Rgb<u8>) {
    let (width, height) = frame.dimensions();
    let max_x = region.max_x.min(width.saturating_sub(1));
    let max_y = region.max_y.min(height.saturating_sub(1));
    for y in region.min_y..=max_y {
        for x in region.min_x..=max_x {
            let pixel = frame.get_pixel_mut(x, y);
            for c in 0..3 {
                pixel[c] = ((pixel[c] as u16 + color[c] as u16) / 2) as u8;
            }
        }
    }
}

/// Draws the rolling gaze window plus the current sample, fading linearly:
/// the oldest sample gets `100/n` percent, the newest is fully opaque.
/// Samples with unusable coordinates are skipped without aborting the batch.
pub fn draw_gaze_window(
    frame: &mut Frame,
    gazes: &[GazeSample],
    window: std::ops::Range<usize>,
    current: usize,
    radius: i32,
    color: Rgb<u8>,
) {
    let n = (current - window.start + 1) as f32;
    for (k, idx) in (window.start..=current).enumerate() {
        if let Some((x, y)) = gazes[idx].point() {
            let transparency = 100.0 * (k + 1) as f32 / n;
            draw_point(frame, x, y, radius, color, transparency);
        }
    }
}

/// Draws the expired fixations still inside the rolling window, faded by how
/// much of the window remains before each fully ages out.
pub fn draw_fixation_window(
    frame: &mut Frame,
    fixations: &[Fixation],
    window: std::ops::Range<usize>,
    timestamp: f64,
    window_ms: f64,
    radius: i32,
    color: Rgb<u8>,
) {
    if window_ms <= 0.0 {
        return;
    }
    for idx in window {
        let fix = &fixations[idx];
        if let Some((x, y)) = fix.point() {
            let since_expiry = timestamp - fix.end_ms;
            let transparency = 100.0 * ((window_ms - since_expiry) / window_ms) as f32;
            draw_point(frame, x, y, radius, color, transparency);
        }
    }
}

/// Draws the active fixation at full opacity, its radius growing with dwell
/// time, and (when a highlight color is given) blends the enclosing text
/// region first. Nothing is drawn before the fixation's start time.
pub fn draw_current_fixation(
    frame: &mut Frame,
    fixation: &Fixation,
    timestamp: f64,
    base_radius: i32,
    color: Rgb<u8>,
    regions: &[TextRegion],
    highlight: Option<Rgb<u8>>,
) {
    if fixation.start_ms > timestamp {
        return; // too early
    }
    let Some((x, y)) = fixation.point() else {
        return;
    };
    if let Some(highlight_color) = highlight {
        if let Some(region) = regions.iter().find(|r| r.contains(x, y)) {
            highlight_region(frame, region, highlight_color);
        }
    }
    let elapsed_ms = timestamp - fixation.start_ms;
    let radius = base_radius + (elapsed_ms / 50.0) as i32;
    draw_point(frame, x, y, radius, color, 100.0);
}

/// Draws the active saccade as segments joining consecutive members. A
/// saccade appears all at once, the first time its first sample is reached.
pub fn draw_saccade(frame: &mut Frame, saccade: &Saccade, timestamp: f64, color: Rgb<u8>) {
    if (saccade.start_time() as f64) > timestamp {
        return;
    }
    for pair in saccade.samples().windows(2) {
        if let (Some(a), Some(b)) = (pair[0].point(), pair[1].point()) {
            draw_line(frame, a, b, color, 100.0);
        }
    }
}
