use image::Rgb;

use crate::config::{parse_hex, AppConfig};
use crate::detector::detect_regions;
use crate::overlay;
use crate::playback::StreamCursor;
use crate::types::{Fixation, Frame, GazeSample, Saccade, TextRegion};

/// Resolved rendering parameters, decoupled from the on-disk config shape.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub rolling_window_ms: f64,
    pub stretch: u32,
    pub gaze_radius: i32,
    pub fixation_radius: i32,
    pub draw_gazes: bool,
    pub draw_fixations: bool,
    pub draw_saccades: bool,
    pub highlight_enabled: bool,
    pub gaze_color: Rgb<u8>,
    pub fixation_color: Rgb<u8>,
    pub saccade_color: Rgb<u8>,
    pub highlight_color: Rgb<u8>,
}

impl From<&AppConfig> for RenderOptions {
    fn from(config: &AppConfig) -> Self {
        let rgb = |hex: &str| {
            let (r, g, b) = parse_hex(hex);
            Rgb([r, g, b])
        };
        Self {
            rolling_window_ms: config.playback.rolling_window_ms,
            stretch: config.playback.stretch,
            gaze_radius: config.playback.gaze_radius,
            fixation_radius: config.playback.fixation_radius,
            draw_gazes: config.playback.draw_gazes,
            draw_fixations: config.playback.draw_fixations,
            draw_saccades: config.playback.draw_saccades,
            highlight_enabled: config.playback.highlight_enabled,
            gaze_color: rgb(&config.colors.gaze_hex),
            fixation_color: rgb(&config.colors.fixation_hex),
            saccade_color: rgb(&config.colors.saccade_hex),
            highlight_color: rgb(&config.colors.highlight_hex),
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        (&AppConfig::default()).into()
    }
}

/// Drives one playback pass: owns the cursors, the last raw frame, and the
/// current text-region list, and composites overlays onto each frame the
/// caller feeds it. Frames must arrive in order; cursors never move backward
/// within a pass.
pub struct Renderer<'a> {
    gazes: &'a [GazeSample],
    fixations: &'a [Fixation],
    saccades: &'a [Saccade],
    gaze_cursor: StreamCursor,
    fixation_cursor: StreamCursor,
    saccade_cursor: StreamCursor,
    regions: Vec<TextRegion>,
    previous_frame: Option<Frame>,
    session_start_ms: f64,
    frame_step_ms: f64,
    options: RenderOptions,
}

impl<'a> Renderer<'a> {
    pub fn new(
        gazes: &'a [GazeSample],
        fixations: &'a [Fixation],
        saccades: &'a [Saccade],
        session_start_ms: f64,
        fps: f64,
        options: RenderOptions,
    ) -> Self {
        Self {
            gazes,
            fixations,
            saccades,
            gaze_cursor: StreamCursor::new(gazes.len()),
            fixation_cursor: StreamCursor::new(fixations.len()),
            saccade_cursor: StreamCursor::new(saccades.len()),
            regions: Vec::new(),
            previous_frame: None,
            session_start_ms,
            frame_step_ms: 1000.0 / fps,
            options,
        }
    }

    pub fn stretch(&self) -> u32 {
        self.options.stretch.max(1)
    }

    /// Timestamp of one sub-frame tick, computed directly from the indices.
    /// Accumulating the step instead would drift over a multi-minute video.
    fn sub_frame_timestamp(&self, frame_index: u64, sub: u32) -> f64 {
        self.session_start_ms
            + self.frame_step_ms * frame_index as f64
            + (self.frame_step_ms / self.stretch() as f64) * sub as f64
    }

    pub fn regions(&self) -> &[TextRegion] {
        &self.regions
    }

    /// Composites one decoded frame into `stretch` output frames, one per
    /// sub-frame tick. Exhausted streams simply stop drawing; nothing here
    /// fails per-frame.
    pub fn render_frame(&mut self, frame: &Frame, frame_index: u64) -> Vec<Frame> {
        // Regions are recomputed only when the frame changed enough; the
        // detector sees the raw frame, never the composited one.
        self.regions = detect_regions(
            frame,
            self.previous_frame.as_ref(),
            std::mem::take(&mut self.regions),
        );
        self.previous_frame = Some(frame.clone());

        let stretch = self.stretch();
        let mut out = Vec::with_capacity(stretch as usize);
        for sub in 0..stretch {
            let timestamp = self.sub_frame_timestamp(frame_index, sub);
            let mut composited = frame.clone();
            self.composite(&mut composited, timestamp);
            out.push(composited);
        }
        out
    }

    /// One sub-frame tick: saccades under gaze under fixation-with-highlight.
    fn composite(&mut self, frame: &mut Frame, timestamp: f64) {
        if self.options.draw_saccades {
            if let Some(idx) = self.saccade_cursor.advance(self.saccades, timestamp) {
                overlay::draw_saccade(
                    frame,
                    &self.saccades[idx],
                    timestamp,
                    self.options.saccade_color,
                );
            }
        }

        if self.options.draw_gazes {
            if let Some(idx) = self.gaze_cursor.advance(self.gazes, timestamp) {
                let window = self.gaze_cursor.advance_window(
                    self.gazes,
                    timestamp,
                    self.options.rolling_window_ms,
                );
                overlay::draw_gaze_window(
                    frame,
                    self.gazes,
                    window,
                    idx,
                    self.options.gaze_radius,
                    self.options.gaze_color,
                );
            }
        }

        if self.options.draw_fixations {
            if let Some(idx) = self.fixation_cursor.advance(self.fixations, timestamp) {
                let window = self.fixation_cursor.advance_window(
                    self.fixations,
                    timestamp,
                    self.options.rolling_window_ms,
                );
                overlay::draw_fixation_window(
                    frame,
                    self.fixations,
                    window,
                    timestamp,
                    self.options.rolling_window_ms,
                    self.options.fixation_radius,
                    self.options.fixation_color,
                );
                let highlight = self
                    .options
                    .highlight_enabled
                    .then_some(self.options.highlight_color);
                overlay::draw_current_fixation(
                    frame,
                    &self.fixations[idx],
                    timestamp,
                    self.options.fixation_radius,
                    self.options.fixation_color,
                    &self.regions,
                    highlight,
                );
            }
        }
    }
}
