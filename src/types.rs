use image::{ImageBuffer, Rgb};

/// A decoded video frame, 8-bit RGB.
pub type Frame = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// One raw eye-tracker reading: a screen point on the playback clock.
///
/// `system_time` (milliseconds) is the sort and lookup key; within a session
/// samples are non-decreasing in it. `x`/`y` may be NaN when the tracker lost
/// the eyes, so every consumer goes through [`GazeSample::point`] instead of
/// touching the coordinates directly.
#[derive(Debug, Clone)]
pub struct GazeSample {
    pub event_time: i64,
    pub system_time: i64,
    pub x: f64,
    pub y: f64,
    pub raw: EyeRaw,
}

/// Per-eye raw tracker fields. Carried through untouched; nothing in the
/// renderer reads them.
#[derive(Debug, Clone, Default)]
pub struct EyeRaw {
    pub left_x: Option<f64>,
    pub left_y: Option<f64>,
    pub left_pupil_diameter: Option<f64>,
    pub left_validation: Option<i64>,
    pub right_x: Option<f64>,
    pub right_y: Option<f64>,
    pub right_pupil_diameter: Option<f64>,
    pub right_validation: Option<i64>,
}

impl GazeSample {
    /// Drawable screen position, or `None` when either coordinate is not a
    /// finite number. A `None` means "skip this sample", never an error.
    pub fn point(&self) -> Option<(f32, f32)> {
        if self.x.is_finite() && self.y.is_finite() {
            Some((self.x as f32, self.y as f32))
        } else {
            None
        }
    }

    pub fn is_nan(&self) -> bool {
        self.point().is_none()
    }
}

/// Converts a Windows FILETIME (100-nanosecond ticks since 1601-01-01) to
/// milliseconds since the Unix epoch, the clock gaze `system_time` lives on.
pub fn convert_windows_time(t: i64) -> f64 {
    ((t as f64 / 10_000_000.0) - 11_644_473_600.0) * 1000.0
}

/// A derived dwell event: prolonged gaze stability at one point.
///
/// `start_event_time` is on the tracker clock and is converted to the
/// playback clock once, at construction.
#[derive(Debug, Clone)]
pub struct Fixation {
    pub fixation_id: i64,
    pub run_id: i64,
    pub start_event_time: i64,
    pub x: f64,
    pub y: f64,
    pub duration_ms: i64,
    /// Start on the playback clock (ms since Unix epoch).
    pub start_ms: f64,
    /// `start_ms + duration_ms`.
    pub end_ms: f64,
}

impl Fixation {
    pub fn new(
        fixation_id: i64,
        run_id: i64,
        start_event_time: i64,
        x: f64,
        y: f64,
        duration_ms: i64,
    ) -> Self {
        let start_ms = convert_windows_time(start_event_time);
        Self {
            fixation_id,
            run_id,
            start_event_time,
            x,
            y,
            duration_ms,
            start_ms,
            end_ms: start_ms + duration_ms as f64,
        }
    }

    /// Drawable screen position, same skip semantics as [`GazeSample::point`].
    pub fn point(&self) -> Option<(f32, f32)> {
        if self.x.is_finite() && self.y.is_finite() {
            Some((self.x as f32, self.y as f32))
        } else {
            None
        }
    }
}

/// A rapid eye movement between two fixations, represented as its constituent
/// valid gaze samples. Non-empty and immutable once built.
#[derive(Debug, Clone)]
pub struct Saccade {
    samples: Vec<GazeSample>,
}

impl Saccade {
    pub(crate) fn new(samples: Vec<GazeSample>) -> Self {
        debug_assert!(!samples.is_empty(), "saccades are never empty");
        Self { samples }
    }

    pub fn samples(&self) -> &[GazeSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// `system_time` of the first member; a saccade becomes visible only once
    /// playback reaches this.
    pub fn start_time(&self) -> i64 {
        self.samples[0].system_time
    }

    /// `system_time` of the last member; orders saccades on the timeline.
    pub fn end_time(&self) -> i64 {
        self.samples[self.samples.len() - 1].system_time
    }
}

/// Axis-aligned bounding box of one detected text line, in frame pixels.
/// Regions carry no identity; the whole list is rebuilt on recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRegion {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl TextRegion {
    pub fn height(&self) -> u32 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.min_x as f32
            && x <= self.max_x as f32
            && y >= self.min_y as f32
            && y <= self.max_y as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(system_time: i64, x: f64, y: f64) -> GazeSample {
        GazeSample {
            event_time: system_time,
            system_time,
            x,
            y,
            raw: EyeRaw::default(),
        }
    }

    #[test]
    fn test_gaze_point_skips_nan() {
        assert_eq!(sample(0, 10.0, 20.0).point(), Some((10.0, 20.0)));
        assert_eq!(sample(0, f64::NAN, 20.0).point(), None);
        assert_eq!(sample(0, 10.0, f64::NAN).point(), None);
        assert_eq!(sample(0, f64::INFINITY, 20.0).point(), None);
        assert!(sample(0, f64::NAN, f64::NAN).is_nan());
    }

    #[test]
    fn test_convert_windows_time_epoch() {
        // 1601-01-01 in ticks is exactly -11644473600000 ms before Unix epoch.
        assert_eq!(convert_windows_time(0), -11_644_473_600_000.0);
        // 1970-01-01 in ticks maps to 0 ms.
        assert_eq!(convert_windows_time(116_444_736_000_000_000), 0.0);
    }

    #[test]
    fn test_convert_windows_time_monotonic() {
        let mut prev = f64::NEG_INFINITY;
        for i in 0..1000i64 {
            let t = 116_444_736_000_000_000 + i * 10_000;
            let ms = convert_windows_time(t);
            assert!(ms > prev, "conversion must be strictly monotonic");
            prev = ms;
        }
    }

    #[test]
    fn test_fixation_end_time() {
        let fix = Fixation::new(1, 1, 116_444_736_000_000_000, 5.0, 5.0, 250);
        assert_eq!(fix.start_ms, 0.0);
        assert_eq!(fix.end_ms, 250.0);
    }

    #[test]
    fn test_region_contains() {
        let region = TextRegion { min_x: 10, min_y: 20, max_x: 30, max_y: 25 };
        assert!(region.contains(10.0, 20.0));
        assert!(region.contains(30.0, 25.0));
        assert!(region.contains(15.0, 22.0));
        assert!(!region.contains(9.9, 22.0));
        assert!(!region.contains(15.0, 25.1));
        assert_eq!(region.height(), 5);
    }
}
