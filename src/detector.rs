use std::collections::{HashMap, VecDeque};

use crate::types::{Frame, TextRegion};

/// Fraction of changed pixels (in percent) above which the region list is
/// recomputed. Detection is by far the most expensive per-frame operation,
/// so most frames must reuse the previous list.
const CHANGE_THRESHOLD_PERCENT: f64 = 5.0;

/// Structuring element for the dilation step: wide and short, so individual
/// glyphs merge into line-level blobs without bridging adjacent lines.
const DILATE_WIDTH: i32 = 20;
const DILATE_HEIGHT: i32 = 3;

/// Brightness subtracted after grayscaling, pushing faint background texture
/// below the binarization threshold.
const DARKEN: u8 = 100;

/// Marker for pixels already claimed by a detected component.
const CONSUMED: u8 = 128;
const FOREGROUND: u8 = 255;

/// Decides whether the on-screen text layout changed enough to re-detect and
/// returns either `regions` unchanged or a freshly computed list.
///
/// `previous = None` (the first frame of a pass) counts as maximal difference
/// and always recomputes: the reference for "no previous frame" is the
/// bitwise inverse of the current frame, which differs at every pixel.
pub fn detect_regions(
    current: &Frame,
    previous: Option<&Frame>,
    regions: Vec<TextRegion>,
) -> Vec<TextRegion> {
    if changed_percent(current, previous) > CHANGE_THRESHOLD_PERCENT {
        compute_regions(current)
    } else {
        regions
    }
}

/// Percentage of bytes that differ between the two frames.
fn changed_percent(current: &Frame, previous: Option<&Frame>) -> f64 {
    let cur = current.as_raw();
    match previous {
        Some(prev) if prev.dimensions() == current.dimensions() => {
            let changed = cur
                .iter()
                .zip(prev.as_raw().iter())
                .filter(|(a, b)| a != b)
                .count();
            changed as f64 * 100.0 / cur.len() as f64
        }
        // No previous frame, or a resolution change mid-stream: no byte of
        // `255 - v` ever equals `v`, so the inverse reference differs
        // everywhere.
        _ => 100.0,
    }
}

/// Full detection pass over one frame: invert, grayscale, darken, binarize
/// (Otsu), dilate, then collect connected components and keep the ones whose
/// height sits near the dominant line height.
fn compute_regions(frame: &Frame) -> Vec<TextRegion> {
    let (width, height) = frame.dimensions();
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 {
        return Vec::new();
    }

    // Invert + grayscale + darken in one pass. Inversion puts glyph strokes
    // above the background in the luma channel.
    let mut gray = vec![0u8; w * h];
    for (i, pixel) in frame.pixels().enumerate() {
        let r = (255 - pixel[0]) as u32;
        let g = (255 - pixel[1]) as u32;
        let b = (255 - pixel[2]) as u32;
        let luma = ((r * 299 + g * 587 + b * 114) / 1000) as u8;
        gray[i] = luma.saturating_sub(DARKEN);
    }

    let threshold = otsu_threshold(&gray);
    let mut mask: Vec<u8> = gray
        .iter()
        .map(|&v| if v > threshold { FOREGROUND } else { 0 })
        .collect();

    dilate_rect(&mut mask, w, h);

    let mut boxes = Vec::new();
    for y in 0..h {
        for x in 0..w {
            if mask[y * w + x] == FOREGROUND {
                boxes.push(flood_fill(&mut mask, w, h, x, y));
            }
        }
    }

    filter_by_modal_height(boxes)
}

/// Variance-maximizing (Otsu) threshold over an 8-bit grayscale buffer.
fn otsu_threshold(gray: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &v in gray {
        histogram[v as usize] += 1;
    }
    let total = gray.len() as f64;
    let sum_all: f64 = histogram
        .iter()
        .enumerate()
        .map(|(v, &c)| v as f64 * c as f64)
        .sum();

    let mut sum_bg = 0.0;
    let mut weight_bg = 0.0;
    let mut best_variance = 0.0;
    let mut best_threshold = 0u8;

    for t in 0..256 {
        weight_bg += histogram[t] as f64;
        if weight_bg == 0.0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0.0 {
            break;
        }
        sum_bg += t as f64 * histogram[t] as f64;
        let mean_bg = sum_bg / weight_bg;
        let mean_fg = (sum_all - sum_bg) / weight_fg;
        let variance = weight_bg * weight_fg * (mean_bg - mean_fg) * (mean_bg - mean_fg);
        if variance > best_variance {
            best_variance = variance;
            best_threshold = t as u8;
        }
    }
    best_threshold
}

/// Morphological dilation with a `DILATE_WIDTH` x `DILATE_HEIGHT` rectangular
/// kernel, done as two separable passes.
fn dilate_rect(mask: &mut [u8], w: usize, h: usize) {
    // Kernel anchored at its center; even width covers one more pixel to the
    // left than to the right.
    let (left, right) = (DILATE_WIDTH / 2, DILATE_WIDTH - DILATE_WIDTH / 2 - 1);
    let (up, down) = (DILATE_HEIGHT / 2, DILATE_HEIGHT - DILATE_HEIGHT / 2 - 1);

    let mut horizontal = vec![0u8; w * h];
    for y in 0..h {
        let row = &mask[y * w..(y + 1) * w];
        for x in 0..w {
            let lo = (x as i32 - left).max(0) as usize;
            let hi = ((x as i32 + right) as usize).min(w - 1);
            if row[lo..=hi].contains(&FOREGROUND) {
                horizontal[y * w + x] = FOREGROUND;
            }
        }
    }

    for y in 0..h {
        let lo = (y as i32 - up).max(0) as usize;
        let hi = ((y as i32 + down) as usize).min(h - 1);
        for x in 0..w {
            let mut v = 0;
            for yy in lo..=hi {
                if horizontal[yy * w + x] == FOREGROUND {
                    v = FOREGROUND;
                    break;
                }
            }
            mask[y * w + x] = v;
        }
    }
}

/// 4-connected breadth-first flood fill from `(x, y)`, with an explicit queue
/// (recursion would blow the stack at frame resolution). Marks the component
/// and then its entire bounding rectangle as consumed, so the rectangle — not
/// just the blob shape — is what the detector reports and never revisits.
fn flood_fill(mask: &mut [u8], w: usize, h: usize, x: usize, y: usize) -> TextRegion {
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (x, y, x, y);
    let mut queue = VecDeque::new();
    queue.push_back((x, y));

    while let Some((x, y)) = queue.pop_front() {
        let idx = y * w + x;
        if mask[idx] != FOREGROUND {
            continue;
        }
        mask[idx] = CONSUMED;
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
        if y > 0 {
            queue.push_back((x, y - 1));
        }
        if y < h - 1 {
            queue.push_back((x, y + 1));
        }
        if x > 0 {
            queue.push_back((x - 1, y));
        }
        if x < w - 1 {
            queue.push_back((x + 1, y));
        }
    }

    for yy in min_y..=max_y {
        for xx in min_x..=max_x {
            mask[yy * w + xx] = CONSUMED;
        }
    }

    TextRegion {
        min_x: min_x as u32,
        min_y: min_y as u32,
        max_x: max_x as u32,
        max_y: max_y as u32,
    }
}

/// Keeps the boxes whose height is within (mode/2, mode*1.5) of the modal
/// box height. Most on-screen text shares one line height, so stray dilated
/// dots and oversized merged blobs fall outside this band.
fn filter_by_modal_height(boxes: Vec<TextRegion>) -> Vec<TextRegion> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for b in &boxes {
        *counts.entry(b.height()).or_insert(0) += 1;
    }
    // Ties break toward the taller height so the result is deterministic.
    let mode = match counts.iter().max_by_key(|&(h, c)| (*c, *h)) {
        Some((&h, _)) => h as f64,
        None => return boxes,
    };
    boxes
        .into_iter()
        .filter(|b| {
            let h = b.height() as f64;
            h > mode / 2.0 && h < mode * 1.5
        })
        .collect()
}
