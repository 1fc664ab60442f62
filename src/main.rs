use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;

use gaze_replay::args::Args;
use gaze_replay::config::AppConfig;
use gaze_replay::pipeline::{RenderOptions, Renderer};
use gaze_replay::saccade::segment_saccades;
use gaze_replay::session::Session;
use gaze_replay::types::Frame;

fn main() -> Result<()> {
    let args = Args::parse();

    // 0. Load Config
    let config = AppConfig::load()?;
    let mut options = RenderOptions::from(&config);
    if let Some(stretch) = args.stretch {
        options.stretch = stretch;
    }
    if args.no_saccades {
        options.draw_saccades = false;
    }
    if args.no_fixations {
        options.draw_fixations = false;
    }

    // 1. Load Session
    let t = Instant::now();
    print!("Gathering Gazes, ");
    let session = Session::load(&args.session)?;
    println!(
        "Len: {} gazes / {} fixations, Elapsed: {:.2?}",
        session.gazes.len(),
        session.fixations.len(),
        t.elapsed()
    );

    // 2. Segment Saccades
    let t = Instant::now();
    print!("Gathering Saccades, ");
    let saccades = segment_saccades(&session.gazes, &session.fixation_member_times);
    println!("Len: {}, Elapsed: {:.2?}", saccades.len(), t.elapsed());

    // 3. Collect Frames
    let frame_paths = list_frames(&args.frames)?;
    if frame_paths.is_empty() {
        bail!("no PNG frames found in {}", args.frames.display());
    }
    println!("Frames: {} at {} fps", frame_paths.len(), args.fps);

    let video_secs = frame_paths.len() as f64 / args.fps;
    if (session.time_length_secs() - video_secs).abs() >= 1.0 {
        println!(
            "{}",
            format!(
                "Warning: session length ({:.1}s) does not match video length ({:.1}s)",
                session.time_length_secs(),
                video_secs
            )
            .yellow()
        );
    }

    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create output directory {}", args.out.display()))?;

    // 4. Render Loop
    let mut renderer = Renderer::new(
        &session.gazes,
        &session.fixations,
        &saccades,
        session.start_time_ms,
        args.fps,
        options,
    );

    let start = Instant::now();
    let total_out = frame_paths.len() * renderer.stretch() as usize;
    let mut written = 0usize;
    let mut last_report = Instant::now();

    println!("Writing Video");
    for (frame_index, path) in frame_paths.iter().enumerate() {
        let frame: Frame = image::open(path)
            .with_context(|| format!("failed to decode frame {}", path.display()))?
            .into_rgb8();

        for composited in renderer.render_frame(&frame, frame_index as u64) {
            let out_path = args.out.join(format!("frame_{:06}.png", written));
            composited
                .save(&out_path)
                .with_context(|| format!("failed to write {}", out_path.display()))?;
            written += 1;
        }

        if last_report.elapsed().as_secs() >= 15 {
            last_report = Instant::now();
            println!("{:.2}%", written as f64 / total_out as f64 * 100.0);
        }
    }

    println!(
        "{}",
        format!("DONE! Wrote {} frames in {:.2?}", written, start.elapsed()).green()
    );
    Ok(())
}

/// PNG files of the frame directory in name order, which is how decoded
/// frame dumps are numbered.
fn list_frames(dir: &PathBuf) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read frame directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png")))
        .collect();
    paths.sort();
    Ok(paths)
}
