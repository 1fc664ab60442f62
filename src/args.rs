use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Session export (JSON) with gazes, fixations and fixation membership
    #[arg(short, long)]
    pub session: PathBuf,

    /// Directory of decoded video frames (PNG), ordered by file name
    #[arg(short, long)]
    pub frames: PathBuf,

    /// Frame rate of the source video
    #[arg(long, default_value_t = 30.0)]
    pub fps: f64,

    /// Output directory for composited frames
    #[arg(short, long, default_value = "out")]
    pub out: PathBuf,

    /// Override the configured sub-frame stretch factor
    #[arg(long)]
    pub stretch: Option<u32>,

    /// Skip drawing saccades for this run
    #[arg(long)]
    pub no_saccades: bool,

    /// Skip drawing fixations for this run
    #[arg(long)]
    pub no_fixations: bool,
}
