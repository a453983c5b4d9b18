//! Stage Preview viewer.
//!
//! Opens a window on a scene directory and lets the placed objects be
//! picked, dragged and flown through.

mod app;

use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "stagepreview", version, about = "Interactive preview of a placed scene")]
pub struct Args {
    /// Scene directory that model and texture paths are relative to.
    scene_root: PathBuf,
    /// Preview settings (JSON).
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Scene document with the placed objects (JSON).
    #[arg(long)]
    document: Option<PathBuf>,
    /// Rail paths (JSON).
    #[arg(long)]
    rails: Option<PathBuf>,
    /// Demo camera animation (JSON).
    #[arg(long)]
    demo: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();
    if let Err(err) = app::run(args) {
        log::error!("{err}");
        std::process::exit(1);
    }
}
