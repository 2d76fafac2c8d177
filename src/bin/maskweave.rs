use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "maskweave", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a composite mask and print the visible instance ids.
    InspectMask(InspectMaskArgs),
    /// Remove transient per-object solo files for one frame.
    Clean(CleanArgs),
    /// Print the engine parameters a quality tier maps to.
    Params(ParamsArgs),
}

#[derive(Parser, Debug)]
struct InspectMaskArgs {
    /// Composite mask PNG (pixel values encode instance indices).
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct CleanArgs {
    /// Output directory to reconcile.
    #[arg(long)]
    dir: PathBuf,

    /// Output slot template, with `#` as the frame placeholder
    /// (e.g. `0000000001-#-RGBCamera`).
    #[arg(long)]
    slot: String,

    /// Frame number.
    #[arg(long)]
    frame: u64,
}

#[derive(Parser, Debug)]
struct ParamsArgs {
    /// Quality tier.
    #[arg(long, value_enum)]
    tier: maskweave::QualityTier,

    /// Configured render width in pixels.
    #[arg(long)]
    width: u32,

    /// Configured render height in pixels.
    #[arg(long)]
    height: u32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::InspectMask(args) => cmd_inspect_mask(args),
        Command::Clean(args) => cmd_clean(args),
        Command::Params(args) => cmd_params(args),
    }
}

fn cmd_inspect_mask(args: InspectMaskArgs) -> anyhow::Result<()> {
    let ids = maskweave::visible_instances(&args.in_path)
        .with_context(|| format!("inspect mask '{}'", args.in_path.display()))?;

    if ids.is_empty() {
        eprintln!("no visible instances");
        return Ok(());
    }
    for id in &ids {
        println!("{} ({})", id, id.solo_mask_id());
    }
    eprintln!("{} visible instance(s)", ids.len());
    Ok(())
}

fn cmd_clean(args: CleanArgs) -> anyhow::Result<()> {
    let removed = maskweave::remove_solo_artifacts(
        &args.dir,
        &args.slot,
        maskweave::FrameNumber(args.frame),
    )
    .with_context(|| format!("reconcile '{}'", args.dir.display()))?;

    eprintln!("removed {removed} file(s)");
    Ok(())
}

fn cmd_params(args: ParamsArgs) -> anyhow::Result<()> {
    let params = maskweave::params_for(
        args.tier,
        maskweave::Resolution::new(args.width, args.height).clamped(),
    );
    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}
