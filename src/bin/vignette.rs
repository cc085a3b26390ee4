use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use vignette::config::{ConfigDelta, EncoderKind, ScopedConfig};
use vignette::dispatch::process::WorkerReport;
use vignette::{
    Artifact, ExecutionContext, FrameIndex, RenderPermit, RenderSession, Scene, VignetteResult,
};

#[derive(Parser, Debug)]
#[command(name = "vignette", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a scene into a multi-frame artifact.
    Render(RenderArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum EncoderArg {
    /// Raw multi-frame container.
    Raw,
    /// MP4 via the system `ffmpeg`.
    Mp4,
}

impl From<EncoderArg> for EncoderKind {
    fn from(arg: EncoderArg) -> Self {
        match arg {
            EncoderArg::Raw => Self::Raw,
            EncoderArg::Mp4 => Self::Mp4,
        }
    }
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input scene JSON; defaults to the built-in circle reveal.
    #[arg(long = "scene")]
    scene_path: Option<PathBuf>,

    /// Output artifact path. Its directory must already exist.
    #[arg(long)]
    out: PathBuf,

    /// Encoder used for the artifact.
    #[arg(long, value_enum, default_value_t = EncoderArg::Raw)]
    encoder: EncoderArg,

    /// Overwrite the output if it already exists.
    #[arg(long, default_value_t = true)]
    overwrite: bool,

    /// Run as a pooled worker under this process name.
    #[arg(long)]
    process_name: Option<String>,

    /// Print a one-line JSON report on stdout (worker protocol).
    #[arg(long, default_value_t = false)]
    report_json: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input scene JSON; defaults to the built-in circle reveal.
    #[arg(long = "scene")]
    scene_path: Option<PathBuf>,

    /// Frame index (0-based) within the scene timeline.
    #[arg(long, default_value_t = 0)]
    frame: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn load_scene(path: &Option<PathBuf>) -> VignetteResult<Scene> {
    match path {
        Some(p) => Scene::from_path(p),
        None => Ok(Scene::circle_reveal()),
    }
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let ctx = match &args.process_name {
        Some(name) => ExecutionContext::process(name.clone()),
        None => ExecutionContext::main(),
    };

    let outcome = render_outcome(&args, &ctx);
    if args.report_json {
        let report = WorkerReport::from_outcome(&outcome);
        println!("{}", serde_json::to_string(&report)?);
    }

    match outcome {
        Ok(artifact) => {
            eprintln!(
                "wrote {} ({} frames, {} plays)",
                artifact.path.display(),
                artifact.frames,
                artifact.plays
            );
            Ok(())
        }
        Err(err) => {
            if args.report_json {
                // The report already carries the failure; exit non-zero
                // without duplicating it on stderr.
                std::process::exit(1);
            }
            Err(err.into())
        }
    }
}

fn render_outcome(args: &RenderArgs, ctx: &ExecutionContext) -> VignetteResult<Artifact> {
    let scene = load_scene(&args.scene_path)?;
    let delta = ConfigDelta::new()
        .output_file(args.out.clone())
        .encoder(args.encoder.into())
        .overwrite(args.overwrite);
    let scope = ScopedConfig::enter(delta)?;

    let permit = RenderPermit::acquire(ctx)?;
    let mut session = RenderSession::new(scene);
    let artifact = session.render(&permit)?;
    scope.verify_artifact()?;
    Ok(artifact)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let scene = load_scene(&args.scene_path)?;
    let frame = scene.still_frame(FrameIndex(args.frame))?;

    if let Some(parent) = args.out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
    }

    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
