use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use storyreel::OverlayRenderer as _;

#[derive(Parser, Debug)]
#[command(name = "storyreel", version)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence when set).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Narrate a story, pick a background video and render the subtitled result.
    Create(CreateArgs),
    /// Render with an existing narration audio file.
    Compose(ComposeArgs),
    /// Print the subtitle timeline for a story.
    Timeline(TimelineArgs),
    /// Render one subtitle overlay as a PNG.
    Overlay(OverlayArgs),
}

#[derive(Parser, Debug)]
struct CreateArgs {
    /// Story text file.
    story: PathBuf,

    /// Folder of background videos; one is picked at random.
    video_folder: PathBuf,

    /// Output MP4 path. A bare file name is placed under `output/`.
    output: PathBuf,

    /// Piper executable.
    #[arg(long)]
    piper_path: Option<PathBuf>,

    /// Piper voice model (`.onnx`).
    #[arg(long)]
    voice_model: Option<PathBuf>,

    /// Session config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not burn subtitles into the video.
    #[arg(long)]
    no_subtitles: bool,

    /// Also split the result into pieces of this many seconds (e.g. 15, 30, 60).
    #[arg(long)]
    segment_duration: Option<u32>,

    /// Write the subtitle timeline as SubRip.
    #[arg(long)]
    srt: Option<PathBuf>,

    /// Maximum parallel overlay workers.
    #[arg(long)]
    workers: Option<usize>,

    /// Skip the GPU narration attempt.
    #[arg(long)]
    no_gpu: bool,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Story text file.
    #[arg(long)]
    text_file: PathBuf,

    /// Background video.
    #[arg(long)]
    video: PathBuf,

    /// Narration audio.
    #[arg(long)]
    audio: PathBuf,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,

    /// Write the subtitle timeline as SubRip.
    #[arg(long)]
    srt: Option<PathBuf>,

    /// Session config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct TimelineArgs {
    /// Story text file.
    story: PathBuf,

    /// Narration duration in seconds.
    #[arg(long)]
    duration: f64,

    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Session config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct OverlayArgs {
    /// Subtitle text.
    #[arg(long)]
    text: String,

    #[arg(long)]
    width: u32,

    #[arg(long)]
    height: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Print the resolved font family and the number of faces found.
    #[arg(long)]
    dump_fonts: bool,

    /// Session config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Create(args) => cmd_create(args),
        Command::Compose(args) => cmd_compose(args),
        Command::Timeline(args) => cmd_timeline(args),
        Command::Overlay(args) => cmd_overlay(args),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<storyreel::SessionConfig> {
    let mut cfg = match path {
        Some(p) => storyreel::SessionConfig::load(p)
            .with_context(|| format!("load config '{}'", p.display()))?,
        None => storyreel::SessionConfig::default(),
    };
    cfg.apply_env();
    Ok(cfg)
}

fn cmd_create(args: CreateArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(piper) = args.piper_path {
        cfg.narration.piper_path = piper;
    }
    if let Some(model) = args.voice_model {
        anyhow::ensure!(
            model.is_file(),
            "voice model not found: {}",
            model.display()
        );
        cfg.narration.voice_model = Some(model);
    }
    if args.no_gpu {
        cfg.narration.use_gpu = false;
    }
    if args.no_subtitles {
        cfg.subtitles = false;
    }
    if let Some(n) = args.workers {
        cfg.max_workers = n;
    }

    anyhow::ensure!(
        args.story.is_file(),
        "story file not found: {}",
        args.story.display()
    );
    anyhow::ensure!(
        args.video_folder.is_dir(),
        "video folder not found: {}",
        args.video_folder.display()
    );

    let session = storyreel::StorySession::new(cfg)?;
    let piper = session.piper();
    let out = session.create_story_video(
        &args.story,
        &args.video_folder,
        &args.output,
        &piper,
        args.segment_duration.map(f64::from),
        args.srt.as_deref(),
    )?;

    eprintln!("background {}", out.background.display());
    eprintln!("wrote {}", out.video.display());
    if let Some(set) = out.segments {
        eprintln!(
            "wrote {} segments to {}",
            set.segments.len(),
            set.folder.display()
        );
    }
    Ok(())
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let text = storyreel::read_story(&args.text_file)?;

    let session = storyreel::StorySession::new(cfg)?;
    let mut request = storyreel::RenderRequest::new(
        storyreel::StoryInput::Text(text),
        &args.video,
        &args.audio,
        &args.out,
    );
    request.srt_path = args.srt;
    let out = session.render(&request)?;

    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_timeline(args: TimelineArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let text = storyreel::read_story(&args.story)?;
    let fragments = storyreel::segment(&text, &cfg.segmentation);
    let timeline = storyreel::allocate(&fragments, args.duration, &cfg.timeline)?;

    if args.json {
        let json = serde_json::to_string_pretty(&timeline).context("serialize timeline")?;
        println!("{json}");
        return Ok(());
    }

    for (i, t) in timeline.iter().enumerate() {
        println!(
            "{:>3}  {:>8.3}  {:>8.3}  {:<8}  {}",
            i,
            t.start,
            t.end(),
            format!("{:?}", t.fragment.kind).to_lowercase(),
            t.text()
        );
    }
    Ok(())
}

fn cmd_overlay(args: OverlayArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let size = storyreel::FrameSize::new(args.width, args.height)?;

    let fonts = Arc::new(storyreel::FontCache::new(&cfg.fonts));
    if args.dump_fonts {
        eprintln!("font diagnostics:");
        eprintln!("  faces:  {}", fonts.face_count());
        let font_px = cfg.overlay.font_size_for(size);
        match fonts.get(font_px) {
            Ok(handle) => {
                eprintln!("  family: {}", handle.family);
                eprintln!("  size:   {font_px}px");
            }
            Err(e) => eprintln!("  family: unresolved ({e})"),
        }
    }

    let renderer = storyreel::TextOverlayRenderer::new(fonts, cfg.overlay.clone());
    let mut scratch = renderer.scratch();
    let image = renderer.render(&mut scratch, &args.text, size)?;

    storyreel::ensure_parent_dir(&args.out)?;
    image
        .save_png(&args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}
