use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "studiocast", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite a single frame as a PNG.
    Frame(FrameArgs),
    /// Record a timed headless take (requires `ffmpeg` on PATH).
    Record(RecordArgs),
    /// Print detected devices and the selected encoder.
    Probe,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Scene/config JSON; defaults are used when omitted.
    #[arg(long = "scene")]
    scene_path: Option<PathBuf>,

    /// PDF whose current page fills the slide region.
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Page to show (1-based).
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct RecordArgs {
    /// Scene/config JSON; defaults are used when omitted.
    #[arg(long = "scene")]
    scene_path: Option<PathBuf>,

    /// PDF whose first page fills the slide region.
    #[arg(long)]
    pdf: Option<PathBuf>,

    /// Recording length in seconds.
    #[arg(long, default_value_t = 5.0)]
    duration: f64,

    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Directory the timestamped recording lands in.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// ffmpeg audio input format (e.g. `pulse`); omit to record video only.
    #[arg(long)]
    audio_format: Option<String>,

    /// ffmpeg audio input device, used with --audio-format.
    #[arg(long, default_value = "default")]
    audio_device: String,
}

/// On-disk scene description for the headless commands.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SceneFile {
    scene: studiocast::Scene,
    config: studiocast::VisualConfig,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Record(args) => cmd_record(args),
        Command::Probe => cmd_probe(),
    }
}

fn read_scene_file(path: Option<&Path>) -> anyhow::Result<SceneFile> {
    let Some(path) = path else {
        return Ok(SceneFile::default());
    };
    let f = File::open(path).with_context(|| format!("open scene '{}'", path.display()))?;
    let file: SceneFile =
        serde_json::from_reader(BufReader::new(f)).with_context(|| "parse scene JSON")?;
    file.config.validate()?;
    Ok(file)
}

fn build_studio(
    scene_path: Option<&Path>,
    pdf: Option<&Path>,
    page: u32,
) -> anyhow::Result<studiocast::Studio> {
    let file = read_scene_file(scene_path)?;
    let mut studio = studiocast::Studio::new();
    studio.scene = file.scene;
    studio.config = file.config;

    if let Some(pdf) = pdf {
        studio
            .load_pdf(pdf)
            .with_context(|| format!("load pdf '{}'", pdf.display()))?;
        studio.set_page(page);
    }
    Ok(studio)
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let mut studio = build_studio(args.scene_path.as_deref(), args.pdf.as_deref(), args.page)?;
    let frame = studio.tick(Instant::now(), None)?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
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

fn cmd_record(args: RecordArgs) -> anyhow::Result<()> {
    let mut studio = build_studio(args.scene_path.as_deref(), args.pdf.as_deref(), 1)?;

    let support = studiocast::capture::EncoderSupport::probe();
    let cfg = studiocast::capture::CaptureConfig {
        fps: args.fps,
        out_dir: args.out_dir.clone(),
        audio_input: args
            .audio_format
            .map(|format| (format, args.audio_device.clone())),
    };
    studio.start_capture(&cfg, &support)?;

    let frame_count = (args.duration * f64::from(args.fps)).ceil().max(1.0) as u64;
    let step = Duration::from_secs_f64(1.0 / f64::from(args.fps));
    let start = Instant::now();
    for i in 0..frame_count {
        studio.tick(start + step * i as u32, None)?;
    }

    let path = studio.stop_capture()?;
    eprintln!("wrote {}", path.display());
    Ok(())
}

fn cmd_probe() -> anyhow::Result<()> {
    use studiocast::device::{DeviceKind, DeviceProvider as _, SystemDevices, pick_default};

    let devices = SystemDevices.enumerate()?;
    println!("devices:");
    for d in &devices {
        println!("  {:?}  {}  ({})", d.kind, d.label, d.id);
    }
    println!(
        "default camera: {}",
        pick_default(&devices, DeviceKind::VideoInput)
            .map_or("none", |d| d.id.as_str())
    );
    println!(
        "default microphone: {}",
        pick_default(&devices, DeviceKind::AudioInput)
            .map_or("none", |d| d.id.as_str())
    );

    let support = studiocast::capture::EncoderSupport::probe();
    match studiocast::capture::select_encoder(&support) {
        Ok(candidate) => println!("encoder: {candidate:?}"),
        Err(err) => println!("encoder: {err}"),
    }
    Ok(())
}
