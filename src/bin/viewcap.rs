use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use viewcap::Scene as _;
use viewcap::config::ViewcapConfig;
use viewcap::synthetic::SyntheticViewer;

#[derive(Parser, Debug)]
#[command(name = "viewcap", version)]
struct Cli {
    /// Config JSON (defaults to the standard config location).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Capture the current frame as `<name>-image.png`.
    Image(ImageArgs),
    /// Encode a timeline range as video (requires `ffmpeg` on PATH).
    Video(VideoArgs),
    /// Write a timeline range as numbered stills.
    Sequence(SequenceArgs),
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Output width in pixels.
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 360)]
    height: u32,

    /// Keep the alpha channel instead of compositing onto the background.
    #[arg(long)]
    transparent: bool,

    /// Keep overlays and debug layers in the output.
    #[arg(long)]
    overlays: bool,

    /// Output directory (defaults to the config's `outputDir`).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Settings JSON; replaces the capture flags when given.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Scene name used for output file names.
    #[arg(long, default_value = "scene")]
    name: String,

    /// Seconds per camera revolution; 0 keeps the camera still.
    #[arg(long, default_value_t = 4.0)]
    orbit_period: f64,

    /// Timeline time in seconds for still captures.
    #[arg(long, default_value_t = 0.0)]
    time: f64,
}

#[derive(Args, Debug)]
struct ImageArgs {
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args, Debug)]
struct VideoArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// First timeline frame.
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// Last timeline frame (inclusive).
    #[arg(long, default_value_t = 119)]
    end: u64,

    /// Output frames per second.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Target bitrate in bits per second.
    #[arg(long, default_value_t = 8_000_000)]
    bitrate: u64,

    /// Output container: mp4, webm, mov or mkv.
    #[arg(long, default_value = "mp4", value_parser = str::parse::<viewcap::Container>)]
    container: viewcap::Container,

    /// Output codec: h264, h265, vp9 or av1.
    #[arg(long, default_value = "h264", value_parser = str::parse::<viewcap::VideoCodec>)]
    codec: viewcap::VideoCodec,
}

#[derive(Args, Debug)]
struct SequenceArgs {
    #[command(flatten)]
    common: CommonArgs,

    /// First timeline frame.
    #[arg(long, default_value_t = 0)]
    start: u64,

    /// Last timeline frame (inclusive).
    #[arg(long, default_value_t = 29)]
    end: u64,

    /// Still format: png or jpeg.
    #[arg(long, default_value = "png", value_parser = str::parse::<viewcap::ImageFormat>)]
    format: viewcap::ImageFormat,

    /// JPEG quality in [0, 1].
    #[arg(long)]
    quality: Option<f32>,

    /// Source frames averaged per output frame.
    #[arg(long, default_value_t = 1)]
    blur: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ViewcapConfig::load(cli.config.as_deref())?;
    viewcap::logging::init_logging(&config.logging);

    match cli.cmd {
        Command::Image(args) => cmd_image(&config, args).await,
        Command::Video(args) => cmd_video(&config, args).await,
        Command::Sequence(args) => cmd_sequence(&config, args).await,
    }
}

impl CommonArgs {
    fn capture(&self) -> viewcap::CaptureSettings {
        viewcap::CaptureSettings {
            width: self.width,
            height: self.height,
            transparent: self.transparent,
            show_overlays: self.overlays,
        }
    }

    fn out_dir(&self, config: &ViewcapConfig) -> PathBuf {
        self.out.clone().unwrap_or_else(|| config.output_dir.clone())
    }

    fn viewer(&self) -> SyntheticViewer {
        let mut viewer = SyntheticViewer::new(&self.name).with_orbit_period(self.orbit_period);
        viewer.set_time(self.time);
        viewer.update_camera(0.0);
        viewer
    }
}

fn read_settings<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read settings '{}'", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parse settings '{}'", path.display()))
}

fn exporter(config: &ViewcapConfig) -> viewcap::Exporter {
    viewcap::Exporter::new(config.capture)
}

async fn cmd_image(config: &ViewcapConfig, args: ImageArgs) -> anyhow::Result<()> {
    let settings = match &args.common.settings {
        Some(path) => read_settings(path)?,
        None => viewcap::ImageExportSettings {
            capture: args.common.capture(),
        },
    };
    let out_dir = args.common.out_dir(config);
    let mut viewer = args.common.viewer();
    let mut dir = viewcap::FsDirectory::new(out_dir.clone());

    let artifact = exporter(config)
        .export_image(&mut viewer, &settings, &mut dir)
        .await?;
    report_files(&out_dir, &artifact);
    Ok(())
}

async fn cmd_video(config: &ViewcapConfig, args: VideoArgs) -> anyhow::Result<()> {
    let settings = match &args.common.settings {
        Some(path) => read_settings(path)?,
        None => viewcap::VideoExportSettings {
            capture: args.common.capture(),
            start_frame: args.start,
            end_frame: args.end,
            frame_rate: args.fps,
            bitrate: args.bitrate,
            container: args.container,
            codec: args.codec,
        },
    };
    let out_dir = args.common.out_dir(config);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("create output dir '{}'", out_dir.display()))?;
    let out_path = out_dir.join(format!(
        "{}-video.{}",
        args.common.name,
        settings.container.extension()
    ));
    let file = tokio::fs::File::create(&out_path)
        .await
        .with_context(|| format!("create '{}'", out_path.display()))?;

    let mut viewer = args.common.viewer();
    let mut encoder = viewcap::FfmpegEncoder::new(viewcap::VideoOutput::Stream(Box::new(file)));
    let artifact = exporter(config)
        .export_video(&mut viewer, &settings, &mut encoder)
        .await?;
    if let viewcap::EncodedArtifact::Streamed { bytes_written } = artifact {
        println!("{} ({bytes_written} bytes)", out_path.display());
    }
    Ok(())
}

async fn cmd_sequence(config: &ViewcapConfig, args: SequenceArgs) -> anyhow::Result<()> {
    let settings = match &args.common.settings {
        Some(path) => read_settings(path)?,
        None => viewcap::SequenceExportSettings {
            capture: args.common.capture(),
            start_frame: args.start,
            end_frame: args.end,
            format: args.format,
            quality: args.quality,
            motion_blur_samples: Some(args.blur),
        },
    };
    let out_dir = args.common.out_dir(config);
    let mut viewer = args.common.viewer();
    let mut dir = viewcap::FsDirectory::new(out_dir.clone());

    let artifact = exporter(config)
        .export_sequence(&mut viewer, &settings, &mut dir)
        .await?;
    report_files(&out_dir, &artifact);
    Ok(())
}

fn report_files(dir: &Path, artifact: &viewcap::EncodedArtifact) {
    if let viewcap::EncodedArtifact::Files(names) = artifact {
        for name in names {
            println!("{}", dir.join(name).display());
        }
    }
}
