//! CLI for Headshot - AI professional headshots from a photo.

use clap::{Args, Parser, Subcommand, ValueEnum};
use headshot::{
    acquire, Attire, Background, CaptureDevice, CommandCamera, CropSelection, GeminiGenerator,
    GeminiModel, HeadshotGenerator, Phase, RawImage, StyleOptions, Studio,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "headshot")]
#[command(about = "Turn a photo into a professional headshot via AI image APIs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a headshot from a photo file (`-` reads stdin)
    Generate(GenerateArgs),

    /// Capture a photo from the camera and generate a headshot
    Capture(CaptureArgs),

    /// List attire and background options
    Styles,

    /// Check that the API key and model are usable
    Check(ServiceArgs),
}

#[derive(Args)]
struct GenerateArgs {
    /// Input photo (PNG, JPEG or WebP), or `-` for stdin
    input: PathBuf,

    #[command(flatten)]
    session: SessionArgs,
}

#[derive(Args)]
struct CaptureArgs {
    /// Still-capture command writing one frame to stdout
    #[arg(long, env = "HEADSHOT_CAMERA_CMD")]
    camera_cmd: Option<String>,

    /// Seconds to wait for the camera
    #[arg(long, default_value_t = 15)]
    camera_timeout: u64,

    #[command(flatten)]
    session: SessionArgs,
}

#[derive(Args)]
struct SessionArgs {
    /// Crop rectangle as x,y,width,height (default: centred square)
    #[arg(long, conflicts_with = "full_frame")]
    crop: Option<CropSelection>,

    /// Use the whole photo without cropping
    #[arg(long)]
    full_frame: bool,

    /// Clothing
    #[arg(short, long, default_value = "business-suit")]
    attire: Attire,

    /// Backdrop
    #[arg(short, long, default_value = "office")]
    background: Background,

    /// Ask for extra retouching
    #[arg(short, long)]
    enhanced: bool,

    /// Directory the headshot is saved into
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    #[command(flatten)]
    service: ServiceArgs,
}

#[derive(Args)]
struct ServiceArgs {
    /// Gemini model
    #[arg(short, long, value_enum, default_value = "flash")]
    model: ModelArg,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 120)]
    timeout: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Flash,
    Pro,
}

impl From<ModelArg> for GeminiModel {
    fn from(arg: ModelArg) -> Self {
        match arg {
            ModelArg::Flash => GeminiModel::NanoBanana,
            ModelArg::Pro => GeminiModel::NanoBananaPro,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => {
            let raw = if args.input.as_os_str() == "-" {
                acquire::from_reader(std::io::stdin().lock())?
            } else {
                acquire::from_path(&args.input)?
            };
            run_session(raw, args.session, cli.json).await?;
        }
        Commands::Capture(args) => {
            let mut builder =
                CommandCamera::builder().timeout(Duration::from_secs(args.camera_timeout));
            if let Some(cmd) = args.camera_cmd {
                builder = builder.command(cmd);
            }
            let camera = builder.build()?;
            let raw = camera.capture().await?;
            run_session(raw, args.session, cli.json).await?;
        }
        Commands::Styles => {
            list_styles(cli.json)?;
        }
        Commands::Check(args) => {
            check_service(args, cli.json).await?;
        }
    }

    Ok(())
}

fn build_generator(args: &ServiceArgs) -> anyhow::Result<GeminiGenerator> {
    Ok(GeminiGenerator::builder()
        .model(args.model.into())
        .timeout(Duration::from_secs(args.timeout))
        .build()?)
}

async fn run_session(raw: RawImage, args: SessionArgs, json_output: bool) -> anyhow::Result<()> {
    let generator = build_generator(&args.service)?;
    let mut studio = Studio::new(generator);

    studio.begin_crop(raw)?;
    if args.full_frame {
        studio.adjust_crop(CropSelection::new(0, 0, u32::MAX, u32::MAX))?;
    } else if let Some(selection) = args.crop {
        let clamped = studio.adjust_crop(selection)?;
        if clamped != selection {
            tracing::warn!(requested = %selection, used = %clamped, "crop trimmed to photo");
        }
    }
    let source = studio.confirm_crop()?;
    let (width, height) = (source.width, source.height);

    studio.set_style(
        StyleOptions::new(args.attire, args.background).with_enhanced(args.enhanced),
    );

    let headshot = match studio.generate().await {
        Phase::Complete(headshot) => headshot.clone(),
        Phase::Failed(failure) => anyhow::bail!("{failure}"),
        other => anyhow::bail!("unexpected state after generation: {}", other.name()),
    };

    std::fs::create_dir_all(&args.output_dir)?;
    let path = headshot.download().save(&args.output_dir)?;

    if json_output {
        let result = serde_json::json!({
            "success": true,
            "output": path.display().to_string(),
            "format": headshot.format().extension(),
            "source": { "width": width, "height": height },
            "style": studio.style(),
            "generator": studio.generator().name(),
        });
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Generated headshot: {} ({} attire, {} background{}) via {}",
            path.display(),
            args.attire,
            args.background,
            if args.enhanced { ", enhanced" } else { "" },
            studio.generator().name()
        );
    }

    Ok(())
}

async fn check_service(args: ServiceArgs, json_output: bool) -> anyhow::Result<()> {
    let generator = build_generator(&args)?;
    let model = generator.model().as_str();
    let result = generator.health_check().await;

    if json_output {
        let value = serde_json::json!({
            "generator": generator.name(),
            "model": model,
            "ok": result.is_ok(),
            "error": result.as_ref().err().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        match &result {
            Ok(()) => println!("✓ {} ({}) is reachable", generator.name(), model),
            Err(e) => println!("✗ {} ({}): {}", generator.name(), model, e),
        }
    }

    result.map_err(Into::into)
}

fn list_styles(json_output: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct StyleInfo {
        label: &'static str,
        description: &'static str,
    }

    let attire: Vec<StyleInfo> = Attire::ALL
        .iter()
        .map(|a| StyleInfo {
            label: a.as_str(),
            description: a.description(),
        })
        .collect();
    let backgrounds: Vec<StyleInfo> = Background::ALL
        .iter()
        .map(|b| StyleInfo {
            label: b.as_str(),
            description: b.description(),
        })
        .collect();

    if json_output {
        let value = serde_json::json!({ "attire": attire, "background": backgrounds });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("ATTIRE:");
        for s in &attire {
            println!("  {:<16} {}", s.label, s.description);
        }
        println!("\nBACKGROUND:");
        for s in &backgrounds {
            println!("  {:<16} {}", s.label, s.description);
        }
    }

    Ok(())
}
