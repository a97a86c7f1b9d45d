use anyhow::{Context, bail};
use clap::Parser;
use log::info;
use schsvg::{
    CancellationSource, FileEnvironment, LengthUnit, OutputTarget, RenderOutcome, RenderSettings,
    render,
};
use std::path::PathBuf;

// Many small short-lived allocations (tokens, attribute strings).
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Render a KiCad legacy schematic (.sch) to SVG.
#[derive(Debug, Parser)]
#[command(name = "schsvg", version, about)]
struct Args {
    /// The schematic to render
    input: PathBuf,

    /// Write the SVG here instead of standard output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extra directories searched for .lib files, after the schematic's own
    #[arg(short = 'L', long = "library-dir")]
    library_dirs: Vec<PathBuf>,

    /// Unit of the document width and height (mm or in)
    #[arg(long, default_value = "mm")]
    unit: LengthUnit,

    /// Font family for all text
    #[arg(long)]
    font_family: Option<String>,

    /// Skip drawing library symbol bodies
    #[arg(long)]
    no_components: bool,

    /// Draw pins that the library marks invisible
    #[arg(long)]
    hidden_pins: bool,
}

impl Args {
    fn settings(&self) -> RenderSettings {
        let defaults = RenderSettings::default();
        RenderSettings {
            unit: self.unit,
            font_family: self.font_family.clone().unwrap_or(defaults.font_family.clone()),
            render_components: !self.no_components,
            show_hidden_pins: self.hidden_pins,
            ..defaults
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let output = match &args.output {
        Some(path) => OutputTarget::File(path.clone()),
        None => OutputTarget::Stdout,
    };
    let mut environment = FileEnvironment::new(&args.input, output)?.with_settings(args.settings());
    for dir in &args.library_dirs {
        environment = environment.with_library_dir(dir)?;
    }

    let cancel = CancellationSource::new();
    let rendering = render(&environment, cancel.token());
    tokio::pin!(rendering);
    let result = tokio::select! {
        result = &mut rendering => result,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted");
            cancel.cancel();
            rendering.await
        }
    };

    match result {
        Ok(RenderOutcome::Rendered { bytes_written }) => {
            info!("wrote {bytes_written} bytes");
            Ok(())
        }
        Ok(RenderOutcome::NotModified) => Ok(()),
        Err(failure) => {
            if let Some(path) = &args.output
                && std::fs::metadata(path).is_ok_and(|m| m.len() == 0)
            {
                std::fs::remove_file(path)
                    .with_context(|| format!("removing empty {}", path.display()))?;
            }
            bail!("{}: {}", args.input.display(), failure.error)
        }
    }
}
