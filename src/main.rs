use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Generates vk.h/vk.c, a dynamic loader for the Vulkan procedures.
#[derive(Parser, Debug)]
#[command(name = "genvk", version, about)]
struct Cli {
    /// Path to the Vulkan XML registry.
    #[arg(default_value = "vk.xml")]
    registry: PathBuf,

    /// Overwrite output files that already exist.
    #[arg(short = 'w', long)]
    overwrite: bool,

    /// Also build a static library from the generated source.
    #[arg(long)]
    lib: bool,

    /// Directory receiving the generated files.
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("genvk=info")),
        )
        .init();

    let cli = Cli::parse();
    let options = genvk::Options {
        registry: cli.registry,
        out_dir: cli.out_dir,
        overwrite: cli.overwrite,
        static_lib: cli.lib,
    };

    let artifacts = genvk::run(&options, &genvk::Config::default())?;
    info!("{} procedures emitted", artifacts.emitted);
    for path in &artifacts.paths {
        info!("wrote {}", path.display());
    }
    Ok(())
}
