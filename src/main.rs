//! xclim-testing - provision and inspect documentation test data.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use xclim_testing::namespace::Entry;
use xclim_testing::{atmos, util, DatasetOpener, OpenOptions, Session, TestDataConfig};

#[derive(Parser, Debug)]
#[command(name = "xclim-testing")]
#[command(about = "Provision test data for climate documentation examples", long_about = None)]
struct Args {
    /// Default cache directory of reference datasets
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Testdata branch/version tag
    #[arg(long, global = true)]
    branch: Option<String>,

    /// Local checkout of the testdata corpus used to fill cache misses
    #[arg(long, global = true)]
    mirror: Option<PathBuf>,

    /// Enable logging to specified file
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bootstrap a session and list the example namespace
    Bootstrap {
        /// Session root to populate (kept after exit)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Write the synthetic atmospheric dataset into a directory
    GenerateAtmos {
        /// Target directory
        dir: PathBuf,
    },
    /// Open a dataset through the cache and print its structure
    Open {
        /// File identifier within the corpus, or a path
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log.as_ref())?;

    let mut config = match args.cache_dir {
        Some(dir) => {
            let mut config = TestDataConfig::from_env().unwrap_or_else(|_| TestDataConfig::new(&dir));
            config.default_cache_dir = dir;
            config
        },
        None => TestDataConfig::from_env().context("Failed to read test data configuration")?,
    };
    if let Some(branch) = args.branch {
        config.branch = branch;
    }
    if let Some(mirror) = args.mirror {
        config.mirror = Some(mirror);
    }

    match args.command {
        Command::Bootstrap { root } => {
            let root = root.unwrap_or_else(|| {
                std::env::temp_dir().join(format!("xclim-testing-{}", std::process::id()))
            });
            let session = Session::in_root(&root, config)
                .with_context(|| format!("Failed to create session in {}", root.display()))?;
            let namespace = session.bootstrap().context("Session bootstrap failed")?;

            println!("Session data directory: {}", session.data_dir()?.display());
            for (name, entry) in namespace.iter() {
                match entry {
                    Entry::Path(path) => println!("{:<32} path    {}", name, path.display()),
                    Entry::Series(series) => println!(
                        "{:<32} series  {} days of {} [{}]",
                        name,
                        series.len(),
                        series.variable,
                        series.units
                    ),
                    other => println!("{:<32} {}", name, other.kind()),
                }
            }
        },
        Command::GenerateAtmos { dir } => {
            let path = atmos::generate_atmos(&dir)
                .with_context(|| format!("Failed to generate dataset in {}", dir.display()))?;
            println!("{}", path.display());
        },
        Command::Open { file } => {
            let cache_dir = config.default_cache_dir.clone();
            let opener: Box<dyn DatasetOpener> = match &config.mirror {
                Some(mirror) => Box::new(
                    xclim_testing::CachingOpener::new(xclim_testing::MirrorFetch::new(mirror))
                        .with_flat_branch(config.branch.clone()),
                ),
                None => Box::new(
                    xclim_testing::CachingOpener::new(xclim_testing::NoFetch)
                        .with_flat_branch(config.branch.clone()),
                ),
            };
            let options = OpenOptions::default().with_engine(config.default_engine);
            let dataset = opener
                .open(&file, &cache_dir, &config.branch, &options)
                .with_context(|| format!("Failed to open {}", file.display()))?;

            println!("{}", dataset.file_path.display());
            print!("{}", util::format_tree(&dataset.root_node));
        },
    }

    Ok(())
}

fn init_logging(log: Option<&PathBuf>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log {
        Some(log_path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(log_path)
                .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        },
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        },
    }

    tracing::debug!("Starting xclim-testing");
    Ok(())
}
