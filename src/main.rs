//! CLI entry point for mdsite

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mdsite")]
#[command(version)]
#[command(about = "A static site generator for Markdown articles", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new document
    New {
        /// Title of the new document
        title: String,

        /// Layout to use (defaults to `default_layout` from the config)
        #[arg(short, long)]
        layout: Option<String>,

        /// Permalink for the new document
        #[arg(short, long)]
        permalink: Option<String>,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Watch for file changes
        #[arg(short, long)]
        watch: bool,

        /// Exit with an error if any file could not be published
        #[arg(long)]
        strict: bool,
    },

    /// Clean the public folder
    Clean,

    /// List site information
    List {
        /// Type of content to list (documents, links, permalinks)
        #[arg(default_value = "documents")]
        r#type: String,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "mdsite=debug,info"
    } else {
        "mdsite=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            mdsite::commands::init::init_site(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::New {
            title,
            layout,
            permalink,
        } => {
            let site = mdsite::Site::new(&base_dir)?;
            let path = mdsite::commands::new::create_document(
                &site,
                &title,
                layout.as_deref(),
                permalink.as_deref(),
            )?;
            println!("Created: {:?}", path);
        }

        Commands::Generate { watch, strict } => {
            let site = mdsite::Site::new(&base_dir)?;
            tracing::info!("Generating static files...");

            let report = site.generate()?;
            for failure in &report.failures {
                eprintln!("  ! {}: {}", failure.path.display(), failure.message);
            }
            for duplicate in &report.duplicates {
                eprintln!(
                    "  ! {} skipped: {:?} is already published by {}",
                    duplicate.source, duplicate.output, duplicate.kept
                );
            }
            if strict && !report.is_clean() {
                anyhow::bail!("{} file(s) failed to generate", report.failures.len());
            }
            println!("Generated successfully!");

            if watch {
                mdsite::commands::generate::watch(&site)?;
            }
        }

        Commands::Clean => {
            let site = mdsite::Site::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type, json } => {
            let site = mdsite::Site::new(&base_dir)?;
            mdsite::commands::list::run(&site, &r#type, json)?;
        }

        Commands::Version => {
            println!("mdsite version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
