//! CLI entry point for blogdex

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blogdex::Blog;

#[derive(Parser)]
#[command(name = "blogdex")]
#[command(version)]
#[command(about = "A static blog generator driven by front-matter", long_about = None)]
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
    /// Validate content and generate the static site
    #[command(alias = "g")]
    Build {
        /// Watch for file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Start a local server
    #[command(alias = "s")]
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Enable static mode (no file watching)
        #[arg(long)]
        r#static: bool,
    },

    /// Validate content and report every problem
    Check,

    /// List site information
    List {
        /// Type of content to list (articles, tags)
        #[arg(default_value = "articles")]
        r#type: String,
    },

    /// Create a new article
    New {
        /// Title of the new article
        title: String,

        /// Slug to use instead of one derived from the title
        #[arg(short, long)]
        slug: Option<String>,

        /// Create `<slug>/index.md` so the article can carry its own assets
        #[arg(short, long)]
        bundle: bool,
    },

    /// Remove the public folder
    Clean,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "blogdex=debug,info"
    } else {
        "blogdex=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };

    match cli.command {
        Commands::Build { watch } => {
            let blog = Blog::new(&base_dir)?;
            if watch {
                blogdex::commands::build::watch(&blog).await?;
            } else {
                let stats = blog.build()?;
                println!(
                    "Generated {} articles and {} tag pages into {:?}",
                    stats.articles, stats.tags, blog.public_dir
                );
            }
        }

        Commands::Serve {
            port,
            ip,
            open,
            r#static,
        } => {
            let blog = Blog::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            blogdex::server::start(&blog, &ip, port, !r#static, open).await?;
        }

        Commands::Check => {
            let blog = Blog::new(&base_dir)?;
            blogdex::commands::check::run(&blog)?;
        }

        Commands::List { r#type } => {
            let blog = Blog::new(&base_dir)?;
            blogdex::commands::list::run(&blog, &r#type)?;
        }

        Commands::New {
            title,
            slug,
            bundle,
        } => {
            let blog = Blog::new(&base_dir)?;
            blog.new_article(&title, slug.as_deref(), bundle)?;
        }

        Commands::Clean => {
            let blog = Blog::new(&base_dir)?;
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::Version => {
            println!("blogdex version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
