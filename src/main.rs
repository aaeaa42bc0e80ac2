use clap::{Parser, Subcommand};
use dirsite::{config::Settings, export, site::Site};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dirsite")]
#[command(about = "Serve a directory tree as a static site")]
#[command(long_about = "\
Serve a directory tree as a static site

Your filesystem is the data source. Every file is a resource addressed by
its path from the content root; every html file doubles as a Tera template
named by that same path. Directories registered as blogs interleave
markdown entries with the generated pages rendered from them.

Content structure:

  content/
  ├── index.html               # Served at /index.html, rendered as template
  ├── menu.html
  ├── images/
  │   └── header.gif           # Served raw with its own content type
  └── blog/                    # [handlers] \"/blog\" = \"blog\"
      ├── index.html           # Listing template (receives `entries`)
      ├── blog_entry.html      # Entry template ({{ title }}, {{ body }})
      └── first-post.md        # Served at first-post.md AND first-post.html

Hidden files (leading '.') and backups (trailing '~') never resolve.
Settings live in dirsite.toml next to where you run the tool.")]
#[command(version)]
struct Cli {
    /// Settings file
    #[arg(long, default_value = "dirsite.toml", global = true)]
    config: PathBuf,

    /// Content directory (overrides the settings file)
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export the rendered site into a new directory
    Export {
        /// Destination directory; must not exist yet
        destination: PathBuf,
    },
    /// Print the URL of every resolvable resource
    List {
        /// Container path to list from
        #[arg(default_value = "/")]
        path: String,
    },
    /// Resolve one path and print the response body
    Get { path: String },
    /// Validate settings, content directory, and templates
    Check,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load(&cli.config)?;
    if let Some(source) = cli.source {
        settings.content = source;
    }
    let site = Site::new(settings)?;

    match cli.command {
        Command::Export { destination } => {
            let written = export::export(&site, &destination)?;
            for item in &written {
                println!("{} --> {}", item.url, item.destination.display());
            }
            println!("{} files exported", written.len());
        }
        Command::List { path } => {
            let target = if path.trim_end_matches('/').is_empty() {
                "/list".to_string()
            } else {
                format!("{}/list", path.trim_end_matches('/'))
            };
            let response = site.get(&target)?;
            if response.status != 200 {
                return Err(format!("{} returned {}", path, response.status).into());
            }
            println!("{}", String::from_utf8_lossy(&response.body));
        }
        Command::Get { path } => {
            let response = site.get(&path)?;
            if let Some(location) = &response.location {
                return Err(format!("{path} redirects to {location}").into());
            }
            if response.status != 200 {
                return Err(format!("{} returned {}", path, response.status).into());
            }
            std::io::stdout().write_all(&response.body)?;
        }
        Command::Check => {
            let root = site.root()?;
            let resources = root
                .walk(&site)
                .collect::<Result<Vec<_>, _>>()?;
            println!(
                "ok: {} resources under {}",
                resources.len(),
                site.content().display()
            );
        }
    }
    Ok(())
}
