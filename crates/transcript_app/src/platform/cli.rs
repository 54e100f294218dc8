use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use clap::{Parser, ValueEnum};
use url::Url;

#[derive(Parser, Debug)]
#[command(
    name = "transcript-search",
    version,
    about = "Search every page of a paginated transcript site"
)]
pub struct Cli {
    /// Address of the transcript index page; a filesystem path is read locally.
    #[arg(long)]
    pub location: String,

    /// Number of `page-NNN.html` files; overrides the config file.
    #[arg(long)]
    pub total_pages: Option<usize>,

    /// RON site configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Text typed into the search box before submitting.
    #[arg(long)]
    pub query: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Keep reading queries from stdin; `:close` closes the modal, `:open` reopens it.
    #[arg(short, long, default_value_t = false)]
    pub interactive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Link and excerpt per result.
    Text,
    /// Result entry markup.
    Html,
}

/// Accepts an absolute URL or a filesystem path, which becomes a `file:` URL.
/// Page URLs are joined onto the location, so it must be able to act as a base.
pub fn parse_location(raw: &str) -> anyhow::Result<Url> {
    match Url::parse(raw) {
        // Single-letter schemes are Windows drive letters.
        Ok(url) if url.scheme().len() > 1 => {
            if url.cannot_be_a_base() {
                bail!("location {raw} cannot serve as a base for page urls");
            }
            Ok(url)
        }
        _ => path_to_url(Path::new(raw)),
    }
}

fn path_to_url(path: &Path) -> anyhow::Result<Url> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("cannot resolve location {}", path.display()))?;
    let url = if absolute.is_dir() {
        Url::from_directory_path(&absolute)
    } else {
        Url::from_file_path(&absolute)
    };
    url.map_err(|()| anyhow!("cannot convert {} to a file url", absolute.display()))
}
