use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::sync::mpsc;

use postfeed::adapter::{AdapterEvent, PostListAdapter};
use postfeed::config::Config;
use postfeed::feed::FeedClient;
use postfeed::image::ImageLoader;

/// Get the default config file path (~/.config/postfeed/config.toml)
fn default_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("postfeed")
        .join("config.toml"))
}

#[derive(Parser, Debug)]
#[command(name = "postfeed", about = "Browse a JSON post feed in the terminal")]
struct Args {
    /// Config file (defaults to ~/.config/postfeed/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Base URL the feed path and image paths are appended to
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Path of the feed document relative to the base URL
    #[arg(long, value_name = "PATH")]
    feed_path: Option<String>,

    /// Fetch the feed once, print the posts and exit
    #[arg(long)]
    list: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(feed_path) = args.feed_path {
        config.feed_path = feed_path;
    }
    let config = config.normalized();

    let http = postfeed::http::build_client(&config).context("Failed to build HTTP client")?;
    let feed = FeedClient::new(http.clone(), config.base_url.clone(), config.feed_path.clone());

    if args.list {
        let report = feed
            .fetch_feed()
            .await
            .with_context(|| format!("Failed to fetch {}", config.feed_url()))?;
        for post in &report.posts {
            println!("{}\n  {}\n  {}{}", post.title, post.description, config.base_url, post.image_path);
        }
        if !report.errors.is_empty() {
            eprintln!("Skipped {} malformed entries", report.errors.len());
        }
        return Ok(());
    }

    let images = ImageLoader::new(http, config.base_url.clone());
    let (event_tx, event_rx) = mpsc::channel::<AdapterEvent>(64);
    let mut adapter = PostListAdapter::new(feed, images, event_tx);

    let result = postfeed::ui::run(&mut adapter, event_rx).await;
    adapter.close();
    result
}
