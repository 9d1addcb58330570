use podfetch::client::Http;
use podfetch::{run, util};
use std::env;
use std::path::Path;
use std::process;

const DEFAULT_DIR: &str = "podcast_episodes";

fn main() {
    util::init_log();

    let mut args = env::args().skip(1);
    let rss_url = match args.next() {
        Some(url) => url,
        None => {
            eprintln!("Usage: podfetch <rss_url> [download_directory]");
            eprintln!("Example: podfetch https://example.com/podcast/rss");
            process::exit(1);
        }
    };
    let download_dir = args.next().unwrap_or_else(|| DEFAULT_DIR.to_string());

    println!("=== Podcast Downloader ===");
    let http = Http::new();
    if let Err(e) = run::run(&http, &rss_url, Path::new(&download_dir)) {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}
