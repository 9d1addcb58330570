use crate::client::{download, Fetch};
use crate::ledger::Ledger;
use crate::plan::{plan, Decision};
use crate::{parser, util, LEDGER_FILE};
use simple_error::SimpleError;
use std::error::Error;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Drives one full run: fetch the feed, walk its episodes in feed order and
/// download whatever the ledger does not already cover. Only feed-level
/// failures abort; everything per-episode is reported and skipped.
pub fn run(fetch: &dyn Fetch, rss_url: &str, download_dir: &Path) -> Result<(), Box<dyn Error>> {
    println!("Loading RSS feed from: {}", rss_url);

    let feed = fetch_feed(fetch, rss_url)?;
    let podcast_title = feed.title.as_deref().unwrap_or("Unknown Podcast");
    println!("Podcast: {}", podcast_title);

    let mut folder = util::sanitize_filename(podcast_title);
    if folder.is_empty() {
        folder = "podcast".to_string();
    }
    let podcast_dir = download_dir.join(folder);
    fs::create_dir_all(&podcast_dir)?;

    let ledger_path = podcast_dir.join(LEDGER_FILE);
    let mut ledger = Ledger::load(&ledger_path);

    let total = feed.episodes.len();
    println!("Episodes found: {}", total);

    for (i, episode) in feed.episodes.iter().enumerate() {
        let n = i + 1;
        let fallback = format!("Episode {}", n);
        let title = episode.title.as_deref().unwrap_or(&fallback);

        match plan(episode, &fallback, &ledger, &podcast_dir) {
            Decision::Skip(reason) => {
                println!("Skipping {}/{}: {} ({})", n, total, title, reason);
            }
            Decision::Fetch(directive) => {
                println!("Downloading {}/{}: {}", n, total, title);
                match download(fetch, &directive) {
                    Ok(size) => {
                        let name = directive
                            .path
                            .file_name()
                            .map(|f| f.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        println!(
                            "  saved: {} ({:.1} MB)",
                            name,
                            size as f64 / (1024.0 * 1024.0)
                        );
                        ledger.record(directive.key);
                        if let Err(e) = ledger.persist(&ledger_path) {
                            log::warn!("could not persist ledger {}: {}", ledger_path.display(), e);
                        }
                    }
                    Err(e) => println!("  download failed: {}", e),
                }
            }
        }
    }

    let shown = fs::canonicalize(download_dir).unwrap_or_else(|_| download_dir.to_path_buf());
    println!("\nDone. Files saved in: {}", shown.display());
    Ok(())
}

fn fetch_feed(fetch: &dyn Fetch, rss_url: &str) -> crate::FeedResult {
    let mut body = Vec::new();
    fetch
        .get(rss_url)
        .and_then(|mut rd| rd.read_to_end(&mut body).map_err(Into::into))
        .map_err(|e| SimpleError::new(format!("failed to load RSS feed: {}", e)))?;
    parser::parse_feed(&body)
        .map_err(|e| SimpleError::new(format!("failed to parse RSS feed: {}", e)).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchResult;
    use std::collections::{HashMap, HashSet};
    use std::io::{self, Cursor};

    const FEED_URL: &str = "https://example.com/feed.xml";

    struct FakeFetch {
        routes: HashMap<String, Vec<u8>>,
        broken: HashSet<String>,
    }

    impl FakeFetch {
        fn new(feed: &str) -> Self {
            let mut routes = HashMap::new();
            routes.insert(FEED_URL.to_string(), feed.as_bytes().to_vec());
            FakeFetch {
                routes,
                broken: HashSet::new(),
            }
        }

        fn audio(mut self, url: &str, body: &[u8]) -> Self {
            self.routes.insert(url.to_string(), body.to_vec());
            self
        }

        fn broken(mut self, url: &str) -> Self {
            self.broken.insert(url.to_string());
            self
        }
    }

    struct FailingBody;

    impl Read for FailingBody {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
        }
    }

    impl Fetch for FakeFetch {
        fn get(&self, url: &str) -> FetchResult {
            if self.broken.contains(url) {
                let partial = Cursor::new(vec![0u8; 64]).chain(FailingBody);
                return Ok(Box::new(partial));
            }
            match self.routes.get(url) {
                Some(body) => Ok(Box::new(Cursor::new(body.clone()))),
                None => Err(SimpleError::new(format!("status 404 for {}", url)).into()),
            }
        }
    }

    fn mixed_feed() -> String {
        r#"<rss><channel>
            <title>Mixed Cast</title>
            <item>
              <title>No Enclosure</title>
            </item>
            <item>
              <title>Old One</title>
              <guid>already-there</guid>
              <enclosure url="https://cdn/old.mp3"/>
            </item>
            <item>
              <title>New One</title>
              <guid>fresh</guid>
              <enclosure url="https://cdn/new.mp3"/>
            </item>
        </channel></rss>"#
            .to_string()
    }

    fn audio_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .expect("read_dir failed")
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n != LEDGER_FILE)
            .collect();
        names.sort();
        names
    }

    #[test]
    fn mixed_feed_downloads_exactly_the_new_episode() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let podcast_dir = dir.path().join("Mixed Cast");
        fs::create_dir_all(&podcast_dir).expect("mkdir failed");

        let mut seeded = Ledger::default();
        seeded.record("already-there".to_string());
        seeded
            .persist(&podcast_dir.join(LEDGER_FILE))
            .expect("seed failed");

        let fetch = FakeFetch::new(&mixed_feed()).audio("https://cdn/new.mp3", &[3u8; 4096]);
        run(&fetch, FEED_URL, dir.path()).expect("run failed");

        assert_eq!(audio_files(&podcast_dir), vec!["New One.mp3"]);
        let ledger = Ledger::load(&podcast_dir.join(LEDGER_FILE));
        assert_eq!(ledger.len(), 2);
        assert!(ledger.contains("already-there"));
        assert!(ledger.contains("fresh"));
    }

    #[test]
    fn second_run_downloads_nothing() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let fetch = FakeFetch::new(&mixed_feed())
            .audio("https://cdn/old.mp3", &[1u8; 128])
            .audio("https://cdn/new.mp3", &[2u8; 128]);

        run(&fetch, FEED_URL, dir.path()).expect("first run failed");
        let podcast_dir = dir.path().join("Mixed Cast");
        let after_first = audio_files(&podcast_dir);
        assert_eq!(after_first.len(), 2);

        run(&fetch, FEED_URL, dir.path()).expect("second run failed");
        assert_eq!(audio_files(&podcast_dir), after_first);
    }

    #[test]
    fn failed_download_is_skipped_and_not_recorded() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let fetch = FakeFetch::new(&mixed_feed())
            .audio("https://cdn/old.mp3", &[1u8; 128])
            .broken("https://cdn/new.mp3");

        run(&fetch, FEED_URL, dir.path()).expect("run failed");

        let podcast_dir = dir.path().join("Mixed Cast");
        assert_eq!(audio_files(&podcast_dir), vec!["Old One.mp3"]);
        let ledger = Ledger::load(&podcast_dir.join(LEDGER_FILE));
        assert!(ledger.contains("already-there"));
        assert!(!ledger.contains("fresh"));
    }

    #[test]
    fn colliding_titles_get_distinct_files_and_keys() {
        let feed = r#"<rss><channel>
            <title>Twins</title>
            <item>
              <title>Same Name</title>
              <guid>a</guid>
              <enclosure url="https://cdn/a.mp3"/>
            </item>
            <item>
              <title>Same Name</title>
              <guid>b</guid>
              <enclosure url="https://cdn/b.mp3"/>
            </item>
        </channel></rss>"#;

        let dir = tempfile::tempdir().expect("tempdir failed");
        let fetch = FakeFetch::new(feed)
            .audio("https://cdn/a.mp3", &[1u8; 32])
            .audio("https://cdn/b.mp3", &[2u8; 32]);

        run(&fetch, FEED_URL, dir.path()).expect("run failed");

        let podcast_dir = dir.path().join("Twins");
        assert_eq!(
            audio_files(&podcast_dir),
            vec!["Same Name-1.mp3", "Same Name.mp3"]
        );
        let ledger = Ledger::load(&podcast_dir.join(LEDGER_FILE));
        assert!(ledger.contains("a"));
        assert!(ledger.contains("b"));
    }

    #[test]
    fn feed_fetch_failure_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let fetch = FakeFetch::new("unused");
        assert!(run(&fetch, "https://example.com/other.xml", dir.path()).is_err());
    }

    #[test]
    fn feed_parse_failure_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let fetch = FakeFetch::new("<rss><channel><title>x</wrong>");
        assert!(run(&fetch, FEED_URL, dir.path()).is_err());
    }
}
