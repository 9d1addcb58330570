use crate::entity::Episode;
use crate::ledger::Ledger;
use crate::util;
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SkipReason {
    NoAudio,
    AlreadyDownloaded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoAudio => write!(f, "no audio enclosure"),
            SkipReason::AlreadyDownloaded => write!(f, "already downloaded"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub url: String,
    pub path: PathBuf,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Skip(SkipReason),
    Fetch(Directive),
}

/// Decides what to do with one episode: skip it (no audio, or its key is in
/// the ledger) or download it to a collision-free path inside `dir`.
/// `fallback_title` names untitled episodes by feed position.
pub fn plan(ep: &Episode, fallback_title: &str, ledger: &Ledger, dir: &Path) -> Decision {
    let audio_url = match ep.audio_url.as_deref() {
        Some(url) if !url.is_empty() => url,
        _ => return Decision::Skip(SkipReason::NoAudio),
    };

    let key = ep.key().unwrap_or_else(|| audio_url.to_string());
    if ledger.contains(&key) {
        return Decision::Skip(SkipReason::AlreadyDownloaded);
    }

    let title = ep.title.as_deref().unwrap_or(fallback_title);
    let safe_title = util::sanitize_filename(title);
    let ext = audio_extension(audio_url);
    let base = match ep.pub_date.as_deref().and_then(util::date_prefix) {
        Some(date) => format!("{}_{}{}", date, safe_title, ext),
        None => format!("{}{}", safe_title, ext),
    };

    Decision::Fetch(Directive {
        url: audio_url.to_string(),
        path: free_path(dir, &base, &ext),
        key,
    })
}

// extension from the url's path component, .mp3 when there is none
fn audio_extension(raw: &str) -> String {
    let path = match Url::parse(raw) {
        Ok(url) => url.path().to_string(),
        Err(_) => raw
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or("")
            .to_string(),
    };
    let segment = path.rsplit('/').next().unwrap_or("");
    match segment.rfind('.') {
        Some(i) if i > 0 && i + 1 < segment.len() => segment[i..].to_string(),
        _ => ".mp3".to_string(),
    }
}

// check-then-suffix probe; the executor opens with create_new so the
// residual race cannot clobber an existing file
fn free_path(dir: &Path, base: &str, ext: &str) -> PathBuf {
    let mut path = dir.join(base);
    let stem = &base[..base.len() - ext.len()];
    let mut counter = 1;
    while path.exists() {
        path = dir.join(format!("{}-{}{}", stem, counter, ext));
        counter += 1;
    }
    path
}
