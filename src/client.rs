use crate::plan::Directive;
use crate::USER_AGENT;
use std::error::Error;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::time::Duration;

pub type FetchResult = Result<Box<dyn Read>, Box<dyn Error>>;
pub type DownloadedBytes = u64;
pub type DownloadResult = Result<DownloadedBytes, Box<dyn Error>>;

pub const CHUNK_SIZE: usize = 8192;
const TIMEOUT_SECS: u64 = 30;

/// Blocking http seam; a non-success status or transport problem is an Err.
pub trait Fetch {
    fn get(&self, url: &str) -> FetchResult;
}

pub struct Http {
    agent: ureq::Agent,
}

impl Http {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build();
        Http { agent }
    }
}

impl Default for Http {
    fn default() -> Self {
        Http::new()
    }
}

impl Fetch for Http {
    fn get(&self, url: &str) -> FetchResult {
        let resp = self.agent.get(url).set("User-Agent", USER_AGENT).call()?;
        Ok(Box::new(resp.into_reader()))
    }
}

/// Executes one download directive: streams the body to the target path in
/// fixed-size chunks and returns the byte count. The target is opened
/// create-exclusive, so a file that already exists is never touched. Any
/// failure after creation removes the partial file.
pub fn download(fetch: &dyn Fetch, directive: &Directive) -> DownloadResult {
    let mut body = fetch.get(&directive.url)?;
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&directive.path)?;

    match write_chunks(body.as_mut(), &mut file) {
        Ok(written) => Ok(written),
        Err(e) => {
            drop(file);
            if let Err(rm) = fs::remove_file(&directive.path) {
                log::warn!(
                    "could not remove partial file {}: {}",
                    directive.path.display(),
                    rm
                );
            }
            Err(e)
        }
    }
}

fn write_chunks(body: &mut dyn Read, file: &mut File) -> DownloadResult {
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let n = body.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        file.write_all(&chunk[..n])?;
        written += n as u64;
    }
    file.flush()?;
    Ok(written)
}
