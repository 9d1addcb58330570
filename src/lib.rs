pub mod client;
pub mod entity;
pub mod ledger;
pub mod parser;
pub mod plan;
pub mod run;
pub mod util;

use entity::Feed;
use std::error::Error;

pub type FeedResult = Result<Feed, Box<dyn Error>>;

/// Ledger file kept inside each per-podcast folder.
pub const LEDGER_FILE: &str = ".downloaded.json";
pub const USER_AGENT: &str = "podfetch/1.0";
