#[derive(Debug, Clone, Default, PartialEq)]
pub struct Feed {
    pub title: Option<String>,
    pub episodes: Vec<Episode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Episode {
    pub title: Option<String>,
    pub pub_date: Option<String>,
    pub audio_url: Option<String>,
    pub guid: Option<String>,
}

impl Episode {
    /// Identity for dedup purposes: trimmed guid when present, else the raw
    /// audio url. The url is not normalized, so cosmetic url changes count
    /// as new episodes.
    pub fn key(&self) -> Option<String> {
        match self.guid.as_deref().map(str::trim) {
            Some(g) if !g.is_empty() => Some(g.to_string()),
            _ => self.audio_url.clone(),
        }
    }
}
