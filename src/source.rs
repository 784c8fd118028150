use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::{HorseIndex, JockeyIndex, RaceDocument, ViewError, ViewResult, ViewerConfig};

pub(crate) const RACE_FILE: &str = "RaceTest.json";
pub(crate) const HORSE_FILE: &str = "HorseTest.json";
pub(crate) const JOCKEY_FILE: &str = "JockeyTest.json";

/// Where the exported JSON documents come from. All reads are idempotent.
pub(crate) enum DataSource {
    /// `GET <base_url>/server/<file>`.
    Http { base_url: String, client: Client },
    /// A directory holding the files directly or under `server/`.
    Dir(PathBuf),
}

impl DataSource {
    pub(crate) fn http(base_url: &str, timeout: Option<Duration>) -> ViewResult<Self> {
        let client = Client::builder()
            .user_agent("racecard")
            .timeout(timeout)
            .build()
            .map_err(|e| ViewError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(DataSource::Http {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub(crate) fn from_config(config: &ViewerConfig) -> ViewResult<Self> {
        match &config.data_dir {
            Some(dir) => Ok(DataSource::Dir(dir.clone())),
            None => DataSource::http(&config.data_url, config.timeout()),
        }
    }

    pub(crate) fn location(&self, file: &str) -> String {
        match self {
            DataSource::Http { base_url, .. } => format!("{base_url}/server/{file}"),
            DataSource::Dir(dir) => {
                let nested = dir.join("server").join(file);
                if nested.is_file() {
                    nested.display().to_string()
                } else {
                    dir.join(file).display().to_string()
                }
            }
        }
    }

    fn fetch_text(&self, file: &str) -> ViewResult<String> {
        let location = self.location(file);
        match self {
            DataSource::Http { client, .. } => {
                let response = client
                    .get(&location)
                    .send()
                    .map_err(|e| ViewError::transport(&location, e))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ViewError::transport(&location, format!("HTTP {}", status.as_u16())));
                }
                response.text().map_err(|e| ViewError::transport(&location, e))
            }
            DataSource::Dir(_) => {
                std::fs::read_to_string(&location).map_err(|e| ViewError::transport(&location, e))
            }
        }
    }

    pub(crate) fn race_document(&self) -> ViewResult<RaceDocument> {
        RaceDocument::from_json(&self.fetch_text(RACE_FILE)?)
    }

    pub(crate) fn horse_index(&self) -> ViewResult<HorseIndex> {
        Ok(serde_json::from_str(&self.fetch_text(HORSE_FILE)?)?)
    }

    pub(crate) fn jockey_index(&self) -> ViewResult<JockeyIndex> {
        Ok(serde_json::from_str(&self.fetch_text(JOCKEY_FILE)?)?)
    }
}

/// Fresh directory under the temp dir; `files` are written into `server/`.
#[cfg(test)]
pub(crate) fn temp_data_dir(name: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = std::env::temp_dir()
        .join("racecard_test")
        .join(format!("data_{}_{name}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("server")).unwrap();
    for (file, body) in files {
        std::fs::write(dir.join("server").join(file), body).unwrap();
    }
    dir
}
