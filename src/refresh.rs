use std::time::Duration;

use reqwest::blocking::Client;

use crate::{RefreshOptions, RefreshResponse, ViewError, ViewResult};

pub(crate) const BUSY_MESSAGE: &str = "update already running.";
pub(crate) const UNREACHABLE_MESSAGE: &str = "could not reach the update server.";

/// What a refresh attempt means for the UI. Exactly one variant per response,
/// and only `Updated` asks for a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RefreshOutcome {
    Updated { generated_at: Option<String> },
    Busy,
    Aborted { reason: String },
    Failed { raw: String },
    Unreachable { detail: String },
}

impl RefreshOutcome {
    /// Maps an HTTP status and body to an outcome. `busy` and `aborted` are read
    /// from the body whatever the status code (the job runner answers busy with 409).
    pub(crate) fn classify(http_status: u16, body: &str) -> Self {
        let success = (200..300).contains(&http_status);
        let parsed = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .filter(serde_json::Value::is_object)
            .and_then(|value| serde_json::from_value::<RefreshResponse>(value).ok());
        let Some(response) = parsed else {
            if success {
                return RefreshOutcome::Failed {
                    raw: body.to_string(),
                };
            }
            return RefreshOutcome::Unreachable {
                detail: format!("HTTP {http_status}"),
            };
        };
        match response.status.as_str() {
            "ok" if success => RefreshOutcome::Updated {
                generated_at: Some(response.generated_at).filter(|ts| !ts.is_empty()),
            },
            "busy" => RefreshOutcome::Busy,
            "aborted" => RefreshOutcome::Aborted {
                reason: response.reason,
            },
            _ => RefreshOutcome::Failed {
                raw: body.to_string(),
            },
        }
    }

    pub(crate) fn should_reload(&self) -> bool {
        matches!(self, RefreshOutcome::Updated { .. })
    }

    pub(crate) fn status_label(&self) -> &'static str {
        match self {
            RefreshOutcome::Updated { .. } => "ok",
            RefreshOutcome::Busy => "busy",
            RefreshOutcome::Aborted { .. } => "aborted",
            RefreshOutcome::Failed { .. } => "failed",
            RefreshOutcome::Unreachable { .. } => "unreachable",
        }
    }

    pub(crate) fn message(&self) -> String {
        match self {
            RefreshOutcome::Updated {
                generated_at: Some(ts),
            } => format!("race data updated ({ts})."),
            RefreshOutcome::Updated { generated_at: None } => "race data updated.".to_string(),
            RefreshOutcome::Busy => BUSY_MESSAGE.to_string(),
            RefreshOutcome::Aborted { reason } => format!("update skipped: {reason}"),
            RefreshOutcome::Failed { raw } => format!("update failed: {raw}"),
            RefreshOutcome::Unreachable { .. } => UNREACHABLE_MESSAGE.to_string(),
        }
    }
}

pub(crate) struct RefreshClient {
    client: Client,
    endpoint: String,
}

impl RefreshClient {
    pub(crate) fn new(endpoint: &str, timeout: Option<Duration>) -> ViewResult<Self> {
        let client = Client::builder()
            .user_agent("racecard")
            .timeout(timeout)
            .build()
            .map_err(|e| ViewError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends one refresh request and waits for its single response.
    pub(crate) fn trigger(&self, options: &RefreshOptions) -> RefreshOutcome {
        let response = match self.client.post(&self.endpoint).json(options).send() {
            Ok(response) => response,
            Err(err) => {
                eprintln!("refresh request to {} failed: {err}", self.endpoint);
                return RefreshOutcome::Unreachable {
                    detail: err.to_string(),
                };
            }
        };
        let status = response.status().as_u16();
        let body = match response.text() {
            Ok(body) => body,
            Err(err) => {
                eprintln!("refresh response from {} unreadable: {err}", self.endpoint);
                return RefreshOutcome::Unreachable {
                    detail: err.to_string(),
                };
            }
        };
        let outcome = RefreshOutcome::classify(status, &body);
        match &outcome {
            RefreshOutcome::Failed { raw } => eprintln!("refresh failed (HTTP {status}): {raw}"),
            RefreshOutcome::Unreachable { detail } => eprintln!("refresh failed: {detail}"),
            _ => {}
        }
        outcome
    }
}

/// Loopback job runner answering one request with a canned reply.
/// Returns its endpoint and a receiver for the body it was sent.
#[cfg(test)]
pub(crate) fn canned_backend(status: u16, body: &'static str) -> (String, std::sync::mpsc::Receiver<String>) {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        if let Ok(mut request) = server.recv() {
            let mut sent = String::new();
            let _ = std::io::Read::read_to_string(request.as_reader(), &mut sent);
            let _ = tx.send(sent);
            let _ = request.respond(tiny_http::Response::from_string(body).with_status_code(status));
        }
    });
    (format!("http://{addr}/api/update/race"), rx)
}
