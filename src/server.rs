use std::io;
use std::path::Path;

use tiny_http::{Header, Method, Request, Response, Server};

use crate::render::{html, message_page, race_list_page, Page};
use crate::{
    append_refresh_log, page_for_route, split_target, DataSource, RefreshClient, RefreshLogEntry,
    RefreshOptions, Route, Session, ViewerConfig,
};

/// Refresh options for one POST: the configured defaults, with any fields the
/// request body sets (JSON object or form) taking precedence.
pub(crate) fn request_refresh_options(defaults: &RefreshOptions, body: &str) -> RefreshOptions {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return defaults.clone();
    }
    let mut merged = match serde_json::to_value(defaults) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => return defaults.clone(),
    };
    let overrides: serde_json::Map<String, serde_json::Value> = if trimmed.starts_with('{') {
        match serde_json::from_str(trimmed) {
            Ok(map) => map,
            Err(err) => {
                eprintln!("ignoring malformed update body: {err}");
                return defaults.clone();
            }
        }
    } else {
        url::form_urlencoded::parse(trimmed.as_bytes())
            .into_owned()
            .map(|(key, value)| {
                let value = match value.as_str() {
                    "true" | "on" => serde_json::Value::Bool(true),
                    "false" | "off" => serde_json::Value::Bool(false),
                    _ => serde_json::Value::String(value),
                };
                (key, value)
            })
            .collect()
    };
    for (key, value) in overrides {
        merged.insert(key, value);
    }
    serde_json::from_value(serde_json::Value::Object(merged)).unwrap_or_else(|err| {
        eprintln!("ignoring update body with bad field types: {err}");
        defaults.clone()
    })
}

/// Runs one refresh, records it, and renders the list with the outcome message.
/// The list shows whatever the session holds afterwards, so non-`ok` outcomes
/// show the data that was already on screen.
pub(crate) fn handle_update(
    session: &mut Session,
    source: &DataSource,
    refresher: &RefreshClient,
    options: &RefreshOptions,
    log_dir: &Path,
) -> Page {
    let outcome = refresher.trigger(options);
    eprintln!("refresh {}: {}", outcome.status_label(), outcome.message());
    let entry = RefreshLogEntry::new(refresher.endpoint(), options, &outcome);
    if let Err(err) = append_refresh_log(log_dir, &entry) {
        eprintln!("refresh log write failed: {err}");
    }
    let message = session.apply_refresh(&outcome, source);
    let mut page = race_list_page(session.document());
    page.notice = Some(message);
    page
}

/// Status code and page for one request.
pub(crate) fn dispatch(
    method: &Method,
    target: &str,
    body: &str,
    session: &mut Session,
    source: &DataSource,
    refresher: &RefreshClient,
    config: &ViewerConfig,
) -> (u16, Page) {
    let (path, query) = split_target(target);
    match method {
        Method::Post if path.trim_end_matches('/') == "/update" => {
            let options = request_refresh_options(&config.refresh, body);
            (
                200,
                handle_update(session, source, refresher, &options, &config.log_dir),
            )
        }
        Method::Get | Method::Head => match Route::parse(path) {
            Some(route) => (200, page_for_route(&route, query, session, source)),
            None => (404, message_page("ページが見つかりません", path)),
        },
        _ => (405, message_page("許可されていないメソッドです", path)),
    }
}

fn read_body(request: &mut Request) -> String {
    let mut body = String::new();
    if let Err(err) = request.as_reader().read_to_string(&mut body) {
        eprintln!("read body: {err}");
    }
    body
}

pub(crate) fn run_server(
    config: &ViewerConfig,
    source: DataSource,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.bind, config.port);
    let server = Server::http(&addr)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("server: {e}")))?;
    let refresher = RefreshClient::new(&config.update_url, config.timeout())?;
    eprintln!("racecard listening on http://{addr}");
    eprintln!("race data from {}", source.location(crate::RACE_FILE));

    let mut session = Session::default();
    let content_type = Header::from_bytes("Content-Type", "text/html; charset=utf-8")
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "invalid header"))?;

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let target = request.url().to_string();
        let body = if method == Method::Post {
            read_body(&mut request)
        } else {
            String::new()
        };
        let (status, page) = dispatch(
            &method,
            &target,
            &body,
            &mut session,
            &source,
            &refresher,
            config,
        );
        let response = Response::from_string(html::render_page(&page))
            .with_status_code(status)
            .with_header(content_type.clone());
        if let Err(err) = request.respond(response) {
            eprintln!("respond {target}: {err}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canned_backend;
    use crate::temp_data_dir;
    use crate::{load_recent_refreshes, RACE_FILE};
    use std::fs;
    use std::rc::Rc;
    use std::time::Duration;

    const RACES: &str = r#"{"venues": [{"name": "Tokyo", "races": [{"raceNum": 3, "title": "Test"}]}]}"#;

    fn test_config(name: &str, update_url: &str) -> ViewerConfig {
        ViewerConfig {
            update_url: update_url.to_string(),
            log_dir: std::env::temp_dir()
                .join("racecard_test")
                .join(format!("server_logs_{}_{name}", std::process::id())),
            timeout_ms: Some(5_000),
            ..ViewerConfig::default()
        }
    }

    #[test]
    fn form_and_json_bodies_override_defaults() {
        let defaults = RefreshOptions::default();
        let options = request_refresh_options(&defaults, "target=sunday&all_venues=false");
        assert_eq!(options.target.as_deref(), Some("sunday"));
        assert!(!options.all_venues);
        assert!(options.fetch_horse_detail);

        let options = request_refresh_options(&defaults, r#"{"venue": "中山", "playwright": true}"#);
        assert_eq!(options.venue.as_deref(), Some("中山"));
        assert!(options.playwright);

        assert_eq!(request_refresh_options(&defaults, ""), defaults);
        assert_eq!(request_refresh_options(&defaults, "{ broken"), defaults);
        assert_eq!(request_refresh_options(&defaults, "all_venues=maybe"), defaults);
    }

    #[test]
    fn busy_update_keeps_document_and_reports_message() {
        let dir = temp_data_dir("server_busy", &[(RACE_FILE, RACES)]);
        let source = DataSource::Dir(dir.clone());
        let (endpoint, _sent) = canned_backend(409, r#"{"status":"busy"}"#);
        let config = test_config("busy", &endpoint);
        let refresher = RefreshClient::new(&config.update_url, config.timeout()).unwrap();
        let mut session = Session::default();
        session.load(&source).unwrap();
        let before = session.handle().unwrap();

        let (status, page) = dispatch(&Method::Post, "/update", "", &mut session, &source, &refresher, &config);
        assert_eq!(status, 200);
        assert_eq!(page.notice.as_deref(), Some("update already running."));
        assert_eq!(page.tables[0].rows.len(), 1);
        assert!(Rc::ptr_eq(&before, &session.handle().unwrap()));

        let history = load_recent_refreshes(&config.log_dir, 5);
        assert_eq!(history.last().map(|e| e.status.as_str()), Some("busy"));
        fs::remove_dir_all(&dir).ok();
        fs::remove_dir_all(&config.log_dir).ok();
    }

    #[test]
    fn ok_update_reloads_document() {
        let dir = temp_data_dir("server_ok", &[(RACE_FILE, RACES)]);
        let source = DataSource::Dir(dir.clone());
        let (endpoint, _sent) = canned_backend(200, r#"{"status":"ok","generated_at":"t"}"#);
        let config = test_config("ok", &endpoint);
        let refresher = RefreshClient::new(&config.update_url, Some(Duration::from_secs(5))).unwrap();
        let mut session = Session::default();
        session.load(&source).unwrap();
        let before = session.handle().unwrap();

        let (_, page) = dispatch(&Method::Post, "/update/", "", &mut session, &source, &refresher, &config);
        assert_eq!(page.notice.as_deref(), Some("race data updated (t)."));
        assert!(!Rc::ptr_eq(&before, &session.handle().unwrap()));
        fs::remove_dir_all(&dir).ok();
        fs::remove_dir_all(&config.log_dir).ok();
    }

    #[test]
    fn unknown_routes_and_methods() {
        let dir = temp_data_dir("server_routes", &[(RACE_FILE, RACES)]);
        let source = DataSource::Dir(dir.clone());
        let config = test_config("routes", "http://127.0.0.1:1/api/update/race");
        let refresher = RefreshClient::new(&config.update_url, config.timeout()).unwrap();
        let mut session = Session::default();

        let (status, _) = dispatch(&Method::Get, "/nowhere", "", &mut session, &source, &refresher, &config);
        assert_eq!(status, 404);
        let (status, _) = dispatch(&Method::Delete, "/", "", &mut session, &source, &refresher, &config);
        assert_eq!(status, 405);
        let (status, page) = dispatch(&Method::Get, "/race/Tokyo/3?hide=odds", "", &mut session, &source, &refresher, &config);
        assert_eq!(status, 200);
        assert!(page.title.contains("Test"));
        fs::remove_dir_all(&dir).ok();
    }
}
