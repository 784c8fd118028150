// Module declarations
mod cli;
mod config;
mod errors;
mod locator;
mod profiles;
mod refresh;
mod refresh_log;
mod render;
mod routes;
mod server;
mod session;
mod source;
mod types;
mod view;

// Re-export module items at crate root so cross-module references stay short.
#[allow(unused_imports)]
pub(crate) use cli::*;
#[allow(unused_imports)]
pub(crate) use config::*;
#[allow(unused_imports)]
pub(crate) use errors::*;
#[allow(unused_imports)]
pub(crate) use locator::*;
#[allow(unused_imports)]
pub(crate) use profiles::*;
#[allow(unused_imports)]
pub(crate) use refresh::*;
#[allow(unused_imports)]
pub(crate) use refresh_log::*;
#[allow(unused_imports)]
pub(crate) use routes::*;
#[allow(unused_imports)]
pub(crate) use server::*;
#[allow(unused_imports)]
pub(crate) use session::*;
#[allow(unused_imports)]
pub(crate) use source::*;
#[allow(unused_imports)]
pub(crate) use types::*;
#[allow(unused_imports)]
pub(crate) use view::*;

use chrono::{TimeZone, Utc};
use clap::Parser;
use serde::Serialize;

use render::{horse_page, jockey_page, race_list_page, race_page, text};

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn view_from_flags(
    hide: &[String],
    show: &[String],
    toggle: &[String],
    marks: &[String],
) -> Result<ViewState, Box<dyn std::error::Error>> {
    let mut view = ViewState::default();
    for col in show {
        view.set_visible(col.parse::<Column>()?, true);
    }
    for col in hide {
        view.set_visible(col.parse::<Column>()?, false);
    }
    for col in toggle {
        view.toggle(col.parse::<Column>()?);
    }
    for raw in marks {
        match parse_mark_assignment(raw)? {
            (num, Some(mark)) => view.set_mark(&num, mark),
            (num, None) => {
                view.clear_mark(&num);
            }
        }
    }
    Ok(view)
}

fn load_session(source: &DataSource) -> Session {
    let mut session = Session::default();
    // A failed load leaves an empty session; the views render around it.
    let _ = session.load(source);
    session
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut overrides = cli.global.overrides();
    if let Command::Serve { bind, port } = &cli.command {
        overrides.bind = bind.clone();
        overrides.port = *port;
    }
    let config = resolve_config(&overrides)?;
    let json = cli.global.json;

    match cli.command {
        Command::List => {
            let source = DataSource::from_config(&config)?;
            let session = load_session(&source);
            if json {
                return print_json(&session.document());
            }
            let mut page = race_list_page(session.document());
            if let Some(err) = session.last_error() {
                page.notice = Some(err.to_string());
            }
            print!("{}", text::render_page(&page));
            Ok(())
        }

        Command::Race {
            venue,
            race_number,
            hide,
            show,
            toggle,
            marks,
        } => {
            let view = view_from_flags(&hide, &show, &toggle, &marks)?;
            let source = DataSource::from_config(&config)?;
            let session = load_session(&source);
            let venue = decode_segment(&venue).into_owned();
            let race_number = decode_segment(&race_number).into_owned();
            if json {
                return print_json(&locate_or_placeholder(
                    session.document(),
                    &venue,
                    &race_number,
                ));
            }
            let page = race_page(session.document(), &venue, &race_number, &view);
            print!("{}", text::render_page(&page));
            Ok(())
        }

        Command::Horse { name } => {
            let source = DataSource::from_config(&config)?;
            let index = source
                .horse_index()
                .map_err(|err| eprintln!("horse data load failed: {err}"))
                .ok();
            let profile = match index.as_ref().and_then(|index| find_horse(index, &name)) {
                Some(found) => found.clone(),
                None => horse_or_empty(None, &decode_segment(&name)),
            };
            if json {
                return print_json(&profile);
            }
            print!("{}", text::render_page(&horse_page(&profile)));
            Ok(())
        }

        Command::Jockey { name } => {
            let source = DataSource::from_config(&config)?;
            let index = source
                .jockey_index()
                .map_err(|err| eprintln!("jockey data load failed: {err}"))
                .ok();
            let profile = match index.as_ref().and_then(|index| find_jockey(index, &name)) {
                Some(found) => found.clone(),
                None => jockey_or_empty(None, &decode_segment(&name)),
            };
            if json {
                return print_json(&profile);
            }
            print!("{}", text::render_page(&jockey_page(&profile)));
            Ok(())
        }

        Command::Open { route } => {
            let Some(parsed) = Route::parse(&route) else {
                return Err(ViewError::not_found("route", route).into());
            };
            let (_, query) = split_target(&route);
            let source = DataSource::from_config(&config)?;
            let mut session = Session::default();
            let page = page_for_route(&parsed, query, &mut session, &source);
            print!("{}", text::render_page(&page));
            Ok(())
        }

        Command::Update {
            target,
            venue,
            url,
            playwright,
            strict,
            single_venue,
            skip_horse_detail,
            skip_jockey_detail,
        } => {
            let mut options = config.refresh.clone();
            if target.is_some() {
                options.target = target;
            }
            if venue.is_some() {
                options.venue = venue;
            }
            if url.is_some() {
                options.url = url;
            }
            options.playwright |= playwright;
            options.allow_partial &= !strict;
            options.all_venues &= !single_venue;
            options.fetch_horse_detail &= !skip_horse_detail;
            options.fetch_jockey_detail &= !skip_jockey_detail;

            let refresher = RefreshClient::new(&config.update_url, config.timeout())?;
            let source = DataSource::from_config(&config)?;
            let mut session = Session::default();
            let outcome = refresher.trigger(&options);
            let entry = RefreshLogEntry::new(refresher.endpoint(), &options, &outcome);
            if let Err(err) = append_refresh_log(&config.log_dir, &entry) {
                eprintln!("refresh log write failed: {err}");
            }
            let message = session.apply_refresh(&outcome, &source);
            if json {
                return print_json(&entry);
            }
            println!("{message}");
            if let Some(document) = session.document() {
                println!("loaded {} races", list_entries(document).len());
            }
            Ok(())
        }

        Command::Serve { .. } => {
            let source = DataSource::from_config(&config)?;
            run_server(&config, source)
        }

        Command::History { limit } => {
            let entries = load_recent_refreshes(&config.log_dir, limit);
            if json {
                return print_json(&entries);
            }
            if entries.is_empty() {
                println!("No refresh history in {}", config.log_dir.display());
                return Ok(());
            }
            for entry in entries {
                let when = Utc
                    .timestamp_opt(entry.ts_utc, 0)
                    .single()
                    .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| entry.ts_utc.to_string());
                println!("{when}  {:<11}  {}", entry.status, entry.message);
            }
            Ok(())
        }

        Command::Config { command } => match command {
            ConfigCommand::Show => print_json(&config),
            ConfigCommand::Init { force } => {
                let path = config_file_path(&overrides);
                if path.exists() && !force {
                    eprintln!("Refusing to overwrite existing file: {}", path.display());
                    std::process::exit(2);
                }
                let defaults = ViewerConfig::default();
                let file = FileConfig {
                    data_url: Some(defaults.data_url),
                    data_dir: None,
                    update_url: Some(defaults.update_url),
                    log_dir: Some(defaults.log_dir),
                    timeout_ms: None,
                    bind: Some(defaults.bind),
                    port: Some(defaults.port),
                    refresh: Some(defaults.refresh),
                };
                save_file_config(&path, &file)?;
                println!("Wrote {}", path.display());
                Ok(())
            }
        },
    }
}
