use std::rc::Rc;

use crate::render::{
    horse_page, jockey_page, race_list_page, race_page, static_page, Page,
};
use crate::{
    horse_or_empty, jockey_or_empty, DataSource, RaceDocument, RefreshOutcome, Route, ViewResult,
    ViewState,
};

/// The race document currently on screen. Replaced wholesale on a successful
/// load and cleared on a failed one; never patched in place.
#[derive(Debug, Default)]
pub(crate) struct Session {
    document: Option<Rc<RaceDocument>>,
    last_error: Option<String>,
}

impl Session {
    pub(crate) fn document(&self) -> Option<&RaceDocument> {
        self.document.as_deref()
    }

    #[cfg(test)]
    pub(crate) fn handle(&self) -> Option<Rc<RaceDocument>> {
        self.document.clone()
    }

    pub(crate) fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn load(&mut self, source: &DataSource) -> ViewResult<()> {
        match source.race_document() {
            Ok(document) => {
                if document.is_empty() {
                    eprintln!("race data at {} has no venues", source.location(crate::RACE_FILE));
                }
                self.document = Some(Rc::new(document));
                self.last_error = None;
                Ok(())
            }
            Err(err) => {
                eprintln!("race data load failed: {err}");
                self.document = None;
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Reloads only for `Updated`; every other outcome leaves the document alone.
    /// Returns the message to show.
    pub(crate) fn apply_refresh(&mut self, outcome: &RefreshOutcome, source: &DataSource) -> String {
        let message = outcome.message();
        if !outcome.should_reload() {
            return message;
        }
        match self.load(source) {
            Ok(()) => message,
            Err(err) => format!("{message} reload failed: {err}"),
        }
    }
}

const LOAD_FAILED_NOTICE: &str = "データを取得できませんでした";

/// Builds the page for a route, loading whatever the view needs. Loads that fail
/// produce an empty page with a notice, never an error.
pub(crate) fn page_for_route(
    route: &Route,
    query: &str,
    session: &mut Session,
    source: &DataSource,
) -> Page {
    match route {
        Route::RaceList => {
            let loaded = session.load(source).is_ok();
            let mut page = race_list_page(session.document());
            if !loaded {
                page.notice = Some(LOAD_FAILED_NOTICE.to_string());
            }
            page
        }
        Route::Race { venue, race_number } => {
            let loaded = session.load(source).is_ok();
            let view = ViewState::from_query(query);
            let mut page = race_page(session.document(), venue, race_number, &view);
            if !loaded {
                page.notice = Some(LOAD_FAILED_NOTICE.to_string());
            }
            page
        }
        Route::Horse { name } => {
            let index = source
                .horse_index()
                .map_err(|err| eprintln!("horse data load failed: {err}"))
                .ok();
            horse_page(&horse_or_empty(index.as_ref(), name))
        }
        Route::Jockey { name } => {
            let index = source
                .jockey_index()
                .map_err(|err| eprintln!("jockey data load failed: {err}"))
                .ok();
            jockey_page(&jockey_or_empty(index.as_ref(), name))
        }
        Route::About | Route::Help => static_page(route).unwrap_or_default(),
    }
}
