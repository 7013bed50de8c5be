pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod roles;

pub use db::DbPool;

use config::Config;
use tokio::sync::broadcast;

use crate::api::books::BookEvent;

/// How many book events may queue per subscriber before the oldest are
/// dropped. Feed subscribers rebuild from the database on lag, so a small
/// buffer is enough.
const BOOK_EVENT_CAPACITY: usize = 64;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub book_events: broadcast::Sender<BookEvent>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        let (book_events, _) = broadcast::channel(BOOK_EVENT_CAPACITY);
        Self {
            config,
            db,
            book_events,
        }
    }
}
