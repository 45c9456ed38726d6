use crate::error::{Error, Result};
use crate::upstream::{NoticeBoard, Transport};
use chrono::{Datelike, Local};
use futures::future::try_join_all;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The notice board has nothing published before this year.
pub const FIRST_SUPPORTED_YEAR: i32 = 2000;

/// A schedule notice as published by the notice board.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct NoticeRecord {
    pub title: String,
    #[serde(rename = "notice_start_date")]
    pub start_date: String,
    /// Blank when the notice lasts a single day.
    #[serde(rename = "notice_end_date")]
    pub end_date: String,
}

pub trait Clock {
    fn current_year(&self) -> i32;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn current_year(&self) -> i32 {
        Local::now().year()
    }
}

/// Decodes a month page into notice records.
///
/// The proxy wraps the page in an object whose `contents` field holds the
/// page as a string; that wrapper is removed first. Every element must
/// carry the three string fields or the whole page is rejected.
pub fn decode_notices(body: &[u8]) -> Result<Vec<NoticeRecord>> {
    let value: Value = serde_json::from_slice(body)?;

    let page = match value {
        Value::Object(mut envelope) => match envelope.remove("contents") {
            Some(Value::String(contents)) => serde_json::from_str(&contents)?,
            _ => {
                return Err(Error::Format(
                    "proxy answer carries no page contents".to_owned(),
                ))
            }
        },
        page => page,
    };

    Ok(serde_json::from_value(page)?)
}

pub struct Retriever {
    board: NoticeBoard,
    transport: Box<dyn Transport>,
    clock: Box<dyn Clock>,
}

impl Retriever {
    pub fn new(board: NoticeBoard, transport: Box<dyn Transport>, clock: Box<dyn Clock>) -> Self {
        Retriever {
            board,
            transport,
            clock,
        }
    }

    pub fn current_year(&self) -> i32 {
        self.clock.current_year()
    }

    /// Whether the notice board can be asked about `year`: from 2000 up to
    /// and including next year.
    pub fn is_supported_year(&self, year: i32) -> bool {
        year >= FIRST_SUPPORTED_YEAR && year <= self.current_year() + 1
    }

    /// Fetches all twelve months of `year` concurrently and concatenates them
    /// in month order. The first failing month fails the whole year.
    pub async fn fetch_year(&self, year: i32) -> Result<Vec<NoticeRecord>> {
        if !self.is_supported_year(year) {
            return Err(Error::InvalidYear(year));
        }

        let months = try_join_all((1..=12).map(|month| self.fetch_month(year, month))).await?;
        let notices: Vec<NoticeRecord> = months.into_iter().flatten().collect();

        info!("fetched {} notices for {}", notices.len(), year);
        Ok(notices)
    }

    pub async fn fetch_month(&self, year: i32, month: u32) -> Result<Vec<NoticeRecord>> {
        if !self.is_supported_year(year) {
            return Err(Error::InvalidYear(year));
        }
        if month < 1 || month > 12 {
            return Err(Error::InvalidMonth(month));
        }

        let url = self.board.month_url(year, month)?;
        debug!("fetching notices for {}-{:02} from {}", year, month, url);

        let notices = self
            .transport
            .get(&url)
            .await
            .and_then(|body| decode_notices(&body))
            .map_err(|e| {
                warn!("notices for {}-{:02} unavailable: {}", year, month, e);
                e
            })?;

        debug!("{}-{:02} has {} notices", year, month, notices.len());
        Ok(notices)
    }
}
