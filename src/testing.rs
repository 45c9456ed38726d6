//! In-memory stand-ins for the notice board and the wall clock.

use crate::error::Result;
use crate::retriever::Clock;
use crate::upstream::{NoticeBoard, Transport};
use bytes::Bytes;
use futures::future::{self, LocalBoxFuture};
use std::cell::Cell;
use std::rc::Rc;

pub struct FixedClock(pub i32);

impl Clock for FixedClock {
    fn current_year(&self) -> i32 {
        self.0
    }
}

/// Board queried without proxy, so the requested month ends the url.
pub fn direct_board() -> NoticeBoard {
    NoticeBoard {
        proxy_url: String::new(),
        ..NoticeBoard::default()
    }
}

pub fn notices_json(notices: &[(&str, &str, &str)]) -> Bytes {
    let page: Vec<serde_json::Value> = notices
        .iter()
        .map(|(title, start, end)| {
            serde_json::json!({
                "title": title,
                "notice_start_date": start,
                "notice_end_date": end,
            })
        })
        .collect();

    Bytes::from(serde_json::Value::Array(page).to_string())
}

/// Answers each month page through `respond`, counting the requests made.
pub struct FakeTransport {
    respond: Box<dyn Fn(u32) -> Result<Bytes>>,
    pub calls: Rc<Cell<usize>>,
}

impl FakeTransport {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(u32) -> Result<Bytes> + 'static,
    {
        FakeTransport {
            respond: Box::new(respond),
            calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn empty() -> Self {
        Self::new(|_| Ok(notices_json(&[])))
    }
}

impl Transport for FakeTransport {
    fn get<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<Bytes>> {
        self.calls.set(self.calls.get() + 1);

        let month = url
            .rsplit('-')
            .next()
            .and_then(|m| m.parse().ok())
            .unwrap_or(0);
        Box::pin(future::ready((self.respond)(month)))
    }
}
