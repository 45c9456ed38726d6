use crate::error::{Error, Result};
use actix_web::client::{Client, ClientBuilder};
use bytes::Bytes;
use futures::future::LocalBoxFuture;
use serde::Serialize;

/// Largest month page we accept from the notice board.
const BODY_LIMIT: usize = 4 * 1024 * 1024;

/// Where and how the schedule of the notice board is queried.
#[derive(Clone, Debug)]
pub struct NoticeBoard {
    pub base_url: String,
    pub category: String,
    /// Pass-through proxy receiving the notice board url in its `url`
    /// parameter. Empty to query the notice board directly.
    pub proxy_url: String,
    pub user_agent: String,
}

impl Default for NoticeBoard {
    fn default() -> Self {
        NoticeBoard {
            base_url: "https://www.gknu.ac.kr".to_owned(),
            category: "101".to_owned(),
            proxy_url: "https://api.allorigins.win/get".to_owned(),
            user_agent: "gknu-calendar".to_owned(),
        }
    }
}

#[derive(Serialize)]
struct ScheduleQuery<'a> {
    category1: &'a str,
    notice_start_date: String,
}

#[derive(Serialize)]
struct ProxyQuery<'a> {
    url: &'a str,
}

impl NoticeBoard {
    /// Url of the schedule page for a single month, routed through the proxy
    /// when one is configured.
    pub fn month_url(&self, year: i32, month: u32) -> Result<String> {
        let query = serde_qs::to_string(&ScheduleQuery {
            category1: &self.category,
            notice_start_date: format!("{:04}-{:02}", year, month),
        })?;
        let board_url = format!(
            "{}/main/module/schedule/view.do?{}",
            self.base_url.trim_end_matches('/'),
            query
        );

        if self.proxy_url.is_empty() {
            return Ok(board_url);
        }

        let proxied = serde_qs::to_string(&ProxyQuery { url: &board_url })?;
        Ok(format!("{}?{}", self.proxy_url, proxied))
    }
}

/// Fetches raw response bodies. Anything but a successful status is an error.
pub trait Transport {
    fn get<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<Bytes>>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str) -> Self {
        let client = ClientBuilder::new()
            .no_default_headers()
            .header("User-Agent", user_agent)
            .finish();

        HttpTransport { client }
    }
}

impl Transport for HttpTransport {
    fn get<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<Bytes>> {
        Box::pin(async move {
            let mut response = self.client.get(url).send().await?;
            if !response.status().is_success() {
                return Err(Error::Transport(format!(
                    "{} answered {}",
                    url,
                    response.status()
                )));
            }

            Ok(response.body().limit(BODY_LIMIT).await?)
        })
    }
}
