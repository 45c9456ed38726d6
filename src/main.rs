//! HTTP server that fetches a year of academic-schedule notices from a school
//! notice board and serves them as an ical file.

use crate::calendar::IcsWriter;
use crate::env::EnvConfiguration;
use crate::error::Result;
use crate::retriever::{Retriever, SystemClock};
use crate::upstream::HttpTransport;
use actix_web::{
    middleware::Logger,
    web::{self, Data, Query},
    App, HttpResponse, HttpServer,
};
use chrono::Utc;
use serde::Deserialize;

pub mod calendar;
pub mod env;
pub mod error;
pub mod retriever;
pub mod upstream;

#[cfg(test)]
mod testing;

pub struct AppState {
    retriever: Retriever,
    source_name: String,
}

impl AppState {
    fn from_conf(configuration: &EnvConfiguration) -> Self {
        let transport = HttpTransport::new(&configuration.board.user_agent);

        AppState {
            retriever: Retriever::new(
                configuration.board.clone(),
                Box::new(transport),
                Box::new(SystemClock),
            ),
            source_name: configuration.source_name.clone(),
        }
    }

    fn year(&self, params: &YearParams) -> i32 {
        params
            .year
            .unwrap_or_else(|| self.retriever.current_year())
    }
}

#[derive(Deserialize)]
struct YearParams {
    year: Option<i32>,
}

async fn get_json(query: Query<YearParams>, state: Data<AppState>) -> Result<HttpResponse> {
    let year = state.year(&query);
    Ok(HttpResponse::Ok().json(state.retriever.fetch_year(year).await?))
}

async fn get_ical(query: Query<YearParams>, state: Data<AppState>) -> Result<HttpResponse> {
    let year = state.year(&query);
    let notices = state.retriever.fetch_year(year).await?;

    let writer = IcsWriter::new(&state.source_name, Utc::now());
    let body = calendar::build_calendar_document(&notices, &writer)?;

    Ok(HttpResponse::Ok()
        .content_type("text/calendar; charset=utf-8")
        .header(
            "Content-Disposition",
            format!("attachment; filename=\"{}-{}.ics\"", state.source_name, year),
        )
        .body(body))
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/v1/json").to(get_json))
        .service(web::resource("/v1/ics").to(get_ical));
}

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let configuration = env::get_conf().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid configuration: {:?}", e),
        )
    })?;
    let socketaddr = configuration.socketaddr;
    log::info!("serving {} notices on {}", configuration.source_name, socketaddr);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .data(AppState::from_conf(&configuration))
            .configure(routes)
    })
    .bind(socketaddr)?
    .run()
    .await
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use crate::testing::{direct_board, notices_json, FakeTransport, FixedClock};
    use actix_web::{http::StatusCode, test};

    fn state(transport: FakeTransport) -> AppState {
        AppState {
            retriever: Retriever::new(direct_board(), Box::new(transport), Box::new(FixedClock(2025))),
            source_name: "gknu".to_owned(),
        }
    }

    fn school_year() -> FakeTransport {
        FakeTransport::new(|month| {
            Ok(match month {
                3 => notices_json(&[("Term starts", "2025-03-04", "")]),
                6 => notices_json(&[("Exams", "2025-06-16", "2025-06-20")]),
                _ => notices_json(&[]),
            })
        })
    }

    #[actix_rt::test]
    async fn test_ics_download() {
        let mut app =
            test::init_service(App::new().data(state(school_year())).configure(routes)).await;

        let req = test::TestRequest::get().uri("/v1/ics?year=2025").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let headers = resp.headers();
        assert_eq!(
            headers.get("content-type").unwrap().to_str().unwrap(),
            "text/calendar; charset=utf-8"
        );
        assert_eq!(
            headers.get("content-disposition").unwrap().to_str().unwrap(),
            "attachment; filename=\"gknu-2025.ics\""
        );

        let body = test::read_body(resp).await;
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.contains("SUMMARY:Term starts"));
        assert!(text.contains("DTSTART;VALUE=DATE:20250616"));
        assert!(text.contains("DTEND;VALUE=DATE:20250621"));
    }

    #[actix_rt::test]
    async fn test_json_defaults_to_current_year() {
        let mut app =
            test::init_service(App::new().data(state(school_year())).configure(routes)).await;

        let req = test::TestRequest::get().uri("/v1/json").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        let notices: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            notices,
            serde_json::json!([
                {"title": "Term starts", "notice_start_date": "2025-03-04", "notice_end_date": ""},
                {"title": "Exams", "notice_start_date": "2025-06-16", "notice_end_date": "2025-06-20"},
            ])
        );
    }

    #[actix_rt::test]
    async fn test_unsupported_year() {
        let transport = FakeTransport::empty();
        let calls = transport.calls.clone();
        let mut app = test::init_service(App::new().data(state(transport)).configure(routes)).await;

        let req = test::TestRequest::get().uri("/v1/ics?year=1999").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(calls.get(), 0);
    }

    #[actix_rt::test]
    async fn test_upstream_failure() {
        let transport = FakeTransport::new(|month| match month {
            11 => Err(Error::Transport("connection reset".to_owned())),
            _ => Ok(notices_json(&[])),
        });
        let mut app = test::init_service(App::new().data(state(transport)).configure(routes)).await;

        let req = test::TestRequest::get().uri("/v1/ics?year=2025").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[actix_rt::test]
    async fn test_malformed_notice() {
        let transport = FakeTransport::new(|month| {
            Ok(match month {
                5 => notices_json(&[("Holiday", "2025/05/05", "")]),
                _ => notices_json(&[]),
            })
        });
        let mut app = test::init_service(App::new().data(state(transport)).configure(routes)).await;

        let req = test::TestRequest::get().uri("/v1/ics?year=2025").to_request();
        let resp = test::call_service(&mut app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
