use actix_web::{client::SendRequestError, HttpResponse, ResponseError};
use awc::error::PayloadError;
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
pub enum Error {
    /// Year outside of what the notice board publishes.
    InvalidYear(i32),
    /// Month outside of `1..=12`; never reachable through `fetch_year`.
    InvalidMonth(u32),
    Transport(String),
    Format(String),
    Serialization(String),
    EmptyResult,
}

impl core::convert::From<SendRequestError> for Error {
    fn from(e: SendRequestError) -> Self {
        Error::Transport(e.to_string())
    }
}

impl core::convert::From<PayloadError> for Error {
    fn from(e: PayloadError) -> Self {
        Error::Transport(e.to_string())
    }
}

impl core::convert::From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Format(e.to_string())
    }
}

impl core::convert::From<serde_qs::Error> for Error {
    fn from(e: serde_qs::Error) -> Self {
        Error::Transport(format!("cannot build request url: {}", e))
    }
}

pub type Result<T> = core::result::Result<T, Error>;

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        core::fmt::Debug::fmt(self, f)
    }
}

impl ResponseError for Error {
    fn error_response(&self) -> HttpResponse {
        let mut response = match self {
            Error::InvalidYear(_) => HttpResponse::BadRequest(),
            Error::InvalidMonth(_) => HttpResponse::InternalServerError(),
            Error::Transport(_) => HttpResponse::ServiceUnavailable(),
            Error::Format(_) => HttpResponse::BadGateway(),
            Error::Serialization(_) => HttpResponse::InternalServerError(),
            Error::EmptyResult => HttpResponse::InternalServerError(),
        };

        response.json(self)
    }
}
