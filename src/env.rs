use crate::upstream::NoticeBoard;
use std::net::{Ipv4Addr, SocketAddr};

#[derive(Debug)]
pub enum EnvErrorKind {
    Env(std::env::VarError),
    Parse,
}

#[derive(Debug)]
pub struct EnvError<'a>(&'a str, EnvErrorKind);

pub fn var<T: std::str::FromStr>(key: &'static str) -> Result<T, EnvError<'static>> {
    let str = std::env::var(key).map_err(|e| EnvError(key, EnvErrorKind::Env(e)))?;
    str.parse().or(Err(EnvError(key, EnvErrorKind::Parse)))
}

pub fn with_default<'a, T>(
    var_opt: Result<T, EnvError<'a>>,
    default: T,
) -> Result<T, EnvError<'a>> {
    match var_opt {
        Err(EnvError(_, EnvErrorKind::Env(std::env::VarError::NotPresent))) => Ok(default),
        res => res,
    }
}

pub fn get_conf<'a>() -> Result<EnvConfiguration, EnvError<'a>> {
    let socketaddr = with_default(
        var("GKNU_CALENDAR_SOCKETADDR"),
        SocketAddr::from((Ipv4Addr::LOCALHOST, 8080)),
    )?;

    let defaults = NoticeBoard::default();
    let board = NoticeBoard {
        base_url: with_default(var("GKNU_CALENDAR_BASE_URL"), defaults.base_url)?,
        category: with_default(var("GKNU_CALENDAR_CATEGORY"), defaults.category)?,
        proxy_url: with_default(var("GKNU_CALENDAR_PROXY_URL"), defaults.proxy_url)?,
        user_agent: with_default(var("GKNU_CALENDAR_USER_AGENT"), defaults.user_agent)?,
    };

    let source_name = with_default(var("GKNU_CALENDAR_SOURCE_NAME"), "gknu".to_owned())?;

    Ok(EnvConfiguration {
        socketaddr,
        board,
        source_name,
    })
}

#[derive(Clone, Debug)]
pub struct EnvConfiguration {
    pub socketaddr: SocketAddr,
    pub board: NoticeBoard,
    /// Prefix of the downloaded file name, `<source_name>-<year>.ics`.
    pub source_name: String,
}
