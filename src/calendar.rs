//! Conversion of notices into an iCalendar document of all-day events.

use crate::error::{Error, Result};
use crate::retriever::NoticeRecord;
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt::Write;

/// `(year, month, day)` as written in a notice, without range checks.
pub type Ymd = (i32, u32, u32);

/// An all-day event. `end` is exclusive: the day after the last day of the
/// notice.
#[derive(Clone, Debug, PartialEq)]
pub struct CalendarEvent {
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Turns calendar events into text. Gets the complete list in one call.
pub trait CalendarWriter {
    fn write(&self, events: &[CalendarEvent]) -> Result<String>;
}

/// Splits `YYYY-MM-DD` into its three numbers.
pub fn parse_date(date: &str) -> Result<Ymd> {
    let invalid = || Error::Format(format!("invalid date {:?}", date));

    let parts: Vec<&str> = date.split('-').map(str::trim).collect();
    match parts.as_slice() {
        [year, month, day] => Ok((
            year.parse().map_err(|_| invalid())?,
            month.parse().map_err(|_| invalid())?,
            day.parse().map_err(|_| invalid())?,
        )),
        _ => Err(invalid()),
    }
}

fn to_day(date: &str) -> Result<NaiveDate> {
    let (year, month, day) = parse_date(date)?;
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::Format(format!("{:?} is not a calendar day", date)))
}

pub fn to_calendar_events(notices: &[NoticeRecord]) -> Result<Vec<CalendarEvent>> {
    notices
        .iter()
        .map(|notice| {
            let start = to_day(&notice.start_date)?;
            let last = if notice.end_date.trim().is_empty() {
                start
            } else {
                to_day(&notice.end_date)?
            };

            if last < start {
                return Err(Error::Format(format!(
                    "{:?} ends on {} before it starts on {}",
                    notice.title, last, start
                )));
            }

            let end = last.succ_opt().ok_or_else(|| {
                Error::Format(format!("{:?} ends past the last representable day", notice.title))
            })?;

            Ok(CalendarEvent {
                title: notice.title.clone(),
                start,
                end,
            })
        })
        .collect()
}

/// Builds the complete calendar for `notices`. Any notice that cannot be
/// converted fails the whole document.
pub fn build_calendar_document(
    notices: &[NoticeRecord],
    writer: &dyn CalendarWriter,
) -> Result<String> {
    let events = to_calendar_events(notices)?;
    let text = writer.write(&events)?;

    if text.is_empty() {
        return Err(Error::EmptyResult);
    }

    Ok(text)
}

fn instant_to_icalstr(t: &DateTime<Utc>) -> String {
    t.format("%Y%m%dT%H%M%SZ").to_string()
}

fn day_to_icalstr(d: &NaiveDate) -> String {
    d.format("%Y%m%d").to_string()
}

// RFC 5545 section 3.3.11
fn escape_text(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | ';' | ',' => {
                res.push('\\');
                res.push(c);
            }
            '\n' => res.push_str("\\n"),
            '\r' => (),
            c => res.push(c),
        }
    }
    res
}

/// Writes events with the `ics` crate.
///
/// The DTSTAMP is fixed at construction and UIDs only depend on the event's
/// position and dates, so the same input always gives the same text.
pub struct IcsWriter {
    source_name: String,
    stamp: DateTime<Utc>,
}

impl IcsWriter {
    pub fn new(source_name: &str, stamp: DateTime<Utc>) -> Self {
        IcsWriter {
            source_name: source_name.to_owned(),
            stamp,
        }
    }
}

impl CalendarWriter for IcsWriter {
    fn write(&self, events: &[CalendarEvent]) -> Result<String> {
        use ics::{components::Parameter, properties::*, ICalendar};

        let mut calendar = ICalendar::new("2.0", format!("-//{}-calendar//EN", self.source_name));
        calendar.push(CalScale::new("GREGORIAN"));
        calendar.push(Method::new("PUBLISH"));

        let stamp = instant_to_icalstr(&self.stamp);
        for (index, e) in events.iter().enumerate() {
            let start = day_to_icalstr(&e.start);
            let end = day_to_icalstr(&e.end);

            let uid = format!("{}-{}-{}@{}-calendar", index, start, end, self.source_name);
            let mut event = ics::Event::new(uid, stamp.clone());
            event.push(Summary::new(escape_text(&e.title)));

            let mut dtstart = DtStart::new(start);
            dtstart.add(Parameter::new("VALUE", "DATE"));
            event.push(dtstart);

            let mut dtend = DtEnd::new(end);
            dtend.add(Parameter::new("VALUE", "DATE"));
            event.push(dtend);

            calendar.add_event(event);
        }

        let mut text = String::new();
        write!(text, "{}", calendar).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(text)
    }
}
