// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turns the header block returned by `UID FETCH ... BODY.PEEK[HEADER]`
//! into [`MessageHeaders`].

use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;
use mail_parser::{Addr, HeaderValue, Message};

use crate::imap::types::MessageHeaders;

const ZONELESS_FORMATS: [&str; 4] = [
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%a, %d %b %Y %H:%M",
    "%d %b %Y %H:%M",
];

/// Parses a raw RFC 5322 header block. Missing or unparseable fields come
/// back as `None`.
pub fn parse_header_block(raw: &[u8]) -> MessageHeaders {
    let Some(parsed) = Message::parse(raw) else {
        debug!("Header block of {} byte(s) could not be parsed", raw.len());
        return MessageHeaders::default();
    };

    let subject = parsed
        .subject()
        .map(str::to_string)
        .or_else(|| unfolded(&parsed, "Subject"));
    let from = format_sender(parsed.from()).or_else(|| unfolded(&parsed, "From"));
    let date = unfolded(&parsed, "Date").and_then(|value| {
        let date = parse_date(&value);
        if date.is_none() {
            debug!("Unparseable Date header: {:?}", value);
        }
        date
    });

    MessageHeaders {
        subject: non_empty(subject),
        from: non_empty(from),
        date,
    }
}

/// Raw value of a header with folding whitespace collapsed.
fn unfolded(message: &Message<'_>, name: &str) -> Option<String> {
    message
        .header_raw(name)
        .map(|value| value.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn format_addr(addr: &Addr<'_>) -> Option<String> {
    match (addr.name.as_deref(), addr.address.as_deref()) {
        (Some(name), Some(address)) => Some(format!("{} <{}>", name, address)),
        (None, Some(address)) => Some(address.to_string()),
        (Some(name), None) => Some(name.to_string()),
        (None, None) => None,
    }
}

fn format_sender(value: &HeaderValue<'_>) -> Option<String> {
    match value {
        HeaderValue::Address(addr) => format_addr(addr),
        HeaderValue::AddressList(list) => list.iter().find_map(format_addr),
        HeaderValue::Text(text) => Some(text.to_string()),
        _ => None,
    }
}

/// Drops a trailing `(comment)` and, when `keep_offset` is false, the
/// trailing zone token as well (`+0200`, `GMT`, `EDT`...).
fn strip_zone(value: &str, keep_offset: bool) -> &str {
    let mut trimmed = value.trim();
    if trimmed.ends_with(')') {
        if let Some(open) = trimmed.rfind('(') {
            trimmed = trimmed[..open].trim_end();
        }
    }
    if keep_offset {
        return trimmed;
    }
    match trimmed.rsplit_once(' ') {
        Some((head, last)) if !last.contains(':') => head.trim_end(),
        _ => trimmed,
    }
}

/// Parses a `Date:` header value.
///
/// RFC 2822 first; failing that, the zone is stripped and the remaining
/// wall-clock time is taken as UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    for candidate in [value.trim(), strip_zone(value, true)] {
        if let Ok(date) = DateTime::parse_from_rfc2822(candidate) {
            return Some(date.with_timezone(&Utc));
        }
    }

    let zoneless = strip_zone(value, false);
    ZONELESS_FORMATS.iter().find_map(|format| {
        NaiveDateTime::parse_from_str(zoneless, format)
            .ok()
            .map(|naive| naive.and_utc())
    })
}
