//! Minimal RFC 5545 support: enough to read the start date and summary of
//! each VEVENT in a feed, and to write all-day events.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

const MAX_LINE_OCTETS: usize = 75;

/// Start of an event as written in the feed.
#[derive(Clone, Debug, PartialEq)]
pub enum EventStart {
    Date(NaiveDate),
    /// Local time with no zone attached.
    Floating(NaiveDateTime),
    Utc(DateTime<Utc>),
    /// Local time in a named zone (`DTSTART;TZID=Europe/Paris:...`).
    Zoned { zone: String, local: NaiveDateTime },
}

impl EventStart {
    /// The calendar day the event starts on, as seen from `time_zone`.
    /// Zoned times in an unknown zone keep their local date.
    pub fn date_in(&self, time_zone: Tz) -> NaiveDate {
        match self {
            EventStart::Date(date) => *date,
            EventStart::Floating(local) => local.date(),
            EventStart::Utc(instant) => instant.with_timezone(&time_zone).date_naive(),
            EventStart::Zoned { zone, local } => zone
                .parse::<Tz>()
                .ok()
                .and_then(|zone| zone.from_local_datetime(local).earliest())
                .map_or(local.date(), |start| {
                    start.with_timezone(&time_zone).date_naive()
                }),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Event {
    pub uid: Option<String>,
    pub summary: Option<String>,
    pub start: Option<EventStart>,
}

struct ContentLine<'a> {
    name: String,
    params: Vec<(String, &'a str)>,
    value: &'a str,
}

impl ContentLine<'_> {
    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.trim_matches('"'))
    }
}

/// Every VEVENT of every VCALENDAR in `text`. Lines that cannot be parsed are
/// skipped, as are properties of components nested inside an event.
pub fn parse(text: &str) -> Vec<Event> {
    let mut events = Vec::new();
    let mut current: Option<Event> = None;
    // Components opened inside the current event, such as VALARM.
    let mut nested = 0usize;

    for line in unfold(text) {
        let Some(line) = content_line(&line) else {
            continue;
        };
        match (line.name.as_str(), line.value.to_ascii_uppercase().as_str()) {
            ("BEGIN", "VEVENT") if current.is_none() => current = Some(Event::default()),
            ("BEGIN", _) if current.is_some() => nested += 1,
            ("END", "VEVENT") if nested == 0 => {
                if let Some(event) = current.take() {
                    events.push(event);
                }
            }
            ("END", _) if nested > 0 => nested -= 1,
            _ => {
                if nested > 0 {
                    continue;
                }
                let Some(event) = current.as_mut() else {
                    continue;
                };
                match line.name.as_str() {
                    "UID" => event.uid = Some(unescape(line.value)),
                    "SUMMARY" => event.summary = Some(unescape(line.value)),
                    "DTSTART" => event.start = event_start(&line),
                    _ => {}
                }
            }
        }
    }

    events
}

fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for raw in text.split('\n') {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if let Some(continuation) = raw.strip_prefix([' ', '\t'])
            && let Some(last) = lines.last_mut()
        {
            last.push_str(continuation);
        } else if !raw.is_empty() {
            lines.push(raw.to_string());
        }
    }
    lines
}

fn content_line(line: &str) -> Option<ContentLine<'_>> {
    // The value starts after the first colon that is not inside a quoted parameter.
    let mut quoted = false;
    let mut colon = None;
    for (index, c) in line.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ':' if !quoted => {
                colon = Some(index);
                break;
            }
            _ => {}
        }
    }
    let colon = colon?;
    let (head, value) = (&line[..colon], &line[colon + 1..]);

    let mut parts = split_unquoted(head, ';').into_iter();
    let name = parts.next()?.trim().to_ascii_uppercase();
    if name.is_empty() {
        return None;
    }
    let params = parts
        .filter_map(|param| {
            let (key, value) = param.split_once('=')?;
            Some((key.trim().to_ascii_uppercase(), value))
        })
        .collect();

    Some(ContentLine {
        name,
        params,
        value,
    })
}

fn split_unquoted(s: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quoted = false;
    let mut start = 0;
    for (index, c) in s.char_indices() {
        if c == '"' {
            quoted = !quoted;
        } else if c == separator && !quoted {
            parts.push(&s[start..index]);
            start = index + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

fn event_start(line: &ContentLine<'_>) -> Option<EventStart> {
    let value = line.value.trim();
    if line
        .param("VALUE")
        .is_some_and(|kind| kind.eq_ignore_ascii_case("DATE"))
        || value.len() == 8
    {
        return NaiveDate::parse_from_str(value, "%Y%m%d")
            .ok()
            .map(EventStart::Date);
    }

    if let Some(utc) = value.strip_suffix('Z') {
        let local = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").ok()?;
        return Some(EventStart::Utc(local.and_utc()));
    }

    let local = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").ok()?;
    Some(match line.param("TZID") {
        Some(zone) => EventStart::Zoned {
            zone: zone.to_string(),
            local,
        },
        None => EventStart::Floating(local),
    })
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

/// Writes a single VCALENDAR of all-day events.
pub struct CalendarWriter {
    out: String,
    stamp: String,
}

impl CalendarWriter {
    pub fn new(name: &str, stamp: DateTime<Utc>) -> Self {
        let mut writer = CalendarWriter {
            out: String::new(),
            stamp: stamp.format("%Y%m%dT%H%M%SZ").to_string(),
        };
        writer.line("BEGIN:VCALENDAR");
        writer.line("VERSION:2.0");
        writer.line(concat!(
            "PRODID:-//release-calendar//",
            env!("CARGO_PKG_VERSION"),
            "//EN"
        ));
        writer.line(&format!("X-WR-CALNAME:{}", escape(name)));
        writer
    }

    /// An event covering the whole of `date`. The end date is exclusive.
    pub fn all_day_event(&mut self, uid: &str, summary: &str, date: NaiveDate) {
        let end = date.succ_opt().unwrap_or(date);
        self.line("BEGIN:VEVENT");
        self.line(&format!("UID:{}", escape(uid)));
        let stamp = format!("DTSTAMP:{}", self.stamp);
        self.line(&stamp);
        self.line(&format!("SUMMARY:{}", escape(summary)));
        self.line(&format!("DTSTART;VALUE=DATE:{}", date.format("%Y%m%d")));
        self.line(&format!("DTEND;VALUE=DATE:{}", end.format("%Y%m%d")));
        self.line("END:VEVENT");
    }

    pub fn finish(mut self) -> String {
        self.line("END:VCALENDAR");
        self.out
    }

    /// Appends a content line, folded so that no physical line exceeds 75 octets.
    fn line(&mut self, line: &str) {
        let mut width = 0;
        for c in line.chars() {
            let len = c.len_utf8();
            if width + len > MAX_LINE_OCTETS {
                self.out.push_str("\r\n ");
                width = 1;
            }
            self.out.push(c);
            width += len;
        }
        self.out.push_str("\r\n");
    }
}
