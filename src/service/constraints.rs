use chrono::{DateTime, Datelike, Timelike, Weekday};
use chrono_tz::Tz;

/// Minutes a meeting occupies when checked against busy windows.
pub const MEETING_MINUTES: u32 = 60;

const DAY_MINUTES: u32 = 24 * 60;

/// Words that turn the text into an offer of time rather than a restriction.
const OFFERING: [&str; 3] = ["available", "free", "only"];
const REFUSING: [&str; 6] = ["not", "no", "never", "busy", "unavailable", "except"];

/// One rule the local matcher understood in a participant's free text.
/// Times are minutes after local midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintRule {
    NotOn(Weekday),
    OnlyOn(Vec<Weekday>),
    BusyAfter(u32),
    BusyBefore(u32),
    BusyBetween(u32, u32),
    /// The meeting must fit inside this window. Wraps past midnight when
    /// the start is later than the end.
    OnlyWithin(u32, u32),
    /// The inner rule applies on this weekday only.
    OnDay(Weekday, Box<ConstraintRule>),
}

impl ConstraintRule {
    pub fn excludes(&self, local: &DateTime<Tz>) -> bool {
        let start = local.hour() * 60 + local.minute();
        let end = start + MEETING_MINUTES;
        match self {
            ConstraintRule::NotOn(day) => local.weekday() == *day,
            ConstraintRule::OnlyOn(days) => !days.contains(&local.weekday()),
            ConstraintRule::BusyAfter(limit) => end > *limit,
            ConstraintRule::BusyBefore(limit) => start < *limit,
            ConstraintRule::BusyBetween(from, to) if from <= to => start < *to && end > *from,
            ConstraintRule::BusyBetween(from, to) => end > *from || start < *to,
            ConstraintRule::OnlyWithin(from, to) if from <= to => start < *from || end > *to,
            ConstraintRule::OnlyWithin(from, to) => start < *from && end > *to,
            ConstraintRule::OnDay(day, rule) => local.weekday() == *day && rule.excludes(local),
        }
    }
}

/// Rules read from one participant's unavailability text. Text the matcher
/// does not understand yields no rules and filters nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedConstraint {
    pub rules: Vec<ConstraintRule>,
}

impl ParsedConstraint {
    pub fn is_recognized(&self) -> bool {
        !self.rules.is_empty()
    }

    pub fn excludes(&self, local: &DateTime<Tz>) -> bool {
        self.rules.iter().any(|rule| rule.excludes(local))
    }
}

/// A stretch of the local day mentioned in the text, before deciding
/// whether it is offered or refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Window {
    After(u32),
    Before(u32),
    Between(u32, u32),
}

impl Window {
    fn busy(self) -> ConstraintRule {
        match self {
            Window::After(at) => ConstraintRule::BusyAfter(at),
            Window::Before(at) => ConstraintRule::BusyBefore(at),
            Window::Between(from, to) => ConstraintRule::BusyBetween(from, to),
        }
    }

    fn offered(self) -> ConstraintRule {
        match self {
            Window::After(at) => ConstraintRule::OnlyWithin(at, DAY_MINUTES),
            Window::Before(at) => ConstraintRule::OnlyWithin(0, at),
            Window::Between(from, to) => ConstraintRule::OnlyWithin(from, to),
        }
    }
}

/// Weekdays and times mentioned together are read as one rule: "busy
/// Mondays 2-4pm" only blocks Monday afternoons. Text that offers time
/// ("available", "free", "only") excludes everything outside the offer.
pub fn parse_constraint(text: &str) -> ParsedConstraint {
    let tokens = tokenize(text);
    let mentions = |words: &[&str]| tokens.iter().any(|t| words.contains(&t.as_str()));
    let offering = mentions(&OFFERING[..]) && !mentions(&REFUSING[..]);

    let days = weekday_mentions(&tokens);
    let windows = time_windows(&tokens);

    let mut rules = Vec::new();
    if offering {
        if !days.is_empty() {
            rules.push(ConstraintRule::OnlyOn(days));
        }
        rules.extend(windows.into_iter().map(Window::offered));
    } else if windows.is_empty() {
        rules.extend(days.into_iter().map(ConstraintRule::NotOn));
    } else if days.is_empty() {
        rules.extend(windows.into_iter().map(Window::busy));
    } else {
        for day in days {
            for window in &windows {
                rules.push(ConstraintRule::OnDay(day, Box::new(window.busy())));
            }
        }
    }

    rules.dedup();
    ParsedConstraint { rules }
}

/// A bare 1..=6 after "after" is read as pm.
fn afternoon_if_bare(minutes: u32, marked: bool) -> u32 {
    if !marked && (60..7 * 60).contains(&minutes) {
        minutes + 12 * 60
    } else {
        minutes
    }
}

fn time_windows(tokens: &[String]) -> Vec<Window> {
    let mut windows = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if let Some((window, next)) = range_at(tokens, i) {
            windows.push(window);
            i = next;
            continue;
        }
        match tokens[i].as_str() {
            "after" => {
                if let Some((minutes, marked, used)) = time_at(tokens, i + 1) {
                    windows.push(Window::After(afternoon_if_bare(minutes, marked)));
                    i += 1 + used;
                    continue;
                }
            }
            "before" | "until" | "till" => {
                if let Some((minutes, _, used)) = time_at(tokens, i + 1) {
                    windows.push(Window::Before(minutes));
                    i += 1 + used;
                    continue;
                }
            }
            "morning" | "mornings" => windows.push(Window::Before(12 * 60)),
            "afternoon" | "afternoons" => windows.push(Window::Between(12 * 60, 18 * 60)),
            "evening" | "evenings" | "night" | "nights" => windows.push(Window::After(18 * 60)),
            _ => {}
        }
        i += 1;
    }
    windows.dedup();
    windows
}

fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase().replace('–', "-").replace('-', " - ");
    let mut tokens: Vec<String> = Vec::new();
    for raw in lower.split_whitespace() {
        let token = raw.trim_matches(|c: char| !(c.is_ascii_alphanumeric() || c == ':' || c == '-'));
        if token.is_empty() {
            continue;
        }
        // "4 pm" reads the same as "4pm".
        if (token == "am" || token == "pm")
            && tokens.last().is_some_and(|prev| prev.chars().all(|c| c.is_ascii_digit() || c == ':'))
        {
            if let Some(prev) = tokens.last_mut() {
                prev.push_str(token);
            }
            continue;
        }
        tokens.push(token.to_string());
    }
    tokens
}

fn weekday_of(token: &str) -> Option<Vec<Weekday>> {
    let day = match token {
        "monday" | "mondays" | "mon" => Weekday::Mon,
        "tuesday" | "tuesdays" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wednesdays" | "wed" => Weekday::Wed,
        "thursday" | "thursdays" | "thu" | "thur" | "thurs" => Weekday::Thu,
        "friday" | "fridays" | "fri" => Weekday::Fri,
        "saturday" | "saturdays" | "sat" => Weekday::Sat,
        "sunday" | "sundays" | "sun" => Weekday::Sun,
        "weekend" | "weekends" => return Some(vec![Weekday::Sat, Weekday::Sun]),
        _ => return None,
    };
    Some(vec![day])
}

fn weekday_mentions(tokens: &[String]) -> Vec<Weekday> {
    let mut days: Vec<Weekday> = Vec::new();
    for token in tokens {
        for day in weekday_of(token).unwrap_or_default() {
            if !days.contains(&day) {
                days.push(day);
            }
        }
    }
    days
}

/// Reads a time of day at `idx`. Returns minutes after midnight, whether an
/// am/pm marker was present, and the number of tokens used.
fn time_at(tokens: &[String], idx: usize) -> Option<(u32, bool, usize)> {
    let token = tokens.get(idx)?;
    match token.as_str() {
        "noon" | "midday" => return Some((12 * 60, true, 1)),
        "midnight" => return Some((0, true, 1)),
        _ => {}
    }

    let (digits, meridiem) = if let Some(rest) = token.strip_suffix("am") {
        (rest, Some(false))
    } else if let Some(rest) = token.strip_suffix("pm") {
        (rest, Some(true))
    } else {
        (token.as_str(), None)
    };

    let (hour, minute) = match digits.split_once(':') {
        Some((h, m)) => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?),
        None => (digits.parse::<u32>().ok()?, 0),
    };
    if minute > 59 {
        return None;
    }

    let hour = match meridiem {
        Some(pm) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            (hour % 12) + if pm { 12 } else { 0 }
        }
        None if hour <= 24 => hour % 24,
        None => return None,
    };
    Some((hour * 60 + minute, meridiem.is_some(), 1))
}

fn range_at(tokens: &[String], idx: usize) -> Option<(Window, usize)> {
    let (start, start_marked, used) = time_at(tokens, idx)?;
    let connector = tokens.get(idx + used)?.as_str();
    let joined = match connector {
        "-" | "to" | "till" | "until" => true,
        "and" => idx > 0 && tokens[idx - 1] == "between",
        _ => false,
    };
    if !joined {
        return None;
    }
    let end_idx = idx + used + 1;
    let (end, end_marked, end_used) = time_at(tokens, end_idx)?;

    // "2-4pm": the end's marker carries over to the start.
    let mut start = start;
    if !start_marked && end_marked && end >= 12 * 60 {
        let afternoon = (start + 12 * 60) % DAY_MINUTES;
        if afternoon <= end && start < 12 * 60 {
            start = afternoon;
        }
    }
    Some((Window::Between(start, end), end_idx + end_used))
}
