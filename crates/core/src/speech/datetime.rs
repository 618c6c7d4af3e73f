use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Europe::Vienna;

/// Hour assumed when the caller names a day but no time.
const DEFAULT_DINNER_HOUR: u32 = 19;
const DEFAULT_MORNING_HOUR: u32 = 9;

const WEEKDAYS: [(&str, Weekday); 14] = [
    ("monday", Weekday::Mon),
    ("mon", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("tue", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("wed", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("thu", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("fri", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sat", Weekday::Sat),
    ("sunday", Weekday::Sun),
    ("sun", Weekday::Sun),
];

const MONTHS: [(&str, u32); 24] = [
    ("january", 1),
    ("jan", 1),
    ("february", 2),
    ("feb", 2),
    ("march", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("may", 5),
    ("june", 6),
    ("jun", 6),
    ("july", 7),
    ("jul", 7),
    ("august", 8),
    ("aug", 8),
    ("september", 9),
    ("sep", 9),
    ("october", 10),
    ("oct", 10),
    ("november", 11),
    ("nov", 11),
    ("december", 12),
    ("dec", 12),
    ("sept", 9),
];

const HOUR_WORDS: [(&str, u32); 12] = [
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
];

const MINUTE_WORDS: [(&str, u32); 11] = [
    ("five", 5),
    ("ten", 10),
    ("fifteen", 15),
    ("twenty", 20),
    ("twentyfive", 25),
    ("thirty", 30),
    ("thirtyfive", 35),
    ("forty", 40),
    ("fortyfive", 45),
    ("fifty", 50),
    ("fiftyfive", 55),
];

const ORDINAL_WORDS: [(&str, u32); 21] = [
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
    ("tenth", 10),
    ("eleventh", 11),
    ("twelfth", 12),
    ("thirteenth", 13),
    ("fourteenth", 14),
    ("fifteenth", 15),
    ("sixteenth", 16),
    ("seventeenth", 17),
    ("eighteenth", 18),
    ("nineteenth", 19),
    ("twentieth", 20),
    ("thirtieth", 30),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DateAnchor {
    DayOffset(i64),
    WeekdayAhead(Weekday, bool),
    DayOfMonth(u32),
    MonthDay(u32, u32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

/// Parses a spoken date/time expression into an absolute instant, resolved
/// against `now` in the restaurant's timezone and biased to the future: a
/// candidate that already passed is pushed to the next occurrence of its
/// dominant unit (day, week, month or year). Returns `None` when the bounded
/// grammar recognises neither a date nor a time.
pub fn parse_dining_time(speech: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let lowered = speech.to_lowercase();
    let tokens = tokenize(&lowered);
    if tokens.is_empty() {
        return None;
    }

    let anchor = find_date_anchor(&tokens);
    let time = find_time(&tokens);
    if anchor.is_none() && time.is_none() {
        return None;
    }

    let meridiem = find_meridiem(&tokens);
    let today = now.with_timezone(&Vienna).date_naive();
    let anchor = anchor.unwrap_or(DateAnchor::DayOffset(0));
    let date = resolve_date(anchor, today)?;
    let (hour, minute) = resolve_clock(time, meridiem)?;

    let candidate = to_utc(date, hour, minute)?;
    if candidate > now {
        return Some(candidate);
    }

    let bumped = bump_forward(anchor, date)?;
    to_utc(bumped, hour, minute).filter(|instant| *instant > now)
}

fn tokenize(lowered: &str) -> Vec<String> {
    lowered
        .split_whitespace()
        .map(|raw| {
            raw.chars()
                .filter(|character| character.is_ascii_alphanumeric() || *character == ':')
                .collect::<String>()
        })
        .filter(|token| !token.is_empty())
        .collect()
}

fn find_date_anchor(tokens: &[String]) -> Option<DateAnchor> {
    if let Some(anchor) = find_month_day(tokens) {
        return Some(anchor);
    }
    if let Some(day) = find_day_of_month(tokens) {
        return Some(DateAnchor::DayOfMonth(day));
    }
    if let Some(anchor) = find_weekday(tokens) {
        return Some(anchor);
    }
    if tokens.iter().any(|token| token == "today" || token == "tonight") {
        return Some(DateAnchor::DayOffset(0));
    }
    if tokens.iter().any(|token| token == "tomorrow") {
        return Some(DateAnchor::DayOffset(1));
    }
    None
}

fn find_weekday(tokens: &[String]) -> Option<DateAnchor> {
    for (index, token) in tokens.iter().enumerate() {
        for (word, weekday) in WEEKDAYS {
            if token == word {
                let explicit_next = index > 0 && tokens[index - 1] == "next";
                return Some(DateAnchor::WeekdayAhead(weekday, explicit_next));
            }
        }
    }
    None
}

fn find_month_day(tokens: &[String]) -> Option<DateAnchor> {
    let month_index = tokens.iter().position(|token| month_number(token).is_some())?;
    let month = month_number(&tokens[month_index])?;

    if let Some(day) = day_number_at(tokens, month_index + 1) {
        return Some(DateAnchor::MonthDay(month, day));
    }
    if let Some(day) = day_number_before(tokens, month_index) {
        return Some(DateAnchor::MonthDay(month, day));
    }
    None
}

/// "the twenty sixth", "the 26th", or a bare ordinal like "26th".
fn find_day_of_month(tokens: &[String]) -> Option<u32> {
    for (index, token) in tokens.iter().enumerate() {
        if token == "the" {
            if let Some(day) = day_number_at(tokens, index + 1) {
                return Some(day);
            }
        }
    }
    tokens.iter().find_map(|token| ordinal_digits(token))
}

fn day_number_at(tokens: &[String], mut index: usize) -> Option<u32> {
    while index < tokens.len() && matches!(tokens[index].as_str(), "the" | "of") {
        index += 1;
    }
    let token = tokens.get(index)?;

    if let Some(day) = numeric_day(token) {
        return Some(day);
    }
    if let Some(day) = ordinal_word(token) {
        return Some(day);
    }
    if matches!(token.as_str(), "twenty" | "thirty") {
        let base = if token == "twenty" { 20 } else { 30 };
        return tokens.get(index + 1).and_then(|next| unit_ordinal(next)).map(|unit| base + unit);
    }
    None
}

fn day_number_before(tokens: &[String], month_index: usize) -> Option<u32> {
    let mut index = month_index;
    while index > 0 && matches!(tokens[index - 1].as_str(), "the" | "of") {
        index -= 1;
    }
    if index == 0 {
        return None;
    }
    let token = &tokens[index - 1];

    if let Some(day) = numeric_day(token) {
        return Some(day);
    }
    if let Some(unit) = unit_ordinal(token) {
        if index >= 2 && matches!(tokens[index - 2].as_str(), "twenty" | "thirty") {
            let base = if tokens[index - 2] == "twenty" { 20 } else { 30 };
            return Some(base + unit);
        }
        return Some(unit);
    }
    ordinal_word(token)
}

fn month_number(token: &str) -> Option<u32> {
    MONTHS.iter().find(|(word, _)| *word == token).map(|(_, month)| *month)
}

fn numeric_day(token: &str) -> Option<u32> {
    let digits = token
        .strip_suffix("st")
        .or_else(|| token.strip_suffix("nd"))
        .or_else(|| token.strip_suffix("rd"))
        .or_else(|| token.strip_suffix("th"))
        .unwrap_or(token);
    if digits.is_empty() || !digits.chars().all(|character| character.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|day| (1..=31).contains(day))
}

fn ordinal_digits(token: &str) -> Option<u32> {
    let digits = token
        .strip_suffix("st")
        .or_else(|| token.strip_suffix("nd"))
        .or_else(|| token.strip_suffix("rd"))
        .or_else(|| token.strip_suffix("th"))?;
    if digits.is_empty() || !digits.chars().all(|character| character.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u32>().ok().filter(|day| (1..=31).contains(day))
}

fn ordinal_word(token: &str) -> Option<u32> {
    if let Some(value) = ORDINAL_WORDS.iter().find(|(word, _)| *word == token).map(|(_, v)| *v) {
        return Some(value);
    }
    if let Some(rest) = token.strip_prefix("twenty") {
        return unit_ordinal(rest).map(|unit| 20 + unit);
    }
    if let Some(rest) = token.strip_prefix("thirty") {
        return unit_ordinal(rest).map(|unit| 30 + unit);
    }
    None
}

fn unit_ordinal(token: &str) -> Option<u32> {
    ORDINAL_WORDS
        .iter()
        .take(9)
        .find(|(word, _)| *word == token)
        .map(|(_, value)| *value)
}

fn find_meridiem(tokens: &[String]) -> Option<Meridiem> {
    for token in tokens {
        match token.as_str() {
            "am" | "morning" => return Some(Meridiem::Am),
            "pm" | "evening" | "tonight" | "afternoon" | "night" => return Some(Meridiem::Pm),
            _ => {}
        }
    }
    for token in tokens {
        if let Some(prefix) = token.strip_suffix("pm") {
            if is_clock_digits(prefix) {
                return Some(Meridiem::Pm);
            }
        }
        if let Some(prefix) = token.strip_suffix("am") {
            if is_clock_digits(prefix) {
                return Some(Meridiem::Am);
            }
        }
    }
    None
}

fn is_clock_digits(prefix: &str) -> bool {
    !prefix.is_empty()
        && prefix.chars().all(|character| character.is_ascii_digit() || character == ':')
}

fn find_time(tokens: &[String]) -> Option<(u32, u32)> {
    for token in tokens {
        if let Some(time) = colon_time(token) {
            return Some(time);
        }
    }
    for token in tokens {
        if let Some(time) = suffixed_time(token) {
            return Some(time);
        }
    }
    if let Some(time) = relative_time(tokens) {
        return Some(time);
    }
    if let Some(time) = anchored_time(tokens) {
        return Some(time);
    }
    qualified_time(tokens)
}

/// "19:30", "7:30pm".
fn colon_time(token: &str) -> Option<(u32, u32)> {
    let (hour_part, minute_part) = token.split_once(':')?;
    let minute_digits = minute_part.trim_end_matches(|character: char| character.is_ascii_alphabetic());
    let hour = hour_part.parse::<u32>().ok().filter(|hour| *hour <= 23)?;
    let minute = minute_digits.parse::<u32>().ok().filter(|minute| *minute <= 59)?;
    Some((hour, minute))
}

/// "7pm", "11am".
fn suffixed_time(token: &str) -> Option<(u32, u32)> {
    let prefix = token.strip_suffix("pm").or_else(|| token.strip_suffix("am"))?;
    if prefix.is_empty() || !prefix.chars().all(|character| character.is_ascii_digit()) {
        return None;
    }
    prefix.parse::<u32>().ok().filter(|hour| *hour <= 23).map(|hour| (hour, 0))
}

/// "half past seven", "quarter to eight".
fn relative_time(tokens: &[String]) -> Option<(u32, u32)> {
    for (index, token) in tokens.iter().enumerate() {
        let offset = match token.as_str() {
            "half" => 30,
            "quarter" => 15,
            _ => continue,
        };
        let connector = tokens.get(index + 1)?;
        let hour = tokens.get(index + 2).and_then(|next| hour_value(next));
        match (connector.as_str(), hour) {
            ("past", Some(hour)) => return Some((hour, offset)),
            ("to", Some(hour)) => return Some(((hour + 23) % 24, 60 - offset)),
            _ => {}
        }
    }
    None
}

/// "at seven thirty", "around 8".
fn anchored_time(tokens: &[String]) -> Option<(u32, u32)> {
    for (index, token) in tokens.iter().enumerate() {
        if !matches!(token.as_str(), "at" | "around" | "about") {
            continue;
        }
        let Some(hour) = tokens.get(index + 1).and_then(|next| hour_value(next)) else {
            continue;
        };
        let minute = tokens.get(index + 2).and_then(|next| minute_value(next)).unwrap_or(0);
        return Some((hour, minute));
    }
    None
}

/// An hour with a spoken qualifier: "seven oclock", "eight thirty pm",
/// "seven in the evening".
fn qualified_time(tokens: &[String]) -> Option<(u32, u32)> {
    for (index, token) in tokens.iter().enumerate() {
        let Some(hour) = hour_value(token) else {
            continue;
        };
        let mut next_index = index + 1;
        let minute = tokens.get(next_index).and_then(|next| minute_value(next));
        if minute.is_some() {
            next_index += 1;
        }
        match tokens.get(next_index).map(String::as_str) {
            Some("oclock" | "am" | "pm" | "evening" | "morning" | "afternoon") => {
                return Some((hour, minute.unwrap_or(0)));
            }
            Some("in")
                if tokens[next_index..].iter().any(|rest| {
                    matches!(rest.as_str(), "evening" | "morning" | "afternoon")
                }) =>
            {
                return Some((hour, minute.unwrap_or(0)));
            }
            _ => {}
        }
    }
    None
}

fn hour_value(token: &str) -> Option<u32> {
    if token.chars().all(|character| character.is_ascii_digit()) && !token.is_empty() {
        return token.parse::<u32>().ok().filter(|hour| *hour <= 23);
    }
    HOUR_WORDS.iter().find(|(word, _)| *word == token).map(|(_, hour)| *hour)
}

fn minute_value(token: &str) -> Option<u32> {
    if token.chars().all(|character| character.is_ascii_digit()) && token.len() == 2 {
        return token.parse::<u32>().ok().filter(|minute| *minute <= 59);
    }
    MINUTE_WORDS.iter().find(|(word, _)| *word == token).map(|(_, minute)| *minute)
}

fn resolve_date(anchor: DateAnchor, today: NaiveDate) -> Option<NaiveDate> {
    match anchor {
        DateAnchor::DayOffset(days) => today.checked_add_signed(Duration::days(days)),
        DateAnchor::WeekdayAhead(weekday, explicit_next) => {
            let ahead = i64::from(weekday.num_days_from_monday())
                - i64::from(today.weekday().num_days_from_monday());
            let mut ahead = ahead.rem_euclid(7);
            if explicit_next && ahead == 0 {
                ahead = 7;
            }
            today.checked_add_signed(Duration::days(ahead))
        }
        DateAnchor::DayOfMonth(day) => next_date_with_day(today, day),
        DateAnchor::MonthDay(month, day) => {
            for year in [today.year(), today.year() + 1] {
                if let Some(candidate) = NaiveDate::from_ymd_opt(year, month, day) {
                    if candidate >= today {
                        return Some(candidate);
                    }
                }
            }
            None
        }
    }
}

fn bump_forward(anchor: DateAnchor, date: NaiveDate) -> Option<NaiveDate> {
    match anchor {
        DateAnchor::DayOffset(_) => date.checked_add_signed(Duration::days(1)),
        DateAnchor::WeekdayAhead(..) => date.checked_add_signed(Duration::days(7)),
        DateAnchor::DayOfMonth(day) => {
            next_date_with_day(date.checked_add_signed(Duration::days(1))?, day)
        }
        DateAnchor::MonthDay(month, day) => (1..=4)
            .find_map(|offset| NaiveDate::from_ymd_opt(date.year() + offset, month, day)),
    }
}

fn next_date_with_day(from: NaiveDate, day: u32) -> Option<NaiveDate> {
    let mut year = from.year();
    let mut month = from.month();
    for _ in 0..14 {
        if let Some(candidate) = NaiveDate::from_ymd_opt(year, month, day) {
            if candidate >= from {
                return Some(candidate);
            }
        }
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    None
}

fn resolve_clock(time: Option<(u32, u32)>, meridiem: Option<Meridiem>) -> Option<(u32, u32)> {
    let (mut hour, minute) = match (time, meridiem) {
        (Some(clock), _) => clock,
        (None, Some(Meridiem::Am)) => (DEFAULT_MORNING_HOUR, 0),
        (None, _) => (DEFAULT_DINNER_HOUR, 0),
    };
    if hour > 23 || minute > 59 {
        return None;
    }
    match meridiem {
        Some(Meridiem::Pm) if hour < 12 => hour += 12,
        Some(Meridiem::Am) if hour == 12 => hour = 0,
        // A bare small hour from a dinner caller means the evening.
        None if (1..=9).contains(&hour) => hour += 12,
        _ => {}
    }
    Some((hour, minute))
}

fn to_utc(date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(hour, minute, 0)?;
    let local = Vienna
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| Vienna.from_local_datetime(&(naive + Duration::hours(1))).earliest())?;
    Some(local.with_timezone(&Utc))
}
