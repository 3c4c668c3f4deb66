//! Field templates shared by the parser and the dumper.
//!
//! Every ISO 8601 date and time layout this crate understands is written
//! once as a pattern string (`CCYY-MM-DD`, `-Www-D`, `hh:mm:ss`). The
//! parser matches input against the patterns in priority order, and the
//! dumper renders values through the same patterns, so every string the
//! dumper can produce is one the parser accepts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::FormatError;

/// Date layouts in the order the parser tries them: calendar dates, then
/// ordinal dates, then week dates; within each family the complete forms,
/// then truncations, then expanded years. Two leading dashes before a lone
/// pair of digits mark a day of month (`--15`); a month is never written
/// without its day.
pub(crate) const DATE_PATTERNS: &[&str] = &[
    "CCYY-MM-DD",
    "CCYYMMDD",
    "CCYY-MM",
    "CCYY",
    "-YY-MM-DD",
    "-YYMMDD",
    "-YY-MM",
    "-YYMM",
    "-YY",
    "--MM-DD",
    "--MMDD",
    "--DD",
    "---DD",
    "±XCCYY-MM-DD",
    "±XCCYYMMDD",
    "±XCCYY-MM",
    "±XCCYY",
    "CCYY-DDD",
    "CCYYDDD",
    "-YY-DDD",
    "-YYDDD",
    "-DDD",
    "±XCCYY-DDD",
    "±XCCYYDDD",
    "CCYY-Www-D",
    "CCYYWwwD",
    "CCYY-Www",
    "CCYYWww",
    "-YY-Www-D",
    "-YYWwwD",
    "-YY-Www",
    "-YYWww",
    "-Www-D",
    "-WwwD",
    "-Www",
    "-W-D",
    "±XCCYY-Www-D",
    "±XCCYYWwwD",
    "±XCCYY-Www",
    "±XCCYYWww",
];

/// Time-of-day layouts, without fraction or offset.
pub(crate) const TIME_PATTERNS: &[&str] = &[
    "hh:mm:ss", "hhmmss", "hh:mm", "hhmm", "hh", "-mm:ss", "-mmss", "-mm", "--ss",
];

/// Default number of extra year digits in expanded representations.
pub const DEFAULT_EXPANDED_DIGITS: u8 = 2;

/// Expanded years carry at most this many digits beyond four.
pub(crate) const MAX_EXPANDED_DIGITS: u8 = 5;

// ── Tokens ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    Literal(u8),
    /// `±XCCYY`: sign and `4 + N` digits.
    ExpandedYear,
    /// `CCYY`
    Year,
    /// `YY`
    YearOfCentury,
    /// `MM`
    Month,
    /// `DD`
    Day,
    /// `DDD`
    DayOfYear,
    /// `ww`
    Week,
    /// `D`
    Weekday,
    /// `hh`
    Hour,
    /// `mm`
    Minute,
    /// `ss`
    Second,
}

impl Token {
    fn width(self) -> usize {
        match self {
            Token::Literal(_) | Token::Weekday => 1,
            Token::Year => 4,
            Token::DayOfYear => 3,
            Token::ExpandedYear => 0,
            _ => 2,
        }
    }

    fn is_field(self) -> bool {
        !matches!(self, Token::Literal(_))
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Token::Literal(_) => "literal",
            Token::ExpandedYear | Token::Year => "year",
            Token::YearOfCentury => "year of century",
            Token::Month => "month",
            Token::Day => "day of month",
            Token::DayOfYear => "day of year",
            Token::Week => "week",
            Token::Weekday => "weekday",
            Token::Hour => "hour",
            Token::Minute => "minute",
            Token::Second => "second",
        }
    }
}

const SPELLINGS: &[(&str, Token)] = &[
    ("±XCCYY", Token::ExpandedYear),
    ("+XCCYY", Token::ExpandedYear),
    ("CCYY", Token::Year),
    ("DDD", Token::DayOfYear),
    ("YY", Token::YearOfCentury),
    ("MM", Token::Month),
    ("DD", Token::Day),
    ("ww", Token::Week),
    ("hh", Token::Hour),
    ("mm", Token::Minute),
    ("ss", Token::Second),
    ("D", Token::Weekday),
];

/// Split a pattern into field and literal tokens. Returns `None` for
/// characters outside ASCII.
pub(crate) fn tokenize(pattern: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = pattern;
    'outer: while !rest.is_empty() {
        for (spelling, token) in SPELLINGS {
            if let Some(tail) = rest.strip_prefix(spelling) {
                tokens.push(*token);
                rest = tail;
                continue 'outer;
            }
        }
        let byte = *rest.as_bytes().first()?;
        if !byte.is_ascii() {
            return None;
        }
        tokens.push(Token::Literal(byte));
        rest = &rest[1..];
    }
    Some(tokens)
}

/// Separator style of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Style {
    /// A single field, valid with either style (`CCYY`, `hh`, `-W-D`).
    Neutral,
    /// `CCYYMMDD`, `hhmmss`.
    Basic,
    /// `CCYY-MM-DD`, `hh:mm:ss`.
    Extended,
}

impl Style {
    pub(crate) fn conflicts_with(self, other: Style) -> bool {
        matches!(
            (self, other),
            (Style::Basic, Style::Extended) | (Style::Extended, Style::Basic)
        )
    }
}

pub(crate) fn style(tokens: &[Token]) -> Style {
    let Some(first_field) = tokens.iter().position(|t| t.is_field()) else {
        return Style::Neutral;
    };
    let separated = tokens[first_field..]
        .iter()
        .any(|t| matches!(t, Token::Literal(b'-' | b':')));
    if separated {
        Style::Extended
    } else if tokens.iter().filter(|t| t.is_field()).count() > 1 {
        Style::Basic
    } else {
        Style::Neutral
    }
}

// ── Matching ────────────────────────────────────────────────────────────────

/// Field values read by [`match_tokens`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Captures {
    pub year: Option<i64>,
    pub expanded: bool,
    pub year_of_century: Option<u32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub day_of_year: Option<u32>,
    pub week: Option<u32>,
    pub weekday: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
}

/// Match the whole of `input` against `tokens`. Field widths are exact;
/// `expanded_digits` sets the digits beyond four in an expanded year.
pub(crate) fn match_tokens(tokens: &[Token], input: &str, expanded_digits: u8) -> Option<Captures> {
    let bytes = input.as_bytes();
    let mut pos = 0;
    let mut caps = Captures::default();
    for &token in tokens {
        match token {
            Token::Literal(b) => {
                if bytes.get(pos) != Some(&b) {
                    return None;
                }
                pos += 1;
            }
            Token::ExpandedYear => {
                let negative = match bytes.get(pos)? {
                    b'+' => false,
                    b'-' => true,
                    _ => return None,
                };
                let width = 4 + usize::from(expanded_digits);
                let value = digits(bytes, pos + 1, width)?;
                caps.year = Some(if negative { -(value as i64) } else { value as i64 });
                caps.expanded = true;
                pos += 1 + width;
            }
            field => {
                let value = digits(bytes, pos, field.width())?;
                pos += field.width();
                let small = u32::try_from(value).ok()?;
                match field {
                    Token::Year => caps.year = Some(value as i64),
                    Token::YearOfCentury => caps.year_of_century = Some(small),
                    Token::Month => caps.month = Some(small),
                    Token::Day => caps.day = Some(small),
                    Token::DayOfYear => caps.day_of_year = Some(small),
                    Token::Week => caps.week = Some(small),
                    Token::Weekday => caps.weekday = Some(small),
                    Token::Hour => caps.hour = Some(small),
                    Token::Minute => caps.minute = Some(small),
                    Token::Second => caps.second = Some(small),
                    Token::Literal(_) | Token::ExpandedYear => {}
                }
            }
        }
    }
    (pos == bytes.len()).then_some(caps)
}

fn digits(bytes: &[u8], start: usize, width: usize) -> Option<u64> {
    let run = bytes.get(start..start + width)?;
    if !run.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some(run.iter().fold(0u64, |acc, b| acc * 10 + u64::from(b - b'0')))
}

// ── Rendering ───────────────────────────────────────────────────────────────

/// Field values available to [`render`]. A token whose field is `None`
/// cannot be rendered.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Fields {
    pub year: Option<i64>,
    pub year_of_century: Option<u32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub day_of_year: Option<u32>,
    pub week: Option<u32>,
    pub weekday: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
}

pub(crate) fn render(tokens: &[Token], fields: &Fields, expanded_digits: u8, out: &mut String) -> Result<(), FormatError> {
    use std::fmt::Write;

    for &token in tokens {
        let missing = || FormatError::MissingField(token.name());
        let two = |value: Option<u32>| value.map(|v| format!("{v:02}")).ok_or_else(missing);
        let text = match token {
            Token::Literal(b) => char::from(b).to_string(),
            Token::ExpandedYear => {
                let year = fields.year.ok_or_else(missing)?;
                let sign = if year < 0 { '-' } else { '+' };
                let width = 4 + usize::from(expanded_digits);
                format!("{sign}{:0width$}", year.unsigned_abs())
            }
            Token::Year => {
                let year = fields.year.ok_or_else(missing)?;
                if !(0..=9999).contains(&year) {
                    return Err(FormatError::UnsupportedTemplate(format!(
                        "year {year} needs an expanded representation"
                    )));
                }
                format!("{year:04}")
            }
            Token::YearOfCentury => two(fields.year_of_century)?,
            Token::Month => two(fields.month)?,
            Token::Day => two(fields.day)?,
            Token::DayOfYear => fields.day_of_year.map(|v| format!("{v:03}")).ok_or_else(missing)?,
            Token::Week => two(fields.week)?,
            Token::Weekday => fields.weekday.map(|v| v.to_string()).ok_or_else(missing)?,
            Token::Hour => two(fields.hour)?,
            Token::Minute => two(fields.minute)?,
            Token::Second => two(fields.second)?,
        };
        let _ = write!(out, "{text}");
    }
    Ok(())
}

// ── Public template ─────────────────────────────────────────────────────────

/// How a UTC offset is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetStyle {
    /// `Z` for UTC, `±hh:mm` otherwise.
    Zulu,
    /// `±hh:mm`
    Extended,
    /// `±hhmm`
    Basic,
    /// `±hh`
    Hours,
}

impl OffsetStyle {
    pub(crate) fn style(self) -> Style {
        match self {
            OffsetStyle::Extended => Style::Extended,
            OffsetStyle::Basic => Style::Basic,
            OffsetStyle::Zulu | OffsetStyle::Hours => Style::Neutral,
        }
    }

    fn spelling(self) -> &'static str {
        match self {
            OffsetStyle::Zulu => "Z",
            OffsetStyle::Extended => "+hh:mm",
            OffsetStyle::Basic => "+hhmm",
            OffsetStyle::Hours => "+hh",
        }
    }
}

/// A custom output layout such as `CCYY-MM-DDThh:mm:ssZ` or `CCYYWwwD`.
///
/// The date and time parts must each be one of the layouts the parser
/// accepts. A time part may end in a decimal fraction written `,tt` or
/// `.tt` (one `t` per digit) and an offset written `Z`, `+hh:mm`, `+hhmm`
/// or `+hh`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    date: Option<&'static str>,
    time: Option<&'static str>,
    decimal_sign: char,
    fraction_digits: u8,
    offset: Option<OffsetStyle>,
}

impl Template {
    /// Parse and validate a template.
    ///
    /// # Errors
    ///
    /// Returns [`FormatError::UnsupportedTemplate`] when a part is not a
    /// known layout, or when the parts could not be read back together
    /// (mixed basic and extended separators, a time after a reduced date).
    pub fn new(text: &str) -> Result<Self, FormatError> {
        let unsupported = |why: &str| FormatError::UnsupportedTemplate(format!("{text}: {why}"));
        let (date_part, time_part) = match text.find('T') {
            Some(i) => (&text[..i], Some(&text[i + 1..])),
            None => (text, None),
        };

        let date = if date_part.is_empty() {
            None
        } else {
            Some(find_pattern(DATE_PATTERNS, date_part).ok_or_else(|| unsupported("unknown date layout"))?)
        };

        let mut template = Template {
            source: text.to_string(),
            date,
            time: None,
            decimal_sign: '.',
            fraction_digits: 0,
            offset: None,
        };

        if let Some(mut time_part) = time_part {
            for style in [OffsetStyle::Zulu, OffsetStyle::Extended, OffsetStyle::Basic, OffsetStyle::Hours] {
                let spelling = style.spelling();
                let signed = [spelling.to_string(), spelling.replacen('+', "-", 1), spelling.replacen('+', "±", 1)];
                if let Some(stripped) = signed.iter().find_map(|s| time_part.strip_suffix(s.as_str())) {
                    template.offset = Some(style);
                    time_part = stripped;
                    break;
                }
            }
            if let Some(i) = time_part.find([',', '.']) {
                let digits = &time_part[i + 1..];
                if digits.is_empty() || digits.len() > 9 || !digits.bytes().all(|b| b == b't') {
                    return Err(unsupported("fraction must be written as one 't' per digit"));
                }
                template.decimal_sign = char::from(time_part.as_bytes()[i]);
                template.fraction_digits = digits.len() as u8;
                time_part = &time_part[..i];
            }
            let time = find_pattern(TIME_PATTERNS, time_part).ok_or_else(|| unsupported("unknown time layout"))?;
            template.time = Some(time);
        }

        if template.date.is_none() && template.time.is_none() {
            return Err(unsupported("empty template"));
        }
        template.check_consistency().map_err(|why| unsupported(&why))?;
        Ok(template)
    }

    /// Build a template from known layouts. Used for automatic formatting.
    pub(crate) fn from_parts(
        date: Option<&'static str>,
        time: Option<&'static str>,
        fraction_digits: u8,
        offset: Option<OffsetStyle>,
    ) -> Self {
        let mut source = String::new();
        if let Some(d) = date {
            source.push_str(d);
        }
        if let Some(t) = time {
            source.push('T');
            source.push_str(t);
            if fraction_digits > 0 {
                source.push('.');
                source.extend(std::iter::repeat('t').take(usize::from(fraction_digits)));
            }
            if let Some(o) = offset {
                source.push_str(o.spelling());
            }
        }
        Template {
            source,
            date,
            time,
            decimal_sign: '.',
            fraction_digits,
            offset,
        }
    }

    fn check_consistency(&self) -> Result<(), String> {
        let date_tokens = self.date_tokens();
        let time_tokens = self.time_tokens();
        if self.time.is_some() {
            if !date_tokens.is_empty() && is_reduced_layout(&date_tokens) {
                return Err("a time cannot follow a reduced-precision date".to_string());
            }
            if !date_tokens.is_empty() && time_tokens.first() == Some(&Token::Literal(b'-')) {
                return Err("a truncated time cannot follow a date".to_string());
            }
        }
        let styles = [
            style(&date_tokens),
            style(&time_tokens),
            self.offset.map_or(Style::Neutral, OffsetStyle::style),
        ];
        let mixed = styles
            .iter()
            .any(|a| styles.iter().any(|b| a.conflicts_with(*b)));
        if mixed {
            return Err("basic and extended layouts cannot be mixed".to_string());
        }
        Ok(())
    }

    pub(crate) fn date_tokens(&self) -> Vec<Token> {
        self.date.and_then(tokenize).unwrap_or_default()
    }

    pub(crate) fn time_tokens(&self) -> Vec<Token> {
        self.time.and_then(tokenize).unwrap_or_default()
    }

    pub fn has_date(&self) -> bool {
        self.date.is_some()
    }

    pub fn has_time(&self) -> bool {
        self.time.is_some()
    }

    pub fn decimal_sign(&self) -> char {
        self.decimal_sign
    }

    pub fn fraction_digits(&self) -> u8 {
        self.fraction_digits
    }

    pub fn offset_style(&self) -> Option<OffsetStyle> {
        self.offset
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Whether a date layout stops short of the day (`CCYY-MM`, `-Www`).
pub(crate) fn is_reduced_layout(tokens: &[Token]) -> bool {
    let has = |t: Token| tokens.contains(&t);
    if has(Token::Week) {
        !has(Token::Weekday)
    } else if has(Token::Weekday) || has(Token::DayOfYear) {
        false
    } else {
        !has(Token::Day)
    }
}

fn find_pattern(patterns: &[&'static str], text: &str) -> Option<&'static str> {
    let wanted = tokenize(text)?;
    patterns
        .iter()
        .find(|p| tokenize(p).as_deref() == Some(wanted.as_slice()))
        .copied()
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl FromStr for Template {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::new(s)
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Template::new(&s).map_err(serde::de::Error::custom)
    }
}
