use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use std::fmt::Display;

/// Largest serial number Excel can display (9999-12-31).
const MAX_SERIAL: f64 = 2_958_465.0;

const MILLISECONDS_PER_DAY: i64 = 86_400_000;

/// How the raw text of an `.xlsx` cell must be interpreted, from its `t` attribute and style.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    /// Plain numeric values
    #[default]
    Number,
    /// Serial numbers styled as date and time
    NumberDateTime,
    /// Serial numbers styled as date only
    NumberDate,
    /// Serial numbers styled as time only
    NumberTime,
    /// Boolean values stored as `0`/`1`
    Boolean,
    /// ISO 8601 date/time strings (`t="d"`)
    IsoDateTime,
    /// Inline strings and cached formula strings
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values such as `#DIV/0!`
    Error,
}

impl CellType {
    /// Maps the built-in number format IDs that denote dates and times.
    pub(crate) fn parse_builtin_number_format_id(id: &str) -> Option<Self> {
        match id {
            "22" => Some(Self::NumberDateTime),
            "14" | "15" | "16" | "17" => Some(Self::NumberDate),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::NumberTime),
            _ => None,
        }
    }

    /// Classifies a custom number format code by looking for date and time tokens
    /// outside of quoted literals, escapes and `[...]` sections.
    pub(crate) fn parse_custom_number_format(format: &str) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_literal => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time) {
            (true, true) => Self::NumberDateTime,
            (true, false) => Self::NumberDate,
            (false, true) => Self::NumberTime,
            (false, false) => Self::Number,
        }
    }

    /// Decodes the raw text of a cell of this type into a [`CellValue`].
    ///
    /// # Arguments
    /// * `raw` - Content of the `<v>` or `<is>` element
    /// * `is_1904` - Whether the workbook uses the 1904 date system
    /// * `shared_strings` - The workbook's shared string table
    ///
    /// # Returns
    /// The decoded value, or a message describing why the text does not fit the type
    pub(crate) fn decode(&self, raw: &str, is_1904: bool, shared_strings: &[String]) -> Result<CellValue, String> {
        match self {
            Self::SharedString => raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|index| shared_strings.get(index))
                .map(|text| CellValue::Text(text.to_owned()))
                .ok_or_else(|| format!("shared string '{raw}' does not exist")),
            Self::InlineString | Self::Error => Ok(CellValue::Text(raw.to_owned())),
            Self::Boolean => Ok(CellValue::Integer(if raw.trim() == "1" { 1 } else { 0 })),
            Self::IsoDateTime => Ok(parse_iso_datetime(raw)
                .map(CellValue::Temporal)
                .unwrap_or_else(|| CellValue::Text(raw.to_owned()))),
            Self::Number => parse_number(raw),
            Self::NumberDate | Self::NumberDateTime | Self::NumberTime => {
                let serial = raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| format!("parse '{raw}' to serial date failed"))?;
                if *self == Self::NumberTime && (0.0..1.0).contains(&serial) {
                    Ok(CellValue::Temporal(Temporal::Time(serial_to_time(serial))))
                } else {
                    Ok(serial_to_datetime(serial, is_1904)
                        .map(|datetime| CellValue::Temporal(Temporal::DateTime(datetime)))
                        .unwrap_or(CellValue::Real(serial)))
                }
            }
        }
    }
}

/// A date/time read from a workbook.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Temporal {
    DateTime(NaiveDateTime),
    /// Time of day without a date, from time-only formats
    Time(NaiveTime),
}

impl Display for Temporal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Temporal::DateTime(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S%.f")),
            Temporal::Time(time) => write!(f, "{}", time.format("%H:%M:%S%.f")),
        }
    }
}

/// A single cell value, as carried from the workbook through extraction and typing.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    /// No value at all
    #[default]
    Empty,
    /// Whole numbers, and booleans as `1`/`0`
    Integer(i64),
    /// Floating point numbers
    Real(f64),
    /// Text, including error literals such as `#N/A`
    Text(String),
    /// Dates and times
    Temporal(Temporal),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Empty, or text made of whitespace only.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Integer(value) => write!(f, "{value}"),
            CellValue::Real(value) => write!(f, "{value}"),
            CellValue::Text(value) => write!(f, "{value}"),
            CellValue::Temporal(value) => write!(f, "{value}"),
        }
    }
}

/// Parses the text of a numeric cell: an integer unless it carries a decimal point or exponent.
fn parse_number(raw: &str) -> Result<CellValue, String> {
    let text = raw.trim();
    if text.contains(['.', 'e', 'E']) {
        text.parse::<f64>()
            .map(CellValue::Real)
            .map_err(|_| format!("parse '{raw}' to double failed"))
    } else {
        match text.parse::<i64>() {
            Ok(value) => Ok(CellValue::Integer(value)),
            Err(_) => text
                .parse::<f64>()
                .map(CellValue::Real)
                .map_err(|_| format!("parse '{raw}' to bigint failed")),
        }
    }
}

/// Parses `t="d"` cell content: a datetime, a date or a time of day.
fn parse_iso_datetime(raw: &str) -> Option<Temporal> {
    let text = raw.trim().trim_end_matches('Z');
    if let Ok(datetime) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        Some(Temporal::DateTime(datetime))
    } else if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        Some(Temporal::DateTime(date.and_time(NaiveTime::MIN)))
    } else {
        NaiveTime::parse_from_str(text.trim_start_matches('T'), "%H:%M:%S%.f")
            .ok()
            .map(Temporal::Time)
    }
}

/// Converts an Excel serial date to a datetime, `None` when out of range.
///
/// The 1900 system counts the fictional 1900-02-29 (serial 60), so serials below it are
/// shifted by one day.
pub(crate) fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let mut days = serial.trunc() as i64;
    if is_1904 {
        days += 1_462;
    } else if days < 60 {
        days += 1;
    }
    let milliseconds = (serial.fract() * MILLISECONDS_PER_DAY as f64).round() as i64;
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_time(NaiveTime::MIN);
    epoch.checked_add_signed(Duration::days(days) + Duration::milliseconds(milliseconds))
}

/// Converts the fractional part of a serial number to a time of day.
pub(crate) fn serial_to_time(serial: f64) -> NaiveTime {
    let milliseconds = (serial.fract() * MILLISECONDS_PER_DAY as f64).round() as i64 % MILLISECONDS_PER_DAY;
    NaiveTime::MIN + Duration::milliseconds(milliseconds)
}
