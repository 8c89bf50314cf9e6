//! Microsoft Office Excel Helpers
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::LoadError;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::TimeDelta;
use quick_xml::events::Event;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

/// XML tag name for relationship elements in Excel files
const TAG_RELATIONSHIP: &[u8] = b"Relationship";

/// Signature of a compound file (legacy `.xls` or an encrypted package)
pub(crate) const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Size of the worksheet grid since Excel 2007
pub(crate) const MAX_ROWS: usize = 1_048_576;
pub(crate) const MAX_COLUMNS: usize = 16_384;

const MILLISECONDS_PER_DAY: f64 = 86_400_000f64;

/// How a numeric cell is displayed, derived from its cell style.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(super) enum NumberFormat {
    #[default]
    General,
    Date,
    Time,
    DateTime,
}

impl NumberFormat {
    /// Parses built-in Excel number format IDs.
    pub(super) fn parse_builtin_number_format_id(id: &str) -> Option<Self> {
        match id {
            "22" => Some(Self::DateTime),
            "14" | "15" | "16" | "17" => Some(Self::Date),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::Time),
            _ => None,
        }
    }

    /// Parses custom number format strings, looking for date/time tokens
    /// outside of literals, escapes and bracketed sections.
    pub(super) fn parse_custom_number_format(format: &str) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' if !is_escaped => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_literal && !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_color && !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time) {
            (true, true) => Self::DateTime,
            (true, false) => Self::Date,
            (false, true) => Self::Time,
            (false, false) => Self::General,
        }
    }

    /// Renders a serial number in ISO form, `None` for general numbers or
    /// serials outside the calendar.
    pub(super) fn render(&self, serial: f64, is_1904: bool) -> Option<String> {
        match self {
            NumberFormat::General => None,
            NumberFormat::Date => to_datetime(serial, is_1904).map(|datetime| datetime.format("%Y-%m-%d").to_string()),
            NumberFormat::Time => to_time_string(serial),
            NumberFormat::DateTime => to_datetime(serial, is_1904).map(|datetime| {
                if datetime.and_utc().timestamp_subsec_millis() > 0 {
                    datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
                } else {
                    datetime.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }),
        }
    }
}

/// Converts an Excel serial to a date and time.
/// Serials below 60 in the 1900 system are shifted by a day for the
/// phantom 1900-02-29.
fn to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0f64 {
        return None;
    }
    let milliseconds = (serial * MILLISECONDS_PER_DAY).round() as i64;
    let days = serial.trunc() as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    NaiveDate::from_ymd_opt(1899, 12, 30)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(TimeDelta::try_milliseconds(milliseconds)?)?
        .checked_add_signed(TimeDelta::try_days(offset)?)
}

/// Converts a day fraction (or a duration in days) to `HH:MM:SS`.
fn to_time_string(serial: f64) -> Option<String> {
    if !serial.is_finite() || serial < 0f64 {
        return None;
    }
    let mut hours = (serial * MILLISECONDS_PER_DAY).round() as i64;
    let milliseconds = hours % 1_000; hours /= 1_000;
    let seconds = hours % 60; hours /= 60;
    let minutes = hours % 60; hours /= 60;
    let timestamp = if milliseconds > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    };
    Some(timestamp)
}

/// Maps style indexes to number formats using custom and built-in formats
pub(super) fn load_number_formats(format_indexes: Vec<String>, custom_formats: HashMap<String, NumberFormat>) -> Vec<NumberFormat> {
    format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| NumberFormat::parse_builtin_number_format_id(id))
                .unwrap_or_default()
        })
        .collect()
}

/// Loads worksheet relationships, mapping relationship IDs to worksheet paths
pub(super) fn load_relationships<RS: Read + Seek>(zip: &mut ZipArchive<RS>, path: &str) -> Result<HashMap<String, String>, LoadError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| LoadError::MissingPart(path.to_owned()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            // Only worksheet relationships
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Normalizes a relationship target to a path within the zip archive
pub(crate) fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(path) = path.strip_prefix('/') {
        path.to_string()
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_and_custom_formats() {
        assert_eq!(NumberFormat::parse_builtin_number_format_id("14"), Some(NumberFormat::Date));
        assert_eq!(NumberFormat::parse_builtin_number_format_id("22"), Some(NumberFormat::DateTime));
        assert_eq!(NumberFormat::parse_builtin_number_format_id("46"), Some(NumberFormat::Time));
        assert_eq!(NumberFormat::parse_builtin_number_format_id("2"), None);

        assert_eq!(NumberFormat::parse_custom_number_format("yyyy-mm-dd"), NumberFormat::Date);
        assert_eq!(NumberFormat::parse_custom_number_format("yyyy-mm-dd hh:mm"), NumberFormat::DateTime);
        assert_eq!(NumberFormat::parse_custom_number_format("[h]:mm:ss"), NumberFormat::Time);
        assert_eq!(NumberFormat::parse_custom_number_format("#,##0.00\" days\""), NumberFormat::General);
        assert_eq!(NumberFormat::parse_custom_number_format("[Red]0.00"), NumberFormat::General);
        assert_eq!(NumberFormat::parse_custom_number_format("General"), NumberFormat::General);
    }

    #[test]
    fn load_number_formats_prefers_custom() {
        let custom = HashMap::from([("164".to_owned(), NumberFormat::Date)]);
        let formats = load_number_formats(vec!["0".to_owned(), "164".to_owned(), "22".to_owned()], custom);
        assert_eq!(formats, vec![NumberFormat::General, NumberFormat::Date, NumberFormat::DateTime]);
    }

    #[test]
    fn render_serials() {
        assert_eq!(NumberFormat::Date.render(45_292f64, false).as_deref(), Some("2024-01-01"));
        assert_eq!(NumberFormat::Date.render(1f64, false).as_deref(), Some("1900-01-01"));
        assert_eq!(NumberFormat::Date.render(61f64, false).as_deref(), Some("1900-03-01"));
        assert_eq!(NumberFormat::Date.render(0f64, true).as_deref(), Some("1904-01-01"));
        assert_eq!(NumberFormat::Time.render(0.5, false).as_deref(), Some("12:00:00"));
        assert_eq!(NumberFormat::Time.render(1.25, false).as_deref(), Some("30:00:00"));
        assert_eq!(NumberFormat::DateTime.render(45_292.75, false).as_deref(), Some("2024-01-01 18:00:00"));
        assert_eq!(NumberFormat::General.render(45_292f64, false), None);
        assert_eq!(NumberFormat::Date.render(-1f64, false), None);
    }

    #[test]
    fn zip_paths() {
        assert_eq!(to_zip_path(Cow::Borrowed("worksheets/sheet1.xml")), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path(Cow::Borrowed("/xl/worksheets/sheet1.xml")), "xl/worksheets/sheet1.xml");
        assert_eq!(to_zip_path(Cow::Borrowed("xl/worksheets/sheet2.xml")), "xl/worksheets/sheet2.xml");
    }
}
