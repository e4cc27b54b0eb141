//! Value grammars for bang arguments.
//!
//! Every parser here returns `None` on malformed input; the bang parser
//! turns that into literal text rather than an error.

use std::{
    cmp::Ordering,
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use chrono::{Datelike, NaiveDate};

use crate::{
    library::models::{BitDepth, FormatFamily, Mp3Mode, TrackFileType},
    query::ast::Comparison,
};

/// What a `!f{...}` value selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatSelector {
    /// A single file type variant, e.g. `flac24`.
    Exact(TrackFileType),
    /// Every variant of a family, e.g. `flac`.
    Family(FormatFamily),
    /// Both MP3 bitrate modes.
    AnyMp3,
}

impl FormatSelector {
    /// Whether a file type is selected.
    #[must_use]
    pub fn matches(self, file_type: TrackFileType) -> bool {
        match self {
            Self::Exact(expected) => expected == file_type,
            Self::Family(family) => file_type.family() == family,
            Self::AnyMp3 => matches!(file_type, TrackFileType::Mp3(_)),
        }
    }
}

fn depth_suffix(depth: Option<BitDepth>) -> String {
    depth.map(|d| d.bits().to_string()).unwrap_or_default()
}

impl Display for FormatSelector {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::AnyMp3 => write!(f, "mp3"),
            Self::Family(FormatFamily::Flac) => write!(f, "flac"),
            Self::Family(FormatFamily::Alac) => write!(f, "alac"),
            Self::Family(FormatFamily::Aiff) => write!(f, "aiff"),
            Self::Family(FormatFamily::MonkeysAudio) => write!(f, "ape"),
            Self::Family(FormatFamily::Lossy) => write!(f, "lossy"),
            Self::Family(FormatFamily::Unknown) => write!(f, "unknown"),
            Self::Exact(file_type) => match file_type {
                TrackFileType::Flac(depth) => write!(f, "flac{}", depth_suffix(*depth)),
                TrackFileType::Alac(depth) => write!(f, "alac{}", depth_suffix(*depth)),
                TrackFileType::Aiff(depth) => write!(f, "aiff{}", depth_suffix(*depth)),
                TrackFileType::MonkeysAudio(depth) => write!(f, "ape{}", depth_suffix(*depth)),
                TrackFileType::Mp3(Mp3Mode::Constant) => write!(f, "cbr"),
                TrackFileType::Mp3(Mp3Mode::Variable) => write!(f, "vbr"),
                TrackFileType::Aac => write!(f, "aac"),
                TrackFileType::Vorbis => write!(f, "vorbis"),
                TrackFileType::Opus => write!(f, "opus"),
                TrackFileType::Unknown => write!(f, "unknown"),
            },
        }
    }
}

impl FromStr for FormatSelector {
    type Err = ();

    /// Parses a format token, case-insensitively.
    ///
    /// Bare lossless tokens (`flac`, `alac`, `aiff`, `ape`) and `mp3` select
    /// a whole family; suffixed tokens (`flac24`, `ape16`) and the single
    /// lossy codecs select one variant.
    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim().to_ascii_lowercase();
        let selector = match token.as_str() {
            "flac" => Self::Family(FormatFamily::Flac),
            "alac" => Self::Family(FormatFamily::Alac),
            "aiff" => Self::Family(FormatFamily::Aiff),
            "ape" => Self::Family(FormatFamily::MonkeysAudio),
            "mp3" => Self::AnyMp3,
            "cbr" => Self::Exact(TrackFileType::Mp3(Mp3Mode::Constant)),
            "vbr" => Self::Exact(TrackFileType::Mp3(Mp3Mode::Variable)),
            "aac" => Self::Exact(TrackFileType::Aac),
            "vorbis" => Self::Exact(TrackFileType::Vorbis),
            "opus" => Self::Exact(TrackFileType::Opus),
            other => return parse_depth_token(other).ok_or(()),
        };
        Ok(selector)
    }
}

fn parse_depth_token(token: &str) -> Option<FormatSelector> {
    let split = token.find(|c: char| c.is_ascii_digit())?;
    let (codec, bits) = token.split_at(split);
    let depth = BitDepth::from_bits(bits.parse().ok()?)?;

    let file_type = match (codec, depth) {
        ("flac", depth) => TrackFileType::Flac(Some(depth)),
        ("aiff", depth) => TrackFileType::Aiff(Some(depth)),
        ("alac", BitDepth::Bits16 | BitDepth::Bits24) => TrackFileType::Alac(Some(depth)),
        ("ape", BitDepth::Bits8 | BitDepth::Bits16 | BitDepth::Bits24) => {
            TrackFileType::MonkeysAudio(Some(depth))
        }
        _ => return None,
    };
    Some(FormatSelector::Exact(file_type))
}

/// Parses a duration such as `1h2m3s`, `90s` or `1h 30m` into milliseconds.
///
/// Units are required; a bare number is rejected.
#[must_use]
pub fn parse_duration(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() || value.ends_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let duration = humantime::parse_duration(value).ok()?;
    i64::try_from(duration.as_millis()).ok()
}

/// Parses a flag value. An omitted or empty value means `true`.
#[must_use]
pub fn parse_flag(value: Option<&str>) -> Option<bool> {
    match value.map(str::trim) {
        None | Some("") => Some(true),
        Some(v) if v.eq_ignore_ascii_case("true") => Some(true),
        Some(v) if v.eq_ignore_ascii_case("false") => Some(false),
        Some(_) => None,
    }
}

/// Parses an integer value for the numeric comparison bangs.
#[must_use]
pub fn parse_integer(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}

/// A calendar date at year, month or day grain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PartialDate {
    /// Four-digit year.
    pub year: u16,
    /// Month, 1-12.
    pub month: Option<u8>,
    /// Day of month, 1-31. Only present together with a month.
    pub day: Option<u8>,
}

impl PartialDate {
    /// Compares an `updated` stamp against this date.
    ///
    /// The stamp is truncated to this date's grain before a lexicographic
    /// comparison, so `2023-05-17` is neither before nor after `2023-05`.
    /// An empty stamp sorts before every date.
    #[must_use]
    pub fn compare(&self, updated: &str, comparison: Comparison) -> bool {
        let grain = self.to_string();
        let truncated = updated.get(..grain.len()).unwrap_or(updated);
        let ordering = truncated.cmp(grain.as_str());
        match comparison {
            Comparison::LessThan => ordering == Ordering::Less,
            Comparison::GreaterThan => ordering == Ordering::Greater,
        }
    }
}

impl Display for PartialDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:04}", self.year)?;
        if let Some(month) = self.month {
            write!(f, "-{month:02}")?;
            if let Some(day) = self.day {
                write!(f, "-{day:02}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for PartialDate {
    type Err = ();

    /// Parses `YYYY`, `YYYY-MM` or `YYYY-MM-DD`, rejecting dates that do
    /// not exist on the calendar.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.trim().split('-').collect();
        let (year_part, rest) = parts.split_first().ok_or(())?;
        if year_part.len() != 4 || !is_digits(year_part) {
            return Err(());
        }
        if rest.iter().any(|part| part.len() > 2 || !is_digits(part)) {
            return Err(());
        }

        let date = match rest {
            [] => NaiveDate::parse_from_str(&format!("{year_part}-01-01"), "%Y-%m-%d"),
            [month] => NaiveDate::parse_from_str(&format!("{year_part}-{month}-01"), "%Y-%m-%d"),
            [month, day] => {
                NaiveDate::parse_from_str(&format!("{year_part}-{month}-{day}"), "%Y-%m-%d")
            }
            _ => return Err(()),
        }
        .map_err(|_| ())?;

        let month = u8::try_from(date.month()).map_err(|_| ())?;
        let day = u8::try_from(date.day()).map_err(|_| ())?;
        Ok(Self {
            year: u16::try_from(date.year()).map_err(|_| ())?,
            month: (!rest.is_empty()).then_some(month),
            day: (rest.len() == 2).then_some(day),
        })
    }
}

fn is_digits(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use crate::{
        library::models::{BitDepth, FormatFamily, Mp3Mode, TrackFileType},
        query::{
            ast::Comparison,
            values::{FormatSelector, PartialDate, parse_duration, parse_flag},
        },
    };

    #[test]
    fn test_format_tokens() {
        assert_eq!(
            "FLAC24".parse::<FormatSelector>(),
            Ok(FormatSelector::Exact(TrackFileType::Flac(Some(
                BitDepth::Bits24
            ))))
        );
        assert_eq!(
            "ape".parse::<FormatSelector>(),
            Ok(FormatSelector::Family(FormatFamily::MonkeysAudio))
        );
        assert_eq!(
            "vbr".parse::<FormatSelector>(),
            Ok(FormatSelector::Exact(TrackFileType::Mp3(Mp3Mode::Variable)))
        );
        assert!("alac8".parse::<FormatSelector>().is_err());
        assert!("wav".parse::<FormatSelector>().is_err());
    }

    #[test]
    fn test_format_selector_matches() {
        let flac = FormatSelector::Family(FormatFamily::Flac);
        assert!(flac.matches(TrackFileType::Flac(Some(BitDepth::Bits16))));
        assert!(flac.matches(TrackFileType::Flac(None)));
        assert!(!flac.matches(TrackFileType::Alac(Some(BitDepth::Bits16))));

        let mp3 = FormatSelector::AnyMp3;
        assert!(mp3.matches(TrackFileType::Mp3(Mp3Mode::Constant)));
        assert!(!mp3.matches(TrackFileType::Aac));
    }

    #[test]
    fn test_format_selector_display_parses_back() {
        for token in ["flac", "flac16", "alac24", "ape8", "mp3", "cbr", "opus"] {
            let selector: FormatSelector = token.parse().unwrap();
            assert_eq!(selector.to_string(), token);
        }
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("90s"), Some(90_000));
        assert_eq!(parse_duration("1m30s"), Some(90_000));
        assert_eq!(parse_duration("1h"), Some(3_600_000));
        assert_eq!(parse_duration("1h2m3s"), Some(3_723_000));
        assert_eq!(parse_duration("1h 30m"), Some(5_400_000));
        assert_eq!(parse_duration("250ms"), Some(250));
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("30"), None);
        assert_eq!(parse_duration("1m30"), None);
        assert_eq!(parse_duration("1x"), None);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(None), Some(true));
        assert_eq!(parse_flag(Some("")), Some(true));
        assert_eq!(parse_flag(Some("TRUE")), Some(true));
        assert_eq!(parse_flag(Some("false")), Some(false));
        assert_eq!(parse_flag(Some("yes")), None);
    }

    #[test]
    fn test_partial_date_parse() {
        let date: PartialDate = "2023-05".parse().unwrap();
        assert_eq!(date.year, 2023);
        assert_eq!(date.month, Some(5));
        assert_eq!(date.day, None);
        assert_eq!(date.to_string(), "2023-05");

        assert!("23".parse::<PartialDate>().is_err());
        assert!("2023-13".parse::<PartialDate>().is_err());
        assert!("2023-01-00".parse::<PartialDate>().is_err());
        assert!("2023-01-01-01".parse::<PartialDate>().is_err());
        assert!("2023--01".parse::<PartialDate>().is_err());
    }

    #[test]
    fn test_partial_date_rejects_impossible_days() {
        assert!("2023-02-31".parse::<PartialDate>().is_err());
        assert!("2023-02-29".parse::<PartialDate>().is_err());
        assert!("2023-04-31".parse::<PartialDate>().is_err());

        let leap: PartialDate = "2024-02-29".parse().unwrap();
        assert_eq!(leap.day, Some(29));

        let short: PartialDate = "2023-5-7".parse().unwrap();
        assert_eq!(short.to_string(), "2023-05-07");
    }

    #[test]
    fn test_partial_date_compare_at_grain() {
        let month: PartialDate = "2023-05".parse().unwrap();
        assert!(!month.compare("2023-05-17", Comparison::LessThan));
        assert!(!month.compare("2023-05-17", Comparison::GreaterThan));
        assert!(month.compare("2023-04-30", Comparison::LessThan));
        assert!(month.compare("2023-06", Comparison::GreaterThan));
        assert!(month.compare("", Comparison::LessThan));
    }
}
