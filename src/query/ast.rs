//! Abstract predicate tree produced by the bang parser.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::query::{
    bangs::bang_name,
    values::{FormatSelector, PartialDate},
};

/// Text fields addressable by search bangs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    /// Title, album, artist and every album artist.
    FullText,
    /// Track title.
    Title,
    /// Album title.
    Album,
    /// Any of the album artists.
    AlbumArtists,
    /// Track artist.
    Artist,
    /// Source tag.
    Source,
}

/// Boolean properties addressable by flag bangs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagField {
    /// Another track shares the title and album artists.
    Duplicates,
    /// A MusicBrainz track id is present.
    MusicbrainzId,
    /// A front cover is embedded.
    FrontCover,
}

/// Integer fields addressable by comparison bangs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    /// Bitrate in kbps.
    Bitrate,
    /// Front cover width in pixels.
    CoverWidth,
    /// Front cover height in pixels.
    CoverHeight,
    /// Duration in milliseconds.
    Duration,
}

/// Strict ordering used by comparison and date bangs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// Strictly less than (or before).
    LessThan,
    /// Strictly greater than (or after).
    GreaterThan,
}

/// A typed comparison of one record field against a bang value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldMatch {
    /// Text search; `exact` selects case-sensitive equality over
    /// case-insensitive containment.
    Text {
        field: TextField,
        needle: String,
        exact: bool,
    },
    /// File type variant or family.
    Format(FormatSelector),
    /// Boolean property equality.
    Flag { field: FlagField, expected: bool },
    /// Strict numeric comparison.
    Numeric {
        field: NumericField,
        comparison: Comparison,
        value: i64,
    },
    /// Comparison of the `updated` date at the grain of `date`.
    Updated {
        comparison: Comparison,
        date: PartialDate,
    },
}

/// Parsed bang query.
///
/// Trees are finite and acyclic by construction and owned by the query
/// invocation that parsed them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpression {
    /// Matches every record; produced for empty input.
    All,
    /// Case-insensitive full-text search of the literal text.
    PlainText(String),
    /// A single bang.
    FieldMatch(FieldMatch),
    /// A parenthesised sub-expression (`!!{...}`).
    Group(Box<QueryExpression>),
    /// Both operands must match.
    And(Box<QueryExpression>, Box<QueryExpression>),
    /// Either operand must match.
    Or(Box<QueryExpression>, Box<QueryExpression>),
}

impl QueryExpression {
    /// Whether this expression matches everything without inspection.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Whether any node needs the duplicate index of the whole library.
    #[must_use]
    pub fn contains_duplicates_bang(&self) -> bool {
        match self {
            Self::FieldMatch(FieldMatch::Flag {
                field: FlagField::Duplicates,
                ..
            }) => true,
            Self::Group(inner) => inner.contains_duplicates_bang(),
            Self::And(left, right) | Self::Or(left, right) => {
                left.contains_duplicates_bang() || right.contains_duplicates_bang()
            }
            Self::All | Self::PlainText(_) | Self::FieldMatch(_) => false,
        }
    }
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '{' | '}' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Display for FieldMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = bang_name(self);
        match self {
            Self::Text { needle, .. } => write!(f, "!{name}{{{}}}", escape_value(needle)),
            Self::Format(selector) => write!(f, "!{name}{{{selector}}}"),
            Self::Flag { expected, .. } => write!(f, "!{name}{{{expected}}}"),
            Self::Numeric {
                field: NumericField::Duration,
                value,
                ..
            } if value % 1000 == 0 => write!(f, "!{name}{{{}s}}", value / 1000),
            Self::Numeric {
                field: NumericField::Duration,
                value,
                ..
            } => write!(f, "!{name}{{{value}ms}}"),
            Self::Numeric { value, .. } => write!(f, "!{name}{{{value}}}"),
            Self::Updated { date, .. } => write!(f, "!{name}{{{date}}}"),
        }
    }
}

impl Display for QueryExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::All => Ok(()),
            Self::PlainText(text) => write!(f, "{text}"),
            Self::FieldMatch(field_match) => write!(f, "{field_match}"),
            Self::Group(inner) => write!(f, "!!{{{inner}}}"),
            Self::And(left, right) => write!(f, "{left} & {right}"),
            Self::Or(left, right) => write!(f, "{left} | {right}"),
        }
    }
}
