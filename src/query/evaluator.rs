//! Predicate evaluation of parsed queries against track records.

use std::{collections::HashMap, iter::once};

use crate::{
    library::models::TrackRecord,
    query::ast::{Comparison, FieldMatch, FlagField, NumericField, QueryExpression, TextField},
};

/// Library-wide facts some predicates need beyond a single record.
///
/// Today this is the duplicate index: the `(title, album artists)` keys
/// that occur on more than one track.
#[derive(Debug, Default, Clone)]
pub struct MatchContext {
    duplicate_keys: HashMap<(String, String), usize>,
}

impl MatchContext {
    /// Builds the duplicate index over a library.
    #[must_use]
    pub fn from_library<'a>(tracks: impl IntoIterator<Item = &'a TrackRecord>) -> Self {
        let mut counts: HashMap<(String, String), usize> = HashMap::new();
        for track in tracks {
            *counts.entry(duplicate_key(track)).or_default() += 1;
        }
        counts.retain(|_, count| *count > 1);
        Self {
            duplicate_keys: counts,
        }
    }

    /// Whether another track in the library shares this record's title and
    /// album artists.
    #[must_use]
    pub fn is_duplicate(&self, record: &TrackRecord) -> bool {
        self.duplicate_keys.contains_key(&duplicate_key(record))
    }
}

fn duplicate_key(record: &TrackRecord) -> (String, String) {
    (record.title.clone(), record.album_artists_display())
}

/// Evaluates an expression against a record without library context.
///
/// `!dup` never matches here; use [`evaluate_in`] with a context built
/// from the library.
#[must_use]
pub fn evaluate(expression: &QueryExpression, record: &TrackRecord) -> bool {
    evaluate_in(expression, record, &MatchContext::default())
}

/// Evaluates an expression against a record.
///
/// # Arguments
///
/// * `expression` - Parsed query
/// * `record` - Track to test
/// * `context` - Library-wide facts for context-dependent predicates
///
/// # Returns
///
/// `true` when the record satisfies the expression.
#[must_use]
pub fn evaluate_in(
    expression: &QueryExpression,
    record: &TrackRecord,
    context: &MatchContext,
) -> bool {
    match expression {
        QueryExpression::All => true,
        QueryExpression::PlainText(text) => full_text_contains(record, &text.to_lowercase()),
        QueryExpression::FieldMatch(field_match) => matches_field(field_match, record, context),
        QueryExpression::Group(inner) => evaluate_in(inner, record, context),
        QueryExpression::And(left, right) => {
            evaluate_in(left, record, context) && evaluate_in(right, record, context)
        }
        QueryExpression::Or(left, right) => {
            evaluate_in(left, record, context) || evaluate_in(right, record, context)
        }
    }
}

fn full_text_contains(record: &TrackRecord, lowered_needle: &str) -> bool {
    text_values(record, TextField::FullText)
        .any(|value| value.to_lowercase().contains(lowered_needle))
}

fn text_values(record: &TrackRecord, field: TextField) -> Box<dyn Iterator<Item = &str> + '_> {
    match field {
        TextField::FullText => Box::new(
            [
                record.title.as_str(),
                record.album.as_str(),
                record.artist.as_str(),
            ]
            .into_iter()
            .chain(record.album_artists.iter().map(String::as_str)),
        ),
        TextField::Title => Box::new(once(record.title.as_str())),
        TextField::Album => Box::new(once(record.album.as_str())),
        TextField::AlbumArtists => Box::new(record.album_artists.iter().map(String::as_str)),
        TextField::Artist => Box::new(once(record.artist.as_str())),
        TextField::Source => Box::new(once(record.source.as_str())),
    }
}

fn compare(actual: i64, comparison: Comparison, value: i64) -> bool {
    match comparison {
        Comparison::LessThan => actual < value,
        Comparison::GreaterThan => actual > value,
    }
}

fn matches_field(field_match: &FieldMatch, record: &TrackRecord, context: &MatchContext) -> bool {
    match field_match {
        FieldMatch::Text {
            field,
            needle,
            exact: true,
        } => text_values(record, *field).any(|value| value == needle.as_str()),
        FieldMatch::Text {
            field,
            needle,
            exact: false,
        } => {
            let needle = needle.to_lowercase();
            text_values(record, *field).any(|value| value.to_lowercase().contains(&needle))
        }
        FieldMatch::Format(selector) => selector.matches(record.file_type),
        FieldMatch::Flag { field, expected } => {
            let actual = match field {
                FlagField::Duplicates => context.is_duplicate(record),
                FlagField::MusicbrainzId => record.has_musicbrainz_id(),
                FlagField::FrontCover => record.has_front_cover,
            };
            actual == *expected
        }
        FieldMatch::Numeric {
            field,
            comparison,
            value,
        } => {
            let actual = match field {
                NumericField::Bitrate => i64::from(record.bitrate),
                NumericField::CoverWidth => i64::from(record.front_cover_width),
                NumericField::CoverHeight => i64::from(record.front_cover_height),
                NumericField::Duration => i64::try_from(record.duration).unwrap_or(i64::MAX),
            };
            compare(actual, *comparison, *value)
        }
        FieldMatch::Updated { comparison, date } => date.compare(&record.updated, *comparison),
    }
}
