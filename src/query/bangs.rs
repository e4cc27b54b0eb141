//! The bang vocabulary: which names exist and what they compare.
//!
//! This table is the user-facing contract of the query language and must
//! stay stable.

use crate::query::ast::{Comparison, FieldMatch, FlagField, NumericField, TextField};

/// What a bang name selects, before its value is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BangKind {
    /// String search on a text field.
    Text { field: TextField, exact: bool },
    /// `!f`
    Format,
    /// `true`/`false` bangs.
    Flag(FlagField),
    /// Integer comparison.
    Numeric(NumericField, Comparison),
    /// Duration comparison; the value is `0h0m0s`.
    Duration(Comparison),
    /// `!ubf` / `!uaf`
    Updated(Comparison),
}

const TEXT_BANGS: &[(&str, TextField)] = &[
    ("q", TextField::FullText),
    ("t", TextField::Title),
    ("al", TextField::Album),
    ("ala", TextField::AlbumArtists),
    ("alar", TextField::AlbumArtists),
    ("ar", TextField::Artist),
    ("s", TextField::Source),
];

/// Resolves a bang name to its kind.
///
/// Text bangs are exact when written in upper case (`!T`, `!ALA`) and
/// partial when written in lower case. Every other bang is lower case only.
/// Returns `None` for names outside the vocabulary.
pub(crate) fn resolve(name: &str) -> Option<BangKind> {
    let lowered = name.to_ascii_lowercase();
    if let Some(&(_, field)) = TEXT_BANGS.iter().find(|(bang, _)| *bang == lowered) {
        return if name == lowered {
            Some(BangKind::Text { field, exact: false })
        } else if name == name.to_ascii_uppercase() {
            Some(BangKind::Text { field, exact: true })
        } else {
            None
        };
    }

    let kind = match name {
        "f" => BangKind::Format,
        "dup" => BangKind::Flag(FlagField::Duplicates),
        "mb" => BangKind::Flag(FlagField::MusicbrainzId),
        "c" => BangKind::Flag(FlagField::FrontCover),
        "brlt" => BangKind::Numeric(NumericField::Bitrate, Comparison::LessThan),
        "brgt" => BangKind::Numeric(NumericField::Bitrate, Comparison::GreaterThan),
        "cwlt" => BangKind::Numeric(NumericField::CoverWidth, Comparison::LessThan),
        "cwgt" => BangKind::Numeric(NumericField::CoverWidth, Comparison::GreaterThan),
        "chlt" => BangKind::Numeric(NumericField::CoverHeight, Comparison::LessThan),
        "chgt" => BangKind::Numeric(NumericField::CoverHeight, Comparison::GreaterThan),
        "dlt" => BangKind::Duration(Comparison::LessThan),
        "dgt" => BangKind::Duration(Comparison::GreaterThan),
        "ubf" => BangKind::Updated(Comparison::LessThan),
        "uaf" => BangKind::Updated(Comparison::GreaterThan),
        _ => return None,
    };
    Some(kind)
}

/// Canonical bang name for a parsed field match.
pub(crate) fn bang_name(field_match: &FieldMatch) -> &'static str {
    match field_match {
        FieldMatch::Text { field, exact, .. } => match (field, exact) {
            (TextField::FullText, false) => "q",
            (TextField::FullText, true) => "Q",
            (TextField::Title, false) => "t",
            (TextField::Title, true) => "T",
            (TextField::Album, false) => "al",
            (TextField::Album, true) => "AL",
            (TextField::AlbumArtists, false) => "ala",
            (TextField::AlbumArtists, true) => "ALA",
            (TextField::Artist, false) => "ar",
            (TextField::Artist, true) => "AR",
            (TextField::Source, false) => "s",
            (TextField::Source, true) => "S",
        },
        FieldMatch::Format(_) => "f",
        FieldMatch::Flag { field, .. } => match field {
            FlagField::Duplicates => "dup",
            FlagField::MusicbrainzId => "mb",
            FlagField::FrontCover => "c",
        },
        FieldMatch::Numeric {
            field, comparison, ..
        } => match (field, comparison) {
            (NumericField::Bitrate, Comparison::LessThan) => "brlt",
            (NumericField::Bitrate, Comparison::GreaterThan) => "brgt",
            (NumericField::CoverWidth, Comparison::LessThan) => "cwlt",
            (NumericField::CoverWidth, Comparison::GreaterThan) => "cwgt",
            (NumericField::CoverHeight, Comparison::LessThan) => "chlt",
            (NumericField::CoverHeight, Comparison::GreaterThan) => "chgt",
            (NumericField::Duration, Comparison::LessThan) => "dlt",
            (NumericField::Duration, Comparison::GreaterThan) => "dgt",
        },
        FieldMatch::Updated { comparison, .. } => match comparison {
            Comparison::LessThan => "ubf",
            Comparison::GreaterThan => "uaf",
        },
    }
}
