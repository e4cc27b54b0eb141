//! Bang query language.
//!
//! A query is either free text, searched across title, album, artist and
//! album artists, or a composition of bangs such as
//! `!!{!t{Hotel California} & !ar{The Eagles}} | !f{flac24}`.
//! Parsing never fails; see [`parser::parse`].

pub mod ast;
pub(crate) mod bangs;
pub mod engine;
pub mod evaluator;
pub mod parser;
pub mod values;


pub use {
    ast::{Comparison, FieldMatch, FlagField, NumericField, QueryExpression, TextField},
    engine::{filter, query, query_snapshot},
    evaluator::{MatchContext, evaluate, evaluate_in},
    parser::parse,
    values::{FormatSelector, PartialDate},
};
