//! Recursive-descent parser for bang queries.
//!
//! Parsing is total: spans that do not form valid bang syntax become
//! [`QueryExpression::PlainText`] leaves holding their literal source text,
//! so every input string yields a tree.

use crate::query::{
    ast::{FieldMatch, NumericField, QueryExpression},
    bangs::{BangKind, resolve},
    values::{FormatSelector, PartialDate, parse_duration, parse_flag, parse_integer},
};

/// Parses a bang query into an expression tree.
///
/// # Arguments
///
/// * `input` - Raw query text as typed by the user
///
/// # Returns
///
/// `All` for empty or whitespace-only input, a single `PlainText` of the
/// trimmed input when it contains no bang syntax, and the parsed tree
/// otherwise.
#[must_use]
pub fn parse(input: &str) -> QueryExpression {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return QueryExpression::All;
    }
    if !has_bang_syntax(trimmed) {
        return QueryExpression::PlainText(trimmed.to_string());
    }

    let mut parser = Parser {
        input: trimmed,
        pos: 0,
        depth: 0,
    };
    parser.parse_or(false).unwrap_or(QueryExpression::All)
}

fn is_bang_start(rest: &str) -> bool {
    let mut chars = rest.chars();
    chars.next() == Some('!') && chars.next().is_some_and(|c| c == '!' || c.is_alphanumeric())
}

fn has_bang_syntax(input: &str) -> bool {
    input
        .char_indices()
        .any(|(i, c)| c == '!' && is_bang_start(&input[i..]))
}

fn join(
    left: Option<QueryExpression>,
    right: Option<QueryExpression>,
    combine: fn(Box<QueryExpression>, Box<QueryExpression>) -> QueryExpression,
) -> Option<QueryExpression> {
    match (left, right) {
        (Some(left), Some(right)) => Some(combine(Box::new(left), Box::new(right))),
        (left, None) => left,
        (None, right) => right,
    }
}

/// Outcome of scanning a `{...}` value.
enum ValueScan {
    /// No value follows the bang name.
    Absent,
    /// The unescaped value text.
    Present(String),
    /// The closing brace was never found.
    Unterminated,
}

/// Deepest `!!{...}` nesting parsed as groups; anything nested further is
/// kept as literal text.
const MAX_GROUP_DEPTH: usize = 256;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn at_terminator(&self, in_group: bool) -> bool {
        match self.peek() {
            None | Some('|') => true,
            Some('}') => in_group,
            Some(_) => false,
        }
    }

    /// `Or := And ('|' And)*`
    fn parse_or(&mut self, in_group: bool) -> Option<QueryExpression> {
        let mut expression = self.parse_and(in_group);
        loop {
            self.skip_whitespace();
            if self.peek() != Some('|') {
                return expression;
            }
            self.bump();
            let right = self.parse_and(in_group);
            expression = join(expression, right, QueryExpression::Or);
        }
    }

    /// `And := Atom ('&'? Atom)*`
    ///
    /// Operators without an operand on one side are dropped.
    fn parse_and(&mut self, in_group: bool) -> Option<QueryExpression> {
        let mut expression = None;
        loop {
            self.skip_whitespace();
            if self.at_terminator(in_group) {
                return expression;
            }
            if self.peek() == Some('&') {
                self.bump();
                continue;
            }
            let atom = self.parse_atom(in_group);
            expression = join(expression, atom, QueryExpression::And);
        }
    }

    fn parse_atom(&mut self, in_group: bool) -> Option<QueryExpression> {
        if self.rest().starts_with("!!{") {
            return Some(self.parse_group());
        }
        if is_bang_start(self.rest()) && !self.rest().starts_with("!!") {
            return Some(self.parse_bang());
        }
        self.parse_plain_text(in_group)
    }

    /// `Group := '!!' '{' Or '}'`
    ///
    /// An unterminated group, or one nested deeper than `MAX_GROUP_DEPTH`,
    /// turns the rest of the input into literal text.
    fn parse_group(&mut self) -> QueryExpression {
        let start = self.pos;
        if self.depth >= MAX_GROUP_DEPTH {
            return self.take_remainder(start);
        }
        self.pos += "!!{".len();

        self.depth += 1;
        let inner = self.parse_or(true);
        self.depth -= 1;

        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.bump();
            QueryExpression::Group(Box::new(inner.unwrap_or(QueryExpression::All)))
        } else {
            drop(inner);
            self.take_remainder(start)
        }
    }

    fn take_remainder(&mut self, start: usize) -> QueryExpression {
        self.pos = self.input.len();
        QueryExpression::PlainText(self.input[start..].trim_end().to_string())
    }

    /// `Bang := '!' NAME ( '{' VALUE '}' | '`' )?`
    fn parse_bang(&mut self) -> QueryExpression {
        let input = self.input;
        let start = self.pos;
        self.bump();

        let name_start = self.pos;
        while self.peek().is_some_and(char::is_alphanumeric) {
            self.bump();
        }
        let name = &input[name_start..self.pos];

        let value = match self.scan_value() {
            ValueScan::Unterminated => return self.take_remainder(start),
            ValueScan::Absent => None,
            ValueScan::Present(value) => Some(value),
        };

        let literal = &input[start..self.pos];
        resolve(name)
            .and_then(|kind| build_match(kind, value.as_deref()))
            .map_or_else(
                || QueryExpression::PlainText(literal.to_string()),
                QueryExpression::FieldMatch,
            )
    }

    fn scan_value(&mut self) -> ValueScan {
        match self.peek() {
            Some('`') => {
                self.bump();
                return ValueScan::Present("true".to_string());
            }
            Some('{') => {
                self.bump();
            }
            _ => return ValueScan::Absent,
        }

        let mut value = String::new();
        let mut depth = 1usize;
        while let Some(c) = self.bump() {
            match c {
                '\\' => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => return ValueScan::Unterminated,
                },
                '{' => {
                    depth += 1;
                    value.push(c);
                }
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return ValueScan::Present(value);
                    }
                    value.push(c);
                }
                _ => value.push(c),
            }
        }
        ValueScan::Unterminated
    }

    /// Consumes literal text up to the next bang, operator, or group end.
    fn parse_plain_text(&mut self, in_group: bool) -> Option<QueryExpression> {
        let start = self.pos;

        // A leading `!!` that does not open a group is literal text.
        if self.rest().starts_with("!!") {
            self.pos += "!!".len();
        }
        while let Some(c) = self.peek() {
            let stops = match c {
                '&' | '|' => true,
                '}' => in_group,
                '!' => is_bang_start(self.rest()),
                _ => false,
            };
            if stops && self.pos > start {
                break;
            }
            self.bump();
        }

        let text = self.input[start..self.pos].trim();
        (!text.is_empty()).then(|| QueryExpression::PlainText(text.to_string()))
    }
}

fn build_match(kind: BangKind, value: Option<&str>) -> Option<FieldMatch> {
    let field_match = match kind {
        BangKind::Text { field, exact } => FieldMatch::Text {
            field,
            needle: value?.to_string(),
            exact,
        },
        BangKind::Format => FieldMatch::Format(value?.parse::<FormatSelector>().ok()?),
        BangKind::Flag(field) => FieldMatch::Flag {
            field,
            expected: parse_flag(value)?,
        },
        BangKind::Numeric(field, comparison) => FieldMatch::Numeric {
            field,
            comparison,
            value: parse_integer(value?)?,
        },
        BangKind::Duration(comparison) => FieldMatch::Numeric {
            field: NumericField::Duration,
            comparison,
            value: parse_duration(value?)?,
        },
        BangKind::Updated(comparison) => FieldMatch::Updated {
            comparison,
            date: value?.parse::<PartialDate>().ok()?,
        },
    };
    Some(field_match)
}
