use std::{fmt, fs, path::Path};

use logos::Logos;
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;
use tracing::debug;

#[derive(Logos, Debug, PartialEq)]
enum Token {
    #[token(",")]
    Comma,
    #[regex(r"\r\n|\r|\n")]
    Newline,
    // `""` inside a quoted field is an escaped quote
    #[regex(r#""([^"]|"")*""#)]
    Quoted,
    #[regex(r#"[^",\r\n]+"#)]
    Bare,
}

/// A CSV cell after best-effort numeric coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Field {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Field::Integer(i) => Some(*i as f64),
            Field::Float(f) => Some(*f),
            Field::Text(_) => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Integer(i) => write!(f, "{i}"),
            Field::Float(x) => write!(f, "{x}"),
            Field::Text(s) => f.write_str(s),
        }
    }
}

/// Tries an integer, then a finite float. Anything else is kept verbatim.
pub fn parse_number_or_keep_original(field: &str) -> Field {
    let trimmed = field.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Field::Integer(i);
    }
    match trimmed.parse::<f64>() {
        Ok(x) if x.is_finite() => Field::Float(x),
        _ => Field::Text(field.to_string()),
    }
}

/// A non-empty data row and the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub line: usize,
    pub fields: Vec<Field>,
}

impl RawRow {
    fn new(line: usize, cells: Vec<String>) -> Self {
        let fields = cells
            .into_iter()
            .enumerate()
            .map(|(column, cell)| match column {
                1 | 2 => parse_number_or_keep_original(&cell),
                _ => Field::Text(cell),
            })
            .collect();
        Self { line, fields }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum LoadError {
    #[error("could not read weather data: {0}")]
    #[diagnostic(code(weather::io))]
    Io(#[from] std::io::Error),
    #[error("malformed CSV on line {line}")]
    #[diagnostic(
        code(weather::csv),
        help("a quote may only open and close a whole field")
    )]
    Lex {
        line: usize,
        #[source_code]
        src: String,
        #[label("unexpected input")]
        span: SourceSpan,
    },
}

/// Splits CSV text into rows, dropping the header and blank lines.
pub fn parse_rows(input: &str) -> Result<Vec<RawRow>, LoadError> {
    let mut lexer = Token::lexer(input);
    let mut rows = Vec::new();
    let mut cells: Vec<String> = Vec::new();
    let mut cell: Option<String> = None;
    let mut line = 1;
    let mut row_start = line;

    let mut end_row = |cells: &mut Vec<String>, cell: &mut Option<String>, start: usize| {
        if cells.is_empty() && cell.is_none() {
            return;
        }
        cells.push(cell.take().unwrap_or_default());
        rows.push(RawRow::new(start, std::mem::take(cells)));
    };

    let lex_error = |line: usize, span: std::ops::Range<usize>| LoadError::Lex {
        line,
        src: input.to_string(),
        span: span.into(),
    };

    while let Some(token) = lexer.next() {
        match token {
            Ok(Token::Comma) => cells.push(cell.take().unwrap_or_default()),
            Ok(Token::Newline) => {
                end_row(&mut cells, &mut cell, row_start);
                line += 1;
                row_start = line;
            }
            // One token per cell, e.g. `5"0` and `"50"9` are rejected.
            Ok(Token::Quoted | Token::Bare) if cell.is_some() => {
                return Err(lex_error(line, lexer.span()));
            }
            Ok(Token::Quoted) => {
                let slice = lexer.slice();
                line += slice.matches('\n').count();
                cell = Some(slice[1..slice.len() - 1].replace("\"\"", "\""));
            }
            Ok(Token::Bare) => cell = Some(lexer.slice().to_string()),
            Err(()) => return Err(lex_error(line, lexer.span())),
        }
    }
    end_row(&mut cells, &mut cell, row_start);

    // The first row is the header.
    if !rows.is_empty() {
        rows.remove(0);
    }
    debug!(rows = rows.len(), "parsed CSV rows");

    Ok(rows)
}

pub fn load_rows(path: impl AsRef<Path>) -> Result<Vec<RawRow>, LoadError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading weather data");
    let input = fs::read_to_string(path)?;
    parse_rows(&input)
}
