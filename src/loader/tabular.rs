//! Legacy tabular lens format, one record per line:
//!
//! ```text
//! # comment
//! wavelengths 0.000486 0.000587 0.000656
//! diaphragm 12.0
//! object_medium 1.0 1.0 1.0
//! [kind] radius offset diameter [n0 n1 ...]
//! ```
use super::{LensDescription, SurfaceRow};
use crate::core::error::{LensError, Result};
use crate::core::numeric::Float;
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while1},
    character::complete::{char, not_line_ending, space0, space1},
    combinator::{all_consuming, map, opt, value, verify},
    error::{convert_error, VerboseError},
    multi::{many0, separated_list1},
    number::complete::double,
    sequence::{pair, preceded, terminated, tuple},
    Err, IResult
};

pub type ParseResult<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Blank,
    Wavelengths(Vec<Float>),
    Diaphragm(Float),
    ObjectMedium(Vec<Float>),
    Surface(SurfaceRow)
}

pub fn parse_comment(i: &str) -> ParseResult<&str> {
    preceded(char('#'), not_line_ending)(i)
}

fn infinity(i: &str) -> ParseResult<&str> {
    alt((tag_no_case("infinity"), tag_no_case("inf")))(i)
}

/// A number, `inf` / `-inf` included.
pub fn parse_number(i: &str) -> ParseResult<Float> {
    alt((
        value(Float::INFINITY, preceded(opt(char('+')), infinity)),
        value(Float::NEG_INFINITY, preceded(char('-'), infinity)),
        map(double, |v| v as Float)
    ))(i)
}

fn number_list(i: &str) -> ParseResult<Vec<Float>> {
    separated_list1(space1, parse_number)(i)
}

fn keyword<'a>(name: &'static str) -> impl FnMut(&'a str) -> ParseResult<'a, &'a str> {
    terminated(tag(name), space1)
}

pub fn parse_kind(i: &str) -> ParseResult<&str> {
    verify(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        |s: &str| !s.eq_ignore_ascii_case("inf") && !s.eq_ignore_ascii_case("infinity")
    )(i)
}

pub fn parse_surface(i: &str) -> ParseResult<SurfaceRow> {
    map(
        tuple((
            opt(terminated(parse_kind, space1)),
            parse_number,
            preceded(space1, parse_number),
            preceded(space1, parse_number),
            many0(preceded(space1, parse_number))
        )),
        |(kind, radius, offset, diameter, indices)| SurfaceRow {
            line: 0,
            kind: kind.map(str::to_owned),
            radius,
            offset,
            diameter,
            indices
        }
    )(i)
}

/// Trailing blanks and an optional comment, up to the end of the line.
fn rest(i: &str) -> ParseResult<()> {
    value((), all_consuming(pair(space0, opt(parse_comment))))(i)
}

pub fn parse_record(i: &str) -> ParseResult<Record> {
    preceded(space0, alt((
        terminated(map(preceded(keyword("wavelengths"), number_list), Record::Wavelengths), rest),
        terminated(map(preceded(keyword("diaphragm"), parse_number), Record::Diaphragm), rest),
        terminated(map(preceded(keyword("object_medium"), number_list), Record::ObjectMedium), rest),
        terminated(map(parse_surface, Record::Surface), rest),
        value(Record::Blank, rest)
    )))(i)
}

/// Parse a whole file. Errors carry the 1-based line number.
pub fn parse_description(text: &str) -> Result<LensDescription> {
    let mut description = LensDescription::default();
    for (n, line) in text.lines().enumerate() {
        let line_no = n + 1;
        let record = match parse_record(line) {
            Ok((_, record)) => record,
            Err(Err::Error(e)) | Err(Err::Failure(e)) => {
                return Err(LensError::Parse { line: line_no, message: convert_error(line, e) });
            }
            Err(Err::Incomplete(_)) => {
                return Err(LensError::Parse { line: line_no, message: "incomplete record".into() });
            }
        };
        match record {
            Record::Blank => {}
            Record::Wavelengths(w) => description.wavelengths = w,
            Record::Diaphragm(d) => description.diaphragm = Some(d),
            Record::ObjectMedium(n) => description.object_medium = n,
            Record::Surface(mut row) => {
                row.line = line_no;
                description.surfaces.push(row);
            }
        }
    }
    Ok(description)
}
