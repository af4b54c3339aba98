//! # Type Expressions
//!
//! The textual type syntax used in schema documents:
//!
//! ```text
//! type  := "[]" type
//!        | "map[" type "]" type
//!        | name
//! name  := [A-Za-z0-9_]+    ; bool, int, float, string, any are reserved
//! ```
//!
//! Whitespace is allowed around every type. Parse errors carry the byte
//! offset of the offending input within the whole expression.

use std::fmt;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, cut, map},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use crate::error::SchemaLoadError;

/// A parsed type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `string`
    Str,
    /// `any`
    Any,
    /// `[]T`
    Seq(Box<TypeExpr>),
    /// `map[K]V`
    Map(Box<TypeExpr>, Box<TypeExpr>),
    /// A schema or named type.
    Name(String),
}

impl TypeExpr {
    /// Parse a type expression. Errors name the whole expression.
    pub fn parse(src: &str) -> Result<Self, SchemaLoadError> {
        let expr = src.trim();
        match all_consuming(delimited(multispace0, type_expr, multispace0))(expr) {
            Ok((_, parsed)) => Ok(parsed),
            Err(err) => Err(SchemaLoadError::InvalidTypeExpr {
                expr: expr.to_string(),
                reason: describe(expr, err),
            }),
        }
    }
}

fn describe(expr: &str, err: nom::Err<nom::error::Error<&str>>) -> String {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let at = expr.len() - e.input.len();
            match e.input.chars().next() {
                None => format!("unexpected end of input at offset {at}"),
                Some(c) => format!("unexpected {c:?} at offset {at}"),
            }
        }
        nom::Err::Incomplete(_) => "incomplete type expression".to_string(),
    }
}

fn name(i: &str) -> IResult<&str, TypeExpr> {
    map(take_while1(|c: char| c.is_alphanumeric() || c == '_'), |n: &str| match n {
        "bool" => TypeExpr::Bool,
        "int" => TypeExpr::Int,
        "float" => TypeExpr::Float,
        "string" => TypeExpr::Str,
        "any" => TypeExpr::Any,
        other => TypeExpr::Name(other.to_string()),
    })(i)
}

fn seq(i: &str) -> IResult<&str, TypeExpr> {
    map(preceded(tag("[]"), cut(type_expr)), |elem| TypeExpr::Seq(Box::new(elem)))(i)
}

fn map_type(i: &str) -> IResult<&str, TypeExpr> {
    let key = delimited(tag("map["), cut(terminated(type_expr, multispace0)), cut(char(']')));
    map(pair(key, cut(type_expr)), |(k, v)| TypeExpr::Map(Box::new(k), Box::new(v)))(i)
}

fn type_expr(i: &str) -> IResult<&str, TypeExpr> {
    preceded(multispace0, alt((seq, map_type, name)))(i)
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Bool => f.write_str("bool"),
            TypeExpr::Int => f.write_str("int"),
            TypeExpr::Float => f.write_str("float"),
            TypeExpr::Str => f.write_str("string"),
            TypeExpr::Any => f.write_str("any"),
            TypeExpr::Seq(elem) => write!(f, "[]{elem}"),
            TypeExpr::Map(k, v) => write!(f, "map[{k}]{v}"),
            TypeExpr::Name(n) => f.write_str(n),
        }
    }
}
