//! Minimal s-expression evaluator used to drive the registry the way a
//! template engine would: parse `(Name arg...)`, evaluate arguments first,
//! then call the registry function bound to `Name`.
//!
//! `.Key` reads `Key` from the context map and hands it over through a
//! loosely-typed slot, like a template engine reading a field of `any`.

#![allow(dead_code)]

use std::sync::Arc;

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, map, opt, recognize, value},
    error::{Error as NomError, ErrorKind},
    multi::many0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use fieldfn_core::{CallError, Field, FieldType, Method, NamedType, Record, Schema, Value, MUTATOR_HOOK};
use fieldfn_registry::{Operand, Registry};

#[derive(Debug, Clone)]
pub enum Expr {
    Call(String, Vec<Expr>),
    Lit(Value),
    Lookup(String),
}

#[derive(Debug)]
pub enum EvalError {
    Parse(String),
    Call(CallError),
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::Parse(msg) => write!(f, "parse error: {msg}"),
            EvalError::Call(e) => write!(f, "{e}"),
        }
    }
}

fn ident(i: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(i)
}

fn number(i: &str) -> IResult<&str, Value> {
    let (rest, text) = recognize(tuple((opt(char('-')), digit1, opt(pair(char('.'), digit1)))))(i)?;
    let parsed = if text.contains('.') {
        text.parse::<f64>().ok().map(Value::Float)
    } else {
        text.parse::<i64>().ok().map(Value::Int)
    };
    match parsed {
        Some(v) => Ok((rest, v)),
        None => Err(nom::Err::Error(NomError::new(i, ErrorKind::Digit))),
    }
}

fn string(i: &str) -> IResult<&str, Value> {
    map(delimited(char('"'), opt(is_not("\"")), char('"')), |s: Option<&str>| {
        Value::from(s.unwrap_or(""))
    })(i)
}

fn boolean(i: &str) -> IResult<&str, Value> {
    alt((value(Value::Bool(true), tag("true")), value(Value::Bool(false), tag("false"))))(i)
}

fn lookup(i: &str) -> IResult<&str, Expr> {
    map(preceded(char('.'), ident), |k: &str| Expr::Lookup(k.to_string()))(i)
}

fn call(i: &str) -> IResult<&str, Expr> {
    let (i, _) = char('(')(i)?;
    let (i, _) = multispace0(i)?;
    let (i, name) = ident(i)?;
    let (i, args) = many0(expr)(i)?;
    let (i, _) = multispace0(i)?;
    let (i, _) = char(')')(i)?;
    Ok((i, Expr::Call(name.to_string(), args)))
}

fn expr(i: &str) -> IResult<&str, Expr> {
    preceded(
        multispace0,
        alt((
            call,
            map(string, Expr::Lit),
            map(number, Expr::Lit),
            map(boolean, Expr::Lit),
            lookup,
        )),
    )(i)
}

pub fn parse(src: &str) -> Result<Expr, EvalError> {
    all_consuming(delimited(multispace0, expr, multispace0))(src)
        .map(|(_, e)| e)
        .map_err(|e| EvalError::Parse(e.to_string()))
}

fn eval_expr(registry: &Registry, expr: &Expr, ctx: &Value) -> Result<Operand, CallError> {
    match expr {
        Expr::Lit(v) => Ok(Operand::Value(v.clone())),
        Expr::Lookup(key) => {
            let found = match ctx.concrete() {
                Value::Map(m) => m.get(&Value::from(key.as_str())).cloned().unwrap_or(Value::Nil),
                _ => Value::Nil,
            };
            Ok(Operand::Value(Value::dynamic(found)))
        }
        Expr::Call(name, args) => {
            let args = args
                .iter()
                .map(|a| eval_expr(registry, a, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            registry.call(name, args)
        }
    }
}

/// Evaluate `src` against `registry` with an optional context map.
pub fn eval_with(registry: &Registry, src: &str, ctx: &Value) -> Result<Value, EvalError> {
    let expr = parse(src)?;
    match eval_expr(registry, &expr, ctx).map_err(EvalError::Call)? {
        Operand::Value(v) => Ok(v),
        Operand::Step(step) => Err(EvalError::Parse(format!("{} yields a setter result", step.field()))),
    }
}

pub fn eval(registry: &Registry, src: &str) -> Result<Value, EvalError> {
    eval_with(registry, src, &Value::Nil)
}

/// Context map from string keys.
pub fn context(entries: Vec<(&str, Value)>) -> Value {
    Value::Map(entries.into_iter().map(|(k, v)| (Value::from(k), v)).collect())
}

/// A record of `schema` with the given fields set directly.
pub fn record(schema: &Schema, fields: Vec<(&str, Value)>) -> Value {
    let mut r: Record = schema.zero_record();
    for (name, v) in fields {
        *r.field_mut(name).expect("field exists") = v;
    }
    Value::Record(r)
}

pub fn map_of(entries: Vec<(&str, Value)>) -> Value {
    context(entries)
}

// ─── Shared fixtures ─────────────────────────────────────────────────

/// `Z`: a string whose `Set` hook prefixes its argument with "z".
pub fn z_type() -> Arc<NamedType> {
    Arc::new(
        NamedType::new("Z", FieldType::Str).with_method(Method::by_ref(MUTATOR_HOOK, |recv, args| {
            match args {
                [Value::Str(s)] => {
                    *recv = Value::Str(format!("z{s}"));
                    Ok(())
                }
                _ => Err(CallError::Hook {
                    type_name: "Z".to_string(),
                    message: format!("want one string, got {} args", args.len()),
                }),
            }
        })),
    )
}

pub fn t_schema() -> Arc<Schema> {
    Schema::shared("T", vec![Field::new("A", FieldType::Str)])
}

pub fn s_schema() -> Arc<Schema> {
    Schema::shared(
        "S",
        vec![
            Field::new("URL", FieldType::Str),
            Field::new("Data", FieldType::map(FieldType::Str, FieldType::Int)),
            Field::new("List", FieldType::seq(FieldType::Int)),
            Field::new("ZStr", FieldType::named(z_type())),
            Field::new("Sub", FieldType::record(t_schema())),
        ],
    )
}

pub fn r_schema() -> Arc<Schema> {
    Schema::shared(
        "R",
        vec![
            Field::new("NotReq", FieldType::Str),
            Field::new("ReqInt", FieldType::Int).required(),
            Field::new("ReqSlice", FieldType::seq(FieldType::Int)).required(),
            Field::new("ReqMap", FieldType::map(FieldType::Str, FieldType::Int)).required(),
            Field::new("ReqStruct", FieldType::record(s_schema())).required(),
            Field::new("ReqZStr", FieldType::named(z_type())).required(),
        ],
    )
}

pub fn registry_with(schemas: &[Arc<Schema>]) -> Registry {
    let mut r = Registry::new();
    for s in schemas {
        r.register(s).expect("registration succeeds");
    }
    r
}
