//! Expression parsing and evaluation for tied parameters
//!
//! Tie expressions are plain arithmetic over dotted identifiers naming a
//! component parameter, e.g. `0.5 * disk.r_eff + 1` or
//! `log10(10^halo.mvirial * 0.9)`. Parsing is done with `nom`.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::recognize,
    multi::many0,
    number::complete::double,
    sequence::{delimited, pair},
    IResult, Parser,
};
use std::collections::HashMap;
use thiserror::Error;

/// Error that can occur during expression parsing or evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Failed to parse expression: {message}")]
    ParseError { message: String },

    #[error("Undefined variable: {name}")]
    UndefinedVariable { name: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Undefined function: {name}")]
    UndefinedFunction { name: String },
}

type ExprResult<T> = Result<T, ExpressionError>;

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Constant number
    Number(f64),

    /// Reference to a `component.param` value (or a plain name)
    Variable(String),

    /// Negation
    Neg(Box<Expression>),

    /// Binary operations
    Binary(BinaryOp, Box<Expression>, Box<Expression>),

    /// Function call
    Function(String, Vec<Expression>),
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Context for expression evaluation, providing variable values
pub trait EvaluationContext {
    /// Get the value of a variable
    fn get_variable(&self, name: &str) -> ExprResult<f64>;

    /// Check if a variable exists
    fn has_variable(&self, name: &str) -> bool;
}

/// Simple implementation of EvaluationContext using a HashMap
#[derive(Debug, Clone, Default)]
pub struct SimpleContext {
    variables: HashMap<String, f64>,
}

impl SimpleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_variable(&mut self, name: &str, value: f64) {
        self.variables.insert(name.to_string(), value);
    }
}

impl EvaluationContext for SimpleContext {
    fn get_variable(&self, name: &str) -> ExprResult<f64> {
        self.variables
            .get(name)
            .copied()
            .ok_or_else(|| ExpressionError::UndefinedVariable {
                name: name.to_string(),
            })
    }

    fn has_variable(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }
}

impl Expression {
    /// Parse an expression from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use galkin_rs::parameters::{Expression, SimpleContext};
    ///
    /// let expr = Expression::parse("2 * disk.r_eff - 1").unwrap();
    /// let mut ctx = SimpleContext::new();
    /// ctx.set_variable("disk.r_eff", 3.0);
    /// assert_eq!(expr.evaluate(&ctx).unwrap(), 5.0);
    /// ```
    pub fn parse(input: &str) -> ExprResult<Self> {
        match expr_parser(input.trim()) {
            Ok((remainder, expr)) => {
                if remainder.trim().is_empty() {
                    Ok(expr)
                } else {
                    Err(ExpressionError::ParseError {
                        message: format!("Unexpected trailing characters: '{}'", remainder),
                    })
                }
            }
            Err(e) => Err(ExpressionError::ParseError {
                message: format!("{:?}", e),
            }),
        }
    }

    /// Evaluate the expression with the given context
    pub fn evaluate<C: EvaluationContext + ?Sized>(&self, context: &C) -> ExprResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),

            Self::Variable(name) => context.get_variable(name),

            Self::Neg(expr) => Ok(-expr.evaluate(context)?),

            Self::Binary(op, left, right) => {
                let lhs = left.evaluate(context)?;
                let rhs = right.evaluate(context)?;

                match op {
                    BinaryOp::Add => Ok(lhs + rhs),
                    BinaryOp::Sub => Ok(lhs - rhs),
                    BinaryOp::Mul => Ok(lhs * rhs),
                    BinaryOp::Div => {
                        if rhs == 0.0 {
                            Err(ExpressionError::DivisionByZero)
                        } else {
                            Ok(lhs / rhs)
                        }
                    }
                    BinaryOp::Pow => Ok(lhs.powf(rhs)),
                }
            }

            Self::Function(name, args) => {
                let values = args
                    .iter()
                    .map(|arg| arg.evaluate(context))
                    .collect::<ExprResult<Vec<f64>>>()?;
                call_function(name, &values)
            }
        }
    }

    /// All distinct variable names referenced by the expression, sorted
    pub fn variables(&self) -> Vec<String> {
        let mut vars = Vec::new();
        self.collect_variables(&mut vars);
        vars.sort();
        vars.dedup();
        vars
    }

    fn collect_variables(&self, vars: &mut Vec<String>) {
        match self {
            Self::Number(_) => {}
            Self::Variable(name) => vars.push(name.clone()),
            Self::Neg(expr) => expr.collect_variables(vars),
            Self::Binary(_, left, right) => {
                left.collect_variables(vars);
                right.collect_variables(vars);
            }
            Self::Function(_, args) => {
                for arg in args {
                    arg.collect_variables(vars);
                }
            }
        }
    }
}

fn unary_fn(name: &str, args: &[f64], f: fn(f64) -> f64) -> ExprResult<f64> {
    if args.len() != 1 {
        return Err(ExpressionError::InvalidOperation {
            message: format!("{}() requires 1 argument, got {}", name, args.len()),
        });
    }
    Ok(f(args[0]))
}

fn call_function(name: &str, args: &[f64]) -> ExprResult<f64> {
    match name {
        "sin" => unary_fn(name, args, f64::sin),
        "cos" => unary_fn(name, args, f64::cos),
        "tan" => unary_fn(name, args, f64::tan),
        "exp" => unary_fn(name, args, f64::exp),
        "log" | "ln" => unary_fn(name, args, f64::ln),
        "log10" => unary_fn(name, args, f64::log10),
        "sqrt" => unary_fn(name, args, f64::sqrt),
        "abs" => unary_fn(name, args, f64::abs),
        "radians" => unary_fn(name, args, f64::to_radians),
        "degrees" => unary_fn(name, args, f64::to_degrees),
        "max" | "min" => {
            if args.len() < 2 {
                return Err(ExpressionError::InvalidOperation {
                    message: format!("{}() requires at least 2 arguments, got {}", name, args.len()),
                });
            }
            if name == "max" {
                Ok(args.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b)))
            } else {
                Ok(args.iter().fold(f64::INFINITY, |a, &b| a.min(b)))
            }
        }
        _ => Err(ExpressionError::UndefinedFunction {
            name: name.to_string(),
        }),
    }
}

// Parser functions using nom

/// Identifier: a letter or underscore, then letters, digits, underscores and dots
fn identifier(input: &str) -> IResult<&str, String> {
    let mut parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_"), tag(".")))),
    ));

    let (input, matched) = parser.parse(input)?;
    Ok((input, matched.to_string()))
}

fn args_list(input: &str) -> IResult<&str, Vec<Expression>> {
    let (input, first) = expr_parser(input)?;
    let mut res = vec![first];

    let mut remainder = input;
    loop {
        let mut comma_parser = delimited(
            multispace0::<&str, nom::error::Error<&str>>,
            char::<&str, nom::error::Error<&str>>(','),
            multispace0::<&str, nom::error::Error<&str>>,
        );

        match comma_parser.parse(remainder) {
            Ok((after_comma, _)) => {
                let (after_expr, expr) = expr_parser(after_comma)?;
                res.push(expr);
                remainder = after_expr;
            }
            Err(_) => break,
        }
    }

    Ok((remainder, res))
}

/// Identifier optionally followed by an argument list
fn name_or_call(input: &str) -> IResult<&str, Expression> {
    let (input, name) = identifier(input)?;
    let (after_space, _) = multispace0.parse(input)?;

    let mut open_paren = char::<&str, nom::error::Error<&str>>('(');
    let Ok((after_open, _)) = open_paren.parse(after_space) else {
        return Ok((input, Expression::Variable(name)));
    };
    let (after_open, _) = multispace0.parse(after_open)?;

    let mut close_paren = char::<&str, nom::error::Error<&str>>(')');
    if let Ok((rest, _)) = close_paren.parse(after_open) {
        return Ok((rest, Expression::Function(name, vec![])));
    }

    let (rest, args) = args_list(after_open)?;
    let (rest, _) = multispace0.parse(rest)?;
    let (rest, _) = char::<&str, nom::error::Error<&str>>(')').parse(rest)?;
    Ok((rest, Expression::Function(name, args)))
}

fn number(input: &str) -> IResult<&str, Expression> {
    let (input, num) = double(input)?;
    Ok((input, Expression::Number(num)))
}

fn parens(input: &str) -> IResult<&str, Expression> {
    let (input, _) = char('(').parse(input)?;
    let (input, expr) = expr_parser(input)?;
    let (input, _) = multispace0.parse(input)?;
    let (input, _) = char::<_, nom::error::Error<_>>(')').parse(input)?;
    Ok((input, expr))
}

/// Number, name, function call, or parenthesized expression
fn primary(input: &str) -> IResult<&str, Expression> {
    let (input, _) = multispace0.parse(input)?;
    match input.chars().next() {
        // Names go first so that e.g. `inf_halo.x` is not read as `inf`
        Some(c) if c.is_ascii_alphabetic() || c == '_' => name_or_call(input),
        Some('(') => parens(input),
        _ => number(input),
    }
}

/// `primary ('^' unary)?`, right associative
fn power(input: &str) -> IResult<&str, Expression> {
    let (input, base) = primary(input)?;
    let (after_space, _) = multispace0.parse(input)?;

    match char::<_, nom::error::Error<_>>('^').parse(after_space) {
        Ok((after_op, _)) => {
            let (rest, exponent) = unary(after_op)?;
            Ok((
                rest,
                Expression::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)),
            ))
        }
        Err(_) => Ok((input, base)),
    }
}

/// `'-' unary | power`
fn unary(input: &str) -> IResult<&str, Expression> {
    let (input, _) = multispace0.parse(input)?;
    match char::<_, nom::error::Error<_>>('-').parse(input) {
        Ok((rest, _)) => {
            let (rest, expr) = unary(rest)?;
            Ok((rest, Expression::Neg(Box::new(expr))))
        }
        Err(_) => power(input),
    }
}

/// Left-associative chain of `*` and `/`
fn term(input: &str) -> IResult<&str, Expression> {
    let (mut input, mut acc) = unary(input)?;

    loop {
        let (after_space, _) = multispace0.parse(input)?;
        let op = match after_space.chars().next() {
            Some('*') => BinaryOp::Mul,
            Some('/') => BinaryOp::Div,
            _ => return Ok((input, acc)),
        };
        let (rest, rhs) = unary(&after_space[1..])?;
        acc = Expression::Binary(op, Box::new(acc), Box::new(rhs));
        input = rest;
    }
}

/// Left-associative chain of `+` and `-`
fn expr_parser(input: &str) -> IResult<&str, Expression> {
    let (mut input, mut acc) = term(input)?;

    loop {
        let (after_space, _) = multispace0.parse(input)?;
        let op = match after_space.chars().next() {
            Some('+') => BinaryOp::Add,
            Some('-') => BinaryOp::Sub,
            _ => return Ok((input, acc)),
        };
        let (rest, rhs) = term(&after_space[1..])?;
        acc = Expression::Binary(op, Box::new(acc), Box::new(rhs));
        input = rest;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn context() -> SimpleContext {
        let mut ctx = SimpleContext::new();
        ctx.set_variable("disk.r_eff", 5.0);
        ctx.set_variable("halo.mvirial", 12.0);
        ctx.set_variable("geom.inc", 60.0);
        ctx
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(Expression::parse("42").unwrap(), Expression::Number(42.0));
        assert_eq!(Expression::parse("1.5e-3").unwrap(), Expression::Number(1.5e-3));
    }

    #[test]
    fn test_parse_dotted_variable() {
        assert_eq!(
            Expression::parse("disk.r_eff").unwrap(),
            Expression::Variable("disk.r_eff".to_string())
        );
    }

    #[test]
    fn test_left_associativity() {
        let ctx = SimpleContext::new();
        assert_eq!(Expression::parse("10 - 4 - 3").unwrap().evaluate(&ctx).unwrap(), 3.0);
        assert_eq!(Expression::parse("16 / 4 / 2").unwrap().evaluate(&ctx).unwrap(), 2.0);
        assert_eq!(Expression::parse("2 ^ 3 ^ 2").unwrap().evaluate(&ctx).unwrap(), 512.0);
        assert_eq!(Expression::parse("-2 ^ 2").unwrap().evaluate(&ctx).unwrap(), -4.0);
    }

    #[test]
    fn test_evaluate_ties() {
        let ctx = context();

        let expr = Expression::parse("0.2 * disk.r_eff").unwrap();
        assert_relative_eq!(expr.evaluate(&ctx).unwrap(), 1.0);

        let expr = Expression::parse("log10(10^halo.mvirial / 2)").unwrap();
        assert_relative_eq!(expr.evaluate(&ctx).unwrap(), 12.0 - 2f64.log10(), epsilon = 1e-12);

        let expr = Expression::parse("sin(radians(geom.inc))").unwrap();
        assert_relative_eq!(expr.evaluate(&ctx).unwrap(), 3f64.sqrt() / 2.0, epsilon = 1e-12);

        let expr = Expression::parse("max(disk.r_eff, 7, 2)").unwrap();
        assert_eq!(expr.evaluate(&ctx).unwrap(), 7.0);
    }

    #[test]
    fn test_evaluation_errors() {
        let ctx = context();

        let err = Expression::parse("bulge.n + 1").unwrap().evaluate(&ctx);
        assert!(matches!(err, Err(ExpressionError::UndefinedVariable { .. })));

        let err = Expression::parse("disk.r_eff / 0").unwrap().evaluate(&ctx);
        assert_eq!(err, Err(ExpressionError::DivisionByZero));

        let err = Expression::parse("gamma(2)").unwrap().evaluate(&ctx);
        assert!(matches!(err, Err(ExpressionError::UndefinedFunction { .. })));

        assert!(Expression::parse("2 * (disk.r_eff").is_err());
        assert!(Expression::parse("2 disk.r_eff").is_err());
    }

    #[test]
    fn test_variables() {
        let expr = Expression::parse("disk.r_eff * 2 + halo.mvirial - disk.r_eff").unwrap();
        assert_eq!(expr.variables(), vec!["disk.r_eff", "halo.mvirial"]);
    }
}
