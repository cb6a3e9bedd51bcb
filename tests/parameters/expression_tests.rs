//! Tests for the Expression parsing and evaluation

use galkin_rs::parameters::expression::{EvaluationContext, Expression, ExpressionError, SimpleContext};

#[test]
fn test_expression_parsing() {
    // Test parsing simple expressions
    let expr = Expression::parse("42").unwrap();
    assert!(expr.variables().is_empty());

    let expr = Expression::parse("disk.r_eff").unwrap();
    assert_eq!(expr.variables(), vec!["disk.r_eff".to_string()]);

    let expr = Expression::parse("2 * (halo.conc + 1)").unwrap();
    assert_eq!(expr.variables().len(), 1);

    let expr = Expression::parse("max(disk.r_eff, bulge.r_eff, 1.0)").unwrap();
    assert_eq!(expr.variables().len(), 2);

    // Test parsing expressions with whitespace
    let expr = Expression::parse("  (  geom.inc  +  geom.pa  )  *  2  ").unwrap();
    assert_eq!(expr.variables().len(), 2);

    // Test parsing invalid expressions
    assert!(Expression::parse("").is_err());
    assert!(Expression::parse("disk.r_eff +").is_err());
    assert!(Expression::parse("(disk.r_eff").is_err());
    assert!(Expression::parse("@#$%").is_err());
}

#[test]
fn test_expression_variables_are_distinct() {
    let expr = Expression::parse("geom.inc + geom.inc * geom.inc").unwrap();
    assert_eq!(expr.variables(), vec!["geom.inc".to_string()]);

    let expr = Expression::parse("sin(outflow.thetain) + cos(geom.inc)").unwrap();
    assert_eq!(expr.variables(), vec!["geom.inc".to_string(), "outflow.thetain".to_string()]);
}

#[test]
fn test_expression_evaluation() {
    let mut context = SimpleContext::new();
    context.set_variable("disk.r_eff", 4.0);
    context.set_variable("geom.inc", 60.0);

    let expr = Expression::parse("disk.r_eff / 5").unwrap();
    assert_eq!(expr.evaluate(&context).unwrap(), 0.8);

    let expr = Expression::parse("-disk.r_eff^2").unwrap();
    assert_eq!(expr.evaluate(&context).unwrap(), -16.0);

    let expr = Expression::parse("10 - 4 - 3").unwrap();
    assert_eq!(expr.evaluate(&context).unwrap(), 3.0);

    let expr = Expression::parse("cos(radians(geom.inc))").unwrap();
    assert!((expr.evaluate(&context).unwrap() - 0.5).abs() < 1e-12);

    let expr = Expression::parse("min(disk.r_eff, 2, 3)").unwrap();
    assert_eq!(expr.evaluate(&context).unwrap(), 2.0);

    let expr = Expression::parse("log10(1000) + sqrt(disk.r_eff)").unwrap();
    assert!((expr.evaluate(&context).unwrap() - 5.0).abs() < 1e-12);
}

#[test]
fn test_expression_evaluation_errors() {
    let mut context = SimpleContext::new();
    context.set_variable("x", 2.0);

    match Expression::parse("y").unwrap().evaluate(&context) {
        Err(ExpressionError::UndefinedVariable { name }) => assert_eq!(name, "y"),
        other => panic!("Expected UndefinedVariable error, got {:?}", other),
    }

    assert!(matches!(
        Expression::parse("x / 0").unwrap().evaluate(&context),
        Err(ExpressionError::DivisionByZero)
    ));

    match Expression::parse("unknown_func(x)").unwrap().evaluate(&context) {
        Err(ExpressionError::UndefinedFunction { name }) => assert_eq!(name, "unknown_func"),
        other => panic!("Expected UndefinedFunction error, got {:?}", other),
    }

    assert!(matches!(
        Expression::parse("sin(x, x)").unwrap().evaluate(&context),
        Err(ExpressionError::InvalidOperation { .. })
    ));
    assert!(matches!(
        Expression::parse("max(x)").unwrap().evaluate(&context),
        Err(ExpressionError::InvalidOperation { .. })
    ));
}

#[test]
fn test_simple_context() {
    let mut context = SimpleContext::new();
    context.set_variable("halo.fdm", 0.4);

    assert!(context.has_variable("halo.fdm"));
    assert!(!context.has_variable("halo.conc"));
    assert_eq!(context.get_variable("halo.fdm").unwrap(), 0.4);
    assert!(context.get_variable("halo.conc").is_err());
}
