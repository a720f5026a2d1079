//! Tree-walking evaluation of resolved predicates
//!
//! Values flow through as `Cow` so that field reads on the item and
//! literal reads borrow instead of cloning.

use crate::error::{FilterError, Result};
use scopeq_expr::{BinaryOperator, Expr, Parameter, UnaryOperator};
use scopeq_shared::constants::{STACK_GROW_SIZE, STACK_RED_ZONE};
use scopeq_shared::ops::{add_values, compare_values, div_values, mul_values, negate_value, sub_values};
use scopeq_shared::Value;
use std::borrow::Cow;
use std::cmp::Ordering;

/// Parameter bindings visible to the node being evaluated
struct Env<'a> {
    name: &'a str,
    value: &'a Value,
    parent: Option<&'a Env<'a>>,
}

impl<'a> Env<'a> {
    fn get(&self, name: &str) -> Option<&'a Value> {
        let mut env = Some(self);
        while let Some(frame) = env {
            if frame.name == name {
                return Some(frame.value);
            }
            env = frame.parent;
        }
        None
    }
}

/// Nesting level of the node being evaluated
#[derive(Debug, Clone, Copy)]
struct Depth {
    level: usize,
    limit: usize,
}

impl Depth {
    fn root(limit: usize) -> Self {
        Self { level: 0, limit }
    }

    fn enter(self) -> Result<Self> {
        let level = self.level + 1;
        if level > self.limit {
            return Err(FilterError::DepthExceeded { limit: self.limit });
        }
        Ok(Self { level, ..self })
    }
}

/// Evaluate `body` with `item` bound to `item_parameter`; the result must be boolean
pub(crate) fn evaluate_predicate(
    item_parameter: &Parameter,
    body: &Expr,
    item: &Value,
    max_depth: usize,
) -> Result<bool> {
    let env = Env {
        name: &item_parameter.name,
        value: item,
        parent: None,
    };
    match eval(body, &env, Depth::root(max_depth))?.as_ref() {
        Value::Bool(b) => Ok(*b),
        other => Err(FilterError::Evaluation(format!(
            "predicate produced {}, expected boolean",
            other.type_name()
        ))),
    }
}

fn eval<'a>(expr: &'a Expr, env: &Env<'a>, depth: Depth) -> Result<Cow<'a, Value>> {
    let depth = depth.enter()?;
    stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || eval_node(expr, env, depth))
}

fn eval_node<'a>(expr: &'a Expr, env: &Env<'a>, depth: Depth) -> Result<Cow<'a, Value>> {
    match expr {
        Expr::Literal { value, .. } => Ok(Cow::Borrowed(value)),
        Expr::Parameter(parameter) => env
            .get(&parameter.name)
            .map(Cow::Borrowed)
            .ok_or_else(|| FilterError::UnresolvedBinding {
                name: parameter.name.clone(),
            }),
        Expr::Lookup(location) => Err(FilterError::MalformedTree(format!(
            "unresolved lookup of '{}' reached evaluation",
            location.name
        ))),
        Expr::Lambda { .. } => Err(FilterError::Evaluation(
            "a lambda is only valid as an argument to Any or All".to_string(),
        )),
        Expr::FieldAccess { base, field } => field_of(eval(base, env, depth)?, field),
        Expr::Index { base, index } => {
            let base = eval(base, env, depth)?;
            let index = eval(index, env, depth)?;
            match index.as_ref() {
                Value::Int(i) => Ok(Cow::Owned(base.index(*i)?)),
                Value::String(key) if matches!(*base, Value::Object(_) | Value::Null) => {
                    field_of(base, key)
                }
                other => Err(FilterError::Evaluation(format!(
                    "Cannot index {} with {}",
                    base.type_name(),
                    other.type_name()
                ))),
            }
        }
        Expr::BinaryOp { left, op, right } => eval_binary(left, *op, right, env, depth),
        Expr::UnaryOp { op, expr } => {
            let operand = eval(expr, env, depth)?;
            match op {
                UnaryOperator::Not => Ok(Cow::Owned(Value::Bool(!expect_bool(
                    operand.as_ref(),
                    "not",
                )?))),
                UnaryOperator::Neg => Ok(Cow::Owned(negate_value(operand.as_ref())?)),
            }
        }
        Expr::If {
            condition,
            then_branch,
            else_branch,
        } => {
            if expect_bool(eval(condition, env, depth)?.as_ref(), "if")? {
                eval(then_branch, env, depth)
            } else {
                eval(else_branch, env, depth)
            }
        }
        Expr::MethodCall {
            target,
            method,
            args,
        } => eval_method(eval(target, env, depth)?, method, args, env, depth),
    }
}

fn field_of<'a>(base: Cow<'a, Value>, field: &str) -> Result<Cow<'a, Value>> {
    match base {
        Cow::Borrowed(Value::Object(map)) => Ok(map
            .get(field)
            .map_or(Cow::Owned(Value::Null), Cow::Borrowed)),
        other => Ok(Cow::Owned(other.field(field)?)),
    }
}

fn expect_bool(value: &Value, context: &str) -> Result<bool> {
    value.as_bool().ok_or_else(|| {
        FilterError::Evaluation(format!(
            "'{}' expects a boolean operand, got {}",
            context,
            value.type_name()
        ))
    })
}

fn eval_binary<'a>(
    left: &'a Expr,
    op: BinaryOperator,
    right: &'a Expr,
    env: &Env<'a>,
    depth: Depth,
) -> Result<Cow<'a, Value>> {
    let operands = || -> Result<(Cow<'a, Value>, Cow<'a, Value>)> {
        Ok((eval(left, env, depth)?, eval(right, env, depth)?))
    };
    let ordering = || -> Result<Ordering> {
        let (l, r) = operands()?;
        Ok(compare_values(l.as_ref(), r.as_ref())?)
    };

    let value = match op {
        // Short-circuit before touching the right operand
        BinaryOperator::And => Value::Bool(
            expect_bool(eval(left, env, depth)?.as_ref(), "and")?
                && expect_bool(eval(right, env, depth)?.as_ref(), "and")?,
        ),
        BinaryOperator::Or => Value::Bool(
            expect_bool(eval(left, env, depth)?.as_ref(), "or")?
                || expect_bool(eval(right, env, depth)?.as_ref(), "or")?,
        ),
        BinaryOperator::Eq => {
            let (l, r) = operands()?;
            Value::Bool(*l == *r)
        }
        BinaryOperator::Ne => {
            let (l, r) = operands()?;
            Value::Bool(*l != *r)
        }
        BinaryOperator::Lt => Value::Bool(ordering()? == Ordering::Less),
        BinaryOperator::Le => Value::Bool(ordering()? != Ordering::Greater),
        BinaryOperator::Gt => Value::Bool(ordering()? == Ordering::Greater),
        BinaryOperator::Ge => Value::Bool(ordering()? != Ordering::Less),
        BinaryOperator::Add => {
            let (l, r) = operands()?;
            add_values(l.as_ref(), r.as_ref())?
        }
        BinaryOperator::Sub => {
            let (l, r) = operands()?;
            sub_values(l.as_ref(), r.as_ref())?
        }
        BinaryOperator::Mul => {
            let (l, r) = operands()?;
            mul_values(l.as_ref(), r.as_ref())?
        }
        BinaryOperator::Div => {
            let (l, r) = operands()?;
            div_values(l.as_ref(), r.as_ref())?
        }
    };
    Ok(Cow::Owned(value))
}

fn eval_method<'a>(
    target: Cow<'a, Value>,
    method: &str,
    args: &'a [Expr],
    env: &Env<'a>,
    depth: Depth,
) -> Result<Cow<'a, Value>> {
    let value = match target.as_ref() {
        Value::String(s) => string_method(s, method, args, env, depth)?,
        Value::Array(items) => array_method(items, method, args, env, depth)?,
        Value::Null => {
            return Err(FilterError::Evaluation(format!(
                "Cannot call {} on null",
                method
            )))
        }
        other => return Err(unknown_method(other, method)),
    };
    Ok(Cow::Owned(value))
}

fn string_method<'a>(
    s: &str,
    method: &str,
    args: &'a [Expr],
    env: &Env<'a>,
    depth: Depth,
) -> Result<Value> {
    let arg = |arg: &'a Expr| string_arg(method, arg, env, depth);
    let value = match (method, args) {
        ("StartsWith", [a]) => Value::Bool(s.starts_with(arg(a)?.as_str())),
        ("EndsWith", [a]) => Value::Bool(s.ends_with(arg(a)?.as_str())),
        ("Contains", [a]) => Value::Bool(s.contains(arg(a)?.as_str())),
        ("ToUpper", []) => Value::String(s.to_uppercase()),
        ("ToLower", []) => Value::String(s.to_lowercase()),
        ("Trim", []) => Value::String(s.trim().to_string()),
        #[allow(clippy::cast_possible_wrap)]
        ("Length", []) => Value::Int(s.chars().count() as i64),
        _ => return Err(unknown_method(&Value::string(s), method)),
    };
    Ok(value)
}

fn string_arg<'a>(method: &str, arg: &'a Expr, env: &Env<'a>, depth: Depth) -> Result<String> {
    match eval(arg, env, depth)?.as_ref() {
        Value::String(s) => Ok(s.clone()),
        other => Err(FilterError::Evaluation(format!(
            "{} expects a string argument, got {}",
            method,
            other.type_name()
        ))),
    }
}

fn array_method<'a>(
    items: &[Value],
    method: &str,
    args: &'a [Expr],
    env: &Env<'a>,
    depth: Depth,
) -> Result<Value> {
    let value = match (method, args) {
        ("Contains", [arg]) => {
            let needle = eval(arg, env, depth)?;
            Value::Bool(items.iter().any(|item| *item == *needle))
        }
        #[allow(clippy::cast_possible_wrap)]
        ("Count", []) => Value::Int(items.len() as i64),
        ("Any", []) => Value::Bool(!items.is_empty()),
        ("Any", [Expr::Lambda { parameter, body }]) => {
            let mut found = false;
            for item in items {
                if element_matches(parameter, body, item, env, depth)? {
                    found = true;
                    break;
                }
            }
            Value::Bool(found)
        }
        ("All", [Expr::Lambda { parameter, body }]) => {
            let mut all = true;
            for item in items {
                if !element_matches(parameter, body, item, env, depth)? {
                    all = false;
                    break;
                }
            }
            Value::Bool(all)
        }
        _ => return Err(unknown_method(&Value::Array(Vec::new()), method)),
    };
    Ok(value)
}

fn element_matches(
    parameter: &Parameter,
    body: &Expr,
    element: &Value,
    env: &Env<'_>,
    depth: Depth,
) -> Result<bool> {
    let frame = Env {
        name: &parameter.name,
        value: element,
        parent: Some(env),
    };
    expect_bool(eval(body, &frame, depth)?.as_ref(), "lambda")
}

fn unknown_method(target: &Value, method: &str) -> FilterError {
    FilterError::Evaluation(format!(
        "Unknown method '{}' on {}",
        method,
        target.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopeq_shared::constants::MAX_RECURSION_DEPTH;
    use scopeq_shared::ValueType;

    fn item() -> Parameter {
        Parameter::new("item", ValueType::Object)
    }

    fn person(first: &str, last: &str, age: i64, tags: &[&str]) -> Value {
        Value::record([
            ("FirstName", Value::string(first)),
            ("LastName", Value::string(last)),
            ("Age", Value::int(age)),
            (
                "Tags",
                Value::array(tags.iter().map(|t| Value::string(*t)).collect()),
            ),
        ])
    }

    fn check(body: Expr, value: &Value) -> Result<bool> {
        evaluate_predicate(&item(), &body, value, MAX_RECURSION_DEPTH)
    }

    fn field(name: &str) -> Expr {
        Expr::param(&item()).field(name)
    }

    #[test]
    fn test_equality_and_comparison() {
        let peter = person("Peter", "Goodman", 42, &[]);
        assert!(check(
            Expr::binary(field("FirstName"), BinaryOperator::Eq, Expr::literal("Peter")),
            &peter
        )
        .unwrap());
        assert!(check(
            Expr::binary(field("Age"), BinaryOperator::Ge, Expr::literal(42.0)),
            &peter
        )
        .unwrap());
        assert!(!check(
            Expr::binary(field("Age"), BinaryOperator::Lt, Expr::literal(18_i64)),
            &peter
        )
        .unwrap());
    }

    #[test]
    fn test_missing_field_reads_as_null() {
        let peter = person("Peter", "Goodman", 42, &[]);
        assert!(check(
            Expr::binary(field("MiddleName"), BinaryOperator::Eq, Expr::literal(Value::Null)),
            &peter
        )
        .unwrap());
    }

    #[test]
    fn test_short_circuit() {
        let peter = person("Peter", "Goodman", 42, &[]);
        // The right operand would fail: comparing a string with an integer
        let failing = Expr::binary(field("FirstName"), BinaryOperator::Gt, Expr::literal(1_i64));
        assert!(check(failing.clone(), &peter).is_err());
        assert!(!check(Expr::and(Expr::literal(false), failing.clone()), &peter).unwrap());
        assert!(check(Expr::or(Expr::literal(true), failing), &peter).unwrap());
    }

    #[test]
    fn test_arithmetic_and_if() {
        let peter = person("Peter", "Goodman", 42, &[]);
        let body = Expr::binary(
            Expr::if_then_else(
                Expr::binary(field("Age"), BinaryOperator::Gt, Expr::literal(40_i64)),
                Expr::binary(field("Age"), BinaryOperator::Sub, Expr::literal(40_i64)),
                Expr::literal(0_i64),
            ),
            BinaryOperator::Eq,
            Expr::literal(2_i64),
        );
        assert!(check(body, &peter).unwrap());
    }

    #[test]
    fn test_string_methods() {
        let peter = person("Peter", "Goodman", 42, &[]);
        let starts = field("FirstName").call("StartsWith", vec![Expr::literal("Pe")]);
        assert!(check(starts, &peter).unwrap());

        let upper = Expr::binary(
            field("LastName").call("ToUpper", vec![]),
            BinaryOperator::Eq,
            Expr::literal("GOODMAN"),
        );
        assert!(check(upper, &peter).unwrap());

        let length = Expr::binary(
            field("FirstName").call("Length", vec![]),
            BinaryOperator::Eq,
            Expr::literal(5_i64),
        );
        assert!(check(length, &peter).unwrap());
    }

    #[test]
    fn test_array_methods_with_lambda() {
        let tag = Parameter::new("t", ValueType::String);
        let peter = person("Peter", "Goodman", 42, &["admin", "staff"]);

        let any = field("Tags").call(
            "Any",
            vec![Expr::lambda(
                tag.clone(),
                Expr::binary(Expr::param(&tag), BinaryOperator::Eq, Expr::literal("admin")),
            )],
        );
        assert!(check(any, &peter).unwrap());

        let all = field("Tags").call(
            "All",
            vec![Expr::lambda(
                tag.clone(),
                Expr::param(&tag).call("EndsWith", vec![Expr::literal("f")]),
            )],
        );
        assert!(!check(all, &peter).unwrap());

        let contains = field("Tags").call("Contains", vec![Expr::literal("staff")]);
        assert!(check(contains, &peter).unwrap());
    }

    #[test]
    fn test_lambda_sees_item() {
        let tag = Parameter::new("t", ValueType::String);
        let peter = person("Peter", "Goodman", 42, &["Peter"]);
        let body = field("Tags").call(
            "Any",
            vec![Expr::lambda(
                tag.clone(),
                Expr::binary(Expr::param(&tag), BinaryOperator::Eq, field("FirstName")),
            )],
        );
        assert!(check(body, &peter).unwrap());
    }

    #[test]
    fn test_non_boolean_result() {
        let peter = person("Peter", "Goodman", 42, &[]);
        let err = check(field("FirstName"), &peter).unwrap_err();
        assert!(matches!(err, FilterError::Evaluation(_)));
    }

    #[test]
    fn test_unknown_method() {
        let peter = person("Peter", "Goodman", 42, &[]);
        let err = check(field("FirstName").call("Reverse", vec![]), &peter).unwrap_err();
        assert!(err.to_string().contains("Unknown method 'Reverse' on string"));
    }

    #[test]
    fn test_method_on_null() {
        let peter = person("Peter", "Goodman", 42, &[]);
        let err = check(
            field("Nickname").call("StartsWith", vec![Expr::literal("P")]),
            &peter,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Cannot call StartsWith on null"));
    }

    #[test]
    fn test_index() {
        let peter = person("Peter", "Goodman", 42, &["admin", "staff"]);
        let body = Expr::binary(
            field("Tags").index(Expr::literal(-1_i64)),
            BinaryOperator::Eq,
            Expr::literal("staff"),
        );
        assert!(check(body, &peter).unwrap());
    }

    #[test]
    fn test_depth_limit() {
        let peter = person("Peter", "Goodman", 42, &[]);
        let mut body = Expr::binary(field("Age"), BinaryOperator::Eq, Expr::literal(42_i64));
        // eq > field > param: three levels
        for _ in 0..7 {
            body = Expr::not(body);
        }

        assert!(!evaluate_predicate(&item(), &body, &peter, 10).unwrap());
        let err = evaluate_predicate(&item(), &body, &peter, 9).unwrap_err();
        assert!(matches!(err, FilterError::DepthExceeded { limit: 9 }));
    }

    #[test]
    fn test_depth_limit_inside_lambda() {
        let tag = Parameter::new("t", ValueType::String);
        let peter = person("Peter", "Goodman", 42, &["admin"]);
        let mut inner = Expr::binary(Expr::param(&tag), BinaryOperator::Eq, Expr::literal("admin"));
        for _ in 0..5 {
            inner = Expr::not(Expr::not(inner));
        }
        let body = field("Tags").call("Any", vec![Expr::lambda(tag, inner)]);

        assert!(evaluate_predicate(&item(), &body, &peter, 64).unwrap());
        assert!(matches!(
            evaluate_predicate(&item(), &body, &peter, 8),
            Err(FilterError::DepthExceeded { limit: 8 })
        ));
    }
}
