//! Pattern reinterpretation and bound-name collection.
//!
//! Destructuring targets and arrow parameters are first parsed as ordinary
//! expressions (array/object literals, assignments, spreads).  Once the
//! parser sees the `=` or `=>` that makes them patterns, [`reinterpret`]
//! rebuilds the subtree as a [`Pat`].  The expression nodes are consumed; no
//! node is mutated in place.

use crate::error::{QuillError, QuillResult};
use crate::parser::ast::{
    ArrayPat, AssignOp, AssignPat, AssignTarget, AssignmentProp, Expr, Ident, ObjectPat,
    ObjectPatProp, ObjectProp, Pat, RestElement,
};
use crate::parser::scanner::Position;

/// Where a pattern is being formed; selects the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternContext {
    /// Left-hand side of a destructuring `=`.
    Assignment,
    /// Arrow function parameter list.
    Parameter,
}

impl PatternContext {
    fn invalid_target(self) -> &'static str {
        match self {
            PatternContext::Assignment => "Invalid destructuring assignment target",
            PatternContext::Parameter => "Invalid parameter",
        }
    }
}

fn invalid(expr: &Expr, ctx: PatternContext) -> QuillError {
    QuillError::syntax(ctx.invalid_target(), expr.loc().start)
}

/// Rebuild `expr` as a pattern.
///
/// Identifiers stay identifiers, array and object literals become array and
/// object patterns, `target = default` becomes an assignment pattern and a
/// trailing spread becomes a rest element.  Anything else is rejected.
pub fn reinterpret(expr: Expr, ctx: PatternContext) -> QuillResult<Pat> {
    match expr {
        Expr::Ident(id) => Ok(Pat::Ident(id)),
        Expr::Array(array) => {
            let count = array.elements.len();
            let mut elements = Vec::with_capacity(count);
            for (i, element) in array.elements.into_iter().enumerate() {
                let element = match element {
                    None => None,
                    Some(Expr::Spread(spread)) => {
                        if i + 1 != count {
                            return Err(QuillError::syntax(
                                "Rest element must be last element",
                                spread.loc.start,
                            ));
                        }
                        Some(rest_element(spread.loc, *spread.argument, ctx)?)
                    }
                    Some(other) => Some(reinterpret(other, ctx)?),
                };
                elements.push(element);
            }
            Ok(Pat::Array(Box::new(ArrayPat {
                loc: array.loc,
                elements,
            })))
        }
        Expr::Object(object) => {
            let count = object.properties.len();
            let mut properties = Vec::with_capacity(count);
            for (i, prop) in object.properties.into_iter().enumerate() {
                match prop {
                    ObjectProp::Spread(spread) => {
                        if i + 1 != count {
                            return Err(QuillError::syntax(
                                "Rest element must be last element",
                                spread.loc.start,
                            ));
                        }
                        let Expr::Ident(id) = *spread.argument else {
                            return Err(invalid(&spread.argument, ctx));
                        };
                        properties.push(ObjectPatProp::Rest(RestElement {
                            loc: spread.loc,
                            argument: Box::new(Pat::Ident(id)),
                        }));
                    }
                    ObjectProp::Prop(prop) => {
                        let prop = *prop;
                        properties.push(ObjectPatProp::Prop(AssignmentProp {
                            loc: prop.loc,
                            key: prop.key,
                            value: reinterpret(prop.value, ctx)?,
                            shorthand: prop.shorthand,
                        }));
                    }
                }
            }
            Ok(Pat::Object(Box::new(ObjectPat {
                loc: object.loc,
                properties,
            })))
        }
        Expr::Assign(assign) if assign.op == AssignOp::Assign => {
            let assign = *assign;
            let left = match assign.left {
                AssignTarget::Pat(pat) => pat,
                AssignTarget::Expr(target) => reinterpret(*target, ctx)?,
            };
            Ok(Pat::Assign(Box::new(AssignPat {
                loc: assign.loc,
                left: Box::new(left),
                right: assign.right,
            })))
        }
        other => Err(invalid(&other, ctx)),
    }
}

fn rest_element(
    loc: crate::parser::ast::SourceLocation,
    argument: Expr,
    ctx: PatternContext,
) -> QuillResult<Pat> {
    let argument = match argument {
        // `...x = 1` has no meaning.
        Expr::Assign(a) => return Err(QuillError::syntax(ctx.invalid_target(), a.loc.start)),
        other => reinterpret(other, ctx)?,
    };
    Ok(Pat::Rest(Box::new(RestElement {
        loc,
        argument: Box::new(argument),
    })))
}

/// Rejects a rest element written with a trailing comma (`[...a,] = b`).
///
/// `commas` holds `(spread start, comma)` for each array-literal spread the
/// parser saw followed by a trailing comma; a rest element starting at one of
/// those spreads is an error at the comma.
pub fn check_rest_trailing_commas(pat: &Pat, commas: &[(Position, Position)]) -> QuillResult<()> {
    if commas.is_empty() {
        return Ok(());
    }
    match pat {
        Pat::Ident(_) => Ok(()),
        Pat::Assign(assign) => check_rest_trailing_commas(&assign.left, commas),
        Pat::Rest(rest) => {
            if let Some((_, comma)) = commas.iter().find(|(start, _)| *start == rest.loc.start) {
                return Err(QuillError::syntax("Rest element must be last element", *comma));
            }
            check_rest_trailing_commas(&rest.argument, commas)
        }
        Pat::Array(array) => array
            .elements
            .iter()
            .flatten()
            .try_for_each(|element| check_rest_trailing_commas(element, commas)),
        Pat::Object(object) => object.properties.iter().try_for_each(|prop| match prop {
            ObjectPatProp::Prop(p) => check_rest_trailing_commas(&p.value, commas),
            ObjectPatProp::Rest(rest) => check_rest_trailing_commas(&rest.argument, commas),
        }),
    }
}

/// Rebuild an arrow parameter list.  A spread item becomes a rest parameter
/// and must come last.
pub fn reinterpret_params(items: Vec<Expr>) -> QuillResult<Vec<Pat>> {
    let count = items.len();
    let mut params = Vec::with_capacity(count);
    for (i, item) in items.into_iter().enumerate() {
        let param = match item {
            Expr::Spread(spread) => {
                if i + 1 != count {
                    return Err(QuillError::syntax(
                        "Rest parameter must be last formal parameter",
                        spread.loc.start,
                    ));
                }
                rest_element(spread.loc, *spread.argument, PatternContext::Parameter)?
            }
            other => reinterpret(other, PatternContext::Parameter)?,
        };
        params.push(param);
    }
    check_duplicate_params(&params)?;
    Ok(params)
}

/// Append every identifier bound by `pat` to `out`, in source order.
pub fn bound_names<'a>(pat: &'a Pat, out: &mut Vec<&'a Ident>) {
    match pat {
        Pat::Ident(id) => out.push(id),
        Pat::Array(array) => {
            for element in array.elements.iter().flatten() {
                bound_names(element, out);
            }
        }
        Pat::Object(object) => {
            for prop in &object.properties {
                match prop {
                    ObjectPatProp::Prop(p) => bound_names(&p.value, out),
                    ObjectPatProp::Rest(r) => bound_names(&r.argument, out),
                }
            }
        }
        Pat::Rest(rest) => bound_names(&rest.argument, out),
        Pat::Assign(assign) => bound_names(&assign.left, out),
    }
}

/// Reject parameter lists that bind the same name twice.  The error points at
/// the second occurrence.
pub fn check_duplicate_params(params: &[Pat]) -> QuillResult<()> {
    let mut names = Vec::new();
    for param in params {
        bound_names(param, &mut names);
    }
    for (i, name) in names.iter().enumerate() {
        if names[..i].iter().any(|earlier| earlier.name == name.name) {
            return Err(QuillError::syntax(
                "Duplicate parameter name not allowed in this context",
                name.loc.start,
            ));
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
