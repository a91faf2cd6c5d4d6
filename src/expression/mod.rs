//! Size expressions: `expr(width * 0.5)`-style arithmetic over the viewport.

pub(crate) mod ast;
pub(crate) mod error;
pub(crate) mod lexer;
pub(crate) mod parser;

use std::fmt;

use crate::expression::ast::{BinaryOp, Expr, Func, Var};
use crate::foundation::error::{PrismError, PrismResult};

/// A parsed size expression.
///
/// Variables: `width`, `height` (the viewport size, pre-multiplied by the output's scale) and
/// `dpr`. Operators: `+ - * / %`, unary minus, parentheses. Functions: `min`, `max`, `floor`,
/// `ceil`, `round`, `abs`.
#[derive(Clone, PartialEq)]
pub struct SizeExpr {
    src: String,
    expr: Expr,
}

impl SizeExpr {
    /// Parse `src`, with or without the `expr(...)` wrapper.
    pub fn parse(src: &str) -> PrismResult<Self> {
        let expr = parser::parse_expr(src)?;
        Ok(Self {
            src: src.trim().to_owned(),
            expr,
        })
    }

    /// Source text as given to [`SizeExpr::parse`] (trimmed).
    pub fn source(&self) -> &str {
        &self.src
    }

    /// Evaluate with the given variable bindings.
    pub fn eval(&self, width: f64, height: f64, dpr: f64) -> PrismResult<f64> {
        let env = Env { width, height, dpr };
        let v = eval(&self.expr, &env);
        if v.is_finite() {
            Ok(v)
        } else {
            Err(PrismError::expression(format!(
                "'{}' evaluated to a non-finite value",
                self.src
            )))
        }
    }
}

impl fmt::Debug for SizeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SizeExpr").field(&self.src).finish()
    }
}

struct Env {
    width: f64,
    height: f64,
    dpr: f64,
}

fn eval(e: &Expr, env: &Env) -> f64 {
    match e {
        Expr::Num(v) => *v,
        Expr::Var(Var::Width) => env.width,
        Expr::Var(Var::Height) => env.height,
        Expr::Var(Var::Dpr) => env.dpr,
        Expr::Neg(inner) => -eval(inner, env),
        Expr::Binary { op, left, right } => {
            let l = eval(left, env);
            let r = eval(right, env);
            match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                BinaryOp::Div => l / r,
                BinaryOp::Mod => l % r,
            }
        }
        Expr::Call { func, args } => {
            let mut vals = args.iter().map(|a| eval(a, env));
            match func {
                Func::Min => vals.fold(f64::INFINITY, f64::min),
                Func::Max => vals.fold(f64::NEG_INFINITY, f64::max),
                Func::Floor => vals.next().map_or(f64::NAN, f64::floor),
                Func::Ceil => vals.next().map_or(f64::NAN, f64::ceil),
                Func::Round => vals.next().map_or(f64::NAN, f64::round),
                Func::Abs => vals.next().map_or(f64::NAN, f64::abs),
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/size_expr.rs"]
mod tests;
