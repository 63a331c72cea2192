use std::cmp::Ordering;

use crate::data::table::{Cell, DataTable};
use crate::expression::ast::{BinaryOp, Expr, Func, Lit, UnaryOp};
use crate::foundation::error::{VizError, VizResult};

/// Evaluate `expr` against every row of `table`, producing a keep-mask.
///
/// `NA` results drop the row. `text` is the source expression, quoted in binding errors.
pub(crate) fn eval_mask(expr: &Expr, table: &DataTable, text: &str) -> VizResult<Vec<bool>> {
    for col in expr.columns() {
        if table.column_index(col).is_none() {
            return Err(VizError::data_binding(
                text,
                format!("unknown column '{col}'"),
            ));
        }
    }

    let ctx = EvalCtx { table, text };
    table
        .rows()
        .iter()
        .map(|row| match ctx.eval(expr, row)? {
            Cell::Bool(keep) => Ok(keep),
            Cell::Null => Ok(false),
            other => Err(VizError::data_binding(
                text,
                format!("filter must evaluate to a logical value, got '{other}'"),
            )),
        })
        .collect()
}

struct EvalCtx<'a> {
    table: &'a DataTable,
    text: &'a str,
}

impl EvalCtx<'_> {
    fn err(&self, message: impl Into<String>) -> VizError {
        VizError::data_binding(self.text, message)
    }

    fn eval(&self, expr: &Expr, row: &[Cell]) -> VizResult<Cell> {
        match expr {
            Expr::Lit(lit) => Ok(match lit {
                Lit::F64(v) => Cell::Number(*v),
                Lit::Bool(b) => Cell::Bool(*b),
                Lit::Str(s) => Cell::Text(s.clone()),
                Lit::Na => Cell::Null,
            }),
            Expr::Column(name) => {
                let idx = self
                    .table
                    .column_index(name)
                    .ok_or_else(|| self.err(format!("unknown column '{name}'")))?;
                Ok(row[idx].clone())
            }
            Expr::Unary { op, expr } => {
                let v = self.eval(expr, row)?;
                match (op, v) {
                    (_, Cell::Null) => Ok(Cell::Null),
                    (UnaryOp::Neg, Cell::Number(n)) => Ok(Cell::Number(-n)),
                    (UnaryOp::Not, Cell::Bool(b)) => Ok(Cell::Bool(!b)),
                    (UnaryOp::Neg, other) => Err(self.err(format!("cannot negate '{other}'"))),
                    (UnaryOp::Not, other) => {
                        Err(self.err(format!("'!' needs a logical value, got '{other}'")))
                    }
                }
            }
            Expr::Binary { op, left, right } => match op {
                BinaryOp::And | BinaryOp::Or => self.eval_logical(*op, left, right, row),
                _ => {
                    let l = self.eval(left, row)?;
                    let r = self.eval(right, row)?;
                    self.eval_binary(*op, l, r)
                }
            },
            Expr::Call { func, args } => match func {
                Func::IsNa => Ok(Cell::Bool(self.eval(&args[0], row)?.is_null())),
                Func::In => {
                    let needle = self.eval(&args[0], row)?;
                    for cand in &args[1..] {
                        if cells_equal(&needle, &self.eval(cand, row)?) {
                            return Ok(Cell::Bool(true));
                        }
                    }
                    Ok(Cell::Bool(false))
                }
            },
        }
    }

    /// Kleene three-valued `&&` / `||`.
    fn eval_logical(&self, op: BinaryOp, left: &Expr, right: &Expr, row: &[Cell]) -> VizResult<Cell> {
        let l = self.as_logical(self.eval(left, row)?)?;
        match (op, l) {
            (BinaryOp::And, Some(false)) => return Ok(Cell::Bool(false)),
            (BinaryOp::Or, Some(true)) => return Ok(Cell::Bool(true)),
            _ => {}
        }
        let r = self.as_logical(self.eval(right, row)?)?;
        let out = match (op, l, r) {
            (BinaryOp::And, _, Some(false)) => Some(false),
            (BinaryOp::And, Some(true), Some(true)) => Some(true),
            (BinaryOp::Or, _, Some(true)) => Some(true),
            (BinaryOp::Or, Some(false), Some(false)) => Some(false),
            _ => None,
        };
        Ok(out.map_or(Cell::Null, Cell::Bool))
    }

    fn as_logical(&self, v: Cell) -> VizResult<Option<bool>> {
        match v {
            Cell::Bool(b) => Ok(Some(b)),
            Cell::Null => Ok(None),
            other => Err(self.err(format!("expected a logical value, got '{other}'"))),
        }
    }

    fn eval_binary(&self, op: BinaryOp, l: Cell, r: Cell) -> VizResult<Cell> {
        if l.is_null() || r.is_null() {
            return Ok(Cell::Null);
        }
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                let (Cell::Number(a), Cell::Number(b)) = (&l, &r) else {
                    return Err(self.err(format!("arithmetic needs numbers, got '{l}' and '{r}'")));
                };
                let v = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    _ => a % b,
                };
                Ok(Cell::Number(v))
            }
            BinaryOp::Eq => Ok(Cell::Bool(cells_equal(&l, &r))),
            BinaryOp::Ne => Ok(Cell::Bool(!cells_equal(&l, &r))),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ord = compare(&l, &r)
                    .ok_or_else(|| self.err(format!("cannot order '{l}' against '{r}'")))?;
                let keep = match op {
                    BinaryOp::Lt => ord == Ordering::Less,
                    BinaryOp::Le => ord != Ordering::Greater,
                    BinaryOp::Gt => ord == Ordering::Greater,
                    _ => ord != Ordering::Less,
                };
                Ok(Cell::Bool(keep))
            }
            BinaryOp::And | BinaryOp::Or => unreachable!("logical ops are short-circuited"),
        }
    }
}

fn cells_equal(a: &Cell, b: &Cell) -> bool {
    match (a, b) {
        (Cell::Number(x), Cell::Number(y)) => x == y,
        (Cell::Text(x), Cell::Text(y)) => x == y,
        (Cell::Bool(x), Cell::Bool(y)) => x == y,
        _ => false,
    }
}

fn compare(a: &Cell, b: &Cell) -> Option<Ordering> {
    match (a, b) {
        (Cell::Number(x), Cell::Number(y)) => x.partial_cmp(y),
        (Cell::Text(x), Cell::Text(y)) => Some(x.cmp(y)),
        (Cell::Bool(x), Cell::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/eval.rs"]
mod tests;
