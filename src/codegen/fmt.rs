//! Source formatter. The output parses back to a structurally equal
//! tree, which is what makes it usable for diagnostics dumps.

use crate::ast::*;

const INDENT: &str = "  ";

pub fn format(program: &Program) -> String {
    let mut parts = Vec::with_capacity(program.functions.len());
    for func in &program.functions {
        let mut out = String::new();
        fmt_function(&mut out, func);
        parts.push(out);
    }
    parts.join("\n")
}

fn fmt_function(out: &mut String, func: &Function) {
    out.push_str("func ");
    out.push_str(&func.name);
    out.push('(');
    for (i, param) in func.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str("int ");
        out.push_str(param);
    }
    out.push_str(") {\n");
    for stmt in &func.body {
        fmt_stmt(out, stmt, 1);
    }
    out.push_str("}\n");
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn fmt_block(out: &mut String, stmts: &[Stmt], depth: usize) {
    out.push_str("{\n");
    for stmt in stmts {
        fmt_stmt(out, stmt, depth + 1);
    }
    push_indent(out, depth);
    out.push('}');
}

fn fmt_stmt(out: &mut String, stmt: &Stmt, depth: usize) {
    push_indent(out, depth);
    match stmt {
        Stmt::Declare { name } => {
            out.push_str("int ");
            out.push_str(name);
            out.push(';');
        }

        Stmt::Assign { name, value } => {
            out.push_str(name);
            out.push_str(" = ");
            fmt_expr(out, value, 0);
            out.push(';');
        }

        Stmt::If { condition, then_block, else_block } => {
            out.push_str("if (");
            fmt_expr(out, condition, 0);
            out.push_str(") ");
            fmt_block(out, then_block, depth);
            if let Some(else_block) = else_block {
                out.push_str(" else ");
                fmt_block(out, else_block, depth);
            }
        }

        Stmt::While { condition, body } => {
            out.push_str("while (");
            fmt_expr(out, condition, 0);
            out.push_str(") ");
            fmt_block(out, body, depth);
        }

        Stmt::Call { name, args } => {
            fmt_call(out, name, args);
            out.push(';');
        }

        Stmt::Return(expr) => {
            out.push_str("return ");
            fmt_expr(out, expr, 0);
            out.push(';');
        }
    }
    out.push('\n');
}

/// Binding strength: comparison < additive < multiplicative.
fn precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => 1,
        BinOp::Add | BinOp::Sub => 2,
        BinOp::Mul | BinOp::Div | BinOp::Mod => 3,
    }
}

fn fmt_expr(out: &mut String, expr: &Expr, min_prec: u8) {
    match expr {
        Expr::Int(value) => out.push_str(&value.to_string()),

        Expr::Var(name) => out.push_str(name),

        Expr::Binary { op, left, right } => {
            let prec = precedence(*op);
            let parens = prec < min_prec;
            if parens {
                out.push('(');
            }
            // Operators are left-associative; comparisons do not chain,
            // so both comparison operands are forced to bind tighter.
            let left_min = if prec == 1 { prec + 1 } else { prec };
            fmt_expr(out, left, left_min);
            out.push(' ');
            out.push_str(op.symbol());
            out.push(' ');
            fmt_expr(out, right, prec + 1);
            if parens {
                out.push(')');
            }
        }

        Expr::Call { name, args } => fmt_call(out, name, args),
    }
}

fn fmt_call(out: &mut String, name: &str, args: &[Expr]) {
    out.push_str(name);
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        fmt_expr(out, arg, 0);
    }
    out.push(')');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    fn expr_str(expr: &Expr) -> String {
        let mut out = String::new();
        fmt_expr(&mut out, expr, 0);
        out
    }

    #[test]
    fn flat_additive_chain_has_no_parens() {
        let e = binary(
            BinOp::Add,
            binary(BinOp::Add, Expr::Var("a".into()), Expr::Var("b".into())),
            Expr::Var("c".into()),
        );
        assert_eq!(expr_str(&e), "a + b + c");
    }

    #[test]
    fn lower_precedence_child_is_parenthesized() {
        let e = binary(
            BinOp::Mul,
            binary(BinOp::Add, Expr::Var("a".into()), Expr::Var("b".into())),
            Expr::Var("c".into()),
        );
        assert_eq!(expr_str(&e), "(a + b) * c");
    }

    #[test]
    fn right_child_of_sub_keeps_parens() {
        let e = binary(
            BinOp::Sub,
            Expr::Var("a".into()),
            binary(BinOp::Sub, Expr::Var("b".into()), Expr::Var("c".into())),
        );
        assert_eq!(expr_str(&e), "a - (b - c)");
    }

    #[test]
    fn nested_comparison_is_parenthesized() {
        let e = binary(
            BinOp::Eq,
            binary(BinOp::Lt, Expr::Var("a".into()), Expr::Var("b".into())),
            Expr::Int(1),
        );
        assert_eq!(expr_str(&e), "(a < b) == 1");
    }

    #[test]
    fn function_renders_params_and_body() {
        let func = Function {
            name: "max".to_string(),
            params: vec!["a".to_string(), "b".to_string()],
            body: vec![Stmt::If {
                condition: binary(BinOp::Gt, Expr::Var("a".into()), Expr::Var("b".into())),
                then_block: vec![Stmt::Return(Expr::Var("a".into()))],
                else_block: Some(vec![Stmt::Return(Expr::Var("b".into()))]),
            }],
            span: Span::UNKNOWN,
        };
        let prog = Program { functions: vec![func], source: None };
        let expected = "\
func max(int a, int b) {
  if (a > b) {
    return a;
  } else {
    return b;
  }
}
";
        assert_eq!(format(&prog), expected);
    }

    #[test]
    fn while_and_call_statements() {
        let func = Function {
            name: "spin".to_string(),
            params: vec!["n".to_string()],
            body: vec![
                Stmt::While {
                    condition: binary(BinOp::Gt, Expr::Var("n".into()), Expr::Int(0)),
                    body: vec![Stmt::Assign {
                        name: "n".to_string(),
                        value: binary(BinOp::Sub, Expr::Var("n".into()), Expr::Int(1)),
                    }],
                },
                Stmt::Call { name: "tick".to_string(), args: vec![Expr::Var("n".into())] },
            ],
            span: Span::UNKNOWN,
        };
        let prog = Program { functions: vec![func], source: None };
        let expected = "\
func spin(int n) {
  while (n > 0) {
    n = n - 1;
  }
  tick(n);
}
";
        assert_eq!(format(&prog), expected);
    }
}
