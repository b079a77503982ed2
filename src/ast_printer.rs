use crate::expr::Expr;
use crate::token::{Literal, TokenType};

/// Converts an expression to a parenthesized prefix form, mostly useful for
/// debugging the parser and asserting on tree shapes in tests.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(token) => match (token.token_type, &token.literal) {
                (TokenType::TRUE, _) => "true".into(),

                (TokenType::FALSE, _) => "false".into(),

                (TokenType::NIL, _) => "nil".into(),

                (_, Literal::Str(s)) => s.clone(),

                (_, Literal::Number(n)) => {
                    if n.fract() == 0.0 {
                        // 3.0 → 3.0 stays visibly a number
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }

                _ => token.lexeme.clone(),
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── unary operator ──────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            // ── binary / logical operators ──────────────────────────────
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            // ── named references ────────────────────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::This { .. } => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),

            // ── calls and properties ────────────────────────────────────
            Expr::Call {
                callee, arguments, ..
            } => {
                let mut out: String = format!("(call {}", Self::print(callee));

                for argument in arguments {
                    out.push(' ');
                    out.push_str(&Self::print(argument));
                }

                out.push(')');
                out
            }

            Expr::Get { object, name } => {
                format!("(get {} {})", Self::print(object), name.lexeme)
            }

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(set {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),
        }
    }
}
