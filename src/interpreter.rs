//! Pascal-- tree-walking interpreter — block list + Environment -> execution.
//!
//! Skips the header block, then runs every remaining block in order against a
//! fresh `Environment`. Expressions are evaluated on demand from the raw token
//! runs stored in the nodes. `Read` consumes one line of `input` per
//! identifier; `Write` emits one line on `output` per statement.

use std::io::{BufRead, Write};
use std::num::IntErrorKind;

use tracing::debug;

use crate::ast::{DeclaredType, IdentifierList, Node, NodeKind, Program};
use crate::env::Environment;
use crate::error::{Diagnostic, PascalResult, SourceLoc};
use crate::expr::{evaluate_either, evaluate_numeric, evaluate_string, Operand};
use crate::lexer::{Token, TokenKind};
use crate::value::{format_number, Value};

pub struct Interpreter<'a, R, W> {
    program: &'a Program,
    env: Environment,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Interpreter<'a, R, W> {
    pub fn new(program: &'a Program, input: R, output: W) -> Self {
        Self {
            program,
            env: Environment::new(),
            input,
            output,
        }
    }

    /// Execute the program from a clean environment.
    pub fn run(&mut self) -> PascalResult<()> {
        self.env = Environment::new();
        let program = self.program;
        debug!(
            name = program.name().unwrap_or_default(),
            blocks = program.blocks.len(),
            "running program"
        );
        for block in program.blocks.iter().skip(1) {
            self.exec_block(block)?;
        }
        self.output
            .flush()
            .map_err(|e| Diagnostic::runtime(format!("failed to flush output: {e}")))
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    fn exec_block(&mut self, block: &[Node]) -> PascalResult<()> {
        for node in block {
            self.exec_node(node)?;
        }
        Ok(())
    }

    fn exec_node(&mut self, node: &Node) -> PascalResult<()> {
        debug!(
            statement = node.kind.name(),
            line = node.loc.line,
            "execute"
        );
        let loc = &node.loc;
        match &node.kind {
            NodeKind::ProgramHeader { .. }
            | NodeKind::ConstSection
            | NodeKind::VarSection
            | NodeKind::BeginSection => Ok(()),
            NodeKind::ConstDeclaration {
                identifier,
                declared_type,
                value,
            } => self.exec_const(identifier, *declared_type, value, loc),
            NodeKind::VariableDeclaration {
                identifiers,
                declared_type,
            } => self.exec_var(identifiers, *declared_type, loc),
            NodeKind::Assignment { target, expr } => self.exec_assign(target, expr, loc),
            NodeKind::Write { args } => self.exec_write(args, loc),
            NodeKind::Read { identifiers } => self.exec_read(identifiers, loc),
            NodeKind::If {
                condition,
                then_block,
                else_block,
            } => {
                if self.eval_condition(condition, loc)? {
                    self.exec_block(then_block)
                } else if let Some(else_block) = else_block {
                    self.exec_block(else_block)
                } else {
                    Ok(())
                }
            }
        }
    }

    // ── declarations ─────────────────────────────────────────────────

    fn exec_const(
        &mut self,
        name: &str,
        declared_type: DeclaredType,
        literal: &Value,
        loc: &SourceLoc,
    ) -> PascalResult<()> {
        if self.env.is_constant(name) {
            return Err(runtime(format!("Constant already declared: {name}"), loc));
        }
        let value = match (declared_type, literal) {
            (DeclaredType::Integer, Value::Int(_))
            | (DeclaredType::Double, Value::Double(_))
            | (DeclaredType::String, Value::Str(_)) => literal.clone(),
            (DeclaredType::Double, Value::Int(n)) => Value::Double(*n as f64),
            _ => {
                return Err(runtime(
                    format!(
                        "Type mismatch in constant declaration: {name} is declared {declared_type} but given a {} literal",
                        literal.type_name()
                    ),
                    loc,
                ))
            }
        };
        self.env
            .declare_constant(name, value)
            .map_err(|e| runtime(e.to_string(), loc))
    }

    fn exec_var(
        &mut self,
        identifiers: &IdentifierList,
        declared_type: DeclaredType,
        loc: &SourceLoc,
    ) -> PascalResult<()> {
        for name in identifiers {
            self.env
                .declare_variable(name, declared_type)
                .map_err(|e| runtime(e.to_string(), loc))?;
        }
        Ok(())
    }

    // ── statements ───────────────────────────────────────────────────

    fn exec_assign(&mut self, target: &str, expr: &[Token], loc: &SourceLoc) -> PascalResult<()> {
        if self.env.is_constant(target) {
            return Err(runtime(format!("Assignment to constant: {target}"), loc));
        }
        let Some(current) = self.env.variable(target) else {
            return Err(runtime(format!("Undeclared variable assignment: {target}"), loc));
        };

        let failed = |cause: String| runtime(format!("Failed to assign {target}: {cause}"), loc);
        let value = if current.is_numeric() {
            let number = evaluate_numeric(expr, &self.env).map_err(|e| failed(e.to_string()))?;
            current
                .narrow(number)
                .ok_or_else(|| failed("numeric value for a string variable".into()))?
        } else {
            Value::Str(evaluate_string(expr, &self.env).map_err(|e| failed(e.to_string()))?)
        };

        self.env
            .assign(target, value)
            .map_err(|e| failed(e.to_string()))
    }

    fn exec_write(&mut self, args: &[Token], loc: &SourceLoc) -> PascalResult<()> {
        let mut record = String::new();
        for field in split_fields(args).map_err(|msg| runtime(msg, loc))? {
            match evaluate_either(field, &self.env) {
                Ok(Operand::Number(n)) => record.push_str(&format_number(n)),
                Ok(Operand::Text(s)) => record.push_str(&s),
                Err(e) => {
                    return Err(runtime(
                        format!("Could not evaluate the expression: {e}"),
                        loc,
                    ))
                }
            }
        }
        writeln!(self.output, "{record}")
            .map_err(|e| runtime(format!("failed to write output: {e}"), loc))
    }

    fn exec_read(&mut self, identifiers: &IdentifierList, loc: &SourceLoc) -> PascalResult<()> {
        for name in identifiers {
            if self.env.is_constant(name) {
                return Err(runtime(format!("Input to constant not allowed: {name}"), loc));
            }
            let Some(current) = self.env.variable(name) else {
                return Err(runtime(format!("Undeclared variable: {name}"), loc));
            };
            let current = current.clone();

            let line = self.read_line(name, loc)?;
            let value = match current {
                Value::Int(_) => match line.trim().parse::<i64>() {
                    Ok(n) => Value::Int(n),
                    Err(e)
                        if matches!(
                            e.kind(),
                            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow
                        ) =>
                    {
                        return Err(runtime(
                            format!("Input value out of range for variable {name}: {line}"),
                            loc,
                        ))
                    }
                    Err(_) => return Err(invalid_input(name, &line, loc)),
                },
                Value::Double(_) => match line.trim().parse::<f64>() {
                    Ok(d) => Value::Double(d),
                    Err(_) => return Err(invalid_input(name, &line, loc)),
                },
                Value::Str(_) => Value::Str(line),
            };
            debug!(variable = %name, value = %value, "read");
            self.env
                .assign(name, value)
                .map_err(|e| runtime(e.to_string(), loc))?;
        }
        Ok(())
    }

    /// One input line without its line terminator.
    fn read_line(&mut self, name: &str, loc: &SourceLoc) -> PascalResult<String> {
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| runtime(format!("failed to read input for {name}: {e}"), loc))?;
        if read == 0 {
            return Err(runtime(
                format!("Unexpected end of input while reading {name}"),
                loc,
            ));
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }

    // ── conditions ───────────────────────────────────────────────────

    fn eval_condition(&self, condition: &[Token], loc: &SourceLoc) -> PascalResult<bool> {
        let mut ops = condition
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind.is_comparison());
        let (at, op) = match (ops.next(), ops.next()) {
            (Some(found), None) => found,
            (Some(_), Some(_)) => {
                return Err(runtime(
                    "Multiple comparison operators ('=', '<>', '<', '<=', '>', '>=') in condition",
                    loc,
                ))
            }
            (None, _) => {
                return Err(runtime(
                    "Condition must contain a comparison operator",
                    loc,
                ))
            }
        };

        // an empty side evaluates to 0
        let (left, right) = (&condition[..at], &condition[at + 1..]);
        let left = evaluate_either(left, &self.env)
            .map_err(|e| runtime(format!("Invalid condition expression: {e}"), loc))?;
        let right = evaluate_either(right, &self.env)
            .map_err(|e| runtime(format!("Invalid condition expression: {e}"), loc))?;

        let result = compare(op, &left, &right).map_err(|msg| runtime(msg, loc))?;
        debug!(op = %op.lexeme, result, "condition");
        Ok(result)
    }
}

/// Split `Write` arguments at commas into non-empty fields.
fn split_fields(args: &[Token]) -> Result<Vec<&[Token]>, String> {
    if args.is_empty() {
        return Ok(Vec::new());
    }
    let fields: Vec<&[Token]> = args.split(|t| t.kind == TokenKind::Comma).collect();
    let last = fields.len() - 1;
    match fields.iter().position(|f| f.is_empty()) {
        None => Ok(fields),
        Some(0) => Err("Write statement: the argument list cannot start with a comma".into()),
        Some(i) if i == last => {
            Err("Write statement: the argument list cannot end with a comma".into())
        }
        Some(_) => Err("Write statement: multiple consecutive commas are not allowed".into()),
    }
}

fn compare(op: &Token, left: &Operand, right: &Operand) -> Result<bool, String> {
    match (left, right) {
        (Operand::Number(l), Operand::Number(r)) => Ok(match op.kind {
            TokenKind::Equal => l == r,
            TokenKind::NonEqual => l != r,
            TokenKind::Less => l < r,
            TokenKind::LessOrEqual => l <= r,
            TokenKind::Greater => l > r,
            TokenKind::GreaterOrEqual => l >= r,
            _ => return Err(format!("'{}' is not a comparison operator", op.lexeme)),
        }),
        (Operand::Text(l), Operand::Text(r)) => match op.kind {
            TokenKind::Equal => Ok(l == r),
            TokenKind::NonEqual => Ok(l != r),
            _ => Err(format!("Cannot compare strings using {}", op.lexeme)),
        },
        _ => Err(format!(
            "Type mismatch error in conditional expression: {} {} {}",
            left.type_name(),
            op.lexeme,
            right.type_name()
        )),
    }
}

fn runtime(detail: impl Into<String>, loc: &SourceLoc) -> Diagnostic {
    Diagnostic::runtime(detail).at(loc.clone())
}

fn invalid_input(name: &str, line: &str, loc: &SourceLoc) -> Diagnostic {
    runtime(format!("Invalid input for variable {name}: '{line}'"), loc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PascalError;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use std::io::Cursor;

    fn parse(src: &str) -> Program {
        let tokens = Lexer::new(src).tokenize().unwrap();
        Parser::new(tokens).parse().unwrap()
    }

    /// Run `src` with `input`, returning stdout text or the diagnostic.
    fn run(src: &str, input: &str) -> Result<String, Diagnostic> {
        let program = parse(src);
        let mut interp = Interpreter::new(&program, Cursor::new(input.to_string()), Vec::new());
        interp.run()?;
        Ok(String::from_utf8(interp.output().clone()).unwrap())
    }

    fn run_err(src: &str) -> String {
        let err = run(src, "").unwrap_err();
        assert_eq!(err.error, PascalError::Runtime, "{err}");
        err.reason().to_string()
    }

    fn env_after(src: &str, input: &str) -> Environment {
        let program = parse(src);
        let mut interp = Interpreter::new(&program, Cursor::new(input.to_string()), Vec::new());
        interp.run().unwrap();
        interp.environment().clone()
    }

    #[test]
    fn write_concatenates_fields() {
        let out = run(r#"program P; begin Write("Hello", " ", "World"); end."#, "").unwrap();
        assert_eq!(out, "Hello World\n");
        let out = run("program P; begin Write(); Write(1 / 4, 2 * 3); end.", "").unwrap();
        assert_eq!(out, "\n0.256\n");
    }

    #[test]
    fn assignment_and_write() {
        let src = r#"program T; var a : integer; begin a := 5; Write("a=", a); end."#;
        assert_eq!(run(src, "").unwrap(), "a=5\n");
    }

    #[test]
    fn integer_target_truncates() {
        let env = env_after("program P; var x : integer; begin x := 7.9; end.", "");
        assert_eq!(env.variable("x"), Some(&Value::Int(7)));
        let env = env_after("program P; var x : integer; begin x := 0 - 7.9; end.", "");
        assert_eq!(env.variable("x"), Some(&Value::Int(-7)));
        let env = env_after("program P; var d : double; begin d := 7 div 2 + 0.5; end.", "");
        assert_eq!(env.variable("d"), Some(&Value::Double(3.5)));
    }

    #[test]
    fn string_assignment() {
        let src = r#"program P; const G : string = "Hi, "; var s : string;
                     begin s := G + "there"; Write(s); end."#;
        assert_eq!(run(src, "").unwrap(), "Hi, there\n");
    }

    #[test]
    fn declaration_errors() {
        assert_eq!(
            run_err("program P; const A : integer = 1; A : integer = 2; begin end."),
            "Constant already declared: A"
        );
        assert_eq!(
            run_err("program P; const A : integer = 1; var A : integer; begin end."),
            "Redeclared constant name: A"
        );
        assert_eq!(
            run_err("program P; var a, a : integer; begin end."),
            "Variable already declared: a"
        );
    }

    #[test]
    fn constant_literal_types() {
        let env = env_after("program P; const R : double = 2; N : integer = -4; begin end.", "");
        assert_eq!(env.constant("R"), Some(&Value::Double(2.0)));
        assert_eq!(env.constant("N"), Some(&Value::Int(-4)));
        let msg = run_err(r#"program P; const S : integer = "x"; begin end."#);
        assert!(msg.starts_with("Type mismatch in constant declaration: S"), "{msg}");
        let msg = run_err("program P; const D : integer = 1.5; begin end.");
        assert!(msg.starts_with("Type mismatch in constant declaration"), "{msg}");
    }

    #[test]
    fn assignment_errors() {
        assert_eq!(
            run_err("program P; const C : integer = 1; begin C := 2; end."),
            "Assignment to constant: C"
        );
        assert_eq!(
            run_err("program P; begin y := 2; end."),
            "Undeclared variable assignment: y"
        );
        assert_eq!(
            run_err("program P; var x : integer; begin x := 1 / 0; end."),
            "Failed to assign x: Division by zero"
        );
        assert_eq!(
            run_err(r#"program P; var x : integer; s : string; begin x := s; end."#),
            "Failed to assign x: String variable in arithmetic expression: s"
        );
        assert_eq!(
            run_err(r#"program P; var x : integer; s : string; begin s := x; end."#),
            "Failed to assign s: Type error: Identifier 'x' has unsuitable type"
        );
    }

    #[test]
    fn write_errors() {
        assert_eq!(
            run_err("program P; begin Write(missing); end."),
            "Could not evaluate the expression: Undeclared identifier: missing"
        );
        assert_eq!(
            run_err(r#"program P; begin Write("a" "b"); end."#),
            "Could not evaluate the expression: Invalid string expression"
        );
        assert_eq!(
            run_err("program P; begin Write(1,, 2); end."),
            "Write statement: multiple consecutive commas are not allowed"
        );
    }

    #[test]
    fn write_field_splitting() {
        let tokens = Lexer::new(", 1").tokenize().unwrap();
        assert_eq!(
            split_fields(&tokens).unwrap_err(),
            "Write statement: the argument list cannot start with a comma"
        );
        let tokens = Lexer::new("1 ,").tokenize().unwrap();
        assert_eq!(
            split_fields(&tokens).unwrap_err(),
            "Write statement: the argument list cannot end with a comma"
        );
        let tokens = Lexer::new("1 + 2, x").tokenize().unwrap();
        let fields = split_fields(&tokens).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].len(), 3);
    }

    #[test]
    fn read_by_declared_type() {
        let src = "program P; var n : integer; d : double; s : string;
                   begin Read(n, d); Read(s); Write(n, \" \", d, \" \", s); end.";
        let out = run(src, " 42 \n2.5\r\nhello world\n").unwrap();
        assert_eq!(out, "42 2.5 hello world\n");
    }

    #[test]
    fn read_errors() {
        let src = "program P; const C : integer = 1; begin Read(C); end.";
        assert_eq!(run_err(src), "Input to constant not allowed: C");
        assert_eq!(
            run_err("program P; begin Read(q); end."),
            "Undeclared variable: q"
        );

        let src = "program P; var n : integer; begin Read(n); end.";
        let err = run(src, "forty\n").unwrap_err();
        assert_eq!(err.reason(), "Invalid input for variable n: 'forty'");
        let err = run(src, "99999999999999999999\n").unwrap_err();
        assert!(err.reason().starts_with("Input value out of range for variable n"));
        let err = run(src, "").unwrap_err();
        assert_eq!(err.reason(), "Unexpected end of input while reading n");
    }

    #[test]
    fn if_else_dispatch() {
        let src = r#"program P; begin if (5 > 0) then Write("Positive"); end."#;
        assert_eq!(run(src, "").unwrap(), "Positive\n");
        let src = r#"program P; begin
                     if (-1 > 0) then Write("Positive"); else Write("Not positive"); end."#;
        assert_eq!(run(src, "").unwrap(), "Not positive\n");
        let src = r#"program P; begin if (1 > 2) then Write("x"); Write("after"); end."#;
        assert_eq!(run(src, "").unwrap(), "after\n");
    }

    #[test]
    fn numeric_comparisons() {
        let cases = [
            ("1 = 1", true),
            ("1 <> 1", false),
            ("1 < 2", true),
            ("2 <= 2", true),
            ("3 >= 4", false),
            ("2 * 3 = 6.0", true),
        ];
        for (cond, expected) in cases {
            let src = format!(r#"program P; begin if ({cond}) then Write("T"); else Write("F"); end."#);
            let want = if expected { "T\n" } else { "F\n" };
            assert_eq!(run(&src, "").unwrap(), want, "{cond}");
        }
    }

    #[test]
    fn string_comparisons() {
        let src = r#"program P; begin if ("a" = "a") then Write("eq"); end."#;
        assert_eq!(run(src, "").unwrap(), "eq\n");
        let src = r#"program P; var s : string; begin s := "x"; if (s <> "y") then Write("ne"); end."#;
        assert_eq!(run(src, "").unwrap(), "ne\n");
        assert_eq!(
            run_err(r#"program P; begin if ("a" > "b") then Write("x"); end."#),
            "Cannot compare strings using >"
        );
    }

    #[test]
    fn condition_errors() {
        assert!(run_err(r#"program P; begin if (1 = "a") then Write("x"); end."#)
            .starts_with("Type mismatch error in conditional expression"));
        assert!(run_err(r#"program P; begin if (1 = 1 = 1) then Write("x"); end."#)
            .starts_with("Multiple comparison operators"));
        assert_eq!(
            run_err(r#"program P; begin if (1) then Write("x"); end."#),
            "Condition must contain a comparison operator"
        );
        assert_eq!(
            run_err(r#"program P; begin if (1 / 0 > 1) then Write("x"); end."#),
            "Invalid condition expression: Division by zero"
        );
    }

    #[test]
    fn empty_condition_side_is_zero() {
        let src = r#"program P; begin if ( = 0) then Write("zero"); end."#;
        assert_eq!(run(src, "").unwrap(), "zero\n");
        let src = r#"program P; begin if (1 > ) then Write("pos"); else Write("neg"); end."#;
        assert_eq!(run(src, "").unwrap(), "pos\n");
    }

    #[test]
    fn nested_blocks_share_environment() {
        let src = r#"program P; var x : integer;
            begin
                x := 3;
                if (x > 1) then begin
                    x := x * 2;
                    if (x = 6) then Write("six"); else Write("other");
                end;
                Write(x);
            end."#;
        assert_eq!(run(src, "").unwrap(), "six\n6\n");
    }

    #[test]
    fn failure_aborts_remaining_statements() {
        let src = r#"program P; begin Write("before"); Write(1 / 0); Write("after"); end."#;
        let program = parse(src);
        let mut interp = Interpreter::new(&program, Cursor::new(String::new()), Vec::new());
        let err = interp.run().unwrap_err();
        assert_eq!(err.location.map(|l| l.col), Some(35));
        assert_eq!(interp.output().as_slice(), b"before\n");
    }

    #[test]
    fn run_resets_environment() {
        let program = parse("program P; const A : integer = 1; begin end.");
        let mut interp = Interpreter::new(&program, Cursor::new(String::new()), Vec::new());
        interp.run().unwrap();
        interp.run().unwrap();
        assert_eq!(interp.environment().constant("A"), Some(&Value::Int(1)));
    }
}
