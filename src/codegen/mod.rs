use std::collections::HashMap;

use crate::ast::*;

pub mod fmt;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error("redeclared variable: {name}")]
    RedeclaredVariable { name: String },
    #[error("undefined variable: {name}")]
    UndefinedVariable { name: String },
    #[error("undefined function: {name}")]
    UndefinedFunction { name: String },
}

type CompileResult<T> = Result<T, CompileError>;

// ── Target machine convention ───────────────────────────────────────
//
// r0 = frame pointer, r1 = stack pointer (restored on return),
// r2/r3 = scratch. Binary ops read r2 (left) and r3 (right) and leave
// the result in r2. All temporaries live on the operand stack.

pub const REG_FP: i64 = 0;
pub const REG_SP: i64 = 1;
pub const REG_LHS: i64 = 2;
pub const REG_RHS: i64 = 3;

/// The loader rebases jump targets by this amount when dereferencing.
pub const JUMP_DISPLACEMENT: i64 = 4;
/// The loader rebases call targets by this amount. Distinct from
/// `JUMP_DISPLACEMENT`; both are fixed by the companion VM loader.
pub const CALL_DISPLACEMENT: i64 = 3;

// ── Opcodes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    // data movement
    Move,
    Movei,
    Pushi,
    Pushr,
    Pop,
    // arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // control
    Jmp,
    Jne,
    Call,
    Ret,
    // memory
    Load,
    Store,
}

impl Opcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Move => "MOVE",
            Opcode::Movei => "MOVEI",
            Opcode::Pushi => "PUSHI",
            Opcode::Pushr => "PUSHR",
            Opcode::Pop => "POP",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Eq => "EQ",
            Opcode::Ne => "NE",
            Opcode::Lt => "LT",
            Opcode::Le => "LE",
            Opcode::Gt => "GT",
            Opcode::Ge => "GE",
            Opcode::Jmp => "JMP",
            Opcode::Jne => "JNE",
            Opcode::Call => "CALL",
            Opcode::Ret => "RET",
            Opcode::Load => "LOAD",
            Opcode::Store => "STORE",
        }
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl BinOp {
    /// The opcode executing this operator on r2/r3.
    pub fn opcode(self) -> Opcode {
        match self {
            BinOp::Add => Opcode::Add,
            BinOp::Sub => Opcode::Sub,
            BinOp::Mul => Opcode::Mul,
            BinOp::Div => Opcode::Div,
            BinOp::Mod => Opcode::Mod,
            BinOp::Eq => Opcode::Eq,
            BinOp::Ne => Opcode::Ne,
            BinOp::Lt => Opcode::Lt,
            BinOp::Le => Opcode::Le,
            BinOp::Gt => Opcode::Gt,
            BinOp::Ge => Opcode::Ge,
        }
    }
}

// ── Instructions ────────────────────────────────────────────────────

/// One VM operation. Immutable once emitted, except that the patcher
/// rewrites `operand1` of a placeholder jump exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: Opcode,
    pub operand1: i64,
    pub operand2: i64,
}

impl Instruction {
    pub fn new(opcode: Opcode, operand1: i64, operand2: i64) -> Self {
        Instruction { opcode, operand1, operand2 }
    }
}

/// Textual mnemonic triple, e.g. `PUSHI 5 0`. This is the only textual
/// form; instructions are never parsed back from it.
impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.opcode, self.operand1, self.operand2)
    }
}

// ── Compiler ────────────────────────────────────────────────────────

/// Single-pass code generator. Walks the AST appending to one flat
/// instruction stream; the only in-place mutation is the back-patch of
/// previously emitted jump placeholders.
struct Compiler {
    code: Vec<Instruction>,
    /// name → stack slot, local to the function being compiled.
    /// Slots start at 1; slot 0 is reserved to mean "unresolved".
    vars: HashMap<String, i64>,
    /// name → entry address, global across the unit.
    funcs: HashMap<String, i64>,
}

/// Compile a whole program into one flat instruction stream, functions
/// in source order. Any error aborts the unit; no partial output.
pub fn compile(program: &Program) -> Result<Vec<Instruction>, CompileError> {
    let mut c = Compiler {
        code: Vec::new(),
        vars: HashMap::new(),
        funcs: HashMap::new(),
    };
    for func in &program.functions {
        c.compile_function(func)?;
    }
    Ok(c.code)
}

impl Compiler {
    fn emit(&mut self, opcode: Opcode, operand1: i64, operand2: i64) -> usize {
        let idx = self.code.len();
        self.code.push(Instruction::new(opcode, operand1, operand2));
        idx
    }

    fn var_slot(&self, name: &str) -> CompileResult<i64> {
        self.vars
            .get(name)
            .copied()
            .ok_or_else(|| CompileError::UndefinedVariable { name: name.to_string() })
    }

    /// Leaves r2 = fp − slot, the frame-relative address of a local.
    fn emit_frame_offset(&mut self, slot: i64) {
        self.emit(Opcode::Move, REG_LHS, REG_FP);
        self.emit(Opcode::Pushi, slot, 0);
        self.emit(Opcode::Pop, REG_RHS, 0);
        self.emit(Opcode::Sub, 0, 0);
    }

    /// Allocates the next slot for `name` and extends the operand stack
    /// over it by moving the stack pointer to the new slot's address.
    fn compile_declare(&mut self, name: &str) -> CompileResult<()> {
        if self.vars.contains_key(name) {
            return Err(CompileError::RedeclaredVariable { name: name.to_string() });
        }
        let slot = self.vars.len() as i64 + 1;
        self.vars.insert(name.to_string(), slot);
        self.emit_frame_offset(slot);
        self.emit(Opcode::Move, REG_SP, REG_LHS);
        Ok(())
    }

    // ── Functions ───────────────────────────────────────────────────

    fn compile_function(&mut self, func: &Function) -> CompileResult<()> {
        // Entry address registered before the body so self-recursion
        // resolves; forward references to later functions do not.
        self.vars.clear();
        self.funcs
            .insert(func.name.clone(), self.code.len() as i64 + CALL_DISPLACEMENT);

        // Prologue: save caller's frame pointer, rebase the frame.
        self.emit(Opcode::Pushr, REG_FP, 0);
        self.emit(Opcode::Move, REG_FP, REG_SP);

        for name in &func.params {
            self.compile_declare(name)?;
        }
        let argc = func.params.len() as i64;
        for i in 0..argc {
            // Caller pushed the argument at fp + (i + 2), past the two
            // prologue-saved words; copy it into local slot argc − i.
            self.emit(Opcode::Move, REG_LHS, REG_FP);
            self.emit(Opcode::Movei, REG_RHS, i + 2);
            self.emit(Opcode::Add, 0, 0);
            self.emit(Opcode::Load, REG_LHS, REG_LHS);
            self.emit(Opcode::Pushr, REG_LHS, 0);
            self.emit(Opcode::Move, REG_LHS, REG_FP);
            self.emit(Opcode::Movei, REG_RHS, argc - i);
            self.emit(Opcode::Sub, 0, 0);
            self.emit(Opcode::Pop, REG_RHS, 0);
            self.emit(Opcode::Store, REG_LHS, REG_RHS);
        }

        for stmt in &func.body {
            self.compile_stmt(stmt)?;
        }

        // Implicit epilogue: default return value 0. Reached only when
        // no explicit return executed.
        self.emit(Opcode::Pushi, 0, 0);
        self.compile_epilogue();
        Ok(())
    }

    /// Pop the return value into r2, restore the caller's stack and
    /// frame pointers, return.
    fn compile_epilogue(&mut self) {
        self.emit(Opcode::Pop, REG_LHS, 0);
        self.emit(Opcode::Move, REG_SP, REG_FP);
        self.emit(Opcode::Pop, REG_RHS, 0);
        self.emit(Opcode::Move, REG_FP, REG_RHS);
        self.emit(Opcode::Ret, 0, 0);
    }

    // ── Statements ──────────────────────────────────────────────────

    fn compile_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
        match stmt {
            Stmt::Declare { name } => self.compile_declare(name),

            Stmt::Assign { name, value } => {
                let slot = self.var_slot(name)?;
                self.emit_frame_offset(slot);
                self.emit(Opcode::Pushr, REG_LHS, 0);
                self.compile_expr(value)?;
                self.emit(Opcode::Pop, REG_RHS, 0);
                self.emit(Opcode::Pop, REG_LHS, 0);
                self.emit(Opcode::Store, REG_LHS, REG_RHS);
                Ok(())
            }

            Stmt::If { condition, then_block, else_block } => {
                self.compile_expr(condition)?;
                self.emit(Opcode::Pop, REG_LHS, 0);
                let jump_to_else = self.emit(Opcode::Jne, 0, 0);
                for stmt in then_block {
                    self.compile_stmt(stmt)?;
                }
                // Patched before the else JMP is emitted, so with an
                // else present the target is the JMP's own index + 4.
                self.code[jump_to_else].operand1 =
                    self.code.len() as i64 + JUMP_DISPLACEMENT;
                if let Some(else_block) = else_block {
                    let jump_from_then = self.emit(Opcode::Jmp, 0, 0);
                    for stmt in else_block {
                        self.compile_stmt(stmt)?;
                    }
                    self.code[jump_from_then].operand1 =
                        self.code.len() as i64 - 1 + JUMP_DISPLACEMENT;
                }
                Ok(())
            }

            Stmt::While { condition, body } => {
                let top = self.code.len() as i64 - 1;
                self.compile_expr(condition)?;
                self.emit(Opcode::Pop, REG_LHS, 0);
                let jump_to_bottom = self.emit(Opcode::Jne, 0, 0);
                for stmt in body {
                    self.compile_stmt(stmt)?;
                }
                self.emit(Opcode::Jmp, top, 0);
                self.code[jump_to_bottom].operand1 =
                    self.code.len() as i64 - 1 + JUMP_DISPLACEMENT;
                Ok(())
            }

            // Call for effect. The return value stays pushed, exactly
            // like the expression form; see DESIGN.md.
            Stmt::Call { name, args } => self.compile_call(name, args),

            Stmt::Return(expr) => {
                self.compile_expr(expr)?;
                self.compile_epilogue();
                Ok(())
            }
        }
    }

    // ── Expressions ─────────────────────────────────────────────────
    //
    // Every expression leaves exactly one value pushed on the operand
    // stack.

    fn compile_expr(&mut self, expr: &Expr) -> CompileResult<()> {
        match expr {
            Expr::Int(value) => {
                self.emit(Opcode::Pushi, *value, 0);
                Ok(())
            }

            Expr::Var(name) => {
                let slot = self.var_slot(name)?;
                self.emit_frame_offset(slot);
                self.emit(Opcode::Load, REG_LHS, REG_LHS);
                self.emit(Opcode::Pushr, REG_LHS, 0);
                Ok(())
            }

            Expr::Binary { op, left, right } => {
                self.compile_expr(left)?;
                self.compile_expr(right)?;
                // Right was pushed last: pop it into r3, then the left
                // into r2. Swapping this order inverts SUB/DIV/MOD and
                // the ordering comparisons.
                self.emit(Opcode::Pop, REG_RHS, 0);
                self.emit(Opcode::Pop, REG_LHS, 0);
                self.emit(op.opcode(), 0, 0);
                self.emit(Opcode::Pushr, REG_LHS, 0);
                Ok(())
            }

            Expr::Call { name, args } => self.compile_call(name, args),
        }
    }

    /// Shared by call-as-expression and call-as-statement: arguments
    /// left to right, CALL, then push the callee's result from r2.
    fn compile_call(&mut self, name: &str, args: &[Expr]) -> CompileResult<()> {
        for arg in args {
            self.compile_expr(arg)?;
        }
        let addr = match self.funcs.get(name) {
            Some(&addr) if addr != 0 => addr,
            _ => return Err(CompileError::UndefinedFunction { name: name.to_string() }),
        };
        self.emit(Opcode::Call, addr, 0);
        self.emit(Opcode::Pushr, REG_LHS, 0);
        Ok(())
    }
}
