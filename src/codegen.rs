use crate::analyze::SymbolTable;
use crate::ast::{BinaryOperator, Expr, Program, Stmt};

/// Register assignments shared with the target machine.
pub const PC: usize = 7; // program counter
pub const MP: usize = 6; // memory pointer, top of the downward temp stack
pub const GP: usize = 5; // global pointer, base of variable storage
pub const AC: usize = 0; // accumulator
pub const AC1: usize = 1; // second accumulator

/// Emission state: a cursor, a high-water mark, and the current temp-stack
/// offset. The skip/backup/restore protocol resolves forward branch targets
/// in a single tree pass.
struct Emitter {
    code: Vec<String>,
    emit_loc: usize,
    high_emit_loc: usize,
    tmp_offset: i64,
}

impl Emitter {
    fn new() -> Self {
        Self {
            code: Vec::new(),
            emit_loc: 0,
            high_emit_loc: 0,
            tmp_offset: 0,
        }
    }

    fn write_line(&mut self, line: String) {
        if self.emit_loc >= self.code.len() {
            self.code.resize(self.emit_loc + 1, String::new());
        }
        self.code[self.emit_loc] = line;
        self.emit_loc += 1;
        if self.high_emit_loc < self.emit_loc {
            self.high_emit_loc = self.emit_loc;
        }
    }

    fn emit_ro(&mut self, op: &str, r: usize, s: usize, t: usize) {
        let line = format!("{:3}: {:>5} {}, {}, {}", self.emit_loc, op, r, s, t);
        self.write_line(line);
    }

    fn emit_rm(&mut self, op: &str, r: usize, d: i64, s: usize) {
        let line = format!("{:3}: {:>5} {}, {}({})", self.emit_loc, op, r, d, s);
        self.write_line(line);
    }

    fn emit_so(&mut self, op: &str, text: &str) {
        let line = format!("{:3}: {:>5} {}", self.emit_loc, op, text);
        self.write_line(line);
    }

    /// Emits a jump/load whose absolute target is converted to a pc-relative
    /// displacement.
    fn emit_rm_abs(&mut self, op: &str, r: usize, target: usize) {
        let displacement = target as i64 - (self.emit_loc as i64 + 1);
        self.emit_rm(op, r, displacement, PC);
    }

    /// Reserves `count` slots for later backpatching and returns the first
    /// reserved location.
    fn skip(&mut self, count: usize) -> usize {
        let loc = self.emit_loc;
        self.emit_loc += count;
        if self.high_emit_loc < self.emit_loc {
            self.high_emit_loc = self.emit_loc;
            self.code.resize(self.high_emit_loc, String::new());
        }
        loc
    }

    fn backup(&mut self, loc: usize) {
        self.emit_loc = loc;
    }

    fn restore(&mut self) {
        self.emit_loc = self.high_emit_loc;
    }

    fn current_loc(&self) -> usize {
        self.emit_loc
    }
}

/// Emits the bytecode listing for a type-checked program. Deterministic:
/// the same tree and symbol table always produce the same listing.
pub fn generate(program: &Program, symtab: &SymbolTable) -> Vec<String> {
    let mut emitter = Emitter::new();

    // Prologue: mp <- top-of-memory address stored in dmem[0], then clear
    // the bootstrap cell.
    emitter.emit_rm("LD", MP, 0, AC);
    emitter.emit_rm("ST", AC, 0, AC);

    gen_stmts(&program.statements, symtab, &mut emitter);

    emitter.emit_ro("HALT", 0, 0, 0);
    emitter.code
}

fn gen_stmts(statements: &[Stmt], symtab: &SymbolTable, emitter: &mut Emitter) {
    for statement in statements {
        gen_stmt(statement, symtab, emitter);
    }
}

fn gen_stmt(statement: &Stmt, symtab: &SymbolTable, emitter: &mut Emitter) {
    match statement {
        Stmt::If {
            test,
            then_branch,
            else_branch,
            ..
        } => {
            gen_expr(test, symtab, emitter);
            // Branch over the then part once the else start is known.
            let branch_loc = emitter.skip(1);
            gen_stmts(then_branch, symtab, emitter);
            // Jump over the else part once the end is known.
            let jump_loc = emitter.skip(1);

            let else_start = emitter.current_loc();
            emitter.backup(branch_loc);
            emitter.emit_rm_abs("JEQ", AC, else_start);
            emitter.restore();

            gen_stmts(else_branch, symtab, emitter);

            let end = emitter.current_loc();
            emitter.backup(jump_loc);
            emitter.emit_rm_abs("LDA", PC, end);
            emitter.restore();
        }
        Stmt::Repeat { body, test, .. } => {
            let loop_start = emitter.current_loc();
            gen_stmts(body, symtab, emitter);
            gen_expr(test, symtab, emitter);
            // The test leaves 0 in the accumulator while the loop continues.
            emitter.emit_rm_abs("JEQ", AC, loop_start);
        }
        Stmt::Assign { name, value, .. } => {
            gen_expr(value, symtab, emitter);
            emitter.emit_rm("ST", AC, location(symtab, name), GP);
        }
        Stmt::Read { name, .. } => {
            emitter.emit_ro("IN", AC, 0, 0);
            emitter.emit_rm("ST", AC, location(symtab, name), GP);
        }
        Stmt::Write { value, .. } => match value {
            Expr::Str { text, .. } => emitter.emit_so("PRINT", text),
            _ => {
                gen_expr(value, symtab, emitter);
                emitter.emit_ro("OUT", AC, 0, 0);
            }
        },
    }
}

fn gen_expr(expr: &Expr, symtab: &SymbolTable, emitter: &mut Emitter) {
    match expr {
        Expr::Const { value, .. } => emitter.emit_rm("LDC", AC, *value, 0),
        Expr::Ident { name, .. } => emitter.emit_rm("LD", AC, location(symtab, name), GP),
        // String literals only occur directly under write, handled there.
        Expr::Str { .. } => {}
        Expr::BinaryOp {
            op, left, right, ..
        } => {
            gen_expr(left, symtab, emitter);
            // Push the left operand onto the temp stack.
            emitter.emit_rm("ST", AC, emitter.tmp_offset, MP);
            emitter.tmp_offset -= 1;
            gen_expr(right, symtab, emitter);
            // Pop it back into the second accumulator.
            emitter.tmp_offset += 1;
            emitter.emit_rm("LD", AC1, emitter.tmp_offset, MP);
            match op {
                BinaryOperator::Plus => emitter.emit_ro("ADD", AC, AC1, AC),
                BinaryOperator::Minus => emitter.emit_ro("SUB", AC, AC1, AC),
                BinaryOperator::Times => emitter.emit_ro("MUL", AC, AC1, AC),
                BinaryOperator::Over => emitter.emit_ro("DIV", AC, AC1, AC),
                BinaryOperator::Lt => gen_comparison(emitter, "JLT"),
                BinaryOperator::Eq => gen_comparison(emitter, "JEQ"),
            }
        }
    }
}

// The instruction set has no compare opcode; synthesize 0/1 in the
// accumulator from a subtract and a conditional jump.
fn gen_comparison(emitter: &mut Emitter, jump: &str) {
    emitter.emit_ro("SUB", AC, AC1, AC);
    emitter.emit_rm(jump, AC, 2, PC);
    emitter.emit_rm("LDC", AC, 0, AC);
    emitter.emit_rm("LDA", PC, 1, PC);
    emitter.emit_rm("LDC", AC, 1, AC);
}

fn location(symtab: &SymbolTable, name: &str) -> i64 {
    symtab
        .location_of(name)
        .expect("identifier missing from symbol table") as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze;
    use crate::config;
    use crate::parser;
    use crate::scanner;

    fn listing(source: &str) -> Vec<String> {
        let reserved = config::default_reserved();
        let program =
            parser::parse_tokens(scanner::tokenize(source, &reserved)).expect("parse failed");
        let symtab = analyze::build_symtab(&program);
        analyze::type_check(&program).expect("type check failed");
        generate(&program, &symtab)
    }

    // Collapses the fixed-width padding so expectations stay readable.
    fn normalize(line: &str) -> String {
        line.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn normalized(source: &str) -> Vec<String> {
        listing(source).iter().map(|line| normalize(line)).collect()
    }

    #[test]
    fn empty_program_is_prologue_and_halt() {
        assert_eq!(
            normalized(""),
            vec!["0: LD 6, 0(0)", "1: ST 0, 0(0)", "2: HALT 0, 0, 0"]
        );
    }

    #[test]
    fn generates_arithmetic_assignment() {
        assert_eq!(
            normalized("x := 1 + 2;\nwrite x"),
            vec![
                "0: LD 6, 0(0)",
                "1: ST 0, 0(0)",
                "2: LDC 0, 1(0)",
                "3: ST 0, 0(6)",
                "4: LDC 0, 2(0)",
                "5: LD 1, 0(6)",
                "6: ADD 0, 1, 0",
                "7: ST 0, 0(5)",
                "8: LD 0, 0(5)",
                "9: OUT 0, 0, 0",
                "10: HALT 0, 0, 0",
            ]
        );
    }

    #[test]
    fn nested_expressions_stack_temporaries() {
        let lines = normalized("x := (1 + 2) * (3 + 4)");
        // The outer operand sits at offset 0 while the right subtree spills
        // one slot deeper.
        assert_eq!(lines[7], "7: ST 0, 0(6)");
        assert_eq!(lines[9], "9: ST 0, -1(6)");
        assert_eq!(lines[11], "11: LD 1, -1(6)");
        assert_eq!(lines[13], "13: LD 1, 0(6)");
        assert_eq!(lines[14], "14: MUL 0, 1, 0");
    }

    #[test]
    fn backpatches_if_else_branch_targets() {
        let lines = normalized("if 1 < 2 then write 1 else write 2 end");
        assert_eq!(
            lines,
            vec![
                "0: LD 6, 0(0)",
                "1: ST 0, 0(0)",
                "2: LDC 0, 1(0)",
                "3: ST 0, 0(6)",
                "4: LDC 0, 2(0)",
                "5: LD 1, 0(6)",
                "6: SUB 0, 1, 0",
                "7: JLT 0, 2(7)",
                "8: LDC 0, 0(0)",
                "9: LDA 7, 1(7)",
                "10: LDC 0, 1(0)",
                // Backpatched: jump to the else start (location 15).
                "11: JEQ 0, 3(7)",
                "12: LDC 0, 1(0)",
                "13: OUT 0, 0, 0",
                // Backpatched: jump past the else part (location 17).
                "14: LDA 7, 2(7)",
                "15: LDC 0, 2(0)",
                "16: OUT 0, 0, 0",
                "17: HALT 0, 0, 0",
            ]
        );
    }

    #[test]
    fn if_without_else_jumps_to_common_end() {
        let lines = normalized("if 1 < 2 then write 1 end");
        // Both patched slots resolve to the instruction after the then part.
        assert_eq!(lines[11], "11: JEQ 0, 3(7)");
        assert_eq!(lines[14], "14: LDA 7, 0(7)");
        assert_eq!(lines[15], "15: HALT 0, 0, 0");
    }

    #[test]
    fn repeat_branches_back_to_loop_start() {
        let lines = normalized("x := 0;\nrepeat\n  x := x + 1;\n  write x\nuntil x = 3");
        assert_eq!(lines[21], "21: JEQ 0, -18(7)");
        assert_eq!(lines[22], "22: HALT 0, 0, 0");
    }

    #[test]
    fn write_string_emits_print() {
        let lines = listing("write \"hello, world\"");
        assert_eq!(normalize(&lines[2]), "2: PRINT hello, world");
    }

    #[test]
    fn string_if_test_emits_no_test_code() {
        // A string literal test contributes no instructions, so the branch
        // reads the accumulator as the prologue left it.
        assert_eq!(
            normalized("if \"s\" then write 1 end"),
            vec![
                "0: LD 6, 0(0)",
                "1: ST 0, 0(0)",
                "2: JEQ 0, 3(7)",
                "3: LDC 0, 1(0)",
                "4: OUT 0, 0, 0",
                "5: LDA 7, 0(7)",
                "6: HALT 0, 0, 0",
            ]
        );
    }

    #[test]
    fn read_stores_into_variable_slot() {
        assert_eq!(
            normalized("read a;\nread b"),
            vec![
                "0: LD 6, 0(0)",
                "1: ST 0, 0(0)",
                "2: IN 0, 0, 0",
                "3: ST 0, 0(5)",
                "4: IN 0, 0, 0",
                "5: ST 0, 1(5)",
                "6: HALT 0, 0, 0",
            ]
        );
    }

    #[test]
    fn listing_is_deterministic() {
        let source = "x := 1; y := x + 2; if x < y then write x else write y end";
        assert_eq!(listing(source), listing(source));
    }
}
