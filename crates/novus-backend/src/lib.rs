//! Assembler (C9) and binary serializer (C10): lowers a [`novus_ir::Program`]
//! to a flat [`Executable`] and encodes/decodes that as bytes (spec §4.6,
//! §4.8). Grounded on `examples/mohsen1-tsz/crates/tsz-emitter`'s role as
//! the teacher's own "IR to output format" stage, adapted from a
//! string-emitting printer to a label-based bytecode assembler since the
//! novus target is a stack VM, not JavaScript source text.

pub mod assembler;
pub mod executable;
pub mod lower;
pub mod opcode;
pub mod serialize;

pub use executable::Executable;
pub use opcode::{Opcode, OperandShape};
pub use serialize::FORMAT_VERSION;

use novus_ir::Program;

/// Assembles `program` in declaration order. Production entry point used by
/// [`lower_program`](lower::lower_program)'s caller, `novus::compile`.
pub fn assemble(program: &Program) -> Executable {
    lower::lower_program(program, false)
}

/// Like [`assemble`], but sorts functions lexicographically by name
/// (spec §4.6: "In deterministic mode (used for tests) the assembler orders
/// synthesized anonymous functions lexicographically"), for golden-bytecode
/// tests that need byte-for-byte stable output.
pub fn assemble_deterministic(program: &Program) -> Executable {
    lower::lower_program(program, true)
}

pub fn serialize(executable: &Executable) -> Vec<u8> {
    serialize::serialize(executable)
}

pub fn deserialize(bytes: &[u8]) -> Option<Executable> {
    serialize::deserialize(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use novus_common::SourceTable;

    fn compiled_program(text: &str) -> Program {
        let mut sources = SourceTable::new();
        let main = sources.add("main".into(), None, text.to_string());
        let program = novus_frontend::analyze(&mut sources, &[main]).expect("clean analysis");
        novus_optimizer::optimize(program)
    }

    #[test]
    fn assembling_a_trivial_program_produces_a_nonempty_instruction_stream() {
        let program = compiled_program("fun f() -> int 1 + 2\nf()");
        let exe = assemble(&program);
        assert!(!exe.code.is_empty());
        assert!(serialize::validate_instructions(&exe.code));
    }

    #[test]
    fn serialize_round_trips_an_assembled_program() {
        let program = compiled_program("fun f() -> int 1 + 2\nf()");
        let exe = assemble(&program);
        let bytes = serialize(&exe);
        assert_eq!(deserialize(&bytes), Some(exe));
    }

    #[test]
    fn deterministic_assembly_is_stable_across_runs() {
        let program = compiled_program("fun a() -> int 1\nfun b() -> int 2\na()\nb()");
        let first = assemble_deterministic(&program);
        let second = assemble_deterministic(&program);
        assert_eq!(first, second);
    }
}
