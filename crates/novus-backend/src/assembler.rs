//! Label-based assembler (spec §4.6: "supports named labels with forward
//! references; at close it resolves all label references into absolute
//! offsets. String literals are deduplicated.").

use rustc_hash::FxHashMap;

use crate::opcode::Opcode;

/// Emits instruction bytes and a deduplicated string pool; label references
/// may be emitted before the label they name is defined, and are patched in
/// at [`Assembler::finish`].
#[derive(Default)]
pub struct Assembler {
    code: Vec<u8>,
    strings: Vec<String>,
    string_index: FxHashMap<String, u32>,
    labels: FxHashMap<String, u32>,
    /// Byte offset of a pending `u32` operand, and the label it refers to.
    patches: Vec<(usize, String)>,
    next_fresh_label: u32,
}

impl Assembler {
    pub fn new() -> Self {
        Assembler::default()
    }

    /// A label name guaranteed unused so far, for `Switch`'s per-branch
    /// targets and its terminal join point.
    pub fn fresh_label(&mut self, tag: &str) -> String {
        let n = self.next_fresh_label;
        self.next_fresh_label += 1;
        format!("${tag}{n}")
    }

    /// Offset the next emitted byte will land at.
    pub fn here(&self) -> u32 {
        self.code.len() as u32
    }

    pub fn define_label(&mut self, name: impl Into<String>) {
        let name = name.into();
        let offset = self.here();
        let previous = self.labels.insert(name.clone(), offset);
        debug_assert!(previous.is_none(), "label {name} defined twice");
    }

    pub fn emit_op(&mut self, op: Opcode) {
        self.code.push(op as u8);
    }

    pub fn emit_u8(&mut self, value: u8) {
        self.code.push(value);
    }

    pub fn emit_u32(&mut self, value: u32) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    pub fn emit_i64(&mut self, value: i64) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    pub fn emit_f64(&mut self, value: f64) {
        self.code.extend_from_slice(&value.to_le_bytes());
    }

    /// `op` followed by a `u32` operand resolved to `label`'s offset once
    /// known. Used for `Jump`/`JumpIf`/`Call*`/`LoadLitIp`.
    pub fn emit_label_ref(&mut self, op: Opcode, label: impl Into<String>) {
        self.emit_op(op);
        let patch_at = self.code.len();
        self.emit_u32(0);
        self.patches.push((patch_at, label.into()));
    }

    pub fn intern_string(&mut self, s: &str) -> u32 {
        if let Some(&idx) = self.string_index.get(s) {
            return idx;
        }
        let idx = self.strings.len() as u32;
        self.strings.push(s.to_string());
        self.string_index.insert(s.to_string(), idx);
        idx
    }

    pub fn finish(self) -> (Vec<u8>, Vec<String>) {
        let Assembler { mut code, strings, labels, patches, .. } = self;
        for (patch_at, label) in patches {
            let target = *labels
                .get(&label)
                .unwrap_or_else(|| panic!("label {label} referenced but never defined"));
            code[patch_at..patch_at + 4].copy_from_slice(&target.to_le_bytes());
        }
        (code, strings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_label_reference_is_patched_to_the_right_offset() {
        let mut asm = Assembler::new();
        asm.emit_label_ref(Opcode::Jump, "target");
        asm.emit_op(Opcode::Pop);
        asm.define_label("target");
        asm.emit_op(Opcode::Ret);
        let (code, _) = asm.finish();
        let target_offset = u32::from_le_bytes(code[1..5].try_into().unwrap());
        assert_eq!(target_offset, 6);
    }

    #[test]
    fn repeated_strings_share_one_pool_slot() {
        let mut asm = Assembler::new();
        let a = asm.intern_string("hello");
        let b = asm.intern_string("hello");
        let c = asm.intern_string("world");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
