//! Binary encoding of an [`Executable`] (spec §4.8): little-endian,
//! prefixed by a `u16` format version. Deserialization rejects a mismatched
//! version or any truncation by returning `None` rather than erroring —
//! there is no partial/best-effort `Executable`.
//!
//! ```text
//! u16  formatVersion
//! u32  entrypointOffset
//! u32  compilerVersionLen, bytes[...]
//! u32  numLitStrings, { u32 len, bytes[...] } x N
//! u32  numInstructionBytes, bytes[...]
//! ```

use crate::executable::Executable;
use crate::opcode::Opcode;

/// Current wire format version (spec §4.8: "current: 17").
pub const FORMAT_VERSION: u16 = 17;

pub fn serialize(executable: &Executable) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&executable.entrypoint_offset.to_le_bytes());

    let version_bytes = executable.compiler_version.as_bytes();
    out.extend_from_slice(&(version_bytes.len() as u32).to_le_bytes());
    out.extend_from_slice(version_bytes);

    out.extend_from_slice(&(executable.strings.len() as u32).to_le_bytes());
    for s in &executable.strings {
        let bytes = s.as_bytes();
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(bytes);
    }

    out.extend_from_slice(&(executable.code.len() as u32).to_le_bytes());
    out.extend_from_slice(&executable.code);
    out
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Cursor { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let slice = self.bytes.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn u16(&mut self) -> Option<u16> {
        Some(u16::from_le_bytes(self.take(2)?.try_into().ok()?))
    }

    fn u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn string(&mut self) -> Option<String> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).ok()
    }
}

pub fn deserialize(bytes: &[u8]) -> Option<Executable> {
    let mut cursor = Cursor::new(bytes);

    let version = cursor.u16()?;
    if version != FORMAT_VERSION {
        return None;
    }
    let entrypoint_offset = cursor.u32()?;
    let compiler_version = cursor.string()?;

    let num_strings = cursor.u32()?;
    let mut strings = Vec::with_capacity(num_strings as usize);
    for _ in 0..num_strings {
        strings.push(cursor.string()?);
    }

    let code_len = cursor.u32()? as usize;
    let code = cursor.take(code_len)?.to_vec();

    Some(Executable::new(compiler_version, entrypoint_offset, strings, code))
}

/// Walks `code` decoding one opcode tag plus its declared operand at a
/// time, confirming the stream contains only known opcodes and never runs
/// truncated mid-operand. Does not follow jumps or validate that targets
/// land on an instruction boundary; that is the assembler's job at build
/// time, not the deserializer's.
pub fn validate_instructions(code: &[u8]) -> bool {
    let mut pos = 0usize;
    while pos < code.len() {
        let Some(&tag) = code.get(pos) else { return false };
        let Some(op) = Opcode::from_tag(tag) else { return false };
        let operand_len = op.operand_shape().encoded_len();
        pos += 1;
        let Some(end) = pos.checked_add(operand_len) else { return false };
        if end > code.len() {
            return false;
        }
        pos = end;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_then_deserialize_is_the_identity() {
        let exe = Executable::new("novus 0.1.0".to_string(), 4, vec!["hi".to_string()], vec![Opcode::Ret as u8]);
        let bytes = serialize(&exe);
        assert_eq!(deserialize(&bytes), Some(exe));
    }

    #[test]
    fn mismatched_format_version_is_rejected() {
        let exe = Executable::new("v".to_string(), 0, vec![], vec![]);
        let mut bytes = serialize(&exe);
        bytes[0] = 0xff;
        assert_eq!(deserialize(&bytes), None);
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let exe = Executable::new("v".to_string(), 0, vec!["x".to_string()], vec![]);
        let bytes = serialize(&exe);
        assert_eq!(deserialize(&bytes[..bytes.len() - 2]), None);
    }

    #[test]
    fn valid_instruction_stream_round_trips_through_the_operand_table() {
        let mut code = vec![Opcode::LoadLitInt32 as u8];
        code.extend_from_slice(&42u32.to_le_bytes());
        code.push(Opcode::Ret as u8);
        assert!(validate_instructions(&code));
    }

    #[test]
    fn truncated_operand_fails_validation() {
        let code = vec![Opcode::LoadLitInt32 as u8, 1, 2];
        assert!(!validate_instructions(&code));
    }
}
