//! Operator precedence/associativity table driving [`crate::parser::Parser`]'s
//! Pratt loop.
//!
//! The original implementation's exact banding lives in `parse/parser.cpp`,
//! which the retrieval pack did not include (only the class shape in
//! `parser.hpp` survived). The bands below follow conventional C-family
//! precedence grouped by operator kind, which is consistent with every
//! concrete expression the retrieved tests exercise (`a != 0 ? x : y`,
//! `a + b`, comparisons binding tighter than equality, etc) — see
//! `DESIGN.md` for the explicit open-question note.

use novus_lexer::Operator;

/// Binding power pair `(left, right)`; a higher number binds tighter.
/// Left-associative operators have `left < right`; none of this table's
/// operators are right-associative.
pub fn infix_binding_power(op: Operator) -> Option<(u8, u8)> {
    use Operator::*;
    Some(match op {
        ColonColon => (27, 28),
        Star | Slash | Rem => (23, 24),
        Plus | Minus => (21, 22),
        ShiftL | ShiftR => (19, 20),
        Amp => (17, 18),
        Hat => (15, 16),
        Pipe => (13, 14),
        Le | LeEq | Gt | GtEq => (11, 12),
        EqEq | BangEq => (9, 10),
        QMarkQMark => (7, 8),
        PlusPlus | MinusMinus | Tilde | Bang | SquareSquare | ParenParen => return None,
    })
}

/// Binding power of a prefix operator's operand.
pub fn prefix_binding_power(op: Operator) -> Option<u8> {
    use Operator::*;
    match op {
        Minus | Bang | Tilde | PlusPlus | MinusMinus => Some(25),
        _ => None,
    }
}

/// The ternary `cond ? ifTrue : ifFalse` binds looser than every named
/// operator — it is not itself an [`Operator`] (spec §4.2: "assignment-style,
/// short-circuit logical, ternary `?:` are non-overloadable").
pub const CONDITIONAL_BINDING_POWER: u8 = 1;

/// `||` binds looser than `&&`, both looser than every named operator but
/// tighter than the ternary (spec §4.4: "short-circuiting `&&` / `||` lower
/// to a `Switch`"; neither is an [`Operator`], so they get their own bands
/// rather than a `getFuncName` entry).
pub const LOGICAL_OR_BINDING_POWER: (u8, u8) = (2, 3);
pub const LOGICAL_AND_BINDING_POWER: (u8, u8) = (4, 5);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplicative_binds_tighter_than_additive() {
        let (_, mul_right) = infix_binding_power(Operator::Star).unwrap();
        let (add_left, _) = infix_binding_power(Operator::Plus).unwrap();
        assert!(mul_right > add_left);
    }

    #[test]
    fn equality_binds_looser_than_comparison() {
        let (_, cmp_right) = infix_binding_power(Operator::Le).unwrap();
        let (eq_left, _) = infix_binding_power(Operator::EqEq).unwrap();
        assert!(cmp_right > eq_left);
    }

    #[test]
    fn postfix_only_operators_have_no_infix_power() {
        assert_eq!(infix_binding_power(Operator::Bang), None);
    }
}
