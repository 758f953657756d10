//! IR expressions (spec §3 IR data model, §4.4 `GetExpr` lowering, §4.5
//! optimizer rewrites).

use novus_common::{Atom, SourceId};

use crate::ids::{ConstId, FieldId, FuncId, TypeId};

/// How a [`ExprKind::Call`] should be emitted (spec §4.6 backend lowering
/// rules: `CallTail` when last in a body, `CallForked` for `Fork`, a lazy
/// construction sequence for `Lazy`, else plain `Call`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallMode {
    Normal,
    Tail,
    Fork,
    Lazy,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    LitBool(bool),
    LitChar(char),
    LitInt(i64),
    LitLong(i64),
    LitFloat(f64),
    LitString(Atom),
    LitEnum(TypeId, i32),
    /// A bare function reference with no bound args (spec §4.4 "producing a
    /// function literal when an expected delegate type is known").
    LitFunc(FuncId),
    /// A function reference with captured free variables appended as
    /// trailing bound args (spec §4.4 anonymous-function lowering).
    Closure { func: FuncId, bound_args: Vec<Expr> },

    Const(ConstId),
    Assign(ConstId, Box<Expr>),
    Group(Vec<Expr>),

    Call {
        func: FuncId,
        args: Vec<Expr>,
        mode: CallMode,
    },
    CallDyn {
        lhs: Box<Expr>,
        args: Vec<Expr>,
        fork: bool,
    },
    /// Self-recursion without naming the enclosing function (spec §3).
    CallSelf {
        args: Vec<Expr>,
    },

    Field(Box<Expr>, FieldId),

    /// `is T`, returns bool.
    UnionCheck(Box<Expr>, TypeId),
    /// `as T id`, returns bool and binds a constant on success.
    UnionGet(Box<Expr>, TypeId, ConstId),

    Switch {
        conditions: Vec<Expr>,
        branches: Vec<Expr>,
    },
}

/// One IR expression node: its lowered shape, its result type, and the
/// source location it was lowered from (spec: "Every `Expr` node may carry
/// a `SourceId` ... set-once").
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: TypeId,
    pub source: Option<SourceId>,
}

impl Expr {
    pub fn new(kind: ExprKind, ty: TypeId, source: Option<SourceId>) -> Self {
        Expr { kind, ty, source }
    }

    /// The expression's type (`E.getType()` in the source model; spec
    /// invariant: always a concrete, declared `TypeId`).
    pub fn get_type(&self) -> TypeId {
        self.ty
    }

    /// True for expressions whose evaluation can have a side effect:
    /// action calls, union-gets (they bind a constant), and assignments.
    /// The optimizer's constant-elimination pass (spec §4.5) must never
    /// reorder or drop these.
    pub fn has_side_effect(&self, is_action_call: impl Fn(FuncId) -> bool) -> bool {
        match &self.kind {
            ExprKind::Assign(..) | ExprKind::UnionGet(..) => true,
            ExprKind::Call { func, mode, .. } => *mode != CallMode::Normal || is_action_call(*func),
            ExprKind::CallDyn { .. } | ExprKind::CallSelf { .. } => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: ExprKind) -> Expr {
        Expr::new(kind, TypeId::from_index(0), None)
    }

    #[test]
    fn assign_and_union_get_have_side_effects() {
        let assign = leaf(ExprKind::Assign(ConstId::from_index(0), Box::new(leaf(ExprKind::LitInt(1)))));
        assert!(assign.has_side_effect(|_| false));

        let union_get = leaf(ExprKind::UnionGet(
            Box::new(leaf(ExprKind::LitInt(1))),
            TypeId::from_index(1),
            ConstId::from_index(0),
        ));
        assert!(union_get.has_side_effect(|_| false));
    }

    #[test]
    fn pure_literal_has_no_side_effect() {
        let lit = leaf(ExprKind::LitInt(42));
        assert!(!lit.has_side_effect(|_| false));
    }

    #[test]
    fn normal_call_to_action_has_side_effect() {
        let call = leaf(ExprKind::Call {
            func: FuncId::from_index(0),
            args: vec![],
            mode: CallMode::Normal,
        });
        assert!(call.has_side_effect(|_| true));
        assert!(!call.has_side_effect(|_| false));
    }
}
