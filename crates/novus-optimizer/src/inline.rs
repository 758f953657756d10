//! Call inlining (spec §4.5, point 4): inline non-recursive `User` calls.
//! The caller registers fresh locals (`__inlined_<n>_`-prefixed) for every
//! callee local, arguments become `Assign`s to those locals, the callee
//! body is cloned with its `ConstId`s remapped and appended, and the
//! resulting `Group` replaces the call.
//!
//! Recursion is rejected by two checks (spec): (a) a callee whose own body
//! contains a `CallSelf` is self-recursive and never inlined; (b) a callee
//! that can transitively reach the caller again through the static call
//! graph is rejected too, since inlining it would not reach a fixed point.

use rustc_hash::{FxHashMap, FxHashSet};

use novus_ir::{CallMode, ConstDeclTable, ConstId, Expr, ExprKind, FuncDef, FuncId, FuncKind, Program};

fn direct_calls(expr: &Expr, out: &mut FxHashSet<FuncId>, contains_call_self: &mut bool) {
    match &expr.kind {
        ExprKind::Call { func, args, .. } => {
            out.insert(*func);
            args.iter().for_each(|a| direct_calls(a, out, contains_call_self));
        }
        ExprKind::CallDyn { lhs, args, .. } => {
            direct_calls(lhs, out, contains_call_self);
            args.iter().for_each(|a| direct_calls(a, out, contains_call_self));
        }
        ExprKind::CallSelf { args } => {
            *contains_call_self = true;
            args.iter().for_each(|a| direct_calls(a, out, contains_call_self));
        }
        ExprKind::Assign(_, rhs) => direct_calls(rhs, out, contains_call_self),
        ExprKind::Group(items) => items.iter().for_each(|e| direct_calls(e, out, contains_call_self)),
        ExprKind::Field(target, _) => direct_calls(target, out, contains_call_self),
        ExprKind::UnionCheck(target, _) => direct_calls(target, out, contains_call_self),
        ExprKind::UnionGet(target, _, _) => direct_calls(target, out, contains_call_self),
        ExprKind::Switch { conditions, branches } => {
            conditions.iter().chain(branches.iter()).for_each(|e| direct_calls(e, out, contains_call_self));
        }
        ExprKind::Closure { bound_args, .. } => bound_args.iter().for_each(|e| direct_calls(e, out, contains_call_self)),
        _ => {}
    }
}

pub struct CallGraph {
    edges: FxHashMap<FuncId, FxHashSet<FuncId>>,
    self_recursive: FxHashSet<FuncId>,
}

impl CallGraph {
    fn build(program: &Program) -> Self {
        let mut edges = FxHashMap::default();
        let mut self_recursive = FxHashSet::default();
        for fid in program.defined_func_ids().collect::<Vec<_>>() {
            let def = program.func_def(fid).expect("id came from defined_func_ids");
            let mut callees = FxHashSet::default();
            let mut has_self = false;
            direct_calls(&def.body, &mut callees, &mut has_self);
            if has_self {
                self_recursive.insert(fid);
            }
            edges.insert(fid, callees);
        }
        CallGraph { edges, self_recursive }
    }

    fn can_reach(&self, from: FuncId, to: FuncId) -> bool {
        let mut seen = FxHashSet::default();
        let mut stack = vec![from];
        while let Some(f) = stack.pop() {
            if f == to {
                return true;
            }
            if !seen.insert(f) {
                continue;
            }
            if let Some(callees) = self.edges.get(&f) {
                stack.extend(callees.iter().copied());
            }
        }
        false
    }

    fn is_inlinable(&self, callee: FuncId, caller: FuncId) -> bool {
        !self.self_recursive.contains(&callee) && !self.can_reach(callee, caller)
    }
}

struct Remapper<'a> {
    map: &'a FxHashMap<ConstId, ConstId>,
}

impl Remapper<'_> {
    fn remap(&self, expr: &Expr) -> Expr {
        let kind = match &expr.kind {
            ExprKind::Const(id) => ExprKind::Const(*self.map.get(id).unwrap_or(id)),
            ExprKind::Assign(id, rhs) => ExprKind::Assign(*self.map.get(id).unwrap_or(id), Box::new(self.remap(rhs))),
            ExprKind::Group(items) => ExprKind::Group(items.iter().map(|e| self.remap(e)).collect()),
            ExprKind::Call { func, args, mode } => {
                ExprKind::Call { func: *func, args: args.iter().map(|e| self.remap(e)).collect(), mode: *mode }
            }
            ExprKind::CallDyn { lhs, args, fork } => {
                ExprKind::CallDyn { lhs: Box::new(self.remap(lhs)), args: args.iter().map(|e| self.remap(e)).collect(), fork: *fork }
            }
            ExprKind::CallSelf { args } => ExprKind::CallSelf { args: args.iter().map(|e| self.remap(e)).collect() },
            ExprKind::Field(target, fid) => ExprKind::Field(Box::new(self.remap(target)), *fid),
            ExprKind::UnionCheck(target, ty) => ExprKind::UnionCheck(Box::new(self.remap(target)), *ty),
            ExprKind::UnionGet(target, ty, cid) => {
                ExprKind::UnionGet(Box::new(self.remap(target)), *ty, *self.map.get(cid).unwrap_or(cid))
            }
            ExprKind::Switch { conditions, branches } => ExprKind::Switch {
                conditions: conditions.iter().map(|e| self.remap(e)).collect(),
                branches: branches.iter().map(|e| self.remap(e)).collect(),
            },
            ExprKind::Closure { func, bound_args } => {
                ExprKind::Closure { func: *func, bound_args: bound_args.iter().map(|e| self.remap(e)).collect() }
            }
            leaf => leaf.clone(),
        };
        Expr::new(kind, expr.ty, expr.source)
    }
}

/// Attempts to inline one `Call` node. `caller_consts` is the enclosing
/// function's constant table (grows by one entry per callee local); `caller`
/// identifies the enclosing function for the recursion check (`None` for an
/// exec statement, which can never be a recursion target since nothing
/// calls it).
fn try_inline(
    func: FuncId,
    args: &[Expr],
    program: &mut Program,
    graph: &CallGraph,
    caller: Option<FuncId>,
    caller_consts: &mut ConstDeclTable,
) -> Option<Expr> {
    if program.func_decl(func).kind != FuncKind::User {
        return None;
    }
    let callee_def = program.func_def(func)?.clone();
    if let Some(caller) = caller {
        if !graph.is_inlinable(func, caller) {
            return None;
        }
    } else if graph.self_recursive.contains(&func) {
        return None;
    }

    let prefix = program.next_inlined_prefix();
    let mut map = FxHashMap::default();
    let callee_ids: Vec<ConstId> = callee_def.consts.ids().collect();
    for &id in &callee_ids {
        let decl = callee_def.consts.get(id);
        let new_id = caller_consts.declare_local(format!("{prefix}{}", decl.name), decl.ty);
        map.insert(id, new_id);
    }

    let remapper = Remapper { map: &map };
    let prelude: Vec<Expr> = args
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            let local = *map.get(&callee_ids[i]).expect("input const was remapped above");
            Expr::new(ExprKind::Assign(local, Box::new(arg.clone())), arg.ty, arg.source)
        })
        .collect();
    let inlined_body = remapper.remap(&callee_def.body);

    // A `Group` must have >= 2 children (spec invariant); with no
    // arguments to pre-assign, splice the callee body in directly instead
    // of wrapping a singleton group around it.
    if prelude.is_empty() {
        return Some(inlined_body);
    }
    let result_ty = inlined_body.ty;
    let result_source = inlined_body.source;
    let mut elems = prelude;
    elems.push(inlined_body);
    Some(Expr::new(ExprKind::Group(elems), result_ty, result_source))
}

/// Bottom-up inlining pass over one expression tree.
pub fn run(expr: Expr, program: &mut Program, graph: &CallGraph, caller: Option<FuncId>, consts: &mut ConstDeclTable) -> (Expr, bool) {
    let Expr { kind, ty, source } = expr;
    let (kind, mut changed) = inline_children(kind, program, graph, caller, consts);

    if let ExprKind::Call { func, args, mode: CallMode::Normal } = &kind {
        if let Some(inlined) = try_inline(*func, args, program, graph, caller, consts) {
            changed = true;
            return (Expr::new(inlined.kind, ty, source), changed);
        }
    }
    (Expr::new(kind, ty, source), changed)
}

fn inline_children(
    kind: ExprKind,
    program: &mut Program,
    graph: &CallGraph,
    caller: Option<FuncId>,
    consts: &mut ConstDeclTable,
) -> (ExprKind, bool) {
    let mut changed = false;
    macro_rules! go {
        ($e:expr) => {{
            let (e2, c) = run($e, program, graph, caller, consts);
            changed |= c;
            e2
        }};
    }
    let kind = match kind {
        ExprKind::Assign(id, rhs) => ExprKind::Assign(id, Box::new(go!(*rhs))),
        ExprKind::Group(items) => ExprKind::Group(items.into_iter().map(|e| go!(e)).collect()),
        ExprKind::Call { func, args, mode } => ExprKind::Call { func, args: args.into_iter().map(|e| go!(e)).collect(), mode },
        ExprKind::CallDyn { lhs, args, fork } => {
            ExprKind::CallDyn { lhs: Box::new(go!(*lhs)), args: args.into_iter().map(|e| go!(e)).collect(), fork }
        }
        ExprKind::CallSelf { args } => ExprKind::CallSelf { args: args.into_iter().map(|e| go!(e)).collect() },
        ExprKind::Field(target, fid) => ExprKind::Field(Box::new(go!(*target)), fid),
        ExprKind::UnionCheck(target, ty) => ExprKind::UnionCheck(Box::new(go!(*target)), ty),
        ExprKind::UnionGet(target, ty, cid) => ExprKind::UnionGet(Box::new(go!(*target)), ty, cid),
        ExprKind::Switch { conditions, branches } => ExprKind::Switch {
            conditions: conditions.into_iter().map(|e| go!(e)).collect(),
            branches: branches.into_iter().map(|e| go!(e)).collect(),
        },
        ExprKind::Closure { func, bound_args } => ExprKind::Closure { func, bound_args: bound_args.into_iter().map(|e| go!(e)).collect() },
        leaf => leaf,
    };
    (kind, changed)
}

pub fn build_graph(program: &Program) -> CallGraph {
    CallGraph::build(program)
}
