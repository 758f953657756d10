//! Expression lowering: turns a parsed [`novus_parser::Expr`] into a
//! [`novus_ir::Expr`] against a function's in-progress [`ConstDeclTable`]
//! Grounded on the original compiler's `GetExpr` visitor: one recursive
//! `lower` method standing in for its `NodeVisitor` double-dispatch.

use novus_common::{DiagnosticKind, FileId, SourceId, SourceTable, Span};
use novus_ir::{
    CallMode, ConstDeclTable, Expr as IrExpr, ExprKind as IrKind, FuncDecl, FuncDef, FuncId, FuncKind, Operator, Primitives,
    TypeId, TypeKind, TypeSubstitutionTable,
};
use novus_parser::{Expr as PExpr, ExprKind as PKind, ItemKind as PItemKind, Param, TypeExpr};

use crate::context::AnalysisContext;
use crate::overload::{find_implicit_conv, resolve_overload, OverloadOptions};
use crate::type_resolve::resolve_type;

/// What the enclosing function (if any) is, for `self(...)` calls (spec
/// §4.4: "call-self requires an enclosing function with a known return type
/// and matching arity").
#[derive(Clone, Copy)]
pub struct SelfCallInfo {
    pub ret_type: Option<TypeId>,
    pub arity: usize,
}

pub struct GetExpr<'a> {
    pub ctx: &'a mut AnalysisContext,
    pub sources: &'a mut SourceTable,
    pub file: FileId,
    pub primitives: &'a Primitives,
    pub type_sub: Option<&'a TypeSubstitutionTable>,
    pub consts: &'a mut ConstDeclTable,
    pub self_call: Option<SelfCallInfo>,
}

impl<'a> GetExpr<'a> {
    fn loc(&mut self, span: Span) -> Option<SourceId> {
        Some(self.sources.intern_loc(self.file, span))
    }

    fn error(&mut self, kind: DiagnosticKind, span: Span) {
        let source = self.loc(span);
        self.ctx.error(kind, source);
    }

    fn error_expr(&mut self, span: Span) -> IrExpr {
        let source = self.loc(span);
        IrExpr::new(IrKind::LitInt(0), self.primitives.int, source)
    }

    fn type_name(&self, ty: TypeId) -> String {
        self.ctx.program.type_info(ty).name.clone()
    }

    fn resolve_type_expr(&mut self, texpr: &TypeExpr) -> Option<TypeId> {
        resolve_type(self.ctx, self.sources, self.type_sub, texpr, self.file)
    }

    /// Lower a sub-expression with no particular expected type.
    pub fn lower(&mut self, e: &PExpr) -> IrExpr {
        self.lower_with(e, false)
    }

    /// Lower a sub-expression that sits in "checked" position — the
    /// condition of a `Conditional`/`Switch`, or the left side of `&&`/`||`
    /// — the only place a bare `as T id` is allowed to bind a constant
    /// Bare `as T id` outside a checked context is an error.
    fn lower_checked(&mut self, e: &PExpr) -> IrExpr {
        self.lower_with(e, true)
    }

    fn lower_with(&mut self, e: &PExpr, checked: bool) -> IrExpr {
        match &e.kind {
            PKind::LitBool(b) => IrExpr::new(IrKind::LitBool(*b), self.primitives.bool_, self.loc(e.span)),
            PKind::LitInt(v) => IrExpr::new(IrKind::LitInt(*v), self.primitives.int, self.loc(e.span)),
            PKind::LitLong(v) => IrExpr::new(IrKind::LitLong(*v), self.primitives.long, self.loc(e.span)),
            PKind::LitFloat(v) => IrExpr::new(IrKind::LitFloat(*v), self.primitives.float, self.loc(e.span)),
            PKind::LitChar(c) => IrExpr::new(IrKind::LitChar(*c), self.primitives.char, self.loc(e.span)),
            PKind::LitString(s) => {
                let atom = self.ctx.program.interner_mut().intern(s);
                IrExpr::new(IrKind::LitString(atom), self.primitives.string, self.loc(e.span))
            }

            PKind::Ident(name) => self.lower_ident(name, e.span),
            PKind::Paren(inner) => self.lower_with(inner, checked),
            PKind::Group(items) => self.lower_group(items, e.span),

            PKind::Unary { op, operand } => self.lower_unary(*op, operand, e.span),
            PKind::Binary { op, lhs, rhs } => self.lower_binary(*op, lhs, rhs, e.span),
            PKind::LogicalAnd { lhs, rhs } => self.lower_logical(true, lhs, rhs, e.span),
            PKind::LogicalOr { lhs, rhs } => self.lower_logical(false, lhs, rhs, e.span),

            PKind::Fork(inner) => self.lower_fork_lazy(true, inner, e.span),
            PKind::Lazy(inner) => self.lower_fork_lazy(false, inner, e.span),

            PKind::Call { callee, type_args, args } => self.lower_call(callee, type_args, args, e.span),
            PKind::CallDyn { target, args } => self.lower_call_dyn(target, args, e.span),

            PKind::Index { target, index } => self.lower_index(target, index, e.span),
            PKind::Field { target, name } => self.lower_field(target, name, e.span),
            PKind::ConstDecl { name, value } => self.lower_const_decl(name, value, e.span),
            PKind::Conditional { cond, if_true, if_false } => {
                self.lower_conditional(cond, if_true, if_false, e.span)
            }
            PKind::Switch { conditions, branches } => self.lower_switch(conditions, branches, e.span),
            PKind::Is { target, ty } => self.lower_is(target, ty, e.span),
            PKind::As { target, ty, bind } => self.lower_as(target, ty, bind.as_deref(), checked, e.span),
            PKind::Lambda { params, ret, is_action, body } => {
                self.lower_lambda(params, ret.as_ref(), *is_action, body, e.span)
            }

            PKind::Error(_) => self.error_expr(e.span),
        }
    }

    // -- identifiers -----------------------------------------------------

    /// A bare identifier is never a call — the parser only ever produces
    /// `Call{callee, args}` for `name(...)`, reserving plain `Ident` for
    /// `name` on its own (`parse_ident_or_call`) — so a name that resolves
    /// to a declared function references it as a value (a `LitFunc`), the
    /// same as passing it to a `func{...}`-typed parameter without calling
    /// it. With no type hint threaded through this visitor to disambiguate
    /// same-named overloads by the expected delegate signature, more than
    /// one candidate is unconditionally `AmbiguousFunction` rather than
    /// picked by context.
    fn lower_ident(&mut self, name: &str, span: Span) -> IrExpr {
        if let Some(id) = self.consts.find(name) {
            let ty = self.consts.get(id).ty;
            return IrExpr::new(IrKind::Const(id), ty, self.loc(span));
        }
        let candidates = self.ctx.program.funcs_named(name).to_vec();
        match candidates.as_slice() {
            [] => {
                self.error(DiagnosticKind::UndeclaredConst { name: name.to_string() }, span);
                self.error_expr(span)
            }
            [fid] => {
                let fid = *fid;
                let ty = self.func_delegate_type(fid);
                IrExpr::new(IrKind::LitFunc(fid), ty, self.loc(span))
            }
            _ => {
                self.error(DiagnosticKind::AmbiguousFunction { name: name.to_string() }, span);
                self.error_expr(span)
            }
        }
    }

    // -- groups ------------------------------------------------------------

    fn lower_group(&mut self, items: &[PExpr], span: Span) -> IrExpr {
        let mut lowered = Vec::with_capacity(items.len());
        for item in items {
            lowered.push(self.lower(item));
        }
        let ty = lowered.last().map(IrExpr::get_type).unwrap_or(self.primitives.int);
        IrExpr::new(IrKind::Group(lowered), ty, self.loc(span))
    }

    // -- operators -----------------------------------------------------------

    fn lower_unary(&mut self, op: Operator, operand: &PExpr, span: Span) -> IrExpr {
        let operand = self.lower(operand);
        let name = op.func_name();
        let candidates = self.ctx.program.funcs_named(name).to_vec();
        let operand_ty = operand.get_type();
        match resolve_overload(&self.ctx.program, &candidates, &[operand_ty], OverloadOptions::default()) {
            crate::overload::OverloadResult::Found(fid) => self.build_call(fid, vec![operand], span),
            crate::overload::OverloadResult::Ambiguous => {
                self.error(DiagnosticKind::AmbiguousFunction { name: name.to_string() }, span);
                self.error_expr(span)
            }
            crate::overload::OverloadResult::NoMatch => {
                self.error(
                    DiagnosticKind::UndeclaredUnaryOperator {
                        name: operator_symbol(op).to_string(),
                        operand_type: self.type_name(operand_ty),
                    },
                    span,
                );
                self.error_expr(span)
            }
        }
    }

    fn lower_binary(&mut self, op: Operator, lhs: &PExpr, rhs: &PExpr, span: Span) -> IrExpr {
        // `E::a` where `E` names a declared enum is not an operator call at
        // all; it looks up an entry value directly.
        if op == Operator::ColonColon {
            if let (PKind::Ident(enum_name), PKind::Ident(entry_name)) = (&lhs.kind, &rhs.kind) {
                if let Some(enum_ty) = self.ctx.program.find_type_by_name(enum_name) {
                    if let TypeKind::Enum(def) = &self.ctx.program.type_info(enum_ty).kind {
                        if let Some(value) = def.value_of(entry_name) {
                            return IrExpr::new(IrKind::LitEnum(enum_ty, value), enum_ty, self.loc(span));
                        }
                        self.error(
                            DiagnosticKind::ValueNotFoundInEnum {
                                entry_name: entry_name.clone(),
                                enum_name: enum_name.clone(),
                            },
                            span,
                        );
                        return self.error_expr(span);
                    }
                }
            }
        }

        let lhs_e = self.lower(lhs);
        let rhs_e = self.lower(rhs);
        let name = op.func_name();
        let candidates = self.ctx.program.funcs_named(name).to_vec();
        let arg_types = [lhs_e.get_type(), rhs_e.get_type()];
        match resolve_overload(&self.ctx.program, &candidates, &arg_types, OverloadOptions::default()) {
            crate::overload::OverloadResult::Found(fid) => self.build_call(fid, vec![lhs_e, rhs_e], span),
            crate::overload::OverloadResult::Ambiguous => {
                self.error(DiagnosticKind::AmbiguousFunction { name: name.to_string() }, span);
                self.error_expr(span)
            }
            crate::overload::OverloadResult::NoMatch => {
                self.error(
                    DiagnosticKind::UndeclaredBinOperator {
                        name: operator_symbol(op).to_string(),
                        lhs_type: self.type_name(arg_types[0]),
                        rhs_type: self.type_name(arg_types[1]),
                    },
                    span,
                );
                self.error_expr(span)
            }
        }
    }

    /// `a && b` / `a || b` lower to a 1-condition `Switch` so short-circuit
    /// evaluation falls naturally out of `Switch`'s own semantics (spec
    /// §4.4).
    fn lower_logical(&mut self, is_and: bool, lhs: &PExpr, rhs: &PExpr, span: Span) -> IrExpr {
        let lhs_e = self.coerce_to_bool(self.lower_checked(lhs), lhs.span);
        let rhs_e = self.coerce_to_bool(self.lower(rhs), rhs.span);
        let source = self.loc(span);
        let (if_true, if_false) = if is_and {
            (rhs_e, IrExpr::new(IrKind::LitBool(false), self.primitives.bool_, None))
        } else {
            (IrExpr::new(IrKind::LitBool(true), self.primitives.bool_, None), rhs_e)
        };
        IrExpr::new(
            IrKind::Switch {
                conditions: vec![lhs_e],
                branches: vec![if_true, if_false],
            },
            self.primitives.bool_,
            source,
        )
    }

    fn coerce_to_bool(&mut self, expr: IrExpr, span: Span) -> IrExpr {
        self.convert_to(expr, self.primitives.bool_, span)
    }

    /// Insert an implicit conversion if `expr`'s type doesn't already match
    /// `to`, diagnosing if none exists. Reused for every "must be this type"
    /// check rather than adding a dedicated non-bool-condition diagnostic kind.
    fn convert_to(&mut self, expr: IrExpr, to: TypeId, span: Span) -> IrExpr {
        if expr.get_type() == to {
            return expr;
        }
        match find_implicit_conv(&self.ctx.program, expr.get_type(), to) {
            Some(conv) => self.build_call(conv, vec![expr], span),
            None => {
                self.error(
                    DiagnosticKind::NoImplicitConversionFound {
                        from: self.type_name(expr.get_type()),
                        to: self.type_name(to),
                    },
                    span,
                );
                self.error_expr(span)
            }
        }
    }

    /// Reconcile a function body's lowered type against its declared
    /// return type: an exact match or a one-step implicit conversion pass
    /// silently, anything else is `NonMatchingFuncReturnType` rather than
    /// the generic `NoImplicitConversionFound` [`Self::convert_to`] would
    /// raise — functions get their own message naming the declaring
    /// function (spec §4.4 pass 6).
    pub fn finish_func_body(&mut self, body: IrExpr, declared: TypeId, name: &str, span: Span) -> IrExpr {
        if body.get_type() == declared {
            return body;
        }
        match find_implicit_conv(&self.ctx.program, body.get_type(), declared) {
            Some(conv) => self.build_call(conv, vec![body], span),
            None => {
                let declared_type = self.type_name(declared);
                let returned_type = self.type_name(body.get_type());
                self.error(
                    DiagnosticKind::NonMatchingFuncReturnType { name: name.to_string(), declared_type, returned_type },
                    span,
                );
                self.error_expr(span)
            }
        }
    }

    // -- fork / lazy -----------------------------------------------------

    fn lower_fork_lazy(&mut self, is_fork: bool, inner: &PExpr, span: Span) -> IrExpr {
        let lowered = self.lower(inner);
        let IrKind::Call { func, args, .. } = &lowered.kind else {
            self.error(
                if is_fork { DiagnosticKind::ForkedNonUserFunc } else { DiagnosticKind::LazyNonUserFunc },
                span,
            );
            return self.error_expr(span);
        };
        let decl = self.ctx.program.func_decl(*func).clone();
        if !matches!(decl.kind, FuncKind::User) {
            self.error(
                if is_fork { DiagnosticKind::ForkedNonUserFunc } else { DiagnosticKind::LazyNonUserFunc },
                span,
            );
            return self.error_expr(span);
        }
        let mode = if is_fork { CallMode::Fork } else { CallMode::Lazy };
        let ty = if is_fork {
            self.ctx.program.future_type(decl.output)
        } else {
            self.ctx.program.lazy_type(decl.output, decl.is_action)
        };
        let source = self.loc(span);
        IrExpr::new(
            IrKind::Call {
                func: *func,
                args: args.clone(),
                mode,
            },
            ty,
            source,
        )
    }

    // -- calls -------------------------------------------------------------

    fn lower_call(&mut self, callee: &str, type_args: &[TypeExpr], args: &[PExpr], span: Span) -> IrExpr {
        if let Some(name) = callee.strip_prefix("intrinsic{").and_then(|s| s.strip_suffix('}')) {
            return self.lower_intrinsic_call(name, args, span);
        }
        if callee == "self" {
            return self.lower_self_call(args, span);
        }

        // `Name{T1,T2}(args)` is ambiguous at the grammar level between a
        // templated type's constructor and a templated function call; the
        // parser never tells the two apart, so check which `Name` actually
        // names before resolving type arguments down either path.
        if !type_args.is_empty() {
            let names_a_type =
                self.ctx.program.find_type_by_name(callee).is_some() || self.ctx.type_template_items.contains_key(callee);
            if names_a_type {
                let texpr = TypeExpr {
                    name: callee.to_string(),
                    type_params: type_args.to_vec(),
                    span,
                };
                if let Some(ty) = self.resolve_type_expr(&texpr) {
                    return self.lower_constructor(ty, args, span);
                }
                return self.error_expr(span);
            }
            if self.ctx.func_template_items.contains_key(callee) {
                let mut resolved_targs = Vec::with_capacity(type_args.len());
                for t in type_args {
                    let Some(ty) = self.resolve_type_expr(t) else {
                        return self.error_expr(span);
                    };
                    resolved_targs.push(ty);
                }
                if let Some(fid) = self.instantiate_func_template(callee, &resolved_targs, args.len(), span) {
                    let lowered_args: Vec<IrExpr> = args.iter().map(|a| self.lower(a)).collect();
                    return self.build_call(fid, lowered_args, span);
                }
                return self.error_expr(span);
            }
            self.error(
                DiagnosticKind::UndeclaredType {
                    name: callee.to_string(),
                    type_params: type_args.len() as u32,
                },
                span,
            );
            return self.error_expr(span);
        }
        if let Some(ty) = self.ctx.program.find_type_by_name(callee) {
            return self.lower_constructor(ty, args, span);
        }

        let lowered_args: Vec<IrExpr> = args.iter().map(|a| self.lower(a)).collect();
        let candidates = self.ctx.program.funcs_named(callee).to_vec();
        self.resolve_and_call(callee, candidates, lowered_args, span, false)
    }

    fn lower_call_dyn(&mut self, target: &PExpr, args: &[PExpr], span: Span) -> IrExpr {
        let target_e = self.lower(target);
        let lowered_args: Vec<IrExpr> = args.iter().map(|a| self.lower(a)).collect();
        let kind = self.ctx.program.type_info(target_e.get_type()).kind.clone();
        match kind {
            TypeKind::Delegate(def) => {
                if def.input.len() != lowered_args.len() {
                    self.error(DiagnosticKind::IncorrectArgsToDelegate, span);
                    return self.error_expr(span);
                }
                let ty = def.output;
                let source = self.loc(span);
                IrExpr::new(
                    IrKind::CallDyn {
                        lhs: Box::new(target_e),
                        args: lowered_args,
                        fork: false,
                    },
                    ty,
                    source,
                )
            }
            _ => {
                self.error(DiagnosticKind::IllegalDelegateCall, span);
                self.error_expr(span)
            }
        }
    }

    fn lower_self_call(&mut self, args: &[PExpr], span: Span) -> IrExpr {
        let Some(info) = self.self_call else {
            self.error(DiagnosticKind::SelfCallInNonFunc, span);
            return self.error_expr(span);
        };
        let Some(ret_type) = info.ret_type else {
            self.error(DiagnosticKind::SelfCallWithoutInferredRetType, span);
            return self.error_expr(span);
        };
        let lowered_args: Vec<IrExpr> = args.iter().map(|a| self.lower(a)).collect();
        if lowered_args.len() != info.arity {
            self.error(
                DiagnosticKind::IncorrectNumArgsInSelfCall {
                    expected: info.arity as u32,
                    actual: lowered_args.len() as u32,
                },
                span,
            );
            return self.error_expr(span);
        }
        let source = self.loc(span);
        IrExpr::new(IrKind::CallSelf { args: lowered_args }, ret_type, source)
    }

    fn lower_constructor(&mut self, ty: TypeId, args: &[PExpr], span: Span) -> IrExpr {
        let kind = self.ctx.program.type_info(ty).kind.clone();
        match kind {
            TypeKind::Struct(def) => {
                let field_tys: Vec<TypeId> = def.fields.iter().map(|(_, _, t)| t).collect();
                let name = self.type_name(ty);
                if args.len() != field_tys.len() {
                    self.error(
                        DiagnosticKind::UndeclaredTypeOrConversion {
                            name,
                            arg_types: args.iter().map(|a| self.lower(a)).map(|e| self.type_name(e.get_type())).collect(),
                        },
                        span,
                    );
                    return self.error_expr(span);
                }
                let mut lowered = Vec::with_capacity(args.len());
                for (arg, field_ty) in args.iter().zip(field_tys.iter()) {
                    let e = self.lower(arg);
                    lowered.push(self.convert_to(e, *field_ty, arg.span));
                }
                let candidates: Vec<FuncId> = self
                    .ctx
                    .program
                    .funcs_named(&name)
                    .iter()
                    .copied()
                    .filter(|&id| matches!(self.ctx.program.func_decl(id).kind, FuncKind::MakeStruct))
                    .collect();
                self.resolve_and_call(&name, candidates, lowered, span, true)
            }
            TypeKind::Union(def) => {
                if args.len() != 1 {
                    self.error(DiagnosticKind::InvalidTypeInstantiation, span);
                    return self.error_expr(span);
                }
                let inner = self.lower(&args[0]);
                if !def.contains(inner.get_type()) {
                    self.error(
                        DiagnosticKind::TypeNotPartOfUnion {
                            type_name: self.type_name(inner.get_type()),
                            union_name: self.type_name(ty),
                        },
                        span,
                    );
                    return self.error_expr(span);
                }
                IrExpr::new(inner.kind, ty, inner.source)
            }
            _ => {
                let name = self.type_name(ty);
                let lowered_args: Vec<IrExpr> = args.iter().map(|a| self.lower(a)).collect();
                let candidates = self.ctx.program.funcs_named(&name).to_vec();
                self.resolve_and_call(&name, candidates, lowered_args, span, false)
            }
        }
    }

    /// Shared overload-resolution tail for every named-call site: operator
    /// lowering builds its candidate list inline (exact arity known up
    /// front), while identifier/call-name lookups funnel through here.
    fn resolve_and_call(
        &mut self,
        name: &str,
        candidates: Vec<FuncId>,
        args: Vec<IrExpr>,
        span: Span,
        is_constructor: bool,
    ) -> IrExpr {
        let arg_types: Vec<TypeId> = args.iter().map(IrExpr::get_type).collect();
        match resolve_overload(&self.ctx.program, &candidates, &arg_types, OverloadOptions::default()) {
            crate::overload::OverloadResult::Found(fid) => self.build_call(fid, args, span),
            crate::overload::OverloadResult::Ambiguous => {
                self.error(DiagnosticKind::AmbiguousFunction { name: name.to_string() }, span);
                self.error_expr(span)
            }
            crate::overload::OverloadResult::NoMatch => {
                let arg_type_names = arg_types.iter().map(|t| self.type_name(*t)).collect();
                let kind = if is_constructor {
                    DiagnosticKind::UndeclaredTypeOrConversion { name: name.to_string(), arg_types: arg_type_names }
                } else {
                    DiagnosticKind::UndeclaredFuncOrAction { name: name.to_string(), arg_types: arg_type_names }
                };
                self.error(kind, span);
                self.error_expr(span)
            }
        }
    }

    /// Insert positional implicit conversions for the args actually
    /// supplied (optional-argument initializers are patched in later by
    /// a later pass), then build the `Call` node.
    fn build_call(&mut self, fid: FuncId, args: Vec<IrExpr>, span: Span) -> IrExpr {
        let decl: FuncDecl = self.ctx.program.func_decl(fid).clone();
        let mut final_args = Vec::with_capacity(args.len());
        for (i, arg) in args.into_iter().enumerate() {
            let param_ty = decl.input.0[i];
            final_args.push(self.convert_to(arg, param_ty, span));
        }
        let source = self.loc(span);
        IrExpr::new(
            IrKind::Call {
                func: fid,
                args: final_args,
                mode: CallMode::Normal,
            },
            decl.output,
            source,
        )
    }

    /// Instantiate a function template for an explicit type-argument list,
    /// the same declare-then-define order
    /// [`crate::type_resolve::resolve_type`] uses for type templates: a
    /// placeholder `FuncDecl` goes in (and gets cached) before the body is
    /// lowered, so a self-recursive template body resolves its own call
    /// through the ordinary self-call / declared-function path.
    ///
    /// Only the explicit-type-argument call form is supported — unlike the
    /// original compiler, this does not infer `T` from argument types for a
    /// bare `name(args)` against a templated declaration; such a call falls
    /// through to plain overload resolution and fails as an undeclared
    /// function if no non-templated overload matches.
    fn instantiate_func_template(&mut self, name: &str, type_params: &[TypeId], arg_count: usize, span: Span) -> Option<FuncId> {
        let candidates = self.ctx.func_template_items.get(name)?.clone();
        let mut matches = candidates.iter().enumerate().filter(|(_, (_, item))| {
            matches!(&item.kind, PItemKind::Func { type_params: tp, params, .. }
                if tp.len() == type_params.len() && params.len() == arg_count)
        });
        let Some((idx, (decl_file, item))) = matches.next() else {
            self.error(
                DiagnosticKind::NoFuncOrActionFoundToInstantiate {
                    name: name.to_string(),
                    template_param_count: type_params.len() as u32,
                },
                span,
            );
            return None;
        };
        if matches.next().is_some() {
            self.error(
                DiagnosticKind::AmbiguousTemplateFunction {
                    name: name.to_string(),
                    template_param_count: type_params.len() as u32,
                },
                span,
            );
            return None;
        }
        let decl_file = *decl_file;
        let PItemKind::Func {
            type_params: param_names,
            params,
            ret,
            is_action,
            body,
            ..
        } = &item.kind
        else {
            unreachable!("filtered to Func items above")
        };

        if let Some(fid) = self
            .ctx
            .program
            .func_templates()
            .candidates(name)
            .get(idx)
            .and_then(|t| t.instance(type_params))
        {
            return Some(fid);
        }

        let mut subst = TypeSubstitutionTable::new();
        for (pname, ty) in param_names.iter().zip(type_params.iter()) {
            subst.bind(pname.clone(), *ty);
        }

        let mut input_tys = Vec::with_capacity(params.len());
        for p in params {
            input_tys.push(resolve_type(self.ctx, self.sources, Some(&subst), &p.ty, decl_file)?);
        }
        let declared_ret = match ret {
            Some(texpr) => resolve_type(self.ctx, self.sources, Some(&subst), texpr, decl_file),
            None => None,
        };
        let mangled = crate::type_resolve::mangle_name(self.ctx, name, type_params);
        let opt_count = params.iter().filter(|p| p.default.is_some()).count() as u32;
        let placeholder_output = declared_ret.unwrap_or(self.primitives.int);
        let arity = params.len();
        let is_action = *is_action;
        let param_names_only: Vec<String> = params.iter().map(|p| p.name.clone()).collect();
        let body = body.clone();

        let fid = self.ctx.program.declare_func(|id| FuncDecl {
            id,
            name: mangled,
            kind: FuncKind::User,
            input: novus_ir::TypeSet::new(input_tys.clone()),
            output: placeholder_output,
            opt_input_count: opt_count,
            is_implicit_conv: false,
            is_action,
        });
        self.ctx
            .program
            .func_templates_mut()
            .candidates_mut(name)
            .expect("template declared before instantiation")
            .get_mut(idx)
            .expect("candidate index stable across declare and instantiate")
            .cache_instance(type_params.to_vec(), fid);

        let mut consts = ConstDeclTable::new();
        for (pname, ty) in param_names_only.into_iter().zip(input_tys.iter()) {
            consts.declare_input(pname, *ty);
        }

        let body_e = {
            let mut inner = GetExpr {
                ctx: &mut *self.ctx,
                sources: &mut *self.sources,
                file: decl_file,
                primitives: self.primitives,
                type_sub: Some(&subst),
                consts: &mut consts,
                self_call: Some(SelfCallInfo { ret_type: declared_ret, arity }),
            };
            inner.lower(&body)
        };

        let final_body = match declared_ret {
            Some(declared) => self.finish_func_body(body_e, declared, name, body.span),
            None => body_e,
        };
        let final_output = final_body.get_type();
        self.ctx.program.set_func_output(fid, final_output);
        self.ctx.program.define_func(FuncDef {
            id: fid,
            consts,
            body: final_body,
            opt_arg_initializers: Vec::new(),
        });
        Some(fid)
    }

    // -- index / field -----------------------------------------------------

    fn lower_index(&mut self, target: &PExpr, index: &PExpr, span: Span) -> IrExpr {
        let target_e = self.lower(target);
        let index_e = self.lower(index);
        let name = Operator::SquareSquare.func_name();
        let candidates = self.ctx.program.funcs_named(name).to_vec();
        let arg_types = [target_e.get_type(), index_e.get_type()];
        match resolve_overload(&self.ctx.program, &candidates, &arg_types, OverloadOptions::default()) {
            crate::overload::OverloadResult::Found(fid) => self.build_call(fid, vec![target_e, index_e], span),
            crate::overload::OverloadResult::Ambiguous => {
                self.error(DiagnosticKind::AmbiguousFunction { name: name.to_string() }, span);
                self.error_expr(span)
            }
            crate::overload::OverloadResult::NoMatch => {
                self.error(
                    DiagnosticKind::UndeclaredIndexOperator {
                        arg_types: arg_types.iter().map(|t| self.type_name(*t)).collect(),
                    },
                    span,
                );
                self.error_expr(span)
            }
        }
    }

    fn lower_field(&mut self, target: &PExpr, name: &str, span: Span) -> IrExpr {
        let target_e = self.lower(target);
        let target_ty = target_e.get_type();
        let TypeKind::Struct(def) = &self.ctx.program.type_info(target_ty).kind else {
            self.error(
                DiagnosticKind::FieldNotFoundOnType {
                    field_name: name.to_string(),
                    type_name: self.type_name(target_ty),
                },
                span,
            );
            return self.error_expr(span);
        };
        let Some((field_id, field_ty)) = def.fields.get(name) else {
            self.error(
                DiagnosticKind::FieldNotFoundOnType {
                    field_name: name.to_string(),
                    type_name: self.type_name(target_ty),
                },
                span,
            );
            return self.error_expr(span);
        };
        let source = self.loc(span);
        IrExpr::new(IrKind::Field(Box::new(target_e), field_id), field_ty, source)
    }

    // -- const decl ----------------------------------------------------------

    fn lower_const_decl(&mut self, name: &str, value: &PExpr, span: Span) -> IrExpr {
        if self.ctx.program.find_type_by_name(name).is_some() {
            self.error(DiagnosticKind::ConstNameConflictsWithType { name: name.to_string() }, span);
        }
        if let Some(subst) = self.type_sub {
            if subst.get(name).is_some() {
                self.error(DiagnosticKind::ConstNameConflictsWithTypeSubstitution { name: name.to_string() }, span);
            }
        }
        let value_e = self.lower(value);
        let ty = value_e.get_type();
        let id = self.consts.declare_local(name.to_string(), ty);
        let source = self.loc(span);
        IrExpr::new(IrKind::Assign(id, Box::new(value_e)), ty, source)
    }

    // -- conditional / switch ------------------------------------------------

    fn lower_conditional(&mut self, cond: &PExpr, if_true: &PExpr, if_false: &PExpr, span: Span) -> IrExpr {
        self.lower_switch_like(std::slice::from_ref(cond), &[if_true.clone(), if_false.clone()], span)
    }

    fn lower_switch(&mut self, conditions: &[PExpr], branches: &[PExpr], span: Span) -> IrExpr {
        self.lower_switch_like(conditions, branches, span)
    }

    fn lower_switch_like(&mut self, conditions: &[PExpr], branches: &[PExpr], span: Span) -> IrExpr {
        let bool_ty = self.primitives.bool_;
        let mut ir_conditions = Vec::with_capacity(conditions.len());
        for c in conditions {
            let lowered = self.lower_checked(c);
            ir_conditions.push(self.convert_to(lowered, bool_ty, c.span));
        }
        let mut ir_branches: Vec<IrExpr> = branches.iter().map(|b| self.lower(b)).collect();

        let common_ty = ir_branches[0].get_type();
        let all_same = ir_branches.iter().all(|b| b.get_type() == common_ty);
        let result_ty = if all_same {
            common_ty
        } else {
            // Try converting every branch to the first branch's type; if
            // any can't, there's no common type.
            let mut ok = true;
            for b in ir_branches.iter() {
                if b.get_type() != common_ty && find_implicit_conv(&self.ctx.program, b.get_type(), common_ty).is_none() {
                    ok = false;
                    break;
                }
            }
            if !ok {
                self.error(DiagnosticKind::BranchesHaveNoCommonType, span);
                self.primitives.int
            } else {
                common_ty
            }
        };
        if !all_same {
            for (b, branch_span) in ir_branches.iter_mut().zip(branches.iter().map(|b| b.span)) {
                if b.get_type() != result_ty {
                    let taken = std::mem::replace(b, self.error_expr(branch_span));
                    *b = self.convert_to(taken, result_ty, branch_span);
                }
            }
        }

        let source = self.loc(span);
        IrExpr::new(
            IrKind::Switch {
                conditions: ir_conditions,
                branches: ir_branches,
            },
            result_ty,
            source,
        )
    }

    // -- is / as -------------------------------------------------------------

    fn lower_is(&mut self, target: &PExpr, ty: &TypeExpr, span: Span) -> IrExpr {
        let target_e = self.lower(target);
        let Some(check_ty) = self.resolve_type_expr(ty) else {
            return self.error_expr(span);
        };
        if !self.is_union_member(target_e.get_type(), check_ty) {
            self.error(DiagnosticKind::NonUnionIsExpression, span);
            return self.error_expr(span);
        }
        let source = self.loc(span);
        IrExpr::new(IrKind::UnionCheck(Box::new(target_e), check_ty), self.primitives.bool_, source)
    }

    fn lower_as(&mut self, target: &PExpr, ty: &TypeExpr, bind: Option<&str>, checked: bool, span: Span) -> IrExpr {
        let target_e = self.lower(target);
        let Some(check_ty) = self.resolve_type_expr(ty) else {
            return self.error_expr(span);
        };
        if !self.is_union_member(target_e.get_type(), check_ty) {
            self.error(DiagnosticKind::NonUnionIsExpression, span);
            return self.error_expr(span);
        }
        let Some(name) = bind else {
            let source = self.loc(span);
            return IrExpr::new(IrKind::UnionCheck(Box::new(target_e), check_ty), self.primitives.bool_, source);
        };
        if !checked {
            self.error(DiagnosticKind::UncheckedAsExpressionWithConst, span);
        }
        let id = self.consts.declare_local(name.to_string(), check_ty);
        let source = self.loc(span);
        IrExpr::new(IrKind::UnionGet(Box::new(target_e), check_ty, id), self.primitives.bool_, source)
    }

    fn is_union_member(&self, target_ty: TypeId, member_ty: TypeId) -> bool {
        match &self.ctx.program.type_info(target_ty).kind {
            TypeKind::Union(def) => def.contains(member_ty),
            _ => false,
        }
    }

    // -- lambda --------------------------------------------------------------

    fn lower_lambda(&mut self, params: &[Param], ret: Option<&TypeExpr>, is_action: bool, body: &PExpr, span: Span) -> IrExpr {
        let mut free = Vec::new();
        let mut bound: std::collections::HashSet<String> = params.iter().map(|p| p.name.clone()).collect();
        collect_free_idents(body, &mut bound, &mut free);

        let mut captured_ids = Vec::new();
        let mut captured_exprs = Vec::new();
        for name in &free {
            if let Some(id) = self.consts.find(name) {
                let ty = self.consts.get(id).ty;
                captured_ids.push((name.clone(), ty));
                captured_exprs.push(IrExpr::new(IrKind::Const(id), ty, None));
            }
        }

        let mut param_tys = Vec::with_capacity(params.len());
        for p in params {
            match self.resolve_type_expr(&p.ty) {
                Some(ty) => param_tys.push(ty),
                None => param_tys.push(self.primitives.int),
            }
        }
        let declared_ret = ret.and_then(|t| self.resolve_type_expr(t));

        let mut inner_consts = ConstDeclTable::new();
        for (name, ty) in &captured_ids {
            inner_consts.declare_input(name.clone(), *ty);
        }
        for (p, ty) in params.iter().zip(param_tys.iter()) {
            inner_consts.declare_input(p.name.clone(), *ty);
        }

        // Lower the body before declaring the function so its actual return
        // type is known up front (the `Program` API has no way to patch a
        // `FuncDecl`'s output after the fact). Self-calls are disallowed
        // inside a lambda body (`self_call: None`), so nothing here needs
        // `fid` to already exist.
        let body_e = {
            let mut inner = GetExpr {
                ctx: &mut *self.ctx,
                sources: &mut *self.sources,
                file: self.file,
                primitives: self.primitives,
                type_sub: self.type_sub,
                consts: &mut inner_consts,
                self_call: None,
            };
            inner.lower(body)
        };

        if let Some(declared) = declared_ret {
            if body_e.get_type() != declared {
                self.error(
                    DiagnosticKind::NonMatchingFuncReturnType {
                        name: "<lambda>".to_string(),
                        declared_type: self.type_name(declared),
                        returned_type: self.type_name(body_e.get_type()),
                    },
                    span,
                );
            }
        }
        let actual_output = body_e.get_type();

        let func_name = self.ctx.program.next_anon_name();
        let mut full_input: Vec<TypeId> = captured_ids.iter().map(|(_, t)| *t).collect();
        full_input.extend(param_tys.iter().copied());
        let fid = self.ctx.program.declare_func(|id| FuncDecl {
            id,
            name: func_name,
            kind: FuncKind::User,
            input: novus_ir::TypeSet::new(full_input),
            output: actual_output,
            opt_input_count: 0,
            is_implicit_conv: false,
            is_action,
        });
        self.ctx.program.define_func(novus_ir::FuncDef {
            id: fid,
            consts: inner_consts,
            body: body_e,
            opt_arg_initializers: Vec::new(),
        });

        let source = self.loc(span);
        if captured_exprs.is_empty() {
            IrExpr::new(IrKind::LitFunc(fid), self.func_delegate_type(fid), source)
        } else {
            let ty = self.func_delegate_type(fid);
            IrExpr::new(
                IrKind::Closure {
                    func: fid,
                    bound_args: captured_exprs,
                },
                ty,
                source,
            )
        }
    }

    /// The delegate type describing a function's *remaining* (uncaptured)
    /// signature, used as an anon-function-literal's expression type.
    fn func_delegate_type(&mut self, fid: FuncId) -> TypeId {
        let decl = self.ctx.program.func_decl(fid).clone();
        self.ctx.program.delegate_type(decl.input.0.clone(), decl.output, decl.is_action)
    }

    // -- intrinsics ------------------------------------------------------

    fn lower_intrinsic_call(&mut self, name: &str, args: &[PExpr], span: Span) -> IrExpr {
        use novus_ir::IntrinsicOp;
        let lowered_args: Vec<IrExpr> = args.iter().map(|a| self.lower(a)).collect();
        let (op, output) = match name {
            "fail" => {
                // `fail{T}()` has no args; `T` comes from the enclosing
                // type hint, which this visitor doesn't thread through
                // call sites — default to the enclosing self-call's
                // return type when known, else `int`.
                let ty = self.self_call.and_then(|s| s.ret_type).unwrap_or(self.primitives.int);
                let fid = self.ctx.program.fail_func(ty);
                return self.build_call(fid, lowered_args, span);
            }
            "type_name" => (IntrinsicOp::ReflectTypeName, self.primitives.string),
            "source_loc_file" => (IntrinsicOp::SourceLocFile, self.primitives.string),
            "source_loc_line" => (IntrinsicOp::SourceLocLine, self.primitives.int),
            "source_loc_column" => (IntrinsicOp::SourceLocColumn, self.primitives.int),
            "staticint_to_int" => (IntrinsicOp::StaticIntToInt, self.primitives.int),
            _ => {
                self.error(
                    DiagnosticKind::UnknownIntrinsic {
                        name: name.to_string(),
                        pure_only: false,
                        arg_types: lowered_args.iter().map(|a| self.type_name(a.get_type())).collect(),
                    },
                    span,
                );
                return self.error_expr(span);
            }
        };
        let input: Vec<TypeId> = lowered_args.iter().map(IrExpr::get_type).collect();
        let fid = self.ctx.program.declare_func(|id| FuncDecl {
            id,
            name: format!("intrinsic{{{name}}}"),
            kind: FuncKind::Intrinsic(op),
            input: novus_ir::TypeSet::new(input),
            output,
            opt_input_count: 0,
            is_implicit_conv: false,
            is_action: false,
        });
        let source = self.loc(span);
        IrExpr::new(
            IrKind::Call {
                func: fid,
                args: lowered_args,
                mode: CallMode::Normal,
            },
            output,
            source,
        )
    }
}

fn operator_symbol(op: Operator) -> &'static str {
    use Operator::*;
    match op {
        Plus => "+",
        PlusPlus => "++",
        Minus => "-",
        MinusMinus => "--",
        Star => "*",
        Slash => "/",
        Rem => "%",
        Amp => "&",
        Pipe => "|",
        ShiftL => "<<",
        ShiftR => ">>",
        Hat => "^",
        Tilde => "~",
        EqEq => "==",
        Bang => "!",
        BangEq => "!=",
        Le => "<",
        LeEq => "<=",
        Gt => ">",
        GtEq => ">=",
        ColonColon => "::",
        SquareSquare => "[]",
        ParenParen => "()",
        QMarkQMark => "??",
    }
}

/// Syntactic free-identifier scan over a lambda body, used to build its
/// captured-argument list. Walks the parse
/// tree directly rather than the (not-yet-built) IR, since capture analysis
/// runs before the body is lowered.
fn collect_free_idents(e: &PExpr, bound: &mut std::collections::HashSet<String>, out: &mut Vec<String>) {
    match &e.kind {
        PKind::Ident(name) => {
            if !bound.contains(name) && !out.contains(name) {
                out.push(name.clone());
            }
        }
        PKind::LitBool(_)
        | PKind::LitInt(_)
        | PKind::LitLong(_)
        | PKind::LitFloat(_)
        | PKind::LitChar(_)
        | PKind::LitString(_)
        | PKind::Error(_) => {}
        PKind::Paren(inner) | PKind::Fork(inner) | PKind::Lazy(inner) => collect_free_idents(inner, bound, out),
        PKind::Group(items) => {
            for i in items {
                collect_free_idents(i, bound, out);
            }
        }
        PKind::Unary { operand, .. } => collect_free_idents(operand, bound, out),
        PKind::Binary { lhs, rhs, .. } | PKind::LogicalAnd { lhs, rhs } | PKind::LogicalOr { lhs, rhs } => {
            collect_free_idents(lhs, bound, out);
            collect_free_idents(rhs, bound, out);
        }
        PKind::Call { args, .. } => {
            for a in args {
                collect_free_idents(a, bound, out);
            }
        }
        PKind::CallDyn { target, args } => {
            collect_free_idents(target, bound, out);
            for a in args {
                collect_free_idents(a, bound, out);
            }
        }
        PKind::Index { target, index } => {
            collect_free_idents(target, bound, out);
            collect_free_idents(index, bound, out);
        }
        PKind::Field { target, .. } => collect_free_idents(target, bound, out),
        PKind::ConstDecl { name, value } => {
            collect_free_idents(value, bound, out);
            bound.insert(name.clone());
        }
        PKind::Conditional { cond, if_true, if_false } => {
            collect_free_idents(cond, bound, out);
            collect_free_idents(if_true, bound, out);
            collect_free_idents(if_false, bound, out);
        }
        PKind::Switch { conditions, branches } => {
            for c in conditions {
                collect_free_idents(c, bound, out);
            }
            for b in branches {
                collect_free_idents(b, bound, out);
            }
        }
        PKind::Is { target, .. } => collect_free_idents(target, bound, out),
        PKind::As { target, bind, .. } => {
            collect_free_idents(target, bound, out);
            if let Some(name) = bind {
                bound.insert(name.clone());
            }
        }
        PKind::Lambda { params, body, .. } => {
            let mut inner_bound = bound.clone();
            for p in params {
                inner_bound.insert(p.name.clone());
            }
            collect_free_idents(body, &mut inner_bound, out);
        }
    }
}
