//! The `Program`: every type, function, and execute-statement produced by
//! the analyzer, plus the synthetic-type caches and name counters that are
//! the only process-wide state the compiler keeps (spec §5).

use rustc_hash::FxHashMap;

use novus_common::Interner;

use crate::expr::Expr;
use crate::func::{FuncDecl, FuncDef, FuncKind, IntrinsicOp};
use crate::ids::{FuncId, TypeId};
use crate::tables::TypeSet;
use crate::templates::{FuncTemplateTable, TypeTemplateTable};
use crate::types::{DelegateDef, LazyDef, TypeInfo, TypeKind};

/// Dedup key for [`Program::delegate_type`]: `(input, output, isAction)`.
type DelegateKey = (Vec<TypeId>, TypeId, bool);
/// Dedup key for [`Program::lazy_type`]: `(result, isAction)`.
type LazyKey = (TypeId, bool);

#[derive(Default)]
pub struct Program {
    interner: Interner,

    types: Vec<TypeInfo>,
    named_types: FxHashMap<String, TypeId>,

    funcs: Vec<FuncDecl>,
    named_funcs: FxHashMap<String, Vec<FuncId>>,
    func_defs: FxHashMap<FuncId, FuncDef>,

    type_templates: TypeTemplateTable,
    func_templates: FuncTemplateTable,

    exec_stmts: Vec<Expr>,

    /// Realizes spec's `DelegateTable`/`FutureTable`/`LazyTable`/
    /// `FailTable`/`StaticIntTable`: "deduplicating caches: given a
    /// signature (or int value), return an existing synthetic `TypeId`/
    /// `FuncId` or create one." The original design promotes entries from
    /// standalone tables into `Program` after analysis; here `Program`
    /// hands out the id directly on first request, which is equivalent for
    /// a single-threaded, synchronous compiler (no intermediate tables left
    /// to reconcile).
    delegate_cache: FxHashMap<DelegateKey, TypeId>,
    future_cache: FxHashMap<TypeId, TypeId>,
    lazy_cache: FxHashMap<LazyKey, TypeId>,
    fail_cache: FxHashMap<TypeId, FuncId>,
    static_int_cache: FxHashMap<i64, TypeId>,

    next_anon_func_index: u32,
    next_inlined_const_index: u32,
}

impl Program {
    pub fn new() -> Self {
        Program::default()
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn interner_mut(&mut self) -> &mut Interner {
        &mut self.interner
    }

    // -- Types ---------------------------------------------------------

    pub fn declare_type(&mut self, name: String, kind: TypeKind) -> TypeId {
        let id = TypeId::from_index(self.types.len());
        self.named_types.insert(name.clone(), id);
        self.types.push(TypeInfo { id, name, kind });
        id
    }

    pub fn type_info(&self, id: TypeId) -> &TypeInfo {
        &self.types[id.to_index()]
    }

    pub fn type_info_mut(&mut self, id: TypeId) -> &mut TypeInfo {
        &mut self.types[id.to_index()]
    }

    pub fn find_type_by_name(&self, name: &str) -> Option<TypeId> {
        self.named_types.get(name).copied()
    }

    fn declare_synthetic_type(&mut self, kind: TypeKind, tag: &str) -> TypeId {
        let id = TypeId::from_index(self.types.len());
        self.types.push(TypeInfo {
            id,
            name: tag.to_string(),
            kind,
        });
        id
    }

    /// Returns the (possibly newly created) `future{T}` type.
    pub fn future_type(&mut self, result: TypeId) -> TypeId {
        if let Some(&id) = self.future_cache.get(&result) {
            return id;
        }
        let id = self.declare_synthetic_type(TypeKind::Future(result), "future");
        self.future_cache.insert(result, id);
        id
    }

    /// Returns the (possibly newly created) `lazy{T}` type.
    pub fn lazy_type(&mut self, result: TypeId, is_action: bool) -> TypeId {
        let key = (result, is_action);
        if let Some(&id) = self.lazy_cache.get(&key) {
            return id;
        }
        let id = self.declare_synthetic_type(TypeKind::Lazy(LazyDef { result, is_action }), "lazy");
        self.lazy_cache.insert(key, id);
        id
    }

    /// Returns the (possibly newly created) delegate type for this exact
    /// `(input, output, isAction)` signature.
    pub fn delegate_type(&mut self, input: Vec<TypeId>, output: TypeId, is_action: bool) -> TypeId {
        let key = (input.clone(), output, is_action);
        if let Some(&id) = self.delegate_cache.get(&key) {
            return id;
        }
        let id = self.declare_synthetic_type(
            TypeKind::Delegate(DelegateDef {
                input,
                output,
                is_action,
            }),
            "delegate",
        );
        self.delegate_cache.insert(key, id);
        id
    }

    /// Returns the `TypeId` that represents the compile-time integer
    /// constant `value` (spec §4.4's `staticint_to_int` intrinsic).
    pub fn static_int_type(&mut self, value: i64) -> TypeId {
        if let Some(&id) = self.static_int_cache.get(&value) {
            return id;
        }
        let id = self.declare_synthetic_type(TypeKind::StaticInt(value), "staticint");
        self.static_int_cache.insert(value, id);
        id
    }

    // -- Functions -------------------------------------------------------

    pub fn declare_func(&mut self, build: impl FnOnce(FuncId) -> FuncDecl) -> FuncId {
        let id = FuncId::from_index(self.funcs.len());
        let decl = build(id);
        let name = decl.name.clone();
        self.named_funcs.entry(name).or_default().push(id);
        self.funcs.push(decl);
        id
    }

    pub fn func_decl(&self, id: FuncId) -> &FuncDecl {
        &self.funcs[id.to_index()]
    }

    /// Patches a declared function's output type once it becomes known.
    /// Used by the return-type-inference pass, which must hand out a
    /// `FuncId` before a function's body can be visited (so a self-call
    /// inside that body has something to refer to) but can only compute
    /// the output type by running inference over that same body.
    pub fn set_func_output(&mut self, id: FuncId, output: TypeId) {
        self.funcs[id.to_index()].output = output;
    }

    pub fn define_func(&mut self, def: FuncDef) {
        self.func_defs.insert(def.id, def);
    }

    pub fn func_def(&self, id: FuncId) -> Option<&FuncDef> {
        self.func_defs.get(&id)
    }

    pub fn func_def_mut(&mut self, id: FuncId) -> Option<&mut FuncDef> {
        self.func_defs.get_mut(&id)
    }

    /// Every `FuncId` with a registered body, in no particular order.
    pub fn defined_func_ids(&self) -> impl Iterator<Item = FuncId> + '_ {
        self.func_defs.keys().copied()
    }

    /// Drops every defined function body not in `keep` (spec §4.5
    /// tree-shake: "compute the transitive set of functions ... reachable
    /// from exec statements; drop the rest"). Declarations (`funcs`) are
    /// left alone — only the (potentially large) bodies are worth
    /// reclaiming, and a dangling declaration with no definition is
    /// harmless since nothing still calls it after shaking.
    pub fn retain_func_defs(&mut self, keep: &rustc_hash::FxHashSet<FuncId>) {
        self.func_defs.retain(|id, _| keep.contains(id));
    }

    pub fn funcs_named(&self, name: &str) -> &[FuncId] {
        self.named_funcs.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn funcs(&self) -> &[FuncDecl] {
        &self.funcs
    }

    pub fn types(&self) -> &[TypeInfo] {
        &self.types
    }

    /// The per-type `fail{T}` intrinsic function, interned so every
    /// `fail{T}()` call site in `Program` shares one `FuncId` (spec §4.4:
    /// "`fail{T}()` emits a call to a `FailTable`-interned per-type fail
    /// function").
    pub fn fail_func(&mut self, ty: TypeId) -> FuncId {
        if let Some(&id) = self.fail_cache.get(&ty) {
            return id;
        }
        let id = self.declare_func(|id| FuncDecl {
            id,
            name: "fail".to_string(),
            kind: FuncKind::Intrinsic(IntrinsicOp::Fail),
            input: TypeSet::new(vec![]),
            output: ty,
            opt_input_count: 0,
            is_implicit_conv: false,
            is_action: false,
        });
        self.fail_cache.insert(ty, id);
        id
    }

    // -- Templates ---------------------------------------------------------

    pub fn type_templates(&self) -> &TypeTemplateTable {
        &self.type_templates
    }

    pub fn type_templates_mut(&mut self) -> &mut TypeTemplateTable {
        &mut self.type_templates
    }

    pub fn func_templates(&self) -> &FuncTemplateTable {
        &self.func_templates
    }

    pub fn func_templates_mut(&mut self) -> &mut FuncTemplateTable {
        &mut self.func_templates
    }

    // -- Execute statements ------------------------------------------------

    pub fn add_exec(&mut self, expr: Expr) {
        self.exec_stmts.push(expr);
    }

    pub fn exec_stmts(&self) -> &[Expr] {
        &self.exec_stmts
    }

    pub fn exec_stmts_mut(&mut self) -> &mut Vec<Expr> {
        &mut self.exec_stmts
    }

    // -- Synthetic name counters --------------------------------------------

    /// `__anon_<N>`, monotone (spec §4.4 anonymous-function lowering).
    pub fn next_anon_name(&mut self) -> String {
        let n = self.next_anon_func_index;
        self.next_anon_func_index += 1;
        format!("__anon_{n}")
    }

    /// `__inlined_<n>_`, monotone (spec §4.5 call-inline pass).
    pub fn next_inlined_prefix(&mut self) -> String {
        let n = self.next_inlined_const_index;
        self.next_inlined_const_index += 1;
        format!("__inlined_{n}_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FieldDeclTable;

    #[test]
    fn declaring_a_type_registers_it_by_name() {
        let mut program = Program::new();
        let id = program.declare_type("int".to_string(), TypeKind::Int);
        assert_eq!(program.find_type_by_name("int"), Some(id));
    }

    #[test]
    fn delegate_type_is_deduplicated_by_signature() {
        let mut program = Program::new();
        let int_ty = program.declare_type("int".to_string(), TypeKind::Int);
        let bool_ty = program.declare_type("bool".to_string(), TypeKind::Bool);

        let a = program.delegate_type(vec![int_ty], bool_ty, false);
        let b = program.delegate_type(vec![int_ty], bool_ty, false);
        let c = program.delegate_type(vec![int_ty], bool_ty, true);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn fail_func_is_interned_per_type() {
        let mut program = Program::new();
        let int_ty = program.declare_type("int".to_string(), TypeKind::Int);
        let a = program.fail_func(int_ty);
        let b = program.fail_func(int_ty);
        assert_eq!(a, b);
    }

    #[test]
    fn anon_names_are_monotone() {
        let mut program = Program::new();
        assert_eq!(program.next_anon_name(), "__anon_0");
        assert_eq!(program.next_anon_name(), "__anon_1");
    }

    #[test]
    fn set_func_output_patches_a_declared_function() {
        let mut program = Program::new();
        let int_ty = program.declare_type("int".to_string(), TypeKind::Int);
        let bool_ty = program.declare_type("bool".to_string(), TypeKind::Bool);
        let fid = program.declare_func(|id| FuncDecl {
            id,
            name: "f".to_string(),
            kind: FuncKind::User,
            input: TypeSet::new(vec![]),
            output: int_ty,
            opt_input_count: 0,
            is_implicit_conv: false,
            is_action: false,
        });
        program.set_func_output(fid, bool_ty);
        assert_eq!(program.func_decl(fid).output, bool_ty);
    }

    #[test]
    fn struct_field_table_round_trips_through_program() {
        let mut program = Program::new();
        let int_ty = program.declare_type("int".to_string(), TypeKind::Int);
        let mut fields = FieldDeclTable::new();
        fields.declare("x".to_string(), int_ty);
        let struct_id = program.declare_type(
            "Point".to_string(),
            TypeKind::Struct(crate::types::StructDef { fields }),
        );
        match &program.type_info(struct_id).kind {
            TypeKind::Struct(def) => assert_eq!(def.fields.len(), 1),
            _ => panic!("expected struct"),
        }
    }
}
