//! Diagnostics as plain data.
//!
//! The analyzer never panics or throws on a user-facing error (spec §7):
//! every failure the pipeline can anticipate becomes a [`Diagnostic`] pushed
//! onto a shared accumulator, in encounter order, never sorted. Each
//! [`DiagnosticKind`] variant is one fixed message kind per
//! `examples/original_source/include/frontend/diag_defs.hpp` (the header
//! spec.md §6's diagnostic list was lifted from), carrying just the
//! arguments that message needs.

use crate::source::SourceId;

/// Two severities exist; only `Error` is currently emitted by any pass
/// (spec §9 Open Question: the `Warning` channel is reserved, not wired to
/// a producer — left in place rather than guessed at).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    UnresolvedImport { path: String },
    ParseError { message: String },
    UnsupportedLiteral { name: String },

    TypeAlreadyDeclared { name: String },
    TypeTemplateAlreadyDeclared { name: String },
    TypeNameIsReserved { name: String },
    TypeNameConflictsWithFunc { name: String },

    DuplicateFieldNameInStruct { field_name: String },
    FieldNameConflictsWithTypeSubstitution { field_name: String },
    CyclicStruct { field_name: String, struct_name: String },
    FieldNameConflictsWithType { name: String },
    FieldNotFoundOnType { field_name: String, type_name: String },

    DuplicateTypeInUnion { type_name: String },
    NonUnionIsExpression,
    TypeNotPartOfUnion { type_name: String, union_name: String },
    UncheckedAsExpressionWithConst,

    DuplicateEntryNameInEnum { entry_name: String },
    DuplicateEntryValueInEnum { entry_value: i32 },
    ValueNotFoundInEnum { entry_name: String, enum_name: String },

    IncorrectReturnTypeInConvFunc { name: String, returned_type: String },
    NonOverloadableOperator { name: String },
    NonPureOperatorOverload,
    OperatorOverloadWithoutArgs { name: String },

    TemplatedImplicitConversion,
    ImplicitNonConv,
    TooManyInputsInImplicitConv,

    TypeParamNameConflictsWithType { name: String },
    DuplicateTypeParamName { name: String },

    DuplicateFuncDeclaration { name: String },
    UnableToInferFuncReturnType { name: String },
    NonMatchingFuncReturnType {
        name: String,
        declared_type: String,
        returned_type: String,
    },
    NonMatchingInitializerType { declared_type: String, initializer_type: String },
    UnableToInferLambdaReturnType,

    ConstNameConflictsWithType { name: String },
    ConstNameConflictsWithTypeSubstitution { name: String },
    ConstNameConflictsWithConst { name: String },
    ConstDeclareNotSupported,

    UndeclaredType { name: String, type_params: u32 },
    UndeclaredTypeOrConversion { name: String, arg_types: Vec<String> },
    NoTypeOrConversionFoundToInstantiate { name: String, template_param_count: u32 },
    TypeParamOnSubstitutionType { name: String },
    InvalidTypeInstantiation,

    UndeclaredConst { name: String },
    UninitializedConst { name: String },

    UndeclaredPureFunc { name: String, arg_types: Vec<String> },
    UndeclaredAction { name: String, arg_types: Vec<String> },
    UndeclaredFuncOrAction { name: String, arg_types: Vec<String> },

    UnknownIntrinsic { name: String, pure_only: bool, arg_types: Vec<String> },
    PureFuncInfRecursion,

    NoPureFuncFoundToInstantiate { name: String, template_param_count: u32 },
    NoActionFoundToInstantiate { name: String, template_param_count: u32 },
    NoFuncOrActionFoundToInstantiate { name: String, template_param_count: u32 },
    NoTypeParamsProvidedToTemplateFunction { name: String },

    AmbiguousFunction { name: String },
    AmbiguousTemplateFunction { name: String, template_param_count: u32 },

    IllegalDelegateCall,
    IncorrectArgsToDelegate,
    UndeclaredCallOperator { arg_types: Vec<String> },
    UndeclaredIndexOperator { arg_types: Vec<String> },
    InvalidFuncInstantiation,
    UnsupportedOperator { name: String },
    UndeclaredUnaryOperator { name: String, operand_type: String },
    UndeclaredBinOperator { name: String, lhs_type: String, rhs_type: String },

    BranchesHaveNoCommonType,
    NoImplicitConversionFound { from: String, to: String },
    NonExhaustiveSwitchWithoutElse,
    NonPureConversion,

    ForkedNonUserFunc,
    LazyNonUserFunc,
    ForkedSelfCall,
    LazySelfCall,
    SelfCallInNonFunc,
    SelfCallWithoutInferredRetType,
    IncorrectNumArgsInSelfCall { expected: u32, actual: u32 },

    IntrinsicFuncLiteral,
    UnsupportedArgInitializer { name: String },
    NonOptArgFollowingOpt,
    CyclicOptArgInitializer,
}

impl DiagnosticKind {
    /// Render the one fixed message this kind always produces, with its
    /// arguments interpolated. Mirrors `diag_defs.cpp`'s per-kind message
    /// strings from the original implementation.
    pub fn message(&self) -> String {
        use DiagnosticKind::*;
        match self {
            UnresolvedImport { path } => format!("unresolved import '{path}'"),
            ParseError { message } => message.clone(),
            UnsupportedLiteral { name } => format!("unsupported literal '{name}'"),

            TypeAlreadyDeclared { name } => format!("type '{name}' is already declared"),
            TypeTemplateAlreadyDeclared { name } => {
                format!("type template '{name}' is already declared")
            }
            TypeNameIsReserved { name } => format!("type name '{name}' is reserved"),
            TypeNameConflictsWithFunc { name } => {
                format!("type name '{name}' conflicts with a function of the same name")
            }

            DuplicateFieldNameInStruct { field_name } => {
                format!("duplicate field name '{field_name}' in struct")
            }
            FieldNameConflictsWithTypeSubstitution { field_name } => {
                format!("field name '{field_name}' conflicts with a type substitution")
            }
            CyclicStruct {
                field_name,
                struct_name,
            } => format!("field '{field_name}' makes struct '{struct_name}' cyclic"),
            FieldNameConflictsWithType { name } => {
                format!("field name '{name}' conflicts with a type name")
            }
            FieldNotFoundOnType {
                field_name,
                type_name,
            } => format!("field '{field_name}' not found on type '{type_name}'"),

            DuplicateTypeInUnion { type_name } => {
                format!("type '{type_name}' appears more than once in union")
            }
            NonUnionIsExpression => "'is' expression used on a non-union type".to_string(),
            TypeNotPartOfUnion {
                type_name,
                union_name,
            } => format!("type '{type_name}' is not part of union '{union_name}'"),
            UncheckedAsExpressionWithConst => {
                "'as' expression binding a constant is not allowed outside a checked context"
                    .to_string()
            }

            DuplicateEntryNameInEnum { entry_name } => {
                format!("duplicate entry name '{entry_name}' in enum")
            }
            DuplicateEntryValueInEnum { entry_value } => {
                format!("duplicate entry value '{entry_value}' in enum")
            }
            ValueNotFoundInEnum {
                entry_name,
                enum_name,
            } => format!("entry '{entry_name}' not found in enum '{enum_name}'"),

            IncorrectReturnTypeInConvFunc {
                name,
                returned_type,
            } => format!("conversion function '{name}' returns '{returned_type}', expected its own name as the type"),
            NonOverloadableOperator { name } => {
                format!("operator '{name}' cannot be overloaded")
            }
            NonPureOperatorOverload => "operator overloads must be pure functions".to_string(),
            OperatorOverloadWithoutArgs { name } => {
                format!("operator overload '{name}' must take at least one argument")
            }

            TemplatedImplicitConversion => {
                "implicit conversions cannot be templated".to_string()
            }
            ImplicitNonConv => {
                "function marked 'implicit' does not have a matching conversion shape".to_string()
            }
            TooManyInputsInImplicitConv => {
                "implicit conversion functions must take exactly one argument".to_string()
            }

            TypeParamNameConflictsWithType { name } => {
                format!("type parameter name '{name}' conflicts with a type")
            }
            DuplicateTypeParamName { name } => {
                format!("duplicate type parameter name '{name}'")
            }

            DuplicateFuncDeclaration { name } => {
                format!("function '{name}' is already declared with this signature")
            }
            UnableToInferFuncReturnType { name } => {
                format!("unable to infer return type of function '{name}'")
            }
            NonMatchingFuncReturnType {
                name,
                declared_type,
                returned_type,
            } => format!(
                "function '{name}' declared to return '{declared_type}' but returns '{returned_type}'"
            ),
            NonMatchingInitializerType {
                declared_type,
                initializer_type,
            } => format!(
                "initializer has type '{initializer_type}', expected '{declared_type}'"
            ),
            UnableToInferLambdaReturnType => {
                "unable to infer return type of anonymous function".to_string()
            }

            ConstNameConflictsWithType { name } => {
                format!("constant name '{name}' conflicts with a type")
            }
            ConstNameConflictsWithTypeSubstitution { name } => {
                format!("constant name '{name}' conflicts with a type substitution")
            }
            ConstNameConflictsWithConst { name } => {
                format!("constant name '{name}' is already declared in this scope")
            }
            ConstDeclareNotSupported => {
                "constant declarations are not supported in this context".to_string()
            }

            UndeclaredType { name, type_params } => {
                format!("undeclared type '{name}' with {type_params} type parameter(s)")
            }
            UndeclaredTypeOrConversion { name, arg_types } => format!(
                "undeclared type or conversion '{name}({})'",
                arg_types.join(", ")
            ),
            NoTypeOrConversionFoundToInstantiate {
                name,
                template_param_count,
            } => format!(
                "no type or conversion '{name}' found to instantiate with {template_param_count} type parameter(s)"
            ),
            TypeParamOnSubstitutionType { name } => {
                format!("type parameters cannot be applied to substitution type '{name}'")
            }
            InvalidTypeInstantiation => "invalid type instantiation".to_string(),

            UndeclaredConst { name } => format!("undeclared constant '{name}'"),
            UninitializedConst { name } => {
                format!("constant '{name}' may be read before it is initialized")
            }

            UndeclaredPureFunc { name, arg_types } => format!(
                "undeclared pure function '{name}({})'",
                arg_types.join(", ")
            ),
            UndeclaredAction { name, arg_types } => {
                format!("undeclared action '{name}({})'", arg_types.join(", "))
            }
            UndeclaredFuncOrAction { name, arg_types } => format!(
                "undeclared function or action '{name}({})'",
                arg_types.join(", ")
            ),

            UnknownIntrinsic {
                name,
                pure_only,
                arg_types,
            } => format!(
                "unknown {}intrinsic '{name}({})'",
                if *pure_only { "pure " } else { "" },
                arg_types.join(", ")
            ),
            PureFuncInfRecursion => {
                "pure function recurses infinitely without a non-recursive base case".to_string()
            }

            NoPureFuncFoundToInstantiate {
                name,
                template_param_count,
            } => format!(
                "no pure function '{name}' found to instantiate with {template_param_count} type parameter(s)"
            ),
            NoActionFoundToInstantiate {
                name,
                template_param_count,
            } => format!(
                "no action '{name}' found to instantiate with {template_param_count} type parameter(s)"
            ),
            NoFuncOrActionFoundToInstantiate {
                name,
                template_param_count,
            } => format!(
                "no function or action '{name}' found to instantiate with {template_param_count} type parameter(s)"
            ),
            NoTypeParamsProvidedToTemplateFunction { name } => format!(
                "no type parameters provided to instantiate template function '{name}'"
            ),

            AmbiguousFunction { name } => format!("call to '{name}' is ambiguous"),
            AmbiguousTemplateFunction {
                name,
                template_param_count,
            } => format!(
                "call to template function '{name}' with {template_param_count} type parameter(s) is ambiguous"
            ),

            IllegalDelegateCall => "value is not callable".to_string(),
            IncorrectArgsToDelegate => "incorrect arguments for delegate call".to_string(),
            UndeclaredCallOperator { arg_types } => format!(
                "undeclared call operator for argument types ({})",
                arg_types.join(", ")
            ),
            UndeclaredIndexOperator { arg_types } => format!(
                "undeclared index operator for argument types ({})",
                arg_types.join(", ")
            ),
            InvalidFuncInstantiation => "invalid function instantiation".to_string(),
            UnsupportedOperator { name } => format!("unsupported operator '{name}'"),
            UndeclaredUnaryOperator { name, operand_type } => format!(
                "undeclared unary operator '{name}' for type '{operand_type}'"
            ),
            UndeclaredBinOperator {
                name,
                lhs_type,
                rhs_type,
            } => format!(
                "undeclared binary operator '{name}' for types '{lhs_type}' and '{rhs_type}'"
            ),

            BranchesHaveNoCommonType => {
                "branches of this expression have no common type".to_string()
            }
            NoImplicitConversionFound { from, to } => {
                format!("no implicit conversion found from '{from}' to '{to}'")
            }
            NonExhaustiveSwitchWithoutElse => {
                "switch expression is not exhaustive and has no else branch".to_string()
            }
            NonPureConversion => "conversion functions must be pure".to_string(),

            ForkedNonUserFunc => "only user-defined functions can be forked".to_string(),
            LazyNonUserFunc => "only user-defined functions can be made lazy".to_string(),
            ForkedSelfCall => "a self-recursive call cannot be forked".to_string(),
            LazySelfCall => "a self-recursive call cannot be made lazy".to_string(),
            SelfCallInNonFunc => "self-call used outside a function body".to_string(),
            SelfCallWithoutInferredRetType => {
                "self-call requires the enclosing function's return type to be known".to_string()
            }
            IncorrectNumArgsInSelfCall { expected, actual } => format!(
                "self-call expects {expected} argument(s) but received {actual}"
            ),

            IntrinsicFuncLiteral => "intrinsics cannot be used as function literals".to_string(),
            UnsupportedArgInitializer { name } => {
                format!("unsupported optional-argument initializer for '{name}'")
            }
            NonOptArgFollowingOpt => {
                "a required argument cannot follow an optional argument".to_string()
            }
            CyclicOptArgInitializer => {
                "cyclic optional-argument initializer expansion".to_string()
            }
        }
    }

    /// All diagnostic kinds reported by the analyzer are errors today;
    /// this mapping exists so a future pass can promote specific kinds to
    /// `Warning` without touching every call site.
    pub fn severity(&self) -> Severity {
        Severity::Error
    }
}

/// A diagnostic message anchored at a source location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub source: Option<SourceId>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, source: Option<SourceId>) -> Self {
        Diagnostic {
            severity: kind.severity(),
            kind,
            source,
        }
    }

    pub fn message(&self) -> String {
        self.kind.message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_interpolates_arguments() {
        let d = Diagnostic::new(
            DiagnosticKind::TypeAlreadyDeclared {
                name: "Foo".to_string(),
            },
            None,
        );
        assert_eq!(d.message(), "type 'Foo' is already declared");
        assert_eq!(d.severity, Severity::Error);
    }
}
