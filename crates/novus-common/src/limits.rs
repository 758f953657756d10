//! Centralized compiler tunables.
//!
//! Kept here instead of scattered magic numbers so a single place documents
//! every bound the analyzer/optimizer enforces.

/// Maximum rounds the optimizer's fixed-point driver runs before giving up
/// and accepting the current program, even if another round would still
/// find something to rewrite (spec §4.5).
pub const MAX_OPTIMIZER_ROUNDS: u32 = 5;

/// Recursion depth at which optional-argument initializer expansion (pass
/// 9, spec §4.4) is assumed cyclic and reported as an error, rather than
/// expanded further.
pub const MAX_OPT_ARG_EXPANSION_DEPTH: u32 = 100;

/// Upper bound on implicit conversions considered per call argument during
/// overload resolution (spec §4.7); candidates requiring more are rejected
/// outright rather than searched for a chained conversion.
pub const MAX_IMPLICIT_CONVS_PER_ARG: u32 = 1;

/// Rounds the return-type-inference fixed point (pass 5, spec §4.4) runs
/// before giving up on whatever functions still haven't settled and
/// reporting them as unable to infer.
pub const MAX_RETURN_TYPE_INFER_ROUNDS: u32 = 16;
