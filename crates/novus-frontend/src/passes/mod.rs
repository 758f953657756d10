//! The nine ordered passes [`crate::analyze::analyze`] drives over a
//! loaded set of parse trees (spec §4.4). Each module is one pass, named
//! and numbered the way the spec lists them; a later pass may assume
//! everything an earlier one is responsible for has already run.

pub mod p1_parse_diagnostics;
pub mod p2_declare_types;
pub mod p3_define_types;
pub mod p4_declare_funcs;
pub mod p5_infer_return_types;
pub mod p6_define_funcs;
pub mod p7_define_execs;
pub mod p8_validate_types;
pub mod p9_patch_calls;
