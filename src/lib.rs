//! reflectgen - annotation-driven C++ reflection and code generation.
//!
//! reflectgen reflects annotated C++ declarations into a structured,
//! language-agnostic model and feeds that model to a user-supplied Luau
//! script that produces derived source files (typically reflection glue for
//! an engine or runtime).
//!
//! # Architecture
//!
//! The pipeline runs per translation unit:
//!
//! ```text
//! source file ──libclang──▶ AST ──visitor──▶ registries ──bridge──▶ script
//!                                            (types, enums,         SourceProcess
//!                                             classes, functions)   per-source output
//! ```
//!
//! After all sources, the script's `GlueProcess` receives the collected
//! `(source, out)` pairs and emits one aggregated glue artifact.
//!
//! - `attr`: annotation attributes and the quoted-string reader
//! - `model`: the clang-independent model and its four registries
//! - `reflect`: libclang interop - canonical names, type interning, the
//!   declaration registries, and the top-level visitor
//! - `script`: the Luau script host and the model-to-table bridge
//! - `cli`: the command-line driver (incremental rebuilds, output writing)

pub mod attr;
pub mod cli;
pub mod model;
pub mod reflect;
pub mod script;

pub use attr::Attr;
pub use model::{
    Arg, Base, ClassKeyword, ClassNode, EnumNode, FunctionNode, Member, MemberKind, Method,
    MethodKind, Registries, TemplateArg, TypeNode, TypeShape, Visibility,
};
pub use reflect::{reflect_file, CompileOptions, ReflectError};
pub use script::{ScriptError, ScriptHost};
