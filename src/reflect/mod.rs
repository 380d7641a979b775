//! C++ reflection via libclang.
//!
//! This module parses a translation unit, walks its AST, and fills the four
//! registries in [`Registries`]:
//!
//! - `name`: fully-qualified cursor names and canonical type names
//! - `types`: the type registry (interning, root/pointee decomposition)
//! - `enums`, `classes`, `functions`: the declaration registries
//! - `visitor`: top-level dispatch over the main file

mod classes;
mod enums;
mod functions;
mod name;
mod types;
mod visitor;

use std::path::Path;

use clang::diagnostic::Severity;
use clang::{Clang, Index};
use thiserror::Error;

use crate::model::Registries;

/// Errors raised while reflecting a translation unit.
///
/// The reflector recovers from nothing: any malformed annotation or
/// unsupported construct aborts the run so generated code is never silently
/// wrong.
#[derive(Error, Debug)]
pub enum ReflectError {
    /// A `@leonkv` annotation with an empty key or value.
    #[error("LEON_KV malformed")]
    MalformedKeyValue,
    /// A function type reached the type canonicalizer.
    #[error("Function types currently unsupported: {0}")]
    FunctionType(String),
    /// A template argument of a kind the model does not represent.
    #[error("{kind} template arguments are unsupported: {name}")]
    TemplateArg { kind: &'static str, name: String },
    /// libclang could not classify a template argument.
    #[error("could not deduce template argument type: {0}")]
    TemplateArgInvalid(String),
    /// Missing or invalid access specifier.
    #[error("unexpected access specifier for {0}")]
    Access(&'static str),
    /// A base specifier without a resolvable class declaration.
    #[error("type not found for base specifier")]
    BaseType,
    /// A method with a storage class other than none or static.
    #[error("unexpected storage class for method")]
    MethodStorage,
    /// An annotated free function declared inside a class body without a
    /// friend declaration.
    #[error("FunctionDecl in class without FriendDecl")]
    StrayFunction,
    /// An enum initializer that evaluated to something other than an
    /// integer.
    #[error("unexpected evaluation result for enum element in {0}")]
    EnumValue(String),
    /// A cursor that should carry a type did not.
    #[error("missing type for {0}")]
    MissingType(&'static str),
    /// A cursor kind the class registry cannot classify.
    #[error("unexpected cursor kind for class registration")]
    ClassCursor,
    /// The translation unit produced error or fatal diagnostics.
    #[error("source parsing ran into a fatal error, see diagnostics above")]
    Diagnostics,
    /// libclang failed to produce a translation unit at all.
    #[error("failed to parse translation unit: {0}")]
    Parse(String),
}

/// Compiler configuration for parsing a source file.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// `-I` include directories.
    pub includes: Vec<String>,
    /// `-D` preprocessor defines.
    pub defines: Vec<String>,
    /// `-isystem` include directories.
    pub system_includes: Vec<String>,
}

impl CompileOptions {
    /// Build the full compiler argument list.
    ///
    /// Sources are always parsed as hosted C++20 with `_LEON_PROC` defined
    /// so the annotation macros expand.
    pub(crate) fn to_arguments(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "-x",
            "c++",
            "-std=c++20",
            "-D_LEON_PROC",
            "-fhosted",
            "-fcxx-exceptions",
            "-fexceptions",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        for dir in &self.system_includes {
            args.push("-isystem".to_string());
            args.push(dir.clone());
        }
        for dir in &self.includes {
            args.push(format!("-I{}", dir));
        }
        for define in &self.defines {
            args.push(format!("-D{}", define));
        }

        args
    }
}

/// Walks entities of one translation unit into a fresh set of registries.
pub(crate) struct Reflector {
    pub(crate) registries: Registries,
}

/// Reflect a single source file into its four registries.
///
/// Parses the source with function bodies skipped and the translation unit
/// marked incomplete, prints libclang diagnostics, and fails on the first
/// error-severity diagnostic. The returned registries are private to this
/// source; nothing is shared across calls.
pub fn reflect_file(
    clang: &Clang,
    source: &Path,
    options: &CompileOptions,
) -> Result<Registries, ReflectError> {
    let index = Index::new(clang, false, false);
    let arguments = options.to_arguments();

    let mut parser = index.parser(source);
    parser
        .arguments(&arguments)
        .skip_function_bodies(true)
        .incomplete(true);

    let tu = parser
        .parse()
        .map_err(|e| ReflectError::Parse(e.to_string()))?;

    let mut fatal = false;
    for diagnostic in tu.get_diagnostics() {
        match diagnostic.get_severity() {
            Severity::Ignored => {}
            Severity::Note | Severity::Warning => eprintln!("{}", diagnostic),
            Severity::Error | Severity::Fatal => {
                eprintln!("{}", diagnostic);
                fatal = true;
            }
        }
    }
    if fatal {
        return Err(ReflectError::Diagnostics);
    }

    let mut reflector = Reflector {
        registries: Registries::new(),
    };
    reflector.visit_translation_unit(tu.get_entity())?;

    Ok(reflector.registries)
}
