//! Canonical naming for cursors and types.
//!
//! The canonical name of a type is `<lqual><name><rqual>`: the root type's
//! qualifiers, the fully-qualified (template-applied) root spelling, and one
//! ` <sigil><qualifiers>` segment per reference/pointer layer walking the
//! original type outside-in. This string is the type registry key and the
//! only identity the scripted backend ever sees.

use clang::{Entity, EntityKind, TemplateArgument, Type, TypeKind};

use super::ReflectError;

/// Fully-qualified semantic name of a cursor.
///
/// Walks semantic parents up to the translation unit, prepending
/// `<parent>::` for each exposed parent. Unexposed parents are skipped
/// without consuming a level.
pub(crate) fn qualified_name(entity: Entity) -> String {
    let mut name = entity.get_name().unwrap_or_default();

    let mut parent = entity.get_semantic_parent();
    while let Some(scope) = parent {
        match scope.get_kind() {
            EntityKind::TranslationUnit => break,
            EntityKind::UnexposedDecl
            | EntityKind::UnexposedExpr
            | EntityKind::UnexposedStmt
            | EntityKind::UnexposedAttr => {}
            _ => {
                name = format!("{}::{}", scope.get_name().unwrap_or_default(), name);
            }
        }
        parent = scope.get_semantic_parent();
    }

    name
}

pub(crate) fn is_reference(kind: TypeKind) -> bool {
    matches!(kind, TypeKind::LValueReference | TypeKind::RValueReference)
}

pub(crate) fn is_pointer(kind: TypeKind) -> bool {
    matches!(
        kind,
        TypeKind::Pointer
            | TypeKind::BlockPointer
            | TypeKind::ObjCObjectPointer
            | TypeKind::MemberPointer
    )
}

/// Peel all references and pointers (and deduced `auto` layers) off a type.
pub(crate) fn root_type(ty: Type) -> Type {
    let mut current = ty;
    loop {
        let kind = current.get_kind();
        if is_reference(kind) || is_pointer(kind) || kind == TypeKind::Auto {
            match current.get_pointee_type() {
                Some(pointee) => current = pointee,
                None => break,
            }
        } else {
            break;
        }
    }
    current
}

/// Reject function-shaped types; the model does not represent them.
pub(crate) fn ensure_data_type(ty: Type) -> Result<(), ReflectError> {
    let has_arguments = ty
        .get_argument_types()
        .is_some_and(|args| !args.is_empty());
    if has_arguments || ty.get_result_type().is_some() {
        return Err(ReflectError::FunctionType(ty.get_display_name()));
    }
    Ok(())
}

/// Qualifiers of a type node itself, in `const volatile restrict` order.
pub(crate) fn qualifier_string(ty: Type) -> String {
    let mut out = String::new();
    if ty.is_const_qualified() {
        out.push_str("const");
    }
    if ty.is_volatile_qualified() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str("volatile");
    }
    if ty.is_restrict_qualified() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str("restrict");
    }
    out
}

/// Spelling of a type with its own qualifiers removed.
fn unqualified_spelling(ty: Type) -> String {
    let mut spelling = ty.get_display_name();
    loop {
        let stripped = spelling
            .strip_prefix("const ")
            .or_else(|| spelling.strip_prefix("volatile "))
            .or_else(|| spelling.strip_prefix("restrict "));
        match stripped {
            Some(rest) => spelling = rest.to_string(),
            None => break,
        }
    }
    spelling
}

pub(crate) fn unsupported_template_arg(arg: &TemplateArgument, name: String) -> ReflectError {
    let kind = match arg {
        TemplateArgument::Null => "null",
        TemplateArgument::Declaration => "declaration",
        TemplateArgument::Expression => "expression",
        TemplateArgument::Template => "template",
        TemplateArgument::TemplateExpansion => "template expansion",
        TemplateArgument::Pack => "pack",
        _ => return ReflectError::TemplateArgInvalid(name),
    };
    ReflectError::TemplateArg { kind, name }
}

/// Canonical name of a type.
///
/// With `strip_own` the outermost layer's qualifiers are omitted, which
/// produces the name the unqualified variant of the type would have.
pub(crate) fn type_name(ty: Type, strip_own: bool) -> Result<String, ReflectError> {
    let root = root_type(ty);
    ensure_data_type(root)?;

    let declaration = root.get_declaration();

    let mut name = match declaration {
        Some(decl) => qualified_name(decl),
        None => unqualified_spelling(root),
    };

    if let Some(decl) = declaration {
        if let Some(args) = decl.get_template_arguments() {
            name.push('<');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    name.push_str(", ");
                }
                match arg {
                    TemplateArgument::Type(t) => name.push_str(&type_name(*t, false)?),
                    TemplateArgument::Nullptr => name.push_str("nullptr"),
                    TemplateArgument::Integral(value, _) => name.push_str(&value.to_string()),
                    other => return Err(unsupported_template_arg(other, name)),
                }
            }
            name.push('>');
        }
    }

    // Left qualifiers belong to the root; when stripping a plain type's own
    // qualifiers the root is the type itself, so they are dropped.
    let layered = is_reference(ty.get_kind()) || is_pointer(ty.get_kind());
    let mut lqual = if strip_own && !layered {
        String::new()
    } else {
        qualifier_string(root)
    };
    if !lqual.is_empty() {
        lqual.push(' ');
    }

    // Right qualifiers walk the original type outside-in, one segment per
    // reference/pointer layer, each prepended so references render before
    // pointers.
    let mut rqual = String::new();
    let mut current = ty;
    let mut outermost = true;
    loop {
        let kind = current.get_kind();
        let sigil = match kind {
            TypeKind::LValueReference => "&",
            TypeKind::RValueReference => "&&",
            k if is_pointer(k) => "*",
            _ => break,
        };
        let pointee = match current.get_pointee_type() {
            Some(pointee) => pointee,
            None => break,
        };
        let quals = if outermost && strip_own {
            String::new()
        } else {
            qualifier_string(current)
        };
        rqual = format!(" {}{}{}", sigil, quals, rqual);
        current = pointee;
        outermost = false;
    }

    Ok(format!("{}{}{}", lqual, name, rqual))
}
