//! The type registry.
//!
//! Types are interned by canonical name. Registering a type registers its
//! whole neighborhood: root, unqualified forms, pointee, and every type
//! template argument, so the registry is closed under reference.

use clang::{TemplateArgument, Type, TypeKind};

use super::{name, ReflectError, Reflector};
use crate::model::{TemplateArg, TypeNode, TypeShape};

impl Reflector {
    /// Register a type and everything it references; returns its key.
    ///
    /// Idempotent: re-registering an already known type is a lookup.
    pub(crate) fn register_type(&mut self, ty: Type) -> Result<String, ReflectError> {
        self.register_type_with(ty, false)
    }

    /// Register `ty`, optionally as its own unqualified variant.
    ///
    /// The `clang` crate does not bind `clang_getUnqualifiedType`, so the
    /// unqualified variant is produced by rendering and registering the same
    /// handle with the outermost layer's qualifiers dropped.
    fn register_type_with(&mut self, ty: Type, strip_own: bool) -> Result<String, ReflectError> {
        let key = name::type_name(ty, strip_own)?;
        if self.registries.types.contains_key(&key) {
            return Ok(key);
        }

        // Reserve the key before recursing on neighbors; self-referential
        // template arguments find the placeholder and terminate.
        self.registries
            .types
            .insert(key.clone(), TypeNode::placeholder(key.clone()));

        let shape = match ty.get_kind() {
            TypeKind::LValueReference => TypeShape::LValueReference,
            TypeKind::RValueReference => TypeShape::RValueReference,
            TypeKind::Pointer => TypeShape::Pointer,
            TypeKind::BlockPointer => TypeShape::BlockPointer,
            TypeKind::ObjCObjectPointer => TypeShape::ObjCObjectPointer,
            TypeKind::MemberPointer => TypeShape::MemberPointer,
            _ => TypeShape::Type,
        };

        // Stripping removes exactly the node's own qualifiers.
        let (is_const, is_volatile, is_restrict) = if strip_own {
            (false, false, false)
        } else {
            (
                ty.is_const_qualified(),
                ty.is_volatile_qualified(),
                ty.is_restrict_qualified(),
            )
        };

        let root = name::root_type(ty);
        let self_rooted = root == ty;

        let root_key = if strip_own && self_rooted {
            key.clone()
        } else {
            self.register_type_with(root, false)?
        };

        let declaration = root.get_declaration();

        let unqualified = if strip_own {
            key.clone()
        } else {
            self.register_type_with(ty, true)?
        };

        let unqualified_root = match declaration.and_then(|decl| decl.get_type()) {
            Some(declared) => self.register_type_with(declared, false)?,
            None => {
                if strip_own && self_rooted {
                    key.clone()
                } else {
                    self.register_type_with(root, true)?
                }
            }
        };

        let kind = ty.get_kind();
        let pointee = if name::is_reference(kind) || name::is_pointer(kind) {
            match ty.get_pointee_type() {
                Some(pointee) => Some(self.register_type_with(pointee, false)?),
                None => None,
            }
        } else {
            None
        };

        let mut is_template = false;
        let mut template_args = Vec::new();
        if let Some(decl) = declaration {
            if let Some(args) = decl.get_template_arguments() {
                is_template = true;
                for arg in &args {
                    template_args.push(match arg {
                        TemplateArgument::Type(t) => {
                            TemplateArg::Type(self.register_type_with(*t, false)?)
                        }
                        TemplateArgument::Nullptr => TemplateArg::Nullptr,
                        TemplateArgument::Integral(value, _) => TemplateArg::Integral(*value),
                        other => return Err(name::unsupported_template_arg(other, key)),
                    });
                }
            }
        }

        let node = TypeNode {
            name: key.clone(),
            shape,
            is_const,
            is_volatile,
            is_restrict,
            root: root_key,
            unqualified_root,
            unqualified,
            pointee,
            is_template,
            template_args,
        };
        self.registries.types.insert(key.clone(), node);

        Ok(key)
    }
}
