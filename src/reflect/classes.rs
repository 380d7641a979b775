//! The class registry.
//!
//! Walks class/struct declarations: base specifiers, nested classes and
//! enums (registered in their own registries, never inlined), data members,
//! static members, methods, and friend functions.

use clang::{Accessibility, Entity, EntityKind, StorageClass};

use super::{name, ReflectError, Reflector};
use crate::attr::collect_attrs;
use crate::model::{
    Base, ClassKeyword, ClassNode, Member, MemberKind, Method, MethodKind, Visibility,
};

fn accessibility_of(entity: Entity, what: &'static str) -> Result<Visibility, ReflectError> {
    match entity.get_accessibility() {
        Some(Accessibility::Public) => Ok(Visibility::Public),
        Some(Accessibility::Protected) => Ok(Visibility::Protected),
        Some(Accessibility::Private) => Ok(Visibility::Private),
        None => Err(ReflectError::Access(what)),
    }
}

impl Reflector {
    /// Register a class or struct declaration. Declarations without
    /// attributes are ignored.
    pub(crate) fn register_class(&mut self, entity: Entity) -> Result<(), ReflectError> {
        let class_name = name::qualified_name(entity);
        if self.registries.classes.contains_key(&class_name) {
            return Ok(());
        }

        let attrs = collect_attrs(entity)?;
        if attrs.is_empty() {
            return Ok(());
        }

        let keyword = match entity.get_kind() {
            EntityKind::ClassDecl => ClassKeyword::Class,
            EntityKind::StructDecl => ClassKeyword::Struct,
            _ => return Err(ReflectError::ClassCursor),
        };

        let mut node = ClassNode {
            name: class_name.clone(),
            keyword,
            attrs,
            is_abstract: false,
            bases: Vec::new(),
            members: Vec::new(),
            methods: Vec::new(),
        };

        for child in entity.get_children() {
            match child.get_kind() {
                EntityKind::BaseSpecifier => {
                    let visibility = accessibility_of(child, "base specifier")?;
                    let base_type = child.get_type().ok_or(ReflectError::BaseType)?;
                    let declaration = base_type.get_declaration().ok_or(ReflectError::BaseType)?;
                    node.bases.push(Base {
                        base_class: name::qualified_name(declaration),
                        visibility,
                    });
                }
                EntityKind::ClassDecl | EntityKind::StructDecl => self.register_class(child)?,
                EntityKind::EnumDecl => self.register_enum(child)?,
                EntityKind::FieldDecl => {
                    if let Some(member) = self.collect_member(child, MemberKind::Member)? {
                        node.members.push(member);
                    }
                }
                EntityKind::VarDecl => {
                    if let Some(member) = self.collect_member(child, MemberKind::Static)? {
                        node.members.push(member);
                    }
                }
                EntityKind::Method => {
                    if let Some(method) = self.collect_method(child)? {
                        node.methods.push(method);
                    }
                }
                EntityKind::FriendDecl => {
                    for friend in child.get_children() {
                        if friend.get_kind() == EntityKind::FunctionDecl {
                            if let Some(method) = self.collect_friend(friend)? {
                                node.methods.push(method);
                            }
                        }
                    }
                }
                EntityKind::FunctionDecl => {
                    // A free function inside a class body is only legal
                    // under a friend declaration.
                    if !collect_attrs(child)?.is_empty() {
                        return Err(ReflectError::StrayFunction);
                    }
                }
                _ => {}
            }
        }

        node.is_abstract = node.methods.iter().any(|m| m.is_pure);
        self.registries.classes.insert(class_name, node);

        Ok(())
    }

    fn collect_member(
        &mut self,
        entity: Entity,
        member_kind: MemberKind,
    ) -> Result<Option<Member>, ReflectError> {
        let attrs = collect_attrs(entity)?;
        if attrs.is_empty() {
            return Ok(None);
        }

        let what = match member_kind {
            MemberKind::Member => "member",
            MemberKind::Static => "variable",
        };
        let visibility = accessibility_of(entity, what)?;
        let ty = entity.get_type().ok_or(ReflectError::MissingType(what))?;

        Ok(Some(Member {
            name: entity.get_name().unwrap_or_default(),
            member_kind,
            attrs,
            visibility,
            ty: self.register_type(ty)?,
        }))
    }

    fn collect_method(&mut self, entity: Entity) -> Result<Option<Method>, ReflectError> {
        let attrs = collect_attrs(entity)?;
        if attrs.is_empty() {
            return Ok(None);
        }

        let visibility = accessibility_of(entity, "method")?;

        let method_kind = match entity.get_storage_class() {
            Some(StorageClass::None) => MethodKind::Method,
            Some(StorageClass::Static) => MethodKind::Static,
            _ => return Err(ReflectError::MethodStorage),
        };

        let result = entity
            .get_result_type()
            .ok_or(ReflectError::MissingType("method result"))?;

        Ok(Some(Method {
            name: entity.get_name().unwrap_or_default(),
            method_kind,
            is_const: entity.is_const_method(),
            is_virtual: entity.is_virtual_method(),
            is_pure: entity.is_pure_virtual_method(),
            attrs,
            visibility,
            return_type: self.register_type(result)?,
            args: self.collect_args(entity)?,
        }))
    }

    fn collect_friend(&mut self, entity: Entity) -> Result<Option<Method>, ReflectError> {
        let attrs = collect_attrs(entity)?;
        if attrs.is_empty() {
            return Ok(None);
        }

        let visibility = accessibility_of(entity, "function")?;
        let result = entity
            .get_result_type()
            .ok_or(ReflectError::MissingType("function result"))?;

        Ok(Some(Method {
            name: entity.get_name().unwrap_or_default(),
            method_kind: MethodKind::Friend,
            is_const: false,
            is_virtual: false,
            is_pure: false,
            attrs,
            visibility,
            return_type: self.register_type(result)?,
            args: self.collect_args(entity)?,
        }))
    }
}
