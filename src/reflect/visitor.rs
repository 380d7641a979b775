//! Top-level dispatch over the translation unit.

use clang::{Entity, EntityKind};

use super::{ReflectError, Reflector};

impl Reflector {
    /// Dispatch every cursor located in the main file to its registry.
    ///
    /// Class templates and partial specializations are skipped (known
    /// limitation); anything unhandled is descended into so declarations
    /// inside namespaces and linkage specs are still found.
    pub(crate) fn visit_translation_unit(&mut self, entity: Entity) -> Result<(), ReflectError> {
        for child in entity.get_children() {
            let in_main_file = child
                .get_location()
                .is_some_and(|location| location.is_in_main_file());
            if !in_main_file {
                continue;
            }

            match child.get_kind() {
                EntityKind::ClassTemplate | EntityKind::ClassTemplatePartialSpecialization => {}
                EntityKind::ClassDecl | EntityKind::StructDecl => self.register_class(child)?,
                EntityKind::EnumDecl => self.register_enum(child)?,
                EntityKind::FunctionDecl => self.register_function(child)?,
                _ => self.visit_translation_unit(child)?,
            }
        }
        Ok(())
    }
}
