//! The enum registry.
//!
//! Enumerator values follow the C++ rule: each unassigned enumerator is one
//! more than its predecessor; an initialized enumerator takes its
//! compile-time-evaluated value and resets the counter.

use std::collections::BTreeMap;

use clang::{Entity, EntityKind, EvaluationResult};

use super::{name, ReflectError, Reflector};
use crate::attr::collect_attrs;
use crate::model::EnumNode;

impl Reflector {
    /// Register an enum declaration. Declarations without attributes are
    /// ignored.
    pub(crate) fn register_enum(&mut self, entity: Entity) -> Result<(), ReflectError> {
        let enum_name = name::qualified_name(entity);
        if self.registries.enums.contains_key(&enum_name) {
            return Ok(());
        }

        let attrs = collect_attrs(entity)?;
        if attrs.is_empty() {
            return Ok(());
        }

        let mut elements = BTreeMap::new();
        let mut next_value: i64 = 0;

        for child in entity.get_children() {
            if child.get_kind() != EntityKind::EnumConstantDecl {
                continue;
            }

            let element = child.get_name().unwrap_or_default();
            elements.insert(element.clone(), next_value);
            next_value = next_value.wrapping_add(1);

            // An initializer expression overrides the running value.
            for initializer in child.get_children() {
                match initializer.evaluate() {
                    None => {}
                    Some(EvaluationResult::SignedInteger(value)) => {
                        elements.insert(element.clone(), value);
                        next_value = value.wrapping_add(1);
                    }
                    Some(EvaluationResult::UnsignedInteger(value)) => {
                        let value = value as i64;
                        elements.insert(element.clone(), value);
                        next_value = value.wrapping_add(1);
                    }
                    Some(_) => return Err(ReflectError::EnumValue(enum_name)),
                }
            }
        }

        self.registries.enums.insert(
            enum_name.clone(),
            EnumNode {
                name: enum_name,
                attrs,
                elements,
            },
        );

        Ok(())
    }
}
