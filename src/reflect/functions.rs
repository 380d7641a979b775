//! The function registry for top-level free functions.

use clang::{Entity, EntityKind};

use super::{name, ReflectError, Reflector};
use crate::attr::collect_attrs;
use crate::model::{Arg, FunctionNode};

impl Reflector {
    /// Register a top-level free function. Declarations without attributes
    /// are ignored.
    pub(crate) fn register_function(&mut self, entity: Entity) -> Result<(), ReflectError> {
        let function_name = name::qualified_name(entity);
        if self.registries.functions.contains_key(&function_name) {
            return Ok(());
        }

        let attrs = collect_attrs(entity)?;
        if attrs.is_empty() {
            return Ok(());
        }

        let result = entity
            .get_result_type()
            .ok_or(ReflectError::MissingType("function result"))?;
        let return_type = self.register_type(result)?;
        let args = self.collect_args(entity)?;

        self.registries.functions.insert(
            function_name.clone(),
            FunctionNode {
                name: function_name,
                attrs,
                return_type,
                args,
            },
        );

        Ok(())
    }

    /// Collect the parameter list of a function-like cursor.
    pub(crate) fn collect_args(&mut self, entity: Entity) -> Result<Vec<Arg>, ReflectError> {
        let mut args = Vec::new();
        for child in entity.get_children() {
            if child.get_kind() != EntityKind::ParmDecl {
                continue;
            }
            let ty = child
                .get_type()
                .ok_or(ReflectError::MissingType("parameter"))?;
            args.push(Arg {
                ty: self.register_type(ty)?,
                name: child.get_name().unwrap_or_default(),
                attrs: collect_attrs(child)?,
            });
        }
        Ok(args)
    }
}
