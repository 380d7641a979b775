//! Materializes the registries as Lua tables.
//!
//! Cross-table links become direct references to the target entry when the
//! key resolves, and fall back to the bare string key otherwise. Argument
//! and template-argument lists are 1-indexed. 64-bit integers cross the
//! boundary as decimal strings so no precision is lost.

use mlua::{Lua, Table, Value};

use crate::attr::Attr;
use crate::model::{Registries, TemplateArg};

/// Attributes cross as a key/value map; flags contribute presence (the
/// declaration was collected at all), not entries.
fn attrs_table(lua: &Lua, attrs: &[Attr]) -> mlua::Result<Table> {
    let table = lua.create_table()?;
    for attr in attrs {
        if let Some((key, value)) = attr.key_value() {
            table.set(key, value)?;
        }
    }
    Ok(table)
}

/// Link `entry[field]` to `registry[key]`, or to the bare key when the
/// target is absent. An empty key links nothing.
fn link(registry: &Table, entry: &Table, field: &str, key: &str) -> mlua::Result<()> {
    if key.is_empty() {
        return Ok(());
    }
    let target: Value = registry.get(key)?;
    if target.is_nil() {
        entry.set(field, key)
    } else {
        entry.set(field, target)
    }
}

fn build_types(lua: &Lua, registries: &Registries) -> mlua::Result<Table> {
    let types = lua.create_table()?;

    // Entries exist before any are filled so links can reference them.
    for key in registries.types.keys() {
        types.set(key.as_str(), lua.create_table()?)?;
    }

    for (key, node) in &registries.types {
        let entry: Table = types.get(key.as_str())?;

        entry.set("type_type", node.shape.as_str())?;
        entry.set("const", node.is_const)?;
        entry.set("volatile", node.is_volatile)?;
        entry.set("restrict", node.is_restrict)?;
        entry.set("name", node.name.as_str())?;

        link(&types, &entry, "root", &node.root)?;
        link(&types, &entry, "unqualified_root", &node.unqualified_root)?;
        link(&types, &entry, "unqualified", &node.unqualified)?;
        link(&types, &entry, "pointee", node.pointee.as_deref().unwrap_or(""))?;

        entry.set("is_template", node.is_template)?;
        if node.is_template {
            let arguments = lua.create_table()?;
            for (i, arg) in node.template_args.iter().enumerate() {
                let argument = lua.create_table()?;
                match arg {
                    TemplateArg::Type(target) => {
                        argument.set("argument_type", "type")?;
                        link(&types, &argument, "type", target)?;
                    }
                    TemplateArg::Nullptr => {
                        argument.set("argument_type", "nullptr")?;
                    }
                    TemplateArg::Integral(value) => {
                        argument.set("argument_type", "integral")?;
                        argument.set("integral", value.to_string())?;
                    }
                }
                arguments.set(i as i64 + 1, argument)?;
            }
            entry.set("template_arguments", arguments)?;
        }
    }

    Ok(types)
}

fn build_enums(lua: &Lua, registries: &Registries) -> mlua::Result<Table> {
    let enums = lua.create_table()?;

    for (key, node) in &registries.enums {
        let entry = lua.create_table()?;
        entry.set("name", node.name.as_str())?;
        entry.set("attributes", attrs_table(lua, &node.attrs)?)?;

        let elements = lua.create_table()?;
        for (element, value) in &node.elements {
            elements.set(element.as_str(), value.to_string())?;
        }
        entry.set("elements", elements)?;

        enums.set(key.as_str(), entry)?;
    }

    Ok(enums)
}

fn build_classes(lua: &Lua, registries: &Registries, types: &Table) -> mlua::Result<Table> {
    let classes = lua.create_table()?;

    for key in registries.classes.keys() {
        classes.set(key.as_str(), lua.create_table()?)?;
    }

    for (key, node) in &registries.classes {
        let entry: Table = classes.get(key.as_str())?;

        entry.set("name", node.name.as_str())?;
        entry.set("class_type", node.keyword.as_str())?;
        entry.set("attributes", attrs_table(lua, &node.attrs)?)?;
        entry.set("abstract", node.is_abstract)?;

        let bases = lua.create_table()?;
        for base in &node.bases {
            let base_entry = lua.create_table()?;
            link(&classes, &base_entry, "class", &base.base_class)?;
            base_entry.set("visibility", base.visibility.as_str())?;
            bases.set(base.base_class.as_str(), base_entry)?;
        }
        entry.set("bases", bases)?;

        let members = lua.create_table()?;
        for member in &node.members {
            let member_entry = lua.create_table()?;
            member_entry.set("name", member.name.as_str())?;
            member_entry.set("member_type", member.member_kind.as_str())?;
            member_entry.set("attributes", attrs_table(lua, &member.attrs)?)?;
            member_entry.set("visibility", member.visibility.as_str())?;
            link(types, &member_entry, "type", &member.ty)?;
            members.set(member.name.as_str(), member_entry)?;
        }
        entry.set("members", members)?;

        let methods = lua.create_table()?;
        for method in &node.methods {
            let method_entry = lua.create_table()?;
            method_entry.set("name", method.name.as_str())?;
            method_entry.set("method_type", method.method_kind.as_str())?;
            method_entry.set("attributes", attrs_table(lua, &method.attrs)?)?;
            method_entry.set("visibility", method.visibility.as_str())?;
            method_entry.set("const", method.is_const)?;
            method_entry.set("virtual", method.is_virtual)?;
            method_entry.set("pure", method.is_pure)?;
            link(types, &method_entry, "return_type", &method.return_type)?;

            let arguments = lua.create_table()?;
            for (i, arg) in method.args.iter().enumerate() {
                let argument = lua.create_table()?;
                link(types, &argument, "type", &arg.ty)?;
                argument.set("name", arg.name.as_str())?;
                argument.set("attributes", attrs_table(lua, &arg.attrs)?)?;
                arguments.set(i as i64 + 1, argument)?;
            }
            method_entry.set("arguments", arguments)?;

            methods.set(method.name.as_str(), method_entry)?;
        }
        entry.set("methods", methods)?;
    }

    Ok(classes)
}

fn build_functions(lua: &Lua, registries: &Registries, types: &Table) -> mlua::Result<Table> {
    let functions = lua.create_table()?;

    for (key, node) in &registries.functions {
        let entry = lua.create_table()?;
        entry.set("name", node.name.as_str())?;
        entry.set("attributes", attrs_table(lua, &node.attrs)?)?;
        link(types, &entry, "return_type", &node.return_type)?;

        let arguments = lua.create_table()?;
        for (i, arg) in node.args.iter().enumerate() {
            let argument = lua.create_table()?;
            link(types, &argument, "type", &arg.ty)?;
            argument.set("name", arg.name.as_str())?;
            argument.set("attributes", attrs_table(lua, &arg.attrs)?)?;
            arguments.set(i as i64 + 1, argument)?;
        }
        entry.set("arguments", arguments)?;

        functions.set(key.as_str(), entry)?;
    }

    Ok(functions)
}

/// Build the `types`, `enums`, `classes`, `functions` tables for one call
/// into the script.
pub(crate) fn build_tables(
    lua: &Lua,
    registries: &Registries,
) -> mlua::Result<(Table, Table, Table, Table)> {
    let types = build_types(lua, registries)?;
    let enums = build_enums(lua, registries)?;
    let classes = build_classes(lua, registries, &types)?;
    let functions = build_functions(lua, registries, &types)?;
    Ok((types, enums, classes, functions))
}
