//! The Luau script backend.
//!
//! The process script is compiled once, run to completion on a fresh
//! thread, and must return a table exposing two callables:
//!
//! - `SourceProcess(source, types, enums, classes, functions) -> string`
//! - `GlueProcess(sources) -> string`
//!
//! The reflected model crosses the boundary as nested tables built by
//! `bridge`; everything the script sees is strings, booleans, and tables.

mod bridge;

use mlua::{Function, Lua, MultiValue, Table, ThreadStatus, Value};
use thiserror::Error;

use crate::model::Registries;

/// Errors raised while loading or running the process script.
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("script failed to compile: {0}")]
    Compile(String),
    #[error("script failed to execute: {0}")]
    Execute(String),
    #[error("script thread yielded unexpectedly")]
    Yielded,
    #[error("script did not return `table`")]
    NotTable,
    #[error("script did not return `string`")]
    NotString,
    #[error("script does not expose `{0}`")]
    MissingEntryPoint(&'static str),
    #[error(transparent)]
    Lua(#[from] mlua::Error),
}

/// A loaded process script and the runtime it lives in.
pub struct ScriptHost {
    lua: Lua,
    root: Table,
}

impl ScriptHost {
    /// Compile and run the script chunk, keeping the returned root table.
    ///
    /// The chunk runs on its own thread and must finish without yielding.
    pub fn load(source: &str) -> Result<Self, ScriptError> {
        let lua = Lua::new();

        let chunk = lua
            .load(source)
            .set_name("=process")
            .into_function()
            .map_err(|e| ScriptError::Compile(e.to_string()))?;

        let thread = lua.create_thread(chunk)?;
        let returned = thread
            .resume::<MultiValue>(())
            .map_err(|e| ScriptError::Execute(e.to_string()))?;
        if thread.status() == ThreadStatus::Resumable {
            return Err(ScriptError::Yielded);
        }

        let root = match returned.into_iter().next() {
            Some(Value::Table(table)) => table,
            _ => return Err(ScriptError::NotTable),
        };

        Ok(Self { lua, root })
    }

    fn entry_point(&self, name: &'static str) -> Result<Function, ScriptError> {
        self.root
            .get::<Function>(name)
            .map_err(|_| ScriptError::MissingEntryPoint(name))
    }

    fn call_for_string(
        &self,
        function: &Function,
        args: impl mlua::IntoLuaMulti,
    ) -> Result<Vec<u8>, ScriptError> {
        let out = function
            .call::<mlua::String>(args)
            .map_err(|e| match e {
                mlua::Error::FromLuaConversionError { .. } => ScriptError::NotString,
                other => ScriptError::Execute(other.to_string()),
            })?;
        Ok(out.as_bytes().to_vec())
    }

    /// Run `SourceProcess` for one source; the result is the per-source
    /// output artifact.
    pub fn source_process(
        &self,
        source: &str,
        registries: &Registries,
    ) -> Result<Vec<u8>, ScriptError> {
        let function = self.entry_point("SourceProcess")?;
        let (types, enums, classes, functions) = bridge::build_tables(&self.lua, registries)?;
        self.call_for_string(&function, (source, types, enums, classes, functions))
    }

    /// Run `GlueProcess` over all `(source, out)` pairs; the result is the
    /// aggregated glue artifact.
    pub fn glue_process(&self, pairs: &[(String, String)]) -> Result<Vec<u8>, ScriptError> {
        let function = self.entry_point("GlueProcess")?;

        let sources = self.lua.create_table()?;
        for (i, (source, out)) in pairs.iter().enumerate() {
            let entry = self.lua.create_table()?;
            entry.set("source", source.as_str())?;
            entry.set("out", out.as_str())?;
            sources.set(i as i64 + 1, entry)?;
        }

        self.call_for_string(&function, sources)
    }
}
