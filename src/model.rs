//! The reflected model: the bridge between clang extraction and the
//! scripted backend.
//!
//! Everything here is clang-independent: entities are interned by canonical
//! string key and reference each other by key, never by handle or index.
//! This is what makes the type registry closed under reference and safe for
//! self-referential templates, and it is the exact shape the script bridge
//! materializes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::attr::Attr;

/// The shape of a type node: a plain type, or one layer of reference or
/// pointer around a pointee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeShape {
    Type,
    LValueReference,
    RValueReference,
    Pointer,
    BlockPointer,
    ObjCObjectPointer,
    MemberPointer,
}

impl TypeShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeShape::Type => "type",
            TypeShape::LValueReference => "lvalue_reference",
            TypeShape::RValueReference => "rvalue_reference",
            TypeShape::Pointer => "pointer",
            TypeShape::BlockPointer => "block_pointer",
            TypeShape::ObjCObjectPointer => "objc_object_pointer",
            TypeShape::MemberPointer => "member_pointer",
        }
    }
}

/// A template argument on a type's declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "argument_type", content = "value", rename_all = "snake_case")]
pub enum TemplateArg {
    /// A type argument, by canonical key.
    Type(String),
    /// A `nullptr` argument.
    Nullptr,
    /// An integral argument (64-bit signed).
    Integral(i64),
}

/// A canonical type descriptor, interned in [`Registries::types`] under its
/// canonical name.
#[derive(Debug, Clone, Serialize)]
pub struct TypeNode {
    /// Canonical spelling; also the registry key.
    pub name: String,
    #[serde(rename = "type_type")]
    pub shape: TypeShape,
    /// Qualifiers on this type node itself.
    #[serde(rename = "const")]
    pub is_const: bool,
    #[serde(rename = "volatile")]
    pub is_volatile: bool,
    #[serde(rename = "restrict")]
    pub is_restrict: bool,
    /// The type with all top-level references and pointers peeled off.
    pub root: String,
    /// The declaration's own type if the root is declared, else the root
    /// with its own qualifiers stripped.
    pub unqualified_root: String,
    /// This type with its own top-level qualifiers stripped.
    pub unqualified: String,
    /// The referenced or pointed-to type, for non-`Type` shapes.
    pub pointee: Option<String>,
    pub is_template: bool,
    #[serde(rename = "template_arguments")]
    pub template_args: Vec<TemplateArg>,
}

impl TypeNode {
    /// Placeholder inserted before neighbor registration recurses, so that
    /// self-referential types terminate.
    pub(crate) fn placeholder(name: String) -> Self {
        TypeNode {
            name: name.clone(),
            shape: TypeShape::Type,
            is_const: false,
            is_volatile: false,
            is_restrict: false,
            root: String::new(),
            unqualified_root: String::new(),
            unqualified: String::new(),
            pointee: None,
            is_template: false,
            template_args: Vec::new(),
        }
    }
}

/// Member access control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

/// An enum declaration.
#[derive(Debug, Clone, Serialize)]
pub struct EnumNode {
    /// Fully-qualified name; also the registry key.
    pub name: String,
    #[serde(rename = "attributes")]
    pub attrs: Vec<Attr>,
    /// Element name to signed 64-bit value.
    pub elements: BTreeMap<String, i64>,
}

/// Whether a class was declared with `struct` or `class`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKeyword {
    Struct,
    Class,
}

impl ClassKeyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassKeyword::Struct => "struct",
            ClassKeyword::Class => "class",
        }
    }
}

/// A base-class specifier.
#[derive(Debug, Clone, Serialize)]
pub struct Base {
    /// Fully-qualified name of the base class (a key into the class
    /// registry when the base is itself annotated).
    pub base_class: String,
    pub visibility: Visibility,
}

/// Data member kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Member,
    Static,
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Member => "member",
            MemberKind::Static => "static",
        }
    }
}

/// A data member.
#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub name: String,
    #[serde(rename = "member_type")]
    pub member_kind: MemberKind,
    #[serde(rename = "attributes")]
    pub attrs: Vec<Attr>,
    pub visibility: Visibility,
    /// Canonical type key.
    #[serde(rename = "type")]
    pub ty: String,
}

/// Method kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Method,
    Static,
    Friend,
}

impl MethodKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MethodKind::Method => "method",
            MethodKind::Static => "static",
            MethodKind::Friend => "friend",
        }
    }
}

/// A function or method argument.
#[derive(Debug, Clone, Serialize)]
pub struct Arg {
    /// Canonical type key.
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
    #[serde(rename = "attributes")]
    pub attrs: Vec<Attr>,
}

/// A method, static method, or friend function of a class.
#[derive(Debug, Clone, Serialize)]
pub struct Method {
    pub name: String,
    #[serde(rename = "method_type")]
    pub method_kind: MethodKind,
    #[serde(rename = "const")]
    pub is_const: bool,
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    #[serde(rename = "pure")]
    pub is_pure: bool,
    #[serde(rename = "attributes")]
    pub attrs: Vec<Attr>,
    pub visibility: Visibility,
    /// Canonical type key.
    pub return_type: String,
    pub args: Vec<Arg>,
}

/// A class or struct declaration.
#[derive(Debug, Clone, Serialize)]
pub struct ClassNode {
    /// Fully-qualified name; also the registry key.
    pub name: String,
    #[serde(rename = "class_type")]
    pub keyword: ClassKeyword,
    #[serde(rename = "attributes")]
    pub attrs: Vec<Attr>,
    /// True iff any method is pure virtual.
    #[serde(rename = "abstract")]
    pub is_abstract: bool,
    pub bases: Vec<Base>,
    pub members: Vec<Member>,
    pub methods: Vec<Method>,
}

/// A top-level free function.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionNode {
    pub name: String,
    #[serde(rename = "attributes")]
    pub attrs: Vec<Attr>,
    /// Canonical type key.
    pub return_type: String,
    pub args: Vec<Arg>,
}

/// The four registries populated by one reflection pass over a translation
/// unit.
///
/// All cross-references between entries are canonical string keys. A value
/// is populated during a single parse and then read-only; [`reset`] empties
/// it before the next source so no interning state leaks across translation
/// units.
///
/// [`reset`]: Registries::reset
#[derive(Debug, Default, Serialize)]
pub struct Registries {
    pub types: BTreeMap<String, TypeNode>,
    pub enums: BTreeMap<String, EnumNode>,
    pub classes: BTreeMap<String, ClassNode>,
    pub functions: BTreeMap<String, FunctionNode>,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty all four registries.
    pub fn reset(&mut self) {
        self.types.clear();
        self.enums.clear();
        self.classes.clear();
        self.functions.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
            && self.enums.is_empty()
            && self.classes.is_empty()
            && self.functions.is_empty()
    }
}
