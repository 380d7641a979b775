//! Integration tests for the libclang reflection pipeline.
//!
//! Each test writes a self-contained annotated C++ snippet to a scratch
//! directory and reflects it. libclang allows one `Clang` instance per
//! process, so the tests serialize on a shared lock.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use clang::Clang;
use tempfile::TempDir;

use reflectgen::{
    reflect_file, ClassKeyword, CompileOptions, MemberKind, MethodKind, ReflectError, Registries,
    TemplateArg, TypeShape, Visibility,
};

static CLANG_LOCK: Mutex<()> = Mutex::new(());

/// The annotation macros, inlined so snippets need no include paths.
const MACROS: &str = r#"
#define LEON __attribute__((annotate("@leon")))
#define LEON_KV(key, value) __attribute__((annotate("@leonkv " #key " " #value)))
#define LEON_V(value) __attribute__((annotate("@leonkv " #value " \"true\"")))
"#;

fn reflect_snippet(snippet: &str) -> Result<Registries, ReflectError> {
    let _guard = CLANG_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let clang = Clang::new().expect("libclang should be available");

    let dir = TempDir::new().expect("should create tempdir");
    let path = dir.path().join("snippet.h");
    fs::write(&path, format!("{}\n{}", MACROS, snippet)).expect("should write snippet");

    reflect_file(&clang, &path, &CompileOptions::default())
}

/// Every key a type node references must resolve in the same registry.
fn assert_closed(registries: &Registries) {
    for node in registries.types.values() {
        for key in [&node.root, &node.unqualified, &node.unqualified_root] {
            assert!(
                key.is_empty() || registries.types.contains_key(key.as_str()),
                "dangling key {:?} referenced by {:?}",
                key,
                node.name
            );
        }
        if let Some(pointee) = &node.pointee {
            assert!(
                registries.types.contains_key(pointee.as_str()),
                "dangling pointee {:?} referenced by {:?}",
                pointee,
                node.name
            );
        }
        for arg in &node.template_args {
            if let TemplateArg::Type(key) = arg {
                assert!(
                    registries.types.contains_key(key.as_str()),
                    "dangling template argument {:?} referenced by {:?}",
                    key,
                    node.name
                );
            }
        }
    }
}

#[test]
fn test_basic_class_and_method() {
    let reg = reflect_snippet(
        r#"
struct LEON S {
    int LEON x;
    void LEON f(int y) const;
};
"#,
    )
    .expect("should reflect");

    let class = reg.classes.get("S").expect("S should be registered");
    assert_eq!(class.keyword, ClassKeyword::Struct);
    assert!(!class.is_abstract);
    assert_eq!(class.attrs.len(), 1);
    assert!(class.bases.is_empty());

    assert_eq!(class.members.len(), 1);
    let member = &class.members[0];
    assert_eq!(member.name, "x");
    assert_eq!(member.member_kind, MemberKind::Member);
    assert_eq!(member.ty, "int");
    assert_eq!(member.visibility, Visibility::Public);

    assert_eq!(class.methods.len(), 1);
    let method = &class.methods[0];
    assert_eq!(method.name, "f");
    assert_eq!(method.method_kind, MethodKind::Method);
    assert!(method.is_const);
    assert!(!method.is_virtual);
    assert!(!method.is_pure);
    assert_eq!(method.visibility, Visibility::Public);
    assert_eq!(method.return_type, "void");
    assert_eq!(method.args.len(), 1);
    assert_eq!(method.args[0].ty, "int");
    assert_eq!(method.args[0].name, "y");

    assert_closed(&reg);
}

#[test]
fn test_enum_with_arithmetic_initializers() {
    let reg = reflect_snippet(
        r#"
enum LEON_KV("enum", "E") E { A = 0, B = 1, C = 10, D = C + B, E_ = D + 1000, F, G };
"#,
    )
    .expect("should reflect");

    let node = reg.enums.get("E").expect("E should be registered");
    assert_eq!(node.attrs[0].key_value(), Some(("enum", "E")));

    let expect = [
        ("A", 0),
        ("B", 1),
        ("C", 10),
        ("D", 11),
        ("E_", 1011),
        ("F", 1012),
        ("G", 1013),
    ];
    assert_eq!(node.elements.len(), expect.len());
    for (name, value) in expect {
        assert_eq!(node.elements.get(name), Some(&value), "element {}", name);
    }
}

#[test]
fn test_qualifier_round_trip() {
    let reg = reflect_snippet(
        r#"
void LEON q(const volatile int *const &p);
"#,
    )
    .expect("should reflect");

    let function = reg.functions.get("q").expect("q should be registered");
    let key = &function.args[0].ty;
    assert_eq!(key, "const volatile int *const &");

    let node = reg.types.get(key).expect("argument type should intern");
    assert_eq!(node.shape, TypeShape::LValueReference);
    assert!(!node.is_const);
    assert_eq!(node.pointee.as_deref(), Some("const volatile int *const"));
    assert_eq!(node.root, "const volatile int");
    assert_eq!(node.unqualified_root, "int");
    // References carry no top-level cv, so the unqualified form is the type
    // itself.
    assert_eq!(node.unqualified, *key);

    let root = reg.types.get("const volatile int").expect("root interns");
    assert!(root.is_const);
    assert!(root.is_volatile);
    assert!(!root.is_restrict);
    assert_eq!(root.unqualified, "int");

    assert_closed(&reg);
}

#[test]
fn test_inheritance_and_abstract() {
    let reg = reflect_snippet(
        r#"
class LEON W { virtual void LEON Override() = 0; };
class U {};
class LEON_KV("type", "engine") A : public W, public U {
public:
    void LEON Override() override {}
};
"#,
    )
    .expect("should reflect");

    let w = reg.classes.get("W").expect("W should be registered");
    assert!(w.is_abstract);
    assert!(w.methods[0].is_virtual);
    assert!(w.methods[0].is_pure);
    assert_eq!(w.methods[0].visibility, Visibility::Private);

    let a = reg.classes.get("A").expect("A should be registered");
    assert!(!a.is_abstract);
    assert_eq!(a.keyword, ClassKeyword::Class);
    assert_eq!(a.bases.len(), 2);
    assert_eq!(a.bases[0].base_class, "W");
    assert_eq!(a.bases[0].visibility, Visibility::Public);
    assert_eq!(a.bases[1].base_class, "U");
    assert_eq!(a.bases[1].visibility, Visibility::Public);

    // U has no attributes: referenced by name, absent from the registry.
    assert!(!reg.classes.contains_key("U"));
}

#[test]
fn test_friend_function() {
    let reg = reflect_snippet(
        r#"
class LEON F {
public:
    friend void LEON Friend() {}
};
"#,
    )
    .expect("should reflect");

    let class = reg.classes.get("F").expect("F should be registered");
    assert_eq!(class.methods.len(), 1);
    let method = &class.methods[0];
    assert_eq!(method.name, "Friend");
    assert_eq!(method.method_kind, MethodKind::Friend);
    assert_eq!(method.return_type, "void");
    assert!(method.args.is_empty());
}

#[test]
fn test_function_type_parameter_fails() {
    let err = reflect_snippet(
        r#"
void LEON bad(void (*callback)(int));
"#,
    )
    .expect_err("function types should be rejected");

    assert!(
        err.to_string()
            .contains("Function types currently unsupported"),
        "unexpected error: {}",
        err
    );
}

#[test]
fn test_malformed_key_value_fails() {
    let err = reflect_snippet(
        r#"
struct LEON_KV("", "value") Broken {};
"#,
    )
    .expect_err("empty key should be rejected");

    assert_eq!(err.to_string(), "LEON_KV malformed");
}

#[test]
fn test_unannotated_declarations_are_ignored() {
    let reg = reflect_snippet(
        r#"
struct Plain { int field; };
enum Bare { One, Two };
void helper(int);
struct LEON Kept {};
"#,
    )
    .expect("should reflect");

    assert!(!reg.classes.contains_key("Plain"));
    assert!(reg.enums.is_empty());
    assert!(reg.functions.is_empty());
    assert!(reg.classes.contains_key("Kept"));
}

#[test]
fn test_nested_types_register_qualified() {
    let reg = reflect_snippet(
        r#"
struct LEON Outer {
    struct LEON Inner { int LEON depth; };
    enum LEON_KV("enum", "Mode") Mode { Off = 0, On };
};
"#,
    )
    .expect("should reflect");

    assert!(reg.classes.contains_key("Outer"));
    let inner = reg
        .classes
        .get("Outer::Inner")
        .expect("nested class should register under its qualified name");
    assert_eq!(inner.members[0].name, "depth");

    let mode = reg
        .enums
        .get("Outer::Mode")
        .expect("nested enum should register under its qualified name");
    assert_eq!(mode.elements.get("Off"), Some(&0));
    assert_eq!(mode.elements.get("On"), Some(&1));
}

#[test]
fn test_namespace_qualified_names() {
    let reg = reflect_snippet(
        r#"
namespace game {
namespace scene {
struct LEON Thing { int LEON id; };
}
void LEON Spawn(scene::Thing &thing);
}
"#,
    )
    .expect("should reflect");

    assert!(reg.classes.contains_key("game::scene::Thing"));
    let spawn = reg
        .functions
        .get("game::Spawn")
        .expect("namespaced function should register");
    assert_eq!(spawn.args[0].ty, "game::scene::Thing &");
}

#[test]
fn test_template_member_type() {
    let reg = reflect_snippet(
        r#"
template <typename T> struct LEON Box { T value; };
struct LEON Holder {
    Box<int> LEON contents;
};
"#,
    )
    .expect("should reflect");

    // Class templates themselves are skipped at the top level.
    assert!(!reg.classes.contains_key("Box"));

    let holder = reg.classes.get("Holder").expect("Holder registers");
    assert_eq!(holder.members[0].ty, "Box<int>");

    let boxed = reg.types.get("Box<int>").expect("Box<int> interns");
    assert!(boxed.is_template);
    assert_eq!(boxed.template_args, vec![TemplateArg::Type("int".into())]);

    assert_closed(&reg);
}

#[test]
fn test_static_members_and_methods() {
    let reg = reflect_snippet(
        r#"
struct LEON Counter {
    static int LEON total;
    static void LEON Bump();
    void LEON Read() const;
};
"#,
    )
    .expect("should reflect");

    let class = reg.classes.get("Counter").expect("Counter registers");

    let total = &class.members[0];
    assert_eq!(total.name, "total");
    assert_eq!(total.member_kind, MemberKind::Static);

    let bump = class.methods.iter().find(|m| m.name == "Bump").unwrap();
    assert_eq!(bump.method_kind, MethodKind::Static);
    assert!(!bump.is_const);

    let read = class.methods.iter().find(|m| m.name == "Read").unwrap();
    assert_eq!(read.method_kind, MethodKind::Method);
    assert!(read.is_const);
}

#[test]
fn test_visibility_sections() {
    let reg = reflect_snippet(
        r#"
class LEON Guarded {
public:
    int LEON open;
protected:
    int LEON shielded;
private:
    int LEON hidden;
};
"#,
    )
    .expect("should reflect");

    let class = reg.classes.get("Guarded").expect("Guarded registers");
    let vis: Vec<_> = class
        .members
        .iter()
        .map(|m| (m.name.as_str(), m.visibility))
        .collect();
    assert_eq!(
        vis,
        vec![
            ("open", Visibility::Public),
            ("shielded", Visibility::Protected),
            ("hidden", Visibility::Private),
        ]
    );
}

#[test]
fn test_registration_is_idempotent() {
    let source = r#"
struct LEON Pair {
    int LEON first;
    int LEON second;
};
"#;

    let reg = reflect_snippet(source).expect("should reflect");
    // Both members intern the same type once.
    assert_eq!(reg.classes["Pair"].members.len(), 2);
    assert!(reg.types.contains_key("int"));

    // A second pass over the same source yields the same registries.
    let again = reflect_snippet(source).expect("should reflect again");
    let keys: Vec<_> = reg.types.keys().collect();
    let again_keys: Vec<_> = again.types.keys().collect();
    assert_eq!(keys, again_keys);
}

#[test]
fn test_value_as_flag_shorthand() {
    let reg = reflect_snippet(
        r#"
struct LEON_V("serialize") Saved { int LEON data; };
"#,
    )
    .expect("should reflect");

    let class = reg.classes.get("Saved").expect("Saved registers");
    assert_eq!(class.attrs[0].key_value(), Some(("serialize", "true")));
}

#[test]
fn test_component_fixture() {
    let _guard = CLANG_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let clang = Clang::new().expect("libclang should be available");

    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let source = manifest.join("testdata/component.h");
    let options = CompileOptions {
        includes: vec![manifest.join("include").to_string_lossy().into_owned()],
        ..Default::default()
    };

    let reg = reflect_file(&clang, &source, &options).expect("fixture should reflect");

    // Annotated declarations are present, unannotated ones are not.
    for name in [
        "demo::Shell",
        "demo::Shell::Core",
        "demo::Widget",
        "demo::scene::Sprite",
    ] {
        assert!(reg.classes.contains_key(name), "missing class {}", name);
    }
    assert!(!reg.classes.contains_key("demo::PlainBase"));
    assert!(!reg.classes.contains_key("demo::SilentWidget"));

    let palette = reg.enums.get("demo::Palette").expect("Palette registers");
    for (name, value) in [
        ("Red", 0),
        ("Green", 1),
        ("Blue", 10),
        ("Cyan", 11),
        ("Magenta", 1011),
        ("Yellow", 1012),
        ("Black", 1013),
    ] {
        assert_eq!(palette.elements.get(name), Some(&value), "element {}", name);
    }

    let layer = reg
        .enums
        .get("demo::scene::Sprite::Layer")
        .expect("nested enum registers");
    assert_eq!(layer.elements.get("Background"), Some(&0));
    assert_eq!(layer.elements.get("Foreground"), Some(&1));

    let describe = reg
        .functions
        .get("demo::Describe")
        .expect("Describe registers");
    assert_eq!(describe.return_type, "void");
    assert_eq!(describe.args[0].ty, "const demo::Shell::Core &");

    let widget = reg.classes.get("demo::Widget").unwrap();
    assert!(widget.is_abstract);

    let sprite = reg.classes.get("demo::scene::Sprite").unwrap();
    assert!(!sprite.is_abstract);
    assert_eq!(sprite.attrs[0].key_value(), Some(("type", "engine")));
    assert_eq!(sprite.bases[0].base_class, "demo::Widget");
    assert_eq!(sprite.bases[1].base_class, "demo::SilentWidget");

    let frame = sprite.members.iter().find(|m| m.name == "frame").unwrap();
    assert_eq!(frame.member_kind, MemberKind::Member);
    assert_eq!(frame.ty, "unsigned short");

    let live = sprite
        .members
        .iter()
        .find(|m| m.name == "live_count")
        .unwrap();
    assert_eq!(live.member_kind, MemberKind::Static);
    assert_eq!(live.ty, "int");

    let draw = sprite.methods.iter().find(|m| m.name == "Draw").unwrap();
    assert!(draw.is_virtual);
    assert!(!draw.is_pure);

    let advance = sprite.methods.iter().find(|m| m.name == "Advance").unwrap();
    assert_eq!(advance.args.len(), 6);
    let names: Vec<_> = advance.args.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["base", "core", "palette", "layer", "delta", "cursor"]
    );
    assert_eq!(advance.args[4].ty, "int &&");
    assert_eq!(advance.args[5].ty, "const volatile int *const &");

    let attach = sprite.methods.iter().find(|m| m.name == "Attach").unwrap();
    assert_eq!(attach.method_kind, MethodKind::Friend);

    let reset = sprite.methods.iter().find(|m| m.name == "Reset").unwrap();
    assert_eq!(reset.method_kind, MethodKind::Static);

    let commit = sprite.methods.iter().find(|m| m.name == "Commit").unwrap();
    assert!(commit.is_const);

    assert_closed(&reg);
}
