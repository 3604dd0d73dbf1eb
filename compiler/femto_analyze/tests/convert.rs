//! Analyzer tests: parse in-memory sources, analyze, inspect AST2.

use femto_analyze::analyze;
use femto_diagnostic::{CollectSink, Reporter};
use femto_ir::sem::{self, DeclBody, ExprKind, StatKind, TypeKind};
use femto_parse::{Parser, SourceReader};
use rustc_hash::FxHashMap;

struct MapReader(FxHashMap<String, String>);

impl SourceReader for MapReader {
    fn read(&self, path: &str) -> Result<String, String> {
        self.0
            .get(path)
            .cloned()
            .ok_or_else(|| "no such file".to_string())
    }
}

fn analyze_src(
    files: &[(&str, &str)],
    check: impl FnOnce(&[sem::Module], &Reporter, &CollectSink),
) {
    let sink = CollectSink::new();
    let reporter = Reporter::new(5, &sink);
    let reader = MapReader(
        files
            .iter()
            .map(|(p, s)| (p.to_string(), s.to_string()))
            .collect(),
    );
    let mut parser = Parser::new(8, 12, &reader, &reporter);
    parser.parse_src(files[0].0, vec![], 0);
    assert_eq!(reporter.err_count(), 0, "parse failed: {:?}", sink.messages());
    let modules = analyze(&parser.modules, 8, 0, &reporter);
    check(&modules, &reporter, &sink);
}

#[test]
fn test_var_decl_types_convert() {
    analyze_src(
        &[(
            "/m.fc",
            "const int X = 3; u8* Name = null; f64 Ratio = 1.5; bool Flag = true;",
        )],
        |modules, rep, sink| {
            assert_eq!(rep.err_count(), 0, "{:?}", sink.messages());
            let m = &modules[0];
            assert_eq!(m.find_decl("X").unwrap().ty.name, "int");
            let name = m.find_decl("Name").unwrap();
            assert_eq!(name.ty.kind, TypeKind::Ptr);
            assert_eq!(name.ty.elem().unwrap().name, "u8");
            assert_eq!(m.find_decl("Ratio").unwrap().ty.name, "f64");
            assert_eq!(m.find_decl("Flag").unwrap().ty.name, "bool");
        },
    );
}

#[test]
fn test_decl_uids_are_unique() {
    analyze_src(
        &[(
            "/m.fc",
            "struct S { int a; } enum E { x } const int C = 1; int F() { return C; }",
        )],
        |modules, _, _| {
            let mut uids: Vec<i64> = modules[0].decls.iter().map(|d| d.uid).collect();
            assert!(uids.iter().all(|&u| u > 0));
            uids.sort_unstable();
            uids.dedup();
            assert_eq!(uids.len(), modules[0].decls.len(), "uids must be unique");
        },
    );
}

#[test]
fn test_function_signature_conversion() {
    analyze_src(
        &[("/m.fc", "i32 Mix(i32 a, u8* b, int[] c) { return a; }")],
        |modules, rep, sink| {
            assert_eq!(rep.err_count(), 0, "{:?}", sink.messages());
            let f = modules[0].find_decl("Mix").unwrap();
            assert_eq!(f.ty.kind, TypeKind::Func);
            assert_eq!(f.ty.elem().unwrap().name, "i32");
            assert_eq!(f.ty.indirect.len(), 3);
            assert_eq!(f.ty.indirect[0].name, "i32");
            assert_eq!(f.ty.indirect[1].kind, TypeKind::Ptr);
            assert_eq!(f.ty.indirect[2].kind, TypeKind::Slice);
        },
    );
}

#[test]
fn test_struct_member_types_convert() {
    analyze_src(
        &[("/m.fc", "struct Pair { i32 a; i64 b; }")],
        |modules, _, _| {
            let p = modules[0].find_decl("Pair").unwrap();
            assert_eq!(p.ty.kind, TypeKind::Struct);
            assert_eq!(p.ty.size, 16);
            let DeclBody::Struct(s) = &p.body else { panic!() };
            assert_eq!(s.mem_offsets, vec![0, 8]);
            assert!(s.mem_types[0].is_sint());
        },
    );
}

#[test]
fn test_enum_decl_converts_with_backing_width() {
    analyze_src(&[("/m.fc", "enum E { A = 1000, B }")], |modules, _, _| {
        let e = modules[0].find_decl("E").unwrap();
        assert_eq!(e.ty.kind, TypeKind::Enum);
        assert_eq!(e.ty.size, 2);
        let DeclBody::Enum(ed) = &e.body else { panic!() };
        assert_eq!(ed.mem_values, vec![1000, 1001]);
    });
}

#[test]
fn test_locals_shadow_globals() {
    analyze_src(
        &[(
            "/m.fc",
            "define int V = 1;\nint F() { int V = 2; return V; }",
        )],
        |modules, rep, sink| {
            assert_eq!(rep.err_count(), 0, "{:?}", sink.messages());
            // the returned V must be the local (empty uname handle)
            let f = modules[0].find_decl("F").unwrap();
            let DeclBody::Func(fd) = &f.body else { panic!() };
            let StatKind::Scope(brace) = &fd.body.as_ref().unwrap().body[0].kind else {
                panic!()
            };
            // brace body: local declaration of V, then the return
            let StatKind::Return { value: Some(v) } = &brace.body[1].kind else {
                panic!()
            };
            let ExprKind::Name { uname, .. } = &v.kind else {
                panic!()
            };
            assert!(uname.is_empty(), "local binding expected, got module var");
        },
    );
}

#[test]
fn test_implicit_conversion_made_explicit() {
    // the literal adopts the declared type rather than the default int
    analyze_src(&[("/m.fc", "i16 Small = 40;")], |modules, _, _| {
        let s = modules[0].find_decl("Small").unwrap();
        let DeclBody::Var(v) = &s.body else { panic!() };
        let init = v.init.as_ref().unwrap();
        assert_eq!(init.ty.name, "i16");
        assert_eq!(init.ty.size, 2);
    });
}

#[test]
fn test_lvalue_and_const_propagation() {
    analyze_src(
        &[(
            "/m.fc",
            "int Get(int* p, int[] xs) { return *p + xs[0]; }",
        )],
        |modules, rep, sink| {
            assert_eq!(rep.err_count(), 0, "{:?}", sink.messages());
            let _ = modules;
        },
    );
}

#[test]
fn test_mutating_const_param_is_flagged() {
    analyze_src(
        &[("/m.fc", "int F() { const int x = 1; x++; return x; }")],
        |_, rep, sink| {
            assert!(rep.err_count() > 0);
            assert!(sink.contains("E1321"), "{:?}", sink.messages());
        },
    );
}

#[test]
fn test_deref_void_pointer_rejected() {
    analyze_src(
        &[("/m.fc", "int F(void* p) { return *p; }")],
        |_, rep, sink| {
            assert!(rep.err_count() > 0);
            assert!(sink.contains("E1305"), "{:?}", sink.messages());
        },
    );
}

#[test]
fn test_pointer_arithmetic() {
    analyze_src(
        &[("/m.fc", "u8* Step(u8* p, int n) { return p + n; }")],
        |modules, rep, sink| {
            assert_eq!(rep.err_count(), 0, "{:?}", sink.messages());
            let _ = modules;
        },
    );
}

#[test]
fn test_int_plus_pointer_swaps() {
    analyze_src(
        &[("/m.fc", "u8* Step(u8* p, int n) { return n + p; }")],
        |modules, rep, sink| {
            assert_eq!(rep.err_count(), 0, "{:?}", sink.messages());
            // result type stays the pointer
            let f = modules[0].find_decl("Step").unwrap();
            assert_eq!(f.ty.elem().unwrap().kind, TypeKind::Ptr);
        },
    );
}

#[test]
fn test_fptr_call() {
    analyze_src(
        &[(
            "/m.fc",
            "int Twice(int v) { return v + v; }\n\
             int Apply(int(int) f, int v) { return f(v); }",
        )],
        |modules, rep, sink| {
            assert_eq!(rep.err_count(), 0, "{:?}", sink.messages());
            let apply = modules[0].find_decl("Apply").unwrap();
            let DeclBody::Func(fd) = &apply.body else { panic!() };
            let StatKind::Scope(brace) = &fd.body.as_ref().unwrap().body[2].kind else {
                panic!("expected brace scope after two params")
            };
            let StatKind::Return { value: Some(v) } = &brace.body[0].kind else {
                panic!()
            };
            let ExprKind::Call { target, .. } = &v.kind else { panic!() };
            assert!(matches!(target, sem::CallTarget::Ptr(_)));
        },
    );
}

#[test]
fn test_switch_returns_with_default() {
    analyze_src(
        &[(
            "/m.fc",
            "int Pick(int v) { switch (v) { case 0: return 10; default: return 20; } }",
        )],
        |_, rep, sink| {
            assert_eq!(rep.err_count(), 0, "{:?}", sink.messages());
        },
    );
}

#[test]
fn test_switch_without_default_does_not_return() {
    analyze_src(
        &[(
            "/m.fc",
            "int Pick(int v) { switch (v) { case 0: return 10; } }",
        )],
        |_, rep, sink| {
            assert!(rep.err_count() > 0);
            assert!(sink.contains("E1616"), "{:?}", sink.messages());
        },
    );
}

#[test]
fn test_litdata_against_struct_and_array() {
    analyze_src(
        &[(
            "/m.fc",
            "struct P { int x; int y; }\n\
             int F() { P p = {1, 2}; int[3] a = {1, 2, 3}; return p.x + a[0]; }",
        )],
        |_, rep, sink| {
            assert_eq!(rep.err_count(), 0, "{:?}", sink.messages());
        },
    );
}

#[test]
fn test_litdata_wrong_member_count() {
    analyze_src(
        &[(
            "/m.fc",
            "struct P { int x; int y; }\nint F() { P p = {1}; return p.x; }",
        )],
        |_, rep, sink| {
            assert!(rep.err_count() > 0);
            assert!(sink.contains("E1103"), "{:?}", sink.messages());
        },
    );
}

#[test]
fn test_struct_name_method_reference() {
    analyze_src(
        &[(
            "/m.fc",
            "struct S { int v; }\n\
             int S.Get(S* s) { return s.v; }\n\
             int F(S* s) { return S.Get(s); }",
        )],
        |_, rep, sink| {
            assert_eq!(rep.err_count(), 0, "{:?}", sink.messages());
        },
    );
}
