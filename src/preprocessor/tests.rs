use std::{fs, path::PathBuf};

use pretty_assertions::assert_eq;

use super::Preprocessor;
use crate::{
    config::{Config, MacroDefinition},
    error::{Error, ErrorKind},
};

#[track_caller]
fn run_with(config: Config, source: &str) -> String {
    Preprocessor::new(config)
        .unwrap()
        .preprocess_bytes("test.c", source.as_bytes())
        .unwrap()
        .to_string()
}

#[track_caller]
fn run(source: &str) -> String {
    run_with(Config::default(), source)
}

#[track_caller]
fn error(source: &str) -> ErrorKind {
    Preprocessor::new(Config::default())
        .unwrap()
        .preprocess_bytes("test.c", source.as_bytes())
        .unwrap_err()
        .kind()
        .cloned()
        .unwrap()
}

/// A fresh directory for a test that needs files.
fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("beheader-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn object_like_macros() {
    assert_eq!(run("#define X 1\nX + X\n"), "1 + 1\n");
    assert_eq!(run("#define EMPTY\na EMPTY b\n"), "a b\n");
    assert_eq!(run("#define H # x\nH\n"), "# x\n");
}

#[test]
fn function_like_macros() {
    assert_eq!(run("#define ADD(a, b) a + b\nADD(1, 2)\n"), "1 + 2\n");
    assert_eq!(run("#define Z() z\nZ()\n"), "z\n");
    assert_eq!(run("#define F(x) x\nF() end\n"), "end\n");
    assert_eq!(run("#define F(x) x\nF + 1\n"), "F + 1\n");
    assert_eq!(run("#define F(x) [x]\nF((a, b))\n"), "[(a, b)]\n");
}

#[test]
fn arguments_are_expanded_before_substitution() {
    assert_eq!(run("#define ONE 1\n#define F(x) x\nF(ONE)\n"), "1\n");
    assert_eq!(
        run("#define ONE 1\n#define S(x) #x\n#define XS(x) S(x)\nS(ONE) XS(ONE)\n"),
        "\"ONE\" \"1\"\n"
    );
}

#[test]
fn variadic_macros() {
    assert_eq!(
        run("#define P(fmt, ...) f(fmt, __VA_ARGS__)\nP(\"x\", 1, 2)\n"),
        "f(\"x\", 1, 2)\n"
    );
    assert_eq!(run("#define V(...) [__VA_ARGS__]\nV()\n"), "[]\n");
}

#[test]
fn stringizing() {
    assert_eq!(
        run("#define S(x) #x\nS(a  +  \"b\\n\")\n"),
        r#""a + \"b\\n\"""#.to_string() + "\n"
    );
    assert_eq!(run("#define S(x) #x\nS()\n"), "\"\"\n");
}

#[test]
fn pasting() {
    assert_eq!(run("#define CAT(a, b) a ## b\nCAT(x, y) CAT(1, 2)\n"), "xy 12\n");
    assert_eq!(run("#define CAT(a, b) a ## b\nCAT(, y) CAT(x, )\n"), "y x\n");
    assert_eq!(run("#define OBJ x ## y\nOBJ\n"), "xy\n");
    assert_eq!(
        error("#define CAT(a, b) a ## b\nCAT(+, -)\n"),
        ErrorKind::InvalidPaste("+".to_string(), "-".to_string())
    );
}

#[test]
fn expansion_does_not_recurse() {
    assert_eq!(run("#define foo foo + 1\nfoo\n"), "foo + 1\n");
    assert_eq!(run("#define a b\n#define b a\na b\n"), "a b\n");
    assert_eq!(run("#define f(a) a*g\n#define g(a) f(a)\nf(2)(9)\n"), "2*9*g\n");
}

#[test]
fn invocations_span_lines() {
    assert_eq!(run("#define F(x) [x]\nF(\n1\n)\nafter\n"), "[1]\nafter\n");
}

#[test]
fn adjacent_tokens_stay_apart() {
    assert_eq!(run("#define NEG -1\n-NEG\n"), "- -1\n");
}

#[test]
fn dynamic_macros() {
    assert_eq!(run("a\n__LINE__\n"), "a\n2\n");
    assert_eq!(run("__FILE__\n"), "\"test.c\"\n");
    assert_eq!(run("__STDC_VERSION__ __STDC__\n"), "201710L 1\n");
    assert_eq!(run("#line 100 \"foo.c\"\n__LINE__ __FILE__\n"), "100 \"foo.c\"\n");
    assert_eq!(run("#define L 7\n#line L\n__LINE__\n"), "7\n");
}

#[test]
fn conditional_inclusion() {
    let source = "\
#define A 2
#if A == 2
yes
#elif 1
no1
#else
no2
#endif
#ifdef A
a
#endif
#ifndef A
b
#endif
#if defined(A) && !defined B
c
#endif
";
    assert_eq!(run(source), "yes\na\nc\n");
}

#[test]
fn elif_chains() {
    let source = "#if 0\na\n#elif 0\nb\n#elif 1\nc\n#elif 1\nd\n#else\ne\n#endif\n";
    assert_eq!(run(source), "c\n");
    assert_eq!(run("#if 0\na\n#else\nb\n#endif\n"), "b\n");
}

#[test]
fn skipped_groups_are_not_evaluated() {
    assert_eq!(run("#if 0\n#if garbage (((\n#else\nx\n#endif\n#endif\ny\n"), "y\n");
    assert_eq!(run("#if 0\n#error unreachable\n#bogus\n#endif\n"), "");
    assert_eq!(run("#if 1\n#else\n#if 1 / 0\n#endif\n#endif\n"), "");
}

#[test]
fn long_conditions() {
    let source = format!("#if 0{} == 10000\nyes\n#endif\n", " + 1".repeat(10_000));
    assert_eq!(run(&source), "yes\n");
    let source = format!("#if '{}'\n#endif\n", "a".repeat(20_000));
    assert_eq!(error(&source), ErrorKind::CharacterConstantTooLong);
}

#[test]
fn remaining_identifiers_are_zero() {
    assert_eq!(run("#if UNDEFINED\nx\n#else\ny\n#endif\n"), "y\n");
}

#[test]
fn defined_from_macro_expansion() {
    let source = "#define D defined(A) && defined B\n#define A\n#define B\n#if D\nok\n#endif\n";
    assert_eq!(run(source), "ok\n");
}

#[test]
fn conditional_errors() {
    assert_eq!(error("#else\n"), ErrorKind::Unbalanced("else"));
    assert_eq!(error("#elif 1\n"), ErrorKind::Unbalanced("elif"));
    assert_eq!(error("#endif\n"), ErrorKind::Unbalanced("endif"));
    assert_eq!(error("#if 1\n#else\n#elif 1\n#endif\n"), ErrorKind::AfterElse("elif"));
    assert_eq!(error("#if 1\n"), ErrorKind::UnterminatedConditional);
    assert_eq!(error("#if\n#endif\n"), ErrorKind::MissingExpression);
    assert_eq!(error("#if 1 +\n#endif\n"), ErrorKind::UnparseableExpression);
    assert_eq!(error("#if defined\n#endif\n"), ErrorKind::DefinedWithoutIdentifier);
    assert_eq!(error("#if defined(\n#endif\n"), ErrorKind::DefinedWithoutIdentifier);
    assert_eq!(error("#if 1 / 0\n#endif\n"), ErrorKind::DivisionByZero);
    assert_eq!(error("#if 1.0\n#endif\n"), ErrorKind::Disallowed("floating constant"));
    assert_eq!(error("#if sizeof(int)\n#endif\n"), ErrorKind::Disallowed("sizeof"));
}

#[test]
fn errors_are_located() {
    let error = Preprocessor::new(Config::default())
        .unwrap()
        .preprocess_bytes("test.c", b"#if 1\n#else\n  #else\n#endif\n")
        .unwrap_err();
    match error {
        Error::At { location, kind } => {
            assert_eq!(kind, ErrorKind::AfterElse("else"));
            assert_eq!(location.file, "test.c");
            assert_eq!(location.line, 3);
            assert_eq!(location.columns, 3..4);
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn definition_errors() {
    assert_eq!(
        error("#define X 1\n#define X 2\n"),
        ErrorKind::Redefinition("X".to_string())
    );
    assert_eq!(
        error("#define F(a) a+1\n#define F(a) a + 1\n"),
        ErrorKind::Redefinition("F".to_string())
    );
    assert_eq!(
        error("#define __FILE__ 1\n"),
        ErrorKind::ReservedName("__FILE__".to_string())
    );
    assert_eq!(
        error("#undef defined\n"),
        ErrorKind::ReservedName("defined".to_string())
    );
    assert_eq!(error("#define S(x) #y\n"), ErrorKind::InvalidStringize);
    assert_eq!(error("#define P(x) ## x\n"), ErrorKind::PasteAtEdge);
    assert_eq!(
        error("#define F(a, a) a\n"),
        ErrorKind::DuplicateParameter("a".to_string())
    );
    assert_eq!(error("#define F(x) __VA_ARGS__\n"), ErrorKind::InvalidVaArgs);
}

#[test]
fn identical_redefinition_is_allowed() {
    assert_eq!(run("#define X 1 + 2\n#define X 1 /* */ + 2\nX\n"), "1 + 2\n");
    assert_eq!(run("#define X 1\n#undef X\n#define X 2\nX\n"), "2\n");
}

#[test]
fn invocation_errors() {
    assert_eq!(
        error("#define F(x) x\nF(1, 2)\n"),
        ErrorKind::ArgumentCount {
            name: "F".to_string(),
            given: 2,
            expected: 1,
        }
    );
    assert_eq!(
        error("#define F(x) x\nF(1\n"),
        ErrorKind::UnterminatedInvocation("F".to_string())
    );
}

#[test]
fn directive_errors() {
    assert_eq!(error("# 5\n"), ErrorKind::InvalidDirective);
    assert_eq!(error("#ifdef 3\n#endif\n"), ErrorKind::InvalidDirective);
    assert_eq!(
        error("#error stop  here\n"),
        ErrorKind::ErrorDirective("stop here".to_string())
    );
    assert_eq!(error("#line x\n"), ErrorKind::InvalidLine);
    assert_eq!(error("#include\n"), ErrorKind::InvalidDirective);
    assert_eq!(error("#include 3\n"), ErrorKind::InvalidInclude);
    assert_eq!(
        error("#include \"missing.h\"\n"),
        ErrorKind::IncludeNotFound("missing.h".to_string())
    );
}

#[test]
fn dropped_directives() {
    assert_eq!(run("#\n#pragma STDC FP_CONTRACT ON\nx\n"), "x\n");
}

#[test]
fn warnings_are_collected() {
    let mut preprocessor = Preprocessor::new(Config::default()).unwrap();
    preprocessor
        .preprocess_bytes("test.c", b"#define X+1\n#if 1\n#endif junk\na /* open\n")
        .unwrap();
    let messages: Vec<String> = preprocessor
        .diagnostics()
        .take()
        .into_iter()
        .map(|warning| warning.message)
        .collect();
    assert_eq!(
        messages,
        [
            "unterminated comment",
            "missing white-space after the macro name",
            "extra tokens at end of #endif directive",
        ]
    );
}

#[test]
fn warnings_name_their_file() {
    let mut preprocessor = Preprocessor::new(Config::default()).unwrap();
    preprocessor
        .preprocess_bytes("test.c", b"int x;\n#if 'ab'\n#endif\na /* open\n")
        .unwrap();
    let warnings: Vec<String> = preprocessor
        .diagnostics()
        .take()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        warnings,
        [
            "test.c:4:3: warning: unterminated comment",
            "test.c:2:5: warning: multi-character character constant",
        ]
    );
}

#[test]
fn configured_macros() {
    let config = Config::default()
        .define("X=3".parse().unwrap())
        .define(MacroDefinition::defined("Y"))
        .define(MacroDefinition::defined("Z"))
        .define(MacroDefinition::with_value("SQ(x)", "((x) * (x))"))
        .undefine("Z");
    assert_eq!(run_with(config, "X Y Z SQ(2)\n"), "3 1 Z ((2) * (2))\n");
}

#[test]
fn includes() {
    let dir = temp_dir("includes");
    fs::create_dir_all(dir.join("sys")).unwrap();
    fs::write(dir.join("a.h"), "#pragma once\nint a;\n").unwrap();
    fs::write(dir.join("sys").join("b.h"), "int b;\n").unwrap();
    fs::write(
        dir.join("main.c"),
        "#include \"a.h\"\n#include \"a.h\"\n#include <b.h>\n#define B <b.h>\n#include B\nmain\n",
    )
    .unwrap();

    let config = Config::default().include_dir(dir.join("sys"));
    let output = Preprocessor::new(config)
        .unwrap()
        .preprocess_file(dir.join("main.c"))
        .unwrap();
    assert_eq!(output.to_string(), "int a;\nint b;\nint b;\nmain\n");

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn angled_includes_skip_the_current_directory() {
    let dir = temp_dir("angled");
    fs::write(dir.join("local.h"), "local\n").unwrap();
    fs::write(dir.join("main.c"), "#include <local.h>\n").unwrap();

    let error = Preprocessor::new(Config::default())
        .unwrap()
        .preprocess_file(dir.join("main.c"))
        .unwrap_err();
    assert_eq!(
        error.kind(),
        Some(&ErrorKind::IncludeNotFound("local.h".to_string()))
    );

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn include_depth_is_limited() {
    let dir = temp_dir("depth");
    fs::write(dir.join("self.h"), "#include \"self.h\"\n").unwrap();

    let config = Config::default().max_include_depth(3);
    let error = Preprocessor::new(config)
        .unwrap()
        .preprocess_file(dir.join("self.h"))
        .unwrap_err();
    assert_eq!(error.kind(), Some(&ErrorKind::IncludeTooDeep));

    fs::remove_dir_all(&dir).unwrap();
}
