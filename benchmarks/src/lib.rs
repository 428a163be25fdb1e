//! Synthetic Go projects for the benchmarks.

use std::fmt::Write;

use gobf_core::InMemoryLoader;

pub const MODULE: &str = "example.com/bench";

/// Source of one package with `functions` small functions.
pub fn package_source(name: &str, functions: usize, imports: &[String]) -> String {
    let mut out = format!("package {name}\n\nimport (\n\t\"fmt\"\n");
    for import in imports {
        let _ = writeln!(out, "\t\"{import}\"");
    }
    out.push_str(")\n\n//obf:preserve-fields\ntype Record struct {\n\tID    int\n\tLabel string\n}\n\n");

    for i in 0..functions {
        let _ = write!(
            out,
            "//obf:protect\nvar message{i} = \"message number {i}\"\n\n\
             func Compute{i}(input int, record Record) string {{\n\
             \tcounter := input * {i}\n\
             \tfor index := 0; index < counter; index++ {{\n\
             \t\trecord.ID += index\n\
             \t}}\n\
             \treturn fmt.Sprintf(\"%d %s\", record.ID, message{i})\n\
             }}\n\n"
        );
    }
    out
}

/// Loader serving a chain of `packages` packages below a `main` entry.
pub fn project(packages: usize, functions: usize) -> InMemoryLoader {
    let mut loader = InMemoryLoader::new();
    loader.add_package(
        "fmt",
        "fmt",
        &[(
            "print.go",
            "package fmt\n\nfunc Sprintf(format string, a ...any) string { return format }\n",
        )],
    );

    let ids: Vec<String> = (0..packages).map(|i| format!("{MODULE}/pkg{i}")).collect();
    for (i, id) in ids.iter().enumerate() {
        let imports: Vec<String> = ids.get(i + 1).cloned().into_iter().collect();
        let source = package_source(&format!("pkg{i}"), functions, &imports);
        loader.add_package(id, &format!("pkg{i}"), &[("lib.go", source.as_str())]);
    }

    let imports: Vec<String> = ids.first().cloned().into_iter().collect();
    let mut main = package_source("main", functions, &imports);
    main.push_str("func main() {}\n");
    loader
        .add_package(MODULE, "main", &[("main.go", main.as_str())])
        .alias(".", MODULE);
    loader
}
