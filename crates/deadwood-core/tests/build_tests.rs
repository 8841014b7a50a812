//! Integration tests for whole-build analysis
//!
//! Builds are written to temporary directories and analyzed end to end.

use std::fs;
use std::path::{Path, PathBuf};

use deadwood_core::build::{BuildGraph, Module, SourceFile};
use deadwood_core::extractor::{Extractor, ExtractorRegistry};
use deadwood_core::graph::{IntermediateMap, IntermediateResult, ModuleContext};
use deadwood_core::{AnalysisEngine, GlobalDependencyGraph};
use insta::assert_json_snapshot;

fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create source dir");
    }
    fs::write(&path, content).expect("Failed to write source");
    path
}

fn module(name: &str, files: &[PathBuf], dependencies: &[&str]) -> Module {
    let mut module = Module::new(name);
    for file in files {
        module = module.with_file(file.clone());
    }
    for dependency in dependencies {
        module = module.with_dependency(dependency);
    }
    module
}

fn analyze(modules: Vec<Module>) -> GlobalDependencyGraph {
    let build = BuildGraph::new(modules).expect("valid build");
    AnalysisEngine::new().analyze(&build).graph
}

const HELPER: &str = "package com.acme;\n\npublic class Helper {}\n";

const APP: &str = "package com.example;\n\
                   \n\
                   import com.acme.*;\n\
                   \n\
                   public class App {\n\
                   \x20   Helper helper;\n\
                   \x20   String name;\n\
                   }\n";

#[test]
fn dependency_module_type_resolves_only_after_merge() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let helper = write(dir.path(), "core/com/acme/Helper.java", HELPER);
    let app = write(dir.path(), "app/com/example/App.java", APP);

    let alone = analyze(vec![module("app", &[app.clone()], &[])]);
    assert!(!alone.has_edge("com.example.App", "com.acme.Helper"));

    let merged = analyze(vec![
        module("core", &[helper], &[]),
        module("app", &[app], &["core"]),
    ]);
    assert!(merged.has_edge("com.example.App", "com.acme.Helper"));
}

#[test]
fn dependencies_do_not_see_downstream_modules() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let helper = write(
        dir.path(),
        "core/com/acme/Helper.java",
        "package com.acme;\nimport com.example.*;\nclass Helper { App app; }\n",
    );
    let app = write(dir.path(), "app/com/example/App.java", APP);

    let graph = analyze(vec![
        module("core", &[helper], &[]),
        module("app", &[app], &["core"]),
    ]);

    assert!(!graph.has_edge("com.acme.Helper", "com.example.App"));
    assert!(graph.has_edge("com.example.App", "com.acme.Helper"));
}

#[test]
fn explicit_import_end_to_end() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let panel = write(
        dir.path(),
        "src/com/example/Panel.java",
        "package com.example;\n\
         import com.acme.Widget;\n\
         class Panel {\n\
             private Widget widget;\n\
         }\n",
    );

    let graph = analyze(vec![module("ui", &[panel], &[])]);

    assert!(graph.has_edge("com.example.Panel", "com.acme.Widget"));
    assert!(graph.internal_only().dependees_of("com.example.Panel").is_none());
}

#[test]
fn constants_of_dependency_modules_are_recovered() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let constants = write(
        dir.path(),
        "core/com/acme/Constants.java",
        "package com.acme;\n\
         public final class Constants {\n\
             public static final String FOO = \"foo\";\n\
             public static final class More { public static final int BAR = 1; }\n\
         }\n",
    );
    let user = write(
        dir.path(),
        "app/com/example/User.java",
        "package com.example;\n\
         import static com.acme.Constants.FOO;\n\
         class User {\n\
             String a = FOO;\n\
             int b = com.acme.Constants.More.BAR;\n\
             void m(int x) {\n\
                 switch (x) { case com.acme.Constants.More.BAR: break; }\n\
             }\n\
         }\n",
    );

    let graph = analyze(vec![
        module("core", &[constants], &[]),
        module("app", &[user], &["core"]),
    ]);

    assert!(graph.has_edge("com.example.User", "com.acme.Constants"));
    assert!(graph.has_edge("com.example.User", "com.acme.Constants$More"));
    assert!(!graph.has_edge("com.example.User", "com.acme.Constants$FOO"));
}

#[test]
fn graph_snapshot() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let helper = write(dir.path(), "core/com/acme/Helper.java", HELPER);
    let app = write(dir.path(), "app/com/example/App.java", APP);

    let graph = analyze(vec![
        module("app", &[app], &["core"]),
        module("core", &[helper], &[]),
    ]);

    assert_json_snapshot!("two_module_graph", graph);
}

/// Reads `name=Type` lines from `*.generators` files and resolves `use name`
/// lines from `*.uses` files against own and inherited definitions.
#[derive(Default)]
struct Generators {
    defined: Vec<(String, String)>,
    used: Vec<(String, String)>,
}

const GENERATORS: &str = "generators";

impl Extractor for Generators {
    fn name(&self) -> &str {
        "generators"
    }

    fn on_file(&mut self, _ctx: &mut ModuleContext, file: &SourceFile) {
        let Some(extension) = file.path().extension().and_then(|e| e.to_str()) else {
            return;
        };
        let Ok(text) = file.read() else {
            return;
        };
        for line in text.lines() {
            let Some((left, right)) = line.split_once('=') else {
                continue;
            };
            let pair = (left.trim().to_string(), right.trim().to_string());
            match extension {
                "generators" => self.defined.push(pair),
                "uses" => self.used.push(pair),
                _ => {}
            }
        }
    }

    fn on_analysis_complete(&mut self, ctx: &mut ModuleContext) {
        let own: IntermediateMap<String, String> = self.defined.iter().cloned().collect();

        for (user, generator) in &self.used {
            let target = own.get(generator.as_str()).cloned().or_else(|| {
                match ctx.inherited_intermediate(GENERATORS) {
                    Some(IntermediateResult::Map(inherited)) => {
                        inherited.get(generator.as_str()).cloned()
                    }
                    _ => None,
                }
            });
            if let Some(target) = target {
                ctx.add_dependency(user, &target);
            }
        }

        if !own.is_empty() {
            ctx.put_intermediate(GENERATORS, IntermediateResult::Map(own));
        }
    }
}

#[test]
fn diamond_precedence_follows_dependency_order_and_ownership() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let a = write(dir.path(), "a/defs.generators", "seq=a.Seq\nhilo=a.HiLo\nflake=a.Flake");
    let b = write(dir.path(), "b/defs.generators", "seq=b.Seq");
    let c = write(dir.path(), "c/defs.generators", "seq=c.Seq\nuuid=c.Uuid");
    let d_defs = write(dir.path(), "d/defs.generators", "hilo=d.HiLo");
    let d_uses = write(
        dir.path(),
        "d/entity.uses",
        "d.Order=seq\nd.Invoice=uuid\nd.Ledger=hilo\nd.Token=flake",
    );

    let mut registry = ExtractorRegistry::new();
    registry.register(|| Box::new(Generators::default()));

    let build = BuildGraph::new(vec![
        module("d", &[d_defs, d_uses], &["b", "c"]),
        module("b", &[b], &["a"]),
        module("c", &[c], &["a"]),
        module("a", &[a], &[]),
    ])
    .expect("valid build");
    let graph = AnalysisEngine::new()
        .with_extractors(registry)
        .analyze(&build)
        .graph;

    assert!(graph.has_edge("d.Order", "b.Seq"));
    assert!(graph.has_edge("d.Invoice", "c.Uuid"));
    assert!(graph.has_edge("d.Ledger", "d.HiLo"));
    assert!(graph.has_edge("d.Token", "a.Flake"));
    assert_eq!(graph.edge_count(), 4);
}
