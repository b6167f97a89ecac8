use anyhow::Result;
use async_trait::async_trait;
use cscaffold::core::{extractor, synthesizer, ToolCommand, ToolOutput};
use cscaffold::domain::ports::Runner;
use cscaffold::{ProjectConfig, ScaffoldEngine, ScaffoldError, ScaffoldPipeline};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const HEADER: &str = r#"#ifndef SHAPES_H
#define SHAPES_H

#include <stddef.h>

#define MAX_POINTS 16

typedef enum { CIRCLE, SQUARE } shape_kind;

struct Point {
    int x;
    int y;
};

struct Polygon {
    struct Point points[MAX_POINTS];
    size_t count;
    union { int flags; unsigned raw; } meta;
};

int area(const struct Polygon *p);
void translate(struct Polygon *p, int dx, int dy);

#endif /* SHAPES_H */
"#;

const SOURCE: &str = r#"#include "shapes.h"

int area(const struct Polygon *p) {
    return (int)p->count;
}

void translate(struct Polygon *p, int dx, int dy) {
    for (size_t i = 0; i < p->count; i++) {
        p->points[i].x += dx;
        p->points[i].y += dy;
    }
}
"#;

/// Records every command; `git clone` materialises a small repository.
#[derive(Clone, Default)]
struct FakeRunner {
    calls: Arc<Mutex<Vec<ToolCommand>>>,
    fail_program: Option<&'static str>,
}

impl FakeRunner {
    fn programs(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.program.clone())
            .collect()
    }
}

#[async_trait]
impl Runner for FakeRunner {
    async fn run(&self, command: &ToolCommand) -> cscaffold::Result<ToolOutput> {
        self.calls.lock().unwrap().push(command.clone());

        if self.fail_program == Some(command.program.as_str()) {
            return Ok(ToolOutput {
                status: 2,
                stdout: "FAILED (failures=1)".to_string(),
                stderr: String::new(),
            });
        }

        match command.program.as_str() {
            "git" => {
                let target = PathBuf::from(command.args.last().unwrap());
                fs::create_dir_all(target.join("lib")).unwrap();
                fs::create_dir_all(target.join("other")).unwrap();
                fs::write(target.join("other/aaa.h"), "int unrelated(void);\n").unwrap();
                fs::write(target.join("lib/shapes.h"), HEADER).unwrap();
                fs::write(target.join("lib/shapes.c"), SOURCE).unwrap();
            }
            "python3" => {
                // A real run leaves build and coverage data behind.
                let cwd = command.cwd.clone().unwrap();
                fs::write(cwd.join("_test_shapes.c"), "").unwrap();
                fs::write(cwd.join("_test_shapes.o"), "").unwrap();
                fs::write(cwd.join("_test_shapes.gcda"), "").unwrap();
            }
            "genhtml" => {
                let out = PathBuf::from(&command.args[2]);
                fs::create_dir_all(&out).unwrap();
                fs::write(out.join("index.html"), "<html></html>").unwrap();
            }
            _ => {}
        }

        Ok(ToolOutput::default())
    }
}

fn write_config(dir: &Path, url: &str) -> Result<ProjectConfig> {
    let normalized = dir.to_string_lossy().replace('\\', "/");
    let content = format!(
        r#"
[project]
git_repo_url = "{}"
unittest_c_file = "shapes.c"
unittest_header_file = "shapes.h"
workspace_dir = "{}"
"#,
        url, normalized
    );
    let path = dir.join("cscaffold.toml");
    fs::write(&path, content)?;
    Ok(ProjectConfig::from_file(&path)?)
}

#[tokio::test]
async fn test_full_run_generates_module_and_report() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = write_config(temp_dir.path(), "https://github.com/acme/shapes.git")?;
    let runner = FakeRunner::default();

    let workspace = config.workspace();
    let engine = ScaffoldEngine::new(ScaffoldPipeline::new(runner.clone(), config, workspace));
    let summary = engine.run().await?;

    assert_eq!(
        runner.programs(),
        vec!["git", "python3", "gcov", "lcov", "genhtml"]
    );

    assert_eq!(summary.module_path, temp_dir.path().join("test_shapes.py"));
    let module = fs::read_to_string(&summary.module_path)?;
    assert!(module.contains("#define MAX_POINTS 16"));
    assert!(module.contains("typedef enum { CIRCLE, SQUARE } shape_kind;"));
    assert!(module.contains("    union { int flags; unsigned raw; } meta;\n};"));
    assert!(module.contains("void translate(struct Polygon *p, int dx, int dy);"));
    assert!(module.contains(SOURCE));
    assert!(!module.contains("int unrelated(void);"));

    assert!(summary.report_index.ends_with("coverage_report/index.html"));
    assert!(summary.report_index.exists());

    // Clone and build artifacts are gone, outputs stay.
    assert!(!temp_dir.path().join("cloned_repo").exists());
    assert!(!temp_dir.path().join("_test_shapes.gcda").exists());
    assert!(!temp_dir.path().join("_test_shapes.o").exists());
    assert!(!temp_dir.path().join(".cscaffold.lock").exists());
    assert!(temp_dir.path().join("cscaffold.toml").exists());

    Ok(())
}

#[tokio::test]
async fn test_second_run_overwrites_module() -> Result<()> {
    let temp_dir = TempDir::new()?;
    fs::write(temp_dir.path().join("test_shapes.py"), "stale")?;

    let config = write_config(temp_dir.path(), "git@github.com:acme/shapes.git")?;
    let workspace = config.workspace();
    let engine = ScaffoldEngine::new(ScaffoldPipeline::new(FakeRunner::default(), config, workspace));
    engine.run().await?;
    let first = fs::read_to_string(temp_dir.path().join("test_shapes.py"))?;
    assert_ne!(first, "stale");

    engine.run().await?;
    let second = fs::read_to_string(temp_dir.path().join("test_shapes.py"))?;
    assert_eq!(first, second);

    Ok(())
}

#[tokio::test]
async fn test_failing_tests_abort_before_coverage() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = write_config(temp_dir.path(), "https://github.com/acme/shapes.git")?;
    let runner = FakeRunner {
        fail_program: Some("python3"),
        ..Default::default()
    };

    let workspace = config.workspace();
    let engine = ScaffoldEngine::new(ScaffoldPipeline::new(runner.clone(), config, workspace));
    let err = engine.run().await.unwrap_err();

    match &err {
        ScaffoldError::ExternalToolError { tool, status, stdout, .. } => {
            assert_eq!(tool, "python3");
            assert_eq!(*status, 2);
            assert!(stdout.contains("FAILED"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.exit_code(), 2);
    assert_eq!(runner.programs(), vec!["git", "python3"]);
    assert!(!temp_dir.path().join("cloned_repo").exists());

    Ok(())
}

#[tokio::test]
async fn test_invalid_url_leaves_workspace_untouched() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let config = write_config(temp_dir.path(), "http://github.com/acme/shapes.git")?;
    let runner = FakeRunner::default();
    fs::create_dir_all(temp_dir.path().join("cloned_repo/keep"))?;
    fs::write(temp_dir.path().join("user_lib.so"), "")?;
    fs::write(temp_dir.path().join("notes.gcov"), "")?;

    let workspace = config.workspace();
    let engine = ScaffoldEngine::new(ScaffoldPipeline::new(runner.clone(), config, workspace));
    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, ScaffoldError::ValidationError { .. }));
    assert!(runner.programs().is_empty());

    // Nothing in the workspace was locked or cleaned.
    assert!(temp_dir.path().join("cloned_repo/keep").exists());
    assert!(temp_dir.path().join("user_lib.so").exists());
    assert!(temp_dir.path().join("notes.gcov").exists());
    assert!(!temp_dir.path().join(".cscaffold.lock").exists());

    Ok(())
}

#[test]
fn test_every_column_zero_directive_is_extracted() {
    let directives: Vec<&str> = HEADER.lines().filter(|l| l.starts_with('#')).collect();
    let extracted = extractor::extract(HEADER);
    let texts: Vec<&str> = extracted.directives.iter().map(|d| d.text.as_str()).collect();
    assert_eq!(texts, directives);
}

#[test]
fn test_header_and_source_extraction_counts() {
    let header = extractor::extract(HEADER);
    assert_eq!(header.structs_and_enums.len(), 3);
    assert_eq!(header.prototypes.len(), 2);

    let source = extractor::extract(SOURCE);
    assert!(source.structs_and_enums.is_empty());
    assert!(source.prototypes.is_empty());
    assert_eq!(source.directives.len(), 1);
}

#[test]
fn test_synthesis_from_extracted_header_is_stable() -> Result<()> {
    let declarations = extractor::extract(HEADER).declarations();
    let a = synthesizer::synthesize(synthesizer::BUNDLED_TEMPLATE, &declarations, SOURCE)?;
    let b = synthesizer::synthesize(synthesizer::BUNDLED_TEMPLATE, &declarations, SOURCE)?;
    assert_eq!(a, b);
    Ok(())
}
