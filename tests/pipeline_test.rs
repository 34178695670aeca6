//! Pipeline tests against a substitute synthesizer — no network involved.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use forged::config::DaemonConfig;
use forged::directive::{GenerationMode, GenerationRequest};
use forged::pipeline::{self, GenerateError};
use forged::provider::{ProviderError, Synthesizer};
use forged::AppContext;

/// Returns a fixed payload for every directive.
struct CannedSynthesizer {
    payload: String,
}

#[async_trait]
impl Synthesizer for CannedSynthesizer {
    async fn synthesize(&self, _directive: &str) -> Result<String, ProviderError> {
        Ok(self.payload.clone())
    }
}

/// Fails every call the way a timed-out provider does.
struct TimedOutSynthesizer;

#[async_trait]
impl Synthesizer for TimedOutSynthesizer {
    async fn synthesize(&self, _directive: &str) -> Result<String, ProviderError> {
        Err(ProviderError::Timeout(Duration::from_millis(5)))
    }
}

fn payload(files: &[(&str, &str)]) -> String {
    let entries: Vec<serde_json::Value> = files
        .iter()
        .map(|(path, content)| serde_json::json!({ "path": path, "content": content }))
        .collect();
    serde_json::json!({ "files": entries }).to_string()
}

fn make_ctx(dir: &TempDir, synthesizer: Arc<dyn Synthesizer>) -> AppContext {
    let mut config = DaemonConfig::new(
        None,
        Some(dir.path().join("data")),
        Some("error".to_string()),
        None,
        Some(dir.path().join("projects")),
    );
    // Tests never want real backoff delays.
    config.provider.max_attempts = 1;
    AppContext::new(Arc::new(config), synthesizer)
}

fn custom_body(prompt: &str) -> Option<GenerationRequest> {
    Some(GenerationRequest {
        prompt: prompt.to_string(),
        features: None,
        tech_stack: None,
    })
}

fn project_count(projects_dir: &Path) -> usize {
    match std::fs::read_dir(projects_dir) {
        Ok(entries) => entries.count(),
        Err(_) => 0,
    }
}

#[tokio::test]
async fn custom_generation_materializes_the_payload() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(
        &dir,
        Arc::new(CannedSynthesizer {
            payload: payload(&[
                ("main.py", "print('hello')\n"),
                ("app/routes.py", "routes = []\n"),
            ]),
        }),
    );

    let result = pipeline::generate(&ctx, GenerationMode::Custom, custom_body("Build a thing"))
        .await
        .unwrap();

    assert_eq!(result.message, "Project generated successfully");
    assert_eq!(result.files, vec!["main.py", "app/routes.py"]);
    for file in &result.files {
        assert!(!file.starts_with('/'), "paths must stay relative: {file}");
    }

    let root = Path::new(&result.project_path);
    assert!(root.starts_with(dir.path().join("projects")));
    assert!(root
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("project_"));
    let body = std::fs::read_to_string(root.join("app/routes.py")).unwrap();
    assert_eq!(body, "routes = []\n");
}

#[tokio::test]
async fn empty_prompt_is_rejected_without_side_effects() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(
        &dir,
        Arc::new(CannedSynthesizer {
            payload: payload(&[("main.py", "x")]),
        }),
    );

    let err = pipeline::generate(&ctx, GenerationMode::Custom, custom_body("  "))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "validation");
    assert_eq!(project_count(&ctx.config.projects_dir), 0);
}

#[tokio::test]
async fn provider_timeout_leaves_no_directory_behind() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(&dir, Arc::new(TimedOutSynthesizer));

    let err = pipeline::generate(&ctx, GenerationMode::Custom, custom_body("anything"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "provider");
    assert!(matches!(
        err,
        GenerateError::Provider(ProviderError::Timeout(_))
    ));
    assert_eq!(project_count(&ctx.config.projects_dir), 0);
}

#[tokio::test]
async fn malformed_payload_is_a_parse_failure_with_no_side_effects() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(
        &dir,
        Arc::new(CannedSynthesizer {
            payload: "I could not produce JSON, sorry.".to_string(),
        }),
    );

    let err = pipeline::generate(&ctx, GenerationMode::Custom, custom_body("x"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "parse");
    assert_eq!(project_count(&ctx.config.projects_dir), 0);
}

#[tokio::test]
async fn traversal_paths_are_a_parse_failure() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(
        &dir,
        Arc::new(CannedSynthesizer {
            payload: payload(&[("../outside.py", "nope")]),
        }),
    );

    let err = pipeline::generate(&ctx, GenerationMode::Custom, custom_body("x"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "parse");
    assert_eq!(project_count(&ctx.config.projects_dir), 0);
}

#[tokio::test]
async fn duplicate_paths_fail_and_the_partial_directory_is_removed() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(
        &dir,
        Arc::new(CannedSynthesizer {
            payload: payload(&[("a.txt", "1"), ("a.txt", "2")]),
        }),
    );

    let err = pipeline::generate(&ctx, GenerationMode::Custom, custom_body("x"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), "filesystem");
    // The guard removed the directory that was allocated before the collision check.
    assert_eq!(project_count(&ctx.config.projects_dir), 0);
}

#[tokio::test]
async fn fixed_modes_produce_their_own_messages() {
    let dir = TempDir::new().unwrap();
    let ctx = make_ctx(
        &dir,
        Arc::new(CannedSynthesizer {
            payload: payload(&[("main.py", "print('hi')\n")]),
        }),
    );

    let simple = pipeline::generate(&ctx, GenerationMode::Simple, None)
        .await
        .unwrap();
    assert_eq!(simple.message, "Simple project generated successfully");
    assert!(!simple.files.is_empty());

    let advanced = pipeline::generate(&ctx, GenerationMode::Advanced, None)
        .await
        .unwrap();
    assert_eq!(advanced.message, "Advanced project generated successfully");

    let simple_dir = Path::new(&simple.project_path);
    let advanced_dir = Path::new(&advanced.project_path);
    assert!(simple_dir
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("project_simple_"));
    assert!(advanced_dir
        .file_name()
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("project_advanced_"));
}

#[tokio::test]
async fn concurrent_generations_never_share_a_project_path() {
    let dir = TempDir::new().unwrap();
    let ctx = Arc::new(make_ctx(
        &dir,
        Arc::new(CannedSynthesizer {
            payload: payload(&[("main.py", "x")]),
        }),
    ));

    let mut handles = Vec::new();
    for i in 0..8 {
        let ctx = ctx.clone();
        handles.push(tokio::spawn(async move {
            pipeline::generate(
                &ctx,
                GenerationMode::Custom,
                Some(GenerationRequest {
                    prompt: format!("project number {i}"),
                    features: None,
                    tech_stack: None,
                }),
            )
            .await
            .unwrap()
        }));
    }

    let mut paths = std::collections::HashSet::new();
    for handle in handles {
        let result = handle.await.unwrap();
        assert!(
            paths.insert(result.project_path.clone()),
            "duplicate project path: {}",
            result.project_path
        );
    }
    assert_eq!(paths.len(), 8);
    assert_eq!(project_count(&ctx.config.projects_dir), 8);
}
