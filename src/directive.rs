// SPDX-License-Identifier: MIT
//! Directive construction — turns a generation request into the single
//! instruction string sent to the synthesis provider.
//!
//! A directive embeds the project description, the planned file layout
//! derived from the requested tech stack and features, per-file size
//! budgets, and the reply-format contract the parser relies on.

use serde::Deserialize;

/// Total line ceiling across all generated files.
const MAX_TOTAL_LINES: usize = 50_000;
/// Per-file line ceiling before dividing the total across the plan.
const MAX_LINES_PER_FILE: usize = 5_000;

// ─── Request & mode ───────────────────────────────────────────────────────────

/// Caller-supplied generation request. Immutable once constructed.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub features: Option<String>,
    #[serde(default)]
    pub tech_stack: Option<String>,
}

/// The three generation modes. `Simple` and `Advanced` ignore caller input
/// and run a fixed built-in request; `Custom` uses the request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    Simple,
    Advanced,
    Custom,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Simple => "simple",
            GenerationMode::Advanced => "advanced",
            GenerationMode::Custom => "custom",
        }
    }

    /// Prefix for the allocated project directory name.
    pub fn dir_prefix(&self) -> &'static str {
        match self {
            GenerationMode::Simple => "project_simple_",
            GenerationMode::Advanced => "project_advanced_",
            GenerationMode::Custom => "project_",
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            GenerationMode::Simple => "Simple project generated successfully",
            GenerationMode::Advanced => "Advanced project generated successfully",
            GenerationMode::Custom => "Project generated successfully",
        }
    }

    /// The built-in request for the fixed modes. `None` for `Custom`,
    /// which always takes the caller's request.
    pub fn fixed_request(&self) -> Option<GenerationRequest> {
        match self {
            GenerationMode::Simple => Some(GenerationRequest {
                prompt: "Create a simple FastAPI app with a homepage.".to_string(),
                features: Some("Basic routing".to_string()),
                tech_stack: Some("FastAPI".to_string()),
            }),
            GenerationMode::Advanced => Some(GenerationRequest {
                prompt: "Create a full FastAPI backend with user login, admin dashboard, \
                         database, tests, Docker support."
                    .to_string(),
                features: Some("Authentication, Admin, Database, Testing, Docker".to_string()),
                tech_stack: Some("FastAPI, SQLAlchemy, SQLite, Docker, Pytest".to_string()),
            }),
            GenerationMode::Custom => None,
        }
    }

    /// Advanced mode insists every planned file is present and substantial.
    fn is_strict(&self) -> bool {
        matches!(self, GenerationMode::Advanced)
    }

    /// Advanced mode asks the provider to spend its full budget on each file.
    fn is_detailed(&self) -> bool {
        matches!(self, GenerationMode::Advanced)
    }
}

// ─── File layout planning ─────────────────────────────────────────────────────

/// One entry of the planned project layout: a relative path and its purpose.
#[derive(Debug, Clone)]
pub struct PlannedFile {
    pub path: &'static str,
    pub purpose: &'static str,
}

fn planned(path: &'static str, purpose: &'static str) -> PlannedFile {
    PlannedFile { path, purpose }
}

/// Derive the minimum file layout the generated project must cover.
///
/// The base skeleton is always present; stack- and feature-specific entries
/// are appended when the request names them. The provider may generate more
/// files than planned, never fewer in strict mode.
pub fn plan_layout(features: &str, tech_stack: &str) -> Vec<PlannedFile> {
    let mut files = vec![
        planned("main.py", "Primary application entry point"),
        planned("requirements.txt", "Project dependencies"),
        planned("config/__init__.py", "Configuration package"),
        planned("config/settings.py", "Main configuration file"),
        planned("tests/__init__.py", "Test package"),
        planned("README.md", "Project documentation"),
    ];

    let stack = tech_stack.to_lowercase();
    if stack.contains("fastapi") {
        files.extend([
            planned("app/main.py", "FastAPI application"),
            planned("app/routers/api_v1.py", "API version 1 router"),
            planned("app/models/__init__.py", "Data models"),
            planned("app/schemas/__init__.py", "Pydantic schemas"),
        ]);
    } else if stack.contains("flask") {
        files.extend([
            planned("app/__init__.py", "Flask application factory"),
            planned("app/routes.py", "Main routes"),
            planned("app/templates/base.html", "Base template"),
            planned("app/static/css/main.css", "Main stylesheet"),
        ]);
    }

    if features.to_lowercase().contains("docker") {
        files.extend([
            planned("Dockerfile", "Production container definition"),
            planned("docker-compose.yml", "Development environment"),
            planned(".dockerignore", "Docker ignore rules"),
        ]);
    }

    files
}

/// Per-file line budget: the global ceiling divided across the plan, capped.
fn lines_per_file(file_count: usize) -> usize {
    MAX_LINES_PER_FILE.min(MAX_TOTAL_LINES / file_count.max(1))
}

// ─── Directive text ───────────────────────────────────────────────────────────

/// Build the full directive for one synthesis call.
///
/// The reply-format contract here must stay in lockstep with
/// [`crate::parse::parse_file_entries`].
pub fn build_directive(request: &GenerationRequest, mode: GenerationMode) -> String {
    let features = request.features.as_deref().unwrap_or("");
    let tech_stack = request.tech_stack.as_deref().unwrap_or("");
    let plan = plan_layout(features, tech_stack);
    let line_budget = lines_per_file(plan.len());

    let mut directive = format!(
        "You are a senior developer generating a complete software project.\n\n\
         Project description: {}\n\
         Special features: {}\n\
         Preferred technologies: {}\n\n\
         Generate every file the project needs, covering at least this layout:\n",
        request.prompt.trim(),
        features,
        tech_stack,
    );

    for file in &plan {
        directive.push_str(&format!("- {} — {}\n", file.path, file.purpose));
    }

    directive.push_str(&format!(
        "\nReply with a single JSON object and nothing else:\n\
         {{\"files\": [{{\"path\": \"relative/path\", \"content\": \"file contents\"}}, ...]}}\n\
         Paths must be relative to the project root, using forward slashes.\n\
         Keep each file under {line_budget} lines.\n\
         Write complete, production-ready code — no TODOs, placeholders, or stub functions.\n"
    ));

    match mode {
        GenerationMode::Simple => {
            directive.push_str("Keep the project to a minimal service skeleton only.\n");
        }
        GenerationMode::Advanced => {
            directive.push_str(
                "The project must include authentication, an admin dashboard, \
                 automated tests, and a container build file.\n",
            );
        }
        GenerationMode::Custom => {}
    }

    if mode.is_strict() {
        directive.push_str("Every planned file must be present and non-trivial.\n");
    }
    if mode.is_detailed() {
        directive.push_str(
            "Use the full available line budget: add error handling, helper functions, \
             and refinements where appropriate.\n",
        );
    }

    directive
}
