//! Built-in example catalog served by `GET /examples`.
//!
//! Read-only reference data for API discovery — the entries show callers
//! what a well-formed generation request looks like. Loaded as static data,
//! never mutated, so repeated calls always return the same ordered list.

use serde::Serialize;

/// A sample generation request: prompt, feature list, and tech stack.
#[derive(Debug, Clone, Serialize)]
pub struct ExampleEntry {
    pub prompt: &'static str,
    pub features: &'static str,
    pub tech_stack: &'static str,
}

/// All built-in examples, in presentation order.
pub fn all_examples() -> &'static [ExampleEntry] {
    &[
        ExampleEntry {
            prompt: "Create a FastAPI app with JWT authentication.",
            features: "Authentication",
            tech_stack: "FastAPI, SQLite",
        },
        ExampleEntry {
            prompt: "Build a Flask app with contact form.",
            features: "Forms, Email",
            tech_stack: "Flask, SQLAlchemy",
        },
        ExampleEntry {
            prompt: "Develop a Django CMS.",
            features: "CMS, Blog, Comments",
            tech_stack: "Django, PostgreSQL",
        },
    ]
}
