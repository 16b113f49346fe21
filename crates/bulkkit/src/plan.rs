//! Plan document model, decoding and compilation
//!
//! A plan is decoded once per invocation, optionally has its id overridden,
//! is template-injected once, and is then compiled into a [`ChangeSet`]:
//! the rendered commit plus one validated operator per step.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::operator::{self, BoxedOperator, OperatorSettings};
use crate::template::{TemplateContext, TemplateRenderer};

/// Prefix of every branch created by bulk
pub const BRANCH_PREFIX: &str = "bulk/";

/// Number of hex digits kept from the content digest when `id` is omitted
const DEFAULT_ID_LEN: usize = 16;

/// The user's declarative intent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Plan {
    /// Plan format version
    pub version: u32,
    /// Idempotency identifier; the branch name is derived from it
    pub id: String,
    /// Repository selector
    pub on: On,
    /// Ordered mutations
    pub steps: Vec<StepSpec>,
    /// Commit and pull request text
    pub commit: CommitSpec,
}

/// Repository selector: explicit list and/or a code search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct On {
    pub repositories: Vec<String>,
    pub repositories_match: RepositoriesMatch,
}

/// Code search filters; every set field narrows the search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepositoriesMatch {
    pub search: String,
    pub extension: String,
    pub filename: String,
    pub language: String,
    pub owners: Vec<String>,
    pub repos: Vec<String>,
    pub size: String,
}

impl RepositoriesMatch {
    /// True when no filter is set, in which case no search runs
    pub fn is_empty(&self) -> bool {
        let blank = |s: &str| s.trim().is_empty();
        blank(&self.search)
            && blank(&self.extension)
            && blank(&self.filename)
            && blank(&self.language)
            && blank(&self.size)
            && self.owners.iter().all(|o| blank(o))
            && self.repos.iter().all(|r| blank(r))
    }
}

/// Raw step as written in the plan; resolved to one operator at compile time
///
/// A kind counts as declared when its key is present, even with an empty
/// value, so `script:` alone is an invalid script rather than no step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepSpec {
    #[serde(
        deserialize_with = "declared",
        skip_serializing_if = "Option::is_none"
    )]
    pub script: Option<ScriptSpec>,
    #[serde(
        deserialize_with = "declared",
        skip_serializing_if = "Option::is_none"
    )]
    pub editor: Option<EditorSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptSpec {
    pub run: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSpec {
    pub target: Vec<String>,
    pub replacements: Vec<ReplacementSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplacementSpec {
    pub search: String,
    pub replace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitSpec {
    pub title: String,
    pub body: String,
}

/// Only called when the key is present; a null value still declares the kind
fn declared<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?.unwrap_or_default()))
}

/// Plan document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFormat {
    Yaml,
    Json,
}

impl PlanFormat {
    /// `.json` files are JSON; everything else is read as YAML
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Default id for a document that declares none
fn content_id(raw: &str) -> String {
    let hash = blake3::hash(raw.as_bytes());
    hash.to_hex().as_str()[..DEFAULT_ID_LEN].to_string()
}

impl Plan {
    /// Decode a plan from document text
    pub fn parse(raw: &str, format: PlanFormat) -> Result<Self> {
        let mut plan: Plan = match format {
            PlanFormat::Yaml => serde_yaml::from_str(raw).map_err(|e| Error::Decode {
                message: format!("yaml: {}", e),
            })?,
            PlanFormat::Json => serde_json::from_str(raw).map_err(|e| Error::Decode {
                message: format!("json: {}", e),
            })?,
        };

        if plan.id.trim().is_empty() {
            plan.id = content_id(raw);
            log::debug!("plan declares no id, using content digest {}", plan.id);
        }
        Ok(plan)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Self::parse(raw, PlanFormat::Yaml)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Self::parse(raw, PlanFormat::Json)
    }

    /// Read and decode a plan file, choosing the format by extension
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::FileAccess {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw, PlanFormat::from_path(path))
    }

    /// Replace the id with an external key; blank keys are ignored
    ///
    /// Returns whether the id changed.
    pub fn override_id(&mut self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() || key == self.id {
            return false;
        }
        log::info!("overriding plan id {} with {}", self.id, key);
        self.id = key.to_string();
        true
    }

    /// Branch every repository's change is pushed to
    pub fn branch_name(&self) -> String {
        format!("{}{}", BRANCH_PREFIX, self.id)
    }

    /// Structural checks that need no rendering
    pub fn validate(&self) -> Result<()> {
        let id = self.id.trim();
        if id.is_empty() {
            return Err(Error::InvalidPlan("id must not be empty".to_string()));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(Error::InvalidPlan(format!(
                "id {:?} must not contain whitespace",
                self.id
            )));
        }
        if self.steps.is_empty() {
            return Err(Error::InvalidPlan("plan has no steps".to_string()));
        }
        Ok(())
    }

    /// Render every template-bearing field once
    ///
    /// All fields render against the plan as it was before this call, so
    /// template text produced by one field is never evaluated again.
    pub fn inject(&mut self, renderer: &TemplateRenderer) -> Result<()> {
        let snapshot = self.clone();
        let context = TemplateContext { plan: &snapshot };

        self.commit.title = renderer.render("commit.title", &snapshot.commit.title, &context)?;
        self.commit.body = renderer.render("commit.body", &snapshot.commit.body, &context)?;

        for (index, step) in self.steps.iter_mut().enumerate() {
            if let Some(script) = step.script.as_mut() {
                let field = format!("steps.{}.script.run", index);
                script.run = renderer.render(&field, &script.run, &context)?;
            }
        }

        Ok(())
    }

    /// Resolve and validate every step, producing the change to apply
    pub fn compile(&self, settings: &OperatorSettings) -> Result<ChangeSet> {
        if self.commit.title.trim().is_empty() {
            return Err(Error::InvalidPlan(
                "commit.title must not be empty".to_string(),
            ));
        }

        let operators = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| operator::resolve(index, step, settings))
            .collect::<Result<Vec<_>>>()?;

        Ok(ChangeSet {
            id: self.id.clone(),
            title: self.commit.title.clone(),
            body: self.commit.body.clone(),
            operators,
        })
    }
}

/// A compiled plan: what every target repository receives
#[derive(Debug)]
pub struct ChangeSet {
    /// Idempotency identifier
    pub id: String,
    /// Rendered commit and pull request title
    pub title: String,
    /// Rendered commit and pull request body
    pub body: String,
    /// One operator per step, in plan order
    pub operators: Vec<BoxedOperator>,
}

impl ChangeSet {
    pub fn branch_name(&self) -> String {
        format!("{}{}", BRANCH_PREFIX, self.id)
    }

    /// Trailer recorded on every commit
    pub fn trailer(&self) -> String {
        format!("Idempotency-Key:{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN_YAML: &str = r#"
version: 1
id: bump-lint
on:
  repositories:
    - acme/api
  repositoriesMatch:
    search: eslint
    owners: [acme]
steps:
  - script:
      run: |
        npm install --save-dev eslint@9
  - editor:
      target: ["*.md"]
      replacements:
        - search: eslint@8
          replace: eslint@9
commit:
  title: "chore: {{ plan.id }}"
  body: "Bumps eslint in {{ plan.on.repositories | length }} repositories."
"#;

    fn compile(plan: &mut Plan) -> Result<ChangeSet> {
        plan.validate()?;
        plan.inject(&TemplateRenderer::new())?;
        plan.compile(&OperatorSettings::default())
    }

    #[test]
    fn test_decode_yaml() {
        let plan = Plan::from_yaml_str(PLAN_YAML).unwrap();

        assert_eq!(plan.version, 1);
        assert_eq!(plan.id, "bump-lint");
        assert_eq!(plan.on.repositories, vec!["acme/api"]);
        assert_eq!(plan.on.repositories_match.search, "eslint");
        assert_eq!(plan.on.repositories_match.owners, vec!["acme"]);
        assert_eq!(plan.steps.len(), 2);
        assert!(plan.steps[0].script.is_some());
        assert!(plan.steps[1].editor.is_some());
        assert_eq!(plan.branch_name(), "bulk/bump-lint");
    }

    #[test]
    fn test_decode_json() {
        let raw = r#"{
            "version": 1,
            "id": "j",
            "on": {"repositories": ["a/b"], "repositoriesMatch": {"language": "go"}},
            "steps": [{"script": {"run": "true"}}],
            "commit": {"title": "t", "body": "b"}
        }"#;
        let plan = Plan::from_json_str(raw).unwrap();

        assert_eq!(plan.id, "j");
        assert_eq!(plan.on.repositories_match.language, "go");
        assert!(!plan.on.repositories_match.is_empty());
    }

    #[test]
    fn test_decode_error() {
        let err = Plan::from_yaml_str("steps: [").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        let err = Plan::from_json_str("{").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_from_path_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let json = dir.path().join("plan.json");
        std::fs::write(&json, r#"{"id": "from-json"}"#).unwrap();
        let yaml = dir.path().join("plan.txt");
        std::fs::write(&yaml, "id: from-yaml\n").unwrap();

        assert_eq!(Plan::from_path(&json).unwrap().id, "from-json");
        assert_eq!(Plan::from_path(&yaml).unwrap().id, "from-yaml");

        let err = Plan::from_path(&dir.path().join("missing.yml")).unwrap_err();
        assert!(matches!(err, Error::FileAccess { .. }));
    }

    #[test]
    fn test_missing_id_defaults_to_content_digest() {
        let a = Plan::from_yaml_str("steps: [{script: {run: a}}]\n").unwrap();
        let again = Plan::from_yaml_str("steps: [{script: {run: a}}]\n").unwrap();
        let b = Plan::from_yaml_str("steps: [{script: {run: b}}]\n").unwrap();

        assert_eq!(a.id.len(), 16);
        assert!(a.id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(a.id, again.id);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_override_id() {
        let mut plan = Plan::from_yaml_str(PLAN_YAML).unwrap();

        assert!(!plan.override_id("   "));
        assert_eq!(plan.id, "bump-lint");

        assert!(plan.override_id("  rollout-2 "));
        assert_eq!(plan.id, "rollout-2");
        assert_eq!(plan.branch_name(), "bulk/rollout-2");
    }

    #[test]
    fn test_compile_renders_and_resolves() {
        let mut plan = Plan::from_yaml_str(PLAN_YAML).unwrap();
        let change = compile(&mut plan).unwrap();

        assert_eq!(change.title, "chore: bump-lint");
        assert_eq!(change.body, "Bumps eslint in 1 repositories.");
        assert_eq!(change.branch_name(), "bulk/bump-lint");
        assert_eq!(change.trailer(), "Idempotency-Key:bump-lint");
        let kinds: Vec<_> = change.operators.iter().map(|o| o.kind()).collect();
        assert_eq!(kinds, vec!["script", "editor"]);
    }

    #[test]
    fn test_injection_is_single_pass() {
        let mut plan = Plan::from_yaml_str(
            r#"
id: once
steps: [{script: {run: "echo {{ plan.id }}"}}]
commit:
  title: "{{ plan.commit.body }}"
  body: "{{ plan.id }}"
"#,
        )
        .unwrap();
        plan.inject(&TemplateRenderer::new()).unwrap();

        assert_eq!(plan.commit.title, "{{ plan.id }}");
        assert_eq!(plan.commit.body, "once");
        assert_eq!(plan.steps[0].script.as_ref().unwrap().run, "echo once");
    }

    #[test]
    fn test_editor_fields_are_not_rendered() {
        let mut plan = Plan::from_yaml_str(
            r#"
id: raw
steps:
  - editor:
      target: ["*.txt"]
      replacements: [{search: "x", replace: "{{ plan.id }}"}]
commit: {title: t}
"#,
        )
        .unwrap();
        plan.inject(&TemplateRenderer::new()).unwrap();

        let editor = plan.steps[0].editor.as_ref().unwrap();
        assert_eq!(editor.replacements[0].replace, "{{ plan.id }}");
    }

    #[test]
    fn test_template_error_names_field() {
        let mut plan = Plan::from_yaml_str(
            "id: x\nsteps: [{script: {run: \"{{ plan.missing }}\"}}]\ncommit: {title: t}\n",
        )
        .unwrap();
        let err = plan.inject(&TemplateRenderer::new()).unwrap_err();
        assert!(matches!(err, Error::Template { ref field, .. } if field == "steps.0.script.run"));
    }

    #[test]
    fn test_step_with_two_operators_fails() {
        let mut plan = Plan::from_yaml_str(
            r#"
id: both
steps:
  - script: {run: "true"}
    editor: {target: ["a"], replacements: [{search: a, replace: b}]}
commit: {title: t}
"#,
        )
        .unwrap();
        let err = compile(&mut plan).unwrap_err();
        assert!(matches!(err, Error::MultipleOperators { index: 0, .. }));
    }

    #[test]
    fn test_declared_but_empty_kind_is_invalid() {
        let mut plan =
            Plan::from_yaml_str("id: e\nsteps:\n  - script:\ncommit: {title: t}\n").unwrap();
        assert!(plan.steps[0].script.is_some());

        let err = compile(&mut plan).unwrap_err();
        assert!(matches!(err, Error::Validation { kind: "script", .. }));
    }

    #[test]
    fn test_validate() {
        let mut plan = Plan::from_yaml_str(PLAN_YAML).unwrap();
        assert!(plan.validate().is_ok());

        plan.id = "has space".to_string();
        assert!(matches!(plan.validate(), Err(Error::InvalidPlan(_))));

        plan.id = "ok".to_string();
        plan.steps.clear();
        assert!(matches!(plan.validate(), Err(Error::InvalidPlan(_))));
    }

    #[test]
    fn test_compile_requires_title() {
        let mut plan =
            Plan::from_yaml_str("id: t\nsteps: [{script: {run: \"true\"}}]\n").unwrap();
        let err = compile(&mut plan).unwrap_err();
        assert!(matches!(err, Error::InvalidPlan(_)));
    }
}
