//! Template rendering for plan text fields
//!
//! Commit titles, commit bodies and script bodies may reference the plan
//! itself, e.g. `chore: apply {{ plan.id }}`. Rendering is strict: a
//! reference to a field the plan does not have is an error, not an empty
//! string.

use minijinja::{Environment, UndefinedBehavior};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::plan::Plan;

/// Data exposed to templates
#[derive(Debug, Serialize)]
pub struct TemplateContext<'a> {
    pub plan: &'a Plan,
}

/// Renders template-bearing plan fields
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        Self { env }
    }

    /// Render `text` against `context`; `field` names the source in errors
    pub fn render(&self, field: &str, text: &str, context: &TemplateContext<'_>) -> Result<String> {
        self.env
            .render_str(text, context)
            .map_err(|source| Error::Template {
                field: field.to_string(),
                source,
            })
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Plan;

    fn plan() -> Plan {
        let mut plan = Plan::default();
        plan.id = "upgrade-lint".to_string();
        plan.version = 1;
        plan.on.repositories = vec!["acme/api".to_string(), "acme/web".to_string()];
        plan
    }

    #[test]
    fn test_render_plan_field() {
        let plan = plan();
        let out = TemplateRenderer::new()
            .render(
                "commit.title",
                "chore: {{ plan.id }} (v{{ plan.version }})",
                &TemplateContext { plan: &plan },
            )
            .unwrap();
        assert_eq!(out, "chore: upgrade-lint (v1)");
    }

    #[test]
    fn test_render_supports_loops_and_filters() {
        let plan = plan();
        let out = TemplateRenderer::new()
            .render(
                "commit.body",
                "{% for r in plan.on.repositories %}- {{ r | upper }}\n{% endfor %}",
                &TemplateContext { plan: &plan },
            )
            .unwrap();
        assert_eq!(out, "- ACME/API\n- ACME/WEB\n");
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        let plan = plan();
        let text = "sed -i 's/a/b/' README.md\n";
        let out = TemplateRenderer::new()
            .render("steps.0.script.run", text, &TemplateContext { plan: &plan })
            .unwrap();
        assert_eq!(out, text);
    }

    #[test]
    fn test_missing_field_fails() {
        let plan = plan();
        let err = TemplateRenderer::new()
            .render(
                "commit.title",
                "{{ plan.nope }}",
                &TemplateContext { plan: &plan },
            )
            .unwrap_err();
        assert!(matches!(err, Error::Template { ref field, .. } if field == "commit.title"));
    }

    #[test]
    fn test_invalid_syntax_fails() {
        let plan = plan();
        let result = TemplateRenderer::new().render(
            "commit.body",
            "{{ plan.id ",
            &TemplateContext { plan: &plan },
        );
        assert!(result.is_err());
    }
}
