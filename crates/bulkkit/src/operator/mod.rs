//! Operator trait and the registry of built-in operator kinds
//!
//! An operator is one unit of repository mutation. It is compiled once from a
//! plan step and then applied to every target repository's workspace, so it
//! must not hold any repository-specific state.

use std::fmt;

use crate::context::OperatorContext;
use crate::error::{Error, Result};
use crate::plan::StepSpec;
use crate::types::ApplyResult;

pub mod script;
pub mod search_replace;

pub use script::ScriptOperator;
pub use search_replace::{Replacement, SearchReplaceOperator};

/// Core trait for change operators
///
/// # Example
///
/// ```ignore
/// use bulkkit::{ApplyResult, Operator, OperatorContext, Result};
///
/// #[derive(Debug)]
/// struct Touch { file: String }
///
/// impl Operator for Touch {
///     fn kind(&self) -> &'static str { "touch" }
///     fn description(&self) -> String { format!("Touch {}", self.file) }
///     fn validate(&self) -> std::result::Result<(), String> { Ok(()) }
///     fn apply(&self, ctx: &OperatorContext) -> Result<ApplyResult> {
///         std::fs::write(ctx.dir.join(&self.file), "")?;
///         Ok(ApplyResult::Modified { files: 1 })
///     }
/// }
/// ```
pub trait Operator: fmt::Debug {
    /// Operator kind, matching the plan key that declares it (e.g. "script")
    fn kind(&self) -> &'static str;

    /// Human-readable description of what this operator does
    fn description(&self) -> String;

    /// Check the operator's configuration without touching any repository
    ///
    /// Returns the reason the configuration is unusable.
    fn validate(&self) -> std::result::Result<(), String>;

    /// Apply the change to the workspace at `ctx.dir`
    fn apply(&self, ctx: &OperatorContext<'_>) -> Result<ApplyResult>;
}

/// A boxed operator for type-erased storage
pub type BoxedOperator = Box<dyn Operator>;

/// Settings shared by all operators compiled from one plan
#[derive(Debug, Clone)]
pub struct OperatorSettings {
    /// Interpreter for script steps
    pub shell: String,
}

impl Default for OperatorSettings {
    fn default() -> Self {
        Self {
            shell: script::DEFAULT_SHELL.to_string(),
        }
    }
}

/// One registered operator kind
pub struct OperatorKind {
    /// Plan key that declares this kind
    pub name: &'static str,
    /// Whether the step declares this kind
    pub declared_by: fn(&StepSpec) -> bool,
    /// Build the operator from a step that declares this kind
    pub build: fn(&StepSpec, &OperatorSettings) -> Option<BoxedOperator>,
}

/// Closed set of operator kinds known to bulk
pub const REGISTRY: &[OperatorKind] = &[
    OperatorKind {
        name: script::KIND,
        declared_by: declares_script,
        build: build_script,
    },
    OperatorKind {
        name: search_replace::KIND,
        declared_by: declares_editor,
        build: build_editor,
    },
];

fn declares_script(step: &StepSpec) -> bool {
    step.script.is_some()
}

fn build_script(step: &StepSpec, settings: &OperatorSettings) -> Option<BoxedOperator> {
    let spec = step.script.as_ref()?;
    Some(Box::new(
        ScriptOperator::new(&spec.run).with_shell(&settings.shell),
    ))
}

fn declares_editor(step: &StepSpec) -> bool {
    step.editor.is_some()
}

fn build_editor(step: &StepSpec, _settings: &OperatorSettings) -> Option<BoxedOperator> {
    let spec = step.editor.as_ref()?;
    let replacements = spec
        .replacements
        .iter()
        .map(|r| Replacement::new(&r.search, &r.replace))
        .collect();
    Some(Box::new(SearchReplaceOperator::new(
        spec.target.clone(),
        replacements,
    )))
}

fn known_kinds() -> String {
    REGISTRY
        .iter()
        .map(|k| k.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve a step to exactly one operator and validate it
///
/// Fails when the step declares zero or several operator kinds, or when
/// the resolved operator's configuration is invalid.
pub fn resolve(index: usize, step: &StepSpec, settings: &OperatorSettings) -> Result<BoxedOperator> {
    let declared: Vec<&OperatorKind> = REGISTRY.iter().filter(|k| (k.declared_by)(step)).collect();

    let kind = match declared.as_slice() {
        [] => {
            return Err(Error::UnknownOperator {
                index,
                known: known_kinds(),
            });
        }
        [kind] => *kind,
        many => {
            return Err(Error::MultipleOperators {
                index,
                kinds: many.iter().map(|k| k.name).collect::<Vec<_>>().join(", "),
            });
        }
    };

    let operator = (kind.build)(step, settings).ok_or_else(|| Error::UnknownOperator {
        index,
        known: known_kinds(),
    })?;

    operator.validate().map_err(|reason| Error::Validation {
        index,
        kind: operator.kind(),
        reason,
    })?;

    log::debug!("step {}: {}", index, operator.description());
    Ok(operator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{EditorSpec, ReplacementSpec, ScriptSpec};

    fn script_step(run: &str) -> StepSpec {
        StepSpec {
            script: Some(ScriptSpec {
                run: run.to_string(),
            }),
            editor: None,
        }
    }

    fn editor_spec(target: &[&str], search: &str) -> EditorSpec {
        EditorSpec {
            target: target.iter().map(|t| t.to_string()).collect(),
            replacements: vec![ReplacementSpec {
                search: search.to_string(),
                replace: "x".to_string(),
            }],
        }
    }

    #[test]
    fn test_resolve_script() {
        let op = resolve(0, &script_step("echo hi"), &OperatorSettings::default()).unwrap();
        assert_eq!(op.kind(), "script");
    }

    #[test]
    fn test_resolve_editor() {
        let step = StepSpec {
            script: None,
            editor: Some(editor_spec(&["*.md"], "foo")),
        };
        let op = resolve(0, &step, &OperatorSettings::default()).unwrap();
        assert_eq!(op.kind(), "editor");
    }

    #[test]
    fn test_resolve_rejects_multiple_kinds() {
        let step = StepSpec {
            script: Some(ScriptSpec {
                run: "echo hi".to_string(),
            }),
            editor: Some(editor_spec(&["*.md"], "foo")),
        };
        let err = resolve(2, &step, &OperatorSettings::default()).unwrap_err();
        match err {
            Error::MultipleOperators { index, kinds } => {
                assert_eq!(index, 2);
                assert_eq!(kinds, "script, editor");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_rejects_empty_step() {
        let err = resolve(1, &StepSpec::default(), &OperatorSettings::default()).unwrap_err();
        assert!(matches!(err, Error::UnknownOperator { index: 1, .. }));
    }

    #[test]
    fn test_resolve_validates_script() {
        let err = resolve(0, &script_step("  \n"), &OperatorSettings::default()).unwrap_err();
        assert!(matches!(err, Error::Validation { kind: "script", .. }));
    }

    #[test]
    fn test_resolve_validates_regex() {
        let step = StepSpec {
            script: None,
            editor: Some(editor_spec(&["*.md"], "(unclosed")),
        };
        let err = resolve(0, &step, &OperatorSettings::default()).unwrap_err();
        assert!(matches!(err, Error::Validation { kind: "editor", .. }));
    }

    #[test]
    fn test_resolve_validates_targets() {
        let step = StepSpec {
            script: None,
            editor: Some(editor_spec(&[], "foo")),
        };
        let err = resolve(0, &step, &OperatorSettings::default()).unwrap_err();
        assert!(matches!(err, Error::Validation { kind: "editor", .. }));
    }
}
