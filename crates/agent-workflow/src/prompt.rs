//! Prompt template rendering
//!
//! Prompts are MiniJinja templates rendered against the run's execution
//! context. Upstream results are available under their role names, so a
//! template can use `{{ market_analysis.trend }}` for a single field or
//! `{{ market_analysis | json }}` for the whole serialized result.

use agent_core::{ExecutionContext, ProviderError};
use minijinja::{Environment, Error as TemplateError, ErrorKind, Value};

/// Serialize any template value as compact JSON
fn json_filter(value: Value) -> Result<String, TemplateError> {
    serde_json::to_string(&value).map_err(|e| {
        TemplateError::new(
            ErrorKind::InvalidOperation,
            format!("cannot serialize value to JSON: {e}"),
        )
    })
}

fn build_environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.add_filter("json", json_filter);
    env
}

/// Renders task prompt templates against an execution context
pub struct PromptRenderer {
    env: Environment<'static>,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRenderer {
    /// Create a renderer with the workflow filters installed
    pub fn new() -> Self {
        Self {
            env: build_environment(),
        }
    }

    /// Check that a template compiles
    pub fn validate(&self, template: &str) -> Result<(), String> {
        build_environment()
            .template_from_str(template)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    /// Render a template with the context as variables
    pub fn render(&self, template: &str, context: &ExecutionContext) -> Result<String, ProviderError> {
        let vars = Value::from_serialize(context.to_template_value());
        self.env
            .render_str(template, vars)
            .map_err(|e| ProviderError::Prompt(e.to_string()))
    }
}

impl std::fmt::Debug for PromptRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRenderer").finish_non_exhaustive()
    }
}

/// Build the default prompt template for a role without an explicit one
///
/// The instructions are followed by the query, the ticker, and one section per
/// dependency carrying that dependency's serialized result.
pub fn default_template(instructions: &str, dependencies: &[String]) -> String {
    let mut template = String::new();

    if !instructions.trim().is_empty() {
        template.push_str(instructions.trim_end());
        template.push_str("\n\n");
    }

    template.push_str("Query: {{ query }}\nTicker: {{ ticker }}");

    for dep in dependencies {
        template.push_str(&format!("\n\n## Findings from {dep}\n{{{{ {dep} | json }}}}"));
    }

    template
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_template_without_dependencies() {
        let template = default_template("Analyze the stock.", &[]);
        assert_eq!(template, "Analyze the stock.\n\nQuery: {{ query }}\nTicker: {{ ticker }}");
    }

    #[test]
    fn test_render_upstream_results() {
        let renderer = PromptRenderer::new();
        let template = default_template("Assess risk.", &["market_analysis".to_string()]);
        assert!(renderer.validate(&template).is_ok());

        let mut ctx = ExecutionContext::seeded("Is TSLA risky?", "TSLA", "investment_analysis");
        ctx.insert("market_analysis", json!({ "trend": "down" }));

        let prompt = renderer.render(&template, &ctx).unwrap();
        assert_eq!(
            prompt,
            "Assess risk.\n\nQuery: Is TSLA risky?\nTicker: TSLA\n\n## Findings from market_analysis\n{\"trend\":\"down\"}"
        );
    }

    #[test]
    fn test_render_field_access() {
        let renderer = PromptRenderer::new();
        let mut ctx = ExecutionContext::seeded("q", "NVDA", "wf");
        ctx.insert("market_analysis", json!({ "trend": "up" }));

        let prompt = renderer
            .render("{{ ticker }} trend is {{ market_analysis.trend | upper }}", &ctx)
            .unwrap();
        assert_eq!(prompt, "NVDA trend is UP");
    }

    #[test]
    fn test_invalid_template() {
        let renderer = PromptRenderer::new();
        assert!(renderer.validate("{% if ticker %}unterminated").is_err());

        let ctx = ExecutionContext::new();
        let err = renderer.render("{{ 1 + }}", &ctx).unwrap_err();
        assert!(matches!(err, ProviderError::Prompt(_)));
    }
}
