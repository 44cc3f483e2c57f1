//! Prompt Templates
//!
//! Text templates with `{name}` placeholders. `{{` and `}}` render as literal
//! braces. Every declared input variable must be supplied at render time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{LlmError, LlmResult};

/// Variables substituted into a template
pub type PromptVariables = HashMap<String, String>;

/// Build a `PromptVariables` map from key/value pairs
pub fn variables<const N: usize>(pairs: [(&str, &str); N]) -> PromptVariables {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A prompt template with named input variables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub template: String,
    pub input_variables: Vec<String>,
}

impl PromptTemplate {
    /// Create a template, collecting its placeholders as input variables
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let input_variables = placeholders(&template);
        Self {
            template,
            input_variables,
        }
    }

    /// Render the template, failing if any placeholder has no value
    pub fn render(&self, vars: &PromptVariables) -> LlmResult<String> {
        if let Some(missing) = self
            .input_variables
            .iter()
            .find(|name| !vars.contains_key(name.as_str()))
        {
            return Err(missing_variable(missing));
        }

        let mut out = String::with_capacity(self.template.len());
        let mut chars = self.template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for n in chars.by_ref() {
                        if n == '}' {
                            closed = true;
                            break;
                        }
                        name.push(n);
                    }
                    if !closed {
                        out.push('{');
                        out.push_str(&name);
                        continue;
                    }
                    let value = vars
                        .get(name.trim())
                        .ok_or_else(|| missing_variable(name.trim()))?;
                    out.push_str(value);
                }
                other => out.push(other),
            }
        }

        Ok(out)
    }
}

fn missing_variable(name: &str) -> LlmError {
    LlmError::InvalidRequest {
        message: format!("Missing prompt variable: {}", name),
    }
}

/// Placeholder names in order of first appearance
fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
            }
            '{' => {
                let mut name = String::new();
                let mut closed = false;
                for n in chars.by_ref() {
                    if n == '}' {
                        closed = true;
                        break;
                    }
                    name.push(n);
                }
                let name = name.trim().to_string();
                if closed && !name.is_empty() && !names.contains(&name) {
                    names.push(name);
                }
            }
            _ => {}
        }
    }

    names
}
