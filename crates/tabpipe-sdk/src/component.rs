use std::fmt;

use crate::error::{PipelineError, Result};

/// A component identifier plus its options, parsed from a single string.
///
/// The textual form is whitespace-separated with double-quote grouping,
/// e.g. `normalize -scale 2.0 -label "my data"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentSpec {
    pub id: String,
    pub options: Vec<String>,
}

impl ComponentSpec {
    pub fn new(id: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            id: id.into(),
            options,
        }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        for ch in text.chars() {
            match ch {
                '"' => in_quotes = !in_quotes,
                c if c.is_whitespace() && !in_quotes => {
                    if !current.is_empty() {
                        tokens.push(std::mem::take(&mut current));
                    }
                }
                c => current.push(c),
            }
        }
        if in_quotes {
            return Err(PipelineError::Config(format!(
                "unterminated quote in component spec: {text}"
            )));
        }
        if !current.is_empty() {
            tokens.push(current);
        }
        if tokens.is_empty() {
            return Err(PipelineError::Config(
                "empty component spec".to_string(),
            ));
        }
        let id = tokens.remove(0);
        Ok(Self { id, options: tokens })
    }
}

impl fmt::Display for ComponentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        for option in &self.options {
            if option.chars().any(char::is_whitespace) {
                write!(f, " \"{option}\"")?;
            } else {
                write!(f, " {option}")?;
            }
        }
        Ok(())
    }
}
