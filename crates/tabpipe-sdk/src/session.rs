use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};

/// Pipeline-lifetime state shared by all stages.
///
/// Created when the pipeline starts, torn down when it finishes. Only the
/// reader mutates it (publishing the currently active input); filters and
/// the writer read it for placeholder expansion. Execution is
/// single-threaded, so no locking is involved.
#[derive(Debug, Default)]
pub struct Session {
    current_input: Option<PathBuf>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_current_input(&mut self, path: PathBuf) {
        self.current_input = Some(path);
    }

    pub fn current_input(&self) -> Option<&Path> {
        self.current_input.as_deref()
    }

    /// Expand `{INPUT_PATH}`, `{INPUT_NAME}`, `{INPUT_STEM}` and
    /// `{INPUT_DIR}` against the currently active input.
    ///
    /// Unknown markers, and input markers used while no input is active,
    /// are errors: a path is either fully resolved or not used at all.
    pub fn expand_placeholders(&self, template: &str) -> Result<String> {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('{') {
            let (head, tail) = rest.split_at(start);
            result.push_str(head);
            let end = tail
                .find('}')
                .ok_or_else(|| PipelineError::Placeholder(template.to_string()))?;
            let marker = &tail[1..end];
            result.push_str(&self.resolve_marker(marker)?);
            rest = &tail[end + 1..];
        }
        result.push_str(rest);
        Ok(result)
    }

    fn resolve_marker(&self, marker: &str) -> Result<String> {
        let input = self.current_input.as_deref().ok_or_else(|| {
            PipelineError::Placeholder(format!("{{{marker}}} referenced but no input is active"))
        })?;
        let resolved = match marker {
            "INPUT_PATH" => Some(input.to_string_lossy().into_owned()),
            "INPUT_NAME" => input
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            "INPUT_STEM" => input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned()),
            "INPUT_DIR" => input
                .parent()
                .map(|dir| dir.to_string_lossy().into_owned()),
            _ => return Err(PipelineError::Placeholder(format!("{{{marker}}}"))),
        };
        resolved.ok_or_else(|| {
            PipelineError::Placeholder(format!(
                "{{{marker}}} undefined for input {}",
                input.display()
            ))
        })
    }
}
