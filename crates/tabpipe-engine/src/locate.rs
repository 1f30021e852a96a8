use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tabpipe_sdk::{PipelineError, Result};
use walkdir::WalkDir;

/// Expand sources and list-files into an ordered, de-duplicated list of
/// input resources, optionally truncated to resume after an earlier run.
///
/// A source is a literal path, a glob pattern or a directory (walked
/// recursively). Each line of a list-file is expanded the same way, blank
/// lines ignored. When `resume_from` is set, everything up to and
/// including the first resolved path matching it is discarded; no match
/// is an error rather than silently processing the whole list.
pub fn locate_files(
    sources: &[String],
    source_lists: &[String],
    resume_from: Option<&str>,
    fail_if_empty: bool,
) -> Result<Vec<PathBuf>> {
    let mut resolved = Vec::new();
    let mut seen = HashSet::new();

    for source in sources {
        expand_source(source, &mut resolved, &mut seen)?;
    }
    for list in source_lists {
        let text = std::fs::read_to_string(list)?;
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            expand_source(line, &mut resolved, &mut seen)?;
        }
    }

    if let Some(pattern_text) = resume_from {
        let pattern = glob::Pattern::new(pattern_text).map_err(|e| {
            PipelineError::Config(format!("invalid resume pattern '{pattern_text}': {e}"))
        })?;
        let position = resolved.iter().position(|path| pattern.matches_path(path));
        match position {
            Some(index) => {
                log::info!(
                    "resuming after {} ({} of {} inputs skipped)",
                    resolved[index].display(),
                    index + 1,
                    resolved.len()
                );
                resolved.drain(..=index);
            }
            None => return Err(PipelineError::ResumeNotMatched(pattern_text.to_string())),
        }
    }

    if resolved.is_empty() && fail_if_empty {
        return Err(PipelineError::EmptyInput);
    }
    Ok(resolved)
}

fn expand_source(
    source: &str,
    resolved: &mut Vec<PathBuf>,
    seen: &mut HashSet<PathBuf>,
) -> Result<()> {
    let path = Path::new(source);
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_file() {
                push_unique(entry.into_path(), resolved, seen);
            }
        }
    } else if source.contains(['*', '?', '[']) {
        let matches = glob::glob(source)
            .map_err(|e| PipelineError::Config(format!("invalid glob '{source}': {e}")))?;
        for entry in matches {
            let path = entry.map_err(glob::GlobError::into_error)?;
            push_unique(path, resolved, seen);
        }
    } else {
        push_unique(path.to_path_buf(), resolved, seen);
    }
    Ok(())
}

fn push_unique(path: PathBuf, resolved: &mut Vec<PathBuf>, seen: &mut HashSet<PathBuf>) {
    if seen.insert(path.clone()) {
        resolved.push(path);
    }
}
