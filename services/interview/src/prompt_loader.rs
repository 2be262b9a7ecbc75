use anyhow::{Context, Result};
use interview_core::oracle::prompts::role_slug;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Loads role preamble overrides from `<dir>/<role-slug>.md`.
///
/// Keys are normalised to slugs, so `Software Engineer.md` and
/// `software-engineer.md` both override the Software Engineer role. Blank
/// files are skipped.
pub fn load_role_prompts(dir_path: &Path) -> Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();

    for entry in fs::read_dir(dir_path)
        .with_context(|| format!("Failed to read prompts directory: {}", dir_path.display()))?
    {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("md") {
            continue;
        }

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .context("Could not get file stem for prompt file")?;
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;

        if content.trim().is_empty() {
            tracing::warn!("Skipping empty prompt file: {}", path.display());
            continue;
        }
        prompts.insert(role_slug(&stem.replace(['-', '_'], " ")), content);
    }

    Ok(prompts)
}

/// Like [`load_role_prompts`], but a missing directory just means no overrides.
pub fn load_role_prompts_if_present(dir_path: &Path) -> Result<HashMap<String, String>> {
    if !dir_path.exists() {
        tracing::debug!("No prompts directory at {}", dir_path.display());
        return Ok(HashMap::new());
    }
    load_role_prompts(dir_path)
}
