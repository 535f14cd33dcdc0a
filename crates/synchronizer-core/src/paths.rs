use std::path::{Path, PathBuf};

/// Directory a source is mirrored into: the clone root joined with the last
/// segment of the source URL.
pub fn local_path(root: &Path, source_url: &str) -> Option<PathBuf> {
    repo_dir_name(source_url).map(|name| root.join(name))
}

/// `https://host/group/repo.git` -> `repo.git`, `git@host:repo.git` -> `repo.git`.
pub fn repo_dir_name(source_url: &str) -> Option<String> {
    let trimmed = source_url.trim_end_matches(['/', '\\']);
    let segment = trimmed
        .rsplit(['/', '\\', ':'])
        .next()
        .unwrap_or(trimmed);
    if segment.is_empty() || segment == "." || segment == ".." {
        return None;
    }
    Some(sanitize_repo_name(segment))
}

fn sanitize_repo_name(name: &str) -> String {
    let mut sanitized: String = name
        .chars()
        .map(|ch| match ch {
            '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => '_',
            _ => ch,
        })
        .collect();
    while sanitized.ends_with('.') || sanitized.ends_with(' ') {
        sanitized.pop();
    }
    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}
