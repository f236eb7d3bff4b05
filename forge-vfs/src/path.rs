use crate::error::VfsError;

// ── Constants ───────────────────────────────────────────────────────────────

pub const VFS_ROOT: &str = "/";

// ── Limits ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfsLimits {
    pub max_file_size: u64,
    pub max_node_count: usize,
    pub max_path_depth: usize,
    pub max_name_length: usize,
    pub max_path_length: usize,
}

impl Default for VfsLimits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10 MB
            max_node_count: 10_000,
            max_path_depth: 32,
            max_name_length: 255,
            max_path_length: 1024,
        }
    }
}

// ── Path functions ──────────────────────────────────────────────────────────

/// Normalize an absolute virtual path: collapse duplicate slashes, drop `.`
/// segments and any trailing slash. Rejects empty input, relative paths and
/// `..` segments.
pub fn normalize_path(input: &str) -> Result<String, VfsError> {
    if input.is_empty() {
        return Err(VfsError::InvalidPath("Path cannot be empty".to_string()));
    }
    if !input.starts_with('/') {
        return Err(VfsError::InvalidPath(format!(
            "Path must be absolute (start with /): {}",
            input
        )));
    }

    let mut resolved: Vec<&str> = Vec::new();
    for seg in input.split('/') {
        if seg.is_empty() || seg == "." {
            continue;
        }
        if seg == ".." {
            return Err(VfsError::InvalidPath(format!(
                "Path traversal is not allowed: {}",
                input
            )));
        }
        resolved.push(seg);
    }

    if resolved.is_empty() {
        Ok(VFS_ROOT.to_string())
    } else {
        Ok(format!("/{}", resolved.join("/")))
    }
}

/// Normalize and validate against limits in one step.
pub fn resolve_path(input: &str, limits: &VfsLimits) -> Result<String, VfsError> {
    let normalized = normalize_path(input)?;
    if let Some(err) = validate_path(&normalized, limits) {
        return Err(VfsError::InvalidPath(format!("{}: {}", err, input)));
    }
    Ok(normalized)
}

/// Return all ancestor paths of a normalized path (from root to parent).
/// Does not include the path itself.
pub fn ancestor_paths(normalized_path: &str) -> Vec<String> {
    let mut result = vec![VFS_ROOT.to_string()];
    let segments: Vec<&str> = normalized_path
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    for i in 0..segments.len().saturating_sub(1) {
        result.push(format!("/{}", segments[..=i].join("/")));
    }
    result
}

/// Root has depth 0, `/foo` has depth 1, `/foo/bar` has depth 2, etc.
pub fn path_depth(normalized_path: &str) -> usize {
    normalized_path.split('/').filter(|s| !s.is_empty()).count()
}

/// Prefix shared by every path strictly beneath `normalized_path`.
pub fn subtree_prefix(normalized_path: &str) -> String {
    if normalized_path == VFS_ROOT {
        VFS_ROOT.to_string()
    } else {
        format!("{}/", normalized_path)
    }
}

/// True when `candidate` lies strictly beneath `dir`.
pub fn is_descendant(candidate: &str, dir: &str) -> bool {
    candidate != dir && candidate.starts_with(&subtree_prefix(dir))
}

/// Rewrite the `old_root` prefix of `path` to `new_root`.
pub fn rebase(path: &str, old_root: &str, new_root: &str) -> String {
    if path == old_root {
        return new_root.to_string();
    }
    format!("{}{}", new_root, &path[old_root.len()..])
}

fn has_forbidden_chars(segment: &str) -> bool {
    segment.bytes().any(|b| b <= 0x1f || b == 0x7f || b == b'\\')
}

/// Validate a single path segment. Returns `Some(error_message)` if invalid.
pub fn validate_segment(segment: &str, max_name_length: usize) -> Option<String> {
    if segment.is_empty() {
        return Some("Path segment cannot be empty".to_string());
    }
    if segment.len() > max_name_length {
        return Some(format!(
            "Path segment exceeds max name length ({})",
            max_name_length
        ));
    }
    if has_forbidden_chars(segment) {
        return Some("Path segment contains forbidden characters".to_string());
    }
    None
}

/// Validate a normalized path against limits. Returns `Some(error_message)` if invalid.
pub fn validate_path(normalized_path: &str, limits: &VfsLimits) -> Option<String> {
    if normalized_path.len() > limits.max_path_length {
        return Some(format!(
            "Path exceeds max length ({})",
            limits.max_path_length
        ));
    }
    if path_depth(normalized_path) > limits.max_path_depth {
        return Some(format!(
            "Path exceeds max depth ({})",
            limits.max_path_depth
        ));
    }
    normalized_path
        .split('/')
        .filter(|s| !s.is_empty())
        .find_map(|seg| validate_segment(seg, limits.max_name_length))
}

// ── Tests ───────────────────────────────────────────────────────────────────
