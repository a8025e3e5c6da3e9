use anyhow::{Context, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn has_wildcard(component: &str) -> bool {
    component.contains(['*', '?', '['])
}

/// Translate a file glob into an anchored regex over `/`-separated paths
fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut out = String::from("^");
    let chars: Vec<char> = pattern.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            '[' => match chars[i + 1..].iter().position(|c| *c == ']') {
                Some(len) => {
                    let class: String = chars[i + 1..i + 1 + len].iter().collect();
                    let (negate, body) = match class.strip_prefix('!') {
                        Some(rest) => (true, rest),
                        None => (false, class.as_str()),
                    };
                    out.push('[');
                    if negate {
                        out.push('^');
                    }
                    for c in body.chars() {
                        if matches!(c, '\\' | '[' | ']' | '^' | '&' | '~') {
                            out.push('\\');
                        }
                        out.push(c);
                    }
                    out.push(']');
                    i += len + 2;
                    continue;
                }
                None => out.push_str(r"\["),
            },
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }

    out.push('$');
    Regex::new(&out).with_context(|| format!("Invalid file pattern: {}", pattern))
}

/// Expand a file glob (`*`, `?`, `[...]`, `**`) into matching regular files,
/// sorted lexicographically.
pub fn discover(pattern: &str) -> Result<Vec<PathBuf>> {
    let normalized = pattern.replace('\\', "/");
    let components: Vec<&str> = normalized.split('/').collect();

    let literal = components
        .iter()
        .position(|c| has_wildcard(c))
        .unwrap_or(components.len());

    if literal == components.len() {
        let path = PathBuf::from(&normalized);
        return Ok(if path.is_file() { vec![path] } else { Vec::new() });
    }

    let base = components[..literal].join("/");
    let root = if base.is_empty() {
        let root = if normalized.starts_with('/') { "/" } else { "." };
        root.to_string()
    } else {
        base.clone()
    };

    if !Path::new(&root).is_dir() {
        return Ok(Vec::new());
    }

    let matcher = glob_to_regex(&normalized)?;
    let mut walker = WalkDir::new(&root).follow_links(true);
    if !normalized.contains("**") {
        walker = walker.max_depth(components.len() - literal);
    }

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let candidate = path.to_string_lossy().replace('\\', "/");
        let candidate = if base.is_empty() && root == "." {
            candidate.trim_start_matches("./").to_string()
        } else {
            candidate
        };
        if matcher.is_match(&candidate) {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_glob_translation() {
        let re = glob_to_regex("data/eval/*.docx").unwrap();
        assert!(re.is_match("data/eval/sample.docx"));
        assert!(!re.is_match("data/eval/nested/sample.docx"));
        assert!(!re.is_match("data/eval/sample.txt"));

        let re = glob_to_regex("docs/**/*.txt").unwrap();
        assert!(re.is_match("docs/a.txt"));
        assert!(re.is_match("docs/x/y/a.txt"));

        let re = glob_to_regex("term_[!b]?.md").unwrap();
        assert!(re.is_match("term_a1.md"));
        assert!(!re.is_match("term_b1.md"));
    }

    #[test]
    fn test_discover_sorted_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.docx"), b"b").unwrap();
        fs::write(dir.path().join("a.docx"), b"a").unwrap();
        fs::write(dir.path().join("notes.txt"), b"n").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.docx"), b"c").unwrap();

        let pattern = format!("{}/*.docx", dir.path().display());
        let files = discover(&pattern).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.docx", "b.docx"]);

        let pattern = format!("{}/**/*.docx", dir.path().display());
        assert_eq!(discover(&pattern).unwrap().len(), 3);
    }

    #[test]
    fn test_missing_base_dir_is_empty() {
        assert!(discover("no/such/dir/*.docx").unwrap().is_empty());
        assert!(discover("no/such/file.docx").unwrap().is_empty());
    }
}
