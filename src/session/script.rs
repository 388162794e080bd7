//! Script files.
//!
//! A script is plain text, one instruction per line:
//! - Lines starting with `#` are comments
//! - Blank lines are ignored
//! - A line reading `@@ break` splits the script: everything after it is
//!   queued for single-stepping instead of running immediately

use std::path::Path;
use thiserror::Error;

/// The breakpoint marker line.
pub const BREAK_MARKER: &str = "@@ break";

/// Strip comments and blank lines, trimming what is left.
///
/// The marker line is kept; [`Session::load_script`](super::Session::load_script)
/// does the split.
pub fn parse_script(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read and clean a script file.
pub fn load_script_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, ScriptError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_script(&text))
}

/// Errors that can occur while loading a script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("cannot read script {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let text = r#"
            # set up the stack
            MOV sp, #0x1000

            MOV r0, #1
            @@ break
            PUSH {r0}
        "#;

        assert_eq!(
            parse_script(text),
            vec!["MOV sp, #0x1000", "MOV r0, #1", "@@ break", "PUSH {r0}"]
        );
    }

    #[test]
    fn test_missing_file() {
        let err = load_script_file("/definitely/not/here.s").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.s"));
    }
}
