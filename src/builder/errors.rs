//! Errors raised while executing a build.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{what} failed (exit code {}):\n{command}\n{output}", exit_code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    ProcessFailed {
        /// What was being done, e.g. `compiling src/main.c`
        what: String,
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("failed to run {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_failed_message() {
        let err = BuildError::ProcessFailed {
            what: "compiling src/a.c".to_string(),
            command: "gcc -c src/a.c".to_string(),
            exit_code: None,
            output: "a.c:1: error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "compiling src/a.c failed (exit code none):\ngcc -c src/a.c\na.c:1: error"
        );
    }
}
