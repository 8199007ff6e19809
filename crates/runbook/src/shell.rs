//! Shell recipe runner.

use tokio::process::Command;
use tracing::debug;

/// Captured outcome of a shell recipe.
#[derive(Debug, Clone)]
pub struct RecipeOutput {
    /// Whether the recipe exited 0
    pub success: bool,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl RecipeOutput {
    /// Whether stdout mentions the given word, case-insensitively. The
    /// kubectl recipes sometimes exit non-zero while still reporting
    /// success ("created", "deleted") on stdout.
    #[must_use]
    pub fn stdout_mentions(&self, word: &str) -> bool {
        self.stdout.to_lowercase().contains(&word.to_lowercase())
    }
}

/// Run a recipe under `sh -c`, capturing output.
pub async fn run_recipe(script: &str) -> std::io::Result<RecipeOutput> {
    debug!(%script, "running recipe");
    let output = Command::new("sh").arg("-c").arg(script).output().await?;

    Ok(RecipeOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_status() {
        let output = run_recipe("echo created").await.unwrap();
        assert!(output.success);
        assert!(output.stdout_mentions("Created"));
    }

    #[tokio::test]
    async fn nonzero_exit_is_not_success() {
        let output = run_recipe("echo oops >&2; exit 3").await.unwrap();
        assert!(!output.success);
        assert_eq!(output.stderr.trim(), "oops");
    }
}
