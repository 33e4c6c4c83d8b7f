//! Run-level outputs for the calling CI job

use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// CI file that collects `key=value` step outputs
pub const GITHUB_OUTPUT_VAR: &str = "GITHUB_OUTPUT";

/// What a run reports back; `url` and `hostname` are empty when the
/// platform has not assigned an address yet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunOutputs {
    pub app_id: String,
    pub url: String,
    pub hostname: String,
}

impl RunOutputs {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("app_id={}", self.app_id),
            format!("url={}", self.url),
            format!("hostname={}", self.hostname),
        ]
    }

    /// Print to stdout and append to `$GITHUB_OUTPUT` when it is set
    pub fn publish(&self) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for line in self.lines() {
            writeln!(out, "{}", line)?;
        }

        if let Some(path) = std::env::var_os(GITHUB_OUTPUT_VAR).filter(|p| !p.is_empty()) {
            self.append_to(Path::new(&path))?;
            tracing::debug!(path = %Path::new(&path).display(), "Wrote step outputs");
        }

        Ok(())
    }

    pub fn append_to(&self, path: &Path) -> io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        for line in self.lines() {
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_append_keeps_existing_outputs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("output");
        fs::write(&path, "previous=1\n").unwrap();

        let outputs = RunOutputs {
            app_id: "app-42".to_string(),
            url: "https://shop.example.app".to_string(),
            hostname: "shop.example.app".to_string(),
        };
        outputs.append_to(&path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "previous=1\napp_id=app-42\nurl=https://shop.example.app\nhostname=shop.example.app\n"
        );
    }

    #[test]
    fn test_empty_endpoint_is_still_reported() {
        let outputs = RunOutputs {
            app_id: "app-42".to_string(),
            ..RunOutputs::default()
        };
        assert_eq!(outputs.lines(), vec!["app_id=app-42", "url=", "hostname="]);
    }
}
