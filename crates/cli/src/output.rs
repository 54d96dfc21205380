//! JSON output to stdout or a file.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

const INDENT: &[u8] = b"    ";

/// Where command results are written
#[derive(Debug, Default)]
pub struct Output {
    path: Option<PathBuf>,
}

impl Output {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Print `value` as indented JSON, replacing the file if one was given.
    pub fn emit(&self, value: &Value) -> anyhow::Result<()> {
        let rendered = render(value)?;
        match &self.path {
            Some(path) => std::fs::write(path, rendered)
                .with_context(|| format!("failed to write output to {}", path.display())),
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(&rendered).context("failed to write to stdout")?;
                stdout.flush().context("failed to flush stdout")
            }
        }
    }
}

fn render(value: &Value) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut serializer).context("failed to render JSON")?;
    buf.push(b'\n');
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn renders_four_space_indent_and_unicode() {
        let rendered = render(&json!({"title": "café", "n": [1]})).unwrap();
        let text = String::from_utf8(rendered).unwrap();

        assert!(text.contains("\n    \"n\": [\n        1\n    ]"));
        assert!(text.contains("café"));
        assert!(text.ends_with("}\n"));
    }

    #[test]
    fn writes_to_file_when_configured() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");

        Output::new(Some(path.clone())).emit(&json!({"ok": true})).unwrap();

        let written: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(written, json!({"ok": true}));
    }
}
