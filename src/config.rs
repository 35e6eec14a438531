//! Saved default flags.
//!
//! Defaults live in plain-text rc files holding command-line style tokens
//! (`--format svg`, `--scale=3`), one or more per line, with `#` comments.
//! The global file is merged with a local `.mermaid-exportrc`, and flags
//! given on the command line override both.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::export::{ExportFormat, ExportOptions};

const APP_DIR: &str = "mermaid-export";
const LOCAL_RC: &str = ".mermaid-exportrc";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConfigFlags {
    pub format: Option<ExportFormat>,
    pub filename: Option<String>,
    pub out_dir: Option<PathBuf>,
    pub scale: Option<f64>,
    pub padding: Option<f64>,
    pub fetch_timeout_secs: Option<u64>,
    pub perf: bool,
}

impl ConfigFlags {
    /// Merge `other` over `self`: options set in `other` win, switches add up.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            format: other.format.or(self.format),
            filename: other.filename.clone().or_else(|| self.filename.clone()),
            out_dir: other.out_dir.clone().or_else(|| self.out_dir.clone()),
            scale: other.scale.or(self.scale),
            padding: other.padding.or(self.padding),
            fetch_timeout_secs: other.fetch_timeout_secs.or(self.fetch_timeout_secs),
            perf: self.perf || other.perf,
        }
    }

    /// Pipeline options with these flags applied over the defaults.
    pub fn export_options(&self) -> ExportOptions {
        let defaults = ExportOptions::default();
        ExportOptions {
            padding: self.padding.unwrap_or(defaults.padding),
            scale: self.scale.unwrap_or(defaults.scale),
            default_filename: self
                .filename
                .clone()
                .unwrap_or_else(|| defaults.default_filename.clone()),
            ..defaults
        }
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR).join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR)
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join(APP_DIR).join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(".config").join(APP_DIR).join("config");
        }
    }

    PathBuf::from(LOCAL_RC)
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(LOCAL_RC)
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(split_line)
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# mermaid-export defaults (saved with --save)".to_string());
    if let Some(format) = flags.format {
        lines.push(format!("--format {format}"));
    }
    if let Some(filename) = &flags.filename {
        lines.push(format!("--filename {}", quote_value(filename)));
    }
    if let Some(dir) = &flags.out_dir {
        lines.push(format!("--out-dir {}", quote_value(&dir.display().to_string())));
    }
    if let Some(scale) = flags.scale {
        lines.push(format!("--scale {scale}"));
    }
    if let Some(padding) = flags.padding {
        lines.push(format!("--padding {padding}"));
    }
    if let Some(secs) = flags.fetch_timeout_secs {
        lines.push(format!("--fetch-timeout {secs}"));
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Split an rc line into tokens. Double quotes group words, and inside them
/// a backslash escapes the next character.
fn split_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_token = true;
                while let Some(q) = chars.next() {
                    match q {
                        '"' => break,
                        '\\' => current.extend(chars.next()),
                        _ => current.push(q),
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            _ => {
                in_token = true;
                current.push(c);
            }
        }
    }
    if in_token {
        tokens.push(current);
    }
    tokens
}

/// Quote `value` for an rc file when it would not survive [`split_line`]
/// as a single bare token.
fn quote_value(value: &str) -> String {
    if !value.is_empty() && !value.chars().any(|c| c.is_whitespace() || c == '"') {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Extract known flags from command-line style tokens. Unknown tokens and
/// unparseable values are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        if token == "--perf" {
            flags.perf = true;
            i += 1;
            continue;
        }

        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        if !is_value_flag(name) {
            i += 1;
            continue;
        }
        let value = match inline_value {
            Some(value) => value,
            None => {
                i += 1;
                match tokens.get(i) {
                    Some(next) => next.as_str(),
                    None => break,
                }
            }
        };
        apply_value(&mut flags, name, value);
        i += 1;
    }
    flags
}

fn is_value_flag(name: &str) -> bool {
    matches!(
        name,
        "--format"
            | "-f"
            | "--filename"
            | "--out-dir"
            | "-o"
            | "--scale"
            | "--padding"
            | "--fetch-timeout"
    )
}

fn apply_value(flags: &mut ConfigFlags, name: &str, value: &str) {
    match name {
        "--format" | "-f" => flags.format = value.parse().ok(),
        "--filename" => flags.filename = Some(value.to_string()),
        "--out-dir" | "-o" => flags.out_dir = Some(PathBuf::from(value)),
        "--scale" => flags.scale = parse_positive(value),
        "--padding" => {
            flags.padding = value
                .parse::<f64>()
                .ok()
                .filter(|p| p.is_finite() && *p >= 0.0);
        }
        "--fetch-timeout" => flags.fetch_timeout_secs = value.parse().ok(),
        _ => {}
    }
}

fn parse_positive(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = tokens(&[
            "mermaid-export",
            "--format",
            "svg",
            "--filename=flow",
            "-o",
            "out",
            "--scale",
            "3",
            "--padding=12.5",
            "--fetch-timeout",
            "10",
            "--perf",
            "preview.xhtml",
        ]);
        let flags = parse_flag_tokens(&args);
        assert_eq!(flags.format, Some(ExportFormat::Svg));
        assert_eq!(flags.filename.as_deref(), Some("flow"));
        assert_eq!(flags.out_dir, Some(PathBuf::from("out")));
        assert_eq!(flags.scale, Some(3.0));
        assert_eq!(flags.padding, Some(12.5));
        assert_eq!(flags.fetch_timeout_secs, Some(10));
        assert!(flags.perf);
    }

    #[test]
    fn test_parse_flag_tokens_skips_invalid_values() {
        let flags = parse_flag_tokens(&tokens(&["--scale", "0", "--format", "gif", "--padding=-1"]));
        assert_eq!(flags.scale, None);
        assert_eq!(flags.format, None);
        assert_eq!(flags.padding, None);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            perf: true,
            format: Some(ExportFormat::Png),
            scale: Some(4.0),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            format: Some(ExportFormat::Svg),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.perf);
        assert_eq!(merged.format, Some(ExportFormat::Svg));
        assert_eq!(merged.scale, Some(4.0));
    }

    #[test]
    fn test_export_options_apply_overrides() {
        let flags = ConfigFlags {
            scale: Some(1.0),
            padding: Some(0.0),
            filename: Some("diagram".to_string()),
            ..ConfigFlags::default()
        };
        let options = flags.export_options();
        assert_eq!(options.scale, 1.0);
        assert_eq!(options.padding, 0.0);
        assert_eq!(options.default_filename, "diagram");
        assert_eq!(options.container_class, "svg-container");

        let defaults = ConfigFlags::default().export_options();
        assert_eq!(defaults, ExportOptions::default());
    }

    #[test]
    fn test_saved_values_with_spaces_reload_intact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config");
        let flags = ConfigFlags {
            filename: Some("my chart".to_string()),
            out_dir: Some(PathBuf::from("/home/me/My Exports")),
            ..ConfigFlags::default()
        };

        save_config_flags(&path, &flags).unwrap();
        assert_eq!(load_config_flags(&path).unwrap(), flags);
    }

    #[test]
    fn test_split_line_honours_quotes_and_escapes() {
        assert_eq!(
            split_line(r#"--filename "a \"b\" c" --out-dir=C:\exports --perf"#),
            vec!["--filename", r#"a "b" c"#, r"--out-dir=C:\exports", "--perf"]
        );
        assert_eq!(split_line(r#"--filename """#), vec!["--filename", ""]);
        assert_eq!(quote_value(r"C:\My Exports"), r#""C:\\My Exports""#);
        assert_eq!(quote_value("plain"), "plain");
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config");
        let flags = ConfigFlags {
            format: Some(ExportFormat::Svg),
            filename: Some("chart".to_string()),
            out_dir: Some(PathBuf::from("exports")),
            scale: Some(2.5),
            padding: Some(10.0),
            fetch_timeout_secs: Some(30),
            perf: true,
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }
}
