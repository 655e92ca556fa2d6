//! TOML scenario files for end-to-end line numbering tests.
//!
//! Expected markup uses a shorthand for markers: `{N}` is the number marker
//! for line N, `{wN}` a break marker followed by it. [`expand_markers`]
//! turns the shorthand into real markup.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

pub const SCENARIO_FORMAT: &str = "line-scenarios-v1";

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioStatus {
    #[default]
    Active,
    Skip,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recommendation {
    pub from: u32,
    pub to: u32,
    pub text: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub status: ScenarioStatus,
    pub reason: Option<String>,
    pub max_line_length: usize,
    #[serde(default = "default_first_line")]
    pub first_line: u32,
    pub input: String,
    pub numbered: String,
    #[serde(default, rename = "recommendation")]
    pub recommendations: Vec<Recommendation>,
    pub diff: Option<String>,
    pub applied: Option<String>,
    /// Expected `[from, to]` of the numbered document.
    pub range: Option<[u32; 2]>,
}

fn default_first_line() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    format: String,
    #[serde(default, rename = "scenario")]
    scenarios: Vec<Scenario>,
}

/// Load and validate one scenario file. Panics with the file path on any
/// problem, the way fixture loaders do.
pub fn load_scenarios(path: &Path) -> Vec<Scenario> {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read scenario file {path:?}: {err}"));
    let file: ScenarioFile = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("invalid scenario file {path:?}: {err}"));
    if file.format != SCENARIO_FORMAT {
        panic!("unsupported scenario format '{}' in {path:?}", file.format);
    }
    let mut seen = std::collections::BTreeSet::new();
    for scenario in &file.scenarios {
        let name = &scenario.name;
        if !seen.insert(name.clone()) {
            panic!("duplicate scenario '{name}' in {path:?}");
        }
        match scenario.status {
            ScenarioStatus::Active if scenario.reason.is_some() => {
                panic!("scenario '{name}' has reason but is not skipped in {path:?}");
            }
            ScenarioStatus::Skip if scenario.reason.as_deref().unwrap_or("").is_empty() => {
                panic!("skipped scenario '{name}' is missing a reason in {path:?}");
            }
            _ => {}
        }
        if scenario.recommendations.is_empty()
            && (scenario.diff.is_some() || scenario.applied.is_some())
        {
            panic!("scenario '{name}' expects a merge but has no recommendations in {path:?}");
        }
    }
    file.scenarios
}

/// Every `*.toml` file under `dir`, sorted by name.
pub fn scenario_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap_or_else(|err| panic!("failed to read scenario dir {dir:?}: {err}"))
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    files.sort();
    files
}

/// Substring filter from `LINENUMBERING_SCENARIO_FILTER`.
pub struct ScenarioFilter(Option<String>);

impl ScenarioFilter {
    pub fn from_env() -> Self {
        Self(
            env::var("LINENUMBERING_SCENARIO_FILTER")
                .ok()
                .filter(|value| !value.trim().is_empty()),
        )
    }

    pub fn matches(&self, name: &str) -> bool {
        self.0.as_deref().is_none_or(|needle| name.contains(needle))
    }
}

pub fn number_marker_html(line: u32) -> String {
    format!(
        r#"<span contenteditable="false" class="os-line-number line-number-{line}" data-line-number="{line}">&nbsp;</span>"#
    )
}

pub const BREAK_MARKER_HTML: &str = r#"<br class="os-line-break">"#;

/// Replace `{N}` and `{wN}` with marker markup. Other braces are kept.
pub fn expand_markers(shorthand: &str) -> String {
    let mut out = String::with_capacity(shorthand.len() * 2);
    let mut rest = shorthand;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let Some(close) = tail.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let inner = &tail[..close];
        let (wrapped, digits) = match inner.strip_prefix('w') {
            Some(digits) => (true, digits),
            None => (false, inner),
        };
        match digits.parse::<u32>() {
            Ok(line) => {
                if wrapped {
                    out.push_str(BREAK_MARKER_HTML);
                }
                out.push_str(&number_marker_html(line));
            }
            Err(_) => {
                out.push('{');
                out.push_str(inner);
                out.push('}');
            }
        }
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_marker_shorthand() {
        assert_eq!(
            expand_markers("<p>{1}a{w2}b {x}</p>"),
            format!(
                "<p>{}a{BREAK_MARKER_HTML}{}b {{x}}</p>",
                number_marker_html(1),
                number_marker_html(2)
            )
        );
        assert_eq!(expand_markers("open {3"), "open {3");
    }

    #[test]
    fn filter_matches_substrings() {
        assert!(ScenarioFilter(None).matches("anything"));
        assert!(ScenarioFilter(Some("list".into())).matches("ordered-list-start"));
        assert!(!ScenarioFilter(Some("list".into())).matches("plain"));
    }
}
