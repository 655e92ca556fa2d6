use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use linenumbering::{ChangeRecommendation, LineRange};
use serde::Deserialize;

/// ```toml
/// [[recommendation]]
/// from = 3
/// to = 4
/// text = "<p>New wording.</p>"
/// ```
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecommendationFile {
    #[serde(default)]
    recommendation: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Entry {
    from: u32,
    to: u32,
    #[serde(default)]
    text: String,
}

pub fn load(path: &Path) -> Result<Vec<ChangeRecommendation>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse(&content).with_context(|| format!("in {}", path.display()))
}

fn parse(content: &str) -> Result<Vec<ChangeRecommendation>> {
    let file: RecommendationFile = toml::from_str(content)?;
    file.recommendation
        .into_iter()
        .map(|entry| {
            let range = LineRange::new(entry.from, entry.to)?;
            let rec = ChangeRecommendation::from_html(range, &entry.text)
                .with_context(|| format!("replacement for lines {range}"))?;
            Ok(rec)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_in_file_order() {
        let recs = parse(
            r#"
[[recommendation]]
from = 4
to = 4

[[recommendation]]
from = 1
to = 2
text = "<p>new</p>"
"#,
        )
        .expect("valid");
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].range(), LineRange::single(4));
        assert_eq!(recs[1].range(), LineRange::new(1, 2).expect("ordered"));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let err = parse("[[recommendation]]\nfrom = 5\nto = 2\n").expect_err("inverted");
        assert!(err.to_string().contains('5'), "{err}");
    }

    #[test]
    fn malformed_replacement_is_rejected() {
        assert!(parse("[[recommendation]]\nfrom = 1\nto = 1\ntext = \"<p>open\"\n").is_err());
    }
}
