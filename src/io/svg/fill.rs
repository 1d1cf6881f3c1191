use std::{fs, path::Path, sync::OnceLock};

use regex::Regex;

use crate::common::write_file;
use crate::error::{Error, Result};

/// Matches an even-odd fill rule as an attribute (`fill-rule="evenodd"`) or a
/// style declaration (`fill-rule: evenodd`).
fn evenodd_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"fill-rule(?P<sep>\s*=\s*["']|\s*:\s*)evenodd"#)
            .expect("fill-rule pattern is valid")
    })
}

/// Replace every even-odd fill rule in `svg` with non-zero.
///
/// Self-crossing paths render with spurious holes under even-odd fill.
pub fn replace_fill_rule(svg: &str) -> Option<String> {
    let pattern = evenodd_pattern();
    pattern.is_match(svg)
        .then(|| pattern.replace_all(svg, "fill-rule${sep}nonzero").into_owned())
}

/// Rewrite the fill rule of the SVG file at `path` in place.
/// Returns `false` (and leaves the file alone) when it has no even-odd rule.
pub fn fix_fill_rule(path: &Path) -> Result<bool> {
    let svg = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    match replace_fill_rule(&svg) {
        Some(fixed) => {
            write_file(path, fixed)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rewrites_attributes_and_styles() {
        let svg = r#"<path fill-rule="evenodd" d="M0,0Z"/><path style="fill-rule: evenodd;fill:#727272"/><g fill-rule='evenodd'/>"#;
        let fixed = replace_fill_rule(svg).unwrap();
        assert_eq!(
            fixed,
            r#"<path fill-rule="nonzero" d="M0,0Z"/><path style="fill-rule: nonzero;fill:#727272"/><g fill-rule='nonzero'/>"#,
        );
    }

    #[test]
    fn leaves_nonzero_alone() {
        assert!(replace_fill_rule(r#"<path fill-rule="nonzero"/>"#).is_none());
    }

    #[test]
    fn fix_fill_rule_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("us_state_1861_modern_data_output.svg");
        fs::write(&path, r#"<svg><path fill-rule="evenodd"/></svg>"#).unwrap();

        assert!(fix_fill_rule(&path).unwrap());
        assert!(!fix_fill_rule(&path).unwrap());
        assert_eq!(fs::read_to_string(&path).unwrap(), r#"<svg><path fill-rule="nonzero"/></svg>"#);
    }
}
