//! HTML harness and stylesheet emission.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Which tree a harness is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessMode {
    /// Loads the module loader, the manifest and the entry module.
    Debug,
    /// Loads the single optimized bundle.
    Release,
}

/// Render `index.html` for `project`.
///
/// `manifest` is only used in [`HarnessMode::Debug`].
pub fn render_harness(
    mode: HarnessMode,
    project: &str,
    manifest: &str,
    extra_head_tags: &[String],
) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n");
    html.push_str("<html>\n");
    html.push_str("<head>\n");
    html.push_str("\t<meta http-equiv=\"X-UA-Compatible\" content=\"IE=edge,chrome=1\">\n");
    html.push_str("\t<meta http-equiv=\"Content-Type\" content=\"text/html; charset=utf-8\">\n");
    html.push_str(&format!(
        "\t<link rel=\"stylesheet\" type=\"text/css\" href=\"{}.css\">\n",
        project
    ));

    for tag in extra_head_tags {
        html.push_str(tag);
        html.push('\n');
    }

    match mode {
        HarnessMode::Debug => {
            html.push_str(
                "\t<script type=\"text/javascript\" src=\"./library/closure/goog/base.js\"></script>\n",
            );
            html.push_str("\t<script type=\"text/javascript\">\n");
            html.push_str(manifest);
            html.push_str(&format!("\t\tgoog.require(\"{}\");\n", project));
            html.push_str("\t</script>\n");
        }
        HarnessMode::Release => {
            html.push_str(&format!(
                "\t<script type=\"text/javascript\" src=\"./{}.js\"></script>\n",
                project
            ));
        }
    }

    html.push_str("</head>\n");
    html.push_str("<body>\n");
    html.push_str("\t<script type=\"text/javascript\">\n");
    html.push_str(&format!("\t\tnew {}().start();\n", project));
    html.push_str("\t</script>\n");
    html.push_str("</body>\n");
    html.push_str("</html>");
    html
}

/// Write `index.html` into `dest_dir`.
pub fn write_harness(
    mode: HarnessMode,
    project: &str,
    dest_dir: &Path,
    manifest: &str,
    extra_head_tags: &[String],
) -> Result<PathBuf> {
    let path = dest_dir.join("index.html");
    let html = render_harness(mode, project, manifest, extra_head_tags);
    fs::write(&path, html).map_err(Error::fs(&path))?;
    tracing::debug!("Wrote {:?} harness {}", mode, path.display());
    Ok(path)
}

/// Write the project stylesheet `<project>.css` into `dest_dir`.
pub fn write_css(project: &str, dest_dir: &Path, css: &str) -> Result<PathBuf> {
    let path = dest_dir.join(format!("{}.css", project));
    fs::write(&path, css).map_err(Error::fs(&path))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MANIFEST: &str = "goog.addDependency('../../../App.js', ['App'], []);\n";

    #[test]
    fn test_debug_harness() {
        let html = render_harness(HarnessMode::Debug, "App", MANIFEST, &[]);

        assert!(html.starts_with("<!DOCTYPE html>\n"));
        assert!(html.contains("href=\"App.css\""));
        assert!(html.contains("src=\"./library/closure/goog/base.js\""));
        assert!(html.contains(MANIFEST));
        assert!(html.contains("goog.require(\"App\");"));
        assert!(html.contains("new App().start();"));
        assert!(!html.contains("src=\"./App.js\""));
        assert!(html.ends_with("</html>"));
    }

    #[test]
    fn test_release_harness() {
        let html = render_harness(HarnessMode::Release, "App", MANIFEST, &[]);

        assert!(html.contains("<script type=\"text/javascript\" src=\"./App.js\"></script>"));
        assert!(!html.contains("base.js"));
        assert!(!html.contains("addDependency"));
        assert!(html.contains("new App().start();"));
    }

    #[test]
    fn test_extra_head_tags_in_head() {
        let tags = vec!["<script src=\"https://cdn.example.com/lib.js\"></script>".to_string()];
        let html = render_harness(HarnessMode::Release, "App", "", &tags);

        let tag_pos = html.find(&tags[0]).expect("tag missing");
        let head_end = html.find("</head>").expect("head missing");
        assert!(tag_pos < head_end);
    }

    #[test]
    fn test_write_harness_and_css() {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let index = write_harness(HarnessMode::Release, "App", temp.path(), "", &[])
            .expect("Failed to write harness");
        let css = write_css("App", temp.path(), "body { margin: 0; }").expect("Failed to write css");

        assert_eq!(index, temp.path().join("index.html"));
        assert_eq!(
            fs::read_to_string(css).expect("Failed to read css"),
            "body { margin: 0; }"
        );
    }
}
