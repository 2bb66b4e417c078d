//! Public HTML projection of the editor's inner HTML.
//!
//! Framework class markers are stripped, except alignment, which becomes an
//! inline `text-align` declaration. Everything else passes through.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use smol_str::SmolStr;

static CLASS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#" class="([^"]*)""#).expect("class attribute pattern"));

static ALIGN_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ql-align-(right|center|justify)$").expect("align class pattern"));

/// Strips framework classes from writer output.
#[derive(Clone, Debug, Default)]
pub struct HtmlProjection {
    /// Host scoping classes removed along with `ql-*` markers.
    scope_classes: Vec<SmolStr>,
}

impl HtmlProjection {
    pub fn new(scope_classes: impl IntoIterator<Item = impl Into<SmolStr>>) -> Self {
        Self {
            scope_classes: scope_classes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn project(&self, inner_html: &str) -> String {
        CLASS_ATTR
            .replace_all(inner_html, |caps: &Captures<'_>| self.rewrite_class(&caps[1]))
            .into_owned()
    }

    fn rewrite_class(&self, classes: &str) -> String {
        let mut align = None;
        let mut kept: Vec<&str> = Vec::new();
        for class in classes.split_whitespace() {
            if self.scope_classes.iter().any(|scope| scope == class) {
                continue;
            }
            if let Some(caps) = ALIGN_CLASS.captures(class) {
                align = caps.get(1).map(|m| m.as_str());
            } else if !class.starts_with("ql-") {
                kept.push(class);
            }
        }
        let mut out = String::new();
        if !kept.is_empty() {
            out.push_str(" class=\"");
            out.push_str(&kept.join(" "));
            out.push('"');
        }
        if let Some(align) = align {
            out.push_str(" style=\"text-align: ");
            out.push_str(align);
            out.push('"');
        }
        out
    }
}

/// Project with no scoping classes.
pub fn project(inner_html: &str) -> String {
    HtmlProjection::default().project(inner_html)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_becomes_style() {
        insta::assert_snapshot!(
            project(r#"<p class="ql-align-center">x</p><p class="ql-align-right ql-indent-2">y</p>"#),
            @r#"<p style="text-align: center">x</p><p style="text-align: right">y</p>"#
        );
    }

    #[test]
    fn test_framework_classes_removed() {
        insta::assert_snapshot!(
            project(r#"<pre class="ql-syntax" spellcheck="false">a</pre><p class="ql-indent-1">b</p>"#),
            @r#"<pre spellcheck="false">a</pre><p>b</p>"#
        );
    }

    #[test]
    fn test_semantic_classes_kept() {
        let html = r#"<span class="readonly-section" contenteditable="false">s</span><span class="v-block">t</span>"#;
        assert_eq!(project(html), html);
    }

    #[test]
    fn test_scope_classes_removed() {
        let projection = HtmlProjection::new(["style-scope", "vcf-editor"]);
        assert_eq!(
            projection.project(r#"<p class="style-scope vcf-editor">x</p>"#),
            "<p>x</p>"
        );
    }

    #[test]
    fn test_text_content_untouched() {
        let html = "<p>class=&quot;ql-bold&quot; ql-foo</p>";
        assert_eq!(project(html), html);
    }

    #[test]
    fn test_left_alignment_class_dropped() {
        assert_eq!(project(r#"<p class="ql-align-left">x</p>"#), "<p>x</p>");
    }
}
