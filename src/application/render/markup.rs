//! Annotated HTML rendering of a forest

use chrono::{DateTime, FixedOffset, Offset, Utc};
use minijinja::value::Value;
use minijinja::{context, AutoEscape, Environment};
use tracing::debug;

use crate::application::render::document::{to_structured_document, Document};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{CategoryName, CategoryNode, Classifier, Forest};

/// Page template shipped with the crate.
pub const DEFAULT_TEMPLATE: &str = include_str!("../../../templates/domain_tree.html");

pub const DEFAULT_TITLE: &str = "Domain List Community Tree";

/// Minutes east of UTC used for the displayed timestamp (UTC+08:00).
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 8 * 60;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Presentation settings for the markup page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupOptions {
    pub title: String,
    pub utc_offset: FixedOffset,
    /// Base URL of the raw rule files; each node links to `<base>/<name>`
    pub source_url_base: Option<String>,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            utc_offset: utc_offset_from_minutes(DEFAULT_UTC_OFFSET_MINUTES)
                .unwrap_or_else(|| Utc.fix()),
            source_url_base: None,
        }
    }
}

/// `None` if the offset is out of chrono's +-24h range.
pub fn utc_offset_from_minutes(minutes: i32) -> Option<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
}

/// Renders a forest into an HTML page of collapsible, classified blocks.
///
/// Classification lists and the page template are injected so tests and
/// operators can substitute their own.
#[derive(Debug, Clone)]
pub struct TreeRenderer {
    classifier: Classifier,
    template: String,
    options: MarkupOptions,
}

impl Default for TreeRenderer {
    fn default() -> Self {
        Self::new(
            Classifier::default(),
            DEFAULT_TEMPLATE.to_string(),
            MarkupOptions::default(),
        )
    }
}

impl TreeRenderer {
    pub fn new(classifier: Classifier, template: String, options: MarkupOptions) -> Self {
        Self {
            classifier,
            template,
            options,
        }
    }

    /// Structured document for `forest`; see [`to_structured_document`].
    pub fn to_structured_document(&self, forest: &Forest) -> Document {
        to_structured_document(forest)
    }

    /// Render the full page. The template receives `title`, `generated_at`,
    /// `total_categories`, `root_label` and the pre-rendered `tree_html`.
    pub fn to_annotated_markup(
        &self,
        forest: &Forest,
        generated_at: DateTime<Utc>,
    ) -> ApplicationResult<String> {
        let tree_html = self.to_markup_fragment(forest);
        let timestamp = generated_at
            .with_timezone(&self.options.utc_offset)
            .format(TIMESTAMP_FORMAT)
            .to_string();

        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);
        let page = env
            .render_str(
                &self.template,
                context! {
                    title => self.options.title.as_str(),
                    generated_at => timestamp,
                    total_categories => forest.category_count(),
                    root_label => forest.label(),
                    tree_html => Value::from_safe_string(tree_html),
                },
            )
            .map_err(|e| ApplicationError::Template {
                message: e.to_string(),
            })?;
        debug!(bytes = page.len(), "markup rendered");
        Ok(page)
    }

    /// Nested blocks for every category below the synthetic anchor, which is
    /// itself not rendered. Every collapsible block starts collapsed; the page
    /// script opens the first level.
    pub fn to_markup_fragment(&self, forest: &Forest) -> String {
        let mut out = String::new();
        let mut stack: Vec<Step<'_>> = forest.roots().map(Step::Enter).collect();
        stack.reverse();

        while let Some(step) = stack.pop() {
            let node = match step {
                Step::Enter(node) => node,
                Step::Close => {
                    out.push_str("</div>");
                    continue;
                }
            };
            let kind = self.classifier.classify(node.name.as_str());
            let label = escape_html(node.name.as_str());
            let source = self.source_link(&node.name);

            if node.is_leaf() {
                out.push_str(&format!(
                    r#"<div class="node {kind}"><span class="node-content">{label}</span>{source}</div>"#
                ));
                continue;
            }

            out.push_str(&format!(
                r#"<div class="node collapsible collapsed {kind}"><span class="node-content">{label}</span>{source}</div>"#
            ));
            out.push_str(r#"<div class="children hidden">"#);
            stack.push(Step::Close);
            let children: Vec<_> = forest.children(node).collect();
            stack.extend(children.into_iter().rev().map(Step::Enter));
        }
        out
    }

    fn source_link(&self, name: &CategoryName) -> String {
        match &self.options.source_url_base {
            Some(base) => format!(
                r#"<a href="{}/{}" target="_blank" rel="noopener" class="view-source-btn" onclick="event.stopPropagation()">source</a>"#,
                escape_html(base.trim_end_matches('/')),
                escape_html(name.as_str())
            ),
            None => String::new(),
        }
    }
}

enum Step<'a> {
    Enter(&'a CategoryNode),
    Close,
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
