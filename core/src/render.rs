// Renderer projection
// Renderers paint a container from its runs; they make no decisions.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::law::LawDocument;
use crate::text_run::{Container, ContainerId};

/// Receives a container after it has changed.
pub trait Renderer {
    fn render(&mut self, container: &Container);
}

/// Renders highlighted runs wrapped in text markers, e.g. `A[[BCD]]E`.
#[derive(Debug, Clone)]
pub struct MarkupRenderer {
    open: String,
    close: String,
    output: BTreeMap<ContainerId, String>,
}

impl MarkupRenderer {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        MarkupRenderer {
            open: open.into(),
            close: close.into(),
            output: BTreeMap::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.highlight_open.as_str(),
            config.highlight_close.as_str(),
        )
    }

    /// Markup for one container
    pub fn markup(&self, container: &Container) -> String {
        let mut out = String::new();
        for run in container.runs() {
            if run.is_highlighted() {
                out.push_str(&self.open);
                out.push_str(run.text());
                out.push_str(&self.close);
            } else {
                out.push_str(run.text());
            }
        }
        out
    }

    /// Header plus every article, one paragraph each
    pub fn document(&self, document: &LawDocument) -> String {
        let mut out = String::new();
        out.push_str(&document.name);
        out.push('\n');
        match document.modified {
            Some(date) => out.push_str(&format!("最後修訂日期：{}\n", date.format("%Y-%m-%d"))),
            None if !document.modified_raw.is_empty() => {
                out.push_str(&format!("最後修訂日期：{}\n", document.modified_raw))
            }
            None => {}
        }
        for article in document.articles() {
            out.push('\n');
            out.push_str(&self.article(&article.label, &article.container));
        }
        out
    }

    pub fn article(&self, label: &str, container: &Container) -> String {
        format!("{}\n{}\n", label, self.markup(container))
    }

    /// What the last `render` call produced for `id`
    pub fn output(&self, id: ContainerId) -> Option<&str> {
        self.output.get(&id).map(String::as_str)
    }

    pub fn rendered(&self) -> impl Iterator<Item = (ContainerId, &str)> {
        self.output.iter().map(|(id, s)| (*id, s.as_str()))
    }
}

impl Default for MarkupRenderer {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl Renderer for MarkupRenderer {
    fn render(&mut self, container: &Container) {
        let markup = self.markup(container);
        self.output.insert(container.id(), markup);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::apply_highlight;

    #[test]
    fn test_markup() {
        let mut container = Container::new(ContainerId(0), "ABCDE");
        let span = container.span_between(1..4).unwrap();
        apply_highlight(&mut container, &span).unwrap();

        let renderer = MarkupRenderer::default();
        assert_eq!(renderer.markup(&container), "A[[BCD]]E");
        assert_eq!(MarkupRenderer::new("<", ">").markup(&container), "A<BCD>E");
    }

    #[test]
    fn test_render_records_output() {
        let container = Container::new(ContainerId(4), "plain");
        let mut renderer = MarkupRenderer::default();
        assert!(renderer.output(ContainerId(4)).is_none());

        renderer.render(&container);
        assert_eq!(renderer.output(ContainerId(4)), Some("plain"));
        assert_eq!(renderer.rendered().count(), 1);
    }
}
