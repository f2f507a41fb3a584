// Law document provider
// Reads the statute JSON file and turns each article body into a Container.

use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use chrono::NaiveDate;
use log::{debug, info};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{HighlightError, LoadError, Result};
use crate::highlight::{apply_highlight, remove_highlight};
use crate::span::Span;
use crate::text_run::{Container, ContainerId};

/// "第 12 條", "第10-1條"; whitespace between the parts is allowed
static ARTICLE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"第\s*(\d+(?:\s*-\s*\d+)?)\s*條").expect("valid regex"));

/// `{ "Laws": [...] }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LawFile {
    #[serde(rename = "Laws", default)]
    pub laws: Vec<Law>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Law {
    #[serde(rename = "LawName", default)]
    pub name: String,
    #[serde(rename = "LawModifiedDate", default)]
    pub modified_date: String,
    #[serde(rename = "LawArticles", default)]
    pub articles: Vec<LawArticle>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LawArticle {
    #[serde(rename = "ArticleNo", default)]
    pub number: String,
    #[serde(rename = "ArticleContent", default)]
    pub content: String,
}

impl LawFile {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let contents = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file = Self::from_json(&contents)?;
        info!("loaded {} law(s) from {}", file.laws.len(), path.display());
        Ok(file)
    }

    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The law at `index`; a document without laws is an error.
    pub fn law(&self, index: usize) -> Result<&Law, LoadError> {
        if self.laws.is_empty() {
            return Err(LoadError::NoLaws);
        }
        self.laws.get(index).ok_or(LoadError::LawIndex {
            index,
            count: self.laws.len(),
        })
    }
}

/// Digits of an article number such as `第 10-1 條` ("10-1").
pub fn article_number(label: &str) -> Option<String> {
    let caps = ARTICLE_NUMBER.captures(label)?;
    Some(caps[1].chars().filter(|c| !c.is_whitespace()).collect())
}

/// One displayed article: its label and its annotatable body.
#[derive(Debug, Clone)]
pub struct Article {
    pub label: String,
    pub container: Container,
}

impl Article {
    pub fn number(&self) -> Option<String> {
        article_number(&self.label)
    }
}

/// A law ready for annotation, one container per article.
#[derive(Debug, Clone)]
pub struct LawDocument {
    pub name: String,
    pub modified_raw: String,
    pub modified: Option<NaiveDate>,
    articles: Vec<Article>,
}

impl LawDocument {
    pub fn from_law(law: &Law) -> Self {
        let articles = law
            .articles
            .iter()
            .enumerate()
            .map(|(i, article)| Article {
                label: article.number.clone(),
                container: Container::new(ContainerId(i as u32), article.content.as_str()),
            })
            .collect::<Vec<_>>();
        let modified = NaiveDate::parse_from_str(law.modified_date.trim(), "%Y%m%d").ok();
        debug!("{}: {} article(s)", law.name, articles.len());

        LawDocument {
            name: law.name.clone(),
            modified_raw: law.modified_date.clone(),
            modified,
            articles,
        }
    }

    /// Build a document from plain article bodies (labels `第 n 條`).
    pub fn from_texts<'a>(name: &str, bodies: impl IntoIterator<Item = &'a str>) -> Self {
        let law = Law {
            name: name.to_string(),
            modified_date: String::new(),
            articles: bodies
                .into_iter()
                .enumerate()
                .map(|(i, body)| LawArticle {
                    number: format!("第 {} 條", i + 1),
                    content: body.to_string(),
                })
                .collect(),
        };
        Self::from_law(&law)
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn article_count(&self) -> usize {
        self.articles.len()
    }

    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.articles
            .get(id.0 as usize)
            .map(|article| &article.container)
    }

    pub fn container_mut(&mut self, id: ContainerId) -> Result<&mut Container> {
        self.articles
            .get_mut(id.0 as usize)
            .map(|article| &mut article.container)
            .ok_or(HighlightError::UnknownContainer(id))
    }

    /// Find an article by its label or by its number ("3", "10-1").
    pub fn find_article(&self, query: &str) -> Option<(ContainerId, &Article)> {
        let query = query.trim();
        let wanted = article_number(query)
            .unwrap_or_else(|| query.chars().filter(|c| !c.is_whitespace()).collect());
        self.articles
            .iter()
            .enumerate()
            .find(|(_, article)| {
                article.label.trim() == query
                    || article.number().as_deref() == Some(wanted.as_str())
            })
            .map(|(i, article)| (ContainerId(i as u32), article))
    }

    /// Container a span lives in, rejecting spans across two articles.
    fn target(&self, span: &Span) -> Result<ContainerId> {
        if !span.is_single_container() {
            return Err(HighlightError::CrossContainerSelection {
                start: span.start.container(),
                end: span.end.container(),
            });
        }
        Ok(span.start.container())
    }

    pub fn apply_highlight(&mut self, span: &Span) -> Result<ContainerId> {
        let id = self.target(span)?;
        apply_highlight(self.container_mut(id)?, span)?;
        Ok(id)
    }

    pub fn remove_highlight(&mut self, span: &Span) -> Result<ContainerId> {
        let id = self.target(span)?;
        remove_highlight(self.container_mut(id)?, span)?;
        Ok(id)
    }
}
