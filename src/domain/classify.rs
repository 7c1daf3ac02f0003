//! Presentation classification of category names
//!
//! The tag chosen here only drives styling of the rendered page; it never
//! influences tree structure.

use std::fmt;

use serde::Serialize;

/// Organization identifiers matched as substrings of a category name.
pub const DEFAULT_COMPANIES: &[&str] = &[
    "google",
    "microsoft",
    "apple",
    "facebook",
    "amazon",
    "netflix",
    "github",
    "gitlab",
    "twitter",
    "youtube",
    "instagram",
    "tiktok",
    "zoom",
    "discord",
    "spotify",
    "openai",
    "alibaba",
    "baidu",
    "tencent",
    "douban",
    "weibo",
    "bilibili",
];

/// Country codes matched against the whole category name.
pub const DEFAULT_COUNTRIES: &[&str] = &["cn", "us", "jp", "kr", "hk", "tw", "uk", "de", "fr", "ru"];

const CATEGORY_PREFIX: &str = "category-";
const GEO_PREFIX: &str = "geo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Category,
    Company,
    Geo,
    Service,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Category => "category",
            NodeKind::Company => "company",
            NodeKind::Geo => "geo",
            NodeKind::Service => "service",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assigns a [`NodeKind`] to category names using injected keyword lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    companies: Vec<String>,
    countries: Vec<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_COMPANIES.iter().map(|s| s.to_string()).collect(),
            DEFAULT_COUNTRIES.iter().map(|s| s.to_string()).collect(),
        )
    }
}

impl Classifier {
    pub fn new(companies: Vec<String>, countries: Vec<String>) -> Self {
        Self {
            companies,
            countries,
        }
    }

    /// First match wins: category prefix, company substring, geo prefix or
    /// country code, then service.
    pub fn classify(&self, name: &str) -> NodeKind {
        if name.starts_with(CATEGORY_PREFIX) {
            NodeKind::Category
        } else if self.companies.iter().any(|c| name.contains(c.as_str())) {
            NodeKind::Company
        } else if name.starts_with(GEO_PREFIX) || self.countries.iter().any(|c| c == name) {
            NodeKind::Geo
        } else {
            NodeKind::Service
        }
    }
}
