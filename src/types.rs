//! Request and response payloads for the Blogsite API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role granting moderation rights
pub const ADMIN_ROLE: &str = "ADMIN";

/// Logged-in identity as persisted by the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub roles: Vec<String>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role == ADMIN_ROLE)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegisteredUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A blog post as returned by the listing and detail endpoints
///
/// Fields the client does not model are kept in `extra` and round-trip untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: i64,
    pub blog_name: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub article: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Blog {
    pub fn category_name(&self) -> &str {
        self.category
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or("Uncategorized")
    }

    /// First `max_chars` characters of the article, with an ellipsis if cut
    pub fn excerpt(&self, max_chars: usize) -> String {
        truncate(&self.article, max_chars)
    }

    /// Authors may edit their own posts (name match ignores case)
    pub fn can_edit(&self, username: &str) -> bool {
        self.author_name
            .as_deref()
            .is_some_and(|author| author.to_lowercase() == username.to_lowercase())
    }

    pub fn can_delete(&self, session: &Session) -> bool {
        session.is_admin() || self.can_edit(&session.username)
    }
}

/// Condensed blog entry returned by the date-range search
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogSummary {
    pub id: i64,
    pub blog_name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub article_snippet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogSummaryResponse {
    pub category: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub blogs: Vec<BlogSummary>,
}

/// Result of a blog search: full posts, or a summary when a date range was given
#[derive(Debug, Clone, PartialEq)]
pub enum BlogSearch {
    Blogs(Vec<Blog>),
    Summary(BlogSummaryResponse),
}

impl BlogSearch {
    pub fn len(&self) -> usize {
        match self {
            Self::Blogs(blogs) => blogs.len(),
            Self::Summary(summary) => summary.blogs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewBlog {
    pub category: String,
    pub article: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogUpdate {
    pub blog_name: String,
    pub category: String,
    pub article: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CreatedBlog {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewCategory {
    pub name: String,
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim())
}
