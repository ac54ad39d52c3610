use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY_COLOR: &str = "#0d9488";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogCategory {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: String,
    #[serde(default)]
    pub post_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub featured_image: Option<String>,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub author_id: Option<i64>,
    pub author_name: Option<String>,
    pub is_published: bool,
    pub is_featured: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub views: i64,
    #[serde(default)]
    pub tags: Vec<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPage {
    pub posts: Vec<BlogPost>,
    pub total: u64,
    pub page: u64,
    pub total_pages: u64,
}

/// A published post together with up to three posts from the same category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPostDetail {
    #[serde(flatten)]
    pub post: BlogPost,
    pub related: Vec<BlogPost>,
}
