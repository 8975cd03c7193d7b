use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::Pagination;

/// Community board with its access levels and display options.
///
/// Absent flags keep the backend defaults; see [`crate::permissions`] for how
/// each one is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub allow_anonymous: Option<bool>,
    #[serde(default)]
    pub allow_comments: Option<bool>,
    #[serde(default)]
    pub allow_file_upload: Option<bool>,
    #[serde(default)]
    pub allow_rich_text: Option<bool>,
    #[serde(default)]
    pub allow_search: Option<bool>,
    #[serde(default)]
    pub allow_recommend: Option<bool>,
    #[serde(default)]
    pub allow_disrecommend: Option<bool>,
    #[serde(default)]
    pub show_author_name: Option<bool>,
    #[serde(default)]
    pub show_ip: Option<bool>,
    #[serde(default)]
    pub require_category: Option<bool>,
    #[serde(default)]
    pub list_permission: Option<String>,
    #[serde(default)]
    pub read_permission: Option<String>,
    #[serde(default)]
    pub write_permission: Option<String>,
    #[serde(default)]
    pub reply_permission: Option<String>,
    #[serde(default)]
    pub comment_permission: Option<String>,
    #[serde(default)]
    pub download_permission: Option<String>,
    #[serde(default)]
    pub edit_comment_limit: Option<i64>,
    #[serde(default)]
    pub delete_comment_limit: Option<i64>,
    #[serde(default)]
    pub read_point: Option<i64>,
    #[serde(default)]
    pub write_point: Option<i64>,
    #[serde(default)]
    pub comment_point: Option<i64>,
    #[serde(default)]
    pub download_point: Option<i64>,
    #[serde(default, deserialize_with = "list_or_csv")]
    pub allowed_file_types: Vec<String>,
    #[serde(default, deserialize_with = "list_or_csv")]
    pub allowed_iframe_domains: Vec<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The backend stores some list options as comma-separated strings.
fn list_or_csv<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrCsv {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match Option::<ListOrCsv>::deserialize(deserializer)? {
        Some(ListOrCsv::List(items)) => items,
        Some(ListOrCsv::Csv(csv)) => csv
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub board_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: Option<i32>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Post joined with author, board and category names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    pub id: Uuid,
    pub board_id: Uuid,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub views: Option<i32>,
    #[serde(default)]
    pub likes: Option<i32>,
    #[serde(default)]
    pub is_notice: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub board_name: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub comment_count: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentDetail {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    pub content: String,
    #[serde(default)]
    pub likes: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Filters for post listings. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub search: Option<String>,
    pub board_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub tags: Option<String>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PostQuery {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            query.push(("search", search.to_string()));
        }
        if let Some(board_id) = self.board_id {
            query.push(("board_id", board_id.to_string()));
        }
        if let Some(category_id) = self.category_id {
            query.push(("category_id", category_id.to_string()));
        }
        if let Some(tags) = self.tags.as_deref().filter(|s| !s.is_empty()) {
            query.push(("tags", tags.to_string()));
        }
        if let Some(sort) = self.sort.as_deref().filter(|s| !s.is_empty()) {
            query.push(("sort", sort.to_string()));
        }
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

/// One page of posts
#[derive(Debug, Clone, PartialEq)]
pub struct PostPage {
    pub posts: Vec<PostDetail>,
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_notice: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attached_files: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdatePostRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_notice: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attached_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCommentRequest {
    pub post_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeStatus {
    pub liked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeToggle {
    pub liked: bool,
    #[serde(default)]
    pub action: Option<String>,
}
