//! Admin console shapes: dashboard figures, account and content moderation,
//! board/page management, notifications and calendar events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{Board, MenuTree, MenuType, Page, Pagination};

/// Page size the console uses for moderation lists.
pub const ADMIN_PAGE_SIZE: u32 = 20;

/// Headline figures for the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub total_users: i64,
    pub total_posts: i64,
    pub total_comments: i64,
    pub total_boards: i64,
    pub active_volunteers: i64,
    pub total_donations: i64,
    pub monthly_visitors: i64,
    pub monthly_posts: i64,
}

/// Account standing as managed from the console
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Suspended,
    Pending,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Suspended => "suspended",
            UserStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(UserStatus::Active),
            "suspended" => Ok(UserStatus::Suspended),
            "pending" => Ok(UserStatus::Pending),
            other => Err(format!("unknown user status: {}", other)),
        }
    }
}

/// Account row in the user management list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    pub role: String,
    #[serde(default)]
    pub status: UserStatus,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(default)]
    pub post_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub point_balance: i64,
}

/// Partial account update; unset fields are left alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
}

/// Visibility of a post or comment under moderation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Published,
    Draft,
    Hidden,
}

/// Post row in the moderation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeratedPost {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub board_id: Option<Uuid>,
    #[serde(default)]
    pub board_name: Option<String>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub views: i64,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub is_notice: bool,
    pub status: ContentStatus,
}

/// Comment row in the moderation list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeratedComment {
    pub id: Uuid,
    pub content: String,
    pub post_id: Uuid,
    #[serde(default)]
    pub post_title: Option<String>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub likes: i64,
    pub status: ContentStatus,
}

/// Filters shared by the console's list endpoints.
///
/// `board_id` and `post_id` go out as `board` and `post`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdminQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub role: Option<String>,
    pub board_id: Option<Uuid>,
    pub post_id: Option<Uuid>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl AdminQuery {
    pub fn for_page(page: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(ADMIN_PAGE_SIZE),
            ..Self::default()
        }
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        let text = [
            ("search", &self.search),
            ("status", &self.status),
            ("role", &self.role),
        ];
        for (key, value) in text {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                query.push((key, value.to_string()));
            }
        }
        if let Some(board_id) = self.board_id {
            query.push(("board", board_id.to_string()));
        }
        if let Some(post_id) = self.post_id {
            query.push(("post", post_id.to_string()));
        }
        if let Some(page) = self.page.filter(|p| *p > 0) {
            query.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            query.push(("limit", limit.to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserList {
    pub users: Vec<ManagedUser>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModeratedPostList {
    pub posts: Vec<ModeratedPost>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModeratedCommentList {
    pub comments: Vec<ModeratedComment>,
    pub pagination: Pagination,
}

/// Page listing; the backend reports paging inline rather than as a block.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PageList {
    pub pages: Vec<Page>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl PageList {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

/// Board create/update body; unset fields are omitted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_comments: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_file_upload: Option<bool>,
}

impl From<&Board> for BoardRequest {
    fn from(board: &Board) -> Self {
        Self {
            name: Some(board.name.clone()),
            slug: board.slug.clone(),
            description: board.description.clone(),
            category: board.category.clone(),
            display_order: board.display_order,
            is_public: board.is_public,
            allow_comments: board.allow_comments,
            allow_file_upload: board.allow_file_upload,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePageRequest {
    pub slug: String,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    pub status: String,
    pub is_published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdatePageRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_published: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageStatusRequest {
    pub status: String,
    pub is_published: bool,
}

impl PageStatusRequest {
    pub fn published() -> Self {
        Self {
            status: "published".to_string(),
            is_published: true,
        }
    }

    pub fn draft() -> Self {
        Self {
            status: "draft".to_string(),
            is_published: false,
        }
    }
}

/// Flat menu row as the save endpoint takes it; nesting is carried by `parent_id`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuEntry {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub menu_type: MenuType,
    pub target_id: Option<String>,
    pub url: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub parent_id: Option<String>,
}

impl MenuEntry {
    /// Depth-first flattening; parents precede their children.
    pub fn flatten(menus: &[MenuTree]) -> Vec<MenuEntry> {
        fn walk(menus: &[MenuTree], parent: Option<&str>, out: &mut Vec<MenuEntry>) {
            for menu in menus {
                out.push(MenuEntry {
                    id: menu.id.clone(),
                    name: menu.name.clone(),
                    description: menu.description.clone(),
                    menu_type: menu.menu_type,
                    target_id: menu.target_id.clone(),
                    url: menu.url.clone(),
                    display_order: menu.display_order,
                    is_active: menu.is_active,
                    parent_id: parent.map(str::to_string),
                });
                walk(&menu.children, Some(&menu.id), out);
            }
        }

        let mut out = Vec::new();
        walk(menus, None, &mut out);
        out
    }
}

/// Severity shown with a broadcast notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Recipients of a broadcast notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationTarget {
    #[default]
    All,
    Admins,
    Specific,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateNotificationRequest {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub target: NotificationTarget,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub target_users: NotificationTarget,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub read_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    #[serde(default)]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: Option<bool>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarEventRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
}
