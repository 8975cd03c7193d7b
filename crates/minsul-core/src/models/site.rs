use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Navigation entry; `children` nest arbitrarily deep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuTree {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub menu_type: MenuType,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub display_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub children: Vec<MenuTree>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuType {
    Page,
    Board,
    Url,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteMenus {
    pub menus: Vec<MenuTree>,
    #[serde(default)]
    pub cached_at: Option<DateTime<Utc>>,
}

impl SiteMenus {
    /// Built-in navigation used when the menu endpoint cannot be reached.
    pub fn fallback() -> Self {
        let entry = |id: &str, name: &str, url: &str, menu_type: MenuType, order: i32| MenuTree {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            menu_type,
            target_id: None,
            slug: None,
            url: Some(url.to_string()),
            display_order: order,
            is_active: true,
            children: Vec::new(),
        };

        Self {
            menus: vec![
                entry("1", "About", "/about", MenuType::Page, 1),
                entry("2", "Services", "/services", MenuType::Page, 2),
                entry("3", "Community", "/community", MenuType::Board, 3),
                entry("4", "Calendar", "/calendar", MenuType::Page, 4),
                entry("5", "Donation", "/donation", MenuType::Page, 5),
            ],
            cached_at: Some(Utc::now()),
        }
    }
}

/// Static content page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub meta_title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    pub status: String,
    pub is_published: bool,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub sort_order: i32,
}

fn default_true() -> bool {
    true
}
