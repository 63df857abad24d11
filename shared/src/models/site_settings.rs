//! Site Settings Model
//!
//! Storefront content managed from the admin dashboard. Stored as one
//! versioned JSON document; every write bumps `version`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Banner {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub image: String,
    pub color: String,
    pub cta: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stat {
    pub id: String,
    pub icon: String,
    pub value: String,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: String,
    /// Display string such as "70%"
    pub discount: String,
    /// RFC 3339 timestamp when the deal ends
    pub end_time: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: i64,
    pub name: String,
    pub avatar: String,
    /// 1..=5
    pub rating: u8,
    pub comment: String,
    pub product: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTile {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavbarItem {
    pub id: String,
    pub label: String,
    pub url: String,
    pub is_active: bool,
    pub order: i32,
}

/// The storefront content document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub banners: Vec<Banner>,
    pub stats: Vec<Stat>,
    pub deals: Vec<Deal>,
    pub testimonials: Vec<Testimonial>,
    pub categories: Vec<CategoryTile>,
    pub navbar_items: Vec<NavbarItem>,
}

/// Stored document with its version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SiteSettingsRecord {
    pub version: i64,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub settings: SiteSettings,
    pub updated_at: i64,
    pub updated_by: Option<i64>,
}

/// Admin write payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSettingsUpdate {
    /// Version the admin edited; the write fails if it is stale
    pub expected_version: i64,
    pub settings: SiteSettings,
}
