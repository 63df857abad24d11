//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Price in paise
    pub price: i64,
    /// List price before discount, in paise
    pub original_price: Option<i64>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub images: Vec<String>,
    pub category: String,
    pub stock: i64,
    /// Derived from `stock > 0` by the query
    pub in_stock: bool,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub features: Vec<String>,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub tags: Vec<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Product {
    /// Whole-percent discount against `original_price`, if there is one
    pub fn discount_percent(&self) -> Option<i64> {
        match self.original_price {
            Some(original) if original > self.price && original > 0 => {
                Some((original - self.price) * 100 / original)
            }
            _ => None,
        }
    }
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub original_price: Option<i64>,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
}

/// Update product payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub original_price: Option<i64>,
    pub images: Option<Vec<String>>,
    pub category: Option<String>,
    pub stock: Option<i64>,
    pub features: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
}

/// Stock adjustment payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockUpdate {
    pub stock: i64,
}

/// Distinct categories of active products
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryList {
    pub categories: Vec<String>,
}

/// Paginated product listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: i64, original_price: Option<i64>) -> Product {
        Product {
            id: 1,
            name: "Smartwatch".into(),
            description: String::new(),
            price,
            original_price,
            images: vec![],
            category: "electronics".into(),
            stock: 4,
            in_stock: true,
            features: vec![],
            tags: vec![],
            is_featured: false,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_discount_percent() {
        assert_eq!(product(7_500, Some(10_000)).discount_percent(), Some(25));
        assert_eq!(product(9_999, Some(10_000)).discount_percent(), Some(0));
        assert_eq!(product(10_000, Some(10_000)).discount_percent(), None);
        assert_eq!(product(10_000, None).discount_percent(), None);
    }
}
