//! Product catalog service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::models::Product;
use shared::validation::{validate_non_negative_amount, validate_sku};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Product service for catalog management
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Database row for a product
#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    sku: String,
    name: String,
    description: Option<String>,
    unit_of_measure: String,
    min_stock_threshold: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            sku: row.sku,
            name: row.name,
            description: row.description,
            unit_of_measure: row.unit_of_measure,
            min_stock_threshold: row.min_stock_threshold,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub unit_of_measure: String,
    pub min_stock_threshold: Option<Decimal>,
}

/// Input for updating a product's descriptive fields
///
/// SKU and unit of measure are identity and stay fixed after creation.
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub min_stock_threshold: Option<Decimal>,
}

const PRODUCT_COLUMNS: &str =
    "id, sku, name, description, unit_of_measure, min_stock_threshold, created_at, updated_at";

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product
    pub async fn create_product(&self, input: CreateProductInput) -> AppResult<Product> {
        validate_sku(&input.sku).map_err(|message| AppError::Validation {
            field: "sku".to_string(),
            message: message.to_string(),
        })?;

        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Product name cannot be empty".to_string(),
            });
        }

        let min_stock_threshold = input.min_stock_threshold.unwrap_or(Decimal::ZERO);
        validate_non_negative_amount(min_stock_threshold).map_err(|message| {
            AppError::Validation {
                field: "min_stock_threshold".to_string(),
                message: message.to_string(),
            }
        })?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE sku = $1)",
        )
        .bind(&input.sku)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry("sku".to_string()));
        }

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            INSERT INTO products (sku, name, description, unit_of_measure, min_stock_threshold)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {PRODUCT_COLUMNS}
            "#,
        ))
        .bind(&input.sku)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.unit_of_measure)
        .bind(min_stock_threshold)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get a product by ID
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<Product> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1",
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(row.into())
    }

    /// List all products
    pub async fn list_products(&self) -> AppResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY sku",
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Update a product's descriptive fields
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<Product> {
        let existing = self.get_product(product_id).await?;

        let name = input.name.unwrap_or(existing.name);
        let description = input.description.or(existing.description);
        let min_stock_threshold = input
            .min_stock_threshold
            .unwrap_or(existing.min_stock_threshold);

        if name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Product name cannot be empty".to_string(),
            });
        }
        validate_non_negative_amount(min_stock_threshold).map_err(|message| {
            AppError::Validation {
                field: "min_stock_threshold".to_string(),
                message: message.to_string(),
            }
        })?;

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            UPDATE products
            SET name = $1, description = $2, min_stock_threshold = $3, updated_at = NOW()
            WHERE id = $4
            RETURNING {PRODUCT_COLUMNS}
            "#,
        ))
        .bind(&name)
        .bind(&description)
        .bind(min_stock_threshold)
        .bind(product_id)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }
}
