//! Warehouse service

use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::models::Warehouse;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Warehouse service for stock locations
#[derive(Clone)]
pub struct WarehouseService {
    db: PgPool,
}

/// Database row for a warehouse
#[derive(Debug, FromRow)]
struct WarehouseRow {
    id: Uuid,
    code: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<WarehouseRow> for Warehouse {
    fn from(row: WarehouseRow) -> Self {
        Warehouse {
            id: row.id,
            code: row.code,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

/// Input for creating a warehouse
#[derive(Debug, Deserialize)]
pub struct CreateWarehouseInput {
    pub code: String,
    pub name: String,
}

const WAREHOUSE_COLUMNS: &str = "id, code, name, created_at";

impl WarehouseService {
    /// Create a new WarehouseService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a warehouse
    pub async fn create_warehouse(&self, input: CreateWarehouseInput) -> AppResult<Warehouse> {
        if input.code.trim().is_empty() || input.code.len() > 16 {
            return Err(AppError::Validation {
                field: "code".to_string(),
                message: "Warehouse code must be 1-16 characters".to_string(),
            });
        }
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Warehouse name cannot be empty".to_string(),
            });
        }

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM warehouses WHERE code = $1)",
        )
        .bind(&input.code)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry("code".to_string()));
        }

        let row = sqlx::query_as::<_, WarehouseRow>(&format!(
            r#"
            INSERT INTO warehouses (code, name)
            VALUES ($1, $2)
            RETURNING {WAREHOUSE_COLUMNS}
            "#,
        ))
        .bind(&input.code)
        .bind(&input.name)
        .fetch_one(&self.db)
        .await?;

        Ok(row.into())
    }

    /// Get a warehouse by ID
    pub async fn get_warehouse(&self, warehouse_id: Uuid) -> AppResult<Warehouse> {
        let row = sqlx::query_as::<_, WarehouseRow>(&format!(
            "SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE id = $1",
        ))
        .bind(warehouse_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Warehouse".to_string()))?;

        Ok(row.into())
    }

    /// List all warehouses
    pub async fn list_warehouses(&self) -> AppResult<Vec<Warehouse>> {
        let rows = sqlx::query_as::<_, WarehouseRow>(&format!(
            "SELECT {WAREHOUSE_COLUMNS} FROM warehouses ORDER BY code",
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Warehouse::from).collect())
    }
}
