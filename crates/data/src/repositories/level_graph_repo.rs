//! Level graph template repository.
//!
//! Templates are stored as JSONB and handed out as opaque JSON; the
//! distribution crate owns the typed representation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tier_rewards_core::GraphSource;

/// Read-only repository for level visualization graph templates.
#[derive(Debug, Clone)]
pub struct LevelGraphRepository {
    pool: PgPool,
}

impl LevelGraphRepository {
    /// Creates a new repository instance.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or replaces the template for a level. Admin tooling only.
    ///
    /// # Errors
    /// Returns an error if the database write fails.
    pub async fn upsert(
        &self,
        level: i16,
        nodes: &serde_json::Value,
        edges: &serde_json::Value,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO level_graphs (level, nodes, edges)
            VALUES ($1, $2, $3)
            ON CONFLICT (level) DO UPDATE
            SET nodes = EXCLUDED.nodes, edges = EXCLUDED.edges
            ",
        )
        .bind(level)
        .bind(nodes)
        .bind(edges)
        .execute(&self.pool)
        .await
        .context("Failed to upsert level graph")?;

        Ok(())
    }
}

#[async_trait]
impl GraphSource for LevelGraphRepository {
    async fn level_graph(&self, level: i16) -> Result<Option<serde_json::Value>> {
        let row: Option<(serde_json::Value, serde_json::Value)> = sqlx::query_as(
            r"
            SELECT nodes, edges
            FROM level_graphs
            WHERE level = $1
            ",
        )
        .bind(level)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch level graph")?;

        Ok(row.map(|(nodes, edges)| serde_json::json!({ "nodes": nodes, "edges": edges })))
    }
}
