//! Portfolio Repository: project CRUD and the display ordering rule
//! (most recent work first).

use std::cmp::Ordering;

use async_trait::async_trait;
use regex::Regex;
use sqlx::PgPool;

use crate::db::models::{NewProject, PortfolioProject, PortfolioRow, ProjectUpdate};
use crate::error::StoreError;

#[async_trait]
pub trait PortfolioRepository: Send + Sync {
    /// All projects, in display order.
    async fn list(&self) -> Result<Vec<PortfolioProject>, StoreError>;

    async fn get(&self, id: i64) -> Result<PortfolioProject, StoreError>;

    async fn create(&self, project: NewProject) -> Result<PortfolioProject, StoreError>;

    async fn update(&self, id: i64, changes: ProjectUpdate)
        -> Result<PortfolioProject, StoreError>;

    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

pub(crate) fn project_not_found(id: i64) -> StoreError {
    StoreError::NotFound(format!("Project {}", id))
}

// ============================================================================
// Display ordering
// ============================================================================

lazy_static::lazy_static! {
    static ref YEAR_RANGE_REGEX: Regex = Regex::new(r"([0-9]{4})\s*-\s*([0-9]{4})").unwrap();
    static ref YEAR_REGEX: Regex = Regex::new(r"([0-9]{4})").unwrap();
}

/// Sort key for a free-form year field: the end year of a range such as
/// "2020-2021", otherwise the first four-digit year, otherwise `None`.
pub fn extract_year(year: &str) -> Option<i32> {
    let trimmed = year.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(range) = YEAR_RANGE_REGEX.captures(trimmed) {
        return range[2].parse().ok();
    }

    YEAR_REGEX
        .captures(trimmed)
        .and_then(|single| single[1].parse().ok())
}

/// Dated projects first, newest year first; undated ones after, newest id first.
pub fn display_order(a: &PortfolioProject, b: &PortfolioProject) -> Ordering {
    match (extract_year(&a.details.year), extract_year(&b.details.year)) {
        (Some(a_year), Some(b_year)) => b_year.cmp(&a_year),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.id.cmp(&a.id),
    }
}

pub fn sort_for_display(projects: &mut [PortfolioProject]) {
    projects.sort_by(display_order);
}

// ============================================================================
// Postgres
// ============================================================================

pub struct PgPortfolioRepository {
    pool: PgPool,
}

impl PgPortfolioRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const PROJECT_COLUMNS: &str = "id, title, category, image, description, location, year, scope";

#[async_trait]
impl PortfolioRepository for PgPortfolioRepository {
    async fn list(&self) -> Result<Vec<PortfolioProject>, StoreError> {
        let rows = sqlx::query_as::<_, PortfolioRow>(&format!(
            "SELECT {} FROM portfolio ORDER BY id ASC",
            PROJECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut projects: Vec<PortfolioProject> = rows.into_iter().map(Into::into).collect();
        sort_for_display(&mut projects);
        Ok(projects)
    }

    async fn get(&self, id: i64) -> Result<PortfolioProject, StoreError> {
        sqlx::query_as::<_, PortfolioRow>(&format!(
            "SELECT {} FROM portfolio WHERE id = $1",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Into::into)
        .ok_or_else(|| project_not_found(id))
    }

    async fn create(&self, project: NewProject) -> Result<PortfolioProject, StoreError> {
        let row = sqlx::query_as::<_, PortfolioRow>(&format!(
            r#"
            INSERT INTO portfolio (title, category, image, description, location, year, scope)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(&project.title)
        .bind(&project.category)
        .bind(&project.image)
        .bind(&project.description)
        .bind(&project.details.location)
        .bind(&project.details.year)
        .bind(&project.details.scope)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(project_id = row.id, "Portfolio project created");
        Ok(row.into())
    }

    async fn update(
        &self,
        id: i64,
        changes: ProjectUpdate,
    ) -> Result<PortfolioProject, StoreError> {
        let details = changes.details.as_ref();

        let row = sqlx::query_as::<_, PortfolioRow>(&format!(
            r#"
            UPDATE portfolio SET
                title = COALESCE($2, title),
                category = COALESCE($3, category),
                image = COALESCE($4, image),
                description = COALESCE($5, description),
                location = COALESCE($6, location),
                year = COALESCE($7, year),
                scope = COALESCE($8, scope)
            WHERE id = $1
            RETURNING {}
            "#,
            PROJECT_COLUMNS
        ))
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.category)
        .bind(&changes.image)
        .bind(&changes.description)
        .bind(details.map(|d| d.location.as_str()))
        .bind(details.map(|d| d.year.as_str()))
        .bind(details.map(|d| d.scope.as_str()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| project_not_found(id))?;

        tracing::info!(project_id = id, "Portfolio project updated");
        Ok(row.into())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM portfolio WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(project_not_found(id));
        }

        tracing::info!(project_id = id, "Portfolio project deleted");
        Ok(())
    }
}
