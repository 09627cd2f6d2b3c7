//! Content Store: home page aggregate, portfolio header and portfolio
//! category images.

use async_trait::async_trait;
use sqlx::{types::Json, PgPool, Postgres, Transaction};

use crate::db::models::{
    AboutParagraphRow, HomeContent, HomeContentRow, HomeContentUpdate, PortfolioCategory,
    PortfolioHeader, PortfolioHeaderUpdate, ServiceItem, ServiceRow, HOME_CONTENT_ID,
    PORTFOLIO_HEADER_ID,
};
use crate::error::StoreError;

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fails with `NotProvisioned` when the singleton row is missing.
    async fn get_home_content(&self) -> Result<HomeContent, StoreError>;

    /// Applies a partial update atomically and returns the re-read aggregate.
    async fn update_home_content(
        &self,
        update: HomeContentUpdate,
    ) -> Result<HomeContent, StoreError>;

    async fn get_portfolio_header(&self) -> Result<PortfolioHeader, StoreError>;

    async fn update_portfolio_header(
        &self,
        header: PortfolioHeaderUpdate,
    ) -> Result<PortfolioHeader, StoreError>;

    /// All categories with a stored image, ordered by name.
    async fn get_portfolio_categories(&self) -> Result<Vec<PortfolioCategory>, StoreError>;

    /// Insert or overwrite the image for `name`.
    async fn update_portfolio_category(
        &self,
        name: &str,
        image: Option<String>,
    ) -> Result<PortfolioCategory, StoreError>;

    /// `None` for unknown categories.
    async fn get_portfolio_category_image(&self, name: &str) -> Result<Option<String>, StoreError>;
}

pub struct PgContentStore {
    pool: PgPool,
}

impl PgContentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn replace_services(
    tx: &mut Transaction<'_, Postgres>,
    items: &[ServiceItem],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM services WHERE home_content_id = $1")
        .bind(HOME_CONTENT_ID)
        .execute(&mut **tx)
        .await?;

    for (index, item) in items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO services (id, home_content_id, title, description, display_order)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&item.id)
        .bind(HOME_CONTENT_ID)
        .bind(&item.title)
        .bind(&item.description)
        .bind(index as i32 + 1)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

async fn replace_paragraphs(
    tx: &mut Transaction<'_, Postgres>,
    paragraphs: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM about_paragraphs WHERE home_content_id = $1")
        .bind(HOME_CONTENT_ID)
        .execute(&mut **tx)
        .await?;

    for (index, paragraph) in paragraphs.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO about_paragraphs (home_content_id, content, display_order)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(HOME_CONTENT_ID)
        .bind(paragraph)
        .bind(index as i32 + 1)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

#[async_trait]
impl ContentStore for PgContentStore {
    async fn get_home_content(&self) -> Result<HomeContent, StoreError> {
        let home = sqlx::query_as::<_, HomeContentRow>(
            r#"
            SELECT id, hero, services_title, about_title, contact, footer
            FROM home_content
            WHERE id = $1
            "#,
        )
        .bind(HOME_CONTENT_ID)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotProvisioned("home content"))?;

        let services = sqlx::query_as::<_, ServiceRow>(
            r#"
            SELECT id, title, description
            FROM services
            WHERE home_content_id = $1
            ORDER BY display_order ASC
            "#,
        )
        .bind(HOME_CONTENT_ID)
        .fetch_all(&self.pool)
        .await?;

        let paragraphs = sqlx::query_as::<_, AboutParagraphRow>(
            r#"
            SELECT content
            FROM about_paragraphs
            WHERE home_content_id = $1
            ORDER BY display_order ASC
            "#,
        )
        .bind(HOME_CONTENT_ID)
        .fetch_all(&self.pool)
        .await?;

        Ok(home.assemble(services, paragraphs))
    }

    async fn update_home_content(
        &self,
        update: HomeContentUpdate,
    ) -> Result<HomeContent, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock: concurrent editors queue up behind each other.
        let exists = sqlx::query("SELECT 1 FROM home_content WHERE id = $1 FOR UPDATE")
            .bind(HOME_CONTENT_ID)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::NotProvisioned("home content"));
        }

        sqlx::query(
            r#"
            UPDATE home_content SET
                hero = COALESCE($2, hero),
                services_title = COALESCE($3, services_title),
                about_title = COALESCE($4, about_title),
                contact = COALESCE($5, contact),
                footer = COALESCE($6, footer),
                updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(HOME_CONTENT_ID)
        .bind(update.hero.as_ref().map(Json))
        .bind(update.services.as_ref().and_then(|s| s.title.as_deref()))
        .bind(update.about.as_ref().and_then(|a| a.title.as_deref()))
        .bind(update.contact.as_ref().map(Json))
        .bind(update.footer.as_ref().map(Json))
        .execute(&mut *tx)
        .await?;

        if let Some(items) = update.service_items() {
            replace_services(&mut tx, items).await?;
        }
        if let Some(paragraphs) = update.about_paragraphs() {
            replace_paragraphs(&mut tx, paragraphs).await?;
        }

        tx.commit().await?;
        tracing::info!("Home content updated");

        self.get_home_content().await
    }

    async fn get_portfolio_header(&self) -> Result<PortfolioHeader, StoreError> {
        sqlx::query_as::<_, PortfolioHeader>(
            "SELECT id, title, description FROM portfolio_header WHERE id = $1",
        )
        .bind(PORTFOLIO_HEADER_ID)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotProvisioned("portfolio header"))
    }

    async fn update_portfolio_header(
        &self,
        header: PortfolioHeaderUpdate,
    ) -> Result<PortfolioHeader, StoreError> {
        sqlx::query_as::<_, PortfolioHeader>(
            r#"
            UPDATE portfolio_header SET title = $2, description = $3
            WHERE id = $1
            RETURNING id, title, description
            "#,
        )
        .bind(PORTFOLIO_HEADER_ID)
        .bind(&header.title)
        .bind(&header.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotProvisioned("portfolio header"))
    }

    async fn get_portfolio_categories(&self) -> Result<Vec<PortfolioCategory>, StoreError> {
        let categories = sqlx::query_as::<_, PortfolioCategory>(
            "SELECT name, image FROM portfolio_categories ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn update_portfolio_category(
        &self,
        name: &str,
        image: Option<String>,
    ) -> Result<PortfolioCategory, StoreError> {
        let category = sqlx::query_as::<_, PortfolioCategory>(
            r#"
            INSERT INTO portfolio_categories (name, image)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET image = EXCLUDED.image
            RETURNING name, image
            "#,
        )
        .bind(name)
        .bind(&image)
        .fetch_one(&self.pool)
        .await?;

        Ok(category)
    }

    async fn get_portfolio_category_image(&self, name: &str) -> Result<Option<String>, StoreError> {
        let image: Option<(Option<String>,)> =
            sqlx::query_as("SELECT image FROM portfolio_categories WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(image.and_then(|(image,)| image))
    }
}
