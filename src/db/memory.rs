//! In-memory implementation of both data traits.
//!
//! Used when no `DATABASE_URL` is configured and by the test suite. All
//! state sits behind one lock, so every operation is atomic. Contents are
//! lost on restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::db::content::ContentStore;
use crate::db::models::{
    HomeContent, HomeContentUpdate, NewProject, PortfolioCategory, PortfolioHeader,
    PortfolioHeaderUpdate, PortfolioProject, ProjectUpdate,
};
use crate::db::portfolio::{project_not_found, sort_for_display, PortfolioRepository};
use crate::error::StoreError;

#[derive(Debug, Default)]
struct MemoryState {
    home: Option<HomeContent>,
    header: Option<PortfolioHeader>,
    categories: BTreeMap<String, Option<String>>,
    projects: BTreeMap<i64, PortfolioProject>,
    next_project_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    /// Empty store; singletons are not provisioned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with both singletons provisioned.
    pub fn provisioned(home: HomeContent, header: PortfolioHeader) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                home: Some(home),
                header: Some(header),
                ..Default::default()
            }),
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_home_content(&self) -> Result<HomeContent, StoreError> {
        self.state
            .read()
            .await
            .home
            .clone()
            .ok_or(StoreError::NotProvisioned("home content"))
    }

    async fn update_home_content(
        &self,
        update: HomeContentUpdate,
    ) -> Result<HomeContent, StoreError> {
        {
            let mut state = self.state.write().await;
            let home = state
                .home
                .as_mut()
                .ok_or(StoreError::NotProvisioned("home content"))?;
            update.apply_to(home);
        }

        self.get_home_content().await
    }

    async fn get_portfolio_header(&self) -> Result<PortfolioHeader, StoreError> {
        self.state
            .read()
            .await
            .header
            .clone()
            .ok_or(StoreError::NotProvisioned("portfolio header"))
    }

    async fn update_portfolio_header(
        &self,
        update: PortfolioHeaderUpdate,
    ) -> Result<PortfolioHeader, StoreError> {
        let mut state = self.state.write().await;
        let header = state
            .header
            .as_mut()
            .ok_or(StoreError::NotProvisioned("portfolio header"))?;
        header.title = update.title;
        header.description = update.description;
        Ok(header.clone())
    }

    async fn get_portfolio_categories(&self) -> Result<Vec<PortfolioCategory>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .categories
            .iter()
            .map(|(name, image)| PortfolioCategory {
                name: name.clone(),
                image: image.clone(),
            })
            .collect())
    }

    async fn update_portfolio_category(
        &self,
        name: &str,
        image: Option<String>,
    ) -> Result<PortfolioCategory, StoreError> {
        self.state
            .write()
            .await
            .categories
            .insert(name.to_string(), image.clone());

        Ok(PortfolioCategory {
            name: name.to_string(),
            image,
        })
    }

    async fn get_portfolio_category_image(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .categories
            .get(name)
            .cloned()
            .flatten())
    }
}

#[async_trait]
impl PortfolioRepository for MemoryStore {
    async fn list(&self) -> Result<Vec<PortfolioProject>, StoreError> {
        let mut projects: Vec<PortfolioProject> =
            self.state.read().await.projects.values().cloned().collect();
        sort_for_display(&mut projects);
        Ok(projects)
    }

    async fn get(&self, id: i64) -> Result<PortfolioProject, StoreError> {
        self.state
            .read()
            .await
            .projects
            .get(&id)
            .cloned()
            .ok_or_else(|| project_not_found(id))
    }

    async fn create(&self, project: NewProject) -> Result<PortfolioProject, StoreError> {
        let mut state = self.state.write().await;
        state.next_project_id += 1;
        let created = PortfolioProject {
            id: state.next_project_id,
            title: project.title,
            category: project.category,
            image: project.image,
            description: project.description,
            details: project.details,
        };
        state.projects.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        id: i64,
        changes: ProjectUpdate,
    ) -> Result<PortfolioProject, StoreError> {
        let mut state = self.state.write().await;
        let project = state
            .projects
            .get_mut(&id)
            .ok_or_else(|| project_not_found(id))?;
        changes.apply_to(project);
        Ok(project.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.state
            .write()
            .await
            .projects
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| project_not_found(id))
    }
}
