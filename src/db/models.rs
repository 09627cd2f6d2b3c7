//! Site content models: API shapes (serde, camelCase) and the database rows
//! they are assembled from (sqlx).

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};

/// Key of the home content singleton.
pub const HOME_CONTENT_ID: &str = "home";

/// Key of the portfolio header singleton.
pub const PORTFOLIO_HEADER_ID: &str = "portfolio-header";

// ============================================================================
// Home content
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hero {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub button_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceItem {
    pub id: String,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServicesSection {
    pub title: String,
    pub items: Vec<ServiceItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AboutSection {
    pub title: String,
    pub paragraphs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub title: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footer {
    pub copyright: String,
    pub tagline: String,
}

/// Everything the home page renders, assembled from the singleton row and
/// its two ordered child collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeContent {
    pub id: String,
    pub hero: Hero,
    pub services: ServicesSection,
    pub about: AboutSection,
    pub contact: Contact,
    pub footer: Footer,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServicesUpdate {
    pub title: Option<String>,
    /// Replaces the whole list when present.
    pub items: Option<Vec<ServiceItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AboutUpdate {
    pub title: Option<String>,
    /// Replaces the whole list when present.
    pub paragraphs: Option<Vec<String>>,
}

/// Partial home content update. Absent sections are left alone; present
/// sections overwrite what is stored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomeContentUpdate {
    pub hero: Option<Hero>,
    pub services: Option<ServicesUpdate>,
    pub about: Option<AboutUpdate>,
    pub contact: Option<Contact>,
    pub footer: Option<Footer>,
}

impl HomeContentUpdate {
    pub fn service_items(&self) -> Option<&[ServiceItem]> {
        self.services.as_ref().and_then(|s| s.items.as_deref())
    }

    pub fn about_paragraphs(&self) -> Option<&[String]> {
        self.about.as_ref().and_then(|a| a.paragraphs.as_deref())
    }

    /// Apply to an in-memory aggregate, with the same overwrite rules the
    /// database store uses.
    pub fn apply_to(self, content: &mut HomeContent) {
        if let Some(hero) = self.hero {
            content.hero = hero;
        }
        if let Some(services) = self.services {
            if let Some(title) = services.title {
                content.services.title = title;
            }
            if let Some(items) = services.items {
                content.services.items = items;
            }
        }
        if let Some(about) = self.about {
            if let Some(title) = about.title {
                content.about.title = title;
            }
            if let Some(paragraphs) = about.paragraphs {
                content.about.paragraphs = paragraphs;
            }
        }
        if let Some(contact) = self.contact {
            content.contact = contact;
        }
        if let Some(footer) = self.footer {
            content.footer = footer;
        }
    }
}

/// `home_content` row
#[derive(Debug, Clone, FromRow)]
pub struct HomeContentRow {
    pub id: String,
    pub hero: Json<Hero>,
    pub services_title: String,
    pub about_title: String,
    pub contact: Json<Contact>,
    pub footer: Json<Footer>,
}

/// `services` row
#[derive(Debug, Clone, FromRow)]
pub struct ServiceRow {
    pub id: String,
    pub title: String,
    pub description: String,
}

/// `about_paragraphs` row
#[derive(Debug, Clone, FromRow)]
pub struct AboutParagraphRow {
    pub content: String,
}

impl HomeContentRow {
    pub fn assemble(self, services: Vec<ServiceRow>, paragraphs: Vec<AboutParagraphRow>) -> HomeContent {
        HomeContent {
            id: self.id,
            hero: self.hero.0,
            services: ServicesSection {
                title: self.services_title,
                items: services
                    .into_iter()
                    .map(|s| ServiceItem {
                        id: s.id,
                        title: s.title,
                        description: s.description,
                    })
                    .collect(),
            },
            about: AboutSection {
                title: self.about_title,
                paragraphs: paragraphs.into_iter().map(|p| p.content).collect(),
            },
            contact: self.contact.0,
            footer: self.footer.0,
        }
    }
}

// ============================================================================
// Portfolio
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetails {
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub scope: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioProject {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub image: String,
    pub description: String,
    pub details: ProjectDetails,
}

/// Project as submitted for creation; the id is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProject {
    pub title: String,
    pub category: String,
    pub image: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: ProjectDetails,
}

/// Partial project update. `details` replaces all three detail fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub details: Option<ProjectDetails>,
}

impl ProjectUpdate {
    pub fn apply_to(self, project: &mut PortfolioProject) {
        if let Some(title) = self.title {
            project.title = title;
        }
        if let Some(category) = self.category {
            project.category = category;
        }
        if let Some(image) = self.image {
            project.image = image;
        }
        if let Some(description) = self.description {
            project.description = description;
        }
        if let Some(details) = self.details {
            project.details = details;
        }
    }
}

/// `portfolio` row
#[derive(Debug, Clone, FromRow)]
pub struct PortfolioRow {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub image: String,
    pub description: String,
    pub location: Option<String>,
    pub year: Option<String>,
    pub scope: Option<String>,
}

impl From<PortfolioRow> for PortfolioProject {
    fn from(row: PortfolioRow) -> Self {
        PortfolioProject {
            id: row.id,
            title: row.title,
            category: row.category,
            image: row.image,
            description: row.description,
            details: ProjectDetails {
                location: row.location.unwrap_or_default(),
                year: row.year.unwrap_or_default(),
                scope: row.scope.unwrap_or_default(),
            },
        }
    }
}

/// Display image for a portfolio category (`portfolio_categories` row).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PortfolioCategory {
    pub name: String,
    pub image: Option<String>,
}

/// Portfolio page banner (`portfolio_header` row).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PortfolioHeader {
    pub id: String,
    pub title: String,
    pub description: String,
}

/// Header update; every field is required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioHeaderUpdate {
    pub title: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_update_accepts_full_payload_with_id() {
        let update: HomeContentUpdate = serde_json::from_value(serde_json::json!({
            "id": "home",
            "hero": {
                "title": "T",
                "subtitle": "S",
                "description": "D",
                "buttonText": "Go"
            },
            "services": { "title": "Services" }
        }))
        .unwrap();

        assert_eq!(update.hero.as_ref().unwrap().button_text, "Go");
        assert!(update.service_items().is_none());
        assert!(update.about.is_none());
    }

    #[test]
    fn test_null_detail_columns_become_empty_strings() {
        let project = PortfolioProject::from(PortfolioRow {
            id: 3,
            title: "Office block".to_string(),
            category: "Commercial".to_string(),
            image: "https://img/1.png".to_string(),
            description: String::new(),
            location: None,
            year: Some("2021".to_string()),
            scope: None,
        });

        assert_eq!(project.details.location, "");
        assert_eq!(project.details.year, "2021");
        assert_eq!(project.details.scope, "");
    }

    #[test]
    fn test_project_update_only_touches_given_fields() {
        let mut project = PortfolioProject {
            id: 1,
            title: "Old".to_string(),
            category: "Residential".to_string(),
            image: "a.png".to_string(),
            description: "desc".to_string(),
            details: ProjectDetails::default(),
        };

        ProjectUpdate {
            title: Some("New".to_string()),
            ..Default::default()
        }
        .apply_to(&mut project);

        assert_eq!(project.title, "New");
        assert_eq!(project.category, "Residential");
        assert_eq!(project.image, "a.png");
    }
}
