//! Read-only portfolio content.
//!
//! The store is loaded once (from a TOML document or the bundled portfolio)
//! and shared as `Arc<ContentStore>`. Nothing in the chat core writes to it.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUNDLED_PORTFOLIO: &str = include_str!("../content/portfolio.toml");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentStore {
    pub profile: Profile,
    pub skills: Vec<Skill>,
    pub projects: Vec<Project>,
    pub experiences: Vec<Experience>,
    pub education: Vec<Education>,
    pub achievements: Vec<Achievement>,
    pub certifications: Vec<Certification>,
    pub testimonials: Vec<Testimonial>,
    pub blog_posts: Vec<BlogPost>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub headline: String,
    pub short_bio: String,
    pub full_bio: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: String,
    pub availability: String,
    pub social_links: SocialLinks,
    pub years_of_experience: u32,
    pub stats: Vec<Stat>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub github: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    pub website: Option<String>,
    pub medium: Option<String>,
    pub devto: Option<String>,
}

impl SocialLinks {
    /// Present links as (key, url) in a fixed order
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        [
            ("github", &self.github),
            ("linkedin", &self.linkedin),
            ("twitter", &self.twitter),
            ("website", &self.website),
            ("medium", &self.medium),
            ("devto", &self.devto),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .map(|v| (key, v))
        })
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stat {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub category: String,
    pub proficiency: String,
    pub percentage: u8,
    pub years_of_experience: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub tagline: String,
    pub category: String,
    pub technologies: Vec<String>,
    pub live_url: Option<String>,
    pub github_url: Option<String>,
    pub featured: bool,
    pub order: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub id: String,
    pub company: String,
    pub position: String,
    pub employment_type: String,
    pub location: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub current: bool,
    pub description: String,
    pub responsibilities: Vec<String>,
    pub achievements: Vec<String>,
    pub technologies: Vec<String>,
    pub order: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub id: String,
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub current: bool,
    pub gpa: Option<String>,
    pub description: String,
    pub achievements: Vec<String>,
    pub order: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub kind: String,
    pub issuer: String,
    pub date: String,
    pub description: String,
    pub url: Option<String>,
    pub featured: bool,
    pub order: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certification {
    pub id: String,
    pub name: String,
    pub issuer: String,
    pub issue_date: String,
    pub expiry_date: Option<String>,
    pub credential_id: Option<String>,
    pub credential_url: Option<String>,
    pub description: String,
    pub skills: Vec<String>,
    pub order: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Testimonial {
    pub id: String,
    pub name: String,
    pub position: String,
    pub company: String,
    pub testimonial: String,
    pub rating: u8,
    pub date: String,
    pub linkedin_url: Option<String>,
    pub featured: bool,
    pub order: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub category: String,
    pub tags: Vec<String>,
    pub published_at: String,
    pub read_time: u32,
}

impl ContentStore {
    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        toml::from_str(source).context("invalid portfolio content")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read portfolio content from {}", path.display()))?;
        Self::from_toml_str(&source)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// The portfolio compiled into the binary
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_toml_str(BUNDLED_PORTFOLIO).context("bundled portfolio")
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.profile.first_name, self.profile.last_name)
            .trim()
            .to_string()
    }

    pub fn featured_projects(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|p| p.featured)
    }
}
