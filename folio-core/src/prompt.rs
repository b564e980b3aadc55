//! System prompt assembly.
//!
//! Output is a pure function of the store and the limits: no clocks, no map
//! iteration, so identical content always yields a byte-identical prompt.

use crate::content::{ContentStore, Education, Experience, Project};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptLimits {
    /// First N skills in store order
    pub skills: usize,
    /// First K experience records in store order
    pub experiences: usize,
    pub achievements_per_experience: usize,
}

impl Default for PromptLimits {
    fn default() -> Self {
        Self {
            skills: 10,
            experiences: 3,
            achievements_per_experience: 3,
        }
    }
}

impl From<&config::PromptSettings> for PromptLimits {
    fn from(settings: &config::PromptSettings) -> Self {
        Self {
            skills: settings.skills,
            experiences: settings.experiences,
            achievements_per_experience: settings.achievements,
        }
    }
}

pub fn assemble_system_prompt(store: &ContentStore, limits: &PromptLimits) -> String {
    let profile = &store.profile;
    let mut sections: Vec<String> = Vec::new();

    let name = store.full_name();
    sections.push(if profile.headline.trim().is_empty() {
        format!("You are an AI assistant representing {}.", name)
    } else {
        format!(
            "You are an AI assistant representing {}, a {}.",
            name, profile.headline
        )
    });

    if let Some(bio) = present(&profile.short_bio) {
        sections.push(format!("Bio: {}", bio));
    }
    if let Some(bio) = present(&profile.full_bio) {
        sections.push(format!("Full Bio: {}", bio));
    }

    let contact = [
        ("Email", Some(profile.email.as_str())),
        ("Phone", profile.phone.as_deref()),
        ("Location", Some(profile.location.as_str())),
        ("Availability", Some(profile.availability.as_str())),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.and_then(present).map(|v| format!("- {}: {}", label, v)));
    sections.push(section("Contact:", contact));

    let social = profile
        .social_links
        .entries()
        .into_iter()
        .map(|(key, url)| format!("- {}: {}", key, url));
    sections.push(section("Social Links:", social));

    sections.push(format!(
        "Years of Experience: {}",
        profile.years_of_experience
    ));

    let stats = profile
        .stats
        .iter()
        .map(|stat| format!("- {}: {}", stat.label, stat.value));
    sections.push(section("Stats:", stats));

    let skills = store.skills.iter().take(limits.skills).map(|skill| {
        format!(
            "- {}: {} ({}%)",
            skill.name, skill.proficiency, skill.percentage
        )
    });
    sections.push(section("Key Skills:", skills));

    let experiences = store
        .experiences
        .iter()
        .take(limits.experiences)
        .map(|exp| render_experience(exp, limits.achievements_per_experience))
        .collect::<Vec<_>>()
        .join("\n\n");
    sections.push(block("Recent Experience:", experiences));

    let projects = store
        .featured_projects()
        .map(render_project)
        .collect::<Vec<_>>()
        .join("\n");
    sections.push(block("Featured Projects:", projects));

    let education = store
        .education
        .iter()
        .map(render_education)
        .collect::<Vec<_>>()
        .join("\n");
    sections.push(block("Education:", education));

    let first_name = present(&profile.first_name).unwrap_or("the portfolio owner");
    sections.push(format!(
        "You should answer questions about {}'s experience, skills, projects, education, \
         and availability.\n\
         Be conversational, professional, and helpful. \
         If asked about something not in the portfolio, politely say you don't have that \
         information but suggest checking the website or contacting directly.",
        first_name
    ));

    sections.join("\n\n")
}

fn present(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

fn section(heading: &str, lines: impl Iterator<Item = String>) -> String {
    let mut out = heading.to_string();
    for line in lines {
        out.push('\n');
        out.push_str(&line);
    }
    out
}

fn block(heading: &str, body: String) -> String {
    if body.is_empty() {
        heading.to_string()
    } else {
        format!("{}\n{}", heading, body)
    }
}

fn render_experience(exp: &Experience, max_achievements: usize) -> String {
    let mut lines = vec![
        format!("Company: {}", exp.company),
        format!("Position: {}", exp.position),
    ];

    let end = if exp.current {
        Some("Present")
    } else {
        exp.end_date.as_deref().and_then(present)
    };
    lines.push(match end {
        Some(end) => format!("Duration: {} - {}", exp.start_date, end),
        None => format!("Duration: {}", exp.start_date),
    });

    if let Some(description) = present(&exp.description) {
        lines.push(format!("Description: {}", description));
    }
    if !exp.achievements.is_empty() {
        let achievements: Vec<&str> = exp
            .achievements
            .iter()
            .take(max_achievements)
            .map(String::as_str)
            .collect();
        lines.push(format!("Key Achievements: {}", achievements.join(", ")));
    }
    lines.join("\n")
}

fn render_project(project: &Project) -> String {
    let mut lines = vec![if project.tagline.trim().is_empty() {
        format!("- {}", project.title)
    } else {
        format!("- {}: {}", project.title, project.tagline)
    }];
    if !project.technologies.is_empty() {
        lines.push(format!(
            "  Technologies: {}",
            project.technologies.join(", ")
        ));
    }
    if let Some(url) = project.live_url.as_deref().and_then(present) {
        lines.push(format!("  Live URL: {}", url));
    }
    if let Some(url) = project.github_url.as_deref().and_then(present) {
        lines.push(format!("  GitHub: {}", url));
    }
    lines.join("\n")
}

fn render_education(edu: &Education) -> String {
    let mut lines = vec![format!(
        "- {} in {} from {}",
        edu.degree, edu.field_of_study, edu.institution
    )];
    if let Some(gpa) = edu.gpa.as_deref().and_then(present) {
        lines.push(format!("  GPA: {}", gpa));
    }
    if let Some(description) = present(&edu.description) {
        lines.push(format!("  {}", description));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Profile, Skill, SocialLinks};

    fn fixture() -> ContentStore {
        ContentStore::from_toml_str(
            r#"
            [profile]
            first_name = "Ada"
            last_name = "Lovelace"
            headline = "Analyst"
            short_bio = "Writes programs for engines."
            email = "ada@example.test"
            location = "London"
            availability = "Open"
            years_of_experience = 9

            [profile.social_links]
            website = "https://ada.example"
            github = "https://github.com/ada"

            [[profile.stats]]
            label = "Notes"
            value = "7"

            [[skills]]
            name = "Mathematics"
            proficiency = "expert"
            percentage = 60

            [[skills]]
            name = "Translation"
            proficiency = "advanced"
            percentage = 99

            [[skills]]
            name = "Poetry"
            proficiency = "beginner"
            percentage = 20

            [[experiences]]
            company = "Analytical Engine"
            position = "Programmer"
            start_date = "1842"
            current = true
            description = "Notes on the engine."
            achievements = ["Note A", "Note B", "Note C", "Note G"]

            [[experiences]]
            company = "Royal Society"
            position = "Correspondent"
            start_date = "1835"
            end_date = "1840"

            [[projects]]
            title = "Bernoulli"
            tagline = "First published program"
            technologies = ["Punch cards"]
            live_url = "https://bernoulli.example"
            featured = true

            [[projects]]
            title = "Unlisted"
            featured = false

            [[education]]
            degree = "Private tutoring"
            field_of_study = "Mathematics"
            institution = "De Morgan"
            description = "Correspondence course."
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let store = fixture();
        let limits = PromptLimits::default();
        assert_eq!(
            assemble_system_prompt(&store, &limits),
            assemble_system_prompt(&store, &limits)
        );
    }

    #[test]
    fn test_sections_appear_in_order() {
        let prompt = assemble_system_prompt(&fixture(), &PromptLimits::default());
        let order = [
            "You are an AI assistant representing Ada Lovelace, a Analyst.",
            "Bio: Writes programs for engines.",
            "Contact:",
            "Social Links:",
            "Years of Experience: 9",
            "Stats:",
            "Key Skills:",
            "Recent Experience:",
            "Featured Projects:",
            "Education:",
            "You should answer questions about Ada's experience",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|needle| prompt.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{prompt}");
    }

    #[test]
    fn test_skills_take_store_order_not_percentage() {
        let limits = PromptLimits {
            skills: 2,
            ..Default::default()
        };
        let prompt = assemble_system_prompt(&fixture(), &limits);
        assert!(prompt.contains(
            "Key Skills:\n- Mathematics: expert (60%)\n- Translation: advanced (99%)\n"
        ));
        assert!(!prompt.contains("Poetry"));
    }

    #[test]
    fn test_experience_achievements_capped_and_present() {
        let prompt = assemble_system_prompt(&fixture(), &PromptLimits::default());
        assert!(prompt.contains("Duration: 1842 - Present"));
        assert!(prompt.contains("Key Achievements: Note A, Note B, Note C\n"));
        assert!(!prompt.contains("Note G"));
        assert!(prompt.contains("Duration: 1835 - 1840"));
    }

    #[test]
    fn test_experience_limit() {
        let limits = PromptLimits {
            experiences: 1,
            ..Default::default()
        };
        let prompt = assemble_system_prompt(&fixture(), &limits);
        assert!(prompt.contains("Analytical Engine"));
        assert!(!prompt.contains("Royal Society"));
    }

    #[test]
    fn test_only_featured_projects_with_links() {
        let prompt = assemble_system_prompt(&fixture(), &PromptLimits::default());
        assert!(prompt.contains(concat!(
            "- Bernoulli: First published program\n",
            "  Technologies: Punch cards\n",
            "  Live URL: https://bernoulli.example"
        )));
        assert!(!prompt.contains("Unlisted"));
        assert!(!prompt.contains("GitHub:"));
    }

    #[test]
    fn test_absent_optional_fields_are_omitted() {
        let prompt = assemble_system_prompt(&fixture(), &PromptLimits::default());
        assert!(!prompt.contains("Phone:"));
        assert!(!prompt.contains("Full Bio:"));
        assert!(!prompt.contains("GPA:"));
        assert!(prompt.contains(
            "Social Links:\n- github: https://github.com/ada\n- website: https://ada.example"
        ));
    }

    #[test]
    fn test_empty_store_degrades_to_empty_sections() {
        let store = ContentStore {
            profile: Profile {
                first_name: "Solo".to_string(),
                social_links: SocialLinks::default(),
                ..Default::default()
            },
            skills: Vec::<Skill>::new(),
            ..Default::default()
        };
        let prompt = assemble_system_prompt(&store, &PromptLimits::default());
        assert!(prompt.contains(
            "Key Skills:\n\nRecent Experience:\n\nFeatured Projects:\n\nEducation:\n\n"
        ));
        assert!(prompt.starts_with("You are an AI assistant representing Solo."));
    }
}
