//! Architecture facts and complexity heuristics derived from a parsed design.

use crate::project::{ArchitectureFacts, ProjectData};

const MAX_PAGES: usize = 4;
const MAX_FRAMES_PER_PAGE: usize = 3;

/// Service tier suggested for the design's API surface.
pub fn api_tier(frame_count: usize, component_count: usize) -> &'static str {
    match frame_count + component_count {
        n if n > 10 => "Microservices API",
        n if n > 5 => "REST API Gateway",
        _ => "Simple API",
    }
}

/// Storage tier suggested by the amount of copy in the design.
pub fn data_tier(text_node_count: usize) -> &'static str {
    match text_node_count {
        n if n > 20 => "PostgreSQL + Redis",
        n if n > 10 => "PostgreSQL",
        _ => "SQLite",
    }
}

/// Derive component relations from pages, frames and components.
///
/// Returns an empty mapping for a design without pages, frames or components.
pub fn derive_facts(project: &ProjectData) -> ArchitectureFacts {
    let mut facts = ArchitectureFacts::new();

    if project.pages.is_empty() && project.frames.is_empty() && project.components.is_empty() {
        return facts;
    }

    let api = api_tier(project.frames.len(), project.components.len()).to_string();
    let data = data_tier(project.text_nodes.len()).to_string();

    let pages: Vec<&str> = project
        .pages
        .iter()
        .take(MAX_PAGES)
        .map(|p| p.name.as_str())
        .collect();

    for page in &pages {
        let frames: Vec<String> = project
            .frames
            .iter()
            .filter(|f| f.page == *page)
            .take(MAX_FRAMES_PER_PAGE)
            .map(|f| frame_node_name(&f.name))
            .collect();

        for frame in &frames {
            facts.entry(frame.clone()).or_default().push(api.clone());
        }

        facts.entry(page_node_name(page)).or_default().extend(frames);
    }

    if !project.components.is_empty() {
        let library = format!("Component Library ({})", project.components.len());
        facts
            .entry(library)
            .or_default()
            .extend(pages.iter().map(|p| page_node_name(p)));
    }

    facts.entry(api).or_default().push(data.clone());
    facts.entry(data).or_default();

    for targets in facts.values_mut() {
        targets.dedup();
    }

    facts
}

fn page_node_name(page: &str) -> String {
    format!("Page: {page}")
}

fn frame_node_name(frame: &str) -> String {
    if frame.trim().is_empty() {
        "Frame".to_string()
    } else {
        frame.to_string()
    }
}

/// Deployment shape suggested by screen and component counts.
pub fn complexity_narrative(frame_count: usize, component_count: usize) -> String {
    if frame_count > 10 || component_count > 5 {
        format!(
            "Complex application with {frame_count} screens and {component_count} components \
             requires a microservices architecture with an API gateway, multiple databases, \
             and scalable infrastructure."
        )
    } else if frame_count > 5 {
        format!(
            "Medium complexity application with {frame_count} screens suggests a modular \
             monolith with clear service boundaries and database separation."
        )
    } else {
        format!(
            "Simple application with {frame_count} screens can use a single-service \
             architecture with a unified database and straightforward deployment."
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechRecommendation {
    pub stack: String,
    pub deployment: String,
    pub score: usize,
}

/// Stack and deployment recommendation from the `frames + 2 * components` score.
pub fn tech_recommendation(frame_count: usize, component_count: usize) -> TechRecommendation {
    let score = frame_count + component_count * 2;

    let (stack, deployment) = if score > 20 {
        (
            "Enterprise-scale: React/Vue.js + Node.js/Python + PostgreSQL + Redis + Kubernetes + AWS/GCP",
            "Microservices with container orchestration, API gateway, and distributed caching",
        )
    } else if score > 10 {
        (
            "Medium-scale: React + Express.js + PostgreSQL + Docker + Cloud deployment",
            "Modular monolith with service separation and horizontal scaling capability",
        )
    } else {
        (
            "Simple-scale: React + FastAPI/Express + SQLite/PostgreSQL + Vercel/Netlify",
            "Single service deployment with CDN and basic scaling",
        )
    };

    TechRecommendation {
        stack: stack.to_string(),
        deployment: deployment.to_string(),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{ComponentSummary, FrameSummary, PageSummary};

    fn frame(name: &str, page: &str) -> FrameSummary {
        FrameSummary {
            name: name.to_string(),
            page: page.to_string(),
            width: 375.0,
            height: 812.0,
            children_count: 0,
            visible: true,
        }
    }

    fn page(name: &str) -> PageSummary {
        PageSummary {
            id: name.to_string(),
            name: name.to_string(),
            frame_count: 0,
        }
    }

    #[test]
    fn test_api_tier_thresholds() {
        assert_eq!(api_tier(2, 3), "Simple API");
        assert_eq!(api_tier(4, 2), "REST API Gateway");
        assert_eq!(api_tier(8, 3), "Microservices API");
    }

    #[test]
    fn test_data_tier_thresholds() {
        assert_eq!(data_tier(0), "SQLite");
        assert_eq!(data_tier(11), "PostgreSQL");
        assert_eq!(data_tier(21), "PostgreSQL + Redis");
    }

    #[test]
    fn test_derive_facts_empty_design() {
        let project = ProjectData::new(None, "link", "key");
        assert!(derive_facts(&project).is_empty());
    }

    #[test]
    fn test_derive_facts_links_pages_frames_and_tiers() {
        let mut project = ProjectData::new(Some("Shop"), "link", "key");
        project.pages = vec![page("Home"), page("Checkout")];
        project.frames = vec![
            frame("Landing", "Home"),
            frame("Search", "Home"),
            frame("Cart", "Checkout"),
        ];
        project.components = vec![ComponentSummary {
            id: "1".to_string(),
            name: "Button".to_string(),
            kind: "COMPONENT".to_string(),
            page: "Home".to_string(),
            description: None,
        }];

        let facts = derive_facts(&project);

        assert_eq!(facts["Page: Home"], vec!["Landing", "Search"]);
        assert_eq!(facts["Page: Checkout"], vec!["Cart"]);
        assert_eq!(facts["Landing"], vec!["Simple API"]);
        assert_eq!(
            facts["Component Library (1)"],
            vec!["Page: Home", "Page: Checkout"]
        );
        assert_eq!(facts["Simple API"], vec!["SQLite"]);
        assert!(facts["SQLite"].is_empty());
    }

    #[test]
    fn test_derive_facts_caps_pages_and_frames() {
        let mut project = ProjectData::new(Some("Big"), "link", "key");
        project.pages = (0..6).map(|i| page(&format!("P{i}"))).collect();
        project.frames = (0..5).map(|i| frame(&format!("F{i}"), "P0")).collect();

        let facts = derive_facts(&project);

        assert_eq!(facts["Page: P0"].len(), MAX_FRAMES_PER_PAGE);
        assert!(facts.contains_key("Page: P3"));
        assert!(!facts.contains_key("Page: P4"));
    }

    #[test]
    fn test_complexity_narrative_tiers() {
        assert!(complexity_narrative(12, 0).starts_with("Complex"));
        assert!(complexity_narrative(6, 1).starts_with("Medium"));
        assert!(complexity_narrative(2, 1).starts_with("Simple"));
    }

    #[test]
    fn test_tech_recommendation_score() {
        let rec = tech_recommendation(5, 3);
        assert_eq!(rec.score, 11);
        assert!(rec.stack.starts_with("Medium-scale"));

        assert!(tech_recommendation(1, 1).stack.starts_with("Simple-scale"));
        assert!(tech_recommendation(15, 5).stack.starts_with("Enterprise-scale"));
    }
}
