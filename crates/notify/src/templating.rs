//! Minijinja template rendering for chat messages.
//!
//! Templates produce Telegram HTML. Every string field is escaped in
//! Rust before it reaches the template, so templates may interpolate
//! values directly without filters.

use jobwatch_core::SeenRecord;
use serde::Serialize;

use crate::telegram::escape_html;
use crate::traits::{AiSummary, NotifyError, OutgoingListing};

/// Telegram rejects messages above 4096 characters; ten favorites stay well under.
const FAVORITES_PER_MESSAGE: usize = 10;

const LISTING_TEMPLATE: &str = "\
🔥 <b>{{ title }}</b>
🏢 {{ company }}{% if area %} ({{ area }}){% endif %}
💰 {{ salary }}{% if experience %}
🎓 {{ experience }}{% endif %}{% if remote %}
🏠 Remote{% endif %}{% if ai %}
🤖 AI score: {{ ai.score }}/100{% if ai.verdict %}. {{ ai.verdict }}{% endif %}{% if ai.stack %}
🧩 {{ ai.stack }}{% endif %}{% if ai.pros %}
➕ {{ ai.pros }}{% endif %}{% if ai.cons %}
➖ {{ ai.cons }}{% endif %}{% endif %}

🔗 {{ url }}";

const FAVORITES_TEMPLATE: &str = "\
{% if first %}⭐ <b>Favorites ({{ total }})</b>
{% endif %}{% for item in items %}
{{ offset + loop.index }}. <b>{{ item.title }}</b>
🏢 {{ item.company }}{% if item.salary %}
💰 {{ item.salary }}{% endif %}
🔗 {{ item.url }}
{% endfor %}";

/// View of a listing exposed to the listing template. All strings pre-escaped.
#[derive(Debug, Serialize)]
struct ListingView {
    title: String,
    company: String,
    area: Option<String>,
    salary: String,
    experience: Option<&'static str>,
    remote: bool,
    url: String,
    ai: Option<AiSummary>,
}

impl From<&OutgoingListing> for ListingView {
    fn from(item: &OutgoingListing) -> Self {
        let l = &item.listing;
        Self {
            title: escape_html(&l.title),
            company: escape_html(&l.company),
            area: l.area.as_deref().map(escape_html),
            salary: escape_html(&l.salary_text()),
            experience: l.experience.map(|e| e.label()),
            remote: l.remote,
            url: escape_html(&l.url),
            ai: item.ai.as_ref().map(|ai| AiSummary {
                score: ai.score,
                stack: escape_html(ai.stack.trim()),
                pros: escape_html(ai.pros.trim()),
                cons: escape_html(ai.cons.trim()),
                verdict: escape_html(ai.verdict.trim()),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct FavoriteView {
    title: String,
    company: String,
    salary: Option<String>,
    url: String,
}

impl From<&SeenRecord> for FavoriteView {
    fn from(r: &SeenRecord) -> Self {
        Self {
            title: escape_html(&r.title),
            company: escape_html(&r.company),
            salary: r.salary.as_deref().map(escape_html),
            url: escape_html(&r.url),
        }
    }
}

#[derive(Debug, Serialize)]
struct FavoritesPage {
    first: bool,
    total: usize,
    offset: usize,
    items: Vec<FavoriteView>,
}

/// Renders listing and favorites messages.
///
/// The environment is built once with both templates registered.
#[derive(Debug)]
pub struct ListingRenderer {
    env: minijinja::Environment<'static>,
}

impl ListingRenderer {
    pub fn new() -> Result<Self, NotifyError> {
        let mut env = minijinja::Environment::new();
        env.add_template("listing", LISTING_TEMPLATE)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        env.add_template("favorites", FAVORITES_TEMPLATE)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(Self { env })
    }

    /// Render a delivered listing as Telegram HTML.
    pub fn render_listing(&self, item: &OutgoingListing) -> Result<String, NotifyError> {
        self.render("listing", &ListingView::from(item))
    }

    /// Render favorites as one or more messages.
    pub fn render_favorites(&self, records: &[SeenRecord]) -> Result<Vec<String>, NotifyError> {
        if records.is_empty() {
            return Ok(vec!["No favorites yet. Tap ⭐ under a listing to save it.".to_string()]);
        }

        records
            .chunks(FAVORITES_PER_MESSAGE)
            .enumerate()
            .map(|(page, chunk)| {
                let ctx = FavoritesPage {
                    first: page == 0,
                    total: records.len(),
                    offset: page * FAVORITES_PER_MESSAGE,
                    items: chunk.iter().map(FavoriteView::from).collect(),
                };
                self.render("favorites", &ctx)
            })
            .collect()
    }

    fn render<S: Serialize>(&self, name: &str, ctx: &S) -> Result<String, NotifyError> {
        let tmpl = self
            .env
            .get_template(name)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        let rendered = tmpl
            .render(ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))?;
        Ok(rendered.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jobwatch_core::{Experience, Listing, Salary, SeenStatus};

    fn sample_listing() -> Listing {
        Listing {
            id: "101".to_string(),
            title: "Senior <React> & TS".to_string(),
            company: "Acme".to_string(),
            salary: Some(Salary {
                from: Some(180_000),
                to: Some(250_000),
                currency: Some("RUR".to_string()),
                gross: Some(false),
            }),
            experience: Some(Experience::Between3And6),
            remote: true,
            area: Some("Moscow".to_string()),
            url: "https://hh.ru/vacancy/101".to_string(),
            published_at: None,
            requirement: None,
            responsibility: None,
        }
    }

    fn record(id: &str, title: &str) -> SeenRecord {
        SeenRecord {
            listing_id: id.to_string(),
            status: SeenStatus::Favorited,
            title: title.to_string(),
            company: "Acme".to_string(),
            url: format!("https://hh.ru/vacancy/{id}"),
            salary: None,
            delivered_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn listing_contains_escaped_fields() {
        let renderer = ListingRenderer::new().unwrap();
        let text = renderer
            .render_listing(&OutgoingListing::plain(sample_listing()))
            .unwrap();

        assert!(text.starts_with("🔥 <b>Senior &lt;React&gt; &amp; TS</b>"));
        assert!(text.contains("🏢 Acme (Moscow)"));
        assert!(text.contains("💰 180000 – 250000 RUR"));
        assert!(text.contains("🎓 3–6 years"));
        assert!(text.contains("🏠 Remote"));
        assert!(text.ends_with("🔗 https://hh.ru/vacancy/101"));
        assert!(!text.contains("AI score"));
    }

    #[test]
    fn listing_optional_lines_are_skipped() {
        let renderer = ListingRenderer::new().unwrap();
        let mut listing = sample_listing();
        listing.salary = None;
        listing.experience = None;
        listing.remote = false;
        listing.area = None;

        let text = renderer.render_listing(&OutgoingListing::plain(listing)).unwrap();
        assert!(text.contains("🏢 Acme\n💰 Salary not specified\n\n🔗"));
        assert!(!text.contains("none"));
    }

    #[test]
    fn listing_includes_ai_assessment() {
        let renderer = ListingRenderer::new().unwrap();
        let item = OutgoingListing {
            listing: sample_listing(),
            ai: Some(AiSummary {
                score: 87,
                stack: "React, TypeScript".to_string(),
                pros: "Remote, <strong> team".to_string(),
                cons: "Legacy code".to_string(),
                verdict: "Good fit".to_string(),
            }),
        };
        let text = renderer.render_listing(&item).unwrap();
        assert!(text.contains(
            "🤖 AI score: 87/100. Good fit\n🧩 React, TypeScript\n➕ Remote, &lt;strong&gt; team\n➖ Legacy code"
        ));
    }

    #[test]
    fn empty_ai_fields_are_skipped() {
        let renderer = ListingRenderer::new().unwrap();
        let item = OutgoingListing {
            listing: sample_listing(),
            ai: Some(AiSummary {
                score: 70,
                cons: "Office twice a week".to_string(),
                ..Default::default()
            }),
        };
        let text = renderer.render_listing(&item).unwrap();
        assert!(text.contains("🤖 AI score: 70/100\n➖ Office twice a week"));
        assert!(!text.contains("🧩"));
        assert!(!text.contains("➕"));
    }

    #[test]
    fn empty_favorites_message() {
        let renderer = ListingRenderer::new().unwrap();
        let pages = renderer.render_favorites(&[]).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].starts_with("No favorites yet"));
    }

    #[test]
    fn favorites_are_numbered_and_paged() {
        let renderer = ListingRenderer::new().unwrap();
        let records: Vec<SeenRecord> = (1..=12)
            .map(|i| record(&i.to_string(), &format!("Job {i}")))
            .collect();

        let pages = renderer.render_favorites(&records).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages[0].starts_with("⭐ <b>Favorites (12)</b>"));
        assert!(pages[0].contains("1. <b>Job 1</b>"));
        assert!(pages[0].contains("🔗 https://hh.ru/vacancy/10"));
        assert!(!pages[1].contains("Favorites (12)"));
        assert!(pages[1].starts_with("11. <b>Job 11</b>"));
    }
}
