// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use jobwatch::config::settings::Settings;
use jobwatch::domain::models::category::{Category, CompanyDedupPolicy, DEFAULT_SUBJECT};
use jobwatch::domain::models::posting::{Posting, PostingCard, Region};
use jobwatch::domain::search::listing_source::ListingQuery;
use jobwatch::domain::services::category_matcher::matches;

const SOURCE: &str = r#"
[[categories]]
name = "Cybersecurity"
keywords = ["Security Engineer", "SOC Analyst"]
target_region = "Canada"
search_location = "Ontario, Canada"
subject = "[{category}] {title} at {company} ({location})"
recipients = ["sec@example.com"]
suppress_duplicate_companies = true

[[categories]]
name = "Plain"
keywords = ["sre"]
target_region = "India"
"#;

fn categories() -> Vec<Category> {
    let settings = Settings::from_toml(SOURCE).unwrap();
    settings.categories.iter().map(Category::from).collect()
}

#[test]
fn category_settings_become_query_and_subject() {
    let categories = categories();
    let security = &categories[0];

    assert_eq!(security.keywords, vec!["security engineer", "soc analyst"]);
    assert_eq!(security.company_policy, CompanyDedupPolicy::OnePerCompany);

    let query = ListingQuery::from(security);
    assert_eq!(query.keywords, "security engineer OR soc analyst");
    assert_eq!(query.location, "Ontario, Canada");

    let posting = Posting::from_card(
        PostingCard {
            url: "https://x/1".to_string(),
            title: "Senior Security Engineer".to_string(),
            company: "Acme".to_string(),
            location: None,
        },
        Region::Unknown,
        &security.name,
    );
    assert!(matches(&posting.title, &security.keywords));
    assert_eq!(
        security.render_subject(&posting),
        "[Cybersecurity] Senior Security Engineer at Acme (Unknown)"
    );
}

#[test]
fn defaults_fill_missing_category_fields() {
    let categories = categories();
    let plain = &categories[1];

    assert_eq!(plain.search_location, "India");
    assert!(plain.recipients.is_empty());
    assert_eq!(plain.company_policy, CompanyDedupPolicy::AllowRepeats);

    let posting = Posting::from_card(
        PostingCard {
            url: "https://x/2".to_string(),
            title: "SRE".to_string(),
            company: "Beta".to_string(),
            location: Some("Pune, India".to_string()),
        },
        Region::India,
        &plain.name,
    );
    assert_eq!(plain.render_subject(&posting), DEFAULT_SUBJECT);
}
