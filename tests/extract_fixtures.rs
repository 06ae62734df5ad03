// tests/extract_fixtures.rs
use chrono::Local;
use job_feed_bot::config::AppConfig;
use job_feed_bot::jobs::filter::KeywordFilter;
use job_feed_bot::jobs::sites::build_extractors;
use job_feed_bot::jobs::types::{DEFAULT_COMPANY, DEFAULT_SALARY};

const HH_HTML: &str = include_str!("fixtures/hh_ru_search.html");
const HABR_HTML: &str = include_str!("fixtures/habr_vacancies.html");

#[test]
fn hh_fixture_yields_all_listings_with_defaults() {
    let cfg = AppConfig::default();
    let extractors = build_extractors(&cfg.sites).unwrap();
    let hh = &extractors[0];
    assert_eq!(hh.source(), "hh.ru");

    let jobs: Vec<_> = hh
        .parse_listings(HH_HTML, "Python", Local::now())
        .into_iter()
        .map(|r| r.expect("fixture listings are well formed"))
        .collect();
    assert_eq!(jobs.len(), 3);

    assert_eq!(jobs[0].title, "Senior Python Developer (remote)");
    assert_eq!(jobs[0].company, "ООО Вектор");
    assert_eq!(jobs[0].salary, "от 300 000 ₽");
    assert_eq!(jobs[0].description, "Design and run async Python services.");
    assert_eq!(jobs[0].id().as_str(), "hh.ru_https://hh.ru/vacancy/90000001");

    assert_eq!(jobs[1].company, DEFAULT_COMPANY);
    assert_eq!(jobs[2].salary, DEFAULT_SALARY);
    assert!(jobs[2].description.is_empty());
}

#[test]
fn habr_fixture_links_are_absolute() {
    let cfg = AppConfig::default();
    let extractors = build_extractors(&cfg.sites).unwrap();
    let habr = &extractors[1];
    assert_eq!(habr.source(), "habr.com");

    let jobs: Vec<_> = habr
        .parse_listings(HABR_HTML, "Backend Developer", Local::now())
        .into_iter()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(jobs.len(), 2);
    assert_eq!(
        jobs[0].link.as_deref(),
        Some("https://career.habr.com/vacancies/1000100001")
    );
    assert_eq!(jobs[0].company, "Acme Cloud");
    assert_eq!(jobs[0].description, "Python PostgreSQL");
    assert_eq!(jobs[1].salary, DEFAULT_SALARY);
}

#[test]
fn stock_filter_over_fixtures() {
    let cfg = AppConfig::default();
    let filter = KeywordFilter::from_config(&cfg.filters);
    let extractors = build_extractors(&cfg.sites).unwrap();

    let kept: Vec<String> = extractors
        .iter()
        .zip([HH_HTML, HABR_HTML])
        .flat_map(|(ex, html)| ex.parse_listings(html, "Python", Local::now()))
        .filter_map(Result::ok)
        .filter(|j| filter.passes(j))
        .map(|j| j.title)
        .collect();

    assert_eq!(
        kept,
        vec![
            "Senior Python Developer (remote)".to_string(),
            "Junior Python Engineer".to_string(),
            "Middle Backend Developer".to_string(),
        ]
    );
}
