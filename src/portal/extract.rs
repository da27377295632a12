//! Pure extraction over rendered portal markup.
//!
//! Nothing here fails: a missing table, hearing block or document reference
//! only reduces what is returned.

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::models::{parse_portal_date, CaseRecord, ListingState};

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(s) => Some(s),
        Err(e) => {
            debug!("Invalid selector '{}': {:?}", css, e);
            None
        }
    }
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// First non-empty text of `css` below `scope`.
fn child_text(scope: ElementRef<'_>, css: &str) -> Option<String> {
    let sel = selector(css)?;
    scope
        .select(&sel)
        .next()
        .map(text_of)
        .filter(|t| !t.is_empty())
}

/// Parse a case-status results page into a [`CaseRecord`].
///
/// `today` is the reference date for the listing flags.
pub fn extract_case_record(html: &str, today: NaiveDate) -> CaseRecord {
    let document = Html::parse_document(html);
    let mut record = CaseRecord::default();

    if let (Some(rows), Some(cells)) = (selector("table.case_info tr"), selector("td")) {
        for row in document.select(&rows) {
            let mut tds = row.select(&cells);
            if let (Some(key), Some(value)) = (tds.next(), tds.next()) {
                record.fields.insert(text_of(key), text_of(value));
            }
        }
    }

    let hearing = selector("div.hearing_info").and_then(|s| document.select(&s).next());
    if let Some(hearing) = hearing {
        if let Some(raw) = child_text(hearing, "span.hearing_date") {
            match parse_portal_date(&raw) {
                Some(date) => {
                    record.hearing_date = Some(raw);
                    let state = ListingState::from_dates(Some(date), today);
                    record.listed_today = state == ListingState::Today;
                    record.listed_tomorrow = state == ListingState::Tomorrow;
                }
                None => debug!("Ignoring unparseable hearing date '{}'", raw),
            }
        }
        record.serial_number = child_text(hearing, "span.serial_number");
        record.court_name = child_text(hearing, "span.court_name");
    }

    record
}

/// Reference lookups in priority order: (css, attribute).
const DOCUMENT_REFERENCES: &[(&str, &str)] = &[
    ("iframe[src]", "src"),
    ("embed[src]", "src"),
    ("object[data]", "data"),
    ("a[target=\"_blank\"][href]", "href"),
];

/// Find the cause-list document reference in post-submit markup.
///
/// Relative references resolve against `page_url` when it is known.
pub fn locate_document(html: &str, page_url: Option<&str>) -> Option<String> {
    let document = Html::parse_document(html);
    let base = page_url.and_then(|u| Url::parse(u).ok());

    for (css, attr) in DOCUMENT_REFERENCES {
        let Some(sel) = selector(css) else {
            continue;
        };
        for element in document.select(&sel) {
            let Some(raw) = element.value().attr(attr).map(str::trim) else {
                continue;
            };
            if raw.is_empty() || raw.eq_ignore_ascii_case("about:blank") {
                continue;
            }
            // Pop-out links only count when they point at a PDF.
            if *attr == "href" && !is_pdf_reference(raw) {
                continue;
            }
            if let Some(resolved) = resolve_reference(raw, base.as_ref()) {
                return Some(resolved);
            }
        }
    }

    None
}

fn is_pdf_reference(raw: &str) -> bool {
    let path = raw.split(['?', '#']).next().unwrap_or(raw);
    path.to_ascii_lowercase().ends_with(".pdf")
}

fn resolve_reference(raw: &str, base: Option<&Url>) -> Option<String> {
    if let Ok(absolute) = Url::parse(raw) {
        return Some(absolute.to_string());
    }
    match base {
        Some(base) => base.join(raw).ok().map(|u| u.to_string()),
        None => {
            debug!("Relative document reference '{}' without page URL", raw);
            None
        }
    }
}
