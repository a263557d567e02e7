//! Bibliographic search against the OpenAlex works API.

use std::collections::HashMap;

use folio_core::{AcquisitionTarget, AppError, RetrievalParams, Searcher};
use serde::Deserialize;
use url::Url;

use crate::transport::{HttpGet, RetryingTransport};

const OPENALEX_API: &str = "https://api.openalex.org/works";
const MAX_PER_PAGE: usize = 200;
const MAX_AUTHORS: usize = 5;
const MAX_ABSTRACT_CHARS: usize = 500;

/// Searcher backed by OpenAlex full-text relevance search.
///
/// A `mailto` address opts into the polite pool and is strongly
/// recommended for production use.
#[derive(Clone)]
pub struct OpenAlexSearcher<H: HttpGet> {
    transport: RetryingTransport<H>,
    base_url: String,
    mailto: Option<String>,
}

impl<H: HttpGet> OpenAlexSearcher<H> {
    pub fn new(transport: RetryingTransport<H>, mailto: Option<String>) -> Self {
        Self {
            transport,
            base_url: OPENALEX_API.to_string(),
            mailto,
        }
    }

    fn build_url(&self, query: &str, params: &RetrievalParams) -> Result<String, AppError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| AppError::SearchError(format!("Invalid search base URL: {e}")))?;

        let mut filters: Vec<String> = Vec::new();
        if params.open_access_only {
            filters.push("open_access.is_oa:true".to_string());
        }
        if let Some(year_min) = params.year_min {
            filters.push(format!("from_publication_date:{year_min}-01-01"));
        }
        if let Some(year_max) = params.year_max {
            filters.push(format!("to_publication_date:{year_max}-12-31"));
        }
        if let Some(min_citations) = params.min_citations {
            // OpenAlex only supports strict inequality on counts.
            filters.push(format!(
                "cited_by_count:>{}",
                min_citations.saturating_sub(1)
            ));
        }

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("search", query);
            if !filters.is_empty() {
                pairs.append_pair("filter", &filters.join(","));
            }
            pairs.append_pair("sort", "relevance_score:desc");
            pairs.append_pair(
                "per-page",
                &params.max_results.min(MAX_PER_PAGE).to_string(),
            );
            if let Some(mailto) = &self.mailto {
                pairs.append_pair("mailto", mailto);
            }
        }

        Ok(url.into())
    }
}

impl<H: HttpGet> Searcher for OpenAlexSearcher<H> {
    async fn search(
        &self,
        query: &str,
        params: &RetrievalParams,
    ) -> Result<Vec<AcquisitionTarget>, AppError> {
        let url = self.build_url(query, params)?;
        tracing::debug!(%url, "Searching OpenAlex");

        let response: WorksResponse = self
            .transport
            .get_json(&url, &[])
            .await
            .map_err(|e| AppError::SearchError(format!("OpenAlex search failed: {e}")))?;

        let targets: Vec<AcquisitionTarget> = response
            .results
            .into_iter()
            .filter_map(parse_work)
            .take(params.max_results)
            .collect();

        tracing::info!(%query, count = targets.len(), "Search returned targets");
        Ok(targets)
    }
}

// ---------------------------------------------------------------------------
// OpenAlex response shapes (partial)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WorksResponse {
    #[serde(default)]
    results: Vec<Work>,
}

#[derive(Debug, Deserialize)]
struct Work {
    id: Option<String>,
    doi: Option<String>,
    title: Option<String>,
    display_name: Option<String>,
    publication_year: Option<i32>,
    #[serde(default)]
    cited_by_count: u32,
    #[serde(default)]
    relevance_score: f64,
    #[serde(default)]
    authorships: Vec<Authorship>,
    primary_location: Option<Location>,
    best_oa_location: Option<Location>,
    #[serde(default)]
    locations: Vec<Location>,
    open_access: Option<OpenAccess>,
    abstract_inverted_index: Option<HashMap<String, Vec<usize>>>,
}

#[derive(Debug, Deserialize)]
struct Authorship {
    author: Option<Author>,
}

#[derive(Debug, Deserialize)]
struct Author {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Location {
    pdf_url: Option<String>,
    source: Option<Source>,
}

#[derive(Debug, Deserialize)]
struct Source {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAccess {
    oa_status: Option<String>,
}

/// Map one OpenAlex work into a target. Works without an id are dropped.
fn parse_work(work: Work) -> Option<AcquisitionTarget> {
    let paper_id = work
        .id
        .as_deref()
        .map(|id| id.trim_start_matches("https://openalex.org/").to_string())?;

    let title = work
        .title
        .or(work.display_name)
        .unwrap_or_else(|| "Untitled".to_string());

    let candidate_urls = collect_pdf_urls(
        work.best_oa_location.as_ref(),
        work.primary_location.as_ref(),
        &work.locations,
    );

    Some(AcquisitionTarget {
        paper_id,
        doi: work.doi.as_deref().map(norm_doi),
        title,
        year: work.publication_year,
        authors: format_authors(&work.authorships),
        cited_by_count: work.cited_by_count,
        relevance_score: work.relevance_score,
        venue: work
            .primary_location
            .and_then(|l| l.source)
            .and_then(|s| s.display_name),
        open_access_status: work.open_access.and_then(|oa| oa.oa_status),
        abstract_text: work
            .abstract_inverted_index
            .as_ref()
            .map(|index| reconstruct_abstract(index)),
        candidate_urls,
    })
}

/// Canonical bare DOI: strip the resolver prefix and any trailing
/// punctuation picked up from citation text, lowercase.
pub fn norm_doi(doi: &str) -> String {
    doi.trim()
        .trim_start_matches("https://doi.org/")
        .trim_start_matches("http://doi.org/")
        .trim_start_matches("doi:")
        .trim_end_matches(['.', ',', ';'])
        .to_lowercase()
}

fn format_authors(authorships: &[Authorship]) -> String {
    let names: Vec<&str> = authorships
        .iter()
        .filter_map(|a| a.author.as_ref()?.display_name.as_deref())
        .collect();
    if names.len() > MAX_AUTHORS {
        format!("{} et al.", names[..MAX_AUTHORS].join(", "))
    } else {
        names.join(", ")
    }
}

/// PDF locations in preference order, deduplicated.
fn collect_pdf_urls(
    best_oa: Option<&Location>,
    primary: Option<&Location>,
    locations: &[Location],
) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let candidates = best_oa
        .into_iter()
        .chain(primary)
        .chain(locations.iter())
        .filter_map(|l| l.pdf_url.clone());
    for url in candidates {
        if !urls.contains(&url) {
            urls.push(url);
        }
    }
    urls
}

/// Rebuild a readable abstract from OpenAlex's inverted index, truncated
/// to a summary-sized prefix.
fn reconstruct_abstract(index: &HashMap<String, Vec<usize>>) -> String {
    let mut positions: Vec<(usize, &str)> = index
        .iter()
        .flat_map(|(word, positions)| positions.iter().map(move |&p| (p, word.as_str())))
        .collect();
    positions.sort_unstable_by_key(|(p, _)| *p);

    let text = positions
        .iter()
        .map(|(_, word)| *word)
        .collect::<Vec<_>>()
        .join(" ");

    if text.chars().count() > MAX_ABSTRACT_CHARS {
        let truncated: String = text.chars().take(MAX_ABSTRACT_CHARS).collect();
        format!("{truncated}...")
    } else {
        text
    }
}
