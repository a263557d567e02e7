use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One item a job must attempt to acquire, produced by the upstream
/// search and immutable from then on. Identifiers are partial by nature:
/// `doi` is usable by some providers and not others, and
/// `candidate_urls` may be empty when the search found no open-access
/// location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionTarget {
    /// Primary identifier from the search source (e.g. an OpenAlex work id).
    pub paper_id: String,
    pub doi: Option<String>,
    pub title: String,
    pub year: Option<i32>,
    /// Comma-separated author names, truncated by the searcher.
    pub authors: String,
    pub cited_by_count: u32,
    pub relevance_score: f64,
    pub venue: Option<String>,
    pub open_access_status: Option<String>,
    /// Abstract reconstructed by the searcher, when available.
    pub abstract_text: Option<String>,
    /// Resource locators discovered during search, in preference order.
    pub candidate_urls: Vec<String>,
}

impl AcquisitionTarget {
    /// Stable storage key for this target's artifact.
    ///
    /// Hash of the identifier set so the key survives title edits in the
    /// upstream index and never collides across works.
    pub fn artifact_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.paper_id.as_bytes());
        if let Some(doi) = &self.doi {
            hasher.update(b"\x00");
            hasher.update(doi.as_bytes());
        }
        let digest = format!("{:x}", hasher.finalize());
        format!("{}_{}", sanitize_id(&self.paper_id), &digest[..12])
    }
}

/// Strip characters that are unsafe in blob keys and filenames.
fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn make_target(paper_id: &str, doi: Option<&str>) -> AcquisitionTarget {
        AcquisitionTarget {
            paper_id: paper_id.to_string(),
            doi: doi.map(String::from),
            title: "Test Paper".to_string(),
            year: Some(2024),
            authors: "Doe".to_string(),
            cited_by_count: 0,
            relevance_score: 0.0,
            venue: None,
            open_access_status: None,
            abstract_text: None,
            candidate_urls: vec![],
        }
    }

    #[test]
    fn test_artifact_key_is_stable() {
        let t = make_target("W123", Some("10.1000/abc"));
        assert_eq!(t.artifact_key(), t.artifact_key());
    }

    #[test]
    fn test_artifact_key_differs_by_identifier() {
        let a = make_target("W123", Some("10.1000/abc"));
        let b = make_target("W124", Some("10.1000/abc"));
        let c = make_target("W123", None);
        assert_ne!(a.artifact_key(), b.artifact_key());
        assert_ne!(a.artifact_key(), c.artifact_key());
    }

    #[test]
    fn test_artifact_key_is_filesystem_safe() {
        let t = make_target("https://openalex.org/W123", None);
        let key = t.artifact_key();
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
    }
}
