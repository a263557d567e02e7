//! Document providers, one module per upstream source.
//!
//! Each provider turns transport errors into attempt outcomes so the
//! cascade can act on the failure kind without parsing error strings.

mod openalex;
mod semantic_scholar;
mod unpaywall;

pub use openalex::OpenAlexPdfProvider;
pub use semantic_scholar::SemanticScholarProvider;
pub use unpaywall::UnpaywallProvider;

use folio_core::{AppError, AttemptOutcome};

/// Classify a transport failure as an attempt outcome.
fn outcome_from_error(error: &AppError) -> AttemptOutcome {
    match error {
        AppError::NotFound => AttemptOutcome::NotFound,
        AppError::RateLimitExceeded | AppError::HttpStatus { status: 429, .. } => {
            AttemptOutcome::RateLimited
        }
        other => AttemptOutcome::TransientError(other.to_string()),
    }
}
