pub mod providers;
pub mod searcher;
pub mod transport;

#[cfg(test)]
pub(crate) mod testutil;

pub use providers::{OpenAlexPdfProvider, SemanticScholarProvider, UnpaywallProvider};
pub use searcher::{OpenAlexSearcher, norm_doi};
pub use transport::{HttpGet, HttpResponse, ReqwestHttp, RetryPolicy, RetryingTransport};
