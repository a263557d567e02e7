//! Test utilities: a scripted HTTP layer and target builders.

use std::sync::{Arc, Mutex};

use folio_core::{AcquisitionTarget, AppError};

use crate::transport::{HttpGet, HttpResponse};

/// Mock [`HttpGet`] with a queue of scripted responses. Each call pops
/// the first element and records the URL and headers; an exhausted queue
/// answers 404.
#[derive(Clone)]
pub struct MockHttp {
    responses: Arc<Mutex<Vec<Result<HttpResponse, AppError>>>>,
    requests: Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>,
}

impl MockHttp {
    pub fn with_responses(responses: Vec<Result<HttpResponse, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn requested_headers(&self) -> Vec<Vec<(String, String)>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, headers)| headers.clone())
            .collect()
    }
}

impl HttpGet for MockHttp {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<HttpResponse, AppError> {
        self.requests.lock().unwrap().push((
            url.to_string(),
            headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(HttpResponse {
                status: 404,
                body: vec![],
            })
        } else {
            responses.remove(0)
        }
    }
}

pub fn json_response(status: u16, body: serde_json::Value) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse {
        status,
        body: body.to_string().into_bytes(),
    })
}

pub fn bytes_response(status: u16, body: &[u8]) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse {
        status,
        body: body.to_vec(),
    })
}

pub fn status_response(status: u16) -> Result<HttpResponse, AppError> {
    Ok(HttpResponse {
        status,
        body: vec![],
    })
}

pub fn make_target_with(
    paper_id: &str,
    doi: Option<&str>,
    candidate_urls: Vec<String>,
) -> AcquisitionTarget {
    AcquisitionTarget {
        paper_id: paper_id.to_string(),
        doi: doi.map(String::from),
        title: format!("Paper {paper_id}"),
        year: Some(2024),
        authors: "Doe".to_string(),
        cited_by_count: 0,
        relevance_score: 0.0,
        venue: None,
        open_access_status: None,
        abstract_text: None,
        candidate_urls,
    }
}
