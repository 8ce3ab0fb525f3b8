//! AI question generation client
//!
//! `POST /api/generate-<domain> {topic, count}` answers with an array of
//! question records. Any failure (transport error, non-2xx status, malformed
//! or empty JSON) falls back to the bundled bank; the error is logged and
//! never reaches the player.
//!
//! [`LocalGenerator`] answers the same protocol in-process from the question
//! generator; the native demo builds its bank through it.

use std::cell::RefCell;
use std::future::Future;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::GameMode;
use crate::sim::{QuestionRecord, generate, static_bank};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("endpoint answered with status {0}")]
    Status(u16),
    #[error("malformed question payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("endpoint returned no questions")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub topic: String,
    pub count: usize,
}

/// Raw HTTP answer
#[derive(Debug, Clone)]
pub struct EndpointResponse {
    pub status: u16,
    pub body: String,
}

/// Transport for the generation endpoint (a fetch/HTTP client in production)
pub trait QuestionEndpoint {
    fn post(
        &self,
        path: &str,
        body: String,
    ) -> impl Future<Output = Result<EndpointResponse, TransportError>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionSource {
    Generated,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct FetchedQuestions {
    pub records: Vec<QuestionRecord>,
    pub source: QuestionSource,
}

/// Generation service running in-process
///
/// The request topic names a game mode (`"add"`, `"mixed"`, ...); any other
/// topic gets a 400.
pub struct LocalGenerator {
    rng: RefCell<Pcg32>,
}

impl LocalGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: RefCell::new(Pcg32::seed_from_u64(seed)),
        }
    }
}

impl QuestionEndpoint for LocalGenerator {
    async fn post(&self, path: &str, body: String) -> Result<EndpointResponse, TransportError> {
        let request: GenerateRequest = serde_json::from_str(&body)?;
        let Some(mode) = GameMode::from_str(&request.topic) else {
            return Ok(EndpointResponse {
                status: 400,
                body: format!("unknown topic `{}`", request.topic),
            });
        };

        let mut rng = self.rng.borrow_mut();
        let records: Vec<QuestionRecord> = (0..request.count)
            .map(|_| {
                let operation = mode.pick_operation(&mut *rng);
                QuestionRecord::from(&generate(operation, &mut *rng))
            })
            .collect();
        log::debug!(
            "{path}: generated {} {} questions",
            records.len(),
            mode.as_str()
        );
        Ok(EndpointResponse {
            status: 200,
            body: serde_json::to_string(&records)?,
        })
    }
}

pub fn endpoint_path(domain: &str) -> String {
    format!("/api/generate-{domain}")
}

/// Accept a bare array or a `{"questions": [...]}` wrapper
#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    List(Vec<QuestionRecord>),
    Wrapped { questions: Vec<QuestionRecord> },
}

pub fn parse_response(response: EndpointResponse) -> Result<Vec<QuestionRecord>, TransportError> {
    if !(200..300).contains(&response.status) {
        return Err(TransportError::Status(response.status));
    }
    let records = match serde_json::from_str(&response.body)? {
        Payload::List(records) => records,
        Payload::Wrapped { questions } => questions,
    };
    if records.is_empty() {
        return Err(TransportError::Empty);
    }
    Ok(records)
}

/// Bundled questions for `mode`, at most `count`
pub fn fallback_questions(mode: GameMode, count: usize) -> Vec<QuestionRecord> {
    static_bank()
        .into_iter()
        .filter(|r| mode.accepts(&r.operation))
        .take(count)
        .collect()
}

async fn request_questions<E: QuestionEndpoint>(
    endpoint: &E,
    path: &str,
    request: &GenerateRequest,
) -> Result<Vec<QuestionRecord>, TransportError> {
    let body = serde_json::to_string(request)?;
    let response = endpoint.post(path, body).await?;
    parse_response(response)
}

/// Ask the endpoint for questions, falling back to the bundled bank
pub async fn fetch_questions<E: QuestionEndpoint>(
    endpoint: &E,
    domain: &str,
    mode: GameMode,
    request: &GenerateRequest,
) -> FetchedQuestions {
    let path = endpoint_path(domain);
    match request_questions(endpoint, &path, request).await {
        Ok(records) => {
            log::info!("Generated {} questions from {path}", records.len());
            FetchedQuestions {
                records,
                source: QuestionSource::Generated,
            }
        }
        Err(e) => {
            log::warn!("Generation via {path} failed ({e}), using bundled bank");
            FetchedQuestions {
                records: fallback_questions(mode, request.count),
                source: QuestionSource::Fallback,
            }
        }
    }
}
