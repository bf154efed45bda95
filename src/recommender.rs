use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    error::{AppError, AppResult},
    models::Recommendation,
};

const RECOMMENDATION_COUNT: usize = 5;

/// Client for a Gemini-style `generateContent` endpoint.
pub struct Recommender {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl Recommender {
    pub fn new(client: reqwest::Client, api_key: String, base_url: String, model: String) -> Self {
        if api_key.trim().is_empty() {
            warn!("recommendations disabled - no GENAI_API_KEY provided");
        }
        Self { client, api_key, base_url: base_url.trim_end_matches('/').to_string(), model }
    }

    pub fn is_enabled(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub async fn recommend(&self, watchlist_titles: &[String]) -> AppResult<Vec<Recommendation>> {
        if !self.is_enabled() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: vec![Content { parts: vec![Part { text: build_prompt(watchlist_titles) }] }],
        };

        let resp: GenerateResponse = self
            .client
            .post(url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default();

        let recs = parse_recommendations(&text)?;
        debug!(count = recs.len(), "parsed recommendations");
        Ok(recs)
    }
}

pub fn build_prompt(watchlist_titles: &[String]) -> String {
    let mut prompt = format!(
        "Provide a JSON array of {RECOMMENDATION_COUNT} movie recommendations. \
         Each recommendation should include the following fields: \
         title, description, posterUrl, and showId. "
    );

    if !watchlist_titles.is_empty() {
        prompt.push_str(
            "Base them on the taste shown by this watchlist and do not repeat any of its titles: ",
        );
        prompt.push_str(&watchlist_titles.join("; "));
        prompt.push_str(". ");
    }

    prompt.push_str("Return only the JSON array without any additional text.");
    prompt
}

/// Pulls the first parseable recommendation array out of model output, tolerating
/// code fences, chatter and stray brackets before or after it.
pub fn parse_recommendations(text: &str) -> AppResult<Vec<Recommendation>> {
    let mut empty = None;

    for (start, _) in text.match_indices('[') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<Vec<Recommendation>>();
        match stream.next() {
            Some(Ok(recs)) if recs.is_empty() => empty = Some(recs),
            Some(Ok(recs)) => {
                return Ok(recs.into_iter().filter(|r| !r.title.trim().is_empty()).collect());
            },
            _ => {},
        }
    }

    empty.ok_or_else(|| AppError::Internal("no recommendation array in model output".to_string()))
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize, Serialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}
