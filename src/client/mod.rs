//! Polling HTTP client for the match routes

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::game::{ActionCommand, ArenaMap, ErrorKind, MatchId, MatchSnapshot, Side, TeamDraft};
use crate::http::protocol::{
    AckResponse, CatalogResponse, CreateMatchRequest, CreateMatchResponse, ErrorBody,
    JoinMatchRequest, SubmitActionRequest, SubmitActionResponse, SubmitMapRequest,
    SubmitTeamRequest,
};

/// Interval used by callers that have no opinion on polling cadence
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// One participant's connection to a match server
#[derive(Clone)]
pub struct MatchClient {
    client: Client,
    base_url: String,
    player_id: String,
}

impl MatchClient {
    pub fn new(base_url: impl Into<String>, player_id: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            player_id: player_id.into(),
        }
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn create_match(&self) -> Result<MatchId, ClientError> {
        let body = CreateMatchRequest {
            player_id: self.player_id.clone(),
        };
        let response: CreateMatchResponse = self.post("/matches", &body).await?;
        Ok(response.match_id)
    }

    pub async fn join_match(&self, match_id: &MatchId) -> Result<AckResponse, ClientError> {
        let body = JoinMatchRequest {
            player_id: self.player_id.clone(),
        };
        self.post(&format!("/matches/{}/join", match_id), &body).await
    }

    pub async fn submit_team(
        &self,
        match_id: &MatchId,
        team: &TeamDraft,
    ) -> Result<AckResponse, ClientError> {
        let body = SubmitTeamRequest {
            player_id: self.player_id.clone(),
            team: team.clone(),
        };
        self.post(&format!("/matches/{}/team", match_id), &body).await
    }

    pub async fn submit_map(
        &self,
        match_id: &MatchId,
        map: ArenaMap,
    ) -> Result<AckResponse, ClientError> {
        let body = SubmitMapRequest {
            player_id: self.player_id.clone(),
            map: map.slug().to_string(),
        };
        self.post(&format!("/matches/{}/map", match_id), &body).await
    }

    pub async fn submit_action(
        &self,
        match_id: &MatchId,
        command: ActionCommand,
    ) -> Result<SubmitActionResponse, ClientError> {
        let body = SubmitActionRequest {
            player_id: self.player_id.clone(),
            command,
        };
        self.post(&format!("/matches/{}/actions", match_id), &body)
            .await
    }

    /// Fetch the match as seen by this participant
    pub async fn state(&self, match_id: &MatchId) -> Result<MatchSnapshot, ClientError> {
        let request = self
            .client
            .get(self.url(&format!("/matches/{}", match_id)))
            .query(&[("player_id", self.player_id.as_str())]);
        self.send(request).await
    }

    pub async fn catalog(&self) -> Result<CatalogResponse, ClientError> {
        self.send(self.client.get(self.url("/catalog"))).await
    }

    /// Poll the match until `predicate` holds, returning the satisfying snapshot
    pub async fn wait_for<F>(
        &self,
        match_id: &MatchId,
        interval: Duration,
        timeout: Duration,
        mut predicate: F,
    ) -> Result<MatchSnapshot, ClientError>
    where
        F: FnMut(&MatchSnapshot) -> bool,
    {
        let poll = async {
            loop {
                let snapshot = self.state(match_id).await?;
                if predicate(&snapshot) {
                    return Ok(snapshot);
                }
                debug!(
                    match_id = %match_id,
                    phase = %snapshot.phase,
                    "Condition not met, polling again"
                );
                tokio::time::sleep(interval).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| ClientError::Timeout(timeout))?
    }

    /// Wait until it is `side`'s turn or the match has finished
    pub async fn wait_for_turn(
        &self,
        match_id: &MatchId,
        side: Side,
        interval: Duration,
        timeout: Duration,
    ) -> Result<MatchSnapshot, ClientError> {
        self.wait_for(match_id, interval, timeout, |s| {
            s.is_turn_of(side) || s.outcome.is_some()
        })
        .await
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ClientError> {
        self.send(self.client.post(self.url(path)).json(body)).await
    }

    async fn send<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R, ClientError> {
        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<ErrorBody>(&text) {
                Ok(body) => ClientError::Api {
                    status,
                    kind: body.kind,
                    message: body.error,
                },
                Err(_) => ClientError::Api {
                    status,
                    kind: ErrorKind::Internal,
                    message: text,
                },
            });
        }

        Ok(response.json().await?)
    }
}

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error (status {status}, {kind:?}): {message}")]
    Api {
        status: u16,
        kind: ErrorKind,
        message: String,
    },

    #[error("Timed out after {0:?} waiting for match state")]
    Timeout(Duration),
}

impl ClientError {
    /// Server-side error kind, when the server answered
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ClientError::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = MatchClient::new("http://localhost:8080/", "p1");
        assert_eq!(client.url("/matches"), "http://localhost:8080/matches");
        assert_eq!(client.player_id(), "p1");
    }

    #[test]
    fn only_api_errors_carry_a_kind() {
        let err = ClientError::Api {
            status: 409,
            kind: ErrorKind::InvalidPhase,
            message: "finished".into(),
        };
        assert_eq!(err.kind(), Some(ErrorKind::InvalidPhase));
        assert_eq!(ClientError::Timeout(Duration::from_secs(1)).kind(), None);
    }
}
