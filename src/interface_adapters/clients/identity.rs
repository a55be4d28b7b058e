use crate::domain::ports::IdentityVerifier;
use crate::domain::{IdentityError, RoomId, Verification};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct VerifyVisitorRequest<'a> {
    room_id: &'a str,
    credentials: &'a HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct VerifyVisitorResponse {
    authorized: bool,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    identity_id: Option<String>,
}

// Thin reqwest client for visitor verification.
#[derive(Clone)]
pub struct HttpIdentityClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpIdentityClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityClient {
    async fn verify(
        &self,
        room_id: &RoomId,
        credentials: &HashMap<String, String>,
    ) -> Result<Verification, IdentityError> {
        let url = format!("{}/visitors/verify", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&VerifyVisitorRequest {
                room_id: room_id.as_str(),
                credentials,
            })
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let body = response
                    .json::<VerifyVisitorResponse>()
                    .await
                    .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
                Ok(Verification {
                    authorized: body.authorized,
                    display_name: body.display_name,
                    identity_id: body.identity_id,
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(IdentityError::Rejected),
            status => Err(IdentityError::Unavailable(format!("status {status}"))),
        }
    }
}

/// Lets every visitor play. Used when no identity service is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllVerifier;

#[async_trait]
impl IdentityVerifier for AllowAllVerifier {
    async fn verify(
        &self,
        _room_id: &RoomId,
        credentials: &HashMap<String, String>,
    ) -> Result<Verification, IdentityError> {
        Ok(Verification {
            authorized: true,
            display_name: credentials.get("displayName").cloned(),
            identity_id: credentials.get("visitorId").cloned(),
        })
    }
}
