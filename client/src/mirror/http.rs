use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::MirrorError;
use crate::mirror::models::{
    AcceptOffer, ApiError, Comment, Loan, LoanOffer, LoanRequest, NewComment, PlatformStats,
};
use crate::mirror::{Mirror, MirrorUpdate};
use crate::tokens::TokenRegistry;

/// JSON client for the marketplace service
#[derive(Clone, Debug)]
pub struct HttpMirror {
    client: Client,
    base_url: String,
    tokens: TokenRegistry,
}

impl HttpMirror {
    /// `base_url` includes the API prefix, e.g. `http://localhost:8080/api/v1`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens: TokenRegistry::with_known_tokens(),
        }
    }

    pub fn with_tokens(mut self, tokens: TokenRegistry) -> Self {
        self.tokens = tokens;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, MirrorError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            return Err(MirrorError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, MirrorError> {
        debug!("GET {}", path);
        Self::decode(self.client.get(self.url(path)).send().await?).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, MirrorError> {
        debug!("POST {}", path);
        Self::decode(self.client.post(self.url(path)).json(body).send().await?).await
    }

    pub async fn offers(&self) -> Result<Vec<LoanOffer>, MirrorError> {
        self.get("/offers/").await
    }

    pub async fn offer(&self, id: &str) -> Result<LoanOffer, MirrorError> {
        self.get(&format!("/offers/{id}")).await
    }

    pub async fn requests(&self) -> Result<Vec<LoanRequest>, MirrorError> {
        self.get("/requests/").await
    }

    pub async fn stats(&self) -> Result<PlatformStats, MirrorError> {
        self.get("/stats").await
    }

    pub async fn user_loans(&self, address: &str) -> Result<Vec<Loan>, MirrorError> {
        self.get(&format!("/users/{address}/loans")).await
    }

    pub async fn user_requests(&self, address: &str) -> Result<Vec<LoanRequest>, MirrorError> {
        self.get(&format!("/users/{address}/requests")).await
    }

    pub async fn comments(&self, offer_id: &str) -> Result<Vec<Comment>, MirrorError> {
        self.get(&format!("/offers/{offer_id}/comments")).await
    }

    pub async fn post_comment(
        &self,
        offer_id: &str,
        comment: &NewComment,
    ) -> Result<Comment, MirrorError> {
        self.post(&format!("/offers/{offer_id}/comments"), comment)
            .await
    }
}

#[async_trait]
impl Mirror for HttpMirror {
    async fn record(&self, update: &MirrorUpdate) -> Result<(), MirrorError> {
        match update {
            MirrorUpdate::OfferCreated {
                offer,
                lender,
                token_mint,
                amount,
                apy,
                duration_days,
                ..
            } => {
                let symbol = self.tokens.symbol(token_mint);
                let body = LoanOffer {
                    offer_address: Some(offer.to_string()),
                    lender_address: Some(lender.to_string()),
                    amount: Some(*amount),
                    apy: Some(*apy),
                    token: Some(symbol.clone()),
                    duration: Some(*duration_days),
                    is_active: Some(true),
                    loan_mint: Some(token_mint.to_string()),
                    loan_name: Some(symbol),
                    loan_amount: Some(*amount),
                    ..LoanOffer::default()
                };
                let _: LoanOffer = self.post("/offers/", &body).await?;
            }
            MirrorUpdate::LoanAccepted {
                offer,
                loan,
                borrower,
                ..
            } => {
                let body = AcceptOffer {
                    loan_address: loan.to_string(),
                    borrower_address: borrower.to_string(),
                };
                let _: serde_json::Value =
                    self.post(&format!("/offers/{offer}/accept"), &body).await?;
            }
            other => {
                debug!(
                    "No mirror endpoint for update {}; skipping",
                    other.signature()
                );
            }
        }
        Ok(())
    }
}
