use async_trait::async_trait;
use ledgersync_core::{AccountId, DateRange, LedgerAccount, Money, NormalizedTransaction, RemoteTransaction};
use ledgersync_reconcile::{LedgerClient, LedgerError};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::dto::{
    flatten_error, AssetsResponse, BalanceUpdate, ErrorBody, InsertRequest, InsertResponse,
    MeResponse, NewTransaction, TransactionsPage,
};

const PAGE_SIZE: usize = 500;

/// [`LedgerClient`] over the ledger's HTTP API.
#[derive(Clone)]
pub struct HttpLedger {
    http_client: Client,
    base_url: String,
    token: String,
}

impl std::fmt::Debug for HttpLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpLedger")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl HttpLedger {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self, LedgerError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ledgersync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LedgerError::Transient(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Name of the user the token belongs to. Doubles as a credentials check.
    pub async fn me(&self) -> Result<String, LedgerError> {
        let me: MeResponse = self.get_json(self.request(reqwest::Method::GET, "/v1/me")).await?;
        Ok(me
            .user_name
            .or(me.user_email)
            .or(me.budget_name)
            .unwrap_or_else(|| "unknown user".to_string()))
    }

    fn request(&self, method: reqwest::Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, LedgerError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = ErrorBody::describe(&body);
        debug!("Ledger returned {status}: {message}");
        Err(status_error(status, message))
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, LedgerError> {
        self.send(request)
            .await?
            .json()
            .await
            .map_err(|e| LedgerError::Decode(e.to_string()))
    }

    async fn assets(&self) -> Result<Vec<LedgerAccount>, LedgerError> {
        let response: AssetsResponse = self
            .get_json(self.request(reqwest::Method::GET, "/v1/assets"))
            .await?;
        Ok(response.assets.into_iter().map(LedgerAccount::from).collect())
    }
}

fn transport_error(e: reqwest::Error) -> LedgerError {
    if e.is_decode() {
        LedgerError::Decode(e.to_string())
    } else {
        LedgerError::Transient(e.to_string())
    }
}

fn status_error(status: StatusCode, message: String) -> LedgerError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LedgerError::Unauthorized(message),
        s if s.is_server_error()
            || s == StatusCode::TOO_MANY_REQUESTS
            || s == StatusCode::REQUEST_TIMEOUT =>
        {
            LedgerError::Transient(format!("{status}: {message}"))
        }
        s => LedgerError::Rejected {
            status: s.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl LedgerClient for HttpLedger {
    async fn list_accounts(&self) -> Result<Vec<LedgerAccount>, LedgerError> {
        self.assets().await
    }

    async fn list_transactions(
        &self,
        account: AccountId,
        window: DateRange,
    ) -> Result<Vec<RemoteTransaction>, LedgerError> {
        let mut transactions = Vec::new();
        let mut offset = 0;
        loop {
            let request = self.request(reqwest::Method::GET, "/v1/transactions").query(&[
                ("asset_id", account.0.to_string()),
                ("start_date", window.start.to_string()),
                ("end_date", window.end.to_string()),
                ("offset", offset.to_string()),
                ("limit", PAGE_SIZE.to_string()),
            ]);
            let page: TransactionsPage = self.get_json(request).await?;
            let fetched = page.transactions.len();
            transactions.extend(page.transactions.into_iter().map(|t| t.into_remote(account)));
            offset += fetched;
            if !page.has_more || fetched == 0 {
                break;
            }
        }
        debug!("Account {account}: {} transactions between {window}", transactions.len());
        Ok(transactions)
    }

    async fn create_transactions(
        &self,
        account: AccountId,
        batch: &[NormalizedTransaction],
    ) -> Result<usize, LedgerError> {
        if batch.is_empty() {
            return Ok(0);
        }
        let body = InsertRequest {
            transactions: batch
                .iter()
                .map(|t| NewTransaction {
                    date: t.date,
                    amount: t.amount.to_plain_string(),
                    payee: &t.payee,
                    notes: t.notes.as_deref(),
                    asset_id: account.0,
                    external_id: t.external_id.as_str(),
                    status: "uncleared",
                })
                .collect(),
            apply_rules: true,
            // rows are matched by external_id; identical-looking rows are distinct
            skip_duplicates: false,
            check_for_recurring: true,
            debit_as_negative: true,
            skip_balance_update: false,
        };

        let response: InsertResponse = self
            .get_json(self.request(reqwest::Method::POST, "/v1/transactions").json(&body))
            .await?;
        if let Some(error) = response.error {
            return Err(LedgerError::Rejected {
                status: StatusCode::OK.as_u16(),
                message: flatten_error(&error),
            });
        }
        Ok(response.ids.len())
    }

    async fn get_balance(&self, account: AccountId) -> Result<Money, LedgerError> {
        self.assets()
            .await?
            .into_iter()
            .find(|a| a.id == account)
            .map(|a| a.balance)
            .ok_or_else(|| LedgerError::Rejected {
                status: StatusCode::NOT_FOUND.as_u16(),
                message: format!("account {account} not found"),
            })
    }

    async fn update_balance(&self, account: AccountId, balance: Money) -> Result<(), LedgerError> {
        let body = BalanceUpdate {
            balance: balance.to_plain_string(),
        };
        self.send(
            self.request(reqwest::Method::PUT, &format!("/v1/assets/{}", account.0))
                .json(&body),
        )
        .await?;
        Ok(())
    }
}
