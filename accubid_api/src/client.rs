//! HTTP client for the Accubid Anywhere REST API.

use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;

use crate::{
    auth::TokenProvider,
    config::{ApiClientConfig, Environment},
    endpoints::Endpoint,
    response::ApiResponse,
    retry::{RetryOutcome, RetryPolicy},
    types::PaginatedResponse,
    Error,
};

/// HTTP client for the Accubid Anywhere REST API.
///
/// Every call obtains a bearer token from the configured [`TokenProvider`],
/// then runs through the [`RetryPolicy`], and finally decodes the last
/// response into an [`ApiResponse`]. A non-2xx status is never an `Err`;
/// callers branch on [`ApiResponse::is_successful`]. `Err` means the request
/// could not be completed at all.
///
/// Cloning is cheap and clones share the underlying connection pool.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    /// Always ends with `/` so relative templates join beneath it.
    base_url: Url,
    auth: Arc<dyn TokenProvider>,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Creates a client for one of the hosted Accubid environments.
    pub fn new(
        config: &ApiClientConfig,
        environment: Environment,
        auth: Arc<dyn TokenProvider>,
    ) -> Result<Self, Error> {
        Self::with_base_url(environment.base_url(), config, auth)
    }

    /// Creates a client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(
        base_url: &str,
        config: &ApiClientConfig,
        auth: Arc<dyn TokenProvider>,
    ) -> Result<Self, Error> {
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base).map_err(|e| {
            tracing::error!("Invalid base URL {}: {}", base_url, e);
            Error::InvalidUrl(e)
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::Transport(e)
            })?;

        Ok(Self {
            http,
            base_url,
            auth,
            retry: config.retry_policy(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    fn get_url(&self, relative_url: &str) -> Result<Url, Error> {
        self.base_url
            .join(relative_url.trim_start_matches('/'))
            .map_err(|e| {
                tracing::error!("Invalid URL constructed from {}: {}", relative_url, e);
                Error::InvalidUrl(e)
            })
    }

    /// Absolute URL of a paginated list request.
    pub fn records_url<I, K, V>(
        &self,
        relative_url: &str,
        page: i64,
        extra_params: I,
    ) -> Result<Url, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut url = self.get_url(relative_url)?;
        let params = build_query(page, extra_params);
        url.query_pairs_mut().extend_pairs(params.iter());
        Ok(url)
    }

    async fn send<T>(
        &self,
        method: Method,
        url: Url,
        body: Option<Vec<u8>>,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>, Error>
    where
        T: DeserializeOwned,
    {
        let span = tracing::info_span!("request", method = %method, url = %url);
        async move {
            // a token failure ends the call before any retry attempt is spent
            let token = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                token = self.auth.bearer_token(cancel) => token?,
            };

            let outcome = self
                .retry
                .execute(cancel, |_| {
                    let mut request = self
                        .http
                        .request(method.clone(), url.clone())
                        .bearer_auth(&token)
                        .header(ACCEPT, "application/json");
                    if let Some(body) = &body {
                        request = request
                            .header(CONTENT_TYPE, "application/json")
                            .body(body.clone());
                    }
                    request.send()
                })
                .await;

            let response = match outcome {
                RetryOutcome::Success(response) | RetryOutcome::FailedResponse(response) => {
                    response
                }
                RetryOutcome::Exhausted(e) => {
                    tracing::error!("Failed to get resource: {}", e);
                    return Err(Error::Transport(e));
                }
                RetryOutcome::Cancelled => return Err(Error::Cancelled),
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Error::Cancelled),
                response = ApiResponse::from_response(response) => response,
            }
        }
        .instrument(span)
        .await
    }

    /// Issues a GET and decodes a successful body as `T`.
    pub async fn get<T>(
        &self,
        relative_url: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>, Error>
    where
        T: DeserializeOwned,
    {
        let url = self.get_url(relative_url)?;
        self.send(Method::GET, url, None, cancel).await
    }

    /// Issues a POST with a JSON body and decodes a successful body as `Resp`.
    pub async fn post<Req, Resp>(
        &self,
        relative_url: &str,
        body: &Req,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<Resp>, Error>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = self.get_url(relative_url)?;
        let body = serde_json::to_vec(body)?;
        self.send(Method::POST, url, Some(body), cancel).await
    }

    /// Fetches one page of a paginated list.
    ///
    /// `page` is sent first; `extra_params` follow in order, a repeated key
    /// replacing the earlier value.
    pub async fn get_records<T, I, K, V>(
        &self,
        relative_url: &str,
        page: i64,
        extra_params: I,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<PaginatedResponse<T>>, Error>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let url = self.records_url(relative_url, page, extra_params)?;
        self.send(Method::GET, url, None, cancel).await
    }

    async fn get_endpoint<T>(
        &self,
        endpoint: Endpoint<'_>,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>, Error>
    where
        T: DeserializeOwned,
    {
        self.get(&endpoint.path(), cancel).await
    }

    /// Fetches the identity of the authenticated user.
    pub async fn get_me<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>, Error> {
        self.get_endpoint(Endpoint::Me, cancel).await
    }

    /// Fetches the cost distribution of a contract.
    pub async fn get_contract_cost_distribution<T: DeserializeOwned>(
        &self,
        database_token: &str,
        contract_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<Vec<T>>, Error> {
        self.get_endpoint(
            Endpoint::ContractCostDistribution {
                database_token,
                contract_id,
            },
            cancel,
        )
        .await
    }

    /// Fetches the contracts of a project.
    pub async fn get_contracts<T: DeserializeOwned>(
        &self,
        database_token: &str,
        project_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<Vec<T>>, Error> {
        self.get_endpoint(
            Endpoint::Contracts {
                database_token,
                project_id,
            },
            cancel,
        )
        .await
    }

    /// Fetches a single proposed change order.
    pub async fn get_pco<T: DeserializeOwned>(
        &self,
        database_token: &str,
        pco_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>, Error> {
        self.get_endpoint(
            Endpoint::Pco {
                database_token,
                pco_id,
            },
            cancel,
        )
        .await
    }

    /// Fetches the proposed change orders of a contract.
    pub async fn get_pcos<T: DeserializeOwned>(
        &self,
        database_token: &str,
        contract_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<Vec<T>>, Error> {
        self.get_endpoint(
            Endpoint::Pcos {
                database_token,
                contract_id,
            },
            cancel,
        )
        .await
    }

    pub async fn get_contract_quote_labels<T: DeserializeOwned>(
        &self,
        database_token: &str,
        contract_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<Vec<T>>, Error> {
        self.get_endpoint(
            Endpoint::ContractQuoteLabels {
                database_token,
                contract_id,
            },
            cancel,
        )
        .await
    }

    pub async fn get_contract_statuses<T: DeserializeOwned>(
        &self,
        database_token: &str,
        contract_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<Vec<T>>, Error> {
        self.get_endpoint(
            Endpoint::ContractStatuses {
                database_token,
                contract_id,
            },
            cancel,
        )
        .await
    }

    pub async fn get_contract_subcontract_labels<T: DeserializeOwned>(
        &self,
        database_token: &str,
        contract_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<Vec<T>>, Error> {
        self.get_endpoint(
            Endpoint::ContractSubcontractLabels {
                database_token,
                contract_id,
            },
            cancel,
        )
        .await
    }

    /// Fetches final price details for a bid summary.
    pub async fn get_final_price<T: DeserializeOwned>(
        &self,
        database_token: &str,
        bid_summary_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>, Error> {
        self.get_endpoint(
            Endpoint::FinalPrice {
                database_token,
                bid_summary_id,
            },
            cancel,
        )
        .await
    }

    /// Fetches every database the authenticated user can access.
    pub async fn get_databases<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<Vec<T>>, Error> {
        self.get_endpoint(Endpoint::Databases, cancel).await
    }

    /// Fetches the estimates of a project.
    pub async fn get_estimates<T: DeserializeOwned>(
        &self,
        database_token: &str,
        project_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<Vec<T>>, Error> {
        self.get_endpoint(
            Endpoint::Estimates {
                database_token,
                project_id,
            },
            cancel,
        )
        .await
    }

    pub async fn get_estimate<T: DeserializeOwned>(
        &self,
        database_token: &str,
        estimate_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>, Error> {
        self.get_endpoint(
            Endpoint::Estimate {
                database_token,
                estimate_id,
            },
            cancel,
        )
        .await
    }

    /// Fetches estimates due between two `yyyyMMdd` dates.
    pub async fn get_estimates_by_due_date<T: DeserializeOwned>(
        &self,
        database_token: &str,
        start_date: &str,
        end_date: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<Vec<T>>, Error> {
        self.get_endpoint(
            Endpoint::EstimatesByDueDate {
                database_token,
                start_date,
                end_date,
            },
            cancel,
        )
        .await
    }

    /// Requests the extension item details file, delivered over SignalR to `connection_id`.
    pub async fn get_extension_item_details_file<T: DeserializeOwned>(
        &self,
        database_token: &str,
        estimate_id: &str,
        connection_id: &str,
        bid_summary_id: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>, Error> {
        self.get_endpoint(
            Endpoint::ExtensionItemDetailsFileSignalR {
                database_token,
                estimate_id,
                connection_id,
                bid_summary_id,
            },
            cancel,
        )
        .await
    }

    /// Sends a test SignalR notification to `connection_id`.
    pub async fn get_notification_test<T: DeserializeOwned>(
        &self,
        connection_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>, Error> {
        self.get_endpoint(Endpoint::NotificationTest { connection_id }, cancel)
            .await
    }

    pub async fn get_projects<T: DeserializeOwned>(
        &self,
        database_token: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<Vec<T>>, Error> {
        self.get_endpoint(Endpoint::Projects { database_token }, cancel)
            .await
    }

    pub async fn get_project<T: DeserializeOwned>(
        &self,
        database_token: &str,
        project_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<T>, Error> {
        self.get_endpoint(
            Endpoint::Project {
                database_token,
                project_id,
            },
            cancel,
        )
        .await
    }

    /// Fetches the recently accessed projects of a database.
    pub async fn get_last_projects<T: DeserializeOwned>(
        &self,
        database_token: &str,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse<Vec<T>>, Error> {
        self.get_endpoint(Endpoint::LastProjects { database_token }, cancel)
            .await
    }
}

/// Query pairs for a paginated request: `page` first, then `extra_params`.
///
/// A key seen again overwrites the earlier value in place, so the last write
/// wins and the first position is kept.
pub fn build_query<I, K, V>(page: i64, extra_params: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs = vec![("page".to_string(), page.to_string())];
    for (key, value) in extra_params {
        let (key, value) = (key.as_ref(), value.as_ref());
        match pairs.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value.to_string(),
            None => pairs.push((key.to_string(), value.to_string())),
        }
    }
    pairs
}
