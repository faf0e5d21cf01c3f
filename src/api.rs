//! Typed client for the banking backend REST API.

use crate::api_types::{Auth, CurrencyBuyRequest, LoginPayload, LoginRequest, TransferRequest};
use crate::error::ApiError;
use crate::http_utils::into_payload;
use crate::settings::ApiConfig;
use crate::storage::Storage;
use crate::types::account::Account;
use crate::types::bank::Bank;
use crate::types::currency::{Currency, CurrencyBalance};
use reqwest::header::AUTHORIZATION;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

pub type CurrencyBalances = BTreeMap<String, CurrencyBalance>;

pub struct BankApi<S> {
    http: reqwest::Client,
    base_url: String,
    storage: S,
}

impl<S: Storage> BankApi<S> {
    pub fn new(config: &ApiConfig, storage: S) -> Result<BankApi<S>, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(BankApi {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            storage,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    async fn send<T>(&mut self, request: reqwest::RequestBuilder, path: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let request = match self.storage.load_token().await? {
            Some(token) => request.header(AUTHORIZATION, Auth { token }.header_value()),
            None => request,
        };
        tracing::debug!("request {}", path);
        let result = into_payload(request.send().await?, path).await;
        if let Err(ApiError::Unauthorized) = &result {
            tracing::warn!("token rejected, dropping it");
            self.storage.clear_token().await?;
        }
        result
    }

    /// Backend URL with `segments` appended, each percent-encoded as one path segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let invalid =
            |reason: String| ApiError::InvalidUrl(format!("{}: {}", self.base_url, reason));
        let mut url = Url::parse(&self.base_url).map_err(|err| invalid(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("cannot carry a path".to_owned()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T>(&mut self, segments: &[&str]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        let path = url.path().to_owned();
        let request = self.http.get(url);
        self.send(request, &path).await
    }

    async fn post<B, T>(&mut self, segments: &[&str], body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        let path = url.path().to_owned();
        let mut request = self.http.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request, &path).await
    }

    /// Exchanges credentials for a token and keeps it for later requests.
    pub async fn login(&mut self, login: &str, password: &str) -> Result<(), ApiError> {
        let payload: LoginPayload = self
            .post(&["login"], Some(&LoginRequest { login, password }))
            .await?;
        let token = payload
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::MissingPayload("/login".to_owned()))?;
        self.storage.save_token(&token).await?;
        tracing::info!("logged in as {}", login);
        Ok(())
    }

    pub async fn logout(&mut self) -> Result<(), ApiError> {
        self.storage.clear_token().await?;
        Ok(())
    }

    pub async fn accounts(&mut self) -> Result<Vec<Account>, ApiError> {
        self.get(&["accounts"]).await
    }

    pub async fn account(&mut self, id: &str) -> Result<Account, ApiError> {
        self.get(&["account", id]).await
    }

    pub async fn create_account(&mut self) -> Result<Account, ApiError> {
        self.post::<(), _>(&["create-account"], None).await
    }

    pub async fn transfer_funds(
        &mut self,
        from: &str,
        to: &str,
        amount: f64,
    ) -> Result<Account, ApiError> {
        let account = self
            .post(&["transfer-funds"], Some(&TransferRequest { from, to, amount }))
            .await?;
        tracing::info!("transferred {} from {} to {}", amount, from, to);
        Ok(account)
    }

    pub async fn all_currencies(&mut self) -> Result<Vec<Currency>, ApiError> {
        self.get(&["all-currencies"]).await
    }

    pub async fn currencies(&mut self) -> Result<CurrencyBalances, ApiError> {
        self.get(&["currencies"]).await
    }

    pub async fn buy_currency(
        &mut self,
        from: &Currency,
        to: &Currency,
        amount: f64,
    ) -> Result<CurrencyBalances, ApiError> {
        self.post(&["currency-buy"], Some(&CurrencyBuyRequest { from, to, amount }))
            .await
    }

    pub async fn banks(&mut self) -> Result<Vec<Bank>, ApiError> {
        self.get(&["banks"]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_backend::{self, ACCOUNT, TOKEN};
    use crate::storage::InmemoryStorage;

    async fn client() -> BankApi<InmemoryStorage> {
        let base_url = mock_backend::spawn().await;
        let config = ApiConfig {
            base_url,
            feed_url: String::new(),
            timeout_secs: 5,
        };
        BankApi::new(&config, InmemoryStorage::new()).unwrap()
    }

    async fn logged_in() -> BankApi<InmemoryStorage> {
        let mut api = client().await;
        api.login("developer", "skillbox").await.unwrap();
        api
    }

    #[tokio::test]
    async fn login_stores_token() {
        let api = logged_in().await;
        assert_eq!(
            api.storage().load_token().await.unwrap().as_deref(),
            Some(TOKEN)
        );
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let mut api = client().await;
        let err = api.login("developer", "wrong").await.unwrap_err();
        assert_eq!(err.user_message(), "Invalid password");
        assert_eq!(api.storage().load_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn accounts_need_token() {
        let mut api = client().await;
        assert!(matches!(api.accounts().await, Err(ApiError::Unauthorized)));

        let mut api = logged_in().await;
        let accounts = api.accounts().await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert!(accounts.iter().all(|a| a.mine));
    }

    #[tokio::test]
    async fn unauthorized_drops_stale_token() {
        let mut api = client().await;
        api.storage_mut().save_token("expired").await.unwrap();
        assert!(matches!(api.accounts().await, Err(ApiError::Unauthorized)));
        assert_eq!(api.storage().load_token().await.unwrap(), None);
    }

    #[tokio::test]
    async fn account_details_and_not_found() {
        let mut api = logged_in().await;
        let account = api.account(ACCOUNT).await.unwrap();
        assert_eq!(account.account, ACCOUNT);
        assert_eq!(account.transactions.len(), 3);

        let err = api.account("00000").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.user_message(), "Not found");
    }

    #[tokio::test]
    async fn transfer_and_overdraft() {
        let mut api = logged_in().await;
        let account = api
            .transfer_funds(ACCOUNT, "61253747452820828268825011", 100.0)
            .await
            .unwrap();
        assert_eq!(account.balance, 900.0);

        let err = api
            .transfer_funds(ACCOUNT, "61253747452820828268825011", 5000.0)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Overdraft prevented");
    }

    #[tokio::test]
    async fn create_account_returns_new_account() {
        let mut api = logged_in().await;
        let account = api.create_account().await.unwrap();
        assert_eq!(account.balance, 0.0);
        assert!(account.transactions.is_empty());
    }

    #[tokio::test]
    async fn currencies_and_exchange() {
        let mut api = logged_in().await;
        let all = api.all_currencies().await.unwrap();
        assert!(all.iter().any(|c| c.code() == "BTC"));

        let balances = api.currencies().await.unwrap();
        assert_eq!(balances["USD"].amount, 100.0);

        let usd = Currency::parse("USD").unwrap();
        let eur = Currency::parse("EUR").unwrap();
        let after = api.buy_currency(&usd, &eur, 10.0).await.unwrap();
        assert_eq!(after["USD"].amount, 90.0);
        assert_eq!(after["EUR"].amount, 10.0);
    }

    #[tokio::test]
    async fn server_error_is_classified() {
        let mut api = logged_in().await;
        let err = api.banks().await.unwrap_err();
        assert!(matches!(err, ApiError::Server(500)));
        assert_eq!(err.user_message(), "Server error, try again later");
    }

    #[test]
    fn account_id_stays_one_path_segment() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:3000/api/".to_owned(),
            feed_url: String::new(),
            timeout_secs: 5,
        };
        let api = BankApi::new(&config, InmemoryStorage::new()).unwrap();
        let url = api.endpoint(&["account", "12345/../banks?x=1"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:3000/api/account/12345%2F..%2Fbanks%3Fx=1"
        );
        assert_eq!(
            api.endpoint(&["accounts"]).unwrap().as_str(),
            "http://127.0.0.1:3000/api/accounts"
        );
    }

    #[tokio::test]
    async fn id_with_separators_is_not_rerouted() {
        let mut api = logged_in().await;
        let err = api.account("../banks").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn bad_base_url() {
        let config = ApiConfig {
            base_url: "not a url".to_owned(),
            feed_url: String::new(),
            timeout_secs: 5,
        };
        let api = BankApi::new(&config, InmemoryStorage::new()).unwrap();
        assert!(matches!(api.endpoint(&["accounts"]), Err(ApiError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn unreachable_backend() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:1".to_owned(),
            feed_url: String::new(),
            timeout_secs: 2,
        };
        let mut api = BankApi::new(&config, InmemoryStorage::new()).unwrap();
        let err = api.accounts().await.unwrap_err();
        assert_eq!(err.user_message(), "Could not connect to the server");
    }
}
