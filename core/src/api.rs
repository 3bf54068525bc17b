//! Session-aware facade over `WarehouseClient`.
//!
//! # Design
//! `WarehouseApi` owns everything one UI session needs: configuration,
//! the stateless client, a transport, token storage, a token decoder and the
//! `Session`. Each endpoint method checks the session, builds the request,
//! dispatches it once, and parses it. Session side effects happen here:
//! a 403 from any endpoint clears the persisted token before the error is
//! returned, and a successful login persists the new one. Navigation is
//! left to the caller via `ApiError::navigation()` and the returned
//! `Navigation` values.

use tracing::{debug, info, warn};

use crate::client::WarehouseClient;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::jwt::{TokenDecoder, UnverifiedJwtDecoder};
use crate::navigation::Navigation;
use crate::session::Session;
use crate::storage::TokenStore;
use crate::transport::Transport;
use crate::types::{
    ChangePassword, CheckItemRequest, CheckItemResult, Job, JobStatusUpdate, JobsStatusUpdate,
    LoginPayload, Stock,
    TaskDetail, TaskProgress, TaskSummary, User,
};

pub struct WarehouseApi<T, S, D = UnverifiedJwtDecoder> {
    config: ClientConfig,
    client: WarehouseClient,
    transport: T,
    store: S,
    decoder: D,
    session: Session,
    current_path: String,
}

impl<T: Transport, S: TokenStore> WarehouseApi<T, S, UnverifiedJwtDecoder> {
    pub fn new(config: ClientConfig, transport: T, store: S) -> Self {
        Self::with_decoder(config, transport, store, UnverifiedJwtDecoder)
    }
}

impl<T: Transport, S: TokenStore, D: TokenDecoder> WarehouseApi<T, S, D> {
    pub fn with_decoder(config: ClientConfig, transport: T, store: S, decoder: D) -> Self {
        let client = WarehouseClient::new(&config.base_url);
        let current_path = config.home_path.clone();
        Self {
            config,
            client,
            transport,
            store,
            decoder,
            session: Session::new(),
            current_path,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.user()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The view the caller is currently showing. Requests made from the
    /// login view are allowed to go out without a token.
    pub fn set_current_path(&mut self, path: impl Into<String>) {
        self.current_path = path.into();
    }

    /// Pick up a token persisted by an earlier session, if any.
    /// Returns true when a token was found.
    pub fn restore(&mut self) -> bool {
        if !self.session.is_authenticated() {
            if let Some(token) = self.store.get(&self.config.token_key).filter(|t| !t.is_empty()) {
                self.session = Session::with_token(token);
            }
        }
        self.session.decode_identity(&self.decoder);
        self.session.is_authenticated()
    }

    pub fn logout(&mut self) -> Result<Navigation, ApiError> {
        info!("logging out");
        self.session.clear(&mut self.store, &self.config.token_key)
    }

    fn ensure_session(&mut self) -> Result<(), ApiError> {
        self.session.ensure_token(
            &self.store,
            &self.config.token_key,
            &self.current_path,
            &self.config.login_path,
            &self.decoder,
        )
    }

    fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        debug!(method = request.method.as_str(), path = %request.path, "dispatching request");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, "response received");
        Ok(response)
    }

    /// Clears the session when a parsed response turned out to be a 403.
    fn settle<R>(&mut self, result: Result<R, ApiError>) -> Result<R, ApiError> {
        if let Err(ApiError::AuthExpired) = &result {
            warn!("backend rejected session token, clearing session");
            if let Err(err) = self.session.clear(&mut self.store, &self.config.token_key) {
                warn!(error = %err, "failed to remove persisted token");
            }
        }
        result
    }

    pub fn fetch_stocks(&mut self) -> Result<Vec<Stock>, ApiError> {
        self.ensure_session()?;
        let request = self.client.build_fetch_stocks(&self.session);
        let response = self.dispatch(request)?;
        let result = self.client.parse_fetch_stocks(response);
        self.settle(result)
    }

    pub fn fetch_tasks_list(&mut self, stock_id: i64) -> Result<Vec<TaskSummary>, ApiError> {
        self.ensure_session()?;
        let request = self.client.build_fetch_tasks_list(&self.session, stock_id);
        let response = self.dispatch(request)?;
        let result = self.client.parse_fetch_tasks_list(response);
        self.settle(result)
    }

    pub fn fetch_tasks_progress(&mut self, stock_id: i64) -> Result<Vec<TaskProgress>, ApiError> {
        self.ensure_session()?;
        let request = self.client.build_fetch_tasks_progress(&self.session, stock_id);
        let response = self.dispatch(request)?;
        let result = self.client.parse_fetch_tasks_progress(response);
        self.settle(result)
    }

    pub fn fetch_task(
        &mut self,
        stock_id: i64,
        task_id: i64,
        material_id: i64,
        tare_type: &str,
    ) -> Result<TaskDetail, ApiError> {
        self.ensure_session()?;
        let request =
            self.client
                .build_fetch_task(&self.session, stock_id, task_id, material_id, tare_type);
        let response = self.dispatch(request)?;
        let result = self.client.parse_fetch_task(response);
        self.settle(result)
    }

    pub fn update_job_status(&mut self, update: &JobStatusUpdate) -> Result<(), ApiError> {
        self.ensure_session()?;
        let request = self.client.build_update_job_status(&self.session, update)?;
        let response = self.dispatch(request)?;
        let result = self.client.parse_update_job_status(response);
        self.settle(result)
    }

    pub fn update_jobs_status(&mut self, updates: &JobsStatusUpdate) -> Result<(), ApiError> {
        self.ensure_session()?;
        let request = self.client.build_update_jobs_status(&self.session, updates)?;
        let response = self.dispatch(request)?;
        let result = self.client.parse_update_jobs_status(response);
        self.settle(result)
    }

    pub fn check_material_item(
        &mut self,
        material_id: i64,
        tara_id: i64,
        task_id: i64,
    ) -> Result<CheckItemResult, ApiError> {
        self.ensure_session()?;
        let payload = CheckItemRequest {
            material_id,
            tara_id,
            task_id,
        };
        let request = self.client.build_check_material_item(&self.session, &payload)?;
        let response = self.dispatch(request)?;
        let result = self.client.parse_check_material_item(response);
        self.settle(result)
    }

    pub fn update_rest_gross_weight(&mut self, task_id: i64, job: &Job) -> Result<(), ApiError> {
        self.ensure_session()?;
        let request = self
            .client
            .build_update_rest_gross_weight(&self.session, task_id, job)?;
        let response = self.dispatch(request)?;
        let result = self.client.parse_update_rest_gross_weight(response);
        self.settle(result)
    }

    /// Log in, persist the issued token and decode its identity.
    /// On rejection nothing is persisted and the current session is kept.
    pub fn login(&mut self, payload: &LoginPayload) -> Result<Navigation, ApiError> {
        let request = self.client.build_login(payload)?;
        let response = self.dispatch(request)?;
        let token = self.client.parse_login(response)?;
        self.session
            .establish(token, &mut self.store, &self.config.token_key, &self.decoder)?;
        info!(login = %payload.login, "logged in");
        Ok(Navigation::Home)
    }

    /// Does not require a session; the token is sent when one is held.
    pub fn change_password(&mut self, payload: &ChangePassword) -> Result<(), ApiError> {
        let request = self.client.build_change_password(&self.session, payload)?;
        let response = self.dispatch(request)?;
        let result = self.client.parse_change_password(response);
        self.settle(result)
    }
}
