//! Stateless request builder and response parser for the warehouse API.
//!
//! # Design
//! `WarehouseClient` holds only a `base_url`. Each endpoint is split into a
//! `build_*` method that produces an `HttpRequest` (headers come from the
//! caller's `Session`) and a `parse_*` method that applies the status
//! policy and shapes the body. Nothing here performs I/O or touches the
//! session; `WarehouseApi` wires the two halves to a transport.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::policy::{check_auth, check_created, check_login, check_ok, check_task_detail};
use crate::session::Session;
use crate::types::{
    ChangePassword, CheckItemRequest, CheckItemResult, Job, JobStatusUpdate, JobsStatusUpdate,
    LoginPayload, RestGrossWeightUpdate, Stock, TaskDetail, TaskProgress, TaskSummary,
};

#[derive(Debug, Clone)]
pub struct WarehouseClient {
    base_url: String,
}

impl WarehouseClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, session: &Session, path: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}{path}", self.base_url),
            headers: session.headers(),
            body: None,
        }
    }

    fn send_json<T: Serialize + ?Sized>(
        &self,
        session: &Session,
        method: HttpMethod,
        path: &str,
        payload: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(payload).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: session.json_headers(),
            body: Some(body),
        })
    }

    pub fn build_fetch_stocks(&self, session: &Session) -> HttpRequest {
        self.get(session, "/stocks".to_string())
    }

    pub fn build_fetch_tasks_list(&self, session: &Session, stock_id: i64) -> HttpRequest {
        self.get(session, format!("/stock/{stock_id}/tasks"))
    }

    pub fn build_fetch_tasks_progress(&self, session: &Session, stock_id: i64) -> HttpRequest {
        self.get(session, format!("/stock/{stock_id}/tasks_progress"))
    }

    pub fn build_fetch_task(
        &self,
        session: &Session,
        stock_id: i64,
        task_id: i64,
        material_id: i64,
        tare_type: &str,
    ) -> HttpRequest {
        let tare_type: String = form_urlencoded::byte_serialize(tare_type.as_bytes()).collect();
        self.get(
            session,
            format!("/stock/{stock_id}/task/{task_id}/material/{material_id}?tareType={tare_type}"),
        )
    }

    pub fn build_update_job_status(
        &self,
        session: &Session,
        update: &JobStatusUpdate,
    ) -> Result<HttpRequest, ApiError> {
        self.send_json(session, HttpMethod::Put, "/job", update)
    }

    pub fn build_update_jobs_status(
        &self,
        session: &Session,
        updates: &JobsStatusUpdate,
    ) -> Result<HttpRequest, ApiError> {
        self.send_json(session, HttpMethod::Post, "/job", updates)
    }

    pub fn build_check_material_item(
        &self,
        session: &Session,
        request: &CheckItemRequest,
    ) -> Result<HttpRequest, ApiError> {
        self.send_json(session, HttpMethod::Post, "/check_item", request)
    }

    pub fn build_update_rest_gross_weight(
        &self,
        session: &Session,
        task_id: i64,
        job: &Job,
    ) -> Result<HttpRequest, ApiError> {
        let payload = RestGrossWeightUpdate::from_job(task_id, job);
        self.send_json(session, HttpMethod::Put, "/rest_gross_weight", &payload)
    }

    /// Login never carries a token, even if one is held.
    pub fn build_login(&self, payload: &LoginPayload) -> Result<HttpRequest, ApiError> {
        self.send_json(&Session::new(), HttpMethod::Post, "/login", payload)
    }

    pub fn build_change_password(
        &self,
        session: &Session,
        payload: &ChangePassword,
    ) -> Result<HttpRequest, ApiError> {
        self.send_json(session, HttpMethod::Post, "/change_password", payload)
    }

    pub fn parse_fetch_stocks(&self, response: HttpResponse) -> Result<Vec<Stock>, ApiError> {
        check_ok(&response)?;
        parse_json(&response)
    }

    pub fn parse_fetch_tasks_list(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<TaskSummary>, ApiError> {
        check_ok(&response)?;
        parse_json(&response)
    }

    pub fn parse_fetch_tasks_progress(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<TaskProgress>, ApiError> {
        check_ok(&response)?;
        parse_json(&response)
    }

    /// Every job's `done` comes back as a strict boolean.
    pub fn parse_fetch_task(&self, response: HttpResponse) -> Result<TaskDetail, ApiError> {
        check_task_detail(&response)?;
        parse_json(&response)
    }

    pub fn parse_update_job_status(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_created(&response)
    }

    pub fn parse_update_jobs_status(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_created(&response)
    }

    /// Parses whatever the backend answered, whatever the status, apart
    /// from a 403.
    pub fn parse_check_material_item(
        &self,
        response: HttpResponse,
    ) -> Result<CheckItemResult, ApiError> {
        check_auth(&response)?;
        parse_json(&response)
    }

    pub fn parse_update_rest_gross_weight(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_created(&response)
    }

    /// Returns the issued token. The body is a JSON string.
    pub fn parse_login(&self, response: HttpResponse) -> Result<String, ApiError> {
        check_login(&response)?;
        parse_json(&response)
    }

    pub fn parse_change_password(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_created(&response)
    }
}

fn parse_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> WarehouseClient {
        WarehouseClient::new("http://localhost:3000/api")
    }

    fn session() -> Session {
        Session::with_token("abc")
    }

    fn body_json(req: &HttpRequest) -> serde_json::Value {
        serde_json::from_str(req.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn build_fetch_stocks_produces_correct_request() {
        let req = client().build_fetch_stocks(&session());
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/api/stocks");
        assert_eq!(req.headers, vec![("token".to_string(), "abc".to_string())]);
        assert!(req.body.is_none());
    }

    #[test]
    fn build_without_token_sends_no_headers() {
        let req = client().build_fetch_stocks(&Session::new());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn build_stock_scoped_requests() {
        let c = client();
        assert_eq!(
            c.build_fetch_tasks_list(&session(), 3).path,
            "http://localhost:3000/api/stock/3/tasks"
        );
        assert_eq!(
            c.build_fetch_tasks_progress(&session(), 3).path,
            "http://localhost:3000/api/stock/3/tasks_progress"
        );
    }

    #[test]
    fn build_fetch_task_encodes_tare_type() {
        let req = client().build_fetch_task(&session(), 1, 5, 2, "box & pallet");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(
            req.path,
            "http://localhost:3000/api/stock/1/task/5/material/2?tareType=box+%26+pallet"
        );
    }

    #[test]
    fn build_update_job_status_produces_correct_request() {
        let update = JobStatusUpdate {
            task_id: 5,
            material_id: 2,
            tara_id: 9,
            net_weight_fact: 120.5,
            rest_gross_weight: 300.0,
            processing_id: 1,
            done: true,
        };
        let req = client().build_update_job_status(&session(), &update).unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:3000/api/job");
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("token"), Some("abc"));
        assert_eq!(body_json(&req)["netWeightFact"], 120.5);

        let bulk = client()
            .build_update_jobs_status(&session(), &JobsStatusUpdate::from(vec![update.clone(), update]))
            .unwrap();
        assert_eq!(bulk.method, HttpMethod::Post);
        assert_eq!(bulk.path, "http://localhost:3000/api/job");
        assert_eq!(body_json(&bulk).as_array().unwrap().len(), 2);
    }

    #[test]
    fn build_check_material_item_produces_correct_request() {
        let req = client()
            .build_check_material_item(
                &session(),
                &CheckItemRequest {
                    material_id: 2,
                    tara_id: 9,
                    task_id: 5,
                },
            )
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/api/check_item");
        assert_eq!(body_json(&req), json!({ "materialID": 2, "taraID": 9, "taskID": 5 }));
    }

    #[test]
    fn build_update_rest_gross_weight_uses_job_fields() {
        let job: Job = serde_json::from_value(json!({
            "material_id": 2, "tare_id": 9, "rest_gross_weight": 80.0, "done": 1
        }))
        .unwrap();
        let req = client()
            .build_update_rest_gross_weight(&session(), 5, &job)
            .unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.path, "http://localhost:3000/api/rest_gross_weight");
        assert_eq!(body_json(&req)["gross_weight"], 80.0);
    }

    #[test]
    fn build_update_rest_gross_weight_keeps_string_values() {
        let detail = client()
            .parse_fetch_task(HttpResponse::new(
                200,
                r#"{"jobs":[{"material_id":"2","tare_id":9,"rest_gross_weight":"500.00","done":1}]}"#,
            ))
            .unwrap();
        let req = client()
            .build_update_rest_gross_weight(&session(), 5, &detail.jobs[0])
            .unwrap();
        assert_eq!(
            body_json(&req),
            json!({ "taskID": 5, "material_id": "2", "tare_id": 9, "gross_weight": "500.00" })
        );
    }

    #[test]
    fn build_login_never_sends_token() {
        let req = client()
            .build_login(&LoginPayload {
                login: "admin".to_string(),
                password: "secret".to_string(),
            })
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "http://localhost:3000/api/login");
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn build_change_password_forwards_token_when_present() {
        let payload = ChangePassword {
            login: "admin".to_string(),
            old_password: "a".to_string(),
            new_password: "b".to_string(),
        };
        let req = client().build_change_password(&session(), &payload).unwrap();
        assert_eq!(req.path, "http://localhost:3000/api/change_password");
        assert_eq!(req.header("token"), Some("abc"));

        let req = client()
            .build_change_password(&Session::new(), &payload)
            .unwrap();
        assert_eq!(req.header("token"), None);
    }

    #[test]
    fn parse_fetch_stocks_success() {
        let stocks = client()
            .parse_fetch_stocks(HttpResponse::new(200, r#"[{"id":1,"name":"Main"}]"#))
            .unwrap();
        assert_eq!(stocks.len(), 1);
        assert_eq!(stocks[0]["name"], "Main");
    }

    #[test]
    fn parse_list_endpoints_forbidden() {
        let c = client();
        assert!(matches!(
            c.parse_fetch_stocks(HttpResponse::new(403, "")),
            Err(ApiError::AuthExpired)
        ));
        assert!(matches!(
            c.parse_fetch_tasks_list(HttpResponse::new(403, "")),
            Err(ApiError::AuthExpired)
        ));
        assert!(matches!(
            c.parse_fetch_tasks_progress(HttpResponse::new(403, "")),
            Err(ApiError::AuthExpired)
        ));
    }

    #[test]
    fn parse_fetch_task_coerces_done() {
        let detail = client()
            .parse_fetch_task(HttpResponse::new(
                200,
                r#"{"id":5,"jobs":[{"done":1},{"done":0},{"done":"true"},{}]}"#,
            ))
            .unwrap();
        let done: Vec<bool> = detail.jobs.iter().map(|j| j.done).collect();
        assert_eq!(done, vec![true, false, true, false]);
    }

    #[test]
    fn parse_fetch_task_not_found_and_redirect() {
        let err = client()
            .parse_fetch_task(HttpResponse::new(404, "not found"))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));

        let err = client()
            .parse_fetch_task(HttpResponse::new(502, "bad gateway"))
            .unwrap_err();
        assert!(matches!(err, ApiError::Redirected { status: 502 }));
    }

    #[test]
    fn parse_update_job_status_surfaces_body() {
        let err = client()
            .parse_update_job_status(HttpResponse::new(400, "weight mismatch"))
            .unwrap_err();
        assert_eq!(err.to_string(), "weight mismatch");
        assert!(client()
            .parse_update_jobs_status(HttpResponse::new(201, ""))
            .is_ok());
    }

    #[test]
    fn parse_update_rest_gross_weight_requires_created() {
        let c = client();
        assert!(c.parse_update_rest_gross_weight(HttpResponse::new(201, "")).is_ok());

        let err = c
            .parse_update_rest_gross_weight(HttpResponse::new(400, "job not found"))
            .unwrap_err();
        assert!(matches!(&err, ApiError::ValidationFailure(msg) if msg == "job not found"));
        assert_eq!(err.to_string(), "job not found");

        let err = c
            .parse_update_rest_gross_weight(HttpResponse::new(200, "ok"))
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationFailure(_)));
    }

    #[test]
    fn parse_check_material_item_is_lenient() {
        let result = client()
            .parse_check_material_item(HttpResponse::new(404, r#"{"exists":false}"#))
            .unwrap();
        assert_eq!(result, json!({ "exists": false }));
    }

    #[test]
    fn parse_login_returns_token_string() {
        let token = client()
            .parse_login(HttpResponse::new(200, r#""a.b.c""#))
            .unwrap();
        assert_eq!(token, "a.b.c");

        let err = client()
            .parse_login(HttpResponse::new(401, r#"{"detail":"nope"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::LoginRejected));
    }

    #[test]
    fn parse_bad_json() {
        let err = client()
            .parse_fetch_stocks(HttpResponse::new(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let client = WarehouseClient::new("http://localhost:3000/api/");
        assert_eq!(
            client.build_fetch_stocks(&Session::new()).path,
            "http://localhost:3000/api/stocks"
        );
    }
}
