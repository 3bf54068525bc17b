use std::{
    collections::HashMap,
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

/// Tokens stay valid for this long after login.
const TOKEN_TTL_SECS: u64 = 8 * 60 * 60;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub login: String,
    pub employee_name: String,
    pub can_login: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    pub material_id: i64,
    pub tare_id: i64,
    pub tare_type: String,
    pub processing_id: i64,
    pub net_weight_fact: f64,
    pub rest_gross_weight: f64,
    /// Stored and sent as `0`/`1`, the way the backend does.
    pub done: u8,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub stock_id: i64,
    pub title: String,
    pub jobs: Vec<Job>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stock {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct JobUpdate {
    #[serde(rename = "taskID")]
    pub task_id: i64,
    #[serde(rename = "materialID")]
    pub material_id: i64,
    #[serde(rename = "taraID")]
    pub tara_id: i64,
    #[serde(rename = "netWeightFact")]
    pub net_weight_fact: f64,
    #[serde(rename = "restGrossWeight")]
    pub rest_gross_weight: f64,
    #[serde(rename = "processingID")]
    pub processing_id: i64,
    pub done: bool,
}

#[derive(Debug, Deserialize)]
pub struct CheckItem {
    #[serde(rename = "materialID")]
    pub material_id: i64,
    #[serde(rename = "taraID")]
    pub tara_id: i64,
    #[serde(rename = "taskID")]
    pub task_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct RestGrossWeight {
    #[serde(rename = "taskID")]
    pub task_id: i64,
    pub material_id: i64,
    pub tare_id: i64,
    pub gross_weight: f64,
}

#[derive(Debug, Deserialize)]
pub struct Login {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePassword {
    pub login: String,
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskQuery {
    #[serde(rename = "tareType")]
    pub tare_type: Option<String>,
}

#[derive(Debug, Default)]
pub struct Db {
    pub users: HashMap<String, (User, String)>,
    pub tokens: HashMap<String, String>,
    pub stocks: Vec<Stock>,
    pub tasks: Vec<Task>,
}

impl Db {
    /// One user (`admin`/`admin`), two stocks, and two tasks in stock 1.
    pub fn seeded() -> Self {
        let admin = User {
            id: "1".to_string(),
            login: "admin".to_string(),
            employee_name: "Warehouse Admin".to_string(),
            can_login: 1,
        };
        let job = |material_id, tare_id, tare_type: &str, done| Job {
            material_id,
            tare_id,
            tare_type: tare_type.to_string(),
            processing_id: 1,
            net_weight_fact: 0.0,
            rest_gross_weight: 500.0,
            done,
        };
        Self {
            users: HashMap::from([("admin".to_string(), (admin, "admin".to_string()))]),
            tokens: HashMap::new(),
            stocks: vec![
                Stock { id: 1, name: "Main warehouse".to_string() },
                Stock { id: 2, name: "Cold storage".to_string() },
            ],
            tasks: vec![
                Task {
                    id: 5,
                    stock_id: 1,
                    title: "Unload inbound pallets".to_string(),
                    jobs: vec![job(2, 9, "box", 0), job(2, 10, "box", 1), job(3, 9, "bag", 0)],
                },
                Task {
                    id: 6,
                    stock_id: 1,
                    title: "Reweigh returns".to_string(),
                    jobs: vec![job(4, 11, "pallet", 1)],
                },
            ],
        }
    }

    fn find_job(&self, task_id: i64, material_id: i64, tare_id: i64) -> Option<&Job> {
        self.tasks
            .iter()
            .find(|t| t.id == task_id)?
            .jobs
            .iter()
            .find(|j| j.material_id == material_id && j.tare_id == tare_id)
    }

    fn job_mut(&mut self, task_id: i64, material_id: i64, tare_id: i64) -> Option<&mut Job> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == task_id)?
            .jobs
            .iter_mut()
            .find(|j| j.material_id == material_id && j.tare_id == tare_id)
    }

    fn apply(&mut self, update: &JobUpdate) -> Result<(), String> {
        if update.net_weight_fact < 0.0 || update.rest_gross_weight < 0.0 {
            return Err("weight mismatch".to_string());
        }
        let job = self
            .job_mut(update.task_id, update.material_id, update.tara_id)
            .ok_or_else(|| "job not found".to_string())?;
        job.net_weight_fact = update.net_weight_fact;
        job.rest_gross_weight = update.rest_gross_weight;
        job.processing_id = update.processing_id;
        job.done = u8::from(update.done);
        Ok(())
    }
}

pub type SharedDb = Arc<RwLock<Db>>;

pub fn app() -> Router {
    app_with_db(Arc::new(RwLock::new(Db::seeded())))
}

pub fn app_with_db(db: SharedDb) -> Router {
    let api = Router::new()
        .route("/stocks", get(list_stocks))
        .route("/stock/{stock_id}/tasks", get(list_tasks))
        .route("/stock/{stock_id}/tasks_progress", get(tasks_progress))
        .route(
            "/stock/{stock_id}/task/{task_id}/material/{material_id}",
            get(task_detail),
        )
        .route("/job", put(update_job).post(update_jobs))
        .route("/check_item", post(check_item))
        .route("/rest_gross_weight", put(update_rest_gross_weight))
        .route("/login", post(login))
        .route("/change_password", post(change_password));
    Router::new().nest("/api", api).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_db(listener: TcpListener, db: SharedDb) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_db(db)).await
}

/// Three-segment token with claims `{payload, exp, jti}`. Not signed.
pub fn mint_token(user: &User) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let jti = Uuid::new_v4();
    let claims = json!({ "payload": user, "exp": now + TOKEN_TTL_SECS, "jti": jti });
    let claims = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{claims}.{}", jti.simple())
}

async fn authorize(db: &SharedDb, headers: &HeaderMap) -> Result<(), StatusCode> {
    let token = headers
        .get("token")
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::FORBIDDEN)?;
    if db.read().await.tokens.contains_key(token) {
        Ok(())
    } else {
        warn!("rejected unknown token");
        Err(StatusCode::FORBIDDEN)
    }
}

async fn list_stocks(
    State(db): State<SharedDb>,
    headers: HeaderMap,
) -> Result<Json<Vec<Stock>>, StatusCode> {
    authorize(&db, &headers).await?;
    Ok(Json(db.read().await.stocks.clone()))
}

async fn list_tasks(
    State(db): State<SharedDb>,
    Path(stock_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Vec<Value>>, StatusCode> {
    authorize(&db, &headers).await?;
    let db = db.read().await;
    let tasks = db
        .tasks
        .iter()
        .filter(|t| t.stock_id == stock_id)
        .map(|t| json!({ "id": t.id, "title": t.title, "jobs": t.jobs.len() }))
        .collect();
    Ok(Json(tasks))
}

async fn tasks_progress(
    State(db): State<SharedDb>,
    Path(stock_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Vec<Value>>, StatusCode> {
    authorize(&db, &headers).await?;
    let db = db.read().await;
    let progress = db
        .tasks
        .iter()
        .filter(|t| t.stock_id == stock_id)
        .map(|t| {
            let done = t.jobs.iter().filter(|j| j.done != 0).count();
            json!({ "task_id": t.id, "total": t.jobs.len(), "done": done })
        })
        .collect();
    Ok(Json(progress))
}

async fn task_detail(
    State(db): State<SharedDb>,
    Path((stock_id, task_id, material_id)): Path<(i64, i64, i64)>,
    Query(query): Query<TaskQuery>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    authorize(&db, &headers).await?;
    let db = db.read().await;
    let task = db
        .tasks
        .iter()
        .find(|t| t.id == task_id && t.stock_id == stock_id)
        .ok_or(StatusCode::NOT_FOUND)?;
    let jobs: Vec<&Job> = task
        .jobs
        .iter()
        .filter(|j| j.material_id == material_id)
        .filter(|j| query.tare_type.as_deref().map_or(true, |t| j.tare_type == t))
        .collect();
    Ok(Json(json!({
        "id": task.id,
        "stock_id": task.stock_id,
        "title": task.title,
        "jobs": jobs,
    })))
}

async fn update_job(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(update): Json<JobUpdate>,
) -> Response {
    if let Err(status) = authorize(&db, &headers).await {
        return status.into_response();
    }
    match db.write().await.apply(&update) {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
    }
}

/// All-or-nothing: nothing is applied if any update is rejected.
async fn update_jobs(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(updates): Json<Vec<JobUpdate>>,
) -> Response {
    if let Err(status) = authorize(&db, &headers).await {
        return status.into_response();
    }
    let mut db = db.write().await;
    let snapshot = db.tasks.clone();
    for update in &updates {
        if let Err(msg) = db.apply(update) {
            db.tasks = snapshot;
            return (StatusCode::BAD_REQUEST, msg).into_response();
        }
    }
    StatusCode::CREATED.into_response()
}

async fn check_item(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(item): Json<CheckItem>,
) -> Response {
    if let Err(status) = authorize(&db, &headers).await {
        return status.into_response();
    }
    let exists = db
        .read()
        .await
        .find_job(item.task_id, item.material_id, item.tara_id)
        .is_some();
    let status = if exists { StatusCode::OK } else { StatusCode::NOT_FOUND };
    (status, Json(json!({ "exists": exists }))).into_response()
}

async fn update_rest_gross_weight(
    State(db): State<SharedDb>,
    headers: HeaderMap,
    Json(body): Json<RestGrossWeight>,
) -> Response {
    if let Err(status) = authorize(&db, &headers).await {
        return status.into_response();
    }
    if body.gross_weight < 0.0 {
        return (StatusCode::BAD_REQUEST, "weight mismatch").into_response();
    }
    match db.write().await.job_mut(body.task_id, body.material_id, body.tare_id) {
        Some(job) => {
            job.rest_gross_weight = body.gross_weight;
            StatusCode::CREATED.into_response()
        }
        None => (StatusCode::BAD_REQUEST, "job not found").into_response(),
    }
}

async fn login(State(db): State<SharedDb>, Json(input): Json<Login>) -> Response {
    let mut db = db.write().await;
    let user = match db.users.get(&input.login) {
        Some((user, password)) if *password == input.password && user.can_login != 0 => {
            user.clone()
        }
        _ => {
            warn!(login = %input.login, "login rejected");
            return (StatusCode::UNAUTHORIZED, "invalid credentials").into_response();
        }
    };
    let token = mint_token(&user);
    db.tokens.insert(token.clone(), user.login.clone());
    info!(login = %user.login, "issued token");
    (StatusCode::OK, Json(token)).into_response()
}

async fn change_password(State(db): State<SharedDb>, Json(input): Json<ChangePassword>) -> Response {
    let mut db = db.write().await;
    match db.users.get_mut(&input.login) {
        Some((_, password)) if *password == input.old_password => {
            *password = input.new_password;
            StatusCode::CREATED.into_response()
        }
        _ => (StatusCode::BAD_REQUEST, "old password is wrong").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_serializes_done_as_number() {
        let db = Db::seeded();
        let json = serde_json::to_value(&db.tasks[0].jobs[1]).unwrap();
        assert_eq!(json["done"], 1);
        assert_eq!(json["tare_type"], "box");
    }

    #[test]
    fn minted_token_carries_user_payload() {
        let db = Db::seeded();
        let (user, _) = &db.users["admin"];
        let token = mint_token(user);
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3);

        let claims: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(parts[1]).unwrap()).unwrap();
        assert_eq!(claims["payload"]["login"], "admin");
        assert_eq!(claims["payload"]["can_login"], 1);
        assert!(claims["exp"].as_u64().unwrap() > 0);
    }

    #[test]
    fn apply_rejects_negative_weight() {
        let mut db = Db::seeded();
        let update = JobUpdate {
            task_id: 5,
            material_id: 2,
            tara_id: 9,
            net_weight_fact: -1.0,
            rest_gross_weight: 10.0,
            processing_id: 1,
            done: true,
        };
        assert_eq!(db.apply(&update).unwrap_err(), "weight mismatch");
        assert_eq!(db.tasks[0].jobs[0].done, 0);
    }

    #[test]
    fn apply_updates_matching_job() {
        let mut db = Db::seeded();
        let update = JobUpdate {
            task_id: 5,
            material_id: 2,
            tara_id: 9,
            net_weight_fact: 120.5,
            rest_gross_weight: 300.0,
            processing_id: 2,
            done: true,
        };
        db.apply(&update).unwrap();
        let job = &db.tasks[0].jobs[0];
        assert_eq!(job.done, 1);
        assert_eq!(job.net_weight_fact, 120.5);
        assert_eq!(job.processing_id, 2);
    }

    #[test]
    fn find_job_matches_task_material_and_tare() {
        let db = Db::seeded();
        let job = db.find_job(5, 2, 9).unwrap();
        assert_eq!(job.tare_type, "box");
        assert!(db.find_job(5, 2, 77).is_none());
        assert!(db.find_job(99, 2, 9).is_none());
    }

    #[test]
    fn login_payload_requires_password() {
        let result: Result<Login, _> = serde_json::from_str(r#"{"login":"admin"}"#);
        assert!(result.is_err());
    }
}
