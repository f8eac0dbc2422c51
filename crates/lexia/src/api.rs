//! Access to the solicitudes backend.
//!
//! [`SolicitudesApi`] is the seam: [`HttpApi`] talks to the REST service,
//! [`InMemoryApi`] keeps everything in process for tests and offline use.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use futures_util::future::BoxFuture;
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::{
    DashboardStats, Ejecucion, ExecutionReport, ExtractionStatus, NuevaSolicitud, Solicitud,
    SolicitudUpdate, Usuario,
};

/// Page size the backend applies when none is given.
pub const DEFAULT_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("solicitud '{0}' not found")]
    NotFound(String),

    #[error("not authorized: check the API token")]
    Unauthorized,

    #[error("backend answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid payload: {}", describe(.0))]
    Invalid(BTreeMap<String, String>),

    #[error("rejected by backend: {0}")]
    Rejected(String),

    #[error("incorrect email or password")]
    InvalidCredentials,

    #[error("invalid base URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

fn describe(errors: &BTreeMap<String, String>) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Operations on solicitudes and their execution history.
pub trait SolicitudesApi: Send + Sync {
    fn list(&self, skip: usize, limit: usize) -> BoxFuture<'_, Result<Vec<Solicitud>>>;

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Solicitud>>;

    fn create(&self, nueva: NuevaSolicitud) -> BoxFuture<'_, Result<Solicitud>>;

    fn update<'a>(&'a self, id: &'a str, update: SolicitudUpdate) -> BoxFuture<'a, Result<Solicitud>>;

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>>;

    /// One page of a solicitud's executions, newest first.
    fn history<'a>(
        &'a self,
        id: &'a str,
        skip: usize,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<Ejecucion>>>;

    /// Runs a solicitud now instead of waiting for its schedule.
    fn execute<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<ExecutionReport>>;

    fn stats(&self) -> BoxFuture<'_, Result<DashboardStats>>;
}

// ============================================================================
// HTTP
// ============================================================================

/// REST client with bearer authentication and JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpApi {
    /// `base_url` must be absolute. A missing trailing slash is added so
    /// relative paths join under it.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Same client, authenticating with `token` from now on.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into()).filter(|t| !t.is_empty());
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves a path relative to the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// A request to `path` carrying the bearer token, if any.
    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.endpoint(path)?;
        tracing::debug!(%method, %url, "api request");
        let mut request = self.client.request(method, url);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        Ok(request)
    }

    /// Sends `request` and maps unsuccessful statuses to [`ApiError`].
    pub(crate) async fn dispatch(request: RequestBuilder, path: &str) -> Result<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "api request failed");
        Err(match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(path.to_string()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized,
            StatusCode::BAD_REQUEST => match detail(&body) {
                Some(detail) => ApiError::Rejected(detail),
                None => ApiError::Status { status: 400, body },
            },
            other => ApiError::Status {
                status: other.as_u16(),
                body,
            },
        })
    }

    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<reqwest::Response> {
        let mut request = self.request(method, path)?;
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Self::dispatch(request, path).await
    }

    async fn json<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T> {
        let response = self.send(method, path, query, body).await?;
        Ok(response.json::<T>().await?)
    }
}

/// The `detail` message of an error body, when it is a plain string.
fn detail(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        detail: serde_json::Value,
    }
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed.detail.as_str().map(str::to_string)
}

fn page(skip: usize, limit: usize) -> [(&'static str, String); 2] {
    [("skip", skip.to_string()), ("limit", limit.to_string())]
}

fn solicitud_path(id: &str) -> String {
    format!("solicitudes/{id}")
}

const NO_BODY: Option<&()> = None;

impl SolicitudesApi for HttpApi {
    fn list(&self, skip: usize, limit: usize) -> BoxFuture<'_, Result<Vec<Solicitud>>> {
        Box::pin(async move {
            self.json(Method::GET, "solicitudes/", &page(skip, limit), NO_BODY)
                .await
        })
    }

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Solicitud>> {
        Box::pin(async move {
            self.json(Method::GET, &solicitud_path(id), &[], NO_BODY)
                .await
                .map_err(|err| not_found_as(err, id))
        })
    }

    fn create(&self, nueva: NuevaSolicitud) -> BoxFuture<'_, Result<Solicitud>> {
        Box::pin(async move {
            let errors = nueva.check();
            if !errors.is_empty() {
                return Err(ApiError::Invalid(errors));
            }
            self.json(Method::POST, "solicitudes/", &[], Some(&nueva)).await
        })
    }

    fn update<'a>(&'a self, id: &'a str, update: SolicitudUpdate) -> BoxFuture<'a, Result<Solicitud>> {
        Box::pin(async move {
            self.json(Method::PUT, &solicitud_path(id), &[], Some(&update))
                .await
                .map_err(|err| not_found_as(err, id))
        })
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.send(Method::DELETE, &solicitud_path(id), &[], NO_BODY)
                .await
                .map(|_| ())
                .map_err(|err| not_found_as(err, id))
        })
    }

    fn history<'a>(
        &'a self,
        id: &'a str,
        skip: usize,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<Ejecucion>>> {
        Box::pin(async move {
            let path = format!("solicitudes/{id}/resultados");
            self.json(Method::GET, &path, &page(skip, limit), NO_BODY)
                .await
                .map_err(|err| not_found_as(err, id))
        })
    }

    fn execute<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<ExecutionReport>> {
        Box::pin(async move {
            let path = format!("solicitudes/{id}/execute");
            self.json(Method::POST, &path, &[], NO_BODY)
                .await
                .map_err(|err| not_found_as(err, id))
        })
    }

    fn stats(&self) -> BoxFuture<'_, Result<DashboardStats>> {
        Box::pin(async move { self.json(Method::GET, "solicitudes/stats", &[], NO_BODY).await })
    }
}

fn not_found_as(err: ApiError, id: &str) -> ApiError {
    match err {
        ApiError::NotFound(_) => ApiError::NotFound(id.to_string()),
        other => other,
    }
}

// ============================================================================
// In memory
// ============================================================================

/// Solicitudes plus their execution history, as stored in a fixture file.
///
/// Files hold either a bare array of solicitudes or an object with
/// `solicitudes` and `resultados`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "DatasetFile")]
pub struct Dataset {
    pub solicitudes: Vec<Solicitud>,
    pub resultados: Vec<Ejecucion>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetFile {
    Bare(Vec<Solicitud>),
    Full {
        solicitudes: Vec<Solicitud>,
        #[serde(default)]
        resultados: Vec<Ejecucion>,
    },
}

impl From<DatasetFile> for Dataset {
    fn from(file: DatasetFile) -> Self {
        match file {
            DatasetFile::Bare(solicitudes) => Dataset {
                solicitudes,
                resultados: Vec::new(),
            },
            DatasetFile::Full {
                solicitudes,
                resultados,
            } => Dataset {
                solicitudes,
                resultados,
            },
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Store {
    solicitudes: BTreeMap<String, Solicitud>,
    resultados: Vec<Ejecucion>,
    /// Registered users keyed by email.
    pub(crate) accounts: BTreeMap<String, Account>,
    /// Email of the logged-in user.
    pub(crate) session: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Account {
    pub(crate) usuario: Usuario,
    pub(crate) password: String,
}

/// Lock-guarded in-process backend.
#[derive(Debug, Default)]
pub struct InMemoryApi {
    store: RwLock<Store>,
    next_id: AtomicU64,
}

impl InMemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dataset(dataset: Dataset) -> Self {
        let next_id = dataset
            .solicitudes
            .iter()
            .filter_map(|s| s.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        let solicitudes = dataset
            .solicitudes
            .into_iter()
            .map(|s| (s.id.clone(), s))
            .collect();
        Self {
            store: RwLock::new(Store {
                solicitudes,
                resultados: dataset.resultados,
                ..Store::default()
            }),
            next_id: AtomicU64::new(next_id),
        }
    }

    pub fn with_solicitudes(solicitudes: Vec<Solicitud>) -> Self {
        Self::from_dataset(Dataset {
            solicitudes,
            resultados: Vec::new(),
        })
    }

    pub fn len(&self) -> usize {
        self.read().solicitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Store> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Store> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Solicitudes ordered by creation date, newest first, like the backend.
    fn ordered(&self) -> Vec<Solicitud> {
        let mut rows: Vec<Solicitud> = self.read().solicitudes.values().cloned().collect();
        rows.sort_by(|a, b| b.fecha_creacion.cmp(&a.fecha_creacion));
        rows
    }
}

impl SolicitudesApi for InMemoryApi {
    fn list(&self, skip: usize, limit: usize) -> BoxFuture<'_, Result<Vec<Solicitud>>> {
        let rows = self.ordered().into_iter().skip(skip).take(limit).collect();
        Box::pin(async move { Ok(rows) })
    }

    fn get<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<Solicitud>> {
        let found = self.read().solicitudes.get(id).cloned();
        Box::pin(async move { found.ok_or_else(|| ApiError::NotFound(id.to_string())) })
    }

    fn create(&self, nueva: NuevaSolicitud) -> BoxFuture<'_, Result<Solicitud>> {
        let result = {
            let errors = nueva.check();
            if errors.is_empty() {
                let id = (self.next_id.fetch_add(1, Ordering::Relaxed) + 1).to_string();
                let solicitud = nueva.into_solicitud(id.clone(), Utc::now());
                self.write().solicitudes.insert(id, solicitud.clone());
                Ok(solicitud)
            } else {
                Err(ApiError::Invalid(errors))
            }
        };
        Box::pin(async move { result })
    }

    fn update<'a>(&'a self, id: &'a str, update: SolicitudUpdate) -> BoxFuture<'a, Result<Solicitud>> {
        let result = match self.write().solicitudes.get_mut(id) {
            Some(target) => {
                update.apply(target);
                Ok(target.clone())
            }
            None => Err(ApiError::NotFound(id.to_string())),
        };
        Box::pin(async move { result })
    }

    fn delete<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<()>> {
        let mut store = self.write();
        let result = match store.solicitudes.remove(id) {
            Some(_) => {
                store
                    .resultados
                    .retain(|r| r.solicitud_id.as_deref() != Some(id));
                Ok(())
            }
            None => Err(ApiError::NotFound(id.to_string())),
        };
        drop(store);
        Box::pin(async move { result })
    }

    fn history<'a>(
        &'a self,
        id: &'a str,
        skip: usize,
        limit: usize,
    ) -> BoxFuture<'a, Result<Vec<Ejecucion>>> {
        let store = self.read();
        let result = if store.solicitudes.contains_key(id) {
            let mut rows: Vec<Ejecucion> = store
                .resultados
                .iter()
                .filter(|r| r.solicitud_id.as_deref() == Some(id))
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.fecha_ejecucion.cmp(&a.fecha_ejecucion));
            Ok(rows.into_iter().skip(skip).take(limit).collect())
        } else {
            Err(ApiError::NotFound(id.to_string()))
        };
        drop(store);
        Box::pin(async move { result })
    }

    fn execute<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<ExecutionReport>> {
        let now = Utc::now();
        let mut store = self.write();
        let result = match store.solicitudes.get_mut(id) {
            Some(target) => {
                target.ultima_ejecucion = Some(now);
                let numero = target.criterio().unwrap_or_default().to_string();
                let run = Ejecucion {
                    id: format!("{id}-{}", now.timestamp_millis()),
                    solicitud_id: Some(id.to_string()),
                    fecha_ejecucion: now,
                    numero_radicado_completo: numero,
                    despacho_juzgado: None,
                    fecha_ultimo_auto: None,
                    estado_extraccion: ExtractionStatus::Exitoso,
                };
                store.resultados.push(run);
                Ok(ExecutionReport {
                    success: true,
                    message: "Solicitud ejecutada correctamente".to_string(),
                    resultados_encontrados: 1,
                })
            }
            None => Err(ApiError::NotFound(id.to_string())),
        };
        drop(store);
        tracing::debug!(id, ok = result.is_ok(), "executed solicitud");
        Box::pin(async move { result })
    }

    fn stats(&self) -> BoxFuture<'_, Result<DashboardStats>> {
        let stats = DashboardStats::compute(&self.ordered(), Utc::now());
        Box::pin(async move { Ok(stats) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let api = HttpApi::new("https://lexia.example/api/v1", None).unwrap();
        assert_eq!(
            api.endpoint("solicitudes/12/resultados").unwrap().as_str(),
            "https://lexia.example/api/v1/solicitudes/12/resultados"
        );
        assert_eq!(
            api.endpoint("solicitudes/stats").unwrap().as_str(),
            "https://lexia.example/api/v1/solicitudes/stats"
        );
    }

    #[test]
    fn relative_base_url_is_rejected() {
        assert!(matches!(
            HttpApi::new("api/v1", None),
            Err(ApiError::Url(_))
        ));
    }

    #[test]
    fn invalid_error_lists_fields() {
        let mut errors = BTreeMap::new();
        errors.insert("alias".to_string(), "This field is required".to_string());
        let err = ApiError::Invalid(errors);
        assert_eq!(
            err.to_string(),
            "invalid payload: alias: This field is required"
        );
    }

    #[test]
    fn error_detail_is_read_from_body() {
        assert_eq!(
            detail(r#"{"detail": "Email already registered"}"#).as_deref(),
            Some("Email already registered")
        );
        assert_eq!(detail(r#"{"detail": [{"loc": ["body"]}]}"#), None);
        assert_eq!(detail("<html>"), None);
    }

    #[test]
    fn token_can_be_added_later() {
        let api = HttpApi::new("https://lexia.example/api/v1", None).unwrap();
        assert!(!api.has_token());
        assert!(api.clone().with_token("abc").has_token());
        assert!(!api.with_token("").has_token());
    }
}
