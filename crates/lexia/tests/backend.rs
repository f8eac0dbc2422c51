//! The in-memory backend behind the `SolicitudesApi` seam.

use std::path::PathBuf;

use futures_util::future::BoxFuture;
use lexia::cli::{fetch_pages, read_dataset, validate};
use lexia::{
    ApiError, ExtractionStatus, Frequency, InMemoryApi, LexiaConfig, NuevaSolicitud, SearchKind,
    Solicitud, SolicitudUpdate, SolicitudesApi, Supervised, Supervisor,
};
use lexia_validate::Outcome;

fn fixture_api() -> InMemoryApi {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/solicitudes.json");
    InMemoryApi::from_dataset(read_dataset(&path).unwrap())
}

fn nueva(alias: &str, radicado: Option<&str>) -> NuevaSolicitud {
    NuevaSolicitud {
        alias: alias.to_string(),
        tipo_busqueda: SearchKind::Radicado,
        criterio_busqueda_radicado: radicado.map(str::to_string),
        criterio_busqueda_nombre: None,
        frecuencia_envio: Frequency::Semanal,
        activa: true,
    }
}

#[tokio::test]
async fn list_is_newest_first_and_paged() {
    let api = fixture_api();
    let first = api.list(0, 2).await.unwrap();
    let ids: Vec<&str> = first.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["5", "4"]);

    let rest = api.list(4, 10).await.unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].id, "1");
}

#[tokio::test]
async fn create_assigns_next_id() {
    let api = fixture_api();
    let created = api
        .create(nueva("  Nuevo proceso  ", Some("11001310300120250000100")))
        .await
        .unwrap();
    assert_eq!(created.id, "6");
    assert_eq!(created.alias, "Nuevo proceso");
    assert!(created.ultima_ejecucion.is_none());
    assert_eq!(api.len(), 6);
    assert_eq!(api.get("6").await.unwrap(), created);
}

#[tokio::test]
async fn create_rejects_invalid_payload() {
    let api = fixture_api();
    let err = api.create(nueva("", Some("12ab"))).await.unwrap_err();
    let ApiError::Invalid(errors) = err else {
        panic!("expected validation errors");
    };
    assert_eq!(errors["alias"], "This field is required");
    assert!(errors.contains_key("criterio_busqueda_radicado"));
    assert_eq!(api.len(), 5);
}

#[tokio::test]
async fn update_changes_only_given_fields() {
    let api = fixture_api();
    let update = SolicitudUpdate {
        activa: Some(false),
        ..SolicitudUpdate::default()
    };
    let updated = api.update("1", update).await.unwrap();
    assert!(!updated.activa);
    assert_eq!(updated.alias, "Banco Popular vs García");
    assert_eq!(updated.frecuencia_envio, Frequency::Diaria);

    let missing = api.update("99", SolicitudUpdate::default()).await;
    assert!(matches!(missing, Err(ApiError::NotFound(id)) if id == "99"));
}

#[tokio::test]
async fn history_is_newest_first() {
    let api = fixture_api();
    let runs = api.history("1", 0, 100).await.unwrap();
    let ids: Vec<&str> = runs.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["11", "10", "12"]);
    assert_eq!(runs[2].estado_extraccion, ExtractionStatus::ErrorCaptcha);

    let other = api.history("4", 0, 100).await.unwrap();
    assert_eq!(other[0].estado_extraccion, ExtractionStatus::Desconocido);

    assert!(api.history("2", 0, 100).await.unwrap().is_empty());
}

#[tokio::test]
async fn history_pages_with_skip_and_limit() {
    let api = fixture_api();
    let page = api.history("1", 1, 1).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, "10");
    assert!(api.history("1", 3, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn execute_stamps_last_run_and_records_history() {
    let api = fixture_api();
    let report = api.execute("2").await.unwrap();
    assert!(report.success);
    assert_eq!(report.resultados_encontrados, 1);

    let solicitud = api.get("2").await.unwrap();
    assert!(solicitud.ultima_ejecucion.is_some());

    let runs = api.history("2", 0, 100).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].estado_extraccion, ExtractionStatus::Exitoso);
    assert_eq!(runs[0].solicitud_id.as_deref(), Some("2"));

    assert!(matches!(api.execute("99").await, Err(ApiError::NotFound(id)) if id == "99"));
}

/// Answers every listing with the first page, whatever `skip` says.
struct StuckApi(InMemoryApi);

impl StuckApi {
    fn list(&self, _skip: usize, limit: usize) -> BoxFuture<'_, lexia::api::Result<Vec<Solicitud>>> {
        self.0.list(0, limit)
    }
}

#[tokio::test]
async fn paging_stops_when_skip_is_ignored() {
    let api = StuckApi(fixture_api());
    let mut calls = 0;
    let rows = fetch_pages(2, |s: &Solicitud| s.id.clone(), |skip, limit| {
        calls += 1;
        api.list(skip, limit)
    })
    .await
    .unwrap();
    let ids: Vec<&str> = rows.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["5", "4"]);
    assert_eq!(calls, 2);
}

#[tokio::test]
async fn paging_collects_every_page() {
    let api = fixture_api();
    let rows = fetch_pages(2, |s: &Solicitud| s.id.clone(), |skip, limit| api.list(skip, limit))
        .await
        .unwrap();
    assert_eq!(rows.len(), 5);

    let runs = fetch_pages(1, |e: &lexia::Ejecucion| e.id.clone(), |skip, limit| {
        api.history("1", skip, limit)
    })
    .await
    .unwrap();
    let ids: Vec<&str> = runs.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["11", "10", "12"]);
}

#[tokio::test]
async fn delete_drops_history() {
    let api = fixture_api();
    api.delete("1").await.unwrap();
    assert!(matches!(api.get("1").await, Err(ApiError::NotFound(_))));
    assert!(matches!(api.history("1", 0, 100).await, Err(ApiError::NotFound(_))));
    assert!(matches!(api.delete("1").await, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn stats_count_active_solicitudes() {
    let api = fixture_api();
    let stats = api.stats().await.unwrap();
    assert_eq!(stats.solicitudes_activas, 3);
}

#[tokio::test]
async fn supervisor_turns_backend_errors_into_incidents() {
    let api = fixture_api();
    let supervisor = Supervisor::new();

    let mut state = supervisor.guard_async(api.get("42")).await;
    let incident = state.incident().unwrap().clone();
    assert_eq!(incident.message, "solicitud '42' not found");

    state.retry();
    assert_eq!(state, Supervised::Pending);

    state = supervisor.guard_async(api.get("2")).await;
    assert_eq!(state.ready().unwrap().alias, "Sucesión Ávila");
    assert_eq!(supervisor.incidents(), 1);
}

#[tokio::test]
async fn validate_command_uses_presets() {
    let config = LexiaConfig::default();

    let ok = validate(&config, "radicado", "11001310300120230012300").await.unwrap();
    assert!(ok.is_valid());

    let bad = validate(&config, "email", "not-an-email").await.unwrap();
    assert_eq!(bad, Outcome::Invalid("Must be a valid email".to_string()));

    let err = validate(&config, "zip", "1").await.unwrap_err();
    assert!(err.to_string().contains("zip"));
}
