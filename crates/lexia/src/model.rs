//! Domain types exchanged with the backend.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use lexia_seeker::{Seekable, Timestamp, Value};
use lexia_validate::{presets, FieldRules, Values};
use serde::{Deserialize, Deserializer, Serialize};

/// Longest alias the backend stores.
pub const MAX_ALIAS_LEN: usize = 255;

/// How a solicitud finds its case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    Radicado,
    Nombre,
}

impl SearchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchKind::Radicado => "radicado",
            SearchKind::Nombre => "nombre",
        }
    }
}

/// How often results are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Diaria,
    Semanal,
    Mensual,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Diaria => "diaria",
            Frequency::Semanal => "semanal",
            Frequency::Mensual => "mensual",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A monitored case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solicitud {
    #[serde(deserialize_with = "id_text")]
    pub id: String,
    pub alias: String,
    pub tipo_busqueda: SearchKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criterio_busqueda_radicado: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criterio_busqueda_nombre: Option<String>,
    pub frecuencia_envio: Frequency,
    pub fecha_creacion: DateTime<Utc>,
    #[serde(default)]
    pub activa: bool,
    #[serde(default)]
    pub ultima_ejecucion: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categoria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub despacho: Option<String>,
}

impl Solicitud {
    /// The radicado or name this solicitud searches for.
    pub fn criterio(&self) -> Option<&str> {
        match self.tipo_busqueda {
            SearchKind::Radicado => self.criterio_busqueda_radicado.as_deref(),
            SearchKind::Nombre => self.criterio_busqueda_nombre.as_deref(),
        }
    }
}

const SOLICITUD_FIELDS: &[&str] = &[
    "id",
    "alias",
    "tipo_busqueda",
    "criterio_busqueda_radicado",
    "criterio_busqueda_nombre",
    "frecuencia_envio",
    "fecha_creacion",
    "activa",
    "ultima_ejecucion",
    "estado",
    "categoria",
    "despacho",
];

impl Seekable for Solicitud {
    fn seeker_field_value(&self, field: &str) -> Value<'_> {
        match field {
            "id" => Value::String(&self.id),
            "alias" => Value::String(&self.alias),
            "tipo_busqueda" => Value::String(self.tipo_busqueda.as_str()),
            "criterio_busqueda_radicado" => opt_str(&self.criterio_busqueda_radicado),
            "criterio_busqueda_nombre" => opt_str(&self.criterio_busqueda_nombre),
            "criterio" => self.criterio().map_or(Value::None, Value::String),
            "frecuencia_envio" => Value::String(self.frecuencia_envio.as_str()),
            "fecha_creacion" => Value::Timestamp(Timestamp::from(self.fecha_creacion)),
            "activa" => Value::Bool(self.activa),
            "ultima_ejecucion" => opt_time(self.ultima_ejecucion),
            "estado" => opt_str(&self.estado),
            "categoria" => opt_str(&self.categoria),
            "despacho" => opt_str(&self.despacho),
            _ => Value::None,
        }
    }

    fn seeker_values(&self) -> Vec<Value<'_>> {
        SOLICITUD_FIELDS
            .iter()
            .map(|field| self.seeker_field_value(field))
            .collect()
    }

    fn seeker_id(&self) -> Option<String> {
        Some(self.id.clone())
    }
}

/// Extraction outcome of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Exitoso,
    ErrorCaptcha,
    ErrorSistema,
    #[serde(other)]
    Desconocido,
}

impl ExtractionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionStatus::Exitoso => "exitoso",
            ExtractionStatus::ErrorCaptcha => "error_captcha",
            ExtractionStatus::ErrorSistema => "error_sistema",
            ExtractionStatus::Desconocido => "desconocido",
        }
    }
}

/// One run of the extraction bot for a solicitud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ejecucion {
    #[serde(deserialize_with = "id_text")]
    pub id: String,
    #[serde(default, deserialize_with = "opt_id_text", skip_serializing_if = "Option::is_none")]
    pub solicitud_id: Option<String>,
    pub fecha_ejecucion: DateTime<Utc>,
    pub numero_radicado_completo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub despacho_juzgado: Option<String>,
    #[serde(default)]
    pub fecha_ultimo_auto: Option<DateTime<Utc>>,
    pub estado_extraccion: ExtractionStatus,
}

const EJECUCION_FIELDS: &[&str] = &[
    "id",
    "fecha_ejecucion",
    "numero_radicado_completo",
    "despacho_juzgado",
    "fecha_ultimo_auto",
    "estado_extraccion",
];

impl Seekable for Ejecucion {
    fn seeker_field_value(&self, field: &str) -> Value<'_> {
        match field {
            "id" => Value::String(&self.id),
            "solicitud_id" => opt_str(&self.solicitud_id),
            "fecha_ejecucion" => Value::Timestamp(Timestamp::from(self.fecha_ejecucion)),
            "numero_radicado_completo" => Value::String(&self.numero_radicado_completo),
            "despacho_juzgado" => opt_str(&self.despacho_juzgado),
            "fecha_ultimo_auto" => opt_time(self.fecha_ultimo_auto),
            "estado_extraccion" => Value::String(self.estado_extraccion.as_str()),
            _ => Value::None,
        }
    }

    fn seeker_values(&self) -> Vec<Value<'_>> {
        EJECUCION_FIELDS
            .iter()
            .map(|field| self.seeker_field_value(field))
            .collect()
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NuevaSolicitud {
    pub alias: String,
    pub tipo_busqueda: SearchKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criterio_busqueda_radicado: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criterio_busqueda_nombre: Option<String>,
    pub frecuencia_envio: Frequency,
    #[serde(default = "yes")]
    pub activa: bool,
}

fn yes() -> bool {
    true
}

impl NuevaSolicitud {
    /// Per-field messages for every rule the payload breaks; empty when the
    /// payload can be sent.
    pub fn check(&self) -> BTreeMap<String, String> {
        let all = Values::new();
        let mut errors = BTreeMap::new();

        let alias = presets::required()
            .max_length_with(MAX_ALIAS_LEN, "Alias cannot exceed 255 characters");
        let criterio: (&str, FieldRules, &Option<String>) = match self.tipo_busqueda {
            SearchKind::Radicado => (
                "criterio_busqueda_radicado",
                presets::radicado(),
                &self.criterio_busqueda_radicado,
            ),
            SearchKind::Nombre => (
                "criterio_busqueda_nombre",
                presets::required().min_length(2),
                &self.criterio_busqueda_nombre,
            ),
        };

        let alias_value = serde_json::Value::String(self.alias.trim().to_string());
        if let Some(message) = alias.check(&alias_value, &all) {
            errors.insert("alias".to_string(), message);
        }

        let (field, rules, value) = criterio;
        let value = value
            .as_deref()
            .map(|v| serde_json::Value::String(v.trim().to_string()))
            .unwrap_or(serde_json::Value::Null);
        if let Some(message) = rules.check(&value, &all) {
            errors.insert(field.to_string(), message);
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.check().is_empty()
    }

    /// Builds the stored record.
    pub fn into_solicitud(self, id: String, now: DateTime<Utc>) -> Solicitud {
        Solicitud {
            id,
            alias: self.alias.trim().to_string(),
            tipo_busqueda: self.tipo_busqueda,
            criterio_busqueda_radicado: self.criterio_busqueda_radicado,
            criterio_busqueda_nombre: self.criterio_busqueda_nombre,
            frecuencia_envio: self.frecuencia_envio,
            fecha_creacion: now,
            activa: self.activa,
            ultima_ejecucion: None,
            estado: None,
            categoria: None,
            despacho: None,
        }
    }
}

/// Body of a partial update. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolicitudUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frecuencia_envio: Option<Frequency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activa: Option<bool>,
}

impl SolicitudUpdate {
    pub fn is_empty(&self) -> bool {
        self.alias.is_none() && self.frecuencia_envio.is_none() && self.activa.is_none()
    }

    pub fn apply(&self, target: &mut Solicitud) {
        if let Some(alias) = &self.alias {
            target.alias = alias.trim().to_string();
        }
        if let Some(frequency) = self.frecuencia_envio {
            target.frecuencia_envio = frequency;
        }
        if let Some(activa) = self.activa {
            target.activa = activa;
        }
    }
}

/// Reply to an execute request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    pub success: bool,
    pub message: String,
    #[serde(default)]
    pub resultados_encontrados: u32,
}

// ============================================================================
// Accounts
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    #[default]
    Personal,
    Business,
}

impl AccountType {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountType::Personal => "personal",
            AccountType::Business => "business",
        }
    }
}

/// A registered user as the backend returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usuario {
    #[serde(deserialize_with = "id_text")]
    pub id: String,
    pub nombre: String,
    pub email: String,
    pub tipo_cuenta: AccountType,
    #[serde(default = "yes")]
    pub activo: bool,
}

/// Body of a registration request.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct NuevoUsuario {
    pub nombre: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub tipo_cuenta: AccountType,
}

impl fmt::Debug for NuevoUsuario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NuevoUsuario")
            .field("nombre", &self.nombre)
            .field("email", &self.email)
            .field("password", &"***")
            .field("tipo_cuenta", &self.tipo_cuenta)
            .finish()
    }
}

impl NuevoUsuario {
    /// Per-field messages from the `nombre`, `email` and `password` presets.
    pub fn check(&self) -> BTreeMap<String, String> {
        let all = Values::new();
        let fields = [
            ("nombre", presets::nombre(), self.nombre.trim()),
            ("email", presets::email(), self.email.trim()),
            ("password", presets::password(), self.password.as_str()),
        ];
        fields
            .into_iter()
            .filter_map(|(field, rules, value)| {
                let value = serde_json::Value::String(value.to_string());
                rules
                    .check(&value, &all)
                    .map(|message| (field.to_string(), message))
            })
            .collect()
    }
}

/// Bearer token issued by a login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
}

fn bearer() -> String {
    "bearer".to_string()
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("access_token", &"***")
            .field("token_type", &self.token_type)
            .finish()
    }
}

// ============================================================================
// Dashboard
// ============================================================================

/// Label shown when no solicitud has run yet.
pub const NO_EXECUTIONS: &str = "No executions";

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub solicitudes_activas: usize,
    /// Solicitudes that ran within the last 7 days.
    pub actualizaciones_recientes: usize,
    pub ultima_ejecucion: String,
}

impl DashboardStats {
    pub fn compute(solicitudes: &[Solicitud], now: DateTime<Utc>) -> Self {
        let solicitudes_activas = solicitudes.iter().filter(|s| s.activa).count();
        let actualizaciones_recientes = solicitudes
            .iter()
            .filter_map(|s| s.ultima_ejecucion)
            .filter(|at| days_since(*at, now) <= 7)
            .count();
        let ultima_ejecucion = solicitudes
            .iter()
            .filter_map(|s| s.ultima_ejecucion)
            .max()
            .map_or_else(|| NO_EXECUTIONS.to_string(), |at| last_run_label(at, now));

        DashboardStats {
            solicitudes_activas,
            actualizaciones_recientes,
            ultima_ejecucion,
        }
    }
}

/// Whole days since `at`, rounded up.
fn days_since(at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    let elapsed = (now - at).num_milliseconds();
    elapsed.div_euclid(DAY_MS) + i64::from(elapsed.rem_euclid(DAY_MS) != 0)
}

/// "Today", "Yesterday", "N days ago" within a week, else the date.
pub fn last_run_label(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    match days_since(at, now) {
        d if d <= 1 => "Today".to_string(),
        2 => "Yesterday".to_string(),
        d if d <= 7 => format!("{} days ago", d - 1),
        _ => at.format("%d/%m/%Y").to_string(),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn opt_str(value: &Option<String>) -> Value<'_> {
    value.as_deref().map_or(Value::None, Value::String)
}

fn opt_time(value: Option<DateTime<Utc>>) -> Value<'static> {
    value.map_or(Value::None, |at| Value::Timestamp(Timestamp::from(at)))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> String {
        match raw {
            RawId::Text(text) => text,
            RawId::Int(n) => n.to_string(),
        }
    }
}

/// Ids arrive as numbers from the backend and as strings from fixtures.
fn id_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn opt_id_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}
