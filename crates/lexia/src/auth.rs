//! Accounts and sessions.
//!
//! [`AuthApi`] covers registration, login and the current user. A login
//! hands back an [`AccessToken`]; [`HttpApi::with_token`] turns it into an
//! authenticated client.

use futures_util::future::BoxFuture;
use reqwest::Method;

use crate::api::{Account, ApiError, HttpApi, InMemoryApi, Result};
use crate::model::{AccessToken, NuevoUsuario, Usuario};

pub trait AuthApi: Send + Sync {
    fn register(&self, nuevo: NuevoUsuario) -> BoxFuture<'_, Result<Usuario>>;

    fn login<'a>(&'a self, email: &'a str, password: &'a str) -> BoxFuture<'a, Result<AccessToken>>;

    /// The user the current token belongs to.
    fn me(&self) -> BoxFuture<'_, Result<Usuario>>;

    fn logout(&self) -> BoxFuture<'_, Result<()>>;
}

// ============================================================================
// HTTP
// ============================================================================

const REGISTER: &str = "auth/register";
const LOGIN: &str = "auth/login";
const ME: &str = "auth/me";
const LOGOUT: &str = "auth/logout";

impl AuthApi for HttpApi {
    fn register(&self, nuevo: NuevoUsuario) -> BoxFuture<'_, Result<Usuario>> {
        Box::pin(async move {
            let errors = nuevo.check();
            if !errors.is_empty() {
                return Err(ApiError::Invalid(errors));
            }
            let request = self.request(Method::POST, REGISTER)?.json(&nuevo);
            Ok(Self::dispatch(request, REGISTER).await?.json().await?)
        })
    }

    fn login<'a>(&'a self, email: &'a str, password: &'a str) -> BoxFuture<'a, Result<AccessToken>> {
        Box::pin(async move {
            // OAuth2 password form: the email travels as `username`.
            let form = [("username", email.trim()), ("password", password)];
            let request = self.request(Method::POST, LOGIN)?.form(&form);
            match Self::dispatch(request, LOGIN).await {
                Ok(response) => Ok(response.json().await?),
                Err(ApiError::Unauthorized) => Err(ApiError::InvalidCredentials),
                Err(other) => Err(other),
            }
        })
    }

    fn me(&self) -> BoxFuture<'_, Result<Usuario>> {
        Box::pin(async move {
            let request = self.request(Method::GET, ME)?;
            Ok(Self::dispatch(request, ME).await?.json().await?)
        })
    }

    fn logout(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            let request = self.request(Method::POST, LOGOUT)?;
            Self::dispatch(request, LOGOUT).await.map(|_| ())
        })
    }
}

// ============================================================================
// In memory
// ============================================================================

fn session_token(usuario: &Usuario) -> String {
    format!("session-{}", usuario.id)
}

impl AuthApi for InMemoryApi {
    fn register(&self, nuevo: NuevoUsuario) -> BoxFuture<'_, Result<Usuario>> {
        let result = {
            let errors = nuevo.check();
            let email = nuevo.email.trim().to_string();
            let mut store = self.write();
            if !errors.is_empty() {
                Err(ApiError::Invalid(errors))
            } else if store.accounts.contains_key(&email) {
                Err(ApiError::Rejected("Email already registered".to_string()))
            } else {
                let usuario = Usuario {
                    id: (store.accounts.len() + 1).to_string(),
                    nombre: nuevo.nombre.trim().to_string(),
                    email: email.clone(),
                    tipo_cuenta: nuevo.tipo_cuenta,
                    activo: true,
                };
                let account = Account {
                    usuario: usuario.clone(),
                    password: nuevo.password,
                };
                store.accounts.insert(email, account);
                Ok(usuario)
            }
        };
        Box::pin(async move { result })
    }

    fn login<'a>(&'a self, email: &'a str, password: &'a str) -> BoxFuture<'a, Result<AccessToken>> {
        let email = email.trim();
        let mut store = self.write();
        let usuario = store
            .accounts
            .get(email)
            .filter(|account| account.password == password && account.usuario.activo)
            .map(|account| account.usuario.clone());
        let result = match usuario {
            Some(usuario) => {
                store.session = Some(email.to_string());
                Ok(AccessToken {
                    access_token: session_token(&usuario),
                    token_type: "bearer".to_string(),
                })
            }
            None => Err(ApiError::InvalidCredentials),
        };
        drop(store);
        Box::pin(async move { result })
    }

    fn me(&self) -> BoxFuture<'_, Result<Usuario>> {
        let store = self.read();
        let result = store
            .session
            .as_ref()
            .and_then(|email| store.accounts.get(email))
            .map(|account| account.usuario.clone())
            .ok_or(ApiError::Unauthorized);
        drop(store);
        Box::pin(async move { result })
    }

    fn logout(&self) -> BoxFuture<'_, Result<()>> {
        self.write().session = None;
        Box::pin(async { Ok(()) })
    }
}

impl InMemoryApi {
    /// Marks an account inactive. Inactive accounts cannot log in.
    pub fn deactivate(&self, email: &str) -> Result<()> {
        let mut store = self.write();
        let account = store
            .accounts
            .get_mut(email)
            .ok_or_else(|| ApiError::NotFound(email.to_string()))?;
        account.usuario.activo = false;
        if store.session.as_deref() == Some(email) {
            store.session = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountType;

    #[test]
    fn token_names_the_account() {
        let usuario = Usuario {
            id: "7".to_string(),
            nombre: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            tipo_cuenta: AccountType::Business,
            activo: true,
        };
        assert_eq!(session_token(&usuario), "session-7");
    }

    #[test]
    fn http_paths_join_under_base() {
        let api = HttpApi::new("https://lexia.example/api/v1", None).unwrap();
        assert_eq!(
            api.endpoint(LOGIN).unwrap().as_str(),
            "https://lexia.example/api/v1/auth/login"
        );
    }
}
