use reqwest::Method;

use super::{ApiClient, ApiError};
use crate::models::{AuthPayload, LoginCredentials, RegisterRequest};

impl ApiClient {
    /// `POST /auth/login`: exchange credentials for a user and bearer token.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthPayload, ApiError> {
        let request = self
            .request(Method::POST, "/auth/login", None)
            .json(credentials);
        self.execute::<AuthPayload>(request, "Error al iniciar sesión")
            .await?
            .into_data()
    }

    /// `POST /auth/register`: create an account and sign it in.
    pub async fn register(&self, registration: &RegisterRequest) -> Result<AuthPayload, ApiError> {
        let request = self
            .request(Method::POST, "/auth/register", None)
            .json(registration);
        self.execute::<AuthPayload>(request, "Error al registrar usuario")
            .await?
            .into_data()
    }
}
