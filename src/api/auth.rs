//! Login, registration and logout

use crate::auth_client::{check_response, AuthClient};
use crate::error::Result;
use crate::types::{LoginRequest, LoginResponse, RegisterRequest, RegisteredUser, Session};
use crate::validation;
use tracing::{info, warn};

impl AuthClient {
    /// Log in and persist the returned token, username and roles
    ///
    /// The server also sets the refresh cookie used by later token refreshes.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        validation::validate_login(username, password)?;

        let url = self.config().endpoint(&["user", "login"])?;
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response = self.http().post(url).json(&request).send().await?;
        check_response!(response, "Login failed");

        let login: LoginResponse = response.json().await?;
        self.token_store()
            .store_session(&login.access_token, username, &login.roles)?;

        info!(username = %username, roles = ?login.roles, "Logged in");
        Ok(login)
    }

    /// Create an account; does not log in
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<RegisteredUser> {
        validation::validate_registration(username, email, password)?;

        let url = self.config().endpoint(&["user", "register"])?;
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self.http().post(url).json(&request).send().await?;
        check_response!(response, "Registration failed");

        let user: RegisteredUser = response.json().await?;
        info!(username = %user.username, id = user.id, "Registered user");
        Ok(user)
    }

    /// Ask the server to drop the refresh cookie, then clear the local session
    ///
    /// The server call is best effort; the local session is cleared regardless.
    pub async fn logout(&self) -> Result<()> {
        let url = self.config().endpoint(&["user", "logout"])?;

        match self.http().post(url).send().await {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), "Logout request rejected, clearing session anyway");
            }
            Err(e) => {
                warn!(error = %e, "Logout request failed, clearing session anyway");
            }
            Ok(_) => {}
        }

        self.token_store().clear_session()?;
        info!("Logged out");
        Ok(())
    }

    /// The logged-in identity, if any
    pub fn session(&self) -> Option<Session> {
        self.token_store().session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token_store().is_authenticated()
    }

    pub fn is_admin(&self) -> bool {
        self.session().is_some_and(|s| s.is_admin())
    }
}
