use crate::error::{AppError, AppResult};
use crate::i18n;
use crate::models::{LoginInput, RegisterInput, UserProfile};
use crate::services::api::ApiClient;
use crate::services::cache::QueryKey;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Client-side checks run before the registration form is submitted.
pub fn validate_registration(input: &RegisterInput, lang: &str) -> AppResult<()> {
    let lang = Some(lang);
    if input.email.trim().is_empty() || !input.email.contains('@') {
        return Err(AppError::Validation(i18n::tr(
            lang,
            "validation.email_required",
            None,
        )));
    }
    if input.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(i18n::tr(
            lang,
            "validation.password_too_short",
            None,
        )));
    }
    if input.name.trim().is_empty() {
        return Err(AppError::Validation(i18n::tr(
            lang,
            "validation.name_required",
            None,
        )));
    }
    Ok(())
}

pub fn validate_login(input: &LoginInput, lang: &str) -> AppResult<()> {
    let lang = Some(lang);
    if input.email.trim().is_empty() {
        return Err(AppError::Validation(i18n::tr(
            lang,
            "validation.email_required",
            None,
        )));
    }
    if input.password.is_empty() {
        return Err(AppError::Validation(i18n::tr(
            lang,
            "validation.password_required",
            None,
        )));
    }
    Ok(())
}

pub struct AuthService<'a> {
    api: &'a ApiClient,
    lang: &'a str,
}

impl<'a> AuthService<'a> {
    pub fn new(api: &'a ApiClient, lang: &'a str) -> Self {
        Self { api, lang }
    }

    pub async fn register(&self, mut input: RegisterInput) -> AppResult<UserProfile> {
        input.email = input.email.trim().to_string();
        input.phone = input.phone.filter(|p| !p.trim().is_empty());
        validate_registration(&input, self.lang)?;

        let profile = self.api.register(&input).await?;
        tracing::info!("Registered user {}", profile.id);
        Ok(profile)
    }

    /// Exchange credentials for a token, persist it and load the profile.
    pub async fn login(&self, mut input: LoginInput) -> AppResult<UserProfile> {
        input.email = input.email.trim().to_string();
        validate_login(&input, self.lang)?;

        let response = match self.api.login(&input).await {
            Ok(r) => r,
            Err(AppError::Unauthorized) | Err(AppError::BadRequest(_)) => {
                return Err(AppError::Validation(i18n::tr(
                    Some(self.lang),
                    "auth.invalid_credentials",
                    None,
                )));
            }
            Err(e) => return Err(e),
        };

        self.api.session().set_token(response.token).await?;

        let me = self.api.me().await?;
        self.api.cache().set(QueryKey::Me, &me).await;
        tracing::info!("Logged in as {}", me.email);
        Ok(me)
    }

    pub async fn logout(&self) -> AppResult<()> {
        self.api.session().clear().await?;
        self.api.cache().clear().await;
        tracing::info!("Logged out");
        Ok(())
    }

    /// The logged-in user, or `None` when there is no valid session.
    /// A token the server no longer accepts is dropped.
    pub async fn current_user(&self) -> AppResult<Option<UserProfile>> {
        if !self.api.session().is_authenticated().await {
            return Ok(None);
        }

        match self.api.me().await {
            Ok(me) => Ok(Some(me)),
            Err(AppError::Unauthorized) => {
                tracing::warn!("Stored session was rejected by the server; clearing it");
                self.logout().await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
