use crate::commands::CommandResult;
use crate::i18n;
use crate::models::{LoginInput, RegisterInput};
use crate::services::auth::AuthService;
use crate::AppState;

pub async fn register(
    state: &AppState,
    email: String,
    password: String,
    name: String,
    phone: Option<String>,
) -> CommandResult {
    AuthService::new(&state.api, state.lang())
        .register(RegisterInput {
            email,
            password,
            name,
            phone,
        })
        .await?;

    Ok(i18n::tr(Some(state.lang()), "auth.registered", None))
}

pub async fn login(state: &AppState, email: String, password: String) -> CommandResult {
    let me = AuthService::new(&state.api, state.lang())
        .login(LoginInput { email, password })
        .await?;

    Ok(i18n::tr(
        Some(state.lang()),
        "auth.logged_in",
        Some(&[("name", me.name.as_str())]),
    ))
}

pub async fn logout(state: &AppState) -> CommandResult {
    AuthService::new(&state.api, state.lang())
        .logout()
        .await?;

    Ok(i18n::tr(Some(state.lang()), "auth.logged_out", None))
}

pub async fn me(state: &AppState) -> CommandResult {
    let user = AuthService::new(&state.api, state.lang())
        .current_user()
        .await?;

    match user {
        Some(user) => {
            let mut out = format!("{} <{}>", user.name, user.email);
            if let Some(phone) = user.phone {
                out.push_str(&format!("\nPhone: {}", phone));
            }
            Ok(out)
        }
        None => Ok(i18n::tr(Some(state.lang()), "auth.login_required", None)),
    }
}
