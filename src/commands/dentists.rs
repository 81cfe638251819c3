use crate::commands::CommandResult;
use crate::i18n;
use crate::models::{Dentist, NewDentist};
use crate::AppState;

pub(crate) fn render_dentist(d: &Dentist) -> String {
    format!("{}  {} - {}", d.id, d.name, d.specialization)
}

pub async fn list(state: &AppState) -> CommandResult {
    let dentists = state.api.dentists().await?;

    if dentists.is_empty() {
        return Ok(i18n::tr(Some(state.lang()), "dentists.empty", None));
    }

    Ok(dentists
        .iter()
        .map(render_dentist)
        .collect::<Vec<_>>()
        .join("\n"))
}

pub async fn create(
    state: &AppState,
    name: String,
    specialization: String,
    photo_url: Option<String>,
) -> CommandResult {
    let dentist = state
        .api
        .create_dentist(&NewDentist {
            name,
            specialization,
            profile_photo_url: photo_url,
        })
        .await?;

    tracing::info!("Created dentist {}", dentist.id);
    Ok(render_dentist(&dentist))
}
