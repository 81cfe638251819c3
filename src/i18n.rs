/*
User-facing message catalogue.

Translations are embedded JSON maps keyed by message id. `tr` looks a key up
for a language and substitutes `{name}` placeholders; missing keys fall back
to the default language and finally to the key itself.

Usage:
    use crate::i18n;
    let msg = i18n::tr(Some("es"), "booking.slot_unavailable", None);
    let msg = i18n::t_with("booking.booked", &[("dentist", "Dr. Molar"), ("start", "Jan 10, 09:00")]);
*/

use std::collections::HashMap;
use std::sync::OnceLock;

pub const DEFAULT_LANG: &str = "en";

static TRANSLATIONS: OnceLock<HashMap<String, HashMap<String, String>>> = OnceLock::new();

const EN_JSON: &str = r#"
{
  "app.name": "Dental Scheduler",
  "booking.slot_unavailable": "Schedule no longer available. Please choose another time.",
  "booking.failed": "Something went wrong while booking.",
  "booking.busy": "A booking request is already in progress.",
  "booking.booked": "Appointment booked with {dentist} on {start}.",
  "booking.rescheduled": "Appointment moved to {start}.",
  "booking.cancelled": "Appointment cancelled.",
  "booking.invalid_time": "Please select a valid date and time: {err}",
  "booking.dentist_required": "Please select a dentist.",
  "auth.login_required": "Please log in first.",
  "auth.invalid_credentials": "Incorrect email or password",
  "auth.logged_in": "Logged in as {name}.",
  "auth.logged_out": "Logged out.",
  "auth.registered": "Registration complete. You can now log in.",
  "validation.email_required": "Email is required",
  "validation.password_required": "Password is required",
  "validation.password_too_short": "Password must be at least 6 characters",
  "validation.name_required": "Name is required",
  "appointments.empty": "You have no upcoming appointments.",
  "dentists.empty": "No dentists are available yet.",
  "availability.free": "No appointments booked for this day.",
  "error.generic": "Request failed: {err}"
}
"#;

const ES_JSON: &str = r#"
{
  "app.name": "Agenda Dental",
  "booking.slot_unavailable": "El horario ya no está disponible. Por favor elija otra hora.",
  "booking.failed": "Algo salió mal al reservar.",
  "booking.busy": "Ya hay una reserva en curso.",
  "booking.booked": "Cita reservada con {dentist} el {start}.",
  "booking.rescheduled": "Cita movida a {start}.",
  "booking.cancelled": "Cita cancelada.",
  "booking.invalid_time": "Seleccione una fecha y hora válidas: {err}",
  "booking.dentist_required": "Seleccione un dentista.",
  "auth.login_required": "Inicie sesión primero.",
  "auth.invalid_credentials": "Correo o contraseña incorrectos",
  "auth.logged_in": "Sesión iniciada como {name}.",
  "auth.logged_out": "Sesión cerrada.",
  "auth.registered": "Registro completado. Ya puede iniciar sesión.",
  "validation.email_required": "El correo es obligatorio",
  "validation.password_required": "La contraseña es obligatoria",
  "validation.password_too_short": "La contraseña debe tener al menos 6 caracteres",
  "validation.name_required": "El nombre es obligatorio",
  "appointments.empty": "No tiene citas próximas.",
  "dentists.empty": "Todavía no hay dentistas disponibles.",
  "availability.free": "No hay citas reservadas para este día.",
  "error.generic": "La solicitud falló: {err}"
}
"#;

fn build_translations() -> HashMap<String, HashMap<String, String>> {
    let mut out: HashMap<String, HashMap<String, String>> = HashMap::new();

    for (lang, raw) in [("en", EN_JSON), ("es", ES_JSON)] {
        let map: HashMap<String, String> = serde_json::from_str(raw).unwrap_or_else(|e| {
            panic!("failed to parse {} translations in i18n module: {}", lang, e);
        });
        out.insert(lang.to_string(), map);
    }

    out
}

fn translations() -> &'static HashMap<String, HashMap<String, String>> {
    TRANSLATIONS.get_or_init(build_translations)
}

pub fn is_supported_language(lang: &str) -> bool {
    translations().contains_key(lang)
}

/// Reduce a locale such as `es-MX` or `en_US.UTF-8` to a supported language
/// code, falling back to the default.
pub fn normalize_language(lang: &str) -> String {
    let code = lang
        .split(|c| c == '-' || c == '_' || c == '.')
        .next()
        .unwrap_or("")
        .to_lowercase();
    if is_supported_language(&code) {
        code
    } else {
        DEFAULT_LANG.to_string()
    }
}

/// Translate `key` into `lang`, substituting `{name}` placeholders.
pub fn tr(lang: Option<&str>, key: &str, params: Option<&[(&str, &str)]>) -> String {
    let all = translations();
    let lang = lang.filter(|l| all.contains_key(*l)).unwrap_or(DEFAULT_LANG);

    let template = all
        .get(lang)
        .and_then(|m| m.get(key))
        .or_else(|| all.get(DEFAULT_LANG).and_then(|m| m.get(key)))
        .cloned()
        .unwrap_or_else(|| key.to_string());

    match params {
        Some(params) => params.iter().fold(template, |acc, (name, value)| {
            acc.replace(&format!("{{{}}}", name), value)
        }),
        None => template,
    }
}

pub fn t(key: &str) -> String {
    tr(None, key, None)
}

pub fn t_with(key: &str, params: &[(&str, &str)]) -> String {
    tr(None, key, Some(params))
}
