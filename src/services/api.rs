use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{
    Appointment, Dentist, LoginInput, LoginResponse, NewAppointment, NewDentist, RegisterInput,
    RescheduleInput, UserProfile,
};
use crate::services::cache::{QueryCache, QueryKey};
use crate::services::session::SessionStore;

/// The slice of the scheduling API the booking flow depends on.
#[async_trait]
pub trait SchedulingApi: Send + Sync {
    async fn is_authenticated(&self) -> bool;

    /// Current non-cancelled appointments for `dentist_id` on `date`,
    /// always fetched fresh from the server.
    async fn fetch_availability(&self, dentist_id: &str, date: NaiveDate)
        -> AppResult<Vec<Appointment>>;

    async fn book(&self, input: NewAppointment) -> AppResult<Appointment>;

    async fn reschedule(&self, id: &str, input: RescheduleInput) -> AppResult<Appointment>;

    async fn cancel(&self, id: &str) -> AppResult<()>;
}

/// HTTP client for the dental office API.
#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    session: SessionStore,
    cache: QueryCache,
}

impl ApiClient {
    pub fn new(config: &Config, session: SessionStore, cache: QueryCache) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.api.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            session,
            cache,
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, self.api_url(endpoint))
            .header(http::header::CONTENT_TYPE, "application/json");

        if let Some(token) = self.session.token().await {
            builder = builder.bearer_auth(token);
        }

        builder
    }

    async fn send(&self, builder: RequestBuilder) -> AppResult<Response> {
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::from_status(status, &error_text));
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> AppResult<T> {
        let response = self.send(builder).await?;
        Ok(response.json().await?)
    }

    async fn get_cached<T>(&self, key: QueryKey, endpoint: &str) -> AppResult<T>
    where
        T: DeserializeOwned + Serialize,
    {
        if let Some(hit) = self.cache.get::<T>(&key).await {
            tracing::debug!("Cache hit for {:?}", key);
            return Ok(hit);
        }

        let value: T = self
            .send_json(self.request(Method::GET, endpoint).await)
            .await?;
        self.cache.set(key, &value).await;
        Ok(value)
    }

    async fn invalidate_appointments(&self) {
        self.cache.invalidate(&QueryKey::Appointments).await;
        self.cache.invalidate_availability().await;
    }

    pub async fn register(&self, input: &RegisterInput) -> AppResult<UserProfile> {
        let builder = self.request(Method::POST, "/auth/register").await.json(input);
        self.send_json(builder).await
    }

    pub async fn login(&self, input: &LoginInput) -> AppResult<LoginResponse> {
        let builder = self.request(Method::POST, "/auth/login").await.json(input);
        let response: LoginResponse = self.send_json(builder).await?;
        self.cache.invalidate(&QueryKey::Me).await;
        Ok(response)
    }

    pub async fn me(&self) -> AppResult<UserProfile> {
        self.get_cached(QueryKey::Me, "/auth/me").await
    }

    pub async fn dentists(&self) -> AppResult<Vec<Dentist>> {
        self.get_cached(QueryKey::Dentists, "/dentists").await
    }

    pub async fn create_dentist(&self, input: &NewDentist) -> AppResult<Dentist> {
        let builder = self.request(Method::POST, "/dentists").await.json(input);
        let dentist: Dentist = self.send_json(builder).await?;
        self.cache.invalidate(&QueryKey::Dentists).await;
        Ok(dentist)
    }

    /// Appointments belonging to the logged-in user.
    pub async fn appointments(&self) -> AppResult<Vec<Appointment>> {
        self.get_cached(QueryKey::Appointments, "/appointments").await
    }

    /// Availability for display purposes; may be served from cache.
    pub async fn availability(
        &self,
        dentist_id: &str,
        date: NaiveDate,
    ) -> AppResult<Vec<Appointment>> {
        let key = QueryKey::Availability {
            dentist_id: dentist_id.to_string(),
            date,
        };
        if let Some(hit) = self.cache.get::<Vec<Appointment>>(&key).await {
            return Ok(hit);
        }
        self.fetch_availability(dentist_id, date).await
    }
}

#[async_trait]
impl SchedulingApi for ApiClient {
    async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    async fn fetch_availability(
        &self,
        dentist_id: &str,
        date: NaiveDate,
    ) -> AppResult<Vec<Appointment>> {
        let day = date.format("%Y-%m-%d").to_string();
        let builder = self
            .request(Method::GET, "/appointments/availability")
            .await
            .query(&[("dentistId", dentist_id), ("date", day.as_str())]);

        let appointments: Vec<Appointment> = self.send_json(builder).await?;
        tracing::debug!(
            "Fetched {} appointments for dentist {} on {}",
            appointments.len(),
            dentist_id,
            day
        );

        self.cache
            .set(
                QueryKey::Availability {
                    dentist_id: dentist_id.to_string(),
                    date,
                },
                &appointments,
            )
            .await;
        Ok(appointments)
    }

    async fn book(&self, input: NewAppointment) -> AppResult<Appointment> {
        let builder = self.request(Method::POST, "/appointments").await.json(&input);
        let appointment: Appointment = self.send_json(builder).await?;
        self.invalidate_appointments().await;
        Ok(appointment)
    }

    async fn reschedule(&self, id: &str, input: RescheduleInput) -> AppResult<Appointment> {
        let endpoint = format!("/appointments/{}", urlencoding::encode(id));
        let builder = self.request(Method::PUT, &endpoint).await.json(&input);
        let appointment: Appointment = self.send_json(builder).await?;
        self.invalidate_appointments().await;
        Ok(appointment)
    }

    async fn cancel(&self, id: &str) -> AppResult<()> {
        let endpoint = format!("/appointments/{}", urlencoding::encode(id));
        // Body is either empty or the cancelled record; neither is needed.
        self.send(self.request(Method::DELETE, &endpoint).await)
            .await?;
        self.invalidate_appointments().await;
        Ok(())
    }
}
