//! Async client for the patient and room endpoints.

use crate::config::ApiConfig;
use crate::{ApiError, ApiResult};
use hms_core::models::{
    NewPatient, Patient, PatientFilters, PatientPatch, PatientStats, PatientStatus, Room,
};
use hms_ids::PatientId;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

#[derive(Serialize)]
struct StatusBody {
    status: PatientStatus,
}

/// Error payload shape of the backend: `{"error": "..."}` or `{"message": "..."}`.
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl ApiClient {
    /// Builds a client that sends JSON `Accept`/`Content-Type` headers and applies the
    /// configured timeout to every request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be initialised.
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> ApiResult<(RequestBuilder, Url)> {
        let url = self.config.endpoint(path)?;
        Ok((self.http.request(method, url.clone()), url))
    }

    /// Sends `request`, turning a non-success status into [`ApiError::Server`].
    async fn send(request: RequestBuilder, method: &Method, url: &Url) -> ApiResult<Response> {
        let response = request.send().await.map_err(|err| {
            tracing::warn!(%method, %url, error = %err, "request failed");
            ApiError::Transport(err)
        })?;
        let status = response.status();
        if status.is_success() {
            tracing::debug!(%method, %url, status = status.as_u16(), "request succeeded");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.or(b.message))
            .or_else(|| Some(body.trim().to_string()).filter(|b| !b.is_empty()))
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
        tracing::warn!(%method, %url, status = status.as_u16(), %message, "server rejected request");
        Err(ApiError::Server {
            status: status.as_u16(),
            message,
        })
    }

    /// Decodes a JSON body, naming the failing path on a shape mismatch.
    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let bytes = response.bytes().await?;
        let de = &mut serde_json::Deserializer::from_slice(&bytes);
        serde_path_to_error::deserialize(de).map_err(|err| {
            let path = err.path().to_string();
            let path = if path.is_empty() || path == "." {
                "<root>".to_string()
            } else {
                path
            };
            ApiError::Decode {
                path,
                message: err.into_inner().to_string(),
            }
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> ApiResult<T> {
        let (request, url) = self.request(method.clone(), path)?;
        let response = Self::send(build(request), &method, &url).await?;
        Self::decode(response).await
    }

    /// `GET /patients`, optionally filtered.
    pub async fn list_patients(&self, filters: Option<&PatientFilters>) -> ApiResult<Vec<Patient>> {
        self.call(Method::GET, "patients", |req| match filters {
            Some(filters) => req.query(filters),
            None => req,
        })
        .await
    }

    /// `GET /patients/{id}`.
    pub async fn get_patient(&self, id: &PatientId) -> ApiResult<Patient> {
        self.call(Method::GET, &format!("patients/{id}"), |req| req)
            .await
    }

    /// `POST /patients`. The server allocates the identifier.
    pub async fn create_patient(&self, payload: &NewPatient) -> ApiResult<Patient> {
        self.call(Method::POST, "patients", |req| req.json(payload))
            .await
    }

    /// `PUT /patients/{id}`, replacing every field.
    pub async fn update_patient(&self, id: &PatientId, payload: &NewPatient) -> ApiResult<Patient> {
        self.call(Method::PUT, &format!("patients/{id}"), |req| req.json(payload))
            .await
    }

    /// `PATCH /patients/{id}` with only the fields present in `patch`.
    pub async fn patch_patient(&self, id: &PatientId, patch: &PatientPatch) -> ApiResult<Patient> {
        self.call(Method::PATCH, &format!("patients/{id}"), |req| req.json(patch))
            .await
    }

    /// `PATCH /patients/{id}/status`.
    pub async fn update_patient_status(
        &self,
        id: &PatientId,
        status: PatientStatus,
    ) -> ApiResult<Patient> {
        let body = StatusBody { status };
        self.call(Method::PATCH, &format!("patients/{id}/status"), |req| {
            req.json(&body)
        })
        .await
    }

    /// `DELETE /patients/{id}`. Any response body is ignored.
    pub async fn delete_patient(&self, id: &PatientId) -> ApiResult<()> {
        let method = Method::DELETE;
        let (request, url) = self.request(method.clone(), &format!("patients/{id}"))?;
        Self::send(request, &method, &url).await?;
        Ok(())
    }

    /// `GET /patients/search?q=`.
    pub async fn search_patients(&self, query: &str) -> ApiResult<Vec<Patient>> {
        self.call(Method::GET, "patients/search", |req| req.query(&[("q", query)]))
            .await
    }

    /// `GET /patients/stats`.
    ///
    /// Backends without a stats endpoint answer 404, 405 or 501; in that case the stats are
    /// computed from the full patient list instead. Any other failure is returned.
    pub async fn get_patient_stats(&self) -> ApiResult<PatientStats> {
        match self.call(Method::GET, "patients/stats", |req| req).await {
            Ok(stats) => Ok(stats),
            Err(err) if err.is_endpoint_unavailable() => {
                tracing::warn!(error = %err, "stats endpoint unavailable, deriving from patient list");
                let patients = self.list_patients(None).await?;
                Ok(PatientStats::from_patients(&patients))
            }
            Err(err) => Err(err),
        }
    }

    /// `GET /rooms/available`.
    pub async fn list_available_rooms(&self) -> ApiResult<Vec<Room>> {
        self.call(Method::GET, "rooms/available", |req| req).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use hms_core::models::Gender;
    use hms_types::NonEmptyText;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn patient_json(id: &str, name: &str, status: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "gender": "female",
            "admissionDate": "2025-01-21",
            "status": status,
        })
    }

    pub(crate) fn client_for(server: &MockServer) -> ApiClient {
        let config = ApiConfig::new(&format!("{}/api", server.uri()), Duration::from_secs(2))
            .unwrap();
        ApiClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn lists_patients_with_filters_and_json_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/patients"))
            .and(query_param("status", "critical"))
            .and(header("accept", "application/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([patient_json("P003", "Robert Taylor", "critical")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let filters = PatientFilters {
            status: Some(PatientStatus::Critical),
            ..PatientFilters::default()
        };
        let patients = client_for(&server).list_patients(Some(&filters)).await.unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].name.as_str(), "Robert Taylor");
    }

    #[tokio::test]
    async fn server_errors_carry_the_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/patients/P404"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Patient not found"})))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get_patient(&PatientId::parse("P404").unwrap())
            .await
            .unwrap_err();
        match err {
            ApiError::Server { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Patient not found");
            }
            other => panic!("expected server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn creates_and_patches_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/patients"))
            .and(body_json(json!({
                "name": "Jane Roe",
                "gender": "female",
                "admissionDate": "2025-01-21",
                "status": "admitted",
                "roomNumber": "GEN-210",
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(patient_json("P100", "Jane Roe", "admitted")),
            )
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/api/patients/P100/status"))
            .and(body_json(json!({"status": "discharged"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(patient_json("P100", "Jane Roe", "discharged")),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let payload = NewPatient {
            name: NonEmptyText::new("Jane Roe").unwrap(),
            age: None,
            gender: Gender::Female,
            blood_group: None,
            contact: None,
            email: None,
            address: None,
            admission_date: chrono::NaiveDate::from_ymd_opt(2025, 1, 21).unwrap(),
            status: PatientStatus::Admitted,
            room_number: Some(NonEmptyText::new("GEN-210").unwrap()),
            assigned_doctor: None,
            assigned_nurse: None,
            diagnosis: None,
        };
        let created = client.create_patient(&payload).await.unwrap();
        assert_eq!(created.id.as_str(), "P100");

        let updated = client
            .update_patient_status(&created.id, PatientStatus::Discharged)
            .await
            .unwrap();
        assert_eq!(updated.status, PatientStatus::Discharged);
    }

    #[tokio::test]
    async fn search_sends_query_and_delete_ignores_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/patients/search"))
            .and(query_param("q", "doe"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([patient_json("P001", "John Doe", "admitted")])),
            )
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/patients/P001"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "Patient deleted"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let found = client.search_patients("doe").await.unwrap();
        assert_eq!(found[0].id.as_str(), "P001");
        client.delete_patient(&found[0].id).await.unwrap();
    }

    #[tokio::test]
    async fn stats_endpoint_and_fallback_agree() {
        let patients = json!([
            patient_json("P001", "John Doe", "admitted"),
            patient_json("P003", "Robert Taylor", "critical"),
            patient_json("P004", "Lisa Anderson", "outpatient"),
        ]);

        let served = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/patients/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total": 3,
                "admitted": 1,
                "discharged": 0,
                "critical": 1,
                "stable": 0,
                "outpatient": 1,
            })))
            .expect(1)
            .mount(&served)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/patients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(patients.clone()))
            .expect(0)
            .mount(&served)
            .await;

        let derived = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/patients/stats"))
            .respond_with(ResponseTemplate::new(501))
            .mount(&derived)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/patients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(patients))
            .mount(&derived)
            .await;

        let from_endpoint = client_for(&served).get_patient_stats().await.unwrap();
        let from_list = client_for(&derived).get_patient_stats().await.unwrap();
        assert_eq!(from_endpoint, from_list);
        assert_eq!(from_endpoint.total, 3);
    }

    #[tokio::test]
    async fn stats_fall_back_to_the_patient_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/patients/stats"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/patients"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                patient_json("P001", "John Doe", "admitted"),
                patient_json("P003", "Robert Taylor", "critical"),
                patient_json("P004", "Lisa Anderson", "outpatient"),
            ])))
            .mount(&server)
            .await;

        let stats = client_for(&server).get_patient_stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.admitted, 1);
        assert_eq!(stats.critical, 1);
        assert_eq!(stats.outpatient, 1);
    }

    #[tokio::test]
    async fn stats_propagate_other_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/patients/stats"))
            .respond_with(ResponseTemplate::new(500).set_body_string("database offline"))
            .mount(&server)
            .await;

        let err = client_for(&server).get_patient_stats().await.unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 500, ref message } if message == "database offline"));
    }

    #[tokio::test]
    async fn malformed_bodies_name_the_failing_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/rooms/available"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "R004", "roomNumber": "PVT-301", "type": "suite", "floor": "3rd Floor",
                 "capacity": 1, "occupied": 0, "status": "available", "department": "Cardiology"}
            ])))
            .mount(&server)
            .await;

        let err = client_for(&server).list_available_rooms().await.unwrap_err();
        match err {
            ApiError::Decode { path, .. } => assert_eq!(path, "[0].type"),
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
