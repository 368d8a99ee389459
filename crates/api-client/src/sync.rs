//! Pulling backend state into the store.

use crate::{ApiClient, ApiResult};
use hms_core::{HospitalStore, MutationOutcome};

/// Refetches the patient list and loads it into `store`.
///
/// The store is only touched once the whole list has been fetched and decoded, so a failed
/// request leaves it exactly as it was. A list that would leave other records pointing at
/// missing patients is rejected the same way.
///
/// # Errors
///
/// Returns the request's [`crate::ApiError`], or [`crate::ApiError::Store`] if the store
/// rejects the fetched list.
pub async fn refresh_patients(
    client: &ApiClient,
    store: &mut HospitalStore,
) -> ApiResult<MutationOutcome> {
    let patients = client.list_patients(None).await?;
    let count = patients.len();
    let outcome = store.load_patients(patients)?;
    tracing::info!(count, "patients refreshed from backend");
    Ok(outcome)
}
