mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::{
    error::{Error, StoreError},
    log::RECORDS,
    model::{PatientFields, PatientRecord, Prescription, PrescriptionFields},
    password::PasswordHash,
};
use async_trait::async_trait;
use tracing::{debug, error};
use uuid::Uuid;

///
/// Persistence for patient records and prescriptions.
///
/// Each method is a single write or read against one collection, atomic per document.
/// Validation and password hashing happen before anything reaches the store.
///
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_patient(
        &self,
        fields: PatientFields,
        access_password: PasswordHash,
    ) -> Result<PatientRecord, StoreError>;

    /// All records in insertion order
    async fn list_patients(&self) -> Result<Vec<PatientRecord>, StoreError>;

    async fn find_patient(&self, id: &str) -> Result<Option<PatientRecord>, StoreError>;

    ///
    /// Replace the editable fields of a record.
    /// The access password and prescription list are left as they are.
    /// Returns false if there is no record with this id.
    ///
    async fn update_patient(&self, id: &str, fields: PatientFields) -> Result<bool, StoreError>;

    async fn insert_prescription(
        &self,
        patient_id: &str,
        fields: PrescriptionFields,
    ) -> Result<Prescription, StoreError>;

    async fn find_prescription(&self, id: &str) -> Result<Option<Prescription>, StoreError>;

    /// Prescriptions for the given ids, in the order given. Unknown ids are skipped.
    async fn find_prescriptions(&self, ids: &[String]) -> Result<Vec<Prescription>, StoreError>;

    ///
    /// Append a prescription id to a record's prescription list.
    /// Returns false if there is no record with this id.
    ///
    async fn link_prescription(
        &self,
        patient_id: &str,
        prescription_id: &str,
    ) -> Result<bool, StoreError>;

    ///
    /// Save a prescription and append it to the owning record.
    ///
    /// The default is two separate writes. If the link fails after the prescription is saved,
    /// the prescription is left in place and `Error::PrescriptionNotLinked` names it.
    /// Backends that can do both in one atomic write override this.
    ///
    async fn add_prescription(
        &self,
        patient_id: &str,
        fields: PrescriptionFields,
    ) -> Result<Prescription, Error> {
        let prescription = self.insert_prescription(patient_id, fields).await?;

        debug!(
            target: RECORDS,
            msg = "Prescription saved",
            patient_id,
            prescription_id = prescription.id
        );

        match self.link_prescription(patient_id, &prescription.id).await {
            Ok(true) => Ok(prescription),
            Ok(false) => Err(Error::PatientNotFound {
                id: patient_id.to_owned(),
            }),
            Err(err) => {
                error!(
                    target: RECORDS,
                    msg = "Prescription saved but not linked to patient record",
                    patient_id,
                    prescription_id = prescription.id,
                    error = err.to_string()
                );
                Err(Error::PrescriptionNotLinked {
                    patient_id: patient_id.to_owned(),
                    prescription_id: prescription.id,
                    source: err,
                })
            }
        }
    }
}

pub(crate) fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
