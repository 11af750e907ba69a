use super::{generate_id, RecordStore};
use crate::{
    error::StoreError,
    model::{PatientFields, PatientRecord, Prescription, PrescriptionFields},
    password::PasswordHash,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

///
/// In-process record store.
///
/// Records live for the lifetime of the process. Used for local development and tests.
///
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
    fail_links: AtomicBool,
}

#[derive(Default)]
struct Collections {
    patients: HashMap<String, PatientRecord>,
    // insertion order of patient ids
    order: Vec<String>,
    prescriptions: HashMap<String, Prescription>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    ///
    /// Make every following `link_prescription` fail until switched off again.
    /// Simulates losing the store between the two writes of `add_prescription`.
    ///
    pub fn fail_links(&self, fail: bool) {
        self.fail_links.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_patient(
        &self,
        fields: PatientFields,
        access_password: PasswordHash,
    ) -> Result<PatientRecord, StoreError> {
        let record = PatientRecord {
            id: generate_id(),
            fields,
            access_password,
            prescriptions: Vec::new(),
        };

        let mut collections = self.collections.write().await;
        collections.order.push(record.id.clone());
        collections
            .patients
            .insert(record.id.clone(), record.clone());

        Ok(record)
    }

    async fn list_patients(&self) -> Result<Vec<PatientRecord>, StoreError> {
        let collections = self.collections.read().await;
        let records = collections
            .order
            .iter()
            .filter_map(|id| collections.patients.get(id))
            .cloned()
            .collect();
        Ok(records)
    }

    async fn find_patient(&self, id: &str) -> Result<Option<PatientRecord>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.patients.get(id).cloned())
    }

    async fn update_patient(&self, id: &str, fields: PatientFields) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        match collections.patients.get_mut(id) {
            Some(record) => {
                record.fields = fields;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_prescription(
        &self,
        patient_id: &str,
        fields: PrescriptionFields,
    ) -> Result<Prescription, StoreError> {
        let prescription = Prescription {
            id: generate_id(),
            patient_id: patient_id.to_owned(),
            fields,
        };

        let mut collections = self.collections.write().await;
        collections
            .prescriptions
            .insert(prescription.id.clone(), prescription.clone());

        Ok(prescription)
    }

    async fn find_prescription(&self, id: &str) -> Result<Option<Prescription>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections.prescriptions.get(id).cloned())
    }

    async fn find_prescriptions(&self, ids: &[String]) -> Result<Vec<Prescription>, StoreError> {
        let collections = self.collections.read().await;
        let prescriptions = ids
            .iter()
            .filter_map(|id| collections.prescriptions.get(id))
            .cloned()
            .collect();
        Ok(prescriptions)
    }

    async fn link_prescription(
        &self,
        patient_id: &str,
        prescription_id: &str,
    ) -> Result<bool, StoreError> {
        if self.fail_links.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "link writes are failing".to_string(),
            });
        }

        let mut collections = self.collections.write().await;
        match collections.patients.get_mut(patient_id) {
            Some(record) => {
                record.prescriptions.push(prescription_id.to_owned());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
