use crate::{
    error::Error,
    log::RECORDS,
    model::{
        NewPatientForm, PatientFields, PatientForm, PatientRecord, Prescription, PrescriptionForm,
        ResolvedPatient,
    },
    password::PasswordHash,
    prometheus::{
        PRESCRIPTIONS_ADDED_TOTAL, PRESCRIPTIONS_UNLINKED_TOTAL, RECORDS_CREATED_TOTAL,
        RECORDS_UPDATED_TOTAL,
    },
    store::RecordStore,
};
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info, warn};

///
/// Patient record operations on top of a `RecordStore`.
///
/// Forms are validated here, before anything is written.
///
#[derive(Clone)]
pub struct Records {
    store: Arc<dyn RecordStore>,
}

impl Records {
    pub fn new(store: Arc<dyn RecordStore>) -> Records {
        Records { store }
    }

    ///
    /// Validate the form, hash the access password and save a new record with no prescriptions.
    ///
    pub async fn create(&self, form: &NewPatientForm) -> Result<PatientRecord, Error> {
        let (fields, password) = form.validate()?;

        let password = password.to_owned();
        let access_password =
            tokio::task::spawn_blocking(move || PasswordHash::new(&password)).await?;

        let record = self.store.insert_patient(fields, access_password).await?;

        counter!(RECORDS_CREATED_TOTAL).increment(1);
        info!(target: RECORDS, msg = "Patient record created", record_id = record.id);

        Ok(record)
    }

    pub async fn list(&self) -> Result<Vec<PatientRecord>, Error> {
        let records = self.store.list_patients().await?;
        debug!(target: RECORDS, msg = "Listed patient records", count = records.len());
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> Result<PatientRecord, Error> {
        self.store
            .find_patient(id)
            .await?
            .ok_or_else(|| Error::PatientNotFound { id: id.to_owned() })
    }

    ///
    /// The record with its prescription ids replaced by the prescriptions themselves
    ///
    pub async fn get_resolved(&self, id: &str) -> Result<ResolvedPatient, Error> {
        let record = self.get(id).await?;
        let prescriptions = self.store.find_prescriptions(&record.prescriptions).await?;

        if prescriptions.len() != record.prescriptions.len() {
            warn!(
                target: RECORDS,
                msg = "Patient record references missing prescriptions",
                record_id = record.id,
                expected = record.prescriptions.len(),
                found = prescriptions.len()
            );
        }

        Ok(ResolvedPatient {
            record,
            prescriptions,
        })
    }

    ///
    /// Replace the editable fields. The access password and prescriptions are kept.
    ///
    pub async fn update(&self, id: &str, form: &PatientForm) -> Result<PatientFields, Error> {
        let fields = form.validate()?;

        if !self.store.update_patient(id, fields.clone()).await? {
            return Err(Error::PatientNotFound { id: id.to_owned() });
        }

        counter!(RECORDS_UPDATED_TOTAL).increment(1);
        info!(target: RECORDS, msg = "Patient record updated", record_id = id);

        Ok(fields)
    }

    pub async fn add_prescription(
        &self,
        patient_id: &str,
        form: &PrescriptionForm,
    ) -> Result<Prescription, Error> {
        let fields = form.validate()?;

        // An unknown owner must not leave a prescription behind
        self.get(patient_id).await?;

        match self.store.add_prescription(patient_id, fields).await {
            Ok(prescription) => {
                counter!(PRESCRIPTIONS_ADDED_TOTAL).increment(1);
                info!(
                    target: RECORDS,
                    msg = "Prescription added",
                    record_id = patient_id,
                    prescription_id = prescription.id
                );
                Ok(prescription)
            }
            Err(err @ Error::PrescriptionNotLinked { .. }) => {
                counter!(PRESCRIPTIONS_UNLINKED_TOTAL).increment(1);
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn get_prescription(&self, id: &str) -> Result<Prescription, Error> {
        self.store
            .find_prescription(id)
            .await?
            .ok_or_else(|| Error::PrescriptionNotFound { id: id.to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::model::{patient_form_fixture, prescription_form_fixture};
    use crate::store::MemoryStore;

    fn new_patient() -> NewPatientForm {
        NewPatientForm {
            patient: patient_form_fixture(),
            access_password: "hunter2".to_string(),
        }
    }

    fn records() -> (Arc<MemoryStore>, Records) {
        let store = Arc::new(MemoryStore::new());
        let records = Records::new(store.clone());
        (store, records)
    }

    #[tokio::test]
    async fn created_record_is_retrievable() {
        let (_, records) = records();
        let record = records.create(&new_patient()).await.unwrap();

        let found = records.get(&record.id).await.unwrap();
        assert_eq!(found.fields.name, "Ada Lovelace");
        assert!(found.prescriptions.is_empty());
        assert!(found.access_password.verify("hunter2"));
    }

    #[tokio::test]
    async fn invalid_record_is_not_persisted() {
        let (_, records) = records();
        let mut form = new_patient();
        form.patient.bed_number.clear();

        let err = records.create(&form).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingField { name: "bed_number" })
        ));
        assert!(records.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let (_, records) = records();
        let err = records.get("nope").await.unwrap_err();
        assert!(err.is_not_found());

        let err = records
            .update("nope", &patient_form_fixture())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PatientNotFound { .. }));
    }

    #[tokio::test]
    async fn update_only_changes_editable_fields() {
        let (_, records) = records();
        let record = records.create(&new_patient()).await.unwrap();
        records
            .add_prescription(&record.id, &prescription_form_fixture())
            .await
            .unwrap();
        let before = records.get(&record.id).await.unwrap();

        let form = PatientForm {
            symptoms: "Recovered".to_string(),
            ..patient_form_fixture()
        };
        records.update(&record.id, &form).await.unwrap();

        let after = records.get(&record.id).await.unwrap();
        assert_eq!(after.fields.symptoms, "Recovered");
        assert_eq!(after.access_password, before.access_password);
        assert_eq!(after.prescriptions, before.prescriptions);
    }

    #[tokio::test]
    async fn invalid_update_changes_nothing() {
        let (_, records) = records();
        let record = records.create(&new_patient()).await.unwrap();

        let form = PatientForm {
            name: String::new(),
            ..patient_form_fixture()
        };
        assert!(records.update(&record.id, &form).await.is_err());

        let after = records.get(&record.id).await.unwrap();
        assert_eq!(after.fields, record.fields);
    }

    #[tokio::test]
    async fn prescription_is_standalone_and_resolved() {
        let (_, records) = records();
        let record = records.create(&new_patient()).await.unwrap();

        let prescription = records
            .add_prescription(&record.id, &prescription_form_fixture())
            .await
            .unwrap();

        let standalone = records.get_prescription(&prescription.id).await.unwrap();
        assert_eq!(standalone.patient_id, record.id);

        let resolved = records.get_resolved(&record.id).await.unwrap();
        assert_eq!(resolved.prescriptions, vec![prescription]);
    }

    #[tokio::test]
    async fn prescription_survives_a_failed_link() {
        let (store, records) = records();
        let record = records.create(&new_patient()).await.unwrap();

        store.fail_links(true);
        let err = records
            .add_prescription(&record.id, &prescription_form_fixture())
            .await
            .unwrap_err();

        let prescription_id = match err {
            Error::PrescriptionNotLinked {
                prescription_id, ..
            } => prescription_id,
            other => panic!("expected PrescriptionNotLinked, got {other:?}"),
        };

        let orphan = records.get_prescription(&prescription_id).await.unwrap();
        assert_eq!(orphan.patient_id, record.id);

        let resolved = records.get_resolved(&record.id).await.unwrap();
        assert!(resolved.prescriptions.is_empty());
    }

    #[tokio::test]
    async fn prescription_for_unknown_patient_writes_nothing() {
        let (_, records) = records();
        let err = records
            .add_prescription("nope", &prescription_form_fixture())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PatientNotFound { .. }));
    }
}
