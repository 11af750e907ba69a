use super::{generate_id, RecordStore};
use crate::{
    config::DatabaseConfig,
    connect,
    error::{Error, StoreError},
    log::RECORDS,
    model::{PatientFields, PatientRecord, Prescription, PrescriptionFields},
    password::PasswordHash,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_postgres::{Client, Row};
use tracing::{debug, info, warn};

/// Tables for patient records and prescriptions. Safe to run more than once.
const SCHEMA: &str = include_str!("./sql/schema.sql");

/// Saves a prescription and appends it to its owner in one statement
const ADD_PRESCRIPTION: &str = include_str!("./sql/add_prescription.sql");

const PATIENT_COLUMNS: &str = "id, patient_id, name, phone_no, address, symptoms, reason, \
     admit_date, doctor, bed_number, access_password, prescriptions";

const PRESCRIPTION_COLUMNS: &str =
    "id, patient_id, date, time, doctor, medication, dosage, instructions";

///
/// PostgreSQL record store.
///
/// Holds one client. A client whose connection has closed is replaced with a fresh connection
/// the next time it is needed.
///
pub struct PostgresStore {
    config: DatabaseConfig,
    client: RwLock<Arc<Client>>,
}

impl PostgresStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<PostgresStore, Error> {
        let client = connect::database(config).await?;
        Ok(PostgresStore {
            config: config.clone(),
            client: RwLock::new(Arc::new(client)),
        })
    }

    ///
    /// Create the tables if they do not exist yet
    ///
    pub async fn migrate(&self) -> Result<(), StoreError> {
        debug!(target: RECORDS, msg = "Applying schema");
        self.client().await?.batch_execute(SCHEMA).await?;
        Ok(())
    }

    ///
    /// The current client, reconnecting first if its connection has closed
    ///
    async fn client(&self) -> Result<Arc<Client>, StoreError> {
        {
            let client = self.client.read().await;
            if !client.is_closed() {
                return Ok(client.clone());
            }
        }

        let mut client = self.client.write().await;

        // Another request may have reconnected while this one waited for the lock
        if client.is_closed() {
            warn!(
                target: RECORDS,
                msg = "Database connection closed. Reconnecting",
                database = %self.config
            );

            let reconnected = connect::database(&self.config)
                .await
                .map_err(|err| match err {
                    Error::Store(err) => err,
                    err => StoreError::Unavailable {
                        reason: err.to_string(),
                    },
                })?;
            *client = Arc::new(reconnected);

            info!(target: RECORDS, msg = "Database reconnected", database = %self.config);
        }

        Ok(client.clone())
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn insert_patient(
        &self,
        fields: PatientFields,
        access_password: PasswordHash,
    ) -> Result<PatientRecord, StoreError> {
        let id = generate_id();
        let stored_password = access_password.to_string();

        self.client()
            .await?
            .execute(
                "INSERT INTO patients (id, patient_id, name, phone_no, address, symptoms, reason, \
                 admit_date, doctor, bed_number, access_password) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
                &[
                    &id,
                    &fields.patient_id,
                    &fields.name,
                    &fields.phone_no,
                    &fields.address,
                    &fields.symptoms,
                    &fields.reason,
                    &fields.admit_date,
                    &fields.doctor,
                    &fields.bed_number,
                    &stored_password,
                ],
            )
            .await?;

        Ok(PatientRecord {
            id,
            fields,
            access_password,
            prescriptions: Vec::new(),
        })
    }

    async fn list_patients(&self) -> Result<Vec<PatientRecord>, StoreError> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients ORDER BY seq");
        let rows = self.client().await?.query(&sql, &[]).await?;
        rows.iter().map(patient_from_row).collect()
    }

    async fn find_patient(&self, id: &str) -> Result<Option<PatientRecord>, StoreError> {
        let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1");
        let row = self.client().await?.query_opt(&sql, &[&id]).await?;
        row.as_ref().map(patient_from_row).transpose()
    }

    async fn update_patient(&self, id: &str, fields: PatientFields) -> Result<bool, StoreError> {
        let updated = self
            .client()
            .await?
            .execute(
                "UPDATE patients SET patient_id = $2, name = $3, phone_no = $4, address = $5, \
                 symptoms = $6, reason = $7, admit_date = $8, doctor = $9, bed_number = $10 \
                 WHERE id = $1",
                &[
                    &id,
                    &fields.patient_id,
                    &fields.name,
                    &fields.phone_no,
                    &fields.address,
                    &fields.symptoms,
                    &fields.reason,
                    &fields.admit_date,
                    &fields.doctor,
                    &fields.bed_number,
                ],
            )
            .await?;
        Ok(updated > 0)
    }

    async fn insert_prescription(
        &self,
        patient_id: &str,
        fields: PrescriptionFields,
    ) -> Result<Prescription, StoreError> {
        let id = generate_id();

        self.client()
            .await?
            .execute(
                "INSERT INTO prescriptions (id, patient_id, date, time, doctor, medication, \
                 dosage, instructions) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                &[
                    &id,
                    &patient_id,
                    &fields.date,
                    &fields.time,
                    &fields.doctor,
                    &fields.medication,
                    &fields.dosage,
                    &fields.instructions,
                ],
            )
            .await?;

        Ok(Prescription {
            id,
            patient_id: patient_id.to_owned(),
            fields,
        })
    }

    async fn find_prescription(&self, id: &str) -> Result<Option<Prescription>, StoreError> {
        let sql = format!("SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE id = $1");
        let row = self.client().await?.query_opt(&sql, &[&id]).await?;
        row.as_ref().map(prescription_from_row).transpose()
    }

    async fn find_prescriptions(&self, ids: &[String]) -> Result<Vec<Prescription>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!("SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE id = ANY($1)");
        let rows = self.client().await?.query(&sql, &[&ids]).await?;

        let mut by_id = rows
            .iter()
            .map(prescription_from_row)
            .map(|p| p.map(|p| (p.id.clone(), p)))
            .collect::<Result<HashMap<_, _>, _>>()?;

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn link_prescription(
        &self,
        patient_id: &str,
        prescription_id: &str,
    ) -> Result<bool, StoreError> {
        let updated = self
            .client()
            .await?
            .execute(
                "UPDATE patients SET prescriptions = array_append(prescriptions, $2) WHERE id = $1",
                &[&patient_id, &prescription_id],
            )
            .await?;
        Ok(updated > 0)
    }

    async fn add_prescription(
        &self,
        patient_id: &str,
        fields: PrescriptionFields,
    ) -> Result<Prescription, Error> {
        let id = generate_id();

        let row = self
            .client()
            .await?
            .query_opt(
                ADD_PRESCRIPTION,
                &[
                    &id,
                    &patient_id,
                    &fields.date,
                    &fields.time,
                    &fields.doctor,
                    &fields.medication,
                    &fields.dosage,
                    &fields.instructions,
                ],
            )
            .await
            .map_err(StoreError::from)?;

        if row.is_none() {
            return Err(Error::PatientNotFound {
                id: patient_id.to_owned(),
            });
        }

        Ok(Prescription {
            id,
            patient_id: patient_id.to_owned(),
            fields,
        })
    }
}

fn patient_from_row(row: &Row) -> Result<PatientRecord, StoreError> {
    let access_password = row
        .try_get::<_, String>("access_password")?
        .parse::<PasswordHash>()?;

    Ok(PatientRecord {
        id: row.try_get("id")?,
        fields: PatientFields {
            patient_id: row.try_get("patient_id")?,
            name: row.try_get("name")?,
            phone_no: row.try_get("phone_no")?,
            address: row.try_get("address")?,
            symptoms: row.try_get("symptoms")?,
            reason: row.try_get("reason")?,
            admit_date: row.try_get("admit_date")?,
            doctor: row.try_get("doctor")?,
            bed_number: row.try_get("bed_number")?,
        },
        access_password,
        prescriptions: row.try_get("prescriptions")?,
    })
}

fn prescription_from_row(row: &Row) -> Result<Prescription, StoreError> {
    Ok(Prescription {
        id: row.try_get("id")?,
        patient_id: row.try_get("patient_id")?,
        fields: PrescriptionFields {
            date: row.try_get("date")?,
            time: row.try_get("time")?,
            doctor: row.try_get("doctor")?,
            medication: row.try_get("medication")?,
            dosage: row.try_get("dosage")?,
            instructions: row.try_get("instructions")?,
        },
    })
}
