use super::{optional, required, required_date};
use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PrescriptionFields {
    pub date: NaiveDate,
    pub time: String,
    pub doctor: String,
    pub medication: Option<String>,
    pub dosage: Option<String>,
    pub instructions: String,
}

///
/// A stored prescription.
///
/// `patient_id` holds the owning record id as a plain string; it is not checked against the
/// patient collection once written.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prescription {
    pub id: String,
    pub patient_id: String,
    #[serde(flatten)]
    pub fields: PrescriptionFields,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PrescriptionForm {
    pub date: String,
    pub time: String,
    pub doctor: String,
    pub medication: String,
    pub dosage: String,
    pub instructions: String,
}

impl PrescriptionForm {
    pub fn validate(&self) -> Result<PrescriptionFields, ValidationError> {
        Ok(PrescriptionFields {
            date: required_date("date", &self.date)?,
            time: required("time", &self.time)?,
            doctor: required("doctor", &self.doctor)?,
            medication: optional(&self.medication),
            dosage: optional(&self.dosage),
            instructions: required("instructions", &self.instructions)?,
        })
    }
}
