use super::{required, required_date, Prescription, DATE_FORMAT};
use crate::error::ValidationError;
use crate::password::PasswordHash;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

///
/// The editable scalar fields of a patient record.
///
/// Everything here is required.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PatientFields {
    /// External (hospital) identifier, distinct from the record id
    pub patient_id: String,
    pub name: String,
    pub phone_no: String,
    pub address: String,
    pub symptoms: String,
    /// Reason for admission
    pub reason: String,
    pub admit_date: NaiveDate,
    /// Attending doctor
    pub doctor: String,
    pub bed_number: String,
}

///
/// A stored patient record.
///
/// `id` is generated on creation and never changes. It is the only key embedded in the link
/// handed out with the record's code.
///
#[derive(Clone, Debug, Serialize)]
pub struct PatientRecord {
    pub id: String,
    #[serde(flatten)]
    pub fields: PatientFields,
    #[serde(skip)]
    pub access_password: PasswordHash,
    /// Prescription ids in creation order
    pub prescriptions: Vec<String>,
}

///
/// A patient record with its prescription references replaced by the prescriptions themselves.
/// References that no longer resolve are dropped.
///
#[derive(Clone, Debug, Serialize)]
pub struct ResolvedPatient {
    pub record: PatientRecord,
    pub prescriptions: Vec<Prescription>,
}

///
/// Patient form as submitted by the browser.
///
/// Every field defaults to empty so that an incomplete submission reaches validation and
/// re-renders the form instead of being rejected by the extractor.
///
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PatientForm {
    pub patient_id: String,
    pub name: String,
    pub phone_no: String,
    pub address: String,
    pub symptoms: String,
    pub reason: String,
    pub admit_date: String,
    pub doctor: String,
    pub bed_number: String,
}

///
/// New patient form: the patient fields plus the caregiver-chosen access password.
///
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct NewPatientForm {
    #[serde(flatten)]
    pub patient: PatientForm,
    pub access_password: String,
}

impl PatientForm {
    pub fn validate(&self) -> Result<PatientFields, ValidationError> {
        Ok(PatientFields {
            patient_id: required("patient_id", &self.patient_id)?,
            name: required("name", &self.name)?,
            phone_no: required("phone_no", &self.phone_no)?,
            address: required("address", &self.address)?,
            symptoms: required("symptoms", &self.symptoms)?,
            reason: required("reason", &self.reason)?,
            admit_date: required_date("admit_date", &self.admit_date)?,
            doctor: required("doctor", &self.doctor)?,
            bed_number: required("bed_number", &self.bed_number)?,
        })
    }
}

impl From<&PatientFields> for PatientForm {
    fn from(fields: &PatientFields) -> Self {
        PatientForm {
            patient_id: fields.patient_id.clone(),
            name: fields.name.clone(),
            phone_no: fields.phone_no.clone(),
            address: fields.address.clone(),
            symptoms: fields.symptoms.clone(),
            reason: fields.reason.clone(),
            admit_date: fields.admit_date.format(DATE_FORMAT).to_string(),
            doctor: fields.doctor.clone(),
            bed_number: fields.bed_number.clone(),
        }
    }
}

impl NewPatientForm {
    ///
    /// Validated patient fields and the raw password. The password is required but is not
    /// trimmed; whitespace is part of the secret.
    ///
    pub fn validate(&self) -> Result<(PatientFields, &str), ValidationError> {
        let fields = self.patient.validate()?;
        if self.access_password.is_empty() {
            return Err(ValidationError::MissingField {
                name: "access_password",
            });
        }
        Ok((fields, &self.access_password))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn complete_form() -> PatientForm {
        PatientForm {
            patient_id: "MRN-0042".to_string(),
            name: "Ada Lovelace".to_string(),
            phone_no: "555-0101".to_string(),
            address: "12 St James's Square".to_string(),
            symptoms: "Fever".to_string(),
            reason: "Observation".to_string(),
            admit_date: "2024-03-01".to_string(),
            doctor: "Dr. Babbage".to_string(),
            bed_number: "B7".to_string(),
        }
    }

    #[test]
    fn complete_form_validates() {
        let fields = complete_form().validate().unwrap();
        assert_eq!(fields.patient_id, "MRN-0042");
        assert_eq!(fields.admit_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn every_field_is_required() {
        let blanks: [(&str, fn(&mut PatientForm)); 9] = [
            ("patient_id", |f| f.patient_id.clear()),
            ("name", |f| f.name.clear()),
            ("phone_no", |f| f.phone_no.clear()),
            ("address", |f| f.address.clear()),
            ("symptoms", |f| f.symptoms.clear()),
            ("reason", |f| f.reason.clear()),
            ("admit_date", |f| f.admit_date.clear()),
            ("doctor", |f| f.doctor.clear()),
            ("bed_number", |f| f.bed_number.clear()),
        ];

        for (field, blank) in blanks {
            let mut form = complete_form();
            blank(&mut form);
            match form.validate() {
                Err(ValidationError::MissingField { name }) => assert_eq!(name, field),
                other => panic!("expected {field} to be missing, got {other:?}"),
            }
        }
    }

    #[test]
    fn new_patient_requires_password() {
        let form = NewPatientForm {
            patient: complete_form(),
            access_password: String::new(),
        };
        assert!(matches!(
            form.validate(),
            Err(ValidationError::MissingField {
                name: "access_password"
            })
        ));
    }

    #[test]
    fn form_round_trips_stored_fields() {
        let fields = complete_form().validate().unwrap();
        let form = PatientForm::from(&fields);
        assert_eq!(form.admit_date, "2024-03-01");
        assert_eq!(form.validate().unwrap(), fields);
    }
}
