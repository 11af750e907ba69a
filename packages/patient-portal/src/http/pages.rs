use crate::{
    error::Error,
    model::{PatientForm, PatientRecord, PrescriptionForm, ResolvedPatient},
};
use axum::response::Html;
use tera::{Context, Tera};

const TEMPLATES: [(&str, &str); 9] = [
    ("layout.html", include_str!("templates/layout.html")),
    ("add_patient.html", include_str!("templates/add_patient.html")),
    ("all_patients.html", include_str!("templates/all_patients.html")),
    ("code.html", include_str!("templates/code.html")),
    ("password_prompt.html", include_str!("templates/password_prompt.html")),
    ("dashboard.html", include_str!("templates/dashboard.html")),
    ("view_patient.html", include_str!("templates/view_patient.html")),
    ("edit_patient.html", include_str!("templates/edit_patient.html")),
    ("prescription.html", include_str!("templates/prescription.html")),
];

///
/// HTML pages, compiled into the binary.
///
/// Templates are `.html`, so Tera escapes every interpolated value.
///
pub struct Pages {
    tera: Tera,
}

impl Pages {
    pub fn new() -> Result<Pages, Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES)?;
        Ok(Pages { tera })
    }

    fn render(&self, template: &str, context: &Context) -> Result<Html<String>, Error> {
        Ok(Html(self.tera.render(template, context)?))
    }

    pub fn add_patient(&self, form: &PatientForm, error: Option<&str>) -> Result<Html<String>, Error> {
        let mut context = Context::new();
        context.insert("form", form);
        context.insert("error", &error);
        self.render("add_patient.html", &context)
    }

    pub fn all_patients(&self, patients: &[PatientRecord]) -> Result<Html<String>, Error> {
        let mut context = Context::new();
        context.insert("patients", patients);
        self.render("all_patients.html", &context)
    }

    pub fn code(&self, patient_url: &str, error: Option<&str>) -> Result<Html<String>, Error> {
        let mut context = Context::new();
        context.insert("patient_url", patient_url);
        context.insert("error", &error);
        self.render("code.html", &context)
    }

    pub fn password_prompt(&self, record_id: &str, error: Option<&str>) -> Result<Html<String>, Error> {
        let mut context = Context::new();
        context.insert("record_id", record_id);
        context.insert("error", &error);
        self.render("password_prompt.html", &context)
    }

    pub fn dashboard(&self, record_id: &str) -> Result<Html<String>, Error> {
        let mut context = Context::new();
        context.insert("record_id", record_id);
        self.render("dashboard.html", &context)
    }

    pub fn view_patient(&self, patient: &ResolvedPatient) -> Result<Html<String>, Error> {
        let mut context = Context::new();
        context.insert("patient", patient);
        self.render("view_patient.html", &context)
    }

    pub fn edit_patient(
        &self,
        record_id: &str,
        form: &PatientForm,
        error: Option<&str>,
    ) -> Result<Html<String>, Error> {
        let mut context = Context::new();
        context.insert("record_id", record_id);
        context.insert("form", form);
        context.insert("error", &error);
        self.render("edit_patient.html", &context)
    }

    pub fn prescription(
        &self,
        record_id: &str,
        patient_name: &str,
        form: &PrescriptionForm,
        error: Option<&str>,
    ) -> Result<Html<String>, Error> {
        let mut context = Context::new();
        context.insert("record_id", record_id);
        context.insert("patient_name", patient_name);
        context.insert("form", form);
        context.insert("error", &error);
        self.render("prescription.html", &context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_templates_compile() {
        assert!(Pages::new().is_ok());
    }

    #[test]
    fn values_are_escaped() {
        let pages = Pages::new().unwrap();
        let form = PatientForm {
            name: "<script>alert(1)</script>".to_string(),
            ..Default::default()
        };
        let Html(html) = pages.add_patient(&form, Some("Missing required field doctor")).unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Missing required field doctor"));
    }

    #[test]
    fn prompt_posts_to_login() {
        let pages = Pages::new().unwrap();
        let Html(html) = pages
            .password_prompt("abc", Some("Incorrect password. Try again."))
            .unwrap();
        assert!(html.contains(r#"action="/patient/abc/login""#));
        assert!(html.contains("Incorrect password. Try again."));
    }
}
