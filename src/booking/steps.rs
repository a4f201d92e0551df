//! Form payloads for each page of the booking wizard.

use chrono::NaiveDate;

use crate::config::BookingConfig;

/// Terms text the site expects to be echoed back on the agreement page.
pub const AGREEMENT_TEXT: &str = "För att kunna genomföra tidsbokning för ansökan om pass och/eller id-kort krävs att dina personuppgifter behandlas. Det är nödvändigt för att Polismyndigheten ska kunna utföra de uppgifter som följer av passförordningen (1979:664) och förordningen (2006:661) om nationellt identitetskort och som ett led i myndighetsutövning. För att åtgärda eventuellt uppkomna fel kan också systemleverantören komma att nås av personuppgifterna. Samtliga uppgifter raderas ur tidsbokningssystemet dagen efter besöket.";

const NEXT: &str = "Nästa";

/// One POST of the wizard: a human-readable label plus ordered form fields.
///
/// Field order matters: repeated keys such as `AcceptInformationStorage` are
/// sent in the order the site's own form emits them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormStep {
    /// Label used in logs and error messages.
    pub label: &'static str,
    /// Form fields in submission order.
    pub fields: Vec<(String, String)>,
}

impl FormStep {
    const fn new(label: &'static str) -> Self {
        Self {
            label,
            fields: Vec::new(),
        }
    }

    fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Returns every value submitted under `name`, in order.
    #[must_use]
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

/// Build the four wizard steps for a search starting at `from`.
#[must_use]
pub fn wizard_steps(config: &BookingConfig, from: NaiveDate) -> Vec<FormStep> {
    let start = FormStep::new("Boka ny tid")
        .field("FormId", "1")
        .field("ServiceGroupId", config.service_group_id.to_string())
        .field("StartNextButton", "Boka ny tid");

    let terms = FormStep::new("Godkänn villkor")
        .field("AgreementText", AGREEMENT_TEXT)
        .field("AcceptInformationStorage", "true")
        .field("AcceptInformationStorage", "false")
        .field("NumberOfPeople", config.number_of_people.to_string())
        .field("Next", NEXT);

    let residency = (0..config.number_of_people)
        .fold(FormStep::new("Bor i Sverige"), |step, index| {
            step.field(
                format!("ServiceCategoryCustomers[{index}].CustomerIndex"),
                index.to_string(),
            )
            .field(
                format!("ServiceCategoryCustomers[{index}].ServiceCategoryId"),
                config.service_category_id.to_string(),
            )
        })
        .field("Next", NEXT);

    let search = FormStep::new("Första lediga tid")
        .field("FormId", "1")
        .field("NumberOfPeople", config.number_of_people.to_string())
        .field("RegionId", "0")
        .field("SectionId", "0")
        .field("NQServiceTypeId", "1")
        .field("FromDateString", from.format("%Y-%m-%d").to_string())
        .field("SearchTimeHour", config.search_hour.to_string())
        .field("TimeSearchFirstAvailableButton", "Första lediga tid");

    vec![start, terms, residency, search]
}
