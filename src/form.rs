//! Data-entry form description derived from the loaded artifacts.
//!
//! Front-ends render one field per schema column: a selection for encoded
//! columns, a number entry for the rest. Hint ranges are shown to the user but
//! never enforced by the pipeline.

use crate::config::FieldHint;
use crate::models::encoder::EncoderRegistry;
use crate::models::schema::FeatureSchema;
use serde::Serialize;
use std::collections::HashMap;

/// How a field is entered
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    /// Pick one of the encoder's known classes
    Categorical { options: Vec<String> },
    /// Free numeric entry
    Numeric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub column: String,
    pub hint: String,
    pub kind: FieldKind,
}

/// Ordered form fields, one per schema column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormDescriptor {
    pub fields: Vec<FormField>,
}

const DEFAULT_HINTS: &[(&str, &str)] = &[
    ("Gender", "Select gender identity"),
    ("Department", "Department the employee works in"),
    ("EducationLevel", "Highest education level attained"),
    ("HasMentalHealthSupport", "Does the company offer mental health support?"),
    ("HasTherapyAccess", "Does the employee have access to therapy or counseling?"),
    ("RemoteWork", "Is the employee working remotely?"),
    ("CompanySize", "Company size (e.g., 1-10, 11-50...)"),
    ("MentalHealthCoverage", "Does company cover mental health expenses?"),
    ("Age", "Age in years (18-65)"),
    ("WorkHoursPerWeek", "Typical hours worked per week (30-80)"),
    ("YearsInCompany", "Years spent at current company (0-40)"),
    ("SleepHours", "Average hours of sleep per day (0-12)"),
    ("PhysicalActivityHrs", "Exercise hours per week (0-20)"),
    ("WorkLifeBalanceScore", "Self-rated work-life balance (1-10)"),
    ("StressLevel", "Self-rated stress level (1 = low, 10 = high)"),
    ("EngagementScore", "Engagement level at work (1-10)"),
    ("SocialSupportScore", "Support from coworkers/supervisors (1-10)"),
    ("CommuteTime", "Daily commute duration in minutes (0-180)"),
    ("ManagerSupportScore", "Support from manager/supervisor (1 = low, 10 = high)"),
    ("CareerGrowthScore", "Perceived career growth opportunities (1 = poor, 10 = strong)"),
    ("BurnoutLevel", "Self-assessed burnout level (1 = low, 10 = high)"),
];

/// Describe the form for `schema`, with `overrides` taking precedence over
/// the built-in hints.
pub fn describe_form(
    schema: &FeatureSchema,
    encoders: &EncoderRegistry,
    overrides: &[FieldHint],
) -> FormDescriptor {
    let mut hints: HashMap<&str, &str> = DEFAULT_HINTS.iter().copied().collect();
    for h in overrides {
        hints.insert(h.column.as_str(), h.hint.as_str());
    }

    let fields = schema
        .columns()
        .iter()
        .map(|column| FormField {
            column: column.clone(),
            hint: hints.get(column.as_str()).copied().unwrap_or_default().to_string(),
            kind: match encoders.get(column) {
                Some(encoder) => FieldKind::Categorical {
                    options: encoder.classes().to_vec(),
                },
                None => FieldKind::Numeric,
            },
        })
        .collect();

    FormDescriptor { fields }
}
