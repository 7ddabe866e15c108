//! Editable-field catalog and the fixed option lists behind choice fields.

use crate::errors::AppError;
use crate::models::RecordType;

pub const APPLICATION_PLAN_OPTIONS: &[&str] = &["casual", "normal", "intense"];

pub const YES_NO_OPTIONS: &[&str] = &["Yes", "No"];

pub const EMPLOYMENT_TYPE_OPTIONS: &[&str] = &["On-site", "Remote", "Hybrid"];

pub const SEARCH_ACCURACY_OPTIONS: &[&str] = &[
    "Broad Match",
    "Exact Match",
    ">=50%",
    ">=60%",
    ">=70%",
    ">=80%",
    ">=90%",
];

pub const LANGUAGE_PROFICIENCY_OPTIONS: &[&str] = &[
    "A0 Starter",
    "A1 Beginner",
    "A2 Elementary",
    "B1 Intermediate",
    "B2 Upper Intermediate",
    "C1 Advanced",
    "C2 Mastery",
];

pub const COUNTRIES: &[&str] = &[
    "Afghanistan", "Albania", "Algeria", "Andorra", "Angola", "Argentina", "Armenia",
    "Australia", "Austria", "Azerbaijan", "Bahamas", "Bahrain", "Bangladesh", "Barbados",
    "Belarus", "Belgium", "Belize", "Benin", "Bhutan", "Bolivia", "Bosnia and Herzegovina",
    "Botswana", "Brazil", "Brunei", "Bulgaria", "Burkina Faso", "Burundi", "Cambodia",
    "Cameroon", "Canada", "Cape Verde", "Central African Republic", "Chad", "Chile", "China",
    "Colombia", "Comoros", "Congo", "Costa Rica", "Croatia", "Cuba", "Cyprus", "Czech Republic",
    "Denmark", "Djibouti", "Dominica", "Dominican Republic", "East Timor", "Ecuador", "Egypt",
    "El Salvador", "Equatorial Guinea", "Eritrea", "Estonia", "Ethiopia", "Fiji", "Finland",
    "France", "Gabon", "Gambia", "Georgia", "Germany", "Ghana", "Greece", "Grenada", "Guatemala",
    "Guinea", "Guinea-Bissau", "Guyana", "Haiti", "Honduras", "Hungary", "Iceland", "India",
    "Indonesia", "Iran", "Iraq", "Ireland", "Israel", "Italy", "Ivory Coast", "Jamaica", "Japan",
    "Jordan", "Kazakhstan", "Kenya", "Kiribati", "North Korea", "South Korea", "Kuwait",
    "Kyrgyzstan", "Laos", "Latvia", "Lebanon", "Lesotho", "Liberia", "Libya", "Liechtenstein",
    "Lithuania", "Luxembourg", "Macedonia", "Madagascar", "Malawi", "Malaysia", "Maldives",
    "Mali", "Malta", "Marshall Islands", "Mauritania", "Mauritius", "Mexico", "Micronesia",
    "Moldova", "Monaco", "Mongolia", "Montenegro", "Morocco", "Mozambique", "Myanmar", "Namibia",
    "Nauru", "Nepal", "Netherlands", "New Zealand", "Nicaragua", "Niger", "Nigeria", "Norway",
    "Oman", "Pakistan", "Palau", "Panama", "Papua New Guinea", "Paraguay", "Peru", "Philippines",
    "Poland", "Portugal", "Qatar", "Romania", "Russia", "Rwanda", "Saint Kitts and Nevis",
    "Saint Lucia", "Saint Vincent and the Grenadines", "Samoa", "San Marino",
    "Sao Tome and Principe", "Saudi Arabia", "Senegal", "Serbia", "Seychelles", "Sierra Leone",
    "Singapore", "Slovakia", "Slovenia", "Solomon Islands", "Somalia", "South Africa", "Spain",
    "Sri Lanka", "Sudan", "Suriname", "Swaziland", "Sweden", "Switzerland", "Syria", "Taiwan",
    "Tajikistan", "Tanzania", "Thailand", "Togo", "Tonga", "Trinidad and Tobago", "Tunisia",
    "Turkey", "Turkmenistan", "Tuvalu", "Uganda", "Ukraine", "United Arab Emirates",
    "United Kingdom", "United States", "Uruguay", "Uzbekistan", "Vanuatu", "Vatican City",
    "Venezuela", "Vietnam", "Yemen", "Zambia", "Zimbabwe",
];

/// Columns holding a flat list of strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListField {
    Skills,
    AuthorizedCountries,
    CountryPreference,
}

impl ListField {
    pub const ALL: [ListField; 3] = [
        ListField::Skills,
        ListField::AuthorizedCountries,
        ListField::CountryPreference,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            ListField::Skills => "skills",
            ListField::AuthorizedCountries => "authorized_countries",
            ListField::CountryPreference => "country_preference",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ListField::Skills => "Skills",
            ListField::AuthorizedCountries => "Authorized Countries",
            ListField::CountryPreference => "Country Preferences",
        }
    }

    /// Entries must be names from [`COUNTRIES`].
    pub fn is_country_list(&self) -> bool {
        !matches!(self, ListField::Skills)
    }

    pub fn from_column(column: &str) -> Result<Self, AppError> {
        ListField::ALL
            .into_iter()
            .find(|f| f.column() == column)
            .ok_or_else(|| AppError::UnknownField(column.to_string()))
    }
}

/// How a catalog column is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Text,
    Choice(&'static [&'static str]),
    Nested(RecordType),
    List(ListField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditableField {
    pub column: &'static str,
    pub label: &'static str,
    pub kind: EditKind,
}

const fn field(column: &'static str, label: &'static str, kind: EditKind) -> EditableField {
    EditableField {
        column,
        label,
        kind,
    }
}

/// Every column an operator may edit, in menu order.
pub const EDITABLE_FIELDS: &[EditableField] = &[
    field("first_name", "First Name", EditKind::Text),
    field("last_name", "Last Name", EditKind::Text),
    field("email", "Personal Email", EditKind::Text),
    field("whatsapp", "WhatsApp", EditKind::Text),
    field(
        "application_plan",
        "Application Plan",
        EditKind::Choice(APPLICATION_PLAN_OPTIONS),
    ),
    field("cv_url", "CV Document", EditKind::Text),
    field("picture_url", "Profile Picture", EditKind::Text),
    field("recommendation_url", "Recommendation Letters", EditKind::Text),
    field("achievements", "Achievements", EditKind::Text),
    field(
        "authorized_countries",
        "Authorized Countries",
        EditKind::List(ListField::AuthorizedCountries),
    ),
    field("visa", "Visa Status", EditKind::Text),
    field("relocate", "Willing to Relocate", EditKind::Choice(YES_NO_OPTIONS)),
    field("experience", "Years of Experience", EditKind::Text),
    field(
        "employment_type",
        "Employment Type",
        EditKind::Choice(EMPLOYMENT_TYPE_OPTIONS),
    ),
    field(
        "search_accuracy",
        "Search Accuracy",
        EditKind::Choice(SEARCH_ACCURACY_OPTIONS),
    ),
    field(
        "country_preference",
        "Country Preferences",
        EditKind::List(ListField::CountryPreference),
    ),
    field("socials", "Social Media Links", EditKind::Text),
    field("apply_role", "Applying For Role", EditKind::Text),
    field("general", "General Information", EditKind::Text),
    field("skills", "Skills", EditKind::List(ListField::Skills)),
    field("roles", "Roles", EditKind::Nested(RecordType::Roles)),
    field("education", "Education", EditKind::Nested(RecordType::Education)),
    field("languages", "Languages", EditKind::Nested(RecordType::Languages)),
    field(
        "certificates",
        "Certificates",
        EditKind::Nested(RecordType::Certificates),
    ),
];

pub fn editable_field(column: &str) -> Result<&'static EditableField, AppError> {
    EDITABLE_FIELDS
        .iter()
        .find(|f| f.column == column)
        .ok_or_else(|| AppError::UnknownField(column.to_string()))
}

/// Catalog spelling of a country, matched case-insensitively.
pub fn canonical_country(input: &str) -> Option<&'static str> {
    let input = input.trim();
    COUNTRIES
        .iter()
        .copied()
        .find(|c| c.eq_ignore_ascii_case(input))
}

/// Columns a patch may touch: the catalog plus the payment/subscription columns.
pub fn is_writable_column(column: &str) -> bool {
    matches!(column, "payment" | "subscription_expiration")
        || EDITABLE_FIELDS.iter().any(|f| f.column == column)
}
