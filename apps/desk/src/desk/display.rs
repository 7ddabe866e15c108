//! Markdown rendering of applicants for the chat.

use crate::models::{Applicant, ApplicantSummary, NestedRecord, RecordType};
use crate::wizard::schema::schema;

/// Telegram rejects messages above 4096 characters.
pub const MESSAGE_LIMIT: usize = 4000;

/// Numbered listing of nested entries with schema labels.
pub fn format_nested_array(records: &[NestedRecord]) -> String {
    if records.is_empty() {
        return "None".to_string();
    }
    let mut out = Vec::new();
    for (i, record) in records.iter().enumerate() {
        let schema = schema(record.record_type());
        out.push(format!("\n*Entry {}:*", i + 1));
        for (field, value) in record.fields() {
            out.push(format!("  • {}: {value}", schema.label(field)));
        }
    }
    out.join("\n")
}

pub fn applicant_list(users: &[ApplicantSummary], expiration_label: Option<&str>) -> String {
    if users.is_empty() {
        return "No applicants found.".to_string();
    }
    let dash = || "-".to_string();
    users
        .iter()
        .map(|u| {
            let mut entry = format!(
                "• {} {}\n  📧 `{}`\n  📱 {}\n",
                u.first_name.clone().unwrap_or_else(dash),
                u.last_name.clone().unwrap_or_else(dash),
                u.alias_email.clone().unwrap_or_else(dash),
                u.whatsapp.clone().unwrap_or_else(|| "N/A".to_string()),
            );
            if let Some(label) = expiration_label {
                entry.push_str(&format!(
                    "  📅 {label}: {}\n",
                    u.subscription_expiration.clone().unwrap_or_else(dash)
                ));
            }
            entry
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn list_or_dash(a: &Applicant, column: &str) -> String {
    let items = a.string_list(column);
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

// Malformed stored entries are shown as a note instead of failing the card.
fn nested_section(a: &Applicant, rt: RecordType, line: fn(&NestedRecord) -> String) -> String {
    match a.nested(rt) {
        Ok(records) if records.is_empty() => "-".to_string(),
        Ok(records) => records.iter().map(line).collect::<Vec<_>>().join("\n\n"),
        Err(e) => format!("⚠️ {}", e.user_message()),
    }
}

fn or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "-",
    }
}

fn role_line(r: &NestedRecord) -> String {
    let current = r.get("current").is_some_and(|c| c.eq_ignore_ascii_case("true"));
    format!(
        "• *{}* at {}\n  📍 {}\n  🗓️ {} → {}\n  📝 {}",
        or_dash(r.get("title")),
        or_dash(r.get("company")),
        or_dash(r.get("location")),
        or_dash(r.get("start")),
        if current { "Present" } else { or_dash(r.get("end")) },
        or_dash(r.get("description")),
    )
}

fn education_line(e: &NestedRecord) -> String {
    format!(
        "• *{}*, {}\n  🏫 {}\n  🗓️ {} → {}",
        or_dash(e.get("degree")),
        or_dash(e.get("field")),
        or_dash(e.get("school")),
        or_dash(e.get("start")),
        or_dash(e.get("end")),
    )
}

fn certificate_line(c: &NestedRecord) -> String {
    format!(
        "• *{}*\n  🆔 {}\n  🗓️ {} → {}",
        or_dash(c.get("name")),
        or_dash(c.get("number")),
        or_dash(c.get("start")),
        or_dash(c.get("end")),
    )
}

fn language_line(l: &NestedRecord) -> String {
    format!(
        "• *{}*: {}",
        or_dash(l.get("language")),
        or_dash(l.get("proficiency"))
    )
}

/// Full applicant card, one message per section, each within [`MESSAGE_LIMIT`].
pub fn applicant_details(a: &Applicant) -> Vec<String> {
    let d = |c: &str| a.display(c);
    let sections = vec![
        format!(
            "🚨 *APPLICANT DETAILS*\n\n👤 {} {}\n✒️ Plan: {}\n📧 Alias: `{}`\n📧 Personal email: `{}`",
            d("first_name"),
            d("last_name"),
            d("application_plan"),
            d("alias_email"),
            d("email"),
        ),
        format!(
            "🔎 *Search Preferences*\n\nApplying for: `{}`\nSearch AI Accuracy: `{}`\nEmployment Type: `{}`\nCountry Preference: `{}`",
            d("apply_role"),
            d("search_accuracy"),
            d("employment_type"),
            list_or_dash(a, "country_preference"),
        ),
        format!(
            "📞 *Contact Information*\n\nName: {} {}\nEmail: {}\nWhatsApp: {}\nLinkedIn: {}\nX/Twitter: {}\nGitHub: {}\nPortfolio: {}\nCV: {}",
            d("first_name"),
            d("last_name"),
            d("email"),
            d("whatsapp"),
            d("linkedin"),
            d("twitter"),
            d("github"),
            d("website"),
            d("cv_url"),
        ),
        format!(
            "🏠 *Address Information*\n\nStreet: {}\nBuilding No: {}\nApartment No: {}\nCity: {}\nCountry: {}\nZip Code: {}",
            d("street"),
            d("building"),
            d("apartment"),
            d("city"),
            d("country"),
            d("zip"),
        ),
        format!(
            "📝 *Legalisation*\n\nAuthorized Countries: {}\nVisa: {}\nWilling to relocate: {}\nTotal years of Experience: {} years",
            list_or_dash(a, "authorized_countries"),
            d("visa"),
            d("relocate"),
            d("experience"),
        ),
        format!("🎯 *Roles*\n\n{}", nested_section(a, RecordType::Roles, role_line)),
        format!(
            "🎓 *Education*\n\n{}",
            nested_section(a, RecordType::Education, education_line)
        ),
        format!(
            "📜 *Courses & Certificates*\n\n{}",
            nested_section(a, RecordType::Certificates, certificate_line)
        ),
        format!(
            "🌍 *Languages*\n\n{}",
            nested_section(a, RecordType::Languages, language_line)
        ),
        format!("🧰 *Skills*\n\n{}", list_or_dash(a, "skills")),
        format!(
            "💰 *Compensation Details*\n\nExpected Salary: {} {}\nCurrent Salary: {} {}\nPayment Status: {}\nSubscription until: {}",
            d("expected_salary_currency"),
            d("expected_salary"),
            d("expected_salary_currency"),
            d("current_salary"),
            d("payment"),
            d("subscription_expiration"),
        ),
        format!("🏆 *Achievements*\n\n{}", d("achievements")),
    ];
    sections
        .iter()
        .flat_map(|s| chunk_text(s, MESSAGE_LIMIT))
        .collect()
}

/// Splits `text` into pieces of at most `limit` characters, preferring line breaks.
pub fn chunk_text(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let mut line = line;
        loop {
            let line_len = line.chars().count();
            if current_len + line_len <= limit {
                current.push_str(line);
                current_len += line_len;
                break;
            }
            if current_len > 0 {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
                continue;
            }
            // A single line longer than the limit is cut at a char boundary.
            let cut = line
                .char_indices()
                .nth(limit)
                .map(|(i, _)| i)
                .unwrap_or(line.len());
            chunks.push(line[..cut].to_string());
            line = &line[cut..];
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
