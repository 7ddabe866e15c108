//! Wizard Engine: walks one repeating record through its schema, a field per turn.
//!
//! The engine is pure. It never touches a store; `Advance::Finished` hands the
//! completed record back to the caller, which owns persistence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{NestedRecord, RecordType};
use crate::transport::Widget;
use crate::wizard::schema::{schema, FieldKind};
use crate::wizard::validators::{self, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardOp {
    Add,
    Edit,
}

/// Progress through one record. Lives inside the session between turns.
///
/// `accumulated` only ever holds answers for `fields[..field_cursor]`. When
/// editing, the stored entry is kept in `original` and shown as the current
/// value of each prompt; every field is still walked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WizardState {
    pub record_type: RecordType,
    pub operation: WizardOp,
    pub target_index: Option<usize>,
    pub field_cursor: usize,
    pub accumulated: BTreeMap<String, String>,
    #[serde(default)]
    pub original: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldPrompt {
    pub text: String,
    pub widget: Widget,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// Input rejected; cursor and answers are untouched.
    Reprompt {
        error: ValidationError,
        prompt: FieldPrompt,
    },
    NextField(FieldPrompt),
    Finished(NestedRecord),
}

impl WizardState {
    pub fn for_add(record_type: RecordType) -> Self {
        Self {
            record_type,
            operation: WizardOp::Add,
            target_index: None,
            field_cursor: 0,
            accumulated: BTreeMap::new(),
            original: BTreeMap::new(),
        }
    }

    pub fn for_edit(index: usize, existing: &NestedRecord) -> Self {
        Self {
            record_type: existing.record_type(),
            operation: WizardOp::Edit,
            target_index: Some(index),
            field_cursor: 0,
            accumulated: BTreeMap::new(),
            original: existing.to_fields(),
        }
    }

    fn current_field(&self) -> Result<&'static str, AppError> {
        schema(self.record_type)
            .fields
            .get(self.field_cursor)
            .copied()
            .ok_or_else(|| {
                AppError::InvalidState(format!(
                    "{} wizard has no field at position {}",
                    self.record_type, self.field_cursor
                ))
            })
    }

    /// Prompt and expected widget for the field under the cursor.
    pub fn prompt(&self) -> Result<FieldPrompt, AppError> {
        let field = self.current_field()?;
        let schema = schema(self.record_type);
        let current = self.original.get(field).map(String::as_str).unwrap_or("");
        let text = validators::prompt_for(
            self.record_type,
            field,
            self.operation == WizardOp::Edit,
            current,
        );
        let widget = match schema.kind(field) {
            FieldKind::Boolean => Widget::TwoChoice,
            FieldKind::Select => Widget::options(schema.options(field)),
            FieldKind::Text | FieldKind::Date => Widget::FreeText,
        };
        Ok(FieldPrompt { text, widget })
    }

    /// Applies one answer to the field under the cursor.
    ///
    /// Choice answers arrive here the same way as typed text.
    pub fn advance(&mut self, raw_input: &str) -> Result<Advance, AppError> {
        let field = self.current_field()?;
        let schema = schema(self.record_type);
        let input = raw_input.trim();

        let skipped = validators::is_blank_marker(input)
            && validators::is_optional(self.record_type, field);
        let value = if skipped {
            String::new()
        } else {
            match schema.kind(field) {
                FieldKind::Date => match validators::validate_month_date(input) {
                    Ok(Some(_)) => input.to_string(),
                    Ok(None) => String::new(),
                    Err(error) => {
                        return Ok(Advance::Reprompt {
                            error,
                            prompt: self.prompt()?,
                        })
                    }
                },
                FieldKind::Select if !schema.options(field).contains(&input) => {
                    return Ok(Advance::Reprompt {
                        error: ValidationError::NotAnOption(input.to_string()),
                        prompt: self.prompt()?,
                    })
                }
                _ => input.to_string(),
            }
        };

        self.accumulated.insert(field.to_string(), value);
        self.field_cursor += 1;

        if self.field_cursor == schema.field_count() {
            return Ok(Advance::Finished(NestedRecord::from_fields(
                self.record_type,
                &self.accumulated,
            )));
        }
        Ok(Advance::NextField(self.prompt()?))
    }
}
