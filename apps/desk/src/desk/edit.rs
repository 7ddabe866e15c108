//! Top-Level Edit Dispatcher.
//!
//! `identify → choose_field → { edit_value | menu_select | nested_menu → … | list_menu → … }`
//!
//! Scalar and choice columns are written directly. Repeating-record columns go
//! through the wizard and the array controller; flat lists through `FlatLists`.

use tracing::info;

use crate::desk::{display, menus, stray, Desk};
use crate::errors::AppError;
use crate::models::{LookupKey, RecordType};
use crate::session::{Session, SessionPatch, SessionStore, Step};
use crate::store::{fetch, patch_of, Partition, RecordStore};
use crate::transport::{Action, Reply, UserId, Widget};
use crate::wizard::catalog::{editable_field, EditKind, EditableField, ListField};
use crate::wizard::flat_list::{parse_entries, split_entries};
use crate::wizard::validators::ValidationError;
use crate::wizard::{lookup, Advance, ArrayOp, ListOp, WizardOp};

fn require<T>(value: Option<T>, what: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::InvalidState(format!("session has no {what}")))
}

fn reprompt(error: &ValidationError, prompt: &str, widget: Widget) -> Reply {
    Reply::new(format!("❌ {error}\n\n{prompt}"), widget)
}

fn list_prompt(field: ListField, op: ListOp, current: &[String]) -> String {
    let example = if field.is_country_list() {
        "Germany, France, Canada"
    } else {
        "Python, JavaScript, Docker"
    };
    match op {
        ListOp::Remove => format!(
            "🗑️ *Remove {}*\n\nCurrent: {}\n\nEnter the values to remove, separated by commas:",
            field.label(),
            current.join(", ")
        ),
        _ => format!(
            "➕ *Add {}*\n\nEnter values separated by commas.\nExample: {example}",
            field.label()
        ),
    }
}

impl Desk {
    pub(super) async fn edit_text(
        &self,
        user_id: UserId,
        session: Session,
        text: &str,
    ) -> Result<Vec<Reply>, AppError> {
        match session.step {
            Step::Identify => self.identify_for_edit(user_id, text).await,
            Step::EditValue => self.write_scalar(user_id, &session, text).await,
            Step::NestedInput => self.wizard_input(user_id, session, text).await,
            Step::ListAdd | Step::ListRemove => self.list_input(user_id, &session, text).await,
            _ => Ok(vec![stray()]),
        }
    }

    pub(super) async fn edit_action(
        &self,
        user_id: UserId,
        session: Session,
        action: Action,
    ) -> Result<Vec<Reply>, AppError> {
        if session.lookup.is_none() {
            return Ok(vec![stray()]);
        }
        match (session.step, action) {
            (_, Action::Fields) => self.show_fields(user_id, &session).await,
            (Step::ChooseField, Action::EditColumn(column)) => {
                self.choose_field(user_id, &session, &column).await
            }
            (Step::MenuSelect, Action::Pick(value)) => {
                self.write_choice(user_id, &session, &value).await
            }
            (Step::NestedMenu, Action::Nested(op, rt)) => {
                self.nested_op(user_id, &session, op, rt).await
            }
            (Step::NestedSelectEntry, Action::SelectEntry(index)) => {
                self.nested_entry(user_id, &session, index).await
            }
            (Step::NestedInput, Action::Bool(value)) => {
                self.wizard_input(user_id, session, if value { "true" } else { "false" })
                    .await
            }
            (Step::NestedInput, Action::Pick(value)) => {
                self.wizard_input(user_id, session, &value).await
            }
            (Step::ListMenu, Action::List(op, field)) => {
                self.list_op(user_id, &session, op, field).await
            }
            _ => Ok(vec![stray()]),
        }
    }

    async fn identify_for_edit(&self, user_id: UserId, text: &str) -> Result<Vec<Reply>, AppError> {
        let key = lookup::resolve(text);
        let applicant = fetch(self.store.as_ref(), Partition::Active, &key).await?;
        let reply = menus::fields_menu(&applicant);
        self.sessions
            .merge(
                user_id,
                SessionPatch::step(Step::ChooseField)
                    .with_lookup(key)
                    .with_snapshot(applicant),
            )
            .await?;
        Ok(vec![reply])
    }

    async fn show_fields(&self, user_id: UserId, session: &Session) -> Result<Vec<Reply>, AppError> {
        let key = require(session.lookup.clone(), "applicant")?;
        let applicant = fetch(self.store.as_ref(), Partition::Active, &key).await?;
        let reply = menus::fields_menu(&applicant);
        self.sessions
            .merge(
                user_id,
                SessionPatch::step(Step::ChooseField)
                    .with_snapshot(applicant)
                    .with_nested_op(None)
                    .with_wizard(None),
            )
            .await?;
        Ok(vec![reply])
    }

    async fn choose_field(
        &self,
        user_id: UserId,
        session: &Session,
        column: &str,
    ) -> Result<Vec<Reply>, AppError> {
        let field = editable_field(column)?;
        let key = require(session.lookup.clone(), "applicant")?;

        let (step, reply) = match field.kind {
            EditKind::Text => {
                let current = session
                    .snapshot
                    .as_ref()
                    .map(|a| a.display(field.column))
                    .unwrap_or_else(|| "-".to_string());
                let reply = menus::back_to_fields(format!(
                    "✏️ Editing *{}*\n\nCurrent: `{current}`\n\nSend the new value:",
                    field.label
                ));
                (Step::EditValue, reply)
            }
            EditKind::Choice(options) => (
                Step::MenuSelect,
                Reply::new(format!("Select *{}*:", field.label), Widget::options(options)),
            ),
            EditKind::Nested(rt) => {
                let entries = self.arrays.view(&key, rt).await?;
                let reply = menus::nested_menu(
                    rt,
                    field.label,
                    &display::format_nested_array(&entries),
                    !entries.is_empty(),
                );
                (Step::NestedMenu, reply)
            }
            EditKind::List(list_field) => {
                let current = self.lists.view(&key, list_field).await?;
                (Step::ListMenu, menus::list_menu(list_field, &current))
            }
        };

        self.sessions
            .merge(user_id, SessionPatch::step(step).with_column(field.column))
            .await?;
        Ok(vec![reply])
    }

    fn session_field(session: &Session) -> Result<&'static EditableField, AppError> {
        editable_field(&require(session.column.clone(), "column")?)
    }

    async fn write_scalar(
        &self,
        user_id: UserId,
        session: &Session,
        text: &str,
    ) -> Result<Vec<Reply>, AppError> {
        let field = Self::session_field(session)?;
        if text.is_empty() {
            return Ok(vec![menus::back_to_fields(format!(
                "❌ Value cannot be empty.\n\nSend the new value for *{}*:",
                field.label
            ))]);
        }
        let key = require(session.lookup.clone(), "applicant")?;
        self.write_column(user_id, &key, field, text).await
    }

    async fn write_choice(
        &self,
        user_id: UserId,
        session: &Session,
        value: &str,
    ) -> Result<Vec<Reply>, AppError> {
        let field = Self::session_field(session)?;
        let EditKind::Choice(options) = field.kind else {
            return Ok(vec![stray()]);
        };
        if !options.contains(&value) {
            let error = ValidationError::NotAnOption(value.to_string());
            let prompt = format!("Select *{}*:", field.label);
            return Ok(vec![reprompt(&error, &prompt, Widget::options(options))]);
        }
        let key = require(session.lookup.clone(), "applicant")?;
        self.write_column(user_id, &key, field, value).await
    }

    async fn write_column(
        &self,
        user_id: UserId,
        key: &LookupKey,
        field: &EditableField,
        value: &str,
    ) -> Result<Vec<Reply>, AppError> {
        self.store
            .update(Partition::Active, key, patch_of(field.column, value))
            .await?;
        info!(%key, column = field.column, "column updated");
        self.sessions.clear(user_id).await?;
        Ok(vec![Reply::home(format!(
            "✅ *{}* updated successfully!\n\nNew value: `{value}`",
            field.label
        ))])
    }

    // ── repeating records ────────────────────────────────────────────────

    fn nested_type(session: &Session) -> Result<RecordType, AppError> {
        match Self::session_field(session)?.kind {
            EditKind::Nested(rt) => Ok(rt),
            _ => Err(AppError::InvalidState(
                "selected column is not a repeating record".into(),
            )),
        }
    }

    async fn nested_op(
        &self,
        user_id: UserId,
        session: &Session,
        op: ArrayOp,
        rt: RecordType,
    ) -> Result<Vec<Reply>, AppError> {
        if Self::nested_type(session)? != rt {
            return Ok(vec![stray()]);
        }
        let key = require(session.lookup.clone(), "applicant")?;
        let label = Self::session_field(session)?.label;

        match op {
            ArrayOp::Add => {
                let wizard = self.arrays.begin_add(rt);
                let prompt = wizard.prompt()?;
                self.sessions
                    .merge(
                        user_id,
                        SessionPatch::step(Step::NestedInput)
                            .with_nested_op(Some(op))
                            .with_wizard(Some(wizard)),
                    )
                    .await?;
                Ok(vec![Reply::new(
                    format!("➕ *Adding new {label} entry*\n\n{}", prompt.text),
                    prompt.widget,
                )])
            }
            ArrayOp::Edit | ArrayOp::Delete => {
                let entries = self.arrays.view(&key, rt).await?;
                if entries.is_empty() {
                    return Ok(vec![menus::back_to_fields(format!(
                        "❌ No {label} entries yet."
                    ))]);
                }
                self.sessions
                    .merge(
                        user_id,
                        SessionPatch::step(Step::NestedSelectEntry).with_nested_op(Some(op)),
                    )
                    .await?;
                let verb = if op == ArrayOp::Edit { "edit" } else { "delete" };
                Ok(vec![Reply::new(
                    format!(
                        "Select the entry to {verb}:\n{}",
                        display::format_nested_array(&entries)
                    ),
                    Widget::IndexChoice {
                        count: entries.len(),
                    },
                )])
            }
            ArrayOp::View => {
                let entries = self.arrays.view(&key, rt).await?;
                Ok(vec![menus::back_to_fields(format!(
                    "📋 *{label}*\n{}",
                    display::format_nested_array(&entries)
                ))])
            }
        }
    }

    async fn nested_entry(
        &self,
        user_id: UserId,
        session: &Session,
        index: usize,
    ) -> Result<Vec<Reply>, AppError> {
        let rt = Self::nested_type(session)?;
        let key = require(session.lookup.clone(), "applicant")?;
        let label = Self::session_field(session)?.label;

        match require(session.nested_op, "nested operation")? {
            ArrayOp::Edit => {
                let wizard = self.arrays.begin_edit(&key, rt, index).await?;
                let prompt = wizard.prompt()?;
                self.sessions
                    .merge(
                        user_id,
                        SessionPatch::step(Step::NestedInput).with_wizard(Some(wizard)),
                    )
                    .await?;
                Ok(vec![Reply::new(
                    format!("✏️ *Editing {label} entry {}*\n\n{}", index + 1, prompt.text),
                    prompt.widget,
                )])
            }
            ArrayOp::Delete => {
                let removed = self.arrays.delete(&key, rt, index).await?;
                self.sessions.clear(user_id).await?;
                Ok(vec![Reply::home(format!(
                    "🗑️ *{label} entry deleted*\n\n{}",
                    removed.summary()
                ))])
            }
            ArrayOp::Add | ArrayOp::View => Ok(vec![stray()]),
        }
    }

    async fn wizard_input(
        &self,
        user_id: UserId,
        session: Session,
        input: &str,
    ) -> Result<Vec<Reply>, AppError> {
        let mut wizard = require(session.wizard.clone(), "wizard")?;
        match wizard.advance(input)? {
            Advance::Reprompt { error, prompt } => {
                Ok(vec![reprompt(&error, &prompt.text, prompt.widget)])
            }
            Advance::NextField(prompt) => {
                self.sessions
                    .merge(user_id, SessionPatch::default().with_wizard(Some(wizard)))
                    .await?;
                Ok(vec![Reply::new(prompt.text, prompt.widget)])
            }
            Advance::Finished(record) => {
                let key = require(session.lookup.clone(), "applicant")?;
                let label = Self::session_field(&session)?.label;
                self.arrays.commit(&key, &wizard, record).await?;
                self.sessions.clear(user_id).await?;
                let verb = match wizard.operation {
                    WizardOp::Add => "added",
                    WizardOp::Edit => "updated",
                };
                Ok(vec![Reply::home(format!("✅ *{label} {verb} successfully!*"))])
            }
        }
    }

    // ── flat lists ───────────────────────────────────────────────────────

    fn list_field(session: &Session) -> Result<ListField, AppError> {
        match Self::session_field(session)?.kind {
            EditKind::List(field) => Ok(field),
            _ => Err(AppError::InvalidState(
                "selected column is not a list".into(),
            )),
        }
    }

    async fn list_op(
        &self,
        user_id: UserId,
        session: &Session,
        op: ListOp,
        field: ListField,
    ) -> Result<Vec<Reply>, AppError> {
        if Self::list_field(session)? != field {
            return Ok(vec![stray()]);
        }
        let key = require(session.lookup.clone(), "applicant")?;
        let current = self.lists.view(&key, field).await?;

        let step = match op {
            ListOp::View => {
                let shown = if current.is_empty() {
                    "None".to_string()
                } else {
                    current
                        .iter()
                        .map(|v| format!("• {v}"))
                        .collect::<Vec<_>>()
                        .join("\n")
                };
                return Ok(vec![menus::back_to_fields(format!(
                    "📋 *Current {}*\n\n{shown}",
                    field.label()
                ))]);
            }
            ListOp::Remove if current.is_empty() => {
                return Ok(vec![menus::back_to_fields(format!(
                    "❌ No {} to remove.",
                    field.label()
                ))]);
            }
            ListOp::Remove => Step::ListRemove,
            ListOp::Add => Step::ListAdd,
        };
        self.sessions.merge(user_id, SessionPatch::step(step)).await?;
        Ok(vec![menus::back_to_fields(list_prompt(field, op, &current))])
    }

    async fn list_input(
        &self,
        user_id: UserId,
        session: &Session,
        text: &str,
    ) -> Result<Vec<Reply>, AppError> {
        let field = Self::list_field(session)?;
        let key = require(session.lookup.clone(), "applicant")?;

        if session.step == Step::ListAdd {
            let entries = match parse_entries(field, text) {
                Ok(entries) => entries,
                Err(error) => {
                    let prompt = list_prompt(field, ListOp::Add, &[]);
                    return Ok(vec![reprompt(&error, &prompt, Widget::FreeText)]);
                }
            };
            let outcome = self.lists.add(&key, field, entries).await?;
            self.sessions.clear(user_id).await?;
            let mut text = format!("✅ *{} updated!*\n\n", field.label());
            if !outcome.added.is_empty() {
                text.push_str(&format!("Added: {}\n", outcome.added.join(", ")));
            }
            if !outcome.skipped.is_empty() {
                text.push_str(&format!("Already present: {}\n", outcome.skipped.join(", ")));
            }
            text.push_str(&format!("\nTotal: {}", outcome.total));
            return Ok(vec![Reply::home(text)]);
        }

        let entries = split_entries(text);
        if entries.is_empty() {
            let current = self.lists.view(&key, field).await?;
            let prompt = list_prompt(field, ListOp::Remove, &current);
            return Ok(vec![reprompt(
                &ValidationError::EmptyList,
                &prompt,
                Widget::FreeText,
            )]);
        }
        let outcome = self.lists.remove(&key, field, entries).await?;
        self.sessions.clear(user_id).await?;
        if outcome.removed.is_empty() {
            return Ok(vec![Reply::home(format!(
                "❌ None of those were found in {}.",
                field.label()
            ))]);
        }
        let remaining = if outcome.remaining.is_empty() {
            "None".to_string()
        } else {
            outcome.remaining.join(", ")
        };
        let mut text = format!(
            "✅ *{} updated!*\n\nRemoved: {}\n",
            field.label(),
            outcome.removed.join(", ")
        );
        if !outcome.not_found.is_empty() {
            text.push_str(&format!("Not found: {}\n", outcome.not_found.join(", ")));
        }
        text.push_str(&format!("\nRemaining: {remaining}"));
        Ok(vec![Reply::home(text)])
    }
}
