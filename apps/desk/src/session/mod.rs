//! Per-operator conversation state.

pub mod memory;
pub mod redis;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{Applicant, LookupKey};
use crate::transport::UserId;
use crate::wizard::{ArrayOp, WizardState};

/// Top-level operation a session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flow {
    /// Browsing menus; no operation started.
    #[default]
    Menu,
    Find,
    MarkDone,
    MarkPending,
    SetSubscription,
    ExtendSubscription,
    Edit,
    Archive,
    Restore,
}

impl Flow {
    const STARTABLE: [Flow; 8] = [
        Flow::Find,
        Flow::MarkDone,
        Flow::MarkPending,
        Flow::SetSubscription,
        Flow::ExtendSubscription,
        Flow::Edit,
        Flow::Archive,
        Flow::Restore,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Flow::Menu => "menu",
            Flow::Find => "find",
            Flow::MarkDone => "pay_done",
            Flow::MarkPending => "pay_pending",
            Flow::SetSubscription => "sub_set",
            Flow::ExtendSubscription => "sub_extend",
            Flow::Edit => "edit",
            Flow::Archive => "archive",
            Flow::Restore => "restore",
        }
    }

    /// Only flows an operator can start from a menu.
    pub fn from_code(code: &str) -> Option<Flow> {
        Flow::STARTABLE.into_iter().find(|f| f.code() == code)
    }
}

/// Flow-specific cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Idle,
    Identify,
    ChooseField,
    EditValue,
    MenuSelect,
    NestedMenu,
    NestedSelectEntry,
    NestedInput,
    ListMenu,
    ListAdd,
    ListRemove,
    SubscriptionDate,
    ExtendDays,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub flow: Flow,
    pub step: Step,
    pub lookup: Option<LookupKey>,
    /// Last read copy of the applicant. Display only; stale after any write.
    pub snapshot: Option<Applicant>,
    /// Catalog column being edited.
    pub column: Option<String>,
    pub nested_op: Option<ArrayOp>,
    pub wizard: Option<WizardState>,
}

impl Session {
    pub fn start(flow: Flow, step: Step) -> Self {
        Self {
            flow,
            step,
            ..Self::default()
        }
    }

    pub fn apply(&mut self, patch: SessionPatch) {
        if let Some(flow) = patch.flow {
            self.flow = flow;
        }
        if let Some(step) = patch.step {
            self.step = step;
        }
        if let Some(lookup) = patch.lookup {
            self.lookup = Some(lookup);
        }
        if let Some(snapshot) = patch.snapshot {
            self.snapshot = Some(snapshot);
        }
        if let Some(column) = patch.column {
            self.column = Some(column);
        }
        if let Some(op) = patch.nested_op {
            self.nested_op = op;
        }
        if let Some(wizard) = patch.wizard {
            self.wizard = wizard;
        }
    }
}

/// Shallow update: every `Some` replaces the session's value.
///
/// `nested_op` and `wizard` are doubly optional so a patch can clear them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    pub flow: Option<Flow>,
    pub step: Option<Step>,
    pub lookup: Option<LookupKey>,
    pub snapshot: Option<Applicant>,
    pub column: Option<String>,
    pub nested_op: Option<Option<ArrayOp>>,
    pub wizard: Option<Option<WizardState>>,
}

impl SessionPatch {
    pub fn step(step: Step) -> Self {
        Self {
            step: Some(step),
            ..Self::default()
        }
    }

    pub fn with_lookup(mut self, lookup: LookupKey) -> Self {
        self.lookup = Some(lookup);
        self
    }

    pub fn with_snapshot(mut self, snapshot: Applicant) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn with_nested_op(mut self, op: Option<ArrayOp>) -> Self {
        self.nested_op = Some(op);
        self
    }

    pub fn with_wizard(mut self, wizard: Option<WizardState>) -> Self {
        self.wizard = Some(wizard);
        self
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, user_id: UserId) -> Result<Option<Session>, AppError>;

    async fn set(&self, user_id: UserId, session: Session) -> Result<(), AppError>;

    /// Applies `patch` to the existing session, or to a fresh one.
    async fn merge(&self, user_id: UserId, patch: SessionPatch) -> Result<Session, AppError>;

    async fn clear(&self, user_id: UserId) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LookupField, RecordType};

    #[test]
    fn test_flow_codes_round_trip() {
        for flow in Flow::STARTABLE {
            assert_eq!(Flow::from_code(flow.code()), Some(flow));
        }
        assert_eq!(Flow::from_code("menu"), None);
    }

    #[test]
    fn test_apply_is_shallow() {
        let key = LookupKey::new(LookupField::AliasEmail, "a@b.com");
        let mut session = Session::start(Flow::Edit, Step::Identify);
        session.apply(SessionPatch::step(Step::ChooseField).with_lookup(key.clone()));
        assert_eq!(session.flow, Flow::Edit);
        assert_eq!(session.step, Step::ChooseField);
        assert_eq!(session.lookup, Some(key));
        assert_eq!(session.wizard, None);
    }

    #[test]
    fn test_apply_can_clear_wizard() {
        let mut session = Session::start(Flow::Edit, Step::NestedInput);
        session.wizard = Some(WizardState::for_add(RecordType::Roles));
        session.nested_op = Some(ArrayOp::Add);

        session.apply(
            SessionPatch::step(Step::NestedMenu)
                .with_wizard(None)
                .with_nested_op(None),
        );
        assert_eq!(session.wizard, None);
        assert_eq!(session.nested_op, None);
    }

    #[test]
    fn test_session_json_round_trip() {
        let mut session = Session::start(Flow::Edit, Step::NestedInput);
        session.wizard = Some(WizardState::for_add(RecordType::Languages));
        let json = serde_json::to_string(&session).unwrap();
        assert_eq!(serde_json::from_str::<Session>(&json).unwrap(), session);
    }
}
