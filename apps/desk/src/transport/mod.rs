//! Chat transport boundary: inbound events, typed button actions, outbound
//! replies and the trait the desk sends through.

pub mod telegram;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::RecordType;
use crate::session::Flow;
use crate::wizard::catalog::ListField;
use crate::wizard::{ArrayOp, ListOp};

pub type UserId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Text,
    Choice,
}

/// One inbound operator interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEvent {
    pub user_id: UserId,
    pub kind: EventKind,
    pub payload: String,
}

impl ChatEvent {
    pub fn text(user_id: UserId, payload: impl Into<String>) -> Self {
        Self {
            user_id,
            kind: EventKind::Text,
            payload: payload.into(),
        }
    }

    pub fn choice(user_id: UserId, action: &Action) -> Self {
        Self {
            user_id,
            kind: EventKind::Choice,
            payload: action.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    Main,
    View,
    Payment,
    Subscription,
    Archive,
}

impl Menu {
    const ALL: [Menu; 5] = [
        Menu::Main,
        Menu::View,
        Menu::Payment,
        Menu::Subscription,
        Menu::Archive,
    ];

    fn code(&self) -> &'static str {
        match self {
            Menu::Main => "main",
            Menu::View => "view",
            Menu::Payment => "payment",
            Menu::Subscription => "subscription",
            Menu::Archive => "archive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    Pending,
    Done,
    Archived,
    Expired,
    ExpiringSoon,
}

impl Report {
    const ALL: [Report; 5] = [
        Report::Pending,
        Report::Done,
        Report::Archived,
        Report::Expired,
        Report::ExpiringSoon,
    ];

    fn code(&self) -> &'static str {
        match self {
            Report::Pending => "pending",
            Report::Done => "done",
            Report::Archived => "archived",
            Report::Expired => "expired",
            Report::ExpiringSoon => "expiring",
        }
    }
}

/// A button press, decoded from its compact callback string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `back`: drop the session and show the main menu.
    Home,
    Cancel,
    Open(Menu),
    Start(Flow),
    Report(Report),
    EditColumn(String),
    /// Return to the editable-field list for the identified applicant.
    Fields,
    Nested(ArrayOp, RecordType),
    List(ListOp, ListField),
    SelectEntry(usize),
    Bool(bool),
    Pick(String),
}

impl Action {
    /// `None` for anything this build does not understand.
    pub fn parse(data: &str) -> Option<Action> {
        match data {
            "back" => return Some(Action::Home),
            "cancel" => return Some(Action::Cancel),
            "fields" => return Some(Action::Fields),
            _ => {}
        }
        let (verb, arg) = data.split_once(':')?;
        let action = match verb {
            "menu" => Action::Open(Menu::ALL.into_iter().find(|m| m.code() == arg)?),
            "flow" => Action::Start(Flow::from_code(arg)?),
            "report" => Action::Report(Report::ALL.into_iter().find(|r| r.code() == arg)?),
            "edit_col" => Action::EditColumn(arg.to_string()),
            "nested_add" => Action::Nested(ArrayOp::Add, arg.parse().ok()?),
            "nested_edit" => Action::Nested(ArrayOp::Edit, arg.parse().ok()?),
            "nested_delete" => Action::Nested(ArrayOp::Delete, arg.parse().ok()?),
            "nested_view" => Action::Nested(ArrayOp::View, arg.parse().ok()?),
            "list_add" => Action::List(ListOp::Add, ListField::from_column(arg).ok()?),
            "list_remove" => Action::List(ListOp::Remove, ListField::from_column(arg).ok()?),
            "list_view" => Action::List(ListOp::View, ListField::from_column(arg).ok()?),
            "entry_select" => Action::SelectEntry(arg.parse().ok()?),
            "bool" => Action::Bool(arg.parse().ok()?),
            "pick" => Action::Pick(arg.to_string()),
            _ => return None,
        };
        Some(action)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Home => f.write_str("back"),
            Action::Cancel => f.write_str("cancel"),
            Action::Fields => f.write_str("fields"),
            Action::Open(menu) => write!(f, "menu:{}", menu.code()),
            Action::Start(flow) => write!(f, "flow:{}", flow.code()),
            Action::Report(report) => write!(f, "report:{}", report.code()),
            Action::EditColumn(column) => write!(f, "edit_col:{column}"),
            Action::Nested(op, rt) => {
                let verb = match op {
                    ArrayOp::Add => "nested_add",
                    ArrayOp::Edit => "nested_edit",
                    ArrayOp::Delete => "nested_delete",
                    ArrayOp::View => "nested_view",
                };
                write!(f, "{verb}:{rt}")
            }
            Action::List(op, field) => {
                let verb = match op {
                    ListOp::Add => "list_add",
                    ListOp::Remove => "list_remove",
                    ListOp::View => "list_view",
                };
                write!(f, "{verb}:{}", field.column())
            }
            Action::SelectEntry(index) => write!(f, "entry_select:{index}"),
            Action::Bool(value) => write!(f, "bool:{value}"),
            Action::Pick(value) => write!(f, "pick:{value}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub label: String,
    pub data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Self {
            label: label.into(),
            data: action.to_string(),
        }
    }
}

/// What the next operator turn is expected to look like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Widget {
    FreeText,
    TwoChoice,
    Choice { options: Vec<String> },
    IndexChoice { count: usize },
    Menu { buttons: Vec<Button> },
}

impl Widget {
    pub fn options(options: &[&str]) -> Self {
        Widget::Choice {
            options: options.iter().map(|o| o.to_string()).collect(),
        }
    }

    /// Rendered buttons, one per row. Every prompt widget carries a cancel.
    pub fn buttons(&self) -> Vec<Button> {
        let cancel = Button::new("🔙 Cancel", Action::Cancel);
        match self {
            Widget::FreeText => vec![cancel],
            Widget::TwoChoice => vec![
                Button::new("✅ True", Action::Bool(true)),
                Button::new("❌ False", Action::Bool(false)),
                cancel,
            ],
            Widget::Choice { options } => options
                .iter()
                .map(|o| Button::new(o.as_str(), Action::Pick(o.clone())))
                .chain(std::iter::once(cancel))
                .collect(),
            Widget::IndexChoice { count } => (0..*count)
                .map(|i| Button::new(format!("Entry {}", i + 1), Action::SelectEntry(i)))
                .chain(std::iter::once(cancel))
                .collect(),
            Widget::Menu { buttons } => buttons.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub widget: Widget,
}

impl Reply {
    pub fn new(text: impl Into<String>, widget: Widget) -> Self {
        Self {
            text: text.into(),
            widget,
        }
    }

    pub fn menu(text: impl Into<String>, buttons: Vec<Button>) -> Self {
        Self::new(text, Widget::Menu { buttons })
    }

    /// Message without any buttons.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::menu(text, Vec::new())
    }

    /// Terminal message with a single way back to the main menu.
    pub fn home(text: impl Into<String>) -> Self {
        Self::menu(text, vec![Button::new("🏠 Main Menu", Action::Home)])
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, user_id: UserId, reply: &Reply) -> Result<(), AppError>;

    /// Confirms receipt of a button press so the client stops its spinner.
    async fn acknowledge(&self, receipt: &str) -> Result<(), AppError>;
}
