use crate::models::{Applicant, RecordType};
use crate::session::Flow;
use crate::transport::{Action, Button, Menu, Reply, Report};
use crate::wizard::catalog::{ListField, EDITABLE_FIELDS};
use crate::wizard::{ArrayOp, ListOp};

fn back() -> Button {
    Button::new("🔙 Back to Main Menu", Action::Home)
}

fn cancel() -> Button {
    Button::new("❌ Cancel", Action::Cancel)
}

pub fn main_menu() -> Reply {
    Reply::menu(
        "🤖 *Applicant Management Bot*\n\nSelect an option:",
        vec![
            Button::new("📋 View Applicants", Action::Open(Menu::View)),
            Button::new("💰 Payment Management", Action::Open(Menu::Payment)),
            Button::new("📅 Subscription Management", Action::Open(Menu::Subscription)),
            Button::new("✏️ Edit Applicant", Action::Start(Flow::Edit)),
            Button::new("🗄️ Archive Management", Action::Open(Menu::Archive)),
        ],
    )
}

pub fn submenu(menu: Menu) -> Reply {
    match menu {
        Menu::Main => main_menu(),
        Menu::View => Reply::menu(
            "📋 *View Applicants*\n\nSelect a category:",
            vec![
                Button::new("🔍 Find Applicant", Action::Start(Flow::Find)),
                Button::new("⏳ Pending Applicants", Action::Report(Report::Pending)),
                Button::new("✅ Done Applicants", Action::Report(Report::Done)),
                Button::new("📦 Archived Applicants", Action::Report(Report::Archived)),
                back(),
            ],
        ),
        Menu::Payment => Reply::menu(
            "💰 *Payment Management*\n\nSelect an action:",
            vec![
                Button::new("✅ Mark as Done", Action::Start(Flow::MarkDone)),
                Button::new("⏳ Mark as Pending", Action::Start(Flow::MarkPending)),
                back(),
            ],
        ),
        Menu::Subscription => Reply::menu(
            "📅 *Subscription Management*\n\nSelect an action:",
            vec![
                Button::new("📅 Set Subscription Date", Action::Start(Flow::SetSubscription)),
                Button::new("➕ Extend Subscription", Action::Start(Flow::ExtendSubscription)),
                Button::new("❌ Expired", Action::Report(Report::Expired)),
                Button::new("⏳ Expiring Soon", Action::Report(Report::ExpiringSoon)),
                back(),
            ],
        ),
        Menu::Archive => Reply::menu(
            "🗄️ *Archive Management*\n\nSelect an action:",
            vec![
                Button::new("📦 Archive Applicant", Action::Start(Flow::Archive)),
                Button::new("♻️ Restore Applicant", Action::Start(Flow::Restore)),
                back(),
            ],
        ),
    }
}

/// First prompt of a flow that starts by identifying an applicant.
pub fn identify_prompt(flow: Flow) -> Reply {
    let title = match flow {
        Flow::Find => "🔍 *Find Applicant*",
        Flow::MarkDone => "✅ *Mark Payment as Done*",
        Flow::MarkPending => "⏳ *Mark Payment as Pending*",
        Flow::SetSubscription => "📅 *Set Subscription Date*",
        Flow::ExtendSubscription => "➕ *Extend Subscription*",
        Flow::Edit => "✏️ *Edit Applicant*",
        Flow::Archive => "📦 *Archive Applicant*",
        Flow::Restore => "♻️ *Restore Applicant*",
        Flow::Menu => "🤖 *Applicant Management Bot*",
    };
    Reply::menu(
        format!("{title}\n\nSend the applicant's alias email or phone number:"),
        vec![cancel()],
    )
}

pub fn fields_menu(applicant: &Applicant) -> Reply {
    let mut buttons: Vec<Button> = EDITABLE_FIELDS
        .iter()
        .map(|f| Button::new(f.label, Action::EditColumn(f.column.to_string())))
        .collect();
    buttons.push(Button::new("🔙 Cancel", Action::Cancel));
    Reply::menu(
        format!(
            "✏️ *Editing:* {} {}\n\nSelect the field to edit:",
            applicant.display("first_name"),
            applicant.display("last_name"),
        ),
        buttons,
    )
}

pub fn nested_menu(rt: RecordType, label: &str, listing: &str, has_entries: bool) -> Reply {
    let mut buttons = vec![Button::new("➕ Add New Entry", Action::Nested(ArrayOp::Add, rt))];
    if has_entries {
        buttons.push(Button::new("✏️ Edit Entry", Action::Nested(ArrayOp::Edit, rt)));
        buttons.push(Button::new("🗑️ Delete Entry", Action::Nested(ArrayOp::Delete, rt)));
        buttons.push(Button::new("👁️ View Entries", Action::Nested(ArrayOp::View, rt)));
    }
    buttons.push(Button::new("🔙 Back to Fields", Action::Fields));
    buttons.push(cancel());
    Reply::menu(format!("📋 *{label}*\n{listing}\n\nChoose an action:"), buttons)
}

pub fn list_menu(field: ListField, current: &[String]) -> Reply {
    let shown = if current.is_empty() {
        "None".to_string()
    } else {
        current.join(", ")
    };
    let mut buttons = vec![Button::new(
        format!("➕ Add {}", field.label()),
        Action::List(ListOp::Add, field),
    )];
    if !current.is_empty() {
        buttons.push(Button::new(
            format!("🗑️ Remove {}", field.label()),
            Action::List(ListOp::Remove, field),
        ));
    }
    buttons.push(Button::new(
        format!("📋 View {}", field.label()),
        Action::List(ListOp::View, field),
    ));
    buttons.push(Button::new("🔙 Back to Fields", Action::Fields));
    buttons.push(cancel());
    Reply::menu(
        format!("🧩 *{}*\n\nCurrent: {shown}\n\nChoose an action:", field.label()),
        buttons,
    )
}

/// Screen with a way back to the field list and a cancel.
pub fn back_to_fields(text: impl Into<String>) -> Reply {
    Reply::menu(
        text,
        vec![Button::new("🔙 Back to Fields", Action::Fields), cancel()],
    )
}
