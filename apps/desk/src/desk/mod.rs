//! The operator desk: routes every chat event through the session's flow and step.
//!
//! Validation problems re-prompt and keep the session. Every other error ends
//! the flow: the session is cleared and the operator gets `user_message()`.

mod archive;
pub mod display;
mod edit;
mod find;
pub mod menus;
mod payment;
mod reports;
mod subscription;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info_span, warn, Instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::session::{Flow, Session, SessionStore, Step};
use crate::store::RecordStore;
use crate::transport::{Action, ChatEvent, EventKind, Reply, UserId};
use crate::wizard::{ArrayFields, FlatLists};

pub struct Desk {
    sessions: Arc<dyn SessionStore>,
    store: Arc<dyn RecordStore>,
    arrays: ArrayFields,
    lists: FlatLists,
}

impl Desk {
    pub fn new(sessions: Arc<dyn SessionStore>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            arrays: ArrayFields::new(store.clone()),
            lists: FlatLists::new(store.clone()),
            sessions,
            store,
        }
    }

    /// Handles one inbound event and returns the replies to send, in order.
    pub async fn handle(&self, event: ChatEvent) -> Vec<Reply> {
        let span = info_span!(
            "chat_event",
            event_id = %Uuid::new_v4(),
            user_id = event.user_id,
        );
        self.dispatch(event).instrument(span).await
    }

    async fn dispatch(&self, event: ChatEvent) -> Vec<Reply> {
        let user_id = event.user_id;
        match self.route(event).await {
            Ok(replies) => replies,
            Err(err) => {
                match &err {
                    AppError::NotFound(_) | AppError::Validation(_) => warn!("flow ended: {err}"),
                    _ => error!("flow failed: {err}"),
                }
                if let Err(e) = self.sessions.clear(user_id).await {
                    error!("could not clear session after failure: {e}");
                }
                vec![Reply::home(format!("❌ {}", err.user_message()))]
            }
        }
    }

    async fn route(&self, event: ChatEvent) -> Result<Vec<Reply>, AppError> {
        let user_id = event.user_id;
        match event.kind {
            EventKind::Text => {
                let text = event.payload.trim();
                match text {
                    "/start" | "/menu" => {
                        self.sessions.clear(user_id).await?;
                        return Ok(vec![menus::main_menu()]);
                    }
                    "/cancel" => return self.cancel(user_id).await,
                    _ => {}
                }
                match self.sessions.get(user_id).await? {
                    Some(session) => self.on_text(user_id, session, text).await,
                    None => {
                        debug!("text outside of any flow ignored");
                        Ok(Vec::new())
                    }
                }
            }
            EventKind::Choice => match Action::parse(&event.payload) {
                Some(action) => self.on_action(user_id, action).await,
                None => {
                    warn!(payload = %event.payload, "unknown action ignored");
                    Ok(Vec::new())
                }
            },
        }
    }

    async fn cancel(&self, user_id: UserId) -> Result<Vec<Reply>, AppError> {
        self.sessions.clear(user_id).await?;
        Ok(vec![Reply::home("❌ Operation cancelled.")])
    }

    async fn on_action(&self, user_id: UserId, action: Action) -> Result<Vec<Reply>, AppError> {
        match action {
            Action::Home => {
                self.sessions.clear(user_id).await?;
                Ok(vec![menus::main_menu()])
            }
            Action::Cancel => self.cancel(user_id).await,
            Action::Open(menu) => {
                self.sessions.clear(user_id).await?;
                Ok(vec![menus::submenu(menu)])
            }
            Action::Start(flow) => {
                self.sessions
                    .set(user_id, Session::start(flow, Step::Identify))
                    .await?;
                Ok(vec![menus::identify_prompt(flow)])
            }
            Action::Report(report) => {
                self.sessions.clear(user_id).await?;
                self.report(report, Utc::now().date_naive()).await
            }
            action => match self.sessions.get(user_id).await? {
                Some(session) if session.flow == Flow::Edit => {
                    self.edit_action(user_id, session, action).await
                }
                _ => Ok(vec![stray()]),
            },
        }
    }

    async fn on_text(
        &self,
        user_id: UserId,
        session: Session,
        text: &str,
    ) -> Result<Vec<Reply>, AppError> {
        match (session.flow, session.step) {
            (Flow::Find, Step::Identify) => self.find(user_id, text).await,
            (Flow::MarkDone, Step::Identify) => self.mark_payment(user_id, text, "done").await,
            (Flow::MarkPending, Step::Identify) => {
                self.mark_payment(user_id, text, "pending").await
            }
            (Flow::SetSubscription | Flow::ExtendSubscription, _) => {
                self.subscription_text(user_id, session, text).await
            }
            (Flow::Archive | Flow::Restore, Step::Identify) => {
                self.move_partition(user_id, session.flow, text).await
            }
            (Flow::Edit, _) => self.edit_text(user_id, session, text).await,
            (flow, step) => {
                debug!(?flow, ?step, "text not expected at this step");
                Ok(vec![stray()])
            }
        }
    }
}

/// Reply to a button or message that does not belong to the current step.
/// The session is left as it is.
fn stray() -> Reply {
    Reply::home("⚠️ That option is not available at this step.")
}
