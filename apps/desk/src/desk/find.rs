use tracing::info;

use crate::desk::{display, Desk};
use crate::errors::AppError;
use crate::session::SessionStore;
use crate::store::{Partition, RecordStore};
use crate::transport::{Reply, UserId};
use crate::wizard::lookup;

impl Desk {
    /// Sends the full applicant card, looking in the active partition first
    /// and the archive second.
    pub(super) async fn find(&self, user_id: UserId, text: &str) -> Result<Vec<Reply>, AppError> {
        let key = lookup::resolve(text);
        let mut found = None;
        for partition in [Partition::Active, Partition::Archived] {
            if let Some(applicant) = self.store.get(partition, &key).await? {
                found = Some((partition, applicant));
                break;
            }
        }
        let (partition, applicant) =
            found.ok_or_else(|| AppError::NotFound(format!("applicant with {key}")))?;
        info!(%key, partition = partition.table(), "applicant details sent");

        self.sessions.clear(user_id).await?;
        let mut replies: Vec<Reply> = display::applicant_details(&applicant)
            .into_iter()
            .map(Reply::plain)
            .collect();
        let done = if partition == Partition::Archived {
            "✅ All details sent! (archived applicant)"
        } else {
            "✅ All details sent!"
        };
        replies.push(Reply::home(done));
        Ok(replies)
    }
}
