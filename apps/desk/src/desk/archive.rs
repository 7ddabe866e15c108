use crate::desk::{stray, Desk};
use crate::errors::AppError;
use crate::session::{Flow, SessionStore};
use crate::store::{move_applicant, Partition};
use crate::transport::{Reply, UserId};
use crate::wizard::lookup;

impl Desk {
    pub(super) async fn move_partition(
        &self,
        user_id: UserId,
        flow: Flow,
        text: &str,
    ) -> Result<Vec<Reply>, AppError> {
        let (from, to, done) = match flow {
            Flow::Archive => (Partition::Active, Partition::Archived, "📦 Applicant archived"),
            Flow::Restore => (Partition::Archived, Partition::Active, "♻️ Applicant restored"),
            _ => return Ok(vec![stray()]),
        };
        let key = lookup::resolve(text);
        move_applicant(self.store.as_ref(), &key, from, to).await?;
        self.sessions.clear(user_id).await?;
        Ok(vec![Reply::home(format!("{done}:\n`{}`", key.value))])
    }
}
