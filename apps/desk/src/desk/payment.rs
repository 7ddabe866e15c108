use tracing::info;

use crate::desk::Desk;
use crate::errors::AppError;
use crate::session::SessionStore;
use crate::store::{patch_of, Partition, RecordStore};
use crate::transport::{Reply, UserId};
use crate::wizard::lookup;

impl Desk {
    pub(super) async fn mark_payment(
        &self,
        user_id: UserId,
        text: &str,
        status: &str,
    ) -> Result<Vec<Reply>, AppError> {
        let key = lookup::resolve(text);
        self.store
            .update(Partition::Active, &key, patch_of("payment", status))
            .await?;
        info!(%key, status, "payment status changed");
        self.sessions.clear(user_id).await?;
        Ok(vec![Reply::home(format!(
            "✅ Payment marked as *{status}* for:\n`{}`",
            key.value
        ))])
    }
}
