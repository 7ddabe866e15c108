use chrono::{Duration, NaiveDate};
use tracing::info;

use crate::desk::{stray, Desk};
use crate::errors::AppError;
use crate::session::{Flow, Session, SessionPatch, SessionStore, Step};
use crate::store::{fetch, patch_of, Partition, RecordStore};
use crate::transport::{Reply, UserId, Widget};
use crate::wizard::lookup;
use crate::wizard::validators::{validate_days, validate_subscription_date, ValidationError};

const DATE_PROMPT: &str = "Now send the subscription expiration date (YYYY-MM-DD):";
const DAYS_PROMPT: &str = "Now send the number of days to extend (e.g. 30, or -7 to shorten):";

impl Desk {
    /// Set-expiration and extend-by-days flows: identify, then one value.
    pub(super) async fn subscription_text(
        &self,
        user_id: UserId,
        session: Session,
        text: &str,
    ) -> Result<Vec<Reply>, AppError> {
        match (session.step, session.lookup) {
            (Step::Identify, _) => {
                let key = lookup::resolve(text);
                let (step, prompt) = if session.flow == Flow::ExtendSubscription {
                    (Step::ExtendDays, DAYS_PROMPT)
                } else {
                    (Step::SubscriptionDate, DATE_PROMPT)
                };
                self.sessions
                    .merge(user_id, SessionPatch::step(step).with_lookup(key))
                    .await?;
                Ok(vec![Reply::new(prompt, Widget::FreeText)])
            }
            (Step::SubscriptionDate, Some(key)) => {
                let date = match validate_subscription_date(text) {
                    Ok(date) => date,
                    Err(e) => {
                        return Ok(vec![Reply::new(
                            format!("❌ {e}\n\nPlease send a valid date in format: *YYYY-MM-DD*"),
                            Widget::FreeText,
                        )])
                    }
                };
                let date = date.format("%Y-%m-%d").to_string();
                self.store
                    .update(
                        Partition::Active,
                        &key,
                        patch_of("subscription_expiration", date.as_str()),
                    )
                    .await?;
                info!(%key, until = %date, "subscription set");
                self.sessions.clear(user_id).await?;
                Ok(vec![Reply::home(format!(
                    "✅ Subscription set for:\n`{}`\nUntil: *{date}*",
                    key.value
                ))])
            }
            (Step::ExtendDays, Some(key)) => {
                let days = match validate_days(text) {
                    Ok(days) => days,
                    Err(e) => {
                        return Ok(vec![Reply::new(
                            format!("❌ {e}\n\n{DAYS_PROMPT}"),
                            Widget::FreeText,
                        )])
                    }
                };
                let applicant = fetch(self.store.as_ref(), Partition::Active, &key).await?;
                let current = applicant
                    .text("subscription_expiration")
                    .filter(|s| !s.is_empty());
                let Some(current) = current else {
                    self.sessions.clear(user_id).await?;
                    return Ok(vec![Reply::home(
                        "❌ No subscription date set for this applicant.\nPlease set a subscription date first.",
                    )]);
                };
                // Stored values may carry a time part.
                let current = current
                    .get(..10)
                    .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
                    .ok_or_else(|| ValidationError::NoSuchDate(current.clone()))?;
                let Some(extended) =
                    Duration::try_days(days).and_then(|d| current.checked_add_signed(d))
                else {
                    return Ok(vec![Reply::new(
                        format!("❌ {}\n\n{DAYS_PROMPT}", ValidationError::Days),
                        Widget::FreeText,
                    )]);
                };
                let extended = extended.format("%Y-%m-%d").to_string();

                self.store
                    .update(
                        Partition::Active,
                        &key,
                        patch_of("subscription_expiration", extended.as_str()),
                    )
                    .await?;
                info!(%key, days, until = %extended, "subscription extended");
                self.sessions.clear(user_id).await?;
                Ok(vec![Reply::home(format!(
                    "✅ Subscription extended for:\n`{}`\nNew expiration: *{extended}*\n({days:+} days)",
                    key.value
                ))])
            }
            _ => Ok(vec![stray()]),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::desk::tests::{fixture, last_text};
    use crate::session::{Flow, Step};
    use crate::store::{patch_of, Partition, RecordStore};
    use crate::transport::Action;
    use crate::wizard::lookup;

    #[tokio::test]
    async fn test_set_subscription_rejects_impossible_date() {
        let f = fixture();
        f.press(Action::Start(Flow::SetSubscription)).await;
        f.text("ada@desk.test").await;

        let replies = f.text("2023-02-29").await;
        assert!(last_text(&replies).starts_with("❌ Invalid date: 2023-02-29"));
        assert_eq!(f.session().await.unwrap().step, Step::SubscriptionDate);

        let replies = f.text("2024-02-29").await;
        assert!(last_text(&replies).ends_with("Until: *2024-02-29*"));
        assert_eq!(
            f.stored().await.text("subscription_expiration").as_deref(),
            Some("2024-02-29")
        );
        assert!(f.session().await.is_none());
    }

    #[tokio::test]
    async fn test_extend_crosses_month_end() {
        let f = fixture();
        f.press(Action::Start(Flow::ExtendSubscription)).await;
        f.text("15551234567").await;

        let replies = f.text("ten").await;
        assert!(last_text(&replies).starts_with("❌ Invalid number."));
        assert_eq!(f.session().await.unwrap().step, Step::ExtendDays);

        let replies = f.text("5").await;
        assert!(last_text(&replies).contains("New expiration: *2024-03-01*\n(+5 days)"));
    }

    #[tokio::test]
    async fn test_extend_past_calendar_range_reprompts() {
        let f = fixture();
        f.press(Action::Start(Flow::ExtendSubscription)).await;
        f.text("15551234567").await;

        let replies = f.text("9999999999999").await;
        assert!(last_text(&replies).starts_with("❌ Invalid number."));
        assert_eq!(f.session().await.unwrap().step, Step::ExtendDays);
        assert_eq!(
            f.stored().await.text("subscription_expiration").as_deref(),
            Some("2024-02-25")
        );
    }

    #[tokio::test]
    async fn test_extend_without_expiration_is_refused() {
        let f = fixture();
        f.store
            .update(
                Partition::Active,
                &lookup::resolve("ada@desk.test"),
                patch_of("subscription_expiration", ""),
            )
            .await
            .unwrap();
        f.press(Action::Start(Flow::ExtendSubscription)).await;
        f.text("ada@desk.test").await;

        let replies = f.text("30").await;
        assert!(last_text(&replies).starts_with("❌ No subscription date set"));
        assert!(f.session().await.is_none());
    }

    #[tokio::test]
    async fn test_extend_unknown_applicant_is_not_found() {
        let f = fixture();
        f.press(Action::Start(Flow::ExtendSubscription)).await;
        f.text("nobody@desk.test").await;
        let replies = f.text("30").await;
        assert!(last_text(&replies).starts_with("❌ Not found"));
    }
}
