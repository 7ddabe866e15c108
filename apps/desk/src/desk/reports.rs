use chrono::{Days, NaiveDate};
use tracing::info;

use crate::desk::{display, Desk};
use crate::errors::AppError;
use crate::store::{ListFilter, Partition, RecordStore};
use crate::transport::{Action, Button, Menu, Reply, Report};

/// Window of the "expiring soon" report, today included.
const EXPIRING_WINDOW_DAYS: u64 = 7;

impl Desk {
    pub(super) async fn report(
        &self,
        report: Report,
        today: NaiveDate,
    ) -> Result<Vec<Reply>, AppError> {
        let soon = today
            .checked_add_days(Days::new(EXPIRING_WINDOW_DAYS))
            .unwrap_or(NaiveDate::MAX);
        let (title, partition, filter, label, back) = match report {
            Report::Pending => (
                "⏳ *Pending Applicants*",
                Partition::Active,
                ListFilter::Payment("pending".into()),
                None,
                Menu::View,
            ),
            Report::Done => (
                "✅ *Done Applicants*",
                Partition::Active,
                ListFilter::Payment("done".into()),
                None,
                Menu::View,
            ),
            Report::Archived => (
                "📦 *Archived Applicants*",
                Partition::Archived,
                ListFilter::All,
                None,
                Menu::View,
            ),
            Report::Expired => (
                "❌ *Expired Subscriptions*",
                Partition::Active,
                ListFilter::ExpiredBefore(today),
                Some("Expired"),
                Menu::Subscription,
            ),
            Report::ExpiringSoon => (
                "⏳ *Expiring in the next 7 days*",
                Partition::Active,
                ListFilter::ExpiringBetween(today, soon),
                Some("Expires"),
                Menu::Subscription,
            ),
        };

        let users = self.store.list(partition, &filter).await?;
        info!(?report, count = users.len(), "report listed");

        let text = format!(
            "{title} ({})\n\n{}",
            users.len(),
            display::applicant_list(&users, label)
        );
        let mut replies: Vec<Reply> = display::chunk_text(&text, display::MESSAGE_LIMIT)
            .into_iter()
            .map(Reply::plain)
            .collect();
        if let Some(last) = replies.pop() {
            replies.push(Reply::menu(
                last.text,
                vec![Button::new("🔙 Back", Action::Open(back))],
            ));
        }
        Ok(replies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::desk::tests::{fixture, last_text};
    use serde_json::json;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_pending_report_lists_applicant() {
        let f = fixture();
        let replies = f.desk.report(Report::Pending, day("2024-02-20")).await.unwrap();
        assert!(last_text(&replies).starts_with("⏳ *Pending Applicants* (1)"));
        assert!(last_text(&replies).contains("`ada@desk.test`"));
        assert_eq!(replies[0].widget.buttons()[0].data, "menu:view");
    }

    #[tokio::test]
    async fn test_expiring_window_is_inclusive() {
        let f = fixture();
        f.store.seed(
            Partition::Active,
            json!({"alias_email": "late@desk.test", "subscription_expiration": "2024-03-04"}),
        );

        let soon = f.desk.report(Report::ExpiringSoon, day("2024-02-25")).await.unwrap();
        let text = last_text(&soon);
        assert!(text.contains("(1)"));
        assert!(text.contains("📅 Expires: 2024-02-25"));

        let expired = f.desk.report(Report::Expired, day("2024-03-04")).await.unwrap();
        assert!(last_text(&expired).contains("`ada@desk.test`"));
        assert!(!last_text(&expired).contains("late@desk.test"));
        assert_eq!(expired[0].widget.buttons()[0].data, "menu:subscription");
    }

    #[tokio::test]
    async fn test_empty_report() {
        let f = fixture();
        let replies = f.desk.report(Report::Archived, day("2024-01-01")).await.unwrap();
        assert_eq!(
            last_text(&replies),
            "📦 *Archived Applicants* (0)\n\nNo applicants found."
        );
    }

    #[tokio::test]
    async fn test_report_button_goes_through_dispatcher() {
        let f = fixture();
        let replies = f.press(Action::Report(Report::Done)).await;
        assert!(last_text(&replies).starts_with("✅ *Done Applicants* (0)"));
    }
}
