//! Push notification screen: composer, audience targeting and the
//! delivery history with its aggregate stats.

use crate::load::Loader;
use crate::services::{
    AdminError, AdminService, NotificationRecord, NotificationStatus, NotificationTarget,
    Platform, ScreenContext, ServiceResult, UserSegment,
};
use chrono::{DateTime, Utc};
use serde_json::json;

/// Draft assembled from the composer form before dispatch.
#[derive(Clone, Debug)]
pub struct Draft {
    pub title: String,
    pub message: String,
    pub target: NotificationTarget,
    pub platform: Platform,
    pub scheduled: bool,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub deep_link: Option<String>,
}

impl Draft {
    /// Reads the composer fields out of the submitted form. Title and
    /// message are mandatory; a scheduled send needs a time.
    pub fn from_form(ctx: &ScreenContext) -> ServiceResult<Self> {
        let title = ctx
            .form
            .string("title")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AdminError::Validation("notification title required".into()))?;
        let message = ctx
            .form
            .string("message")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AdminError::Validation("notification message required".into()))?;

        let target = match ctx.form.string("target").as_deref() {
            None | Some("all") => NotificationTarget::All,
            Some("segment") => {
                let segment = ctx
                    .form
                    .string("segment")
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| AdminError::Validation("segment required".into()))?;
                NotificationTarget::Segment(segment)
            }
            Some("specific") => {
                let ids = ctx.form.int_list("user_ids");
                if ids.is_empty() {
                    return Err(AdminError::Validation("recipient list is empty".into()));
                }
                NotificationTarget::Specific(ids)
            }
            Some(other) => {
                return Err(AdminError::Validation(format!("unknown target '{other}'")))
            }
        };

        let platform = ctx
            .form
            .string("platform")
            .as_deref()
            .map(Platform::parse)
            .unwrap_or(Some(Platform::All))
            .ok_or_else(|| AdminError::Validation("unknown platform".into()))?;

        let scheduled = ctx.form.bool("scheduled");
        let scheduled_time = ctx
            .form
            .string("scheduled_time")
            .map(|raw| {
                raw.parse::<DateTime<Utc>>()
                    .map_err(|_| AdminError::Validation(format!("bad schedule time '{raw}'")))
            })
            .transpose()?;
        if scheduled && scheduled_time.is_none() {
            return Err(AdminError::Validation("schedule time required".into()));
        }

        Ok(Self {
            title,
            message,
            target,
            platform,
            scheduled,
            scheduled_time,
            image_url: ctx.form.string("image_url").filter(|s| !s.is_empty()),
            deep_link: ctx.form.string("deep_link").filter(|s| !s.is_empty()),
        })
    }

    fn into_record(self) -> NotificationRecord {
        let status = if self.scheduled {
            NotificationStatus::Scheduled
        } else {
            NotificationStatus::Sent
        };
        let now = Utc::now();
        NotificationRecord {
            id: 0,
            title: self.title,
            message: self.message,
            target: self.target,
            platform: self.platform,
            scheduled: self.scheduled,
            scheduled_time: self.scheduled_time,
            status,
            sent_at: if self.scheduled { None } else { Some(now) },
            created_at: now,
            opened: 0,
            total_sent: 0,
            image_url: self.image_url,
            deep_link: self.deep_link,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotificationStats {
    pub total_sent: i64,
    pub total_opened: i64,
    pub open_rate: f64,
    pub scheduled: usize,
    pub failed: usize,
}

pub struct NotificationsScreen<S: AdminService> {
    service: S,
    history: Vec<NotificationRecord>,
    segments: Vec<UserSegment>,
}

impl<S: AdminService> NotificationsScreen<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            history: Vec::new(),
            segments: Vec::new(),
        }
    }

    pub async fn load(&mut self, loader: &Loader) -> ServiceResult<usize> {
        let latency = self.service.load_latency();
        self.history = loader
            .fetch(latency, || self.service.fetch_notifications())
            .await?;
        self.segments = loader
            .fetch(latency, || self.service.list_segments())
            .await?;
        Ok(self.history.len())
    }

    pub fn history(&self) -> &[NotificationRecord] {
        &self.history
    }

    pub fn segments(&self) -> &[UserSegment] {
        &self.segments
    }

    pub fn estimated_reach(&self, target: &NotificationTarget) -> ServiceResult<i64> {
        self.service.estimated_reach(target)
    }

    /// Validates the composer form, dispatches through the delivery
    /// service and prepends the stored record to the local history.
    pub fn send(&mut self, ctx: &mut ScreenContext) -> ServiceResult<i64> {
        self.ensure_permission(ctx)?;
        let draft = Draft::from_form(ctx)?;
        let mut record = draft.into_record();
        let receipt = self
            .service
            .dispatch_notification(&record)
            .map_err(|err| AdminError::ActionFailure(err.to_string()))?;
        record.id = receipt.notification_id;
        record.total_sent = receipt.delivered;
        self.history.insert(0, record);

        self.service.log_action(
            "notifications_send",
            Some(ctx.operator.id),
            &json!({
                "notification_id": receipt.notification_id,
                "delivered": receipt.delivered,
            }),
        )?;
        ctx.context.set("notification_sent", receipt.notification_id);
        Ok(receipt.notification_id)
    }

    pub fn stats(&self) -> NotificationStats {
        let mut stats = NotificationStats::default();
        for record in &self.history {
            match record.status {
                NotificationStatus::Sent => {
                    stats.total_sent += record.total_sent;
                    stats.total_opened += record.opened;
                }
                NotificationStatus::Scheduled => stats.scheduled += 1,
                NotificationStatus::Failed => stats.failed += 1,
                NotificationStatus::Draft => {}
            }
        }
        if stats.total_sent > 0 {
            stats.open_rate = stats.total_opened as f64 / stats.total_sent as f64 * 100.0;
        }
        stats
    }

    pub fn present(&self, ctx: &mut ScreenContext) {
        let stats = self.stats();
        let listing: Vec<_> = self
            .history
            .iter()
            .map(|record| {
                json!({
                    "id": record.id,
                    "title": record.title,
                    "status": record.status,
                    "sent": record.total_sent,
                    "opened": record.opened,
                    "created_at": record.created_at,
                })
            })
            .collect();
        ctx.context.set("notification_list", listing);
        ctx.context.set("notifications_sent_total", stats.total_sent);
        ctx.context.set("notifications_open_rate", stats.open_rate);
        ctx.context.set("notifications_failed", stats.failed as i64);
        let segment_list: Vec<_> = self
            .segments
            .iter()
            .map(|segment| {
                json!({
                    "id": segment.id,
                    "name": segment.name,
                    "users": segment.user_count,
                })
            })
            .collect();
        ctx.context.set("segment_list", segment_list);
    }

    fn ensure_permission(&self, ctx: &ScreenContext) -> ServiceResult<()> {
        if self.service.allowed_to(ctx, "send_notifications") {
            Ok(())
        } else {
            Err(AdminError::PermissionDenied("send_notifications".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryService;

    fn sender_ctx() -> ScreenContext {
        let mut ctx = ScreenContext::default();
        ctx.operator.id = 9;
        ctx.operator.permissions.insert("send_notifications".into());
        ctx
    }

    async fn loaded_screen() -> NotificationsScreen<InMemoryService> {
        let mut screen = NotificationsScreen::new(InMemoryService::default());
        screen.load(&Loader::default()).await.unwrap();
        screen
    }

    #[tokio::test]
    async fn history_and_segments_load() {
        let screen = loaded_screen().await;
        assert_eq!(screen.history().len(), 4);
        assert_eq!(screen.segments().len(), 6);
    }

    #[tokio::test]
    async fn send_requires_title_and_message() {
        let mut screen = loaded_screen().await;
        let mut ctx = sender_ctx();
        ctx.form.set("message", "Body without a title");
        match screen.send(&mut ctx) {
            Err(AdminError::Validation(reason)) => assert!(reason.contains("title")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn send_to_segment_records_reach() {
        let mut screen = loaded_screen().await;
        let mut ctx = sender_ctx();
        ctx.form.set("title", "New Feature");
        ctx.form.set("message", "Video profiles are live!");
        ctx.form.set("target", "segment");
        ctx.form.set("segment", "premium");
        let id = screen.send(&mut ctx).unwrap();
        let record = &screen.history()[0];
        assert_eq!(record.id, id);
        assert_eq!(record.total_sent, 156);
        assert_eq!(record.status, NotificationStatus::Sent);
    }

    #[tokio::test]
    async fn scheduled_send_defers_delivery() {
        let mut screen = loaded_screen().await;
        let mut ctx = sender_ctx();
        ctx.form.set("title", "Friday Event");
        ctx.form.set("message", "Join us at 8 PM");
        ctx.form.set("scheduled", true);
        ctx.form.set("scheduled_time", "2026-09-04T20:00:00Z");
        screen.send(&mut ctx).unwrap();
        let record = &screen.history()[0];
        assert_eq!(record.status, NotificationStatus::Scheduled);
        assert_eq!(record.total_sent, 0);
        assert!(record.sent_at.is_none());
    }

    #[tokio::test]
    async fn scheduled_send_needs_a_time() {
        let mut screen = loaded_screen().await;
        let mut ctx = sender_ctx();
        ctx.form.set("title", "Oops");
        ctx.form.set("message", "No time set");
        ctx.form.set("scheduled", true);
        assert!(screen.send(&mut ctx).is_err());
    }

    #[tokio::test]
    async fn specific_target_needs_recipients() {
        let mut screen = loaded_screen().await;
        let mut ctx = sender_ctx();
        ctx.form.set("title", "Direct");
        ctx.form.set("message", "Hello");
        ctx.form.set("target", "specific");
        assert!(screen.send(&mut ctx).is_err());
        ctx.form.set("user_ids", vec![101, 102, 103]);
        screen.send(&mut ctx).unwrap();
        assert_eq!(screen.history()[0].total_sent, 3);
    }

    #[tokio::test]
    async fn stats_aggregate_history() {
        let screen = loaded_screen().await;
        let stats = screen.stats();
        assert_eq!(stats.total_sent, 3390);
        assert_eq!(stats.total_opened, 1760);
        assert_eq!(stats.failed, 1);
        assert!((stats.open_rate - 51.917).abs() < 0.01);
    }

    #[tokio::test]
    async fn send_needs_permission() {
        let mut screen = loaded_screen().await;
        let mut ctx = ScreenContext::default();
        ctx.form.set("title", "Nope");
        ctx.form.set("message", "Denied");
        match screen.send(&mut ctx) {
            Err(AdminError::PermissionDenied(_)) => {}
            other => panic!("expected permission denial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reach_estimates_follow_target() {
        let screen = loaded_screen().await;
        assert_eq!(
            screen.estimated_reach(&NotificationTarget::All).unwrap(),
            15427
        );
        assert_eq!(
            screen
                .estimated_reach(&NotificationTarget::Specific(vec![1, 2]))
                .unwrap(),
            2
        );
    }
}
