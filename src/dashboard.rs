//! Dashboard screen: headline stats, the activity chart series and the
//! operational alert feed.

use crate::load::Loader;
use crate::services::{
    AdminError, AdminService, ActivityPoint, AlertRecord, DashboardStats, ScreenContext,
    ServiceResult, TimeRange,
};
use serde_json::json;

pub struct DashboardScreen<S: AdminService> {
    service: S,
    range: TimeRange,
    stats: DashboardStats,
    alerts: Vec<AlertRecord>,
    activity: Vec<ActivityPoint>,
}

impl<S: AdminService> DashboardScreen<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            range: TimeRange::default(),
            stats: DashboardStats::default(),
            alerts: Vec::new(),
            activity: Vec::new(),
        }
    }

    pub async fn load(&mut self, loader: &Loader, range: TimeRange) -> ServiceResult<()> {
        let latency = self.service.load_latency();
        self.range = range;
        self.stats = loader
            .fetch(latency, || self.service.dashboard_stats(range))
            .await?;
        self.alerts = loader
            .fetch(latency, || self.service.fetch_alerts())
            .await?;
        self.activity = loader
            .fetch(latency, || self.service.activity_series(range))
            .await?;
        Ok(())
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    pub fn stats(&self) -> &DashboardStats {
        &self.stats
    }

    pub fn activity(&self) -> &[ActivityPoint] {
        &self.activity
    }

    pub fn alerts(&self) -> &[AlertRecord] {
        &self.alerts
    }

    pub fn open_alerts(&self) -> Vec<&AlertRecord> {
        self.alerts.iter().filter(|alert| !alert.resolved).collect()
    }

    /// Share of weekly actives seen today, as a percentage.
    pub fn daily_active_share(&self) -> f64 {
        if self.stats.active_this_week == 0 {
            return 0.0;
        }
        self.stats.active_today as f64 / self.stats.active_this_week as f64 * 100.0
    }

    /// Share of the user base on a paid plan, as a percentage.
    pub fn paid_share(&self) -> f64 {
        if self.stats.total_users == 0 {
            return 0.0;
        }
        self.stats.subscriptions.total as f64 / self.stats.total_users as f64 * 100.0
    }

    pub fn resolve_alert(&mut self, ctx: &mut ScreenContext, id: i64) -> ServiceResult<()> {
        let alert = self
            .alerts
            .iter_mut()
            .find(|alert| alert.id == id)
            .ok_or_else(|| AdminError::NotFound(format!("alert {id}")))?;
        if alert.resolved {
            return Ok(());
        }
        self.service
            .submit_action("resolve_alert", &[id])
            .map_err(|err| AdminError::ActionFailure(err.to_string()))?;
        alert.resolved = true;
        self.service.log_action(
            "dashboard_resolve_alert",
            Some(ctx.operator.id),
            &json!({ "alert_id": id }),
        )
    }

    pub fn present(&self, ctx: &mut ScreenContext) {
        ctx.context.set("time_range", self.range.as_str());
        ctx.context.set("total_users", self.stats.total_users);
        ctx.context.set("active_today", self.stats.active_today);
        ctx.context.set("new_signups", self.stats.new_signups);
        ctx.context.set("matches_made", self.stats.matches_made);
        ctx.context
            .set("reports_received", self.stats.reports_received);
        ctx.context.set("user_growth", self.stats.user_growth);
        ctx.context
            .set("engagement_rate", self.stats.engagement_rate);
        ctx.context
            .set("daily_active_share", self.daily_active_share());
        ctx.context.set("paid_share", self.paid_share());
        ctx.context
            .set("revenue_monthly", self.stats.revenue.monthly);
        ctx.context.set("activity_series", &self.activity);
        ctx.context
            .set("open_alert_count", self.open_alerts().len());
        ctx.context.set("alerts", &self.alerts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryService;

    async fn loaded_screen() -> DashboardScreen<InMemoryService> {
        let mut screen = DashboardScreen::new(InMemoryService::default());
        screen
            .load(&Loader::default(), TimeRange::Month)
            .await
            .unwrap();
        screen
    }

    #[tokio::test]
    async fn load_fills_all_panels() {
        let screen = loaded_screen().await;
        assert_eq!(screen.stats().total_users, 15427);
        assert_eq!(screen.activity().len(), 7);
        assert_eq!(screen.alerts().len(), 4);
        assert_eq!(screen.open_alerts().len(), 2);
    }

    #[tokio::test]
    async fn derived_shares_use_stats() {
        let screen = loaded_screen().await;
        assert!((screen.daily_active_share() - 14.518).abs() < 0.01);
        assert!((screen.paid_share() - 34.076).abs() < 0.01);
    }

    #[tokio::test]
    async fn resolve_alert_is_idempotent() {
        let mut screen = loaded_screen().await;
        let mut ctx = ScreenContext::default();
        screen.resolve_alert(&mut ctx, 1).unwrap();
        screen.resolve_alert(&mut ctx, 1).unwrap();
        assert_eq!(screen.open_alerts().len(), 1);
        assert!(screen.resolve_alert(&mut ctx, 99).is_err());
    }

    #[tokio::test]
    async fn stats_feed_outage_surfaces_load_error() {
        let service = InMemoryService::default();
        service.induce_load_failure(true);
        let mut screen = DashboardScreen::new(service);
        match screen.load(&Loader::default(), TimeRange::Week).await {
            Err(AdminError::LoadFailure(_)) => {}
            other => panic!("expected load failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn present_publishes_headline_numbers() {
        let screen = loaded_screen().await;
        let mut ctx = ScreenContext::default();
        screen.present(&mut ctx);
        assert_eq!(ctx.context.int("total_users"), Some(15427));
        assert_eq!(ctx.context.string("time_range"), Some("30d".into()));
        assert_eq!(ctx.context.int("open_alert_count"), Some(2));
    }
}
