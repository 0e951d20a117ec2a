//! Analytics screen: the aggregate report per time range and its CSV
//! exports.

use crate::load::Loader;
use crate::services::{
    AdminError, AdminService, AnalyticsReport, ScreenContext, ServiceResult, TimeRange,
};
use chrono::Utc;
use serde_json::json;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReportKind {
    Overview,
    Users,
    Engagement,
    Revenue,
    Reports,
}

impl ReportKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ReportKind::Overview => "overview",
            ReportKind::Users => "users",
            ReportKind::Engagement => "engagement",
            ReportKind::Revenue => "revenue",
            ReportKind::Reports => "reports",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "overview" => Some(ReportKind::Overview),
            "users" => Some(ReportKind::Users),
            "engagement" => Some(ReportKind::Engagement),
            "revenue" => Some(ReportKind::Revenue),
            "reports" => Some(ReportKind::Reports),
            _ => None,
        }
    }
}

/// Download name for an export, e.g. `mpenzi-users-report-2024-01-15.csv`.
pub fn report_filename(kind: ReportKind) -> String {
    format!(
        "mpenzi-{}-report-{}.csv",
        kind.tag(),
        Utc::now().format("%Y-%m-%d")
    )
}

pub struct AnalyticsScreen<S: AdminService> {
    service: S,
    range: TimeRange,
    report: AnalyticsReport,
}

impl<S: AdminService> AnalyticsScreen<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            range: TimeRange::default(),
            report: AnalyticsReport::default(),
        }
    }

    pub async fn load(&mut self, loader: &Loader, range: TimeRange) -> ServiceResult<()> {
        let latency = self.service.load_latency();
        self.range = range;
        self.report = loader
            .fetch(latency, || self.service.analytics_report(range))
            .await?;
        Ok(())
    }

    pub fn report(&self) -> &AnalyticsReport {
        &self.report
    }

    pub fn range(&self) -> TimeRange {
        self.range
    }

    /// Renders one report section as CSV, gated on the analytics
    /// permission since exports leave the dashboard.
    pub fn export_csv(&self, ctx: &mut ScreenContext, kind: ReportKind) -> ServiceResult<String> {
        if !self.service.allowed_to(ctx, "view_analytics") {
            return Err(AdminError::PermissionDenied("view_analytics".into()));
        }
        let csv = match kind {
            ReportKind::Overview => self.overview_csv()?,
            ReportKind::Users => self.users_csv()?,
            ReportKind::Engagement => self.engagement_csv()?,
            ReportKind::Revenue => self.revenue_csv()?,
            ReportKind::Reports => self.reports_csv()?,
        };
        self.service.log_action(
            "analytics_export",
            Some(ctx.operator.id),
            &json!({ "kind": kind.tag(), "range": self.range.as_str() }),
        )?;
        ctx.context.set("export_filename", report_filename(kind));
        Ok(csv)
    }

    fn overview_csv(&self) -> ServiceResult<String> {
        let users = &self.report.users;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(["Metric", "Value"]).map_err(csv_error)?;
        let rows = [
            ("Total Users", users.total),
            ("Active Users", users.active),
            ("New Today", users.new_today),
        ];
        for (label, value) in rows {
            writer
                .write_record([label.to_string(), value.to_string()])
                .map_err(csv_error)?;
        }
        finish(writer)
    }

    fn users_csv(&self) -> ServiceResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["Age Group", "Count", "Percentage"])
            .map_err(csv_error)?;
        for group in &self.report.users.age_groups {
            writer
                .write_record([
                    group.label.clone(),
                    group.count.to_string(),
                    format!("{}%", group.percentage),
                ])
                .map_err(csv_error)?;
        }
        finish(writer)
    }

    fn engagement_csv(&self) -> ServiceResult<String> {
        let engagement = &self.report.engagement;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["Metric", "Total", "Daily", "Trend"])
            .map_err(csv_error)?;
        let rows = [
            ("Matches", &engagement.matches),
            ("Messages", &engagement.messages),
            ("Likes", &engagement.likes),
        ];
        for (label, stat) in rows {
            writer
                .write_record([
                    label.to_string(),
                    stat.total.to_string(),
                    stat.daily.to_string(),
                    format!("+{}%", stat.trend),
                ])
                .map_err(csv_error)?;
        }
        finish(writer)
    }

    fn revenue_csv(&self) -> ServiceResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["Plan", "Subscribers", "Revenue"])
            .map_err(csv_error)?;
        for plan in &self.report.revenue.plans {
            writer
                .write_record([
                    plan.plan.clone(),
                    plan.count.to_string(),
                    plan.revenue.to_string(),
                ])
                .map_err(csv_error)?;
        }
        finish(writer)
    }

    fn reports_csv(&self) -> ServiceResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(["Report Type", "Count", "Percentage"])
            .map_err(csv_error)?;
        for kind in &self.report.reports.kinds {
            writer
                .write_record([
                    kind.label.clone(),
                    kind.count.to_string(),
                    format!("{}%", kind.percentage),
                ])
                .map_err(csv_error)?;
        }
        finish(writer)
    }

    pub fn present(&self, ctx: &mut ScreenContext) {
        ctx.context.set("analytics_range", self.range.as_str());
        ctx.context.set("analytics_users", &self.report.users);
        ctx.context
            .set("analytics_engagement", &self.report.engagement);
        ctx.context.set("analytics_media", &self.report.media);
        ctx.context.set("analytics_revenue", &self.report.revenue);
        ctx.context.set("analytics_reports", &self.report.reports);
        ctx.context
            .set("analytics_performance", &self.report.performance);
    }
}

fn csv_error(err: csv::Error) -> AdminError {
    AdminError::Internal(format!("csv write failed: {err}"))
}

fn finish(writer: csv::Writer<Vec<u8>>) -> ServiceResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|err| AdminError::Internal(format!("csv flush failed: {err}")))?;
    String::from_utf8(bytes).map_err(|err| AdminError::Internal(format!("csv not utf-8: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryService;

    fn analyst_ctx() -> ScreenContext {
        let mut ctx = ScreenContext::default();
        ctx.operator.id = 9;
        ctx.operator.permissions.insert("view_analytics".into());
        ctx
    }

    async fn loaded_screen() -> AnalyticsScreen<InMemoryService> {
        let mut screen = AnalyticsScreen::new(InMemoryService::default());
        screen
            .load(&Loader::default(), TimeRange::Month)
            .await
            .unwrap();
        screen
    }

    #[tokio::test]
    async fn report_loads_every_section() {
        let screen = loaded_screen().await;
        let report = screen.report();
        assert_eq!(report.users.total, 15427);
        assert_eq!(report.engagement.matches.total, 45231);
        assert_eq!(report.revenue.plans.len(), 3);
        assert_eq!(report.performance.peak_hours.len(), 5);
    }

    #[tokio::test]
    async fn overview_export_lists_headline_metrics() {
        let screen = loaded_screen().await;
        let mut ctx = analyst_ctx();
        let csv = screen.export_csv(&mut ctx, ReportKind::Overview).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Metric,Value"));
        assert_eq!(lines.next(), Some("Total Users,15427"));
        assert_eq!(lines.next(), Some("Active Users,3241"));
        assert_eq!(lines.next(), Some("New Today,187"));
        assert_eq!(ReportKind::parse("overview"), Some(ReportKind::Overview));
    }

    #[tokio::test]
    async fn users_export_lists_age_groups() {
        let screen = loaded_screen().await;
        let mut ctx = analyst_ctx();
        let csv = screen.export_csv(&mut ctx, ReportKind::Users).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Age Group,Count,Percentage"));
        assert_eq!(lines.next(), Some("18-24,3214,21%"));
        assert_eq!(csv.lines().count(), 5);
    }

    #[tokio::test]
    async fn engagement_export_has_trend_column() {
        let screen = loaded_screen().await;
        let mut ctx = analyst_ctx();
        let csv = screen.export_csv(&mut ctx, ReportKind::Engagement).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Metric,Total,Daily,Trend"));
        assert_eq!(lines.next(), Some("Matches,45231,1234,+12%"));
    }

    #[tokio::test]
    async fn revenue_export_lists_plans() {
        let screen = loaded_screen().await;
        let mut ctx = analyst_ctx();
        let csv = screen.export_csv(&mut ctx, ReportKind::Revenue).unwrap();
        assert!(csv.starts_with("Plan,Subscribers,Revenue\n"));
        assert!(csv.contains("Premium,3456,345600"));
    }

    #[tokio::test]
    async fn reports_export_lists_kinds() {
        let screen = loaded_screen().await;
        let mut ctx = analyst_ctx();
        let csv = screen.export_csv(&mut ctx, ReportKind::Reports).unwrap();
        assert!(csv.starts_with("Report Type,Count,Percentage\n"));
        assert!(csv.contains("Fake Profile,567,24%"));
    }

    #[tokio::test]
    async fn export_needs_permission() {
        let screen = loaded_screen().await;
        let mut ctx = ScreenContext::default();
        match screen.export_csv(&mut ctx, ReportKind::Users) {
            Err(AdminError::PermissionDenied(_)) => {}
            other => panic!("expected permission denial, got {other:?}"),
        }
    }

    #[test]
    fn filename_carries_kind_and_date() {
        let name = report_filename(ReportKind::Revenue);
        assert!(name.starts_with("mpenzi-revenue-report-"));
        assert!(name.ends_with(".csv"));
    }
}
