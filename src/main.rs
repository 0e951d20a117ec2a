use mpenzi_admin_rust::analytics::{AnalyticsScreen, ReportKind};
use mpenzi_admin_rust::dashboard::DashboardScreen;
use mpenzi_admin_rust::load::Loader;
use mpenzi_admin_rust::media::MediaScreen;
use mpenzi_admin_rust::services::{InMemoryService, ScreenContext, TimeRange};
use mpenzi_admin_rust::users::UsersScreen;

#[tokio::main]
async fn main() {
    let service = InMemoryService::default();
    let loader = Loader::default();

    let mut ctx = ScreenContext::default();
    ctx.operator.id = 1;
    ctx.operator.is_admin = true;

    let mut dashboard = DashboardScreen::new(service.clone());
    if let Err(error) = dashboard.load(&loader, TimeRange::Month).await {
        eprintln!("dashboard load -> {error}");
    } else {
        let stats = dashboard.stats();
        println!(
            "{} users, {} active today, {} open alerts",
            stats.total_users,
            stats.active_today,
            dashboard.open_alerts().len()
        );
    }

    let mut users = UsersScreen::new(service.clone());
    if let Err(error) = users.load(&loader).await {
        eprintln!("users load -> {error}");
    } else {
        users.toggle_selection(4);
        if let Err(error) = users.set_bulk_action("suspend") {
            eprintln!("set_bulk_action -> {error}");
        }
        match users.apply_bulk(&mut ctx) {
            Ok(affected) => println!("suspended {affected} account(s)"),
            Err(error) => eprintln!("apply_bulk -> {error}"),
        }
    }

    let mut media = MediaScreen::new(service.clone());
    if let Err(error) = media.load(&loader).await {
        eprintln!("media load -> {error}");
    } else {
        println!("{} media items pending review", media.pending_count());
    }

    let mut analytics = AnalyticsScreen::new(service.clone());
    if let Err(error) = analytics.load(&loader, TimeRange::Month).await {
        eprintln!("analytics load -> {error}");
    } else {
        match analytics.export_csv(&mut ctx, ReportKind::Users) {
            Ok(csv) => println!("users export:\n{csv}"),
            Err(error) => eprintln!("export_csv -> {error}"),
        }
    }

    for entry in service.audit_entries() {
        println!("audit: {} {:?}", entry.action, entry.details);
    }
}
