use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, AdminError>;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("load failure: {0}")]
    LoadFailure(String),
    #[error("action failure: {0}")]
    ActionFailure(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON-typed bag used by screens to publish view context.
#[derive(Clone, Debug, Default)]
pub struct ViewBag {
    inner: HashMap<String, Value>,
}

impl ViewBag {
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.inner.get(key)
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) {
        self.inner.insert(
            key.to_string(),
            serde_json::to_value(value).unwrap_or(Value::Null),
        );
    }

    pub fn remove(&mut self, key: &str) {
        self.inner.remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn bool(&self, key: &str) -> bool {
        self.inner
            .get(key)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.inner.get(key).and_then(|value| value.as_i64())
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.inner.get(key).and_then(|value| value.as_f64())
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.inner
            .get(key)
            .and_then(|value| value.as_str().map(|s| s.to_string()))
    }
}

/// Operator-supplied input, either query criteria or form fields.
#[derive(Clone, Debug, Default)]
pub struct FormVars {
    data: ViewBag,
}

impl FormVars {
    pub fn new() -> Self {
        Self {
            data: ViewBag::new(),
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) {
        self.data.set(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.data.remove(key);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains(key)
    }

    pub fn bool(&self, key: &str) -> bool {
        self.data.bool(key)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.data.int(key)
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.data.float(key)
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.data.string(key)
    }

    pub fn int_list(&self, key: &str) -> Vec<i64> {
        self.data
            .get(key)
            .and_then(|value| value.as_array())
            .map(|items| items.iter().filter_map(|item| item.as_i64()).collect())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct OperatorInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub permissions: HashSet<String>,
}

impl Default for OperatorInfo {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::from("Operator"),
            email: String::new(),
            is_admin: false,
            permissions: HashSet::new(),
        }
    }
}

/// Per-screen session context: published view data, operator input,
/// and the acting operator.
#[derive(Clone, Debug, Default)]
pub struct ScreenContext {
    pub context: ViewBag,
    pub request: FormVars,
    pub form: FormVars,
    pub session: ViewBag,
    pub operator: OperatorInfo,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub enum TimeRange {
    Week,
    #[default]
    Month,
    Quarter,
}

impl TimeRange {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeRange::Week => "7d",
            TimeRange::Month => "30d",
            TimeRange::Quarter => "90d",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "7d" => Some(TimeRange::Week),
            "30d" => Some(TimeRange::Month),
            "90d" => Some(TimeRange::Quarter),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
    Banned,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Suspended => "suspended",
            UserStatus::Banned => "banned",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "active" => Some(UserStatus::Active),
            "inactive" => Some(UserStatus::Inactive),
            "suspended" => Some(UserStatus::Suspended),
            "banned" => Some(UserStatus::Banned),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub age: i64,
    pub gender: String,
    pub location: String,
    pub status: UserStatus,
    pub verified: bool,
    pub profile_completed: bool,
    pub last_active: DateTime<Utc>,
    pub join_date: DateTime<Utc>,
    pub profile_image: Option<String>,
    pub bio: Option<String>,
    pub interests: Vec<String>,
    pub reports: i64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    Pending,
    Approved,
    Rejected,
    Flagged,
}

impl MediaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::Pending => "pending",
            MediaStatus::Approved => "approved",
            MediaStatus::Rejected => "rejected",
            MediaStatus::Flagged => "flagged",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "pending" => Some(MediaStatus::Pending),
            "approved" => Some(MediaStatus::Approved),
            "rejected" => Some(MediaStatus::Rejected),
            "flagged" => Some(MediaStatus::Flagged),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Verified,
    Pending,
    Unverified,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Verified => "verified",
            VerificationStatus::Pending => "pending",
            VerificationStatus::Unverified => "unverified",
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct MediaRecord {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub kind: MediaKind,
    pub url: String,
    pub status: MediaStatus,
    pub uploaded_at: DateTime<Utc>,
    pub ai_score: Option<f64>,
    pub rejection_reason: Option<String>,
    pub user_age: i64,
    pub user_gender: String,
    pub profile_picture: bool,
    pub media_position: i64,
    pub reports: i64,
    pub user_verification: VerificationStatus,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Monitored,
    Blocked,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::Monitored => "monitored",
            ConversationStatus::Blocked => "blocked",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "active" => Some(ConversationStatus::Active),
            "monitored" => Some(ConversationStatus::Monitored),
            "blocked" => Some(ConversationStatus::Blocked),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PeerInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConversationRecord {
    pub id: i64,
    pub user_a: PeerInfo,
    pub user_b: PeerInfo,
    pub last_message: String,
    pub message_count: i64,
    pub flagged_count: i64,
    pub last_activity: DateTime<Utc>,
    pub status: ConversationStatus,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSeverity {
    Normal,
    Warning,
    Danger,
}

#[derive(Clone, Debug, Serialize)]
pub struct MessageRecord {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub sender_name: String,
    pub receiver_id: i64,
    pub receiver_name: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub flagged: bool,
    pub flag_reason: Option<String>,
    pub ai_score: Option<f64>,
    pub severity: MessageSeverity,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Draft,
    Scheduled,
    Sent,
    Failed,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationTarget {
    All,
    Segment(String),
    Specific(Vec<i64>),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    All,
    Android,
    Ios,
    Web,
}

impl Platform {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "all" => Some(Platform::All),
            "android" => Some(Platform::Android),
            "ios" => Some(Platform::Ios),
            "web" => Some(Platform::Web),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NotificationRecord {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub target: NotificationTarget,
    pub platform: Platform,
    pub scheduled: bool,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub status: NotificationStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub opened: i64,
    pub total_sent: i64,
    pub image_url: Option<String>,
    pub deep_link: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct UserSegment {
    pub id: String,
    pub name: String,
    pub description: String,
    pub user_count: i64,
    pub criteria: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct DispatchReceipt {
    pub notification_id: i64,
    pub delivered: i64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Warning,
    Error,
    Info,
    Success,
}

#[derive(Clone, Debug, Serialize)]
pub struct AlertRecord {
    pub id: i64,
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: bool,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ActivityPoint {
    pub date: String,
    pub users: i64,
    pub matches: i64,
    pub messages: i64,
    pub revenue: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RevenueStats {
    pub total: i64,
    pub monthly: i64,
    pub daily: i64,
    pub growth: f64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct SubscriptionStats {
    pub premium: i64,
    pub gold: i64,
    pub basic: i64,
    pub total: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub active_today: i64,
    pub active_this_week: i64,
    pub new_signups: i64,
    pub reports_received: i64,
    pub matches_made: i64,
    pub user_growth: f64,
    pub engagement_rate: f64,
    pub revenue: RevenueStats,
    pub subscriptions: SubscriptionStats,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ShareCount {
    pub label: String,
    pub count: i64,
    pub percentage: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TrendStat {
    pub total: i64,
    pub daily: i64,
    pub trend: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RetentionStats {
    pub day1: i64,
    pub day7: i64,
    pub day30: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct EngagementStats {
    pub matches: TrendStat,
    pub messages: TrendStat,
    pub likes: TrendStat,
    pub session_minutes: f64,
    pub session_trend: i64,
    pub retention: RetentionStats,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct MediaBreakdown {
    pub total: i64,
    pub approved: i64,
    pub pending: i64,
    pub rejected: i64,
    pub flagged: i64,
    pub kinds: Vec<ShareCount>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct PlanRevenue {
    pub plan: String,
    pub count: i64,
    pub revenue: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct MonthRevenue {
    pub month: String,
    pub revenue: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct RevenueBreakdown {
    pub total: i64,
    pub monthly: i64,
    pub plans: Vec<PlanRevenue>,
    pub growth: Vec<MonthRevenue>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct TrendingReport {
    pub kind: String,
    pub increase: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ReportBreakdown {
    pub total: i64,
    pub resolved: i64,
    pub pending: i64,
    pub kinds: Vec<ShareCount>,
    pub trending: Vec<TrendingReport>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct GrowthPoint {
    pub date: String,
    pub count: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct UserBreakdown {
    pub total: i64,
    pub new_today: i64,
    pub active: i64,
    pub verified: i64,
    pub age_groups: Vec<ShareCount>,
    pub gender: Vec<ShareCount>,
    pub locations: Vec<ShareCount>,
    pub growth: Vec<GrowthPoint>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct PeakHour {
    pub hour: String,
    pub users: i64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct PerformanceStats {
    pub response_time_ms: i64,
    pub uptime: f64,
    pub errors: i64,
    pub peak_hours: Vec<PeakHour>,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct AnalyticsReport {
    pub users: UserBreakdown,
    pub engagement: EngagementStats,
    pub media: MediaBreakdown,
    pub revenue: RevenueBreakdown,
    pub reports: ReportBreakdown,
    pub performance: PerformanceStats,
}

#[derive(Clone, Debug, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub action: String,
    pub operator_id: Option<i64>,
    pub details: Value,
    pub timestamp: DateTime<Utc>,
}

/// Boundary to the (mocked) platform backend: data source, action sink,
/// notification delivery, and audit log.
pub trait AdminService {
    fn fetch_users(&self) -> ServiceResult<Vec<UserRecord>>;
    fn fetch_media(&self) -> ServiceResult<Vec<MediaRecord>>;
    fn fetch_conversations(&self) -> ServiceResult<Vec<ConversationRecord>>;
    fn fetch_thread(&self, conversation_id: i64) -> ServiceResult<Vec<MessageRecord>>;
    fn fetch_notifications(&self) -> ServiceResult<Vec<NotificationRecord>>;
    fn list_segments(&self) -> ServiceResult<Vec<UserSegment>>;
    fn estimated_reach(&self, target: &NotificationTarget) -> ServiceResult<i64>;
    fn dispatch_notification(&self, record: &NotificationRecord) -> ServiceResult<DispatchReceipt>;
    fn dashboard_stats(&self, range: TimeRange) -> ServiceResult<DashboardStats>;
    fn fetch_alerts(&self) -> ServiceResult<Vec<AlertRecord>>;
    fn activity_series(&self, range: TimeRange) -> ServiceResult<Vec<ActivityPoint>>;
    fn analytics_report(&self, range: TimeRange) -> ServiceResult<AnalyticsReport>;
    fn moderation_scores(&self, ids: &[i64]) -> ServiceResult<HashMap<i64, f64>>;
    fn submit_action(&self, action: &str, ids: &[i64]) -> ServiceResult<()>;
    fn log_action(&self, action: &str, operator_id: Option<i64>, details: &Value)
        -> ServiceResult<()>;
    fn allowed_to(&self, ctx: &ScreenContext, permission: &str) -> bool;
    fn load_latency(&self) -> Duration;
}

#[derive(Debug, Default)]
struct InMemoryState {
    users: Vec<UserRecord>,
    media: Vec<MediaRecord>,
    conversations: Vec<ConversationRecord>,
    threads: HashMap<i64, Vec<MessageRecord>>,
    notifications: Vec<NotificationRecord>,
    segments: Vec<UserSegment>,
    alerts: Vec<AlertRecord>,
    activity: Vec<ActivityPoint>,
    stats: DashboardStats,
    report: AnalyticsReport,
    audit: Vec<AuditEntry>,
    next_audit_id: i64,
    next_notification_id: i64,
    latency_ms: u64,
    fail_loads: bool,
}

#[derive(Clone)]
pub struct InMemoryService {
    state: Arc<Mutex<InMemoryState>>,
}

fn sample_time(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .unwrap_or_default()
}

impl InMemoryService {
    pub fn new_with_sample() -> Self {
        let mut state = InMemoryState {
            latency_ms: 0,
            next_audit_id: 1,
            next_notification_id: 1,
            ..InMemoryState::default()
        };

        state.users = sample_users();
        state.media = sample_media();
        state.conversations = sample_conversations();
        state.threads.insert(1, sample_thread(1));
        state.notifications = sample_notifications();
        state.next_notification_id =
            state.notifications.iter().map(|n| n.id).max().unwrap_or(0) + 1;
        state.segments = sample_segments();
        state.alerts = sample_alerts();
        state.activity = sample_activity();
        state.stats = sample_stats();
        state.report = sample_report();

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Artificial fetch delay, standing in for network latency.
    pub fn set_latency(&self, latency: Duration) {
        let mut state = self.state.lock().unwrap();
        state.latency_ms = latency.as_millis() as u64;
    }

    /// Makes every subsequent fetch fail, to exercise retry paths.
    pub fn induce_load_failure(&self, fail: bool) {
        let mut state = self.state.lock().unwrap();
        state.fail_loads = fail;
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        let state = self.state.lock().unwrap();
        state.audit.clone()
    }

    fn guard_load(&self, source: &str) -> ServiceResult<()> {
        let state = self.state.lock().unwrap();
        if state.fail_loads {
            Err(AdminError::LoadFailure(format!("{source} unavailable")))
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryService {
    fn default() -> Self {
        Self::new_with_sample()
    }
}

impl AdminService for InMemoryService {
    fn fetch_users(&self) -> ServiceResult<Vec<UserRecord>> {
        self.guard_load("user directory")?;
        let state = self.state.lock().unwrap();
        Ok(state.users.clone())
    }

    fn fetch_media(&self) -> ServiceResult<Vec<MediaRecord>> {
        self.guard_load("media library")?;
        let state = self.state.lock().unwrap();
        Ok(state.media.clone())
    }

    fn fetch_conversations(&self) -> ServiceResult<Vec<ConversationRecord>> {
        self.guard_load("conversation index")?;
        let state = self.state.lock().unwrap();
        Ok(state.conversations.clone())
    }

    fn fetch_thread(&self, conversation_id: i64) -> ServiceResult<Vec<MessageRecord>> {
        self.guard_load("message store")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .threads
            .get(&conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    fn fetch_notifications(&self) -> ServiceResult<Vec<NotificationRecord>> {
        self.guard_load("notification history")?;
        let state = self.state.lock().unwrap();
        Ok(state.notifications.clone())
    }

    fn list_segments(&self) -> ServiceResult<Vec<UserSegment>> {
        let state = self.state.lock().unwrap();
        Ok(state.segments.clone())
    }

    fn estimated_reach(&self, target: &NotificationTarget) -> ServiceResult<i64> {
        let state = self.state.lock().unwrap();
        match target {
            NotificationTarget::All => Ok(state.stats.total_users),
            NotificationTarget::Segment(id) => Ok(state
                .segments
                .iter()
                .find(|segment| segment.id == *id)
                .map(|segment| segment.user_count)
                .unwrap_or(0)),
            NotificationTarget::Specific(ids) => Ok(ids.len() as i64),
        }
    }

    fn dispatch_notification(&self, record: &NotificationRecord) -> ServiceResult<DispatchReceipt> {
        let delivered = if record.scheduled {
            0
        } else {
            self.estimated_reach(&record.target)?
        };
        let mut state = self.state.lock().unwrap();
        let id = state.next_notification_id;
        state.next_notification_id += 1;
        let mut stored = record.clone();
        stored.id = id;
        stored.total_sent = delivered;
        state.notifications.insert(0, stored);
        Ok(DispatchReceipt {
            notification_id: id,
            delivered,
        })
    }

    fn dashboard_stats(&self, _range: TimeRange) -> ServiceResult<DashboardStats> {
        self.guard_load("stats feed")?;
        let state = self.state.lock().unwrap();
        Ok(state.stats.clone())
    }

    fn fetch_alerts(&self) -> ServiceResult<Vec<AlertRecord>> {
        let state = self.state.lock().unwrap();
        Ok(state.alerts.clone())
    }

    fn activity_series(&self, range: TimeRange) -> ServiceResult<Vec<ActivityPoint>> {
        let state = self.state.lock().unwrap();
        let take = match range {
            TimeRange::Week => 7,
            TimeRange::Month | TimeRange::Quarter => state.activity.len(),
        };
        Ok(state.activity.iter().take(take).cloned().collect())
    }

    fn analytics_report(&self, _range: TimeRange) -> ServiceResult<AnalyticsReport> {
        self.guard_load("analytics warehouse")?;
        let state = self.state.lock().unwrap();
        Ok(state.report.clone())
    }

    fn moderation_scores(&self, ids: &[i64]) -> ServiceResult<HashMap<i64, f64>> {
        // Deterministic stand-in for the real scoring model.
        Ok(ids
            .iter()
            .map(|id| {
                let mixed = id.wrapping_mul(2654435761).rem_euclid(97);
                (*id, mixed as f64 / 96.0)
            })
            .collect())
    }

    fn submit_action(&self, _action: &str, _ids: &[i64]) -> ServiceResult<()> {
        // The mock sink always accepts; a real backend reports per-id failures.
        Ok(())
    }

    fn log_action(
        &self,
        action: &str,
        operator_id: Option<i64>,
        details: &Value,
    ) -> ServiceResult<()> {
        let mut state = self.state.lock().unwrap();
        let id = state.next_audit_id;
        state.next_audit_id += 1;
        state.audit.push(AuditEntry {
            id,
            action: action.into(),
            operator_id,
            details: details.clone(),
            timestamp: Utc::now(),
        });
        Ok(())
    }

    fn allowed_to(&self, ctx: &ScreenContext, permission: &str) -> bool {
        ctx.operator.is_admin || ctx.operator.permissions.contains(permission)
    }

    fn load_latency(&self) -> Duration {
        let state = self.state.lock().unwrap();
        Duration::from_millis(state.latency_ms)
    }
}

fn sample_users() -> Vec<UserRecord> {
    vec![
        UserRecord {
            id: 1,
            name: "Sarah Johnson".into(),
            email: "sarah.j@example.com".into(),
            age: 28,
            gender: "female".into(),
            location: "New York, NY".into(),
            status: UserStatus::Active,
            verified: true,
            profile_completed: true,
            last_active: sample_time(2024, 1, 15, 14, 30),
            join_date: sample_time(2024, 1, 10, 0, 0),
            profile_image: Some("/images/profile1.jpg".into()),
            bio: Some("Adventure seeker and coffee lover.".into()),
            interests: vec![
                "Hiking".into(),
                "Photography".into(),
                "Coffee".into(),
                "Travel".into(),
            ],
            reports: 0,
        },
        UserRecord {
            id: 2,
            name: "Mike Chen".into(),
            email: "mike.chen@example.com".into(),
            age: 32,
            gender: "male".into(),
            location: "San Francisco, CA".into(),
            status: UserStatus::Active,
            verified: true,
            profile_completed: true,
            last_active: sample_time(2024, 1, 15, 13, 15),
            join_date: sample_time(2024, 1, 8, 0, 0),
            profile_image: None,
            bio: Some("Software engineer who loves hiking.".into()),
            interests: vec![
                "Technology".into(),
                "Hiking".into(),
                "Food".into(),
                "Movies".into(),
            ],
            reports: 1,
        },
        UserRecord {
            id: 3,
            name: "Emily Davis".into(),
            email: "emily.d@example.com".into(),
            age: 25,
            gender: "female".into(),
            location: "Chicago, IL".into(),
            status: UserStatus::Inactive,
            verified: false,
            profile_completed: false,
            last_active: sample_time(2024, 1, 10, 9, 45),
            join_date: sample_time(2024, 1, 5, 0, 0),
            profile_image: None,
            bio: Some("Art student passionate about painting.".into()),
            interests: vec![
                "Art".into(),
                "Museums".into(),
                "Painting".into(),
                "Reading".into(),
            ],
            reports: 0,
        },
        UserRecord {
            id: 4,
            name: "Alex Rodriguez".into(),
            email: "alex.r@example.com".into(),
            age: 35,
            gender: "male".into(),
            location: "Miami, FL".into(),
            status: UserStatus::Suspended,
            verified: true,
            profile_completed: true,
            last_active: sample_time(2024, 1, 14, 16, 20),
            join_date: sample_time(2024, 1, 3, 0, 0),
            profile_image: None,
            bio: Some("Fitness trainer and beach enthusiast.".into()),
            interests: vec![
                "Fitness".into(),
                "Beach".into(),
                "Sports".into(),
                "Nutrition".into(),
            ],
            reports: 3,
        },
        UserRecord {
            id: 5,
            name: "Jessica Williams".into(),
            email: "jessica.w@example.com".into(),
            age: 29,
            gender: "female".into(),
            location: "Austin, TX".into(),
            status: UserStatus::Banned,
            verified: true,
            profile_completed: true,
            last_active: sample_time(2024, 1, 12, 11, 30),
            join_date: sample_time(2024, 1, 2, 0, 0),
            profile_image: None,
            bio: Some("Music producer and dog mom.".into()),
            interests: vec![
                "Music".into(),
                "Dogs".into(),
                "Concerts".into(),
                "Travel".into(),
            ],
            reports: 5,
        },
        UserRecord {
            id: 6,
            name: "David Kim".into(),
            email: "david.kim@example.com".into(),
            age: 31,
            gender: "male".into(),
            location: "Seattle, WA".into(),
            status: UserStatus::Active,
            verified: true,
            profile_completed: true,
            last_active: sample_time(2024, 1, 15, 15, 45),
            join_date: sample_time(2024, 1, 12, 0, 0),
            profile_image: None,
            bio: Some("Coffee roaster and mountain biker.".into()),
            interests: vec![
                "Coffee".into(),
                "Biking".into(),
                "Nature".into(),
                "Photography".into(),
            ],
            reports: 0,
        },
    ]
}

fn sample_media() -> Vec<MediaRecord> {
    vec![
        MediaRecord {
            id: 1,
            user_id: 101,
            user_name: "Sarah Johnson".into(),
            user_email: "sarah.j@example.com".into(),
            kind: MediaKind::Image,
            url: "/images/profile1.jpg".into(),
            status: MediaStatus::Approved,
            uploaded_at: sample_time(2024, 1, 15, 10, 30),
            ai_score: Some(0.95),
            rejection_reason: None,
            user_age: 28,
            user_gender: "female".into(),
            profile_picture: true,
            media_position: 1,
            reports: 0,
            user_verification: VerificationStatus::Verified,
        },
        MediaRecord {
            id: 2,
            user_id: 102,
            user_name: "Mike Chen".into(),
            user_email: "mike.chen@example.com".into(),
            kind: MediaKind::Image,
            url: "/images/profile2.jpg".into(),
            status: MediaStatus::Pending,
            uploaded_at: sample_time(2024, 1, 15, 14, 20),
            ai_score: Some(0.78),
            rejection_reason: None,
            user_age: 32,
            user_gender: "male".into(),
            profile_picture: true,
            media_position: 1,
            reports: 2,
            user_verification: VerificationStatus::Pending,
        },
        MediaRecord {
            id: 3,
            user_id: 103,
            user_name: "Emily Davis".into(),
            user_email: "emily.d@example.com".into(),
            kind: MediaKind::Video,
            url: "/videos/intro1.mp4".into(),
            status: MediaStatus::Flagged,
            uploaded_at: sample_time(2024, 1, 14, 16, 45),
            ai_score: Some(0.35),
            rejection_reason: None,
            user_age: 25,
            user_gender: "female".into(),
            profile_picture: false,
            media_position: 3,
            reports: 4,
            user_verification: VerificationStatus::Unverified,
        },
        MediaRecord {
            id: 4,
            user_id: 104,
            user_name: "Alex Rodriguez".into(),
            user_email: "alex.r@example.com".into(),
            kind: MediaKind::Image,
            url: "/images/gallery1.jpg".into(),
            status: MediaStatus::Rejected,
            uploaded_at: sample_time(2024, 1, 14, 9, 10),
            ai_score: Some(0.42),
            rejection_reason: Some("Inappropriate content".into()),
            user_age: 35,
            user_gender: "male".into(),
            profile_picture: false,
            media_position: 2,
            reports: 1,
            user_verification: VerificationStatus::Verified,
        },
        MediaRecord {
            id: 5,
            user_id: 105,
            user_name: "Jessica Williams".into(),
            user_email: "jessica.w@example.com".into(),
            kind: MediaKind::Image,
            url: "/images/profile5.jpg".into(),
            status: MediaStatus::Approved,
            uploaded_at: sample_time(2024, 1, 13, 19, 30),
            ai_score: Some(0.92),
            rejection_reason: None,
            user_age: 29,
            user_gender: "female".into(),
            profile_picture: true,
            media_position: 1,
            reports: 0,
            user_verification: VerificationStatus::Verified,
        },
        MediaRecord {
            id: 6,
            user_id: 106,
            user_name: "David Kim".into(),
            user_email: "david.kim@example.com".into(),
            kind: MediaKind::Video,
            url: "/videos/intro2.mp4".into(),
            status: MediaStatus::Pending,
            uploaded_at: sample_time(2024, 1, 15, 8, 5),
            ai_score: Some(0.67),
            rejection_reason: None,
            user_age: 31,
            user_gender: "male".into(),
            profile_picture: false,
            media_position: 4,
            reports: 0,
            user_verification: VerificationStatus::Verified,
        },
    ]
}

fn sample_conversations() -> Vec<ConversationRecord> {
    vec![
        ConversationRecord {
            id: 1,
            user_a: PeerInfo {
                id: 101,
                name: "Sarah Johnson".into(),
                email: "sarah.j@example.com".into(),
            },
            user_b: PeerInfo {
                id: 102,
                name: "Mike Chen".into(),
                email: "mike.chen@example.com".into(),
            },
            last_message: "Can you send me your phone number?".into(),
            message_count: 47,
            flagged_count: 3,
            last_activity: sample_time(2024, 1, 15, 14, 30),
            status: ConversationStatus::Monitored,
        },
        ConversationRecord {
            id: 2,
            user_a: PeerInfo {
                id: 103,
                name: "Emily Davis".into(),
                email: "emily.d@example.com".into(),
            },
            user_b: PeerInfo {
                id: 104,
                name: "Alex Rodriguez".into(),
                email: "alex.r@example.com".into(),
            },
            last_message: "That's inappropriate!".into(),
            message_count: 12,
            flagged_count: 5,
            last_activity: sample_time(2024, 1, 15, 13, 15),
            status: ConversationStatus::Blocked,
        },
        ConversationRecord {
            id: 3,
            user_a: PeerInfo {
                id: 105,
                name: "Jessica Williams".into(),
                email: "jessica.w@example.com".into(),
            },
            user_b: PeerInfo {
                id: 106,
                name: "David Kim".into(),
                email: "david.kim@example.com".into(),
            },
            last_message: "Looking forward to our date!".into(),
            message_count: 89,
            flagged_count: 0,
            last_activity: sample_time(2024, 1, 15, 15, 45),
            status: ConversationStatus::Active,
        },
        ConversationRecord {
            id: 4,
            user_a: PeerInfo {
                id: 107,
                name: "Brian Taylor".into(),
                email: "brian.t@example.com".into(),
            },
            user_b: PeerInfo {
                id: 108,
                name: "Amanda Lee".into(),
                email: "amanda.l@example.com".into(),
            },
            last_message: "I need your bank details for verification".into(),
            message_count: 23,
            flagged_count: 8,
            last_activity: sample_time(2024, 1, 14, 16, 20),
            status: ConversationStatus::Monitored,
        },
    ]
}

fn sample_thread(conversation_id: i64) -> Vec<MessageRecord> {
    vec![
        MessageRecord {
            id: 1,
            conversation_id,
            sender_id: 101,
            sender_name: "Sarah Johnson".into(),
            receiver_id: 102,
            receiver_name: "Mike Chen".into(),
            content: "Hi Mike! How are you doing?".into(),
            sent_at: sample_time(2024, 1, 15, 14, 0),
            flagged: false,
            flag_reason: None,
            ai_score: None,
            severity: MessageSeverity::Normal,
        },
        MessageRecord {
            id: 2,
            conversation_id,
            sender_id: 102,
            sender_name: "Mike Chen".into(),
            receiver_id: 101,
            receiver_name: "Sarah Johnson".into(),
            content: "I'm good! Can you send me your phone number? I want to call you".into(),
            sent_at: sample_time(2024, 1, 15, 14, 5),
            flagged: true,
            flag_reason: Some("Request for personal contact information".into()),
            ai_score: Some(0.87),
            severity: MessageSeverity::Warning,
        },
        MessageRecord {
            id: 3,
            conversation_id,
            sender_id: 101,
            sender_name: "Sarah Johnson".into(),
            receiver_id: 102,
            receiver_name: "Mike Chen".into(),
            content: "I prefer to chat here first".into(),
            sent_at: sample_time(2024, 1, 15, 14, 10),
            flagged: false,
            flag_reason: None,
            ai_score: None,
            severity: MessageSeverity::Normal,
        },
        MessageRecord {
            id: 4,
            conversation_id,
            sender_id: 102,
            sender_name: "Mike Chen".into(),
            receiver_id: 101,
            receiver_name: "Sarah Johnson".into(),
            content: "Come on, don't be shy. I can send you money if you need".into(),
            sent_at: sample_time(2024, 1, 15, 14, 15),
            flagged: true,
            flag_reason: Some("Financial scam pattern detected".into()),
            ai_score: Some(0.92),
            severity: MessageSeverity::Danger,
        },
        MessageRecord {
            id: 5,
            conversation_id,
            sender_id: 101,
            sender_name: "Sarah Johnson".into(),
            receiver_id: 102,
            receiver_name: "Mike Chen".into(),
            content: "That makes me uncomfortable".into(),
            sent_at: sample_time(2024, 1, 15, 14, 20),
            flagged: false,
            flag_reason: None,
            ai_score: None,
            severity: MessageSeverity::Normal,
        },
    ]
}

fn sample_notifications() -> Vec<NotificationRecord> {
    vec![
        NotificationRecord {
            id: 1,
            title: "Weekend Match Boost".into(),
            message: "Your profile gets 2x visibility this weekend!".into(),
            target: NotificationTarget::Segment("active".into()),
            platform: Platform::All,
            scheduled: false,
            scheduled_time: None,
            status: NotificationStatus::Sent,
            sent_at: Some(sample_time(2024, 1, 15, 9, 0)),
            created_at: sample_time(2024, 1, 15, 8, 45),
            opened: 640,
            total_sent: 1250,
            image_url: None,
            deep_link: Some("mpenzimatch://boost".into()),
        },
        NotificationRecord {
            id: 2,
            title: "Premium Discount".into(),
            message: "50% off premium for returning members".into(),
            target: NotificationTarget::Segment("inactive".into()),
            platform: Platform::All,
            scheduled: false,
            scheduled_time: None,
            status: NotificationStatus::Sent,
            sent_at: Some(sample_time(2024, 1, 14, 9, 0)),
            created_at: sample_time(2024, 1, 14, 8, 45),
            opened: 230,
            total_sent: 890,
            image_url: None,
            deep_link: Some("mpenzimatch://premium".into()),
        },
        NotificationRecord {
            id: 3,
            title: "Security Update".into(),
            message: "Please update your app for the latest security features".into(),
            target: NotificationTarget::All,
            platform: Platform::Android,
            scheduled: false,
            scheduled_time: None,
            status: NotificationStatus::Failed,
            sent_at: None,
            created_at: sample_time(2024, 1, 13, 16, 20),
            opened: 0,
            total_sent: 0,
            image_url: None,
            deep_link: None,
        },
        NotificationRecord {
            id: 4,
            title: "Event Invitation".into(),
            message: "Join our virtual dating event this Friday at 8 PM!".into(),
            target: NotificationTarget::Segment("active".into()),
            platform: Platform::All,
            scheduled: false,
            scheduled_time: None,
            status: NotificationStatus::Sent,
            sent_at: Some(sample_time(2024, 1, 12, 15, 30)),
            created_at: sample_time(2024, 1, 12, 15, 0),
            opened: 890,
            total_sent: 1250,
            image_url: Some("https://example.com/event-image.jpg".into()),
            deep_link: None,
        },
    ]
}

fn sample_segments() -> Vec<UserSegment> {
    vec![
        UserSegment {
            id: "active".into(),
            name: "Active Users".into(),
            description: "Users active in the last 7 days".into(),
            user_count: 1250,
            criteria: "last_active > 7 days ago".into(),
        },
        UserSegment {
            id: "inactive".into(),
            name: "Inactive Users".into(),
            description: "Users not active for 30+ days".into(),
            user_count: 890,
            criteria: "last_active > 30 days ago".into(),
        },
        UserSegment {
            id: "new".into(),
            name: "New Users".into(),
            description: "Users who joined in the last 30 days".into(),
            user_count: 340,
            criteria: "join_date > 30 days ago".into(),
        },
        UserSegment {
            id: "premium".into(),
            name: "Premium Members".into(),
            description: "Users with active premium subscriptions".into(),
            user_count: 156,
            criteria: "subscription_status = active".into(),
        },
        UserSegment {
            id: "kenya".into(),
            name: "Kenyan Users".into(),
            description: "Users located in Kenya".into(),
            user_count: 980,
            criteria: "country = Kenya".into(),
        },
        UserSegment {
            id: "international".into(),
            name: "International Users".into(),
            description: "Users outside Kenya".into(),
            user_count: 670,
            criteria: "country != Kenya".into(),
        },
    ]
}

fn sample_alerts() -> Vec<AlertRecord> {
    vec![
        AlertRecord {
            id: 1,
            kind: AlertKind::Warning,
            title: "High Report Volume".into(),
            message: "5 profiles reported in the last 2 hours".into(),
            timestamp: sample_time(2024, 1, 15, 14, 30),
            resolved: false,
        },
        AlertRecord {
            id: 2,
            kind: AlertKind::Error,
            title: "Server Latency".into(),
            message: "API response times above threshold".into(),
            timestamp: sample_time(2024, 1, 15, 13, 15),
            resolved: false,
        },
        AlertRecord {
            id: 3,
            kind: AlertKind::Info,
            title: "System Update".into(),
            message: "Scheduled maintenance tonight at 2 AM".into(),
            timestamp: sample_time(2024, 1, 15, 10, 0),
            resolved: true,
        },
        AlertRecord {
            id: 4,
            kind: AlertKind::Success,
            title: "Revenue Milestone".into(),
            message: "Monthly revenue target achieved".into(),
            timestamp: sample_time(2024, 1, 15, 9, 0),
            resolved: true,
        },
    ]
}

fn sample_activity() -> Vec<ActivityPoint> {
    let raw = [
        ("Jan 8", 1200, 450, 3200, 1150),
        ("Jan 9", 1350, 520, 3800, 1280),
        ("Jan 10", 1420, 480, 4100, 1210),
        ("Jan 11", 1560, 610, 4700, 1320),
        ("Jan 12", 1680, 590, 5200, 1290),
        ("Jan 13", 1720, 630, 5800, 1350),
        ("Jan 14", 1840, 670, 6200, 1420),
    ];
    raw.iter()
        .map(|(date, users, matches, messages, revenue)| ActivityPoint {
            date: (*date).into(),
            users: *users,
            matches: *matches,
            messages: *messages,
            revenue: *revenue,
        })
        .collect()
}

fn sample_stats() -> DashboardStats {
    DashboardStats {
        total_users: 15427,
        active_today: 1243,
        active_this_week: 8562,
        new_signups: 187,
        reports_received: 23,
        matches_made: 542,
        user_growth: 12.5,
        engagement_rate: 68.3,
        revenue: RevenueStats {
            total: 452_300,
            monthly: 38_750,
            daily: 1250,
            growth: 8.2,
        },
        subscriptions: SubscriptionStats {
            premium: 3456,
            gold: 1234,
            basic: 567,
            total: 5257,
        },
    }
}

fn share(label: &str, count: i64, percentage: i64) -> ShareCount {
    ShareCount {
        label: label.into(),
        count,
        percentage,
    }
}

fn sample_report() -> AnalyticsReport {
    AnalyticsReport {
        users: UserBreakdown {
            total: 15427,
            new_today: 187,
            active: 3241,
            verified: 8923,
            age_groups: vec![
                share("18-24", 3214, 21),
                share("25-34", 7856, 51),
                share("35-44", 2890, 19),
                share("45+", 1467, 9),
            ],
            gender: vec![
                share("Male", 8234, 53),
                share("Female", 6543, 42),
                share("Other", 650, 4),
            ],
            locations: vec![
                share("Kenya", 6543, 42),
                share("Nigeria", 3214, 21),
                share("South Africa", 2890, 19),
                share("Ghana", 1567, 10),
                share("Other", 1213, 8),
            ],
            growth: vec![
                GrowthPoint {
                    date: "Jan 1".into(),
                    count: 12000,
                },
                GrowthPoint {
                    date: "Jan 8".into(),
                    count: 12500,
                },
                GrowthPoint {
                    date: "Jan 15".into(),
                    count: 13200,
                },
                GrowthPoint {
                    date: "Jan 22".into(),
                    count: 14000,
                },
                GrowthPoint {
                    date: "Jan 29".into(),
                    count: 15427,
                },
            ],
        },
        engagement: EngagementStats {
            matches: TrendStat {
                total: 45231,
                daily: 1234,
                trend: 12,
            },
            messages: TrendStat {
                total: 289_456,
                daily: 5678,
                trend: 8,
            },
            likes: TrendStat {
                total: 156_789,
                daily: 3456,
                trend: 15,
            },
            session_minutes: 8.2,
            session_trend: 5,
            retention: RetentionStats {
                day1: 85,
                day7: 62,
                day30: 38,
            },
        },
        media: MediaBreakdown {
            total: 89234,
            approved: 72345,
            pending: 4567,
            rejected: 8923,
            flagged: 2345,
            kinds: vec![
                share("Profile Photos", 65432, 73),
                share("Gallery Photos", 18765, 21),
                share("Videos", 5037, 6),
            ],
        },
        revenue: RevenueBreakdown {
            total: 452_300,
            monthly: 38_750,
            plans: vec![
                PlanRevenue {
                    plan: "Premium".into(),
                    count: 3456,
                    revenue: 345_600,
                },
                PlanRevenue {
                    plan: "Gold".into(),
                    count: 1234,
                    revenue: 98_700,
                },
                PlanRevenue {
                    plan: "Basic".into(),
                    count: 567,
                    revenue: 8000,
                },
            ],
            growth: vec![
                MonthRevenue {
                    month: "Oct".into(),
                    revenue: 35_200,
                },
                MonthRevenue {
                    month: "Nov".into(),
                    revenue: 36_800,
                },
                MonthRevenue {
                    month: "Dec".into(),
                    revenue: 37_500,
                },
                MonthRevenue {
                    month: "Jan".into(),
                    revenue: 38_750,
                },
            ],
        },
        reports: ReportBreakdown {
            total: 2345,
            resolved: 1876,
            pending: 469,
            kinds: vec![
                share("Inappropriate Content", 892, 38),
                share("Fake Profile", 567, 24),
                share("Harassment", 345, 15),
                share("Spam", 289, 12),
                share("Other", 252, 11),
            ],
            trending: vec![
                TrendingReport {
                    kind: "Fake Profile".into(),
                    increase: 25,
                },
                TrendingReport {
                    kind: "Spam".into(),
                    increase: 18,
                },
                TrendingReport {
                    kind: "Harassment".into(),
                    increase: 12,
                },
            ],
        },
        performance: PerformanceStats {
            response_time_ms: 142,
            uptime: 99.8,
            errors: 23,
            peak_hours: vec![
                PeakHour {
                    hour: "20:00".into(),
                    users: 2345,
                },
                PeakHour {
                    hour: "21:00".into(),
                    users: 2876,
                },
                PeakHour {
                    hour: "22:00".into(),
                    users: 3123,
                },
                PeakHour {
                    hour: "23:00".into(),
                    users: 2987,
                },
                PeakHour {
                    hour: "00:00".into(),
                    users: 2456,
                },
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_data_seeded() {
        let service = InMemoryService::default();
        assert_eq!(service.fetch_users().unwrap().len(), 6);
        assert_eq!(service.fetch_media().unwrap().len(), 6);
        assert_eq!(service.fetch_conversations().unwrap().len(), 4);
        assert_eq!(service.fetch_thread(1).unwrap().len(), 5);
        assert!(service.fetch_thread(99).unwrap().is_empty());
    }

    #[test]
    fn induced_failure_surfaces_load_error() {
        let service = InMemoryService::default();
        service.induce_load_failure(true);
        match service.fetch_users() {
            Err(AdminError::LoadFailure(_)) => {}
            other => panic!("expected load failure, got {other:?}"),
        }
        service.induce_load_failure(false);
        assert!(service.fetch_users().is_ok());
    }

    #[test]
    fn estimated_reach_matches_target() {
        let service = InMemoryService::default();
        let all = service.estimated_reach(&NotificationTarget::All).unwrap();
        assert_eq!(all, 15427);
        let segment = service
            .estimated_reach(&NotificationTarget::Segment("premium".into()))
            .unwrap();
        assert_eq!(segment, 156);
        let specific = service
            .estimated_reach(&NotificationTarget::Specific(vec![1, 2, 3]))
            .unwrap();
        assert_eq!(specific, 3);
    }

    #[test]
    fn dispatch_stores_notification() {
        let service = InMemoryService::default();
        let before = service.fetch_notifications().unwrap().len();
        let record = NotificationRecord {
            id: 0,
            title: "Test".into(),
            message: "Body".into(),
            target: NotificationTarget::All,
            platform: Platform::All,
            scheduled: false,
            scheduled_time: None,
            status: NotificationStatus::Sent,
            sent_at: Some(Utc::now()),
            created_at: Utc::now(),
            opened: 0,
            total_sent: 0,
            image_url: None,
            deep_link: None,
        };
        let receipt = service.dispatch_notification(&record).unwrap();
        assert!(receipt.notification_id > 0);
        assert_eq!(receipt.delivered, 15427);
        assert_eq!(service.fetch_notifications().unwrap().len(), before + 1);
    }

    #[test]
    fn audit_log_records_actions() {
        let service = InMemoryService::default();
        service
            .log_action("ban_users", Some(7), &serde_json::json!({"ids": [1, 2]}))
            .unwrap();
        let entries = service.audit_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "ban_users");
        assert_eq!(entries[0].operator_id, Some(7));
    }
}
