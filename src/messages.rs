//! Message monitoring screen: flagged conversation oversight, thread
//! inspection and safety interventions.

use crate::load::Loader;
use crate::services::{
    AdminError, AdminService, ConversationRecord, ConversationStatus, MessageRecord,
    MessageSeverity, ScreenContext, ServiceResult,
};
use crate::table::{text_matches, Criteria, Record, RecordTable};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

lazy_static! {
    static ref CONTACT_PATTERN: Regex =
        Regex::new(r"(?i)\b(phone|whatsapp|telegram|instagram|snapchat)\b|\+?\d{7,}").unwrap();
    static ref FINANCIAL_PATTERN: Regex =
        Regex::new(r"(?i)\b(money|bank|mpesa|paypal|bitcoin|wire|transfer|card)\b").unwrap();
}

impl Record for ConversationRecord {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Heuristic classification applied to messages that arrive without a
/// moderation verdict attached.
pub fn classify_content(content: &str) -> (MessageSeverity, Option<String>) {
    if FINANCIAL_PATTERN.is_match(content) {
        return (
            MessageSeverity::Danger,
            Some("Financial scam pattern detected".into()),
        );
    }
    if CONTACT_PATTERN.is_match(content) {
        return (
            MessageSeverity::Warning,
            Some("Request for personal contact information".into()),
        );
    }
    (MessageSeverity::Normal, None)
}

#[derive(Clone, Debug)]
pub struct ConversationFilters {
    pub status: String,
    /// "all" or "flagged" (at least one flagged message).
    pub flagged: String,
    pub search: String,
}

impl Default for ConversationFilters {
    fn default() -> Self {
        Self {
            status: "all".into(),
            flagged: "all".into(),
            search: String::new(),
        }
    }
}

impl ConversationFilters {
    pub fn from_request(ctx: &ScreenContext) -> Self {
        let defaults = Self::default();
        Self {
            status: ctx.request.string("status").unwrap_or(defaults.status),
            flagged: ctx.request.string("flagged").unwrap_or(defaults.flagged),
            search: ctx.request.string("search").unwrap_or_default(),
        }
    }
}

impl Criteria<ConversationRecord> for ConversationFilters {
    fn matches(&self, convo: &ConversationRecord) -> bool {
        if self.status != "all" && convo.status.as_str() != self.status {
            return false;
        }
        if self.flagged == "flagged" && convo.flagged_count == 0 {
            return false;
        }
        if !self.search.is_empty() {
            let fields = [
                convo.user_a.name.as_str(),
                convo.user_a.email.as_str(),
                convo.user_b.name.as_str(),
                convo.user_b.email.as_str(),
            ];
            if !text_matches(&self.search, &fields) {
                return false;
            }
        }
        true
    }
}

/// Counts of the flag reasons seen across a thread, grouped the way the
/// safety team reports them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PatternSummary {
    pub personal_info: usize,
    pub financial: usize,
    pub inappropriate: usize,
}

/// Runs the classifier over every message the backend delivered without
/// a verdict and flags what it catches.
pub fn triage_thread(thread: &mut [MessageRecord]) {
    for message in thread.iter_mut() {
        if message.flagged || message.ai_score.is_some() {
            continue;
        }
        let (severity, reason) = classify_content(&message.content);
        if severity != MessageSeverity::Normal {
            message.severity = severity;
            message.flag_reason = reason;
            message.flagged = true;
        }
    }
}

pub fn summarize_patterns(thread: &[MessageRecord]) -> PatternSummary {
    let mut summary = PatternSummary::default();
    for message in thread.iter().filter(|m| m.flagged) {
        let reason = message
            .flag_reason
            .as_deref()
            .unwrap_or_default()
            .to_lowercase();
        if reason.contains("personal") || reason.contains("contact") {
            summary.personal_info += 1;
        } else if reason.contains("financial") || reason.contains("scam") {
            summary.financial += 1;
        } else {
            summary.inappropriate += 1;
        }
    }
    summary
}

pub struct MessagesScreen<S: AdminService> {
    service: S,
    table: RecordTable<ConversationRecord>,
    filters: ConversationFilters,
    thread: Vec<MessageRecord>,
}

impl<S: AdminService> MessagesScreen<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            table: RecordTable::new(),
            filters: ConversationFilters::default(),
            thread: Vec::new(),
        }
    }

    pub async fn load(&mut self, loader: &Loader) -> ServiceResult<usize> {
        let latency = self.service.load_latency();
        let conversations = loader
            .fetch(latency, || self.service.fetch_conversations())
            .await?;
        self.table.load(conversations);
        self.thread.clear();
        Ok(self.table.len())
    }

    pub fn set_filters(&mut self, filters: ConversationFilters) {
        self.filters = filters;
    }

    pub fn visible(&self) -> Vec<&ConversationRecord> {
        self.table.visible(&self.filters)
    }

    pub fn flagged_total(&self) -> i64 {
        self.table
            .records()
            .iter()
            .map(|convo| convo.flagged_count)
            .sum()
    }

    pub async fn open_conversation(
        &mut self,
        loader: &Loader,
        id: i64,
    ) -> ServiceResult<&[MessageRecord]> {
        if !self.table.open_detail(id) {
            return Err(AdminError::NotFound(format!("conversation {id}")));
        }
        let latency = self.service.load_latency();
        let mut thread = loader
            .fetch(latency, || self.service.fetch_thread(id))
            .await?;
        triage_thread(&mut thread);
        self.thread = thread;
        Ok(&self.thread)
    }

    pub fn close_conversation(&mut self) {
        self.table.close_detail();
        self.thread.clear();
    }

    pub fn conversation(&self) -> Option<&ConversationRecord> {
        self.table.detail()
    }

    pub fn thread(&self) -> &[MessageRecord] {
        &self.thread
    }

    pub fn flagged_in_thread(&self) -> Vec<&MessageRecord> {
        self.thread.iter().filter(|m| m.flagged).collect()
    }

    pub fn thread_patterns(&self) -> PatternSummary {
        summarize_patterns(&self.thread)
    }

    /// Blocks the conversation itself; both accounts keep their status.
    pub fn block_conversation(&mut self, ctx: &mut ScreenContext, id: i64) -> ServiceResult<()> {
        self.ensure_permission(ctx)?;
        if self.table.get(id).is_none() {
            return Err(AdminError::NotFound(format!("conversation {id}")));
        }
        self.service
            .submit_action("block_conversation", &[id])
            .map_err(|err| AdminError::ActionFailure(err.to_string()))?;
        self.table
            .update_one(id, |convo| convo.status = ConversationStatus::Blocked);
        self.service.log_action(
            "messages_block_conversation",
            Some(ctx.operator.id),
            &json!({ "conversation_id": id }),
        )
    }

    /// Escalation against one participant. The account change lands on
    /// the user screen; here it is recorded and forwarded.
    pub fn block_user(&mut self, ctx: &mut ScreenContext, user_id: i64) -> ServiceResult<()> {
        self.ensure_permission(ctx)?;
        self.service
            .submit_action("block_user", &[user_id])
            .map_err(|err| AdminError::ActionFailure(err.to_string()))?;
        self.service.log_action(
            "messages_block_user",
            Some(ctx.operator.id),
            &json!({ "user_id": user_id }),
        )
    }

    pub fn delete_message(&mut self, ctx: &mut ScreenContext, message_id: i64) -> ServiceResult<()> {
        self.ensure_permission(ctx)?;
        if !self.thread.iter().any(|m| m.id == message_id) {
            return Err(AdminError::NotFound(format!("message {message_id}")));
        }
        self.service
            .submit_action("delete_message", &[message_id])
            .map_err(|err| AdminError::ActionFailure(err.to_string()))?;
        self.thread.retain(|m| m.id != message_id);
        self.service.log_action(
            "messages_delete",
            Some(ctx.operator.id),
            &json!({ "message_id": message_id }),
        )
    }

    pub fn present(&self, ctx: &mut ScreenContext) {
        let listing: Vec<_> = self
            .visible()
            .into_iter()
            .map(|convo| {
                json!({
                    "id": convo.id,
                    "between": format!("{} & {}", convo.user_a.name, convo.user_b.name),
                    "last_message": convo.last_message,
                    "messages": convo.message_count,
                    "flagged": convo.flagged_count,
                    "status": convo.status,
                })
            })
            .collect();
        ctx.context.set("conversations_found", listing.len());
        ctx.context.set("flagged_messages", self.flagged_total());
        ctx.context.set("conversation_list", listing);
    }

    fn ensure_permission(&self, ctx: &ScreenContext) -> ServiceResult<()> {
        if self.service.allowed_to(ctx, "monitor_messages") {
            Ok(())
        } else {
            Err(AdminError::PermissionDenied("monitor_messages".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryService;

    fn monitor_ctx() -> ScreenContext {
        let mut ctx = ScreenContext::default();
        ctx.operator.id = 9;
        ctx.operator.permissions.insert("monitor_messages".into());
        ctx
    }

    async fn loaded_screen() -> MessagesScreen<InMemoryService> {
        let mut screen = MessagesScreen::new(InMemoryService::default());
        screen.load(&Loader::default()).await.unwrap();
        screen
    }

    #[tokio::test]
    async fn flagged_filter_hides_clean_conversations() {
        let mut screen = loaded_screen().await;
        screen.set_filters(ConversationFilters {
            flagged: "flagged".into(),
            ..ConversationFilters::default()
        });
        let ids: Vec<i64> = screen.visible().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
    }

    #[tokio::test]
    async fn search_matches_either_participant() {
        let mut screen = loaded_screen().await;
        screen.set_filters(ConversationFilters {
            search: "amanda".into(),
            ..ConversationFilters::default()
        });
        let ids: Vec<i64> = screen.visible().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![4]);
    }

    #[tokio::test]
    async fn open_conversation_loads_thread() {
        let mut screen = loaded_screen().await;
        let thread = screen.open_conversation(&Loader::default(), 1).await.unwrap();
        assert_eq!(thread.len(), 5);
        assert_eq!(screen.flagged_in_thread().len(), 2);
    }

    #[tokio::test]
    async fn thread_patterns_group_flag_reasons() {
        let mut screen = loaded_screen().await;
        screen.open_conversation(&Loader::default(), 1).await.unwrap();
        let summary = screen.thread_patterns();
        assert_eq!(summary.personal_info, 1);
        assert_eq!(summary.financial, 1);
        assert_eq!(summary.inappropriate, 0);
    }

    #[tokio::test]
    async fn block_conversation_changes_status() {
        let mut screen = loaded_screen().await;
        let mut ctx = monitor_ctx();
        screen.block_conversation(&mut ctx, 1).unwrap();
        let convo = screen.visible().into_iter().find(|c| c.id == 1).unwrap();
        assert_eq!(convo.status, ConversationStatus::Blocked);
    }

    #[tokio::test]
    async fn delete_message_shrinks_thread() {
        let mut screen = loaded_screen().await;
        let mut ctx = monitor_ctx();
        screen.open_conversation(&Loader::default(), 1).await.unwrap();
        screen.delete_message(&mut ctx, 4).unwrap();
        assert_eq!(screen.thread().len(), 4);
        assert!(screen.delete_message(&mut ctx, 4).is_err());
    }

    #[tokio::test]
    async fn interventions_need_permission() {
        let mut screen = loaded_screen().await;
        let mut ctx = ScreenContext::default();
        match screen.block_conversation(&mut ctx, 1) {
            Err(AdminError::PermissionDenied(_)) => {}
            other => panic!("expected permission denial, got {other:?}"),
        }
    }

    #[test]
    fn triage_flags_unscored_scam_messages() {
        let mut thread = InMemoryService::default().fetch_thread(1).unwrap();
        thread[0].content = "Send the fee to my paypal and I'll book us a trip".into();
        triage_thread(&mut thread);
        assert!(thread[0].flagged);
        assert_eq!(thread[0].severity, MessageSeverity::Danger);
        // Verdicts attached upstream are left alone.
        assert_eq!(thread[1].flag_reason.as_deref(), Some("Request for personal contact information"));
        // Clean small talk stays unflagged.
        assert!(!thread[2].flagged);
    }

    #[tokio::test]
    async fn opening_a_thread_runs_the_classifier() {
        let mut screen = loaded_screen().await;
        screen.open_conversation(&Loader::default(), 1).await.unwrap();
        // The sample thread's unscored messages are clean, so only the
        // backend verdicts remain flagged.
        assert_eq!(screen.flagged_in_thread().len(), 2);
        assert!(screen
            .thread()
            .iter()
            .filter(|m| !m.flagged)
            .all(|m| m.severity == MessageSeverity::Normal));
    }

    #[test]
    fn classifier_spots_financial_content() {
        let (severity, reason) = classify_content("I can send you money via mpesa");
        assert_eq!(severity, MessageSeverity::Danger);
        assert!(reason.unwrap().contains("Financial"));
    }

    #[test]
    fn classifier_spots_contact_requests() {
        let (severity, _) = classify_content("what's your phone number?");
        assert_eq!(severity, MessageSeverity::Warning);
        let (severity, reason) = classify_content("nice weather today");
        assert_eq!(severity, MessageSeverity::Normal);
        assert!(reason.is_none());
    }
}
