//! Media moderation screen: the review queue for uploaded photos and
//! videos, with approve/reject/delete flows and automated score refresh.

use crate::load::Loader;
use crate::services::{
    AdminError, AdminService, MediaRecord, MediaStatus, ScreenContext, ServiceResult,
};
use crate::table::{Criteria, Record, RecordTable};
use serde_json::json;
use std::collections::HashSet;

const BULK_REJECTION_REASON: &str = "Bulk rejection";

impl Record for MediaRecord {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MediaAction {
    Approve,
    Reject,
    Delete,
}

impl MediaAction {
    pub fn tag(&self) -> &'static str {
        match self {
            MediaAction::Approve => "approve",
            MediaAction::Reject => "reject",
            MediaAction::Delete => "delete",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "approve" => Some(MediaAction::Approve),
            "reject" => Some(MediaAction::Reject),
            "delete" => Some(MediaAction::Delete),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MediaFilters {
    pub status: String,
    pub kind: String,
    pub verification: String,
    /// "all", "reported" (at least one report) or "none".
    pub reports: String,
    /// "all", "profile" or "gallery".
    pub placement: String,
}

impl Default for MediaFilters {
    fn default() -> Self {
        Self {
            status: "all".into(),
            kind: "all".into(),
            verification: "all".into(),
            reports: "all".into(),
            placement: "all".into(),
        }
    }
}

impl MediaFilters {
    pub fn from_request(ctx: &ScreenContext) -> Self {
        let defaults = Self::default();
        Self {
            status: ctx.request.string("status").unwrap_or(defaults.status),
            kind: ctx.request.string("kind").unwrap_or(defaults.kind),
            verification: ctx
                .request
                .string("verification")
                .unwrap_or(defaults.verification),
            reports: ctx.request.string("reports").unwrap_or(defaults.reports),
            placement: ctx
                .request
                .string("placement")
                .unwrap_or(defaults.placement),
        }
    }
}

impl Criteria<MediaRecord> for MediaFilters {
    fn matches(&self, item: &MediaRecord) -> bool {
        if self.status != "all" && item.status.as_str() != self.status {
            return false;
        }
        if self.kind != "all" && item.kind.as_str() != self.kind {
            return false;
        }
        if self.verification != "all" && item.user_verification.as_str() != self.verification {
            return false;
        }
        match self.reports.as_str() {
            "reported" if item.reports == 0 => return false,
            "none" if item.reports > 0 => return false,
            _ => {}
        }
        match self.placement.as_str() {
            "profile" if !item.profile_picture => return false,
            "gallery" if item.profile_picture => return false,
            _ => {}
        }
        true
    }
}

pub struct MediaScreen<S: AdminService> {
    service: S,
    table: RecordTable<MediaRecord>,
    filters: MediaFilters,
    bulk_action: Option<MediaAction>,
}

impl<S: AdminService> MediaScreen<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            table: RecordTable::new(),
            filters: MediaFilters::default(),
            bulk_action: None,
        }
    }

    pub async fn load(&mut self, loader: &Loader) -> ServiceResult<usize> {
        let latency = self.service.load_latency();
        let items = loader.fetch(latency, || self.service.fetch_media()).await?;
        self.table.load(items);
        self.bulk_action = None;
        Ok(self.table.len())
    }

    pub fn set_filters(&mut self, filters: MediaFilters) {
        self.filters = filters;
    }

    pub fn visible(&self) -> Vec<&MediaRecord> {
        self.table.visible(&self.filters)
    }

    pub fn total(&self) -> usize {
        self.table.len()
    }

    pub fn pending_count(&self) -> usize {
        self.table
            .records()
            .iter()
            .filter(|item| item.status == MediaStatus::Pending)
            .count()
    }

    pub fn toggle_selection(&mut self, id: i64) {
        self.table.toggle_selection(id);
    }

    pub fn select_all(&mut self) {
        self.table.select_all_visible(&self.filters);
    }

    pub fn selected_ids(&self) -> Vec<i64> {
        self.table.selected_ids()
    }

    pub fn open_viewer(&mut self, id: i64) -> ServiceResult<&MediaRecord> {
        if !self.table.open_detail(id) {
            return Err(AdminError::NotFound(format!("media {id}")));
        }
        self.table
            .detail()
            .ok_or_else(|| AdminError::Internal("detail lost after open".into()))
    }

    pub fn close_viewer(&mut self) {
        self.table.close_detail();
    }

    pub fn viewer(&self) -> Option<&MediaRecord> {
        self.table.detail()
    }

    pub fn set_bulk_action(&mut self, tag: &str) -> ServiceResult<()> {
        let action = MediaAction::parse(tag)
            .ok_or_else(|| AdminError::Validation(format!("unknown action '{tag}'")))?;
        self.bulk_action = Some(action);
        Ok(())
    }

    pub fn bulk_action(&self) -> Option<MediaAction> {
        self.bulk_action
    }

    /// Bulk rejections carry a generic reason; a tailored one requires
    /// the single-item flow.
    pub fn apply_bulk(&mut self, ctx: &mut ScreenContext) -> ServiceResult<usize> {
        self.ensure_permission(ctx)?;
        let action = self
            .bulk_action
            .ok_or_else(|| AdminError::Validation("no bulk action chosen".into()))?;
        let ids = self.table.selected_ids();
        if ids.is_empty() {
            return Err(AdminError::Validation("no media selected".into()));
        }
        self.service
            .submit_action(action.tag(), &ids)
            .map_err(|err| AdminError::ActionFailure(err.to_string()))?;

        let targets: HashSet<i64> = ids.iter().copied().collect();
        let affected = match action {
            MediaAction::Approve => {
                self.table.update(&targets, |item| {
                    item.status = MediaStatus::Approved;
                    item.rejection_reason = None;
                });
                targets.len()
            }
            MediaAction::Reject => {
                self.table.update(&targets, |item| {
                    item.status = MediaStatus::Rejected;
                    item.rejection_reason = Some(BULK_REJECTION_REASON.into());
                });
                targets.len()
            }
            MediaAction::Delete => self.table.remove(&targets),
        };

        self.service.log_action(
            &format!("media_bulk_{}", action.tag()),
            Some(ctx.operator.id),
            &json!({ "ids": ids }),
        )?;

        self.table.clear_selection();
        self.bulk_action = None;
        Ok(affected)
    }

    pub fn approve(&mut self, ctx: &mut ScreenContext, id: i64) -> ServiceResult<()> {
        self.apply_one(ctx, id, MediaAction::Approve, None)
    }

    pub fn reject(&mut self, ctx: &mut ScreenContext, id: i64, reason: &str) -> ServiceResult<()> {
        if reason.trim().is_empty() {
            return Err(AdminError::Validation("rejection reason required".into()));
        }
        self.apply_one(ctx, id, MediaAction::Reject, Some(reason))
    }

    pub fn delete(&mut self, ctx: &mut ScreenContext, id: i64) -> ServiceResult<()> {
        self.apply_one(ctx, id, MediaAction::Delete, None)
    }

    fn apply_one(
        &mut self,
        ctx: &mut ScreenContext,
        id: i64,
        action: MediaAction,
        reason: Option<&str>,
    ) -> ServiceResult<()> {
        self.ensure_permission(ctx)?;
        if self.table.get(id).is_none() {
            return Err(AdminError::NotFound(format!("media {id}")));
        }
        self.service
            .submit_action(action.tag(), &[id])
            .map_err(|err| AdminError::ActionFailure(err.to_string()))?;

        match action {
            MediaAction::Approve => {
                self.table.update_one(id, |item| {
                    item.status = MediaStatus::Approved;
                    item.rejection_reason = None;
                });
            }
            MediaAction::Reject => {
                let reason = reason.unwrap_or(BULK_REJECTION_REASON).to_string();
                self.table.update_one(id, |item| {
                    item.status = MediaStatus::Rejected;
                    item.rejection_reason = Some(reason.clone());
                });
            }
            MediaAction::Delete => {
                self.table.remove_one(id);
            }
        }

        self.service.log_action(
            &format!("media_{}", action.tag()),
            Some(ctx.operator.id),
            &json!({ "id": id, "reason": reason }),
        )
    }

    /// Refreshes the automated moderation scores for every loaded item
    /// and re-flags anything scoring below the review threshold.
    pub fn rescan(&mut self, ctx: &mut ScreenContext) -> ServiceResult<usize> {
        self.ensure_permission(ctx)?;
        let ids: Vec<i64> = self.table.records().iter().map(|item| item.id).collect();
        let scores = self.service.moderation_scores(&ids)?;
        let mut flagged = 0;
        let all: HashSet<i64> = ids.iter().copied().collect();
        self.table.update(&all, |item| {
            if let Some(score) = scores.get(&item.id) {
                item.ai_score = Some(*score);
                if *score < 0.5 && item.status == MediaStatus::Pending {
                    item.status = MediaStatus::Flagged;
                    flagged += 1;
                }
            }
        });
        self.service.log_action(
            "media_rescan",
            Some(ctx.operator.id),
            &json!({ "scanned": ids.len(), "flagged": flagged }),
        )?;
        Ok(flagged)
    }

    pub fn present(&self, ctx: &mut ScreenContext) {
        let listing: Vec<_> = self
            .visible()
            .into_iter()
            .map(|item| {
                json!({
                    "id": item.id,
                    "user": item.user_name,
                    "kind": item.kind,
                    "url": item.url,
                    "status": item.status,
                    "ai_score": item.ai_score,
                    "reports": item.reports,
                    "selected": self.table.is_selected(item.id),
                })
            })
            .collect();
        ctx.context.set("media_found", listing.len());
        ctx.context.set("media_pending", self.pending_count());
        ctx.context.set("media_list", listing);
    }

    fn ensure_permission(&self, ctx: &ScreenContext) -> ServiceResult<()> {
        if self.service.allowed_to(ctx, "moderate_media") {
            Ok(())
        } else {
            Err(AdminError::PermissionDenied("moderate_media".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryService;

    fn moderator_ctx() -> ScreenContext {
        let mut ctx = ScreenContext::default();
        ctx.operator.id = 9;
        ctx.operator.permissions.insert("moderate_media".into());
        ctx
    }

    async fn loaded_screen() -> MediaScreen<InMemoryService> {
        let mut screen = MediaScreen::new(InMemoryService::default());
        screen.load(&Loader::default()).await.unwrap();
        screen
    }

    #[tokio::test]
    async fn default_filters_show_queue() {
        let screen = loaded_screen().await;
        assert_eq!(screen.visible().len(), 6);
        assert_eq!(screen.pending_count(), 2);
    }

    #[tokio::test]
    async fn kind_and_status_filters_compose() {
        let mut screen = loaded_screen().await;
        screen.set_filters(MediaFilters {
            kind: "video".into(),
            status: "pending".into(),
            ..MediaFilters::default()
        });
        let ids: Vec<i64> = screen.visible().iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![6]);
    }

    #[tokio::test]
    async fn reported_filter_keeps_reported_items() {
        let mut screen = loaded_screen().await;
        screen.set_filters(MediaFilters {
            reports: "reported".into(),
            ..MediaFilters::default()
        });
        assert!(screen.visible().iter().all(|item| item.reports > 0));
        assert_eq!(screen.visible().len(), 3);
    }

    #[tokio::test]
    async fn placement_filter_splits_profile_and_gallery() {
        let mut screen = loaded_screen().await;
        screen.set_filters(MediaFilters {
            placement: "profile".into(),
            ..MediaFilters::default()
        });
        assert_eq!(screen.visible().len(), 3);
        screen.set_filters(MediaFilters {
            placement: "gallery".into(),
            ..MediaFilters::default()
        });
        assert_eq!(screen.visible().len(), 3);
    }

    #[tokio::test]
    async fn bulk_approve_clears_rejection_reason() {
        let mut screen = loaded_screen().await;
        let mut ctx = moderator_ctx();
        screen.toggle_selection(2);
        screen.toggle_selection(4);
        screen.set_bulk_action("approve").unwrap();
        let affected = screen.apply_bulk(&mut ctx).unwrap();
        assert_eq!(affected, 2);
        for id in [2, 4] {
            let item = screen.visible().into_iter().find(|m| m.id == id).unwrap();
            assert_eq!(item.status, MediaStatus::Approved);
            assert!(item.rejection_reason.is_none());
        }
        assert!(screen.selected_ids().is_empty());
    }

    #[tokio::test]
    async fn bulk_reject_uses_generic_reason() {
        let mut screen = loaded_screen().await;
        let mut ctx = moderator_ctx();
        screen.toggle_selection(2);
        screen.set_bulk_action("reject").unwrap();
        screen.apply_bulk(&mut ctx).unwrap();
        let item = screen.visible().into_iter().find(|m| m.id == 2).unwrap();
        assert_eq!(item.status, MediaStatus::Rejected);
        assert_eq!(item.rejection_reason.as_deref(), Some("Bulk rejection"));
    }

    #[tokio::test]
    async fn single_reject_requires_reason() {
        let mut screen = loaded_screen().await;
        let mut ctx = moderator_ctx();
        assert!(screen.reject(&mut ctx, 2, "  ").is_err());
        screen.reject(&mut ctx, 2, "Blurry photo").unwrap();
        let item = screen.visible().into_iter().find(|m| m.id == 2).unwrap();
        assert_eq!(item.rejection_reason.as_deref(), Some("Blurry photo"));
    }

    #[tokio::test]
    async fn delete_purges_selection_and_viewer() {
        let mut screen = loaded_screen().await;
        let mut ctx = moderator_ctx();
        screen.open_viewer(3).unwrap();
        screen.toggle_selection(3);
        screen.set_bulk_action("delete").unwrap();
        screen.apply_bulk(&mut ctx).unwrap();
        assert_eq!(screen.total(), 5);
        assert!(screen.viewer().is_none());
        assert!(screen.selected_ids().is_empty());
    }

    #[tokio::test]
    async fn rescan_refreshes_scores() {
        let mut screen = loaded_screen().await;
        let mut ctx = moderator_ctx();
        screen.rescan(&mut ctx).unwrap();
        assert!(screen
            .visible()
            .iter()
            .all(|item| item.ai_score.is_some()));
    }

    #[tokio::test]
    async fn moderation_needs_permission() {
        let mut screen = loaded_screen().await;
        let mut ctx = ScreenContext::default();
        match screen.approve(&mut ctx, 2) {
            Err(AdminError::PermissionDenied(_)) => {}
            other => panic!("expected permission denial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn present_publishes_counts() {
        let mut screen = loaded_screen().await;
        let mut ctx = moderator_ctx();
        screen.present(&mut ctx);
        assert_eq!(ctx.context.int("media_found"), Some(6));
        assert_eq!(ctx.context.int("media_pending"), Some(2));
    }
}
