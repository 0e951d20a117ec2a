//! User management screen: account directory with filters, a detail
//! view, and single or bulk moderation actions.

use crate::load::Loader;
use crate::services::{
    AdminError, AdminService, ScreenContext, ServiceResult, UserRecord, UserStatus,
};
use crate::table::{text_matches, Criteria, Record, RecordTable};
use serde_json::json;
use std::collections::HashSet;

impl Record for UserRecord {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UserAction {
    Verify,
    Suspend,
    Ban,
    Delete,
    ResetPassword,
}

impl UserAction {
    pub fn tag(&self) -> &'static str {
        match self {
            UserAction::Verify => "verify",
            UserAction::Suspend => "suspend",
            UserAction::Ban => "ban",
            UserAction::Delete => "delete",
            UserAction::ResetPassword => "reset",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "verify" => Some(UserAction::Verify),
            "suspend" => Some(UserAction::Suspend),
            "ban" => Some(UserAction::Ban),
            "delete" => Some(UserAction::Delete),
            "reset" => Some(UserAction::ResetPassword),
            _ => None,
        }
    }

    /// Actions exposed through the bulk selector. Password resets need a
    /// per-account confirmation and stay single-target.
    pub fn bulk_capable(&self) -> bool {
        !matches!(self, UserAction::ResetPassword)
    }
}

#[derive(Clone, Debug)]
pub struct UserFilters {
    pub status: String,
    pub verified: String,
    pub gender: String,
    pub age_min: i64,
    pub age_max: i64,
    pub search: String,
}

impl Default for UserFilters {
    fn default() -> Self {
        Self {
            status: "all".into(),
            verified: "all".into(),
            gender: "all".into(),
            age_min: 18,
            age_max: 80,
            search: String::new(),
        }
    }
}

impl UserFilters {
    pub fn from_request(ctx: &ScreenContext) -> Self {
        let defaults = Self::default();
        Self {
            status: ctx.request.string("status").unwrap_or(defaults.status),
            verified: ctx.request.string("verified").unwrap_or(defaults.verified),
            gender: ctx.request.string("gender").unwrap_or(defaults.gender),
            age_min: ctx.request.int("age_min").unwrap_or(defaults.age_min),
            age_max: ctx.request.int("age_max").unwrap_or(defaults.age_max),
            search: ctx.request.string("search").unwrap_or_default(),
        }
    }
}

impl Criteria<UserRecord> for UserFilters {
    fn matches(&self, user: &UserRecord) -> bool {
        if self.status != "all" && user.status.as_str() != self.status {
            return false;
        }
        if self.verified != "all" {
            let wants_verified = self.verified == "verified";
            if user.verified != wants_verified {
                return false;
            }
        }
        if self.gender != "all" && user.gender != self.gender {
            return false;
        }
        if user.age < self.age_min || user.age > self.age_max {
            return false;
        }
        if !self.search.is_empty() {
            let mut fields: Vec<&str> = vec![&user.name, &user.email, &user.location];
            fields.extend(user.interests.iter().map(String::as_str));
            if !text_matches(&self.search, &fields) {
                return false;
            }
        }
        true
    }
}

pub struct UsersScreen<S: AdminService> {
    service: S,
    table: RecordTable<UserRecord>,
    filters: UserFilters,
    bulk_action: Option<UserAction>,
}

impl<S: AdminService> UsersScreen<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            table: RecordTable::new(),
            filters: UserFilters::default(),
            bulk_action: None,
        }
    }

    pub async fn load(&mut self, loader: &Loader) -> ServiceResult<usize> {
        let latency = self.service.load_latency();
        let users = loader.fetch(latency, || self.service.fetch_users()).await?;
        self.table.load(users);
        self.bulk_action = None;
        Ok(self.table.len())
    }

    pub fn set_filters(&mut self, filters: UserFilters) {
        self.filters = filters;
    }

    pub fn filters(&self) -> &UserFilters {
        &self.filters
    }

    pub fn visible(&self) -> Vec<&UserRecord> {
        self.table.visible(&self.filters)
    }

    pub fn total(&self) -> usize {
        self.table.len()
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

    pub fn open_profile(&mut self, id: i64) -> ServiceResult<&UserRecord> {
        if !self.table.open_detail(id) {
            return Err(AdminError::NotFound(format!("user {id}")));
        }
        self.table
            .detail()
            .ok_or_else(|| AdminError::Internal("detail lost after open".into()))
    }

    pub fn close_profile(&mut self) {
        self.table.close_detail();
    }

    pub fn profile(&self) -> Option<&UserRecord> {
        self.table.detail()
    }

    pub fn set_bulk_action(&mut self, tag: &str) -> ServiceResult<()> {
        let action = UserAction::parse(tag)
            .ok_or_else(|| AdminError::Validation(format!("unknown action '{tag}'")))?;
        if !action.bulk_capable() {
            return Err(AdminError::Validation(format!(
                "action '{tag}' is not available in bulk"
            )));
        }
        self.bulk_action = Some(action);
        Ok(())
    }

    pub fn bulk_action(&self) -> Option<UserAction> {
        self.bulk_action
    }

    /// Applies the pending bulk action to every selected account, then
    /// clears the selection and resets the action selector. The sink is
    /// consulted first; a sink rejection leaves the screen untouched.
    pub fn apply_bulk(&mut self, ctx: &mut ScreenContext) -> ServiceResult<usize> {
        self.ensure_permission(ctx)?;
        let action = self
            .bulk_action
            .ok_or_else(|| AdminError::Validation("no bulk action chosen".into()))?;
        let ids = self.table.selected_ids();
        if ids.is_empty() {
            return Err(AdminError::Validation("no accounts selected".into()));
        }
        self.service
            .submit_action(action.tag(), &ids)
            .map_err(|err| AdminError::ActionFailure(err.to_string()))?;

        let targets: HashSet<i64> = ids.iter().copied().collect();
        let affected = match action {
            UserAction::Verify => {
                self.table.update(&targets, |user| user.verified = true);
                targets.len()
            }
            UserAction::Suspend => {
                self.table
                    .update(&targets, |user| user.status = UserStatus::Suspended);
                targets.len()
            }
            UserAction::Ban => {
                self.table
                    .update(&targets, |user| user.status = UserStatus::Banned);
                targets.len()
            }
            UserAction::Delete => self.table.remove(&targets),
            UserAction::ResetPassword => 0,
        };

        self.service.log_action(
            &format!("users_bulk_{}", action.tag()),
            Some(ctx.operator.id),
            &json!({ "ids": ids }),
        )?;
        ctx.context.set(
            "users_bulk_result",
            json!({ "action": action.tag(), "affected": affected }),
        );

        self.table.clear_selection();
        self.bulk_action = None;
        Ok(affected)
    }

    /// Single-account action from the detail view or the table row.
    pub fn apply_one(
        &mut self,
        ctx: &mut ScreenContext,
        id: i64,
        action: UserAction,
    ) -> ServiceResult<()> {
        self.ensure_permission(ctx)?;
        let user = self
            .table
            .get(id)
            .ok_or_else(|| AdminError::NotFound(format!("user {id}")))?;
        let email = user.email.clone();
        self.service
            .submit_action(action.tag(), &[id])
            .map_err(|err| AdminError::ActionFailure(err.to_string()))?;

        match action {
            UserAction::Verify => {
                self.table.update_one(id, |user| user.verified = true);
            }
            UserAction::Suspend => {
                self.table
                    .update_one(id, |user| user.status = UserStatus::Suspended);
            }
            UserAction::Ban => {
                self.table
                    .update_one(id, |user| user.status = UserStatus::Banned);
            }
            UserAction::Delete => {
                self.table.remove_one(id);
            }
            UserAction::ResetPassword => {
                // No status change; the real backend sends the email.
                ctx.context.set("password_reset_sent", email.clone());
            }
        }

        self.service.log_action(
            &format!("users_{}", action.tag()),
            Some(ctx.operator.id),
            &json!({ "id": id, "email": email }),
        )
    }

    /// Publishes the filtered directory into the screen context.
    pub fn present(&self, ctx: &mut ScreenContext) {
        let listing: Vec<_> = self
            .visible()
            .into_iter()
            .map(|user| {
                json!({
                    "id": user.id,
                    "name": user.name,
                    "email": user.email,
                    "age": user.age,
                    "location": user.location,
                    "status": user.status,
                    "verified": user.verified,
                    "reports": user.reports,
                    "selected": self.table.is_selected(user.id),
                })
            })
            .collect();
        ctx.context.set("users_found", listing.len());
        ctx.context.set("user_list", listing);
    }

    fn ensure_permission(&self, ctx: &ScreenContext) -> ServiceResult<()> {
        if self.service.allowed_to(ctx, "manage_users") {
            Ok(())
        } else {
            Err(AdminError::PermissionDenied("manage_users".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryService;

    fn manager_ctx() -> ScreenContext {
        let mut ctx = ScreenContext::default();
        ctx.operator.id = 9;
        ctx.operator.permissions.insert("manage_users".into());
        ctx
    }

    async fn loaded_screen() -> UsersScreen<InMemoryService> {
        let mut screen = UsersScreen::new(InMemoryService::default());
        screen.load(&Loader::default()).await.unwrap();
        screen
    }

    #[tokio::test]
    async fn default_filters_show_everyone() {
        let screen = loaded_screen().await;
        assert_eq!(screen.visible().len(), screen.total());
    }

    #[tokio::test]
    async fn status_filter_narrows_view() {
        let mut screen = loaded_screen().await;
        screen.set_filters(UserFilters {
            status: "active".into(),
            ..UserFilters::default()
        });
        assert!(screen
            .visible()
            .iter()
            .all(|user| user.status == UserStatus::Active));
        assert_eq!(screen.visible().len(), 3);
    }

    #[tokio::test]
    async fn search_matches_name_substring() {
        let mut screen = loaded_screen().await;
        screen.set_filters(UserFilters {
            search: "john".into(),
            ..UserFilters::default()
        });
        let names: Vec<&str> = screen
            .visible()
            .iter()
            .map(|user| user.name.as_str())
            .collect();
        assert_eq!(names, vec!["Sarah Johnson"]);
    }

    #[tokio::test]
    async fn search_matches_interest_list() {
        let mut screen = loaded_screen().await;
        screen.set_filters(UserFilters {
            search: "photo".into(),
            ..UserFilters::default()
        });
        // Sarah and David both list Photography.
        assert_eq!(screen.visible().len(), 2);
    }

    #[tokio::test]
    async fn age_range_is_inclusive() {
        let mut screen = loaded_screen().await;
        screen.set_filters(UserFilters {
            age_min: 25,
            age_max: 29,
            ..UserFilters::default()
        });
        let ages: Vec<i64> = screen.visible().iter().map(|user| user.age).collect();
        assert_eq!(ages, vec![28, 25, 29]);
    }

    #[tokio::test]
    async fn bulk_ban_updates_all_selected() {
        let mut screen = loaded_screen().await;
        let mut ctx = manager_ctx();
        screen.toggle_selection(1);
        screen.toggle_selection(2);
        screen.set_bulk_action("ban").unwrap();
        let affected = screen.apply_bulk(&mut ctx).unwrap();
        assert_eq!(affected, 2);
        assert_eq!(screen.visible()[0].status, UserStatus::Banned);
        assert!(screen.selected_ids().is_empty());
        assert!(screen.bulk_action().is_none());
    }

    #[tokio::test]
    async fn bulk_is_idempotent() {
        let mut screen = loaded_screen().await;
        let mut ctx = manager_ctx();
        screen.toggle_selection(1);
        screen.set_bulk_action("suspend").unwrap();
        screen.apply_bulk(&mut ctx).unwrap();
        screen.toggle_selection(1);
        screen.set_bulk_action("suspend").unwrap();
        screen.apply_bulk(&mut ctx).unwrap();
        let user = screen.visible().into_iter().find(|u| u.id == 1).unwrap();
        assert_eq!(user.status, UserStatus::Suspended);
    }

    #[tokio::test]
    async fn delete_purges_selection_and_profile() {
        let mut screen = loaded_screen().await;
        let mut ctx = manager_ctx();
        screen.open_profile(3).unwrap();
        screen.toggle_selection(3);
        screen.set_bulk_action("delete").unwrap();
        let affected = screen.apply_bulk(&mut ctx).unwrap();
        assert_eq!(affected, 1);
        assert_eq!(screen.total(), 5);
        assert!(screen.profile().is_none());
        assert!(screen.selected_ids().is_empty());
    }

    #[tokio::test]
    async fn select_all_twice_returns_to_empty() {
        let mut screen = loaded_screen().await;
        screen.select_all();
        assert_eq!(screen.selected_ids().len(), 6);
        screen.select_all();
        assert!(screen.selected_ids().is_empty());
    }

    #[tokio::test]
    async fn bulk_without_permission_denied() {
        let mut screen = loaded_screen().await;
        let mut ctx = ScreenContext::default();
        screen.toggle_selection(1);
        screen.set_bulk_action("ban").unwrap();
        match screen.apply_bulk(&mut ctx) {
            Err(AdminError::PermissionDenied(_)) => {}
            other => panic!("expected permission denial, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reset_password_is_not_bulk_capable() {
        let mut screen = loaded_screen().await;
        assert!(screen.set_bulk_action("reset").is_err());
    }

    #[tokio::test]
    async fn reset_password_leaves_status_alone() {
        let mut screen = loaded_screen().await;
        let mut ctx = manager_ctx();
        screen
            .apply_one(&mut ctx, 1, UserAction::ResetPassword)
            .unwrap();
        let user = screen.visible().into_iter().find(|u| u.id == 1).unwrap();
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(
            ctx.context.string("password_reset_sent").unwrap(),
            "sarah.j@example.com"
        );
    }

    #[tokio::test]
    async fn actions_reach_the_audit_log() {
        let service = InMemoryService::default();
        let mut screen = UsersScreen::new(service.clone());
        screen.load(&Loader::default()).await.unwrap();
        let mut ctx = manager_ctx();
        screen.toggle_selection(4);
        screen.set_bulk_action("ban").unwrap();
        screen.apply_bulk(&mut ctx).unwrap();
        let entries = service.audit_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "users_bulk_ban");
    }

    #[tokio::test]
    async fn present_publishes_listing() {
        let mut screen = loaded_screen().await;
        let mut ctx = manager_ctx();
        screen.present(&mut ctx);
        assert_eq!(ctx.context.int("users_found"), Some(6));
        assert!(ctx.context.get("user_list").is_some());
    }
}
