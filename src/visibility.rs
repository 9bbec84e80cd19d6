//! Page visibility gate.
//!
//! One policy serves every path: the page list query, page retrieval and the
//! object-level re-check performed on each placeholder and plugin fetch.

use chrono::{DateTime, Utc};

use crate::{
    auth::Requester,
    error::{AppError, AppResult, NOT_PERMITTED_PAGE},
    models::Page,
};

/// PageScope
///
/// The slice of the page tree a requester may browse. `PostgresRepository`
/// translates it into a `WHERE` clause, `admits` evaluates the same rules in memory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageScope {
    pub site_id: i64,
    /// Staff see drafts and pages outside their publication window.
    pub staff: bool,
    /// Unlocks `login_required` pages for non-staff requesters.
    pub authenticated: bool,
    pub now: DateTime<Utc>,
}

impl PageScope {
    pub fn admits(&self, page: &Page) -> bool {
        if page.site_id != self.site_id {
            return false;
        }
        if self.staff {
            return true;
        }
        if !page.is_published {
            return false;
        }
        if page.publication_date.is_some_and(|start| start > self.now) {
            return false;
        }
        if page.publication_end_date.is_some_and(|end| end <= self.now) {
            return false;
        }
        !page.login_required || self.authenticated
    }
}

/// is_visible
///
/// Pure predicate: may this requester see `page` and its descendants?
pub fn is_visible(requester: &Requester, page: &Page) -> bool {
    requester.page_scope().admits(page)
}

/// check_owning_page
///
/// Object-level gate for placeholders and plugins. Fails closed: a missing page is
/// denied without a message, an invisible page with the "not permitted" message.
pub fn check_owning_page(requester: &Requester, page: Option<&Page>) -> AppResult<()> {
    let Some(page) = page else {
        tracing::debug!("denied: content is not attached to a page");
        return Err(AppError::Forbidden(None));
    };

    if !is_visible(requester, page) {
        tracing::debug!(page_id = page.id, staff = requester.is_staff(), "denied: page not visible");
        return Err(AppError::Forbidden(Some(NOT_PERMITTED_PAGE.to_string())));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn scope(staff: bool, authenticated: bool) -> PageScope {
        PageScope {
            site_id: 1,
            staff,
            authenticated,
            now: Utc::now(),
        }
    }

    fn published() -> Page {
        Page {
            id: 1,
            is_published: true,
            ..Page::default()
        }
    }

    #[test]
    fn public_sees_published_page_on_current_site() {
        assert!(scope(false, false).admits(&published()));
    }

    #[test]
    fn public_never_sees_drafts() {
        let draft = Page {
            is_published: false,
            ..published()
        };
        assert!(!scope(false, false).admits(&draft));
        assert!(!scope(false, true).admits(&draft));
    }

    #[test]
    fn staff_sees_drafts_on_own_site_only() {
        let draft = Page {
            is_published: false,
            ..published()
        };
        let foreign = Page {
            site_id: 2,
            ..published()
        };
        assert!(scope(true, true).admits(&draft));
        assert!(!scope(true, true).admits(&foreign));
    }

    #[test]
    fn publication_window_is_enforced_for_public() {
        let s = scope(false, false);
        let future = Page {
            publication_date: Some(s.now + Duration::days(1)),
            ..published()
        };
        let expired = Page {
            publication_end_date: Some(s.now - Duration::seconds(1)),
            ..published()
        };
        let running = Page {
            publication_date: Some(s.now - Duration::days(1)),
            publication_end_date: Some(s.now + Duration::days(1)),
            ..published()
        };
        assert!(!s.admits(&future));
        assert!(!s.admits(&expired));
        assert!(s.admits(&running));
    }

    #[test]
    fn login_required_needs_authentication() {
        let members_only = Page {
            login_required: true,
            ..published()
        };
        assert!(!scope(false, false).admits(&members_only));
        assert!(scope(false, true).admits(&members_only));
    }
}
