use std::collections::HashSet;
use std::future::Future;

use tracing::{debug, warn};

use charitable_types::api::FeedPage;
use charitable_types::ids::{Cursor, GuestId, PostId};
use charitable_types::models::PostWithNonprofit;

use crate::client::{Endpoint, HttpApi};
use crate::error::ApiError;

pub const DEFAULT_FEED_LIMIT: u32 = 20;
pub const MAX_FEED_LIMIT: u32 = 100;

/// Anything that can serve feed pages.
pub trait FeedSource: Send + Sync {
    /// Fetch one page. `cursor` is `None` for the first page; `viewer` lets
    /// the server fill in `hasReacted`.
    fn get_feed(
        &self,
        limit: u32,
        cursor: Option<&Cursor>,
        viewer: Option<GuestId>,
    ) -> impl Future<Output = Result<FeedPage, ApiError>> + Send;
}

impl FeedSource for HttpApi {
    async fn get_feed(
        &self,
        limit: u32,
        cursor: Option<&Cursor>,
        viewer: Option<GuestId>,
    ) -> Result<FeedPage, ApiError> {
        if limit == 0 || limit > MAX_FEED_LIMIT {
            return Err(ApiError::Validation(format!(
                "feed limit must be between 1 and {MAX_FEED_LIMIT}, got {limit}"
            )));
        }

        let endpoint = Endpoint::new(["api", "feed"])
            .query("limit", limit)
            .query_opt("cursor", cursor)
            .query_opt("guestId", viewer);
        self.client().get(&endpoint).await
    }
}

/// Walks the feed page by page with the server's cursor.
///
/// Post ids already handed out in this session are dropped from later pages,
/// so a caller never sees the same post twice even if the backend repeats one.
pub struct FeedPager<F> {
    source: F,
    limit: u32,
    viewer: Option<GuestId>,
    cursor: Option<Cursor>,
    seen: HashSet<PostId>,
    exhausted: bool,
}

impl<F: FeedSource> FeedPager<F> {
    pub fn new(source: F, limit: u32) -> Self {
        Self {
            source,
            limit,
            viewer: None,
            cursor: None,
            seen: HashSet::new(),
            exhausted: false,
        }
    }

    pub fn with_viewer(mut self, viewer: GuestId) -> Self {
        self.viewer = Some(viewer);
        self
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Start over from the first page (pull-to-refresh).
    pub fn reset(&mut self) {
        self.cursor = None;
        self.seen.clear();
        self.exhausted = false;
    }

    /// Next batch of unseen posts, or `None` once the feed has ended.
    ///
    /// On error the cursor is left where it was, so calling again retries the
    /// same page.
    pub async fn next_page(&mut self) -> Result<Option<Vec<PostWithNonprofit>>, ApiError> {
        if self.exhausted {
            return Ok(None);
        }

        let page = self
            .source
            .get_feed(self.limit, self.cursor.as_ref(), self.viewer)
            .await?;

        let received = page.posts.len();
        let mut fresh = Vec::with_capacity(received);
        for item in page.posts {
            if self.seen.insert(item.post.id.clone()) {
                fresh.push(item);
            } else {
                warn!(post_id = %item.post.id, "feed repeated a post; dropping it");
            }
        }

        match page.next_cursor {
            Some(next) if self.cursor.as_ref() == Some(&next) => {
                warn!(cursor = %next, "feed cursor did not advance; treating as end of feed");
                self.exhausted = true;
            }
            Some(next) => self.cursor = Some(next),
            None => self.exhausted = true,
        }

        debug!(
            received,
            fresh = fresh.len(),
            exhausted = self.exhausted,
            "feed page loaded"
        );
        Ok(Some(fresh))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use support::ScriptedFeed;

    mod support {
        use super::*;
        use std::sync::Mutex;

        use charitable_types::models::{NonprofitCategory, NonprofitSummary, Post};

        pub fn item(id: &str) -> PostWithNonprofit {
            PostWithNonprofit {
                post: Post {
                    id: id.into(),
                    nonprofit_id: "np1".into(),
                    title: format!("post {id}"),
                    content: String::new(),
                    image_url: None,
                    goal_amount: None,
                    raised_amount: None,
                    donor_count: None,
                    like_count: Some(0),
                    is_published: Some(true),
                    created_at: None,
                },
                nonprofit: NonprofitSummary {
                    id: "np1".into(),
                    name: "Red Cross".into(),
                    slug: "red-cross".into(),
                    logo_url: None,
                    category: NonprofitCategory::HumanServices,
                },
                has_reacted: None,
            }
        }

        /// Returns canned pages in order and records the cursors it was asked for.
        pub struct ScriptedFeed {
            pub pages: Mutex<Vec<Result<FeedPage, ApiError>>>,
            pub cursors: Mutex<Vec<Option<String>>>,
        }

        impl ScriptedFeed {
            pub fn new(pages: Vec<Result<FeedPage, ApiError>>) -> Self {
                Self {
                    pages: Mutex::new(pages.into_iter().rev().collect()),
                    cursors: Mutex::new(Vec::new()),
                }
            }
        }

        impl FeedSource for ScriptedFeed {
            async fn get_feed(
                &self,
                _limit: u32,
                cursor: Option<&Cursor>,
                _viewer: Option<GuestId>,
            ) -> Result<FeedPage, ApiError> {
                self.cursors
                    .lock()
                    .unwrap()
                    .push(cursor.map(|c| c.as_str().to_string()));
                self.pages.lock().unwrap().pop().expect("no more scripted pages")
            }
        }
    }

    fn page(ids: &[&str], next: Option<&str>) -> Result<FeedPage, ApiError> {
        Ok(FeedPage {
            posts: ids.iter().map(|id| support::item(id)).collect(),
            next_cursor: next.map(Cursor::from),
        })
    }

    #[tokio::test]
    async fn follows_cursor_until_absent() {
        let source = ScriptedFeed::new(vec![
            page(&["a", "b"], Some("c1")),
            page(&["c"], Some("c2")),
            page(&["d"], None),
        ]);
        let mut pager = FeedPager::new(source, 2);

        let mut ids = Vec::new();
        while let Some(batch) = pager.next_page().await.unwrap() {
            ids.extend(batch.into_iter().map(|p| p.post.id.to_string()));
        }

        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert!(pager.is_exhausted());
        assert_eq!(
            *pager.source.cursors.lock().unwrap(),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn repeated_posts_are_dropped() {
        let source = ScriptedFeed::new(vec![
            page(&["a", "b"], Some("c1")),
            page(&["b", "c"], None),
        ]);
        let mut pager = FeedPager::new(source, 2);

        assert_eq!(pager.next_page().await.unwrap().unwrap().len(), 2);
        let second = pager.next_page().await.unwrap().unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].post.id.as_str(), "c");
        assert_eq!(pager.seen_count(), 3);
    }

    #[tokio::test]
    async fn failed_page_is_retried_with_same_cursor() {
        let source = ScriptedFeed::new(vec![
            page(&["a"], Some("c1")),
            Err(ApiError::Transport("offline".into())),
            page(&["b"], None),
        ]);
        let mut pager = FeedPager::new(source, 1);

        pager.next_page().await.unwrap();
        assert!(pager.next_page().await.unwrap_err().is_transport());
        assert_eq!(pager.next_page().await.unwrap().unwrap().len(), 1);

        let cursors = pager.source.cursors.lock().unwrap().clone();
        assert_eq!(cursors[1], cursors[2]);
    }

    #[tokio::test]
    async fn stuck_cursor_ends_the_feed() {
        let source = ScriptedFeed::new(vec![
            page(&["a"], Some("c1")),
            page(&["b"], Some("c1")),
        ]);
        let mut pager = FeedPager::new(source, 1);

        pager.next_page().await.unwrap();
        pager.next_page().await.unwrap();
        assert!(pager.is_exhausted());
        assert!(pager.next_page().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reset_starts_from_first_page() {
        let source = ScriptedFeed::new(vec![page(&["a"], None), page(&["a"], None)]);
        let mut pager = FeedPager::new(source, 1);

        pager.next_page().await.unwrap();
        assert!(pager.is_exhausted());

        pager.reset();
        let again = pager.next_page().await.unwrap().unwrap();
        assert_eq!(again.len(), 1);
    }
}
