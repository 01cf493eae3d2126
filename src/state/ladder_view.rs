//! LadderView - One Ladder's Header, Rows and Actions
//!
//! Owns the row cache for the ladder it shows. Every mutating action
//! invalidates the cache and re-reads the ladder metadata, and a
//! `players-updated` push on the ladder's channel invalidates it too.

use crossbeam_channel::Receiver;
use std::sync::Arc;
use tracing::{debug, info};

use super::row_cache::RowCache;
use super::viewport::Viewport;
use super::virtual_list::VirtualList;
use crate::constants::PLAYERS_UPDATED_EVENT;
use crate::domain::{Ladder, LadderId};
use crate::error::{Error, Result};
use crate::services::{LadderApi, LadderPlayers, PushEvent, PushHub};

pub type LadderCache<A> = RowCache<LadderPlayers<A>>;

pub struct LadderView<A: LadderApi> {
    api: Arc<A>,
    ladder_id: LadderId,
    page_size: usize,
    ladder: Option<Ladder>,
    highlight_rank: Option<u64>,
    scroll_to_index: Option<usize>,
    cache: LadderCache<A>,
    hub: Option<Arc<PushHub>>,
    push: Option<Receiver<PushEvent>>,
}

impl<A: LadderApi> LadderView<A> {
    pub fn new(api: Arc<A>, ladder_id: LadderId, page_size: usize) -> Self {
        let cache = RowCache::new(LadderPlayers::new(Arc::clone(&api), ladder_id), page_size);
        Self {
            api,
            ladder_id,
            page_size,
            ladder: None,
            highlight_rank: None,
            scroll_to_index: None,
            cache,
            hub: None,
            push: None,
        }
    }

    pub fn ladder_id(&self) -> LadderId {
        self.ladder_id
    }

    /// Metadata from the last successful `resolve`
    pub fn ladder(&self) -> Option<&Ladder> {
        self.ladder.as_ref()
    }

    /// Number of rows to show; zero until resolved
    pub fn ladder_size(&self) -> usize {
        self.ladder.as_ref().map_or(0, |l| l.size)
    }

    pub fn highlight_rank(&self) -> Option<u64> {
        self.highlight_rank
    }

    pub fn scroll_to_index(&self) -> Option<usize> {
        self.scroll_to_index
    }

    pub fn cache(&self) -> &LadderCache<A> {
        &self.cache
    }

    /// Fetch the ladder metadata and point the list at the viewer's row
    pub async fn resolve(&mut self) -> Result<&Ladder> {
        let ladder = self.api.ladder(self.ladder_id).await?;
        debug!(
            "Resolved ladder {} ({} players, own rank {})",
            ladder.id, ladder.size, ladder.player_rank
        );

        if let Some(rank) = ladder.own_rank() {
            self.highlight_rank = Some(rank);
        }
        let target = ladder.player_rank.saturating_sub(1);
        self.scroll_to_index = Some(usize::try_from(target).unwrap_or(0));
        Ok(self.ladder.insert(ladder))
    }

    /// Switch to another ladder with a fresh cache
    pub async fn set_ladder_id(&mut self, ladder_id: LadderId) -> Result<&Ladder> {
        self.cache.invalidate();
        self.ladder_id = ladder_id;
        self.ladder = None;
        self.highlight_rank = None;
        self.scroll_to_index = None;
        self.cache = RowCache::new(
            LadderPlayers::new(Arc::clone(&self.api), ladder_id),
            self.page_size,
        );

        if let Some(hub) = self.hub.clone() {
            self.attach_push(&hub);
        }
        self.resolve().await
    }

    pub async fn join(&mut self) -> Result<&Ladder> {
        info!("Joining ladder {}", self.ladder_id);
        self.api.join(self.ladder_id).await?;
        self.refresh().await
    }

    pub async fn leave(&mut self) -> Result<&Ladder> {
        info!("Leaving ladder {}", self.ladder_id);
        self.api.leave(self.ladder_id).await?;
        self.highlight_rank = None;
        self.refresh().await
    }

    pub async fn challenge(&mut self, player_id: u64) -> Result<&Ladder> {
        info!("Challenging player {} on ladder {}", player_id, self.ladder_id);
        self.api.challenge(self.ladder_id, player_id).await?;
        self.refresh().await
    }

    /// Moderator move of a player to a new rank
    pub async fn adjust_position(&mut self, player_id: u64, rank: u64) -> Result<&Ladder> {
        if rank == 0 {
            return Err(Error::Invalid {
                message: "ladder ranks start at 1".to_string(),
            });
        }
        info!(
            "Moving player {} to rank {} on ladder {}",
            player_id, rank, self.ladder_id
        );
        self.api.moderate(self.ladder_id, player_id, rank).await?;
        self.refresh().await
    }

    /// Drop every cached row; returns the new generation
    pub fn invalidate(&mut self) -> u64 {
        self.cache.invalidate()
    }

    /// Scroll to and highlight a player picked from search
    pub fn focus_player(&mut self, ladder_rank: u64) {
        self.highlight_rank = Some(ladder_rank).filter(|r| *r > 0);
        self.scroll_to_index = Some(ladder_rank.saturating_sub(1) as usize);
    }

    /// Listen for `players-updated` on this ladder's channel
    pub fn attach_push(&mut self, hub: &Arc<PushHub>) {
        let channel = self.ladder_id.channel();
        self.push = Some(hub.subscribe(&channel, PLAYERS_UPDATED_EVENT));
        self.hub = Some(Arc::clone(hub));
    }

    /// Consume queued push notifications; invalidates once if any arrived
    pub fn drain_push(&mut self) -> bool {
        let Some(push) = &self.push else {
            return false;
        };
        let received = push.try_iter().count();
        if received == 0 {
            return false;
        }

        debug!("{} update(s) on {}", received, self.ladder_id.channel());
        self.invalidate();
        true
    }

    /// Whether the header should offer "Join"
    pub fn can_join(&self) -> bool {
        self.ladder
            .as_ref()
            .is_some_and(|l| l.own_rank().is_none() && l.membership_allowed())
    }

    /// Whether the header should offer "Leave"
    pub fn can_leave(&self) -> bool {
        self.ladder
            .as_ref()
            .is_some_and(|l| l.own_rank().is_some() && l.membership_allowed())
    }

    /// A list over this view's cache; nothing is bound until the first layout
    pub fn virtual_list(&self, viewport: Viewport) -> VirtualList<LadderPlayers<A>> {
        VirtualList::new(self.cache.clone(), viewport, self.ladder_size())
            .with_highlight(self.highlight_rank)
    }

    async fn refresh(&mut self) -> Result<&Ladder> {
        self.invalidate();
        self.resolve().await
    }
}

impl<A: LadderApi> std::fmt::Debug for LadderView<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LadderView")
            .field("ladder_id", &self.ladder_id)
            .field("ladder_size", &self.ladder_size())
            .field("highlight_rank", &self.highlight_rank)
            .field("cache", &self.cache)
            .finish()
    }
}
