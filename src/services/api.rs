//! Ladder API
//!
//! Trait seam over the ladder REST surface. The state layer only talks to
//! this trait; `HttpLadderApi` is the production implementation.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;

use crate::domain::{Ladder, LadderId, LadderRow, PlayersPage};
use crate::error::Result;
use crate::state::row_cache::PageSource;

/// Operations the ladder view needs from the server
///
/// Futures are `'static` so they can be spawned onto a runtime and outlive
/// the borrow of the API object.
pub trait LadderApi: Send + Sync + 'static {
    /// `GET ladders/<id>`
    fn ladder(&self, id: LadderId) -> BoxFuture<'static, Result<Ladder>>;

    /// `GET ladders/<id>/players?page=<n>&page_size=<k>`
    fn players_page(
        &self,
        id: LadderId,
        page: u32,
        page_size: usize,
    ) -> BoxFuture<'static, Result<PlayersPage>>;

    /// `POST ladders/<id>/players`
    fn join(&self, id: LadderId) -> BoxFuture<'static, Result<()>>;

    /// `DELETE ladders/<id>/players`
    fn leave(&self, id: LadderId) -> BoxFuture<'static, Result<()>>;

    /// `POST ladders/<id>/players/challenge`
    fn challenge(&self, id: LadderId, player_id: u64) -> BoxFuture<'static, Result<()>>;

    /// `PUT ladders/<id>/players/moderate`
    fn moderate(&self, id: LadderId, player_id: u64, rank: u64)
        -> BoxFuture<'static, Result<()>>;
}

/// The paged players collection of one ladder, as a cache page source
pub struct LadderPlayers<A> {
    api: Arc<A>,
    ladder_id: LadderId,
}

impl<A: LadderApi> LadderPlayers<A> {
    pub fn new(api: Arc<A>, ladder_id: LadderId) -> Self {
        Self { api, ladder_id }
    }

    pub fn ladder_id(&self) -> LadderId {
        self.ladder_id
    }
}

impl<A: LadderApi> PageSource for LadderPlayers<A> {
    fn fetch_page(&self, page: u32, page_size: usize) -> BoxFuture<'static, Result<Vec<LadderRow>>> {
        self.api
            .players_page(self.ladder_id, page, page_size)
            .map(|page| page.map(|p| p.results))
            .boxed()
    }

    fn describe(&self) -> String {
        self.ladder_id.players_path()
    }
}
