//! In-memory `LadderApi` used by the state tests

use ahash::AHashSet;
use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;

use crate::domain::{Challenge, Ladder, LadderId, LadderRow, Player, PlayersPage};
use crate::error::{Error, Result};
use crate::services::LadderApi;

/// Row `index` as served while the fake is at `version`
///
/// Every row carries outgoing challenges against ranks 5, -1 and 2, in that
/// order, so sorting on write is observable.
pub(crate) fn fake_row(index: usize, version: u64) -> LadderRow {
    let opponent = |game_id: u64, ladder_rank: i64| Challenge {
        game_id,
        player: Player::new(5000 + game_id, format!("opponent{game_id}"), ladder_rank),
    };
    let rank = index as u64 + 1;

    LadderRow {
        rank,
        player: Player::new(1000 + index as u64, format!("player{index}.v{version}"), rank as i64),
        incoming_challenges: Vec::new(),
        outgoing_challenges: vec![opponent(1, 5), opponent(2, -1), opponent(3, 2)],
        can_challenge: None,
    }
}

pub(crate) struct FakeLadderApi {
    size: Mutex<usize>,
    player_rank: Mutex<i64>,
    version: AtomicU64,
    page_calls: Mutex<Vec<u32>>,
    actions: Mutex<Vec<String>>,
    failing_pages: Mutex<AHashSet<u32>>,
    fail_actions: AtomicBool,
    gate: watch::Sender<bool>,
}

impl FakeLadderApi {
    /// A ladder with `size` players; the viewer is not on it
    pub(crate) fn new(size: usize) -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            size: Mutex::new(size),
            player_rank: Mutex::new(0),
            version: AtomicU64::new(0),
            page_calls: Mutex::new(Vec::new()),
            actions: Mutex::new(Vec::new()),
            failing_pages: Mutex::new(AHashSet::new()),
            fail_actions: AtomicBool::new(false),
            gate,
        }
    }

    /// Park page responses until `release`
    pub(crate) fn hold(&self) {
        self.gate.send_replace(false);
    }

    pub(crate) fn release(&self) {
        self.gate.send_replace(true);
    }

    pub(crate) fn fail_page(&self, page: u32) {
        self.failing_pages.lock().insert(page);
    }

    pub(crate) fn heal_page(&self, page: u32) {
        self.failing_pages.lock().remove(&page);
    }

    pub(crate) fn fail_actions(&self, fail: bool) {
        self.fail_actions.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn set_player_rank(&self, rank: i64) {
        *self.player_rank.lock() = rank;
    }

    /// Pages requested so far, in call order
    pub(crate) fn page_calls(&self) -> Vec<u32> {
        self.page_calls.lock().clone()
    }

    pub(crate) fn actions(&self) -> Vec<String> {
        self.actions.lock().clone()
    }

    pub(crate) fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    fn act(&self, action: String, apply: impl FnOnce(&Self)) -> BoxFuture<'static, Result<()>> {
        let failed = self.fail_actions.load(Ordering::SeqCst);
        if !failed {
            apply(self);
            self.version.fetch_add(1, Ordering::SeqCst);
        }
        self.actions.lock().push(action.clone());
        async move {
            if failed {
                Err(Error::Status {
                    method: "POST",
                    url: action,
                    status: 403,
                })
            } else {
                Ok(())
            }
        }
        .boxed()
    }
}

impl LadderApi for FakeLadderApi {
    fn ladder(&self, id: LadderId) -> BoxFuture<'static, Result<Ladder>> {
        let ladder = Ladder {
            id,
            name: format!("Ladder {id}"),
            size: *self.size.lock(),
            group: None,
            player_is_member_of_group: false,
            player_rank: *self.player_rank.lock(),
            rules: None,
            handicap: None,
        };
        async move { Ok(ladder) }.boxed()
    }

    fn players_page(
        &self,
        _id: LadderId,
        page: u32,
        page_size: usize,
    ) -> BoxFuture<'static, Result<PlayersPage>> {
        self.page_calls.lock().push(page);

        let failed = self.failing_pages.lock().contains(&page);
        let version = self.version();
        let size = *self.size.lock();
        let mut gate = self.gate.subscribe();

        async move {
            let _ = gate.wait_for(|open| *open).await;
            if failed {
                return Err(Error::Status {
                    method: "GET",
                    url: format!("page {page}"),
                    status: 500,
                });
            }

            let start = (page as usize - 1) * page_size;
            let end = (start + page_size).min(size);
            let results = (start..end).map(|i| fake_row(i, version)).collect();
            Ok(PlayersPage { results })
        }
        .boxed()
    }

    fn join(&self, id: LadderId) -> BoxFuture<'static, Result<()>> {
        self.act(format!("join {id}"), |api| {
            let mut size = api.size.lock();
            *size += 1;
            *api.player_rank.lock() = *size as i64;
        })
    }

    fn leave(&self, id: LadderId) -> BoxFuture<'static, Result<()>> {
        self.act(format!("leave {id}"), |api| {
            let mut size = api.size.lock();
            *size = size.saturating_sub(1);
            *api.player_rank.lock() = 0;
        })
    }

    fn challenge(&self, id: LadderId, player_id: u64) -> BoxFuture<'static, Result<()>> {
        self.act(format!("challenge {id} {player_id}"), |_| {})
    }

    fn moderate(&self, id: LadderId, player_id: u64, rank: u64) -> BoxFuture<'static, Result<()>> {
        self.act(format!("moderate {id} {player_id} {rank}"), |_| {})
    }
}
