use crate::{
    location::{HistoryListener, LocationChange, LocationSegments, RouterHistory},
    matching::{resolve_path, strip_base, MatchResult},
    RouterError,
};
use active_router_config::{ListenerErrorPolicy, RouterOptions};
use core::fmt;
use futures::{
    future::{join_all, try_join_all, LocalBoxFuture},
    FutureExt,
};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    future::Future,
    pin::Pin,
    rc::{Rc, Weak},
    task::{Context, Poll},
};

/// Completion signal returned by a listener. The router treats the
/// listener as done updating once it resolves.
pub type Barrier = LocalBoxFuture<'static, Result<(), RouterError>>;

/// Computes a subscriber's match. `None` asks for the router's current
/// pathname.
pub type IsMatch =
    Box<dyn Fn(Option<&str>) -> Result<Option<MatchResult>, RouterError>>;

pub type Listener = Box<dyn Fn(RouteState) -> Barrier>;

/// What a subscriber is told after every arbitration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteState {
    pub matched: Option<MatchResult>,
    /// `true` for a matching subscriber with no group, and for the single
    /// matching subscriber that won its group.
    pub active_in_group: bool,
}

/// A subscriber's registration with an [`ActiveRouter`].
pub struct Subscription {
    pub is_match: IsMatch,
    pub listener: Listener,
    pub group_id: Option<String>,
    pub group_index: Option<u32>,
}

impl Subscription {
    pub fn new(
        is_match: impl Fn(Option<&str>) -> Result<Option<MatchResult>, RouterError>
            + 'static,
        listener: impl Fn(RouteState) -> Barrier + 'static,
    ) -> Self {
        Self {
            is_match: Box::new(is_match),
            listener: Box::new(listener),
            group_id: None,
            group_index: None,
        }
    }

    /// Places the subscriber in `group_id`. Among matching members the lowest
    /// `group_index` wins; members without an index rank last and ties go to
    /// whoever subscribed first.
    pub fn in_group(
        mut self,
        group_id: impl Into<String>,
        group_index: Option<u32>,
    ) -> Self {
        self.group_id = Some(group_id.into());
        self.group_index = group_index;
        self
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("group_id", &self.group_id)
            .field("group_index", &self.group_index)
            .finish_non_exhaustive()
    }
}

struct Entry {
    id: u64,
    is_match: IsMatch,
    listener: Listener,
    group_id: Option<String>,
    group_index: Option<u32>,
    delivered: RefCell<Option<RouteState>>,
    live: Cell<bool>,
}

impl Entry {
    fn rank(&self) -> (bool, u32, u64) {
        (
            self.group_index.is_none(),
            self.group_index.unwrap_or_default(),
            self.id,
        )
    }
}

/// Removes a subscription from its router.
///
/// Consuming `self` makes a second call impossible. Dropping the handle
/// without calling [`Unsubscribe::unsubscribe`] leaves the subscription
/// registered and its listener reachable.
#[must_use = "dropping an Unsubscribe leaves the subscription registered"]
pub struct Unsubscribe {
    router: Weak<RouterInner>,
    id: u64,
}

impl Unsubscribe {
    pub fn unsubscribe(self) {
        if let Some(inner) = self.router.upgrade() {
            inner.entries.borrow_mut().retain(|entry| {
                if entry.id == self.id {
                    entry.live.set(false);
                    false
                } else {
                    true
                }
            });
            tracing::trace!(id = self.id, "route unsubscribed");
        }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe").field("id", &self.id).finish()
    }
}

/// Resolves once every listener notified by a pass has finished updating.
#[must_use = "a navigation has only settled once this future resolves"]
pub struct Settled {
    inner: Barrier,
}

impl Settled {
    fn new(policy: ListenerErrorPolicy, barriers: Vec<Barrier>) -> Self {
        let inner = async move {
            match policy {
                ListenerErrorPolicy::Abort => {
                    try_join_all(barriers).await.map(|_| ())
                }
                ListenerErrorPolicy::Isolate => {
                    for result in join_all(barriers).await {
                        if let Err(error) = result {
                            tracing::warn!(%error, "route listener failed to settle");
                        }
                    }
                    Ok(())
                }
            }
        }
        .boxed_local();
        Self { inner }
    }
}

impl Future for Settled {
    type Output = Result<(), RouterError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl fmt::Debug for Settled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settled").finish_non_exhaustive()
    }
}

/// The handle every route in a tree shares: the current location, the
/// history facade and the set of subscribed routes.
///
/// Single-threaded. Cloning is cheap and every clone refers to the same
/// router.
///
/// An `is_match` error aborts its pass before any listener of that pass runs
/// and is returned to whoever triggered it. The location is committed before
/// matching and listeners notified by earlier passes keep what they were
/// given; nothing is rolled back.
#[derive(Clone)]
pub struct ActiveRouter {
    inner: Rc<RouterInner>,
}

struct RouterInner {
    options: RouterOptions,
    history: Rc<dyn RouterHistory>,
    location: RefCell<LocationSegments>,
    entries: RefCell<Vec<Rc<Entry>>>,
    next_id: Cell<u64>,
    pass: Cell<u64>,
    /// Barrier lists of the passes currently notifying, innermost last.
    frames: RefCell<Vec<Vec<Barrier>>>,
    navigating: Cell<bool>,
    pending: RefCell<Vec<Barrier>>,
    history_listener: RefCell<Option<HistoryListener>>,
}

impl fmt::Debug for ActiveRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveRouter")
            .field("options", &self.inner.options)
            .field("location", &self.inner.location.borrow())
            .field("subscribers", &self.inner.entries.borrow().len())
            .field(
                "following_history",
                &self.inner.history_listener.borrow().is_some(),
            )
            .finish_non_exhaustive()
    }
}

impl ActiveRouter {
    /// Creates a router at the history's current location and starts
    /// following the history's changes.
    pub fn new(history: Rc<dyn RouterHistory>, options: RouterOptions) -> Self {
        let location = history.location();
        let inner = Rc::new(RouterInner {
            options,
            history: Rc::clone(&history),
            location: RefCell::new(location),
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            pass: Cell::new(0),
            frames: RefCell::new(Vec::new()),
            navigating: Cell::new(false),
            pending: RefCell::new(Vec::new()),
            history_listener: RefCell::new(None),
        });

        let weak = Rc::downgrade(&inner);
        let listener = history.listen(Rc::new(move |change: &LocationChange| {
            if let Some(inner) = weak.upgrade() {
                ActiveRouter { inner }.history_changed(change);
            }
        }));
        *inner.history_listener.borrow_mut() = Some(listener);

        Self { inner }
    }

    pub fn options(&self) -> &RouterOptions {
        &self.inner.options
    }

    pub fn location(&self) -> LocationSegments {
        self.inner.location.borrow().clone()
    }

    pub fn history(&self) -> Rc<dyn RouterHistory> {
        Rc::clone(&self.inner.history)
    }

    /// The current pathname with the configured root removed, or `None`
    /// when the location lies outside the root.
    pub fn route_pathname(&self) -> Option<String> {
        let location = self.inner.location.borrow();
        strip_base(&self.inner.options.root, &location.pathname).map(String::from)
    }

    /// Registers a subscriber and immediately delivers its state for the
    /// current location. The initial delivery's barrier is awaited by
    /// [`ActiveRouter::settled`]. When called from a listener, the barriers
    /// join the notifying pass instead, so that pass only settles once they
    /// resolve.
    ///
    /// Fails, leaving nothing registered, if matching the current location
    /// fails.
    pub fn subscribe(
        &self,
        subscription: Subscription,
    ) -> Result<Unsubscribe, RouterError> {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        let Subscription {
            is_match,
            listener,
            group_id,
            group_index,
        } = subscription;
        self.inner.entries.borrow_mut().push(Rc::new(Entry {
            id,
            is_match,
            listener,
            group_id,
            group_index,
            delivered: RefCell::new(None),
            live: Cell::new(true),
        }));
        tracing::trace!(id, "route subscribed");

        match self.recompute() {
            Ok(barriers) => {
                let unclaimed = match self.inner.frames.borrow_mut().last_mut() {
                    Some(enclosing) => {
                        enclosing.extend(barriers);
                        None
                    }
                    None => Some(barriers),
                };
                if let Some(barriers) = unclaimed {
                    self.queue(Settled::new(self.policy(), barriers));
                }
                Ok(Unsubscribe {
                    router: Rc::downgrade(&self.inner),
                    id,
                })
            }
            Err(e) => {
                self.inner.entries.borrow_mut().retain(|entry| entry.id != id);
                Err(e)
            }
        }
    }

    /// Moves the router to `location`, notifying every subscriber whose
    /// state changed.
    ///
    /// Matching and listener calls happen before this returns; the returned
    /// [`Settled`] is the barrier for the listeners' updates.
    pub fn set_location(
        &self,
        location: LocationSegments,
    ) -> Result<Settled, RouterError> {
        tracing::debug!(%location, "location changed");
        *self.inner.location.borrow_mut() = location;
        let barriers = self.recompute()?;
        Ok(Settled::new(self.policy(), barriers))
    }

    /// Pushes `to`, resolved against the root, onto the history and moves
    /// the router there.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn navigate(&self, to: &str) -> Result<Settled, RouterError> {
        let href = self.resolve(to)?;
        self.move_history(|history| history.push(&href))
    }

    /// Like [`ActiveRouter::navigate`], but replaces the current history
    /// entry.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn replace(&self, to: &str) -> Result<Settled, RouterError> {
        let href = self.resolve(to)?;
        self.move_history(|history| history.replace(&href))
    }

    /// Moves `delta` entries through the history.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn go(&self, delta: isize) -> Result<Settled, RouterError> {
        self.move_history(|history| history.go(delta))
    }

    pub fn go_back(&self) -> Result<Settled, RouterError> {
        self.go(-1)
    }

    pub fn go_forward(&self) -> Result<Settled, RouterError> {
        self.go(1)
    }

    /// Waits for every barrier not handed to a caller yet: initial
    /// subscription deliveries and passes the history triggered on its own.
    pub fn settled(&self) -> Settled {
        let pending = std::mem::take(&mut *self.inner.pending.borrow_mut());
        Settled::new(self.policy(), pending)
    }

    fn policy(&self) -> ListenerErrorPolicy {
        self.inner.options.listener_errors
    }

    /// Keeps `settled` for [`ActiveRouter::settled`] unless it has already
    /// succeeded.
    fn queue(&self, mut settled: Settled) {
        let barrier = match (&mut settled).now_or_never() {
            Some(Ok(())) => return,
            Some(Err(error)) => async move { Err(error) }.boxed_local(),
            None => settled.inner,
        };
        self.inner.pending.borrow_mut().push(barrier);
    }

    fn resolve(&self, to: &str) -> Result<String, RouterError> {
        let from = self.inner.location.borrow().pathname.clone();
        resolve_path(&self.inner.options.root, to, Some(&from))
            .ok_or_else(|| RouterError::InvalidUrl(to.to_string()))
    }

    fn move_history(
        &self,
        step: impl FnOnce(&dyn RouterHistory) -> Result<(), RouterError>,
    ) -> Result<Settled, RouterError> {
        self.inner.navigating.set(true);
        let moved = step(self.inner.history.as_ref());
        self.inner.navigating.set(false);
        moved?;
        self.set_location(self.inner.history.location())
    }

    fn history_changed(&self, change: &LocationChange) {
        if self.inner.navigating.get()
            || *self.inner.location.borrow() == change.location
        {
            return;
        }
        match self.set_location(change.location.clone()) {
            Ok(settled) => self.queue(settled),
            Err(error) => {
                tracing::error!(%error, location = %change.location, "failed to apply history change")
            }
        }
    }

    /// Matches every subscriber against the current location, arbitrates
    /// groups and notifies whoever's state changed.
    ///
    /// A pass started from inside a listener supersedes this one. Barriers
    /// of subscriptions made meanwhile are returned along with this pass's
    /// own.
    fn recompute(&self) -> Result<Vec<Barrier>, RouterError> {
        self.inner.frames.borrow_mut().push(Vec::new());
        let notified = self.notify();
        let joined = self.inner.frames.borrow_mut().pop().unwrap_or_default();
        let mut barriers = notified?;
        barriers.extend(joined);
        Ok(barriers)
    }

    fn notify(&self) -> Result<Vec<Barrier>, RouterError> {
        let pass = self.inner.pass.get() + 1;
        self.inner.pass.set(pass);

        let pathname = self.route_pathname();
        // listeners may subscribe or unsubscribe while we notify
        let entries = self.inner.entries.borrow().clone();

        let mut matches = Vec::with_capacity(entries.len());
        for entry in &entries {
            let matched = match &pathname {
                Some(pathname) => (entry.is_match)(Some(pathname))?,
                None => None,
            };
            matches.push(matched);
        }

        let mut winners: HashMap<&str, usize> = HashMap::new();
        for (idx, (entry, matched)) in entries.iter().zip(&matches).enumerate() {
            let Some(group) = entry.group_id.as_deref() else {
                continue;
            };
            if matched.is_none() {
                continue;
            }
            winners
                .entry(group)
                .and_modify(|winner| {
                    if entry.rank() < entries[*winner].rank() {
                        *winner = idx;
                    }
                })
                .or_insert(idx);
        }

        let mut barriers = Vec::new();
        for (idx, (entry, matched)) in entries.iter().zip(matches).enumerate() {
            if self.inner.pass.get() != pass {
                tracing::trace!(pass, "pass superseded by a newer one");
                break;
            }
            if !entry.live.get() {
                continue;
            }
            let active_in_group = match (&matched, entry.group_id.as_deref()) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(_), Some(group)) => winners.get(group) == Some(&idx),
            };
            let state = RouteState {
                matched,
                active_in_group,
            };
            if entry.delivered.borrow().as_ref() == Some(&state) {
                continue;
            }
            *entry.delivered.borrow_mut() = Some(state.clone());
            tracing::trace!(
                id = entry.id,
                matched = state.matched.is_some(),
                active_in_group,
                "notifying route"
            );
            barriers.push((entry.listener)(state));
        }
        Ok(barriers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{match_path, MatchOptions, MemoryHistory};

    fn router_at(path: &str) -> ActiveRouter {
        let history = MemoryHistory::new(path).unwrap();
        ActiveRouter::new(Rc::new(history), RouterOptions::default())
    }

    fn matcher(
        path: &'static str,
    ) -> impl Fn(Option<&str>) -> Result<Option<MatchResult>, RouterError> {
        move |pathname: Option<&str>| {
            match_path(
                pathname.unwrap_or("/"),
                &MatchOptions {
                    path: path.into(),
                    exact: true,
                    strict: true,
                },
            )
        }
    }

    fn ready(_: RouteState) -> Barrier {
        async { Ok(()) }.boxed_local()
    }

    #[test]
    fn entries_without_index_rank_last() {
        let router = router_at("/");
        let _a = router
            .subscribe(Subscription::new(matcher("/"), ready).in_group("g", None))
            .unwrap();
        let _b = router
            .subscribe(Subscription::new(matcher("/"), ready).in_group("g", Some(7)))
            .unwrap();
        let entries = router.inner.entries.borrow();
        assert!(entries[1].rank() < entries[0].rank());
    }

    #[test]
    fn unsubscribe_removes_entry() {
        let router = router_at("/");
        let unsubscribe = router
            .subscribe(Subscription::new(matcher("/"), ready))
            .unwrap();
        assert_eq!(router.inner.entries.borrow().len(), 1);
        unsubscribe.unsubscribe();
        assert!(router.inner.entries.borrow().is_empty());
    }

    #[test]
    fn failed_subscribe_leaves_nothing_registered() {
        let router = router_at("/");
        let result = router.subscribe(Subscription::new(
            |_: Option<&str>| Err(RouterError::malformed("/:", "parameter has no name")),
            ready,
        ));
        assert!(result.is_err());
        assert!(router.inner.entries.borrow().is_empty());
    }

    #[test]
    fn queue_keeps_only_unfinished_barriers() {
        let history = Rc::new(MemoryHistory::new("/").unwrap());
        let router = ActiveRouter::new(history.clone(), RouterOptions::default());
        let _ready = router
            .subscribe(Subscription::new(matcher("/"), ready))
            .unwrap();
        for path in ["/a", "/", "/a", "/"] {
            history.push(path).unwrap();
        }
        assert!(router.inner.pending.borrow().is_empty());

        let _stuck = router
            .subscribe(Subscription::new(matcher("/"), |_: RouteState| {
                futures::future::pending().boxed_local()
            }))
            .unwrap();
        assert_eq!(router.inner.pending.borrow().len(), 1);
        assert!(router.settled().now_or_never().is_none());
        assert!(router.inner.pending.borrow().is_empty());
    }

    #[test]
    fn dropping_the_router_stops_following_history() {
        let history = Rc::new(MemoryHistory::new("/").unwrap());
        let router =
            ActiveRouter::new(history.clone(), RouterOptions::default());
        drop(router);
        // the listener is gone, so this must not reach a dropped router
        history.push("/a").unwrap();
        assert_eq!(history.location().pathname, "/a");
    }
}
