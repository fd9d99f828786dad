//! # Active Router
//!
//! A small client-side router. Routes register with a shared
//! [`ActiveRouter`], which follows a [`RouterHistory`], matches every route
//! against the current location and tells each route whether it should be
//! showing.
//!
//! Routes may be placed in a *group*. Among the matching members of a group
//! only one is active: the one with the lowest group index, or the one that
//! subscribed first.
//!
//! Navigation resolves once every route it notified has finished updating,
//! so follow-up work (a redirect, a scroll restore) can wait for the page to
//! settle.
//!
//! ```rust
//! use active_router::{
//!     components::{ChildProps, ComponentRegistry, RouteBinding, RouteProps},
//!     ActiveRouter, MemoryHistory, RouterOptions,
//! };
//! use std::rc::Rc;
//!
//! # futures::executor::block_on(async {
//! let history = MemoryHistory::new("/").unwrap();
//! let router = ActiveRouter::new(Rc::new(history), RouterOptions::default());
//!
//! let user = RouteBinding::new(
//!     Some(router.clone()),
//!     RouteProps::builder().url("/users/:id").component("user-page").build(),
//! );
//! user.will_load().unwrap();
//!
//! let components = ComponentRegistry::new().register(
//!     "user-page",
//!     |props: ChildProps| format!("user {}", props.matched.params.get_str("id").unwrap()),
//! );
//!
//! let settled = router.navigate("/users/42").unwrap();
//! user.did_update(None).await;
//! settled.await.unwrap();
//!
//! assert_eq!(user.render(&components).as_deref(), Some("user 42"));
//! # });
//! ```

#![forbid(unsafe_code)]

mod active_router;
pub mod components;
mod error;
pub mod location;
mod matching;
pub mod params;

pub use active_router::*;
pub use active_router_config::{ListenerErrorPolicy, RouterOptions};
pub use error::*;
pub use location::{
    HistoryAction, HistoryListener, LocationChange, LocationSegments,
    MemoryHistory, RouterHistory,
};
pub use matching::*;
pub use params::ParamsMap;
