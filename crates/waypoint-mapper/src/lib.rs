//! Path pattern mapper for the waypoint dispatcher.
//!
//! A [`Mapper`] holds an ordered table of [`Route`]s. Each route is a pattern
//! of `/`-separated segments plus [`Defaults`] for omitted captures and
//! [`Rules`] constraining individual captures:
//!
//! ```text
//! :controller/:action/*params
//!  │           │       └─ rest of the path, zero or more segments
//!  │           └─ one segment, optional here because it has a default
//!  └─ one segment
//! ```
//!
//! # Example
//!
//! ```rust
//! use waypoint_mapper::{Defaults, Mapper, Rules};
//!
//! let mut mapper = Mapper::new("app");
//! mapper.connect(
//!     ":controller/:action/*params",
//!     Defaults::new().with("action", "index").with_null("params"),
//!     Rules::new(),
//! )?;
//!
//! let m = mapper.match_path("/user/show/id/42").unwrap();
//! assert_eq!(m.get("controller"), Some("user"));
//! assert_eq!(m.get("action"), Some("show"));
//! assert_eq!(m.get("params"), Some("id/42"));
//!
//! let m = mapper.match_path("user").unwrap();
//! assert_eq!(m.get("action"), Some("index"));
//! # Ok::<(), waypoint_mapper::MapperError>(())
//! ```
//!
//! # Sharing
//!
//! [`MapperRegistry`] hands out one mapper per identifier, so several
//! dispatchers configured with the same identifier see the same routes.

mod error;
mod mapper;
pub mod pattern;
mod route;

pub use error::{MapperError, Result};
pub use mapper::{Mapper, MapperRegistry, SharedMapper, DEFAULT_MAPPER_ID};
pub use pattern::Segment;
pub use route::{Defaults, Route, RouteMatch, Rules};
