//! Output document generators
//!
//! Both generators are pure functions over a channel list. A channel or
//! programme that cannot be rendered is logged and skipped; the rest of the
//! document is still produced.

pub mod epg_generator;
pub mod m3u_generator;

pub use epg_generator::GuideGenerator;
pub use m3u_generator::PlaylistGenerator;
