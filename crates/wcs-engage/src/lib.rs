//! Engagement planning: per-tube managers that own target and waypoint
//! state, recompute trajectories against the moving environment, and track
//! the weapon's estimated position after launch.

pub mod engagement;
pub mod mine;
pub mod missile;
pub mod trajectory;

pub use engagement::Engagement;
pub use mine::MineEngagement;
pub use missile::MissileEngagement;

#[cfg(test)]
mod tests;
