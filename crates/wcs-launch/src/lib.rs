//! The control core: per-weapon state machines with cancellable launch
//! sequences, the launch-tube coordinator, and the weapon-control service
//! facade that ties the coordinator to the persistence services.

pub mod cancel;
pub mod coordinator;
pub mod kinds;
pub mod service;
pub mod tube;
pub mod weapon;

pub use cancel::CancelToken;
pub use coordinator::LaunchTubeCoordinator;
pub use kinds::WeaponFactory;
pub use service::WeaponControlService;
pub use weapon::Weapon;
