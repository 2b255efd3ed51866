// Service exports
pub mod identity;
pub mod places;
pub mod retry;
pub mod travel_time;

pub use identity::{IdentityClient, IdentityError};
pub use places::{PlacesClient, PlacesError};
pub use retry::RetryPolicy;
pub use travel_time::{TravelTimeClient, TravelTimeError};
