pub mod handlers;
pub mod models;
pub mod router;
pub mod services;
pub mod state;
pub mod store;

pub use models::*;
pub use router::appointment_routes;
pub use state::AppointmentState;
