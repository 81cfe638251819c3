//! Wire models exchanged with the scheduling API.
//! Each submodule is re-exported so callers can `use crate::models::*;`.

pub mod appointment;
pub mod dentist;
pub mod user;

pub use self::appointment::*;
pub use self::dentist::*;
pub use self::user::*;
