//! Entity model for Ariob.
//!
//! Defines the types every data-access service is written against:
//! - [`Thing`] is the base entity (id, soul, schema tag, timestamps, visibility,
//!   creator) wrapping a typed payload
//! - [`Schema`] declares a payload's type tag and its field checks
//! - [`Validator`] prepares new entities and checks stored JSON against a schema
//! - [`Profile`] and [`Credentials`] are the identity records

mod schema;
mod thing;
mod validator;
mod who;

pub use schema::Schema;
pub use thing::{soul, Thing, PROTECTED_FIELDS};
pub use validator::Validator;
pub use who::{AuthMethod, Credentials, Profile, Who, WHO_PREFIX};
