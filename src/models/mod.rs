mod user;

pub use user::{NewUser, UpdateUser, User, UserRow};
