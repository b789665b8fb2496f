pub mod address;
pub mod contact;
pub mod user;

pub use address::{Address, AddressChanges, AddressDraft, AddressResource};
pub use contact::{Contact, ContactChanges, ContactDraft, ContactResource};
pub use user::{NewUser, User, UserChanges, UserResource};
