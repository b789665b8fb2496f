// handlers/protected/mod.rs - Endpoints behind token authentication
//
// Every handler receives the resolved account as `Extension<AuthUser>` and
// passes its `OwnerRef` down to the services.
pub mod addresses;
pub mod contacts;
pub mod users;
