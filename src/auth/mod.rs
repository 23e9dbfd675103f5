pub mod allow_list;
pub mod auth;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod revocation;
pub mod users;
