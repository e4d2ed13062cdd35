//! REST endpoints
//!
//! - `POST /signup`, `POST /login`, `GET /me`
//! - `POST /events`, `GET /events`, `PATCH /events/:id?status=`
//! - `GET /events/swappable` (alias `GET /swappable-slots`)
//! - `POST /swap/request`, `GET /swap/incoming`, `GET /swap/outgoing`
//! - `POST /swap/respond/:id`, `POST /swap/cancel/:id`

pub mod events;
pub mod swaps;
pub mod users;
