//! Test support: isolated PostgreSQL databases and a canned HTTP responder.


pub(crate) use context::TestContext;
pub(crate) use db::TestDb;
pub(crate) use http::serve_once;
