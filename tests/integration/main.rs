#![cfg(feature = "sqlite")]
#![allow(
    missing_docs,
    clippy::missing_docs_in_private_items,
    unused_results,
    clippy::unwrap_used
)]

mod export;
mod helpers;
