//! Latchkey Web - embedded status page assets
//!
//! This crate embeds the status page into the binary.

use rust_embed::Embed;

#[derive(Embed)]
#[folder = "www/"]
pub struct Assets;
