pub(crate) mod bot;
pub(crate) mod challenge;
pub(crate) mod commands;
pub(crate) mod utils;
pub(crate) mod view;
