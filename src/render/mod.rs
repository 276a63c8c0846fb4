//! Chrome output: page decoration layer and diff protocol

mod chrome;
mod diff;
mod display;

pub use chrome::{
    footer_text, ChromeSettings, HeaderFooterConfig, PageChromeRenderer, PAGE_PLACEHOLDER,
};
pub use diff::{ChromeDiff, ChromeDiffEngine, ChromePatch};
pub use display::{BreakMarker, ChromeItem, ChromeLayer, ChromePage};
