/// Router Module Index
///
/// One router per resource. Every route is open to anonymous requesters: access
/// control happens per object, through the visibility gate and the plugin
/// permission checks, not per route.
///
/// Each path is registered with and without its trailing slash.

/// Page list and detail.
pub mod pages;

/// Placeholder detail.
pub mod placeholders;

/// Plugin detail and data submission.
pub mod plugins;
