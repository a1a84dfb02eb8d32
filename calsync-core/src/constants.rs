/// Text size used when a shift record has none.
pub const DEFAULT_TEXT_SIZE: u8 = 12;

/// Inclusive bounds for a shift's text size.
pub const MIN_TEXT_SIZE: u8 = 8;
pub const MAX_TEXT_SIZE: u8 = 24;

pub const DEFAULT_BACKGROUND_COLOR: &str = "#FFFFFF";
pub const DEFAULT_TEXT_COLOR: &str = "#000000";

/// Field every collection is ordered and stamped by.
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";
