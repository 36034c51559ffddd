/// Decimal places kept on every numeric record field
pub const RECORD_DECIMAL_PRECISION: u32 = 8;

/// Decimal places used when formatting report figures
pub const DISPLAY_DECIMAL_PRECISION: u32 = 2;

/// Default number of rows shown in "top N" report sections
pub const DEFAULT_TOP_N: usize = 5;

/// Number of headlines listed in the news section of the report
pub const REPORT_HEADLINE_COUNT: usize = 5;

/// Default row limit for history and latest-record queries
pub const DEFAULT_QUERY_LIMIT: u32 = 10;

/// Separator used when a run accumulates several error messages
pub const ERROR_MESSAGE_SEPARATOR: &str = "; ";
