/// Day columns in a payroll sheet, independent of the month length
pub const SHEET_DAYS: usize = 31;

pub const MIN_SHIFT_HOURS: i32 = 1;
pub const MAX_SHIFT_HOURS: i32 = 24;

pub const DEFAULT_PER_PAGE: u64 = 20;
pub const MAX_PER_PAGE: u64 = 100;

pub const TOKEN_LIFETIME_WEEKS: i64 = 1;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
