mod console;

pub use console::{init_color, print_diff, print_scan_summary};
