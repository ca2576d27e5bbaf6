pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{banner, error, info, muted, section, status_badge, success, summary_row};
pub use table::{account_table, stats_table, task_table, TableBuilder};
pub use theme::{theme, Theme};
