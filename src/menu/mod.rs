mod handlers;
mod main_menu;

pub use handlers::{print_report, run_pipeline, run_single_video};
pub use main_menu::show_main_menu;
