mod metric_names;
mod pipeline;
mod resolver;
mod run;
mod run_log;
mod store;
mod summary;
mod values;
mod workbook;
mod year_columns;

pub use run::run;
pub use store::count_rows;
