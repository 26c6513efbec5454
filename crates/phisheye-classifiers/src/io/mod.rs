pub mod table;

pub use table::{read_dataset, read_dataset_from_reader, write_predictions_csv};
