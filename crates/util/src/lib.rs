pub mod executables;
pub mod path_processing;
pub mod text_processing;

pub use executables::{find_on_path, is_executable};
pub use path_processing::{FileNameParts, expand_tilde};
pub use text_processing::format_json_value;
