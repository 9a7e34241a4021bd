pub mod parser;
pub mod types;

pub use parser::{parse_config, parse_config_file, resolve_config_path, DEFAULT_CONFIG_DIR};
pub use types::{is_valid_interface_name, InterfaceConfig};
