pub mod config;
pub mod distro;
pub mod download;
pub mod fallback;
pub mod file_edit;
pub mod host;
pub mod shell;

#[cfg(test)]
pub mod testing;
