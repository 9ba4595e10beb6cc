#[cfg(test)]
pub mod common;

#[cfg(test)]
mod api_surface;
